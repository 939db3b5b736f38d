// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    frame::{CapturedFrame, FrameRadioInfo},
    phy::{Fec, HtBandwidth, HtInfo, OfdmInfo, PhyDescriptor, VhtBandwidth, VhtInfo},
    FrameId,
};

// QoS data frame announcing a 44 us NAV.
const FAKE_MAC_HEADER: [u8; 4] = [0x88, 0x01, 0x2c, 0x00];

/// Metadata of a frame that nothing could be derived for.
pub fn radio_info(frame: FrameId) -> FrameRadioInfo {
    FrameRadioInfo::new(&CapturedFrame { id: frame, ..Default::default() })
}

/// HT MCS 7, 20 MHz, long GI, mixed format, BCC, no STBC: 65 Mb/s.
pub fn fake_ht_mcs7() -> PhyDescriptor {
    PhyDescriptor::Ht(HtInfo {
        mcs: Some(7),
        bandwidth: Some(HtBandwidth::Cbw20),
        short_gi: Some(false),
        greenfield: Some(false),
        fec: Some(Fec::Bcc),
        stbc_streams: Some(0),
        extension_streams: Some(0),
    })
}

/// VHT MCS 0, one stream, 20 MHz, long GI, no STBC: 6.5 Mb/s.
pub fn fake_vht_mcs0() -> PhyDescriptor {
    let mut vht = VhtInfo {
        bandwidth: Some(VhtBandwidth::Cbw20),
        short_gi: Some(false),
        stbc: Some(false),
        ..Default::default()
    };
    vht.users[0].mcs = Some(0);
    vht.users[0].nss = Some(1);
    PhyDescriptor::Vht(vht)
}

fn fake_frame(id: u32, phy: PhyDescriptor, tsf: Option<u64>) -> CapturedFrame {
    CapturedFrame {
        id: FrameId(id),
        phy,
        len: 100,
        fcs_present: true,
        tsf,
        signal_dbm: None,
        noise_dbm: None,
        mac_header: FAKE_MAC_HEADER.to_vec(),
    }
}

/// A 100-byte HT MCS 7 frame: 36 us preamble and 16 us of data when sent alone.
pub fn ht_frame(id: u32, tsf: Option<u64>) -> CapturedFrame {
    fake_frame(id, fake_ht_mcs7(), tsf)
}

/// A 100-byte VHT MCS 0 frame: 36 us preamble and 125 us of data when sent alone.
pub fn vht_frame(id: u32, tsf: Option<u64>) -> CapturedFrame {
    fake_frame(id, fake_vht_mcs0(), tsf)
}

/// A 100-byte 54 Mb/s 802.11a frame lasting 36 us.
pub fn ofdm_frame(id: u32, tsf: Option<u64>) -> CapturedFrame {
    fake_frame(id, PhyDescriptor::Ofdm(OfdmInfo { rate: Some(108) }), tsf)
}
