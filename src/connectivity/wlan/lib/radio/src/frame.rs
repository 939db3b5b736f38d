// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        advisory::Advisories,
        aggregation::AggregateId,
        nav::nav_from_header,
        phy::{PhyDescriptor, PhyType},
        FrameId,
    },
    serde::{Deserialize, Serialize},
};

const FCS_LEN: u64 = 4;

/// One frame as decoded by the capture-format layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapturedFrame {
    pub id: FrameId,
    #[serde(flatten)]
    pub phy: PhyDescriptor,
    /// Captured MPDU length in bytes.
    pub len: u32,
    /// Whether `len` includes the FCS.
    pub fcs_present: bool,
    /// TSF timestamp in microseconds, as reported by the generator.
    pub tsf: Option<u64>,
    pub signal_dbm: Option<i8>,
    pub noise_dbm: Option<i8>,
    /// Leading bytes of the MAC header. Only the Duration/ID field is read.
    pub mac_header: Vec<u8>,
}

impl CapturedFrame {
    /// Length of the MPDU on air, FCS included.
    pub fn mpdu_len(&self) -> u64 {
        let len = u64::from(self.len);
        if self.fcs_present {
            len
        } else {
            len + FCS_LEN
        }
    }
}

/// Whether a frame's timestamps may still be shifted by a backpatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingState {
    /// Relative to the start of the PPDU; the PPDU's own timestamp is not yet known.
    Provisional,
    Final,
}

/// Radio metadata derived for one frame. Created on the frame's first visit; afterwards only the
/// timing fields of a provisional frame change, once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameRadioInfo {
    pub frame: FrameId,
    /// PHY the frame was timed as.
    pub phy: PhyType,
    /// Mb/s.
    pub rate: Option<f32>,
    /// Microseconds.
    pub preamble: Option<u32>,
    /// Microseconds of airtime charged to this frame.
    pub duration: Option<u32>,
    pub aggregate: Option<AggregateId>,
    /// A-MPDU bytes, delimiters included, that precede this subframe.
    pub prior_aggregate_bytes: u64,
    pub start_tsf: Option<u64>,
    pub end_tsf: Option<u64>,
    /// Spacing after the previous frame in TSF ticks. Negative when the two overlap.
    pub ifs: Option<i64>,
    /// `None` when the frame could not be placed on the timeline.
    pub timing: Option<TimingState>,
    /// Microseconds, from the MAC header's Duration/ID field.
    pub nav: Option<u16>,
    pub signal_dbm: Option<i8>,
    pub noise_dbm: Option<i8>,
    pub advisories: Advisories,
}

impl FrameRadioInfo {
    /// Metadata that does not depend on any other frame.
    pub(crate) fn new(frame: &CapturedFrame) -> Self {
        Self {
            frame: frame.id,
            phy: frame.phy.phy_type(),
            rate: None,
            preamble: None,
            duration: None,
            aggregate: None,
            prior_aggregate_bytes: 0,
            start_tsf: None,
            end_tsf: None,
            ifs: None,
            timing: None,
            nav: nav_from_header(&frame.mac_header),
            signal_dbm: frame.signal_dbm,
            noise_dbm: frame.noise_dbm,
            advisories: Advisories::default(),
        }
    }
}
