// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    bitfield::bitfield,
    byteorder::{ByteOrder, LittleEndian},
};

// Offset of the Duration/ID field in every MAC header, after Frame Control.
const DURATION_ID_OFFSET: usize = 2;

bitfield! {
    /// IEEE Std 802.11-2016, 9.2.4.2, Table 9-3: the Duration/ID field.
    pub struct DurationId(u16);
    impl Debug;
    pub u16, duration, _: 14, 0;
    pub bool, is_aid, _: 15;
}

impl DurationId {
    /// Reads the field from the start of a MAC header. `None` if the header is truncated.
    pub fn from_mac_header(header: &[u8]) -> Option<Self> {
        header
            .get(DURATION_ID_OFFSET..DURATION_ID_OFFSET + 2)
            .map(|raw| DurationId(LittleEndian::read_u16(raw)))
    }

    /// The NAV the frame sets, in microseconds. `None` when the field carries an AID or other
    /// non-duration value (bit 15 set).
    pub fn nav(&self) -> Option<u16> {
        if self.is_aid() {
            None
        } else {
            Some(self.duration())
        }
    }
}

/// NAV in microseconds announced by the frame whose MAC header is `header`.
pub fn nav_from_header(header: &[u8]) -> Option<u16> {
    DurationId::from_mac_header(header).and_then(|field| field.nav())
}
