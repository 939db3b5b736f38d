// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    aggregation::AggregateId,
    duration::Airtime,
    phy::{PhyDescriptor, PhyType},
    timing::SENTINEL_TSF,
    FrameId,
};

/// What the next frame needs to know about the one processed before it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PreviousFrame {
    pub id: FrameId,
    /// PHY type as reported, before any reclassification.
    pub phy: PhyType,
    pub tsf: Option<u64>,
    pub descriptor: PhyDescriptor,
    pub signal_dbm: Option<i8>,
}

/// Airtime accounting for the PPDU the most recent frame belongs to.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Burst {
    /// Preamble charged to the first frame of the PPDU.
    pub preamble: Option<u32>,
    /// Sum of the data time of every frame seen so far in the PPDU. `None` once any of them had
    /// no known duration.
    pub data: Option<u32>,
    /// First real timestamp reported for the PPDU.
    pub anchor_tsf: Option<u64>,
}

impl Burst {
    pub fn start(airtime: Option<Airtime>, tsf: Option<u64>) -> Self {
        Self {
            preamble: airtime.map(|a| a.preamble),
            data: airtime.map(|a| a.data),
            anchor_tsf: tsf.filter(|&tsf| tsf != SENTINEL_TSF),
        }
    }

    /// Adds a subframe and returns the data time of the subframes before it.
    pub fn extend(&mut self, airtime: Option<Airtime>, tsf: Option<u64>) -> Option<u32> {
        let prior = self.data;
        self.data = match (prior, airtime) {
            (Some(prior), Some(airtime)) => prior.checked_add(airtime.data),
            _ => None,
        };
        if self.anchor_tsf.is_none() {
            self.anchor_tsf = tsf.filter(|&tsf| tsf != SENTINEL_TSF && tsf != 0);
        }
        prior
    }

    pub fn total_duration(&self) -> Option<u32> {
        self.preamble?.checked_add(self.data?)
    }
}

/// Capture-order state carried from one frame to the next.
#[derive(Debug, Default)]
pub(crate) struct Tracker {
    pub previous: Option<PreviousFrame>,
    pub open_aggregate: Option<AggregateId>,
    /// Bytes of the current PPDU so far, used to derive each subframe's prior-aggregate length.
    pub running_len: u64,
    pub burst: Burst,
}

impl Tracker {
    pub fn last_frame(&self) -> Option<FrameId> {
        self.previous.as_ref().map(|previous| previous.id)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
