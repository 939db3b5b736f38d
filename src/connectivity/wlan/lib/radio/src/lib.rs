// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Radio metadata and PPDU timing for captured 802.11 frames.
//!
//! A [`RadioSession`] is fed the frames of one capture in capture order. For each frame it derives
//! the data rate, preamble and on-air duration, reconstructs A-MPDU membership from the
//! timestamps the capture generator reported, and places the frame on the capture's TSF
//! timeline. Results are cached per frame, so later out-of-order queries see exactly what the
//! first pass produced.

pub mod advisory;
pub mod aggregation;
pub mod config;
pub mod duration;
pub mod error;
pub mod frame;
pub mod nav;
pub mod phy;
pub mod rates;
pub mod session;
pub mod timeline;
mod timing;
mod tracker;

#[cfg(test)]
pub mod test_utils;

pub use crate::{
    aggregation::{Aggregate, AggregateId},
    config::RadioConfig,
    error::Error,
    frame::{CapturedFrame, FrameRadioInfo, TimingState},
    phy::{PhyDescriptor, PhyType},
    session::{CaptureSummary, RadioSession},
    timeline::TimelineEntry,
};

use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Position of a frame in its capture. Frames must be processed in increasing order.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FrameId(pub u32);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
