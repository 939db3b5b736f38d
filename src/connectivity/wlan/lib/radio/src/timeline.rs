// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Experimental per-frame timeline, populated only when `RadioConfig::timeline` is set.

use {
    crate::{aggregation::AggregateId, frame::FrameRadioInfo, FrameId},
    serde::{Deserialize, Serialize},
};

/// A frame's final position on the TSF timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub frame: FrameId,
    pub start: u64,
    pub end: u64,
    pub spacing: Option<i64>,
    pub aggregate: Option<AggregateId>,
}

impl TimelineEntry {
    /// `None` unless the frame has been placed on the timeline.
    pub fn from_info(info: &FrameRadioInfo) -> Option<Self> {
        Some(Self {
            frame: info.frame,
            start: info.start_tsf?,
            end: info.end_tsf?,
            spacing: info.ifs,
            aggregate: info.aggregate,
        })
    }
}

/// Entries in the order frames became final.
#[derive(Debug, Default)]
pub(crate) struct Timeline {
    enabled: bool,
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, entries: vec![] }
    }

    pub fn record(&mut self, info: &FrameRadioInfo) {
        if !self.enabled {
            return;
        }
        if let Some(entry) = TimelineEntry::from_info(info) {
            self.entries.push(entry);
        }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries[..]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
