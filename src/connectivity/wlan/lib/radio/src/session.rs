// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Per-capture processing state and the per-frame result cache.
//!
//! Frames must be visited in capture order exactly once to build state. Any later visit of a frame
//! that has already been processed returns the cached result and leaves every piece of state
//! untouched, so consumers may re-query frames in any order once the first pass has seen them.

use {
    crate::{
        aggregation::{continues_burst, prior_aggregate_bytes, Aggregate, AggregateId, Aggregates},
        config::RadioConfig,
        duration::{phy_timing, Subframe},
        error::Error,
        frame::{CapturedFrame, FrameRadioInfo, TimingState},
        phy::PhyDescriptor,
        timeline::{Timeline, TimelineEntry},
        timing::{resolve, spacing, BackpatchQueue, Placement, Resolution},
        tracker::{Burst, PreviousFrame, Tracker},
        FrameId,
    },
    log::{debug, info, trace},
    serde::{Deserialize, Serialize},
    std::collections::HashMap,
};

/// Totals reported when a capture has been fully processed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub frames: usize,
    pub aggregates: usize,
    /// Frames with a known duration.
    pub timed: usize,
    /// Frames left with provisional timing because their PPDU never reported a timestamp.
    pub unresolved: usize,
    /// Frames for which at least one default was substituted.
    pub with_advisories: usize,
}

/// Derives radio metadata for the frames of one capture.
pub struct RadioSession {
    config: RadioConfig,
    tracker: Tracker,
    aggregates: Aggregates,
    backpatch: BackpatchQueue,
    cache: HashMap<FrameId, FrameRadioInfo>,
    timeline: Timeline,
    finished: bool,
}

impl RadioSession {
    pub fn new(config: RadioConfig) -> Self {
        let timeline = Timeline::new(config.timeline);
        Self {
            config,
            tracker: Tracker::default(),
            aggregates: Aggregates::default(),
            backpatch: BackpatchQueue::default(),
            cache: HashMap::new(),
            timeline,
            finished: false,
        }
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Returns the radio metadata of `frame`, deriving it if this is the frame's first visit.
    ///
    /// # Errors
    ///
    /// `Error::OutOfOrder` if the frame has not been processed yet and does not follow the last
    /// processed frame, and `Error::CaptureFinished` if it has not been processed and the capture
    /// has already been finished.
    pub fn process(&mut self, frame: &CapturedFrame) -> Result<&FrameRadioInfo, Error> {
        if self.cache.contains_key(&frame.id) {
            trace!("frame {} already processed", frame.id);
            return Ok(&self.cache[&frame.id]);
        }
        if self.finished {
            return Err(Error::CaptureFinished(frame.id));
        }
        if let Some(last) = self.tracker.last_frame() {
            if frame.id <= last {
                return Err(Error::OutOfOrder { frame: frame.id, last });
            }
        }

        let info = self.first_pass(frame);
        self.cache.insert(frame.id, info);
        Ok(&self.cache[&frame.id])
    }

    /// The cached metadata of a frame that has already been processed.
    pub fn frame_info(&self, frame: FrameId) -> Option<&FrameRadioInfo> {
        self.cache.get(&frame)
    }

    pub fn aggregate(&self, id: AggregateId) -> Option<&Aggregate> {
        self.aggregates.get(id)
    }

    pub fn aggregates(&self) -> impl Iterator<Item = &Aggregate> {
        self.aggregates.iter()
    }

    /// Frames in the order their timing became final. Empty unless `RadioConfig::timeline` is
    /// set.
    pub fn timeline(&self) -> &[TimelineEntry] {
        self.timeline.entries()
    }

    /// Ends the capture. The open aggregate is closed and frames still waiting for a timestamp
    /// keep their provisional timing. Cached results remain available.
    pub fn finish(&mut self) -> CaptureSummary {
        if !self.finished {
            self.end_burst();
            self.finished = true;
        }
        let summary = self.summary();
        info!(
            "processed {} frames: {} aggregates, {} timed, {} unresolved, {} with advisories",
            summary.frames,
            summary.aggregates,
            summary.timed,
            summary.unresolved,
            summary.with_advisories
        );
        summary
    }

    /// Forgets every frame and all capture state, ready for an unrelated capture.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.aggregates.clear();
        self.backpatch = BackpatchQueue::default();
        self.cache.clear();
        self.timeline.clear();
        self.finished = false;
    }

    fn summary(&self) -> CaptureSummary {
        let frames = self.cache.values();
        CaptureSummary {
            frames: self.cache.len(),
            aggregates: self.aggregates.len(),
            timed: frames.clone().filter(|info| info.duration.is_some()).count(),
            unresolved: frames
                .clone()
                .filter(|info| info.timing == Some(TimingState::Provisional))
                .count(),
            with_advisories: frames.filter(|info| !info.advisories.is_empty()).count(),
        }
    }

    fn first_pass(&mut self, frame: &CapturedFrame) -> FrameRadioInfo {
        let mut info = FrameRadioInfo::new(frame);
        let len = frame.mpdu_len();
        let reported = frame.phy.phy_type();

        let aggregate_open = self.tracker.open_aggregate.is_some();
        let convention = self
            .tracker
            .previous
            .as_ref()
            .and_then(|previous| continues_burst(previous, reported, frame.tsf, aggregate_open));
        let joined = match convention {
            Some(convention) => {
                trace!("frame {} continues the PPDU ({:?})", frame.id, convention);
                self.join_aggregate(frame, &mut info, len)
            }
            None => None,
        };
        let (descriptor, subframe) = match joined {
            Some(descriptor) => (
                descriptor,
                Subframe::Continuation { prior_bytes: info.prior_aggregate_bytes },
            ),
            None => {
                self.end_burst();
                self.tracker.running_len = len;
                (frame.phy.clone(), Subframe::Single)
            }
        };

        let timing = phy_timing(&descriptor, len, subframe, &self.config, &mut info.advisories);
        let airtime = timing.airtime;
        info.phy = timing.phy;
        info.rate = timing.rate;
        info.preamble = airtime.map(|airtime| airtime.preamble);
        info.duration = airtime.map(|airtime| airtime.duration());

        let prior_data = match subframe {
            Subframe::Single => {
                self.tracker.burst = Burst::start(airtime, frame.tsf);
                Some(0)
            }
            Subframe::Continuation { .. } => self.tracker.burst.extend(airtime, frame.tsf),
        };
        let tsf = match (frame.tsf, subframe) {
            // Later subframes stamped with zero share the first subframe's timestamp.
            (Some(0), Subframe::Continuation { .. }) => self.tracker.burst.anchor_tsf.or(frame.tsf),
            (tsf, _) => tsf,
        };
        let placement = match (airtime, prior_data, self.tracker.burst.preamble) {
            (Some(airtime), Some(prior_data), Some(shared_preamble)) => {
                Some(Placement { shared_preamble, prior_data, airtime })
            }
            _ => None,
        };
        if let (Some(tsf), Some(placement)) = (tsf, placement) {
            self.place(&mut info, tsf, &placement);
        }

        self.tracker.previous = Some(PreviousFrame {
            id: frame.id,
            phy: reported,
            tsf: frame.tsf,
            descriptor: frame.phy.clone(),
            signal_dbm: info.signal_dbm,
        });
        info
    }

    /// Attaches the frame to the open aggregate, opening one around the previous frame if
    /// needed. Returns the descriptor the frame is to be timed with, or `None` if the frame has to
    /// start a PPDU of its own because the running length can no longer be counted.
    fn join_aggregate(
        &mut self,
        frame: &CapturedFrame,
        info: &mut FrameRadioInfo,
        len: u64,
    ) -> Option<PhyDescriptor> {
        let prior = prior_aggregate_bytes(self.tracker.running_len)?;
        let running_len = prior.checked_add(len)?;
        let id = match (self.tracker.open_aggregate, &self.tracker.previous) {
            (Some(id), _) => id,
            (None, Some(previous)) => {
                let id = self.aggregates.open(previous);
                if let Some(first) = self.cache.get_mut(&previous.id) {
                    first.aggregate = Some(id);
                }
                id
            }
            (None, None) => return None,
        };
        self.tracker.open_aggregate = Some(id);

        self.tracker.running_len = running_len;
        info.aggregate = Some(id);
        info.prior_aggregate_bytes = prior;

        let aggregate = self.aggregates.get_mut(id)?;
        aggregate.members.push(frame.id);
        aggregate.reconcile(&frame.phy);
        match frame.signal_dbm {
            Some(signal_dbm) => aggregate.signal_dbm = Some(signal_dbm),
            None => info.signal_dbm = aggregate.signal_dbm,
        }
        Some(aggregate.phy.clone())
    }

    /// Closes the open aggregate, if any. Frames still waiting for their PPDU's timestamp will
    /// never get one.
    fn end_burst(&mut self) {
        if let Some(id) = self.tracker.open_aggregate.take() {
            let duration = self.tracker.burst.total_duration();
            if let Some(aggregate) = self.aggregates.get_mut(id) {
                aggregate.close(duration);
            }
        }
        self.backpatch.discard();
    }

    fn place(&mut self, info: &mut FrameRadioInfo, tsf: u64, placement: &Placement) {
        let previous = self.tracker.last_frame();
        match resolve(tsf, placement, self.config.tsf_at_end) {
            Resolution::Provisional(span) => {
                debug!("frame {}: timing deferred until the PPDU reports a timestamp", info.frame);
                info.start_tsf = Some(span.start);
                info.end_tsf = Some(span.end);
                info.timing = Some(TimingState::Provisional);
                self.backpatch.push(info.frame, previous);
            }
            Resolution::Final { span, base } => {
                if !self.backpatch.is_empty() {
                    debug!("frame {}: backpatching PPDU starting at {}", info.frame, base);
                    for id in self.backpatch.flush(base, &mut self.cache) {
                        if let Some(flushed) = self.cache.get(&id) {
                            self.timeline.record(flushed);
                        }
                    }
                }
                info.start_tsf = Some(span.start);
                info.end_tsf = Some(span.end);
                info.ifs = previous
                    .and_then(|previous| self.cache.get(&previous))
                    .filter(|previous| previous.timing == Some(TimingState::Final))
                    .and_then(|previous| previous.end_tsf)
                    .map(|previous_end| spacing(span.start, previous_end));
                info.timing = Some(TimingState::Final);
                self.timeline.record(info);
            }
        }
    }
}
