// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Placement of frames on the capture's TSF timeline.
//!
//! Frames stamped with the sentinel timestamp are placed relative to the start of their PPDU and
//! queued. When a later subframe of the same PPDU reports a real timestamp, the PPDU's start is
//! known and every queued frame is shifted by it exactly once.

use {
    crate::{
        duration::Airtime,
        frame::{FrameRadioInfo, TimingState},
        FrameId,
    },
    log::warn,
    std::collections::HashMap,
};

/// Timestamp reported for every subframe of an A-MPDU except the last by generators that only
/// know the TSF once the PPDU has been received.
///
/// Placement saturates at both ends of the TSF range rather than wrapping: a frame stamped earlier
/// than its own airtime starts at 0.
pub const SENTINEL_TSF: u64 = u64::MAX;

/// Where a frame's airtime sits within its PPDU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Placement {
    /// Preamble of the PPDU, charged to its first frame.
    pub shared_preamble: u32,
    /// Data time of the subframes before this one.
    pub prior_data: u32,
    pub airtime: Airtime,
}

impl Placement {
    /// Offset of the frame's start from the start of the PPDU.
    fn offset(&self) -> u64 {
        let charged = u64::from(self.airtime.charged_preamble());
        (u64::from(self.shared_preamble) + u64::from(self.prior_data)).saturating_sub(charged)
    }

    fn duration(&self) -> u64 {
        u64::from(self.airtime.duration())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: u64,
    pub end: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Relative to the start of the PPDU until its timestamp is known.
    Provisional(Span),
    Final {
        span: Span,
        /// Start of the PPDU on the TSF timeline.
        base: u64,
    },
}

/// Places a frame given its timestamp. `tsf_at_end` selects whether timestamps mark the end of
/// the PPDU or the start of the frame's data.
pub(crate) fn resolve(tsf: u64, placement: &Placement, tsf_at_end: bool) -> Resolution {
    let offset = placement.offset();
    if tsf == SENTINEL_TSF {
        return Resolution::Provisional(Span { start: offset, end: offset + placement.duration() });
    }
    let span = if tsf_at_end {
        Span { start: tsf.saturating_sub(placement.duration()), end: tsf }
    } else {
        let start = tsf
            .saturating_add(u64::from(placement.prior_data))
            .saturating_sub(u64::from(placement.airtime.charged_preamble()));
        Span { start, end: start.saturating_add(placement.duration()) }
    };
    Resolution::Final { span, base: span.start.saturating_sub(offset) }
}

/// Signed spacing between the end of one frame and the start of the next, in TSF ticks. Negative
/// when the frames overlap.
pub(crate) fn spacing(start: u64, previous_end: u64) -> i64 {
    start.wrapping_sub(previous_end) as i64
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingTiming {
    frame: FrameId,
    /// Frame processed before `frame`, for recomputing its spacing.
    previous: Option<FrameId>,
}

/// Frames whose timing is provisional, in capture order.
#[derive(Debug, Default)]
pub(crate) struct BackpatchQueue(Vec<PendingTiming>);

impl BackpatchQueue {
    pub fn push(&mut self, frame: FrameId, previous: Option<FrameId>) {
        self.0.push(PendingTiming { frame, previous });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shifts every queued frame onto the TSF timeline and marks it final. Returns the frames
    /// finalized, in queue order.
    pub fn flush(
        &mut self,
        base: u64,
        cache: &mut HashMap<FrameId, FrameRadioInfo>,
    ) -> Vec<FrameId> {
        let mut finalized = Vec::with_capacity(self.0.len());
        for pending in self.0.drain(..) {
            let previous_end = pending
                .previous
                .and_then(|previous| cache.get(&previous))
                .and_then(|previous| previous.end_tsf);
            let info = match cache.get_mut(&pending.frame) {
                Some(info) => info,
                None => {
                    warn!("frame {} queued for backpatch but never cached", pending.frame);
                    continue;
                }
            };
            if info.timing != Some(TimingState::Provisional) {
                warn!("frame {} already has final timing", pending.frame);
                continue;
            }
            info.start_tsf = info.start_tsf.map(|start| start.saturating_add(base));
            info.end_tsf = info.end_tsf.map(|end| end.saturating_add(base));
            info.ifs = match (info.start_tsf, previous_end) {
                (Some(start), Some(previous_end)) => Some(spacing(start, previous_end)),
                _ => None,
            };
            info.timing = Some(TimingState::Final);
            finalized.push(pending.frame);
        }
        finalized
    }

    /// Drops every queued frame, leaving its timing provisional. Returns how many were dropped.
    pub fn discard(&mut self) -> usize {
        let discarded = self.0.len();
        if discarded > 0 {
            warn!(
                "discarding {} frame(s) with unresolved timing: PPDU ended without a timestamp",
                discarded
            );
        }
        self.0.clear();
        discarded
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::test_utils::radio_info, assert_matches::assert_matches};

    fn first(preamble: u32, data: u32) -> Placement {
        Placement {
            shared_preamble: preamble,
            prior_data: 0,
            airtime: Airtime { preamble, data, carries_preamble: true },
        }
    }

    fn member(preamble: u32, prior_data: u32, data: u32) -> Placement {
        Placement {
            shared_preamble: preamble,
            prior_data,
            airtime: Airtime { preamble, data, carries_preamble: false },
        }
    }

    #[test]
    fn end_anchored() {
        let resolution = resolve(10_000, &first(36, 16), true);
        assert_eq!(
            resolution,
            Resolution::Final { span: Span { start: 9_948, end: 10_000 }, base: 9_948 }
        );

        let resolution = resolve(10_000, &member(36, 16, 12), true);
        // The PPDU started 36 + 16 + 12 us before the end of this subframe.
        assert_eq!(
            resolution,
            Resolution::Final { span: Span { start: 9_988, end: 10_000 }, base: 9_936 }
        );
    }

    #[test]
    fn start_anchored() {
        let resolution = resolve(10_000, &first(36, 16), false);
        assert_eq!(
            resolution,
            Resolution::Final { span: Span { start: 9_964, end: 10_016 }, base: 9_964 }
        );

        let resolution = resolve(10_000, &member(36, 16, 12), false);
        assert_eq!(
            resolution,
            Resolution::Final { span: Span { start: 10_016, end: 10_028 }, base: 9_964 }
        );
    }

    #[test]
    fn early_timestamps_saturate_at_zero() {
        assert_eq!(
            resolve(0, &first(36, 16), true),
            Resolution::Final { span: Span { start: 0, end: 0 }, base: 0 }
        );
        assert_eq!(
            resolve(40, &member(36, 16, 12), true),
            Resolution::Final { span: Span { start: 28, end: 40 }, base: 0 }
        );
        assert_eq!(
            resolve(10, &first(36, 16), false),
            Resolution::Final { span: Span { start: 0, end: 52 }, base: 0 }
        );
    }

    #[test]
    fn late_timestamps_saturate() {
        let Span { end, .. } = match resolve(SENTINEL_TSF - 1, &first(36, 16), false) {
            Resolution::Final { span, .. } => span,
            other => panic!("unexpected resolution {:?}", other),
        };
        assert_eq!(end, SENTINEL_TSF);
    }

    #[test]
    fn sentinel_is_provisional() {
        assert_eq!(
            resolve(SENTINEL_TSF, &first(36, 16), true),
            Resolution::Provisional(Span { start: 0, end: 52 })
        );
        assert_eq!(
            resolve(SENTINEL_TSF, &member(36, 16, 12), true),
            Resolution::Provisional(Span { start: 52, end: 64 })
        );
    }

    #[test]
    fn spacing_is_signed() {
        assert_eq!(spacing(1_100, 1_000), 100);
        assert_eq!(spacing(1_000, 1_100), -100);
        assert_eq!(spacing(0, 0), 0);
    }

    #[test]
    fn flush_shifts_and_finalizes() {
        let mut cache = HashMap::new();
        let mut before = radio_info(FrameId(1));
        before.end_tsf = Some(9_900);
        before.timing = Some(TimingState::Final);
        cache.insert(FrameId(1), before);
        for (id, start, end) in &[(2, 0, 52), (3, 52, 64)] {
            let mut info = radio_info(FrameId(*id));
            info.start_tsf = Some(*start);
            info.end_tsf = Some(*end);
            info.timing = Some(TimingState::Provisional);
            cache.insert(FrameId(*id), info);
        }

        let mut queue = BackpatchQueue::default();
        queue.push(FrameId(2), Some(FrameId(1)));
        queue.push(FrameId(3), Some(FrameId(2)));
        assert_eq!(queue.flush(9_936, &mut cache), vec![FrameId(2), FrameId(3)]);
        assert!(queue.is_empty());

        let second = &cache[&FrameId(2)];
        assert_eq!((second.start_tsf, second.end_tsf), (Some(9_936), Some(9_988)));
        assert_eq!(second.ifs, Some(36));
        assert_matches!(second.timing, Some(TimingState::Final));
        let third = &cache[&FrameId(3)];
        assert_eq!((third.start_tsf, third.end_tsf), (Some(9_988), Some(10_000)));
        assert_eq!(third.ifs, Some(0));
    }

    #[test]
    fn flush_never_finalizes_twice() {
        let mut cache = HashMap::new();
        let mut info = radio_info(FrameId(1));
        info.start_tsf = Some(0);
        info.end_tsf = Some(52);
        info.timing = Some(TimingState::Provisional);
        cache.insert(FrameId(1), info);

        let mut queue = BackpatchQueue::default();
        queue.push(FrameId(1), None);
        queue.push(FrameId(1), None);
        assert_eq!(queue.flush(1_000, &mut cache), vec![FrameId(1)]);
        assert_eq!(cache[&FrameId(1)].start_tsf, Some(1_000));
    }

    #[test]
    fn discard_leaves_timing_provisional() {
        let mut queue = BackpatchQueue::default();
        queue.push(FrameId(1), None);
        queue.push(FrameId(2), Some(FrameId(1)));
        assert_eq!(queue.discard(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.discard(), 0);
    }
}
