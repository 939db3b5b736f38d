// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! A-MPDU reconstruction.
//!
//! Capture generators report the subframes of an A-MPDU as separate frames and disagree on how to
//! mark that they share one PPDU. Three conventions are recognized, all keyed on the timestamps of
//! two consecutive HT or VHT frames:
//!
//! * every subframe carries the same timestamp,
//! * the first subframe carries the timestamp and the rest report zero,
//! * every subframe but the last carries the `u64::MAX` sentinel and the last carries the
//!   timestamp.
//!
//! An aggregate is only recognized once its second subframe is seen, so the first subframe is
//! attached to it retroactively.

use {
    crate::{
        phy::{PhyDescriptor, PhyType},
        timing::SENTINEL_TSF,
        tracker::PreviousFrame,
        FrameId,
    },
    log::debug,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Each subframe after the first is preceded by a 4-byte MPDU delimiter. IEEE Std 802.11-2016,
/// 9.7.1.
const MPDU_DELIMITER_BYTES: u64 = 4;

/// Handle to an aggregate owned by a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(pub(crate) usize);

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-MPDU {}", self.0)
    }
}

/// How the capture generator marked two frames as sharing a PPDU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstConvention {
    IdenticalTimestamps,
    ZeroAfterFirst,
    Sentinel,
}

/// Decides whether the frame after `previous` continues the same PPDU.
pub(crate) fn continues_burst(
    previous: &PreviousFrame,
    phy: PhyType,
    tsf: Option<u64>,
    aggregate_open: bool,
) -> Option<BurstConvention> {
    if previous.phy != phy || !phy.supports_aggregation() {
        return None;
    }
    let (previous_tsf, tsf) = (previous.tsf?, tsf?);
    if previous_tsf == tsf {
        Some(BurstConvention::IdenticalTimestamps)
    } else if !aggregate_open && previous_tsf != 0 && tsf == 0 {
        Some(BurstConvention::ZeroAfterFirst)
    } else if previous_tsf == SENTINEL_TSF {
        Some(BurstConvention::Sentinel)
    } else {
        None
    }
}

/// Bytes of the A-MPDU that precede a subframe, given the bytes seen so far in the PPDU.
///
/// The running length is padded to a 4-byte boundary and one delimiter is added. Three 100-byte
/// subframes therefore sit at 0, 104 and 208: the second subframe follows the 100-byte first one
/// plus its delimiter, and 204 bytes are already aligned, so only the third subframe's delimiter
/// is added. `None` if the PPDU has grown past what a `u64` can count.
pub(crate) fn prior_aggregate_bytes(running_len: u64) -> Option<u64> {
    running_len.checked_add(3).map(|len| len & !3)?.checked_add(MPDU_DELIMITER_BYTES)
}

/// An A-MPDU reconstructed from consecutive subframes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub id: AggregateId,
    /// PHY parameters used to time every member. Replaced by a member reporting a higher MCS,
    /// never by one reporting a lower MCS.
    pub phy: PhyDescriptor,
    /// Members in capture order.
    pub members: Vec<FrameId>,
    /// Most recent signal reading of any member.
    pub signal_dbm: Option<i8>,
    /// Airtime of the whole PPDU, known once the aggregate has been closed.
    pub duration: Option<u32>,
    pub closed: bool,
}

impl Aggregate {
    fn new(id: AggregateId, first: &PreviousFrame) -> Self {
        Self {
            id,
            phy: first.descriptor.clone(),
            members: vec![first.id],
            signal_dbm: first.signal_dbm,
            duration: None,
            closed: false,
        }
    }

    /// Adopts `observed` as the aggregate's descriptor if it reports a higher MCS. Generators
    /// under-report the rate of subframes that failed their FCS check.
    pub(crate) fn reconcile(&mut self, observed: &PhyDescriptor) {
        if observed.phy_type() == self.phy.phy_type()
            && observed.ranking_mcs() > self.phy.ranking_mcs()
        {
            debug!(
                "{}: MCS raised from {:?} to {:?}",
                self.id,
                self.phy.ranking_mcs(),
                observed.ranking_mcs()
            );
            self.phy = observed.clone();
        }
    }

    pub(crate) fn close(&mut self, duration: Option<u32>) {
        if !self.closed {
            self.closed = true;
            self.duration = duration;
            debug!("{} closed with {} members", self.id, self.members.len());
        }
    }
}

/// Owns every aggregate of a capture; frames refer to them by `AggregateId`.
#[derive(Debug, Default)]
pub(crate) struct Aggregates(Vec<Aggregate>);

impl Aggregates {
    /// Creates an aggregate whose first member is `first`.
    pub fn open(&mut self, first: &PreviousFrame) -> AggregateId {
        let id = AggregateId(self.0.len());
        debug!("{} opened at frame {}", id, first.id);
        self.0.push(Aggregate::new(id, first));
        id
    }

    pub fn get(&self, id: AggregateId) -> Option<&Aggregate> {
        self.0.get(id.0)
    }

    pub fn get_mut(&mut self, id: AggregateId) -> Option<&mut Aggregate> {
        self.0.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aggregate> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::phy::{HtBandwidth, HtInfo, VhtInfo},
        test_case::test_case,
    };

    fn previous(phy: PhyDescriptor, tsf: Option<u64>) -> PreviousFrame {
        PreviousFrame {
            id: FrameId(1),
            phy: phy.phy_type(),
            tsf,
            descriptor: phy,
            signal_dbm: Some(-40),
        }
    }

    fn ht(mcs: u8) -> PhyDescriptor {
        PhyDescriptor::Ht(HtInfo {
            mcs: Some(mcs),
            bandwidth: Some(HtBandwidth::Cbw20),
            short_gi: Some(false),
            ..Default::default()
        })
    }

    #[test_case(
        Some(1000), Some(1000), false => Some(BurstConvention::IdenticalTimestamps) ; "identical"
    )]
    #[test_case(
        Some(1000), Some(0), false => Some(BurstConvention::ZeroAfterFirst) ; "zero after first"
    )]
    #[test_case(Some(1000), Some(0), true => None ; "zero with aggregate open")]
    #[test_case(
        Some(0), Some(0), true => Some(BurstConvention::IdenticalTimestamps) ; "zero members"
    )]
    #[test_case(
        Some(SENTINEL_TSF), Some(5000), true => Some(BurstConvention::Sentinel) ; "sentinel"
    )]
    #[test_case(Some(1000), Some(1100), false => None ; "new burst")]
    #[test_case(None, Some(1000), false => None ; "previous without timestamp")]
    #[test_case(Some(1000), None, false => None ; "current without timestamp")]
    fn burst_conventions(
        previous_tsf: Option<u64>,
        tsf: Option<u64>,
        aggregate_open: bool,
    ) -> Option<BurstConvention> {
        continues_burst(&previous(ht(7), previous_tsf), PhyType::Ht, tsf, aggregate_open)
    }

    #[test]
    fn only_matching_ht_or_vht_frames_continue() {
        let prev = previous(ht(7), Some(1000));
        assert_eq!(continues_burst(&prev, PhyType::Vht, Some(1000), false), None);
        let prev = previous(PhyDescriptor::default(), Some(1000));
        assert_eq!(continues_burst(&prev, PhyType::Unknown, Some(1000), false), None);
        let prev = previous(PhyDescriptor::Vht(VhtInfo::default()), Some(1000));
        assert_eq!(
            continues_burst(&prev, PhyType::Vht, Some(1000), false),
            Some(BurstConvention::IdenticalTimestamps)
        );
    }

    #[test_case(100 => Some(104) ; "aligned")]
    #[test_case(204 => Some(208) ; "aligned second")]
    #[test_case(101 => Some(108) ; "padded")]
    #[test_case(0 => Some(4) ; "empty")]
    #[test_case(u64::MAX - 2 => None ; "padding overflows")]
    #[test_case(u64::MAX - 7 => None ; "delimiter overflows")]
    fn prior_bytes(running_len: u64) -> Option<u64> {
        prior_aggregate_bytes(running_len)
    }

    #[test]
    fn reconcile_never_downgrades() {
        let mut aggregates = Aggregates::default();
        let id = aggregates.open(&previous(ht(5), Some(1000)));
        let aggregate = aggregates.get_mut(id).expect("aggregate exists");
        assert_eq!(aggregate.members, vec![FrameId(1)]);
        assert_eq!(aggregate.signal_dbm, Some(-40));

        aggregate.reconcile(&ht(3));
        assert_eq!(aggregate.phy, ht(5));
        aggregate.reconcile(&ht(7));
        assert_eq!(aggregate.phy, ht(7));
        aggregate.reconcile(&PhyDescriptor::Ht(HtInfo::default()));
        assert_eq!(aggregate.phy, ht(7));
    }

    #[test]
    fn reconcile_replaces_missing_mcs() {
        let mut aggregates = Aggregates::default();
        let id = aggregates.open(&previous(PhyDescriptor::Ht(HtInfo::default()), Some(1000)));
        let aggregate = aggregates.get_mut(id).expect("aggregate exists");
        aggregate.reconcile(&ht(0));
        assert_eq!(aggregate.phy, ht(0));
    }

    #[test]
    fn close_records_duration_once() {
        let mut aggregates = Aggregates::default();
        let id = aggregates.open(&previous(ht(7), Some(1000)));
        let aggregate = aggregates.get_mut(id).expect("aggregate exists");
        aggregate.close(Some(80));
        aggregate.close(Some(120));
        assert!(aggregate.closed);
        assert_eq!(aggregate.duration, Some(80));
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates.get(AggregateId(1)), None);
    }
}
