// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::phy::PhyType,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// A default the calculators substituted for a field the generator did not report, or a known
/// limitation that affected a derived value. Each substitution is reported exactly once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    /// 802.11b/g preamble flag absent; a short preamble was assumed.
    ShortPreambleAssumed,
    /// HT greenfield flag absent; mixed format was assumed.
    MixedFormatAssumed,
    /// HT STBC stream count absent; zero was assumed.
    StbcStreamsAssumedZero,
    /// HT extension spatial stream count absent; zero was assumed.
    ExtensionStreamsAssumedZero,
    /// HT FEC type absent; BCC was assumed.
    BccAssumed,
    /// The frame used LDPC, whose padding is not modelled. BCC rounding was used instead.
    LdpcTimedAsBcc,
    /// VHT STBC flag absent; no STBC was assumed.
    VhtStbcAssumedAbsent,
    /// The reported PHY was ambiguous and the rate identified the actual modulation.
    Reclassified { from: PhyType, to: PhyType },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::ShortPreambleAssumed => {
                write!(f, "short/long preamble flag not present, assuming short preamble")
            }
            Advisory::MixedFormatAssumed => {
                write!(f, "greenfield flag not present, assuming mixed format")
            }
            Advisory::StbcStreamsAssumedZero => {
                write!(f, "STBC stream count not present, assuming no STBC")
            }
            Advisory::ExtensionStreamsAssumedZero => {
                write!(f, "extension spatial stream count not present, assuming none")
            }
            Advisory::BccAssumed => write!(f, "FEC type not present, assuming BCC"),
            Advisory::LdpcTimedAsBcc => {
                write!(f, "LDPC padding is not modelled, duration computed as for BCC")
            }
            Advisory::VhtStbcAssumedAbsent => write!(f, "STBC flag not present, assuming no STBC"),
            Advisory::Reclassified { from, to } => {
                write!(f, "{} frame timed as {} based on its data rate", from, to)
            }
        }
    }
}

/// Ordered set of advisories raised while processing one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisories(Vec<Advisory>);

impl Advisories {
    pub fn push(&mut self, advisory: Advisory) {
        if !self.0.contains(&advisory) {
            self.0.push(advisory);
        }
    }

    pub fn contains(&self, advisory: &Advisory) -> bool {
        self.0.contains(advisory)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Advisory> {
        self.0.iter()
    }
}
