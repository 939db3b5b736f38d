// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Preamble and on-air duration of a PPDU, per PHY generation.
//!
//! Durations are whole microseconds. For A-MPDU subframes after the first, only the incremental
//! time the subframe adds to the data field is charged: `data(prior + len) - data(prior)`, with the
//! shared preamble already accounted for by the first subframe.

use {
    crate::{
        advisory::{Advisories, Advisory},
        config::RadioConfig,
        phy::{ErpModulation, Fec, HtInfo, PhyDescriptor, PhyType, VhtInfo},
        rates::{
            classify_legacy_rate, data_rate, ht_data_bits_per_symbol, ht_streams,
            LegacyModulation,
        },
    },
    log::debug,
    std::convert::TryFrom,
};

const DSSS_LONG_PREAMBLE_US: u32 = 192;
const DSSS_SHORT_PREAMBLE_US: u32 = 96;
const OFDM_PREAMBLE_US: u32 = 20;
const OFDM_SYMBOL_US: u32 = 4;
// SERVICE field and tail bits of an OFDM data field.
const OFDM_SERVICE_BITS: u64 = 16;
const OFDM_TAIL_BITS: u64 = 6;

const HT_GREENFIELD_PREAMBLE_US: u32 = 24;
const HT_MIXED_PREAMBLE_US: u32 = 32;
const HT_LTF_US: u32 = 4;
// HT-LTFs needed for the data dimensions, indexed by N_STS - 1. IEEE Std 802.11-2016, Table 19-13.
const HT_DATA_LTFS: [u32; 4] = [1, 2, 4, 4];
// HT-LTFs needed for extension spatial streams, indexed by N_ESS. IEEE Std 802.11-2016,
// Table 19-14.
const HT_EXTENSION_LTFS: [u32; 4] = [0, 1, 2, 4];
// A second BCC encoder is used once the rate exceeds 300 Mb/s, i.e. above 1080 bits per 3.6 us
// symbol.
const HT_SINGLE_ENCODER_MAX_DBPS: u32 = 1080;

const VHT_PREAMBLE_US: u32 = 32;
const VHT_LTF_US: u32 = 4;

/// Position of a frame inside an A-MPDU when its airtime is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subframe {
    /// The frame is not (yet) known to be part of an aggregate and carries its own preamble.
    Single,
    /// A later member of an aggregate that follows `prior_bytes` bytes of earlier subframes.
    Continuation { prior_bytes: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Airtime {
    /// PPDU preamble in microseconds.
    pub preamble: u32,
    /// Microseconds of the data field attributable to this frame.
    pub data: u32,
    /// False for aggregate members whose preamble was charged to an earlier subframe.
    pub carries_preamble: bool,
}

impl Airtime {
    /// The preamble time included in `duration()`.
    pub fn charged_preamble(&self) -> u32 {
        if self.carries_preamble {
            self.preamble
        } else {
            0
        }
    }

    /// On-air time charged to this frame.
    pub fn duration(&self) -> u32 {
        self.charged_preamble().saturating_add(self.data)
    }

    // Airtime whose data time and total duration both fit the microsecond fields.
    fn checked(preamble: u32, data: u64, carries_preamble: bool) -> Option<Self> {
        let data = u32::try_from(data).ok()?;
        preamble.checked_add(data)?;
        Some(Self { preamble, data, carries_preamble })
    }
}

/// Rate and airtime derived from one frame's descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhyTiming {
    /// PHY the frame was timed as. Differs from the reported PHY after reclassification.
    pub phy: PhyType,
    /// Mb/s.
    pub rate: Option<f32>,
    pub airtime: Option<Airtime>,
}

/// Computes the rate and airtime of a frame.
///
/// `len` is the MPDU length including the FCS. The duration is `None` when it cannot be derived
/// from the descriptor or does not fit in a `u32` of microseconds.
pub fn phy_timing(
    phy: &PhyDescriptor,
    len: u64,
    subframe: Subframe,
    config: &RadioConfig,
    advisories: &mut Advisories,
) -> PhyTiming {
    let rate = data_rate(phy);
    let (timed_as, airtime) = match phy {
        PhyDescriptor::Fhss(_) | PhyDescriptor::He(_) => (phy.phy_type(), None),
        PhyDescriptor::Dsss(info) => (
            PhyType::Dsss,
            info.rate.and_then(|r| dsss_airtime(r, info.short_preamble, len, config, advisories)),
        ),
        PhyDescriptor::Ofdm(info) => (PhyType::Ofdm, info.rate.and_then(|r| ofdm_airtime(r, len))),
        PhyDescriptor::Erp(info) => match (info.rate, info.modulation) {
            (Some(r), Some(ErpModulation::Cck)) => (
                PhyType::Erp,
                dsss_airtime(r, info.short_preamble, len, config, advisories),
            ),
            (Some(r), Some(ErpModulation::Ofdm)) => (PhyType::Erp, ofdm_airtime(r, len)),
            (Some(r), None) => {
                legacy_by_rate(PhyType::Erp, r, info.short_preamble, len, config, advisories)
            }
            (None, _) => (PhyType::Erp, None),
        },
        PhyDescriptor::Unknown(info) => match info.rate {
            Some(r) => legacy_by_rate(PhyType::Unknown, r, None, len, config, advisories),
            None => (PhyType::Unknown, None),
        },
        PhyDescriptor::Ht(ht) => (PhyType::Ht, ht_airtime(ht, len, subframe, advisories)),
        PhyDescriptor::Vht(vht) => (
            PhyType::Vht,
            rate.and_then(|rate| vht_airtime(vht, rate, len, subframe, advisories)),
        ),
    };
    if airtime.is_none() {
        debug!("duration of {} frame unavailable", timed_as);
    }
    PhyTiming { phy: timed_as, rate, airtime }
}

// Some generators mislabel the modulation of legacy frames. An exact rate match decides.
fn legacy_by_rate(
    reported: PhyType,
    rate: u16,
    short_preamble: Option<bool>,
    len: u64,
    config: &RadioConfig,
    advisories: &mut Advisories,
) -> (PhyType, Option<Airtime>) {
    match classify_legacy_rate(rate) {
        Some(LegacyModulation::DsssCck) => {
            advisories.push(Advisory::Reclassified { from: reported, to: PhyType::Dsss });
            (PhyType::Dsss, dsss_airtime(rate, short_preamble, len, config, advisories))
        }
        Some(LegacyModulation::Ofdm) => {
            advisories.push(Advisory::Reclassified { from: reported, to: PhyType::Ofdm });
            (PhyType::Ofdm, ofdm_airtime(rate, len))
        }
        None => (reported, None),
    }
}

/// DSSS/CCK airtime. `rate` is in units of 500 kb/s.
pub fn dsss_airtime(
    rate: u16,
    short_preamble: Option<bool>,
    len: u64,
    config: &RadioConfig,
    advisories: &mut Advisories,
) -> Option<Airtime> {
    if rate == 0 {
        return None;
    }
    let preamble = if config.always_short_preamble {
        DSSS_SHORT_PREAMBLE_US
    } else {
        match short_preamble {
            Some(true) => DSSS_SHORT_PREAMBLE_US,
            Some(false) => DSSS_LONG_PREAMBLE_US,
            None => {
                advisories.push(Advisory::ShortPreambleAssumed);
                DSSS_SHORT_PREAMBLE_US
            }
        }
    };
    // 8 * len bits at rate / 2 Mb/s.
    let data = div_ceil(len.checked_mul(16)?, u64::from(rate))?;
    Airtime::checked(preamble, data, true)
}

/// OFDM (802.11a/g) airtime. `rate` is in units of 500 kb/s.
pub fn ofdm_airtime(rate: u16, len: u64) -> Option<Airtime> {
    if rate == 0 {
        return None;
    }
    let bits = len.checked_mul(8)?.checked_add(OFDM_SERVICE_BITS + OFDM_TAIL_BITS)?;
    // rate / 2 Mb/s over a 4 us symbol.
    let bits_per_symbol = 2 * u64::from(rate);
    let symbols = div_ceil(bits, bits_per_symbol)?;
    Airtime::checked(OFDM_PREAMBLE_US, symbols.checked_mul(u64::from(OFDM_SYMBOL_US))?, true)
}

fn ht_airtime(
    ht: &HtInfo,
    len: u64,
    subframe: Subframe,
    advisories: &mut Advisories,
) -> Option<Airtime> {
    let (mcs, bandwidth, short_gi) = (ht.mcs?, ht.bandwidth?, ht.short_gi?);
    let dbps = ht_data_bits_per_symbol(mcs, bandwidth)?;
    let nss = ht_streams(mcs)?;

    let stbc = ht.stbc_streams.unwrap_or_else(|| {
        advisories.push(Advisory::StbcStreamsAssumedZero);
        0
    });
    let ness = ht.extension_streams.unwrap_or_else(|| {
        advisories.push(Advisory::ExtensionStreamsAssumedZero);
        0
    });
    let nsts = usize::from(nss) + usize::from(stbc);
    let ltfs = HT_DATA_LTFS.get(nsts - 1)? + HT_EXTENSION_LTFS.get(usize::from(ness))?;

    let preamble = match ht.greenfield {
        Some(true) => HT_GREENFIELD_PREAMBLE_US,
        Some(false) => HT_MIXED_PREAMBLE_US,
        None => {
            advisories.push(Advisory::MixedFormatAssumed);
            HT_MIXED_PREAMBLE_US
        }
    } + HT_LTF_US * ltfs;

    match ht.fec {
        Some(Fec::Bcc) => (),
        Some(Fec::Ldpc) => advisories.push(Advisory::LdpcTimedAsBcc),
        None => advisories.push(Advisory::BccAssumed),
    }

    let encoders = if dbps > HT_SINGLE_ENCODER_MAX_DBPS { 2 } else { 1 };
    let stbc_multiplier = if stbc > 0 { 2 } else { 1 };
    charge(preamble, len, subframe, |bytes| {
        ht_data_us(bytes, u64::from(dbps), encoders, stbc_multiplier, short_gi)
    })
}

// BCC data field time, rounded to 0.1 us and then to a whole microsecond.
fn ht_data_us(
    bytes: u64,
    dbps: u64,
    encoders: u64,
    stbc_multiplier: u64,
    short_gi: bool,
) -> Option<u64> {
    let bits =
        bytes.checked_mul(8)?.checked_add(OFDM_SERVICE_BITS + OFDM_TAIL_BITS * encoders)?;
    let symbols = stbc_multiplier * div_ceil(bits, stbc_multiplier * dbps)?;
    let tenths = symbols.checked_mul(if short_gi { 36 } else { 40 })?;
    Some(tenths.checked_add(5)? / 10)
}

// The VHT data field is approximated from the rate alone; it is not symbol exact.
fn vht_airtime(
    vht: &VhtInfo,
    rate: f32,
    len: u64,
    subframe: Subframe,
    advisories: &mut Advisories,
) -> Option<Airtime> {
    let nss = u32::from(vht.primary_user().nss?);
    let stbc_factor = match vht.stbc {
        Some(stbc) => u32::from(stbc) + 1,
        None => {
            advisories.push(Advisory::VhtStbcAssumedAbsent);
            1
        }
    };
    let preamble = VHT_PREAMBLE_US + VHT_LTF_US * nss * stbc_factor;
    charge(preamble, len, subframe, |bytes| {
        let bits = bytes.checked_mul(8)?.checked_add(OFDM_SERVICE_BITS)?;
        Some((bits as f64 / f64::from(rate)).floor() as u64)
    })
}

fn charge(
    preamble: u32,
    len: u64,
    subframe: Subframe,
    data_us: impl Fn(u64) -> Option<u64>,
) -> Option<Airtime> {
    match subframe {
        Subframe::Single => Airtime::checked(preamble, data_us(len)?, true),
        Subframe::Continuation { prior_bytes } => {
            let total = data_us(prior_bytes.checked_add(len)?)?;
            Airtime::checked(preamble, total.saturating_sub(data_us(prior_bytes)?), false)
        }
    }
}

fn div_ceil(n: u64, d: u64) -> Option<u64> {
    if d == 0 {
        return None;
    }
    Some(n / d + u64::from(n % d != 0))
}
