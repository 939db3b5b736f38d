// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Data rate tables for every PHY generation.
//!
//! All lookups are pure. An index outside of a table, or a parameter combination that the
//! standard does not define, yields `None` rather than a clamped or approximated rate.

use {
    crate::phy::{HtBandwidth, PhyDescriptor, VhtBandwidth},
    lazy_static::lazy_static,
    log::debug,
};

pub const HT_MAX_MCS: u8 = 76;
pub const VHT_MAX_MCS: u8 = 9;
pub const VHT_MAX_NSS: u8 = 8;
pub const HE_MAX_MCS: u8 = 11;
pub const HE_MAX_NSS: u8 = 8;

const HT_MCS_DUPLICATE: u8 = 32;
// MCS 32 is a single BPSK 1/2 stream duplicated across both 20 MHz halves of a 40 MHz channel.
const HT_MCS_DUPLICATE_DBPS_40MHZ: u32 = 24;

// Data bits per OFDM symbol for a 20 MHz HT PPDU, indexed by MCS.
// IEEE Std 802.11-2016, 19.5, Tables 19-27 through 19-41.
const HT_DBPS_20MHZ: [u16; HT_MAX_MCS as usize + 1] = [
    // MCS 0-7, one spatial stream
    26, 52, 78, 104, 156, 208, 234, 260, //
    // MCS 8-15, two spatial streams
    52, 104, 156, 208, 312, 416, 468, 520, //
    // MCS 16-23, three spatial streams
    78, 156, 234, 312, 468, 624, 702, 780, //
    // MCS 24-31, four spatial streams
    104, 208, 312, 416, 624, 832, 936, 1040, //
    // MCS 32 has no 20 MHz form.
    0, //
    // MCS 33-38, two streams with unequal modulation
    156, 208, 260, 234, 312, 390, //
    // MCS 39-52, three streams with unequal modulation
    208, 260, 260, 312, 364, 364, 416, 312, 390, 390, 468, 546, 546, 624, //
    // MCS 53-76, four streams with unequal modulation
    260, 312, 364, 312, 364, 416, 468, 416, 468, 520, 520, 572, //
    390, 468, 546, 468, 546, 624, 702, 624, 702, 780, 780, 858,
];

// Data bits per symbol for a 20 MHz VHT PPDU with one spatial stream. MCS 9 does not fit a
// whole number of bits into a 20 MHz symbol.
const VHT_DBPS_20MHZ: [f32; VHT_MAX_MCS as usize + 1] =
    [26.0, 52.0, 78.0, 104.0, 156.0, 208.0, 234.0, 260.0, 312.0, 1040.0 / 3.0];

// Subcarriers carrying data or pilots for 20, 40, 80 and 160 MHz.
const VHT_SUBCARRIERS: [f32; 4] = [52.0, 108.0, 234.0, 468.0];

const Y: bool = true;
const N: bool = false;

// Valid VHT-MCS and NSS combinations, indexed by [MCS][bandwidth][NSS - 1].
// IEEE Std 802.11-2016, 21.5, Tables 21-30 through 21-61.
const VHT_VALID: [[[bool; VHT_MAX_NSS as usize]; 4]; VHT_MAX_MCS as usize + 1] = [
    [[Y; 8]; 4],
    [[Y; 8]; 4],
    [[Y; 8]; 4],
    [[Y; 8]; 4],
    [[Y; 8]; 4],
    [[Y; 8]; 4],
    // MCS 6
    [[Y; 8], [Y; 8], [Y, Y, N, Y, Y, Y, N, Y], [Y; 8]],
    [[Y; 8]; 4],
    [[Y; 8]; 4],
    // MCS 9
    [[N, N, Y, N, N, Y, N, N], [Y; 8], [Y, Y, Y, Y, Y, N, Y, Y], [Y, Y, N, Y, Y, Y, Y, Y]],
];

const HE_NUM_MCS: usize = HE_MAX_MCS as usize + 1;
const HE_NUM_BANDWIDTHS: usize = 4;
const HE_NUM_RUS: usize = 6;
const HE_NUM_GIS: usize = 3;

// Coded bits per subcarrier and coding rate for HE-MCS 0-11. IEEE Std 802.11ax-2021, 27.5.
const HE_BITS_PER_SUBCARRIER: [f64; HE_NUM_MCS] =
    [1.0, 2.0, 2.0, 4.0, 4.0, 6.0, 6.0, 6.0, 8.0, 8.0, 10.0, 10.0];
const HE_CODE_RATE: [f64; HE_NUM_MCS] = [
    1.0 / 2.0,
    1.0 / 2.0,
    3.0 / 4.0,
    1.0 / 2.0,
    3.0 / 4.0,
    2.0 / 3.0,
    3.0 / 4.0,
    5.0 / 6.0,
    3.0 / 4.0,
    5.0 / 6.0,
    3.0 / 4.0,
    5.0 / 6.0,
];
// Data subcarriers for a full 20, 40, 80 and 160 MHz HE-SU PPDU.
const HE_SU_DATA_SUBCARRIERS: [f64; HE_NUM_BANDWIDTHS] = [234.0, 468.0, 980.0, 1960.0];
// Data subcarriers for 26, 52, 106, 242, 484 and 996-tone resource units.
const HE_RU_DATA_SUBCARRIERS: [f64; HE_NUM_RUS] = [24.0, 48.0, 102.0, 234.0, 468.0, 980.0];
// 12.8 us HE symbol plus a 0.8, 1.6 or 3.2 us guard interval.
const HE_SYMBOL_US: [f64; HE_NUM_GIS] = [13.6, 14.4, 16.0];

type HeSuRates = [[[[f32; HE_NUM_GIS]; HE_NUM_BANDWIDTHS]; HE_NUM_MCS]; HE_MAX_NSS as usize];
type HeMuRates = [[[[f32; HE_NUM_GIS]; HE_NUM_RUS]; HE_NUM_MCS]; HE_MAX_NSS as usize];

lazy_static! {
    // Indexed by [NSS - 1][MCS][bandwidth][GI].
    static ref HE_SU_RATES: HeSuRates = {
        let mut rates = [[[[0.0; HE_NUM_GIS]; HE_NUM_BANDWIDTHS]; HE_NUM_MCS]; HE_MAX_NSS as usize];
        for (nss, by_mcs) in rates.iter_mut().enumerate() {
            for (mcs, by_bw) in by_mcs.iter_mut().enumerate() {
                for (bw, by_gi) in by_bw.iter_mut().enumerate() {
                    for (gi, rate) in by_gi.iter_mut().enumerate() {
                        *rate = he_table_entry(HE_SU_DATA_SUBCARRIERS[bw], mcs, nss + 1, gi);
                    }
                }
            }
        }
        rates
    };

    // Indexed by [NSS - 1][MCS][RU][GI].
    static ref HE_MU_RATES: HeMuRates = {
        let mut rates = [[[[0.0; HE_NUM_GIS]; HE_NUM_RUS]; HE_NUM_MCS]; HE_MAX_NSS as usize];
        for (nss, by_mcs) in rates.iter_mut().enumerate() {
            for (mcs, by_ru) in by_mcs.iter_mut().enumerate() {
                for (ru, by_gi) in by_ru.iter_mut().enumerate() {
                    for (gi, rate) in by_gi.iter_mut().enumerate() {
                        *rate = he_table_entry(HE_RU_DATA_SUBCARRIERS[ru], mcs, nss + 1, gi);
                    }
                }
            }
        }
        rates
    };
}

// Published HE rate tables are given to 0.1 Mb/s.
fn he_table_entry(data_subcarriers: f64, mcs: usize, nss: usize, gi: usize) -> f32 {
    let mbps = data_subcarriers * HE_BITS_PER_SUBCARRIER[mcs] * HE_CODE_RATE[mcs] * nss as f64
        / HE_SYMBOL_US[gi];
    ((mbps * 10.0).round() / 10.0) as f32
}

fn symbol_us(short_gi: bool) -> f32 {
    if short_gi {
        3.6
    } else {
        4.0
    }
}

/// Number of spatial streams implied by an HT MCS index.
pub fn ht_streams(mcs: u8) -> Option<u8> {
    match mcs {
        0..=7 => Some(1),
        8..=15 => Some(2),
        16..=23 => Some(3),
        24..=31 => Some(4),
        32 => Some(1),
        33..=38 => Some(2),
        39..=52 => Some(3),
        53..=76 => Some(4),
        _ => None,
    }
}

/// Data bits carried by one HT OFDM symbol.
///
/// 40 MHz symbols carry 108 rather than 52 data subcarriers. Every 20 MHz entry other than MCS 32
/// is a multiple of 13, so the scaled value is exact.
pub fn ht_data_bits_per_symbol(mcs: u8, bandwidth: HtBandwidth) -> Option<u32> {
    if mcs > HT_MAX_MCS {
        return None;
    }
    if mcs == HT_MCS_DUPLICATE {
        return if bandwidth.is_40mhz() { Some(HT_MCS_DUPLICATE_DBPS_40MHZ) } else { None };
    }
    let dbps = u32::from(HT_DBPS_20MHZ[mcs as usize]);
    Some(if bandwidth.is_40mhz() { dbps * 108 / 52 } else { dbps })
}

/// HT data rate in Mb/s.
pub fn ht_rate(mcs: u8, bandwidth: HtBandwidth, short_gi: bool) -> Option<f32> {
    ht_data_bits_per_symbol(mcs, bandwidth).map(|dbps| dbps as f32 / symbol_us(short_gi))
}

/// Whether the standard defines the given VHT-MCS for this bandwidth and stream count.
pub fn vht_valid(mcs: u8, bandwidth: VhtBandwidth, nss: u8) -> bool {
    if nss == 0 {
        return false;
    }
    VHT_VALID
        .get(mcs as usize)
        .and_then(|by_bw| by_bw[bandwidth.index()].get(nss as usize - 1))
        .copied()
        .unwrap_or(false)
}

/// VHT data rate in Mb/s for one user.
pub fn vht_rate(mcs: u8, bandwidth: VhtBandwidth, nss: u8, short_gi: bool) -> Option<f32> {
    if !vht_valid(mcs, bandwidth, nss) {
        return None;
    }
    Some(
        VHT_DBPS_20MHZ[mcs as usize] * VHT_SUBCARRIERS[bandwidth.index()]
            / symbol_us(short_gi)
            / 52.0
            * nss as f32,
    )
}

/// HE-SU data rate in Mb/s. `bandwidth` and `gi` are the table indices documented on
/// [`HeInfo`](crate::phy::HeInfo) and [`HeUser`](crate::phy::HeUser).
pub fn he_su_rate(nss: u8, mcs: u8, bandwidth: u8, gi: u8) -> Option<f32> {
    HE_SU_RATES
        .get((nss as usize).checked_sub(1)?)?
        .get(mcs as usize)?
        .get(bandwidth as usize)?
        .get(gi as usize)
        .copied()
}

/// HE-MU data rate in Mb/s for one OFDMA user occupying resource unit `ru`.
pub fn he_mu_rate(nss: u8, mcs: u8, ru: u8, gi: u8) -> Option<f32> {
    HE_MU_RATES
        .get((nss as usize).checked_sub(1)?)?
        .get(mcs as usize)?
        .get(ru as usize)?
        .get(gi as usize)
        .copied()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegacyModulation {
    DsssCck,
    Ofdm,
}

// Legacy rates in units of 500 kb/s.
const DSSS_CCK_RATES: [u16; 4] = [2, 4, 11, 22];
const OFDM_RATES: [u16; 8] = [12, 18, 24, 36, 48, 72, 96, 108];

/// Identifies the legacy modulation family from an exact rate match. `rate` is in units of
/// 500 kb/s.
pub fn classify_legacy_rate(rate: u16) -> Option<LegacyModulation> {
    if DSSS_CCK_RATES.contains(&rate) {
        Some(LegacyModulation::DsssCck)
    } else if OFDM_RATES.contains(&rate) {
        Some(LegacyModulation::Ofdm)
    } else {
        None
    }
}

/// Data rate of a frame in Mb/s, or `None` if it cannot be determined.
pub fn data_rate(phy: &PhyDescriptor) -> Option<f32> {
    let rate = match phy {
        PhyDescriptor::Fhss(info) => return info.rate.map(half_mbps),
        PhyDescriptor::Dsss(info) => return info.rate.map(half_mbps),
        PhyDescriptor::Ofdm(info) => return info.rate.map(half_mbps),
        PhyDescriptor::Erp(info) => return info.rate.map(half_mbps),
        PhyDescriptor::Unknown(info) => return info.rate.map(half_mbps),
        PhyDescriptor::Ht(ht) => {
            let (mcs, bandwidth, short_gi) = (ht.mcs?, ht.bandwidth?, ht.short_gi?);
            ht_rate(mcs, bandwidth, short_gi)
        }
        PhyDescriptor::Vht(vht) => {
            let user = vht.primary_user();
            let (mcs, nss) = (user.mcs?, user.nss?);
            vht_rate(mcs, vht.bandwidth?, nss, vht.short_gi?)
        }
        PhyDescriptor::He(he) => {
            let user = he.primary_user();
            let (mcs, nss, gi) = (user.mcs?, user.nss?, user.gi?);
            match user.ru {
                Some(ru) => he_mu_rate(nss, mcs, ru, gi),
                None => he_su_rate(nss, mcs, he.bandwidth?, gi),
            }
        }
    };
    if rate.is_none() {
        debug!("no {} rate defined for {:?}", phy.phy_type(), phy);
    }
    rate
}

fn half_mbps(rate: u16) -> f32 {
    rate as f32 / 2.0
}
