// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Normalized PHY descriptors.
//!
//! A `PhyDescriptor` is what the capture-format layer hands to this crate once it has decoded a
//! pseudo-header. Every generation-specific field is optional: generators routinely omit fields,
//! and an absent field must never be read as zero. Where a calculation needs a value that was not
//! reported, the calculator substitutes a documented default and records an
//! [`Advisory`](crate::advisory::Advisory).

use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// PHY generation of a captured frame, without any of its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhyType {
    /// IEEE Std 802.11-2016, Clause 15 (1997 FHSS).
    Fhss,
    /// 802.11b: DSSS and HR/DSSS (CCK).
    Dsss,
    /// 802.11a: OFDM.
    Ofdm,
    /// 802.11g: ERP, either ERP-DSSS/CCK or ERP-OFDM.
    Erp,
    Ht,
    Vht,
    He,
    Unknown,
}

impl PhyType {
    /// Only HT and VHT PPDUs carry A-MPDUs that generators report frame by frame.
    pub fn supports_aggregation(&self) -> bool {
        match self {
            PhyType::Ht | PhyType::Vht => true,
            _ => false,
        }
    }
}

impl fmt::Display for PhyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhyType::Fhss => "802.11 FHSS",
            PhyType::Dsss => "802.11b",
            PhyType::Ofdm => "802.11a",
            PhyType::Erp => "802.11g",
            PhyType::Ht => "802.11n",
            PhyType::Vht => "802.11ac",
            PhyType::He => "802.11ax",
            PhyType::Unknown => "unknown PHY",
        };
        f.write_str(name)
    }
}

/// Channel bandwidth as reported for HT PPDUs.
///
/// `Cbw20Lower` and `Cbw20Upper` are 20 MHz transmissions in one half of a 40 MHz channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HtBandwidth {
    Cbw20,
    Cbw40,
    Cbw20Lower,
    Cbw20Upper,
}

impl HtBandwidth {
    pub fn is_40mhz(&self) -> bool {
        *self == HtBandwidth::Cbw40
    }
}

/// Channel bandwidth class for VHT PPDUs. 80+80 MHz is reported as `Cbw160`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VhtBandwidth {
    Cbw20,
    Cbw40,
    Cbw80,
    Cbw160,
}

impl VhtBandwidth {
    pub(crate) fn index(&self) -> usize {
        match self {
            VhtBandwidth::Cbw20 => 0,
            VhtBandwidth::Cbw40 => 1,
            VhtBandwidth::Cbw80 => 2,
            VhtBandwidth::Cbw160 => 3,
        }
    }
}

/// Forward error correction used for the data field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fec {
    Bcc,
    Ldpc,
}

/// Modulation family of an 802.11g frame, when the generator says which one it used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErpModulation {
    Cck,
    Ofdm,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FhssInfo {
    /// In units of 500 kb/s.
    pub rate: Option<u16>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DsssInfo {
    /// In units of 500 kb/s.
    pub rate: Option<u16>,
    pub short_preamble: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfdmInfo {
    /// In units of 500 kb/s.
    pub rate: Option<u16>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErpInfo {
    /// In units of 500 kb/s.
    pub rate: Option<u16>,
    pub short_preamble: Option<bool>,
    pub modulation: Option<ErpModulation>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtInfo {
    /// IEEE Std 802.11-2016, 19.3.5.
    pub mcs: Option<u8>,
    pub bandwidth: Option<HtBandwidth>,
    pub short_gi: Option<bool>,
    pub greenfield: Option<bool>,
    pub fec: Option<Fec>,
    /// Number of STBC streams (N_STS - N_SS), 0 to 3.
    pub stbc_streams: Option<u8>,
    /// Number of extension spatial streams (N_ESS), 0 to 3.
    pub extension_streams: Option<u8>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VhtUser {
    pub mcs: Option<u8>,
    pub nss: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VhtInfo {
    pub bandwidth: Option<VhtBandwidth>,
    pub short_gi: Option<bool>,
    pub stbc: Option<bool>,
    /// Up to four MU-MIMO users; single-user PPDUs only fill the first entry.
    pub users: [VhtUser; 4],
}

impl VhtInfo {
    pub fn primary_user(&self) -> &VhtUser {
        &self.users[0]
    }
}

/// One user of an HE PPDU. HE parameters are kept as raw table indices so that the rate lookup
/// can reject out-of-range values instead of clamping them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeUser {
    pub mcs: Option<u8>,
    pub nss: Option<u8>,
    /// 0: 0.8 us, 1: 1.6 us, 2: 3.2 us.
    pub gi: Option<u8>,
    /// Resource unit of an MU-OFDMA user. 0: 26-tone, 1: 52, 2: 106, 3: 242, 4: 484, 5: 996.
    pub ru: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeInfo {
    /// 0: 20 MHz, 1: 40 MHz, 2: 80 MHz, 3: 160 MHz.
    pub bandwidth: Option<u8>,
    /// Up to four users; single-user PPDUs only fill the first entry.
    pub users: [HeUser; 4],
}

impl HeInfo {
    /// The user whose parameters the reported rate is derived from.
    pub fn primary_user(&self) -> &HeUser {
        &self.users[0]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnknownInfo {
    /// In units of 500 kb/s.
    pub rate: Option<u16>,
}

/// PHY parameters of one captured frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phy", rename_all = "snake_case")]
pub enum PhyDescriptor {
    Fhss(FhssInfo),
    Dsss(DsssInfo),
    Ofdm(OfdmInfo),
    Erp(ErpInfo),
    Ht(HtInfo),
    Vht(VhtInfo),
    He(HeInfo),
    Unknown(UnknownInfo),
}

impl Default for PhyDescriptor {
    fn default() -> Self {
        PhyDescriptor::Unknown(UnknownInfo::default())
    }
}

impl PhyDescriptor {
    pub fn phy_type(&self) -> PhyType {
        match self {
            PhyDescriptor::Fhss(_) => PhyType::Fhss,
            PhyDescriptor::Dsss(_) => PhyType::Dsss,
            PhyDescriptor::Ofdm(_) => PhyType::Ofdm,
            PhyDescriptor::Erp(_) => PhyType::Erp,
            PhyDescriptor::Ht(_) => PhyType::Ht,
            PhyDescriptor::Vht(_) => PhyType::Vht,
            PhyDescriptor::He(_) => PhyType::He,
            PhyDescriptor::Unknown(_) => PhyType::Unknown,
        }
    }

    /// The MCS index used to rank aggregate members against each other. For VHT this is the
    /// first user's MCS.
    pub(crate) fn ranking_mcs(&self) -> Option<u8> {
        match self {
            PhyDescriptor::Ht(ht) => ht.mcs,
            PhyDescriptor::Vht(vht) => vht.primary_user().mcs,
            _ => None,
        }
    }
}
