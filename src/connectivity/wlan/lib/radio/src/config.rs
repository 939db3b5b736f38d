// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::error::Error,
    serde::{Deserialize, Serialize},
};

/// Options that change how radio metadata is derived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Timestamps mark the end of the PPDU (or of the whole burst) rather than the start of the
    /// frame.
    pub tsf_at_end: bool,
    /// Treat every 802.11b/g DSSS/CCK frame as using a short preamble, whatever the generator
    /// reported.
    pub always_short_preamble: bool,
    /// Experimental: emit a timeline entry for every frame once its timing is final.
    pub timeline: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self { tsf_at_end: true, always_short_preamble: false, timeline: false }
    }
}

impl RadioConfig {
    /// Parses a configuration from JSON. Absent keys keep their default values.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}
