// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {crate::FrameId, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    #[error("frame {frame} visited out of capture order; last processed frame was {last}")]
    OutOfOrder { frame: FrameId, last: FrameId },
    #[error("capture already finished; reset the session before processing frame {0}")]
    CaptureFinished(FrameId),
    #[error("invalid radio configuration: {0}")]
    Config(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let error = Error::OutOfOrder { frame: FrameId(3), last: FrameId(7) };
        assert_eq!(
            error.to_string(),
            "frame 3 visited out of capture order; last processed frame was 7"
        );
        assert_eq!(
            Error::CaptureFinished(FrameId(12)).to_string(),
            "capture already finished; reset the session before processing frame 12"
        );
    }
}
