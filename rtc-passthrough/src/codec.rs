/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Codec identities shared between the session facade and the platform boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An enumeration of the video codecs the pass-through pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodec {
    Vp8,
    Vp9,
    H264,
    /// Anything the platform cannot name; never decodable here.
    Unknown,
}

impl VideoCodec {
    /// Maps an SDP payload name ("VP8", "VP9", "H264") to a codec identity.
    /// Matching is case-insensitive, as payload names are in practice.
    pub fn from_payload_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "VP8" => VideoCodec::Vp8,
            "VP9" => VideoCodec::Vp9,
            "H264" => VideoCodec::H264,
            _ => VideoCodec::Unknown,
        }
    }

    /// The canonical upper-case codec name used for capability lookups.
    pub fn name(&self) -> &'static str {
        match self {
            VideoCodec::Vp8 => "VP8",
            VideoCodec::Vp9 => "VP9",
            VideoCodec::H264 => "H264",
            VideoCodec::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_names_are_case_insensitive() {
        assert_eq!(VideoCodec::from_payload_name("vp8"), VideoCodec::Vp8);
        assert_eq!(VideoCodec::from_payload_name("VP9"), VideoCodec::Vp9);
        assert_eq!(VideoCodec::from_payload_name("h264"), VideoCodec::H264);
    }

    #[test]
    fn unrecognized_payload_is_unknown() {
        assert_eq!(VideoCodec::from_payload_name("AV1"), VideoCodec::Unknown);
        assert_eq!(VideoCodec::from_payload_name(""), VideoCodec::Unknown);
    }
}
