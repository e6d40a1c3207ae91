/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Platform decode capability lookup.
//!
//! The pipeline queries capabilities exactly once, when a decoder instance is
//! created; a codec without a hardware capability never gets an instance and
//! the caller falls back to a different decoder entirely.

use serde::{Deserialize, Serialize};

use crate::codec::VideoCodec;

/// What the platform's hardware decoder can do for one codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecCapability {
    pub codec: VideoCodec,
    pub max_width: u32,
    pub max_height: u32,
    pub max_frame_rate: u32,
    /// How many scalable spatial layers a hardware session can multiplex.
    /// Hardware sessions generally handle only the base layer.
    pub max_spatial_layers: u32,
}

impl CodecCapability {
    pub fn new(codec: VideoCodec, max_width: u32, max_height: u32, max_frame_rate: u32) -> Self {
        Self {
            codec,
            max_width,
            max_height,
            max_frame_rate,
            max_spatial_layers: 1,
        }
    }

    pub fn supports_spatial_index(&self, index: u32) -> bool {
        index < self.max_spatial_layers
    }
}

/// Abstracts over the platform's codec capability table.
pub trait MediaCapabilities: Send + Sync {
    fn codec_capability(&self, codec: VideoCodec) -> Option<CodecCapability>;
}

/// A fixed capability table, for platforms that publish their decoder limits
/// up front and for tests.
#[derive(Debug, Default)]
pub struct StaticCapabilities {
    entries: Vec<CodecCapability>,
}

impl StaticCapabilities {
    pub fn new(entries: Vec<CodecCapability>) -> Self {
        Self { entries }
    }

    /// Builds a table advertising 1080p60 hardware decode for each codec.
    pub fn with_codecs(codecs: &[VideoCodec]) -> Self {
        Self::new(
            codecs
                .iter()
                .map(|&codec| CodecCapability::new(codec, 1920, 1080, 60))
                .collect(),
        )
    }
}

impl MediaCapabilities for StaticCapabilities {
    fn codec_capability(&self, codec: VideoCodec) -> Option<CodecCapability> {
        self.entries.iter().find(|c| c.codec == codec).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_only_listed_codecs() {
        let caps = StaticCapabilities::with_codecs(&[VideoCodec::Vp9]);
        assert!(caps.codec_capability(VideoCodec::Vp9).is_some());
        assert!(caps.codec_capability(VideoCodec::H264).is_none());
    }

    #[test]
    fn base_layer_is_always_supported() {
        let cap = CodecCapability::new(VideoCodec::Vp9, 1920, 1080, 60);
        assert!(cap.supports_spatial_index(0));
        assert!(!cap.supports_spatial_index(1));
        assert!(!cap.supports_spatial_index(2));
    }
}
