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

//! Contains the fundamental data structures for video frames.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::codec::VideoCodec;

/// The type of a video frame, indicating its dependency on other frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameType {
    /// A KeyFrame (or I-frame) can be decoded independently of any other frame.
    KeyFrame,
    /// A DeltaFrame (or P-frame) can only be decoded if the preceding frame has been decoded.
    DeltaFrame,
}

/// A raw encoded image as delivered by the network stack's decode callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedImage {
    /// The encoded payload.
    pub data: Vec<u8>,
    /// The type of the frame (KeyFrame or DeltaFrame).
    pub frame_type: FrameType,
    /// RTP timestamp of the frame, in microseconds.
    pub timestamp_us: u64,
    /// Width of the encoded image, valid on key frames.
    pub encoded_width: u32,
    /// Height of the encoded image, valid on key frames.
    pub encoded_height: u32,
    /// Spatial layer index for scalable streams. Index 0 is the base layer.
    pub spatial_index: Option<u32>,
    /// Whether the payload covers a complete frame.
    pub complete_frame: bool,
}

impl EncodedImage {
    pub fn is_keyframe(&self) -> bool {
        self.frame_type == FrameType::KeyFrame
    }

    pub fn timestamp(&self) -> Duration {
        Duration::from_micros(self.timestamp_us)
    }
}

/// An encoded frame queued for hand-off to the decode pipeline.
///
/// Immutable once constructed. The frame is owned by the pending queue until
/// the media worker dequeues it, at which point ownership moves to the
/// pipeline; it is never copied along the way.
#[derive(Debug, Serialize, Deserialize)]
pub struct EncodedFrame {
    data: Vec<u8>,
    codec: VideoCodec,
    frame_type: FrameType,
    timestamp: Duration,
    coded_width: u32,
    coded_height: u32,
}

impl EncodedFrame {
    pub fn new(
        data: Vec<u8>,
        codec: VideoCodec,
        frame_type: FrameType,
        timestamp: Duration,
        coded_width: u32,
        coded_height: u32,
    ) -> Self {
        Self {
            data,
            codec,
            frame_type,
            timestamp,
            coded_width,
            coded_height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the frame, yielding the encoded payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    pub fn is_keyframe(&self) -> bool {
        self.frame_type == FrameType::KeyFrame
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn coded_size(&self) -> (u32, u32) {
        (self.coded_width, self.coded_height)
    }
}

/// A decoded frame emitted by the platform decode session.
///
/// Correlated with its encoded input only by timestamp; the platform decoder
/// may emit results out of order or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedVideoFrame {
    /// Timestamp of the encoded frame this output was produced from.
    pub timestamp: Duration,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}
