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

//! The platform decode adapter boundary.
//!
//! The actual hardware decode session lives behind [`PlatformDecoderAdapter`];
//! this crate never decodes anything itself. All adapter calls are made from
//! the dedicated media worker; notifications may arrive on any thread the
//! platform chooses.

use std::sync::Arc;
use std::time::Duration;

use crate::codec::VideoCodec;
use crate::error::{AdapterError, Result};
use crate::frame::DecodedVideoFrame;

/// Stream type tag for `feed`. Audio is handled by a separate path and is
/// never fed through this pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedType {
    Video,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendReason {
    /// The surface went to the background.
    Backgrounded,
    /// Platform policy forced the suspension.
    SuspendedByPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePlaybackMode {
    Paused,
    Playing,
}

/// An encoded buffer in the form the platform decoder consumes.
#[derive(Debug, Clone)]
pub struct DecoderBuffer {
    pub data: Vec<u8>,
    pub timestamp: Duration,
    pub is_key_frame: bool,
}

/// Configuration for one decode session. Audio is never configured here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDecoderConfig {
    pub codec: VideoCodec,
    pub coded_width: u32,
    pub coded_height: u32,
    /// Live streams get no pre-roll buffering from the platform.
    pub is_live: bool,
}

/// Asynchronous notifications from the platform decode session back to the
/// pipeline. Implementations may be called from any thread.
pub trait MediaEventSink: Send + Sync {
    /// Session initialization finished. `Err` is equivalent to a pipeline
    /// error and permanently disables the hardware path.
    fn pipeline_ready(&self, status: Result<()>);

    /// A decoded frame is available.
    fn frame_decoded(&self, frame: DecodedVideoFrame);

    /// The stream's natural size changed (first frame, mid-stream resize).
    fn natural_size_changed(&self, width: u32, height: u32);

    /// The session completed a suspend request.
    fn suspended(&self);

    /// The session completed a resume request.
    fn resumed(&self);

    /// Fatal decoder-side failure. Terminal for the pipeline.
    fn pipeline_error(&self, error: AdapterError);

    /// The decoder lost its reference state and needs a key frame.
    fn key_frame_request(&self);
}

/// The platform hardware decode session.
///
/// `initialize` is asynchronous: completion arrives via
/// [`MediaEventSink::pipeline_ready`]. `finalize` is synchronous and must
/// guarantee that no notification is delivered after it returns.
pub trait PlatformDecoderAdapter: Send {
    fn initialize(
        &mut self,
        config: &VideoDecoderConfig,
        events: Arc<dyn MediaEventSink>,
    ) -> Result<()>;

    fn feed(&mut self, buffer: DecoderBuffer, feed_type: FeedType) -> Result<()>;

    fn set_playback_rate(&mut self, rate: f64);

    fn suspend(&mut self, reason: SuspendReason);

    fn resume(&mut self, position: Duration, mode: RestorePlaybackMode);

    fn finalize(&mut self);
}

/// Creates one adapter instance per decode session. Called on the media
/// worker whenever a session starts, including after a codec switch.
pub type AdapterFactory = Box<dyn Fn(VideoCodec) -> Box<dyn PlatformDecoderAdapter> + Send>;
