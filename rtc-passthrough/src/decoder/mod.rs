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

//! The pass-through decode session facade.
//!
//! [`PassThroughVideoDecoder`] implements the real-time decode-session
//! contract the network stack consumes: it validates and queues encoded
//! frames on the calling thread and hands them to the platform decode
//! adapter on a dedicated media worker. Decoded output flows back
//! asynchronously, is validated against the timestamp window, and is
//! forwarded to the registered sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::adapter::{AdapterFactory, RestorePlaybackMode, SuspendReason};
use crate::capability::{CodecCapability, MediaCapabilities};
use crate::codec::VideoCodec;
use crate::error::AdapterError;
use crate::frame::{DecodedVideoFrame, EncodedFrame, EncodedImage};
use crate::frame_queue::{EncodedFrameQueue, EnqueueResult};
use crate::messages::MediaCommand;
use crate::state::{Admission, DecoderState, OverflowVerdict, PipelineState};
use crate::timestamp_window::TimestampWindow;

mod session;
use session::MediaSession;

const IMPLEMENTATION_NAME: &str = "PassThroughVideoDecoder";

/// Status codes returned by the decode-session operations, mirroring the
/// real-time decoder contract of the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeStatus {
    Ok,
    /// Recoverable stream error; the caller should request an upstream key
    /// frame.
    Error,
    /// Required parameters were absent.
    ErrParameter,
    /// The decoder is not (or no longer) usable.
    Uninitialized,
    /// Route this stream to a software decoder instead.
    FallbackSoftware,
}

/// Codec settings handed to `init_decode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecSettings {
    pub codec: VideoCodec,
    pub coded_width: u32,
    pub coded_height: u32,
}

/// Receives decoded output. Registered once, called from the media-processing
/// side in decode-completion order (which is adapter order, not necessarily
/// submission order).
pub trait DecodedFrameSink: Send {
    fn decoded(&self, frame: DecodedVideoFrame, qp: Option<i32>, decode_time_ms: u32);
}

/// State shared between the caller-facing facade, the media worker and the
/// adapter notification proxies.
pub(crate) struct SharedPipeline {
    pub(crate) queue: EncodedFrameQueue,
    pub(crate) state: Mutex<PipelineState>,
    pub(crate) window: Mutex<TimestampWindow>,
    pub(crate) sink: Mutex<Option<Box<dyn DecodedFrameSink>>>,
    natural_size: Mutex<Option<(u32, u32)>>,
    destroying: AtomicBool,
    suspended: AtomicBool,
}

impl SharedPipeline {
    fn new() -> Self {
        Self {
            queue: EncodedFrameQueue::new(),
            state: Mutex::new(PipelineState::new()),
            window: Mutex::new(TimestampWindow::new()),
            sink: Mutex::new(None),
            natural_size: Mutex::new(None),
            destroying: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_destroying(&self) -> bool {
        self.destroying.load(Ordering::Acquire)
    }

    fn set_destroying(&self) {
        self.destroying.store(true, Ordering::Release);
    }

    pub(crate) fn record_timestamp(&self, timestamp: Duration) {
        self.window.lock().unwrap().record(timestamp);
    }

    pub(crate) fn require_key_frame(&self) {
        self.state.lock().unwrap().require_key_frame();
    }

    /// Terminal: disables the hardware path and empties the backlog.
    pub(crate) fn on_pipeline_error(&self, error: &AdapterError) {
        if self.is_destroying() {
            return;
        }
        error!("platform pipeline error: {error}");
        self.state.lock().unwrap().on_pipeline_error();
        self.queue.clear();
    }

    /// Output path: decoded frames whose timestamp aged out of the window
    /// are stale (or duplicates) and never reach the sink.
    pub(crate) fn on_frame_decoded(&self, frame: DecodedVideoFrame) {
        if self.is_destroying() {
            return;
        }
        if !self.window.lock().unwrap().contains(frame.timestamp) {
            debug!("discarding stale decoded frame at {:?}", frame.timestamp);
            return;
        }
        let sink = self.sink.lock().unwrap();
        if let Some(sink) = sink.as_ref() {
            sink.decoded(frame, None, 0);
            self.state.lock().unwrap().on_frame_delivered();
        }
    }

    pub(crate) fn set_natural_size(&self, width: u32, height: u32) {
        debug!("natural size changed: {width}x{height}");
        *self.natural_size.lock().unwrap() = Some((width, height));
    }
}

/// A pass-through decode session.
///
/// `decode`, `init_decode` and `release` may be called from an arbitrary
/// thread (in practice the real-time network-receive thread); all platform
/// adapter work happens on the internal media worker. Dropping the decoder
/// joins the worker, after which no adapter call or sink delivery occurs.
pub struct PassThroughVideoDecoder {
    shared: Arc<SharedPipeline>,
    session: MediaSession,
    capability: CodecCapability,
    codec: Mutex<VideoCodec>,
    frame_size: Mutex<(u32, u32)>,
}

impl PassThroughVideoDecoder {
    /// Creates a decoder for the given SDP payload name.
    ///
    /// Returns `None` for unknown codecs and for codecs without a platform
    /// hardware capability; the caller is expected to fall back to a
    /// different decoder entirely. The capability is looked up exactly once,
    /// here.
    pub fn create(
        capabilities: &dyn MediaCapabilities,
        factory: AdapterFactory,
        payload_name: &str,
    ) -> Option<Self> {
        let codec = VideoCodec::from_payload_name(payload_name);
        if codec == VideoCodec::Unknown {
            debug!("unknown payload name {payload_name:?}");
            return None;
        }

        let Some(capability) = capabilities.codec_capability(codec) else {
            info!("{codec} is unsupported by the platform decoder");
            return None;
        };

        info!("creating pass-through decoder for {codec}");
        let shared = Arc::new(SharedPipeline::new());
        let session = MediaSession::spawn(Arc::clone(&shared), factory);
        Some(Self {
            shared,
            session,
            capability,
            codec: Mutex::new(codec),
            frame_size: Mutex::new((0, 0)),
        })
    }

    pub fn implementation_name(&self) -> &'static str {
        IMPLEMENTATION_NAME
    }

    pub fn codec(&self) -> VideoCodec {
        *self.codec.lock().unwrap()
    }

    /// Last natural size reported by the platform session, if any.
    pub fn natural_size(&self) -> Option<(u32, u32)> {
        *self.shared.natural_size.lock().unwrap()
    }

    pub fn is_suspended(&self) -> bool {
        self.shared.suspended.load(Ordering::Acquire)
    }

    /// Accepts codec settings and arms the key-frame gate. Decoding always
    /// starts from a complete key frame.
    pub fn init_decode(&self, settings: Option<&CodecSettings>, worker_hint: u32) -> DecodeStatus {
        let Some(settings) = settings else {
            error!("init_decode called without codec settings");
            return DecodeStatus::ErrParameter;
        };
        debug!("init_decode codec {} workers {}", settings.codec, worker_hint);

        *self.codec.lock().unwrap() = settings.codec;
        *self.frame_size.lock().unwrap() = (settings.coded_width, settings.coded_height);
        self.shared.state.lock().unwrap().initialize();
        self.availability_status()
    }

    /// Validates and queues one encoded image, then schedules an
    /// asynchronous drain on the media worker.
    pub fn decode(
        &self,
        image: &EncodedImage,
        missing_frames: bool,
        _render_time_ms: i64,
    ) -> DecodeStatus {
        if !self.shared.state.lock().unwrap().is_available() {
            info!("hardware decoder unavailable, falling back to software");
            return DecodeStatus::FallbackSoftware;
        }

        if self.is_suspended() {
            // Input is intentionally parked until resume.
            self.shared.queue.clear();
            return DecodeStatus::Ok;
        }

        // Hardware sessions cannot multiplex spatial layers beyond the
        // capability's limit; such streams always decode in software.
        if let Some(index) = image.spatial_index {
            if !self.capability.supports_spatial_index(index) {
                info!("spatial index {index} beyond hardware capability, falling back to software");
                return DecodeStatus::FallbackSoftware;
            }
        }

        if missing_frames || !image.complete_frame {
            error!("missing or incomplete frame");
            return DecodeStatus::Error;
        }

        {
            let mut state = self.shared.state.lock().unwrap();
            let was_seeking = state.state() == DecoderState::SeekingKeyFrame;
            match state.admit(image.frame_type) {
                Admission::Admit => {
                    if was_seeking {
                        info!("key frame received, resuming decode");
                    }
                }
                Admission::NeedKeyFrame => {
                    info!("waiting for a key frame, discarding delta frame");
                    return DecodeStatus::Error;
                }
                Admission::Fallback => return DecodeStatus::FallbackSoftware,
                Admission::NotReady => return DecodeStatus::Uninitialized,
            }
        }

        if image.is_keyframe() {
            let mut size = self.frame_size.lock().unwrap();
            *size = (image.encoded_width, image.encoded_height);
            debug!("key frame size: {}x{}", size.0, size.1);
        }

        let codec = self.codec();
        let (width, height) = *self.frame_size.lock().unwrap();
        let frame = EncodedFrame::new(
            image.data.clone(),
            codec,
            image.frame_type,
            image.timestamp(),
            width,
            height,
        );

        match self.shared.queue.try_enqueue(frame) {
            EnqueueResult::Accepted => {
                self.session.post(MediaCommand::Drain);
                DecodeStatus::Ok
            }
            EnqueueResult::Overflowed => match self.shared.state.lock().unwrap().on_overflow() {
                OverflowVerdict::RequestKeyFrame => {
                    info!("pending frame overflow, requesting a key frame");
                    DecodeStatus::Error
                }
                OverflowVerdict::FallbackToSoftware => {
                    self.shared.window.lock().unwrap().clear();
                    info!("too many consecutive drops, falling back to software");
                    DecodeStatus::FallbackSoftware
                }
            },
        }
    }

    /// Stores the sink that receives decoded output.
    pub fn register_decode_complete_callback(
        &self,
        sink: Box<dyn DecodedFrameSink>,
    ) -> DecodeStatus {
        *self.shared.sink.lock().unwrap() = Some(sink);
        self.availability_status()
    }

    /// Clears the backlog and the timestamp history, synchronously draining
    /// in-flight work on the media worker. Idempotent.
    pub fn release(&self) -> DecodeStatus {
        debug!("release");
        self.shared.queue.clear();
        self.session.flush();
        self.shared.window.lock().unwrap().clear();
        self.shared.require_key_frame();
        self.availability_status()
    }

    /// Parks the session: pending input is dropped and the platform session
    /// is suspended. Idempotent.
    pub fn suspend(&self, reason: SuspendReason) {
        if self.shared.suspended.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("suspending decode session");
        self.shared.queue.clear();
        self.session.post(MediaCommand::Suspend(reason));
    }

    /// Unparks the session. Decoding restarts from a key frame. Idempotent.
    pub fn resume(&self, position: Duration, mode: RestorePlaybackMode) {
        if !self.shared.suspended.swap(false, Ordering::AcqRel) {
            return;
        }
        info!("resuming decode session");
        self.shared.require_key_frame();
        self.session.post(MediaCommand::Resume { position, mode });
    }

    fn availability_status(&self) -> DecodeStatus {
        if self.shared.state.lock().unwrap().is_available() {
            DecodeStatus::Ok
        } else {
            DecodeStatus::Uninitialized
        }
    }
}

impl Drop for PassThroughVideoDecoder {
    fn drop(&mut self) {
        debug!("destroying decoder instance");
        self.shared.set_destroying();
        self.shared.queue.clear();
        // MediaSession::drop shuts the worker down and joins it.
    }
}
