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

//! The dedicated media worker that owns the platform decode session.
//!
//! Every adapter call happens on this thread. The caller side communicates
//! exclusively through [`MediaCommand`] messages; the only blocking hand-off
//! is the flush barrier used by teardown paths.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};

use crate::adapter::{
    AdapterFactory, DecoderBuffer, FeedType, MediaEventSink, PlatformDecoderAdapter,
    VideoDecoderConfig,
};
use crate::codec::VideoCodec;
use crate::error::{AdapterError, Result};
use crate::frame::{DecodedVideoFrame, EncodedFrame};
use crate::messages::MediaCommand;

use super::SharedPipeline;

/// Handle to the media worker thread. Dropping it shuts the worker down and
/// joins it, after which no adapter call can occur.
pub(crate) struct MediaSession {
    sender: Sender<MediaCommand>,
    handle: Option<JoinHandle<()>>,
}

impl MediaSession {
    pub(crate) fn spawn(shared: Arc<SharedPipeline>, factory: AdapterFactory) -> Self {
        let (sender, receiver) = mpsc::channel();
        let commands = sender.clone();
        let handle = thread::spawn(move || {
            let mut controller = PipelineController::new(shared, factory, commands);
            controller.run(receiver);
        });
        Self {
            sender,
            handle: Some(handle),
        }
    }

    pub(crate) fn post(&self, command: MediaCommand) {
        if self.sender.send(command).is_err() {
            warn!("media worker is gone, command dropped");
        }
    }

    /// Blocks until every command posted before this call has executed.
    ///
    /// This is the one deliberate blocking point in the pipeline, confined to
    /// teardown and codec-switch paths; it is never called from the decode
    /// hot path.
    pub(crate) fn flush(&self) {
        let (ack, done) = mpsc::sync_channel(1);
        if self.sender.send(MediaCommand::Flush(ack)).is_ok() {
            let _ = done.recv();
        }
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        let _ = self.sender.send(MediaCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            handle.join().expect("media worker failed to join");
        }
    }
}

/// One live platform decode session.
struct ActiveSession {
    adapter: Box<dyn PlatformDecoderAdapter>,
    codec: VideoCodec,
    generation: u64,
    /// Set once `pipeline_ready` arrived and pending frames were flushed.
    ready: bool,
    /// Written by the event proxy, possibly synchronously from inside
    /// `initialize`; checked by the worker after every admission.
    ready_signal: Arc<AtomicBool>,
    /// Frames admitted while the session was still initializing, in
    /// submission order.
    pending: VecDeque<EncodedFrame>,
}

/// Owns the adapter on the media worker; lazy session creation, codec
/// switching and teardown all run here.
struct PipelineController {
    shared: Arc<SharedPipeline>,
    factory: AdapterFactory,
    commands: Sender<MediaCommand>,
    session: Option<ActiveSession>,
    next_generation: u64,
}

impl PipelineController {
    fn new(
        shared: Arc<SharedPipeline>,
        factory: AdapterFactory,
        commands: Sender<MediaCommand>,
    ) -> Self {
        Self {
            shared,
            factory,
            commands,
            session: None,
            next_generation: 0,
        }
    }

    fn run(&mut self, receiver: Receiver<MediaCommand>) {
        while let Ok(command) = receiver.recv() {
            match command {
                MediaCommand::Drain => self.drain(),
                MediaCommand::PipelineReady { generation } => self.on_pipeline_ready(generation),
                MediaCommand::TeardownSession { generation } => self.teardown(generation),
                MediaCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
                MediaCommand::Suspend(reason) => {
                    if let Some(session) = &mut self.session {
                        session.adapter.suspend(reason);
                    }
                }
                MediaCommand::Resume { position, mode } => {
                    if let Some(session) = &mut self.session {
                        session.adapter.resume(position, mode);
                    }
                }
                MediaCommand::Shutdown => break,
            }
        }
        self.finalize_session();
    }

    fn drain(&mut self) {
        if self.shared.is_destroying() {
            return;
        }
        let mut frames = self.shared.queue.drain_all();
        while let Some(frame) = frames.pop_front() {
            self.shared.record_timestamp(frame.timestamp());
            self.feed(frame);
        }
    }

    fn feed(&mut self, frame: EncodedFrame) {
        // A key frame carrying a different codec replaces the session; the
        // old one is fully finalized first so the new pipeline never observes
        // a half-destroyed predecessor.
        let active_codec = self.session.as_ref().map(|session| session.codec);
        if let Some(active) = active_codec {
            if active != frame.codec() {
                if !frame.is_keyframe() {
                    debug!(
                        "codec changed {} -> {} mid-stream, waiting for a key frame",
                        active,
                        frame.codec()
                    );
                    self.shared.require_key_frame();
                    return;
                }
                info!("codec switch {} -> {}", active, frame.codec());
                self.finalize_session();
            }
        }

        if self.session.is_none() {
            if !frame.is_keyframe() {
                // A pipeline cannot start mid-stream.
                self.shared.require_key_frame();
                return;
            }
            self.start_session(&frame);
        }

        self.promote_if_ready();

        let Some(session) = &mut self.session else {
            return;
        };
        if session.ready {
            feed_adapter(session.adapter.as_mut(), frame);
        } else {
            session.pending.push_back(frame);
        }
    }

    fn start_session(&mut self, key_frame: &EncodedFrame) {
        let generation = self.next_generation;
        self.next_generation += 1;

        let codec = key_frame.codec();
        let (coded_width, coded_height) = key_frame.coded_size();
        let config = VideoDecoderConfig {
            codec,
            coded_width,
            coded_height,
            is_live: true,
        };

        let ready_signal = Arc::new(AtomicBool::new(false));
        let events: Arc<dyn MediaEventSink> = Arc::new(SessionEventProxy {
            shared: Arc::clone(&self.shared),
            commands: self.commands.clone(),
            generation,
            ready_signal: Arc::clone(&ready_signal),
        });

        info!(
            "starting {} decode session, coded size {}x{}",
            codec, coded_width, coded_height
        );
        let mut adapter = (self.factory)(codec);
        if let Err(err) = adapter.initialize(&config, events) {
            error!("decode session initialization failed: {err}");
            self.shared.on_pipeline_error(&err);
            return;
        }

        self.session = Some(ActiveSession {
            adapter,
            codec,
            generation,
            ready: false,
            ready_signal,
            pending: VecDeque::new(),
        });
    }

    fn on_pipeline_ready(&mut self, generation: u64) {
        let Some(session) = &self.session else {
            return;
        };
        if session.generation != generation {
            debug!("ignoring ready notification for a finalized session");
            return;
        }
        self.promote_if_ready();
    }

    /// Moves a session whose readiness signal fired into the ready state and
    /// feeds everything buffered while it was initializing.
    fn promote_if_ready(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        if session.ready || !session.ready_signal.load(Ordering::Acquire) {
            return;
        }
        session.ready = true;
        session.adapter.set_playback_rate(1.0);

        let mut pending = std::mem::take(&mut session.pending);
        debug!("decode session ready, feeding {} buffered frames", pending.len());
        while let Some(frame) = pending.pop_front() {
            feed_adapter(session.adapter.as_mut(), frame);
        }
    }

    fn teardown(&mut self, generation: u64) {
        if self
            .session
            .as_ref()
            .is_some_and(|session| session.generation == generation)
        {
            self.finalize_session();
        }
    }

    fn finalize_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            // After finalize returns the adapter delivers no further
            // notifications; this is the adapter contract the generation
            // guard leans on.
            session.adapter.finalize();
            if !session.pending.is_empty() {
                debug!(
                    "{} undelivered frames dropped with the session",
                    session.pending.len()
                );
            }
        }
    }
}

fn feed_adapter(adapter: &mut dyn PlatformDecoderAdapter, frame: EncodedFrame) {
    let buffer = DecoderBuffer {
        timestamp: frame.timestamp(),
        is_key_frame: frame.is_keyframe(),
        data: frame.into_data(),
    };
    // Fatal feed-side conditions arrive through the pipeline-error
    // notification; a rejected buffer on its own is not one.
    if let Err(err) = adapter.feed(buffer, FeedType::Video) {
        warn!("platform decoder rejected buffer: {err}");
    }
}

/// Routes adapter notifications back into the pipeline. Frame and status
/// notifications mutate the shared state directly; session-scoped ones go
/// through the command channel so the worker applies them, with the
/// generation guard dropping anything from an already-finalized session.
struct SessionEventProxy {
    shared: Arc<SharedPipeline>,
    commands: Sender<MediaCommand>,
    generation: u64,
    ready_signal: Arc<AtomicBool>,
}

impl MediaEventSink for SessionEventProxy {
    fn pipeline_ready(&self, status: Result<()>) {
        match status {
            Ok(()) => {
                self.ready_signal.store(true, Ordering::Release);
                let _ = self.commands.send(MediaCommand::PipelineReady {
                    generation: self.generation,
                });
            }
            Err(err) => {
                self.shared.on_pipeline_error(&err);
                let _ = self.commands.send(MediaCommand::TeardownSession {
                    generation: self.generation,
                });
            }
        }
    }

    fn frame_decoded(&self, frame: DecodedVideoFrame) {
        self.shared.on_frame_decoded(frame);
    }

    fn natural_size_changed(&self, width: u32, height: u32) {
        self.shared.set_natural_size(width, height);
    }

    fn suspended(&self) {
        debug!("platform pipeline suspended");
    }

    fn resumed(&self) {
        debug!("platform pipeline resumed");
    }

    fn pipeline_error(&self, error: AdapterError) {
        self.shared.on_pipeline_error(&error);
        let _ = self.commands.send(MediaCommand::TeardownSession {
            generation: self.generation,
        });
    }

    fn key_frame_request(&self) {
        self.shared.require_key_frame();
    }
}
