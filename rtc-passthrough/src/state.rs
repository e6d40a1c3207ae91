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

//! The decoder's state machine.
//!
//! All lifecycle flags live in one place with one transition function per
//! event, so illegal combinations (e.g. "streaming" while permanently fallen
//! back) are unrepresentable.

use serde::{Deserialize, Serialize};

use crate::frame::FrameType;

/// Maximum number of consecutive overflow events before decoding falls back
/// to software for the remaining lifetime of the instance.
pub const MAX_CONSECUTIVE_ERRORS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecoderState {
    /// `init_decode` has not accepted settings yet.
    Uninitialized,
    /// Waiting for a key frame; delta frames are rejected. Entered after
    /// initialization, overflow, resume and decoder-side key-frame requests.
    SeekingKeyFrame,
    /// A key frame has been seen; all complete frames are admitted.
    Streaming,
    /// The hardware path is gone for good; every decode call must route to
    /// software. Terminal.
    PermanentFallback,
}

/// Verdict for a frame offered to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Frame may be queued.
    Admit,
    /// Delta frame while seeking; the caller should request an upstream key
    /// frame and drop this one.
    NeedKeyFrame,
    /// Decoder is permanently unavailable.
    Fallback,
    /// Initialization has not happened.
    NotReady,
}

/// Outcome of a queue overflow, per the backpressure decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowVerdict {
    /// Recoverable: backlog was cleared, a key frame is now required.
    RequestKeyFrame,
    /// The circuit breaker tripped; hardware decode is abandoned permanently.
    FallbackToSoftware,
}

/// State cell shared by the decode facade and the media worker.
#[derive(Debug)]
pub struct PipelineState {
    state: DecoderState,
    consecutive_errors: u32,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Uninitialized,
            consecutive_errors: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Whether the hardware decode path may still be used.
    pub fn is_available(&self) -> bool {
        self.state != DecoderState::PermanentFallback
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    /// Settings were accepted: always restart from a complete key frame.
    /// Permanent fallback is never left, not even by re-initialization.
    pub fn initialize(&mut self) {
        if self.state != DecoderState::PermanentFallback {
            self.state = DecoderState::SeekingKeyFrame;
        }
    }

    /// Gates one frame. Admitting a key frame while seeking moves the
    /// machine to `Streaming`.
    pub fn admit(&mut self, frame_type: FrameType) -> Admission {
        match self.state {
            DecoderState::PermanentFallback => Admission::Fallback,
            DecoderState::Uninitialized => Admission::NotReady,
            DecoderState::Streaming => Admission::Admit,
            DecoderState::SeekingKeyFrame => {
                if frame_type == FrameType::KeyFrame {
                    self.state = DecoderState::Streaming;
                    Admission::Admit
                } else {
                    Admission::NeedKeyFrame
                }
            }
        }
    }

    /// Re-enters key-frame seeking after a loss event. No-op while
    /// uninitialized or permanently fallen back.
    pub fn require_key_frame(&mut self) {
        if matches!(
            self.state,
            DecoderState::SeekingKeyFrame | DecoderState::Streaming
        ) {
            self.state = DecoderState::SeekingKeyFrame;
        }
    }

    /// Applies the backpressure policy after the pending queue overflowed.
    pub fn on_overflow(&mut self) -> OverflowVerdict {
        self.require_key_frame();
        self.consecutive_errors += 1;
        if self.consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
            self.state = DecoderState::PermanentFallback;
            OverflowVerdict::FallbackToSoftware
        } else {
            OverflowVerdict::RequestKeyFrame
        }
    }

    /// A decoded frame reached the sink; the error streak is over.
    pub fn on_frame_delivered(&mut self) {
        self.consecutive_errors = 0;
    }

    /// The platform pipeline reported a fatal error. Terminal.
    pub fn on_pipeline_error(&mut self) {
        self.state = DecoderState::PermanentFallback;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming_state() -> PipelineState {
        let mut state = PipelineState::new();
        state.initialize();
        assert_eq!(state.admit(FrameType::KeyFrame), Admission::Admit);
        state
    }

    #[test]
    fn starts_uninitialized_and_rejects_frames() {
        let mut state = PipelineState::new();
        assert_eq!(state.state(), DecoderState::Uninitialized);
        assert_eq!(state.admit(FrameType::KeyFrame), Admission::NotReady);
    }

    #[test]
    fn key_frame_opens_the_gate() {
        let mut state = PipelineState::new();
        state.initialize();
        assert_eq!(state.admit(FrameType::DeltaFrame), Admission::NeedKeyFrame);
        assert_eq!(state.state(), DecoderState::SeekingKeyFrame);
        assert_eq!(state.admit(FrameType::KeyFrame), Admission::Admit);
        assert_eq!(state.state(), DecoderState::Streaming);
        assert_eq!(state.admit(FrameType::DeltaFrame), Admission::Admit);
    }

    #[test]
    fn overflow_re_enters_seeking() {
        let mut state = streaming_state();
        assert_eq!(state.on_overflow(), OverflowVerdict::RequestKeyFrame);
        assert_eq!(state.state(), DecoderState::SeekingKeyFrame);
        assert_eq!(state.admit(FrameType::DeltaFrame), Admission::NeedKeyFrame);
        assert_eq!(state.admit(FrameType::KeyFrame), Admission::Admit);
    }

    #[test]
    fn sixty_consecutive_overflows_trip_the_breaker() {
        let mut state = streaming_state();
        for _ in 0..MAX_CONSECUTIVE_ERRORS - 1 {
            assert_eq!(state.on_overflow(), OverflowVerdict::RequestKeyFrame);
        }
        assert_eq!(state.on_overflow(), OverflowVerdict::FallbackToSoftware);
        assert_eq!(state.state(), DecoderState::PermanentFallback);
        assert!(!state.is_available());

        // Terminal: neither key frames nor re-initialization recover.
        assert_eq!(state.admit(FrameType::KeyFrame), Admission::Fallback);
        state.initialize();
        assert_eq!(state.state(), DecoderState::PermanentFallback);
    }

    #[test]
    fn delivery_resets_the_error_streak() {
        let mut state = streaming_state();
        for _ in 0..MAX_CONSECUTIVE_ERRORS - 1 {
            state.on_overflow();
        }
        state.on_frame_delivered();
        assert_eq!(state.consecutive_errors(), 0);

        // The streak restarts from zero; the next overflow is recoverable.
        state.admit(FrameType::KeyFrame);
        assert_eq!(state.on_overflow(), OverflowVerdict::RequestKeyFrame);
        assert!(state.is_available());
    }

    #[test]
    fn pipeline_error_is_terminal() {
        let mut state = streaming_state();
        state.on_pipeline_error();
        assert!(!state.is_available());
        state.initialize();
        assert_eq!(state.state(), DecoderState::PermanentFallback);
        state.require_key_frame();
        assert_eq!(state.state(), DecoderState::PermanentFallback);
    }
}
