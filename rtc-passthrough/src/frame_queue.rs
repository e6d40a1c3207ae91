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

//! The bounded queue of encoded frames awaiting hand-off to the pipeline.

use std::collections::VecDeque;
use std::sync::Mutex;

use log::warn;

use crate::frame::EncodedFrame;

/// Maximum number of frames held while awaiting the media worker.
pub const MAX_PENDING_FRAMES: usize = 8;

/// Outcome of an enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueResult {
    Accepted,
    /// The queue was full. The entire backlog (and the offered frame) has
    /// been dropped; decoding must restart from a key frame.
    Overflowed,
}

/// A bounded FIFO shared between a producer on an arbitrary thread and the
/// single media-worker consumer.
///
/// The lock is held only for enqueue and for the drain swap; per-frame decode
/// work never runs under it. Invariant: `len() <= capacity` at all times;
/// an insert past capacity clears the whole queue rather than evicting the
/// oldest entry.
#[derive(Debug)]
pub struct EncodedFrameQueue {
    pending: Mutex<VecDeque<EncodedFrame>>,
    capacity: usize,
}

impl EncodedFrameQueue {
    pub fn new() -> Self {
        Self::with_capacity(MAX_PENDING_FRAMES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Attempts to queue a frame for the media worker.
    pub fn try_enqueue(&self, frame: EncodedFrame) -> EnqueueResult {
        let mut pending = self.pending.lock().unwrap();
        if pending.len() >= self.capacity {
            // Severely behind; drop everything and catch up from a key frame.
            pending.clear();
            warn!("pending frame overflow, backlog cleared");
            return EnqueueResult::Overflowed;
        }
        pending.push_back(frame);
        EnqueueResult::Accepted
    }

    /// Detaches the whole backlog. The swap happens under the lock; the
    /// returned frames are processed without it.
    pub fn drain_all(&self) -> VecDeque<EncodedFrame> {
        let mut drained = VecDeque::new();
        std::mem::swap(&mut *self.pending.lock().unwrap(), &mut drained);
        drained
    }

    pub fn clear(&self) {
        self.pending.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EncodedFrameQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::VideoCodec;
    use crate::frame::FrameType;
    use std::time::Duration;

    fn test_frame(n: u64) -> EncodedFrame {
        EncodedFrame::new(
            vec![0; 16],
            VideoCodec::Vp9,
            FrameType::DeltaFrame,
            Duration::from_micros(n),
            640,
            360,
        )
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let queue = EncodedFrameQueue::new();
        for n in 0..100 {
            queue.try_enqueue(test_frame(n));
            assert!(queue.len() <= MAX_PENDING_FRAMES);
        }
    }

    #[test]
    fn overflow_clears_the_entire_backlog() {
        let queue = EncodedFrameQueue::new();
        for n in 0..MAX_PENDING_FRAMES as u64 {
            assert_eq!(queue.try_enqueue(test_frame(n)), EnqueueResult::Accepted);
        }
        assert_eq!(queue.len(), MAX_PENDING_FRAMES);

        // The ninth frame overflows; nothing survives, not even the oldest.
        assert_eq!(queue.try_enqueue(test_frame(99)), EnqueueResult::Overflowed);
        assert!(queue.is_empty());

        // The queue keeps accepting afterwards.
        assert_eq!(queue.try_enqueue(test_frame(100)), EnqueueResult::Accepted);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn drain_preserves_submission_order_and_empties() {
        let queue = EncodedFrameQueue::new();
        for n in 0..5 {
            queue.try_enqueue(test_frame(n));
        }

        let drained = queue.drain_all();
        assert!(queue.is_empty());
        let timestamps: Vec<u64> = drained
            .iter()
            .map(|f| f.timestamp().as_micros() as u64)
            .collect();
        assert_eq!(timestamps, vec![0, 1, 2, 3, 4]);

        assert!(queue.drain_all().is_empty());
    }
}
