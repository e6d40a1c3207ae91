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

//! A pass-through video decode pipeline: encoded WebRTC frames are queued on
//! the network thread and fed to a platform hardware decode adapter on a
//! dedicated media worker, with key-frame recovery, bounded backpressure and
//! a permanent software-fallback circuit breaker.

pub mod adapter;
pub mod capability;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod frame_queue;
pub mod messages;
pub mod state;
pub mod timestamp_window;
