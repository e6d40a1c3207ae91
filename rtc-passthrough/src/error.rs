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

use thiserror::Error;

/// Result type for platform adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Errors reported by the platform decode adapter.
///
/// These never unwind through the public decode API; they surface either as a
/// synchronous initialization failure on the media worker or asynchronously
/// through the pipeline-error notification, both of which translate into the
/// permanent software-fallback state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("codec not supported by the platform decoder: {0}")]
    UnsupportedCodec(String),

    #[error("pipeline initialization failed: {0}")]
    InitializationFailed(String),

    #[error("encoded buffer rejected: {0}")]
    FeedRejected(String),

    #[error("decoder resource was released by the platform")]
    ResourceReleased,

    #[error("pipeline aborted")]
    Aborted,
}
