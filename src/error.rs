//! Error types for the frame codec, the node and its configuration.
//!
//! Errors fall into three families:
//!
//! - [`FrameError`]: a single frame could not be built or parsed. On the receive
//!   path the frame is discarded and the node keeps running.
//! - [`NodeError`]: the node itself could not make progress. [`NodeError::InitFailed`]
//!   and [`NodeError::Halted`] are permanent; everything else is scoped to one call.
//! - [`ConfigError`]: a [`NodeConfig`](crate::config::NodeConfig) was rejected before use.

use thiserror::Error;

/// Failure to encode or decode a single frame.
///
/// Both decode variants describe a *malformed* frame: the receiver must drop it
/// instead of delivering a truncated or padded payload.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum FrameError {
    /// The payload does not fit in the one-byte length field.
    #[error("payload of {len} bytes exceeds the 255 byte frame limit")]
    PayloadTooLong {
        /// Length of the rejected payload.
        len: usize,
    },
    /// Fewer than the four header bytes were available.
    #[error("frame header truncated: only {available} bytes available")]
    TruncatedHeader {
        /// Number of bytes that were available.
        available: usize,
    },
    /// The declared payload length does not match the bytes that followed the header.
    #[error("message length {declared} does not match the {actual} payload bytes received")]
    LengthMismatch {
        /// Value of the `payload_length` header byte.
        declared: u8,
        /// Number of payload bytes actually present.
        actual: usize,
    },
}

/// Failure reported by a [`Node`](crate::node::Node).
///
/// `E` is the error type of the underlying [`Radio`](crate::transport::Radio).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum NodeError<E> {
    /// The radio could not be initialized. The node is now halted.
    #[error("radio initialization failed, check your connections")]
    InitFailed,
    /// The node halted after an initialization failure and will not run again.
    #[error("node is halted")]
    Halted,
    /// [`Node::begin`](crate::node::Node::begin) has not been called yet.
    #[error("node has not been started")]
    NotStarted,
    /// The configuration was rejected by [`Node::begin`](crate::node::Node::begin).
    /// The radio was not touched.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The outgoing frame could not be encoded.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// The radio reported an error while transmitting or re-entering receive mode.
    #[error("radio transport error: {0:?}")]
    Transport(E),
}

/// Rejected [`NodeConfig`](crate::config::NodeConfig).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ConfigError {
    /// The send interval range `[min_ms, max_ms)` contains no value.
    #[error("send interval range [{min_ms}, {max_ms}) is empty")]
    EmptyIntervalRange {
        /// Configured inclusive lower bound.
        min_ms: u32,
        /// Configured exclusive upper bound.
        max_ms: u32,
    },
    /// The initial interval must be non-zero, or every poll would transmit.
    #[error("initial send interval must be greater than zero")]
    ZeroInitialInterval,
    /// The runner would spin without yielding.
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}
