//! Constants used across the duplex protocol implementation.
//!
//! This module defines the wire layout, addressing and scheduling constants
//! shared by the codec, the address filter and the duty-cycle scheduler.
//!
//! ## Key Concepts
//!
//! - **Header**: Fixed 4-byte prefix `[destination, sender, message_id, payload_length]`.
//! - **Payload Limits**: The length field is a single byte, so a payload can never exceed 255 bytes.
//! - **Broadcast**: Destination `0xFF` is accepted by every listener.
//! - **Send Interval**: Time between transmissions, re-drawn after every send.
//!
//! All durations are expressed in milliseconds of device uptime.

/// Length (in bytes) of the fixed-length frame header.
///
/// Destination, sender, message id and payload length, in that order.
pub const HEADER_LEN: usize = 4;

/// Maximum size (in bytes) of a frame payload.
///
/// Bounded by the one-byte `payload_length` header field.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Maximum size (in bytes) of an encoded frame, header included.
pub const MAX_FRAME_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN;

/// The reserved destination delivered to every listener.
pub const BROADCAST_ADDRESS: u8 = u8::MAX;

/// The address a node uses when none is configured.
pub const DEFAULT_LOCAL_ADDRESS: u8 = 0xBB;

/// Carrier frequency used when none is configured (915 MHz ISM band).
pub const DEFAULT_FREQUENCY_HZ: u32 = 915_000_000;

/// Interval before the very first transmission.
pub const DEFAULT_SEND_INTERVAL_MS: u32 = 2_000;

/// Inclusive lower bound of a freshly drawn send interval.
pub const MIN_SEND_INTERVAL_MS: u32 = 1_000;

/// Exclusive upper bound of a freshly drawn send interval.
pub const MAX_SEND_INTERVAL_MS: u32 = 3_000;

/// Delay between two scheduler polls of the blocking runner.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;

/// The payload sent on every scheduled transmission unless configured otherwise.
pub const DEFAULT_MESSAGE: &str = "Helo Message!";

/// Capacity of the receive notification queue filled from interrupt context.
///
/// The radio FIFO only holds one packet, so a handful of slots is plenty.
pub const RECEIVE_QUEUE_LEN: usize = 4;
