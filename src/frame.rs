//! Frame codec for the byte-addressed duplex protocol.
//!
//! A frame on the channel is laid out as:
//!
//! ```text
//! [destination:1][sender:1][message_id:1][payload_length:1][payload:payload_length]
//! ```
//!
//! There is no checksum and no delimiter. The radio hands over one discrete packet
//! per receive event, so the codec never has to search for frame boundaries.
//!
//! ## Functions
//!
//! - [`encode`]: Builds the wire bytes for a header and payload
//! - [`decode`]: Parses the wire bytes back into a [`Frame`]
//!
//! ## Example
//!
//! ```rust
//! use lora_duplex::frame::{decode, encode};
//!
//! let bytes = encode(0xFF, 0xBB, 7, b"Helo Message!").unwrap();
//! assert_eq!(&bytes[..4], &[0xFF, 0xBB, 7, 13]);
//!
//! let frame = decode(&bytes).unwrap().unwrap();
//! assert_eq!(frame.text(), Ok("Helo Message!"));
//! ```

use crate::consts::{BROADCAST_ADDRESS, HEADER_LEN, MAX_FRAME_LEN, MAX_PAYLOAD_LEN};
use crate::error::FrameError;

use core::str::Utf8Error;
use heapless::Vec;

/// Bytes of a fully encoded frame.
pub type FrameBytes = Vec<u8, MAX_FRAME_LEN>;

/// Bytes of a frame payload.
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

/// One unit of data exchanged over the radio channel.
///
/// The `payload_length` header byte is not stored: it always equals
/// `payload.len()`, which [`Frame::new`] and [`decode`] guarantee.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Frame {
    /// Target device address, or [`BROADCAST_ADDRESS`].
    pub destination: u8,
    /// Address of the originating device.
    pub sender: u8,
    /// Sender-local counter, wraps modulo 256.
    pub message_id: u8,
    payload: Payload,
}

impl Frame {
    /// Builds a frame from its header fields and payload.
    ///
    /// # Errors
    /// [`FrameError::PayloadTooLong`] if `payload` exceeds 255 bytes.
    pub fn new(
        destination: u8,
        sender: u8,
        message_id: u8,
        payload: &[u8],
    ) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLong { len: payload.len() })?;
        Ok(Self {
            destination,
            sender,
            message_id,
            payload,
        })
    }

    /// The raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Value of the `payload_length` header byte.
    pub fn payload_len(&self) -> u8 {
        // Capacity of `Payload` is 255, so this never truncates.
        self.payload.len() as u8
    }

    /// The payload interpreted as UTF-8 text.
    pub fn text(&self) -> Result<&str, Utf8Error> {
        core::str::from_utf8(&self.payload)
    }

    /// Whether the frame is addressed to every listener.
    pub fn is_broadcast(&self) -> bool {
        self.destination == BROADCAST_ADDRESS
    }

    /// Encodes this frame into its wire representation.
    pub fn encode(&self) -> FrameBytes {
        let mut bytes = Vec::new();
        // Header plus a payload of at most 255 bytes always fits `MAX_FRAME_LEN`.
        let _ = bytes.extend_from_slice(&[
            self.destination,
            self.sender,
            self.message_id,
            self.payload_len(),
        ]);
        let _ = bytes.extend_from_slice(&self.payload);
        bytes
    }
}

/// Encodes a frame header and payload into exactly `4 + payload.len()` bytes.
///
/// # Errors
/// [`FrameError::PayloadTooLong`] if `payload` exceeds 255 bytes. The payload is
/// never truncated to fit.
pub fn encode(
    destination: u8,
    sender: u8,
    message_id: u8,
    payload: &[u8],
) -> Result<FrameBytes, FrameError> {
    Ok(Frame::new(destination, sender, message_id, payload)?.encode())
}

/// Decodes one received packet.
///
/// Every byte after the four header bytes is taken as payload.
///
/// # Returns
/// - `Ok(None)`: no bytes were available, which is not an error
/// - `Ok(Some(frame))`: a well-formed frame
///
/// # Errors
/// - [`FrameError::TruncatedHeader`] if 1 to 3 bytes were available
/// - [`FrameError::LengthMismatch`] if the declared payload length differs from the
///   number of bytes that followed the header
pub fn decode(bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    if bytes.len() < HEADER_LEN {
        return Err(FrameError::TruncatedHeader {
            available: bytes.len(),
        });
    }

    let (header, payload) = bytes.split_at(HEADER_LEN);
    let declared = header[3];
    if payload.len() != declared as usize {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    Frame::new(header[0], header[1], header[2], payload).map(Some)
}
