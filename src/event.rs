//! Structured events reported by a node.
//!
//! The node never prints anything itself. Every delivery, drop and failure is turned
//! into a [`NodeEvent`] and handed to an [`EventSink`], which decides how (and
//! whether) to present it: a serial console, a display, a test recorder. [`LogSink`]
//! renders events through the crate's logging backend.

use crate::frame::Frame;

/// A received frame plus the link quality it arrived with.
///
/// An immutable snapshot: the node builds it for one [`EventSink::on_event`] call
/// and keeps nothing afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Reception {
    /// The decoded frame.
    pub frame: Frame,
    /// Signal strength in dBm, sampled when the frame was processed.
    pub rssi: i16,
    /// Signal-to-noise ratio in dB, sampled when the frame was processed.
    pub snr: f32,
}

/// Something that happened on a node.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum NodeEvent<'a> {
    /// The radio initialized and the node is listening.
    Started {
        /// Address of this node.
        local_address: u8,
        /// Carrier frequency in Hz.
        frequency_hz: u32,
    },
    /// The radio failed to initialize. The node is halted for good.
    InitFailed,
    /// A frame was sent.
    Sent {
        /// Destination of the frame.
        destination: u8,
        /// Message id the frame carried.
        message_id: u8,
        /// Payload length in bytes.
        length: u8,
    },
    /// The radio failed while sending. The frame is lost.
    TransmitFailed {
        /// Message id the frame would have carried.
        message_id: u8,
    },
    /// A frame for this node (or broadcast) was received.
    Received(&'a Reception),
    /// A frame was dropped because its declared length did not match its payload.
    LengthMismatch {
        /// Declared payload length.
        declared: u8,
        /// Payload bytes actually received.
        actual: usize,
    },
    /// A packet too short to hold a header was dropped.
    TruncatedHeader {
        /// Bytes that were available.
        available: usize,
    },
    /// A well-formed frame addressed to another node was dropped.
    NotForMe {
        /// Destination of the dropped frame.
        destination: u8,
        /// Sender of the dropped frame.
        sender: u8,
    },
}

/// Receives the events of a node.
pub trait EventSink {
    /// Called once per event, synchronously, from the node's main loop.
    fn on_event(&mut self, event: &NodeEvent<'_>);
}

/// Discards every event.
impl EventSink for () {
    fn on_event(&mut self, _event: &NodeEvent<'_>) {}
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn on_event(&mut self, event: &NodeEvent<'_>) {
        (**self).on_event(event);
    }
}

/// Renders events through the `log` or `defmt` backend, whichever is enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_event(&mut self, event: &NodeEvent<'_>) {
        match *event {
            NodeEvent::Started {
                local_address,
                frequency_hz,
            } => {
                info!(
                    "radio init succeeded: address {}, {} Hz",
                    local_address, frequency_hz
                );
            }
            NodeEvent::InitFailed => {
                error!("radio init failed, check your connections");
            }
            NodeEvent::Sent {
                destination,
                message_id,
                length,
            } => {
                info!(
                    "sent message {} ({} bytes) to {}",
                    message_id, length, destination
                );
            }
            NodeEvent::TransmitFailed { message_id } => {
                warn!("transmit of message {} failed", message_id);
            }
            NodeEvent::Received(reception) => {
                let frame = &reception.frame;
                info!(
                    "received from {} to {}, id {}, {} bytes, rssi {} snr {}",
                    frame.sender,
                    frame.destination,
                    frame.message_id,
                    frame.payload_len(),
                    reception.rssi,
                    reception.snr
                );
                if let Ok(text) = frame.text() {
                    info!("message: {}", text);
                }
            }
            NodeEvent::LengthMismatch { declared, actual } => {
                warn!(
                    "message length {} does not match the {} bytes received",
                    declared, actual
                );
            }
            NodeEvent::TruncatedHeader { available } => {
                warn!("dropped {} byte packet, too short for a header", available);
            }
            NodeEvent::NotForMe {
                destination,
                sender,
            } => {
                debug!(
                    "message from {} to {} is not for me",
                    sender, destination
                );
            }
        }
    }
}
