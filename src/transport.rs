//! The radio transport the protocol runs on.
//!
//! The protocol core does not drive any radio chip directly. Instead it consumes the
//! small [`Radio`] trait below, which a board support crate implements on top of a
//! concrete driver (SX127x, SX126x, ...).
//!
//! ## Contract
//!
//! - The channel is half-duplex: while a packet is being transmitted nothing can be
//!   received, and after a transmission the radio stays out of receive mode until
//!   [`Radio::enter_receive_mode`] is called again.
//! - Transmission is synchronous from the caller's point of view:
//!   [`Radio::end_transmit`] returns [`nb::Error::WouldBlock`] until the packet is
//!   physically on air.
//! - When a packet arrives the driver's interrupt handler reports the number of bytes
//!   available, typically through a [`ReceiveQueue`](crate::irq::ReceiveQueue). Those
//!   bytes are then drained with [`Radio::read`].
//! - [`Radio::last_signal_strength`] and [`Radio::last_signal_to_noise`] describe the
//!   most recently received packet only.

use crate::config::PinMap;

use core::fmt::Debug;

/// A half-duplex packet radio.
pub trait Radio {
    /// Error reported by the underlying driver.
    type Error: Debug;

    /// Powers up the radio on `frequency_hz` using the given wiring.
    ///
    /// A failure here is fatal for the node.
    fn initialize(&mut self, frequency_hz: u32, pins: &PinMap) -> Result<(), Self::Error>;

    /// Starts assembling an outgoing packet.
    fn begin_transmit(&mut self) -> Result<(), Self::Error>;

    /// Appends one byte to the outgoing packet.
    fn write(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Sends the assembled packet.
    ///
    /// Returns [`nb::Error::WouldBlock`] while the packet is still being sent.
    fn end_transmit(&mut self) -> nb::Result<(), Self::Error>;

    /// Puts the radio back into continuous receive mode.
    fn enter_receive_mode(&mut self) -> Result<(), Self::Error>;

    /// Reads the next byte of the received packet, if any is left.
    fn read(&mut self) -> Option<u8>;

    /// Signal strength of the last received packet, in dBm.
    fn last_signal_strength(&self) -> i16;

    /// Signal-to-noise ratio of the last received packet, in dB.
    fn last_signal_to_noise(&self) -> f32;

    /// Appends every byte of `bytes` to the outgoing packet.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &byte in bytes {
            self.write(byte)?;
        }
        Ok(())
    }
}
