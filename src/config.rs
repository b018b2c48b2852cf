//! Node configuration.
//!
//! [`NodeConfig`] gathers everything fixed at configuration time: the node's own
//! address, where its frames go, the radio frequency and wiring, and the timing of
//! the duty cycle. The defaults match a node at address `0xBB` broadcasting
//! `"Helo Message!"` on 915 MHz every one to three seconds.
//!
//! ```rust
//! use lora_duplex::config::NodeConfig;
//!
//! let config = NodeConfig::default()
//!     .with_local_address(0xCC)
//!     .with_frequency_hz(868_000_000);
//! assert!(config.validate().is_ok());
//! ```

use crate::consts::{
    BROADCAST_ADDRESS, DEFAULT_FREQUENCY_HZ, DEFAULT_LOCAL_ADDRESS, DEFAULT_MESSAGE,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_SEND_INTERVAL_MS, MAX_SEND_INTERVAL_MS,
    MIN_SEND_INTERVAL_MS,
};
use crate::error::ConfigError;

use rand_core::RngCore;

/// Board wiring of the radio module.
///
/// Pin numbers are handed verbatim to [`Radio::initialize`](crate::transport::Radio::initialize);
/// their meaning is up to the board support code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct PinMap {
    /// SPI chip select.
    pub chip_select: u8,
    /// Radio reset line.
    pub reset: u8,
    /// Interrupt line raised when a packet has been received (DIO0).
    pub irq: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            chip_select: 8,
            reset: 4,
            irq: 7,
        }
    }
}

/// Half-open range `[min_ms, max_ms)` send intervals are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct IntervalRange {
    /// Inclusive lower bound.
    pub min_ms: u32,
    /// Exclusive upper bound.
    pub max_ms: u32,
}

impl Default for IntervalRange {
    fn default() -> Self {
        Self {
            min_ms: MIN_SEND_INTERVAL_MS,
            max_ms: MAX_SEND_INTERVAL_MS,
        }
    }
}

impl IntervalRange {
    /// Draws a uniformly distributed interval from the range.
    ///
    /// Uses a widening multiply rather than a modulo so no value is favoured.
    /// An empty range yields `min_ms`.
    pub fn sample<G: RngCore>(&self, rng: &mut G) -> u32 {
        let span = self.max_ms.saturating_sub(self.min_ms) as u64;
        let offset = (rng.next_u32() as u64 * span) >> 32;
        self.min_ms + offset as u32
    }

    /// Whether the range holds at least one value.
    pub fn is_empty(&self) -> bool {
        self.min_ms >= self.max_ms
    }
}

/// Everything a [`Node`](crate::node::Node) needs to know before it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeConfig {
    /// Address of this device.
    pub local_address: u8,
    /// Destination written into every outgoing frame. Broadcast by default.
    pub destination: u8,
    /// Carrier frequency in Hz.
    pub frequency_hz: u32,
    /// Radio wiring.
    pub pins: PinMap,
    /// Interval before the first transmission.
    pub initial_interval_ms: u32,
    /// Range every later interval is drawn from.
    pub interval_range: IntervalRange,
    /// Text sent on each scheduled transmission.
    pub message: &'static str,
    /// Delay between two scheduler polls of the blocking runner.
    pub poll_interval_ms: u32,
    /// Deliver frames regardless of their destination.
    pub promiscuous: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            local_address: DEFAULT_LOCAL_ADDRESS,
            destination: BROADCAST_ADDRESS,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            pins: PinMap::default(),
            initial_interval_ms: DEFAULT_SEND_INTERVAL_MS,
            interval_range: IntervalRange::default(),
            message: DEFAULT_MESSAGE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            promiscuous: false,
        }
    }
}

impl NodeConfig {
    /// Sets the address of this device.
    pub fn with_local_address(mut self, local_address: u8) -> Self {
        self.local_address = local_address;
        self
    }

    /// Sets the destination of outgoing frames.
    pub fn with_destination(mut self, destination: u8) -> Self {
        self.destination = destination;
        self
    }

    /// Sets the carrier frequency.
    pub fn with_frequency_hz(mut self, frequency_hz: u32) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    /// Sets the radio wiring.
    pub fn with_pins(mut self, pins: PinMap) -> Self {
        self.pins = pins;
        self
    }

    /// Sets the interval before the first transmission.
    pub fn with_initial_interval_ms(mut self, initial_interval_ms: u32) -> Self {
        self.initial_interval_ms = initial_interval_ms;
        self
    }

    /// Sets the range later intervals are drawn from.
    pub fn with_interval_range(mut self, min_ms: u32, max_ms: u32) -> Self {
        self.interval_range = IntervalRange { min_ms, max_ms };
        self
    }

    /// Sets the text sent on each scheduled transmission.
    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = message;
        self
    }

    /// Sets the polling cadence of the blocking runner.
    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Enables or disables promiscuous receive.
    pub fn with_promiscuous(mut self, promiscuous: bool) -> Self {
        self.promiscuous = promiscuous;
        self
    }

    /// Checks the timing settings.
    ///
    /// [`Node::begin`](crate::node::Node::begin) calls this before touching the radio.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyIntervalRange`] if no interval can be drawn
    /// - [`ConfigError::ZeroInitialInterval`] if the first send would be immediate
    /// - [`ConfigError::ZeroPollInterval`] if the runner would never yield
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_range.is_empty() {
            return Err(ConfigError::EmptyIntervalRange {
                min_ms: self.interval_range.min_ms,
                max_ms: self.interval_range.max_ms,
            });
        }
        if self.initial_interval_ms == 0 {
            return Err(ConfigError::ZeroInitialInterval);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.local_address, 0xBB);
        assert_eq!(config.destination, BROADCAST_ADDRESS);
        assert_eq!(config.frequency_hz, 915_000_000);
        assert_eq!(config.pins, PinMap { chip_select: 8, reset: 4, irq: 7 });
        assert_eq!(config.initial_interval_ms, 2_000);
        assert_eq!(config.message, "Helo Message!");
        assert!(!config.promiscuous);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = NodeConfig::default()
            .with_local_address(0x01)
            .with_destination(0x02)
            .with_interval_range(10, 20)
            .with_initial_interval_ms(5)
            .with_message("ping")
            .with_poll_interval_ms(1)
            .with_promiscuous(true);
        assert_eq!(config.local_address, 0x01);
        assert_eq!(config.destination, 0x02);
        assert_eq!(config.interval_range, IntervalRange { min_ms: 10, max_ms: 20 });
        assert_eq!(config.message, "ping");
        assert!(config.promiscuous);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_timing() {
        let config = NodeConfig::default().with_interval_range(3_000, 1_000);
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyIntervalRange {
                min_ms: 3_000,
                max_ms: 1_000
            })
        );
        let config = NodeConfig::default().with_initial_interval_ms(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroInitialInterval));
        let config = NodeConfig::default().with_poll_interval_ms(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));
    }

    #[test]
    fn test_sample_empty_range_yields_min() {
        let range = IntervalRange { min_ms: 50, max_ms: 50 };
        assert_eq!(range.sample(&mut StepRng::new(u64::MAX, 1)), 50);
    }
}
