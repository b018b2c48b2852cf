//! Destination address filtering.
//!
//! A receiver delivers a frame when it is addressed to the receiver itself or to
//! [`BROADCAST_ADDRESS`]. Everything else is dropped without notifying the sender.

use crate::consts::BROADCAST_ADDRESS;

/// Decides whether a frame with `destination` should be delivered to `local_address`.
pub fn should_deliver(destination: u8, local_address: u8) -> bool {
    destination == local_address || destination == BROADCAST_ADDRESS
}

/// Address filter bound to one device.
///
/// In promiscuous mode every frame is delivered regardless of its destination,
/// which is useful for sniffing the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct AddressFilter {
    local_address: u8,
    promiscuous: bool,
}

impl AddressFilter {
    /// Creates a filter that accepts `local_address` and broadcast.
    pub const fn new(local_address: u8) -> Self {
        Self {
            local_address,
            promiscuous: false,
        }
    }

    /// Enables or disables promiscuous mode.
    pub const fn promiscuous(mut self, promiscuous: bool) -> Self {
        self.promiscuous = promiscuous;
        self
    }

    /// The address this filter accepts besides broadcast.
    pub const fn local_address(&self) -> u8 {
        self.local_address
    }

    /// Whether a frame addressed to `destination` passes the filter.
    pub fn accepts(&self, destination: u8) -> bool {
        self.promiscuous || should_deliver(destination, self.local_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivers_to_local_address() {
        for local in 0..=u8::MAX {
            assert!(should_deliver(local, local));
        }
    }

    #[test]
    fn test_delivers_broadcast_everywhere() {
        for local in 0..=u8::MAX {
            assert!(should_deliver(BROADCAST_ADDRESS, local));
        }
    }

    #[test]
    fn test_drops_other_destinations() {
        let local = 0xBB;
        for destination in 0..=u8::MAX {
            let expected = destination == local || destination == BROADCAST_ADDRESS;
            assert_eq!(should_deliver(destination, local), expected);
        }
        assert!(!should_deliver(0x01, 0xBB));
    }

    #[test]
    fn test_promiscuous_accepts_everything() {
        let filter = AddressFilter::new(0xBB).promiscuous(true);
        assert!(filter.accepts(0x01));
        assert!(filter.accepts(0xBB));

        let filter = filter.promiscuous(false);
        assert!(!filter.accepts(0x01));
        assert!(filter.accepts(BROADCAST_ADDRESS));
        assert_eq!(filter.local_address(), 0xBB);
    }
}
