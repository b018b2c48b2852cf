//! In-memory radio channel for host-side testing.
//!
//! An [`Ether`] is a shared medium; every [`SimRadio`] attached to it hears every
//! packet another radio sends, *provided it is in receive mode at that moment*.
//! That reproduces the half-duplex behaviour of a real transceiver: a radio that is
//! transmitting, or that forgot to re-enter receive mode afterwards, misses traffic.
//!
//! Delivery to the node is two-step, like on hardware:
//!
//! 1. [`SimRadio::raise_interrupt`] plays the role of the DIO0 line. It moves the
//!    next queued packet into the read buffer and pushes its length onto a
//!    [`ReceiveQueue`].
//! 2. The node drains the bytes with [`Radio::read`] on its next poll.
//!
//! Only available with the `std` feature.

use crate::config::PinMap;
use crate::consts::MAX_FRAME_LEN;
use crate::irq::ReceiveQueue;
use crate::transport::Radio;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use thiserror::Error;

/// Error raised by a [`SimRadio`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// The radio was configured to fail initialization.
    #[error("simulated radio did not respond")]
    NoResponse,
    /// An operation was attempted before [`Radio::initialize`] succeeded.
    #[error("simulated radio is not initialized")]
    NotInitialized,
    /// `write` or `end_transmit` was called without `begin_transmit`.
    #[error("no packet is being assembled")]
    NotTransmitting,
    /// The packet exceeds the radio FIFO.
    #[error("packet exceeds the {0} byte FIFO")]
    FifoOverflow(usize),
}

/// Operating mode of a [`SimRadio`].
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum SimMode {
    /// Powered down, not initialized.
    #[default]
    Sleep,
    /// Initialized, neither sending nor listening.
    Standby,
    /// Assembling or sending a packet.
    Transmit,
    /// Listening for packets.
    Receive,
}

#[derive(Debug, Default)]
struct Station {
    listening: bool,
    inbox: VecDeque<Vec<u8>>,
}

#[derive(Debug, Default)]
struct Medium {
    stations: Vec<Station>,
    on_air: Vec<Vec<u8>>,
}

/// A shared simulated channel.
#[derive(Debug, Default, Clone)]
pub struct Ether {
    medium: Rc<RefCell<Medium>>,
}

impl Ether {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a new radio to the channel.
    pub fn attach(&self) -> SimRadio {
        let id = {
            let mut medium = self.medium.borrow_mut();
            medium.stations.push(Station::default());
            medium.stations.len() - 1
        };
        SimRadio {
            id,
            medium: Rc::clone(&self.medium),
            mode: SimMode::Sleep,
            fail_init: false,
            frequency_hz: None,
            tx_buf: Vec::new(),
            rx_buf: VecDeque::new(),
            rssi: -60,
            snr: 9.0,
        }
    }

    /// Every packet sent on the channel so far, in order.
    pub fn on_air(&self) -> Vec<Vec<u8>> {
        self.medium.borrow().on_air.clone()
    }
}

/// A simulated half-duplex radio attached to an [`Ether`].
#[derive(Debug)]
pub struct SimRadio {
    id: usize,
    medium: Rc<RefCell<Medium>>,
    mode: SimMode,
    fail_init: bool,
    frequency_hz: Option<u32>,
    tx_buf: Vec<u8>,
    rx_buf: VecDeque<u8>,
    rssi: i16,
    snr: f32,
}

impl SimRadio {
    /// Largest packet the simulated FIFO holds. Fits every frame the codec can build.
    pub const FIFO_LEN: usize = MAX_FRAME_LEN;

    /// Makes [`Radio::initialize`] fail, as with a miswired module.
    pub fn failing(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Sets the link quality reported for packets this radio receives.
    pub fn with_link_quality(mut self, rssi: i16, snr: f32) -> Self {
        self.rssi = rssi;
        self.snr = snr;
        self
    }

    /// Current operating mode.
    pub fn mode(&self) -> SimMode {
        self.mode
    }

    /// Frequency the radio was initialized on.
    pub fn frequency_hz(&self) -> Option<u32> {
        self.frequency_hz
    }

    /// Packets heard but not yet handed to the node.
    pub fn pending_packets(&self) -> usize {
        self.medium.borrow().stations[self.id].inbox.len()
    }

    /// Simulates the receive interrupt.
    ///
    /// Loads the next heard packet into the read buffer and reports its size on
    /// `queue`. Does nothing while not in receive mode or when nothing was heard.
    ///
    /// # Returns
    /// Whether a notification was raised.
    pub fn raise_interrupt<const N: usize>(&mut self, queue: &ReceiveQueue<N>) -> bool {
        if self.mode != SimMode::Receive {
            return false;
        }
        let packet = self.medium.borrow_mut().stations[self.id].inbox.pop_front();
        match packet {
            Some(packet) => {
                self.rx_buf = packet.into();
                queue.notify(self.rx_buf.len())
            }
            None => false,
        }
    }

    fn set_mode(&mut self, mode: SimMode) {
        self.mode = mode;
        self.medium.borrow_mut().stations[self.id].listening = mode == SimMode::Receive;
    }
}

impl Radio for SimRadio {
    type Error = SimError;

    fn initialize(&mut self, frequency_hz: u32, _pins: &PinMap) -> Result<(), SimError> {
        if self.fail_init {
            return Err(SimError::NoResponse);
        }
        self.frequency_hz = Some(frequency_hz);
        self.set_mode(SimMode::Standby);
        Ok(())
    }

    fn begin_transmit(&mut self) -> Result<(), SimError> {
        if self.mode == SimMode::Sleep {
            return Err(SimError::NotInitialized);
        }
        self.tx_buf.clear();
        self.set_mode(SimMode::Transmit);
        Ok(())
    }

    fn write(&mut self, byte: u8) -> Result<(), SimError> {
        if self.mode != SimMode::Transmit {
            return Err(SimError::NotTransmitting);
        }
        if self.tx_buf.len() >= Self::FIFO_LEN {
            return Err(SimError::FifoOverflow(Self::FIFO_LEN));
        }
        self.tx_buf.push(byte);
        Ok(())
    }

    fn end_transmit(&mut self) -> nb::Result<(), SimError> {
        if self.mode != SimMode::Transmit {
            return Err(nb::Error::Other(SimError::NotTransmitting));
        }
        let packet = core::mem::take(&mut self.tx_buf);
        {
            let mut medium = self.medium.borrow_mut();
            for (id, station) in medium.stations.iter_mut().enumerate() {
                if id != self.id && station.listening {
                    station.inbox.push_back(packet.clone());
                }
            }
            medium.on_air.push(packet);
        }
        // Like a real chip, drop to standby once the packet is out.
        self.set_mode(SimMode::Standby);
        Ok(())
    }

    fn enter_receive_mode(&mut self) -> Result<(), SimError> {
        if self.mode == SimMode::Sleep {
            return Err(SimError::NotInitialized);
        }
        self.set_mode(SimMode::Receive);
        Ok(())
    }

    fn read(&mut self) -> Option<u8> {
        self.rx_buf.pop_front()
    }

    fn last_signal_strength(&self) -> i16 {
        self.rssi
    }

    fn last_signal_to_noise(&self) -> f32 {
        self.snr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use crate::consts::BROADCAST_ADDRESS;
    use crate::error::NodeError;
    use crate::event::{EventSink, NodeEvent, Reception};
    use crate::frame;
    use crate::node::Node;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[derive(Debug, Default)]
    struct Inbox {
        received: Vec<Reception>,
        not_for_me: Vec<(u8, u8)>,
        init_failed: usize,
    }

    impl EventSink for Inbox {
        fn on_event(&mut self, event: &NodeEvent<'_>) {
            match *event {
                NodeEvent::Received(reception) => self.received.push(reception.clone()),
                NodeEvent::NotForMe {
                    destination,
                    sender,
                } => self.not_for_me.push((destination, sender)),
                NodeEvent::InitFailed => self.init_failed += 1,
                _ => {}
            }
        }
    }

    fn at(now_ms: u32) -> impl FnMut() -> u32 {
        move || now_ms
    }

    fn node(radio: SimRadio, address: u8, seed: u64) -> Node<SimRadio, SmallRng> {
        let config = NodeConfig::default().with_local_address(address);
        let mut node = Node::new(radio, config, SmallRng::seed_from_u64(seed), 0);
        node.begin(&mut ()).unwrap();
        node
    }

    #[test]
    fn test_broadcast_reaches_peer() {
        let ether = Ether::new();
        let queue: ReceiveQueue = ReceiveQueue::new();
        let mut sender = node(ether.attach(), 0xBB, 1);
        let mut peer = node(ether.attach().with_link_quality(-87, -3.5), 0xCC, 2);
        let mut inbox = Inbox::default();

        sender.poll(&mut at(2_000), &queue, &mut ()).unwrap();
        assert!(peer.radio_mut().raise_interrupt(&queue));
        peer.poll(&mut at(2_001), &queue, &mut inbox).unwrap();

        assert_eq!(inbox.received.len(), 1);
        let reception = &inbox.received[0];
        assert_eq!(reception.frame.destination, BROADCAST_ADDRESS);
        assert_eq!(reception.frame.sender, 0xBB);
        assert_eq!(reception.frame.message_id, 0);
        assert_eq!(reception.frame.payload_len(), 13);
        assert_eq!(reception.frame.text(), Ok("Helo Message!"));
        assert_eq!(reception.rssi, -87);
        assert_eq!(reception.snr, -3.5);
    }

    #[test]
    fn test_unicast_to_other_node_is_dropped() {
        let ether = Ether::new();
        let queue: ReceiveQueue = ReceiveQueue::new();
        let mut injector = ether.attach();
        let mut receiver = node(ether.attach(), 0xBB, 3);
        let mut inbox = Inbox::default();

        injector.initialize(915_000_000, &PinMap::default()).unwrap();
        injector.begin_transmit().unwrap();
        injector
            .write_all(&frame::encode(0x01, 0xCC, 4, b"not yours").unwrap())
            .unwrap();
        injector.end_transmit().unwrap();

        assert!(receiver.radio_mut().raise_interrupt(&queue));
        receiver.poll(&mut at(10), &queue, &mut inbox).unwrap();

        assert!(inbox.received.is_empty());
        assert_eq!(inbox.not_for_me, vec![(0x01, 0xCC)]);
    }

    #[test]
    fn test_transmitting_radio_misses_traffic() {
        let ether = Ether::new();
        let mut a = ether.attach();
        let mut b = ether.attach();
        a.initialize(915_000_000, &PinMap::default()).unwrap();
        b.initialize(915_000_000, &PinMap::default()).unwrap();

        // b is mid-transmission when a sends
        b.begin_transmit().unwrap();
        a.enter_receive_mode().unwrap();
        a.begin_transmit().unwrap();
        a.write_all(b"x").unwrap();
        a.end_transmit().unwrap();
        b.write_all(b"y").unwrap();
        b.end_transmit().unwrap();

        assert_eq!(a.pending_packets(), 0);
        assert_eq!(b.pending_packets(), 0);
        assert_eq!(ether.on_air(), vec![b"x".to_vec(), b"y".to_vec()]);
    }

    #[test]
    fn test_node_rearms_receive_after_send() {
        let ether = Ether::new();
        let queue: ReceiveQueue = ReceiveQueue::new();
        let mut a = node(ether.attach(), 0xAA, 5);
        let mut b = node(ether.attach(), 0xBB, 6);
        let mut inbox = Inbox::default();

        a.poll(&mut at(2_000), &queue, &mut ()).unwrap();
        assert_eq!(a.radio().mode(), SimMode::Receive);
        assert!(b.radio_mut().raise_interrupt(&queue));
        b.poll(&mut at(2_000), &queue, &mut inbox).unwrap();
        assert_eq!(b.radio().mode(), SimMode::Receive);

        // b answered too; a must still hear it
        assert!(a.radio_mut().raise_interrupt(&queue));
        a.poll(&mut at(2_001), &queue, &mut inbox).unwrap();
        let senders: Vec<u8> = inbox.received.iter().map(|r| r.frame.sender).collect();
        assert_eq!(senders, vec![0xAA, 0xBB]);
    }

    #[test]
    fn test_message_ids_increase_per_sender() {
        let ether = Ether::new();
        let queue: ReceiveQueue = ReceiveQueue::new();
        let mut a = node(ether.attach(), 0xAA, 8);
        let mut now = 0u32;
        for _ in 0..5 {
            now += a.scheduler().interval_ms();
            a.poll(&mut at(now), &queue, &mut ()).unwrap();
        }
        let ids: Vec<u8> = ether.on_air().iter().map(|p| p[2]).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_failing_radio_halts_node() {
        let ether = Ether::new();
        let mut inbox = Inbox::default();
        let mut node = Node::new(
            ether.attach().failing(),
            NodeConfig::default(),
            SmallRng::seed_from_u64(9),
            0,
        );
        assert_eq!(node.begin(&mut inbox), Err(NodeError::InitFailed));
        assert_eq!(node.begin(&mut inbox), Err(NodeError::Halted));
        assert_eq!(inbox.init_failed, 1);
        assert_eq!(node.radio().mode(), SimMode::Sleep);
        assert!(ether.on_air().is_empty());
    }

    #[test]
    fn test_write_requires_begin_transmit() {
        let ether = Ether::new();
        let mut radio = ether.attach();
        assert_eq!(radio.begin_transmit(), Err(SimError::NotInitialized));
        radio.initialize(433_000_000, &PinMap::default()).unwrap();
        assert_eq!(radio.frequency_hz(), Some(433_000_000));
        assert_eq!(radio.write(1), Err(SimError::NotTransmitting));
    }

    #[test]
    fn test_largest_frame_fits_fifo() {
        let ether = Ether::new();
        let queue: ReceiveQueue = ReceiveQueue::new();
        let mut sender = node(ether.attach(), 0xBB, 10);
        let mut peer = node(ether.attach(), 0xCC, 11);
        let mut inbox = Inbox::default();

        sender.send_bytes(&[b'z'; 255], &mut ()).unwrap();
        assert_eq!(ether.on_air()[0].len(), MAX_FRAME_LEN);

        assert!(peer.radio_mut().raise_interrupt(&queue));
        peer.poll(&mut at(10), &queue, &mut inbox).unwrap();
        assert_eq!(inbox.received.len(), 1);
        assert_eq!(inbox.received[0].frame.payload_len(), 255);
    }

    #[test]
    fn test_write_past_fifo_overflows() {
        let ether = Ether::new();
        let mut radio = ether.attach();
        radio.initialize(915_000_000, &PinMap::default()).unwrap();
        radio.begin_transmit().unwrap();
        radio.write_all(&[0; SimRadio::FIFO_LEN]).unwrap();
        assert_eq!(radio.write(0), Err(SimError::FifoOverflow(SimRadio::FIFO_LEN)));
    }
}
