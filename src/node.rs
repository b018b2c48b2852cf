//! The device node: composes the codec, the address filter and the duty-cycle
//! scheduler on top of a [`Radio`].
//!
//! A [`Node`] owns all mutable protocol state of one device:
//!
//! - the outgoing message counter, advanced only by the transmit path
//! - the [`DutyCycle`] scheduler with its randomized send interval
//!
//! Receive processing only reads that state, and both paths run from
//! [`Node::poll`] on the main loop, so they are serialized by `&mut self` rather
//! than by a lock.
//!
//! ## Lifecycle
//!
//! 1. [`Node::new`] builds an idle node.
//! 2. [`Node::begin`] validates the configuration, initializes the radio and starts
//!    listening. If the radio fails to initialize the node halts permanently; every
//!    later call returns [`NodeError::Halted`] without touching the radio.
//! 3. [`Node::poll`] is called at a fixed cadence. It handles pending receive
//!    notifications, then transmits if the current interval has elapsed. The next
//!    interval is measured from the moment the transmission completed, so `poll`
//!    reads the time from a [`Clock`] rather than taking a timestamp.
//!
//! ## Example
//!
//! ```rust
//! use lora_duplex::config::NodeConfig;
//! use lora_duplex::event::LogSink;
//! use lora_duplex::irq::ReceiveQueue;
//! use lora_duplex::node::Node;
//! use lora_duplex::sim::Ether;
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//!
//! let ether = Ether::new();
//! let queue: ReceiveQueue = ReceiveQueue::new();
//! let mut node = Node::new(ether.attach(), NodeConfig::default(), SmallRng::seed_from_u64(1), 0);
//! let mut sink = LogSink;
//!
//! node.begin(&mut sink).unwrap();
//! let mut clock = || 2_000u32;
//! node.poll(&mut clock, &queue, &mut sink).unwrap(); // first interval has elapsed
//! assert_eq!(node.outgoing_counter(), 1);
//! ```

use crate::config::NodeConfig;
use crate::consts::HEADER_LEN;
use crate::error::{FrameError, NodeError};
use crate::event::{EventSink, NodeEvent, Reception};
use crate::filter::AddressFilter;
use crate::frame::{self, Frame, FrameBytes};
use crate::irq::ReceiveQueue;
use crate::runner::Clock;
use crate::scheduler::{DutyCycle, DutyState};
use crate::transport::Radio;

use nb::block;
use rand_core::RngCore;

/// Lifecycle state of a [`Node`].
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum NodeState {
    /// Constructed, radio not initialized yet.
    #[default]
    Idle,
    /// Radio initialized; the node transmits and receives.
    Running,
    /// The radio failed to initialize. Terminal.
    Halted,
}

/// One device on the channel.
///
/// ## Type Parameters
///
/// - `R`: The radio transport
/// - `G`: Random source for the send interval
#[derive(Debug)]
pub struct Node<R: Radio, G: RngCore> {
    radio: R,
    config: NodeConfig,
    filter: AddressFilter,
    scheduler: DutyCycle<G>,
    state: NodeState,
    outgoing_counter: u8,
}

impl<R: Radio, G: RngCore> Node<R, G> {
    /// Creates a node that has not touched the radio yet.
    ///
    /// # Arguments
    /// - `radio`: The transport to run on.
    /// - `config`: Addressing and timing settings.
    /// - `rng`: Random source for send intervals. Seed it differently on each device.
    /// - `now_ms`: Current uptime; the first interval is measured from here.
    pub fn new(radio: R, config: NodeConfig, rng: G, now_ms: u32) -> Self {
        Self {
            radio,
            filter: AddressFilter::new(config.local_address).promiscuous(config.promiscuous),
            scheduler: DutyCycle::new(
                rng,
                config.interval_range,
                config.initial_interval_ms,
                now_ms,
            ),
            config,
            state: NodeState::Idle,
            outgoing_counter: 0,
        }
    }

    /// Initializes the radio and enters receive mode.
    ///
    /// On failure the node halts permanently and reports [`NodeEvent::InitFailed`]
    /// exactly once.
    ///
    /// # Errors
    /// - [`NodeError::Config`] if the configuration is invalid; the node stays idle
    /// - [`NodeError::InitFailed`] if the radio could not be initialized
    /// - [`NodeError::Halted`] if a previous call already failed
    /// - [`NodeError::Transport`] if the radio refused to enter receive mode
    pub fn begin<S: EventSink>(&mut self, sink: &mut S) -> Result<(), NodeError<R::Error>> {
        match self.state {
            NodeState::Halted => return Err(NodeError::Halted),
            NodeState::Running => return Ok(()),
            NodeState::Idle => {}
        }

        if let Err(e) = self.config.validate() {
            error!("rejecting node configuration");
            return Err(NodeError::Config(e));
        }

        if self
            .radio
            .initialize(self.config.frequency_hz, &self.config.pins)
            .is_err()
        {
            error!("radio init failed at {} Hz", self.config.frequency_hz);
            self.state = NodeState::Halted;
            sink.on_event(&NodeEvent::InitFailed);
            return Err(NodeError::InitFailed);
        }

        self.radio.enter_receive_mode().map_err(NodeError::Transport)?;
        self.state = NodeState::Running;
        sink.on_event(&NodeEvent::Started {
            local_address: self.config.local_address,
            frequency_hz: self.config.frequency_hz,
        });
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Whether the node halted after an initialization failure.
    pub fn is_halted(&self) -> bool {
        self.state == NodeState::Halted
    }

    /// The configuration the node was built with.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Address of this node.
    pub fn local_address(&self) -> u8 {
        self.config.local_address
    }

    /// Message id the next outgoing frame will carry.
    pub fn outgoing_counter(&self) -> u8 {
        self.outgoing_counter
    }

    /// The duty-cycle scheduler.
    pub fn scheduler(&self) -> &DutyCycle<G> {
        &self.scheduler
    }

    /// The underlying radio.
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Mutable access to the underlying radio.
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Consumes the node and returns its radio.
    pub fn into_radio(self) -> R {
        self.radio
    }

    /// Sends `text` to the configured destination (broadcast by default).
    ///
    /// See [`Node::send_bytes`].
    pub fn send<S: EventSink>(
        &mut self,
        text: &str,
        sink: &mut S,
    ) -> Result<(), NodeError<R::Error>> {
        self.send_bytes(text.as_bytes(), sink)
    }

    /// Sends `payload` to the configured destination (broadcast by default).
    ///
    /// The frame carries the current outgoing counter as its message id. The counter
    /// advances only if the radio accepted the whole frame. Receive mode is re-armed
    /// afterwards whether or not the transmission succeeded.
    ///
    /// # Errors
    /// - [`NodeError::Frame`] if the payload is longer than 255 bytes; nothing is sent
    /// - [`NodeError::Transport`] if the radio failed
    /// - [`NodeError::NotStarted`] / [`NodeError::Halted`] outside the running state
    pub fn send_bytes<S: EventSink>(
        &mut self,
        payload: &[u8],
        sink: &mut S,
    ) -> Result<(), NodeError<R::Error>> {
        self.ensure_running()?;

        let message_id = self.outgoing_counter;
        let bytes = frame::encode(
            self.config.destination,
            self.config.local_address,
            message_id,
            payload,
        )?;

        let sent = self.transmit(&bytes);
        let rearmed = self.radio.enter_receive_mode();

        match sent {
            Ok(()) => {
                self.outgoing_counter = self.outgoing_counter.wrapping_add(1);
                trace!("message {} on air, listening again", message_id);
                sink.on_event(&NodeEvent::Sent {
                    destination: self.config.destination,
                    message_id,
                    length: (bytes.len() - HEADER_LEN) as u8,
                });
            }
            Err(e) => {
                warn!("transmit of message {} failed", message_id);
                sink.on_event(&NodeEvent::TransmitFailed { message_id });
                return Err(NodeError::Transport(e));
            }
        }
        rearmed.map_err(NodeError::Transport)
    }

    fn transmit(&mut self, bytes: &FrameBytes) -> Result<(), R::Error> {
        self.radio.begin_transmit()?;
        self.radio.write_all(bytes)?;
        block!(self.radio.end_transmit())
    }

    /// Handles one receive notification reporting `available` bytes.
    ///
    /// Drains exactly `available` bytes from the radio, decodes them and applies the
    /// address filter. A delivered frame is reported as [`NodeEvent::Received`] along
    /// with the signal strength and signal-to-noise ratio of that packet. Malformed or
    /// foreign frames are reported and dropped.
    ///
    /// Zero bytes is a spurious notification and does nothing.
    ///
    /// # Returns
    /// The delivered frame, if any.
    pub fn on_receive<S: EventSink>(&mut self, available: usize, sink: &mut S) -> Option<Frame> {
        if available == 0 || self.state != NodeState::Running {
            return None;
        }

        let mut packet = FrameBytes::new();
        let mut received = 0usize;
        for _ in 0..available {
            match self.radio.read() {
                Some(byte) => {
                    // Bytes beyond the largest possible frame only count towards the
                    // length check.
                    let _ = packet.push(byte);
                    received += 1;
                }
                None => break,
            }
        }

        let decoded = if received > packet.len() {
            Err(FrameError::LengthMismatch {
                declared: packet[HEADER_LEN - 1],
                actual: received - HEADER_LEN,
            })
        } else {
            frame::decode(&packet)
        };

        let frame = match decoded {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(FrameError::LengthMismatch { declared, actual }) => {
                warn!(
                    "message length {} does not match the {} bytes received",
                    declared, actual
                );
                sink.on_event(&NodeEvent::LengthMismatch { declared, actual });
                return None;
            }
            Err(FrameError::TruncatedHeader { available }) => {
                warn!("dropping {} byte packet without a full header", available);
                sink.on_event(&NodeEvent::TruncatedHeader { available });
                return None;
            }
            Err(FrameError::PayloadTooLong { .. }) => return None,
        };

        if !self.filter.accepts(frame.destination) {
            debug!(
                "message from {} to {} is not for me",
                frame.sender, frame.destination
            );
            sink.on_event(&NodeEvent::NotForMe {
                destination: frame.destination,
                sender: frame.sender,
            });
            return None;
        }

        let reception = Reception {
            frame,
            rssi: self.radio.last_signal_strength(),
            snr: self.radio.last_signal_to_noise(),
        };
        sink.on_event(&NodeEvent::Received(&reception));
        Some(reception.frame)
    }

    /// Runs one iteration of the main loop.
    ///
    /// First every pending receive notification in `queue` is processed to
    /// completion. Then, if the current send interval has elapsed, the configured
    /// message is sent and a new interval is drawn.
    ///
    /// `clock` is read once before the due check and again after the transmit call
    /// returns. The second reading becomes the baseline of the next interval, so
    /// airtime does not eat into the listening window.
    ///
    /// # Errors
    /// - [`NodeError::Halted`] / [`NodeError::NotStarted`] outside the running state
    /// - Any error of [`Node::send_bytes`] for the scheduled transmission. The next
    ///   interval has already been drawn when this is returned.
    pub fn poll<C: Clock, S: EventSink, const N: usize>(
        &mut self,
        clock: &mut C,
        queue: &ReceiveQueue<N>,
        sink: &mut S,
    ) -> Result<(), NodeError<R::Error>> {
        self.ensure_running()?;

        while let Some(available) = queue.take() {
            let _ = self.on_receive(available, sink);
        }

        if !self.scheduler.is_due(clock.now_ms()) {
            return Ok(());
        }

        self.scheduler.begin_transmit();
        let message = self.config.message;
        let result = self.send(message, sink);
        let interval = self.scheduler.finish_transmit(clock.now_ms());
        debug_assert_eq!(self.scheduler.state(), DutyState::Listening);
        trace!("next transmission in {} ms", interval);
        result
    }

    fn ensure_running(&self) -> Result<(), NodeError<R::Error>> {
        match self.state {
            NodeState::Running => Ok(()),
            NodeState::Halted => Err(NodeError::Halted),
            NodeState::Idle => Err(NodeError::NotStarted),
        }
    }
}
