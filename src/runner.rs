//! Blocking main loop for single-purpose firmware.
//!
//! [`run_node_loop`] drives a [`Node`] forever: it starts the radio, then polls the
//! node at a fixed cadence using an `embedded_hal::delay::DelayNs` provider. If the
//! radio fails to initialize the loop parks in [`halt`] and never transmits or
//! receives again.
//!
//! The receive interrupt handler only needs the shared [`ReceiveQueue`]:
//!
//! ```rust,ignore
//! static RX_QUEUE: ReceiveQueue = ReceiveQueue::new();
//!
//! #[interrupt]
//! fn EXTI9_5() {
//!     RX_QUEUE.notify(radio_irq_payload_len());
//! }
//!
//! fn main() -> ! {
//!     let node = Node::new(radio, NodeConfig::default(), rng, clock.now_ms());
//!     run_node_loop(node, &mut clock, &mut delay, &RX_QUEUE, &mut LogSink)
//! }
//! ```

use crate::error::NodeError;
use crate::event::EventSink;
use crate::irq::ReceiveQueue;
use crate::node::Node;
use crate::transport::Radio;

use embedded_hal::delay::DelayNs;
use rand_core::RngCore;

/// Source of the current uptime in milliseconds.
///
/// The value is expected to wrap around at `u32::MAX` like an Arduino-style
/// `millis()` counter.
pub trait Clock {
    /// Milliseconds since boot.
    fn now_ms(&mut self) -> u32;
}

impl<F: FnMut() -> u32> Clock for F {
    fn now_ms(&mut self) -> u32 {
        self()
    }
}

/// Polls `node` once, then waits one poll interval.
///
/// # Errors
/// Whatever [`Node::poll`] reported. The delay happens regardless.
pub fn run_node_step<R, G, C, D, S, const N: usize>(
    node: &mut Node<R, G>,
    clock: &mut C,
    delay: &mut D,
    queue: &ReceiveQueue<N>,
    sink: &mut S,
) -> Result<(), NodeError<R::Error>>
where
    R: Radio,
    G: RngCore,
    C: Clock,
    D: DelayNs,
    S: EventSink,
{
    let result = node.poll(clock, queue, sink);
    delay.delay_ms(node.config().poll_interval_ms);
    result
}

/// Starts `node` and runs it forever.
///
/// # Notes
/// - Never returns. If the configuration is rejected or the radio fails to
///   initialize, the loop parks in [`halt`].
/// - Transmit errors are logged and the loop keeps going; the next attempt happens
///   after the freshly drawn interval.
pub fn run_node_loop<R, G, C, D, S, const N: usize>(
    mut node: Node<R, G>,
    clock: &mut C,
    delay: &mut D,
    queue: &ReceiveQueue<N>,
    sink: &mut S,
) -> !
where
    R: Radio,
    G: RngCore,
    C: Clock,
    D: DelayNs,
    S: EventSink,
{
    if node.begin(sink).is_err() {
        halt(delay, node.config().poll_interval_ms);
    }
    info!("node {} running", node.local_address());

    loop {
        if run_node_step(&mut node, clock, delay, queue, sink).is_err() {
            warn!("poll failed, continuing");
        }
    }
}

/// Parks the device forever without touching the radio.
///
/// Sleeps at least one millisecond per iteration, even for a zero `poll_interval_ms`.
pub fn halt<D: DelayNs>(delay: &mut D, poll_interval_ms: u32) -> ! {
    error!("halted");
    let idle_ms = poll_interval_ms.max(1);
    loop {
        delay.delay_ms(idle_ms);
    }
}

/// [`Clock`] backed by `std::time::Instant`, for running a node on a host.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl StdClock {
    /// Starts counting from now.
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_ms(&mut self) -> u32 {
        // Truncation gives the same wrap-around as a 32-bit millis() counter.
        self.start.elapsed().as_millis() as u32
    }
}
