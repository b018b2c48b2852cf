//! Receive notifications raised from interrupt context.
//!
//! The radio signals a received packet through an interrupt line. Rather than
//! running the protocol inside that interrupt, the handler only records how many
//! bytes are waiting, and the main loop picks the notification up on its next
//! [`Node::poll`](crate::node::Node::poll). Frame processing therefore never
//! overlaps a transmission.
//!
//! The queue is shared between the interrupt handler and the main loop through a
//! `critical_section::Mutex`, so it can live in a `static`.
//!
//! # Example
//! ```rust
//! use lora_duplex::irq::ReceiveQueue;
//!
//! static RX_QUEUE: ReceiveQueue = ReceiveQueue::new();
//!
//! // Inside the DIO0 interrupt handler:
//! RX_QUEUE.notify(17);
//!
//! // On the main loop:
//! assert_eq!(RX_QUEUE.take(), Some(17));
//! assert_eq!(RX_QUEUE.take(), None);
//! ```

use crate::consts::RECEIVE_QUEUE_LEN;

use core::cell::RefCell;
use core::fmt;
use critical_section::Mutex;
use heapless::Deque;

/// Single-consumer queue of "bytes available" notifications.
pub struct ReceiveQueue<const N: usize = RECEIVE_QUEUE_LEN> {
    pending: Mutex<RefCell<Deque<usize, N>>>,
}

impl<const N: usize> fmt::Debug for ReceiveQueue<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiveQueue")
            .field("pending", &self.len())
            .field("capacity", &N)
            .finish()
    }
}

impl<const N: usize> Default for ReceiveQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ReceiveQueue<N> {
    /// Creates an empty queue. Usable in `static` initializers.
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Records that `available` bytes are waiting in the radio.
    ///
    /// Call from the receive interrupt handler.
    ///
    /// # Returns
    /// `false` if the queue was full and the notification was dropped.
    pub fn notify(&self, available: usize) -> bool {
        let queued = critical_section::with(|cs| {
            self.pending
                .borrow(cs)
                .borrow_mut()
                .push_back(available)
                .is_ok()
        });
        if !queued {
            warn!("receive queue full, dropping notification of {} bytes", available);
        }
        queued
    }

    /// Takes the oldest pending notification.
    pub fn take(&self) -> Option<usize> {
        critical_section::with(|cs| self.pending.borrow(cs).borrow_mut().pop_front())
    }

    /// Number of notifications waiting.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.pending.borrow(cs).borrow().len())
    }

    /// Whether no notification is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let queue: ReceiveQueue<4> = ReceiveQueue::new();
        assert!(queue.is_empty());
        assert!(queue.notify(3));
        assert!(queue.notify(0));
        assert!(queue.notify(17));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.take(), Some(3));
        assert_eq!(queue.take(), Some(0));
        assert_eq!(queue.take(), Some(17));
        assert_eq!(queue.take(), None);
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let queue: ReceiveQueue<2> = ReceiveQueue::new();
        assert!(queue.notify(1));
        assert!(queue.notify(2));
        assert!(!queue.notify(3));
        assert_eq!(queue.take(), Some(1));
        assert_eq!(queue.take(), Some(2));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_static_queue() {
        static QUEUE: ReceiveQueue = ReceiveQueue::new();
        assert!(QUEUE.notify(9));
        assert_eq!(QUEUE.take(), Some(9));
    }
}
