//! # lora-duplex
//!
//! A portable, no_std Rust implementation of a minimal duplex packet protocol for
//! half-duplex LoRa transceivers such as the SX1276/RFM95.
//!
//! Every device has a one-byte address; `0xFF` is the broadcast address. Devices
//! periodically broadcast a short message and listen in between, re-drawing a
//! random send interval after every transmission.
//!
//! This crate implements the protocol core:
//! - a bit-exact frame codec (`[destination][sender][message_id][length][payload]`)
//! - destination filtering with broadcast and optional promiscuous mode
//! - a randomized duty-cycle scheduler for a channel that cannot send and listen at once
//! - a [`Node`](node::Node) tying them together, fed by interrupt-safe receive
//!   notifications built on `critical-section`
//!
//! The radio chip itself is reached through the [`Radio`](transport::Radio) trait.
//!
//! ## Crate features
//! | Feature     | Description |
//! |-------------|-------------|
//! | `std`       | Disables `#![no_std]` and enables the in-memory [`sim`] channel |
//! | `log`       | Uses `log` logging |
//! | `defmt-0-3` | Uses `defmt` logging and derives `defmt::Format` on public types |
//!
//! ## Usage
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
//! static RX_QUEUE: ReceiveQueue = ReceiveQueue::new();
//!
//! let ether = Ether::new();
//! let mut node = Node::new(ether.attach(), NodeConfig::default(), SmallRng::seed_from_u64(7), 0);
//! node.begin(&mut LogSink).unwrap();
//!
//! for now in (0u32..6_000).step_by(10) {
//!     node.poll(&mut || now, &RX_QUEUE, &mut LogSink).unwrap(); // Called every 10 ms
//! }
//! assert!(node.outgoing_counter() >= 2);
//! ```
//!
//! Any `FnMut() -> u32` works as a [`runner::Clock`]. Or, use [`runner::run_node_loop`]
//! with a `DelayNs` implementation and a clock.
//!
//! ## Integration Notes
//!
//! - The receive interrupt handler should only call [`ReceiveQueue::notify`](irq::ReceiveQueue::notify);
//!   all frame processing happens in [`Node::poll`](node::Node::poll) on the main loop
//! - Seed the random source differently on every device so their send intervals drift apart
//! - There are no acknowledgements or retransmissions: a lost frame is lost
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

pub use critical_section;
pub use heapless;

#[macro_use]
mod fmt;

pub mod config;
pub mod consts;
pub mod error;
pub mod event;
pub mod filter;
pub mod frame;
pub mod irq;
pub mod node;
pub mod runner;
pub mod scheduler;
#[cfg(feature = "std")]
pub mod sim;
pub mod transport;

pub use error::{ConfigError, FrameError, NodeError};
pub use frame::{Frame, decode, encode};
pub use filter::should_deliver;
