//! Duty-cycle scheduling for a half-duplex radio.
//!
//! The radio can either transmit or listen, never both. [`DutyCycle`] tracks which
//! of the two the node is doing and decides when the next transmission is due.
//!
//! ```text
//!            is_due(now)                     transmit returns
//! Listening ────────────▶ Transmitting ──────────────────────▶ Listening
//!                       begin_transmit()   finish_transmit(now)
//! ```
//!
//! The scheduler is polled, not interrupt driven: the main loop calls
//! [`DutyCycle::is_due`] at a fixed cadence. After every transmission a new interval
//! is drawn uniformly from the configured range, which keeps two nodes on the same
//! channel from repeatedly colliding.
//!
//! Timestamps are milliseconds of a free-running 32-bit uptime counter and are
//! compared with wrapping arithmetic, so the counter rolling over is harmless.

use crate::config::IntervalRange;

use rand_core::RngCore;

/// What the radio is currently doing.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DutyState {
    /// The radio is in receive mode and may raise receive notifications.
    #[default]
    Listening,
    /// A frame is being sent; the radio cannot receive.
    Transmitting,
}

/// Randomized send-interval scheduler.
///
/// ## Type Parameters
///
/// - `G`: Random source used to draw each new interval
#[derive(Debug)]
pub struct DutyCycle<G: RngCore> {
    state: DutyState,
    rng: G,
    range: IntervalRange,
    interval_ms: u32,
    last_send_ms: u32,
}

impl<G: RngCore> DutyCycle<G> {
    /// Creates a scheduler in the [`Listening`](DutyState::Listening) state.
    ///
    /// # Arguments
    /// - `rng`: Random source for interval draws.
    /// - `range`: Range each new interval is drawn from.
    /// - `initial_interval_ms`: Interval in effect before the first transmission.
    /// - `now_ms`: Baseline the first interval is measured from.
    pub fn new(rng: G, range: IntervalRange, initial_interval_ms: u32, now_ms: u32) -> Self {
        Self {
            state: DutyState::Listening,
            rng,
            range,
            interval_ms: initial_interval_ms,
            last_send_ms: now_ms,
        }
    }

    /// The current state.
    pub fn state(&self) -> DutyState {
        self.state
    }

    /// The interval in effect since the last transmission.
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Time of the last transmission (or of construction).
    pub fn last_send_ms(&self) -> u32 {
        self.last_send_ms
    }

    /// Milliseconds elapsed since the last transmission.
    pub fn elapsed_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_send_ms)
    }

    /// Whether a transmission should start now.
    ///
    /// Only true while listening and once at least the current interval has elapsed.
    pub fn is_due(&self, now_ms: u32) -> bool {
        self.state == DutyState::Listening && self.elapsed_ms(now_ms) >= self.interval_ms
    }

    /// Enters [`Transmitting`](DutyState::Transmitting).
    pub fn begin_transmit(&mut self) {
        self.state = DutyState::Transmitting;
    }

    /// Returns to [`Listening`](DutyState::Listening) after a transmission.
    ///
    /// Draws the next interval and restarts the elapsed-time baseline at `now_ms`.
    ///
    /// # Returns
    /// The newly drawn interval.
    pub fn finish_transmit(&mut self, now_ms: u32) -> u32 {
        self.interval_ms = self.range.sample(&mut self.rng);
        self.last_send_ms = now_ms;
        self.state = DutyState::Listening;
        self.interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DEFAULT_SEND_INTERVAL_MS, MAX_SEND_INTERVAL_MS, MIN_SEND_INTERVAL_MS};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rand::rngs::mock::StepRng;

    fn scheduler(now_ms: u32) -> DutyCycle<SmallRng> {
        DutyCycle::new(
            SmallRng::seed_from_u64(0x5EED),
            IntervalRange::default(),
            DEFAULT_SEND_INTERVAL_MS,
            now_ms,
        )
    }

    #[test]
    fn test_initial_state_is_listening() {
        let duty = scheduler(0);
        assert_eq!(duty.state(), DutyState::Listening);
        assert_eq!(duty.interval_ms(), DEFAULT_SEND_INTERVAL_MS);
    }

    #[test]
    fn test_due_only_after_interval() {
        let duty = scheduler(100);
        assert!(!duty.is_due(100));
        assert!(!duty.is_due(2_099));
        assert!(duty.is_due(2_100));
        assert!(duty.is_due(5_000));
    }

    #[test]
    fn test_not_due_while_transmitting() {
        let mut duty = scheduler(0);
        duty.begin_transmit();
        assert_eq!(duty.state(), DutyState::Transmitting);
        assert!(!duty.is_due(10_000));
    }

    #[test]
    fn test_finish_resets_baseline() {
        let mut duty = scheduler(0);
        duty.begin_transmit();
        let interval = duty.finish_transmit(2_000);
        assert_eq!(duty.state(), DutyState::Listening);
        assert_eq!(duty.last_send_ms(), 2_000);
        assert!(!duty.is_due(2_000 + interval - 1));
        assert!(duty.is_due(2_000 + interval));
    }

    #[test]
    fn test_drawn_intervals_stay_in_range() {
        let mut duty = scheduler(0);
        let mut now = 0u32;
        for _ in 0..10_000 {
            duty.begin_transmit();
            let interval = duty.finish_transmit(now);
            assert!(interval >= MIN_SEND_INTERVAL_MS);
            assert!(interval < MAX_SEND_INTERVAL_MS);
            now = now.wrapping_add(interval);
        }
    }

    #[test]
    fn test_extreme_random_values_stay_in_range() {
        // Lowest possible draw
        let mut duty = DutyCycle::new(StepRng::new(0, 0), IntervalRange::default(), 1, 0);
        duty.begin_transmit();
        assert_eq!(duty.finish_transmit(0), MIN_SEND_INTERVAL_MS);

        // Highest possible draw
        let mut duty = DutyCycle::new(StepRng::new(u64::MAX, 0), IntervalRange::default(), 1, 0);
        duty.begin_transmit();
        assert_eq!(duty.finish_transmit(0), MAX_SEND_INTERVAL_MS - 1);
    }

    #[test]
    fn test_due_across_clock_wraparound() {
        let start = u32::MAX - 500;
        let duty = scheduler(start);
        assert!(!duty.is_due(start.wrapping_add(1_999)));
        assert!(duty.is_due(start.wrapping_add(2_000)));
        assert_eq!(duty.elapsed_ms(1_499), 2_000);
    }
}
