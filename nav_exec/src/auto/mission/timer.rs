//! # Mission timers
//!
//! Delayed actions are held as (remaining time, action) pairs which are advanced once per tick
//! with the tick's elapsed time. Nothing blocks, and every pending action can be abandoned at
//! once.

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A set of pending delayed actions.
#[derive(Debug)]
pub struct Timers<A> {
    pending: Vec<Pending<A>>,
}

#[derive(Debug)]
struct Pending<A> {
    remaining_s: f64,
    action: A,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A> Default for Timers<A> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<A> Timers<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an action to be returned by [`Timers::advance`] once `delay_s` has elapsed.
    pub fn schedule(&mut self, delay_s: f64, action: A) {
        self.pending.push(Pending {
            remaining_s: delay_s,
            action,
        });
    }

    /// Advance every pending timer by `dt_s`, returning the actions which are now due in the
    /// order they were scheduled.
    pub fn advance(&mut self, dt_s: f64) -> Vec<A> {
        for p in self.pending.iter_mut() {
            p.remaining_s -= dt_s;
        }

        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.remaining_s <= 0.0);
        self.pending = pending;

        due.into_iter().map(|p| p.action).collect()
    }

    /// Abandon every pending action, returning how many there were.
    pub fn cancel_all(&mut self) -> usize {
        let num = self.pending.len();
        self.pending.clear();
        num
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_timers() {
        let mut timers = Timers::new();
        timers.schedule(0.25, "b");
        timers.schedule(0.05, "a");
        timers.schedule(1.0, "c");

        assert_eq!(timers.advance(0.1), vec!["a"]);
        assert!(timers.advance(0.1).is_empty());
        assert_eq!(timers.advance(0.1), vec!["b"]);
        assert!(timers.is_pending());

        assert_eq!(timers.cancel_all(), 1);
        assert!(!timers.is_pending());
        assert!(timers.advance(10.0).is_empty());
    }

    #[test]
    fn test_same_tick_keeps_order() {
        let mut timers = Timers::new();
        timers.schedule(0.2, 1);
        timers.schedule(0.1, 2);
        timers.schedule(0.0, 3);

        assert_eq!(timers.advance(0.5), vec![1, 2, 3]);
    }
}
