//! Completion tracking for the two pipeline phases.
//!
//! A `PhaseTracker` counts the tasks of one phase that are in flight: entered
//! when a task is dispatched onto the job queue, left when its handler
//! returns. The shutdown coordinator waits on `wait_idle` before closing the
//! queue fed by that phase. An idle tracker alone says nothing about future
//! work: callers must also know the phase's upstream source is exhausted.

use std::fmt;
use tokio::sync::watch;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Page,
    Product,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Page => write!(f, "page"),
            Phase::Product => write!(f, "product"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PhaseTracker {
    phase: Phase,
    in_flight: watch::Sender<usize>,
}

impl PhaseTracker {
    pub fn new(phase: Phase) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self { phase, in_flight }
    }

    /// Marks one task of this phase as in flight until the guard is dropped.
    pub fn enter(&self) -> PhaseGuard {
        self.in_flight.send_modify(|n| *n += 1);
        trace!(phase = %self.phase, in_flight = self.in_flight(), "entered");
        PhaseGuard {
            tracker: self.clone(),
        }
    }

    fn leave(&self) {
        self.in_flight.send_modify(|n| *n = n.saturating_sub(1));
        trace!(phase = %self.phase, in_flight = self.in_flight(), "left");
    }

    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0
    }

    /// Resolves once no task of this phase is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.in_flight.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

/// Holds one slot of a phase's in-flight count; dropping it is the `leave`.
#[derive(Debug)]
pub struct PhaseGuard {
    tracker: PhaseTracker,
}

impl PhaseGuard {
    pub fn phase(&self) -> Phase {
        self.tracker.phase
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        self.tracker.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn guards_bracket_the_count() {
        let tracker = PhaseTracker::new(Phase::Page);
        assert!(tracker.is_idle());

        let a = tracker.enter();
        let b = tracker.enter();
        assert_eq!(tracker.in_flight(), 2);
        assert_eq!(a.phase(), Phase::Page);

        drop(a);
        assert!(!tracker.is_idle());
        drop(b);
        assert!(tracker.is_idle());
    }

    #[tokio::test]
    async fn wait_idle_returns_immediately_when_idle() {
        let tracker = PhaseTracker::new(Phase::Product);
        tokio::time::timeout(Duration::from_secs(1), tracker.wait_idle())
            .await
            .expect("idle tracker should not block");
    }

    #[tokio::test]
    async fn wait_idle_blocks_until_last_guard_drops() {
        let tracker = PhaseTracker::new(Phase::Product);
        let guards: Vec<PhaseGuard> = (0..3).map(|_| tracker.enter()).collect();

        let waiter = tokio::spawn({
            let tracker = tracker.clone();
            async move { tracker.wait_idle().await }
        });

        for guard in guards {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(!waiter.is_finished());
            drop(guard);
        }

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish once idle")
            .unwrap();
    }

    #[tokio::test]
    async fn guard_released_on_failure_path() {
        let tracker = PhaseTracker::new(Phase::Page);

        async fn failing(_guard: PhaseGuard) -> Result<(), &'static str> {
            Err("boom")
        }

        assert!(failing(tracker.enter()).await.is_err());
        assert!(tracker.is_idle());
    }
}
