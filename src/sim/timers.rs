//! Scheduled tasks on a virtual millisecond clock
//!
//! Replaces ad-hoc timeouts: every delayed action is a [`TimerTask`] queued
//! with a due time. Tasks fire in due-time order, ties broken by scheduling
//! order. A cancelled task is removed from the queue and can never fire.

use std::collections::BTreeMap;

use super::world::BodyHandle;

/// Cancellation token of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    due_ms: u64,
    seq: u64,
}

impl TimerId {
    pub fn due_ms(self) -> u64 {
        self.due_ms
    }
}

/// Delayed work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Offer the next piece after a drop
    PrepareNext,
    /// Inspect a dropped piece for the game-over condition
    SettleCheck(BodyHandle),
    /// One cycle of the press-and-hold drop loop
    ContinuousDrop,
}

/// Timer queue plus the current virtual time
#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_seq: u64,
    queue: BTreeMap<TimerId, TimerTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Queue `task` to fire `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, task: TimerTask) -> TimerId {
        let id = TimerId {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.insert(id, task);
        id
    }

    /// Remove a task; returns false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.queue.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.contains_key(&id)
    }

    /// Pop the earliest task due at or before `until_ms`, moving the clock to its due time
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, TimerTask)> {
        let (&id, _) = self.queue.first_key_value()?;
        if id.due_ms > until_ms {
            return None;
        }
        let task = self.queue.remove(&id)?;
        self.now_ms = self.now_ms.max(id.due_ms);
        Some((id, task))
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Drop every queued task (the clock keeps running)
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Queued tasks in firing order
    pub fn pending(&self) -> impl Iterator<Item = (TimerId, TimerTask)> + '_ {
        self.queue.iter().map(|(id, task)| (*id, *task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(2000, TimerTask::SettleCheck(BodyHandle(4)));
        s.schedule(1000, TimerTask::PrepareNext);

        assert!(s.pop_due(999).is_none());
        assert_eq!(s.pop_due(5000).map(|(_, t)| t), Some(TimerTask::PrepareNext));
        assert_eq!(s.now_ms(), 1000);
        assert_eq!(
            s.pop_due(5000).map(|(_, t)| t),
            Some(TimerTask::SettleCheck(BodyHandle(4)))
        );
        assert_eq!(s.now_ms(), 2000);
        assert!(s.pop_due(5000).is_none());
    }

    #[test]
    fn test_ties_fire_in_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule(500, TimerTask::PrepareNext);
        s.schedule(500, TimerTask::ContinuousDrop);
        assert_eq!(s.pop_due(500).map(|(_, t)| t), Some(TimerTask::PrepareNext));
        assert_eq!(s.pop_due(500).map(|(_, t)| t), Some(TimerTask::ContinuousDrop));
    }

    #[test]
    fn test_cancelled_never_fires() {
        let mut s = Scheduler::new();
        let id = s.schedule(500, TimerTask::ContinuousDrop);
        assert!(s.is_pending(id));
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.pop_due(u64::MAX).is_none());
    }

    #[test]
    fn test_schedule_relative_to_now() {
        let mut s = Scheduler::new();
        s.set_now(300);
        let id = s.schedule(200, TimerTask::PrepareNext);
        assert_eq!(id.due_ms(), 500);
        s.set_now(100);
        assert_eq!(s.now_ms(), 300);
    }
}
