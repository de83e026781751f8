//! Deferred actions ordered by fire time
//!
//! Same-time actions fire in the order they were scheduled.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Work the driver performs later
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduledAction {
    /// Put one ball of a drop onto the board
    SpawnBall { bet: u64 },
    /// Ad playback finished
    AdReward,
    /// Once-per-second session timer
    SessionTick,
    /// Unconditional save
    Autosave,
}

#[derive(Debug)]
struct Entry {
    at: u64,
    seq: u64,
    action: ScheduledAction,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

/// Min-heap of (fire time, action)
#[derive(Debug, Default)]
pub struct Schedule {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at: u64, action: ScheduledAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { at, seq, action }));
    }

    /// Pop the earliest action due at or before `now`
    pub fn pop_due(&mut self, now: u64) -> Option<(u64, ScheduledAction)> {
        if self.heap.peek()?.0.at > now {
            return None;
        }
        self.heap.pop().map(|Reverse(e)| (e.at, e.action))
    }

    /// Number of queued actions matching `pred`
    pub fn count(&self, pred: impl Fn(&ScheduledAction) -> bool) -> usize {
        self.heap.iter().filter(|Reverse(e)| pred(&e.action)).count()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_time_order() {
        let mut schedule = Schedule::new();
        schedule.push(200, ScheduledAction::Autosave);
        schedule.push(100, ScheduledAction::SessionTick);
        schedule.push(100, ScheduledAction::SpawnBall { bet: 20 });

        assert_eq!(schedule.pop_due(50), None);
        assert_eq!(
            schedule.pop_due(150),
            Some((100, ScheduledAction::SessionTick))
        );
        assert_eq!(
            schedule.pop_due(150),
            Some((100, ScheduledAction::SpawnBall { bet: 20 }))
        );
        assert_eq!(schedule.pop_due(150), None);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.pop_due(200), Some((200, ScheduledAction::Autosave)));
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_count() {
        let mut schedule = Schedule::new();
        schedule.push(0, ScheduledAction::SpawnBall { bet: 20 });
        schedule.push(100, ScheduledAction::SpawnBall { bet: 20 });
        schedule.push(100, ScheduledAction::AdReward);
        assert_eq!(
            schedule.count(|a| matches!(a, ScheduledAction::SpawnBall { .. })),
            2
        );
    }
}
