//! Virtual-time task queue
//!
//! Timers and animation frames share one min-heap ordered by due time, ties
//! broken by insertion order. Frames fire on the next multiple of the frame
//! interval strictly after the current time.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Milliseconds of virtual time
pub type Millis = u64;

#[derive(Debug)]
struct Scheduled<T> {
    due: Millis,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

#[derive(Debug)]
pub struct TaskQueue<T> {
    now: Millis,
    seq: u64,
    frame_interval: Millis,
    heap: BinaryHeap<Reverse<Scheduled<T>>>,
}

impl<T> TaskQueue<T> {
    pub fn new(frame_interval: Millis) -> Self {
        Self {
            now: 0,
            seq: 0,
            frame_interval: frame_interval.max(1),
            heap: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Due time of the earliest task
    pub fn next_due(&self) -> Option<Millis> {
        self.heap.peek().map(|Reverse(s)| s.due)
    }

    /// Schedule at an absolute time; past times run at the next checkpoint
    pub fn schedule_at(&mut self, due: Millis, task: T) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Reverse(Scheduled {
            due: due.max(self.now),
            seq,
            task,
        }));
    }

    /// `setTimeout(task, delay)`
    pub fn schedule_after(&mut self, delay: Millis, task: T) {
        self.schedule_at(self.now.saturating_add(delay), task);
    }

    /// `requestAnimationFrame(task)`; returns the frame time
    pub fn request_frame(&mut self, task: T) -> Millis {
        let due = (self.now / self.frame_interval + 1) * self.frame_interval;
        self.schedule_at(due, task);
        due
    }

    /// Pop the earliest task due at or before `until`, moving the clock to it
    pub fn pop_due(&mut self, until: Millis) -> Option<(Millis, T)> {
        if self.next_due()? > until {
            return None;
        }
        let Reverse(scheduled) = self.heap.pop()?;
        self.now = self.now.max(scheduled.due);
        Some((scheduled.due, scheduled.task))
    }

    /// Move the clock forward without running anything
    pub fn advance_clock(&mut self, to: Millis) {
        self.now = self.now.max(to);
    }

    /// Cancel everything pending
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_order_then_fifo() {
        let mut queue = TaskQueue::new(16);
        queue.schedule_after(300, "late");
        queue.schedule_after(0, "first");
        queue.schedule_after(0, "second");

        assert_eq!(queue.pop_due(1000), Some((0, "first")));
        assert_eq!(queue.pop_due(1000), Some((0, "second")));
        assert_eq!(queue.pop_due(299), None);
        assert_eq!(queue.pop_due(1000), Some((300, "late")));
        assert_eq!(queue.now(), 300);
    }

    #[test]
    fn test_frames_align_to_interval() {
        let mut queue: TaskQueue<()> = TaskQueue::new(16);
        assert_eq!(queue.request_frame(()), 16);
        queue.advance_clock(16);
        assert_eq!(queue.request_frame(()), 32);
        queue.advance_clock(40);
        assert_eq!(queue.request_frame(()), 48);
    }

    #[test]
    fn test_past_due_clamped_to_now() {
        let mut queue = TaskQueue::new(16);
        queue.advance_clock(500);
        queue.schedule_at(100, 1);
        assert_eq!(queue.pop_due(500), Some((500, 1)));
    }

    #[test]
    fn test_clear() {
        let mut queue = TaskQueue::new(16);
        queue.schedule_after(10, 1);
        queue.request_frame(2);
        assert_eq!(queue.len(), 2);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.next_due(), None);
    }
}
