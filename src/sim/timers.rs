//! Deferred session tasks
//!
//! Every task is stamped with the session epoch that scheduled it. A new
//! session cancels everything pending, and the owner discards any task whose
//! epoch no longer matches before acting on it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::physics::BodyId;

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerAction {
    /// End a falling piece's spawn grace
    ClearSpawnGrace(BodyId),
    /// Re-enable drop input and bring in the next piece
    EnableDrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub due: Duration,
    pub session: u32,
    pub action: TimerAction,
    /// Scheduling order, for stable firing among equal deadlines
    seq: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    pending: Vec<Timer>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, session: u32, action: TimerAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Timer {
            due,
            session,
            action,
            seq,
        });
    }

    /// Remove and return every timer due at or before `now`, earliest first
    pub fn take_due(&mut self, now: Duration) -> Vec<Timer> {
        let (mut due, rest): (Vec<Timer>, Vec<Timer>) =
            self.pending.drain(..).partition(|t| t.due <= now);
        self.pending = rest;
        due.sort_by_key(|t| (t.due, t.seq));
        due
    }

    /// Cancel everything pending
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
