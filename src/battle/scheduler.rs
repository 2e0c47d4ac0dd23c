use crate::battle::phases::Phase;
use crate::errors::{BattleError, BattleResult};
use std::collections::VecDeque;
use tracing::trace;

pub type PhaseId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedPhase {
    pub id: PhaseId,
    pub phase: Phase,
}

/// Why the in-flight phase is parked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspension {
    Ack,
    Commands,
    Replacements,
}

#[derive(Debug, Clone)]
struct InFlight {
    entry: QueuedPhase,
    suspension: Option<Suspension>,
}

/// The battle's ordered worklist.
///
/// Exactly one phase is in flight at a time. Phases unshifted while another is
/// in flight are staged and land at the head of the queue, in the order they
/// were unshifted, once the in-flight phase finishes.
#[derive(Debug, Clone, Default)]
pub struct PhaseQueue {
    queue: VecDeque<QueuedPhase>,
    staged: Vec<QueuedPhase>,
    current: Option<InFlight>,
    next_id: PhaseId,
    completed: u64,
}

impl PhaseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn wrap(&mut self, phase: Phase) -> QueuedPhase {
        self.next_id += 1;
        QueuedPhase {
            id: self.next_id,
            phase,
        }
    }

    /// Appends to the tail.
    pub fn push(&mut self, phase: Phase) -> PhaseId {
        let entry = self.wrap(phase);
        let id = entry.id;
        trace!(id, phase = entry.phase.name(), "push");
        self.queue.push_back(entry);
        id
    }

    /// Runs `phase` right after the in-flight one (or next, if none is in flight).
    pub fn unshift(&mut self, phase: Phase) -> PhaseId {
        let entry = self.wrap(phase);
        let id = entry.id;
        trace!(id, phase = entry.phase.name(), "unshift");
        if self.current.is_some() {
            self.staged.push(entry);
        } else {
            self.queue.push_front(entry);
        }
        id
    }

    /// Removes not-yet-run phases matching `predicate`. Returns how many were removed.
    pub fn remove_where(&mut self, predicate: impl Fn(&Phase) -> bool) -> usize {
        let before = self.queue.len() + self.staged.len();
        self.queue.retain(|entry| !predicate(&entry.phase));
        self.staged.retain(|entry| !predicate(&entry.phase));
        let removed = before - (self.queue.len() + self.staged.len());
        if removed > 0 {
            trace!(removed, "removed queued phases");
        }
        removed
    }

    /// Drops every queued phase. The in-flight phase is untouched.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.staged.clear();
    }

    /// Pops the head and marks it in flight.
    pub fn begin_next(&mut self) -> BattleResult<Option<QueuedPhase>> {
        if let Some(inflight) = &self.current {
            return Err(BattleError::SchedulerInvariant(format!(
                "cannot start a phase while {} (#{}) is in flight",
                inflight.entry.phase.name(),
                inflight.entry.id
            )));
        }
        let Some(entry) = self.queue.pop_front() else {
            return Ok(None);
        };
        self.current = Some(InFlight {
            entry: entry.clone(),
            suspension: None,
        });
        Ok(Some(entry))
    }

    pub fn current(&self) -> Option<&QueuedPhase> {
        self.current.as_ref().map(|inflight| &inflight.entry)
    }

    pub fn suspension(&self) -> Option<Suspension> {
        self.current.as_ref().and_then(|inflight| inflight.suspension)
    }

    /// Completes the in-flight phase and releases whatever it staged.
    pub fn finish(&mut self) -> BattleResult<QueuedPhase> {
        let inflight = self.current.take().ok_or_else(|| {
            BattleError::SchedulerInvariant("finish called with no phase in flight".into())
        })?;
        for entry in self.staged.drain(..).rev() {
            self.queue.push_front(entry);
        }
        self.completed += 1;
        Ok(inflight.entry)
    }

    /// Drops the in-flight phase after a failure, along with what it staged.
    ///
    /// Staged faints are kept: the damage behind them has already landed.
    pub fn abandon(&mut self) -> BattleResult<QueuedPhase> {
        let inflight = self.current.take().ok_or_else(|| {
            BattleError::SchedulerInvariant("abandon called with no phase in flight".into())
        })?;
        let mut kept = std::mem::take(&mut self.staged);
        kept.retain(|entry| matches!(entry.phase, Phase::Faint(_)));
        for entry in kept.into_iter().rev() {
            trace!(id = entry.id, "faint kept from abandoned phase");
            self.queue.push_front(entry);
        }
        Ok(inflight.entry)
    }

    pub fn park(&mut self, suspension: Suspension) -> BattleResult<()> {
        match self.current.as_mut() {
            Some(inflight) if inflight.suspension.is_none() => {
                inflight.suspension = Some(suspension);
                Ok(())
            }
            Some(inflight) => Err(BattleError::SchedulerInvariant(format!(
                "{} is already parked",
                inflight.entry.phase.name()
            ))),
            None => Err(BattleError::SchedulerInvariant(
                "park called with no phase in flight".into(),
            )),
        }
    }

    /// Unparks the in-flight phase so it runs again.
    pub fn resume(&mut self, expected: Suspension) -> BattleResult<()> {
        match self.current.as_mut() {
            Some(inflight) if inflight.suspension == Some(expected) => {
                inflight.suspension = None;
                Ok(())
            }
            _ => Err(BattleError::SchedulerInvariant(format!(
                "no phase parked on {:?}",
                expected
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len() + self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Queued phases in the order they will run (staged first).
    pub fn pending(&self) -> impl Iterator<Item = &Phase> {
        self.staged
            .iter()
            .chain(self.queue.iter())
            .map(|entry| &entry.phase)
    }
}
