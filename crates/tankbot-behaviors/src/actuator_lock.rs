// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Actuator locking for concurrent behaviors
//!
//! Every compound motor sequence runs while its behavior holds a token for
//! the actuators involved, so two behaviors never interleave commands on the
//! same motor. Multi-actuator requests (the drive pair) are granted all at
//! once or not at all.
//!
//! Waiters are served FIFO per actuator: a request is granted only when it
//! heads the queue of every actuator it asked for. Tickets are enqueued on
//! all actuators in one critical section, so queue order is consistent
//! across actuators and waiters cannot deadlock each other.
//!
//! A behavior must not request an actuator it already holds.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use ahash::AHashMap;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::error::LockError;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// One lock-protected physical output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActuatorId {
    LeftDrive,
    RightDrive,
    Accessory,
}

impl ActuatorId {
    /// Both tracks, always locked together for tank motion
    pub const DRIVE_PAIR: [ActuatorId; 2] = [ActuatorId::LeftDrive, ActuatorId::RightDrive];

    pub const ALL: [ActuatorId; 3] = [
        ActuatorId::LeftDrive,
        ActuatorId::RightDrive,
        ActuatorId::Accessory,
    ];
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActuatorId::LeftDrive => "left-drive",
            ActuatorId::RightDrive => "right-drive",
            ActuatorId::Accessory => "accessory",
        };
        f.write_str(name)
    }
}

/// How long `acquire` may wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    /// Wait until granted
    Blocking,
    /// Wait at most this long, then `LockError::Busy`
    Timeout(Duration),
    /// Fail with `LockError::Busy` at once if anything is held or queued
    NonBlocking,
}

/// Proof of exclusive ownership of a set of actuators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockToken {
    table: u64,
    id: u64,
}

/// Lock counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStats {
    pub acquired: u64,
    pub released: u64,
    /// Requests refused (non-blocking) or timed out
    pub busy: u64,
    /// Double releases and foreign tokens
    pub misuse: u64,
}

#[derive(Debug, Default)]
struct ActuatorSlot {
    holder: Option<(u64, String)>,
    waiters: VecDeque<u64>,
    last_command: Option<String>,
}

#[derive(Debug)]
struct Grant {
    behavior: String,
    actuators: Vec<ActuatorId>,
}

#[derive(Debug, Default)]
struct LockTable {
    slots: AHashMap<ActuatorId, ActuatorSlot>,
    live: AHashMap<u64, Grant>,
    next_id: u64,
    stats: LockStats,
}

impl LockTable {
    fn slot(&mut self, id: ActuatorId) -> &mut ActuatorSlot {
        self.slots.entry(id).or_default()
    }

    fn all_free(&mut self, actuators: &[ActuatorId]) -> bool {
        actuators.iter().all(|id| {
            let slot = self.slot(*id);
            slot.holder.is_none() && slot.waiters.is_empty()
        })
    }

    fn is_turn(&mut self, ticket: u64, actuators: &[ActuatorId]) -> bool {
        actuators.iter().all(|id| {
            let slot = self.slot(*id);
            slot.holder.is_none() && slot.waiters.front() == Some(&ticket)
        })
    }

    fn dequeue(&mut self, ticket: u64, actuators: &[ActuatorId]) {
        for id in actuators {
            self.slot(*id).waiters.retain(|t| *t != ticket);
        }
    }

    fn grant(&mut self, ticket: u64, actuators: &[ActuatorId], behavior: &str) {
        for id in actuators {
            self.slot(*id).holder = Some((ticket, behavior.to_string()));
        }
        self.live.insert(
            ticket,
            Grant {
                behavior: behavior.to_string(),
                actuators: actuators.to_vec(),
            },
        );
        self.stats.acquired += 1;
    }
}

/// Per-actuator lock table shared by all behaviors
#[derive(Debug)]
pub struct ActuatorLocks {
    table_id: u64,
    table: Mutex<LockTable>,
    changed: Condvar,
}

impl Default for ActuatorLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorLocks {
    pub fn new() -> Self {
        Self {
            table_id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            table: Mutex::new(LockTable::default()),
            changed: Condvar::new(),
        }
    }

    /// Acquire exclusive ownership of `actuators` for `behavior`
    ///
    /// Only the calling thread waits; other behaviors keep running.
    ///
    /// # Errors
    /// - `LockError::Busy` when not granted within `mode`'s limit
    /// - `LockError::NothingRequested` for an empty request
    pub fn acquire(
        &self,
        actuators: &[ActuatorId],
        behavior: &str,
        mode: AcquireMode,
    ) -> Result<LockGuard<'_>, LockError> {
        let mut wanted = actuators.to_vec();
        wanted.sort();
        wanted.dedup();
        if wanted.is_empty() {
            return Err(LockError::NothingRequested);
        }

        let deadline = match mode {
            AcquireMode::Timeout(limit) => Some(Instant::now() + limit),
            AcquireMode::Blocking | AcquireMode::NonBlocking => None,
        };

        let mut table = self.table.lock();
        let ticket = table.next_id;
        table.next_id += 1;

        if mode == AcquireMode::NonBlocking {
            if !table.all_free(&wanted) {
                table.stats.busy += 1;
                trace!("[ACTUATOR-LOCK] {} refused {:?} (busy)", behavior, wanted);
                return Err(LockError::Busy(wanted));
            }
            table.grant(ticket, &wanted, behavior);
            trace!("[ACTUATOR-LOCK] {} holds {:?}", behavior, wanted);
            return Ok(self.guard(ticket));
        }

        for id in &wanted {
            table.slot(*id).waiters.push_back(ticket);
        }

        loop {
            if table.is_turn(ticket, &wanted) {
                table.dequeue(ticket, &wanted);
                table.grant(ticket, &wanted, behavior);
                // Queue heads moved; let the next waiters re-check
                self.changed.notify_all();
                trace!("[ACTUATOR-LOCK] {} holds {:?}", behavior, wanted);
                return Ok(self.guard(ticket));
            }

            match deadline {
                Some(deadline) => {
                    if self.changed.wait_until(&mut table, deadline).timed_out()
                        && !table.is_turn(ticket, &wanted)
                    {
                        table.dequeue(ticket, &wanted);
                        table.stats.busy += 1;
                        self.changed.notify_all();
                        debug!("[ACTUATOR-LOCK] {} gave up waiting for {:?}", behavior, wanted);
                        return Err(LockError::Busy(wanted));
                    }
                }
                None => self.changed.wait(&mut table),
            }
        }
    }

    fn guard(&self, ticket: u64) -> LockGuard<'_> {
        LockGuard {
            locks: self,
            token: LockToken {
                table: self.table_id,
                id: ticket,
            },
            released: false,
        }
    }

    /// Release the actuators owned by `token`
    ///
    /// The first call frees them and wakes waiters; later calls report
    /// `LockError::AlreadyReleased` and leave the table untouched.
    pub fn release(&self, token: &LockToken) -> Result<(), LockError> {
        let mut table = self.table.lock();

        if token.table != self.table_id {
            table.stats.misuse += 1;
            return Err(LockError::UnknownToken);
        }

        let Some(grant) = table.live.remove(&token.id) else {
            table.stats.misuse += 1;
            return Err(if token.id < table.next_id {
                LockError::AlreadyReleased
            } else {
                LockError::UnknownToken
            });
        };

        for id in &grant.actuators {
            let slot = table.slot(*id);
            if matches!(slot.holder, Some((holder, _)) if holder == token.id) {
                slot.holder = None;
            }
        }
        table.stats.released += 1;
        self.changed.notify_all();
        trace!("[ACTUATOR-LOCK] {} released {:?}", grant.behavior, grant.actuators);
        Ok(())
    }

    /// Behavior currently holding `id`
    pub fn holder(&self, id: ActuatorId) -> Option<String> {
        let table = self.table.lock();
        table
            .slots
            .get(&id)
            .and_then(|s| s.holder.as_ref().map(|(_, name)| name.clone()))
    }

    pub fn is_held(&self, id: ActuatorId) -> bool {
        self.holder(id).is_some()
    }

    /// Actuators held right now
    pub fn held(&self) -> Vec<ActuatorId> {
        let table = self.table.lock();
        let mut held: Vec<ActuatorId> = table
            .slots
            .iter()
            .filter(|(_, slot)| slot.holder.is_some())
            .map(|(id, _)| *id)
            .collect();
        held.sort();
        held
    }

    /// Note the command just issued under `token`, for diagnostics
    pub fn record_command(&self, token: &LockToken, command: impl Into<String>) -> Result<(), LockError> {
        let mut table = self.table.lock();
        if token.table != self.table_id {
            return Err(LockError::UnknownToken);
        }
        let Some(grant) = table.live.get(&token.id) else {
            return Err(LockError::AlreadyReleased);
        };
        let actuators = grant.actuators.clone();
        let command = command.into();
        for id in actuators {
            table.slot(id).last_command = Some(command.clone());
        }
        Ok(())
    }

    pub fn last_command(&self, id: ActuatorId) -> Option<String> {
        self.table
            .lock()
            .slots
            .get(&id)
            .and_then(|s| s.last_command.clone())
    }

    pub fn stats(&self) -> LockStats {
        self.table.lock().stats
    }
}

/// Scoped ownership of actuators; releases on drop
///
/// Dropping the guard on any exit path (error return, unwinding) releases
/// exactly once.
#[must_use = "actuators are released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    locks: &'a ActuatorLocks,
    token: LockToken,
    released: bool,
}

impl LockGuard<'_> {
    pub fn token(&self) -> LockToken {
        self.token
    }

    /// Note the command about to be issued under this guard
    pub fn record(&self, command: impl Into<String>) {
        if let Err(e) = self.locks.record_command(&self.token, command) {
            debug!("[ACTUATOR-LOCK] Command not recorded: {}", e);
        }
    }

    /// Release now instead of at drop
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        self.locks.release(&self.token)
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.locks.release(&self.token) {
            Ok(()) => {}
            // Released early through the table
            Err(LockError::AlreadyReleased) => {}
            Err(e) => warn!("[ACTUATOR-LOCK] Release on drop failed: {}", e),
        }
    }
}

impl fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("token", &self.token)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_unlock() {
        let locks = ActuatorLocks::new();

        let guard = locks
            .acquire(&[ActuatorId::Accessory], "touch-blast", AcquireMode::NonBlocking)
            .unwrap();
        assert_eq!(locks.holder(ActuatorId::Accessory).as_deref(), Some("touch-blast"));

        drop(guard);
        assert!(!locks.is_held(ActuatorId::Accessory));
        assert_eq!(locks.stats().acquired, 1);
        assert_eq!(locks.stats().released, 1);
    }

    #[test]
    fn test_duplicate_lock() {
        let locks = ActuatorLocks::new();

        let _held = locks
            .acquire(&ActuatorId::DRIVE_PAIR, "beacon-dance", AcquireMode::Blocking)
            .unwrap();
        let err = locks
            .acquire(&[ActuatorId::RightDrive], "remote-drive", AcquireMode::NonBlocking)
            .unwrap_err();
        assert_eq!(err, LockError::Busy(vec![ActuatorId::RightDrive]));

        // Unrelated actuator still free
        let _accessory = locks
            .acquire(&[ActuatorId::Accessory], "touch-blast", AcquireMode::NonBlocking)
            .unwrap();
        assert_eq!(locks.held(), ActuatorId::ALL.to_vec());
    }

    #[test]
    fn test_timeout_gives_up() {
        let locks = ActuatorLocks::new();
        let _held = locks
            .acquire(&[ActuatorId::LeftDrive], "beacon-dance", AcquireMode::Blocking)
            .unwrap();

        let start = Instant::now();
        let err = locks
            .acquire(
                &ActuatorId::DRIVE_PAIR,
                "remote-drive",
                AcquireMode::Timeout(Duration::from_millis(30)),
            )
            .unwrap_err();
        assert!(matches!(err, LockError::Busy(_)));
        assert!(start.elapsed() >= Duration::from_millis(30));

        // The abandoned ticket no longer blocks the right track
        let _right = locks
            .acquire(&[ActuatorId::RightDrive], "other", AcquireMode::NonBlocking)
            .unwrap();
        assert_eq!(locks.stats().busy, 1);
    }

    #[test]
    fn test_double_release_reports_misuse() {
        let locks = ActuatorLocks::new();
        let guard = locks
            .acquire(&[ActuatorId::Accessory], "touch-blast", AcquireMode::Blocking)
            .unwrap();
        let token = guard.token();

        locks.release(&token).unwrap();
        assert_eq!(locks.release(&token), Err(LockError::AlreadyReleased));

        // Someone else takes the actuator; the stale token must not free it
        let _other = locks
            .acquire(&[ActuatorId::Accessory], "other", AcquireMode::NonBlocking)
            .unwrap();
        assert_eq!(locks.release(&token), Err(LockError::AlreadyReleased));
        drop(guard);
        assert_eq!(locks.holder(ActuatorId::Accessory).as_deref(), Some("other"));
    }

    #[test]
    fn test_foreign_token() {
        let locks = ActuatorLocks::new();
        let other_table = ActuatorLocks::new();
        let guard = other_table
            .acquire(&[ActuatorId::Accessory], "touch-blast", AcquireMode::Blocking)
            .unwrap();

        assert_eq!(locks.release(&guard.token()), Err(LockError::UnknownToken));
        assert!(other_table.is_held(ActuatorId::Accessory));
    }

    #[test]
    fn test_record_command() {
        let locks = ActuatorLocks::new();
        let guard = locks
            .acquire(&ActuatorId::DRIVE_PAIR, "beacon-dance", AcquireMode::Blocking)
            .unwrap();
        guard.record("run_for(40%, -20%, 1s)");
        let token = guard.token();
        guard.release().unwrap();

        assert_eq!(
            locks.last_command(ActuatorId::RightDrive).as_deref(),
            Some("run_for(40%, -20%, 1s)")
        );
        assert_eq!(locks.record_command(&token, "late"), Err(LockError::AlreadyReleased));
    }

    #[test]
    fn test_empty_request() {
        let locks = ActuatorLocks::new();
        assert_eq!(
            locks.acquire(&[], "nobody", AcquireMode::Blocking).unwrap_err(),
            LockError::NothingRequested
        );
    }
}
