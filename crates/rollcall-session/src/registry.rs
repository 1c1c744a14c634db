//! Client-side view of the server's attendance windows.
//!
//! The server owns every window. This registry sends toggles, reads
//! snapshots, and remembers per window what the teacher's button should say.
//! A toggle that fails on the network leaves the window `Indeterminate` until
//! a fresh snapshot reconciles it.

use rollcall_core::error::{AttendanceError, Result};
use rollcall_core::models::{SessionContext, StudentId, WindowKey, WindowSnapshot, WindowState};
use rollcall_core::ports::WindowService;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::call::with_timeout;

/// Local knowledge of one window's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    /// Last state the server reported
    Confirmed(WindowState),
    /// A toggle is on the wire; `previous` is the last confirmed state
    Pending { previous: WindowState },
    /// A toggle failed in transit; the server may or may not have applied it
    Indeterminate { last_confirmed: WindowState },
}

impl ToggleState {
    /// State the teacher's button is rendered from
    pub fn displayed(&self) -> WindowState {
        match self {
            ToggleState::Confirmed(state) => *state,
            ToggleState::Pending { previous } => *previous,
            ToggleState::Indeterminate { last_confirmed } => *last_confirmed,
        }
    }
}

#[derive(Debug, Default)]
struct Labels {
    states: HashMap<WindowKey, ToggleState>,
    /// Bumped on every toggle-driven change; snapshots requested before a bump are stale
    generation: u64,
}

impl Labels {
    fn put(&mut self, key: WindowKey, state: ToggleState) {
        self.states.insert(key, state);
        self.generation += 1;
    }

    fn adopt(&mut self, snapshot: &WindowSnapshot) {
        for (key, state) in self.states.iter_mut() {
            if !matches!(state, ToggleState::Pending { .. }) {
                *state = ToggleState::Confirmed(snapshot.state(key));
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a window pending; if dropped unsettled the window becomes indeterminate
struct PendingToggle<'a> {
    labels: &'a Mutex<Labels>,
    key: WindowKey,
    previous: WindowState,
    settled: bool,
}

impl PendingToggle<'_> {
    fn settle(mut self, state: ToggleState) {
        self.settled = true;
        lock(self.labels).put(self.key.clone(), state);
    }
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        if !self.settled {
            lock(self.labels).put(
                self.key.clone(),
                ToggleState::Indeterminate {
                    last_confirmed: self.previous,
                },
            );
        }
    }
}

pub struct SessionWindowRegistry<W>
where
    W: WindowService,
{
    service: W,
    timeout: Duration,
    labels: Mutex<Labels>,
    snapshots: Mutex<HashMap<StudentId, WindowSnapshot>>,
}

impl<W> SessionWindowRegistry<W>
where
    W: WindowService,
{
    pub fn new(service: W, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            labels: Mutex::new(Labels::default()),
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    /// Invert the window's last confirmed state (unknown windows count as closed)
    pub async fn toggle(&self, session: &SessionContext, key: &WindowKey) -> Result<WindowState> {
        session.require_teacher("toggle attendance")?;
        let pending = self.begin(key, false)?;
        let desired = pending.previous.inverted();
        self.send(pending, key, desired).await
    }

    /// Put the window into `desired` regardless of its last known state.
    ///
    /// Unlike `toggle` this is allowed on an indeterminate window, since the
    /// outcome does not depend on what the server currently holds.
    pub async fn set(
        &self,
        session: &SessionContext,
        key: &WindowKey,
        desired: WindowState,
    ) -> Result<WindowState> {
        session.require_teacher("set attendance")?;
        let pending = self.begin(key, true)?;
        self.send(pending, key, desired).await
    }

    /// Fetch every window state visible to `student_id` and reconcile local labels.
    ///
    /// A response that was requested before a toggle settled is returned to the
    /// caller but neither reconciled nor cached.
    pub async fn snapshot(&self, student_id: &StudentId) -> Result<WindowSnapshot> {
        let requested_at = lock(&self.labels).generation;
        let snapshot = with_timeout(
            "read attendance status",
            self.timeout,
            self.service.window_snapshot(student_id),
        )
        .await?;

        let mut labels = lock(&self.labels);
        if labels.generation != requested_at {
            tracing::debug!(student_id = %student_id, "Discarding snapshot overtaken by a toggle");
            return Ok(snapshot);
        }
        labels.adopt(&snapshot);
        // Cache under the labels lock so a concurrent toggle clears it after us
        lock(&self.snapshots).insert(student_id.clone(), snapshot.clone());
        drop(labels);

        tracing::debug!(student_id = %student_id, windows = snapshot.windows.len(), "Window snapshot refreshed");
        Ok(snapshot)
    }

    /// Adopt a snapshot's states for every window that is not mid-toggle
    pub fn reconcile(&self, snapshot: &WindowSnapshot) {
        lock(&self.labels).adopt(snapshot);
    }

    /// Start tracking `key` with the state `snapshot` shows for it
    pub fn track(&self, key: &WindowKey, snapshot: &WindowSnapshot) {
        let mut labels = lock(&self.labels);
        let state = labels
            .states
            .entry(key.clone())
            .or_insert(ToggleState::Confirmed(WindowState::Closed));
        if !matches!(state, ToggleState::Pending { .. }) {
            *state = ToggleState::Confirmed(snapshot.state(key));
        }
    }

    /// Last snapshot fetched for this student, if any since the last toggle
    pub fn cached_snapshot(&self, student_id: &StudentId) -> Option<WindowSnapshot> {
        lock(&self.snapshots).get(student_id).cloned()
    }

    /// Whether the cached snapshot shows the window open; false without one
    pub fn is_open(&self, student_id: &StudentId, key: &WindowKey) -> bool {
        lock(&self.snapshots)
            .get(student_id)
            .map(|snapshot| snapshot.is_open(key))
            .unwrap_or(false)
    }

    pub fn toggle_state(&self, key: &WindowKey) -> Option<ToggleState> {
        lock(&self.labels).states.get(key).copied()
    }

    /// "Take Attendance" or "End Attendance" for the teacher's button
    pub fn label(&self, key: &WindowKey) -> &'static str {
        self.toggle_state(key)
            .map(|state| state.displayed())
            .unwrap_or_default()
            .action_label()
    }

    fn begin(&self, key: &WindowKey, allow_indeterminate: bool) -> Result<PendingToggle<'_>> {
        let mut labels = lock(&self.labels);
        let previous = match labels.states.get(key).copied() {
            Some(ToggleState::Pending { .. }) => {
                return Err(AttendanceError::ToggleInFlight {
                    window: key.to_string(),
                })
            }
            Some(ToggleState::Indeterminate { last_confirmed }) if allow_indeterminate => {
                last_confirmed
            }
            Some(ToggleState::Indeterminate { .. }) => {
                return Err(AttendanceError::WindowStateIndeterminate {
                    window: key.to_string(),
                })
            }
            Some(ToggleState::Confirmed(state)) => state,
            None => WindowState::Closed,
        };

        labels.put(key.clone(), ToggleState::Pending { previous });
        Ok(PendingToggle {
            labels: &self.labels,
            key: key.clone(),
            previous,
            settled: false,
        })
    }

    async fn send(
        &self,
        pending: PendingToggle<'_>,
        key: &WindowKey,
        desired: WindowState,
    ) -> Result<WindowState> {
        let outcome = with_timeout(
            "toggle attendance",
            self.timeout,
            self.service.set_window(key, desired),
        )
        .await;

        match outcome {
            Ok(state) => {
                pending.settle(ToggleState::Confirmed(state));
                lock(&self.snapshots).clear();
                tracing::info!(window = %key, state = ?state, "Attendance window updated");
                Ok(state)
            }
            Err(e) => {
                let previous = pending.previous;
                let settled = match &e {
                    AttendanceError::Network { .. }
                    | AttendanceError::Timeout { .. }
                    | AttendanceError::Server { .. } => ToggleState::Indeterminate {
                        last_confirmed: previous,
                    },
                    _ => ToggleState::Confirmed(previous),
                };
                pending.settle(settled);
                tracing::warn!(window = %key, error = %e, "Attendance toggle failed");
                Err(e)
            }
        }
    }
}
