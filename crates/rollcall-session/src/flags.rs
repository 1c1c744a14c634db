//! Remotely controlled feature flags shared by every role's view.
//!
//! The server is the source of truth. Each read or write publishes the value
//! it saw on a `watch` channel, so views observe changes made through this
//! client immediately and changes made elsewhere on their next read.

use futures::future::try_join_all;
use rollcall_core::error::Result;
use rollcall_core::models::{FlagKey, FlagSnapshot, SessionContext, StudentId};
use rollcall_core::ports::FlagService;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::watch;

use crate::call::with_timeout;

pub struct FeatureFlagBroadcast<F>
where
    F: FlagService,
{
    service: F,
    timeout: Duration,
    sender: watch::Sender<FlagSnapshot>,
}

impl<F> FeatureFlagBroadcast<F>
where
    F: FlagService,
{
    pub fn new(service: F, timeout: Duration) -> Self {
        let (sender, _) = watch::channel(FlagSnapshot::default());
        Self {
            service,
            timeout,
            sender,
        }
    }

    /// Receive every flag value this client reads or writes
    pub fn subscribe(&self) -> watch::Receiver<FlagSnapshot> {
        self.sender.subscribe()
    }

    /// Values as last seen, without a network call
    pub fn current(&self) -> FlagSnapshot {
        self.sender.borrow().clone()
    }

    /// Read one flag from the server
    pub async fn read(&self, key: &FlagKey) -> Result<bool> {
        let enabled = match key {
            FlagKey::TuningEnabled => {
                with_timeout("read tuning flag", self.timeout, self.service.tuning_enabled())
                    .await?
            }
            FlagKey::ManualGps(student_id) => {
                with_timeout(
                    "read manual GPS flag",
                    self.timeout,
                    self.service.manual_gps_enabled(student_id),
                )
                .await?
            }
        };
        self.publish([(key.clone(), enabled)]);
        Ok(enabled)
    }

    /// Re-read several flags concurrently; fails if any read fails
    pub async fn refresh(&self, keys: &[FlagKey]) -> Result<FlagSnapshot> {
        try_join_all(keys.iter().map(|key| self.read(key))).await?;
        Ok(self.current())
    }

    /// Invert a flag, returning its new value.
    ///
    /// Tuning is admin-only. A student's manual-GPS flag may be flipped by
    /// any staff member and is read fresh first so the inversion is based on
    /// the server's value, not a stale local one.
    pub async fn toggle(&self, session: &SessionContext, key: &FlagKey) -> Result<bool> {
        let enabled = match key {
            FlagKey::TuningEnabled => {
                session.require_admin("toggle model tuning")?;
                with_timeout("toggle tuning", self.timeout, self.service.toggle_tuning()).await?
            }
            FlagKey::ManualGps(student_id) => {
                session.require_staff("toggle manual GPS")?;
                let current = with_timeout(
                    "read manual GPS flag",
                    self.timeout,
                    self.service.manual_gps_enabled(student_id),
                )
                .await?;
                let ids = [student_id.clone()];
                with_timeout(
                    "set manual GPS",
                    self.timeout,
                    self.service.set_manual_gps(&ids, !current),
                )
                .await?;
                !current
            }
        };

        tracing::info!(flag = %key, enabled, "Feature flag toggled");
        self.publish([(key.clone(), enabled)]);
        Ok(enabled)
    }

    /// Set manual GPS for a set of students in one call.
    ///
    /// The call succeeds or fails as a whole; nothing is published on failure.
    pub async fn set_bulk(
        &self,
        session: &SessionContext,
        student_ids: &BTreeSet<StudentId>,
        enabled: bool,
    ) -> Result<()> {
        session.require_staff("set manual GPS")?;
        if student_ids.is_empty() {
            return Ok(());
        }

        let ids: Vec<StudentId> = student_ids.iter().cloned().collect();
        with_timeout(
            "set manual GPS",
            self.timeout,
            self.service.set_manual_gps(&ids, enabled),
        )
        .await?;

        tracing::info!(students = ids.len(), enabled, "Manual GPS updated for selection");
        self.publish(ids.into_iter().map(|id| (FlagKey::ManualGps(id), enabled)));
        Ok(())
    }

    /// Set manual GPS for every student on the server
    pub async fn set_all(&self, session: &SessionContext, enabled: bool) -> Result<()> {
        session.require_staff("set manual GPS for all")?;
        with_timeout(
            "set manual GPS for all",
            self.timeout,
            self.service.set_manual_gps_all(enabled),
        )
        .await?;

        tracing::info!(enabled, "Manual GPS updated for all students");
        let known: Vec<FlagKey> = self
            .current()
            .iter()
            .filter(|(key, _)| matches!(key, FlagKey::ManualGps(_)))
            .map(|(key, _)| key.clone())
            .collect();
        self.publish(known.into_iter().map(|key| (key, enabled)));
        Ok(())
    }

    /// Record values, notifying subscribers only when something changed
    fn publish(&self, values: impl IntoIterator<Item = (FlagKey, bool)>) {
        let values: Vec<(FlagKey, bool)> = values.into_iter().collect();
        self.sender.send_if_modified(|snapshot| {
            let mut changed = false;
            for (key, enabled) in values {
                if !snapshot.is_known(&key) || snapshot.get(&key) != enabled {
                    changed = true;
                }
                snapshot.set(key, enabled);
            }
            changed
        });
    }
}
