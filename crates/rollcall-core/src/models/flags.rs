use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::session::StudentId;

/// Remotely controlled feature flags
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagKey {
    /// Global switch for the model tuning flows
    TuningEnabled,
    /// Per-student permission to enter coordinates by hand
    ManualGps(StudentId),
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagKey::TuningEnabled => f.write_str("tuningEnabled"),
            FlagKey::ManualGps(student_id) => write!(f, "manualGpsEnabled[{}]", student_id),
        }
    }
}

/// Last values this client read for each flag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSnapshot {
    values: HashMap<FlagKey, bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FlagSnapshot {
    /// Flags never read are off
    pub fn get(&self, key: &FlagKey) -> bool {
        self.values.get(key).copied().unwrap_or(false)
    }

    pub fn is_known(&self, key: &FlagKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn set(&mut self, key: FlagKey, enabled: bool) {
        self.values.insert(key, enabled);
        self.updated_at = Some(Utc::now());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FlagKey, &bool)> {
        self.values.iter()
    }
}
