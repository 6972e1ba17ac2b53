use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::scan_types::NotificationKey;

/// Number of alerts already sent per finding.
///
/// Cloning shares the underlying map. Only keys that triggered at least one
/// alert are stored.
#[derive(Debug, Clone, Default)]
pub struct NotificationState {
    sent: Arc<Mutex<HashMap<NotificationKey, u32>>>,
}

impl NotificationState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NotificationKey, u32>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether another alert for `key` stays within `cap`
    pub fn should_notify(&self, key: &NotificationKey, cap: u32) -> bool {
        self.count(key) < cap
    }

    /// Count one more alert for `key`
    pub fn record(&self, key: &NotificationKey) {
        *self.lock().entry(key.clone()).or_insert(0) += 1;
    }

    /// Check the cap and count the alert under a single lock.
    ///
    /// Returns false, leaving the state untouched, when `cap` alerts were
    /// already counted for `key`.
    pub fn try_reserve(&self, key: &NotificationKey, cap: u32) -> bool {
        let mut sent = self.lock();
        let count = sent.get(key).copied().unwrap_or(0);
        if count >= cap {
            return false;
        }
        sent.insert(key.clone(), count + 1);
        true
    }

    /// Alerts counted for `key`
    pub fn count(&self, key: &NotificationKey) -> u32 {
        self.lock().get(key).copied().unwrap_or(0)
    }

    /// Number of findings with at least one alert
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no alert was counted since the last reset
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget every counted alert
    pub fn reset(&self) {
        let mut sent = self.lock();
        debug!("Clearing {} notified findings", sent.len());
        sent.clear();
    }
}
