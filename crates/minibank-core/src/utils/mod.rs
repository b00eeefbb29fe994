//! Utility functions for formatting and shared-state access.

pub mod format;

use std::sync::{Mutex, MutexGuard};

// Re-export commonly used functions at module level
pub use format::{format_amount, format_date, truncate_string};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
