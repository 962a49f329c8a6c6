use std::collections::BTreeMap;

use crate::error::ReconcileError;
use crate::ledger::RecordKey;

/// A local copy of the ledger kept in step with remote changes.
///
/// Row updates never fail towards the caller; implementations log problems instead.
#[cfg_attr(test, mockall::automock)]
pub trait LocalMirror {
    /// Replace the whole mirror with `headers` and `rows`.
    fn reset(&self, headers: &[String], rows: &[Vec<String>]) -> Result<(), ReconcileError>;

    fn append_row(&self, row: &[String]);

    /// Set the named header cells on the first row whose Title and Artist equal `key`.
    fn update_row(&self, key: &RecordKey, updates: &BTreeMap<String, String>);
}
