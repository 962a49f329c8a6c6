pub mod ledger_sync;
pub mod library_scan;
pub mod metadata;
pub mod mirror;
pub mod reconcile_run;
pub mod sheets;
pub mod spotify;
