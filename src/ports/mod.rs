//! Collaborator traits consumed by the reconciliation workflows.
//!
//! Production implementations live in `services`; tests use the generated mocks.

pub mod feed;
pub mod ledger;
pub mod metadata;
pub mod mirror;
