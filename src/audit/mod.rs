//! Audit trail for LaPlata
//!
//! Every successful create, update and delete of a wallet, category, income
//! or expense is appended to a line-delimited JSON log (`audit.log` in the
//! data directory) with the row before and after the change. The CLI's
//! `history` command reads it back.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
