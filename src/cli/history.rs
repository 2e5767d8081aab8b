//! Audit history command

use tracing::error;

use super::{CommandFailure, CommandResult};
use crate::app::App;
use crate::error::LaplataError;
use crate::i18n::UNEXPECTED;

/// Print the signed-in user's latest audit entries, oldest first
pub fn handle_history_command(app: &App, limit: usize) -> CommandResult {
    let owner = app
        .auth
        .session()
        .get()
        .map(|session| session.user.id.to_key())
        .ok_or_else(|| CommandFailure(LaplataError::NotAuthenticated.to_string()))?;

    let entries = app.audit_log().read_all().map_err(|e| {
        error!(error = %e, "failed to read audit log");
        CommandFailure(UNEXPECTED.to_string())
    })?;

    let mine: Vec<_> = entries
        .into_iter()
        .filter(|entry| entry.owner_id.as_deref() == Some(owner.as_str()))
        .collect();
    if mine.is_empty() {
        println!("Sin actividad registrada.");
        return Ok(());
    }

    let skip = mine.len().saturating_sub(limit);
    for entry in &mine[skip..] {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
