pub mod feedback;
pub mod ingest;
pub mod search;
pub mod stats;

use colored::*;
use support_assist::AssistError;

/// Print an operator-facing failure and return the process exit code
pub(crate) fn report_failure(err: &AssistError) -> i32 {
    tracing::error!(error = %err, "command failed");
    eprintln!("{} {}", "✗".red(), err.user_message());
    if err.is_retryable() {
        2
    } else {
        1
    }
}
