//! Single source of truth for the support-assist filesystem layout.
//!
//! This module defines WHERE data lives. It has no I/O, no validation,
//! no business logic.
//!
//! ```text
//! ~/.support-assist/           # or $SUPPORT_ASSIST_HOME
//! ├── config.toml              # User config
//! └── data/
//!     ├── feedback.db          # Feedback counters (durable, shared)
//!     └── tickets/             # Derived (rebuildable from the dataset)
//!         ├── tickets.db
//!         └── tickets.usearch
//!
//! project/.support-assist/
//! └── config.toml              # Project config (wins over user config)
//! ```

use std::path::PathBuf;

/// Overrides the home directory (tests, shared deployments)
pub const HOME_ENV_VAR: &str = "SUPPORT_ASSIST_HOME";

const DIR_NAME: &str = ".support-assist";

/// Home directory: `$SUPPORT_ASSIST_HOME` or `~/.support-assist/`
pub fn home() -> PathBuf {
    if let Ok(dir) = std::env::var(HOME_ENV_VAR) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DIR_NAME)
}

/// User config file: `~/.support-assist/config.toml`
pub fn config_path() -> PathBuf {
    home().join("config.toml")
}

/// Project config file: `./.support-assist/config.toml`
pub fn project_config_path() -> PathBuf {
    PathBuf::from(DIR_NAME).join("config.toml")
}

/// Data directory: `~/.support-assist/data/`
pub fn data_dir() -> PathBuf {
    home().join("data")
}

/// Feedback counters: `~/.support-assist/data/feedback.db`
pub fn feedback_db() -> PathBuf {
    data_dir().join("feedback.db")
}

/// Ticket rows + vector index: `~/.support-assist/data/tickets/`
pub fn tickets_dir() -> PathBuf {
    data_dir().join("tickets")
}
