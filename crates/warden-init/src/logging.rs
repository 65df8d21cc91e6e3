//! Tracing setup for the init process.
//!
//! The init process usually has its stderr wired to the orchestrator's log
//! pipe, so output goes there, optionally as JSON lines.

use tracing_subscriber::EnvFilter;

/// Output encoding of init logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Installs the global subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Returns `false` if a subscriber was already installed, in which case
/// nothing changes.
pub fn try_init(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_rejected() {
        let _ = try_init(LogFormat::Text);
        assert!(!try_init(LogFormat::Json));
    }
}
