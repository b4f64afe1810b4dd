//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from `logging.level`
//! - Keep a reload handle so SIGHUP can retune verbosity without a restart
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - An unparseable level falls back to `info` with a warning, never a crash

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Handle for retuning the log level at runtime.
pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
}

/// Install the global subscriber and return the level handle.
///
/// Must be called once, before any log events are emitted.
pub fn init(level: &str) -> LogHandle {
    let (filter, handle) = reload::Layer::new(initial_filter(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    LogHandle { handle }
}

impl LogHandle {
    /// Swap the active level filter, used by the reload path.
    pub fn set_level(&self, level: &str) {
        let filter = match EnvFilter::try_new(level) {
            Ok(filter) => filter,
            Err(error) => {
                tracing::warn!(level = %level, error = %error, "Ignoring unparseable log level");
                return;
            }
        };

        if let Err(error) = self.handle.reload(filter) {
            tracing::warn!(error = %error, "Unable to reload log level");
        } else {
            tracing::info!(level = %level, "Log level updated");
        }
    }
}

/// A handle not attached to any subscriber. Level changes through it go
/// nowhere; used by callers (and tests) that manage logging themselves.
pub fn detached_handle() -> LogHandle {
    let (_layer, handle) = reload::Layer::<EnvFilter, Registry>::new(EnvFilter::new("info"));
    LogHandle { handle }
}

fn initial_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
