//! Optional tracing bootstrap for embedding applications.
//!
//! The engine itself only emits `tracing` events; it never installs a
//! subscriber (that decision belongs to the process, not the library). This
//! helper is provided for binaries/tests that just want a sane
//! `EnvFilter`-driven default.
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a `tracing-subscriber` formatting layer filtered by `RUST_LOG`
/// (falling back to `info`). Intended for examples, tests, and embedding
/// binaries — never called by the engine itself.
pub fn init_default_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
