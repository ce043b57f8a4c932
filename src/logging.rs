use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs the global subscriber. `RUST_LOG` wins over `verbosity` when set.
pub fn init(verbosity: u8) {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(build_filter(verbosity))
            .with_target(true)
            .with_thread_ids(false)
            .with_level(true)
            .init();
    });
}

fn build_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level_for(verbosity).as_str().to_ascii_lowercase();
        EnvFilter::new(format!("warn,wisharify={level}"))
    })
}

fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}
