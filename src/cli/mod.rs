pub mod report;

pub use report::{ScoreReport, ScoreRequest, evaluate, print_offer};

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "monopoly_rs=info";

/// Installs the fmt subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "monopoly_rs=debug"
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
