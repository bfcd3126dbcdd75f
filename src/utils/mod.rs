pub mod paths;

use std::sync::Once;

use chrono::{Local, NaiveDate};

static TRACING_INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "finance_tracker=info";

/// Initializes the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        // Another subscriber may already be installed by the embedding binary or a test harness.
        let _ = fmt().with_env_filter(filter).try_init();
    });
}

/// Current local calendar date, used as the reference date by request handlers.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
