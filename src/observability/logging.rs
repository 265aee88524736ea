//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber once, at process start.
///
/// `RUST_LOG` wins when set; otherwise the profile's debug flag picks the
/// default level.
pub fn init(debug: bool) {
    let fallback = if debug {
        "appserver=debug"
    } else {
        "appserver=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
