use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Production emits JSON lines; development
/// uses the compact human-readable format.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("server=info,services=info,db=info,utils=info,tower_http=info,sqlx=warn")
    });

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(crate::sentry::sentry_layer());

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(false))
            .init();
    }
}
