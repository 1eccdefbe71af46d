use std::sync::OnceLock;

use sentry_tracing::{EventFilter, SentryLayer};
use tracing::Level;

static INIT_GUARD: OnceLock<sentry::ClientInitGuard> = OnceLock::new();

/// Initialise the Sentry client once. Without a DSN this is a no-op.
pub fn init_once(dsn: Option<&str>, environment: &str) {
    let Some(dsn) = dsn.filter(|d| !d.is_empty()) else {
        return;
    };

    INIT_GUARD.get_or_init(|| {
        sentry::init((
            dsn.to_string(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(environment.to_string().into()),
                ..Default::default()
            },
        ))
    });
}

/// Forward errors to Sentry as events and warnings as breadcrumbs.
pub fn sentry_layer<S>() -> SentryLayer<S>
where
    S: tracing::Subscriber,
    S: for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    SentryLayer::default()
        .span_filter(|meta| {
            matches!(
                *meta.level(),
                Level::DEBUG | Level::INFO | Level::WARN | Level::ERROR
            )
        })
        .event_filter(|meta| match *meta.level() {
            Level::ERROR => EventFilter::Event,
            Level::DEBUG | Level::INFO | Level::WARN => EventFilter::Breadcrumb,
            Level::TRACE => EventFilter::Ignore,
        })
}
