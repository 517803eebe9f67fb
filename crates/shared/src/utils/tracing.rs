use std::sync::Once;

use time::format_description::well_known::Iso8601;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt::{format::Pretty, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer,
};
use tracing_web::{performance_layer, MakeWebConsoleWriter};

/// Sends events to the browser console and spans to the performance
/// timeline. There is no env in a worker so the level comes from the worker
/// config instead of RUST_LOG.
pub fn configure_tracing(max_level: LevelFilter) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false) // Only partially supported across browsers
        .with_timer(UtcTime::new(Iso8601::DEFAULT))
        .with_writer(MakeWebConsoleWriter::new())
        .with_filter(max_level);
    let perf_layer = performance_layer().with_details_from_fields(Pretty::default());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(perf_layer)
        .init();
}

/// Configures tracing inside a Once block so multiple calls don't panic. The
/// host page and each worker instance get their own wasm instance so this
/// runs once per context.
pub fn configure_tracing_once(max_level: LevelFilter) {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| configure_tracing(max_level));
}
