#![cfg(not(target_arch = "wasm32"))]

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::create_app;

const DEFAULT_LOG_FILTER: &str = "flowdo=info,flowcanvas=info";

/// Entry point used by the native executable.
pub fn run() -> eframe::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let native_options = eframe::NativeOptions::default();

    eframe::run_native(
        "FlowDo",
        native_options,
        Box::new(|cc| Ok(Box::new(create_app(cc)))),
    )
}
