// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. Safe to call more than once; later calls
/// keep the first subscriber.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_FILTER);
}

pub fn init_tracing_with(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let installed = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("tracing initialised (default filter {default_filter})");
    }
}
