// SPDX-License-Identifier: CEPL-1.0
use tracing::{debug, warn};
use winit::event_loop::ActiveEventLoop;
use winit::monitor::MonitorHandle;

/// Resolve a requested monitor index against `count` available monitors.
pub fn resolve_index(requested: Option<usize>, count: usize) -> Option<usize> {
    let index = requested?;
    if index < count {
        Some(index)
    } else {
        warn!("monitor {index} requested but only {count} available; using default placement");
        None
    }
}

/// Monitor at `index` in enumeration order, if there is one.
pub fn monitor_by_index(event_loop: &ActiveEventLoop, index: Option<usize>) -> Option<MonitorHandle> {
    let monitors: Vec<MonitorHandle> = event_loop.available_monitors().collect();
    let picked = resolve_index(index, monitors.len())?;
    let monitor = monitors.into_iter().nth(picked)?;
    debug!(
        "monitor {picked}: {} at {:?}",
        monitor.name().unwrap_or_else(|| "unnamed".into()),
        monitor.position()
    );
    Some(monitor)
}
