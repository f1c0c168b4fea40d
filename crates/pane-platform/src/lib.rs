// SPDX-License-Identifier: CEPL-1.0
//! Platform glue: winit (with raw-window-handle 0.6) plus window bookkeeping.

pub use winit;

mod monitor;
mod registry;

pub use monitor::{monitor_by_index, resolve_index};
pub use registry::{WindowKey, WindowRegistry};
