// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pane_core::init_tracing;
use pane_platform::winit::event_loop::EventLoop;

mod app;
mod config;
mod window;

use app::App;
use config::load_cfg;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the TOML config file
    #[arg(long, default_value = "pane.toml")]
    config: PathBuf,
    /// Number of windows to open (overrides the config file)
    #[arg(long)]
    windows: Option<usize>,
    /// Monitor index to open fullscreen on (overrides the config file)
    #[arg(long)]
    monitor: Option<usize>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let cfg = load_cfg(&args.config).with_overrides(args.windows, args.monitor);
    let event_loop: EventLoop<()> = EventLoop::new().context("create event loop")?;

    let mut app = App::new(cfg);
    event_loop.run_app(&mut app).context("run event loop")?;
    Ok(())
}
