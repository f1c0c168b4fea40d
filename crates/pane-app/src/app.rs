// SPDX-License-Identifier: CEPL-1.0
use std::sync::Arc;
use std::time::Instant;

use pane_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow},
    window::WindowId,
};
use pane_platform::WindowRegistry;
use pane_present::Extent2D;
use pane_present_vk::VkContext;
use tracing::{error, info, warn};

use crate::config::AppCfg;
use crate::window::{Window, WindowDesc};

pub struct App {
    cfg: AppCfg,
    // Declared before `ctx` so windows release their surfaces first.
    windows: WindowRegistry<Window>,
    ctx: Option<Arc<VkContext>>,
    started: bool,
    frames: u32,
    last_fps_instant: Instant,
}

impl App {
    pub fn new(cfg: AppCfg) -> Self {
        Self {
            cfg,
            windows: WindowRegistry::new(),
            ctx: None,
            started: false,
            frames: 0,
            last_fps_instant: Instant::now(),
        }
    }

    fn open_windows(&mut self, event_loop: &ActiveEventLoop) {
        let count = self.cfg.window.count.max(1);
        for i in 0..count {
            let title = if count > 1 {
                format!("{} {}", self.cfg.window.title, i + 1)
            } else {
                self.cfg.window.title.clone()
            };
            let desc = WindowDesc {
                size: Extent2D::new(self.cfg.window.width, self.cfg.window.height),
                title: &title,
                monitor: self.cfg.window.monitor,
            };
            match Window::new(event_loop, &mut self.ctx, &desc, self.cfg.render.clear_color) {
                Ok(window) => {
                    window.request_redraw();
                    self.windows.insert(window.id(), window);
                }
                Err(e) => error!("cannot open window \"{title}\": {e}"),
            }
        }
        if self.windows.is_empty() {
            error!("no window could be opened");
            event_loop.exit();
        }
    }

    fn close_window(&mut self, event_loop: &ActiveEventLoop, id: WindowId) {
        if let Some(mut window) = self.windows.remove_by_id(id) {
            window.stop();
            info!("closing window ({} frames in flight)", window.frames_in_flight());
        }
        if self.windows.is_empty() {
            event_loop.exit();
        }
    }

    /// Release everything the GPU still holds, then the context itself.
    fn shutdown(&mut self) {
        for mut window in self.windows.drain() {
            window.stop();
        }
        if let Some(ctx) = self.ctx.take() {
            ctx.wait_idle();
            if Arc::strong_count(&ctx) > 1 {
                warn!("Vulkan context still referenced at shutdown");
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.started {
            self.started = true;
            self.open_windows(event_loop);
        }
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("CloseRequested");
                self.close_window(event_loop, window_id);
            }

            WindowEvent::Resized(new_size) => {
                if let Some(window) = self.windows.get_by_id_mut(window_id) {
                    window.resize(new_size);
                }
            }

            WindowEvent::RedrawRequested => {
                let Some(window) = self.windows.get_by_id_mut(window_id) else {
                    return;
                };
                match window.draw() {
                    Ok(()) => self.frames = self.frames.saturating_add(1),
                    Err(e) => {
                        error!("render error: {e}");
                        self.close_window(event_loop, window_id);
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ctx) = &self.ctx {
            ctx.poll_completions();
        }
        for (_, window) in self.windows.iter_mut() {
            window.request_redraw();
        }

        let now = Instant::now();
        if now.duration_since(self.last_fps_instant).as_secs_f32() >= 1.0 {
            info!("fps ~ {} ({} windows)", self.frames, self.windows.len());
            self.frames = 0;
            self.last_fps_instant = now;
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
