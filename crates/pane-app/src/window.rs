// SPDX-License-Identifier: CEPL-1.0
use std::any::Any;
use std::sync::Arc;

use pane_platform::monitor_by_index;
use pane_platform::winit::{
    dpi::PhysicalSize,
    event_loop::ActiveEventLoop,
    window::{Fullscreen, Window as OsWindow, WindowId},
};
use pane_present::{Extent2D, HandlerId, PresentError, Presenter, SwapchainError};
use pane_present_vk::{VkBackend, VkCanvas, VkContext, VkError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("cannot create window: {0}")]
    CreateWindowError(String),
    #[error("cannot find a device queue that can present to this window: {0}")]
    DeviceQueueSelectionError(VkError),
    #[error(transparent)]
    Swapchain(#[from] SwapchainError),
    #[error("graphics backend: {0}")]
    Backend(VkError),
}

impl From<VkError> for WindowError {
    fn from(e: VkError) -> Self {
        match e {
            VkError::NoSuitableDevice | VkError::QueueCannotPresent(_) => {
                WindowError::DeviceQueueSelectionError(e)
            }
            other => WindowError::Backend(other),
        }
    }
}

pub struct WindowDesc<'a> {
    pub size: Extent2D,
    pub title: &'a str,
    pub monitor: Option<usize>,
}

/// A platform window and the presenter drawing into it.
pub struct Window {
    presenter: Presenter<VkBackend>,
    handler: HandlerId,
    // Also held by the surface, which may outlive this struct while its
    // swapchain is parked.
    os: Arc<OsWindow>,
}

fn to_extent(size: PhysicalSize<u32>) -> Extent2D {
    Extent2D::new(size.width, size.height)
}

impl Window {
    /// Create the window, its surface and its presenter. The first window also
    /// bootstraps the shared Vulkan context into `ctx`.
    pub fn new(
        event_loop: &ActiveEventLoop,
        ctx: &mut Option<Arc<VkContext>>,
        desc: &WindowDesc<'_>,
        clear_color: [f32; 4],
    ) -> Result<Self, WindowError> {
        let mut attrs = OsWindow::default_attributes()
            .with_title(desc.title)
            .with_inner_size(PhysicalSize::new(desc.size.width, desc.size.height));
        if let Some(monitor) = monitor_by_index(event_loop, desc.monitor) {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
        }
        let os = event_loop
            .create_window(attrs)
            .map(Arc::new)
            .map_err(|e| WindowError::CreateWindowError(e.to_string()))?;

        let surface = match ctx {
            Some(ctx) => ctx.create_surface(&*os, &*os)?,
            None => {
                let (new_ctx, surface) = VkContext::new(&*os, &*os)?;
                *ctx = Some(new_ctx);
                surface
            }
        };
        let surface = surface.keep_alive(Arc::clone(&os) as Arc<dyn Any + Send + Sync>);

        let framebuffer = to_extent(os.inner_size());
        let mut presenter = Presenter::new(VkBackend::new(surface), framebuffer)?;
        let handler = presenter.set_draw_handler(move |canvas: &mut VkCanvas| canvas.clear(clear_color));
        info!("{}: window \"{}\" open ({})", presenter.id(), desc.title, framebuffer);

        Ok(Self {
            presenter,
            handler,
            os,
        })
    }

    pub fn id(&self) -> WindowId {
        self.os.id()
    }

    pub fn request_redraw(&self) {
        self.os.request_redraw();
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.presenter.resize(to_extent(size));
    }

    pub fn draw(&mut self) -> Result<(), PresentError> {
        self.presenter.draw()
    }

    /// Detach the draw handler and stop drawing.
    pub fn stop(&mut self) {
        self.presenter.remove_draw_handler(self.handler);
        self.presenter.stop();
    }

    pub fn frames_in_flight(&self) -> usize {
        self.presenter.frames_in_flight()
    }
}
