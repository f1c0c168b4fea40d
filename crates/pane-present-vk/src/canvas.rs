// SPDX-License-Identifier: CEPL-1.0
use std::sync::Arc;

use ash::vk;
use pane_present::{DrawSurface, Extent2D};
use tracing::error;

use crate::context::VkContext;
use crate::resources::{record_transition, LayoutCell, VkRenderTarget, COLOR_RANGE};

/// Drawing commands for one swapchain image, recorded into the shared context.
pub struct VkCanvas {
    ctx: Arc<VkContext>,
    image: vk::Image,
    extent: vk::Extent2D,
    layout: LayoutCell,
}

impl VkCanvas {
    pub fn extent(&self) -> Extent2D {
        Extent2D::new(self.extent.width, self.extent.height)
    }

    /// Fill the whole image with `rgba`.
    pub fn clear(&mut self, rgba: [f32; 4]) -> bool {
        let image = self.image;
        let layout = &self.layout;
        let recorded = self.ctx.record(|device, cmd| unsafe {
            // Previous contents are discarded, so the old layout is irrelevant.
            record_transition(
                device,
                cmd,
                image,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            );
            let color = vk::ClearColorValue { float32: rgba };
            device.cmd_clear_color_image(
                cmd,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &color,
                std::slice::from_ref(&COLOR_RANGE),
            );
            layout.set(vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        });
        match recorded {
            Ok(()) => true,
            Err(e) => {
                error!("cannot record clear: {e}");
                false
            }
        }
    }
}

pub struct VkDrawSurface {
    canvas: VkCanvas,
}

impl VkDrawSurface {
    /// `None` when the target has no usable view.
    pub(crate) fn new(ctx: Arc<VkContext>, target: &VkRenderTarget) -> Option<Self> {
        if target.view == vk::ImageView::null() {
            return None;
        }
        Some(Self {
            canvas: VkCanvas {
                ctx,
                image: target.image,
                extent: target.extent,
                layout: target.layout.clone(),
            },
        })
    }
}

impl DrawSurface for VkDrawSurface {
    type Canvas = VkCanvas;

    fn canvas(&mut self) -> &mut VkCanvas {
        &mut self.canvas
    }
}
