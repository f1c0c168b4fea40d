// SPDX-License-Identifier: CEPL-1.0
use tracing::debug;

use crate::backend::GpuBackend;
use crate::error::SwapchainError;
use crate::types::{
    Extent2D, ImageUsage, PresentMode, RenderTargetDesc, SurfaceCapabilities, SurfaceFormat,
    SwapchainDesc,
};

/// The live swapchain and the properties it was built with.
pub struct SwapchainState<B: GpuBackend> {
    pub swapchain: B::Swapchain,
    pub format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: Extent2D,
    pub images: Vec<B::Image>,
}

impl<B: GpuBackend> SwapchainState<B> {
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

/// Render target and drawable surface for one swapchain image.
pub struct FrameSlot<B: GpuBackend> {
    pub render_target: B::RenderTarget,
    pub surface: B::Surface,
}

/// Output of a successful [`SwapchainBuilder::rebuild`].
pub struct Rebuilt<B: GpuBackend> {
    pub state: SwapchainState<B>,
    pub slots: Vec<FrameSlot<B>>,
    pub max_frames_enqueued: usize,
}

fn choose_image_count(caps: &SurfaceCapabilities) -> u32 {
    let max = if caps.max_image_count == 0 {
        u32::MAX
    } else {
        caps.max_image_count
    };
    caps.min_image_count.saturating_add(1).min(max)
}

fn choose_surface_format(formats: &[SurfaceFormat], want: SurfaceFormat) -> Option<SurfaceFormat> {
    formats.iter().copied().find(|f| *f == want)
}

fn choose_present_mode(modes: &[PresentMode]) -> PresentMode {
    if modes.contains(&PresentMode::Mailbox) {
        PresentMode::Mailbox
    } else {
        PresentMode::Fifo
    }
}

fn extent_from_caps(caps: &SurfaceCapabilities, framebuffer: Extent2D) -> Extent2D {
    framebuffer.clamp(caps.min_image_extent, caps.max_image_extent)
}

/// Builds swapchains and their frame slots with a fixed selection policy.
#[derive(Clone, Copy, Debug)]
pub struct SwapchainBuilder {
    format: SurfaceFormat,
    usage: ImageUsage,
}

impl Default for SwapchainBuilder {
    fn default() -> Self {
        Self {
            format: SurfaceFormat::PREFERRED,
            usage: ImageUsage::COLOR_ATTACHMENT | ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST,
        }
    }
}

impl SwapchainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn usage(&self) -> ImageUsage {
        self.usage
    }

    /// Build a new swapchain for `framebuffer`, chained from `previous`.
    ///
    /// Nothing owned by the caller is touched; the caller swaps the result in
    /// and drops the old state afterwards.
    pub fn rebuild<B: GpuBackend>(
        &self,
        backend: &mut B,
        previous: Option<&B::Swapchain>,
        framebuffer: Extent2D,
    ) -> Result<Rebuilt<B>, SwapchainError> {
        let desc = self.select(backend, framebuffer)?;
        self.build(backend, &desc, previous)
    }

    /// Pick image count, format, extent and present mode from what the surface
    /// reports. Creates nothing.
    pub fn select<B: GpuBackend>(&self, backend: &B, framebuffer: Extent2D) -> Result<SwapchainDesc, SwapchainError> {
        let caps = backend.surface_capabilities()?;
        let image_count = choose_image_count(&caps);
        debug!(
            "selecting swapchain minimum image count {} (min: {}, max: {})",
            image_count, caps.min_image_count, caps.max_image_count
        );

        let formats = backend.surface_formats()?;
        for f in &formats {
            debug!("available image format {:?} {:?}", f.format, f.color_space);
        }
        let format =
            choose_surface_format(&formats, self.format).ok_or(SwapchainError::UnsupportedSurfaceFormat)?;

        let extent = extent_from_caps(&caps, framebuffer);
        debug!(
            "selecting swapchain image extent {} (min: {}, max: {})",
            extent, caps.min_image_extent, caps.max_image_extent
        );

        let present_mode = choose_present_mode(&backend.present_modes()?);
        debug!("selecting swapchain present mode {}", present_mode);

        Ok(SwapchainDesc {
            min_image_count: image_count,
            format,
            extent,
            usage: self.usage,
            present_mode,
        })
    }

    /// Create the swapchain described by `desc` and wrap its images.
    ///
    /// Once the swapchain exists `previous` is retired, so any error from here
    /// on leaves the caller without a usable swapchain.
    pub fn build<B: GpuBackend>(
        &self,
        backend: &mut B,
        desc: &SwapchainDesc,
        previous: Option<&B::Swapchain>,
    ) -> Result<Rebuilt<B>, SwapchainError> {
        let SwapchainDesc {
            format,
            extent,
            present_mode,
            ..
        } = *desc;
        let swapchain = backend.create_swapchain(desc, previous)?;
        let images = backend.swapchain_images(&swapchain)?;
        if images.len() < 2 {
            return Err(SwapchainError::InsufficientImages(images.len()));
        }

        let target_desc = RenderTargetDesc {
            extent,
            format,
            usage: self.usage,
        };
        let mut slots = Vec::with_capacity(images.len());
        for (index, &image) in images.iter().enumerate() {
            let render_target = backend.create_render_target(image, &target_desc);
            let surface = backend
                .create_draw_surface(&render_target)
                .ok_or(SwapchainError::SurfaceCreation { index })?;
            slots.push(FrameSlot {
                render_target,
                surface,
            });
        }

        let max_frames_enqueued = images.len() - 1;
        debug!("created swapchain with {} images, max frames {}", images.len(), max_frames_enqueued);

        Ok(Rebuilt {
            state: SwapchainState {
                swapchain,
                format,
                present_mode,
                extent,
                images,
            },
            slots,
            max_frames_enqueued,
        })
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
