// SPDX-License-Identifier: CEPL-1.0
use bitflags::bitflags;

/// `current_image` value while no swapchain image is held.
pub const NO_IMAGE: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn clamp(self, min: Extent2D, max: Extent2D) -> Extent2D {
        Extent2D {
            width: self.width.clamp(min.width, max.width.max(min.width)),
            height: self.height.clamp(min.height, max.height.max(min.height)),
        }
    }
}

impl std::fmt::Display for Extent2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    A2B10G10R10_UNORM,
    R16G16B16A16_SFLOAT,
    /// Raw backend value for formats this crate has no name for.
    Other(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonlinear,
    ExtendedSrgbLinear,
    Hdr10St2084,
    Other(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: Format,
    pub color_space: ColorSpace,
}

impl SurfaceFormat {
    /// The only pair swapchains are built with.
    pub const PREFERRED: SurfaceFormat = SurfaceFormat {
        format: Format::B8G8R8A8_UNORM,
        color_space: ColorSpace::SrgbNonlinear,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Immediate,
    Mailbox,
    Fifo,
    FifoRelaxed,
    Other(i32),
}

impl std::fmt::Display for PresentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresentMode::Immediate => f.write_str("IMMEDIATE"),
            PresentMode::Mailbox => f.write_str("MAILBOX"),
            PresentMode::Fifo => f.write_str("FIFO"),
            PresentMode::FifoRelaxed => f.write_str("FIFO_RELAXED"),
            PresentMode::Other(raw) => write!(f, "OTHER({raw})"),
        }
    }
}

/// What the surface reports it can do. `max_image_count == 0` means unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    pub max_image_count: u32,
    pub min_image_extent: Extent2D,
    pub max_image_extent: Extent2D,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const COLOR_ATTACHMENT = 1 << 0;
        const TRANSFER_SRC = 1 << 1;
        const TRANSFER_DST = 1 << 2;
    }
}

/// Everything a backend needs to create (or re-create) a swapchain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub min_image_count: u32,
    pub format: SurfaceFormat,
    pub extent: Extent2D,
    pub usage: ImageUsage,
    pub present_mode: PresentMode,
}

/// Per-image descriptor used to wrap a swapchain image as a render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTargetDesc {
    pub extent: Extent2D,
    pub format: SurfaceFormat,
    pub usage: ImageUsage,
}
