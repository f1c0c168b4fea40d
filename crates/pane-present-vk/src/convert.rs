// SPDX-License-Identifier: CEPL-1.0
//! Mapping between Vulkan values and the backend-neutral presentation types.

use ash::vk;
use pane_present::{
    AcquireOutcome, BackendError, ColorSpace, Extent2D, Format, ImageUsage, PresentMode,
    PresentOutcome, SurfaceCapabilities, SurfaceFormat,
};

pub fn format_from_vk(f: vk::Format) -> Format {
    match f {
        vk::Format::B8G8R8A8_UNORM => Format::B8G8R8A8_UNORM,
        vk::Format::B8G8R8A8_SRGB => Format::B8G8R8A8_SRGB,
        vk::Format::R8G8B8A8_UNORM => Format::R8G8B8A8_UNORM,
        vk::Format::R8G8B8A8_SRGB => Format::R8G8B8A8_SRGB,
        vk::Format::A2B10G10R10_UNORM_PACK32 => Format::A2B10G10R10_UNORM,
        vk::Format::R16G16B16A16_SFLOAT => Format::R16G16B16A16_SFLOAT,
        other => Format::Other(other.as_raw()),
    }
}

pub fn format_to_vk(f: Format) -> vk::Format {
    match f {
        Format::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        Format::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        Format::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        Format::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        Format::A2B10G10R10_UNORM => vk::Format::A2B10G10R10_UNORM_PACK32,
        Format::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        Format::Other(raw) => vk::Format::from_raw(raw),
    }
}

pub fn color_space_from_vk(cs: vk::ColorSpaceKHR) -> ColorSpace {
    match cs {
        vk::ColorSpaceKHR::SRGB_NONLINEAR => ColorSpace::SrgbNonlinear,
        vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT => ColorSpace::ExtendedSrgbLinear,
        vk::ColorSpaceKHR::HDR10_ST2084_EXT => ColorSpace::Hdr10St2084,
        other => ColorSpace::Other(other.as_raw()),
    }
}

pub fn color_space_to_vk(cs: ColorSpace) -> vk::ColorSpaceKHR {
    match cs {
        ColorSpace::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
        ColorSpace::ExtendedSrgbLinear => vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        ColorSpace::Hdr10St2084 => vk::ColorSpaceKHR::HDR10_ST2084_EXT,
        ColorSpace::Other(raw) => vk::ColorSpaceKHR::from_raw(raw),
    }
}

pub fn surface_format_from_vk(f: &vk::SurfaceFormatKHR) -> SurfaceFormat {
    SurfaceFormat {
        format: format_from_vk(f.format),
        color_space: color_space_from_vk(f.color_space),
    }
}

pub fn present_mode_from_vk(m: vk::PresentModeKHR) -> PresentMode {
    match m {
        vk::PresentModeKHR::IMMEDIATE => PresentMode::Immediate,
        vk::PresentModeKHR::MAILBOX => PresentMode::Mailbox,
        vk::PresentModeKHR::FIFO => PresentMode::Fifo,
        vk::PresentModeKHR::FIFO_RELAXED => PresentMode::FifoRelaxed,
        other => PresentMode::Other(other.as_raw()),
    }
}

pub fn present_mode_to_vk(m: PresentMode) -> vk::PresentModeKHR {
    match m {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
        PresentMode::Other(raw) => vk::PresentModeKHR::from_raw(raw),
    }
}

pub fn usage_to_vk(usage: ImageUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(ImageUsage::COLOR_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(ImageUsage::TRANSFER_SRC) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(ImageUsage::TRANSFER_DST) {
        flags |= vk::ImageUsageFlags::TRANSFER_DST;
    }
    flags
}

pub fn extent_to_vk(e: Extent2D) -> vk::Extent2D {
    vk::Extent2D {
        width: e.width,
        height: e.height,
    }
}

fn extent_from_vk(e: vk::Extent2D) -> Extent2D {
    Extent2D::new(e.width, e.height)
}

/// A surface that reports a fixed current extent only accepts that extent.
pub fn capabilities_from_vk(caps: &vk::SurfaceCapabilitiesKHR) -> SurfaceCapabilities {
    let (min, max) = if caps.current_extent.width != u32::MAX {
        (caps.current_extent, caps.current_extent)
    } else {
        (caps.min_image_extent, caps.max_image_extent)
    };
    SurfaceCapabilities {
        min_image_count: caps.min_image_count,
        max_image_count: caps.max_image_count,
        min_image_extent: extent_from_vk(min),
        max_image_extent: extent_from_vk(max),
    }
}

pub fn acquire_outcome(result: Result<(u32, bool), vk::Result>) -> AcquireOutcome {
    match result {
        Ok((index, suboptimal)) => AcquireOutcome::Acquired { index, suboptimal },
        Err(vk::Result::NOT_READY) | Err(vk::Result::TIMEOUT) => AcquireOutcome::NotReady,
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => AcquireOutcome::OutOfDate,
        Err(e) => AcquireOutcome::Failed(BackendError::new("acquire_next_image", format!("{e:?}"))),
    }
}

pub fn present_outcome(result: Result<bool, vk::Result>) -> PresentOutcome {
    match result {
        Ok(false) => PresentOutcome::Success,
        Ok(true) => PresentOutcome::Suboptimal,
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => PresentOutcome::OutOfDate,
        Err(e) => PresentOutcome::Failed(BackendError::new("queue_present", format!("{e:?}"))),
    }
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;
