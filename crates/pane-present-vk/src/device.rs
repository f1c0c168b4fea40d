// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CStr;

use ash::khr::{surface, swapchain};
use ash::{vk, Instance};
use tracing::{debug, info};

use crate::error::{VkError, VkResultExt};

/// Device extensions every candidate must expose.
pub const REQUIRED_DEVICE_EXTENSIONS: &[&CStr] = &[swapchain::NAME];

/// Higher is better; discrete GPUs win.
pub fn device_type_score(ty: vk::PhysicalDeviceType) -> u32 {
    match ty {
        vk::PhysicalDeviceType::DISCRETE_GPU => 4,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 3,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
        vk::PhysicalDeviceType::CPU => 1,
        _ => 0,
    }
}

/// Every name in `required` appears in `available`.
pub fn has_extensions(available: &[&CStr], required: &[&CStr]) -> bool {
    required.iter().all(|r| available.contains(r))
}

/// Best-scoring candidate; ties go to the earliest.
pub fn pick_best<T: Copy>(candidates: &[(T, u32)]) -> Option<T> {
    candidates
        .iter()
        .fold(None::<(T, u32)>, |best, &(c, score)| match best {
            Some((_, s)) if s >= score => best,
            _ => Some((c, score)),
        })
        .map(|(c, _)| c)
}

unsafe fn graphics_present_family(
    instance: &Instance,
    surface_loader: &surface::Instance,
    phys: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> Option<u32> {
    let qprops = instance.get_physical_device_queue_family_properties(phys);
    qprops.iter().enumerate().find_map(|(i, q)| {
        let present = surface_loader
            .get_physical_device_surface_support(phys, i as u32, surface)
            .unwrap_or(false);
        (q.queue_flags.contains(vk::QueueFlags::GRAPHICS) && present).then_some(i as u32)
    })
}

unsafe fn device_extensions_ok(instance: &Instance, phys: vk::PhysicalDevice) -> bool {
    let Ok(props) = instance.enumerate_device_extension_properties(phys) else {
        return false;
    };
    let names: Vec<&CStr> = props
        .iter()
        .map(|e| CStr::from_ptr(e.extension_name.as_ptr()))
        .collect();
    has_extensions(&names, REQUIRED_DEVICE_EXTENSIONS)
}

/// Choose the physical device and queue family that will serve every window.
pub unsafe fn select_device_and_queue(
    instance: &Instance,
    surface_loader: &surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, u32), VkError> {
    let mut candidates = Vec::new();
    for phys in instance
        .enumerate_physical_devices()
        .op("enumerate_physical_devices")?
    {
        let props = instance.get_physical_device_properties(phys);
        let name = CStr::from_ptr(props.device_name.as_ptr()).to_string_lossy();
        if !device_extensions_ok(instance, phys) {
            debug!("skipping {name}: missing required device extensions");
            continue;
        }
        let Some(family) = graphics_present_family(instance, surface_loader, phys, surface) else {
            debug!("skipping {name}: no graphics queue can present to the surface");
            continue;
        };
        let score = device_type_score(props.device_type);
        debug!("candidate {name} ({:?}) queue family {family}, score {score}", props.device_type);
        candidates.push(((phys, family), score));
    }

    let (phys, family) = pick_best(&candidates).ok_or(VkError::NoSuitableDevice)?;
    let props = instance.get_physical_device_properties(phys);
    info!(
        "selected device {} (queue family {family})",
        CStr::from_ptr(props.device_name.as_ptr()).to_string_lossy()
    );
    Ok((phys, family))
}

/// Windows created after the first must be served by the already-selected queue.
pub unsafe fn check_present_support(
    surface_loader: &surface::Instance,
    phys: vk::PhysicalDevice,
    queue_family: u32,
    surface: vk::SurfaceKHR,
) -> Result<(), VkError> {
    let ok = surface_loader
        .get_physical_device_surface_support(phys, queue_family, surface)
        .op("get_physical_device_surface_support")?;
    if ok {
        Ok(())
    } else {
        Err(VkError::QueueCannotPresent(queue_family))
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
