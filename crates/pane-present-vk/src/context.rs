// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CString;
use std::sync::{Arc, Mutex, MutexGuard};

use ash::khr::{surface, swapchain};
use ash::{vk, Entry, Instance};
use pane_present::{FinishedCallback, FlushOutcome};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle};
use tracing::{debug, error, info, warn};

use crate::device::{check_present_support, select_device_and_queue};
use crate::error::{VkError, VkResultExt};
use crate::resources::VkSurface;

/// Work flushed but not handed to the queue yet.
struct Batch {
    cmd: Option<vk::CommandBuffer>,
    waits: Vec<vk::Semaphore>,
    signal: Option<vk::Semaphore>,
    fence: vk::Fence,
    finished: Option<FinishedCallback>,
}

/// Work on the queue; its fence tells when `finished` may run.
struct Pending {
    cmd: Option<vk::CommandBuffer>,
    fence: vk::Fence,
    finished: Option<FinishedCallback>,
}

#[derive(Default)]
struct Recorder {
    cmd: Option<vk::CommandBuffer>,
    waits: Vec<vk::Semaphore>,
    batches: Vec<Batch>,
    pending: Vec<Pending>,
    free_cmds: Vec<vk::CommandBuffer>,
    free_fences: Vec<vk::Fence>,
}

/// Instance, device and queue shared by every window.
///
/// Command recording, submission and presentation all go through the one
/// recorder lock, which also serializes access to the queue.
pub struct VkContext {
    entry: Entry,
    instance: Instance,
    surface_loader: surface::Instance,
    phys: vk::PhysicalDevice,
    device: ash::Device,
    queue_family: u32,
    queue: vk::Queue,
    swapchain_loader: swapchain::Device,
    cmd_pool: vk::CommandPool,
    recorder: Mutex<Recorder>,
}

unsafe fn create_instance(entry: &Entry, display_raw: RawDisplayHandle) -> Result<Instance, VkError> {
    let app = CString::new("pane").unwrap_or_default();

    let app_info = vk::ApplicationInfo {
        s_type: vk::StructureType::APPLICATION_INFO,
        p_application_name: app.as_ptr(),
        application_version: 0,
        p_engine_name: app.as_ptr(),
        engine_version: 0,
        api_version: vk::API_VERSION_1_1,
        ..Default::default()
    };

    let ext_slice = ash_window::enumerate_required_extensions(display_raw)
        .op("enumerate_required_extensions")?;
    let ext_vec = ext_slice.to_vec();

    let create_info = vk::InstanceCreateInfo {
        s_type: vk::StructureType::INSTANCE_CREATE_INFO,
        p_application_info: &app_info,
        enabled_extension_count: ext_vec.len() as u32,
        pp_enabled_extension_names: ext_vec.as_ptr(),
        ..Default::default()
    };

    entry.create_instance(&create_info, None).op("create_instance")
}

unsafe fn create_device(
    instance: &Instance,
    phys: vk::PhysicalDevice,
    queue_family: u32,
) -> Result<(ash::Device, vk::Queue), VkError> {
    let priorities = [1.0_f32];
    let qinfo = vk::DeviceQueueCreateInfo {
        s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
        queue_family_index: queue_family,
        queue_count: 1,
        p_queue_priorities: priorities.as_ptr(),
        ..Default::default()
    };

    let device_exts = [swapchain::NAME.as_ptr()];
    let dinfo = vk::DeviceCreateInfo {
        s_type: vk::StructureType::DEVICE_CREATE_INFO,
        queue_create_info_count: 1,
        p_queue_create_infos: &qinfo,
        enabled_extension_count: device_exts.len() as u32,
        pp_enabled_extension_names: device_exts.as_ptr(),
        ..Default::default()
    };

    let device = instance
        .create_device(phys, &dinfo, None)
        .op("create_device")?;
    let queue = device.get_device_queue(queue_family, 0);
    Ok((device, queue))
}

impl VkContext {
    /// Bootstrap Vulkan against the first window's surface.
    ///
    /// The device and queue family are chosen so they can present to that
    /// surface; later windows must be served by the same queue.
    pub fn new(
        window: &dyn HasWindowHandle,
        display: &dyn HasDisplayHandle,
    ) -> Result<(Arc<Self>, VkSurface), VkError> {
        let dh = display.display_handle()?.as_raw();
        let wh = window.window_handle()?.as_raw();

        unsafe {
            let entry = Entry::load()?;
            let instance = create_instance(&entry, dh)?;
            let surface_loader = surface::Instance::new(&entry, &instance);
            let raw_surface = match ash_window::create_surface(&entry, &instance, dh, wh, None) {
                Ok(s) => s,
                Err(result) => {
                    instance.destroy_instance(None);
                    return Err(VkError::Call {
                        op: "create_surface",
                        result,
                    });
                }
            };

            let selected = select_device_and_queue(&instance, &surface_loader, raw_surface)
                .and_then(|(phys, family)| {
                    let (device, queue) = create_device(&instance, phys, family)?;
                    let pool_info = vk::CommandPoolCreateInfo {
                        s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
                        flags: vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
                        queue_family_index: family,
                        ..Default::default()
                    };
                    match device.create_command_pool(&pool_info, None) {
                        Ok(pool) => Ok((phys, family, device, queue, pool)),
                        Err(result) => {
                            device.destroy_device(None);
                            Err(VkError::Call {
                                op: "create_command_pool",
                                result,
                            })
                        }
                    }
                });
            let (phys, queue_family, device, queue, cmd_pool) = match selected {
                Ok(v) => v,
                Err(e) => {
                    surface_loader.destroy_surface(raw_surface, None);
                    instance.destroy_instance(None);
                    return Err(e);
                }
            };

            let swapchain_loader = swapchain::Device::new(&instance, &device);
            let ctx = Arc::new(Self {
                entry,
                instance,
                surface_loader,
                phys,
                device,
                queue_family,
                queue,
                swapchain_loader,
                cmd_pool,
                recorder: Mutex::new(Recorder::default()),
            });
            info!("Vulkan context ready (queue family {queue_family})");
            let surface = VkSurface::from_raw(Arc::clone(&ctx), raw_surface);
            Ok((ctx, surface))
        }
    }

    /// Surface for a further window, checked against the selected queue.
    pub fn create_surface(
        self: &Arc<Self>,
        window: &dyn HasWindowHandle,
        display: &dyn HasDisplayHandle,
    ) -> Result<VkSurface, VkError> {
        let dh = display.display_handle()?.as_raw();
        let wh = window.window_handle()?.as_raw();
        unsafe {
            let raw = ash_window::create_surface(&self.entry, &self.instance, dh, wh, None)
                .op("create_surface")?;
            // Wrapped first so a failed check still destroys it.
            let surface = VkSurface::from_raw(Arc::clone(self), raw);
            check_present_support(&self.surface_loader, self.phys, self.queue_family, raw)?;
            Ok(surface)
        }
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn phys(&self) -> vk::PhysicalDevice {
        self.phys
    }

    pub fn surface_loader(&self) -> &surface::Instance {
        &self.surface_loader
    }

    pub fn swapchain_loader(&self) -> &swapchain::Device {
        &self.swapchain_loader
    }

    fn lock(&self) -> MutexGuard<'_, Recorder> {
        self.recorder.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    unsafe fn begin_cmd(&self, rec: &mut Recorder) -> Result<vk::CommandBuffer, VkError> {
        if let Some(cmd) = rec.cmd {
            return Ok(cmd);
        }
        let cmd = match rec.free_cmds.pop() {
            Some(cmd) => cmd,
            None => {
                let alloc_info = vk::CommandBufferAllocateInfo {
                    s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
                    command_pool: self.cmd_pool,
                    level: vk::CommandBufferLevel::PRIMARY,
                    command_buffer_count: 1,
                    ..Default::default()
                };
                self.device
                    .allocate_command_buffers(&alloc_info)
                    .op("allocate_command_buffers")?[0]
            }
        };
        let begin = vk::CommandBufferBeginInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
            flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            ..Default::default()
        };
        if let Err(result) = self.device.begin_command_buffer(cmd, &begin) {
            rec.free_cmds.push(cmd);
            return Err(VkError::Call {
                op: "begin_command_buffer",
                result,
            });
        }
        rec.cmd = Some(cmd);
        Ok(cmd)
    }

    /// Record into the open command buffer, opening one if needed.
    pub fn record<F>(&self, f: F) -> Result<(), VkError>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let mut rec = self.lock();
        let cmd = unsafe { self.begin_cmd(&mut rec)? };
        f(&self.device, cmd);
        Ok(())
    }

    /// The next flushed batch waits for `semaphore` before it executes.
    pub fn add_wait(&self, semaphore: vk::Semaphore) {
        self.lock().waits.push(semaphore);
    }

    unsafe fn take_fence(&self, rec: &mut Recorder) -> Result<vk::Fence, VkError> {
        if let Some(fence) = rec.free_fences.pop() {
            return Ok(fence);
        }
        let info = vk::FenceCreateInfo {
            s_type: vk::StructureType::FENCE_CREATE_INFO,
            ..Default::default()
        };
        self.device.create_fence(&info, None).op("create_fence")
    }

    /// Close the recorded commands and pending waits into a batch.
    ///
    /// `finished` runs once the batch completes on the GPU, or before this
    /// returns when nothing will be submitted.
    pub fn flush(&self, signal: Option<vk::Semaphore>, finished: Option<FinishedCallback>) -> FlushOutcome {
        let mut rec = self.lock();
        let cmd = rec.cmd.take();
        let closed = match cmd {
            Some(cmd) => unsafe { self.device.end_command_buffer(cmd) }.op("end_command_buffer"),
            None => Ok(()),
        };
        let fence = closed.and_then(|()| unsafe { self.take_fence(&mut rec) });
        match fence {
            Ok(fence) => {
                let waits = std::mem::take(&mut rec.waits);
                rec.batches.push(Batch {
                    cmd,
                    waits,
                    signal,
                    fence,
                    finished,
                });
                FlushOutcome::Submitted
            }
            Err(e) => {
                error!("flush dropped recorded work: {e}");
                if let Some(cmd) = cmd {
                    rec.free_cmds.push(cmd);
                }
                rec.waits.clear();
                drop(rec);
                if let Some(finished) = finished {
                    finished();
                }
                FlushOutcome::NotSubmitted
            }
        }
    }

    /// Hand every flushed batch to the queue.
    pub fn submit(&self) -> bool {
        let mut rec = self.lock();
        let batches = std::mem::take(&mut rec.batches);
        let mut ok = true;
        let mut orphaned = Vec::new();
        for batch in batches {
            let stages = vec![vk::PipelineStageFlags::ALL_COMMANDS; batch.waits.len()];
            let cmds: Vec<vk::CommandBuffer> = batch.cmd.into_iter().collect();
            let signals: Vec<vk::Semaphore> = batch.signal.into_iter().collect();
            let submit = vk::SubmitInfo {
                s_type: vk::StructureType::SUBMIT_INFO,
                wait_semaphore_count: batch.waits.len() as u32,
                p_wait_semaphores: batch.waits.as_ptr(),
                p_wait_dst_stage_mask: stages.as_ptr(),
                command_buffer_count: cmds.len() as u32,
                p_command_buffers: cmds.as_ptr(),
                signal_semaphore_count: signals.len() as u32,
                p_signal_semaphores: signals.as_ptr(),
                ..Default::default()
            };
            let result = unsafe {
                self.device
                    .queue_submit(self.queue, std::slice::from_ref(&submit), batch.fence)
            };
            match result {
                Ok(()) => rec.pending.push(Pending {
                    cmd: batch.cmd,
                    fence: batch.fence,
                    finished: batch.finished,
                }),
                Err(result) => {
                    error!("queue_submit failed: {result:?}");
                    ok = false;
                    rec.free_fences.push(batch.fence);
                    rec.free_cmds.extend(batch.cmd);
                    orphaned.extend(batch.finished);
                }
            }
        }
        drop(rec);
        for finished in orphaned {
            finished();
        }
        ok
    }

    /// Present under the queue lock.
    pub fn present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> Result<bool, vk::Result> {
        let _rec = self.lock();
        let present = vk::PresentInfoKHR {
            s_type: vk::StructureType::PRESENT_INFO_KHR,
            wait_semaphore_count: 1,
            p_wait_semaphores: &wait,
            swapchain_count: 1,
            p_swapchains: &swapchain,
            p_image_indices: &image_index,
            ..Default::default()
        };
        unsafe { self.swapchain_loader.queue_present(self.queue, &present) }
    }

    /// Run the callbacks of every batch the GPU has finished. Returns how many
    /// batches completed.
    pub fn poll_completions(&self) -> usize {
        let mut rec = self.lock();
        let mut done = Vec::new();
        let mut i = 0;
        while i < rec.pending.len() {
            let signalled = unsafe { self.device.get_fence_status(rec.pending[i].fence) };
            match signalled {
                Ok(true) => done.push(rec.pending.swap_remove(i)),
                Ok(false) => i += 1,
                Err(result) => {
                    // Device lost: nothing will signal any more.
                    warn!("get_fence_status failed: {result:?}");
                    done.push(rec.pending.swap_remove(i));
                }
            }
        }
        let mut callbacks = Vec::with_capacity(done.len());
        for p in done.iter_mut() {
            unsafe {
                if self.device.reset_fences(&[p.fence]).is_ok() {
                    rec.free_fences.push(p.fence);
                } else {
                    self.device.destroy_fence(p.fence, None);
                }
                if let Some(cmd) = p.cmd {
                    if self
                        .device
                        .reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())
                        .is_ok()
                    {
                        rec.free_cmds.push(cmd);
                    }
                }
            }
            callbacks.extend(p.finished.take());
        }
        drop(rec);
        let count = done.len();
        for finished in callbacks {
            finished();
        }
        if count > 0 {
            debug!("{count} batches completed");
        }
        count
    }

    /// Block until the device is idle, then run every pending callback.
    pub fn wait_idle(&self) {
        {
            let _rec = self.lock();
            if let Err(result) = unsafe { self.device.device_wait_idle() } {
                warn!("device_wait_idle failed: {result:?}");
            }
        }
        self.poll_completions();
    }

    pub fn pending_batches(&self) -> usize {
        self.lock().pending.len()
    }
}

/// Split flushed batches that never reached the queue into their fences and
/// callbacks. Nothing will signal those fences, so the callbacks must be run by
/// the caller.
fn take_unsubmitted(batches: &mut Vec<Batch>) -> (Vec<vk::Fence>, Vec<FinishedCallback>) {
    let mut fences = Vec::with_capacity(batches.len());
    let mut callbacks = Vec::new();
    for batch in batches.drain(..) {
        fences.push(batch.fence);
        callbacks.extend(batch.finished);
    }
    (fences, callbacks)
}

impl Drop for VkContext {
    fn drop(&mut self) {
        // Every surface and swapchain holds an Arc to this context, so only the
        // device-level objects remain here.
        self.wait_idle();
        let rec = self
            .recorder
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let (fences, unsubmitted) = take_unsubmitted(&mut rec.batches);
        unsafe {
            for fence in rec.free_fences.drain(..).chain(fences) {
                self.device.destroy_fence(fence, None);
            }
        }
        if !unsubmitted.is_empty() {
            debug!("running {} callbacks of unsubmitted batches", unsubmitted.len());
        }
        for finished in unsubmitted {
            finished();
        }
        unsafe {
            self.device.destroy_command_pool(self.cmd_pool, None);
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
        info!("Vulkan context destroyed");
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
