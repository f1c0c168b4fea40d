// SPDX-License-Identifier: CEPL-1.0
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::backend::{
    AcquireOutcome, CanvasOf, DrawSurface, FinishedCallback, FlushOutcome, GpuBackend,
    PresentOutcome,
};
use crate::error::{PresentError, SwapchainError};
use crate::reclaim::{DeferredReclaimer, PresenterId};
use crate::swapchain::{FrameSlot, Rebuilt, SwapchainBuilder, SwapchainState};
use crate::sync_pool::SyncPool;
use crate::types::{Extent2D, PresentMode, NO_IMAGE};

/// Draw callbacks receive the canvas of the acquired image.
pub type DrawHandler<B> = Box<dyn FnMut(&mut CanvasOf<B>) -> bool>;

/// Returned by [`Presenter::set_draw_handler`]; needed to remove that handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// One window's swapchain, frame slots, semaphores and frame pacing.
///
/// [`Presenter::draw`] is a step function: the caller's loop invokes it once
/// per tick and it either runs a whole acquire → draw → submit → present
/// sequence or returns without touching any state.
pub struct Presenter<B: GpuBackend> {
    id: PresenterId,
    reclaimer: DeferredReclaimer,
    builder: SwapchainBuilder,
    sync: SyncPool<B::Semaphore>,
    slots: Vec<FrameSlot<B>>,
    // `None` only while being torn down.
    state: Option<SwapchainState<B>>,
    /// The swapchain in `state` was retired by a failed rebuild.
    retired: bool,
    in_flight: Arc<AtomicUsize>,
    max_frames_enqueued: usize,
    current_image: u32,
    running: bool,
    handler: Option<(HandlerId, DrawHandler<B>)>,
    next_handler: u64,
    framebuffer: Extent2D,
    stale: bool,
    // Dropped last: everything above may hold objects created by it.
    backend: B,
}

impl<B: GpuBackend> Presenter<B> {
    pub fn new(backend: B, framebuffer: Extent2D) -> Result<Self, SwapchainError> {
        Self::with_reclaimer(backend, framebuffer, DeferredReclaimer::global())
    }

    /// Build the initial swapchain inline. On error nothing is left behind.
    pub fn with_reclaimer(
        mut backend: B,
        framebuffer: Extent2D,
        reclaimer: DeferredReclaimer,
    ) -> Result<Self, SwapchainError> {
        let id = PresenterId::next();
        info!("{id}: creating presenter ({})", framebuffer);
        let builder = SwapchainBuilder::new();
        let Rebuilt {
            state,
            slots,
            max_frames_enqueued,
        } = builder.rebuild(&mut backend, None, framebuffer)?;
        let mut sync = SyncPool::new();
        sync.ensure_capacity(state.image_count(), || backend.create_semaphore())?;
        info!(
            "{id}: presenter ready ({}, {} images, {})",
            state.extent,
            state.image_count(),
            state.present_mode
        );
        Ok(Self {
            id,
            reclaimer,
            builder,
            sync,
            slots,
            state: Some(state),
            retired: false,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_frames_enqueued,
            current_image: NO_IMAGE,
            running: true,
            handler: None,
            next_handler: 0,
            framebuffer,
            stale: false,
            backend,
        })
    }

    pub fn id(&self) -> PresenterId {
        self.id
    }

    /// Register the draw callback, replacing any previous one.
    pub fn set_draw_handler<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&mut CanvasOf<B>) -> bool + 'static,
    {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        if self.handler.replace((id, Box::new(handler))).is_some() {
            debug!("{}: draw handler replaced", self.id);
        }
        id
    }

    /// Remove the handler registered as `id`. Returns `false` if another handler
    /// (or none) is active.
    pub fn remove_draw_handler(&mut self, id: HandlerId) -> bool {
        match &self.handler {
            Some((active, _)) if *active == id => {
                self.handler = None;
                true
            }
            _ => false,
        }
    }

    pub fn has_draw_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Stop drawing from the next tick on. Idempotent.
    pub fn stop(&mut self) {
        if self.running {
            debug!("{}: stopping", self.id);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Record a new framebuffer size. The swapchain is rebuilt on the next tick;
    /// a zero-area size holds drawing until a usable size arrives.
    pub fn resize(&mut self, framebuffer: Extent2D) {
        if framebuffer == self.framebuffer && !self.stale {
            return;
        }
        debug!("{}: framebuffer resized to {}", self.id, framebuffer);
        self.framebuffer = framebuffer;
        self.stale = true;
    }

    /// Advance one frame tick.
    ///
    /// Skipped silently at the backpressure limit, without a draw handler, after
    /// [`Presenter::stop`], or while the framebuffer or the surface has no area.
    /// Only a failed present or a failed rebuild is reported; either way a stale
    /// swapchain is rebuilt again on the next tick.
    pub fn draw(&mut self) -> Result<(), PresentError> {
        if self.frames_in_flight() >= self.max_frames_enqueued {
            return Ok(());
        }
        if self.handler.is_none() || !self.running {
            return Ok(());
        }
        if self.stale && (self.framebuffer.is_empty() || !self.rebuild()?) {
            return Ok(());
        }

        if self.current_image == NO_IMAGE && !self.acquire() {
            return Ok(());
        }
        let index = self.current_image as usize;

        let Self {
            id,
            reclaimer,
            backend,
            slots,
            sync,
            state,
            in_flight,
            current_image,
            handler,
            ..
        } = self;
        let id = *id;
        let Some(state) = state.as_ref() else {
            return Ok(());
        };
        let slot = &mut slots[index];

        while !backend.wait(&mut slot.surface, sync.renderable(index)) {
            std::hint::spin_loop();
        }

        if let Some((_, draw)) = handler.as_mut() {
            let drawn = draw(slot.surface.canvas());
            trace!("{id}: draw handler returned {drawn}");
        }

        if backend.flush(Some(sync.rendered(index)), None) == FlushOutcome::NotSubmitted {
            error!("{id}: cannot flush semaphores to submit");
        }
        if !backend.submit() {
            error!("{id}: cannot submit semaphores to queue");
        }

        while !backend.wait(&mut slot.surface, sync.rendered(index)) {
            std::hint::spin_loop();
        }
        if !backend.set_present_layout(&slot.render_target) {
            error!("{id}: cannot transition image to present source");
        }

        // Counted before the flush: its completion callback may run immediately.
        in_flight.fetch_add(1, Ordering::SeqCst);
        let finished = completion_callback(id, in_flight, reclaimer);
        if backend.flush(Some(sync.presentable(index)), Some(finished)) == FlushOutcome::NotSubmitted {
            error!("{id}: cannot flush semaphores to submit");
        }
        if !backend.submit() {
            error!("{id}: cannot submit semaphores to queue");
        }

        let outcome = backend.present(&state.swapchain, *current_image, sync.presentable(index));
        *current_image = NO_IMAGE;
        match outcome {
            PresentOutcome::Success => Ok(()),
            PresentOutcome::Suboptimal | PresentOutcome::OutOfDate => {
                debug!("{id}: present reported {:?}, rebuilding swapchain", outcome);
                self.stale = true;
                self.rebuild()?;
                Ok(())
            }
            PresentOutcome::Failed(err) => {
                error!("{id}: cannot present image ({err})");
                Err(PresentError::Present(err))
            }
        }
    }

    fn acquire(&mut self) -> bool {
        let Some(state) = &self.state else {
            return false;
        };
        let outcome = self
            .backend
            .acquire_next_image(&state.swapchain, 0, self.sync.next_renderable());
        match outcome {
            AcquireOutcome::Acquired { index, suboptimal } => {
                if index as usize >= self.slots.len() {
                    warn!("{}: acquired image {} outside swapchain of {}", self.id, index, self.slots.len());
                    return false;
                }
                if suboptimal {
                    trace!("{}: acquired image {} from a suboptimal swapchain", self.id, index);
                }
                self.sync.rotate_renderable(index as usize);
                self.current_image = index;
                true
            }
            AcquireOutcome::NotReady => {
                trace!("{}: no image ready", self.id);
                false
            }
            AcquireOutcome::OutOfDate => {
                debug!("{}: acquire reported out of date swapchain", self.id);
                false
            }
            AcquireOutcome::Failed(err) => {
                warn!("{}: cannot acquire image ({err})", self.id);
                false
            }
        }
    }

    /// Replace the swapchain and frame slots, growing the semaphore pools.
    ///
    /// Returns `Ok(false)` without touching the device when the surface
    /// currently has no area. The presenter stays stale until a rebuild
    /// completes, so any failure is retried on the next tick.
    pub fn rebuild(&mut self) -> Result<bool, SwapchainError> {
        self.stale = true;
        let desc = self.builder.select(&self.backend, self.framebuffer)?;
        if desc.extent.is_empty() {
            debug!("{}: surface has no area, holding swapchain", self.id);
            return Ok(false);
        }

        info!("{}: recreating swapchain ({})", self.id, desc.extent);
        self.backend.wait_idle();
        // A retired swapchain cannot be chained from again.
        let previous = match &self.state {
            Some(state) if !self.retired => Some(&state.swapchain),
            _ => None,
        };
        let Rebuilt {
            state,
            slots,
            max_frames_enqueued,
        } = match self.builder.build(&mut self.backend, &desc, previous) {
            Ok(rebuilt) => rebuilt,
            Err(e) => {
                self.retired = true;
                return Err(e);
            }
        };

        // Old views go before the swapchain owning their images.
        self.slots = slots;
        let image_count = state.image_count();
        self.state = Some(state);
        self.retired = false;
        self.max_frames_enqueued = max_frames_enqueued;
        self.current_image = NO_IMAGE;

        let backend = &mut self.backend;
        self.sync.ensure_capacity(image_count, || backend.create_semaphore())?;
        self.stale = false;
        debug!("{}: max frames {}", self.id, self.max_frames_enqueued);
        Ok(true)
    }

    pub fn frames_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_frames_enqueued(&self) -> usize {
        self.max_frames_enqueued
    }

    /// Index of the held swapchain image, or [`NO_IMAGE`].
    pub fn current_image(&self) -> u32 {
        self.current_image
    }

    pub fn image_count(&self) -> usize {
        self.slots.len()
    }

    pub fn extent(&self) -> Extent2D {
        self.state.as_ref().map_or_else(Extent2D::default, |s| s.extent)
    }

    pub fn present_mode(&self) -> PresentMode {
        self.state.as_ref().map_or(PresentMode::Fifo, |s| s.present_mode)
    }

    pub fn swapchain(&self) -> Option<&B::Swapchain> {
        self.state.as_ref().map(|s| &s.swapchain)
    }

    /// Whether the next tick rebuilds the swapchain before drawing.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn sync_pool(&self) -> &SyncPool<B::Semaphore> {
        &self.sync
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

fn completion_callback(
    id: PresenterId,
    in_flight: &Arc<AtomicUsize>,
    reclaimer: &DeferredReclaimer,
) -> FinishedCallback {
    let in_flight = Arc::clone(in_flight);
    let reclaimer = reclaimer.clone();
    Box::new(move || {
        let before = in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or(0);
        if before <= 1 {
            reclaimer.reclaim(id);
        }
    })
}

/// Everything the GPU may still touch after the presenter is gone, in drop
/// order: draw surfaces and render targets before the swapchain owning their
/// images, semaphores last.
fn into_parked<B: GpuBackend>(
    slots: Vec<FrameSlot<B>>,
    state: Option<SwapchainState<B>>,
    sync: SyncPool<B::Semaphore>,
) -> Vec<Box<dyn Any + Send>> {
    let mut parked: Vec<Box<dyn Any + Send>> = Vec::with_capacity(slots.len() * 2 + 1 + sync.total());
    for slot in slots {
        parked.push(Box::new(slot.surface));
        parked.push(Box::new(slot.render_target));
    }
    if let Some(state) = state {
        parked.push(Box::new(state.swapchain));
    }
    parked.extend(sync.into_parked());
    parked
}

impl<B: GpuBackend> Drop for Presenter<B> {
    fn drop(&mut self) {
        info!("{}: destroying presenter", self.id);
        let in_flight = self.frames_in_flight();
        let slots = std::mem::take(&mut self.slots);
        let state = self.state.take();
        let sync = std::mem::take(&mut self.sync);
        if self.running || in_flight > 0 {
            debug!(
                "{}: deferring swapchain and semaphores (running: {}, frames_enqueued: {})",
                self.id, self.running, in_flight
            );
            self.reclaimer.park(self.id, into_parked(slots, state, sync));
            if self.frames_in_flight() == 0 {
                // No completion is on its way; queue one so the entry is released.
                let reclaimer = self.reclaimer.clone();
                let id = self.id;
                let release: FinishedCallback = Box::new(move || reclaimer.reclaim(id));
                if self.backend.flush(None, Some(release)) == FlushOutcome::NotSubmitted {
                    warn!("{}: cannot flush reclamation marker", self.id);
                }
                if !self.backend.submit() {
                    warn!("{}: cannot submit reclamation marker", self.id);
                }
            }
        } else {
            drop(slots);
            drop(state);
            drop(sync);
        }
        info!("{}: destroyed presenter", self.id);
    }
}

#[cfg(test)]
#[path = "pacer_tests.rs"]
mod tests;
