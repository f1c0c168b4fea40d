// SPDX-License-Identifier: CEPL-1.0
//! Scriptable backend for unit tests (no GPU required).
//!
//! Everything observable lives in a shared [`MockProbe`], so tests can inspect
//! calls and fire completion callbacks after the presenter owning the backend
//! has been dropped.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::{
    AcquireOutcome, DrawSurface, FinishedCallback, FlushOutcome, GpuBackend, PresentOutcome,
};
use crate::error::BackendError;
use crate::types::{
    ColorSpace, Extent2D, Format, PresentMode, RenderTargetDesc, SurfaceCapabilities,
    SurfaceFormat, SwapchainDesc,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    WaitIdle,
    CreateSwapchain { id: u64, previous: Option<u64> },
    Acquire { semaphore: u64 },
    Wait { semaphore: u64 },
    Flush { signal: Option<u64>, finished: bool },
    Submit,
    Transition { image: u64 },
    Present { image_index: u32, wait: u64 },
}

#[derive(Default)]
pub struct MockProbe {
    pub calls: Mutex<Vec<Call>>,
    pub pending: Mutex<Vec<FinishedCallback>>,
    pub live_semaphores: AtomicUsize,
    pub live_swapchains: AtomicUsize,
    pub wait_polls: AtomicUsize,
}

impl MockProbe {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Fire the oldest pending completion callback.
    pub fn complete_next(&self) -> bool {
        let next = {
            let mut pending = self.pending.lock().unwrap();
            if pending.is_empty() {
                None
            } else {
                Some(pending.remove(0))
            }
        };
        match next {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn complete_all(&self) {
        while self.complete_next() {}
    }

    pub fn live_semaphores(&self) -> usize {
        self.live_semaphores.load(Ordering::SeqCst)
    }

    pub fn live_swapchains(&self) -> usize {
        self.live_swapchains.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct MockSwapchain {
    pub id: u64,
    pub previous: Option<u64>,
    pub desc: SwapchainDesc,
    live: Arc<MockProbe>,
}

impl fmt::Debug for MockSwapchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSwapchain")
            .field("id", &self.id)
            .field("previous", &self.previous)
            .field("desc", &self.desc)
            .finish()
    }
}

impl Drop for MockSwapchain {
    fn drop(&mut self) {
        self.live.live_swapchains.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct MockRenderTarget {
    pub image: u64,
    pub desc: RenderTargetDesc,
}

#[derive(Debug, Default)]
pub struct MockCanvas {
    pub draws: u32,
}

#[derive(Debug)]
pub struct MockSurface {
    pub image: u64,
    pub canvas: MockCanvas,
}

impl DrawSurface for MockSurface {
    type Canvas = MockCanvas;

    fn canvas(&mut self) -> &mut MockCanvas {
        &mut self.canvas
    }
}

pub struct MockSemaphore {
    pub id: u64,
    live: Arc<MockProbe>,
}

impl Drop for MockSemaphore {
    fn drop(&mut self) {
        self.live.live_semaphores.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MockBackend {
    pub probe: Arc<MockProbe>,
    pub caps: SurfaceCapabilities,
    pub formats: Vec<SurfaceFormat>,
    pub modes: Vec<PresentMode>,
    /// Overrides the image count the driver hands back; `None` uses the request.
    pub image_count_override: Option<u32>,
    /// Image index whose surface cannot be wrapped.
    pub fail_surface_at: Option<usize>,
    /// Fail `create_swapchain` (the previous one is retired regardless).
    pub fail_create_swapchain: bool,
    /// Semaphore creations left before `create_semaphore` fails.
    pub semaphore_budget: Option<usize>,
    pub acquire_script: VecDeque<AcquireOutcome>,
    pub present_script: VecDeque<PresentOutcome>,
    /// How many times each wait reports "not yet" before succeeding.
    pub wait_misses: usize,
    pub flush_outcome: FlushOutcome,
    pub submit_ok: bool,
    pub transition_ok: bool,
    next_id: u64,
    next_image: u32,
    image_count: u32,
    misses_so_far: usize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_caps(2, 3)
    }

    pub fn with_caps(min_image_count: u32, max_image_count: u32) -> Self {
        Self {
            probe: Arc::new(MockProbe::default()),
            caps: SurfaceCapabilities {
                min_image_count,
                max_image_count,
                min_image_extent: Extent2D::new(1, 1),
                max_image_extent: Extent2D::new(4096, 4096),
            },
            formats: vec![
                SurfaceFormat {
                    format: Format::B8G8R8A8_SRGB,
                    color_space: ColorSpace::SrgbNonlinear,
                },
                SurfaceFormat::PREFERRED,
            ],
            modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
            image_count_override: None,
            fail_surface_at: None,
            fail_create_swapchain: false,
            semaphore_budget: None,
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            wait_misses: 0,
            flush_outcome: FlushOutcome::Submitted,
            submit_ok: true,
            transition_ok: true,
            next_id: 1,
            next_image: 0,
            image_count: 0,
            misses_so_far: 0,
        }
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GpuBackend for MockBackend {
    type Swapchain = MockSwapchain;
    type Image = u64;
    type RenderTarget = MockRenderTarget;
    type Surface = MockSurface;
    type Semaphore = MockSemaphore;

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities, BackendError> {
        Ok(self.caps)
    }

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>, BackendError> {
        Ok(self.formats.clone())
    }

    fn present_modes(&self) -> Result<Vec<PresentMode>, BackendError> {
        Ok(self.modes.clone())
    }

    fn wait_idle(&mut self) {
        self.probe.record(Call::WaitIdle);
        self.probe.complete_all();
    }

    fn create_swapchain(
        &mut self,
        desc: &SwapchainDesc,
        previous: Option<&MockSwapchain>,
    ) -> Result<MockSwapchain, BackendError> {
        let id = self.fresh_id();
        let previous = previous.map(|p| p.id);
        self.probe.record(Call::CreateSwapchain { id, previous });
        if self.fail_create_swapchain {
            return Err(BackendError::new("create_swapchain", "surface lost"));
        }
        self.image_count = self.image_count_override.unwrap_or(desc.min_image_count);
        self.next_image = 0;
        self.probe.live_swapchains.fetch_add(1, Ordering::SeqCst);
        Ok(MockSwapchain {
            id,
            previous,
            desc: *desc,
            live: Arc::clone(&self.probe),
        })
    }

    fn swapchain_images(&self, swapchain: &MockSwapchain) -> Result<Vec<u64>, BackendError> {
        Ok((0..self.image_count as u64)
            .map(|i| swapchain.id * 100 + i)
            .collect())
    }

    fn create_render_target(&mut self, image: u64, desc: &RenderTargetDesc) -> MockRenderTarget {
        MockRenderTarget { image, desc: *desc }
    }

    fn create_draw_surface(&mut self, target: &MockRenderTarget) -> Option<MockSurface> {
        let index = (target.image % 100) as usize;
        if self.fail_surface_at == Some(index) {
            return None;
        }
        Some(MockSurface {
            image: target.image,
            canvas: MockCanvas::default(),
        })
    }

    fn create_semaphore(&mut self) -> Result<MockSemaphore, BackendError> {
        if let Some(budget) = self.semaphore_budget.as_mut() {
            if *budget == 0 {
                return Err(BackendError::new("create_semaphore", "out of memory"));
            }
            *budget -= 1;
        }
        let id = self.fresh_id();
        self.probe.live_semaphores.fetch_add(1, Ordering::SeqCst);
        Ok(MockSemaphore {
            id,
            live: Arc::clone(&self.probe),
        })
    }

    fn acquire_next_image(
        &mut self,
        _swapchain: &MockSwapchain,
        _timeout_ns: u64,
        signal: &MockSemaphore,
    ) -> AcquireOutcome {
        self.probe.record(Call::Acquire { semaphore: signal.id });
        if let Some(outcome) = self.acquire_script.pop_front() {
            return outcome;
        }
        let index = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count.max(1);
        AcquireOutcome::Acquired {
            index,
            suboptimal: false,
        }
    }

    fn wait(&mut self, _surface: &mut MockSurface, semaphore: &MockSemaphore) -> bool {
        self.probe.wait_polls.fetch_add(1, Ordering::SeqCst);
        if self.misses_so_far < self.wait_misses {
            self.misses_so_far += 1;
            return false;
        }
        self.misses_so_far = 0;
        self.probe.record(Call::Wait { semaphore: semaphore.id });
        true
    }

    fn flush(&mut self, signal: Option<&MockSemaphore>, finished: Option<FinishedCallback>) -> FlushOutcome {
        self.probe.record(Call::Flush {
            signal: signal.map(|s| s.id),
            finished: finished.is_some(),
        });
        if let Some(callback) = finished {
            if self.flush_outcome == FlushOutcome::NotSubmitted {
                callback();
            } else {
                self.probe.pending.lock().unwrap().push(callback);
            }
        }
        self.flush_outcome
    }

    fn submit(&mut self) -> bool {
        self.probe.record(Call::Submit);
        self.submit_ok
    }

    fn set_present_layout(&mut self, target: &MockRenderTarget) -> bool {
        self.probe.record(Call::Transition { image: target.image });
        self.transition_ok
    }

    fn present(&mut self, _swapchain: &MockSwapchain, image_index: u32, wait: &MockSemaphore) -> PresentOutcome {
        self.probe.record(Call::Present {
            image_index,
            wait: wait.id,
        });
        self.present_script
            .pop_front()
            .unwrap_or(PresentOutcome::Success)
    }
}
