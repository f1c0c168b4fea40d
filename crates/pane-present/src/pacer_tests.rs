// SPDX-License-Identifier: CEPL-1.0
//! Unit tests for pacer.rs
//!
//! Every test drives a `Presenter` over the scriptable mock backend. The mock
//! hands out ids from one counter: swapchain #1 is created first, followed by
//! semaphores 2..=5 (renderable), 6..=8 (rendered) and 9..=11 (presentable).

use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::error::BackendError;
use crate::mock_backend::{Call, MockBackend, MockCanvas, MockProbe};
use crate::types::{ColorSpace, Format, SurfaceFormat};
use serial_test::serial;

fn setup(backend: MockBackend) -> (Presenter<MockBackend>, Arc<MockProbe>, DeferredReclaimer) {
    let probe = Arc::clone(&backend.probe);
    let reclaimer = DeferredReclaimer::new();
    let presenter =
        Presenter::with_reclaimer(backend, Extent2D::new(640, 480), reclaimer.clone()).unwrap();
    probe.clear_calls();
    (presenter, probe, reclaimer)
}

fn counting_handler(presenter: &mut Presenter<MockBackend>) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let seen = Rc::clone(&count);
    presenter.set_draw_handler(move |canvas: &mut MockCanvas| {
        canvas.draws += 1;
        seen.set(seen.get() + 1);
        true
    });
    count
}

fn presents(probe: &MockProbe) -> usize {
    probe.count(|c| matches!(c, Call::Present { .. }))
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_new_builds_swapchain_and_pools() {
    let (presenter, probe, _reclaimer) = setup(MockBackend::with_caps(2, 3));

    assert_eq!(presenter.image_count(), 3);
    assert_eq!(presenter.max_frames_enqueued(), 2);
    assert_eq!(presenter.sync_pool().lens(), (4, 3, 3));
    assert_eq!(probe.live_semaphores(), 10);
    assert_eq!(presenter.current_image(), NO_IMAGE);
    assert_eq!(presenter.frames_in_flight(), 0);
    assert_eq!(presenter.extent(), Extent2D::new(640, 480));
    assert_eq!(presenter.present_mode(), PresentMode::Mailbox);
    assert!(presenter.is_running());
    assert!(!presenter.has_draw_handler());
}

#[test]
fn test_new_fails_without_preferred_format() {
    let mut backend = MockBackend::new();
    backend.formats = vec![SurfaceFormat {
        format: Format::R8G8B8A8_SRGB,
        color_space: ColorSpace::SrgbNonlinear,
    }];
    let probe = Arc::clone(&backend.probe);
    let reclaimer = DeferredReclaimer::new();

    let result = Presenter::with_reclaimer(backend, Extent2D::new(64, 64), reclaimer.clone());

    assert_eq!(result.err(), Some(SwapchainError::UnsupportedSurfaceFormat));
    assert_eq!(probe.live_semaphores(), 0);
    assert!(reclaimer.is_empty());
}

#[test]
fn test_presenter_ids_differ() {
    let (a, _, _) = setup(MockBackend::new());
    let (b, _, _) = setup(MockBackend::new());
    assert_ne!(a.id(), b.id());
}

// ============================================================================
// NO-OP TICKS
// ============================================================================

#[test]
fn test_draw_without_handler_is_noop() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());

    presenter.draw().unwrap();

    assert!(probe.calls().is_empty());
    assert_eq!(presenter.current_image(), NO_IMAGE);
}

#[test]
fn test_draw_after_stop_is_noop() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    let count = counting_handler(&mut presenter);

    presenter.stop();
    presenter.stop();
    presenter.draw().unwrap();

    assert!(!presenter.is_running());
    assert!(probe.calls().is_empty());
    assert_eq!(count.get(), 0);
}

#[test]
fn test_handler_replace_and_remove() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    let first = presenter.set_draw_handler(|_: &mut MockCanvas| true);
    let second = presenter.set_draw_handler(|_: &mut MockCanvas| true);
    assert_ne!(first, second);

    assert!(!presenter.remove_draw_handler(first));
    assert!(presenter.has_draw_handler());
    assert!(presenter.remove_draw_handler(second));
    assert!(!presenter.has_draw_handler());
    assert!(!presenter.remove_draw_handler(second));

    presenter.draw().unwrap();
    assert!(probe.calls().is_empty());
}

#[test]
fn test_replaced_handler_is_not_called() {
    let (mut presenter, _probe, _reclaimer) = setup(MockBackend::new());
    let old = counting_handler(&mut presenter);
    let new = counting_handler(&mut presenter);

    presenter.draw().unwrap();

    assert_eq!(old.get(), 0);
    assert_eq!(new.get(), 1);
}

// ============================================================================
// FRAME SEQUENCE
// ============================================================================

#[test]
fn test_draw_call_sequence() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    let count = counting_handler(&mut presenter);

    presenter.draw().unwrap();

    assert_eq!(
        probe.calls(),
        vec![
            Call::Acquire { semaphore: 5 },
            Call::Wait { semaphore: 5 },
            Call::Flush { signal: Some(6), finished: false },
            Call::Submit,
            Call::Wait { semaphore: 6 },
            Call::Transition { image: 100 },
            Call::Flush { signal: Some(9), finished: true },
            Call::Submit,
            Call::Present { image_index: 0, wait: 9 },
        ]
    );
    assert_eq!(count.get(), 1);
    assert_eq!(presenter.current_image(), NO_IMAGE);
    assert_eq!(presenter.frames_in_flight(), 1);
}

#[test]
fn test_spare_renderable_rotates_between_frames() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);

    presenter.draw().unwrap();
    probe.clear_calls();
    presenter.draw().unwrap();

    // Slot 0 kept semaphore 5; the old occupant (2) became the spare.
    assert_eq!(presenter.sync_pool().renderable(0).id, 5);
    assert_eq!(
        probe.calls(),
        vec![
            Call::Acquire { semaphore: 2 },
            Call::Wait { semaphore: 2 },
            Call::Flush { signal: Some(7), finished: false },
            Call::Submit,
            Call::Wait { semaphore: 7 },
            Call::Transition { image: 101 },
            Call::Flush { signal: Some(10), finished: true },
            Call::Submit,
            Call::Present { image_index: 1, wait: 10 },
        ]
    );
}

#[test]
fn test_handler_return_value_does_not_skip_present() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    presenter.set_draw_handler(|_: &mut MockCanvas| false);

    presenter.draw().unwrap();

    assert_eq!(presents(&probe), 1);
}

#[test]
fn test_wait_spins_until_scheduled() {
    let mut backend = MockBackend::new();
    backend.wait_misses = 3;
    let (mut presenter, probe, _reclaimer) = setup(backend);
    counting_handler(&mut presenter);

    presenter.draw().unwrap();

    assert_eq!(probe.wait_polls.load(Ordering::SeqCst), 8);
    assert_eq!(probe.count(|c| matches!(c, Call::Wait { .. })), 2);
    assert_eq!(presents(&probe), 1);
}

// ============================================================================
// ACQUIRE
// ============================================================================

#[test]
fn test_acquire_not_ready_retries_next_tick() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    let count = counting_handler(&mut presenter);
    presenter
        .backend_mut()
        .acquire_script
        .push_back(AcquireOutcome::NotReady);

    presenter.draw().unwrap();

    assert_eq!(probe.calls(), vec![Call::Acquire { semaphore: 5 }]);
    assert_eq!(presenter.current_image(), NO_IMAGE);
    assert_eq!(presenter.frames_in_flight(), 0);
    assert_eq!(count.get(), 0);

    presenter.draw().unwrap();
    assert_eq!(probe.count(|c| *c == Call::Acquire { semaphore: 5 }), 2);
    assert_eq!(presents(&probe), 1);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_acquire_errors_skip_the_frame() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);
    let script = &mut presenter.backend_mut().acquire_script;
    script.push_back(AcquireOutcome::OutOfDate);
    script.push_back(AcquireOutcome::Failed(BackendError::new("acquire", "device lost")));
    script.push_back(AcquireOutcome::Acquired {
        index: 7,
        suboptimal: false,
    });

    for _ in 0..3 {
        presenter.draw().unwrap();
        assert_eq!(presenter.current_image(), NO_IMAGE);
    }

    assert_eq!(probe.count(|c| matches!(c, Call::Acquire { .. })), 3);
    assert_eq!(presents(&probe), 0);
    assert_eq!(presenter.frames_in_flight(), 0);
}

#[test]
fn test_suboptimal_acquire_still_draws() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);
    presenter
        .backend_mut()
        .acquire_script
        .push_back(AcquireOutcome::Acquired {
            index: 2,
            suboptimal: true,
        });

    presenter.draw().unwrap();

    assert!(probe.calls().contains(&Call::Present { image_index: 2, wait: 11 }));
}

// ============================================================================
// BACKPRESSURE
// ============================================================================

#[test]
fn test_backpressure_limits_frames_in_flight() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::with_caps(2, 3));
    counting_handler(&mut presenter);

    for _ in 0..3 {
        presenter.draw().unwrap();
    }
    assert_eq!(presents(&probe), 2);
    assert_eq!(presenter.frames_in_flight(), 2);

    probe.clear_calls();
    presenter.draw().unwrap();
    assert!(probe.calls().is_empty());

    assert!(probe.complete_next());
    assert_eq!(presenter.frames_in_flight(), 1);
    presenter.draw().unwrap();
    assert_eq!(presents(&probe), 1);
    assert_eq!(presenter.frames_in_flight(), 2);
}

#[test]
fn test_counter_tracks_completions() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);

    presenter.draw().unwrap();
    presenter.draw().unwrap();
    assert_eq!(probe.pending_len(), 2);

    probe.complete_all();
    assert_eq!(presenter.frames_in_flight(), 0);
}

#[test]
fn test_unsubmitted_flush_still_presents() {
    let mut backend = MockBackend::new();
    backend.flush_outcome = FlushOutcome::NotSubmitted;
    backend.submit_ok = false;
    backend.transition_ok = false;
    let (mut presenter, probe, _reclaimer) = setup(backend);
    counting_handler(&mut presenter);

    presenter.draw().unwrap();

    assert_eq!(presents(&probe), 1);
    assert_eq!(probe.pending_len(), 0);
    assert_eq!(presenter.frames_in_flight(), 0);
}

// ============================================================================
// PRESENT RESULTS AND REBUILDS
// ============================================================================

#[test]
fn test_suboptimal_present_rebuilds_before_next_acquire() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);
    presenter
        .backend_mut()
        .present_script
        .push_back(PresentOutcome::Suboptimal);

    presenter.draw().unwrap();
    presenter.draw().unwrap();

    let calls = probe.calls();
    let present = calls
        .iter()
        .position(|c| matches!(c, Call::Present { .. }))
        .unwrap();
    assert_eq!(calls[present + 1], Call::WaitIdle);
    assert_eq!(
        calls[present + 2],
        Call::CreateSwapchain {
            id: 12,
            previous: Some(1)
        }
    );
    assert!(matches!(calls[present + 3], Call::Acquire { .. }));
    assert!(calls.contains(&Call::Transition { image: 1200 }));
    assert_eq!(presenter.swapchain().unwrap().id, 12);
}

#[test]
fn test_out_of_date_present_rebuilds() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);
    presenter
        .backend_mut()
        .present_script
        .push_back(PresentOutcome::OutOfDate);

    presenter.draw().unwrap();

    assert_eq!(probe.count(|c| matches!(c, Call::CreateSwapchain { .. })), 1);
    assert_eq!(presenter.current_image(), NO_IMAGE);
    // wait_idle drained the frame that was just queued.
    assert_eq!(presenter.frames_in_flight(), 0);
    // Same image count, so no new semaphores.
    assert_eq!(probe.live_semaphores(), 10);
}

#[test]
fn test_present_failure_is_reported() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);
    let lost = BackendError::new("present", "device lost");
    presenter
        .backend_mut()
        .present_script
        .push_back(PresentOutcome::Failed(lost.clone()));

    assert_eq!(presenter.draw(), Err(PresentError::Present(lost)));
    assert_eq!(presenter.current_image(), NO_IMAGE);
    assert_eq!(presenter.frames_in_flight(), 1);
    assert_eq!(probe.count(|c| matches!(c, Call::CreateSwapchain { .. })), 0);
}

#[test]
fn test_rebuild_grows_pools_and_keeps_handles() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::with_caps(2, 8));
    let pool = presenter.sync_pool();
    let before: Vec<u64> = (0..4)
        .map(|i| pool.renderable(i).id)
        .chain((0..3).map(|i| pool.rendered(i).id))
        .chain((0..3).map(|i| pool.presentable(i).id))
        .collect();

    presenter.backend_mut().image_count_override = Some(5);
    presenter.rebuild().unwrap();
    assert_eq!(presenter.image_count(), 5);
    assert_eq!(presenter.max_frames_enqueued(), 4);
    assert_eq!(presenter.sync_pool().lens(), (6, 5, 5));

    presenter.backend_mut().image_count_override = Some(2);
    presenter.rebuild().unwrap();
    assert_eq!(presenter.image_count(), 2);
    assert_eq!(presenter.max_frames_enqueued(), 1);
    assert_eq!(presenter.sync_pool().lens(), (6, 5, 5));

    let pool = presenter.sync_pool();
    let after: Vec<u64> = (0..4)
        .map(|i| pool.renderable(i).id)
        .chain((0..3).map(|i| pool.rendered(i).id))
        .chain((0..3).map(|i| pool.presentable(i).id))
        .collect();
    assert_eq!(before, after);
    assert_eq!(probe.live_semaphores(), 16);
    assert_eq!(
        probe.count(|c| matches!(c, Call::CreateSwapchain { previous: Some(_), .. })),
        2
    );
}

// ============================================================================
// RESIZE
// ============================================================================

#[test]
fn test_resize_rebuilds_on_next_tick() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);

    presenter.resize(Extent2D::new(800, 600));
    assert!(probe.calls().is_empty());

    presenter.draw().unwrap();

    let calls = probe.calls();
    assert_eq!(calls[0], Call::WaitIdle);
    assert_eq!(
        calls[1],
        Call::CreateSwapchain {
            id: 12,
            previous: Some(1)
        }
    );
    assert!(matches!(calls[2], Call::Acquire { .. }));
    assert_eq!(presenter.extent(), Extent2D::new(800, 600));
    assert_eq!(presents(&probe), 1);
}

#[test]
fn test_resize_to_same_size_is_ignored() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);

    presenter.resize(Extent2D::new(640, 480));
    presenter.draw().unwrap();

    assert_eq!(probe.count(|c| matches!(c, Call::CreateSwapchain { .. })), 0);
}

#[test]
fn test_zero_area_suspends_drawing() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    let count = counting_handler(&mut presenter);

    presenter.resize(Extent2D::new(0, 0));
    presenter.draw().unwrap();
    presenter.draw().unwrap();
    assert!(probe.calls().is_empty());
    assert_eq!(count.get(), 0);

    presenter.resize(Extent2D::new(320, 200));
    presenter.draw().unwrap();
    assert_eq!(presenter.extent(), Extent2D::new(320, 200));
    assert_eq!(count.get(), 1);
}

#[test]
fn test_failed_rebuild_keeps_previous_swapchain() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);
    presenter.backend_mut().formats.clear();

    presenter.resize(Extent2D::new(800, 600));
    assert_eq!(
        presenter.draw(),
        Err(PresentError::Rebuild(SwapchainError::UnsupportedSurfaceFormat))
    );
    assert_eq!(presenter.swapchain().unwrap().id, 1);
    assert_eq!(presenter.extent(), Extent2D::new(640, 480));
    assert_eq!(presents(&probe), 0);

    presenter.backend_mut().formats.push(SurfaceFormat::PREFERRED);
    presenter.draw().unwrap();
    assert_eq!(presenter.extent(), Extent2D::new(800, 600));
    assert_eq!(presents(&probe), 1);
}

#[test]
fn test_failed_present_rebuild_retries_next_tick() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);
    presenter.backend_mut().formats.clear();
    presenter
        .backend_mut()
        .present_script
        .push_back(PresentOutcome::OutOfDate);

    assert_eq!(
        presenter.draw(),
        Err(PresentError::Rebuild(SwapchainError::UnsupportedSurfaceFormat))
    );
    assert!(presenter.is_stale());
    assert_eq!(presenter.swapchain().unwrap().id, 1);

    presenter.backend_mut().formats.push(SurfaceFormat::PREFERRED);
    presenter.draw().unwrap();

    assert!(!presenter.is_stale());
    assert!(probe.calls().contains(&Call::CreateSwapchain {
        id: 12,
        previous: Some(1)
    }));
    assert_eq!(presenter.swapchain().unwrap().id, 12);
    assert_eq!(presents(&probe), 2);
}

#[test]
fn test_failed_creation_does_not_chain_retired_swapchain() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);
    presenter.backend_mut().fail_create_swapchain = true;
    presenter
        .backend_mut()
        .present_script
        .push_back(PresentOutcome::Suboptimal);

    assert!(matches!(
        presenter.draw(),
        Err(PresentError::Rebuild(SwapchainError::Backend(_)))
    ));
    assert!(presenter.is_stale());

    presenter.backend_mut().fail_create_swapchain = false;
    presenter.draw().unwrap();

    let created: Vec<Call> = probe
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::CreateSwapchain { .. }))
        .collect();
    assert_eq!(
        created,
        vec![
            Call::CreateSwapchain {
                id: 12,
                previous: Some(1)
            },
            Call::CreateSwapchain {
                id: 13,
                previous: None
            },
        ]
    );
    assert_eq!(probe.live_swapchains(), 1);
    assert_eq!(presents(&probe), 2);
}

#[test]
fn test_pool_growth_failure_keeps_new_swapchain() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::with_caps(2, 8));
    counting_handler(&mut presenter);
    presenter.backend_mut().image_count_override = Some(5);
    presenter.backend_mut().semaphore_budget = Some(1);

    presenter.resize(Extent2D::new(800, 600));
    assert!(matches!(
        presenter.draw(),
        Err(PresentError::Rebuild(SwapchainError::Backend(_)))
    ));
    assert!(presenter.is_stale());
    assert_eq!(presenter.swapchain().unwrap().id, 12);
    assert_eq!(presents(&probe), 0);

    presenter.backend_mut().semaphore_budget = None;
    presenter.draw().unwrap();

    // Id 13 went to the one semaphore created before the failure.
    assert!(probe.calls().contains(&Call::CreateSwapchain {
        id: 14,
        previous: Some(12)
    }));
    assert_eq!(presenter.sync_pool().lens(), (6, 5, 5));
    assert_eq!(probe.live_swapchains(), 1);
    assert_eq!(presents(&probe), 1);
}

#[test]
fn test_present_rebuild_holds_at_zero_area_surface() {
    let (mut presenter, probe, _reclaimer) = setup(MockBackend::new());
    let count = counting_handler(&mut presenter);
    let caps = presenter.backend().caps;
    presenter.backend_mut().caps.min_image_extent = Extent2D::new(0, 0);
    presenter.backend_mut().caps.max_image_extent = Extent2D::new(0, 0);
    presenter
        .backend_mut()
        .present_script
        .push_back(PresentOutcome::OutOfDate);

    presenter.draw().unwrap();
    presenter.draw().unwrap();

    assert!(presenter.is_stale());
    assert_eq!(count.get(), 1);
    assert_eq!(probe.count(|c| matches!(c, Call::CreateSwapchain { .. })), 0);
    assert_eq!(probe.count(|c| matches!(c, Call::WaitIdle)), 0);
    assert_eq!(probe.count(|c| matches!(c, Call::Acquire { .. })), 1);

    presenter.backend_mut().caps = caps;
    presenter.draw().unwrap();

    assert!(!presenter.is_stale());
    assert_eq!(presenter.extent(), Extent2D::new(640, 480));
    assert_eq!(count.get(), 2);
    assert!(probe.calls().contains(&Call::CreateSwapchain {
        id: 12,
        previous: Some(1)
    }));
}

// ============================================================================
// TEARDOWN
// ============================================================================

#[test]
fn test_drop_with_frame_in_flight_defers_swapchain_and_semaphores() {
    let (mut presenter, probe, reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);
    presenter.draw().unwrap();
    presenter.stop();
    let id = presenter.id();

    drop(presenter);

    assert!(reclaimer.contains(id));
    // 3 draw surfaces, 3 render targets, the swapchain and 10 semaphores.
    assert_eq!(reclaimer.parked_len(id), Some(17));
    assert_eq!(probe.live_semaphores(), 10);
    assert_eq!(probe.live_swapchains(), 1);
    assert!(!probe.calls().contains(&Call::WaitIdle));

    assert!(probe.complete_next());
    assert!(!reclaimer.contains(id));
    assert_eq!(probe.live_semaphores(), 0);
    assert_eq!(probe.live_swapchains(), 0);
}

#[test]
fn test_drop_waits_for_last_completion() {
    let (mut presenter, probe, reclaimer) = setup(MockBackend::new());
    counting_handler(&mut presenter);
    presenter.draw().unwrap();
    presenter.draw().unwrap();
    let id = presenter.id();

    drop(presenter);

    assert!(probe.complete_next());
    assert!(reclaimer.contains(id));
    assert!(probe.complete_next());
    assert!(!reclaimer.contains(id));
    assert_eq!(probe.live_semaphores(), 0);
}

#[test]
fn test_drop_stopped_and_idle_frees_immediately() {
    let (mut presenter, probe, reclaimer) = setup(MockBackend::new());
    presenter.stop();
    let id = presenter.id();

    drop(presenter);

    assert!(!reclaimer.contains(id));
    assert!(reclaimer.is_empty());
    assert_eq!(probe.live_semaphores(), 0);
    assert_eq!(probe.live_swapchains(), 0);
    assert_eq!(probe.count(|c| matches!(c, Call::Flush { .. })), 0);
}

#[test]
fn test_drop_running_and_idle_queues_release() {
    let (presenter, probe, reclaimer) = setup(MockBackend::new());
    let id = presenter.id();

    drop(presenter);

    assert!(reclaimer.contains(id));
    assert_eq!(
        probe.calls(),
        vec![
            Call::Flush {
                signal: None,
                finished: true
            },
            Call::Submit,
        ]
    );
    assert_eq!(probe.live_semaphores(), 10);

    probe.complete_all();
    assert!(!reclaimer.contains(id));
    assert_eq!(probe.live_semaphores(), 0);
}

#[test]
fn test_drop_running_with_unsubmitted_release() {
    let mut backend = MockBackend::new();
    backend.flush_outcome = FlushOutcome::NotSubmitted;
    let (presenter, probe, reclaimer) = setup(backend);
    let id = presenter.id();

    drop(presenter);

    assert!(!reclaimer.contains(id));
    assert_eq!(probe.live_semaphores(), 0);
}

#[test]
#[serial]
fn test_default_reclaimer_is_global() {
    let backend = MockBackend::new();
    let probe = Arc::clone(&backend.probe);
    let mut presenter = Presenter::new(backend, Extent2D::new(64, 64)).unwrap();
    counting_handler(&mut presenter);
    presenter.draw().unwrap();
    let id = presenter.id();

    drop(presenter);

    assert!(DeferredReclaimer::global().contains(id));
    probe.complete_all();
    assert!(!DeferredReclaimer::global().contains(id));
}
