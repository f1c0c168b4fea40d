// SPDX-License-Identifier: CEPL-1.0
use thiserror::Error;

/// Failure reported by a graphics backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op}: {detail}")]
pub struct BackendError {
    pub op: &'static str,
    pub detail: String,
}

impl BackendError {
    pub fn new(op: &'static str, detail: impl Into<String>) -> Self {
        Self {
            op,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapchainError {
    #[error("cannot find suitable image format for swapchain")]
    UnsupportedSurfaceFormat,
    #[error("cannot create drawable surface from swapchain image {index}")]
    SurfaceCreation { index: usize },
    #[error("swapchain returned {0} images, at least 2 are required")]
    InsufficientImages(usize),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors that escape `Presenter::draw`. Everything else is logged and absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresentError {
    #[error("cannot present image: {0}")]
    Present(BackendError),
    #[error("cannot rebuild swapchain: {0}")]
    Rebuild(#[from] SwapchainError),
}
