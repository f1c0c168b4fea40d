// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use pane_present::BackendError;
use raw_window_handle::HandleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VkError {
    #[error("cannot load the Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),
    #[error("window handle unavailable: {0}")]
    Handle(#[from] HandleError),
    #[error("{op} failed: {result}")]
    Call {
        op: &'static str,
        result: vk::Result,
    },
    #[error("no physical device with a graphics queue that can present to this surface")]
    NoSuitableDevice,
    #[error("queue family {0} cannot present to this surface")]
    QueueCannotPresent(u32),
}

impl VkError {
    pub fn result(&self) -> Option<vk::Result> {
        match self {
            VkError::Call { result, .. } => Some(*result),
            _ => None,
        }
    }
}

impl From<VkError> for BackendError {
    fn from(err: VkError) -> Self {
        match err {
            VkError::Call { op, result } => BackendError::new(op, format!("{result:?}")),
            other => BackendError::new("vulkan", other.to_string()),
        }
    }
}

/// Tags a raw `vk::Result` with the name of the call that produced it.
pub(crate) trait VkResultExt<T> {
    fn op(self, op: &'static str) -> Result<T, VkError>;
}

impl<T> VkResultExt<T> for Result<T, vk::Result> {
    fn op(self, op: &'static str) -> Result<T, VkError> {
        self.map_err(|result| VkError::Call { op, result })
    }
}
