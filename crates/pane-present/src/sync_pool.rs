// SPDX-License-Identifier: CEPL-1.0
use std::any::Any;

use tracing::debug;

use crate::error::BackendError;

/// Per-image semaphores in three append-only pools.
///
/// Sizes track the swapchain image count N as {N + 1, N, N} for
/// {renderable, rendered, presentable}. The extra renderable entry always sits
/// at the tail and is handed to the next acquire before its image index is
/// known. Growth only appends, so an index captured by in-flight work keeps
/// naming the same semaphore.
pub struct SyncPool<S> {
    renderable: Vec<S>,
    rendered: Vec<S>,
    presentable: Vec<S>,
}

impl<S> Default for SyncPool<S> {
    fn default() -> Self {
        Self {
            renderable: Vec::new(),
            rendered: Vec::new(),
            presentable: Vec::new(),
        }
    }
}

impl<S> SyncPool<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow every pool so it covers `image_count` images. Never shrinks.
    pub fn ensure_capacity<F>(&mut self, image_count: usize, mut create: F) -> Result<(), BackendError>
    where
        F: FnMut() -> Result<S, BackendError>,
    {
        grow("renderable", &mut self.renderable, image_count + 1, &mut create)?;
        grow("rendered", &mut self.rendered, image_count, &mut create)?;
        grow("presentable", &mut self.presentable, image_count, &mut create)?;
        Ok(())
    }

    /// Semaphore the next acquire signals.
    pub fn next_renderable(&self) -> &S {
        self.renderable
            .last()
            .expect("sync pool used before ensure_capacity")
    }

    /// Move the semaphore just signalled by an acquire into slot `index`; the
    /// previous occupant becomes the next spare.
    pub fn rotate_renderable(&mut self, index: usize) {
        let last = self.renderable.len() - 1;
        self.renderable.swap(index, last);
    }

    pub fn renderable(&self, index: usize) -> &S {
        &self.renderable[index]
    }

    pub fn rendered(&self, index: usize) -> &S {
        &self.rendered[index]
    }

    pub fn presentable(&self, index: usize) -> &S {
        &self.presentable[index]
    }

    /// (renderable, rendered, presentable) lengths.
    pub fn lens(&self) -> (usize, usize, usize) {
        (self.renderable.len(), self.rendered.len(), self.presentable.len())
    }

    pub fn total(&self) -> usize {
        self.renderable.len() + self.rendered.len() + self.presentable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl<S: Send + 'static> SyncPool<S> {
    /// Drain all three pools into type-erased boxes for deferred reclamation.
    pub fn into_parked(self) -> Vec<Box<dyn Any + Send>> {
        let mut parked: Vec<Box<dyn Any + Send>> = Vec::with_capacity(self.total());
        for sem in self
            .renderable
            .into_iter()
            .chain(self.rendered)
            .chain(self.presentable)
        {
            parked.push(Box::new(sem));
        }
        parked
    }
}

fn grow<S, F>(kind: &str, pool: &mut Vec<S>, want: usize, create: &mut F) -> Result<(), BackendError>
where
    F: FnMut() -> Result<S, BackendError>,
{
    let have = pool.len();
    if have >= want {
        return Ok(());
    }
    debug!("creating image {} semaphores ({} -> {})", kind, have, want);
    pool.reserve(want - have);
    for _ in have..want {
        pool.push(create()?);
    }
    Ok(())
}

#[cfg(test)]
#[path = "sync_pool_tests.rs"]
mod tests;
