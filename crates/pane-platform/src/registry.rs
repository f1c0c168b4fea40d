// SPDX-License-Identifier: CEPL-1.0
//! Windows owned by the event loop, addressed by stable keys.
//!
//! Platform events arrive tagged with a `WindowId`; the registry resolves it to
//! the key the owner handed out, so a closed window's id can never reach a
//! different window's state.

use std::collections::HashMap;
use std::hash::Hash;

use slotmap::{new_key_type, SlotMap};
use tracing::debug;
use winit::window::WindowId;

new_key_type! {
    /// Stable handle to a registered window.
    pub struct WindowKey;
}

pub struct WindowRegistry<T, I = WindowId> {
    windows: SlotMap<WindowKey, (I, T)>,
    by_id: HashMap<I, WindowKey>,
}

impl<T, I> Default for WindowRegistry<T, I> {
    fn default() -> Self {
        Self {
            windows: SlotMap::with_key(),
            by_id: HashMap::new(),
        }
    }
}

impl<T, I: Copy + Eq + Hash + std::fmt::Debug> WindowRegistry<T, I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `window` under its platform id. A window already registered
    /// under the same id is replaced and returned.
    pub fn insert(&mut self, id: I, window: T) -> (WindowKey, Option<T>) {
        let replaced = self.remove_by_id(id);
        let key = self.windows.insert((id, window));
        self.by_id.insert(id, key);
        debug!("registered window {id:?} ({} open)", self.windows.len());
        (key, replaced)
    }

    pub fn key_of(&self, id: I) -> Option<WindowKey> {
        self.by_id.get(&id).copied()
    }

    pub fn get(&self, key: WindowKey) -> Option<&T> {
        self.windows.get(key).map(|(_, w)| w)
    }

    pub fn get_mut(&mut self, key: WindowKey) -> Option<&mut T> {
        self.windows.get_mut(key).map(|(_, w)| w)
    }

    pub fn get_by_id_mut(&mut self, id: I) -> Option<&mut T> {
        let key = self.key_of(id)?;
        self.get_mut(key)
    }

    pub fn remove(&mut self, key: WindowKey) -> Option<T> {
        let (id, window) = self.windows.remove(key)?;
        self.by_id.remove(&id);
        debug!("unregistered window {id:?} ({} open)", self.windows.len());
        Some(window)
    }

    pub fn remove_by_id(&mut self, id: I) -> Option<T> {
        let key = self.key_of(id)?;
        self.remove(key)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (WindowKey, &mut T)> {
        self.windows.iter_mut().map(|(k, (_, w))| (k, w))
    }

    /// Remove every window, in no particular order.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.by_id.clear();
        self.windows.drain().map(|(_, (_, w))| w)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
