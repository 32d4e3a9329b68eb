//! View state ownership
//!
//! A presenter owns its state through a [`Mount`]. In-flight completions only
//! hold a [`MountHandle`]; once the presenter is dropped (the view unmounted)
//! the handle no longer upgrades and a late completion is discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

pub struct Mount<S> {
    state: Arc<Mutex<S>>,
}

pub struct MountHandle<S> {
    state: Weak<Mutex<S>>,
}

impl<S> Clone for MountHandle<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

fn lock<S>(state: &Mutex<S>) -> MutexGuard<'_, S> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S> Mount<S> {
    pub fn new(state: S) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn handle(&self) -> MountHandle<S> {
        MountHandle {
            state: Arc::downgrade(&self.state),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&*lock(&self.state))
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut *lock(&self.state))
    }

    pub fn snapshot(&self) -> S
    where
        S: Clone,
    {
        lock(&self.state).clone()
    }
}

impl<S> MountHandle<S> {
    pub fn is_mounted(&self) -> bool {
        self.state.strong_count() > 0
    }

    /// Apply a completion; returns false when the view is gone.
    pub fn apply(&self, f: impl FnOnce(&mut S)) -> bool {
        match self.state.upgrade() {
            Some(state) => {
                f(&mut *lock(&state));
                true
            }
            None => {
                tracing::debug!("View unmounted, dropping late completion");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_applies_while_mounted() {
        let mount = Mount::new(0u32);
        let handle = mount.handle();
        assert!(handle.apply(|n| *n += 1));
        assert_eq!(mount.snapshot(), 1);
    }

    #[test]
    fn test_late_completion_is_noop() {
        let mount = Mount::new(vec![1, 2]);
        let handle = mount.handle();
        drop(mount);
        assert!(!handle.is_mounted());
        assert!(!handle.apply(|v| v.clear()));
    }
}
