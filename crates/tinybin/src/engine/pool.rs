// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded lock-free worker pool.
//!
//! Workers are checked out behind an RAII guard and returned on drop, so a
//! worker always goes back, error paths included. A worker returned to a full
//! pool is dropped; an empty pool allocates a fresh one and counts the event.

use crossbeam::queue::ArrayQueue;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

/// State cleared between uses.
pub(crate) trait Reset {
    fn reset(&mut self);
}

pub(crate) struct Pool<T: Reset> {
    name: &'static str,
    free: ArrayQueue<T>,
    make: fn() -> T,
    exhausted: AtomicU64,
}

impl<T: Reset> Pool<T> {
    /// Pool pre-filled with `capacity` workers.
    pub(crate) fn new(name: &'static str, capacity: usize, make: fn() -> T) -> Self {
        let free = ArrayQueue::new(capacity.max(1));
        while free.push(make()).is_ok() {}
        Self {
            name,
            free,
            make,
            exhausted: AtomicU64::new(0),
        }
    }

    pub(crate) fn checkout(&self) -> Pooled<'_, T> {
        let item = self.free.pop().unwrap_or_else(|| {
            let n = self.exhausted.fetch_add(1, Ordering::Relaxed) + 1;
            log::debug!("[pool] {} exhausted ({} times), allocating", self.name, n);
            (self.make)()
        });
        Pooled {
            item: Some(item),
            pool: self,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.free.capacity()
    }

    pub(crate) fn available(&self) -> usize {
        self.free.len()
    }

    pub(crate) fn exhausted_count(&self) -> u64 {
        self.exhausted.load(Ordering::Relaxed)
    }
}

/// A checked-out worker. Must not outlive the call that checked it out.
pub(crate) struct Pooled<'p, T: Reset> {
    item: Option<T>,
    pool: &'p Pool<T>,
}

impl<T: Reset> Deref for Pooled<'_, T> {
    type Target = T;

    #[allow(clippy::expect_used)] // only taken in Drop
    fn deref(&self) -> &T {
        self.item.as_ref().expect("pooled item present until drop")
    }
}

impl<T: Reset> DerefMut for Pooled<'_, T> {
    #[allow(clippy::expect_used)] // only taken in Drop
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("pooled item present until drop")
    }
}

impl<T: Reset> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(mut item) = self.item.take() {
            item.reset();
            // Full pool: let the worker go.
            let _ = self.pool.free.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Scratch {
        data: Vec<u8>,
    }

    impl Reset for Scratch {
        fn reset(&mut self) {
            self.data.clear();
        }
    }

    #[test]
    fn test_prefilled_and_returned_on_drop() {
        let pool: Pool<Scratch> = Pool::new("scratch", 2, Scratch::default);
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.available(), 2);
        {
            let mut a = pool.checkout();
            a.data.extend_from_slice(b"abc");
            assert_eq!(pool.available(), 1);
        }
        assert_eq!(pool.available(), 2);
        // Returned workers come back clean.
        let a = pool.checkout();
        let b = pool.checkout();
        assert!(a.data.is_empty() && b.data.is_empty());
    }

    #[test]
    fn test_exhaustion_allocates_and_overflow_drops() {
        let pool: Pool<Scratch> = Pool::new("scratch", 1, Scratch::default);
        let a = pool.checkout();
        let b = pool.checkout();
        assert_eq!(pool.exhausted_count(), 1);
        drop(a);
        drop(b);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_returned_on_error_path() {
        let pool: Pool<Scratch> = Pool::new("scratch", 1, Scratch::default);
        let fail = || -> Result<(), ()> {
            let mut w = pool.checkout();
            w.data.push(1);
            Err(())
        };
        assert!(fail().is_err());
        assert_eq!(pool.available(), 1);
    }
}
