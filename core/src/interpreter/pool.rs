//! Per-thread free-list pools
//!
//! Execution states and control-flow state records are reused across
//! invocations instead of being allocated on every call. A record is handed
//! out as a [`Pooled`] guard; dropping the guard resets the record and returns
//! it to its pool, after which nothing can reach it.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::thread::LocalKey;

use tracing::trace;

/// Upper bound on idle records kept per pool
const MAX_IDLE: usize = 64;

/// Record that can be reset for reuse
pub trait Recycle: Default {
    /// Drop every reference the record holds so that a reused record starts clean
    fn recycle(&mut self);
}

/// Free list of boxed records
pub struct Pool<T> {
    free: RefCell<Vec<Box<T>>>,
}

impl<T> Pool<T> {
    pub const fn new() -> Self {
        Self {
            free: RefCell::new(Vec::new()),
        }
    }

    pub fn idle(&self) -> usize {
        self.free.borrow().len()
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive handle on a pooled record
pub struct Pooled<T: Recycle + 'static> {
    item: Option<Box<T>>,
    pool: &'static LocalKey<Pool<T>>,
}

impl<T: Recycle + 'static> Pooled<T> {
    /// Take a record from `pool`, or allocate one if the pool is empty
    pub fn acquire(pool: &'static LocalKey<Pool<T>>) -> Self {
        let reused = pool.with(|p| p.free.borrow_mut().pop());
        let item = match reused {
            Some(item) => {
                trace!(ty = std::any::type_name::<T>(), "reusing pooled record");
                item
            }
            None => Box::default(),
        };
        Self {
            item: Some(item),
            pool,
        }
    }
}

impl<T: Recycle + 'static> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.item {
            Some(item) => item,
            None => unreachable!("pooled record used after release"),
        }
    }
}

impl<T: Recycle + 'static> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.item {
            Some(item) => item,
            None => unreachable!("pooled record used after release"),
        }
    }
}

impl<T: Recycle + 'static> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(mut item) = self.item.take() {
            item.recycle();
            // The pool may already be gone during thread teardown
            let _ = self.pool.try_with(|p| {
                let mut free = p.free.borrow_mut();
                if free.len() < MAX_IDLE {
                    free.push(item);
                }
            });
        }
    }
}
