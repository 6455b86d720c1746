//! Active set management for the sweep-line join.
//!
//! The active set holds the records that may still overlap the current or
//! a later window. Records arrive in start order but their ends are
//! arbitrary, so eviction scans the whole set instead of popping from the
//! front; survivors keep their admission order.

/// Ordered set of active elements with stable, predicate-driven eviction.
///
/// # Memory Complexity
///
/// O(k) where k = max number of records overlapping any single window.
#[derive(Debug)]
pub struct ActiveSet<T> {
    data: Vec<T>,
    /// Maximum observed active size (for statistics).
    max_active: usize,
}

impl<T> Default for ActiveSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ActiveSet<T> {
    /// Create a new empty active set.
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(1024),
            max_active: 0,
        }
    }

    /// Add an element to the active set.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.data.push(value);
        if self.data.len() > self.max_active {
            self.max_active = self.data.len();
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get reference to element at logical index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Remove every element for which `expired` returns true.
    ///
    /// Returns the number of elements removed.
    #[inline]
    pub fn evict_where<F>(&mut self, mut expired: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.data.len();
        self.data.retain(|item| !expired(item));
        before - self.data.len()
    }

    /// Get the maximum active size observed (for statistics).
    pub fn max_active(&self) -> usize {
        self.max_active
    }
}
