//! Gap-tolerant ordered storage for images discovered out of order.
//!
//! XObject dictionaries carry no ordering guarantee, so the walker files each
//! decoded image under a synthesized integer key and the compositor reads the
//! slots back in key order once the walk is done.

use std::collections::BTreeMap;

/// Default multiplier separating the key ranges of consecutive pages.
pub const DEFAULT_PAGE_STRIDE: usize = 1000;

/// Maps a `(page, object)` pair onto a single ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyScheme {
    pub page_stride: usize,
}

impl Default for KeyScheme {
    fn default() -> Self {
        Self {
            page_stride: DEFAULT_PAGE_STRIDE,
        }
    }
}

impl KeyScheme {
    pub fn new(page_stride: usize) -> Self {
        Self { page_stride }
    }

    /// `page_index * page_stride + object_id`.
    ///
    /// Returns `None` when the object id would spill into the next page's
    /// range, or when the key overflows.
    pub fn index(&self, page_index: usize, object_id: u32) -> Option<usize> {
        let object_id = object_id as usize;
        if object_id >= self.page_stride {
            return None;
        }
        page_index
            .checked_mul(self.page_stride)?
            .checked_add(object_id)
    }
}

/// An ordered sequence indexed by non-negative integers where any slot may be
/// absent.
///
/// Writing past the end extends the sequence; intervening slots read as
/// absent. Reads never fail: an out-of-range index is simply absent.
#[derive(Debug, Clone)]
pub struct SparseList<T> {
    slots: BTreeMap<usize, T>,
    len: usize,
}

impl<T> Default for SparseList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseList<T> {
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            len: 0,
        }
    }

    /// Logical length: one past the highest index ever written.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots holding a value.
    pub fn defined(&self) -> usize {
        self.slots.len()
    }

    /// Store `value` at `index`, returning the value it replaced.
    pub fn set(&mut self, index: usize, value: T) -> Option<T> {
        self.len = self.len.max(index + 1);
        self.slots.insert(index, value)
    }

    /// Append after the last slot.
    pub fn push(&mut self, value: T) {
        let index = self.len;
        self.set(index, value);
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(&index)
    }

    /// Index from the end when negative (`-1` is the last slot).
    pub fn get_relative(&self, index: isize) -> Option<&T> {
        if index >= 0 {
            return self.get(index as usize);
        }
        let back = index.unsigned_abs();
        if back > self.len {
            return None;
        }
        self.get(self.len - back)
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        self.slots.remove(&index)
    }

    /// Every slot from 0 to `len`, absent ones as `None`.
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        (0..self.len).map(move |index| self.slots.get(&index))
    }

    /// Only the present values, in index order.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.values()
    }

    /// Present values with their indices, in index order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.slots.iter().map(|(index, value)| (*index, value))
    }

    /// Materialize the dense form, gaps included.
    pub fn into_dense(self) -> Vec<Option<T>> {
        let mut dense: Vec<Option<T>> = std::iter::repeat_with(|| None).take(self.len).collect();
        for (index, value) in self.slots {
            dense[index] = Some(value);
        }
        dense
    }

    pub fn into_values(self) -> impl Iterator<Item = T> {
        self.slots.into_values()
    }
}
