//! Immutable listener snapshots
//!
//! A [`Snapshot`] is a shared, read-only view of the registry members taken
//! at one mutation. Cloning it bumps a reference count; the elements are
//! never copied or changed after publication.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Point-in-time view of the registered listeners
pub struct Snapshot<T> {
    items: Arc<Vec<T>>,
}

impl<T> Snapshot<T> {
    pub(crate) fn from_arc(items: Arc<Vec<T>>) -> Self {
        Self { items }
    }

    /// Empty snapshot
    pub fn empty() -> Self {
        Self {
            items: Arc::new(Vec::new()),
        }
    }

    /// Whether two snapshots are the same published instance
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.items, &other.items)
    }

    /// Listeners as a slice, in insertion order
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Owned traversal over this snapshot
    pub fn into_iter_owned(self) -> Iter<T> {
        let back = self.items.len();
        Iter {
            items: self.items,
            front: 0,
            back,
        }
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> AsRef<[T]> for Snapshot<T> {
    fn as_ref(&self) -> &[T] {
        &self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Snapshot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items[..] == other.items[..]
    }
}

impl<T: PartialEq> PartialEq<[T]> for Snapshot<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.items[..] == *other
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for Snapshot<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.items[..] == other[..]
    }
}

impl<'a, T> IntoIterator for &'a Snapshot<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Clone> IntoIterator for Snapshot<T> {
    type Item = T;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Iter<T> {
        self.into_iter_owned()
    }
}

// ============================================================================
// Iter
// ============================================================================

/// Owning traversal over a [`Snapshot`]
///
/// Holds the snapshot alive, so registry mutations during the traversal
/// have no effect on it. `Clone` gives an independent cursor and
/// [`Iter::restart`] rewinds to the first listener.
pub struct Iter<T> {
    items: Arc<Vec<T>>,
    front: usize,
    back: usize,
}

impl<T> Iter<T> {
    /// Rewind to the start of the same snapshot
    pub fn restart(&mut self) {
        self.front = 0;
        self.back = self.items.len();
    }
}

impl<T> Clone for Iter<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            front: self.front,
            back: self.back,
        }
    }
}

impl<T: Clone> Iterator for Iter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        let item = self.items[self.front].clone();
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> DoubleEndedIterator for Iter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.items[self.back].clone())
    }
}

impl<T: Clone> ExactSizeIterator for Iter<T> {}

impl<T: Clone> std::iter::FusedIterator for Iter<T> {}

impl<T: fmt::Debug> fmt::Debug for Iter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.items[self.front..self.back].iter())
            .finish()
    }
}
