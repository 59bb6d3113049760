//! Identity handle for shared listeners

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// `Arc` wrapper whose equality is allocation identity
///
/// Trait objects rarely implement `PartialEq`, so registries of
/// `Arc<dyn Listener>` compare handles by address instead. Two handles are
/// equal only if they point at the same allocation.
pub struct ListenerRef<L: ?Sized>(Arc<L>);

impl<L> ListenerRef<L> {
    pub fn new(listener: L) -> Self {
        Self(Arc::new(listener))
    }
}

impl<L: ?Sized> ListenerRef<L> {
    #[inline]
    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0).cast::<()>()
    }
}

impl<L: ?Sized> From<Arc<L>> for ListenerRef<L> {
    fn from(listener: Arc<L>) -> Self {
        Self(listener)
    }
}

impl<L: ?Sized> Clone for ListenerRef<L> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<L: ?Sized> Deref for ListenerRef<L> {
    type Target = L;

    fn deref(&self) -> &L {
        &self.0
    }
}

impl<L: ?Sized> PartialEq for ListenerRef<L> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<L: ?Sized> Eq for ListenerRef<L> {}

impl<L: ?Sized> Hash for ListenerRef<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<L: ?Sized> fmt::Debug for ListenerRef<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerRef({:p})", self.addr())
    }
}
