//! Owner-based identity: which control block a handle shares.
//!
//! Value comparisons on `Shared` look at the stored pointer, which may be an
//! alias. Owner comparisons look at the control block instead, so every
//! alias, cast and weak observer of one object compares equivalent. Empty
//! handles all share the null owner.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Opaque identity of a control block.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct OwnerId(usize);

impl OwnerId {
    pub(crate) const NONE: OwnerId = OwnerId(0);

    pub(crate) fn from_addr(addr: *const ()) -> Self {
        OwnerId(addr as usize)
    }

    /// True for the identity shared by all empty handles.
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

/// Implemented by handles that participate in an ownership group.
pub trait HasOwner {
    fn owner_id(&self) -> OwnerId;

    /// Strict weak ordering by control block identity.
    fn owner_before<O: HasOwner + ?Sized>(&self, other: &O) -> bool {
        self.owner_id() < other.owner_id()
    }

    /// True when both handles share one control block (or both are empty).
    fn owner_eq<O: HasOwner + ?Sized>(&self, other: &O) -> bool {
        self.owner_id() == other.owner_id()
    }
}

impl<P: HasOwner + ?Sized> HasOwner for &P {
    fn owner_id(&self) -> OwnerId {
        (**self).owner_id()
    }
}

/// Adapter that compares and hashes a handle by owner instead of by value.
///
/// Use as a key in ordered or hashed sets when aliases of one object must
/// collapse into a single entry.
pub struct ByOwner<P>(pub P);

impl<P> ByOwner<P> {
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: HasOwner> PartialEq for ByOwner<P> {
    fn eq(&self, other: &Self) -> bool {
        self.0.owner_eq(&other.0)
    }
}

impl<P: HasOwner> Eq for ByOwner<P> {}

impl<P: HasOwner> PartialOrd for ByOwner<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: HasOwner> Ord for ByOwner<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.owner_id().cmp(&other.0.owner_id())
    }
}

impl<P: HasOwner> Hash for ByOwner<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.owner_id().hash(state);
    }
}

impl<P: fmt::Debug> fmt::Debug for ByOwner<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByOwner").field(&self.0).finish()
    }
}
