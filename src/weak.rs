//! Non-owning observers that can be promoted back to owners.

use crate::control_block::BlockRef;
use crate::count::WeakToken;
use crate::owner::{HasOwner, OwnerId};
use crate::shared::{Owner, Shared};
use core::fmt;
use core::marker::PhantomData;
use std::ptr::NonNull;

struct Observer<T: ?Sized> {
    ptr: NonNull<T>,
    block: BlockRef,
    token: WeakToken,
}

impl<T: ?Sized> Observer<T> {
    fn dismiss(self) {
        let Observer { block, token, .. } = self;
        block.dec_weak(token);
    }
}

/// Weak handle: keeps the control block, not the object, alive.
///
/// A `Weak` never dereferences its pointer. Access goes through `upgrade`
/// (or `lock`), which yields a new `Shared` only while some strong handle
/// still exists.
pub struct Weak<T: ?Sized> {
    observer: Option<Observer<T>>,
    _nosend: PhantomData<*mut ()>,
}

impl<T: ?Sized> Weak<T> {
    /// A weak handle observing nothing; always expired.
    pub const fn new() -> Self {
        Weak {
            observer: None,
            _nosend: PhantomData,
        }
    }

    /// True once no strong handle remains (or if this handle is empty).
    pub fn expired(&self) -> bool {
        self.use_count() == 0
    }

    /// Try to become an owner; `None` once the object has been released.
    pub fn upgrade(&self) -> Option<Shared<T>> {
        let o = self.observer.as_ref()?;
        let token = o.block.try_inc_strong()?;
        Some(Shared::from_owner(Owner::new(o.ptr, o.block, token)))
    }

    /// Like `upgrade`, but an expired observer yields an empty handle.
    pub fn lock(&self) -> Shared<T> {
        self.upgrade().unwrap_or_default()
    }

    /// Strong handles currently sharing the block; 0 once expired.
    pub fn use_count(&self) -> usize {
        self.observer.as_ref().map_or(0, |o| o.block.strong_count())
    }

    /// Weak handles observing the block, this one included; 0 when empty.
    pub fn weak_count(&self) -> usize {
        self.observer.as_ref().map_or(0, |o| o.block.weak_count())
    }

    /// Stop observing; the handle becomes empty.
    pub fn reset(&mut self) {
        if let Some(o) = self.observer.take() {
            o.dismiss();
        }
    }

    /// Exchange observed objects with `other`. No counts change.
    pub fn swap(&mut self, other: &mut Weak<T>) {
        core::mem::swap(&mut self.observer, &mut other.observer);
    }
}

impl<T: ?Sized> From<&Shared<T>> for Weak<T> {
    fn from(s: &Shared<T>) -> Self {
        Weak {
            observer: s.owner().map(|o| Observer {
                ptr: o.ptr,
                block: o.block,
                token: o.block.inc_weak(),
            }),
            _nosend: PhantomData,
        }
    }
}

impl<T: ?Sized> Clone for Weak<T> {
    fn clone(&self) -> Self {
        Weak {
            observer: self.observer.as_ref().map(|o| Observer {
                ptr: o.ptr,
                block: o.block,
                token: o.block.inc_weak(),
            }),
            _nosend: PhantomData,
        }
    }
}

impl<T: ?Sized> Drop for Weak<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized> Default for Weak<T> {
    fn default() -> Self {
        Weak::new()
    }
}

impl<T: ?Sized> HasOwner for Weak<T> {
    fn owner_id(&self) -> OwnerId {
        match &self.observer {
            Some(o) => OwnerId::from_addr(o.block.addr()),
            None => OwnerId::NONE,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Weak<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(Weak)")
    }
}
