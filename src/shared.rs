//! Shared ownership: many owners, released when the last one goes.
//!
//! A non-empty `Shared<T>` is a (pointer, control block, strong token)
//! triple. The pointer is usually the managed object itself but may be an
//! alias: any address whose validity is governed by the managed object's
//! lifetime (a field, a trait-object view, a downcast). Counting only ever
//! touches the control block, so aliases and casts share the owner's count.

use crate::control_block::BlockRef;
use crate::count::StrongToken;
use crate::error::Expired;
use crate::owner::{HasOwner, OwnerId};
use crate::release::{DefaultRelease, Release};
use crate::unique::{Surrender, Unique};
use crate::weak::Weak;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::ops::Deref;
use std::ptr::NonNull;

/// One counted strong unit plus the pointer it vouches for.
pub(crate) struct Owner<T: ?Sized> {
    pub(crate) ptr: NonNull<T>,
    pub(crate) block: BlockRef,
    token: StrongToken,
}

impl<T: ?Sized> Owner<T> {
    pub(crate) fn new(ptr: NonNull<T>, block: BlockRef, token: StrongToken) -> Self {
        Owner { ptr, block, token }
    }

    /// Another unit on the same block, vouching for `ptr`.
    fn share<U: ?Sized>(&self, ptr: NonNull<U>) -> Owner<U> {
        Owner {
            ptr,
            block: self.block,
            token: self.block.inc_strong(),
        }
    }

    /// Return the unit; may release the object and reclaim the block.
    fn dismiss(self) {
        let Owner { block, token, .. } = self;
        block.dec_strong(token);
    }
}

/// Reference-counted owning handle.
///
/// Cloning increments the strong count, dropping decrements it, and the
/// release policy runs when the count reaches zero. Single-threaded only:
/// counts are plain `Cell`s and the handle is `!Send`/`!Sync`.
pub struct Shared<T: ?Sized> {
    owner: Option<Owner<T>>,
    _owns: PhantomData<T>,
    _nosend: PhantomData<*mut ()>,
}

impl<T: ?Sized> Shared<T> {
    /// A handle that owns nothing; `use_count() == 0`.
    pub const fn empty() -> Self {
        Shared {
            owner: None,
            _owns: PhantomData,
            _nosend: PhantomData,
        }
    }

    pub(crate) fn from_owner(owner: Owner<T>) -> Self {
        Shared {
            owner: Some(owner),
            _owns: PhantomData,
            _nosend: PhantomData,
        }
    }

    /// Take ownership of a `Box`-allocated pointer.
    ///
    /// # Safety
    /// `ptr` must come from `Box::into_raw`/`Box::leak` and must not be
    /// owned elsewhere.
    pub unsafe fn from_raw(ptr: NonNull<T>) -> Self
    where
        T: 'static,
    {
        unsafe { Self::from_raw_with(ptr, DefaultRelease::new()) }
    }

    /// Take ownership of `ptr`, released through `policy` on the last drop.
    ///
    /// # Safety
    /// `ptr` must be live and releasable by `policy`, and must not be owned
    /// elsewhere.
    pub unsafe fn from_raw_with<R>(ptr: NonNull<T>, policy: R) -> Self
    where
        T: 'static,
        R: Release<T> + 'static,
    {
        let (block, token) = unsafe { BlockRef::allocate(ptr, policy) };
        Self::from_owner(Owner::new(ptr, block, token))
    }

    /// Adopt whatever `source` exclusively owns, leaving it empty.
    ///
    /// An empty source yields an empty handle and its policy is dropped.
    pub fn adopt<E>(source: &mut E) -> Self
    where
        T: 'static,
        E: Surrender<T> + ?Sized,
        E::Policy: 'static,
    {
        match source.surrender() {
            // SAFETY: `Surrender` hands over sole ownership with a matching policy.
            (Some(ptr), policy) => unsafe { Self::from_raw_with(ptr, policy) },
            (None, _) => Self::empty(),
        }
    }

    /// Share `other`'s control block while storing `ptr`.
    ///
    /// The result keeps `other`'s object alive; dropping it never releases
    /// `ptr` on its own account. Aliasing an empty handle yields an empty
    /// handle.
    ///
    /// # Safety
    /// `ptr` must stay valid for as long as `other`'s object is alive.
    pub unsafe fn alias<U: ?Sized>(other: &Shared<U>, ptr: NonNull<T>) -> Self {
        match &other.owner {
            Some(o) => Self::from_owner(o.share(ptr)),
            None => Self::empty(),
        }
    }

    /// Safe aliasing: a handle to a part of this object (a field, a
    /// trait-object view) that shares this handle's ownership.
    pub fn project<U: ?Sized>(&self, f: impl FnOnce(&T) -> &U) -> Shared<U> {
        match &self.owner {
            Some(o) => {
                // SAFETY: the object is alive while we hold a strong unit.
                let part = f(unsafe { o.ptr.as_ref() });
                Shared::from_owner(o.share(NonNull::from(part)))
            }
            None => Shared::empty(),
        }
    }

    /// Promote `weak`; promoting an expired weak is a contract violation.
    ///
    /// # Panics
    /// Panics if the weak handle has expired. Use `Weak::upgrade` or
    /// `Shared::try_from` to handle that case.
    #[track_caller]
    pub fn from_weak(weak: &Weak<T>) -> Self {
        match weak.upgrade() {
            Some(s) => s,
            None => panic!("promoted an expired Weak handle"),
        }
    }

    /// Move out of `self`, leaving it empty. No counts change.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// The stored pointer, or `None` when empty.
    #[inline]
    pub fn get(&self) -> Option<NonNull<T>> {
        self.owner.as_ref().map(|o| o.ptr)
    }

    /// The stored address without metadata; null when empty.
    ///
    /// Equality, ordering and hashing of handles are defined on this value.
    #[inline]
    pub fn addr(&self) -> *const () {
        match &self.owner {
            Some(o) => o.ptr.as_ptr() as *const (),
            None => core::ptr::null(),
        }
    }

    /// The stored pointer as a raw pointer; null when empty.
    #[inline]
    pub fn as_ptr(&self) -> *const T
    where
        T: Sized,
    {
        self.addr().cast::<T>()
    }

    /// The target, or `None` when empty.
    pub fn try_get(&self) -> Option<&T> {
        // SAFETY: the object is alive while we hold a strong unit, and an
        // alias is valid for as long as its owner's object.
        self.owner.as_ref().map(|o| unsafe { o.ptr.as_ref() })
    }

    /// Mutable access when no other strong or weak handle can observe it.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        match &mut self.owner {
            Some(o) if o.block.is_unique() && o.block.weak_count() == 0 => {
                // SAFETY: sole handle of any kind on this block.
                Some(unsafe { o.ptr.as_mut() })
            }
            _ => None,
        }
    }

    /// Number of strong handles sharing this block; 0 when empty.
    #[inline]
    pub fn use_count(&self) -> usize {
        self.owner.as_ref().map_or(0, |o| o.block.strong_count())
    }

    /// Number of weak handles observing this block; 0 when empty.
    #[inline]
    pub fn weak_count(&self) -> usize {
        self.owner.as_ref().map_or(0, |o| o.block.weak_count())
    }

    /// `use_count() == 1`.
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.owner.as_ref().is_some_and(|o| o.block.is_unique())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.owner.is_none()
    }

    /// A new weak handle observing this handle's object.
    pub fn downgrade(&self) -> Weak<T> {
        Weak::from(self)
    }

    /// Drop this handle's ownership and become empty.
    pub fn reset(&mut self) {
        drop(self.take());
    }

    /// Replace the content with a freshly owned `value`.
    pub fn replace(&mut self, value: T)
    where
        T: Sized + 'static,
    {
        let mut fresh = Shared::new(value);
        self.swap(&mut fresh);
    }

    /// Replace the content with a freshly owned `Box`-allocated pointer.
    ///
    /// # Safety
    /// Same contract as `from_raw`.
    pub unsafe fn reset_raw(&mut self, ptr: NonNull<T>)
    where
        T: 'static,
    {
        let mut fresh = unsafe { Shared::from_raw(ptr) };
        self.swap(&mut fresh);
    }

    /// Replace the content with `ptr` released through `policy`.
    ///
    /// # Safety
    /// Same contract as `from_raw_with`.
    pub unsafe fn reset_raw_with<R>(&mut self, ptr: NonNull<T>, policy: R)
    where
        T: 'static,
        R: Release<T> + 'static,
    {
        let mut fresh = unsafe { Shared::from_raw_with(ptr, policy) };
        self.swap(&mut fresh);
    }

    /// Exchange contents with `other`. No counts change.
    pub fn swap(&mut self, other: &mut Shared<T>) {
        core::mem::swap(&mut self.owner, &mut other.owner);
    }

    pub(crate) fn owner(&self) -> Option<&Owner<T>> {
        self.owner.as_ref()
    }
}

impl<T: 'static> Shared<T> {
    /// Box `value` and share it; `use_count() == 1`.
    pub fn new(value: T) -> Self {
        Shared::from(Box::new(value))
    }
}

impl<T: ?Sized> Drop for Shared<T> {
    fn drop(&mut self) {
        if let Some(o) = self.owner.take() {
            o.dismiss();
        }
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        match &self.owner {
            Some(o) => Shared::from_owner(o.share(o.ptr)),
            None => Shared::empty(),
        }
    }
}

impl<T: ?Sized> Default for Shared<T> {
    fn default() -> Self {
        Shared::empty()
    }
}

impl<T: ?Sized + 'static> From<Box<T>> for Shared<T> {
    fn from(b: Box<T>) -> Self {
        let ptr = NonNull::from(Box::leak(b));
        // SAFETY: freshly leaked from a Box and owned by nobody else.
        unsafe { Shared::from_raw(ptr) }
    }
}

impl<T: 'static> From<Vec<T>> for Shared<[T]> {
    fn from(v: Vec<T>) -> Self {
        Shared::from(v.into_boxed_slice())
    }
}

impl<T, R> From<Unique<T, R>> for Shared<T>
where
    T: ?Sized + 'static,
    R: Release<T> + 'static,
{
    fn from(u: Unique<T, R>) -> Self {
        match u.into_parts() {
            // SAFETY: the Unique owned `ptr` under `policy` and gave it up.
            (Some(ptr), policy) => unsafe { Shared::from_raw_with(ptr, policy) },
            (None, _) => Shared::empty(),
        }
    }
}

impl<T: ?Sized> TryFrom<&Weak<T>> for Shared<T> {
    type Error = Expired;

    fn try_from(weak: &Weak<T>) -> Result<Self, Expired> {
        weak.upgrade().ok_or(Expired)
    }
}

impl<T: ?Sized> Deref for Shared<T> {
    type Target = T;

    #[track_caller]
    fn deref(&self) -> &T {
        match self.try_get() {
            Some(v) => v,
            None => panic!("dereferenced an empty Shared handle"),
        }
    }
}

impl<T: ?Sized> HasOwner for Shared<T> {
    fn owner_id(&self) -> OwnerId {
        match &self.owner {
            Some(o) => OwnerId::from_addr(o.block.addr()),
            None => OwnerId::NONE,
        }
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<Shared<U>> for Shared<T> {
    fn eq(&self, other: &Shared<U>) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: ?Sized> Eq for Shared<T> {}

impl<T: ?Sized, U: ?Sized> PartialOrd<Shared<U>> for Shared<T> {
    fn partial_cmp(&self, other: &Shared<U>) -> Option<Ordering> {
        Some(self.addr().cmp(&other.addr()))
    }
}

impl<T: ?Sized> Ord for Shared<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl<T: ?Sized> Hash for Shared<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T: ?Sized> fmt::Pointer for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.addr(), f)
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_get() {
            Some(v) => f.debug_tuple("Shared").field(&v).finish(),
            None => f.write_str("Shared(<empty>)"),
        }
    }
}

/// Exchange two handles. No counts change.
pub fn swap<T: ?Sized>(a: &mut Shared<T>, b: &mut Shared<T>) {
    a.swap(b);
}
