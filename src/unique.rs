//! Exclusive ownership: one owner, released on drop.
//!
//! `Unique` is the single-owner counterpart of `Shared`. It carries its
//! release policy inline and never allocates bookkeeping. The shared core
//! adopts a `Unique` through the `Surrender` trait.

use crate::release::{DefaultRelease, Release};
use core::fmt;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// Source of an exclusively owned resource that can hand it over.
///
/// `surrender` must leave the source empty: afterwards it no longer
/// releases the returned pointer.
pub trait Surrender<T: ?Sized> {
    type Policy: Release<T>;

    /// Relinquish the raw pointer (if any) and a policy able to release it.
    fn surrender(&mut self) -> (Option<NonNull<T>>, Self::Policy);
}

/// Single-owner handle; releases its resource through `R` on drop.
pub struct Unique<T: ?Sized, R: Release<T> = DefaultRelease<T>> {
    ptr: Option<NonNull<T>>,
    policy: R,
    _owns: PhantomData<T>,
}

impl<T> Unique<T> {
    pub fn new(value: T) -> Self {
        Unique::from(Box::new(value))
    }
}

impl<T: ?Sized> From<Box<T>> for Unique<T> {
    fn from(b: Box<T>) -> Self {
        Unique {
            ptr: Some(NonNull::from(Box::leak(b))),
            policy: DefaultRelease::new(),
            _owns: PhantomData,
        }
    }
}

impl<T: ?Sized, R: Release<T>> Unique<T, R> {
    /// Take ownership of `ptr`, to be released through `policy`.
    ///
    /// # Safety
    /// `ptr` must be live and releasable by `policy`, and no other owner may
    /// release it.
    pub unsafe fn from_raw_with(ptr: NonNull<T>, policy: R) -> Self {
        Unique {
            ptr: Some(ptr),
            policy,
            _owns: PhantomData,
        }
    }

    /// An empty handle that will use `policy` once it owns something.
    pub fn empty_with(policy: R) -> Self {
        Unique {
            ptr: None,
            policy,
            _owns: PhantomData,
        }
    }

    pub fn get(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    pub fn try_get(&self) -> Option<&T> {
        // SAFETY: an owned pointer stays live until this handle releases it.
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    pub fn try_get_mut(&mut self) -> Option<&mut T> {
        // SAFETY: exclusive ownership plus `&mut self`.
        self.ptr.map(|p| unsafe { &mut *p.as_ptr() })
    }

    /// Give up ownership without releasing; the handle becomes empty.
    pub fn release(&mut self) -> Option<NonNull<T>> {
        self.ptr.take()
    }

    pub fn release_policy(&self) -> &R {
        &self.policy
    }

    pub fn release_policy_mut(&mut self) -> &mut R {
        &mut self.policy
    }

    /// Release the current resource (if any) and become empty.
    pub fn reset(&mut self) {
        if let Some(p) = self.ptr.take() {
            // SAFETY: `p` was owned by this handle and is now forgotten by it.
            unsafe { self.policy.release(p) };
        }
    }

    /// Release the current resource and take ownership of `ptr` instead.
    ///
    /// # Safety
    /// Same contract as `from_raw_with` for the stored policy.
    pub unsafe fn reset_raw(&mut self, ptr: NonNull<T>) {
        let old = self.ptr.replace(ptr);
        if let Some(p) = old {
            unsafe { self.policy.release(p) };
        }
    }

    /// Split into the raw pointer and the policy without releasing anything.
    pub fn into_parts(self) -> (Option<NonNull<T>>, R) {
        let mut this = ManuallyDrop::new(self);
        let ptr = this.ptr.take();
        // SAFETY: `this` is never dropped, so the policy is moved out once.
        let policy = unsafe { core::ptr::read(&this.policy) };
        (ptr, policy)
    }
}

impl<T: ?Sized, R: Release<T>> Drop for Unique<T, R> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized, R: Release<T> + Clone> Surrender<T> for Unique<T, R> {
    type Policy = R;

    fn surrender(&mut self) -> (Option<NonNull<T>>, R) {
        (self.release(), self.policy.clone())
    }
}

impl<T: ?Sized, R: Release<T>> Deref for Unique<T, R> {
    type Target = T;

    fn deref(&self) -> &T {
        self.try_get().expect("dereferenced an empty Unique")
    }
}

impl<T: ?Sized, R: Release<T>> DerefMut for Unique<T, R> {
    fn deref_mut(&mut self) -> &mut T {
        self.try_get_mut().expect("dereferenced an empty Unique")
    }
}

impl<T: ?Sized + fmt::Debug, R: Release<T>> fmt::Debug for Unique<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_get() {
            Some(v) => f.debug_tuple("Unique").field(&v).finish(),
            None => f.write_str("Unique(<empty>)"),
        }
    }
}
