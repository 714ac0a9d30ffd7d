//! Release policies: how a managed resource is given back.

use core::fmt;
use core::marker::PhantomData;
use std::ptr::NonNull;

/// Knows how to release a raw resource of type `T`.
///
/// Policies are stored by value next to the counters and invoked at most
/// once per managed pointer. Any `FnMut(NonNull<T>)` closure is a policy.
pub trait Release<T: ?Sized> {
    /// Release the resource behind `ptr`.
    ///
    /// # Safety
    /// `ptr` must be the resource this policy was paired with when ownership
    /// was taken, it must still be live, and it must not be used again
    /// afterwards.
    unsafe fn release(&mut self, ptr: NonNull<T>);
}

impl<T: ?Sized, F> Release<T> for F
where
    F: FnMut(NonNull<T>),
{
    #[inline]
    unsafe fn release(&mut self, ptr: NonNull<T>) {
        self(ptr)
    }
}

/// Policy for resources allocated through `Box`.
///
/// `DefaultRelease<T>` frees a single boxed value; `DefaultRelease<[T]>` is
/// the array form and frees a boxed slice together with every element.
pub struct DefaultRelease<T: ?Sized> {
    _marker: PhantomData<fn(*mut T)>,
}

impl<T: ?Sized> DefaultRelease<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Release<T> for DefaultRelease<T> {
    #[inline]
    unsafe fn release(&mut self, ptr: NonNull<T>) {
        // SAFETY: the caller guarantees `ptr` came from `Box::into_raw`
        // (or `Box::leak`) and is released only once.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

// Manual impls: derives would demand `T: Clone` and friends.
impl<T: ?Sized> Clone for DefaultRelease<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for DefaultRelease<T> {}

impl<T: ?Sized> Default for DefaultRelease<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for DefaultRelease<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultRelease")
    }
}
