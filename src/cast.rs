//! Pointer casts and release-policy lookup.
//!
//! Every cast returns a new `Shared` on the source's control block, so the
//! managed object lives as long as any of the results does. Casting an
//! empty handle yields an empty handle.

use crate::shared::Shared;
use core::any::Any;
use core::cell::Cell;
use std::ptr::NonNull;

/// Compile-time checked conversion of the stored reference, typically an
/// upcast to a trait object: `static_pointer_cast(&s, |c| c as &dyn Shape)`.
pub fn static_pointer_cast<T, U>(sp: &Shared<T>, convert: impl FnOnce(&T) -> &U) -> Shared<U>
where
    T: ?Sized,
    U: ?Sized,
{
    sp.project(convert)
}

/// Runtime checked conversion. `probe` returns `None` when the dynamic type
/// does not match, and the result is then empty.
pub fn dynamic_pointer_cast_with<T, U>(
    sp: &Shared<T>,
    probe: impl FnOnce(&T) -> Option<&U>,
) -> Shared<U>
where
    T: ?Sized,
    U: ?Sized,
{
    match sp.try_get().and_then(probe) {
        // SAFETY: `part` was borrowed from the object `sp` keeps alive.
        Some(part) => unsafe { Shared::alias(sp, NonNull::from(part)) },
        None => Shared::empty(),
    }
}

/// Downcast a type-erased handle to its concrete type; empty on mismatch.
pub fn dynamic_pointer_cast<U: Any>(sp: &Shared<dyn Any>) -> Shared<U> {
    dynamic_pointer_cast_with(sp, <dyn Any>::downcast_ref::<U>)
}

/// Give up the read-only view: the result permits mutation through `Cell`.
///
/// # Safety
/// While the result (or anything derived from it) mutates the object, no
/// reference obtained through another handle may be alive.
pub unsafe fn const_pointer_cast<T>(sp: &Shared<T>) -> Shared<Cell<T>> {
    match sp.get() {
        // SAFETY: `Cell<T>` is `repr(transparent)` over `T`; aliasing rules
        // are the caller's obligation.
        Some(ptr) => unsafe { Shared::alias(sp, ptr.cast::<Cell<T>>()) },
        None => Shared::empty(),
    }
}

/// Reinterpret the stored address as a `U`.
///
/// # Safety
/// The address must be valid for reads of `U` for as long as the source's
/// object is alive.
pub unsafe fn reinterpret_pointer_cast<T: ?Sized, U>(sp: &Shared<T>) -> Shared<U> {
    match sp.get() {
        Some(ptr) => unsafe { Shared::alias(sp, ptr.cast::<U>()) },
        None => Shared::empty(),
    }
}

/// The release policy stored in `sp`'s control block, if it is an `R`.
///
/// Returns `None` for an empty handle or when the stored policy has a
/// different type.
pub fn get_release_policy<R: Any, T: ?Sized>(sp: &Shared<T>) -> Option<&R> {
    sp.owner()?.block.release_policy().downcast_ref::<R>()
}
