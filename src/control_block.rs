//! Control block: the counters, the managed pointer and its release policy.
//!
//! A block is allocated once per managed object and shared by every
//! `Shared` and `Weak` handle for that object. Handles never look at the
//! concrete block type; they hold a `BlockRef`, a raw pointer to the
//! type-erased `ControlBlock` trait object.
//!
//! Counting discipline
//! - `strong` counts owning handles. The object is released on the
//!   `1 -> 0` transition and never again.
//! - `weak` counts observing handles plus one implicit unit held by the
//!   strong family as a whole. The implicit unit is returned right after
//!   the object is released, so a `Weak` dropped from inside the object's
//!   destructor can never reclaim the block underneath the release.
//! - The block reclaims itself when `weak` reaches zero, which implies
//!   `strong` is zero too.

use crate::count::{Count, StrongCount, StrongToken, WeakCount, WeakToken};
use crate::reentrancy::{DebugOnce, DebugReentrancy};
use crate::release::Release;
use core::any::Any;
use core::cell::{Cell, UnsafeCell};
use std::ptr::NonNull;

/// Counters shared by every block type.
pub(crate) struct Counts {
    strong: StrongCount,
    weak: WeakCount,
    // Weak unit owned by the strong family; taken when strong hits zero.
    implicit_weak: Cell<Option<WeakToken>>,
}

impl Counts {
    /// Counters for a fresh block: one strong unit for the creating handle
    /// and the implicit weak unit.
    fn new() -> (Self, StrongToken) {
        let counts = Counts {
            strong: StrongCount::new(),
            weak: WeakCount::new(),
            implicit_weak: Cell::new(None),
        };
        let token = counts.strong.get();
        counts.implicit_weak.set(Some(counts.weak.get()));
        (counts, token)
    }

    /// True until the strong family hands its implicit weak unit back.
    ///
    /// Still true while the object is being released, and forever after a
    /// release policy panicked.
    fn holds_implicit_weak(&self) -> bool {
        let implicit = self.implicit_weak.take();
        let held = implicit.is_some();
        self.implicit_weak.set(implicit);
        held
    }
}

/// Type-erased view of a control block.
pub(crate) trait ControlBlock {
    fn counts(&self) -> &Counts;

    /// Run the release policy on the managed pointer.
    ///
    /// # Safety
    /// Only on the `1 -> 0` strong transition.
    unsafe fn release_object(&self);

    /// The stored policy, for typed retrieval through `Any`.
    fn release_policy(&self) -> &dyn Any;

    /// Debug-only: true while `release_object` is running.
    fn is_releasing(&self) -> bool;
}

struct Block<U: ?Sized, R> {
    counts: Counts,
    managed: Cell<Option<NonNull<U>>>,
    managed_addr: *const (),
    policy: UnsafeCell<R>,
    reentrancy: DebugReentrancy,
    released: DebugOnce,
}

impl<U, R> ControlBlock for Block<U, R>
where
    U: ?Sized + 'static,
    R: Release<U> + 'static,
{
    #[inline]
    fn counts(&self) -> &Counts {
        &self.counts
    }

    unsafe fn release_object(&self) {
        let _g = self.reentrancy.enter();
        self.released.trip("release policy");
        if let Some(ptr) = self.managed.take() {
            log::trace!("releasing managed object {:p}", self.managed_addr);
            // SAFETY: strong is zero, so no handle can reach the policy
            // through `release_policy` while this exclusive borrow exists.
            let policy = unsafe { &mut *self.policy.get() };
            unsafe { policy.release(ptr) };
        }
    }

    fn release_policy(&self) -> &dyn Any {
        // SAFETY: only reachable through a strong handle, so never while
        // `release_object` holds the policy mutably.
        unsafe { &*self.policy.get() }
    }

    fn is_releasing(&self) -> bool {
        self.reentrancy.is_entered()
    }
}

/// Uncounted pointer to a live control block.
///
/// Copying a `BlockRef` does not count anything; the counted unit lives in
/// the token stored next to it in a handle.
#[derive(Clone, Copy)]
pub(crate) struct BlockRef(NonNull<dyn ControlBlock>);

impl BlockRef {
    /// Allocate a block taking ownership of `ptr` under `policy`.
    ///
    /// # Safety
    /// `policy` must be able to release `ptr`, and nothing else may release it.
    pub(crate) unsafe fn allocate<U, R>(ptr: NonNull<U>, policy: R) -> (BlockRef, StrongToken)
    where
        U: ?Sized + 'static,
        R: Release<U> + 'static,
    {
        let (counts, token) = Counts::new();
        let block: Box<dyn ControlBlock> = Box::new(Block {
            counts,
            managed: Cell::new(Some(ptr)),
            managed_addr: ptr.as_ptr() as *const (),
            policy: UnsafeCell::new(policy),
            reentrancy: DebugReentrancy::new(),
            released: DebugOnce::new(),
        });
        let raw = NonNull::from(Box::leak(block));
        log::trace!(
            "allocated control block {:p} for {:p}",
            raw.as_ptr() as *const (),
            ptr.as_ptr() as *const ()
        );
        (BlockRef(raw), token)
    }

    #[inline]
    fn block(&self) -> &dyn ControlBlock {
        // SAFETY: a BlockRef is only held next to a live token, and the
        // block outlives every token minted from it.
        unsafe { self.0.as_ref() }
    }

    #[inline]
    fn counts(&self) -> &Counts {
        self.block().counts()
    }

    /// Mint one more strong unit; the block must already have one.
    #[inline]
    pub(crate) fn inc_strong(&self) -> StrongToken {
        debug_assert!(self.counts().strong.count() > 0);
        self.counts().strong.get()
    }

    /// Mint a strong unit only if the object is still alive.
    #[inline]
    pub(crate) fn try_inc_strong(&self) -> Option<StrongToken> {
        self.counts().strong.get_if_live()
    }

    /// Return a strong unit; releases the object on the last one.
    ///
    /// The block may be reclaimed before this returns; `self` must not be
    /// used afterwards.
    pub(crate) fn dec_strong(self, token: StrongToken) {
        if !self.counts().strong.put(token) {
            return;
        }
        // SAFETY: this was the 1 -> 0 transition.
        unsafe { self.block().release_object() };
        let implicit = self
            .counts()
            .implicit_weak
            .take()
            .expect("implicit weak unit is held until the strong family is gone");
        self.dec_weak(implicit);
    }

    #[inline]
    pub(crate) fn inc_weak(&self) -> WeakToken {
        self.counts().weak.get()
    }

    /// Return a weak unit; reclaims the block on the last one.
    pub(crate) fn dec_weak(self, token: WeakToken) {
        if self.counts().weak.put(token) {
            self.reclaim();
        }
    }

    fn reclaim(self) {
        debug_assert_eq!(self.counts().strong.count(), 0);
        debug_assert!(
            !self.block().is_releasing(),
            "control block reclaimed while its object was being released"
        );
        log::trace!("reclaiming control block {:p}", self.addr());
        // SAFETY: weak reached zero, so no handle refers to the block any more;
        // the pointer came from `Box::leak` in `allocate`.
        drop(unsafe { Box::from_raw(self.0.as_ptr()) });
    }

    #[inline]
    pub(crate) fn strong_count(&self) -> usize {
        self.counts().strong.count()
    }

    /// Observer count, without the implicit unit held by the strong family.
    #[inline]
    pub(crate) fn weak_count(&self) -> usize {
        let counts = self.counts();
        counts.weak.count() - usize::from(counts.holds_implicit_weak())
    }

    #[inline]
    pub(crate) fn is_unique(&self) -> bool {
        self.strong_count() == 1
    }

    #[inline]
    pub(crate) fn release_policy(&self) -> &dyn Any {
        self.block().release_policy()
    }

    /// Identity of the block, used for owner-based ordering.
    #[inline]
    pub(crate) fn addr(&self) -> *const () {
        self.0.as_ptr() as *const ()
    }
}
