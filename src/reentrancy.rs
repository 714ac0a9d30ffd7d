//! Debug-only checks for the release path of a control block.
//!
//! `DebugReentrancy` detects nested entry into the release path and lets
//! the reclaim path assert that no release is still running. `DebugOnce`
//! latches the first entry so a second release of the same object panics.
//! In release builds, both compile to zero-cost no-ops.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-block reentrancy tracker. Guard the release path with
/// `let _g = self.reentrancy.enter();`.
#[derive(Debug)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    depth: Cell<u32>,
    // Keep !Send + !Sync in line with single-threaded design.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            depth: Cell::new(0),
            _nosend: PhantomData,
        }
    }

    /// Enter a guarded section. In debug builds, panics if already entered.
    #[inline]
    pub fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            let d = self.depth.get();
            assert!(d == 0, "reentrancy detected: nested release of one control block");
            self.depth.set(d + 1);
            return ReentrancyGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return ReentrancyGuard { _z: PhantomData };
        }
    }

    /// True while a guard is held. Always false in release builds.
    #[inline]
    pub fn is_entered(&self) -> bool {
        #[cfg(debug_assertions)]
        {
            return self.depth.get() > 0;
        }

        #[cfg(not(debug_assertions))]
        {
            return false;
        }
    }
}

/// RAII guard returned by `DebugReentrancy::enter`.
pub struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl<'a> Drop for ReentrancyGuard<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let d = self.owner.depth.get();
            debug_assert!(d > 0);
            self.owner.depth.set(d - 1);
        }
    }
}

/// Latch that may be tripped once. Debug builds panic on the second trip.
#[derive(Debug)]
pub struct DebugOnce {
    #[cfg(debug_assertions)]
    tripped: Cell<bool>,
    _nosend: PhantomData<*mut ()>,
}

impl DebugOnce {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            tripped: Cell::new(false),
            _nosend: PhantomData,
        }
    }

    #[inline]
    pub fn trip(&self, what: &'static str) {
        #[cfg(debug_assertions)]
        {
            assert!(!self.tripped.replace(true), "{what} ran twice");
        }
        #[cfg(not(debug_assertions))]
        {
            let _ = what;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DebugOnce, DebugReentrancy};

    #[test]
    fn enter_and_exit_is_ok() {
        let r = DebugReentrancy::new();
        {
            let _g = r.enter();
        }
        let _g = r.enter();
    }

    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_in_debug() {
        let r = DebugReentrancy::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _g1 = r.enter();
            assert!(r.is_entered());
            let _g2 = r.enter();
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn second_trip_panics_in_debug() {
        let once = DebugOnce::new();
        once.trip("release");
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            once.trip("release");
        }));
        assert!(res.is_err(), "expected a second trip to panic");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn checks_are_noops_in_release() {
        let r = DebugReentrancy::new();
        let _g1 = r.enter();
        let _g2 = r.enter();
        assert!(!r.is_entered());
        let once = DebugOnce::new();
        once.trip("release");
        once.trip("release");
    }
}
