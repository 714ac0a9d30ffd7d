//! Linear counting tokens for the control block.
//!
//! Every strong or weak unit held by a handle is represented by a
//! zero-sized `Token` minted by the counter that counted it. Dropping a
//! token panics; the only valid way to dispose of one is to return it to
//! the originating counter via `Count::put`. Strong and weak tokens are
//! distinct types, so a weak unit can never be returned to the strong
//! counter by mistake.

use core::cell::Cell;
use core::marker::PhantomData;

/// Zero-sized, linear token tied to its originating counter via lifetime.
pub struct Token<'a, C: ?Sized> {
    // Lifetime is tracked separately from the counter type to avoid
    // imposing `'a` bounds on `C`.
    _lt: PhantomData<&'a ()>,
    _ctr: PhantomData<*const C>,
}

impl<'a, C: ?Sized> Token<'a, C> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            _lt: PhantomData,
            _ctr: PhantomData,
        }
    }
}

impl<'a, C: ?Sized> Drop for Token<'a, C> {
    fn drop(&mut self) {
        // Fail fast: a token must be consumed by Count::put.
        panic!("Token dropped without Count::put");
    }
}

/// A source of counted references, enforced by linear Token flow.
pub trait Count {
    /// The token type minted by this counter.
    type Token<'a>: Sized
    where
        Self: 'a;

    /// Acquire one counted unit and return a linear token for it.
    ///
    /// Tokens are minted with a `'static` lifetime parameter; they stay
    /// branded to this counter through their type and are covariantly
    /// shortened when returned via `put`.
    fn get(&self) -> Self::Token<'static>;

    /// Return (consume) a previously acquired token.
    /// Returns true if the count is now zero.
    fn put<'a>(&'a self, t: Self::Token<'a>) -> bool;

    /// Current number of outstanding units.
    fn count(&self) -> usize;
}

/// Marker for the strong (owning) family of units.
#[derive(Debug)]
pub enum StrongKind {}

/// Marker for the weak (observing) family of units.
#[derive(Debug)]
pub enum WeakKind {}

/// Single-threaded counter; `K` brands the tokens it mints.
#[derive(Debug)]
pub struct UsizeCount<K> {
    count: Cell<usize>,
    _kind: PhantomData<K>,
}

pub type StrongCount = UsizeCount<StrongKind>;
pub type WeakCount = UsizeCount<WeakKind>;

pub type StrongToken = Token<'static, StrongCount>;
pub type WeakToken = Token<'static, WeakCount>;

impl<K: 'static> UsizeCount<K> {
    pub const fn new() -> Self {
        Self {
            count: Cell::new(0),
            _kind: PhantomData,
        }
    }

    /// Acquire a unit only if at least one is already outstanding.
    ///
    /// This is the promotion primitive: once the count has reached zero it
    /// can never be brought back.
    #[inline]
    pub fn get_if_live(&self) -> Option<Token<'static, Self>> {
        if self.count.get() == 0 {
            None
        } else {
            Some(self.get())
        }
    }
}

impl<K: 'static> Count for UsizeCount<K> {
    type Token<'a>
        = Token<'a, Self>
    where
        Self: 'a;

    #[inline]
    fn get(&self) -> Self::Token<'static> {
        let n = self.count.get().wrapping_add(1);
        self.count.set(n);
        if n == 0 {
            // Follow Rc semantics: abort on overflow rather than continue unsafely.
            std::process::abort();
        }
        Token::<'static, Self>::new()
    }

    #[inline]
    fn put<'a>(&'a self, t: Self::Token<'a>) -> bool {
        let c = self.count.get();
        assert!(c > 0, "UsizeCount underflow");
        let n = c - 1;
        self.count.set(n);
        core::mem::forget(t);
        n == 0
    }

    #[inline]
    fn count(&self) -> usize {
        self.count.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_put_track_count() {
        let c = StrongCount::new();
        let a = c.get();
        let b = c.get();
        assert_eq!(c.count(), 2);
        assert!(!c.put(a));
        assert!(c.put(b));
        assert_eq!(c.count(), 0);
    }

    #[test]
    fn get_if_live_refuses_at_zero() {
        let c = WeakCount::new();
        assert!(c.get_if_live().is_none());
        let first = c.get();
        let second = c.get_if_live().expect("count is live");
        assert_eq!(c.count(), 2);
        c.put(second);
        assert!(c.put(first));
        assert!(c.get_if_live().is_none());
    }

    #[test]
    fn strong_and_weak_counters_are_independent() {
        let strong = StrongCount::new();
        let weak = WeakCount::new();
        let s: StrongToken = strong.get();
        let w1: WeakToken = weak.get();
        let w2: WeakToken = weak.get();
        assert_eq!((strong.count(), weak.count()), (1, 2));
        assert!(strong.put(s));
        assert_eq!(weak.count(), 2);
        assert!(!weak.put(w1));
        assert!(weak.put(w2));
    }

    #[test]
    fn dropping_a_token_panics() {
        let c = StrongCount::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let t = c.get();
            drop(t);
        }));
        assert!(res.is_err(), "expected stray token drop to panic");
    }
}
