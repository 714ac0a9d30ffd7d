//! shared-owner: single-threaded exclusive, shared and weak ownership
//! handles with pluggable release policies.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: deterministic release of dynamically allocated resources with
//!   zero, one or many owners, without a garbage collector.
//! - Layers:
//!   - `Release<T>`: how a resource is given back (`DefaultRelease` for
//!     `Box` allocations, any `FnMut(NonNull<T>)` for everything else).
//!   - Counters (`count`): `Cell`-based counters that mint linear,
//!     zero-sized tokens; one token per counted unit.
//!   - Control block: strong/weak counters, the managed pointer and the
//!     policy, type-erased behind a trait object.
//!   - Handles: `Unique<T, R>` (exclusive), `Shared<T>` (strong) and
//!     `Weak<T>` (observer). Shared and weak handles pair a pointer with a
//!     control block reference and a token.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` by design (no atomics). Counters are
//!   plain read-modify-write; sharing a control block across threads is
//!   not supported even with external locking of individual handles.
//! - Objects are released exactly once, on the strong `1 -> 0` transition.
//! - Control blocks are reclaimed exactly once, when no strong or weak
//!   unit remains.
//! - A `Weak` never dereferences; promotion fails once the object is gone.
//!
//! Why tokens?
//! - Every increment hands back a token and every decrement consumes one,
//!   so a handle cannot give back a unit it never took. Dropping a token
//!   panics, which turns a leaked or double-counted unit into a loud bug.
//!
//! Aliasing and casts
//! - A `Shared<T>` may store a pointer other than the managed object (a
//!   field, a trait-object view, a downcast). Value comparisons (`==`,
//!   `<`, `Hash`) use that stored address; owner comparisons
//!   (`owner_before`, `ByOwner`) use the control block.
//!
//! Release hazards
//! - A release policy is caller code. If it panics, the panic propagates
//!   out of the drop that triggered it; the object counts as released and
//!   the control block is leaked rather than freed twice.
//!
//! Overflow semantics
//! - Counter overflow aborts the process, matching `Rc`.
//!
//! Logging
//! - Control block allocation, object release and block reclamation are
//!   reported through `log` at trace level.

mod cast;
mod control_block;
mod count;
mod error;
mod owner;
mod reentrancy;
mod release;
mod shared;
mod unique;
mod weak;

// Public surface
pub use cast::{
    const_pointer_cast, dynamic_pointer_cast, dynamic_pointer_cast_with, get_release_policy,
    reinterpret_pointer_cast, static_pointer_cast,
};
pub use error::Expired;
pub use owner::{ByOwner, HasOwner, OwnerId};
pub use release::{DefaultRelease, Release};
pub use shared::{swap, Shared};
pub use unique::{Surrender, Unique};
pub use weak::Weak;
