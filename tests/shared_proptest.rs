// Shared/Weak property tests.
//
// Model: a pool of live Shared handles and a pool of Weak handles, all on
// one control block, plus a drop counter for the managed object.
//  - Invariant: every live Shared reports use_count() == live.len().
//  - Invariant: the object has been released (once) iff live is empty.
//  - Invariant: every Weak reports expired() == live.is_empty(), and once
//    expired stays expired.
//  - Operations: clone, drop, take (move), reset, alias, downgrade,
//    lock, drop-weak, swap with an unrelated handle and back.
use proptest::prelude::*;
use shared_owner::{HasOwner, Shared, Weak};
use std::cell::Cell;
use std::rc::Rc;

struct Tracked {
    drops: Rc<Cell<usize>>,
    fields: (u32, u32),
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

proptest! {
    #[test]
    fn prop_use_count_matches_live_handles(ops in proptest::collection::vec((0u8..=8u8, 0usize..64usize), 1..120)) {
        let drops = Rc::new(Cell::new(0));
        let first = Shared::new(Tracked { drops: drops.clone(), fields: (1, 2) });
        let owner = first.owner_id();
        let mut live: Vec<Shared<Tracked>> = vec![first];
        let mut aliases: Vec<Shared<u32>> = Vec::new();
        let mut weaks: Vec<Weak<Tracked>> = Vec::new();
        let mut was_expired = false;

        for (op, raw) in ops {
            match op {
                // Clone one live handle.
                0 => {
                    if !live.is_empty() {
                        let c = live[raw % live.len()].clone();
                        live.push(c);
                    }
                }
                // Drop one live handle.
                1 => {
                    if !live.is_empty() {
                        let i = raw % live.len();
                        drop(live.swap_remove(i));
                    }
                }
                // Move out of a handle; the source is left empty.
                2 => {
                    if !live.is_empty() {
                        let i = raw % live.len();
                        let moved = live[i].take();
                        prop_assert!(live[i].is_empty());
                        live.swap_remove(i);
                        live.push(moved);
                    }
                }
                // Reset a handle in place.
                3 => {
                    if !live.is_empty() {
                        let i = raw % live.len();
                        let mut h = live.swap_remove(i);
                        h.reset();
                        prop_assert_eq!(h.use_count(), 0);
                    }
                }
                // Project to a field; the alias counts as an owner.
                4 => {
                    if let Some(h) = live.first() {
                        aliases.push(h.project(|t| &t.fields.1));
                    }
                }
                // Drop an alias.
                5 => {
                    if !aliases.is_empty() {
                        let i = raw % aliases.len();
                        drop(aliases.swap_remove(i));
                    }
                }
                // Observe.
                6 => {
                    if let Some(h) = live.get(raw % live.len().max(1)) {
                        weaks.push(h.downgrade());
                    }
                }
                // Promote an observer, or drop one.
                7 => {
                    if !weaks.is_empty() {
                        let i = raw % weaks.len();
                        if raw % 2 == 0 {
                            let locked = weaks[i].lock();
                            prop_assert_eq!(locked.is_empty(), was_expired);
                            if !locked.is_empty() {
                                prop_assert_eq!(locked.fields.0, 1);
                                live.push(locked);
                            }
                        } else {
                            drop(weaks.swap_remove(i));
                        }
                    }
                }
                // Swap with an unrelated handle and back: no count change.
                8 => {
                    if !live.is_empty() {
                        let i = raw % live.len();
                        let mut other = Shared::new(Tracked { drops: Rc::new(Cell::new(0)), fields: (0, 0) });
                        live[i].swap(&mut other);
                        prop_assert_eq!(other.use_count(), live.len() + aliases.len());
                        live[i].swap(&mut other);
                        prop_assert!(live[i].owner_id() == owner);
                    }
                }
                _ => unreachable!(),
            }

            let strong = live.len() + aliases.len();
            for h in &live {
                prop_assert_eq!(h.use_count(), strong);
            }
            for a in &aliases {
                prop_assert_eq!(a.use_count(), strong);
                prop_assert_eq!(**a, 2);
            }
            let expired = strong == 0;
            prop_assert!(!(was_expired && !expired), "object came back to life");
            prop_assert_eq!(drops.get(), usize::from(expired));
            for w in &weaks {
                prop_assert_eq!(w.expired(), expired);
            }
            was_expired = expired;
        }

        drop(live);
        drop(aliases);
        prop_assert_eq!(drops.get(), 1);
        for w in &weaks {
            prop_assert!(w.expired());
        }
    }
}
