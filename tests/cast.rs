// Cast and release-policy lookup tests.
//
// Every cast shares the source's control block: the object outlives any
// of the results, and a failed dynamic cast yields an empty handle that
// does not disturb the count.
use shared_owner::{
    const_pointer_cast, dynamic_pointer_cast, dynamic_pointer_cast_with, get_release_policy,
    reinterpret_pointer_cast, static_pointer_cast, DefaultRelease, HasOwner, Shared,
};
use std::any::Any;
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

trait Shape {
    fn area(&self) -> f64;
    fn as_any(&self) -> &dyn Any;
}

struct Square(f64);
struct Circle(f64);

impl Shape for Square {
    fn area(&self) -> f64 {
        self.0 * self.0
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Shape for Circle {
    fn area(&self) -> f64 {
        3.0 * self.0 * self.0
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn static_cast_upcasts_to_trait_object() {
    let sq = Shared::new(Square(2.0));
    let shape: Shared<dyn Shape> = static_pointer_cast(&sq, |s| s as &dyn Shape);
    assert_eq!(shape.area(), 4.0);
    assert_eq!(shape.use_count(), 2);
    assert!(shape == sq);
    drop(sq);
    assert_eq!(shape.area(), 4.0);
}

// Round-trip base -> derived -> base keeps address and count.
#[test]
fn dynamic_cast_round_trip() {
    let any: Shared<dyn Any> = static_pointer_cast(&Shared::new(Square(3.0)), |s| s as &dyn Any);
    assert_eq!(any.use_count(), 1);

    let sq: Shared<Square> = dynamic_pointer_cast(&any);
    assert!(!sq.is_empty());
    assert_eq!(sq.0, 3.0);
    let back: Shared<dyn Any> = static_pointer_cast(&sq, |s| s as &dyn Any);

    assert_eq!(back.addr(), any.addr());
    assert_eq!(back.use_count(), any.use_count());
    assert_eq!(any.use_count(), 3);
    assert!(back.owner_eq(&any));
}

#[test]
fn failed_dynamic_cast_is_empty_and_uncounted() {
    let drops = Rc::new(Cell::new(0));
    struct Tracked(Rc<Cell<usize>>);
    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    let any: Shared<dyn Any> =
        static_pointer_cast(&Shared::new(Tracked(drops.clone())), |t| t as &dyn Any);
    let wrong: Shared<Square> = dynamic_pointer_cast(&any);
    assert!(wrong.is_empty());
    assert_eq!(wrong.use_count(), 0);
    assert_eq!(any.use_count(), 1);

    drop(any);
    assert_eq!(drops.get(), 1, "object released although a failed cast exists");
    drop(wrong);
    assert_eq!(drops.get(), 1);
}

#[test]
fn dynamic_cast_with_custom_probe() {
    let shape: Shared<dyn Shape> = static_pointer_cast(&Shared::new(Circle(1.0)), |c| c as &dyn Shape);
    let circle: Shared<Circle> =
        dynamic_pointer_cast_with(&shape, |s| s.as_any().downcast_ref::<Circle>());
    let square: Shared<Square> =
        dynamic_pointer_cast_with(&shape, |s| s.as_any().downcast_ref::<Square>());
    assert_eq!(circle.0, 1.0);
    assert!(square.is_empty());
    assert_eq!(shape.use_count(), 2);
}

#[test]
fn casts_of_empty_handles_are_empty() {
    let empty: Shared<dyn Any> = Shared::empty();
    assert!(dynamic_pointer_cast::<u8>(&empty).is_empty());
    assert!(static_pointer_cast(&Shared::<u8>::empty(), |v| v as &dyn Any).is_empty());
    assert!(unsafe { reinterpret_pointer_cast::<u8, i8>(&Shared::empty()) }.is_empty());
    assert!(unsafe { const_pointer_cast(&Shared::<u8>::empty()) }.is_empty());
}

#[test]
fn const_cast_allows_mutation_through_shared_block() {
    let a = Shared::new(1u32);
    let cell = unsafe { const_pointer_cast(&a) };
    cell.set(41);
    // `Shared::get` shadows `Cell::get`; go through the target explicitly.
    let current = (*cell).get();
    cell.set(current + 1);
    assert_eq!(cell.addr(), a.addr());
    assert_eq!(a.use_count(), 2);
    drop(cell);
    assert_eq!(*a, 42);
}

#[test]
fn reinterpret_cast_keeps_address() {
    #[repr(transparent)]
    struct Meters(u64);

    let m = Shared::new(Meters(7));
    let raw: Shared<u64> = unsafe { reinterpret_pointer_cast(&m) };
    assert_eq!(*raw, 7);
    assert_eq!(raw.addr(), m.addr());
    assert_eq!(m.use_count(), 2);
}

#[test]
fn release_policy_lookup_is_type_checked() {
    let boxed = Shared::new(3i32);
    assert!(get_release_policy::<DefaultRelease<i32>, _>(&boxed).is_some());
    assert!(get_release_policy::<DefaultRelease<u8>, _>(&boxed).is_none());

    #[derive(Debug, PartialEq)]
    struct Tagged(&'static str);
    impl shared_owner::Release<i32> for Tagged {
        unsafe fn release(&mut self, ptr: NonNull<i32>) {
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
        }
    }
    let raw = NonNull::from(Box::leak(Box::new(5i32)));
    let tagged = unsafe { Shared::from_raw_with(raw, Tagged("pool")) };
    // Aliases and casts reach the same block, hence the same policy.
    let alias: Shared<dyn Any> = static_pointer_cast(&tagged, |v| v as &dyn Any);
    assert_eq!(get_release_policy::<Tagged, _>(&alias), Some(&Tagged("pool")));
    assert!(get_release_policy::<Tagged, _>(&Shared::<i32>::empty()).is_none());
}
