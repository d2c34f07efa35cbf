//! Opaque value boxes for crossing the host boundary
//!
//! A [`ValueBox`] carries a typed value into storage owned by the host
//! renderer and back out again. Boxes are reference counted: every clone and
//! every successful downcast points at the same allocation, so identity
//! comparisons made on the host side stay meaningful.
//!
//! Unboxing is a checked downcast. Asking for the wrong type yields a
//! [`TypeMismatch`] instead of reinterpreting memory.

use core::any::{Any, TypeId};
use core::fmt;
use alloc::rc::Rc;

use crate::error::TypeMismatch;

/// Host-visible handle around a typed value
#[derive(Clone)]
pub struct ValueBox {
    value: Rc<dyn Any>,
    type_name: &'static str,
}

impl ValueBox {
    /// Box a value, taking ownership of it
    pub fn wrap<T: 'static>(value: T) -> Self {
        Self::from_rc(Rc::new(value))
    }

    /// Box an already shared value without copying it
    pub fn from_rc<T: 'static>(value: Rc<T>) -> Self {
        let value: Rc<dyn Any> = value;
        Self {
            value,
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Checked downcast. The returned `Rc` shares the boxed allocation.
    pub fn downcast<T: 'static>(&self) -> Result<Rc<T>, TypeMismatch> {
        Rc::clone(&self.value)
            .downcast::<T>()
            .map_err(|_| TypeMismatch::new(core::any::type_name::<T>(), self.type_name))
    }

    /// Borrow the boxed value if it has type `T`
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Check whether the box holds a `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Host reference equality: both boxes share one allocation
    #[inline]
    pub fn ptr_eq(&self, other: &ValueBox) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }

    /// Name of the boxed type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// TypeId of the boxed value
    pub fn value_type_id(&self) -> TypeId {
        Any::type_id(&*self.value)
    }
}

impl PartialEq for ValueBox {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ValueBox {}

impl fmt::Debug for ValueBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueBox<{}>({:p})", self.type_name, Rc::as_ptr(&self.value) as *const ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    #[derive(Debug, PartialEq)]
    struct Counter {
        count: i32,
    }

    #[test]
    fn test_wrap_unwrap_value() {
        let boxed = ValueBox::wrap(Counter { count: 3 });
        let out = boxed.downcast::<Counter>().unwrap();
        assert_eq!(*out, Counter { count: 3 });
    }

    #[test]
    fn test_unwrap_preserves_identity() {
        let shared = Rc::new(RefCell::new(vec![1, 2]));
        let boxed = ValueBox::from_rc(Rc::clone(&shared));

        let first = boxed.downcast::<RefCell<Vec<i32>>>().unwrap();
        let second = boxed.downcast::<RefCell<Vec<i32>>>().unwrap();
        assert!(Rc::ptr_eq(&first, &shared));
        assert!(Rc::ptr_eq(&first, &second));

        first.borrow_mut().push(3);
        assert_eq!(*shared.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_type_mismatch() {
        let boxed = ValueBox::wrap(42u32);
        let err = boxed.downcast::<String>().unwrap_err();
        assert_eq!(err.found, "u32");
        assert!(err.expected.contains("String"));
        assert!(boxed.downcast_ref::<String>().is_none());
        assert!(boxed.is::<u32>());
        assert_eq!(boxed.value_type_id(), TypeId::of::<u32>());
    }

    #[test]
    fn test_box_equality_is_identity() {
        let a = ValueBox::wrap(1);
        let b = a.clone();
        let c = ValueBox::wrap(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
