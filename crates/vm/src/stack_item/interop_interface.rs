//! Host objects carried on the stack as `InteropInterface` items.

use std::any::Any;
use std::fmt::Debug;

/// An opaque host object that scripts can hold but not inspect.
///
/// Hosts downcast through [`InteropObject::as_any`] when a syscall receives
/// the item back.
pub trait InteropObject: Debug {
    /// A short name of the wrapped type, used in diagnostics.
    fn interface_type(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
