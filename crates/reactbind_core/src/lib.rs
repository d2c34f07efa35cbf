//! # reactbind_core - Binding Primitives
//!
//! Zero-dependency building blocks shared by the component bridge:
//! - **Value boxes**: checked, identity-preserving handles for typed values
//!   stored in host-owned slots
//! - **Capabilities**: the optional lifecycle methods a component type
//!   implements, as a compact bitset computed once per type
//! - **Shape info**: per-type metadata (display name, props/state types)
//!
//! Everything here is single-threaded by construction. Boxes are reference
//! counted with `Rc` and never cross threads.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

pub mod capability;
pub mod error;
pub mod shape;
pub mod value;

pub use capability::*;
pub use error::*;
pub use shape::*;
pub use value::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::capability::{Capability, CapabilitySet};
    pub use crate::error::TypeMismatch;
    pub use crate::shape::ShapeInfo;
    pub use crate::value::ValueBox;
}
