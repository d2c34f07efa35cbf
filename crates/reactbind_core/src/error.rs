//! Error types for the core library

use core::fmt;

/// A checked downcast asked for a type the box does not hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatch {
    /// Type the caller asked for
    pub expected: &'static str,
    /// Type actually stored in the box
    pub found: &'static str,
}

impl TypeMismatch {
    /// Create a new mismatch record
    pub const fn new(expected: &'static str, found: &'static str) -> Self {
        Self { expected, found }
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type mismatch: expected {}, found {}", self.expected, self.found)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TypeMismatch {}
