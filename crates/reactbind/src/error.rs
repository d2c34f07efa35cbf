//! Error types for the component bridge

use reactbind_core::{TypeMismatch, ValueBox};
use std::rc::Rc;
use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur in the component bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A host slot held a value of the wrong type. Always a binding bug.
    #[error("{component}: slot '{slot}' expected {expected}, found {found}")]
    TypeMismatch {
        component: String,
        slot: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// File watcher failure
    #[cfg(feature = "hot-reload")]
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl BridgeError {
    /// Attach the component and slot names to a failed downcast
    pub fn type_mismatch(component: impl Into<String>, slot: &'static str, mismatch: TypeMismatch) -> Self {
        BridgeError::TypeMismatch {
            component: component.into(),
            slot,
            expected: mismatch.expected,
            found: mismatch.found,
        }
    }
}

/// Unbox a host slot inside a lifecycle callback.
///
/// A mismatch means generated bindings disagree with the component
/// definition; it aborts with the component and slot named.
pub(crate) fn unbox<T: 'static>(component: &str, slot: &'static str, value: &ValueBox) -> Rc<T> {
    match value.downcast::<T>() {
        Ok(value) => value,
        Err(mismatch) => panic!("{}", BridgeError::type_mismatch(component, slot, mismatch)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_names_component_and_slot() {
        let err = BridgeError::type_mismatch("Counter(app)", "_props", TypeMismatch::new("app::Props", "u32"));
        let message = err.to_string();
        assert!(message.contains("Counter(app)"));
        assert!(message.contains("_props"));
        assert!(message.contains("app::Props"));
    }

    #[test]
    #[should_panic(expected = "slot '__lastState'")]
    fn test_unbox_aborts_on_mismatch() {
        let boxed = ValueBox::wrap(1u8);
        let _ = unbox::<String>("Greeter(app)", "__lastState", &boxed);
    }
}
