//! Per-type component metadata
//!
//! Derived once per component type when its shape is built, never
//! recomputed per lifecycle call.

use core::any::TypeId;
use core::fmt;
use alloc::format;
use alloc::string::{String, ToString};

use crate::capability::{Capability, CapabilitySet};

/// Static description of a component type
#[derive(Clone)]
pub struct ShapeInfo {
    /// The Rust TypeId of the component
    pub type_id: TypeId,
    /// Fully qualified type name
    pub type_name: &'static str,
    /// Name reported to the host, `Name(module::path)`
    pub display_name: String,
    /// Fully qualified props type name
    pub props_type: &'static str,
    /// Fully qualified state type name
    pub state_type: &'static str,
    /// Stable cache tag, `None` for anonymous components
    pub tag: Option<&'static str>,
    /// Optional lifecycle methods implemented
    pub capabilities: CapabilitySet,
}

impl ShapeInfo {
    /// Describe component `C` with props `P` and state `S`
    pub fn of<C: 'static, P: 'static, S: 'static>(tag: Option<&'static str>) -> Self {
        let type_name = core::any::type_name::<C>();
        Self {
            type_id: TypeId::of::<C>(),
            type_name,
            display_name: display_name(type_name),
            props_type: core::any::type_name::<P>(),
            state_type: core::any::type_name::<S>(),
            tag,
            capabilities: CapabilitySet::EMPTY,
        }
    }

    /// Record a capability
    pub fn declare(&mut self, cap: Capability) {
        self.capabilities.insert(cap);
    }

    /// Check for a capability
    pub fn has(&self, cap: Capability) -> bool {
        self.capabilities.contains(cap)
    }
}

impl fmt::Debug for ShapeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeInfo")
            .field("display_name", &self.display_name)
            .field("tag", &self.tag)
            .field("props", &self.props_type)
            .field("state", &self.state_type)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// `app::widgets::Counter` becomes `Counter(app::widgets)`
pub fn display_name(type_name: &str) -> String {
    let base_len = type_name.find('<').unwrap_or(type_name.len());
    let (base, generics) = type_name.split_at(base_len);
    match base.rsplit_once("::") {
        Some((path, name)) => format!("{}{}({})", name, generics, path),
        None => type_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("app::widgets::Counter"), "Counter(app::widgets)");
        assert_eq!(display_name("app::List<app::Item>"), "List<app::Item>(app)");
        assert_eq!(display_name("Bare"), "Bare");
    }

    #[test]
    fn test_shape_info() {
        let mut info = ShapeInfo::of::<Widget, u32, ()>(Some("widget"));
        assert!(info.display_name.starts_with("Widget("));
        assert_eq!(info.props_type, "u32");
        assert!(!info.has(Capability::DidMount));

        info.declare(Capability::DidMount);
        assert!(info.has(Capability::DidMount));
        assert_eq!(info.tag, Some("widget"));
    }
}
