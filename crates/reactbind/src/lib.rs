//! # reactbind - Typed Component Bridge
//!
//! Lets Rust types act as class and function components of a virtual-DOM
//! host renderer.
//!
//! ## Overview
//!
//! A component is an ordinary Rust type with typed props and state. The
//! bridge turns it into a host class descriptor whose lifecycle slots are
//! trampolines: each one rebuilds the typed instance from the host element,
//! unboxes its arguments and calls the Rust method. Only the lifecycle
//! methods a type declares are installed. Descriptors are cached per
//! component tag, and in hot mode a module's live instances re-render with
//! swapped code without remounting.
//!
//! Props-only components can implement [`FunctionComponent`] instead. They
//! render without a class, keep state through hooks on hosts that support
//! them, and are wrapped in a tracked class in hot mode.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐
//! │ impl Component  │────▶│ ComponentShape  │
//! │  (typed props)  │     │ (capabilities)  │
//! └─────────────────┘     └────────┬────────┘
//!                                  │
//!                                  ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ DescriptorCache │◀────│     Bridge      │
//! │   (per tag)     │     │ (class specs)   │
//! └─────────────────┘     └────────┬────────┘
//!                                  │
//!                                  ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │HotModuleRegistry│◀────│   impl Host     │ ◀── React, HeadlessHost
//! │ (dependents)    │     │ (createClass)   │
//! └─────────────────┘     └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use reactbind::prelude::*;
//!
//! #[derive(PartialEq)]
//! struct Count(i32);
//! impl State for Count {}
//!
//! struct Counter {
//!     def: ComponentDef<NoProps, Count>,
//! }
//!
//! impl Component for Counter {
//!     type Props = NoProps;
//!     type State = Count;
//!     const TAG: Option<&'static str> = Some("app::Counter");
//!
//!     fn build(def: ComponentDef<NoProps, Count>) -> Self {
//!         Counter { def }
//!     }
//!
//!     fn render(&self) -> Element { /* ... */ }
//!
//!     fn shape() -> ComponentShape<Self> {
//!         ComponentShape::new().with_initial_state()
//!     }
//! }
//!
//! impl InitialState for Counter {
//!     fn get_initial_state(&self) -> Count {
//!         Count(0)
//!     }
//! }
//!
//! let bridge = Bridge::new(host);
//! bridge.render(bridge.create_element::<Counter>(None, vec![]), &container);
//! ```

mod bridge;
mod cache;
mod component;
mod config;
mod descriptor;
mod error;
mod function;
mod headless;
mod host;
mod instance;

#[cfg(feature = "hot-reload")]
mod hot_reload;

pub use bridge::{hot_key, Bridge, HOT_SUFFIX};
pub use cache::DescriptorCache;
pub use component::*;
pub use config::{BridgeConfig, HotReloadConfig};
pub use descriptor::Builder;
pub use error::{BridgeError, Result};
pub use function::{FunctionComponent, FunctionScope, StateSetter};
pub use headless::{HeadlessClass, HeadlessFunction, HeadlessHost, HeadlessInstance, HeadlessNode, Mounted};
pub use host::*;
pub use instance::ComponentDef;
pub use reactbind_core::{Capability, CapabilitySet, ShapeInfo, TypeMismatch, ValueBox};

#[cfg(feature = "hot-reload")]
pub use hot_reload::{HotModuleRegistry, ModuleImpl, ModuleWatcher};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bridge::Bridge;
    pub use crate::component::*;
    pub use crate::config::BridgeConfig;
    pub use crate::error::{BridgeError, Result};
    pub use crate::function::{FunctionComponent, FunctionScope};
    pub use crate::host::{CaughtError, Container, Element, Host};
    pub use crate::instance::ComponentDef;
    pub use reactbind_core::ValueBox;

    #[cfg(feature = "hot-reload")]
    pub use crate::hot_reload::{ModuleImpl, ModuleWatcher};
}
