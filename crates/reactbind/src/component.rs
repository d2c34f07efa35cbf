//! Typed component definitions
//!
//! A component is a Rust type bound to a host instance through a
//! [`ComponentDef`]. It always renders; every other lifecycle method is an
//! optional capability expressed as its own trait. Which capabilities a type
//! has is declared once in [`Component::shape`], and the declaration is
//! checked by the compiler: `with_did_mount` only exists for types that
//! implement [`DidMount`].

use crate::host::{CaughtError, Element};
use crate::instance::ComponentDef;
use reactbind_core::{Capability, CapabilitySet, ShapeInfo, ValueBox};
use std::fmt;

/// Props capability: a tag plus total structural equality
pub trait Props: PartialEq + 'static {}

/// State capability: a tag plus total structural equality
pub trait State: PartialEq + 'static {}

/// Props type for components that take none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoProps;

impl Props for NoProps {}

/// State type for stateless components
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoState;

impl State for NoState {}

/// A typed component
pub trait Component: Sized + 'static {
    type Props: Props;
    type State: State;

    /// Stable identity used as the descriptor cache key and hot-reload
    /// module id. `None` rebuilds the descriptor on every element.
    const TAG: Option<&'static str> = None;

    /// Construct an instance bound to a host element. Called on every
    /// lifecycle callback, so keep it cheap.
    fn build(def: ComponentDef<Self::Props, Self::State>) -> Self;

    fn render(&self) -> Element;

    /// Declared optional capabilities
    fn shape() -> ComponentShape<Self> {
        ComponentShape::new()
    }
}

pub trait InitialState: Component {
    fn get_initial_state(&self) -> Self::State;
}

pub trait WillMount: Component {
    fn component_will_mount(&self);
}

pub trait DidMount: Component {
    fn component_did_mount(&self);
}

pub trait WillReceiveProps: Component {
    fn component_will_receive_props(&self, next_props: Option<&Self::Props>);
}

/// Overrides the default props-equality update policy
pub trait ShouldUpdate: Component {
    fn should_component_update(&self, next_props: Option<&Self::Props>, next_state: Option<&Self::State>) -> bool;
}

pub trait SnapshotBeforeUpdate: Component {
    type Snapshot: 'static;

    fn get_snapshot_before_update(
        &self,
        prev_props: Option<&Self::Props>,
        prev_state: Option<&Self::State>,
    ) -> Self::Snapshot;
}

pub trait DidUpdate: Component {
    /// `snapshot` is the boxed value from [`SnapshotBeforeUpdate`], if any
    fn component_did_update(
        &self,
        prev_props: Option<&Self::Props>,
        prev_state: Option<&Self::State>,
        snapshot: Option<&ValueBox>,
    );
}

pub trait WillUnmount: Component {
    fn component_will_unmount(&self);
}

pub trait DidCatch: Component {
    fn component_did_catch(&self, error: &CaughtError);
}

/// Static hook: runs without an instance
pub trait DeriveStateFromProps: Component {
    fn get_derived_state_from_props(props: Option<&Self::Props>, state: Option<&Self::State>) -> Self::State;
}

/// Static hook: runs without an instance
pub trait DeriveStateFromError: Component {
    fn get_derived_state_from_error(error: &CaughtError) -> Self::State;
}

pub(crate) type PropsRef<'a, C> = Option<&'a <C as Component>::Props>;
pub(crate) type StateRef<'a, C> = Option<&'a <C as Component>::State>;

/// Capability table: one entry per optional lifecycle method
pub(crate) struct Hooks<C: Component> {
    pub initial_state: Option<fn(&C) -> C::State>,
    pub will_mount: Option<fn(&C)>,
    pub did_mount: Option<fn(&C)>,
    pub will_receive_props: Option<fn(&C, PropsRef<'_, C>)>,
    pub should_update: Option<fn(&C, PropsRef<'_, C>, StateRef<'_, C>) -> bool>,
    pub snapshot: Option<fn(&C, PropsRef<'_, C>, StateRef<'_, C>) -> ValueBox>,
    pub did_update: Option<fn(&C, PropsRef<'_, C>, StateRef<'_, C>, Option<&ValueBox>)>,
    pub will_unmount: Option<fn(&C)>,
    pub did_catch: Option<fn(&C, &CaughtError)>,
    pub derive_from_props: Option<fn(PropsRef<'_, C>, StateRef<'_, C>) -> C::State>,
    pub derive_from_error: Option<fn(&CaughtError) -> C::State>,
}

impl<C: Component> Clone for Hooks<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Component> Copy for Hooks<C> {}

impl<C: Component> Default for Hooks<C> {
    fn default() -> Self {
        Self {
            initial_state: None,
            will_mount: None,
            did_mount: None,
            will_receive_props: None,
            should_update: None,
            snapshot: None,
            did_update: None,
            will_unmount: None,
            did_catch: None,
            derive_from_props: None,
            derive_from_error: None,
        }
    }
}

fn boxed_snapshot<C: SnapshotBeforeUpdate>(component: &C, props: PropsRef<'_, C>, state: StateRef<'_, C>) -> ValueBox {
    ValueBox::wrap(component.get_snapshot_before_update(props, state))
}

/// Compile-time description of a component type
pub struct ComponentShape<C: Component> {
    info: ShapeInfo,
    pub(crate) hooks: Hooks<C>,
}

impl<C: Component> ComponentShape<C> {
    /// Shape with no optional capabilities
    pub fn new() -> Self {
        Self {
            info: ShapeInfo::of::<C, C::Props, C::State>(C::TAG),
            hooks: Hooks::default(),
        }
    }

    pub fn with_initial_state(mut self) -> Self
    where
        C: InitialState,
    {
        self.hooks.initial_state = Some(<C as InitialState>::get_initial_state);
        self.info.declare(Capability::InitialState);
        self
    }

    pub fn with_will_mount(mut self) -> Self
    where
        C: WillMount,
    {
        self.hooks.will_mount = Some(<C as WillMount>::component_will_mount);
        self.info.declare(Capability::WillMount);
        self
    }

    pub fn with_did_mount(mut self) -> Self
    where
        C: DidMount,
    {
        self.hooks.did_mount = Some(<C as DidMount>::component_did_mount);
        self.info.declare(Capability::DidMount);
        self
    }

    pub fn with_will_receive_props(mut self) -> Self
    where
        C: WillReceiveProps,
    {
        self.hooks.will_receive_props = Some(<C as WillReceiveProps>::component_will_receive_props);
        self.info.declare(Capability::WillReceiveProps);
        self
    }

    pub fn with_should_update(mut self) -> Self
    where
        C: ShouldUpdate,
    {
        self.hooks.should_update = Some(<C as ShouldUpdate>::should_component_update);
        self.info.declare(Capability::ShouldUpdate);
        self
    }

    pub fn with_snapshot(mut self) -> Self
    where
        C: SnapshotBeforeUpdate,
    {
        self.hooks.snapshot = Some(boxed_snapshot::<C>);
        self.info.declare(Capability::SnapshotBeforeUpdate);
        self
    }

    pub fn with_did_update(mut self) -> Self
    where
        C: DidUpdate,
    {
        self.hooks.did_update = Some(<C as DidUpdate>::component_did_update);
        self.info.declare(Capability::DidUpdate);
        self
    }

    pub fn with_will_unmount(mut self) -> Self
    where
        C: WillUnmount,
    {
        self.hooks.will_unmount = Some(<C as WillUnmount>::component_will_unmount);
        self.info.declare(Capability::WillUnmount);
        self
    }

    pub fn with_did_catch(mut self) -> Self
    where
        C: DidCatch,
    {
        self.hooks.did_catch = Some(<C as DidCatch>::component_did_catch);
        self.info.declare(Capability::DidCatch);
        self
    }

    pub fn with_derived_state_from_props(mut self) -> Self
    where
        C: DeriveStateFromProps,
    {
        self.hooks.derive_from_props = Some(<C as DeriveStateFromProps>::get_derived_state_from_props);
        self.info.declare(Capability::DeriveStateFromProps);
        self
    }

    pub fn with_derived_state_from_error(mut self) -> Self
    where
        C: DeriveStateFromError,
    {
        self.hooks.derive_from_error = Some(<C as DeriveStateFromError>::get_derived_state_from_error);
        self.info.declare(Capability::DeriveStateFromError);
        self
    }

    /// Declared capabilities
    pub fn capabilities(&self) -> CapabilitySet {
        self.info.capabilities
    }

    /// Name reported to the host
    pub fn display_name(&self) -> &str {
        &self.info.display_name
    }

    /// Full type metadata
    pub fn info(&self) -> &ShapeInfo {
        &self.info
    }
}

impl<C: Component> Default for ComponentShape<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Component> fmt::Debug for ComponentShape<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentShape").field("info", &self.info).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(PartialEq)]
    struct Count(i32);

    impl State for Count {}

    struct Ticker {
        def: ComponentDef<NoProps, Count>,
    }

    impl Component for Ticker {
        type Props = NoProps;
        type State = Count;

        const TAG: Option<&'static str> = Some("tests::Ticker");

        fn build(def: ComponentDef<NoProps, Count>) -> Self {
            Ticker { def }
        }

        fn render(&self) -> Element {
            let _ = &self.def;
            Element::new("tick")
        }

        fn shape() -> ComponentShape<Self> {
            ComponentShape::new().with_initial_state().with_snapshot()
        }
    }

    impl InitialState for Ticker {
        fn get_initial_state(&self) -> Count {
            Count(7)
        }
    }

    impl SnapshotBeforeUpdate for Ticker {
        type Snapshot = u64;

        fn get_snapshot_before_update(&self, _: Option<&NoProps>, _: Option<&Count>) -> u64 {
            99
        }
    }

    #[test]
    fn test_shape_records_declared_capabilities() {
        let shape = Ticker::shape();
        let caps = shape.capabilities();

        assert!(caps.contains(Capability::InitialState));
        assert!(caps.contains(Capability::SnapshotBeforeUpdate));
        assert!(!caps.contains(Capability::DidMount));
        assert_eq!(caps.len(), 2);
        assert!(shape.display_name().starts_with("Ticker("));
        assert_eq!(shape.info().tag, Some("tests::Ticker"));

        assert!(shape.hooks.initial_state.is_some());
        assert!(shape.hooks.did_mount.is_none());
    }

    #[test]
    fn test_default_shape_is_render_only() {
        let shape: ComponentShape<Ticker> = ComponentShape::new();
        assert!(shape.capabilities().is_empty());
    }
}
