//! Host renderer interface
//!
//! The virtual-DOM library is an external collaborator. This module names the
//! slice of its API the bridge relies on: building a class from a descriptor
//! spec, creating elements, rendering into a container, and the per-instance
//! object (`this`) handed to every lifecycle callback. Function components
//! are plain render callbacks; hosts that support hooks also implement
//! [`HookDispatcher`].
//!
//! Host values (elements, classes, containers) are opaque to the bridge. They
//! ride in the same checked box as typed component values, so a host can only
//! get back what it put in.

use reactbind_core::ValueBox;
use std::any::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Props object slot holding the boxed typed props
pub const PROPS_SLOT: &str = "_props";
/// Props object slot holding the boxed children list
pub const CHILDREN_SLOT: &str = "_children";
/// State object slot holding the nested state container
pub const STATE_SLOT: &str = "_state";
/// Nested state container slot holding the boxed current state
pub const LAST_STATE_SLOT: &str = "__lastState";

/// Element tree produced by the host
#[derive(Clone)]
pub struct Element(ValueBox);

impl Element {
    /// Wrap a host-native node
    pub fn new<T: 'static>(node: T) -> Self {
        Self(ValueBox::wrap(node))
    }

    /// Host-side access to the native node
    pub fn node<T: 'static>(&self) -> Option<Rc<T>> {
        self.0.downcast::<T>().ok()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Element) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({:?})", self.0)
    }
}

/// Host class built from a [`ClassSpec`]
#[derive(Clone)]
pub struct Descriptor {
    display_name: Rc<str>,
    class: ValueBox,
}

impl Descriptor {
    /// Wrap a host-native class
    pub fn new<T: 'static>(display_name: &str, class: T) -> Self {
        Self {
            display_name: display_name.into(),
            class: ValueBox::wrap(class),
        }
    }

    /// Name reported by the class
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Host-side access to the native class
    pub fn class<T: 'static>(&self) -> Option<Rc<T>> {
        self.class.downcast::<T>().ok()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Descriptor) -> bool {
        self.class.ptr_eq(&other.class)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("display_name", &self.display_name)
            .field("class", &self.class)
            .finish()
    }
}

/// Host mount point
#[derive(Clone, Debug)]
pub struct Container(ValueBox);

impl Container {
    /// Wrap a host-native mount point
    pub fn new<T: 'static>(target: T) -> Self {
        Self(ValueBox::wrap(target))
    }

    /// Host-side access to the native mount point
    pub fn target<T: 'static>(&self) -> Option<Rc<T>> {
        self.0.downcast::<T>().ok()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Container) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

/// First argument of `createElement`
#[derive(Clone, Debug)]
pub enum ElementType {
    /// A class built by `create_class`
    Class(Descriptor),
    /// A function component, rendered without a class
    Function(FunctionType),
    /// An intrinsic host tag such as `div`
    Intrinsic(String),
}

/// Render callback of a function component. `hooks` is the hook state of
/// the rendering instance when the host supports hooks.
pub type FunctionRenderCallback = Rc<dyn Fn(&PropsObject, Option<&dyn HookDispatcher>) -> Element>;

/// A function component as the host sees it
///
/// Two values are the same component when their identities match, so a host
/// keeps the mounted instance (and its hooks) across parent re-renders even
/// though every element carries a fresh value.
#[derive(Clone)]
pub struct FunctionType {
    display_name: Rc<str>,
    identity: TypeId,
    render: FunctionRenderCallback,
}

impl FunctionType {
    pub fn new(display_name: &str, identity: TypeId, render: FunctionRenderCallback) -> Self {
        Self {
            display_name: display_name.into(),
            identity,
            render,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Call the component with its props object
    pub fn render(&self, props: &PropsObject, hooks: Option<&dyn HookDispatcher>) -> Element {
        (self.render)(props, hooks)
    }

    /// Check if `other` renders the same component
    pub fn same_component(&self, other: &FunctionType) -> bool {
        self.identity == other.identity
    }
}

impl fmt::Debug for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionType")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Deferred hook work: an effect body or an effect cleanup
pub type EffectCallback = Box<dyn FnOnce()>;
/// Schedules a re-render of the instance a hook belongs to
pub type UpdateCallback = Rc<dyn Fn()>;

/// Hook state of a rendering function component
///
/// Optional host extension: a host that supports hooks passes one to
/// [`FunctionType::render`]. Slots are addressed by call order within a
/// render, and the typed layer builds `useState`, `useRef` and `useEffect`
/// on top of them.
pub trait HookDispatcher {
    /// Advance to the next slot and return its value, `None` on the first
    /// render that reaches it
    fn next_slot(&self) -> Option<ValueBox>;

    /// Fill the slot `next_slot` just reported empty
    fn fill_slot(&self, value: ValueBox);

    /// Callback that schedules a re-render of the rendering instance
    fn updater(&self) -> UpdateCallback;

    /// Run `effect` after the current render is committed
    fn schedule_effect(&self, effect: EffectCallback);

    /// Run `cleanup` when the rendering instance unmounts
    fn on_unmount(&self, cleanup: EffectCallback);
}

/// Props object handed to `createElement`
///
/// Either slot may be absent: an element created without props has no
/// `_props`, and one created without children has no `_children`.
#[derive(Clone, Default, Debug)]
pub struct PropsObject {
    props: Option<ValueBox>,
    children: Option<ValueBox>,
}

impl PropsObject {
    /// Create a props object from its two slots
    pub fn new(props: Option<ValueBox>, children: Option<ValueBox>) -> Self {
        Self { props, children }
    }

    /// The `_props` slot
    pub fn props(&self) -> Option<&ValueBox> {
        self.props.as_ref()
    }

    /// The `_children` slot
    pub fn children(&self) -> Option<&ValueBox> {
        self.children.as_ref()
    }

    /// Check for a `_props` slot
    pub fn has_props(&self) -> bool {
        self.props.is_some()
    }
}

/// Nested state container stored in the host's `_state` slot
///
/// Clones share one container, so a write through any clone is what the host
/// sees on its next render.
#[derive(Clone, Default)]
pub struct StateObject {
    last_state: Rc<RefCell<Option<ValueBox>>>,
}

impl StateObject {
    /// Create a container, optionally holding an initial state box
    pub fn new(last_state: Option<ValueBox>) -> Self {
        Self {
            last_state: Rc::new(RefCell::new(last_state)),
        }
    }

    /// The `__lastState` box
    pub fn last_state(&self) -> Option<ValueBox> {
        self.last_state.borrow().clone()
    }

    /// Replace the `__lastState` box; the previous box is dropped
    pub fn set_last_state(&self, state: ValueBox) {
        *self.last_state.borrow_mut() = Some(state);
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &StateObject) -> bool {
        Rc::ptr_eq(&self.last_state, &other.last_state)
    }
}

impl fmt::Debug for StateObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateObject")
            .field("last_state", &*self.last_state.borrow())
            .finish()
    }
}

/// Host per-instance object, `this` in lifecycle callbacks
pub trait HostInstance {
    /// Current props object; `None` when the host has none
    fn props(&self) -> Option<PropsObject>;

    /// Current state object; `None` before `getInitialState` ran
    fn state(&self) -> Option<StateObject>;

    /// Schedule a re-render of this instance
    fn force_update(&self);
}

/// Borrowed reference to a host instance
///
/// Owned by the host; the bridge only reads and writes its slots. Equality is
/// host reference equality.
#[derive(Clone)]
pub struct ElementHandle(Rc<dyn HostInstance>);

impl ElementHandle {
    /// Wrap a host instance
    pub fn new(instance: Rc<dyn HostInstance>) -> Self {
        Self(instance)
    }

    /// See [`HostInstance::props`]
    pub fn props(&self) -> Option<PropsObject> {
        self.0.props()
    }

    /// See [`HostInstance::state`]
    pub fn state(&self) -> Option<StateObject> {
        self.0.state()
    }

    /// See [`HostInstance::force_update`]
    pub fn force_update(&self) {
        self.0.force_update()
    }

    /// Host reference equality
    pub fn ptr_eq(&self, other: &ElementHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ElementHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ElementHandle {}

impl fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementHandle({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Error delivered to error-boundary hooks
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaughtError {
    pub message: String,
    pub component_stack: String,
}

impl CaughtError {
    pub fn new(message: impl Into<String>, component_stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            component_stack: component_stack.into(),
        }
    }
}

pub type InstanceCallback = Box<dyn Fn(&ElementHandle)>;
pub type InitialStateCallback = Box<dyn Fn(&ElementHandle) -> StateObject>;
pub type ReceivePropsCallback = Box<dyn Fn(&ElementHandle, &PropsObject)>;
pub type ShouldUpdateCallback = Box<dyn Fn(&ElementHandle, &PropsObject, Option<&StateObject>) -> bool>;
pub type SnapshotCallback = Box<dyn Fn(&ElementHandle, &PropsObject, Option<&StateObject>) -> Option<ValueBox>>;
pub type DidUpdateCallback = Box<dyn Fn(&ElementHandle, &PropsObject, Option<&StateObject>, Option<&ValueBox>)>;
pub type DidCatchCallback = Box<dyn Fn(&ElementHandle, &CaughtError)>;
pub type RenderCallback = Box<dyn Fn(&ElementHandle) -> Element>;
pub type DerivedFromPropsCallback = Box<dyn Fn(&PropsObject, Option<&StateObject>) -> StateObject>;
pub type DerivedFromErrorCallback = Box<dyn Fn(&CaughtError) -> StateObject>;

/// The `statics` sub-object of a class spec
#[derive(Default)]
pub struct Statics {
    pub get_derived_state_from_props: Option<DerivedFromPropsCallback>,
    pub get_derived_state_from_error: Option<DerivedFromErrorCallback>,
}

/// Descriptor spec passed to `createClass`
///
/// Only `render` is required. A host treats a missing slot as a no-op, a
/// missing `get_initial_state` as "no state" and a missing
/// `should_component_update` as "always update".
pub struct ClassSpec {
    pub display_name: String,
    pub get_initial_state: Option<InitialStateCallback>,
    pub component_will_mount: Option<InstanceCallback>,
    pub component_did_mount: Option<InstanceCallback>,
    pub component_will_receive_props: Option<ReceivePropsCallback>,
    pub should_component_update: Option<ShouldUpdateCallback>,
    pub get_snapshot_before_update: Option<SnapshotCallback>,
    pub component_did_update: Option<DidUpdateCallback>,
    pub component_will_unmount: Option<InstanceCallback>,
    pub component_did_catch: Option<DidCatchCallback>,
    pub render: RenderCallback,
    pub statics: Statics,
}

impl ClassSpec {
    /// Spec with only a render callback
    pub fn new(display_name: impl Into<String>, render: RenderCallback) -> Self {
        Self {
            display_name: display_name.into(),
            get_initial_state: None,
            component_will_mount: None,
            component_did_mount: None,
            component_will_receive_props: None,
            should_component_update: None,
            get_snapshot_before_update: None,
            component_did_update: None,
            component_will_unmount: None,
            component_did_catch: None,
            render,
            statics: Statics::default(),
        }
    }

    /// Names of the installed slots, `render` included
    pub fn installed_slots(&self) -> Vec<&'static str> {
        let slots = [
            ("getInitialState", self.get_initial_state.is_some()),
            ("componentWillMount", self.component_will_mount.is_some()),
            ("componentDidMount", self.component_did_mount.is_some()),
            ("componentWillReceiveProps", self.component_will_receive_props.is_some()),
            ("shouldComponentUpdate", self.should_component_update.is_some()),
            ("getSnapshotBeforeUpdate", self.get_snapshot_before_update.is_some()),
            ("componentDidUpdate", self.component_did_update.is_some()),
            ("componentWillUnmount", self.component_will_unmount.is_some()),
            ("componentDidCatch", self.component_did_catch.is_some()),
            ("render", true),
            ("getDerivedStateFromProps", self.statics.get_derived_state_from_props.is_some()),
            ("getDerivedStateFromError", self.statics.get_derived_state_from_error.is_some()),
        ];
        slots
            .into_iter()
            .filter(|(_, installed)| *installed)
            .map(|(name, _)| name)
            .collect()
    }
}

impl fmt::Debug for ClassSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassSpec")
            .field("display_name", &self.display_name)
            .field("slots", &self.installed_slots())
            .finish()
    }
}

/// The host renderer
///
/// Hosts are single-threaded and use interior mutability; every call happens
/// on the UI tick. The bridge holds no borrow of its own state while calling
/// into the host, so a host may call back into the bridge.
pub trait Host {
    /// `createClass(spec)`
    fn create_class(&self, spec: ClassSpec) -> Descriptor;

    /// `createElement(type, props, ...children)`
    fn create_element(&self, ty: ElementType, props: PropsObject, children: Vec<Element>) -> Element;

    /// `render(element, container)`
    fn render(&self, element: Element, container: &Container) -> Element;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingInstance {
        updates: Cell<u32>,
    }

    impl HostInstance for CountingInstance {
        fn props(&self) -> Option<PropsObject> {
            None
        }

        fn state(&self) -> Option<StateObject> {
            None
        }

        fn force_update(&self) {
            self.updates.set(self.updates.get() + 1);
        }
    }

    #[test]
    fn test_handle_identity() {
        let counting = Rc::new(CountingInstance { updates: Cell::new(0) });
        let a = ElementHandle::new(counting.clone());
        let b = ElementHandle::new(counting.clone());
        let c = ElementHandle::new(Rc::new(CountingInstance { updates: Cell::new(0) }));

        assert_eq!(a, b);
        assert_ne!(a, c);

        a.force_update();
        b.force_update();
        assert_eq!(counting.updates.get(), 2);
    }

    #[test]
    fn test_state_object_shares_container() {
        let state = StateObject::new(None);
        let alias = state.clone();
        alias.set_last_state(ValueBox::wrap(5i32));

        let current = state.last_state().unwrap();
        assert_eq!(*current.downcast::<i32>().unwrap(), 5);
        assert!(state.ptr_eq(&alias));
    }

    #[test]
    fn test_spec_slots() {
        let mut spec = ClassSpec::new("Empty(tests)", Box::new(|_| Element::new(())));
        assert_eq!(spec.installed_slots(), vec!["render"]);

        spec.component_did_mount = Some(Box::new(|_| {}));
        assert_eq!(spec.installed_slots(), vec!["componentDidMount", "render"]);
    }
}
