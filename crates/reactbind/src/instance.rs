//! Component instance binding
//!
//! A [`ComponentDef`] is what a typed component embeds to reach its host
//! element: props, children and state are read from fixed slots on every
//! access, never cached. A fresh `ComponentDef` is built for every lifecycle
//! callback, so it holds nothing but a handle clone, a name and a weak
//! reference to the bridge.

use crate::bridge::{Bridge, WeakBridge};
use crate::error::unbox;
use crate::host::{Element, ElementHandle, CHILDREN_SLOT, LAST_STATE_SLOT, PROPS_SLOT};
use reactbind_core::ValueBox;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Typed view of a host element
pub struct ComponentDef<P, S> {
    handle: ElementHandle,
    display_name: Rc<str>,
    bridge: WeakBridge,
    /// Module tag when built in hot mode
    hot_tag: Option<&'static str>,
    _marker: PhantomData<fn() -> (P, S)>,
}

impl<P: 'static, S: PartialEq + 'static> ComponentDef<P, S> {
    pub(crate) fn bind(
        handle: ElementHandle,
        display_name: Rc<str>,
        bridge: WeakBridge,
        hot_tag: Option<&'static str>,
    ) -> Self {
        Self {
            handle,
            display_name,
            bridge,
            hot_tag,
            _marker: PhantomData,
        }
    }

    /// Current props; `None` when the element was created without any
    pub fn props(&self) -> Option<Rc<P>> {
        let props = self.handle.props()?;
        let boxed = props.props()?;
        Some(unbox::<P>(&self.display_name, PROPS_SLOT, boxed))
    }

    /// Children passed to `create_element`; empty when there were none
    pub fn children(&self) -> Vec<Element> {
        let children = self
            .handle
            .props()
            .and_then(|props| props.children().cloned());
        match children {
            Some(boxed) => (*unbox::<Vec<Element>>(&self.display_name, CHILDREN_SLOT, &boxed)).clone(),
            None => Vec::new(),
        }
    }

    /// Current state; `None` for components without initial state
    pub fn state(&self) -> Option<Rc<S>> {
        let boxed = self.handle.state()?.last_state()?;
        Some(unbox::<S>(&self.display_name, LAST_STATE_SLOT, &boxed))
    }

    /// Store a new state and re-render, unless it equals the current one.
    /// The re-render goes straight to the host; the descriptor stays cached
    /// even in hot mode.
    pub fn set_state(&self, state: S) {
        let container = match self.handle.state() {
            Some(container) => container,
            None => {
                log::error!("{}: set_state before the host initialised state", self.display_name);
                return;
            }
        };

        if let Some(current) = container.last_state() {
            let current = unbox::<S>(&self.display_name, LAST_STATE_SLOT, &current);
            if state == *current {
                log::trace!("{}: set_state suppressed, state unchanged", self.display_name);
                return;
            }
        }

        container.set_last_state(ValueBox::wrap(state));
        self.handle.force_update();
    }

    /// Ask the host to re-render. Hot-tracked instances first drop their
    /// cached descriptor so the next render picks up swapped code.
    pub fn force_update(&self) {
        if let (Some(tag), Some(bridge)) = (self.hot_tag, self.bridge.upgrade()) {
            bridge.invalidate(tag);
        }
        self.handle.force_update();
    }

    /// The bridge this component was created through, for building child
    /// elements in `render`. `None` once every `Bridge` clone is dropped.
    pub fn bridge(&self) -> Option<Bridge> {
        self.bridge.upgrade()
    }

    /// The underlying host element
    pub fn handle(&self) -> &ElementHandle {
        &self.handle
    }

    /// Name reported to the host
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl<P, S> Clone for ComponentDef<P, S> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            display_name: self.display_name.clone(),
            bridge: self.bridge.clone(),
            hot_tag: self.hot_tag,
            _marker: PhantomData,
        }
    }
}

impl<P, S> fmt::Debug for ComponentDef<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("display_name", &self.display_name)
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostInstance, PropsObject, StateObject};
    use std::cell::{Cell, RefCell};

    #[derive(Debug, PartialEq)]
    struct Count {
        count: i32,
    }

    #[derive(Debug, PartialEq)]
    struct Name(String);

    struct FakeInstance {
        props: RefCell<Option<PropsObject>>,
        state: RefCell<Option<StateObject>>,
        updates: Cell<u32>,
    }

    impl FakeInstance {
        fn new(props: Option<PropsObject>, state: Option<StateObject>) -> Rc<Self> {
            Rc::new(Self {
                props: RefCell::new(props),
                state: RefCell::new(state),
                updates: Cell::new(0),
            })
        }
    }

    impl HostInstance for FakeInstance {
        fn props(&self) -> Option<PropsObject> {
            self.props.borrow().clone()
        }

        fn state(&self) -> Option<StateObject> {
            self.state.borrow().clone()
        }

        fn force_update(&self) {
            self.updates.set(self.updates.get() + 1);
        }
    }

    fn def_for(instance: &Rc<FakeInstance>) -> ComponentDef<Name, Count> {
        ComponentDef::bind(ElementHandle::new(instance.clone()), "Test(tests)".into(), WeakBridge::detached(), None)
    }

    #[test]
    fn test_set_state_suppresses_equal_state() {
        let instance = FakeInstance::new(None, Some(StateObject::new(Some(ValueBox::wrap(Count { count: 0 })))));
        let def = def_for(&instance);

        def.set_state(Count { count: 1 });
        assert_eq!(instance.updates.get(), 1);
        assert_eq!(*def.state().unwrap(), Count { count: 1 });

        def.set_state(Count { count: 1 });
        assert_eq!(instance.updates.get(), 1);

        def.set_state(Count { count: 2 });
        assert_eq!(instance.updates.get(), 2);
    }

    #[test]
    fn test_set_state_without_initial_state_stores() {
        let instance = FakeInstance::new(None, Some(StateObject::new(None)));
        let def = def_for(&instance);

        assert!(def.state().is_none());
        def.set_state(Count { count: 4 });
        assert_eq!(instance.updates.get(), 1);
        assert_eq!(def.state().unwrap().count, 4);
    }

    #[test]
    fn test_absent_slots_read_as_empty() {
        let instance = FakeInstance::new(None, None);
        let def = def_for(&instance);

        assert!(def.props().is_none());
        assert!(def.children().is_empty());
        assert!(def.state().is_none());
        assert!(def.bridge().is_none());

        def.set_state(Count { count: 1 });
        assert_eq!(instance.updates.get(), 0);
    }

    #[test]
    fn test_props_and_children_round_trip() {
        let children = vec![Element::new("a"), Element::new("b")];
        let props = PropsObject::new(
            Some(ValueBox::wrap(Name("ada".into()))),
            Some(ValueBox::wrap(children.clone())),
        );
        let instance = FakeInstance::new(Some(props), None);
        let def = def_for(&instance);

        assert_eq!(*def.props().unwrap(), Name("ada".into()));
        let read = def.children();
        assert_eq!(read.len(), 2);
        assert!(read[0].ptr_eq(&children[0]));
    }

    #[test]
    #[should_panic(expected = "Test(tests): slot '_props'")]
    fn test_mismatched_props_abort() {
        let props = PropsObject::new(Some(ValueBox::wrap(17u32)), None);
        let instance = FakeInstance::new(Some(props), None);
        let _ = def_for(&instance).props();
    }
}
