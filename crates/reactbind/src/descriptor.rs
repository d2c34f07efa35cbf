//! Descriptor builder
//!
//! Turns a [`ComponentShape`] into a host [`ClassSpec`]. Each installed slot is
//! a trampoline: it rebuilds the typed instance from the host element it was
//! called on, unboxes its arguments, calls the typed method and boxes the
//! result back. Slots are installed only for declared capabilities, so the
//! capability check happens once here rather than on every call.

use crate::bridge::WeakBridge;
use crate::component::{Component, ComponentShape, Props};
use crate::error::unbox;
use crate::host::{
    CaughtError, ClassSpec, ElementHandle, PropsObject, StateObject, LAST_STATE_SLOT, PROPS_SLOT,
};
use crate::instance::ComponentDef;
use reactbind_core::ValueBox;
use std::rc::Rc;

/// Produces a typed instance bound to a host element
pub type Builder<C> =
    Rc<dyn Fn(ComponentDef<<C as Component>::Props, <C as Component>::State>) -> C>;

/// Everything a trampoline needs to rebuild its instance
pub(crate) struct Binder<C: Component> {
    builder: Builder<C>,
    display_name: Rc<str>,
    bridge: WeakBridge,
    hot_tag: Option<&'static str>,
}

impl<C: Component> Binder<C> {
    pub(crate) fn new(
        builder: Builder<C>,
        display_name: Rc<str>,
        bridge: WeakBridge,
        hot_tag: Option<&'static str>,
    ) -> Self {
        Self {
            builder,
            display_name,
            bridge,
            hot_tag,
        }
    }

    pub(crate) fn instance(&self, handle: &ElementHandle) -> C {
        (self.builder)(ComponentDef::bind(
            handle.clone(),
            self.display_name.clone(),
            self.bridge.clone(),
            self.hot_tag,
        ))
    }

    fn props(&self, object: &PropsObject) -> Option<Rc<C::Props>> {
        object
            .props()
            .map(|boxed| unbox::<C::Props>(&self.display_name, PROPS_SLOT, boxed))
    }

    fn state(&self, object: Option<&StateObject>) -> Option<Rc<C::State>> {
        object
            .and_then(StateObject::last_state)
            .map(|boxed| unbox::<C::State>(&self.display_name, LAST_STATE_SLOT, &boxed))
    }
}

/// Default update policy, a function of props alone.
///
/// Without a current `_props` slot the answer is "do not update": a props-less
/// component is not re-rendered just because its parent was. With current
/// props, it updates when the next props differ, including when the next
/// element carries none.
pub(crate) fn props_changed<P: Props>(component: &str, current: Option<&PropsObject>, next: &PropsObject) -> bool {
    let current = match current.and_then(|object| object.props()) {
        Some(boxed) => unbox::<P>(component, PROPS_SLOT, boxed),
        None => return false,
    };

    match next.props() {
        Some(boxed) => *current != *unbox::<P>(component, PROPS_SLOT, boxed),
        None => true,
    }
}

/// Build the class spec for `C`
pub(crate) fn class_spec<C: Component>(shape: &ComponentShape<C>, binder: Rc<Binder<C>>) -> ClassSpec {
    let hooks = shape.hooks;

    let render = {
        let binder = binder.clone();
        Box::new(move |handle: &ElementHandle| binder.instance(handle).render())
    };
    let mut spec = ClassSpec::new(shape.display_name(), render);

    // Always installed: the host needs a state container for `set_state`,
    // even when the component declares no initial state.
    spec.get_initial_state = Some({
        let binder = binder.clone();
        Box::new(move |handle: &ElementHandle| {
            let initial = hooks.initial_state.map(|get| {
                let instance = binder.instance(handle);
                ValueBox::wrap(get(&instance))
            });
            StateObject::new(initial)
        })
    });

    spec.should_component_update = Some({
        let binder = binder.clone();
        Box::new(
            move |handle: &ElementHandle, next: &PropsObject, next_state: Option<&StateObject>| match hooks.should_update {
                Some(decide) => {
                    let instance = binder.instance(handle);
                    let props = binder.props(next);
                    let state = binder.state(next_state);
                    decide(&instance, props.as_deref(), state.as_deref())
                }
                None => props_changed::<C::Props>(&binder.display_name, handle.props().as_ref(), next),
            },
        )
    });

    if let Some(will_mount) = hooks.will_mount {
        let binder = binder.clone();
        spec.component_will_mount = Some(Box::new(move |handle: &ElementHandle| {
            will_mount(&binder.instance(handle))
        }));
    }

    if let Some(did_mount) = hooks.did_mount {
        let binder = binder.clone();
        spec.component_did_mount = Some(Box::new(move |handle: &ElementHandle| {
            did_mount(&binder.instance(handle))
        }));
    }

    if let Some(will_receive) = hooks.will_receive_props {
        let binder = binder.clone();
        spec.component_will_receive_props = Some(Box::new(move |handle: &ElementHandle, next: &PropsObject| {
            let instance = binder.instance(handle);
            let props = binder.props(next);
            will_receive(&instance, props.as_deref())
        }));
    }

    if let Some(snapshot) = hooks.snapshot {
        let binder = binder.clone();
        spec.get_snapshot_before_update = Some(Box::new(
            move |handle: &ElementHandle, prev_props: &PropsObject, prev_state: Option<&StateObject>| {
                let instance = binder.instance(handle);
                let props = binder.props(prev_props);
                let state = binder.state(prev_state);
                Some(snapshot(&instance, props.as_deref(), state.as_deref()))
            },
        ));
    }

    if let Some(did_update) = hooks.did_update {
        let binder = binder.clone();
        spec.component_did_update = Some(Box::new(
            move |handle: &ElementHandle,
                  prev_props: &PropsObject,
                  prev_state: Option<&StateObject>,
                  snapshot: Option<&ValueBox>| {
                let instance = binder.instance(handle);
                let props = binder.props(prev_props);
                let state = binder.state(prev_state);
                did_update(&instance, props.as_deref(), state.as_deref(), snapshot)
            },
        ));
    }

    if let Some(will_unmount) = hooks.will_unmount {
        let binder = binder.clone();
        spec.component_will_unmount = Some(Box::new(move |handle: &ElementHandle| {
            will_unmount(&binder.instance(handle))
        }));
    }

    if let Some(did_catch) = hooks.did_catch {
        let binder = binder.clone();
        spec.component_did_catch = Some(Box::new(move |handle: &ElementHandle, error: &CaughtError| {
            did_catch(&binder.instance(handle), error)
        }));
    }

    if let Some(derive) = hooks.derive_from_props {
        let binder = binder.clone();
        spec.statics.get_derived_state_from_props = Some(Box::new(
            move |props: &PropsObject, state: Option<&StateObject>| {
                let props = binder.props(props);
                let state = binder.state(state);
                StateObject::new(Some(ValueBox::wrap(derive(props.as_deref(), state.as_deref()))))
            },
        ));
    }

    if let Some(derive) = hooks.derive_from_error {
        spec.statics.get_derived_state_from_error = Some(Box::new(move |error: &CaughtError| {
            StateObject::new(Some(ValueBox::wrap(derive(error))))
        }));
    }

    log::trace!("{}: slots {:?}", spec.display_name, spec.installed_slots());
    spec
}
