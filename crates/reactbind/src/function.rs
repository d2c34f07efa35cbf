//! Function components
//!
//! A [`FunctionComponent`] is a props-only component that renders without a
//! class descriptor. Its render receives a [`FunctionScope`] for reading
//! props and children and, on hosts that implement [`HookDispatcher`], for
//! keeping state, refs and effects across renders.
//!
//! Hooks are addressed by call order, as in React: a component must call the
//! same hooks in the same order on every render. A slot holding a different
//! type than the hook expects aborts with the component named.

use crate::bridge::{Bridge, WeakBridge};
use crate::component::Props;
use crate::error::unbox;
use crate::host::{
    EffectCallback, Element, FunctionRenderCallback, FunctionType, HookDispatcher, PropsObject, UpdateCallback,
    CHILDREN_SLOT, PROPS_SLOT,
};
use reactbind_core::ValueBox;
use std::any::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

const USE_STATE: &str = "useState";
const USE_REF: &str = "useRef";
const USE_EFFECT: &str = "useEffect";

/// A typed function component
pub trait FunctionComponent: 'static {
    type Props: Props;

    /// Hot-reload module id. Tagged function components are wrapped in a
    /// tracked class when the bridge runs in hot mode.
    const TAG: Option<&'static str> = None;

    fn render(scope: &FunctionScope<'_, Self::Props>) -> Element;
}

/// Host view of `F`. Elements of one component share its identity, so the
/// host reuses the mounted instance across renders.
pub(crate) fn function_type<F: FunctionComponent>(bridge: WeakBridge) -> FunctionType {
    let display_name: Rc<str> = reactbind_core::display_name(std::any::type_name::<F>()).into();
    let name = display_name.clone();
    let render: FunctionRenderCallback =
        Rc::new(move |props: &PropsObject, hooks: Option<&dyn HookDispatcher>| {
            let scope = FunctionScope::new(props, &name, bridge.upgrade(), hooks);
            F::render(&scope)
        });
    FunctionType::new(&display_name, TypeId::of::<F>(), render)
}

/// Render context of a function component
pub struct FunctionScope<'a, P> {
    props: &'a PropsObject,
    display_name: &'a str,
    bridge: Option<Bridge>,
    hooks: Option<&'a dyn HookDispatcher>,
    _marker: PhantomData<fn() -> P>,
}

impl<'a, P: 'static> FunctionScope<'a, P> {
    pub(crate) fn new(
        props: &'a PropsObject,
        display_name: &'a str,
        bridge: Option<Bridge>,
        hooks: Option<&'a dyn HookDispatcher>,
    ) -> Self {
        Self {
            props,
            display_name,
            bridge,
            hooks,
            _marker: PhantomData,
        }
    }

    /// Current props; `None` when the element was created without any
    pub fn props(&self) -> Option<Rc<P>> {
        let boxed = self.props.props()?;
        Some(unbox::<P>(self.display_name, PROPS_SLOT, boxed))
    }

    /// Children passed to the element; empty when there were none
    pub fn children(&self) -> Vec<Element> {
        match self.props.children() {
            Some(boxed) => (*unbox::<Vec<Element>>(self.display_name, CHILDREN_SLOT, boxed)).clone(),
            None => Vec::new(),
        }
    }

    /// The bridge, for building child elements. `None` once every `Bridge`
    /// clone is dropped.
    pub fn bridge(&self) -> Option<Bridge> {
        self.bridge.clone()
    }

    pub fn display_name(&self) -> &str {
        self.display_name
    }

    /// Check if the host keeps hook state for this render
    pub fn has_hooks(&self) -> bool {
        self.hooks.is_some()
    }

    /// `useState`: a value kept across renders and a setter that re-renders
    /// when the value changes. Without host hook support the value is
    /// `init()` on every render and the setter only stores.
    pub fn use_state<T: PartialEq + 'static>(&self, init: impl FnOnce() -> T) -> (Rc<T>, StateSetter<T>) {
        let hooks = match self.hooks {
            Some(hooks) => hooks,
            None => {
                log::warn!("{}: useState without host hook support", self.display_name);
                let setter = StateSetter::new(self.display_name, Rc::new(RefCell::new(Rc::new(init()))), None);
                return (setter.get(), setter);
            }
        };

        let cell = match hooks.next_slot() {
            Some(slot) => unbox::<RefCell<Rc<T>>>(self.display_name, USE_STATE, &slot),
            None => {
                let cell = Rc::new(RefCell::new(Rc::new(init())));
                hooks.fill_slot(ValueBox::from_rc(cell.clone()));
                cell
            }
        };

        let setter = StateSetter::new(self.display_name, cell, Some(hooks.updater()));
        (setter.get(), setter)
    }

    /// `useRef`: a mutable cell kept across renders. Writing it never
    /// re-renders.
    pub fn use_ref<T: 'static>(&self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        let hooks = match self.hooks {
            Some(hooks) => hooks,
            None => {
                log::warn!("{}: useRef without host hook support", self.display_name);
                return Rc::new(RefCell::new(init()));
            }
        };

        match hooks.next_slot() {
            Some(slot) => unbox::<RefCell<T>>(self.display_name, USE_REF, &slot),
            None => {
                let cell = Rc::new(RefCell::new(init()));
                hooks.fill_slot(ValueBox::from_rc(cell.clone()));
                cell
            }
        }
    }

    /// `useEffect`: run `effect` after the render commits, on the first
    /// render and whenever `deps` differs from the previous render. The
    /// cleanup it returns runs before the next run and on unmount. Pass
    /// `()` to run once after mount. Without host hook support the effect
    /// never runs.
    pub fn use_effect<D: PartialEq + 'static>(
        &self,
        deps: D,
        effect: impl FnOnce() -> Option<EffectCallback> + 'static,
    ) {
        let hooks = match self.hooks {
            Some(hooks) => hooks,
            None => {
                log::warn!("{}: useEffect without host hook support, not run", self.display_name);
                return;
            }
        };

        let slot = match hooks.next_slot() {
            Some(slot) => unbox::<EffectSlot<D>>(self.display_name, USE_EFFECT, &slot),
            None => {
                let slot = Rc::new(EffectSlot::<D>::default());
                hooks.fill_slot(ValueBox::from_rc(slot.clone()));
                let cleanup = slot.cleanup.clone();
                hooks.on_unmount(Box::new(move || run_cleanup(&cleanup)));
                slot
            }
        };

        if slot.deps.borrow().as_ref() == Some(&deps) {
            return;
        }
        *slot.deps.borrow_mut() = Some(deps);

        let cleanup = slot.cleanup.clone();
        hooks.schedule_effect(Box::new(move || {
            run_cleanup(&cleanup);
            let next = effect();
            *cleanup.borrow_mut() = next;
        }));
    }
}

impl<P> fmt::Debug for FunctionScope<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionScope")
            .field("display_name", &self.display_name)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

/// Dependencies of the last run and the cleanup it left behind
struct EffectSlot<D> {
    deps: RefCell<Option<D>>,
    cleanup: Rc<RefCell<Option<EffectCallback>>>,
}

impl<D> Default for EffectSlot<D> {
    fn default() -> Self {
        Self {
            deps: RefCell::new(None),
            cleanup: Rc::default(),
        }
    }
}

fn run_cleanup(cleanup: &RefCell<Option<EffectCallback>>) {
    let pending = cleanup.borrow_mut().take();
    if let Some(pending) = pending {
        pending();
    }
}

/// Setter returned by [`FunctionScope::use_state`]
pub struct StateSetter<T> {
    display_name: Rc<str>,
    cell: Rc<RefCell<Rc<T>>>,
    update: Option<UpdateCallback>,
}

impl<T: PartialEq + 'static> StateSetter<T> {
    fn new(display_name: &str, cell: Rc<RefCell<Rc<T>>>, update: Option<UpdateCallback>) -> Self {
        Self {
            display_name: display_name.into(),
            cell,
            update,
        }
    }

    /// The value stored last
    pub fn get(&self) -> Rc<T> {
        self.cell.borrow().clone()
    }

    /// Store `value` and schedule a re-render, unless it equals the current
    /// value
    pub fn set(&self, value: T) {
        if **self.cell.borrow() == value {
            log::trace!("{}: useState update suppressed, value unchanged", self.display_name);
            return;
        }

        *self.cell.borrow_mut() = Rc::new(value);
        if let Some(update) = &self.update {
            update();
        }
    }

    /// Derive the next value from the current one
    pub fn update(&self, next: impl FnOnce(&T) -> T) {
        let current = self.get();
        self.set(next(&current));
    }
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            display_name: self.display_name.clone(),
            cell: self.cell.clone(),
            update: self.update.clone(),
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("display_name", &self.display_name)
            .field("live", &self.update.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    struct Label(String);

    impl Props for Label {}

    struct Badge;

    impl FunctionComponent for Badge {
        type Props = Label;

        fn render(scope: &FunctionScope<'_, Label>) -> Element {
            let (clicks, _) = scope.use_state(|| 0u32);
            let text = match scope.props() {
                Some(label) => format!("{} {}", label.0, clicks),
                None => format!("badge {}", clicks),
            };
            Element::new(text)
        }
    }

    /// Slots in a vector, effects run on demand
    #[derive(Default)]
    struct SlotTable {
        slots: RefCell<Vec<ValueBox>>,
        cursor: Cell<usize>,
        effects: RefCell<Vec<EffectCallback>>,
        cleanups: RefCell<Vec<EffectCallback>>,
        updates: Rc<Cell<u32>>,
    }

    impl SlotTable {
        fn rewind(&self) {
            self.cursor.set(0);
        }

        fn commit(&self) {
            let effects: Vec<EffectCallback> = self.effects.borrow_mut().drain(..).collect();
            for effect in effects {
                effect();
            }
        }

        fn unmount(&self) {
            let cleanups: Vec<EffectCallback> = self.cleanups.borrow_mut().drain(..).collect();
            for cleanup in cleanups {
                cleanup();
            }
        }
    }

    impl HookDispatcher for SlotTable {
        fn next_slot(&self) -> Option<ValueBox> {
            let index = self.cursor.get();
            self.cursor.set(index + 1);
            self.slots.borrow().get(index).cloned()
        }

        fn fill_slot(&self, value: ValueBox) {
            self.slots.borrow_mut().push(value);
        }

        fn updater(&self) -> UpdateCallback {
            let updates = self.updates.clone();
            Rc::new(move || updates.set(updates.get() + 1))
        }

        fn schedule_effect(&self, effect: EffectCallback) {
            self.effects.borrow_mut().push(effect);
        }

        fn on_unmount(&self, cleanup: EffectCallback) {
            self.cleanups.borrow_mut().push(cleanup);
        }
    }

    fn scope<'a>(props: &'a PropsObject, hooks: Option<&'a dyn HookDispatcher>) -> FunctionScope<'a, Label> {
        FunctionScope::new(props, "Badge(tests)", None, hooks)
    }

    #[test]
    fn test_function_type_identity() {
        let a = function_type::<Badge>(WeakBridge::detached());
        let b = function_type::<Badge>(WeakBridge::detached());
        assert!(a.same_component(&b));
        assert_eq!(a.display_name(), "Badge(reactbind::function::tests)");

        let props = PropsObject::new(Some(ValueBox::wrap(Label("new".into()))), None);
        let text = a.render(&props, None).node::<String>().unwrap();
        assert_eq!(*text, "new 0");
    }

    #[test]
    fn test_state_kept_across_renders() {
        let table = SlotTable::default();
        let props = PropsObject::default();

        let (count, set_count) = scope(&props, Some(&table)).use_state(|| 1i32);
        assert_eq!(*count, 1);
        set_count.set(1);
        assert_eq!(table.updates.get(), 0);
        set_count.update(|count| count + 4);
        assert_eq!(table.updates.get(), 1);

        table.rewind();
        let (count, _) = scope(&props, Some(&table)).use_state(|| 99i32);
        assert_eq!(*count, 5);
    }

    #[test]
    fn test_ref_kept_across_renders() {
        let table = SlotTable::default();
        let props = PropsObject::default();

        scope(&props, Some(&table)).use_ref(|| 1u8).replace(7);
        table.rewind();
        assert_eq!(*scope(&props, Some(&table)).use_ref(|| 1u8).borrow(), 7);
        assert_eq!(table.updates.get(), 0);
    }

    #[test]
    fn test_effect_runs_on_deps_change() {
        let table = SlotTable::default();
        let props = PropsObject::default();
        let log: Rc<RefCell<Vec<String>>> = Rc::default();

        let render = |dep: u32| {
            table.rewind();
            let log = log.clone();
            scope(&props, Some(&table)).use_effect(dep, move || {
                log.borrow_mut().push(format!("run {}", dep));
                let log = log.clone();
                Some(Box::new(move || log.borrow_mut().push(format!("cleanup {}", dep))) as EffectCallback)
            });
            table.commit();
        };

        render(1);
        render(1);
        render(2);
        table.unmount();

        assert_eq!(*log.borrow(), vec!["run 1", "cleanup 1", "run 2", "cleanup 2"]);
    }

    #[test]
    fn test_hooks_without_host_support() {
        let props = PropsObject::default();
        let scope = scope(&props, None);
        assert!(!scope.has_hooks());

        let (value, setter) = scope.use_state(|| 3u8);
        assert_eq!(*value, 3);
        setter.set(4);
        assert_eq!(*setter.get(), 4);

        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        scope.use_effect((), move || {
            flag.set(true);
            None
        });
        assert!(!ran.get());
    }

    #[test]
    #[should_panic(expected = "slot 'useRef'")]
    fn test_hook_order_change_aborts() {
        let table = SlotTable::default();
        let props = PropsObject::default();

        scope(&props, Some(&table)).use_state(|| 0i32);
        table.rewind();
        let _ = scope(&props, Some(&table)).use_ref(|| String::new());
    }
}
