//! In-memory host renderer
//!
//! Drives class specs through the React lifecycle without a DOM. There is no
//! virtual DOM and no keyed diffing: a re-render reuses the instance in the
//! same position when it has the same class, or an intrinsic node with the
//! same tag, and remounts everything else. Forced updates are queued and run
//! on [`HeadlessHost::flush`], the way a browser host batches them to the
//! next tick.
//!
//! Function components keep their hook slots on a [`HeadlessFunction`]. A
//! function instance re-renders on every parent render, and its effects run
//! right after its own subtree is committed.
//!
//! Used by the test suites and by tooling that needs to exercise components
//! headlessly.

use crate::host::{
    CaughtError, ClassSpec, Container, Descriptor, EffectCallback, Element, ElementHandle, ElementType,
    FunctionType, HookDispatcher, Host, HostInstance, PropsObject, StateObject, UpdateCallback,
};
use reactbind_core::ValueBox;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Flush rounds before giving up on an update loop
const MAX_FLUSH_ROUNDS: usize = 64;

#[derive(Default)]
struct UpdateQueue {
    dirty: RefCell<Vec<Dirty>>,
    force_updates: Cell<usize>,
}

impl UpdateQueue {
    fn push(&self, dirty: Dirty) {
        self.force_updates.set(self.force_updates.get() + 1);
        self.dirty.borrow_mut().push(dirty);
    }
}

/// An instance waiting for a re-render
#[derive(Clone)]
enum Dirty {
    Class(Rc<HeadlessInstance>),
    Function(Rc<HeadlessFunction>),
}

impl Dirty {
    fn is_mounted(&self) -> bool {
        match self {
            Dirty::Class(instance) => instance.is_mounted(),
            Dirty::Function(function) => function.is_mounted(),
        }
    }

    fn same(&self, other: &Dirty) -> bool {
        match (self, other) {
            (Dirty::Class(a), Dirty::Class(b)) => Rc::ptr_eq(a, b),
            (Dirty::Function(a), Dirty::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Class built by [`HeadlessHost::create_class`]
pub struct HeadlessClass {
    spec: ClassSpec,
}

impl HeadlessClass {
    pub fn spec(&self) -> &ClassSpec {
        &self.spec
    }
}

/// Element created by [`HeadlessHost::create_element`]
pub struct HeadlessNode {
    ty: ElementType,
    props: PropsObject,
    children: Vec<Element>,
}

impl HeadlessNode {
    pub fn element_type(&self) -> &ElementType {
        &self.ty
    }

    pub fn props(&self) -> &PropsObject {
        &self.props
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }
}

/// A mounted class instance
pub struct HeadlessInstance {
    this: Weak<HeadlessInstance>,
    class: Rc<HeadlessClass>,
    descriptor: Descriptor,
    props: RefCell<PropsObject>,
    state: RefCell<Option<StateObject>>,
    rendered: RefCell<Option<Mounted>>,
    mounted: Cell<bool>,
    renders: Cell<usize>,
    queue: Rc<UpdateQueue>,
}

impl HeadlessInstance {
    pub fn handle(self: &Rc<Self>) -> ElementHandle {
        ElementHandle::new(self.clone())
    }

    pub fn display_name(&self) -> &str {
        self.descriptor.display_name()
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Number of times render ran
    pub fn render_count(&self) -> usize {
        self.renders.get()
    }

    /// The tree produced by the last render
    pub fn rendered(&self) -> Option<Mounted> {
        self.rendered.borrow().clone()
    }

    /// The instance this one rendered directly, if its output is a class
    pub fn child_instance(&self) -> Option<Rc<HeadlessInstance>> {
        match &*self.rendered.borrow() {
            Some(Mounted::Instance(child)) => Some(child.clone()),
            _ => None,
        }
    }
}

impl HostInstance for HeadlessInstance {
    fn props(&self) -> Option<PropsObject> {
        Some(self.props.borrow().clone())
    }

    fn state(&self) -> Option<StateObject> {
        self.state.borrow().clone()
    }

    fn force_update(&self) {
        if let Some(this) = self.this.upgrade() {
            self.queue.push(Dirty::Class(this));
        }
    }
}

/// A mounted function component
pub struct HeadlessFunction {
    this: Weak<HeadlessFunction>,
    ty: FunctionType,
    props: RefCell<PropsObject>,
    slots: RefCell<Vec<ValueBox>>,
    cleanups: RefCell<Vec<EffectCallback>>,
    rendered: RefCell<Option<Mounted>>,
    mounted: Cell<bool>,
    renders: Cell<usize>,
    queue: Rc<UpdateQueue>,
}

impl HeadlessFunction {
    pub fn display_name(&self) -> &str {
        self.ty.display_name()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Number of times render ran
    pub fn render_count(&self) -> usize {
        self.renders.get()
    }

    /// Number of hook slots in use
    pub fn hook_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// The tree produced by the last render
    pub fn rendered(&self) -> Option<Mounted> {
        self.rendered.borrow().clone()
    }

    fn request_update(&self) {
        if let Some(this) = self.this.upgrade() {
            self.queue.push(Dirty::Function(this));
        }
    }
}

/// Hook dispatcher for one render of a [`HeadlessFunction`]
struct HookFrame<'a> {
    function: &'a Rc<HeadlessFunction>,
    cursor: Cell<usize>,
    effects: RefCell<Vec<EffectCallback>>,
}

impl<'a> HookFrame<'a> {
    fn new(function: &'a Rc<HeadlessFunction>) -> Self {
        Self {
            function,
            cursor: Cell::new(0),
            effects: RefCell::new(Vec::new()),
        }
    }
}

impl HookDispatcher for HookFrame<'_> {
    fn next_slot(&self) -> Option<ValueBox> {
        let index = self.cursor.get();
        self.cursor.set(index + 1);
        self.function.slots.borrow().get(index).cloned()
    }

    fn fill_slot(&self, value: ValueBox) {
        let index = self.cursor.get().saturating_sub(1);
        let mut slots = self.function.slots.borrow_mut();
        match slots.get_mut(index) {
            Some(slot) => *slot = value,
            None => slots.push(value),
        }
    }

    fn updater(&self) -> UpdateCallback {
        let function = Rc::downgrade(self.function);
        Rc::new(move || {
            if let Some(function) = function.upgrade() {
                function.request_update();
            }
        })
    }

    fn schedule_effect(&self, effect: EffectCallback) {
        self.effects.borrow_mut().push(effect);
    }

    fn on_unmount(&self, cleanup: EffectCallback) {
        self.function.cleanups.borrow_mut().push(cleanup);
    }
}

/// Mounted tree node
#[derive(Clone)]
pub enum Mounted {
    Instance(Rc<HeadlessInstance>),
    Function(Rc<HeadlessFunction>),
    Intrinsic {
        tag: String,
        props: PropsObject,
        children: Vec<Mounted>,
    },
    /// An element this host did not create
    Foreign(Element),
}

impl Mounted {
    pub fn instance(&self) -> Option<&Rc<HeadlessInstance>> {
        match self {
            Mounted::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn function(&self) -> Option<&Rc<HeadlessFunction>> {
        match self {
            Mounted::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Mounted::Intrinsic { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Mounted] {
        match self {
            Mounted::Intrinsic { children, .. } => children.as_slice(),
            _ => &[],
        }
    }

    /// Text of an intrinsic node whose props box holds a `String`
    pub fn text(&self) -> Option<String> {
        match self {
            Mounted::Intrinsic { props, .. } => {
                let boxed = props.props()?;
                boxed.downcast_ref::<String>().cloned()
            }
            _ => None,
        }
    }

    /// Text of the first intrinsic node, following instances down
    pub fn first_text(&self) -> Option<String> {
        match self {
            Mounted::Instance(instance) => instance.rendered()?.first_text(),
            Mounted::Function(function) => function.rendered()?.first_text(),
            Mounted::Intrinsic { .. } => self.text(),
            Mounted::Foreign(_) => None,
        }
    }
}

/// Headless host renderer
#[derive(Default)]
pub struct HeadlessHost {
    queue: Rc<UpdateQueue>,
    roots: RefCell<Vec<(Container, Mounted)>>,
    classes: Cell<usize>,
}

impl HeadlessHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Number of classes built
    pub fn classes_created(&self) -> usize {
        self.classes.get()
    }

    /// Number of re-render requests so far, from `force_update` and from
    /// hook state setters
    pub fn force_update_count(&self) -> usize {
        self.queue.force_updates.get()
    }

    /// Number of queued updates waiting for [`flush`](Self::flush)
    pub fn pending_updates(&self) -> usize {
        self.queue.dirty.borrow().len()
    }

    /// Tree rendered into `container`
    pub fn root(&self, container: &Container) -> Option<Mounted> {
        self.roots
            .borrow()
            .iter()
            .find(|(target, _)| target.ptr_eq(container))
            .map(|(_, mounted)| mounted.clone())
    }

    /// Root instance rendered into `container`
    pub fn root_instance(&self, container: &Container) -> Option<Rc<HeadlessInstance>> {
        self.root(container)?.instance().cloned()
    }

    /// Root function instance rendered into `container`
    pub fn root_function(&self, container: &Container) -> Option<Rc<HeadlessFunction>> {
        self.root(container)?.function().cloned()
    }

    /// Unmount whatever is rendered into `container`
    pub fn unmount(&self, container: &Container) -> bool {
        let previous = self.take_root(container);
        match previous {
            Some(mounted) => {
                self.unmount_tree(mounted);
                true
            }
            None => false,
        }
    }

    /// Run queued updates, including ones queued while flushing. Returns the
    /// number of re-renders.
    pub fn flush(&self) -> usize {
        let mut rerendered = 0;
        for _ in 0..MAX_FLUSH_ROUNDS {
            let batch: Vec<Dirty> = self.queue.dirty.borrow_mut().drain(..).collect();
            if batch.is_empty() {
                return rerendered;
            }

            let mut seen: Vec<&Dirty> = Vec::with_capacity(batch.len());
            for dirty in &batch {
                if !dirty.is_mounted() || seen.iter().any(|done| done.same(dirty)) {
                    continue;
                }
                seen.push(dirty);

                match dirty {
                    Dirty::Class(instance) => {
                        let props = instance.props.borrow().clone();
                        let state = instance.state.borrow().clone();
                        self.rerender(instance, &props, state.as_ref());
                    }
                    Dirty::Function(function) => self.rerender_function(function),
                }
                rerendered += 1;
            }
        }

        log::warn!("Update queue still dirty after {} rounds", MAX_FLUSH_ROUNDS);
        rerendered
    }

    /// Deliver a child error to `boundary`: derive error state, notify
    /// `componentDidCatch`, then re-render the boundary.
    pub fn catch_error(&self, boundary: &Rc<HeadlessInstance>, error: &CaughtError) {
        let spec = &boundary.class.spec;
        let handle = boundary.handle();

        let prev_state = boundary.state.borrow().clone();
        if let Some(derive) = &spec.statics.get_derived_state_from_error {
            let derived = derive(error);
            *boundary.state.borrow_mut() = Some(derived);
        }
        if let Some(did_catch) = &spec.component_did_catch {
            did_catch(&handle, error);
        }

        let props = boundary.props.borrow().clone();
        self.rerender(boundary, &props, prev_state.as_ref());
    }

    fn take_root(&self, container: &Container) -> Option<Mounted> {
        let mut roots = self.roots.borrow_mut();
        let index = roots.iter().position(|(target, _)| target.ptr_eq(container))?;
        Some(roots.remove(index).1)
    }

    fn mount(&self, element: &Element) -> Mounted {
        let node = match element.node::<HeadlessNode>() {
            Some(node) => node,
            None => return Mounted::Foreign(element.clone()),
        };

        match &node.ty {
            ElementType::Intrinsic(tag) => Mounted::Intrinsic {
                tag: tag.clone(),
                props: node.props.clone(),
                children: node.children.iter().map(|child| self.mount(child)).collect(),
            },
            ElementType::Function(ty) => Mounted::Function(self.mount_function(ty.clone(), node.props.clone())),
            ElementType::Class(descriptor) => match descriptor.class::<HeadlessClass>() {
                Some(class) => Mounted::Instance(self.mount_instance(class, descriptor.clone(), node.props.clone())),
                None => {
                    log::warn!("{} was not built by this host", descriptor.display_name());
                    Mounted::Foreign(element.clone())
                }
            },
        }
    }

    fn mount_instance(&self, class: Rc<HeadlessClass>, descriptor: Descriptor, props: PropsObject) -> Rc<HeadlessInstance> {
        let instance = Rc::new_cyclic(|this| HeadlessInstance {
            this: this.clone(),
            class,
            descriptor,
            props: RefCell::new(props),
            state: RefCell::new(None),
            rendered: RefCell::new(None),
            mounted: Cell::new(false),
            renders: Cell::new(0),
            queue: self.queue.clone(),
        });
        let handle = instance.handle();
        let spec = &instance.class.spec;

        let initial = spec.get_initial_state.as_ref().map(|init| init(&handle));
        *instance.state.borrow_mut() = initial;

        if let Some(derive) = &spec.statics.get_derived_state_from_props {
            let props = instance.props.borrow().clone();
            let current = instance.state.borrow().clone();
            let derived = derive(&props, current.as_ref());
            *instance.state.borrow_mut() = Some(derived);
        }

        if let Some(will_mount) = &spec.component_will_mount {
            will_mount(&handle);
        }

        let output = self.render_instance(&instance, &handle);
        let rendered = self.mount(&output);
        *instance.rendered.borrow_mut() = Some(rendered);
        instance.mounted.set(true);

        if let Some(did_mount) = &spec.component_did_mount {
            did_mount(&handle);
        }

        log::trace!("Mounted {}", instance.display_name());
        instance
    }

    fn mount_function(&self, ty: FunctionType, props: PropsObject) -> Rc<HeadlessFunction> {
        let function = Rc::new_cyclic(|this| HeadlessFunction {
            this: this.clone(),
            ty,
            props: RefCell::new(props),
            slots: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
            rendered: RefCell::new(None),
            mounted: Cell::new(false),
            renders: Cell::new(0),
            queue: self.queue.clone(),
        });

        let (output, effects) = self.render_function(&function);
        let rendered = self.mount(&output);
        *function.rendered.borrow_mut() = Some(rendered);
        function.mounted.set(true);
        run_effects(effects);

        log::trace!("Mounted function {}", function.display_name());
        function
    }

    fn render_function(&self, function: &Rc<HeadlessFunction>) -> (Element, Vec<EffectCallback>) {
        function.renders.set(function.renders.get() + 1);
        let props = function.props.borrow().clone();
        let frame = HookFrame::new(function);
        let output = function.ty.render(&props, Some(&frame));
        (output, frame.effects.into_inner())
    }

    fn rerender_function(&self, function: &Rc<HeadlessFunction>) {
        let (output, effects) = self.render_function(function);
        let previous = function.rendered.borrow_mut().take();
        let next = self.reconcile(previous, &output);
        *function.rendered.borrow_mut() = Some(next);
        run_effects(effects);
    }

    fn render_instance(&self, instance: &Rc<HeadlessInstance>, handle: &ElementHandle) -> Element {
        instance.renders.set(instance.renders.get() + 1);
        (instance.class.spec.render)(handle)
    }

    /// New props from a parent re-render. Returns whether it re-rendered.
    fn update_props(&self, instance: &Rc<HeadlessInstance>, next_props: PropsObject) -> bool {
        let spec = &instance.class.spec;
        let handle = instance.handle();

        if let Some(will_receive) = &spec.component_will_receive_props {
            will_receive(&handle, &next_props);
        }

        let prev_state = instance.state.borrow().clone();
        let next_state = match &spec.statics.get_derived_state_from_props {
            Some(derive) => Some(derive(&next_props, prev_state.as_ref())),
            None => prev_state.clone(),
        };

        let should_update = match &spec.should_component_update {
            Some(decide) => decide(&handle, &next_props, next_state.as_ref()),
            None => true,
        };

        let prev_props = instance.props.replace(next_props);
        *instance.state.borrow_mut() = next_state;

        if should_update {
            self.rerender(instance, &prev_props, prev_state.as_ref());
        }
        should_update
    }

    fn rerender(&self, instance: &Rc<HeadlessInstance>, prev_props: &PropsObject, prev_state: Option<&StateObject>) {
        let spec = &instance.class.spec;
        let handle = instance.handle();

        let snapshot = spec
            .get_snapshot_before_update
            .as_ref()
            .and_then(|snapshot| snapshot(&handle, prev_props, prev_state));

        let output = self.render_instance(instance, &handle);
        let previous = instance.rendered.borrow_mut().take();
        let next = self.reconcile(previous, &output);
        *instance.rendered.borrow_mut() = Some(next);

        if let Some(did_update) = &spec.component_did_update {
            did_update(&handle, prev_props, prev_state, snapshot.as_ref());
        }
    }

    fn reconcile(&self, previous: Option<Mounted>, element: &Element) -> Mounted {
        let node = match element.node::<HeadlessNode>() {
            Some(node) => node,
            None => {
                if let Some(old) = previous {
                    self.unmount_tree(old);
                }
                return Mounted::Foreign(element.clone());
            }
        };

        match (previous, &node.ty) {
            (Some(Mounted::Instance(existing)), ElementType::Class(descriptor))
                if existing.descriptor.ptr_eq(descriptor) =>
            {
                self.update_props(&existing, node.props.clone());
                Mounted::Instance(existing)
            }
            (Some(Mounted::Function(existing)), ElementType::Function(ty)) if existing.ty.same_component(ty) => {
                *existing.props.borrow_mut() = node.props.clone();
                self.rerender_function(&existing);
                Mounted::Function(existing)
            }
            (Some(Mounted::Intrinsic { tag, children, .. }), ElementType::Intrinsic(next_tag)) if tag == *next_tag => {
                let mut old_children = children.into_iter();
                let children = node
                    .children
                    .iter()
                    .map(|child| self.reconcile(old_children.next(), child))
                    .collect();
                for leftover in old_children {
                    self.unmount_tree(leftover);
                }
                Mounted::Intrinsic {
                    tag,
                    props: node.props.clone(),
                    children,
                }
            }
            (previous, _) => {
                if let Some(old) = previous {
                    self.unmount_tree(old);
                }
                self.mount(element)
            }
        }
    }

    fn unmount_tree(&self, mounted: Mounted) {
        match mounted {
            Mounted::Instance(instance) => {
                if !instance.is_mounted() {
                    return;
                }
                if let Some(will_unmount) = &instance.class.spec.component_will_unmount {
                    will_unmount(&instance.handle());
                }
                instance.mounted.set(false);

                let rendered = instance.rendered.borrow_mut().take();
                if let Some(rendered) = rendered {
                    self.unmount_tree(rendered);
                }
                log::trace!("Unmounted {}", instance.display_name());
            }
            Mounted::Function(function) => {
                if !function.is_mounted() {
                    return;
                }
                function.mounted.set(false);
                let cleanups: Vec<EffectCallback> = function.cleanups.borrow_mut().drain(..).collect();
                run_effects(cleanups);

                let rendered = function.rendered.borrow_mut().take();
                if let Some(rendered) = rendered {
                    self.unmount_tree(rendered);
                }
                log::trace!("Unmounted function {}", function.display_name());
            }
            Mounted::Intrinsic { children, .. } => {
                for child in children {
                    self.unmount_tree(child);
                }
            }
            Mounted::Foreign(_) => {}
        }
    }
}

fn run_effects(effects: Vec<EffectCallback>) {
    for effect in effects {
        effect();
    }
}

impl Host for HeadlessHost {
    fn create_class(&self, spec: ClassSpec) -> Descriptor {
        self.classes.set(self.classes.get() + 1);
        let display_name = spec.display_name.clone();
        Descriptor::new(&display_name, HeadlessClass { spec })
    }

    fn create_element(&self, ty: ElementType, props: PropsObject, children: Vec<Element>) -> Element {
        Element::new(HeadlessNode { ty, props, children })
    }

    fn render(&self, element: Element, container: &Container) -> Element {
        let previous = self.take_root(container);
        let mounted = self.reconcile(previous, &element);
        self.roots.borrow_mut().push((container.clone(), mounted));
        element
    }
}
