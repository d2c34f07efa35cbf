//! Bridge runtime
//!
//! [`Bridge`] is the entry point application code holds. It owns the host,
//! the descriptor cache and, when hot reload is on, the module registry.
//! Callbacks installed into host classes only keep a weak reference back to
//! it, so dropping the last `Bridge` clone releases everything even while the
//! host still holds classes.

use crate::cache::DescriptorCache;
use crate::component::Component;
use crate::config::BridgeConfig;
use crate::descriptor::{self, Binder, Builder};
use crate::error::unbox;
use crate::function::{self, FunctionComponent};
use crate::host::{Container, Descriptor, Element, ElementHandle, ElementType, Host, PropsObject, CHILDREN_SLOT};
use crate::instance::ComponentDef;
use reactbind_core::ValueBox;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

#[cfg(feature = "hot-reload")]
use crate::host::{ClassSpec, RenderCallback};
#[cfg(feature = "hot-reload")]
use crate::hot_reload::{HotModuleRegistry, HotTracking, ModuleImpl, ModuleWatcher};

/// Cache key suffix for hot-tracked descriptors
pub const HOT_SUFFIX: &str = "$hot";

/// Cache key of the hot variant of `tag`
pub fn hot_key(tag: &str) -> String {
    format!("{}{}", tag, HOT_SUFFIX)
}

struct BridgeInner {
    host: Rc<dyn Host>,
    cache: RefCell<DescriptorCache>,
    config: BridgeConfig,
    #[cfg(feature = "hot-reload")]
    hot: Option<Rc<HotModuleRegistry>>,
}

/// Typed front end to a host renderer
#[derive(Clone)]
pub struct Bridge {
    inner: Rc<BridgeInner>,
}

/// Non-owning bridge reference held by installed callbacks
#[derive(Clone)]
pub(crate) struct WeakBridge(Weak<BridgeInner>);

impl WeakBridge {
    pub(crate) fn upgrade(&self) -> Option<Bridge> {
        self.0.upgrade().map(|inner| Bridge { inner })
    }

    /// A reference that never upgrades
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        WeakBridge(Weak::new())
    }
}

impl Bridge {
    /// Bridge with default configuration (hot reload off)
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self::with_config(host, BridgeConfig::default())
    }

    pub fn with_config(host: Rc<dyn Host>, config: BridgeConfig) -> Self {
        #[cfg(feature = "hot-reload")]
        let hot = config
            .hot_reload
            .enabled
            .then(|| Rc::new(HotModuleRegistry::new()));

        #[cfg(not(feature = "hot-reload"))]
        if config.hot_reload.enabled {
            log::warn!("Hot reload requested but the `hot-reload` feature is not compiled in");
        }

        log::debug!("Bridge created (hot reload: {})", config.hot_reload.enabled);

        Self {
            inner: Rc::new(BridgeInner {
                host,
                cache: RefCell::new(DescriptorCache::new()),
                config,
                #[cfg(feature = "hot-reload")]
                hot,
            }),
        }
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.inner.host
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Check if new descriptors are built in hot mode
    #[cfg(feature = "hot-reload")]
    pub fn is_hot(&self) -> bool {
        self.inner.hot.is_some()
    }

    #[cfg(not(feature = "hot-reload"))]
    pub fn is_hot(&self) -> bool {
        false
    }

    pub(crate) fn downgrade(&self) -> WeakBridge {
        WeakBridge(Rc::downgrade(&self.inner))
    }

    /// Create an element of component `C`.
    ///
    /// `_props` is set only when `props` is given, `_children` only when
    /// `children` is non-empty.
    pub fn create_element<C: Component>(&self, props: Option<C::Props>, children: Vec<Element>) -> Element {
        self.create_element_with::<C>(Rc::new(C::build), props, children)
    }

    /// Like [`create_element`](Self::create_element) with a custom instance
    /// builder, e.g. one that injects services into every instance.
    pub fn create_element_with<C: Component>(
        &self,
        builder: Builder<C>,
        props: Option<C::Props>,
        children: Vec<Element>,
    ) -> Element {
        let props = PropsObject::new(props.map(ValueBox::wrap), children_slot(&children));
        let descriptor = self.descriptor_with::<C>(builder, self.is_hot());
        self.inner
            .host
            .create_element(ElementType::Class(descriptor), props, children)
    }

    /// Plain element of `C` carrying an existing props object. Never hot
    /// tracked; this is what a swapped module renders.
    pub fn create_element_from<C: Component>(&self, props: &PropsObject) -> Element {
        let children = props
            .children()
            .map(|boxed| (*unbox::<Vec<Element>>(std::any::type_name::<C>(), CHILDREN_SLOT, boxed)).clone())
            .unwrap_or_default();
        let descriptor = self.descriptor_with::<C>(Rc::new(C::build), false);
        self.inner
            .host
            .create_element(ElementType::Class(descriptor), props.clone(), children)
    }

    /// Create an element of function component `F`.
    ///
    /// In hot mode a tagged function component is wrapped in a tracked class
    /// under its hot cache key, so module swaps and reloads reach it.
    pub fn create_function_element<F: FunctionComponent>(
        &self,
        props: Option<F::Props>,
        children: Vec<Element>,
    ) -> Element {
        let props = PropsObject::new(props.map(ValueBox::wrap), children_slot(&children));

        #[cfg(feature = "hot-reload")]
        if let (Some(module), Some(registry)) = (F::TAG, &self.inner.hot) {
            let descriptor = self.cached_descriptor(Some(hot_key(module).as_str()), || {
                self.build_function_wrapper::<F>(module, registry.clone())
            });
            return self
                .inner
                .host
                .create_element(ElementType::Class(descriptor), props, children);
        }

        let ty = function::function_type::<F>(self.downgrade());
        self.inner
            .host
            .create_element(ElementType::Function(ty), props, children)
    }

    /// Plain function element of `F` carrying an existing props object.
    /// Never wrapped; this is what a hot wrapper and a swapped module render.
    pub fn create_function_element_from<F: FunctionComponent>(&self, props: &PropsObject) -> Element {
        let children = props
            .children()
            .map(|boxed| (*unbox::<Vec<Element>>(std::any::type_name::<F>(), CHILDREN_SLOT, boxed)).clone())
            .unwrap_or_default();
        let ty = function::function_type::<F>(self.downgrade());
        self.inner
            .host
            .create_element(ElementType::Function(ty), props.clone(), children)
    }

    /// Class whose render is a plain element of `F`, decorated like any
    /// hot-tracked descriptor
    #[cfg(feature = "hot-reload")]
    fn build_function_wrapper<F: FunctionComponent>(
        &self,
        module: &'static str,
        registry: Rc<HotModuleRegistry>,
    ) -> Descriptor {
        let display_name = reactbind_core::display_name(std::any::type_name::<F>());
        let bridge = self.downgrade();
        let render: RenderCallback = Box::new(move |handle: &ElementHandle| match bridge.upgrade() {
            Some(bridge) => bridge.create_function_element_from::<F>(&handle.props().unwrap_or_default()),
            None => {
                log::warn!("Bridge dropped, '{}' renders nothing", module);
                Element::new(())
            }
        });

        let spec = ClassSpec::new(display_name.as_str(), render);
        let spec = HotTracking::new(module, registry, self.downgrade()).decorate(spec);

        log::debug!("Building hot wrapper {} for function component", display_name);
        self.inner.host.create_class(spec)
    }

    /// Create an element for an intrinsic host tag such as `div`
    pub fn create_intrinsic(&self, tag: &str, props: Option<ValueBox>, children: Vec<Element>) -> Element {
        let props = PropsObject::new(props, children_slot(&children));
        self.inner
            .host
            .create_element(ElementType::Intrinsic(tag.to_string()), props, children)
    }

    /// Render `element` into `container`
    pub fn render(&self, element: Element, container: &Container) -> Element {
        self.inner.host.render(element, container)
    }

    /// The descriptor elements of `C` are created with
    pub fn descriptor_for<C: Component>(&self) -> Descriptor {
        self.descriptor_with::<C>(Rc::new(C::build), self.is_hot())
    }

    fn descriptor_with<C: Component>(&self, builder: Builder<C>, hot: bool) -> Descriptor {
        let module = if hot { C::TAG } else { None };
        let key = match (C::TAG, module) {
            (Some(tag), Some(_)) => Some(hot_key(tag)),
            (Some(tag), None) => Some(tag.to_string()),
            (None, _) => None,
        };

        self.cached_descriptor(key.as_deref(), || self.build_descriptor::<C>(builder, module))
    }

    /// `getOrBuild` without holding a cache borrow across the build:
    /// `create_class` may re-enter the bridge
    fn cached_descriptor(&self, key: Option<&str>, build: impl FnOnce() -> Descriptor) -> Descriptor {
        if let Some(key) = key {
            let cached = self.inner.cache.borrow().get(key);
            if let Some(found) = cached {
                log::trace!("Descriptor cache hit for '{}'", key);
                return found;
            }
        }

        let descriptor = build();
        self.inner.cache.borrow_mut().insert(key, descriptor.clone());
        descriptor
    }

    fn build_descriptor<C: Component>(&self, builder: Builder<C>, module: Option<&'static str>) -> Descriptor {
        let shape = C::shape();
        let display_name: Rc<str> = shape.display_name().into();
        let binder = Rc::new(Binder::new(builder, display_name, self.downgrade(), module));
        let spec = descriptor::class_spec(&shape, binder);

        #[cfg(feature = "hot-reload")]
        let spec = match (module, &self.inner.hot) {
            (Some(module), Some(registry)) => {
                HotTracking::new(module, registry.clone(), self.downgrade()).decorate(spec)
            }
            _ => spec,
        };

        log::debug!(
            "Building descriptor {} with {:?}",
            shape.display_name(),
            shape.capabilities()
        );
        self.inner.host.create_class(spec)
    }

    /// Typed view of a mounted element of `C`, e.g. to call `set_state` from
    /// an event handler outside the component
    pub fn bind<C: Component>(&self, handle: &ElementHandle) -> C {
        let module = if self.is_hot() { C::TAG } else { None };
        let display_name: Rc<str> = C::shape().display_name().into();
        C::build(ComponentDef::bind(handle.clone(), display_name, self.downgrade(), module))
    }

    /// Drop the cached descriptors for `tag`, plain and hot
    pub fn invalidate(&self, tag: &str) -> bool {
        let mut cache = self.inner.cache.borrow_mut();
        let plain = cache.invalidate(tag);
        let hot = cache.invalidate(&hot_key(tag));
        plain || hot
    }

    /// Drop every cached descriptor
    pub fn clear_cache(&self) {
        self.inner.cache.borrow_mut().clear();
    }

    /// Check if a descriptor is cached under `key`
    pub fn is_cached(&self, key: &str) -> bool {
        self.inner.cache.borrow().contains(key)
    }

    /// Number of descriptors built so far
    pub fn descriptor_builds(&self) -> usize {
        self.inner.cache.borrow().builds()
    }

    /// The hot module registry, when hot reload is enabled
    #[cfg(feature = "hot-reload")]
    pub fn hot_registry(&self) -> Option<&HotModuleRegistry> {
        self.inner.hot.as_deref()
    }

    /// Install a new implementation for `module` and re-render its dependents
    #[cfg(feature = "hot-reload")]
    pub fn swap_module(&self, module: &str, implementation: ModuleImpl) -> usize {
        match &self.inner.hot {
            Some(registry) => {
                registry.swap(module, implementation);
                self.reload_module(module)
            }
            None => {
                log::warn!("Ignoring swap of '{}': hot reload is disabled", module);
                0
            }
        }
    }

    /// Invalidate `module` and force every live dependent to re-render.
    /// Returns the number of instances notified.
    #[cfg(feature = "hot-reload")]
    pub fn reload_module(&self, module: &str) -> usize {
        let registry = match &self.inner.hot {
            Some(registry) => registry.clone(),
            None => return 0,
        };

        self.invalidate(module);
        let dependents = registry.dependents(module);
        for handle in &dependents {
            handle.force_update();
        }

        log::info!("Reloaded module '{}' ({} instances)", module, dependents.len());
        dependents.len()
    }

    /// Reload every module the watcher reports as changed
    #[cfg(feature = "hot-reload")]
    pub fn apply_changes(&self, watcher: &ModuleWatcher) -> Vec<String> {
        let changed = watcher.poll();
        for module in &changed {
            self.reload_module(module);
        }
        changed
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("hot", &self.is_hot())
            .field("cached", &self.inner.cache.borrow().len())
            .finish()
    }
}

fn children_slot(children: &[Element]) -> Option<ValueBox> {
    if children.is_empty() {
        None
    } else {
        Some(ValueBox::wrap(children.to_vec()))
    }
}
