//! Hot-reload support
//!
//! In hot mode every tagged descriptor is built with three extra behaviours:
//! mounted instances register themselves as dependents of their module,
//! unmounting removes them again, and render goes through the registry so a
//! swapped-in implementation takes over without remounting.
//!
//! [`ModuleWatcher`] maps file changes back to module ids; the bridge then
//! invalidates the module and forces its dependents to re-render.

use crate::bridge::{Bridge, WeakBridge};
use crate::component::Component;
use crate::config::HotReloadConfig;
use crate::error::{BridgeError, Result};
use crate::function::FunctionComponent;
use crate::host::{ClassSpec, Element, ElementHandle, InstanceCallback, PropsObject, RenderCallback};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

/// Current implementation of a module
///
/// Renders from the props object of the instance being re-rendered. The
/// element it produces must not be hot tracked, or the swapped render would
/// route back through the registry forever.
#[derive(Clone)]
pub struct ModuleImpl(Rc<dyn Fn(&Bridge, &PropsObject) -> Element>);

impl ModuleImpl {
    pub fn new(render: impl Fn(&Bridge, &PropsObject) -> Element + 'static) -> Self {
        Self(Rc::new(render))
    }

    /// Implementation that renders a plain element of `C` with the same
    /// props and children
    pub fn component<C: Component>() -> Self {
        Self::new(|bridge: &Bridge, props: &PropsObject| bridge.create_element_from::<C>(props))
    }

    /// Implementation that renders a plain element of function component
    /// `F` with the same props and children
    pub fn function<F: FunctionComponent>() -> Self {
        Self::new(|bridge: &Bridge, props: &PropsObject| bridge.create_function_element_from::<F>(props))
    }

    pub fn render(&self, bridge: &Bridge, props: &PropsObject) -> Element {
        (self.0)(bridge, props)
    }
}

impl fmt::Debug for ModuleImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleImpl({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Live instances and current implementations, by module id
#[derive(Default)]
pub struct HotModuleRegistry {
    dependencies: RefCell<HashMap<String, Vec<ElementHandle>>>,
    implementations: RefCell<HashMap<String, ModuleImpl>>,
}

impl HotModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mounted instance. Returns false if it was already tracked.
    pub fn track(&self, module: &str, handle: ElementHandle) -> bool {
        let mut dependencies = self.dependencies.borrow_mut();
        let list = dependencies.entry(module.to_string()).or_default();
        if list.contains(&handle) {
            return false;
        }
        list.push(handle);
        log::trace!("Tracking {} dependents of '{}'", list.len(), module);
        true
    }

    /// Forget an unmounted instance. Unknown handles are ignored and an
    /// emptied list stays registered.
    pub fn untrack(&self, module: &str, handle: &ElementHandle) -> bool {
        let mut dependencies = self.dependencies.borrow_mut();
        let list = match dependencies.get_mut(module) {
            Some(list) => list,
            None => return false,
        };

        match list.iter().position(|tracked| tracked == handle) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the live instances of `module`
    pub fn dependents(&self, module: &str) -> Vec<ElementHandle> {
        self.dependencies
            .borrow()
            .get(module)
            .cloned()
            .unwrap_or_default()
    }

    pub fn dependent_count(&self, module: &str) -> usize {
        self.dependencies.borrow().get(module).map_or(0, Vec::len)
    }

    /// Check if `module` has ever had a dependent
    pub fn is_known(&self, module: &str) -> bool {
        self.dependencies.borrow().contains_key(module)
    }

    /// Install `implementation` for `module`, returning the previous one
    pub fn swap(&self, module: &str, implementation: ModuleImpl) -> Option<ModuleImpl> {
        log::debug!("Swapping implementation of '{}'", module);
        self.implementations
            .borrow_mut()
            .insert(module.to_string(), implementation)
    }

    pub fn current(&self, module: &str) -> Option<ModuleImpl> {
        self.implementations.borrow().get(module).cloned()
    }

    /// Drop the swapped implementation; renders fall back to the original
    pub fn retire(&self, module: &str) -> Option<ModuleImpl> {
        self.implementations.borrow_mut().remove(module)
    }

    /// Modules with a dependent list, sorted
    pub fn modules(&self) -> Vec<String> {
        let mut modules: Vec<String> = self.dependencies.borrow().keys().cloned().collect();
        modules.sort();
        modules
    }
}

impl fmt::Debug for HotModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotModuleRegistry")
            .field("modules", &self.modules())
            .field("swapped", &self.implementations.borrow().len())
            .finish()
    }
}

/// Decorates a class spec with hot-reload behaviour
pub(crate) struct HotTracking {
    module: &'static str,
    registry: Rc<HotModuleRegistry>,
    bridge: WeakBridge,
}

impl HotTracking {
    pub(crate) fn new(module: &'static str, registry: Rc<HotModuleRegistry>, bridge: WeakBridge) -> Self {
        Self {
            module,
            registry,
            bridge,
        }
    }

    pub(crate) fn decorate(self, spec: ClassSpec) -> ClassSpec {
        let ClassSpec {
            component_did_mount: original_did_mount,
            component_will_unmount: original_will_unmount,
            render: original_render,
            ..
        } = spec;
        let Self {
            module,
            registry,
            bridge,
        } = self;

        let did_mount: InstanceCallback = {
            let registry = registry.clone();
            Box::new(move |handle: &ElementHandle| {
                registry.track(module, handle.clone());
                if let Some(inner) = &original_did_mount {
                    inner(handle);
                }
            })
        };

        let will_unmount: InstanceCallback = {
            let registry = registry.clone();
            Box::new(move |handle: &ElementHandle| {
                if let Some(inner) = &original_will_unmount {
                    inner(handle);
                }
                registry.untrack(module, handle);
            })
        };

        let render: RenderCallback = Box::new(move |handle: &ElementHandle| {
            if let Some(replacement) = registry.current(module) {
                match bridge.upgrade() {
                    Some(bridge) => {
                        let props = handle.props().unwrap_or_default();
                        return replacement.render(&bridge, &props);
                    }
                    None => log::warn!("Bridge dropped, '{}' renders its original implementation", module),
                }
            }
            original_render(handle)
        });

        ClassSpec {
            component_did_mount: Some(did_mount),
            component_will_unmount: Some(will_unmount),
            render,
            ..spec
        }
    }
}

/// Maps source file changes to module ids
pub struct ModuleWatcher {
    /// The file watcher
    _watcher: Option<RecommendedWatcher>,
    /// Receiver for file events
    receiver: Option<Receiver<notify::Result<Event>>>,
    /// Canonical source path per module
    sources: Vec<(PathBuf, String)>,
    /// Changed modules waiting out the debounce (module -> time detected)
    pending: Mutex<HashMap<String, Instant>>,
    debounce: Duration,
}

impl ModuleWatcher {
    /// Watch every module source listed in `config`. A disabled config
    /// yields [`disabled`](Self::disabled) without touching the filesystem.
    pub fn new(config: &HotReloadConfig) -> Result<Self> {
        if !config.enabled {
            log::debug!("Hot reload disabled, not watching {} modules", config.modules.len());
            return Ok(Self::disabled());
        }

        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;

        let mut sources = Vec::with_capacity(config.modules.len());
        for (module, path) in &config.modules {
            let canonical = path.canonicalize().map_err(|e| {
                BridgeError::Config(format!("source of module '{}' ({}): {}", module, path.display(), e))
            })?;
            watcher.watch(&canonical, RecursiveMode::Recursive)?;
            log::debug!("Watching '{}' at {}", module, canonical.display());
            sources.push((canonical, module.clone()));
        }

        Ok(Self {
            _watcher: Some(watcher),
            receiver: Some(rx),
            sources,
            pending: Mutex::new(HashMap::new()),
            debounce: config.debounce(),
        })
    }

    /// A watcher that never reports changes
    pub fn disabled() -> Self {
        Self {
            _watcher: None,
            receiver: None,
            sources: Vec::new(),
            pending: Mutex::new(HashMap::new()),
            debounce: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self._watcher.is_some()
    }

    /// Drain file events and return the modules whose changes have settled
    pub fn poll(&self) -> Vec<String> {
        if let Some(rx) = &self.receiver {
            while let Ok(result) = rx.try_recv() {
                match result {
                    Ok(event) => self.handle_event(&event),
                    Err(e) => log::error!("Module watcher error: {}", e),
                }
            }
        }

        let now = Instant::now();
        let mut pending = self.pending.lock();
        let mut ready: Vec<String> = pending
            .iter()
            .filter(|(_, time)| now.duration_since(**time) >= self.debounce)
            .map(|(module, _)| module.clone())
            .collect();
        for module in &ready {
            pending.remove(module);
        }
        ready.sort();
        ready
    }

    fn handle_event(&self, event: &Event) {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) => {
                for path in &event.paths {
                    if let Some(module) = self.module_for(path) {
                        self.pending.lock().insert(module.to_string(), Instant::now());
                        log::debug!("Detected change in '{}': {}", module, path.display());
                    }
                }
            }
            _ => {}
        }
    }

    /// Module whose source contains `path`
    pub fn module_for(&self, path: &Path) -> Option<&str> {
        self.sources
            .iter()
            .find(|(source, _)| path.starts_with(source))
            .map(|(_, module)| module.as_str())
    }

    /// Modules with changes not yet past the debounce
    pub fn pending_modules(&self) -> Vec<String> {
        self.pending.lock().keys().cloned().collect()
    }

    pub fn watched_modules(&self) -> Vec<String> {
        self.sources.iter().map(|(_, module)| module.clone()).collect()
    }
}

impl fmt::Debug for ModuleWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleWatcher")
            .field("enabled", &self.is_enabled())
            .field("modules", &self.watched_modules())
            .field("debounce", &self.debounce)
            .finish()
    }
}
