//! Components shared by the integration tests

#![allow(dead_code)]

use reactbind::*;
use std::cell::RefCell;

thread_local! {
    static EVENTS: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

/// Record a lifecycle event for the current test thread
pub fn record(event: impl Into<String>) {
    EVENTS.with(|events| events.borrow_mut().push(event.into()));
}

/// Drain the recorded events
pub fn take_events() -> Vec<String> {
    EVENTS.with(|events| std::mem::take(&mut *events.borrow_mut()))
}

pub fn text(bridge: &Bridge, value: impl Into<String>) -> Element {
    bridge.create_intrinsic("span", Some(ValueBox::wrap(value.into())), Vec::new())
}

/// Render a fresh element of `C` into a new container
pub fn mount<C: Component>(bridge: &Bridge, props: Option<C::Props>) -> Container {
    let container = Container::new("root");
    bridge.render(bridge.create_element::<C>(props, Vec::new()), &container);
    container
}

/// Text rendered into `container`
pub fn rendered_text(host: &HeadlessHost, container: &Container) -> Option<String> {
    host.root(container)?.first_text()
}

#[derive(Debug, PartialEq)]
pub struct Count {
    pub count: i32,
}

impl State for Count {}

pub struct Counter {
    pub def: ComponentDef<NoProps, Count>,
}

impl Counter {
    pub fn increment(&self) {
        let next = self.def.state().map_or(0, |state| state.count) + 1;
        self.def.set_state(Count { count: next });
    }
}

impl Component for Counter {
    type Props = NoProps;
    type State = Count;

    const TAG: Option<&'static str> = Some("app::Counter");

    fn build(def: ComponentDef<NoProps, Count>) -> Self {
        Counter { def }
    }

    fn render(&self) -> Element {
        let count = self.def.state().map_or(0, |state| state.count);
        text(&self.def.bridge().unwrap(), format!("count {}", count))
    }

    fn shape() -> ComponentShape<Self> {
        ComponentShape::new().with_initial_state().with_will_unmount()
    }
}

impl InitialState for Counter {
    fn get_initial_state(&self) -> Count {
        record("Counter initial");
        Count { count: 0 }
    }
}

impl WillUnmount for Counter {
    fn component_will_unmount(&self) {
        record("Counter unmount");
    }
}

/// Replacement implementation swapped in for `Counter`
pub struct CounterV2 {
    pub def: ComponentDef<NoProps, Count>,
}

impl Component for CounterV2 {
    type Props = NoProps;
    type State = Count;

    const TAG: Option<&'static str> = Some("app::CounterV2");

    fn build(def: ComponentDef<NoProps, Count>) -> Self {
        CounterV2 { def }
    }

    fn render(&self) -> Element {
        let count = self.def.state().map_or(0, |state| state.count);
        text(&self.def.bridge().unwrap(), format!("v2 count {}", count))
    }

    fn shape() -> ComponentShape<Self> {
        ComponentShape::new().with_initial_state()
    }
}

impl InitialState for CounterV2 {
    fn get_initial_state(&self) -> Count {
        Count { count: 100 }
    }
}

#[derive(Debug, PartialEq)]
pub struct GreeterProps {
    pub name: String,
}

impl Props for GreeterProps {}

pub fn greeter(name: &str) -> Option<GreeterProps> {
    Some(GreeterProps { name: name.into() })
}

pub struct Greeter {
    pub def: ComponentDef<GreeterProps, NoState>,
}

impl Component for Greeter {
    type Props = GreeterProps;
    type State = NoState;

    const TAG: Option<&'static str> = Some("app::Greeter");

    fn build(def: ComponentDef<GreeterProps, NoState>) -> Self {
        Greeter { def }
    }

    fn render(&self) -> Element {
        let greeting = match self.def.props() {
            Some(props) => format!("hello {}", props.name),
            None => "hello nobody".to_string(),
        };
        text(&self.def.bridge().unwrap(), greeting)
    }
}

thread_local! {
    static CLICKS: RefCell<Option<StateSetter<u32>>> = RefCell::new(None);
}

/// State setter of the most recently rendered `Clicker`
pub fn clicker_setter() -> Option<StateSetter<u32>> {
    CLICKS.with(|clicks| clicks.borrow().clone())
}

/// Click the most recently rendered `Clicker`
pub fn click() {
    if let Some(setter) = clicker_setter() {
        setter.update(|clicks| clicks + 1);
    }
}

/// Render a fresh function element of `F` into a new container
pub fn mount_function<F: FunctionComponent>(bridge: &Bridge, props: Option<F::Props>) -> Container {
    let container = Container::new("root");
    bridge.render(bridge.create_function_element::<F>(props, Vec::new()), &container);
    container
}

#[derive(Debug, PartialEq)]
pub struct ClickerProps {
    pub label: String,
}

impl Props for ClickerProps {}

pub fn clicker(label: &str) -> Option<ClickerProps> {
    Some(ClickerProps { label: label.into() })
}

fn clicker_label(scope: &FunctionScope<'_, ClickerProps>) -> String {
    scope
        .props()
        .map_or_else(|| "clicks".to_string(), |props| props.label.clone())
}

/// Function component counting clicks in a state hook
pub struct Clicker;

impl FunctionComponent for Clicker {
    type Props = ClickerProps;

    const TAG: Option<&'static str> = Some("app::Clicker");

    fn render(scope: &FunctionScope<'_, ClickerProps>) -> Element {
        let (clicks, set_clicks) = scope.use_state(|| 0u32);
        CLICKS.with(|setter| *setter.borrow_mut() = Some(set_clicks));

        let seen = *clicks;
        scope.use_effect(seen, move || {
            record(format!("Clicker effect {}", seen));
            Some(Box::new(move || record(format!("Clicker cleanup {}", seen))) as EffectCallback)
        });

        text(&scope.bridge().unwrap(), format!("{} {}", clicker_label(scope), clicks))
    }
}

/// Replacement implementation swapped in for `Clicker`
pub struct ClickerV2;

impl FunctionComponent for ClickerV2 {
    type Props = ClickerProps;

    const TAG: Option<&'static str> = Some("app::ClickerV2");

    fn render(scope: &FunctionScope<'_, ClickerProps>) -> Element {
        let (clicks, set_clicks) = scope.use_state(|| 0u32);
        CLICKS.with(|setter| *setter.borrow_mut() = Some(set_clicks));
        text(&scope.bridge().unwrap(), format!("v2 {} {}", clicker_label(scope), clicks))
    }
}
