//! Function component integration tests
//!
//! Props-only components rendered through the headless host: no class is
//! built, hook state survives parent re-renders, and effects follow their
//! dependencies.

mod common;

use common::*;
use reactbind::*;
use std::rc::Rc;

#[test]
fn test_function_renders_without_class() {
    let host = HeadlessHost::new();
    let bridge = Bridge::new(host.clone());

    let container = mount_function::<Clicker>(&bridge, clicker("press"));
    assert_eq!(rendered_text(&host, &container).as_deref(), Some("press 0"));
    assert_eq!(host.classes_created(), 0);
    assert_eq!(bridge.descriptor_builds(), 0);

    let function = host.root_function(&container).unwrap();
    assert_eq!(function.display_name(), "Clicker(function_tests::common)");
    assert_eq!(function.hook_count(), 2);
    assert_eq!(take_events(), vec!["Clicker effect 0"]);
}

#[test]
fn test_state_hook_survives_parent_render() {
    let host = HeadlessHost::new();
    let bridge = Bridge::new(host.clone());

    let container = mount_function::<Clicker>(&bridge, clicker("press"));
    let before = host.root_function(&container).unwrap();

    click();
    assert_eq!(host.pending_updates(), 1);
    assert_eq!(host.flush(), 1);
    assert_eq!(rendered_text(&host, &container).as_deref(), Some("press 1"));

    bridge.render(bridge.create_function_element::<Clicker>(clicker("push"), Vec::new()), &container);
    let after = host.root_function(&container).unwrap();
    assert!(Rc::ptr_eq(&before, &after));
    assert_eq!(rendered_text(&host, &container).as_deref(), Some("push 1"));

    // The parent render left the click count alone, so the effect did not rerun
    assert_eq!(
        take_events(),
        vec!["Clicker effect 0", "Clicker cleanup 0", "Clicker effect 1"]
    );
}

#[test]
fn test_unchanged_state_skips_update() {
    let host = HeadlessHost::new();
    let bridge = Bridge::new(host.clone());

    let container = mount_function::<Clicker>(&bridge, None);
    let set_clicks = clicker_setter().unwrap();

    set_clicks.set(0);
    assert_eq!(host.force_update_count(), 0);
    assert_eq!(host.pending_updates(), 0);

    set_clicks.set(2);
    assert_eq!(host.force_update_count(), 1);
    assert_eq!(host.flush(), 1);
    assert_eq!(rendered_text(&host, &container).as_deref(), Some("clicks 2"));
    assert_eq!(host.root_function(&container).unwrap().render_count(), 2);
}

#[test]
fn test_unmount_runs_effect_cleanup() {
    let host = HeadlessHost::new();
    let bridge = Bridge::new(host.clone());

    let container = mount_function::<Clicker>(&bridge, None);
    let function = host.root_function(&container).unwrap();
    assert!(host.unmount(&container));

    assert!(!function.is_mounted());
    assert_eq!(take_events(), vec!["Clicker effect 0", "Clicker cleanup 0"]);

    // Clicking an unmounted component queues nothing that renders
    click();
    assert_eq!(host.flush(), 0);
}

#[test]
fn test_function_inside_intrinsic_keeps_position() {
    let host = HeadlessHost::new();
    let bridge = Bridge::new(host.clone());
    let container = Container::new("root");

    let list = |label: &str| {
        bridge.create_intrinsic(
            "ul",
            None,
            vec![
                bridge.create_function_element::<Clicker>(clicker(label), Vec::new()),
                text(&bridge, "tail"),
            ],
        )
    };

    bridge.render(list("first"), &container);
    let first = host.root(&container).unwrap().children()[0].function().cloned().unwrap();

    bridge.render(list("second"), &container);
    let root = host.root(&container).unwrap();
    let second = root.children()[0].function().cloned().unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(root.children()[0].first_text().as_deref(), Some("second 0"));
    assert_eq!(root.children()[1].text().as_deref(), Some("tail"));
}
