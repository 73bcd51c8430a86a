//! Integration tests for the window layer driving a managed list.

use std::sync::Arc;
use std::time::Duration;

use horizon_listsync::config::{ListConfig, WindowSettings};
use horizon_listsync::model::{ManagedItem, ManagedList, MemoryListControl};
use horizon_listsync::window::{
    GlobalPropertyScope, HeadlessWindow, HostWindow, InitOutcome, MultiWindow, NextWindow,
    PropertyTarget, PropertyTimerBuilder, TimerInit, WindowContext, WindowKind, WindowLifecycle,
};
use horizon_listsync::{ControlError, PropertyStore, UiTaskQueue};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn settings() -> WindowSettings {
    init_tracing();
    WindowSettings::from_toml_str(
        r#"
        crossfade = true
        fallback_background = "fallback.png"
        property_namespace = "app"
        "#,
    )
    .unwrap()
}

#[test]
fn list_built_from_window_config() {
    let host = HeadlessWindow::new(13001).with_list_control(Arc::new(MemoryListControl::new(101)));
    let config = ListConfig::from_toml_str("control_id = 101\nmax_view_index = 4\nproperty_keys = [\"watched\"]").unwrap();

    let list = ManagedList::from_window(&host, &config).unwrap();
    assert_eq!(list.control_id(), 101);
    assert_eq!(list.max_view_index(), 4);
    assert_eq!(list.property_keys(), ["watched"]);

    let missing = ManagedList::from_window(&host, &ListConfig::new(999)).unwrap_err();
    assert_eq!(missing, ControlError::MissingControl { control_id: 999 });
}

#[test]
fn selection_drives_crossfaded_background() {
    let control = Arc::new(MemoryListControl::new(101));
    let host = Arc::new(HeadlessWindow::new(13001).with_list_control(control.clone()));
    let context = WindowContext::new(settings());
    let window = WindowLifecycle::new(WindowKind::Window, host.clone(), context.clone());

    assert!(window.show());
    assert_eq!(window.on_init(), InitOutcome::FirstInit);

    let list = ManagedList::from_window(host.as_ref(), &ListConfig::new(101).with_max_view_index(4)).unwrap();
    list.add_items([
        ManagedItem::new("A").with_thumbnail("a.jpg"),
        ManagedItem::new("B").with_thumbnail("b.jpg"),
        ManagedItem::new("C"),
    ]);

    let show_selected = || {
        let art = list.selected_item().map(|item| item.thumbnail());
        window.update_background_from(art.as_deref())
    };

    assert_eq!(show_selected().as_deref(), Some("a.jpg"));
    list.set_selected_position(1);
    assert_eq!(show_selected().as_deref(), Some("b.jpg"));
    assert_eq!(host.property("background_static"), "a.jpg");
    assert_eq!(host.property("background"), "b.jpg");

    list.set_selected_position(2);
    assert_eq!(show_selected().as_deref(), Some("fallback.png"));
    assert_eq!(host.property("background"), "fallback.png");
    assert_eq!(context.last_background_url().as_deref(), Some("fallback.png"));

    // A second window picks the shared background up on its first init.
    let other_host = Arc::new(HeadlessWindow::new(13002));
    let other = WindowLifecycle::new(WindowKind::Window, other_host.clone(), context.clone());
    other.show();
    other.on_init();
    assert_eq!(other_host.property("background"), "fallback.png");
    assert!(other.is_active());
    assert!(!window.is_active());
}

#[test]
fn closing_window_suspends_rows_and_rebinds() {
    init_tracing();
    let control = Arc::new(MemoryListControl::new(101));
    let host = Arc::new(HeadlessWindow::new(13001).with_list_control(control.clone()));
    let context = WindowContext::default();
    let window = WindowLifecycle::new(WindowKind::Window, host.clone(), context.clone());
    window.show();
    window.on_init();

    let list = ManagedList::from_window(host.as_ref(), &ListConfig::new(101)).unwrap();
    let items = [ManagedItem::new("A"), ManagedItem::new("B")];
    list.add_items(items.clone());

    context.request_close_windows();
    assert!(window.close_signalled());
    list.invalidate_views();
    control.destroy();
    items[0].set_label("A2").unwrap();

    let rebuilt = Arc::new(MemoryListControl::new(101));
    assert!(list.new_control(rebuilt.clone()));
    assert_eq!(rebuilt.labels(), ["A2", "B"]);
}

#[test]
fn timer_results_reach_the_ui_thread_through_the_queue() {
    let props = PropertyStore::new();
    let context = WindowContext::new(settings());
    let queue = UiTaskQueue::<PropertyStore>::new();
    let sender = queue.sender();
    let (done_tx, done_rx) = crossbeam_channel::bounded(1);

    let timer = PropertyTimerBuilder::new("osd", Duration::from_millis(20))
        .value("hidden")
        .global(&context)
        .callback(move || {
            let _ = sender.post(|props: &PropertyStore| {
                props.set("osd_closed", "1");
            });
            let _ = done_tx.try_send(());
        })
        .build(Arc::new(props.clone()));

    assert!(timer.reset(TimerInit::Default, None));
    assert_eq!(props.get("osd"), "1");

    done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(props.get("osd"), "hidden");
    assert_eq!(context.global_property("osd"), "hidden");
    assert_eq!(props.get("osd_closed"), "");

    assert_eq!(queue.process_all(&props), 1);
    assert_eq!(props.get("osd_closed"), "1");
}

#[test]
fn global_scope_wraps_busy_work() {
    let context = WindowContext::new(settings());
    context.set_global_property("busy", "");
    {
        let _busy = GlobalPropertyScope::new(&context, "busy", "1");
        assert_eq!(context.global_property("busy"), "1");
    }
    assert_eq!(context.global_property("busy"), "");
}

#[test]
fn multi_window_cycles_real_windows() {
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Tab {
        Movies,
        Shows,
    }

    let context = WindowContext::default();
    let multi = Arc::new(MultiWindow::new(vec![Tab::Movies, Tab::Shows], None).unwrap());
    multi.listen_for_close(&context);
    multi.set_property("hub", "recent");

    let hosts = [Arc::new(HeadlessWindow::new(13001)), Arc::new(HeadlessWindow::new(13002))];
    let mut seen = Vec::new();
    let opened = multi.run(
        || false,
        |tab, multi| {
            let host: Arc<dyn HostWindow> = hosts[multi.window_index(tab)].clone();
            let window = WindowLifecycle::new(WindowKind::Window, host, context.clone());
            window.show();
            window.on_init();
            multi.attach_current(window.clone());
            seen.push((*tab, window.property("hub")));

            if seen.len() < 3 {
                multi.next_window(NextWindow::Cycle);
            } else {
                context.request_close_windows();
            }
        },
    );

    assert_eq!(opened, 3);
    assert_eq!(
        seen,
        [
            (Tab::Movies, "recent".to_string()),
            (Tab::Shows, "recent".to_string()),
            (Tab::Movies, "recent".to_string()),
        ]
    );
    assert!(multi.all_closed());
    assert_eq!(hosts[0].close_count(), 2);
    assert_eq!(hosts[1].close_count(), 1);
}
