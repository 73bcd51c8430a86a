//! Integration tests for the managed list engine against the in-memory
//! control.

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use horizon_listsync::model::{
    ID_PROPERTY, INDEX_PROPERTY, ItemId, ManagedItem, ManagedList, MemoryListControl,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn list_of(labels: &[&str]) -> (Arc<MemoryListControl>, ManagedList, Vec<ManagedItem>) {
    init_tracing();
    let control = Arc::new(MemoryListControl::new(101));
    let list = ManagedList::new(control.clone(), 9);
    let items: Vec<ManagedItem> = labels.iter().map(|l| ManagedItem::new(*l)).collect();
    assert!(list.add_items(items.clone()));
    (control, list, items)
}

fn assert_mirrored(control: &MemoryListControl, list: &ManagedList) {
    let labels = control.labels();
    assert_eq!(labels.len(), list.len());
    for (pos, item) in list.items().iter().enumerate() {
        assert_eq!(labels[pos], item.label());
        let id = item.identity().expect("attached item has an identity");
        assert_eq!(control.row_property(pos, ID_PROPERTY), id.to_string());
    }
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn scenario_a_add_items_to_empty_list() {
    let (control, list, _) = list_of(&["A", "B", "C"]);
    assert_eq!(list.len(), 3);
    assert_eq!(control.labels(), ["A", "B", "C"]);
    assert_eq!(list.selected_position(), Some(0));
}

#[test]
fn scenario_b_insert_before_selection_advances_it() {
    let (control, list, items) = list_of(&["A", "B", "C"]);
    list.set_selected_position(2);

    assert!(list.insert_item(0, ManagedItem::new("D")));
    assert_eq!(control.labels(), ["D", "A", "B", "C"]);
    assert_eq!(list.selected_position(), Some(3));
    assert!(list.selected_item().unwrap().ptr_eq(&items[2]));
    assert_mirrored(&control, &list);
}

#[test]
fn scenario_c_remove_after_selection_keeps_it() {
    let (control, list, _) = list_of(&["A", "B", "C"]);
    list.set_selected_position(1);

    assert!(list.remove_item(2));
    assert_eq!(control.labels(), ["A", "B"]);
    assert_eq!(list.selected_position(), Some(1));
    assert_eq!(list.selected_item().unwrap().label(), "B");
}

#[test]
fn scenario_d_remove_selected_last_clamps() {
    let (control, list, _) = list_of(&["A", "B", "C"]);
    list.set_selected_position(2);

    assert!(list.remove_item(2));
    assert_eq!(control.labels(), ["A", "B"]);
    assert_eq!(list.selected_position(), Some(1));
    assert_eq!(list.selected_item().unwrap().label(), "B");
}

#[test]
fn scenario_e_swap_exchanges_handles_only() {
    let (control, list, _) = list_of(&["A", "B", "C"]);
    list.set_selected_position(1);
    control.clear_logs();
    let untouched_before = control.row_writes(1);

    assert!(list.swap_items(0, 2));
    assert_eq!(control.labels(), ["C", "B", "A"]);
    assert_eq!(list.selected_position(), Some(1));
    assert_eq!(control.row_writes(1), untouched_before);
    assert!(control.fetched_rows().iter().all(|i| *i == 0 || *i == 2));
    assert!(control.select_calls().is_empty());
}

// =========================================================================
// Properties
// =========================================================================

#[test]
fn p3_insert_after_selection_leaves_it() {
    let (_, list, items) = list_of(&["A", "B", "C"]);
    list.set_selected_position(1);

    list.insert_item(2, ManagedItem::new("X"));
    assert_eq!(list.selected_position(), Some(1));
    assert!(list.selected_item().unwrap().ptr_eq(&items[1]));

    list.insert_item(1, ManagedItem::new("Y"));
    assert_eq!(list.selected_position(), Some(2));
    assert!(list.selected_item().unwrap().ptr_eq(&items[1]));
}

#[test]
fn p4_remove_selection_policy() {
    let (_, list, _) = list_of(&["A", "B", "C", "D"]);
    list.set_selected_position(3);
    list.remove_item(3);
    assert_eq!(list.selected_position(), Some(2));

    list.set_selected_position(1);
    list.remove_item(1);
    assert_eq!(list.selected_position(), Some(1));
    assert_eq!(list.selected_item().unwrap().label(), "C");

    list.remove_item(0);
    list.remove_item(0);
    assert_eq!(list.selected_position(), None);
    assert!(list.is_empty());
}

#[test]
fn p6_removed_item_is_frozen() {
    let (_, list, items) = list_of(&["A", "B", "C"]);
    let removed = items[1].clone();
    removed.set_property("watched", "1").unwrap();

    list.remove_item(1);
    assert!(!removed.is_valid());
    assert_eq!(removed.label(), "");
    assert_eq!(removed.property("watched"), "");
    assert_eq!(removed.identity(), None);
    assert_eq!(removed.pos(), None);
    assert!(removed.set_label("again").is_err());
    assert!(!list.add_item(removed));
}

#[test]
fn p7_insert_refreshes_only_the_tail() {
    for (n, k) in [(6, 0), (6, 3), (6, 5), (1, 0)] {
        let labels: Vec<String> = (0..n).map(|i| format!("item{i}")).collect();
        let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let (control, list, _) = list_of(&refs);
        control.clear_logs();

        list.insert_item(k, ManagedItem::new("new"));
        let expected: Vec<usize> = (k..=n).collect();
        assert_eq!(control.fetched_rows(), expected, "n={n} k={k}");
        assert_eq!(control.row_property(n, INDEX_PROPERTY), n.to_string());
    }
}

// =========================================================================
// Rebinding and deferred results
// =========================================================================

#[test]
fn rebuilt_window_keeps_list_state() {
    let (first, list, items) = list_of(&["A", "B", "C"]);
    let old_ids: Vec<ItemId> = items.iter().map(|i| i.identity().unwrap()).collect();
    first.destroy();

    assert!(!list.insert_item(0, ManagedItem::new("lost")));

    let second = Arc::new(MemoryListControl::new(101));
    assert!(list.re_init(second.clone()));
    assert_eq!(second.labels(), list.items().iter().map(|i| i.label()).collect::<Vec<_>>());
    assert_mirrored(&second, &list);
    for (item, old) in items.iter().zip(&old_ids) {
        assert!(item.identity().unwrap() > *old);
    }
}

#[test]
fn stale_result_is_dropped_by_identity_check() {
    use horizon_listsync::UiTaskQueue;

    let (control, list, items) = list_of(&["A", "B"]);
    let queue = UiTaskQueue::<ManagedList>::new();
    let sender = queue.sender();
    let token = items[1].identity().unwrap();

    // The item is replaced while its art is "loading" off-thread.
    list.replace_item(1, ManagedItem::new("B2"));

    std::thread::spawn(move || {
        sender
            .post(move |list: &ManagedList| {
                if let Some(item) = list.item_by_identity(token) {
                    item.set_thumbnail("late.jpg").unwrap();
                }
            })
            .unwrap();
    })
    .join()
    .unwrap();

    assert_eq!(queue.process_all(&list), 1);
    assert_eq!(control.row_snapshot(1).unwrap().thumbnail, "");
    assert_eq!(control.labels(), ["A", "B2"]);
}

#[test]
fn signals_report_structural_changes() {
    let (_, list, _) = list_of(&["A", "B", "C"]);
    let log = Arc::new(Mutex::new(Vec::new()));

    let l = log.clone();
    list.signals().rows_inserted.connect(move |(a, b)| l.lock().push(format!("ins {a}..{b}")));
    let l = log.clone();
    list.signals().rows_removed.connect(move |(a, b)| l.lock().push(format!("rem {a}..{b}")));
    let l = log.clone();
    list.signals().rows_swapped.connect(move |(a, b)| l.lock().push(format!("swap {a},{b}")));

    list.insert_item(1, ManagedItem::new("X"));
    list.remove_item(0);
    list.swap_items(0, 1);

    assert_eq!(*log.lock(), ["ins 1..1", "rem 0..0", "swap 0,1"]);
}

// =========================================================================
// Random operation sequences
// =========================================================================

#[derive(Debug, Clone)]
enum Op {
    Add,
    Insert(usize),
    Remove(usize),
    Swap(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Add),
        (0usize..12).prop_map(Op::Insert),
        (0usize..12).prop_map(Op::Remove),
        (0usize..12, 0usize..12).prop_map(|(a, b)| Op::Swap(a, b)),
    ]
}

proptest! {
    #[test]
    fn random_ops_keep_list_and_control_in_step(ops in prop::collection::vec(op(), 1..40)) {
        let control = Arc::new(MemoryListControl::new(7));
        let list = ManagedList::new(control.clone(), 4);
        let mut next_label = 0;
        let mut last_id: Option<ItemId> = None;

        for op in ops {
            let mut new_item = || {
                next_label += 1;
                ManagedItem::new(format!("n{next_label}"))
            };
            match op {
                Op::Add => {
                    let item = new_item();
                    list.add_item(item.clone());
                    let id = item.identity().unwrap();
                    prop_assert!(last_id.is_none_or(|last| id > last));
                    last_id = Some(id);
                }
                Op::Insert(index) => {
                    let item = new_item();
                    list.insert_item(index, item.clone());
                    let id = item.identity().unwrap();
                    prop_assert!(last_id.is_none_or(|last| id > last));
                    last_id = Some(id);
                }
                Op::Remove(index) => {
                    let before = list.len();
                    prop_assert_eq!(list.remove_item(index), index < before);
                }
                Op::Swap(a, b) => {
                    list.swap_items(a, b);
                }
            }

            let labels = control.labels();
            prop_assert_eq!(labels.len(), list.len());
            for (pos, item) in list.items().iter().enumerate() {
                prop_assert_eq!(&labels[pos], &item.label());
                prop_assert_eq!(item.pos(), Some(pos));
            }
            if !list.is_empty() {
                prop_assert!(list.selected_position().unwrap() < list.len());
            }
        }
    }
}
