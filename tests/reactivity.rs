//! Data writes driving render passes: hook order, arrays, events, nesting.
//!
//! Run with: cargo test --test reactivity

use std::cell::RefCell;
use std::rc::Rc;

use mosaic::{el, DynamicValue, Mosaic, MosaicError, MosaicOptions, Runtime};
use serde_json::{json, Value};

// =============================================================================
// HELPERS
// =============================================================================

type Log = Rc<RefCell<Vec<String>>>;

fn logged(log: &Log) -> MosaicOptions {
    let view_log = log.clone();
    let before_log = log.clone();
    let after_log = log.clone();
    MosaicOptions::new(move |data, _| {
        let count = data.field("count").unwrap_or(Value::Null);
        view_log.borrow_mut().push(format!("view:{count}"));
        el("div")
            .child(el("span").bind(data.field("count")))
            .child(el("ul").bind(data.shared("todos")))
            .build()
    })
    .with_data(json!({ "count": 1, "todos": ["a"] }))
    .on_will_update(move |old| {
        before_log
            .borrow_mut()
            .push(format!("will_update:{}", old["count"]));
    })
    .on_updated(move |data, _| {
        let count = data.field("count").unwrap_or(Value::Null);
        after_log.borrow_mut().push(format!("updated:{count}"));
    })
}

fn drain(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

// =============================================================================
// CHANGE PROPAGATION
// =============================================================================

#[test]
fn scalar_write_runs_one_ordered_cycle() {
    let log: Log = Rc::default();
    let runtime = Runtime::new();
    let mosaic = runtime.mount(logged(&log)).unwrap();
    drain(&log);

    mosaic.data().set_field("count", 2).unwrap();

    assert_eq!(drain(&log), vec!["will_update:1", "view:2", "updated:2"]);
    assert_eq!(runtime.document().text_content(mosaic.element()), "2a");
}

#[test]
fn nested_array_push_runs_the_same_cycle() {
    let log: Log = Rc::default();
    let runtime = Runtime::new();
    let mosaic = runtime.mount(logged(&log)).unwrap();
    drain(&log);

    let todos = mosaic.data().array("todos").unwrap();
    assert!(todos.push("b").unwrap());

    assert_eq!(drain(&log), vec!["will_update:1", "view:1", "updated:1"]);
    assert_eq!(runtime.document().text_content(mosaic.element()), "1ab");
    assert_eq!(mosaic.data().field("todos"), Some(json!(["a", "b"])));
}

#[test]
fn every_array_mutation_is_its_own_cycle() {
    let log: Log = Rc::default();
    let runtime = Runtime::new();
    let mosaic = runtime.mount(logged(&log)).unwrap();
    drain(&log);

    let todos = mosaic.data().array("todos").unwrap();
    todos.push("b").unwrap();
    todos.push("c").unwrap();
    todos.remove(0).unwrap();

    let log = drain(&log);
    assert_eq!(log.iter().filter(|line| line.starts_with("updated")).count(), 3);
    assert_eq!(mosaic.stats().repaints, 4);
    assert_eq!(runtime.document().text_content(mosaic.element()), "1bc");
}

#[test]
fn writes_that_cannot_apply_do_not_render() {
    let log: Log = Rc::default();
    let runtime = Runtime::new();
    let mosaic = runtime.mount(logged(&log)).unwrap();
    drain(&log);

    assert!(!mosaic.data().set_pointer("/missing/deep", 3).unwrap());
    assert!(mosaic.data().array("count").is_none());
    let todos = mosaic.data().array("todos").unwrap();
    assert_eq!(todos.remove(5).unwrap(), None);
    assert!(drain(&log).is_empty());
}

#[test]
fn same_value_write_renders_but_commits_nothing() {
    let log: Log = Rc::default();
    let runtime = Runtime::new();
    let mosaic = runtime.mount(logged(&log)).unwrap();
    drain(&log);
    let commits = mosaic.stats().commits;

    assert!(mosaic.data().set_field("count", 1).unwrap());

    assert_eq!(drain(&log), vec!["will_update:1", "view:1", "updated:1"]);
    assert_eq!(mosaic.stats().commits, commits);
}

#[test]
fn shared_array_binding_commits_only_when_written() {
    let log: Log = Rc::default();
    let runtime = Runtime::new();
    let mosaic = runtime.mount(logged(&log)).unwrap();
    let commits = mosaic.stats().commits;

    mosaic.repaint().unwrap();
    mosaic.repaint().unwrap();
    assert_eq!(mosaic.stats().commits, commits);

    mosaic.data().set_field("count", 2).unwrap();
    assert_eq!(mosaic.stats().commits, commits + 1);

    mosaic.data().array("todos").unwrap().push("b").unwrap();
    assert_eq!(mosaic.stats().commits, commits + 2);
    assert_eq!(runtime.document().text_content(mosaic.element()), "2ab");
}

#[test]
fn render_errors_reach_the_writer() {
    let runtime = Runtime::new();
    let mosaic = runtime
        .mount(MosaicOptions::new(|data, _| {
            let mut root = el("div").bind_attr("a", 1);
            if data.field("extra").is_some() {
                root = root.bind_attr("b", 2);
            }
            root.build()
        }))
        .unwrap();

    let err = mosaic.data().set_field("extra", true).unwrap_err();
    assert!(matches!(err, MosaicError::ValueCountMismatch { expected: 1, actual: 2, .. }));
    // The write itself went through.
    assert_eq!(mosaic.data().field("extra"), Some(json!(true)));
}

// =============================================================================
// EVENTS
// =============================================================================

#[test]
fn dispatched_event_runs_action_with_detail() {
    let runtime = Runtime::new();
    let doc = runtime.document();
    let mosaic = runtime
        .mount(
            MosaicOptions::new(|data, actions| {
                el("form")
                    .child(el("input").on("input", actions.handler("edit")))
                    .child(el("output").bind(data.field("text")))
                    .build()
            })
            .with_data(json!({ "text": "" }))
            .with_action("edit", |data, event| {
                data.set_field("text", event.detail.clone())?;
                Ok(())
            }),
        )
        .unwrap();

    let input = doc.resolve_path(mosaic.element(), &[0]).unwrap();
    let handled = doc.dispatch(input, "input", json!("hello")).unwrap();

    assert_eq!(handled, 1);
    assert_eq!(doc.text_content(mosaic.element()), "hello");
    assert_eq!(mosaic.actions().names().collect::<Vec<_>>(), vec!["edit"]);
}

#[test]
fn swapping_handlers_keeps_one_listener() {
    let runtime = Runtime::new();
    let doc = runtime.document();
    let mosaic = runtime
        .mount(
            MosaicOptions::new(|data, actions| {
                let name = if data.field("armed") == Some(json!(true)) { "fire" } else { "arm" };
                el("button").on("click", actions.handler(name)).build()
            })
            .with_data(json!({ "armed": false, "fired": 0 }))
            .with_action("arm", |data, _| {
                data.set_field("armed", true)?;
                Ok(())
            })
            .with_action("fire", |data, _| {
                let fired = data.field("fired").and_then(|f| f.as_i64()).unwrap_or(0);
                data.set_field("fired", fired + 1)?;
                Ok(())
            }),
        )
        .unwrap();
    let button = mosaic.element();

    doc.dispatch(button, "click", Value::Null).unwrap();
    assert_eq!(doc.listener_count(button, "click"), 1);
    doc.dispatch(button, "click", Value::Null).unwrap();
    doc.dispatch(button, "click", Value::Null).unwrap();

    assert_eq!(mosaic.data().field("fired"), Some(json!(2)));
    assert_eq!(doc.listener_count(button, "click"), 1);
}

// =============================================================================
// NESTED COMPONENTS
// =============================================================================

fn badge(runtime: &Runtime, label: &str) -> Mosaic {
    Mosaic::new(
        runtime,
        MosaicOptions::new(|data, _| el("em").bind(data.field("label")).build())
            .with_tid("badge")
            .with_data(json!({ "label": label })),
    )
    .unwrap()
}

#[test]
fn child_component_renders_and_updates_in_place() {
    let runtime = Runtime::new();
    let doc = runtime.document();
    let child = badge(&runtime, "new");
    let slot = DynamicValue::from(&child);
    let parent = runtime
        .mount(
            MosaicOptions::new(move |data, _| {
                el("section")
                    .child(el("h1").bind(data.field("title")))
                    .child(el("div").bind(slot.clone()))
                    .build()
            })
            .with_data(json!({ "title": "Inbox" })),
        )
        .unwrap();

    assert!(child.state().is_painted());
    assert_eq!(
        doc.to_html(parent.element()),
        "<section><h1>Inbox</h1><div><em>new</em></div></section>"
    );

    // The child re-renders itself; the parent does not repaint.
    let parent_repaints = parent.stats().repaints;
    child.data().set_field("label", "read").unwrap();
    assert_eq!(parent.stats().repaints, parent_repaints);
    assert_eq!(doc.text_content(parent.element()), "Inboxread");

    // Parent repaints leave the clean child slot alone.
    parent.data().set_field("title", "Archive").unwrap();
    assert_eq!(
        doc.to_html(parent.element()),
        "<section><h1>Archive</h1><div><em>read</em></div></section>"
    );
}

#[test]
fn component_lists_paint_each_item_once() {
    let runtime = Runtime::new();
    let doc = runtime.document();
    let created: Log = Rc::default();
    let items: Vec<Mosaic> = ["a", "b", "c"]
        .iter()
        .map(|label| {
            let created = created.clone();
            Mosaic::new(
                &runtime,
                MosaicOptions::new(|data, _| el("li").bind(data.field("label")).build())
                    .with_tid("item")
                    .with_data(json!({ "label": label }))
                    .on_created(move |item| {
                        created.borrow_mut().push(item.iid().to_string());
                    }),
            )
            .unwrap()
        })
        .collect();
    let list = DynamicValue::list(items.iter().map(DynamicValue::from));
    let parent = runtime
        .mount(MosaicOptions::new(move |_, _| el("ul").bind(list.clone()).build()))
        .unwrap();

    assert_eq!(
        doc.to_html(parent.element()),
        "<ul><li>a</li><li>b</li><li>c</li></ul>"
    );
    assert_eq!(created.borrow().len(), 3);
    assert_eq!(runtime.templates().parse_count(), 2);

    parent.repaint().unwrap();
    assert_eq!(created.borrow().len(), 3);

    items[1].data().set_field("label", "B").unwrap();
    assert_eq!(doc.text_content(parent.element()), "aBc");
}
