//! Todo List Example - nested arrays, lists of components, derived instances
//!
//! Demonstrates:
//! - Mutating a nested array through an `ObservableArray` handle
//! - Rendering a list of child components that share one template
//! - Deriving a sibling item with `new_instance`
//!
//! Run with: RUST_LOG=mosaic=debug cargo run --example todo_list

use mosaic::{el, DynamicValue, Mosaic, MosaicOptions, Result, Runtime};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

fn todo_item(runtime: &Runtime, label: &str) -> Result<Mosaic> {
    Mosaic::new(
        runtime,
        MosaicOptions::new(|data, actions| {
            let done = data.field("done") == Some(json!(true));
            el("li")
                .bind_attr("class", if done { "done" } else { "open" })
                .on("click", actions.handler("toggle"))
                .child(el("span").bind(data.field("label")))
                .build()
        })
        .with_tid("todo-item")
        .with_data(json!({ "label": label, "done": false }))
        .with_action("toggle", |data, _| {
            let done = data.field("done") == Some(json!(true));
            data.set_field("done", !done)?;
            Ok(())
        }),
    )
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();

    println!("=== mosaic Todo List Example ===\n");

    let runtime = Runtime::new();
    let doc = runtime.document();

    let items: Vec<Mosaic> = ["write docs", "ship it"]
        .iter()
        .map(|label| todo_item(&runtime, label))
        .collect::<Result<_>>()?;
    let rows = DynamicValue::list(items.iter().map(DynamicValue::from));

    let list = runtime.mount(
        MosaicOptions::new(move |data, _| {
            let tags = data
                .field("tags")
                .and_then(|tags| tags.as_array().cloned())
                .unwrap_or_default();
            el("section")
                .child(el("h1").bind(data.field("title")))
                .child(el("ul").bind(rows.clone()))
                .child(el("p").bind(DynamicValue::list(tags.iter().map(|tag| {
                    format!("#{} ", tag.as_str().unwrap_or_default())
                }))))
                .build()
        })
        .with_data(json!({ "title": "Today", "tags": ["home"] })),
    )?;
    println!("Painted:\n  {}\n", doc.to_html(list.element()));

    println!("--- Pushing a tag ---");
    if let Some(tags) = list.data().array("tags") {
        tags.push("urgent")?;
    }
    println!("  {}\n", doc.to_html(list.element()));

    println!("--- Toggling the first item ---");
    doc.dispatch(items[0].element(), "click", Value::Null)?;
    println!("  {}\n", doc.to_html(list.element()));

    println!("--- Deriving an item ---");
    let extra = items[1].new_instance(json!({ "label": "rest" }))?;
    println!("  detached: {}", doc.to_html(extra.element()));
    println!("  same type: {}", extra.tid() == items[1].tid());
    println!("  same instance: {}", extra.equals(&items[1]));
    println!("  template parses: {}", runtime.templates().parse_count());

    Ok(())
}
