//! Counter Example - one component, one action, one changing binding
//!
//! Demonstrates:
//! - Mounting a component onto an anchor found by id
//! - Dispatching clicks into a bound action
//! - Only the changed Part touching the document
//!
//! Run with: RUST_LOG=mosaic=trace cargo run --example counter

use mosaic::{el, MosaicOptions, Result, Runtime};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();

    println!("=== mosaic Counter Example ===\n");

    let runtime = Runtime::new();
    let doc = runtime.document();
    let anchor = doc.create_element("main");
    doc.set_attribute(anchor, "id", "app")?;
    doc.append_child(doc.body(), anchor)?;

    let counter = runtime.mount(
        MosaicOptions::new(|data, actions| {
            el("div")
                .attr("class", "counter")
                .child(el("span").bind(data.field("count")))
                .child(el("button").on("click", actions.handler("increment")).text("+"))
                .child(el("button").on("click", actions.handler("reset")).text("reset"))
                .build()
        })
        .with_tid("counter")
        .with_element("app")
        .with_data(json!({ "count": 0 }))
        .with_action("increment", |data, _| {
            let count = data.field("count").and_then(|c| c.as_i64()).unwrap_or(0);
            data.set_field("count", count + 1)?;
            Ok(())
        })
        .with_action("reset", |data, _| {
            data.set_field("count", 0)?;
            Ok(())
        })
        .on_updated(|data, _| {
            println!("  updated: count = {}", data.field("count").unwrap_or(Value::Null));
        }),
    )?;

    println!("Painted:\n  {}\n", doc.to_html(doc.body()));

    let plus = doc.resolve_path(counter.element(), &[1])?;
    let reset = doc.resolve_path(counter.element(), &[2])?;

    println!("--- Clicking + three times ---");
    doc.reset_stats();
    for _ in 0..3 {
        doc.dispatch(plus, "click", Value::Null)?;
    }
    println!("  html: {}", doc.to_html(counter.element()));
    println!("  document writes: {}\n", doc.stats().writes());

    println!("--- Clicking reset ---");
    doc.dispatch(reset, "click", Value::Null)?;
    println!("  html: {}", doc.to_html(counter.element()));

    let stats = counter.stats();
    println!(
        "\nRender stats: {} repaints, {} commits, {} skipped",
        stats.repaints, stats.commits, stats.skipped
    );

    Ok(())
}
