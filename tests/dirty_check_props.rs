//! Property tests for the dirty check.
//!
//! Whatever sequence of writes is applied, each render pass commits exactly
//! the Parts whose value differs from the previous pass, and the document
//! ends up showing the current data.
//!
//! Run with: cargo test --test dirty_check_props

use mosaic::{el, Mosaic, MosaicOptions, Runtime};
use proptest::prelude::*;
use serde_json::{json, Value};

const FIELDS: [&str; 3] = ["a", "b", "c"];

fn grid() -> MosaicOptions {
    MosaicOptions::new(|data, _| {
        el("div")
            .children(FIELDS.iter().map(|field| el("span").bind(data.field(field))))
            .bind_attr("data-sum", data.field("a"))
            .build()
    })
    .with_data(json!({ "a": 0, "b": 0, "c": 0 }))
}

fn snapshot(mosaic: &Mosaic) -> [i64; 3] {
    FIELDS.map(|field| {
        mosaic
            .data()
            .field(field)
            .and_then(|value| value.as_i64())
            .unwrap_or_default()
    })
}

proptest! {
    #[test]
    fn commits_match_changed_fields(
        writes in proptest::collection::vec((0usize..3, 0i64..3), 1..40)
    ) {
        let runtime = Runtime::new();
        let mosaic = runtime.mount(grid()).unwrap();

        for (field, value) in writes {
            let before = snapshot(&mosaic);
            let commits = mosaic.stats().commits;

            mosaic.data().set_field(FIELDS[field], value).unwrap();

            let changed = before[field] != value;
            // Field `a` is bound twice: as text and as an attribute.
            let expected = match (changed, field) {
                (false, _) => 0,
                (true, 0) => 2,
                (true, _) => 1,
            };
            prop_assert_eq!(mosaic.stats().commits - commits, expected);
        }

        let doc = runtime.document();
        let text: String = snapshot(&mosaic).iter().map(i64::to_string).collect();
        prop_assert_eq!(doc.text_content(mosaic.element()), text);
    }

    #[test]
    fn whole_value_writes_commit_the_difference(
        states in proptest::collection::vec(proptest::array::uniform3(0i64..2), 1..20)
    ) {
        let runtime = Runtime::new();
        let mosaic = runtime.mount(grid()).unwrap();
        let doc = runtime.document();

        for state in states {
            let before = snapshot(&mosaic);
            let commits = mosaic.stats().commits;
            let next: Value = json!({ "a": state[0], "b": state[1], "c": state[2] });

            mosaic.data().set(next).unwrap();

            let mut expected = before.iter().zip(&state).filter(|(old, new)| old != new).count() as u64;
            if before[0] != state[0] {
                expected += 1;
            }
            prop_assert_eq!(mosaic.stats().commits - commits, expected);
            prop_assert_eq!(
                doc.attribute(mosaic.element(), "data-sum"),
                Some(state[0].to_string())
            );
        }
    }
}
