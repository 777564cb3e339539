//! Filter a list of people by age, then report names and an average.
//!
//! Run with `RUST_LOG=during=debug cargo run --example people` to see the
//! pipeline and step spans.

use std::time::Duration;

use during::prelude::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    during::observability::init_metrics();

    let people = json!([
        {"name": "scott", "age": 29},
        {"name": "lindsay", "age": 25},
        {"name": "sam", "age": 31},
    ]);

    // Keep everyone aged 29.
    let mut adults = during(people.clone())
        .with_name("age-filter")
        .filter(|person| async move {
            // Pretend each lookup is a remote call.
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(person["age"] == 29)
        })
        .then(
            |items| println!("aged 29: {items}"),
            |err| eprintln!("filter failed: {err}"),
        )
        .build();
    adults.run().await?;

    // A longer chain, declared by name.
    let mut names = during(people)
        .with_name("names")
        .with_concurrency(2)
        .chain(
            "sortBy",
            vec![],
            Predicate::transform(|person| async move { Ok(person["age"].clone()) }),
        )?
        .pluck("name")
        .reduce("", |name, acc| async move {
            let acc = acc.as_str().unwrap_or_default();
            let name = name.as_str().unwrap_or_default();
            let joined = if acc.is_empty() {
                name.to_string()
            } else {
                format!("{acc}, {name}")
            };
            Ok(json!(joined))
        })
        .build();

    let joined = names.run().await?;
    println!("youngest first: {joined}");

    Ok(())
}
