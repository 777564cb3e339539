//! Dispatch from an [`Operation`] to its concurrent-iteration algorithm.
//!
//! Per-element predicates are funneled through `futures` buffered streams:
//! elements are dispatched in input order with at most `width` invocations in
//! flight, and outcomes are consumed in input order. Dispatch is lazy, so an
//! operation that stops consuming early stops dispatching too.

use std::future::Future;
use std::pin::pin;

use futures::future;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;

use super::predicate::{FoldFn, TestFn, TransformFn, test_fn, transform_fn};
use super::Operation;
use crate::error::BoxError;
use crate::value;

/// A predicate failure, tagged with the position of the element it failed on.
#[derive(Debug)]
pub struct ElementError {
    /// Position of the element in the step's input.
    pub index: usize,
    /// The predicate's error.
    pub source: BoxError,
}

/// Result of running one step: the next collection, or the first failure.
pub type StepOutcome = std::result::Result<Value, ElementError>;

/// Run `op` over `items` with at most `limit` predicates in flight.
///
/// `None` dispatches every element at once. The fold operations are always
/// serial, since each invocation needs the previous accumulator.
pub async fn run_operation(op: &Operation, items: Vec<Value>, limit: Option<usize>) -> StepOutcome {
    let width = limit.unwrap_or(items.len()).max(1);

    match op {
        Operation::Each(f) => {
            run_each(items.iter().cloned().enumerate(), f, width).await?;
            Ok(Value::Array(items))
        }
        Operation::EachRight(f) => {
            run_each(items.iter().cloned().enumerate().rev(), f, width).await?;
            Ok(Value::Array(items))
        }
        Operation::Map(f) => run_map(items, f, width).await.map(Value::Array),
        Operation::Reduce { seed, fold } => {
            run_fold(items.into_iter().enumerate(), seed.clone(), fold).await
        }
        Operation::ReduceRight { seed, fold } => {
            run_fold(items.into_iter().enumerate().rev(), seed.clone(), fold).await
        }
        Operation::Concat(f) => {
            let mapped = run_map(items, f, width).await?;
            let mut flat = Vec::with_capacity(mapped.len());
            for result in mapped {
                match result {
                    Value::Array(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            Ok(Value::Array(flat))
        }
        Operation::Filter(test) => run_partition(items, test, width, true).await,
        Operation::Reject(test) => run_partition(items, test, width, false).await,
        Operation::Find(test) => Ok(run_detect(items, test, width, true)
            .await?
            .unwrap_or(Value::Null)),
        Operation::Some(test) => Ok(Value::Bool(
            run_detect(items, test, width, true).await?.is_some(),
        )),
        Operation::Every(test) => Ok(Value::Bool(
            run_detect(items, test, width, false).await?.is_none(),
        )),
        Operation::SortBy(f) => {
            let criteria = run_map(items.clone(), f, width).await?;
            let mut keyed: Vec<(Value, Value)> = criteria.into_iter().zip(items).collect();
            keyed.sort_by(|(a, _), (b, _)| value::compare(a, b));
            Ok(Value::Array(keyed.into_iter().map(|(_, item)| item).collect()))
        }
        Operation::Where(comparison) => {
            let test = matches_test(comparison.clone());
            run_partition(items, &test, width, true).await
        }
        Operation::FindWhere(comparison) => {
            let test = matches_test(comparison.clone());
            Ok(run_detect(items, &test, width, true)
                .await?
                .unwrap_or(Value::Null))
        }
        Operation::Pluck(key) => {
            let key = key.clone();
            let project = transform_fn(move |item: Value| {
                future::ready(Ok(value::field(&item, &key).cloned().unwrap_or(Value::Null)))
            });
            run_map(items, &project, width).await.map(Value::Array)
        }
    }
}

fn matches_test(comparison: serde_json::Map<String, Value>) -> TestFn {
    test_fn(move |item: Value| future::ready(Ok(value::matches(&item, &comparison))))
}

fn ordered<I, F, Fut>(items: I, width: usize, f: F) -> impl Stream<Item = Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    stream::iter(items).map(f).buffered(width)
}

async fn run_each<I>(items: I, f: &TransformFn, width: usize) -> Result<(), ElementError>
where
    I: IntoIterator<Item = (usize, Value)>,
{
    let mut outcomes = pin!(ordered(items, width, |(index, item)| {
        let pending = f(item);
        async move { (index, pending.await) }
    }));

    while let Some((index, outcome)) = outcomes.next().await {
        if let Err(source) = outcome {
            return Err(ElementError { index, source });
        }
    }
    Ok(())
}

async fn run_map(
    items: Vec<Value>,
    f: &TransformFn,
    width: usize,
) -> Result<Vec<Value>, ElementError> {
    let mut results = Vec::with_capacity(items.len());
    let mut outcomes = pin!(ordered(items.into_iter().enumerate(), width, |(index, item)| {
        let pending = f(item);
        async move { (index, pending.await) }
    }));

    while let Some((index, outcome)) = outcomes.next().await {
        results.push(outcome.map_err(|source| ElementError { index, source })?);
    }
    Ok(results)
}

async fn run_fold<I>(items: I, seed: Value, fold: &FoldFn) -> StepOutcome
where
    I: IntoIterator<Item = (usize, Value)>,
{
    let mut memo = seed;
    for (index, item) in items {
        memo = fold(item, memo)
            .await
            .map_err(|source| ElementError { index, source })?;
    }
    Ok(memo)
}

/// Evaluate every element, keeping those whose verdict equals `keep`.
///
/// All predicates run to completion; any failure replaces the result, and the
/// failure at the lowest position wins.
async fn run_partition(items: Vec<Value>, test: &TestFn, width: usize, keep: bool) -> StepOutcome {
    let outcomes: Vec<_> = ordered(items.into_iter().enumerate(), width, |(index, item)| {
        let pending = test(item.clone());
        async move { (index, item, pending.await) }
    })
    .collect()
    .await;

    let mut kept = Vec::new();
    for (index, item, verdict) in outcomes {
        match verdict {
            Ok(verdict) if verdict == keep => kept.push(item),
            Ok(_) => {}
            Err(source) => return Err(ElementError { index, source }),
        }
    }
    Ok(Value::Array(kept))
}

/// First element (in input order) whose verdict equals `wanted`.
///
/// Stops at the first determining verdict or the first failure, whichever
/// comes earlier in input order.
async fn run_detect(
    items: Vec<Value>,
    test: &TestFn,
    width: usize,
    wanted: bool,
) -> Result<Option<Value>, ElementError> {
    let mut outcomes = pin!(ordered(items.into_iter().enumerate(), width, |(index, item)| {
        let pending = test(item.clone());
        async move { (index, item, pending.await) }
    }));

    while let Some((index, item, verdict)) = outcomes.next().await {
        match verdict {
            Ok(verdict) if verdict == wanted => return Ok(Some(item)),
            Ok(_) => {}
            Err(source) => return Err(ElementError { index, source }),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Operation, OperationKind, Predicate};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn op(kind: OperationKind, args: Vec<Value>, predicate: Predicate) -> Operation {
        Operation::from_parts(kind, args, predicate).unwrap()
    }

    fn is_even() -> Predicate {
        Predicate::test(|x: Value| async move { Ok(x.as_i64().unwrap_or(1) % 2 == 0) })
    }

    #[tokio::test]
    async fn test_map_preserves_order() {
        let double = op(
            OperationKind::Map,
            vec![],
            Predicate::transform(|x: Value| async move {
                let n = x.as_i64().unwrap();
                // Later elements finish first.
                tokio::time::sleep(std::time::Duration::from_millis((5 - n) as u64)).await;
                Ok(json!(n * 2))
            }),
        );
        let out = run_operation(&double, vec![json!(1), json!(2), json!(3), json!(4)], None)
            .await
            .unwrap();
        assert_eq!(out, json!([2, 4, 6, 8]));
    }

    #[tokio::test]
    async fn test_filter_and_reject() {
        let items = vec![json!(1), json!(2), json!(3), json!(4)];
        let filter = op(OperationKind::Filter, vec![], is_even());
        let reject = op(OperationKind::Reject, vec![], is_even());
        assert_eq!(
            run_operation(&filter, items.clone(), None).await.unwrap(),
            json!([2, 4])
        );
        assert_eq!(
            run_operation(&reject, items, Some(1)).await.unwrap(),
            json!([1, 3])
        );
    }

    #[tokio::test]
    async fn test_filter_reports_lowest_failure() {
        let filter = op(
            OperationKind::Filter,
            vec![],
            Predicate::test(|x: Value| async move {
                match x.as_i64() {
                    Some(2) | Some(4) => Err(BoxError::from(format!("bad {x}"))),
                    _ => Ok(true),
                }
            }),
        );
        let err = run_operation(&filter, (0..5).map(|n| json!(n)).collect(), None)
            .await
            .unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.source.to_string(), "bad 2");
    }

    #[tokio::test]
    async fn test_reduce_directions() {
        let concat = Predicate::fold(|item: Value, memo: Value| async move {
            Ok(json!(format!("{}{}", memo.as_str().unwrap(), item.as_str().unwrap())))
        });
        let items = vec![json!("a"), json!("b"), json!("c")];
        let left = op(OperationKind::Reduce, vec![json!("")], concat.clone());
        let right = op(OperationKind::ReduceRight, vec![json!("")], concat);
        assert_eq!(
            run_operation(&left, items.clone(), None).await.unwrap(),
            json!("abc")
        );
        assert_eq!(run_operation(&right, items, None).await.unwrap(), json!("cba"));
    }

    #[tokio::test]
    async fn test_reduce_right_failure_index() {
        let fold = op(
            OperationKind::ReduceRight,
            vec![json!(0)],
            Predicate::fold(|item: Value, memo: Value| async move {
                if item == json!("x") {
                    return Err(BoxError::from("not a number"));
                }
                Ok(json!(memo.as_i64().unwrap() + item.as_i64().unwrap()))
            }),
        );
        let err = run_operation(&fold, vec![json!(1), json!("x"), json!(3)], None)
            .await
            .unwrap_err();
        assert_eq!(err.index, 1);
    }

    #[tokio::test]
    async fn test_some_stops_dispatching() {
        let dispatched = Arc::new(AtomicUsize::new(0));
        let counter = dispatched.clone();
        let some = op(
            OperationKind::Some,
            vec![],
            Predicate::test(move |x: Value| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(x == json!(2)) }
            }),
        );
        let items = (1..=10).map(|n| json!(n)).collect();
        let out = run_operation(&some, items, Some(1)).await.unwrap();
        assert_eq!(out, json!(true));
        assert_eq!(dispatched.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_every_and_find() {
        let items: Vec<Value> = vec![json!(2), json!(4), json!(5), json!(6)];
        let every = op(OperationKind::Every, vec![], is_even());
        let find = op(
            OperationKind::Find,
            vec![],
            Predicate::test(|x: Value| async move { Ok(x.as_i64().unwrap() > 3) }),
        );
        assert_eq!(
            run_operation(&every, items.clone(), None).await.unwrap(),
            json!(false)
        );
        assert_eq!(run_operation(&find, items.clone(), None).await.unwrap(), json!(4));
        assert_eq!(run_operation(&every, vec![], None).await.unwrap(), json!(true));

        let none = op(
            OperationKind::Find,
            vec![],
            Predicate::test(|_| async { Ok(false) }),
        );
        assert_eq!(run_operation(&none, items, None).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_each_right_visits_in_reverse_without_mutating() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = seen.clone();
        let each_right = op(
            OperationKind::EachRight,
            vec![],
            Predicate::transform(move |x: Value| {
                log.lock().unwrap().push(x.clone());
                async move { Ok(Value::Null) }
            }),
        );
        let out = run_operation(&each_right, vec![json!(1), json!(2), json!(3)], Some(1))
            .await
            .unwrap();
        assert_eq!(out, json!([1, 2, 3]));
        assert_eq!(*seen.lock().unwrap(), vec![json!(3), json!(2), json!(1)]);
    }

    #[tokio::test]
    async fn test_concat_and_sort_by() {
        let concat = op(
            OperationKind::Concat,
            vec![],
            Predicate::transform(|x: Value| async move {
                let n = x.as_i64().unwrap();
                Ok(if n % 2 == 0 { json!([n, n]) } else { json!(n) })
            }),
        );
        assert_eq!(
            run_operation(&concat, vec![json!(1), json!(2), json!(3)], None)
                .await
                .unwrap(),
            json!([1, 2, 2, 3])
        );

        let by_age = op(
            OperationKind::SortBy,
            vec![],
            Predicate::transform(|x: Value| async move { Ok(x["age"].clone()) }),
        );
        let people = vec![
            json!({"name": "scott", "age": 29}),
            json!({"name": "lindsay", "age": 25}),
            json!({"name": "sam", "age": 29}),
        ];
        assert_eq!(
            run_operation(&by_age, people, None).await.unwrap(),
            json!([
                {"name": "lindsay", "age": 25},
                {"name": "scott", "age": 29},
                {"name": "sam", "age": 29}
            ])
        );
    }

    #[tokio::test]
    async fn test_derived_operations() {
        let people = vec![
            json!({"name": "scott", "age": 29}),
            json!({"name": "lindsay", "age": 25}),
            json!("not a person"),
        ];
        let where_29 = op(
            OperationKind::Where,
            vec![json!({"age": 29})],
            Predicate::None,
        );
        let find_lindsay = op(
            OperationKind::FindWhere,
            vec![json!({"name": "lindsay"})],
            Predicate::None,
        );
        let names = op(OperationKind::Pluck, vec![json!("name")], Predicate::None);

        assert_eq!(
            run_operation(&where_29, people.clone(), None).await.unwrap(),
            json!([{"name": "scott", "age": 29}])
        );
        assert_eq!(
            run_operation(&find_lindsay, people.clone(), None)
                .await
                .unwrap(),
            json!({"name": "lindsay", "age": 25})
        );
        assert_eq!(
            run_operation(&names, people, None).await.unwrap(),
            json!(["scott", "lindsay", null])
        );
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_respected() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (current, max) = (in_flight.clone(), peak.clone());
        let map = op(
            OperationKind::Map,
            vec![],
            Predicate::transform(move |x: Value| {
                let (current, max) = (current.clone(), max.clone());
                async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    max.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok(x)
                }
            }),
        );
        let items: Vec<Value> = (0..12).map(|n| json!(n)).collect();
        run_operation(&map, items.clone(), Some(3)).await.unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 3);

        peak.store(0, Ordering::SeqCst);
        run_operation(&map, items, None).await.unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 12);
    }
}
