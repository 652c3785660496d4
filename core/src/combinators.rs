//! Collection and fan-out combinators.
//!
//! `map`, `filter` and `reduce` lift an element-wise flow over a `Vec`,
//! processing elements strictly in order. `parallel` and `race` fan the same
//! input out to several flows at once.
//!
//! Fan-out branches are polled concurrently on the calling task rather than
//! spawned, so anything scoped to the caller (such as the ambient context)
//! stays visible inside every branch. Dropping the combined future drops every
//! branch with it.

use crate::error::Error;
use crate::flow::Flow;
use crate::metadata::FlowMetadata;
use futures_util::future::{select_all, try_join_all};
use std::sync::Arc;

fn lifted(label: &str, inner: &FlowMetadata) -> FlowMetadata {
    FlowMetadata {
        name: Some(format!("{label}({})", inner.display_name())),
        ..inner.clone()
    }
}

fn fanned_out<'a>(label: &str, parts: impl IntoIterator<Item = &'a FlowMetadata>) -> FlowMetadata {
    let mut names = Vec::new();
    let mut combined = FlowMetadata::pure(label);
    let mut any_effects = false;
    for part in parts {
        names.push(part.display_name().to_string());
        combined.pure &= part.pure;
        combined.memoizable &= part.memoizable;
        combined.tags.extend(part.tags.iter().cloned());
        if let Some(flags) = part.effects {
            any_effects = true;
            combined.effects = Some(combined.effects.unwrap_or_default() | flags);
        }
    }
    if !any_effects {
        combined.effects = None;
    }
    combined.name = Some(format!("{label}({})", names.join(", ")));
    combined
}

/// Apply `flow` to each element in order, awaiting each before the next.
pub fn map<T, U, E>(flow: &Flow<T, U, E>) -> Flow<Vec<T>, Vec<U>, E>
where
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
{
    let inner = flow.clone();
    Flow::new(move |items: Vec<T>| {
        let inner = inner.clone();
        async move {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(inner.call(item).await?);
            }
            Ok(out)
        }
    })
    .with_metadata(lifted("map", flow.metadata()))
}

/// Keep the elements for which `predicate` yields `true`, preserving order.
pub fn filter<T, E>(predicate: &Flow<T, bool, E>) -> Flow<Vec<T>, Vec<T>, E>
where
    T: Clone + Send + 'static,
    E: Send + 'static,
{
    let inner = predicate.clone();
    Flow::new(move |items: Vec<T>| {
        let inner = inner.clone();
        async move {
            let mut kept = Vec::with_capacity(items.len());
            for item in items {
                if inner.call(item.clone()).await? {
                    kept.push(item);
                }
            }
            Ok(kept)
        }
    })
    .with_metadata(lifted("filter", predicate.metadata()))
}

/// Fold the elements left to right through `flow`, starting at `initial`.
pub fn reduce<T, Acc, E>(flow: &Flow<(Acc, T), Acc, E>, initial: Acc) -> Flow<Vec<T>, Acc, E>
where
    T: Send + 'static,
    Acc: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    let inner = flow.clone();
    Flow::new(move |items: Vec<T>| {
        let inner = inner.clone();
        let mut acc = initial.clone();
        async move {
            for item in items {
                acc = inner.call((acc, item)).await?;
            }
            Ok(acc)
        }
    })
    .with_metadata(lifted("reduce", flow.metadata()))
}

/// Run every flow concurrently against the same input.
///
/// Results keep the order of `flows`. The first failure is returned and the
/// branches still in flight are dropped.
pub fn parallel<In, Out, E, I>(flows: I) -> Flow<In, Vec<Out>, E>
where
    In: Clone + Send + 'static,
    Out: Send + 'static,
    E: Send + 'static,
    I: IntoIterator<Item = Flow<In, Out, E>>,
{
    let flows: Arc<[Flow<In, Out, E>]> = flows.into_iter().collect();
    let metadata = fanned_out("parallel", flows.iter().map(Flow::metadata));
    Flow::new(move |input: In| {
        let branches: Vec<_> = flows.iter().map(|flow| flow.call(input.clone())).collect();
        async move { try_join_all(branches).await }
    })
    .with_metadata(metadata)
}

/// Run every flow concurrently and settle with whichever finishes first,
/// success or failure.
///
/// Losing branches are dropped, which cancels them at their next suspension
/// point. Branches that hand work to spawned tasks are responsible for
/// cancelling that work themselves.
pub fn race<In, Out, E, I>(flows: I) -> Flow<In, Out, E>
where
    In: Clone + Send + 'static,
    Out: Send + 'static,
    E: From<Error> + Send + 'static,
    I: IntoIterator<Item = Flow<In, Out, E>>,
{
    let flows: Arc<[Flow<In, Out, E>]> = flows.into_iter().collect();
    let metadata = fanned_out("race", flows.iter().map(Flow::metadata));
    Flow::new(move |input: In| {
        let branches: Vec<_> = flows.iter().map(|flow| flow.call(input.clone())).collect();
        async move {
            if branches.is_empty() {
                return Err(E::from(Error::EmptyRace));
            }
            let (result, winner, _losers) = select_all(branches).await;
            tracing::trace!(winner, "Race settled");
            result
        }
    })
    .with_metadata(metadata)
}
