//! Bounded-concurrency batch execution and stats enrichment.
//!
//! Inputs are split into consecutive chunks. Chunks run one after another;
//! everything inside a chunk runs concurrently and is awaited until every
//! operation settles, so at most `chunk_size` operations are ever in flight.

use std::future::Future;

use chrono::NaiveDate;
use futures_util::future::join_all;

use crate::model::{Item, ViewStat};
use crate::remote::{RemoteError, RemoteSource};

/// Run `op` over `inputs` in sequential chunks, returning outcomes in input order.
///
/// One failing operation never cancels its siblings. A `chunk_size` of zero is
/// treated as one.
pub async fn chunked_run<T, R, E, F, Fut>(inputs: Vec<T>, chunk_size: usize, op: F) -> Vec<Result<R, E>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    chunked_run_with(inputs, chunk_size, op, |_: &[Result<R, E>]| {}).await
}

/// Like [`chunked_run`], calling `after_chunk` with each chunk's outcomes once it settles.
pub async fn chunked_run_with<T, R, E, F, Fut, A>(
    inputs: Vec<T>, chunk_size: usize, op: F, mut after_chunk: A,
) -> Vec<Result<R, E>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    A: FnMut(&[Result<R, E>]),
{
    let chunk_size = chunk_size.max(1);
    let mut outcomes = Vec::with_capacity(inputs.len());
    let mut pending = inputs.into_iter().peekable();

    while pending.peek().is_some() {
        let chunk: Vec<Fut> = pending.by_ref().take(chunk_size).map(&op).collect();
        let settled = join_all(chunk).await;
        after_chunk(&settled);
        outcomes.extend(settled);
    }

    outcomes
}

/// Fetch stats for one item and attach the derived view statistics.
pub async fn enrich_item(remote: &dyn RemoteSource, mut item: Item, today: NaiveDate) -> Result<Item, RemoteError> {
    let stat = remote.fetch_stats(&item.id).await?;
    item.view_stat = Some(ViewStat::from_snapshot(stat, today));
    Ok(item)
}

/// Enrich every item, keeping the unenriched original wherever the stats fetch fails.
pub async fn enrich_items(remote: &dyn RemoteSource, items: Vec<Item>, chunk_size: usize, today: NaiveDate) -> Vec<Item> {
    let total = items.len();
    let mut done = 0usize;

    let outcomes = chunked_run_with(
        items,
        chunk_size,
        |item: Item| async move {
            let fallback = item.clone();
            enrich_item(remote, item, today).await.map_err(|err| (fallback, err))
        },
        |settled: &[Result<Item, (Item, RemoteError)>]| {
            done += settled.len();
            tracing::debug!(done, total, "enrichment chunk settled");
        },
    )
    .await;

    let mut failed = 0usize;
    let enriched: Vec<Item> = outcomes
        .into_iter()
        .map(|outcome| match outcome {
            Ok(item) => item,
            Err((item, err)) => {
                failed += 1;
                tracing::warn!(item_id = %item.id, error = %err, "failed to fetch stats, keeping unenriched item");
                item
            }
        })
        .collect();

    if failed > 0 {
        tracing::info!(total, failed, "enrichment finished with partial failures");
    }

    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::item;
    use crate::remote::fake::FakeRemote;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_chunked_run_order_and_bound() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let inputs: Vec<usize> = (0..23).collect();

        let outcomes = chunked_run(inputs, 10, |n| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                // later inputs finish first inside a chunk
                tokio::time::sleep(Duration::from_millis(100 - n as u64)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                if n % 5 == 0 { Err(format!("boom {n}")) } else { Ok(n * 2) }
            }
        })
        .await;

        assert_eq!(outcomes.len(), 23);
        for (i, outcome) in outcomes.iter().enumerate() {
            match outcome {
                Ok(v) => assert_eq!(*v, i * 2),
                Err(msg) => assert_eq!(msg, &format!("boom {i}")),
            }
        }
        assert_eq!(peak.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_chunked_run_reports_each_chunk() {
        let mut sizes = Vec::new();
        let outcomes = chunked_run_with(
            (0..7).collect::<Vec<u32>>(),
            3,
            |n| async move { Ok::<_, ()>(n) },
            |settled: &[Result<u32, ()>]| sizes.push(settled.len()),
        )
        .await;

        assert_eq!(outcomes.len(), 7);
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn test_chunked_run_zero_chunk_size() {
        let outcomes = chunked_run(vec![1, 2], 0, |n| async move { Ok::<_, ()>(n) }).await;
        assert_eq!(outcomes, vec![Ok(1), Ok(2)]);
    }

    #[tokio::test]
    async fn test_chunked_run_empty() {
        let outcomes = chunked_run(Vec::<u8>::new(), 10, |n| async move { Ok::<_, ()>(n) }).await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_enrich_items_keeps_unenriched_on_failure() {
        let remote = FakeRemote::default();
        remote.failing_stats.lock().unwrap().insert("b".to_string());
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        let items = enrich_items(&remote, vec![item("a"), item("b"), item("c")], 2, today).await;

        assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(items[0].view_stat.is_some());
        assert!(items[1].view_stat.is_none());
        assert_eq!(items[2].views(), 10);
    }
}
