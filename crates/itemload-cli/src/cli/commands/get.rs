//! `itemload get <url>` – load items and stream them to stdout.

use anyhow::{Context, Result};
use itemload_core::ItemSource;
use std::io::Write;

/// Items in flight between the producer task and the printer.
const ITEM_CHANNEL_CAPACITY: usize = 64;

/// Loads `url` on a blocking worker, then hands every item to the printer
/// over a channel, in source order. Returns the number of items written.
pub async fn run_get<S, W>(source: S, url: &str, out: &mut W) -> Result<usize>
where
    S: ItemSource + Send + 'static,
    W: Write,
{
    let items = tokio::task::spawn_blocking({
        let url = url.to_string();
        move || source.get_content(&url)
    })
    .await
    .context("loader task join")?
    .with_context(|| format!("loading {}", url))?;
    tracing::info!(url, count = items.len(), "loaded items");

    let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(ITEM_CHANNEL_CAPACITY);
    let producer = tokio::spawn(async move {
        for item in items {
            if tx.send(item).await.is_err() {
                break;
            }
        }
    });

    let mut written = 0usize;
    while let Some(item) = rx.recv().await {
        writeln!(out, "{}", item)?;
        written += 1;
    }
    producer.await.context("item producer join")?;
    out.flush()?;
    Ok(written)
}
