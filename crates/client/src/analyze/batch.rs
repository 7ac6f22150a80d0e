//! Bounded fan-out over many target URLs.
//!
//! URLs are split into chunks of `batch_size`. Chunks run one after another;
//! URLs within a chunk run concurrently, each task with its own HTTP client.
//! Results are placed by input index, so the output order always matches the
//! input order regardless of completion order.

use chrono::Utc;
use std::collections::HashMap;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::{Analyzer, site_of};
use vidscout_core::{Error, SiteAnalysis};

impl Analyzer {
    /// Analyze every URL in `targets`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `targets` is empty.
    pub async fn analyze_many(&self, targets: &[String]) -> Result<Vec<SiteAnalysis>, Error> {
        self.analyze_many_with_cancellation(targets, &CancellationToken::new()).await
    }

    /// Analyze every URL in `targets`, aborting in-flight work once `token` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `targets` is empty and `Error::Cancelled`
    /// if `token` fires before the batch completes. No partial results are returned.
    pub async fn analyze_many_with_cancellation(
        &self, targets: &[String], token: &CancellationToken,
    ) -> Result<Vec<SiteAnalysis>, Error> {
        if targets.is_empty() {
            return Err(Error::InvalidInput("no URLs to analyze".into()));
        }

        let chunk_size = self.config.batch_size.max(1);
        let mut results: Vec<Option<SiteAnalysis>> = (0..targets.len()).map(|_| None).collect();

        for (chunk_index, chunk) in targets.chunks(chunk_size).enumerate() {
            let offset = chunk_index * chunk_size;
            tracing::debug!(chunk = chunk_index, size = chunk.len(), "starting batch chunk");

            let mut tasks = JoinSet::new();
            let mut slots = HashMap::new();
            for (i, target) in chunk.iter().enumerate() {
                let analyzer = self.clone();
                let token = token.clone();
                let target = target.clone();
                let handle =
                    tasks.spawn(async move { analyzer.analyze_with_cancellation(&target, &token).await });
                slots.insert(handle.id(), offset + i);
            }

            loop {
                let joined = tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tasks.abort_all();
                        tracing::info!("batch cancelled, aborted {} in-flight analyses", tasks.len());
                        return Err(Error::Cancelled);
                    }
                    joined = tasks.join_next_with_id() => joined,
                };
                let Some(joined) = joined else { break };

                match joined {
                    Ok((id, Ok(analysis))) => {
                        if let Some(&index) = slots.get(&id) {
                            results[index] = Some(analysis);
                        }
                    }
                    Ok((_, Err(e))) => {
                        tasks.abort_all();
                        return Err(e);
                    }
                    Err(join_error) => {
                        let Some(&index) = slots.get(&join_error.id()) else { continue };
                        let target = &targets[index];
                        tracing::warn!("analysis task for {} did not complete: {}", target, join_error);
                        results[index] = Some(SiteAnalysis::failed(
                            target.as_str(),
                            site_of(target),
                            Utc::now(),
                            0.0,
                            format!("analysis task failed: {join_error}"),
                        ));
                    }
                }
            }
        }

        Ok(results.into_iter().flatten().collect())
    }
}
