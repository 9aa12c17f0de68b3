use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::diff;
use super::extractor;
use super::fetch::DocumentFetcher;
use super::notify::NotificationSink;
use super::record::{Posting, Snapshot};
use super::store::{SnapshotStore, StoreError};

/// Summary of one completed poll cycle, for logging and the status surface.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub sources_checked: usize,
    pub sources_skipped: Vec<String>,
    pub new_postings: Vec<Posting>,
    pub finished_at: DateTime<Utc>,
}

/// Orchestrates one poll cycle per invocation: fetch each source, extract
/// its table, diff against the in-memory snapshot, then persist once and
/// dispatch notifications.
pub struct PollService<F, S, N> {
    sources: Vec<String>,
    fetcher: Arc<F>,
    store: Arc<S>,
    sink: Arc<N>,
    snapshot: Snapshot,
}

impl<F, S, N> PollService<F, S, N>
where
    F: DocumentFetcher,
    S: SnapshotStore,
    N: NotificationSink,
{
    /// Build the service, loading the persisted snapshot for the configured
    /// sources.
    pub fn new(sources: Vec<String>, fetcher: Arc<F>, store: Arc<S>, sink: Arc<N>) -> Self {
        let snapshot = store.load(&sources);
        Self {
            sources,
            fetcher,
            store,
            sink,
            snapshot,
        }
    }

    /// Run one full cycle across every configured source.
    ///
    /// A source whose document cannot be fetched is skipped for the cycle
    /// and keeps its previous snapshot entry; the cycle itself only fails
    /// when the updated snapshot cannot be persisted.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, StoreError> {
        let mut fresh: Vec<Posting> = Vec::new();
        let mut sources_checked = 0usize;
        let mut sources_skipped: Vec<String> = Vec::new();

        for source in &self.sources {
            let document = match self.fetcher.fetch_document(source).await {
                Ok(Some(document)) => document,
                Ok(None) => {
                    warn!(%source, "document unavailable, skipping source this cycle");
                    sources_skipped.push(source.clone());
                    continue;
                }
                Err(err) => {
                    warn!(%source, %err, "fetch failed, skipping source this cycle");
                    sources_skipped.push(source.clone());
                    continue;
                }
            };

            let current = extractor::extract(&document, source);
            let stored = self.snapshot.get(source).cloned().unwrap_or_default();
            let (new_postings, updated) = diff::diff(&current, &stored);
            debug!(
                %source,
                extracted = current.len(),
                new = new_postings.len(),
                "source processed"
            );

            self.snapshot.insert(source.clone(), updated);
            fresh.extend(new_postings);
            sources_checked += 1;
        }

        // One whole-snapshot write after every source has been attempted,
        // so partial results survive even when some sources failed.
        self.store.save(&self.snapshot)?;

        for posting in &fresh {
            info!(
                company = %posting.company,
                role = %posting.role,
                source = %posting.source,
                "new posting found"
            );
            if let Err(err) = self.sink.notify(posting).await {
                warn!(
                    company = %posting.company,
                    role = %posting.role,
                    %err,
                    "failed to deliver notification"
                );
            }
        }

        Ok(CycleOutcome {
            sources_checked,
            sources_skipped,
            new_postings: fresh,
            finished_at: Utc::now(),
        })
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}
