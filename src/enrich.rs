use crate::error::{Result, WatchError};
use crate::results::{Candidate, ChangeRecord, PageExtract};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Source of plaintext page content
pub trait PageSource {
    /// Fetch the extract for an exact title.
    ///
    /// A missing page yields an empty extract; only a failed request is an
    /// error (`LookupFailure`).
    fn fetch_extract(&self, title: &str) -> impl Future<Output = Result<PageExtract>> + Send;
}

/// Fetches page content for candidate titles with bounded concurrency
pub struct PageEnricher<S> {
    source: Arc<S>,
    max_concurrency: usize,
}

impl<S> PageEnricher<S>
where
    S: PageSource + Send + Sync + 'static,
{
    pub fn new(source: Arc<S>, max_concurrency: usize) -> Self {
        Self {
            source,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Fetch the extract for one title
    pub async fn enrich(&self, title: &str) -> Result<PageExtract> {
        self.source.fetch_extract(title).await
    }

    /// Fetch extracts for every change, at most `max_concurrency` at a time.
    ///
    /// Results come back in completion order. The first failure aborts the
    /// lookups still in flight and is returned.
    pub async fn enrich_all(&self, changes: Vec<ChangeRecord>) -> Result<Vec<Candidate>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for change in changes {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| WatchError::Worker(e.to_string()))?;

                ::log::debug!("Fetching extract for {:?}", change.title);
                let extract = source.fetch_extract(&change.title).await?;
                ::log::trace!(
                    "Extract for {:?} is {} bytes",
                    change.title,
                    extract.text.len()
                );

                Ok::<_, WatchError>(Candidate { change, extract })
            });
        }

        let mut candidates = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let candidate = joined.map_err(|e| WatchError::Worker(e.to_string()))??;
            candidates.push(candidate);
        }

        Ok(candidates)
    }
}
