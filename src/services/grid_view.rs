use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::{
    error::ApiError,
    models::grid::{GridEnvelope, GridRequest},
    services::{api_client::ApiClient, grid_adapter::GridAdapter},
};

/// The page currently shown by a grid, with the sequence number of the
/// fetch that produced it. Sequence 0 means nothing has been shown yet.
#[derive(Debug, Clone, Default)]
pub struct DisplayedPage {
    pub seq: u64,
    pub envelope: Option<Arc<GridEnvelope>>,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The page is now displayed.
    Applied(Arc<GridEnvelope>),
    /// A later fetch settled first, with a page or an error; this result was
    /// dropped.
    Superseded { seq: u64, settled_seq: u64 },
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied(_))
    }
}

/// Displayed dataset of one grid instance.
///
/// Each fetch is numbered when issued. A result is displayed only if its
/// number is higher than that of every fetch already settled, failed ones
/// included, so a slow response to an older sort or filter never overwrites
/// a newer one.
pub struct GridView {
    issued: AtomicU64,
    settled: AtomicU64,
    displayed: watch::Sender<DisplayedPage>,
}

impl Default for GridView {
    fn default() -> Self {
        Self::new()
    }
}

impl GridView {
    pub fn new() -> Self {
        let (displayed, _) = watch::channel(DisplayedPage::default());
        Self {
            issued: AtomicU64::new(0),
            settled: AtomicU64::new(0),
            displayed,
        }
    }

    /// Numbers a new fetch.
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Displays `envelope` unless a newer fetch already settled.
    pub fn apply(&self, seq: u64, envelope: GridEnvelope) -> FetchOutcome {
        let envelope = Arc::new(envelope);
        let mut settled_seq = 0;

        // The displayed lock orders this against `fail`.
        let applied = self.displayed.send_if_modified(|current| {
            settled_seq = self.settled.fetch_max(seq, Ordering::SeqCst);
            if seq > settled_seq {
                current.seq = seq;
                current.envelope = Some(envelope.clone());
                true
            } else {
                false
            }
        });

        if applied {
            FetchOutcome::Applied(envelope)
        } else {
            tracing::debug!("⏭️ Dropping stale grid page #{} (settled #{})", seq, settled_seq);
            FetchOutcome::Superseded { seq, settled_seq }
        }
    }

    /// Records that fetch `seq` ended in an error. The page on screen stays,
    /// but older fetches can no longer replace it.
    pub fn fail(&self, seq: u64) {
        self.displayed.send_if_modified(|_| {
            self.settled.fetch_max(seq, Ordering::SeqCst);
            false
        });
    }

    /// Issues, awaits and applies one fetch.
    pub async fn load(
        &self,
        adapter: &GridAdapter,
        client: &ApiClient,
        request: GridRequest,
    ) -> Result<FetchOutcome, ApiError> {
        let seq = self.begin();
        match adapter.fetch_page(client, request).await {
            Ok(envelope) => Ok(self.apply(seq, envelope)),
            Err(e) => {
                self.fail(seq);
                Err(e)
            }
        }
    }

    pub fn current(&self) -> DisplayedPage {
        self.displayed.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayedPage> {
        self.displayed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(marker: u64) -> GridEnvelope {
        GridEnvelope {
            rows: vec![crate::services::grid_adapter::decorate(json!({ "marker": marker }))],
            total_pages: 1,
            total_count: 1,
        }
    }

    #[test]
    fn later_fetch_wins_when_it_resolves_first() {
        let view = GridView::new();
        let sort_change = view.begin();
        let filter_change = view.begin();

        assert!(view.apply(filter_change, envelope(2)).is_applied());
        let stale = view.apply(sort_change, envelope(1));

        assert!(matches!(
            stale,
            FetchOutcome::Superseded { seq: 1, settled_seq: 2 }
        ));
        let current = view.current();
        assert_eq!(current.seq, 2);
        assert_eq!(current.envelope.unwrap().rows[0].record["marker"], 2);
    }

    #[test]
    fn in_order_resolution_applies_both() {
        let view = GridView::new();
        let first = view.begin();
        let second = view.begin();

        assert!(view.apply(first, envelope(1)).is_applied());
        assert!(view.apply(second, envelope(2)).is_applied());
        assert_eq!(view.current().seq, 2);
    }

    #[tokio::test]
    async fn subscribers_see_applied_pages_only() {
        let view = GridView::new();
        let mut pages = view.subscribe();
        let older = view.begin();
        let newer = view.begin();

        view.apply(newer, envelope(2));
        pages.changed().await.unwrap();
        assert_eq!(pages.borrow_and_update().seq, 2);

        view.apply(older, envelope(1));
        assert!(!pages.has_changed().unwrap());
    }

    #[test]
    fn failed_newer_fetch_blocks_older_result() {
        let view = GridView::new();
        let shown = view.begin();
        assert!(view.apply(shown, envelope(1)).is_applied());

        let older = view.begin();
        let newer = view.begin();
        view.fail(newer);

        let late = view.apply(older, envelope(2));
        assert!(matches!(late, FetchOutcome::Superseded { seq: 2, settled_seq: 3 }));
        let current = view.current();
        assert_eq!(current.seq, shown);
        assert_eq!(current.envelope.unwrap().rows[0].record["marker"], 1);
    }
}
