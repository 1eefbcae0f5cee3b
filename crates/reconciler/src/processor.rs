//! Overdue-review scan
//!
//! Lateness is a query-time derivation over (status, due_date); this
//! processor only observes and reports. Re-running a scan is safe: it
//! writes no review state, so every pass sees the same rows until a
//! reviewer or editor acts.

use reviewflow_common::db::Repository;
use reviewflow_common::errors::Result;
use reviewflow_common::metrics::METRICS_PREFIX;
use reviewflow_common::notify::{NotificationEvent, Notifier};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Scans for active reviews past their due date
pub struct OverdueProcessor {
    repo: Repository,
    notifier: Arc<dyn Notifier>,
    batch_size: u64,
}

impl OverdueProcessor {
    pub fn new(repo: Repository, notifier: Arc<dyn Notifier>, batch_size: u64) -> Self {
        Self {
            repo,
            notifier,
            batch_size,
        }
    }

    /// One scan pass: gauge + log + best-effort notifications
    pub async fn run_scan(&self) -> Result<()> {
        let started = Instant::now();
        let now = chrono::Utc::now();

        let overdue = self.repo.find_overdue_reviews(now, self.batch_size).await?;
        let count = overdue.len();

        metrics::gauge!(format!("{}_reviews_overdue", METRICS_PREFIX)).set(count as f64);

        if count as u64 == self.batch_size {
            warn!(
                batch_size = self.batch_size,
                "Overdue scan hit the batch cap; gauge undercounts"
            );
        }

        for review in &overdue {
            let days_overdue = (now - chrono::DateTime::<chrono::Utc>::from(review.due_date))
                .num_days();

            info!(
                review_id = %review.id,
                paper_id = %review.paper_id,
                reviewer_id = %review.reviewer_id,
                days_overdue,
                "Review overdue"
            );

            self.notifier
                .send_best_effort(NotificationEvent::ReviewOverdue {
                    paper_id: review.paper_id,
                    review_id: review.id,
                    reviewer_id: review.reviewer_id,
                    due_date: review.due_date.into(),
                })
                .await;
        }

        metrics::histogram!(format!("{}_reconcile_duration_seconds", METRICS_PREFIX))
            .record(started.elapsed().as_secs_f64());

        info!(overdue = count, "Overdue scan complete");
        Ok(())
    }
}
