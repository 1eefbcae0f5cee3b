//! Notification client abstraction
//!
//! The notification service is an external collaborator. Delivery is
//! fire-and-forget: a failed send is logged and never rolls back the
//! core operation that produced it.

use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Event published to the notification service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    ReviewerAssigned {
        paper_id: Uuid,
        reviewer_id: Uuid,
        due_date: DateTime<Utc>,
        is_blind: bool,
    },
    AssignmentDeclined {
        paper_id: Uuid,
        reviewer_id: Uuid,
        reason: String,
    },
    ReviewCompleted {
        paper_id: Uuid,
        review_id: Uuid,
        reviewer_id: Uuid,
    },
    ReviewOverdue {
        paper_id: Uuid,
        review_id: Uuid,
        reviewer_id: Uuid,
        due_date: DateTime<Utc>,
    },
}

impl NotificationEvent {
    /// Event name for logging
    pub fn name(&self) -> &'static str {
        match self {
            NotificationEvent::ReviewerAssigned { .. } => "reviewer_assigned",
            NotificationEvent::AssignmentDeclined { .. } => "assignment_declined",
            NotificationEvent::ReviewCompleted { .. } => "review_completed",
            NotificationEvent::ReviewOverdue { .. } => "review_overdue",
        }
    }
}

/// Notification delivery trait
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: NotificationEvent) -> Result<()>;

    /// Send without surfacing delivery failures to the caller
    async fn send_best_effort(&self, event: NotificationEvent) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            tracing::warn!(event = name, error = %e, "Notification delivery failed");
        }
    }
}

/// Notifier that posts events as JSON to an HTTP endpoint
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotifier {
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { client, endpoint }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, event: NotificationEvent) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&event)
            .send()
            .await?;

        response.error_for_status()?;
        Ok(())
    }
}

/// Notifier used when no endpoint is configured
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, event: NotificationEvent) -> Result<()> {
        tracing::debug!(event = event.name(), "Notification suppressed (no endpoint)");
        Ok(())
    }
}

/// Build a notifier from configuration
pub fn create_notifier(config: &crate::config::NotificationConfig) -> std::sync::Arc<dyn Notifier> {
    match &config.endpoint {
        Some(endpoint) => std::sync::Arc::new(HttpNotifier::new(
            endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )),
        None => std::sync::Arc::new(NoopNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = NotificationEvent::AssignmentDeclined {
            paper_id: Uuid::nil(),
            reviewer_id: Uuid::nil(),
            reason: "conflict of interest".into(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "assignment_declined");
        assert_eq!(json["reason"], "conflict of interest");
    }

    #[tokio::test]
    async fn test_noop_notifier_swallows_events() {
        let notifier = NoopNotifier;
        let event = NotificationEvent::ReviewCompleted {
            paper_id: Uuid::nil(),
            review_id: Uuid::nil(),
            reviewer_id: Uuid::nil(),
        };
        assert!(notifier.send(event).await.is_ok());
    }
}
