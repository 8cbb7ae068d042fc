//! Report store - the hosted document database behind the panel.
//!
//! - `firestore` - Cloud Firestore over its REST API
//! - `memory` - in-process store for demo mode and tests

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryReportStore;

use crate::report::{Report, ReportStatus};
use async_trait::async_trait;
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read reports: {0}")]
    Read(String),
    #[error("failed to write report: {0}")]
    Write(String),
    #[error("report not found: {0}")]
    NotFound(String),
    #[error("report {0} was changed by someone else, reload and try again")]
    Conflict(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn list_by_status(&self, status: ReportStatus) -> Result<Vec<Report>, StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Report, StoreError>;

    /// Write `status` only while the stored status is still `expected`.
    /// Fails with `StoreError::Conflict` once another writer got there first.
    async fn update_status(
        &self,
        id: &str,
        expected: ReportStatus,
        status: ReportStatus,
    ) -> Result<(), StoreError>;

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;
}

/// Listing order: newest submission first, reports never stamped last,
/// then visit date descending, then id.
pub fn sort_for_listing(reports: &mut [Report]) {
    reports.sort_by(|a, b| {
        newest_first(a.submitted_at, b.submitted_at)
            .then_with(|| newest_first(a.date, b.date))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn newest_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
