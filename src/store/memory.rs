use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{sort_for_listing, ReportStore, StoreError};
use crate::report::{Report, ReportStatus};

/// Reports held in process memory. Backs demo mode and the test suites.
#[derive(Default)]
pub struct MemoryReportStore {
    reports: RwLock<HashMap<String, Report>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reports(reports: impl IntoIterator<Item = Report>) -> Self {
        let store = Self::new();
        for report in reports {
            store.insert(report);
        }
        store
    }

    pub fn insert(&self, report: Report) {
        self.reports.write().insert(report.id.clone(), report);
    }

    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.reports.read().contains_key(id)
    }

    /// Make every following read fail, as an unreachable database would.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every following write fail, as a permission-denied database would.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Read("store unavailable".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write("permission denied".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn list_by_status(&self, status: ReportStatus) -> Result<Vec<Report>, StoreError> {
        self.check_read()?;
        let mut reports: Vec<Report> = self
            .reports
            .read()
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        sort_for_listing(&mut reports);
        Ok(reports)
    }

    async fn get_by_id(&self, id: &str) -> Result<Report, StoreError> {
        self.check_read()?;
        self.reports
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_status(
        &self,
        id: &str,
        expected: ReportStatus,
        status: ReportStatus,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        let mut reports = self.reports.write();
        let report = reports
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if report.status != expected {
            return Err(StoreError::Conflict(id.to_string()));
        }
        report.status = status;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        self.reports.write().remove(id);
        Ok(())
    }
}
