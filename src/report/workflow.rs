//! Status transitions. The current status is read back from the store
//! before every write, so a stale page can never move a report backwards.
//! The write itself is conditional on that status, so two administrators
//! acting at once cannot both advance the same report.

use thiserror::Error;

use super::ReportStatus;
use crate::store::{ReportStore, StoreError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("cannot move a {from} report to {to}")]
    InvalidTransition { from: ReportStatus, to: ReportStatus },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub async fn advance_status(
    store: &dyn ReportStore,
    report_id: &str,
    target: ReportStatus,
) -> Result<(), WorkflowError> {
    let current = store.get_by_id(report_id).await?.status;
    if !current.can_advance_to(target) {
        log::warn!(
            "Rejected status change of report {}: {} -> {}",
            report_id,
            current,
            target
        );
        return Err(WorkflowError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    store.update_status(report_id, current, target).await?;
    log::info!("Report {} moved from {} to {}", report_id, current, target);
    Ok(())
}
