#[cfg(test)]
mod tests {
    use crate::report::model::{parse_timestamp, Report, ReportStatus};
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_status_advances_only_forward() {
        assert!(ReportStatus::Submitted.can_advance_to(ReportStatus::Reviewed));
        assert!(ReportStatus::Reviewed.can_advance_to(ReportStatus::Approved));

        assert!(!ReportStatus::Submitted.can_advance_to(ReportStatus::Approved));
        assert!(!ReportStatus::Submitted.can_advance_to(ReportStatus::Submitted));
        assert!(!ReportStatus::Reviewed.can_advance_to(ReportStatus::Submitted));
        assert!(!ReportStatus::Approved.can_advance_to(ReportStatus::Reviewed));
        assert_eq!(ReportStatus::Approved.next(), None);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("submitted".parse::<ReportStatus>(), Ok(ReportStatus::Submitted));
        assert_eq!(" Reviewed ".parse::<ReportStatus>(), Ok(ReportStatus::Reviewed));
        assert!("archived".parse::<ReportStatus>().is_err());
        assert_eq!(ReportStatus::Approved.to_string(), "approved");
    }

    #[test]
    fn test_report_deserialization_with_floors() {
        let json = r#"{
            "id": "rep-1",
            "clientName": "Clinique Saint-Roch",
            "location": "Lyon",
            "date": "2025-03-14T09:30:00.000",
            "technicianName": "Karim B.",
            "status": "submitted",
            "submittedAt": "2025-03-15T10:00:00Z",
            "floors": [
                {
                    "name": "RDC",
                    "networkCabinets": [{"reference": "B1"}],
                    "conduits": [{}, {}],
                    "someFutureField": true
                },
                { "name": "R+1" }
            ]
        }"#;

        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.id, "rep-1");
        assert_eq!(report.status, ReportStatus::Submitted);
        assert_eq!(report.project_manager, None);
        assert_eq!(report.floors.len(), 2);
        assert_eq!(report.floors[0].component_count(), 3);
        assert_eq!(report.floors[1].component_count(), 0);
        assert_eq!(report.total_components(), 3);

        let date = report.date.unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2025, 3, 14));
        assert_eq!(date.hour(), 9);
        assert!(report.submitted_at.is_some());
    }

    #[test]
    fn test_unparseable_dates_read_as_absent() {
        let json = r#"{"status": "approved", "date": "sometime last week", "submittedAt": 1741946400000}"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert!(report.date.is_none());
        assert_eq!(report.submitted_at.unwrap().timestamp_millis(), 1741946400000);
    }

    #[test]
    fn test_display_name_falls_back() {
        let json = r#"{"id": "x", "status": "submitted", "clientName": "   "}"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.display_name(), "Unnamed Report");
    }

    #[test]
    fn test_parse_plain_date() {
        let parsed = parse_timestamp("2024-12-01").unwrap();
        assert_eq!(parsed.day(), 1);
        assert_eq!(parsed.hour(), 0);
    }

    mod workflow {
        use crate::report::{advance_status, Report, ReportStatus, WorkflowError};
        use crate::store::{MemoryReportStore, ReportStore, StoreError};
        use async_trait::async_trait;

        /// Another administrator advances the report right after every read.
        struct ConcurrentReviewer {
            inner: MemoryReportStore,
        }

        #[async_trait]
        impl ReportStore for ConcurrentReviewer {
            async fn list_by_status(&self, status: ReportStatus) -> Result<Vec<Report>, StoreError> {
                self.inner.list_by_status(status).await
            }

            async fn get_by_id(&self, id: &str) -> Result<Report, StoreError> {
                let report = self.inner.get_by_id(id).await?;
                if let Some(next) = report.status.next() {
                    self.inner.update_status(id, report.status, next).await?;
                }
                Ok(report)
            }

            async fn update_status(
                &self,
                id: &str,
                expected: ReportStatus,
                status: ReportStatus,
            ) -> Result<(), StoreError> {
                self.inner.update_status(id, expected, status).await
            }

            async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
                self.inner.delete_by_id(id).await
            }
        }

        fn stored(id: &str, status: ReportStatus) -> Report {
            Report {
                id: id.to_string(),
                client_name: None,
                location: None,
                date: None,
                technician_name: None,
                project_manager: None,
                status,
                submitted_at: None,
                floors: Vec::new(),
            }
        }

        #[tokio::test]
        async fn test_advance_moves_one_stage() {
            let store = MemoryReportStore::with_reports(vec![stored("r1", ReportStatus::Submitted)]);

            advance_status(&store, "r1", ReportStatus::Reviewed).await.unwrap();
            assert_eq!(store.get_by_id("r1").await.unwrap().status, ReportStatus::Reviewed);

            advance_status(&store, "r1", ReportStatus::Approved).await.unwrap();
            assert_eq!(store.get_by_id("r1").await.unwrap().status, ReportStatus::Approved);
        }

        #[tokio::test]
        async fn test_skipping_a_stage_is_rejected_without_writing() {
            let store = MemoryReportStore::with_reports(vec![stored("r1", ReportStatus::Submitted)]);

            let err = advance_status(&store, "r1", ReportStatus::Approved).await.unwrap_err();
            assert!(matches!(
                err,
                WorkflowError::InvalidTransition {
                    from: ReportStatus::Submitted,
                    to: ReportStatus::Approved
                }
            ));
            assert_eq!(store.get_by_id("r1").await.unwrap().status, ReportStatus::Submitted);
        }

        #[tokio::test]
        async fn test_approved_report_cannot_move_back() {
            let store = MemoryReportStore::with_reports(vec![stored("r1", ReportStatus::Approved)]);
            let err = advance_status(&store, "r1", ReportStatus::Reviewed).await.unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        }

        #[tokio::test]
        async fn test_missing_report_is_not_found() {
            let store = MemoryReportStore::new();
            let err = advance_status(&store, "ghost", ReportStatus::Reviewed).await.unwrap_err();
            assert!(matches!(err, WorkflowError::Store(StoreError::NotFound(_))));
        }

        #[tokio::test]
        async fn test_failed_write_keeps_status() {
            let store = MemoryReportStore::with_reports(vec![stored("r1", ReportStatus::Reviewed)]);
            store.fail_writes(true);

            let err = advance_status(&store, "r1", ReportStatus::Approved).await.unwrap_err();
            assert!(matches!(err, WorkflowError::Store(StoreError::Write(_))));

            store.fail_writes(false);
            assert_eq!(store.get_by_id("r1").await.unwrap().status, ReportStatus::Reviewed);
        }

        #[tokio::test]
        async fn test_concurrent_change_between_read_and_write_is_refused() {
            let store = ConcurrentReviewer {
                inner: MemoryReportStore::with_reports(vec![stored("r1", ReportStatus::Submitted)]),
            };

            let err = advance_status(&store, "r1", ReportStatus::Reviewed).await.unwrap_err();
            assert!(matches!(err, WorkflowError::Store(StoreError::Conflict(_))));
            assert_eq!(
                store.inner.get_by_id("r1").await.unwrap().status,
                ReportStatus::Reviewed
            );
        }
    }
}
