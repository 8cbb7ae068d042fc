#[cfg(test)]
mod tests {
    use crate::api::ApiError;
    use crate::auth::SessionError;
    use crate::document::GeneratorError;
    use crate::report::{ReportStatus, WorkflowError};
    use crate::store::StoreError;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    #[test]
    fn test_status_codes() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (SessionError::Missing.into(), StatusCode::UNAUTHORIZED),
            ("archived".parse::<ReportStatus>().unwrap_err().into(), StatusCode::BAD_REQUEST),
            (
                WorkflowError::InvalidTransition {
                    from: ReportStatus::Approved,
                    to: ReportStatus::Reviewed,
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (
                WorkflowError::Store(StoreError::NotFound("r1".into())).into(),
                StatusCode::NOT_FOUND,
            ),
            (StoreError::NotFound("r1".into()).into(), StatusCode::NOT_FOUND),
            (
                WorkflowError::Store(StoreError::Conflict("r1".into())).into(),
                StatusCode::CONFLICT,
            ),
            (StoreError::Read("timeout".into()).into(), StatusCode::BAD_GATEWAY),
            (
                WorkflowError::Store(StoreError::Write("permission denied".into())).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                GeneratorError::Task("panicked".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{}", error);
        }
    }

    #[actix_web::test]
    async fn test_error_body_uses_envelope() {
        let error: ApiError = WorkflowError::InvalidTransition {
            from: ReportStatus::Submitted,
            to: ReportStatus::Approved,
        }
        .into();
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Conflict");
        assert_eq!(json["message"], "cannot move a submitted report to approved");
        assert!(json["timestamp"].is_string());
    }
}
