//! Shared helpers for the integration suites.
#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::web;
use chrono::{TimeZone, Utc};
use kony_admin_server::auth::{generate_session_token, Identity, StaticIdentity, SESSION_COOKIE};
use kony_admin_server::config::{AdminCredentials, ExportTimings};
use kony_admin_server::document::{
    GeneratedDocument, Generator, GeneratorError, ReportSheet, SharedGenerator,
};
use kony_admin_server::report::{Report, ReportStatus};
use kony_admin_server::store::{MemoryReportStore, ReportStore};
use kony_admin_server::AppState;
use std::sync::Arc;
use std::time::Duration;

pub const ADMIN_EMAIL: &str = "admin@kony.local";
pub const ADMIN_PASSWORD: &str = "correct-horse";

/// Lays the sheet out as plain text behind a PDF header. Stands in for the
/// Typst CLI, which test machines do not have.
pub struct TextGenerator {
    pub delay: Duration,
}

impl Generator<Report> for TextGenerator {
    fn generate(&self, report: &Report) -> Result<GeneratedDocument, GeneratorError> {
        std::thread::sleep(self.delay);
        let sheet = ReportSheet::from_report(report);
        let mut pdf = b"%PDF-1.7\n".to_vec();
        for line in &sheet.lines {
            pdf.extend_from_slice(format!("{}: {}\n", line.label, line.value).as_bytes());
        }
        Ok(GeneratedDocument {
            filename: format!("rapport-{}.pdf", report.id),
            pdf,
        })
    }
}

pub fn text_generator(delay_ms: u64) -> SharedGenerator {
    Arc::new(TextGenerator {
        delay: Duration::from_millis(delay_ms),
    })
}

pub fn fast_timings() -> ExportTimings {
    ExportTimings {
        watchdog: Duration::from_secs(5),
        narrator: Duration::from_millis(100),
        idle: Duration::from_secs(60),
    }
}

pub fn report(id: &str, status: ReportStatus, client: &str, submitted_day: Option<u32>) -> Report {
    Report {
        id: id.to_string(),
        client_name: Some(client.to_string()),
        location: Some("Lyon".to_string()),
        date: Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()),
        technician_name: Some("Karim B.".to_string()),
        project_manager: None,
        status,
        submitted_at: submitted_day.map(|d| Utc.with_ymd_and_hms(2025, 3, d, 18, 0, 0).unwrap()),
        floors: Vec::new(),
    }
}

pub fn app_state_with(store: Arc<MemoryReportStore>, generator: SharedGenerator) -> web::Data<AppState> {
    let store: Arc<dyn ReportStore> = store;
    let identity = Arc::new(StaticIdentity::new(AdminCredentials {
        email: ADMIN_EMAIL.to_string(),
        password: ADMIN_PASSWORD.to_string(),
    }));
    web::Data::new(AppState::new_with_parts(
        store,
        generator,
        identity,
        fast_timings(),
    ))
}

pub fn app_state(store: Arc<MemoryReportStore>) -> web::Data<AppState> {
    app_state_with(store, text_generator(0))
}

pub fn session_token() -> String {
    generate_session_token(&Identity {
        uid: "test-admin".to_string(),
        email: ADMIN_EMAIL.to_string(),
    })
    .expect("Failed to generate session token")
}

pub fn session_cookie() -> Cookie<'static> {
    Cookie::new(SESSION_COOKIE, session_token())
}

pub fn bearer() -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", session_token()))
}

pub fn location<B>(response: &actix_web::dev::ServiceResponse<B>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
