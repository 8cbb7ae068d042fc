//! PDF export flow.
//!
//! Every export is an `ExportJob` owning its own progress log, timers and
//! document handle. Jobs live in the `ExportRegistry` until the viewer is
//! closed or they sit idle past the configured timeout.

pub mod handlers;
pub mod timers;

pub use timers::ProgressTimers;

use actix_web::web::Bytes;
use moka::future::Cache;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::ExportTimings;
use crate::document::{GeneratedDocument, GeneratorError, SharedGenerator};
use crate::report::Report;
use crate::store::{ReportStore, StoreError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Report not found: {0}")]
    NotFound(String),
    #[error("Failed to fetch report data: {0}")]
    Fetch(#[source] StoreError),
    #[error("Error during PDF generation: {0}")]
    Generation(#[from] GeneratorError),
}

impl From<StoreError> for ExportError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ExportError::NotFound(id),
            other => ExportError::Fetch(other),
        }
    }
}

impl ExportError {
    /// Diagnostic detail shown under the message in the viewer.
    pub fn detail(&self) -> String {
        let mut detail = format!("{:?}", self);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            detail.push_str(&format!("\ncaused by: {}", cause));
            source = cause.source();
        }
        detail
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportState {
    Initializing,
    Fetching,
    Generating,
    Ready,
    Error { message: String, detail: String },
}

impl ExportState {
    pub fn name(&self) -> &'static str {
        match self {
            ExportState::Initializing => "initializing",
            ExportState::Fetching => "fetching",
            ExportState::Generating => "generating",
            ExportState::Ready => "ready",
            ExportState::Error { .. } => "error",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, ExportState::Ready | ExportState::Error { .. })
    }
}

/// Visible progress lines of one export.
pub struct ProgressLog {
    export_id: Uuid,
    lines: Mutex<Vec<String>>,
}

impl ProgressLog {
    fn new(export_id: Uuid) -> Self {
        Self {
            export_id,
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, message: impl Into<String>) {
        let message = message.into();
        log::info!("PDF export {}: {}", self.export_id, message);
        self.lines.lock().push(format!("• {}", message));
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn latest(&self) -> Option<String> {
        self.lines.lock().last().cloned()
    }
}

/// A generated document exposed to the viewer. Released when dropped, which
/// ownership makes happen exactly once.
pub struct DocumentHandle {
    export_id: Uuid,
    filename: String,
    pdf: Bytes,
    releases: Arc<AtomicUsize>,
}

impl DocumentHandle {
    fn new(export_id: Uuid, document: GeneratedDocument, releases: Arc<AtomicUsize>) -> Self {
        Self {
            export_id,
            filename: document.filename,
            pdf: Bytes::from(document.pdf),
            releases,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn pdf(&self) -> Bytes {
        self.pdf.clone()
    }
}

impl Drop for DocumentHandle {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        log::info!("PDF document of export {} released", self.export_id);
    }
}

pub struct ExportJob {
    pub id: Uuid,
    pub report_id: String,
    state: Mutex<ExportState>,
    log: Arc<ProgressLog>,
    document: Mutex<Option<DocumentHandle>>,
    closed: AtomicBool,
    active_timers: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

/// Serializable view of a job for the viewer and the status endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExportSnapshot {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub report_id: String,
    pub state: String,
    pub message: Option<String>,
    pub detail: Option<String>,
    pub log: Vec<String>,
    pub document_ready: bool,
}

impl ExportJob {
    pub fn new(report_id: impl Into<String>, releases: Arc<AtomicUsize>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            report_id: report_id.into(),
            state: Mutex::new(ExportState::Initializing),
            log: Arc::new(ProgressLog::new(id)),
            document: Mutex::new(None),
            closed: AtomicBool::new(false),
            active_timers: Arc::new(AtomicUsize::new(0)),
            releases,
        }
    }

    pub fn state(&self) -> ExportState {
        self.state.lock().clone()
    }

    fn set_state(&self, state: ExportState) {
        log::debug!("PDF export {} -> {}", self.id, state.name());
        *self.state.lock() = state;
    }

    pub fn progress(&self, message: impl Into<String>) {
        self.log.push(message);
    }

    pub fn progress_lines(&self) -> Vec<String> {
        self.log.lines()
    }

    /// Number of this job's timer tasks still running.
    pub fn active_timers(&self) -> usize {
        self.active_timers.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Run `f` against the document while the viewer is open.
    pub fn with_document<T>(&self, f: impl FnOnce(&DocumentHandle) -> T) -> Option<T> {
        self.document.lock().as_ref().map(f)
    }

    fn attach_document(&self, document: GeneratedDocument) {
        let handle = DocumentHandle::new(self.id, document, self.releases.clone());
        if self.is_closed() {
            log::info!("Viewer of export {} closed before the document was ready", self.id);
            drop(handle);
            return;
        }
        *self.document.lock() = Some(handle);
    }

    /// Close the display surface. Returns whether a document was released.
    pub fn release_document(&self) -> bool {
        self.closed.store(true, Ordering::SeqCst);
        let handle = self.document.lock().take();
        handle.is_some()
    }

    pub fn snapshot(&self) -> ExportSnapshot {
        let state = self.state();
        let (message, detail) = match &state {
            ExportState::Error { message, detail } => (Some(message.clone()), Some(detail.clone())),
            _ => (self.log.latest(), None),
        };

        ExportSnapshot {
            id: self.id,
            report_id: self.report_id.clone(),
            state: state.name().to_string(),
            message,
            detail,
            log: self.progress_lines(),
            document_ready: self.document.lock().is_some(),
        }
    }
}

/// Drive one export from fetch to a viewable document.
pub async fn run_export(
    job: &ExportJob,
    store: &dyn ReportStore,
    generator: SharedGenerator,
    timings: &ExportTimings,
) -> Result<(), ExportError> {
    job.progress("Initializing PDF generation...");
    let mut timers = ProgressTimers::new(job.log.clone(), job.active_timers.clone());
    timers.arm_watchdog(timings.watchdog);

    let outcome = produce_document(job, store, generator, &mut timers, timings).await;
    timers.cancel();

    match outcome {
        Ok(document) => {
            job.attach_document(document);
            job.set_state(ExportState::Ready);
            Ok(())
        }
        Err(err) => {
            log::error!("PDF export {} for report {} failed: {}", job.id, job.report_id, err);
            job.set_state(ExportState::Error {
                message: err.to_string(),
                detail: err.detail(),
            });
            Err(err)
        }
    }
}

async fn produce_document(
    job: &ExportJob,
    store: &dyn ReportStore,
    generator: SharedGenerator,
    timers: &mut ProgressTimers,
    timings: &ExportTimings,
) -> Result<GeneratedDocument, ExportError> {
    job.set_state(ExportState::Fetching);
    job.progress("Fetching report data...");

    let report = match store.get_by_id(&job.report_id).await {
        Ok(report) => report,
        Err(err) => {
            job.progress(format!("Error: no report data received ({})", err));
            return Err(err.into());
        }
    };
    narrate_report(job, &report);

    job.set_state(ExportState::Generating);
    job.progress("Creating PDF document structure...");

    let started = Instant::now();
    timers.start_narrator(timings.narrator, started);

    let generated = tokio::task::spawn_blocking(move || generator.generate(&report))
        .await
        .map_err(|e| GeneratorError::Task(e.to_string()))
        .and_then(|result| result);
    timers.cancel();

    match generated {
        Ok(document) => {
            job.progress(format!(
                "PDF generation completed in {:.2} seconds. Loading document...",
                started.elapsed().as_secs_f64()
            ));
            Ok(document)
        }
        Err(err) => {
            job.progress(format!("Error during PDF generation: {}", err));
            Err(err.into())
        }
    }
}

fn narrate_report(job: &ExportJob, report: &Report) {
    job.progress(format!("Report data received for {}", report.display_name()));

    if report.floors.is_empty() {
        job.progress("Warning: No floors data found in report");
        return;
    }

    job.progress(format!("Found {} floors with data", report.floors.len()));
    for floor in &report.floors {
        job.progress(format!(
            "Floor \"{}\": {} components",
            floor.name,
            floor.component_count()
        ));
    }
    job.progress(format!(
        "Total components to process: {}",
        report.total_components()
    ));
}

pub struct ExportRegistry {
    jobs: Cache<Uuid, Arc<ExportJob>>,
    releases: Arc<AtomicUsize>,
    timings: ExportTimings,
}

impl ExportRegistry {
    pub fn new(timings: ExportTimings) -> Self {
        let jobs = Cache::builder()
            .time_to_idle(timings.idle)
            .max_capacity(256)
            .build();

        Self {
            jobs,
            releases: Arc::new(AtomicUsize::new(0)),
            timings,
        }
    }

    /// Register a new job and run it in the background.
    pub async fn start(
        &self,
        report_id: &str,
        store: Arc<dyn ReportStore>,
        generator: SharedGenerator,
    ) -> Arc<ExportJob> {
        let job = Arc::new(ExportJob::new(report_id, self.releases.clone()));
        self.jobs.insert(job.id, job.clone()).await;
        log::info!("PDF export {} started for report {}", job.id, report_id);

        let task_job = job.clone();
        let timings = self.timings;
        tokio::spawn(async move {
            let _ = run_export(&task_job, store.as_ref(), generator, &timings).await;
        });

        job
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<ExportJob>> {
        self.jobs.get(id).await
    }

    /// Close the viewer of an export. True only for the first close.
    pub async fn close(&self, id: &Uuid) -> bool {
        match self.jobs.remove(id).await {
            Some(job) => {
                if !job.release_document() {
                    log::debug!("Export {} closed without a document", id);
                }
                true
            }
            None => {
                log::debug!("Export {} already closed", id);
                false
            }
        }
    }

    /// Document handles released so far.
    pub fn released_documents(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}
