pub mod model;
mod mod_tests;
pub mod workflow;

pub use model::{Floor, Report, ReportStatus, UnknownStatus};
pub use workflow::{advance_status, WorkflowError};
