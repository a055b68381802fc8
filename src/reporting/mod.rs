mod archive;
mod generator;
mod model;
mod notify;
pub mod formats;

pub use archive::HtmlArchive;
pub use generator::{ReportManager, sanitize_filename};
pub use model::{EngineTally, RunInfo, Snapshot};
pub use notify::{WebhookNotifier, format_messages};
pub use formats::{ReportFormat, ReportGenerator};
