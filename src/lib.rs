pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod osint;
pub mod reporting;
pub mod utils;

// Re-export main types for easier access
pub use cli::App;
pub use config::Config;
pub use core::{
    CategoryHint,
    Endpoint,
    EndpointRegistry,
    PlanOptions,
    Query,
    QueryPlanner,
    Target,
    TargetKind
};
pub use engine::{Aggregator, Dispatcher, IdentityRotator, Pipeline};
pub use error::{DorkHuntError, DorkHuntResult};
pub use osint::{Category, ExtractionResult, Extractor};
pub use reporting::{ReportManager, Snapshot, WebhookNotifier};
