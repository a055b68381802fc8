pub mod endpoint;
pub mod planner;
pub mod target;

pub use endpoint::{Endpoint, EndpointRegistry};
pub use planner::{CategoryHint, PlanOptions, Query, QueryPlanner};
pub use target::{Target, TargetKind};
