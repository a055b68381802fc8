mod aggregator;
mod dispatcher;
mod identity;
mod pipeline;
mod task;

pub use aggregator::Aggregator;
pub use dispatcher::Dispatcher;
pub use identity::{HeaderSet, IdentityRotator};
pub use pipeline::Pipeline;
pub use task::{build_tasks, FailureReason, Task, TaskOutcome, TaskStatus};
