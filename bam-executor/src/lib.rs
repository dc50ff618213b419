//! Operation execution (C8-C11): dispatches a planned operation list
//! against the remote server behind the adaptive throttle, checkpoints
//! progress, records a changelog, and can turn that changelog back into a
//! rollback plan.

mod changelog;
mod checkpoint;
mod executor;
mod registry;
mod rollback;

pub use changelog::{read_all as read_changelog, ChangelogEntry, ChangelogWriter};
pub use checkpoint::Checkpointer;
pub use executor::{Executor, ExecutorConfig, ExecutorOutcome, FailurePolicy};
pub use registry::{ConflictResolution, HandlerRegistry, UpdateIdiom};
pub use rollback::generate as generate_rollback;
