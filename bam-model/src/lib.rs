//! Shared data model for the reconciliation pipeline (C1, §3): row
//! schemas, the planner's `Operation`/`DeferredReference`, the remote
//! `RemoteEntity` shape, `Checkpoint`, and `ExecutionResult`.

pub mod checkpoint;
pub mod entity;
pub mod envelope;
pub mod object_type;
pub mod operation;
pub mod result;
pub mod row;
pub mod rows;
pub mod validation;

pub use checkpoint::{Checkpoint, CheckpointStatus};
pub use entity::{IdentityField, RemoteEntity};
pub use envelope::{RowAction, RowEnvelope, UnknownAction};
pub use object_type::{ObjectType, UnknownObjectType};
pub use operation::{DeferredReference, Operation, OperationType};
pub use result::ExecutionResult;
pub use row::{Row, RowKind};
pub use rows::{RowFields, RowPayload};
pub use validation::ValidationError;
