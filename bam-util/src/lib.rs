//! Miscellaneous utilities shared by every crate in the reconciliation
//! pipeline: redaction, cooperative cancellation, value normalization, the
//! CSV whitespace sanitizer, and small math helpers used by the client's
//! retry policy and the adaptive throttle.

pub mod math;
pub mod normalize;
pub mod path;
pub mod redacted;
pub mod sanitize;
pub mod shutdown;

pub use path::CanonicalPath;
pub use redacted::RedactedString;
pub use shutdown::{shutdown_channel, ShutdownReceiver, ShutdownSender};
