//! Command implementations.

pub mod ingest;
pub mod load;
pub mod run;
pub mod scripts;
pub mod serve;
pub mod transform;
pub mod validate;

use stageline::ErrorKind;

/// How a command finished when it did not return an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    ValidationFailed,
    /// A pipeline stage failed with an error of this kind.
    StageFailed(ErrorKind),
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::ValidationFailed => 2,
            Status::StageFailed(kind) => error_exit_code(kind),
        }
    }
}

/// Exit code for a classified error.
pub fn error_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Input => 3,
        ErrorKind::Config => 4,
        ErrorKind::Transform => 5,
        ErrorKind::Other => 1,
    }
}
