///
/// Accessor error types.
///
/// Acquisition is the only fallible step. An absent array is a valid empty
/// accessor, and release cannot fail.
///

use thiserror::Error;

use crate::env::ManagedEnv;
use crate::exception::ExceptionKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("{operation} failed on {array_id}.")]
    AcquireFailed {
        operation: &'static str,
        array_id: i64,
    },
}

impl AccessError {
    /// Exception class this error is raised as in the managed runtime
    pub fn exception_kind(&self) -> ExceptionKind {
        match self {
            AccessError::AcquireFailed { .. } => ExceptionKind::IllegalArgument,
        }
    }
}

/// Raise `err` into the managed runtime through `env`
pub fn throw_access_error<E: ManagedEnv + ?Sized>(env: &E, err: &AccessError) {
    env.throw_exception(err.exception_kind(), &err.to_string());
}
