//!
//! pinarray-core - Scoped Managed-Array Accessors
//!
//! This crate provides the pieces shared by every runtime backend:
//!
//! - `ManagedEnv` for the length/acquire/release/throw calls a managed runtime exposes
//! - `ArrayAccessor` with the `Byte`, `Boolean` and `Long` element kinds
//! - `ReleaseMode` for the commit-or-discard policy applied on release
//! - `BinaryData` and the `ByteTransform` targets of a byte accessor
//! - Exception kinds and the thread-local pending-exception slot
//!
//! An accessor pins its array on construction and releases it exactly once
//! when dropped, on every exit path including `?` and panics.
//!

pub mod accessor;
pub mod binary;
pub mod env;
pub mod error;
pub mod exception;
pub mod kind;

pub use accessor::*;
pub use binary::*;
pub use env::*;
pub use error::*;
pub use exception::{ExceptionKind, PendingException};
pub use kind::*;
