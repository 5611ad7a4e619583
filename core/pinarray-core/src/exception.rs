//!
//! Exception Kinds and Pending-Exception Slot
//!
//! Native code never unwinds into the managed runtime. Instead it records a
//! pending exception and returns; the runtime raises it once control is back
//! on the managed side. Backends with their own mechanism (JNI `ThrowNew`)
//! only use `ExceptionKind`; in-process runtimes use the thread-local slot
//! below.
//!
//! Exception Type IDs:
//! - 0: None
//! - 1: IllegalArgument
//! - 2: IllegalState
//! - 3: UnsupportedOperation
//! - 4: OutOfMemory
//! - 5: Runtime
//! - 6: Fatal
//!

use std::cell::{Cell, RefCell};
use std::fmt;

thread_local! {
    static CURRENT_EXCEPTION_TYPE_ID: Cell<i64> = const { Cell::new(EXCEPTION_TYPE_NONE) };
    static CURRENT_EXCEPTION_MESSAGE: RefCell<Option<String>> = const { RefCell::new(None) };
}

pub const EXCEPTION_TYPE_NONE: i64 = 0;

/// Class of exception raised back into the managed runtime
#[repr(i64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    IllegalArgument = 1,
    IllegalState = 2,
    UnsupportedOperation = 3,
    OutOfMemory = 4,
    Runtime = 5,
    Fatal = 6,
}

impl ExceptionKind {
    pub const ALL: [ExceptionKind; 6] = [
        ExceptionKind::IllegalArgument,
        ExceptionKind::IllegalState,
        ExceptionKind::UnsupportedOperation,
        ExceptionKind::OutOfMemory,
        ExceptionKind::Runtime,
        ExceptionKind::Fatal,
    ];

    pub fn type_id(self) -> i64 {
        self as i64
    }

    pub fn from_type_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            ExceptionKind::IllegalArgument => "IllegalArgument",
            ExceptionKind::IllegalState => "IllegalState",
            ExceptionKind::UnsupportedOperation => "UnsupportedOperation",
            ExceptionKind::OutOfMemory => "OutOfMemory",
            ExceptionKind::Runtime => "Runtime",
            ExceptionKind::Fatal => "Fatal",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An exception taken out of the pending slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingException {
    pub kind: ExceptionKind,
    pub message: String,
}

/// Record a pending exception on the current thread, replacing any previous one
pub fn raise(kind: ExceptionKind, message: &str) {
    CURRENT_EXCEPTION_TYPE_ID.with(|id| id.set(kind.type_id()));
    CURRENT_EXCEPTION_MESSAGE.with(|msg| *msg.borrow_mut() = Some(message.to_string()));
}

/// Check if there's a pending exception
pub fn check() -> bool {
    CURRENT_EXCEPTION_TYPE_ID.with(|id| id.get()) != EXCEPTION_TYPE_NONE
}

/// Kind of the pending exception, if any
pub fn pending_kind() -> Option<ExceptionKind> {
    ExceptionKind::from_type_id(CURRENT_EXCEPTION_TYPE_ID.with(|id| id.get()))
}

/// Remove and return the pending exception (called once the managed side handles it)
pub fn take() -> Option<PendingException> {
    let kind = pending_kind()?;
    let message = CURRENT_EXCEPTION_MESSAGE
        .with(|msg| msg.borrow_mut().take())
        .unwrap_or_default();
    CURRENT_EXCEPTION_TYPE_ID.with(|id| id.set(EXCEPTION_TYPE_NONE));
    Some(PendingException { kind, message })
}

/// Clear the pending exception
pub fn clear() {
    CURRENT_EXCEPTION_TYPE_ID.with(|id| id.set(EXCEPTION_TYPE_NONE));
    CURRENT_EXCEPTION_MESSAGE.with(|msg| *msg.borrow_mut() = None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_and_take() {
        clear();
        assert!(!check());

        raise(ExceptionKind::IllegalArgument, "bad array");
        assert!(check());
        assert_eq!(pending_kind(), Some(ExceptionKind::IllegalArgument));

        let ex = take().expect("exception should be pending");
        assert_eq!(ex.kind, ExceptionKind::IllegalArgument);
        assert_eq!(ex.message, "bad array");
        assert!(!check());
        assert!(take().is_none());
    }

    #[test]
    fn test_raise_replaces_previous() {
        clear();
        raise(ExceptionKind::IllegalState, "first");
        raise(ExceptionKind::OutOfMemory, "second");

        let ex = take().unwrap();
        assert_eq!(ex.kind, ExceptionKind::OutOfMemory);
        assert_eq!(ex.message, "second");
    }

    #[test]
    fn test_pending_is_thread_local() {
        clear();
        raise(ExceptionKind::Runtime, "main thread");

        let other = std::thread::spawn(check).join().unwrap();
        assert!(!other);
        assert!(check());
        clear();
    }

    #[test]
    fn test_type_id_round_trip() {
        for kind in ExceptionKind::ALL {
            assert_eq!(ExceptionKind::from_type_id(kind.type_id()), Some(kind));
        }
        assert_eq!(ExceptionKind::from_type_id(EXCEPTION_TYPE_NONE), None);
        assert_eq!(ExceptionKind::from_type_id(99), None);
    }
}
