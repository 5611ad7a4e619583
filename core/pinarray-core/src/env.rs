//!
//! Managed Runtime Interface
//!
//! `ManagedEnv` is the surface a managed runtime exposes to native code for
//! borrowing primitive arrays: length queries, typed acquire/release pairs and
//! a way to raise a structured exception back to the managed caller.
//!
//! The acquire/release calls are per element type because runtimes expose them
//! that way (`GetByteArrayElements`, `ReleaseLongArrayElements`, ...). There is
//! no generic "acquire any array" entry point.
//!

use crate::exception::ExceptionKind;

/// What the runtime does with the native buffer on release
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseMode {
    /// Copy native edits back and free the buffer
    CopyBack = 0,
    /// Copy native edits back but keep the buffer
    Commit = 1,
    /// Free the buffer without copying anything back
    Abort = 2,
}

impl ReleaseMode {
    /// Raw value as passed to JNI-style release functions
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn copies_back(self) -> bool {
        matches!(self, ReleaseMode::CopyBack | ReleaseMode::Commit)
    }

    pub fn frees_buffer(self) -> bool {
        matches!(self, ReleaseMode::CopyBack | ReleaseMode::Abort)
    }
}

/// A managed runtime that lends out primitive array storage.
///
/// # Safety
///
/// Implementors guarantee that a non-null pointer returned by one of the
/// `get_*_array_elements` functions points to `array_length(array)` readable,
/// initialized elements of the requested type, and stays valid until the
/// matching `release_*_array_elements` call for that pointer. Until that
/// release the elements must not be mutated by the runtime, since accessors
/// hand out shared slices over them. A null return means acquisition failed
/// and nothing has to be released.
pub unsafe trait ManagedEnv {
    /// Reference to an array owned by the runtime
    type Array: Copy;

    /// Number of elements in `array`
    fn array_length(&self, array: Self::Array) -> usize;

    /// Stable identity of `array`, used in diagnostics
    fn array_identity(&self, array: Self::Array) -> i64;

    fn get_byte_array_elements(&self, array: Self::Array) -> *mut i8;

    /// # Safety
    /// `elems` must come from `get_byte_array_elements(array)` and not be released yet.
    unsafe fn release_byte_array_elements(&self, array: Self::Array, elems: *mut i8, mode: ReleaseMode);

    fn get_boolean_array_elements(&self, array: Self::Array) -> *mut u8;

    /// # Safety
    /// `elems` must come from `get_boolean_array_elements(array)` and not be released yet.
    unsafe fn release_boolean_array_elements(&self, array: Self::Array, elems: *mut u8, mode: ReleaseMode);

    fn get_long_array_elements(&self, array: Self::Array) -> *mut i64;

    /// # Safety
    /// `elems` must come from `get_long_array_elements(array)` and not be released yet.
    unsafe fn release_long_array_elements(&self, array: Self::Array, elems: *mut i64, mode: ReleaseMode);

    /// Raise an exception observable by the managed caller once native code returns
    fn throw_exception(&self, kind: ExceptionKind, message: &str);
}
