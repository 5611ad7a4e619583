//!
//! Element Kinds
//!
//! The closed set of array element types an accessor can borrow. Each kind
//! binds one acquire/release pair of `ManagedEnv` and declares the release
//! policy used when its accessors are dropped.
//!
//! `RELEASE_MODE` is the commit-or-discard configuration point. Every kind
//! here is read-only and uses `ReleaseMode::Abort`: the runtime frees or
//! unpins the buffer without copying anything back.
//!

use crate::env::{ManagedEnv, ReleaseMode};

mod sealed {
    pub trait Sealed {}
}

pub trait ElementKind: sealed::Sealed + 'static {
    type Element: Copy;

    /// Short name used in log output
    const NAME: &'static str;

    /// Runtime operation named in acquisition failures
    const ACQUIRE_OPERATION: &'static str;

    const RELEASE_MODE: ReleaseMode;

    fn acquire<E: ManagedEnv + ?Sized>(env: &E, array: E::Array) -> *mut Self::Element;

    /// # Safety
    /// `elems` must be a live pointer returned by `acquire` for the same array.
    unsafe fn release<E: ManagedEnv + ?Sized>(
        env: &E,
        array: E::Array,
        elems: *mut Self::Element,
        mode: ReleaseMode,
    );
}

/// Signed 8-bit elements (`jbyte`)
#[derive(Debug)]
pub enum Byte {}

/// 8-bit boolean elements (`jboolean`, nonzero is true)
#[derive(Debug)]
pub enum Boolean {}

/// Signed 64-bit elements (`jlong`)
#[derive(Debug)]
pub enum Long {}

impl sealed::Sealed for Byte {}
impl sealed::Sealed for Boolean {}
impl sealed::Sealed for Long {}

impl ElementKind for Byte {
    type Element = i8;
    const NAME: &'static str = "byte";
    const ACQUIRE_OPERATION: &'static str = "GetByteArrayElements";
    const RELEASE_MODE: ReleaseMode = ReleaseMode::Abort;

    #[inline]
    fn acquire<E: ManagedEnv + ?Sized>(env: &E, array: E::Array) -> *mut i8 {
        env.get_byte_array_elements(array)
    }

    #[inline]
    unsafe fn release<E: ManagedEnv + ?Sized>(env: &E, array: E::Array, elems: *mut i8, mode: ReleaseMode) {
        unsafe { env.release_byte_array_elements(array, elems, mode) }
    }
}

impl ElementKind for Boolean {
    type Element = u8;
    const NAME: &'static str = "boolean";
    const ACQUIRE_OPERATION: &'static str = "GetBooleanArrayElements";
    const RELEASE_MODE: ReleaseMode = ReleaseMode::Abort;

    #[inline]
    fn acquire<E: ManagedEnv + ?Sized>(env: &E, array: E::Array) -> *mut u8 {
        env.get_boolean_array_elements(array)
    }

    #[inline]
    unsafe fn release<E: ManagedEnv + ?Sized>(env: &E, array: E::Array, elems: *mut u8, mode: ReleaseMode) {
        unsafe { env.release_boolean_array_elements(array, elems, mode) }
    }
}

impl ElementKind for Long {
    type Element = i64;
    const NAME: &'static str = "long";
    const ACQUIRE_OPERATION: &'static str = "GetLongArrayElements";
    const RELEASE_MODE: ReleaseMode = ReleaseMode::Abort;

    #[inline]
    fn acquire<E: ManagedEnv + ?Sized>(env: &E, array: E::Array) -> *mut i64 {
        env.get_long_array_elements(array)
    }

    #[inline]
    unsafe fn release<E: ManagedEnv + ?Sized>(env: &E, array: E::Array, elems: *mut i64, mode: ReleaseMode) {
        unsafe { env.release_long_array_elements(array, elems, mode) }
    }
}
