//!
//! JNI Runtime Environment
//!
//! Calls go straight through the JNI function table. A missing table entry
//! is treated like a failed call: acquisition returns null, length is 0,
//! and throwing is skipped.
//!

use std::ffi::CString;
use std::ptr;

use jni::sys::{jarray, jsize, JNIEnv, JNI_FALSE};
use pinarray_core::{ExceptionKind, ManagedEnv, ReleaseMode};
use tracing::{error, warn};

use crate::config::ExceptionClasses;

macro_rules! jni_fn {
    ($raw:expr, $name:ident) => {
        unsafe { (**$raw).$name }
    };
}

/// A non-null local or global reference to a Java primitive array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JniArray(jarray);

impl JniArray {
    /// # Safety
    /// `array` must be a valid, non-null reference to a Java primitive array
    /// for as long as the wrapper is used.
    pub unsafe fn from_raw(array: jarray) -> Self {
        debug_assert!(!array.is_null());
        Self(array)
    }

    /// Wrap `array`, mapping Java `null` to `None`.
    ///
    /// # Safety
    /// A non-null `array` must be a valid reference to a Java primitive array.
    pub unsafe fn from_nullable(array: jarray) -> Option<Self> {
        if array.is_null() { None } else { Some(Self(array)) }
    }

    pub fn as_raw(self) -> jarray {
        self.0
    }
}

/// `ManagedEnv` over the `JNIEnv*` of the current native call
pub struct JniEnv<'c> {
    raw: *mut JNIEnv,
    classes: &'c ExceptionClasses,
}

impl<'c> JniEnv<'c> {
    /// # Safety
    /// `raw` must be the valid `JNIEnv*` of the current thread, and the
    /// returned value must not outlive the native call it was passed to.
    pub unsafe fn from_raw(raw: *mut JNIEnv, classes: &'c ExceptionClasses) -> Self {
        Self { raw, classes }
    }

    pub fn as_raw(&self) -> *mut JNIEnv {
        self.raw
    }

    pub fn exception_pending(&self) -> bool {
        match jni_fn!(self.raw, ExceptionCheck) {
            Some(check) => unsafe { check(self.raw) != JNI_FALSE },
            None => false,
        }
    }
}

unsafe impl ManagedEnv for JniEnv<'_> {
    type Array = JniArray;

    fn array_length(&self, array: JniArray) -> usize {
        let len: jsize = match jni_fn!(self.raw, GetArrayLength) {
            Some(get_len) => unsafe { get_len(self.raw, array.0) },
            None => 0,
        };
        usize::try_from(len).unwrap_or(0)
    }

    fn array_identity(&self, array: JniArray) -> i64 {
        array.0 as usize as i64
    }

    fn get_byte_array_elements(&self, array: JniArray) -> *mut i8 {
        match jni_fn!(self.raw, GetByteArrayElements) {
            Some(get) => unsafe { get(self.raw, array.0, ptr::null_mut()) },
            None => ptr::null_mut(),
        }
    }

    unsafe fn release_byte_array_elements(&self, array: JniArray, elems: *mut i8, mode: ReleaseMode) {
        if let Some(release) = jni_fn!(self.raw, ReleaseByteArrayElements) {
            unsafe { release(self.raw, array.0, elems, mode.as_raw()) }
        }
    }

    fn get_boolean_array_elements(&self, array: JniArray) -> *mut u8 {
        match jni_fn!(self.raw, GetBooleanArrayElements) {
            Some(get) => unsafe { get(self.raw, array.0, ptr::null_mut()) },
            None => ptr::null_mut(),
        }
    }

    unsafe fn release_boolean_array_elements(&self, array: JniArray, elems: *mut u8, mode: ReleaseMode) {
        if let Some(release) = jni_fn!(self.raw, ReleaseBooleanArrayElements) {
            unsafe { release(self.raw, array.0, elems, mode.as_raw()) }
        }
    }

    fn get_long_array_elements(&self, array: JniArray) -> *mut i64 {
        match jni_fn!(self.raw, GetLongArrayElements) {
            Some(get) => unsafe { get(self.raw, array.0, ptr::null_mut()) },
            None => ptr::null_mut(),
        }
    }

    unsafe fn release_long_array_elements(&self, array: JniArray, elems: *mut i64, mode: ReleaseMode) {
        if let Some(release) = jni_fn!(self.raw, ReleaseLongArrayElements) {
            unsafe { release(self.raw, array.0, elems, mode.as_raw()) }
        }
    }

    fn throw_exception(&self, kind: ExceptionKind, message: &str) {
        // The first exception raised in a native call is the one Java sees.
        if self.exception_pending() {
            warn!(%kind, msg = message, "exception already pending, not throwing");
            return;
        }

        let class_name = self.classes.class_for(kind);
        let (Ok(c_class), Ok(c_message)) = (CString::new(class_name), CString::new(message.replace('\0', " ")))
        else {
            error!(%kind, class_name, "exception class name contains a NUL byte");
            return;
        };

        let (Some(find_class), Some(throw_new)) = (jni_fn!(self.raw, FindClass), jni_fn!(self.raw, ThrowNew)) else {
            error!(%kind, "JNI function table lacks FindClass/ThrowNew");
            return;
        };
        let delete_local_ref = jni_fn!(self.raw, DeleteLocalRef);

        unsafe {
            let class = find_class(self.raw, c_class.as_ptr());
            if class.is_null() {
                // FindClass left a NoClassDefFoundError pending.
                error!(%kind, class_name, "exception class not found");
                return;
            }
            if throw_new(self.raw, class, c_message.as_ptr()) != 0 {
                error!(%kind, class_name, "ThrowNew failed");
            }
            if let Some(delete) = delete_local_ref {
                delete(self.raw, class);
            }
        }
    }
}
