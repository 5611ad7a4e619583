///
/// Native Methods of `io.pinarray.NativeArrays`
///
/// ```java
/// public final class NativeArrays {
///     static native long byteChecksum(byte[] data);
///     static native int countTrue(boolean[] flags);
///     static native long sumLongs(long[] values);
///     static native byte[] copyBytes(byte[] data);
/// }
/// ```
///
/// A `null` argument is read as an empty array, so `copyBytes(null)` returns
/// an empty `byte[]`. When acquisition fails the
/// exception has already been thrown into the JVM and the return value is a
/// placeholder Java never sees.
///

use std::path::Path;
use std::sync::LazyLock;

use jni::sys::{jbooleanArray, jbyteArray, jclass, jint, jlong, jlongArray, jsize, JNIEnv};
use pinarray_core::{BinaryData, BooleanArrayAccessor, ByteArrayAccessor, ExceptionKind, LongArrayAccessor, ManagedEnv};
use tracing::warn;

use crate::config::{BindingConfig, ExceptionClasses, CONFIG_ENV_VAR};
use crate::env::{JniArray, JniEnv};

static EXCEPTION_CLASSES: LazyLock<ExceptionClasses> = LazyLock::new(load_exception_classes);

fn load_exception_classes() -> ExceptionClasses {
    let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
        return ExceptionClasses::default();
    };
    match BindingConfig::from_path(Path::new(&path)) {
        Ok(config) => config.exceptions,
        Err(e) => {
            warn!(error = %e, "falling back to default exception classes");
            ExceptionClasses::default()
        }
    }
}

/// Wrapping sum of the bytes, each read as unsigned
pub fn byte_checksum(data: BinaryData<'_>) -> i64 {
    data.as_bytes().iter().fold(0i64, |acc, &b| acc.wrapping_add(i64::from(b)))
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "system" fn Java_io_pinarray_NativeArrays_byteChecksum(
    raw: *mut JNIEnv,
    _class: jclass,
    data: jbyteArray,
) -> jlong {
    let env = unsafe { JniEnv::from_raw(raw, &EXCEPTION_CLASSES) };
    match ByteArrayAccessor::new(&env, unsafe { JniArray::from_nullable(data) }) {
        Ok(acc) => byte_checksum(acc.transform()),
        Err(_) => 0,
    }
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "system" fn Java_io_pinarray_NativeArrays_countTrue(
    raw: *mut JNIEnv,
    _class: jclass,
    flags: jbooleanArray,
) -> jint {
    let env = unsafe { JniEnv::from_raw(raw, &EXCEPTION_CLASSES) };
    match BooleanArrayAccessor::new(&env, unsafe { JniArray::from_nullable(flags) }) {
        Ok(acc) => acc.iter().filter(|&&b| b != 0).count() as jint,
        Err(_) => 0,
    }
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "system" fn Java_io_pinarray_NativeArrays_sumLongs(
    raw: *mut JNIEnv,
    _class: jclass,
    values: jlongArray,
) -> jlong {
    let env = unsafe { JniEnv::from_raw(raw, &EXCEPTION_CLASSES) };
    match LongArrayAccessor::new(&env, unsafe { JniArray::from_nullable(values) }) {
        Ok(acc) => acc.iter().fold(0i64, |sum, &v| sum.wrapping_add(v)),
        Err(_) => 0,
    }
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "system" fn Java_io_pinarray_NativeArrays_copyBytes(
    raw: *mut JNIEnv,
    _class: jclass,
    data: jbyteArray,
) -> jbyteArray {
    let env = unsafe { JniEnv::from_raw(raw, &EXCEPTION_CLASSES) };

    // The source is released before the result array is allocated.
    let copy: Vec<i8> = match ByteArrayAccessor::new(&env, unsafe { JniArray::from_nullable(data) }) {
        Ok(acc) => acc.transform(),
        Err(_) => return std::ptr::null_mut(),
    };
    unsafe { new_byte_array(&env, &copy) }
}

unsafe fn new_byte_array(env: &JniEnv<'_>, bytes: &[i8]) -> jbyteArray {
    let raw = env.as_raw();
    let Ok(len) = jsize::try_from(bytes.len()) else {
        env.throw_exception(ExceptionKind::OutOfMemory, "byte array too large for the JVM");
        return std::ptr::null_mut();
    };

    unsafe {
        let (Some(new_array), Some(set_region)) = ((**raw).NewByteArray, (**raw).SetByteArrayRegion) else {
            return std::ptr::null_mut();
        };
        let array = new_array(raw, len);
        if !array.is_null() {
            set_region(raw, array, 0, len, bytes.as_ptr());
        }
        array
    }
}
