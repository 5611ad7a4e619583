///
/// # pinarray-jni - JNI backend for pinarray accessors
///
/// `JniEnv` wraps the raw `JNIEnv*` handed to a native method and implements
/// `ManagedEnv`, so the accessors of `pinarray-core` borrow Java primitive
/// arrays directly:
///
/// ```rust,ignore
/// let classes = ExceptionClasses::default();
/// let env = unsafe { JniEnv::from_raw(raw_env, &classes) };
/// let acc = ByteArrayAccessor::new(&env, unsafe { JniArray::from_nullable(jarray) })?;
/// let bytes: BinaryData = acc.transform();
/// ```
///
/// A failed acquisition throws the configured IllegalArgument class into the
/// JVM before the error is returned; the native method then returns a dummy
/// value and Java observes the exception.
///

pub mod config;
pub mod env;
pub mod natives;

pub use config::{BindingConfig, ConfigError, ExceptionClasses, CONFIG_ENV_VAR};
pub use env::{JniArray, JniEnv};
