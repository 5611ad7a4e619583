///
/// pinarray-heap - In-Process Managed Heap
///
/// A managed runtime living in the same process as the native code that
/// borrows from it. `HeapEnv` owns byte, boolean and long arrays and
/// implements `ManagedEnv`, so the accessors of `pinarray-core` can borrow
/// them exactly as they would borrow JVM arrays.
///
/// ## Library Usage
///
/// ```rust
/// use pinarray_core::ByteArrayAccessor;
/// use pinarray_heap::HeapEnv;
///
/// let env = HeapEnv::default();
/// let array = env.new_byte_array(&[1, 2, 3]).unwrap();
/// {
///     let acc = ByteArrayAccessor::new(&env, Some(array)).unwrap();
///     assert_eq!(acc.size(), 3);
/// }
/// assert_eq!(env.stats().releases, 1);
/// ```
///

pub mod env;
pub mod error;
pub mod heap;

pub use env::{AcquireStrategy, HeapArrayRef, HeapEnv, PinStats, RuntimeCall};
pub use error::HeapError;
pub use heap::HeapTag;
