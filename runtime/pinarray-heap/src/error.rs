///
/// Heap allocation errors.
///

use thiserror::Error;

use crate::heap::HeapTag;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
    #[error("{tag} array of {len} elements exceeds the addressable size")]
    TooLarge { tag: HeapTag, len: usize },

    #[error("Failed to allocate {bytes} bytes for {tag} array")]
    OutOfMemory { tag: HeapTag, bytes: usize },
}
