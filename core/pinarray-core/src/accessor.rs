//!
//! Scoped Array Accessor
//!
//! `ArrayAccessor` borrows the storage of one managed array for the duration
//! of a native scope:
//!
//! - `new` queries the length and acquires the elements. An absent array gives
//!   an empty accessor without touching the runtime. A failed acquisition
//!   raises an IllegalArgument exception through the runtime and returns `Err`,
//!   so no half-built accessor is ever observable.
//! - `Drop` releases the elements exactly once with the kind's `RELEASE_MODE`.
//!   It runs on every exit path, including `?` returns and panics. Moving an
//!   accessor moves the obligation along with it.
//!
//! Accessors are `!Send` and `!Sync` since pins are tied to the thread that
//! took them. Copy data out with `transform::<Vec<i8>>()` to cross threads.
//!

use std::fmt;
use std::marker::PhantomData;
use std::ops::Index;
use std::ptr::NonNull;

use tracing::{trace, warn};

use crate::binary::ByteTransform;
use crate::env::{ManagedEnv, ReleaseMode};
use crate::error::{throw_access_error, AccessError};
use crate::kind::{Boolean, Byte, ElementKind, Long};

pub type ByteArrayAccessor<'env, E> = ArrayAccessor<'env, E, Byte>;
pub type BooleanArrayAccessor<'env, E> = ArrayAccessor<'env, E, Boolean>;
pub type LongArrayAccessor<'env, E> = ArrayAccessor<'env, E, Long>;

pub struct ArrayAccessor<'env, E: ManagedEnv + ?Sized, K: ElementKind> {
    env: &'env E,
    // Present iff the source array was present and acquisition succeeded
    pinned: Option<(E::Array, NonNull<K::Element>)>,
    len: usize,
    release_mode: ReleaseMode,
    _thread_affine: PhantomData<*const ()>,
}

impl<'env, E: ManagedEnv + ?Sized, K: ElementKind> ArrayAccessor<'env, E, K> {
    /// Borrow the elements of `array`, or build an empty accessor for `None`.
    pub fn new(env: &'env E, array: Option<E::Array>) -> Result<Self, AccessError> {
        let Some(array) = array else {
            return Ok(Self {
                env,
                pinned: None,
                len: 0,
                release_mode: K::RELEASE_MODE,
                _thread_affine: PhantomData,
            });
        };

        let len = env.array_length(array);
        let Some(data) = NonNull::new(K::acquire(env, array)) else {
            let err = AccessError::AcquireFailed {
                operation: K::ACQUIRE_OPERATION,
                array_id: env.array_identity(array),
            };
            warn!(kind = K::NAME, error = %err, "array acquisition failed");
            throw_access_error(env, &err);
            return Err(err);
        };

        trace!(kind = K::NAME, array_id = env.array_identity(array), len, "acquired array elements");
        Ok(Self {
            env,
            pinned: Some((array, data)),
            len,
            release_mode: K::RELEASE_MODE,
            _thread_affine: PhantomData,
        })
    }

    /// Number of elements; 0 for an absent array
    #[inline]
    pub fn size(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when built from an absent array
    #[inline]
    pub fn is_null(&self) -> bool {
        self.pinned.is_none()
    }

    /// Start of the borrowed elements, or null for an absent array.
    ///
    /// The pointer is only valid while this accessor is alive.
    #[inline]
    pub fn data(&self) -> *const K::Element {
        self.pinned.map_or(std::ptr::null(), |(_, data)| data.as_ptr().cast_const())
    }

    pub fn release_mode(&self) -> ReleaseMode {
        self.release_mode
    }

    #[inline]
    pub fn as_slice(&self) -> &[K::Element] {
        match self.pinned {
            // SAFETY: ManagedEnv guarantees `len` initialized elements until release,
            // and release only happens in drop.
            Some((_, data)) => unsafe { std::slice::from_raw_parts(data.as_ptr().cast_const(), self.len) },
            None => &[],
        }
    }

    /// Element at `index`, or `None` when out of range
    #[inline]
    pub fn get(&self, index: usize) -> Option<K::Element> {
        self.as_slice().get(index).copied()
    }

    /// Element at `index` without a bounds check.
    ///
    /// # Safety
    /// `index < self.size()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> K::Element {
        unsafe { *self.data().add(index) }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, K::Element> {
        self.as_slice().iter()
    }

    fn source_slice(&self) -> Option<&[K::Element]> {
        self.pinned.map(|_| self.as_slice())
    }
}

impl<E: ManagedEnv + ?Sized> ArrayAccessor<'_, E, Byte> {
    /// Convert the borrowed bytes into `T`.
    ///
    /// `BinaryData` aliases the borrowed buffer and cannot outlive `self`;
    /// `Vec<i8>` is an independent copy.
    pub fn transform<'a, T: ByteTransform<'a>>(&'a self) -> T {
        T::from_accessor_bytes(self.source_slice())
    }
}

impl<E: ManagedEnv + ?Sized> ArrayAccessor<'_, E, Boolean> {
    pub fn get_bool(&self, index: usize) -> Option<bool> {
        self.get(index).map(|b| b != 0)
    }
}

impl<E: ManagedEnv + ?Sized, K: ElementKind> Drop for ArrayAccessor<'_, E, K> {
    fn drop(&mut self) {
        if let Some((array, data)) = self.pinned.take() {
            trace!(kind = K::NAME, array_id = self.env.array_identity(array), "releasing array elements");
            unsafe { K::release(self.env, array, data.as_ptr(), self.release_mode) }
        }
    }
}

impl<E: ManagedEnv + ?Sized, K: ElementKind> Index<usize> for ArrayAccessor<'_, E, K> {
    type Output = K::Element;

    #[inline]
    fn index(&self, index: usize) -> &K::Element {
        &self.as_slice()[index]
    }
}

impl<'a, E: ManagedEnv + ?Sized, K: ElementKind> IntoIterator for &'a ArrayAccessor<'_, E, K> {
    type Item = &'a K::Element;
    type IntoIter = std::slice::Iter<'a, K::Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<E: ManagedEnv + ?Sized, K: ElementKind> fmt::Debug for ArrayAccessor<'_, E, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayAccessor")
            .field("kind", &K::NAME)
            .field("len", &self.len)
            .field("null", &self.is_null())
            .field("release_mode", &self.release_mode)
            .finish()
    }
}
