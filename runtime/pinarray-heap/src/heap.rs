//!
//! Heap Array Storage
//!
//! Heap arrays are a header plus a separately allocated element buffer.
//! Elements are stored at their native width (1 byte for byte and boolean
//! arrays, 8 bytes for long arrays), 8-byte aligned. Zero-length arrays get
//! a dangling, aligned, non-null buffer so that pinning them still yields a
//! usable pointer.
//!

use std::alloc::{alloc, dealloc, Layout};
use std::fmt;
use std::ptr::NonNull;

use crate::error::HeapError;

const ELEMENT_ALIGN: usize = 8;

/// Type tags for heap arrays
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapTag {
    ByteArray = 0,
    BooleanArray = 1,
    LongArray = 2,
}

impl HeapTag {
    pub fn element_size(self) -> usize {
        match self {
            HeapTag::ByteArray | HeapTag::BooleanArray => 1,
            HeapTag::LongArray => 8,
        }
    }
}

impl fmt::Display for HeapTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeapTag::ByteArray => "byte[]",
            HeapTag::BooleanArray => "boolean[]",
            HeapTag::LongArray => "long[]",
        })
    }
}

/// Header for all heap arrays
#[derive(Debug)]
pub struct HeapHeader {
    pub tag: HeapTag,
    /// Number of outstanding in-place pins
    pub pins: usize,
}

impl HeapHeader {
    pub fn new(tag: HeapTag) -> Self {
        Self { tag, pins: 0 }
    }
}

/// A raw element buffer of a given tag and length
#[derive(Debug)]
pub struct ElementBuffer {
    pub tag: HeapTag,
    pub len: usize,
    pub data: NonNull<u8>,
}

impl ElementBuffer {
    pub fn alloc(tag: HeapTag, len: usize) -> Result<Self, HeapError> {
        let layout = Self::layout(tag, len)?;
        if layout.size() == 0 {
            return Ok(Self { tag, len, data: NonNull::<u64>::dangling().cast() });
        }

        let ptr = unsafe { alloc(layout) };
        let data = NonNull::new(ptr).ok_or(HeapError::OutOfMemory { tag, bytes: layout.size() })?;
        Ok(Self { tag, len, data })
    }

    /// Allocate a buffer holding a copy of `self`
    pub fn duplicate(&self) -> Result<Self, HeapError> {
        let copy = Self::alloc(self.tag, self.len)?;
        unsafe {
            std::ptr::copy_nonoverlapping(self.data.as_ptr(), copy.data.as_ptr(), self.byte_len());
        }
        Ok(copy)
    }

    pub fn byte_len(&self) -> usize {
        self.len * self.tag.element_size()
    }

    fn layout(tag: HeapTag, len: usize) -> Result<Layout, HeapError> {
        len.checked_mul(tag.element_size())
            .and_then(|bytes| Layout::from_size_align(bytes, ELEMENT_ALIGN).ok())
            .ok_or(HeapError::TooLarge { tag, len })
    }
}

impl Drop for ElementBuffer {
    fn drop(&mut self) {
        // The layout was validated on allocation.
        if let Ok(layout) = Self::layout(self.tag, self.len) {
            if layout.size() > 0 {
                unsafe { dealloc(self.data.as_ptr(), layout) }
            }
        }
    }
}

/// A heap-allocated primitive array
#[derive(Debug)]
pub struct HeapArray {
    pub header: HeapHeader,
    pub elements: ElementBuffer,
}

impl HeapArray {
    /// Allocate an array holding the raw bytes of `values`
    pub fn from_values<T: Copy>(tag: HeapTag, values: &[T]) -> Result<Self, HeapError> {
        debug_assert_eq!(std::mem::size_of::<T>(), tag.element_size());
        let elements = ElementBuffer::alloc(tag, values.len())?;
        unsafe {
            std::ptr::copy_nonoverlapping(values.as_ptr(), elements.data.as_ptr().cast::<T>(), values.len());
        }
        Ok(Self { header: HeapHeader::new(tag), elements })
    }

    pub fn len(&self) -> usize {
        self.elements.len
    }

    pub fn is_empty(&self) -> bool {
        self.elements.len == 0
    }

    pub fn tag(&self) -> HeapTag {
        self.header.tag
    }

    /// # Safety
    /// `T` must match the element width of this array's tag.
    pub unsafe fn as_slice<T: Copy>(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.elements.data.as_ptr().cast::<T>(), self.len()) }
    }

    /// # Safety
    /// `T` must match the element width of this array's tag.
    pub unsafe fn as_mut_slice<T: Copy>(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.elements.data.as_ptr().cast::<T>(), self.len()) }
    }
}
