//!
//! Heap Runtime Environment
//!
//! `HeapEnv` owns every array allocated through it and frees them when it
//! is dropped. Handles (`HeapArrayRef`) are plain ids, so a handle from
//! another heap or a stale id simply fails to resolve.
//!
//! Acquisition strategies:
//! - `Pin`: hand out the backing store itself and count the pin
//! - `Copy`: hand out a fresh copy; release copies it back and/or frees it
//!   according to the release mode, as a copying JVM would
//!
//! Every call is recorded as a `RuntimeCall`, and totals are kept in
//! `PinStats`, so callers can check that acquires and releases balance.
//!

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use pinarray_core::{exception, ExceptionKind, ManagedEnv, ReleaseMode};
use tracing::{debug, error};

use crate::error::HeapError;
use crate::heap::{ElementBuffer, HeapArray, HeapTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquireStrategy {
    #[default]
    Pin,
    Copy,
}

/// Reference to an array owned by a `HeapEnv`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapArrayRef(i64);

impl HeapArrayRef {
    pub fn id(self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PinStats {
    /// Successful acquisitions
    pub acquires: usize,
    /// Release calls, valid or not
    pub releases: usize,
    /// Acquisitions that returned null
    pub denied: usize,
    /// Releases of pointers this heap never handed out
    pub invalid_releases: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    Acquire { tag: HeapTag, array_id: i64 },
    Denied { tag: HeapTag, array_id: i64 },
    Release { tag: HeapTag, array_id: i64, mode: ReleaseMode },
    Throw { kind: ExceptionKind, message: String },
}

pub struct HeapEnv {
    strategy: AcquireStrategy,
    objects: RefCell<HashMap<i64, HeapArray>>,
    // Outstanding copies handed out under `AcquireStrategy::Copy`, keyed by
    // (array id, address). Zero-length copies share a dangling address, so one
    // key can hold several buffers.
    copies: RefCell<HashMap<(i64, usize), Vec<ElementBuffer>>>,
    denied: RefCell<HashSet<i64>>,
    next_id: Cell<i64>,
    stats: Cell<PinStats>,
    calls: RefCell<Vec<RuntimeCall>>,
}

impl Default for HeapEnv {
    fn default() -> Self {
        Self::new(AcquireStrategy::Pin)
    }
}

impl HeapEnv {
    pub fn new(strategy: AcquireStrategy) -> Self {
        Self {
            strategy,
            objects: RefCell::new(HashMap::new()),
            copies: RefCell::new(HashMap::new()),
            denied: RefCell::new(HashSet::new()),
            next_id: Cell::new(0x1000),
            stats: Cell::new(PinStats::default()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn strategy(&self) -> AcquireStrategy {
        self.strategy
    }

    pub fn new_byte_array(&self, values: &[i8]) -> Result<HeapArrayRef, HeapError> {
        self.insert(HeapArray::from_values(HeapTag::ByteArray, values)?)
    }

    pub fn new_boolean_array(&self, values: &[bool]) -> Result<HeapArrayRef, HeapError> {
        let raw: Vec<u8> = values.iter().map(|&b| u8::from(b)).collect();
        self.insert(HeapArray::from_values(HeapTag::BooleanArray, &raw)?)
    }

    pub fn new_long_array(&self, values: &[i64]) -> Result<HeapArrayRef, HeapError> {
        self.insert(HeapArray::from_values(HeapTag::LongArray, values)?)
    }

    fn insert(&self, array: HeapArray) -> Result<HeapArrayRef, HeapError> {
        let id = self.next_id.get();
        self.next_id.set(id + 8);
        debug!(array_id = id, tag = %array.tag(), len = array.len(), "allocated heap array");
        self.objects.borrow_mut().insert(id, array);
        Ok(HeapArrayRef(id))
    }

    /// Make the next acquisition of `array` return null
    pub fn deny_acquire(&self, array: HeapArrayRef) {
        debug!(array_id = array.0, "denying next acquisition");
        self.denied.borrow_mut().insert(array.0);
    }

    pub fn stats(&self) -> PinStats {
        self.stats.get()
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.borrow().clone()
    }

    /// In-place pins currently held on `array`
    pub fn pin_count(&self, array: HeapArrayRef) -> usize {
        self.objects.borrow().get(&array.0).map_or(0, |obj| obj.header.pins)
    }

    /// Pins plus copies that have not been released yet
    pub fn outstanding(&self) -> usize {
        let pins: usize = self.objects.borrow().values().map(|obj| obj.header.pins).sum();
        pins + self.copies.borrow().values().map(Vec::len).sum::<usize>()
    }

    pub fn read_bytes(&self, array: HeapArrayRef) -> Option<Vec<i8>> {
        self.read(array, HeapTag::ByteArray)
    }

    pub fn read_booleans(&self, array: HeapArrayRef) -> Option<Vec<bool>> {
        self.read::<u8>(array, HeapTag::BooleanArray)
            .map(|raw| raw.into_iter().map(|b| b != 0).collect())
    }

    pub fn read_longs(&self, array: HeapArrayRef) -> Option<Vec<i64>> {
        self.read(array, HeapTag::LongArray)
    }

    /// Overwrite one element of a byte array's backing store. Returns false if
    /// `array` is not a byte array of this heap, `index` is out of range, or
    /// the store is pinned. Outstanding copies are unaffected.
    pub fn write_byte(&self, array: HeapArrayRef, index: usize, value: i8) -> bool {
        let mut objects = self.objects.borrow_mut();
        match objects.get_mut(&array.0) {
            Some(obj) if obj.header.pins > 0 => {
                debug!(array_id = array.0, pins = obj.header.pins, "refusing write to pinned array");
                false
            }
            Some(obj) if obj.tag() == HeapTag::ByteArray => {
                match unsafe { obj.as_mut_slice::<i8>() }.get_mut(index) {
                    Some(slot) => {
                        *slot = value;
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    fn read<T: Copy>(&self, array: HeapArrayRef, tag: HeapTag) -> Option<Vec<T>> {
        let objects = self.objects.borrow();
        let obj = objects.get(&array.0).filter(|obj| obj.tag() == tag)?;
        Some(unsafe { obj.as_slice::<T>() }.to_vec())
    }

    fn bump(&self, update: impl FnOnce(&mut PinStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }

    fn acquire(&self, array: HeapArrayRef, tag: HeapTag) -> *mut u8 {
        let mut objects = self.objects.borrow_mut();
        let denied = self.denied.borrow_mut().remove(&array.0);
        let obj = match objects.get_mut(&array.0) {
            Some(obj) if obj.tag() == tag && !denied => obj,
            _ => {
                debug!(array_id = array.0, %tag, "acquisition denied");
                self.bump(|s| s.denied += 1);
                self.calls.borrow_mut().push(RuntimeCall::Denied { tag, array_id: array.0 });
                return std::ptr::null_mut();
            }
        };

        let ptr = match self.strategy {
            AcquireStrategy::Pin => {
                obj.header.pins += 1;
                obj.elements.data.as_ptr()
            }
            AcquireStrategy::Copy => match obj.elements.duplicate() {
                Ok(copy) => {
                    let ptr = copy.data.as_ptr();
                    self.copies.borrow_mut().entry((array.0, ptr as usize)).or_default().push(copy);
                    ptr
                }
                Err(e) => {
                    error!(array_id = array.0, error = %e, "failed to copy array for acquisition");
                    self.bump(|s| s.denied += 1);
                    self.calls.borrow_mut().push(RuntimeCall::Denied { tag, array_id: array.0 });
                    return std::ptr::null_mut();
                }
            },
        };

        self.bump(|s| s.acquires += 1);
        self.calls.borrow_mut().push(RuntimeCall::Acquire { tag, array_id: array.0 });
        ptr
    }

    fn release(&self, array: HeapArrayRef, tag: HeapTag, elems: *mut u8, mode: ReleaseMode) {
        self.bump(|s| s.releases += 1);
        self.calls.borrow_mut().push(RuntimeCall::Release { tag, array_id: array.0, mode });

        let mut objects = self.objects.borrow_mut();
        let Some(obj) = objects.get_mut(&array.0).filter(|obj| obj.tag() == tag) else {
            error!(array_id = array.0, %tag, "release of unknown array");
            self.bump(|s| s.invalid_releases += 1);
            return;
        };

        match self.strategy {
            AcquireStrategy::Pin => {
                // Pinned in place: edits are already visible, only the pin is dropped.
                if obj.elements.data.as_ptr() != elems {
                    error!(array_id = array.0, "release of a pointer this heap never handed out");
                    self.bump(|s| s.invalid_releases += 1);
                } else if obj.header.pins == 0 {
                    error!(array_id = array.0, "release of an array that is not pinned");
                    self.bump(|s| s.invalid_releases += 1);
                } else if mode.frees_buffer() {
                    obj.header.pins -= 1;
                }
            }
            AcquireStrategy::Copy => {
                let key = (array.0, elems as usize);
                let mut copies = self.copies.borrow_mut();
                let Some(copy) = copies.get(&key).and_then(|held| held.last()) else {
                    error!(array_id = array.0, "release of a pointer this heap never handed out");
                    self.bump(|s| s.invalid_releases += 1);
                    return;
                };

                if mode.copies_back() {
                    debug!(array_id = array.0, "copying native edits back");
                    unsafe {
                        std::ptr::copy_nonoverlapping(copy.data.as_ptr(), obj.elements.data.as_ptr(), copy.byte_len());
                    }
                }
                if mode.frees_buffer() {
                    if let Some(held) = copies.get_mut(&key) {
                        held.pop();
                        if held.is_empty() {
                            copies.remove(&key);
                        }
                    }
                }
            }
        }
    }
}

unsafe impl ManagedEnv for HeapEnv {
    type Array = HeapArrayRef;

    fn array_length(&self, array: HeapArrayRef) -> usize {
        self.objects.borrow().get(&array.0).map_or(0, HeapArray::len)
    }

    fn array_identity(&self, array: HeapArrayRef) -> i64 {
        array.0
    }

    fn get_byte_array_elements(&self, array: HeapArrayRef) -> *mut i8 {
        self.acquire(array, HeapTag::ByteArray).cast()
    }

    unsafe fn release_byte_array_elements(&self, array: HeapArrayRef, elems: *mut i8, mode: ReleaseMode) {
        self.release(array, HeapTag::ByteArray, elems.cast(), mode)
    }

    fn get_boolean_array_elements(&self, array: HeapArrayRef) -> *mut u8 {
        self.acquire(array, HeapTag::BooleanArray)
    }

    unsafe fn release_boolean_array_elements(&self, array: HeapArrayRef, elems: *mut u8, mode: ReleaseMode) {
        self.release(array, HeapTag::BooleanArray, elems, mode)
    }

    fn get_long_array_elements(&self, array: HeapArrayRef) -> *mut i64 {
        self.acquire(array, HeapTag::LongArray).cast()
    }

    unsafe fn release_long_array_elements(&self, array: HeapArrayRef, elems: *mut i64, mode: ReleaseMode) {
        self.release(array, HeapTag::LongArray, elems.cast(), mode)
    }

    fn throw_exception(&self, kind: ExceptionKind, message: &str) {
        self.calls.borrow_mut().push(RuntimeCall::Throw { kind, message: message.to_string() });
        exception::raise(kind, message);
    }
}
