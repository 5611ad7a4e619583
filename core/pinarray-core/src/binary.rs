///
/// Binary Views and Byte Transforms
///
/// `BinaryData` is a non-owning view over bytes, distinguishing a null view
/// (no source array) from an empty one. `ByteTransform` is the set of targets
/// a byte accessor can be converted into: the borrowed `BinaryData` view or an
/// owned `Vec<i8>` copy.
///

use std::fmt;

/// Borrowed bytes, or null
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BinaryData<'a> {
    data: Option<&'a [u8]>,
}

impl<'a> BinaryData<'a> {
    /// The canonical view of "no data"
    pub const fn null() -> Self {
        Self { data: None }
    }

    pub const fn new(data: &'a [u8]) -> Self {
        Self { data: Some(data) }
    }

    pub fn is_null(&self) -> bool {
        self.data.is_none()
    }

    pub fn len(&self) -> usize {
        self.data.map_or(0, <[u8]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes of the view; empty for a null view
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data.unwrap_or(&[])
    }

    /// Start of the view, or null
    pub fn data(&self) -> *const u8 {
        self.data.map_or(std::ptr::null(), <[u8]>::as_ptr)
    }
}

impl fmt::Debug for BinaryData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data {
            None => f.write_str("BinaryData(null)"),
            Some(bytes) => write!(f, "BinaryData({} bytes)", bytes.len()),
        }
    }
}

/// A representation a byte accessor can be transformed into.
///
/// `bytes` is `None` when the accessor was built from an absent array.
pub trait ByteTransform<'a>: Sized {
    fn from_accessor_bytes(bytes: Option<&'a [i8]>) -> Self;
}

impl<'a> ByteTransform<'a> for BinaryData<'a> {
    fn from_accessor_bytes(bytes: Option<&'a [i8]>) -> Self {
        match bytes {
            None => BinaryData::null(),
            // i8 and u8 share size and alignment
            Some(b) => BinaryData::new(unsafe { std::slice::from_raw_parts(b.as_ptr().cast::<u8>(), b.len()) }),
        }
    }
}

impl ByteTransform<'_> for Vec<i8> {
    fn from_accessor_bytes(bytes: Option<&[i8]>) -> Self {
        bytes.map(<[i8]>::to_vec).unwrap_or_default()
    }
}
