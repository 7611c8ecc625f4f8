use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::{ClassFileError, ConstantPool, Result, Utf8Entry};

/// `u2 attribute_name_index` followed by `u4 attribute_length`.
pub const HEADER_LEN: usize = 6;

/// Structural cursor over one `attribute_info` inside a borrowed buffer.
///
/// Only the header is read. The payload stays in the buffer and is handed out as a sub-slice,
/// so a cursor is as cheap to copy as the reference it holds.
#[derive(Clone, Copy)]
pub struct RawAttribute<'a> {
    buf: &'a [u8],
    offset: usize,
    name_index: u16,
    length: u32,
}
impl<'a> RawAttribute<'a> {
    /// Reads the header at `offset`, checking that the declared payload lies inside `buf`.
    pub fn read(buf: &'a [u8], offset: usize) -> Result<Self> {
        let header = offset
            .checked_add(HEADER_LEN)
            .and_then(|end| buf.get(offset..end))
            .ok_or_else(|| {
                ClassFileError::malformed(
                    "attribute",
                    format!("header at offset {} runs past the end of the buffer", offset),
                )
            })?;

        let name_index = BigEndian::read_u16(&header[0..2]);
        let length = BigEndian::read_u32(&header[2..6]);

        let end = (offset + HEADER_LEN).checked_add(length as usize);
        if end.map_or(true, |end| end > buf.len()) {
            return Err(ClassFileError::malformed(
                "attribute",
                format!(
                    "attribute_length {} at offset {} runs past the end of the buffer",
                    length, offset
                ),
            ));
        }

        Ok(Self {
            buf,
            offset,
            name_index,
            length,
        })
    }

    pub fn name_index(&self) -> u16 {
        self.name_index
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset of the first byte after this attribute.
    pub fn end(&self) -> usize {
        self.offset + HEADER_LEN + self.length as usize
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.buf[self.offset + HEADER_LEN..self.end()]
    }

    /// The whole attribute, header included.
    pub fn bytes(&self) -> &'a [u8] {
        &self.buf[self.offset..self.end()]
    }

    /// Resolves the Utf8 index stored at `at` in a payload that must be exactly
    /// `expected_length` bytes long.
    pub(crate) fn utf8_at(
        &self,
        pool: &ConstantPool,
        attribute: &str,
        at: usize,
        expected_length: u32,
    ) -> Result<Utf8Entry> {
        if self.length != expected_length {
            return Err(ClassFileError::malformed(
                attribute,
                format!(
                    "attribute_length is {}, expected {}",
                    self.length, expected_length
                ),
            ));
        }

        let index = self
            .payload()
            .get(at..at + 2)
            .map(BigEndian::read_u16)
            .ok_or_else(|| {
                ClassFileError::malformed(attribute, format!("no u2 at payload offset {}", at))
            })?;

        pool.utf8_entry_at(index)
            .map_err(|e| ClassFileError::malformed(attribute, e.to_string()))
    }
}
impl fmt::Debug for RawAttribute<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawAttribute")
            .field("attribute_name_index", &self.name_index)
            .field("offset", &self.offset)
            .field("info", &format!("({} bytes)", self.length))
            .finish()
    }
}
