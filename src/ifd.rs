//! Endian-aware slice cursor and raw directory-entry access.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::TiffError;
use crate::tags::field_type;

/// Byte order of the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    pub(crate) fn u16_from(self, b: [u8; 2]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(b),
            ByteOrder::BigEndian => u16::from_be_bytes(b),
        }
    }

    pub(crate) fn u32_from(self, b: [u8; 4]) -> u32 {
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(b),
            ByteOrder::BigEndian => u32::from_be_bytes(b),
        }
    }
}

/// Cursor over the container bytes that reads integers in the container's
/// byte order. Out-of-bounds reads are `UnexpectedEof`, never panics.
pub(crate) struct EndianCursor<'a> {
    data: &'a [u8],
    pos: usize,
    pub(crate) order: ByteOrder,
}

impl<'a> EndianCursor<'a> {
    pub(crate) fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self { data, pos: 0, order }
    }

    pub(crate) fn seek(&mut self, pos: usize) -> Result<(), TiffError> {
        if pos > self.data.len() {
            return Err(TiffError::UnexpectedEof);
        }
        self.pos = pos;
        Ok(())
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, TiffError> {
        let b = self.read_array::<2>()?;
        Ok(self.order.u16_from(b))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, TiffError> {
        let b = self.read_array::<4>()?;
        Ok(self.order.u32_from(b))
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), TiffError> {
        let new_pos = self.pos.checked_add(n).ok_or(TiffError::UnexpectedEof)?;
        self.seek(new_pos)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], TiffError> {
        let end = self.pos.checked_add(N).ok_or(TiffError::UnexpectedEof)?;
        let slice = self.data.get(self.pos..end).ok_or(TiffError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice.try_into().expect("slice length equals N"))
    }
}

/// One 12-byte directory entry: `(tag, type, count, value-or-offset)`.
///
/// `value_pos` is the absolute position of the entry's 4 value bytes; whether
/// they hold the value inline or an offset depends on the value's total size.
#[derive(Clone, Copy, Debug)]
pub(crate) struct IfdEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    pub value_pos: usize,
}

impl IfdEntry {
    pub(crate) fn parse(cursor: &mut EndianCursor<'_>) -> Result<Self, TiffError> {
        let tag = cursor.read_u16()?;
        let field_type = cursor.read_u16()?;
        let count = cursor.read_u32()?;
        let value_pos = cursor.position();
        cursor.skip(4)?;
        Ok(Self { tag, field_type, count, value_pos })
    }

    /// The entry's value bytes, resolving the inline-vs-offset split.
    fn value_bytes<'a>(&self, data: &'a [u8], order: ByteOrder) -> Result<&'a [u8], TiffError> {
        let size = field_type::byte_size(self.field_type).ok_or_else(|| {
            TiffError::InvalidDirectory(format!(
                "tag {} has unknown value type {}",
                self.tag, self.field_type
            ))
        })?;
        let total = size
            .checked_mul(self.count as usize)
            .ok_or(TiffError::UnexpectedEof)?;
        let start = if total <= 4 {
            self.value_pos
        } else {
            let raw = data
                .get(self.value_pos..self.value_pos + 4)
                .ok_or(TiffError::UnexpectedEof)?;
            order.u32_from(raw.try_into().expect("4-byte slice")) as usize
        };
        let end = start.checked_add(total).ok_or(TiffError::UnexpectedEof)?;
        data.get(start..end).ok_or(TiffError::UnexpectedEof)
    }

    /// All values widened to `u32`. Accepts SHORT and LONG entries.
    pub(crate) fn read_u32s(&self, data: &[u8], order: ByteOrder) -> Result<Vec<u32>, TiffError> {
        let bytes = self.value_bytes(data, order)?;
        match self.field_type {
            field_type::SHORT => Ok(bytes
                .chunks_exact(2)
                .map(|c| u32::from(order.u16_from([c[0], c[1]])))
                .collect()),
            field_type::LONG => Ok(bytes
                .chunks_exact(4)
                .map(|c| order.u32_from([c[0], c[1], c[2], c[3]]))
                .collect()),
            other => Err(TiffError::InvalidDirectory(format!(
                "tag {} has type {other}, expected SHORT or LONG",
                self.tag
            ))),
        }
    }

    /// First value widened to `u32`.
    pub(crate) fn read_u32_first(&self, data: &[u8], order: ByteOrder) -> Result<u32, TiffError> {
        self.read_u32s(data, order)?
            .first()
            .copied()
            .ok_or_else(|| TiffError::InvalidDirectory(format!("tag {} has no values", self.tag)))
    }

    /// All values of a SHORT entry.
    pub(crate) fn read_u16s(&self, data: &[u8], order: ByteOrder) -> Result<Vec<u16>, TiffError> {
        if self.field_type != field_type::SHORT {
            return Err(TiffError::InvalidDirectory(format!(
                "tag {} has type {}, expected SHORT",
                self.tag, self.field_type
            )));
        }
        let bytes = self.value_bytes(data, order)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|c| order.u16_from([c[0], c[1]]))
            .collect())
    }

    /// An ASCII entry as a string, with the trailing NUL stripped.
    pub(crate) fn read_ascii(&self, data: &[u8], order: ByteOrder) -> Result<String, TiffError> {
        if self.field_type != field_type::ASCII {
            return Err(TiffError::InvalidDirectory(format!(
                "tag {} has type {}, expected ASCII",
                self.tag, self.field_type
            )));
        }
        let bytes = self.value_bytes(data, order)?;
        let trimmed = bytes.split(|&b| b == 0).next().unwrap_or(&[]);
        Ok(String::from_utf8_lossy(trimmed).into_owned())
    }

    /// A BYTE or UNDEFINED entry as owned bytes.
    pub(crate) fn read_raw(&self, data: &[u8], order: ByteOrder) -> Result<Vec<u8>, TiffError> {
        match self.field_type {
            field_type::BYTE | field_type::UNDEFINED => {
                Ok(self.value_bytes(data, order)?.to_vec())
            }
            other => Err(TiffError::InvalidDirectory(format!(
                "tag {} has type {other}, expected BYTE or UNDEFINED",
                self.tag
            ))),
        }
    }

    /// First (numerator, denominator) pair of a RATIONAL entry.
    pub(crate) fn read_rational_first(
        &self,
        data: &[u8],
        order: ByteOrder,
    ) -> Result<(u32, u32), TiffError> {
        if self.field_type != field_type::RATIONAL {
            return Err(TiffError::InvalidDirectory(format!(
                "tag {} has type {}, expected RATIONAL",
                self.tag, self.field_type
            )));
        }
        let bytes = self.value_bytes(data, order)?;
        if bytes.len() < 8 {
            return Err(TiffError::UnexpectedEof);
        }
        let num = order.u32_from([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let den = order.u32_from([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok((num, den))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_honors_byte_order() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut le = EndianCursor::new(&data, ByteOrder::LittleEndian);
        assert_eq!(le.read_u16().unwrap(), 0x0201);
        assert_eq!(le.read_u16().unwrap(), 0x0403);

        let mut be = EndianCursor::new(&data, ByteOrder::BigEndian);
        assert_eq!(be.read_u32().unwrap(), 0x0102_0304);
        assert!(matches!(be.read_u16(), Err(TiffError::UnexpectedEof)));
    }

    #[test]
    fn inline_and_offset_values() {
        // One SHORT value stored inline in the 4 value bytes.
        let data = [0x2A, 0x00, 0x00, 0x00];
        let entry = IfdEntry { tag: 277, field_type: field_type::SHORT, count: 1, value_pos: 0 };
        assert_eq!(entry.read_u32s(&data, ByteOrder::LittleEndian).unwrap(), [42]);

        // Three SHORT values (6 bytes) live behind an offset.
        let mut data = alloc::vec![0u8; 10];
        data[0..4].copy_from_slice(&4u32.to_le_bytes());
        data[4..10].copy_from_slice(&[8, 0, 8, 0, 8, 0]);
        let entry = IfdEntry { tag: 258, field_type: field_type::SHORT, count: 3, value_pos: 0 };
        assert_eq!(
            entry.read_u16s(&data, ByteOrder::LittleEndian).unwrap(),
            [8, 8, 8]
        );
    }

    #[test]
    fn ascii_strips_trailing_nul() {
        let data = *b"ink\0";
        let entry = IfdEntry { tag: 269, field_type: field_type::ASCII, count: 4, value_pos: 0 };
        assert_eq!(entry.read_ascii(&data, ByteOrder::LittleEndian).unwrap(), "ink");
    }
}
