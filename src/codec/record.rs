//! Record encoding and decoding

use std::io::{ErrorKind, Read};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, SegKvError};

/// Fixed bytes per record: TotalLen (4) + KeyLen (4) + ValueLen (4)
pub const HEADER_SIZE: usize = 12;

/// A key-value pair as it is written to and read back from a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Size of the record `Entry { key, value }` encodes to
pub fn encoded_len(key: &[u8], value: &[u8]) -> usize {
    HEADER_SIZE + key.len() + value.len()
}

impl Entry {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Size of this entry once encoded
    pub fn encoded_len(&self) -> usize {
        encoded_len(&self.key, &self.value)
    }

    /// Encode to a single record
    ///
    /// Fails only when the record would not fit a u32 length header.
    pub fn encode(&self) -> Result<Bytes> {
        let total = self.encoded_len();
        let total_u32 = u32::try_from(total).map_err(|_| {
            SegKvError::MalformedRecord(format!(
                "record of {} bytes exceeds the u32 length header",
                total
            ))
        })?;

        let mut buf = BytesMut::with_capacity(total);
        buf.put_u32_le(total_u32);
        buf.put_u32_le(self.key.len() as u32);
        buf.put_slice(&self.key);
        buf.put_u32_le(self.value.len() as u32);
        buf.put_slice(&self.value);

        Ok(buf.freeze())
    }

    /// Decode exactly one record occupying the whole of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(SegKvError::MalformedRecord(format!(
                "buffer of {} bytes is smaller than the {}-byte header",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let mut buf = bytes;
        let total = buf.get_u32_le() as usize;
        if total != bytes.len() {
            return Err(SegKvError::MalformedRecord(format!(
                "declared length {} does not match buffer of {} bytes",
                total,
                bytes.len()
            )));
        }

        let key_len = buf.get_u32_le() as usize;
        // Key plus the value length field must still fit
        if key_len > buf.remaining().saturating_sub(4) {
            return Err(SegKvError::MalformedRecord(format!(
                "key length {} runs past end of record",
                key_len
            )));
        }
        let key = buf[..key_len].to_vec();
        buf.advance(key_len);

        let value_len = buf.get_u32_le() as usize;
        if value_len != buf.remaining() {
            return Err(SegKvError::MalformedRecord(format!(
                "value length {} does not match the {} bytes left in record",
                value_len,
                buf.remaining()
            )));
        }
        let value = buf.to_vec();

        Ok(Self { key, value })
    }
}

/// Read exactly one record from a forward-only stream
///
/// Returns:
/// - `Ok(Some((entry, consumed)))` — one record, `consumed` bytes read
/// - `Ok(None)` — the stream ended cleanly on a record boundary
/// - `Err(TruncatedRecord)` — the stream ended inside a record
/// - `Err(MalformedRecord)` — the header lengths are inconsistent
pub fn decode_from_stream<R: Read>(reader: &mut R) -> Result<Option<(Entry, usize)>> {
    let mut len_buf = [0u8; 4];
    let got = read_full(reader, &mut len_buf)?;
    if got == 0 {
        return Ok(None);
    }
    if got < len_buf.len() {
        return Err(SegKvError::TruncatedRecord {
            expected: len_buf.len(),
            got,
        });
    }

    let total = u32::from_le_bytes(len_buf) as usize;
    if total < HEADER_SIZE {
        return Err(SegKvError::MalformedRecord(format!(
            "declared length {} is smaller than the {}-byte header",
            total, HEADER_SIZE
        )));
    }

    // read_to_end grows the buffer as bytes arrive, so a garbage length
    // cannot force a huge allocation up front
    let mut record = Vec::with_capacity(total.min(64 * 1024));
    record.extend_from_slice(&len_buf);
    let body_len = (total - len_buf.len()) as u64;
    reader.by_ref().take(body_len).read_to_end(&mut record)?;

    if record.len() < total {
        return Err(SegKvError::TruncatedRecord {
            expected: total,
            got: record.len(),
        });
    }

    let entry = Entry::decode(&record)?;
    Ok(Some((entry, total)))
}

/// Fill `buf` from `reader`, stopping early only at end of stream
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
