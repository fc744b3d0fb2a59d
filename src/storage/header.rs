//! Store Header
//!
//! Fixed 28-byte preamble of every record store file.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, ShelfError};

/// Magic bytes identifying a shelfkv record store file
pub(crate) const MAGIC: &[u8; 4] = b"SHKV";

/// Current store format version
pub(crate) const VERSION: u32 = 1;

/// Header size: Magic (4) + Version (4) + SlotSize (4) + InfoLen (4)
/// + SlotCount (4) + FreeHead (4) + CRC (4) = 28 bytes
pub(crate) const HEADER_SIZE: usize = 28;

/// Bytes covered by the header checksum (everything before the CRC)
const CRC_COVERED: usize = HEADER_SIZE - 4;

/// Width of a metadata integer and of a free-list link
pub(crate) const WORD_SIZE: usize = 4;

/// Decoded store header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StoreHeader {
    /// Bytes per record slot
    pub slot_size: u32,
    /// Number of metadata integers following the header
    pub info_len: u32,
    /// High-water mark: slots ever allocated
    pub slot_count: u32,
    /// First free slot, 0 when the free list is empty
    pub free_head: u32,
}

impl StoreHeader {
    /// Header for a freshly created store
    pub fn new(slot_size: u32, info_len: u32) -> Self {
        Self {
            slot_size,
            info_len,
            slot_count: 0,
            free_head: 0,
        }
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        buf.put_slice(MAGIC);
        buf.put_u32_le(VERSION);
        buf.put_u32_le(self.slot_size);
        buf.put_u32_le(self.info_len);
        buf.put_u32_le(self.slot_count);
        buf.put_u32_le(self.free_head);

        let crc = crc32fast::hash(&buf[..CRC_COVERED]);
        buf.put_u32_le(crc);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ShelfError::Format(format!(
                "Header too short: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        if &bytes[0..4] != MAGIC {
            return Err(ShelfError::Format(format!(
                "Invalid store magic: expected SHKV, got {:?}",
                &bytes[0..4]
            )));
        }

        let mut buf = &bytes[4..HEADER_SIZE];
        let version = buf.get_u32_le();
        if version != VERSION {
            return Err(ShelfError::Format(format!(
                "Unsupported store version: {}",
                version
            )));
        }

        let header = Self {
            slot_size: buf.get_u32_le(),
            info_len: buf.get_u32_le(),
            slot_count: buf.get_u32_le(),
            free_head: buf.get_u32_le(),
        };

        let stored_crc = buf.get_u32_le();
        let actual_crc = crc32fast::hash(&bytes[..CRC_COVERED]);
        if stored_crc != actual_crc {
            return Err(ShelfError::Corruption(format!(
                "Header checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored_crc, actual_crc
            )));
        }

        if header.free_head > header.slot_count {
            return Err(ShelfError::Corruption(format!(
                "Free list head {} beyond slot count {}",
                header.free_head, header.slot_count
            )));
        }

        Ok(header)
    }

    /// Check that an existing file matches the layout the caller expects
    pub fn validate(&self, slot_size: usize, info_len: usize) -> Result<()> {
        if self.slot_size as usize != slot_size {
            return Err(ShelfError::Format(format!(
                "Slot size mismatch: file has {} bytes, record needs {}",
                self.slot_size, slot_size
            )));
        }
        if self.info_len as usize != info_len {
            return Err(ShelfError::Format(format!(
                "Info length mismatch: file has {}, caller expects {}",
                self.info_len, info_len
            )));
        }
        Ok(())
    }

    /// Byte offset where slot 1 begins
    pub fn data_offset(&self) -> u64 {
        (HEADER_SIZE + WORD_SIZE * self.info_len as usize) as u64
    }
}
