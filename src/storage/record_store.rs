//! Record Store
//!
//! Offset-addressed file of fixed-size record slots with slot reuse.
//!
//! ## Responsibilities
//! - Allocate 1-based positions, reusing freed slots before growing the file
//! - Read/update whole records or a byte sub-range of one
//! - Keep a small bank of caller-defined metadata integers ("info")
//! - Persist the slot count and free-list head so reopening resumes exactly

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::config::{Config, SyncStrategy};
use crate::error::{Result, ShelfError};
use crate::record::{self, Record};

use super::header::{StoreHeader, HEADER_SIZE, WORD_SIZE};

/// A file of `T`-sized slots addressed by stable 1-based positions
///
/// Freed slots form a LIFO free list threaded through their first four
/// bytes. Position 0 is never handed out; callers use it as "null".
///
/// All methods take `&mut self` because every access seeks the shared file
/// handle.
pub struct RecordStore<T: Record> {
    /// Backing file path (for diagnostics)
    path: PathBuf,

    /// Backing file handle
    file: File,

    /// In-memory copy of the on-disk header, written through on change
    header: StoreHeader,

    /// When to fsync
    sync_strategy: SyncStrategy,

    /// Mutating calls since the last fsync
    writes_since_sync: usize,

    _record: PhantomData<T>,
}

impl<T: Record> RecordStore<T> {
    /// Open or create a store file
    ///
    /// On open:
    /// 1. Reject record types too small to hold a free-list link
    /// 2. Create the file (and parent directory) if missing and allowed
    /// 3. Empty file → write a fresh header and zeroed info bank
    /// 4. Existing file → decode and validate the header
    pub fn open(path: &Path, info_len: usize, config: &Config) -> Result<Self> {
        if T::SIZE < WORD_SIZE {
            return Err(ShelfError::Config(format!(
                "Record size {} is smaller than a {}-byte free-list link",
                T::SIZE,
                WORD_SIZE
            )));
        }

        if !path.exists() {
            if !config.create_if_missing {
                return Err(ShelfError::StoreNotFound(path.to_path_buf()));
            }
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let header = if file.metadata()?.len() == 0 {
            let header = StoreHeader::new(T::SIZE as u32, info_len as u32);
            file.write_all(&header.encode())?;
            file.write_all(&vec![0u8; WORD_SIZE * info_len])?;
            file.sync_all()?;

            tracing::info!(
                path = %path.display(),
                slot_size = T::SIZE,
                info_len,
                "Created record store"
            );
            header
        } else {
            let mut raw = [0u8; HEADER_SIZE];
            file.read_exact(&mut raw)?;
            let header = StoreHeader::decode(&raw)?;
            header.validate(T::SIZE, info_len)?;

            tracing::info!(
                path = %path.display(),
                slot_count = header.slot_count,
                free_head = header.free_head,
                "Opened record store"
            );
            header
        };

        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            sync_strategy: config.sync_strategy,
            writes_since_sync: 0,
            _record: PhantomData,
        })
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Read the n-th metadata integer (1-based)
    ///
    /// Out-of-range `n` reads as 0.
    pub fn get_info(&mut self, n: usize) -> Result<u32> {
        if n == 0 || n > self.info_len() {
            return Ok(0);
        }

        let mut word = [0u8; WORD_SIZE];
        self.file.seek(SeekFrom::Start(Self::info_offset(n)))?;
        self.file.read_exact(&mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    /// Write the n-th metadata integer (1-based)
    ///
    /// Out-of-range `n` is ignored.
    pub fn write_info(&mut self, n: usize, value: u32) -> Result<()> {
        if n == 0 || n > self.info_len() {
            return Ok(());
        }

        self.file.seek(SeekFrom::Start(Self::info_offset(n)))?;
        self.file.write_all(&value.to_le_bytes())?;
        self.after_write()
    }

    // =========================================================================
    // Slot Operations
    // =========================================================================

    /// Store `value` in a new slot and return its position
    ///
    /// Pops the free list when possible, otherwise appends.
    pub fn write(&mut self, value: &T) -> Result<u32> {
        let mut buf = vec![0u8; T::SIZE];
        record::encode_into(value, &mut buf)?;

        let mut header = self.header;
        let position = if header.free_head != 0 {
            let position = header.free_head;
            let next_free = self.read_link(position)?;
            tracing::debug!(position, next_free, "Reusing free slot");
            header.free_head = next_free;
            position
        } else {
            header.slot_count = header.slot_count.checked_add(1).ok_or_else(|| {
                ShelfError::Storage(format!("{} is out of slots", self.path.display()))
            })?;
            header.slot_count
        };

        // Payload first, so the header never references unwritten data
        self.write_bytes(position, 0, &buf)?;
        self.header = header;
        self.persist_header()?;
        self.after_write()?;

        Ok(position)
    }

    /// Read the record at `position`
    pub fn read(&mut self, position: u32) -> Result<T> {
        let buf = self.read_raw(position, 0, T::SIZE)?;
        record::decode(&buf)
    }

    /// Read a field of type `F` stored `offset` bytes into the record
    pub fn read_at<F: Record>(&mut self, position: u32, offset: usize) -> Result<F> {
        Self::check_range(offset, F::SIZE)?;
        let buf = self.read_raw(position, offset, F::SIZE)?;
        record::decode(&buf)
    }

    /// Overwrite the record at `position`
    pub fn update(&mut self, value: &T, position: u32) -> Result<()> {
        let mut buf = vec![0u8; T::SIZE];
        record::encode_into(value, &mut buf)?;
        self.write_raw(position, 0, &buf)?;
        self.after_write()
    }

    /// Overwrite a field of type `F` stored `offset` bytes into the record
    pub fn update_at<F: Record>(&mut self, field: &F, position: u32, offset: usize) -> Result<()> {
        Self::check_range(offset, F::SIZE)?;
        let mut buf = vec![0u8; F::SIZE];
        record::encode_into(field, &mut buf)?;
        self.write_raw(position, offset, &buf)?;
        self.after_write()
    }

    /// Return the slot at `position` to the free list
    ///
    /// The slot's first four bytes are overwritten with the link; reading
    /// a freed position afterwards yields garbage.
    pub fn free(&mut self, position: u32) -> Result<()> {
        let link = self.header.free_head.to_le_bytes();
        self.write_raw(position, 0, &link)?;

        self.header.free_head = position;
        self.persist_header()?;
        self.after_write()
    }

    // =========================================================================
    // Durability
    // =========================================================================

    /// Flush and fsync the backing file
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        self.writes_since_sync = 0;
        Ok(())
    }

    /// Sync and close the store
    pub fn close(mut self) -> Result<()> {
        self.sync()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Slots ever allocated (live + free)
    pub fn slot_count(&self) -> u32 {
        self.header.slot_count
    }

    /// Head of the free list, 0 when empty
    pub fn free_head(&self) -> u32 {
        self.header.free_head
    }

    /// Number of metadata integers
    pub fn info_len(&self) -> usize {
        self.header.info_len as usize
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Walk the free list and count its slots
    pub fn free_slots(&mut self) -> Result<usize> {
        let mut count = 0usize;
        let mut position = self.header.free_head;

        while position != 0 {
            count += 1;
            if count > self.header.slot_count as usize {
                return Err(ShelfError::Corruption(format!(
                    "Free list in {} is longer than the {} allocated slots",
                    self.path.display(),
                    self.header.slot_count
                )));
            }
            position = self.read_link(position)?;
        }

        Ok(count)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Byte offset of the n-th (1-based) metadata integer
    fn info_offset(n: usize) -> u64 {
        (HEADER_SIZE + WORD_SIZE * (n - 1)) as u64
    }

    /// Byte offset of `offset` bytes into the slot at `position`
    fn slot_offset(&self, position: u32, offset: usize) -> u64 {
        self.header.data_offset()
            + T::SIZE as u64 * (position as u64 - 1)
            + offset as u64
    }

    fn check_position(&self, position: u32) -> Result<()> {
        if position == 0 || position > self.header.slot_count {
            return Err(ShelfError::InvalidPosition(position));
        }
        Ok(())
    }

    fn check_range(offset: usize, len: usize) -> Result<()> {
        if offset.checked_add(len).map_or(true, |end| end > T::SIZE) {
            return Err(ShelfError::Storage(format!(
                "Field of {} bytes at offset {} overruns {}-byte record",
                len,
                offset,
                T::SIZE
            )));
        }
        Ok(())
    }

    fn read_raw(&mut self, position: u32, offset: usize, len: usize) -> Result<Vec<u8>> {
        self.check_position(position)?;
        let mut buf = vec![0u8; len];
        self.file.seek(SeekFrom::Start(self.slot_offset(position, offset)))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_raw(&mut self, position: u32, offset: usize, bytes: &[u8]) -> Result<()> {
        self.check_position(position)?;
        self.write_bytes(position, offset, bytes)
    }

    /// Unchecked slot write, also used for a slot about to be allocated
    fn write_bytes(&mut self, position: u32, offset: usize, bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(self.slot_offset(position, offset)))?;
        self.file.write_all(bytes)?;
        Ok(())
    }

    /// Next-free link stored in a freed slot
    fn read_link(&mut self, position: u32) -> Result<u32> {
        let buf = self.read_raw(position, 0, WORD_SIZE)?;
        let link = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if link > self.header.slot_count {
            return Err(ShelfError::Corruption(format!(
                "Free slot {} links to {} beyond slot count {}",
                position, link, self.header.slot_count
            )));
        }
        Ok(link)
    }

    fn persist_header(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&self.header.encode())?;
        Ok(())
    }

    fn after_write(&mut self) -> Result<()> {
        match self.sync_strategy {
            SyncStrategy::Never => {}
            SyncStrategy::EveryWrite => self.sync()?,
            SyncStrategy::EveryNWrites { count } => {
                self.writes_since_sync += 1;
                if self.writes_since_sync >= count {
                    self.sync()?;
                }
            }
        }
        Ok(())
    }
}
