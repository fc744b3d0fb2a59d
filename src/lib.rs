//! # shelfkv
//!
//! A disk-resident ordered multimap with:
//! - Fixed-size record slots with on-disk free-list reuse
//! - A doubly-linked chain of bounded blocks that splits and merges itself
//! - Equality lookup and ordered full scans, no in-memory index
//! - Reopen-and-continue persistence from a single file per index
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Callers / Command dispatch                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ insert / erase / query / scan
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       BlockIndex                            │
//! │          (chain walk, split on full, merge on thin)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ write / read(_at) / update(_at) / free
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      RecordStore                            │
//! │        (header, info bank, fixed slots, free list)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ offset-addressed I/O
//!                       ▼
//!                  single store file
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use shelfkv::BlockIndex;
//!
//! # fn main() -> shelfkv::Result<()> {
//! let mut index: BlockIndex<u32, u32> = BlockIndex::open_path("books.idx".as_ref())?;
//! index.insert(114514, 6)?;
//! index.insert(114514, 1)?;
//! assert_eq!(index.query(&114514)?, vec![1, 6]);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod storage;
pub mod index;
pub mod command;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ShelfError, Result};
pub use config::{Config, SyncStrategy};
pub use record::{FixedStr, Pair, Record};
pub use storage::RecordStore;
pub use index::{BlockIndex, ChainStats, DEFAULT_CAPACITY};
pub use command::{Command, Outcome};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of shelfkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
