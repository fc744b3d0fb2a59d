//! Index Module
//!
//! Ordered multimap stored as a doubly-linked chain of blocks.
//!
//! ## Structure
//! ```text
//!  info[1] = first block
//!      │
//!      ▼
//! ┌──────────────┐ next ┌──────────────┐ next ┌──────────────┐
//! │ Block @1     │─────▶│ Block @3     │─────▶│ Block @2     │──▶ 0
//! │ (1,2)..(1,9) │◀─────│ (1,11)..(4,0)│◀─────│ (5,1)..(8,8) │
//! └──────────────┘ prev └──────────────┘ prev └──────────────┘
//! ```
//!
//! - Pairs are ordered by (key, value) inside and across blocks
//! - A block reaching capacity splits in half
//! - After an erase, a block merges with a neighbour if both fit
//! - Cached min/max per block let walks skip blocks by header alone

mod block;
mod block_index;
mod iterator;

pub use block_index::{BlockIndex, ChainStats, DEFAULT_CAPACITY};
pub use iterator::ChainIter;
