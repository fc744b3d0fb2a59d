//! Storage Module
//!
//! Record-oriented file abstraction underlying every index.
//!
//! ## Responsibilities
//! - Fixed-size slots addressed by stable 1-based positions
//! - Slot reuse through an on-disk free list
//! - A small bank of caller-defined metadata integers
//! - Partial (byte-offset) reads and writes of a single record
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Header (28 bytes)                                          │
//! │ ┌─────────┬─────────┬──────────┬─────────┬────────────┐    │
//! │ │Magic (4)│Version 4│SlotSize 4│InfoLen 4│SlotCount 4 │    │
//! │ └─────────┴─────────┴──────────┴─────────┴────────────┘    │
//! │ ┌────────────┬────────┐                                    │
//! │ │FreeHead (4)│ CRC (4)│                                    │
//! │ └────────────┴────────┘                                    │
//! ├────────────────────────────────────────────────────────────┤
//! │ Info bank: InfoLen × u32                                   │
//! ├────────────────────────────────────────────────────────────┤
//! │ Slot 1 │ Slot 2 │ ... │ Slot SlotCount   (SlotSize each)   │
//! │ (a free slot holds the next free position in bytes 0..4)   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Position `p` starts at `28 + 4 * InfoLen + SlotSize * (p - 1)`.
//!
//! The 28-byte header is an extension of the plain "info integers, then
//! slots" layout: magic, version and CRC let a reopen reject foreign or
//! damaged files, and slot size / info length catch a caller opening the
//! file with the wrong record type.

mod header;
mod record_store;

pub use record_store::RecordStore;
