//! Tests for RecordStore
//!
//! These tests verify:
//! - Slot allocation, read, update and free
//! - Free-list reuse (LIFO) and persistence across reopen
//! - Metadata ("info") integers, including out-of-range access
//! - Partial (byte-offset) field access
//! - Header validation on reopen

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shelfkv::{Config, Pair, RecordStore, ShelfError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("records.dat");
    (temp_dir, path)
}

fn open_u64(path: &Path) -> RecordStore<u64> {
    RecordStore::open(path, 2, &Config::default()).unwrap()
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_file_with_empty_header() {
    let (_temp, path) = setup_temp_store();

    let mut store = open_u64(&path);

    assert!(path.exists());
    assert_eq!(store.slot_count(), 0);
    assert_eq!(store.free_head(), 0);
    assert_eq!(store.info_len(), 2);
    assert_eq!(store.get_info(1).unwrap(), 0);
    assert_eq!(store.get_info(2).unwrap(), 0);
    assert_eq!(store.free_slots().unwrap(), 0);
    // 28-byte header + two info words
    assert_eq!(fs::metadata(&path).unwrap().len(), 36);
}

#[test]
fn test_open_creates_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("records.dat");

    let _store = open_u64(&path);

    assert!(path.exists());
}

#[test]
fn test_open_missing_without_create_fails() {
    let (_temp, path) = setup_temp_store();
    let config = Config::builder().create_if_missing(false).build();

    let result = RecordStore::<u64>::open(&path, 2, &config);

    assert!(matches!(result, Err(ShelfError::StoreNotFound(p)) if p == path));
    assert!(!path.exists());
}

#[test]
fn test_record_smaller_than_link_rejected() {
    let (_temp, path) = setup_temp_store();

    let result = RecordStore::<u16>::open(&path, 0, &Config::default());

    assert!(matches!(result, Err(ShelfError::Config(_))));
}

#[test]
fn test_four_byte_records_allowed() {
    let (_temp, path) = setup_temp_store();
    let mut store = RecordStore::<u32>::open(&path, 0, &Config::default()).unwrap();

    let a = store.write(&7).unwrap();
    let b = store.write(&8).unwrap();
    store.free(a).unwrap();

    assert_eq!(store.write(&9).unwrap(), a);
    assert_eq!(store.read(a).unwrap(), 9);
    assert_eq!(store.read(b).unwrap(), 8);
}

// =============================================================================
// Read/Write Tests
// =============================================================================

#[test]
fn test_basic_read_write_update() {
    let (_temp, path) = setup_temp_store();
    let mut store = open_u64(&path);

    store.write_info(1, 114).unwrap();
    assert_eq!(store.get_info(1).unwrap(), 114);

    let positions: Vec<u32> = (0..100u64).map(|i| store.write(&i).unwrap()).collect();
    assert_eq!(positions, (1..=100).collect::<Vec<u32>>());

    for (i, &pos) in positions.iter().enumerate() {
        let value = store.read(pos).unwrap();
        assert_eq!(value, i as u64);
        store.update(&(value << 32), pos).unwrap();
    }

    for (i, &pos) in positions.iter().enumerate() {
        assert_eq!(store.read(pos).unwrap() >> 32, i as u64);
    }
}

#[test]
fn test_write_never_returns_zero() {
    let (_temp, path) = setup_temp_store();
    let mut store = open_u64(&path);

    let first = store.write(&1).unwrap();

    assert_eq!(first, 1);
}

#[test]
fn test_invalid_positions_rejected() {
    let (_temp, path) = setup_temp_store();
    let mut store = open_u64(&path);
    store.write(&1).unwrap();

    assert!(matches!(store.read(0), Err(ShelfError::InvalidPosition(0))));
    assert!(matches!(store.read(2), Err(ShelfError::InvalidPosition(2))));
    assert!(matches!(store.update(&5, 9), Err(ShelfError::InvalidPosition(9))));
    assert!(matches!(store.free(0), Err(ShelfError::InvalidPosition(0))));
}

// =============================================================================
// Free List Tests
// =============================================================================

#[test]
fn test_free_slots_reused_lifo() {
    let (_temp, path) = setup_temp_store();
    let mut store = open_u64(&path);

    for i in 0..3u64 {
        store.write(&i).unwrap();
    }
    store.free(2).unwrap();
    store.free(1).unwrap();

    assert_eq!(store.free_head(), 1);
    assert_eq!(store.free_slots().unwrap(), 2);

    assert_eq!(store.write(&10).unwrap(), 1);
    assert_eq!(store.write(&20).unwrap(), 2);
    assert_eq!(store.write(&30).unwrap(), 4);

    assert_eq!(store.slot_count(), 4);
    assert_eq!(store.free_slots().unwrap(), 0);
    assert_eq!(store.read(3).unwrap(), 2);
}

#[test]
fn test_free_and_rewrite_all() {
    let (_temp, path) = setup_temp_store();
    let mut store = open_u64(&path);

    let positions: Vec<u32> = (0..100u64).map(|i| store.write(&i).unwrap()).collect();
    for &pos in &positions {
        store.free(pos).unwrap();
    }
    assert_eq!(store.free_slots().unwrap(), 100);

    let mut reused: Vec<u32> = (0..100u64).map(|i| store.write(&i).unwrap()).collect();
    reused.sort_unstable();

    assert_eq!(reused, positions);
    assert_eq!(store.slot_count(), 100);
}

// =============================================================================
// Info Tests
// =============================================================================

#[test]
fn test_info_out_of_range_is_noop() {
    let (_temp, path) = setup_temp_store();
    let mut store = open_u64(&path);

    store.write_info(2, 42).unwrap();
    store.write_info(3, 99).unwrap();
    store.write_info(0, 99).unwrap();

    assert_eq!(store.get_info(0).unwrap(), 0);
    assert_eq!(store.get_info(2).unwrap(), 42);
    assert_eq!(store.get_info(3).unwrap(), 0);

    // Ignored writes must not spill into slot 1
    let pos = store.write(&123).unwrap();
    assert_eq!(store.read(pos).unwrap(), 123);
    assert_eq!(store.get_info(2).unwrap(), 42);
}

#[test]
fn test_info_does_not_overlap_slots() {
    let (_temp, path) = setup_temp_store();
    let mut store = open_u64(&path);

    let pos = store.write(&u64::MAX).unwrap();
    store.write_info(1, 7).unwrap();
    store.write_info(2, 8).unwrap();

    assert_eq!(store.read(pos).unwrap(), u64::MAX);
}

// =============================================================================
// Partial Access Tests
// =============================================================================

#[test]
fn test_read_and_update_at_offset() {
    let (_temp, path) = setup_temp_store();
    let mut store = RecordStore::<Pair<u32, u32>>::open(&path, 0, &Config::default()).unwrap();

    let pos = store.write(&Pair::new(1, 2)).unwrap();

    assert_eq!(store.read_at::<u32>(pos, 0).unwrap(), 1);
    assert_eq!(store.read_at::<u32>(pos, 4).unwrap(), 2);

    store.update_at(&9u32, pos, 0).unwrap();
    assert_eq!(store.read(pos).unwrap(), Pair::new(9, 2));
}

#[test]
fn test_field_overrunning_record_rejected() {
    let (_temp, path) = setup_temp_store();
    let mut store = open_u64(&path);
    let pos = store.write(&1).unwrap();

    assert!(matches!(store.read_at::<u64>(pos, 4), Err(ShelfError::Storage(_))));
    assert!(matches!(store.update_at(&1u64, pos, 1), Err(ShelfError::Storage(_))));
}

#[test]
fn test_field_offset_near_usize_max_rejected() {
    let (_temp, path) = setup_temp_store();
    let mut store = open_u64(&path);
    let pos = store.write(&1).unwrap();

    assert!(matches!(
        store.read_at::<u32>(pos, usize::MAX - 1),
        Err(ShelfError::Storage(_))
    ));
    assert!(matches!(
        store.update_at(&1u32, pos, usize::MAX),
        Err(ShelfError::Storage(_))
    ));
    assert_eq!(store.read(pos).unwrap(), 1);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_persistent_read_write() {
    let (_temp, path) = setup_temp_store();
    let mut rng = StdRng::seed_from_u64(114514);
    let data: Vec<u64> = (0..100).map(|_| rng.gen()).collect();

    let positions: Vec<u32> = {
        let mut store = open_u64(&path);
        data.iter().map(|v| store.write(v).unwrap()).collect()
    };

    let mut store = open_u64(&path);
    for (value, &pos) in data.iter().zip(&positions) {
        assert_eq!(store.read(pos).unwrap(), *value);
    }

    // New writes append after the reopened high-water mark
    for i in 0..100u64 {
        let pos = store.write(&i).unwrap();
        assert!(pos > 100);
    }
    for (value, &pos) in data.iter().zip(&positions) {
        assert_eq!(store.read(pos).unwrap(), *value);
    }
}

#[test]
fn test_free_list_survives_reopen() {
    let (_temp, path) = setup_temp_store();

    {
        let mut store = open_u64(&path);
        for i in 0..10u64 {
            store.write(&i).unwrap();
        }
        store.free(4).unwrap();
        store.free(7).unwrap();
        store.write_info(1, 77).unwrap();
        store.close().unwrap();
    }

    let mut store = open_u64(&path);
    assert_eq!(store.slot_count(), 10);
    assert_eq!(store.free_head(), 7);
    assert_eq!(store.free_slots().unwrap(), 2);
    assert_eq!(store.get_info(1).unwrap(), 77);

    assert_eq!(store.write(&100).unwrap(), 7);
    assert_eq!(store.write(&200).unwrap(), 4);
    assert_eq!(store.write(&300).unwrap(), 11);
}

#[test]
fn test_header_tracks_every_write_across_reopen() {
    let (_temp, path) = setup_temp_store();

    {
        let mut store = open_u64(&path);
        for i in 0..6u64 {
            store.write(&i).unwrap();
        }
        store.free(2).unwrap();
        store.free(5).unwrap();
        // Two pops, then an append
        assert_eq!(store.write(&50).unwrap(), 5);
        assert_eq!(store.write(&70).unwrap(), 2);
        assert_eq!(store.write(&80).unwrap(), 7);
    }

    let mut store = open_u64(&path);
    assert_eq!(store.slot_count(), 7);
    assert_eq!(store.free_head(), 0);
    assert_eq!(store.free_slots().unwrap(), 0);
    let values: Vec<u64> = (1..=7).map(|pos| store.read(pos).unwrap()).collect();
    assert_eq!(values, vec![0, 70, 2, 3, 50, 5, 80]);
}

// =============================================================================
// Header Validation Tests
// =============================================================================

#[test]
fn test_foreign_file_rejected() {
    let (_temp, path) = setup_temp_store();
    fs::write(&path, b"definitely not a shelfkv store file").unwrap();

    let result = RecordStore::<u64>::open(&path, 2, &Config::default());

    assert!(matches!(result, Err(ShelfError::Format(_))));
}

#[test]
fn test_truncated_header_rejected() {
    let (_temp, path) = setup_temp_store();
    fs::write(&path, b"SHKV").unwrap();

    let result = RecordStore::<u64>::open(&path, 2, &Config::default());

    assert!(result.is_err());
}

#[test]
fn test_slot_size_mismatch_rejected() {
    let (_temp, path) = setup_temp_store();
    open_u64(&path).write(&1).unwrap();

    let result = RecordStore::<u32>::open(&path, 2, &Config::default());

    assert!(matches!(result, Err(ShelfError::Format(_))));
}

#[test]
fn test_info_len_mismatch_rejected() {
    let (_temp, path) = setup_temp_store();
    open_u64(&path).write(&1).unwrap();

    let result = RecordStore::<u64>::open(&path, 3, &Config::default());

    assert!(matches!(result, Err(ShelfError::Format(_))));
}

#[test]
fn test_header_checksum_mismatch_detected() {
    let (_temp, path) = setup_temp_store();
    {
        let mut store = open_u64(&path);
        store.write(&1).unwrap();
        store.close().unwrap();
    }

    // Bump the slot count without fixing the CRC
    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(16)).unwrap();
    file.write_all(&5u32.to_le_bytes()).unwrap();
    drop(file);

    let result = RecordStore::<u64>::open(&path, 2, &Config::default());

    assert!(matches!(result, Err(ShelfError::Corruption(_))));
}
