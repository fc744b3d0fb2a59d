//! Block Index
//!
//! Disk-resident ordered multimap over a chain of bounded blocks.
//!
//! ## Responsibilities
//! - Keep every (key, value) pair in compound order across the chain
//! - Split a block when it fills, merge neighbours when they thin out
//! - Answer equality queries and full scans without an in-memory index
//! - Reopen from the same file with no rebuild step

use std::path::Path;

use crate::command::{Command, Outcome};
use crate::config::Config;
use crate::error::{Result, ShelfError};
use crate::record::{Pair, Record};
use crate::storage::RecordStore;

use super::block::{Block, BlockHeader, COUNT_OFFSET, PREV_OFFSET};
use super::iterator::ChainIter;

/// Default number of pairs a block holds before it splits
pub const DEFAULT_CAPACITY: usize = 512;

/// Metadata integers reserved in the record store
const INFO_LEN: usize = 1;

/// Info slot holding the position of the first block (0 = empty index)
const FIRST_BLOCK_INFO: usize = 1;

/// Summary of a chain walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainStats {
    /// Blocks linked into the chain
    pub blocks: usize,
    /// Pairs stored across all blocks
    pub entries: usize,
    /// Slots ever allocated in the backing store
    pub slot_count: u32,
    /// Slots waiting on the free list
    pub free_slots: usize,
}

/// Ordered multimap from `K` to `V` stored in a single file
///
/// Pairs are kept in a doubly-linked chain of blocks, each holding fewer
/// than `CAP` pairs at rest. Every operation walks the chain using the
/// cached per-block bounds and then works inside one or two blocks, so the
/// cost is O(blocks + CAP) record reads rather than O(log n).
///
/// Duplicate keys are allowed; duplicate (key, value) pairs are not.
pub struct BlockIndex<K: Record, V: Record, const CAP: usize = DEFAULT_CAPACITY> {
    store: RecordStore<Block<K, V, CAP>>,
}

impl<K, V, const CAP: usize> BlockIndex<K, V, CAP>
where
    K: Record + Ord + Copy,
    V: Record + Ord + Copy,
{
    const CAPACITY_CHECK: () = assert!(CAP >= 2, "block capacity must be at least 2");

    /// Open or create the named index under `config.data_dir`
    pub fn open(config: &Config, name: &str) -> Result<Self> {
        Self::open_with(&config.store_path(name), config)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config apart from the file location
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open_with(path, &Config::default())
    }

    /// Open or create the index stored at `path`
    pub fn open_with(path: &Path, config: &Config) -> Result<Self> {
        let () = Self::CAPACITY_CHECK;

        let store = RecordStore::open(path, INFO_LEN, config)?;
        let block_size = Block::<K, V, CAP>::SIZE;
        tracing::debug!(
            path = %path.display(),
            capacity = CAP,
            block_size,
            "Block index ready"
        );

        Ok(Self { store })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert a pair; inserting an existing pair is a no-op
    ///
    /// Steps:
    /// 1. Empty chain → allocate the first block holding just this pair
    /// 2. Walk to the first block whose max ≥ pair (or the last block)
    /// 3. Insert in order inside that block
    /// 4. Split the block if it reached capacity
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let pair = Pair::new(key, value);

        let head = self.first_block()?;
        if head == 0 {
            let block = Block::<K, V, CAP>::from_pairs(vec![pair], 0, 0);
            let position = self.store.write(&block)?;
            self.set_first_block(position)?;
            tracing::debug!(position, "Allocated first block");
            return Ok(());
        }

        let position = self.insertion_block(head, &pair)?;
        let mut block = self.read_block(position)?;
        if !block.insert(pair) {
            tracing::trace!(position, "Pair already present");
            return Ok(());
        }

        if block.len() >= CAP {
            self.split(position, block)
        } else {
            self.store.update(&block, position)
        }
    }

    /// Remove a pair; erasing an absent pair is a no-op
    ///
    /// After removal at most one merge runs: into the predecessor if both
    /// fit in one block, otherwise the successor into this block.
    pub fn erase(&mut self, key: K, value: V) -> Result<()> {
        let pair = Pair::new(key, value);

        let Some(position) = self.candidate_block(&pair)? else {
            return Ok(());
        };

        let mut block = self.read_block(position)?;
        if !block.remove(&pair) {
            tracing::trace!(position, "Pair not present");
            return Ok(());
        }

        self.rebalance(position, block)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All values stored under `key`, ascending
    ///
    /// Skips blocks whose max key is below `key`, then scans forward until a
    /// block's min key passes it.
    pub fn query(&mut self, key: &K) -> Result<Vec<V>> {
        let mut results = Vec::new();
        let mut steps = 0usize;

        let mut position = self.first_block()?;
        while position != 0 {
            self.guard_walk(&mut steps)?;
            let header = self.header(position)?;
            if header.count != 0 && header.max_elem.key >= *key {
                break;
            }
            position = header.next;
        }

        // The block the skip stopped at is already counted
        while position != 0 {
            let header = self.header(position)?;
            if header.count != 0 {
                if header.min_elem.key > *key {
                    break;
                }
                let block = self.read_block(position)?;
                block.collect_values(key, &mut results);
            }

            position = header.next;
            if position != 0 {
                self.guard_walk(&mut steps)?;
            }
        }

        Ok(results)
    }

    /// Whether the exact pair is stored
    pub fn contains(&mut self, key: K, value: V) -> Result<bool> {
        let pair = Pair::new(key, value);
        match self.candidate_block(&pair)? {
            Some(position) => Ok(self.read_block(position)?.contains(&pair)),
            None => Ok(false),
        }
    }

    /// Every value in chain (compound) order
    pub fn query_all(&mut self) -> Result<Vec<V>> {
        self.iter()?.map(|item| item.map(|(_, value)| value)).collect()
    }

    /// Every pair in chain (compound) order
    pub fn query_all_pairs(&mut self) -> Result<Vec<(K, V)>> {
        self.iter()?.collect()
    }

    /// Lazily iterate over every pair, one block in memory at a time
    pub fn iter(&mut self) -> Result<ChainIter<'_, K, V, CAP>> {
        let head = self.first_block()?;
        Ok(ChainIter::new(self, head))
    }

    /// Execute a command
    ///
    /// Routes commands to the matching operation
    pub fn execute(&mut self, command: Command<K, V>) -> Result<Outcome<K, V>> {
        tracing::trace!(command = command.name(), "Executing command");
        match command {
            Command::Insert { key, value } => {
                self.insert(key, value)?;
                Ok(Outcome::Done)
            }
            Command::Erase { key, value } => {
                self.erase(key, value)?;
                Ok(Outcome::Done)
            }
            Command::Query { key } => self.query(&key).map(Outcome::Values),
            Command::List => self.query_all_pairs().map(Outcome::Pairs),
            Command::Stats => self.stats().map(Outcome::Stats),
            Command::Verify => self.verify().map(Outcome::Stats),
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Count blocks, pairs and slots by walking block headers
    pub fn stats(&mut self) -> Result<ChainStats> {
        let mut stats = ChainStats::default();

        let mut position = self.first_block()?;
        while position != 0 {
            self.guard_walk(&mut stats.blocks)?;
            let header = self.header(position)?;
            stats.entries += header.count as usize;
            position = header.next;
        }

        stats.slot_count = self.store.slot_count();
        stats.free_slots = self.store.free_slots()?;
        Ok(stats)
    }

    /// Walk the full chain and check every structural invariant
    ///
    /// Checks:
    /// - `prev` of each block points at the block before it
    /// - counts match stored pairs and stay below capacity
    /// - pairs are strictly ordered within and across blocks
    /// - cached min/max match the stored pairs of non-empty blocks
    /// - every allocated slot is either chained or free
    pub fn verify(&mut self) -> Result<ChainStats> {
        let mut stats = ChainStats::default();
        let mut expected_prev = 0u32;
        let mut last_seen: Option<Pair<K, V>> = None;

        let mut position = self.first_block()?;
        while position != 0 {
            self.guard_walk(&mut stats.blocks)?;
            let block = self.read_block(position)?;

            if block.prev != expected_prev {
                return Err(corruption(position, format!(
                    "prev link is {}, expected {}",
                    block.prev, expected_prev
                )));
            }
            if block.count as usize != block.len() {
                return Err(corruption(position, format!(
                    "count {} disagrees with {} stored pairs",
                    block.count,
                    block.len()
                )));
            }
            if block.len() >= CAP {
                return Err(corruption(position, format!(
                    "holds {} pairs, capacity is {}",
                    block.len(),
                    CAP
                )));
            }
            if !block.data.windows(2).all(|w| w[0] < w[1]) {
                return Err(corruption(position, "pairs out of order".to_string()));
            }

            if let (Some(first), Some(last)) = (block.data.first(), block.data.last()) {
                if block.min_elem != *first || block.max_elem != *last {
                    return Err(corruption(position, "stale min/max cache".to_string()));
                }
                if last_seen.is_some_and(|prev_max| prev_max >= *first) {
                    return Err(corruption(
                        position,
                        "first pair not above previous block".to_string(),
                    ));
                }
                last_seen = Some(*last);
            }

            stats.entries += block.len();
            expected_prev = position;
            position = block.next;
        }

        stats.slot_count = self.store.slot_count();
        stats.free_slots = self.store.free_slots()?;
        if stats.blocks + stats.free_slots != stats.slot_count as usize {
            return Err(ShelfError::Corruption(format!(
                "{} chained + {} free blocks do not account for {} slots",
                stats.blocks, stats.free_slots, stats.slot_count
            )));
        }

        Ok(stats)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flush and fsync the backing file
    pub fn sync(&mut self) -> Result<()> {
        self.store.sync()
    }

    /// Close the index gracefully, syncing to disk
    pub fn close(self) -> Result<()> {
        self.store.close()
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    // =========================================================================
    // Block Access
    // =========================================================================

    pub(super) fn read_block(&mut self, position: u32) -> Result<Block<K, V, CAP>> {
        self.store.read(position)
    }

    fn first_block(&mut self) -> Result<u32> {
        self.store.get_info(FIRST_BLOCK_INFO)
    }

    fn set_first_block(&mut self, position: u32) -> Result<()> {
        self.store.write_info(FIRST_BLOCK_INFO, position)
    }

    /// Count, links and cached bounds without the pair array
    fn header(&mut self, position: u32) -> Result<BlockHeader<K, V>> {
        self.store.read_at(position, 0)
    }

    fn count(&mut self, position: u32) -> Result<usize> {
        Ok(self.store.read_at::<u32>(position, COUNT_OFFSET)? as usize)
    }

    fn set_prev(&mut self, position: u32, prev: u32) -> Result<()> {
        self.store.update_at(&prev, position, PREV_OFFSET)
    }

    // =========================================================================
    // Chain Walks
    // =========================================================================

    /// Block an insert of `pair` lands in
    ///
    /// Stops at an empty block, the last block, or the first block whose
    /// max ≥ pair.
    fn insertion_block(&mut self, head: u32, pair: &Pair<K, V>) -> Result<u32> {
        let mut steps = 0usize;
        let mut position = head;
        loop {
            self.guard_walk(&mut steps)?;
            let header = self.header(position)?;
            if header.count == 0 || header.next == 0 || header.max_elem >= *pair {
                return Ok(position);
            }
            position = header.next;
        }
    }

    /// The only block that could hold `pair`, if any
    ///
    /// First non-empty block whose max ≥ pair; `None` once the chain runs out.
    fn candidate_block(&mut self, pair: &Pair<K, V>) -> Result<Option<u32>> {
        let mut steps = 0usize;
        let mut position = self.first_block()?;
        while position != 0 {
            self.guard_walk(&mut steps)?;
            let header = self.header(position)?;
            if header.count != 0 && header.max_elem >= *pair {
                return Ok(Some(position));
            }
            position = header.next;
        }
        Ok(None)
    }

    /// Fail instead of spinning when a walk visits more blocks than exist
    pub(super) fn guard_walk(&self, steps: &mut usize) -> Result<()> {
        *steps += 1;
        if *steps > self.store.slot_count() as usize {
            return Err(ShelfError::Corruption(format!(
                "Block chain longer than the {} allocated slots",
                self.store.slot_count()
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Rebalancing
    // =========================================================================

    /// Move the upper half of a full block into a new successor
    fn split(&mut self, position: u32, mut block: Block<K, V, CAP>) -> Result<()> {
        let upper = block.split_upper();
        let sibling = Block::<K, V, CAP>::from_pairs(upper, position, block.next);
        let sibling_position = self.store.write(&sibling)?;

        if block.next != 0 {
            self.set_prev(block.next, sibling_position)?;
        }
        block.next = sibling_position;
        self.store.update(&block, position)?;

        tracing::debug!(
            position,
            sibling = sibling_position,
            left = block.len(),
            right = sibling.len(),
            "Split block"
        );
        Ok(())
    }

    /// Persist a block that just lost a pair, merging with a neighbour when
    /// the two fit below capacity
    fn rebalance(&mut self, position: u32, block: Block<K, V, CAP>) -> Result<()> {
        let (prev, next) = (block.prev, block.next);

        if prev != 0 && self.count(prev)? + block.len() < CAP {
            let left = self.read_block(prev)?;
            return self.merge(prev, left, position, block);
        }

        if next != 0 && block.len() + self.count(next)? < CAP {
            let right = self.read_block(next)?;
            return self.merge(position, block, next, right);
        }

        self.store.update(&block, position)
    }

    /// Fold `right` into `left` and free right's slot
    fn merge(
        &mut self,
        left_position: u32,
        mut left: Block<K, V, CAP>,
        right_position: u32,
        right: Block<K, V, CAP>,
    ) -> Result<()> {
        let after = right.next;
        left.absorb(right);

        if after != 0 {
            self.set_prev(after, left_position)?;
        }
        self.store.update(&left, left_position)?;
        self.store.free(right_position)?;

        tracing::debug!(
            left = left_position,
            right = right_position,
            count = left.len(),
            "Merged blocks"
        );
        Ok(())
    }
}

fn corruption(position: u32, detail: String) -> ShelfError {
    ShelfError::Corruption(format!("Block {}: {}", position, detail))
}
