//! Sectioned, lazily-reinserted flash queue (spec §4.9).
//!
//! Grounded on `original_source/src/ripq.h`. Flash is split into `N`
//! sections (0 = hottest); each section owns a block list and one active
//! physical block plus one active virtual block. An item's bytes live in
//! its *physical* block, immutable once sealed; its *virtual* block tracks
//! where a hit promotes it to, independent of where the bytes actually
//! sit, until the physical block is eventually evicted and the item is
//! either dropped (its virtual rank caught up to its physical rank) or
//! cheaply re-admitted at its virtual section (it didn't).

use crate::collections::{HashMap, Vec};
use crate::config::RipqConfig;
use crate::error::PolicyError;
use crate::policy::{Outcome, Policy};
use crate::request::Request;
use crate::stats::Stats;

#[derive(Debug, Clone, Default)]
struct Block {
    section: usize,
    members: Vec<u32>,
    filled_bytes: u64,
}

#[derive(Debug, Clone, Copy)]
struct ItemRef {
    size: u64,
    physical_block: u32,
    virtual_block: u32,
    ghost: bool,
}

#[derive(Debug, Default)]
struct Section {
    physical_blocks: Vec<u32>,
    virtual_blocks: Vec<u32>,
}

/// RIPQ flash cache.
#[derive(Debug)]
pub struct Ripq {
    config: RipqConfig,
    items: HashMap<u32, ItemRef>,
    blocks: HashMap<u32, Block>,
    sections: Vec<Section>,
    next_block_id: u32,
    bytes_cached: u64,
    stats: Stats,
    /// When set, a tail-block eviction that isn't a promoted/ghosted item
    /// (the ordinary "truly evicted" case) is handed to
    /// `pending_reclaims` instead of being counted as an eviction. Used by
    /// [`crate::ripq_shield::RipqShield`] to reinsert such items into DRAM
    /// section 0 rather than drop them (spec §4.10); standalone `Ripq` use
    /// leaves this off and evicts them as usual.
    reclaim_on_evict: bool,
    pending_reclaims: Vec<(u32, u64)>,
}

impl Ripq {
    /// Builds an empty RIPQ cache with `config.num_sections` sections.
    pub fn new(config: RipqConfig) -> Self {
        let n = config.num_sections as usize;
        let mut ripq = Self {
            config,
            items: HashMap::default(),
            blocks: HashMap::default(),
            sections: (0..n).map(|_| Section::default()).collect(),
            next_block_id: 0,
            bytes_cached: 0,
            stats: Stats::new(),
            reclaim_on_evict: false,
            pending_reclaims: Vec::new(),
        };
        for s in 0..n {
            ripq.new_active_physical(s);
            ripq.new_active_virtual(s);
        }
        ripq
    }

    /// Turns on eviction reclaiming: see `reclaim_on_evict`.
    pub(crate) fn enable_reclaim_on_evict(&mut self) {
        self.reclaim_on_evict = true;
    }

    /// Drains the `(kid, size)` pairs that would have been evicted since
    /// the last drain, had `reclaim_on_evict` been off.
    pub(crate) fn take_reclaims(&mut self) -> Vec<(u32, u64)> {
        core::mem::take(&mut self.pending_reclaims)
    }

    fn new_block(&mut self, section: usize) -> u32 {
        let id = self.next_block_id;
        self.next_block_id += 1;
        self.blocks.insert(id, Block { section, members: Vec::new(), filled_bytes: 0 });
        id
    }

    fn new_active_physical(&mut self, section: usize) -> u32 {
        let id = self.new_block(section);
        self.sections[section].physical_blocks.push(id);
        id
    }

    fn new_active_virtual(&mut self, section: usize) -> u32 {
        let id = self.new_block(section);
        self.sections[section].virtual_blocks.push(id);
        id
    }

    fn active_physical(&self, section: usize) -> u32 {
        *self.sections[section]
            .physical_blocks
            .last()
            .expect("section always has an active physical block")
    }

    fn active_virtual(&self, section: usize) -> u32 {
        *self.sections[section]
            .virtual_blocks
            .last()
            .expect("section always has an active virtual block")
    }

    /// Admission into `section`'s active blocks: seals the active physical
    /// block and opens a fresh one if it would overflow, then rebalances
    /// and evicts. Shared by fresh-miss admission (always the tail section)
    /// and eviction-cascade reinsertion (`admit_fresh_at`, any section) —
    /// the original's `add()` is the single admission path both call into.
    fn admit_at(&mut self, kid: u32, size: u64, section: usize) {
        let phys = self.active_physical(section);
        let block = self.blocks.get_mut(&phys).expect("active block must exist");
        if block.filled_bytes + size > self.config.block_size {
            self.new_active_physical(section);
            self.new_active_virtual(section);
        }
        let phys = self.active_physical(section);
        let virt = self.active_virtual(section);
        let block = self.blocks.get_mut(&phys).expect("active block must exist");
        block.members.push(kid);
        block.filled_bytes += size;
        if virt != phys {
            let vblock = self.blocks.get_mut(&virt).expect("active virtual block must exist");
            vblock.members.push(kid);
            vblock.filled_bytes += size;
        }
        self.items.insert(
            kid,
            ItemRef { size, physical_block: phys, virtual_block: virt, ghost: false },
        );
        self.bytes_cached += size;
        self.rebalance();
        self.evict();
    }

    /// Tail (last section)'s admission; see [`Self::admit_at`].
    fn admit(&mut self, kid: u32, size: u64) {
        let tail = self.sections.len() - 1;
        self.admit_at(kid, size, tail);
    }

    /// From section 0 upward, pops the oldest overflowing block out of a
    /// section and lands it just behind the destination section's active
    /// block — the most-recently-arrived sealed block there, so it is not
    /// the next one up for eviction.
    fn rebalance(&mut self) {
        for s in 0..self.sections.len() {
            while self.section_filled(s) > self.config.section_size() && s + 1 < self.sections.len() {
                if let Some(b) = self.sections[s].physical_blocks.first().copied() {
                    if self.sections[s].physical_blocks.len() > 1 {
                        self.sections[s].physical_blocks.remove(0);
                        self.blocks.get_mut(&b).expect("checked above").section = s + 1;
                        let dest_len = self.sections[s + 1].physical_blocks.len();
                        self.sections[s + 1].physical_blocks.insert(dest_len.saturating_sub(1), b);
                        continue;
                    }
                }
                break;
            }
        }
    }

    fn section_filled(&self, s: usize) -> u64 {
        self.sections[s]
            .physical_blocks
            .iter()
            .map(|b| self.blocks[b].filled_bytes)
            .sum()
    }

    fn evict(&mut self) {
        let last = self.sections.len() - 1;
        while self.section_filled(last) > self.config.section_size() {
            if self.sections[last].physical_blocks.len() <= 1 {
                break;
            }
            let popped = self.sections[last].physical_blocks.remove(0);
            let block = self.blocks.remove(&popped).expect("checked above");
            for kid in block.members {
                let Some(item) = self.items.get(&kid).copied() else { continue };
                if item.virtual_block != item.physical_block {
                    if let Some(vb) = self.blocks.get_mut(&item.virtual_block) {
                        vb.members.retain(|&m| m != kid);
                    }
                    let section = self.blocks.get(&item.virtual_block).map_or(last, |b| b.section);
                    self.items.remove(&kid);
                    self.bytes_cached -= item.size;
                    self.admit_fresh_at(kid, item.size, section);
                } else {
                    self.items.remove(&kid);
                    self.bytes_cached -= item.size;
                    if self.reclaim_on_evict {
                        self.pending_reclaims.push((kid, item.size));
                    } else {
                        self.stats.record_eviction(item.size);
                    }
                }
            }
        }
    }

    /// Reinserts an item dropped out of a tail block into the section its
    /// virtual block had advanced to, via the same overflow-checked
    /// admission path fresh misses use; see [`Self::admit_at`].
    fn admit_fresh_at(&mut self, kid: u32, size: u64, section: usize) {
        self.admit_at(kid, size, section);
    }

    fn promote(&mut self, kid: u32) {
        let item = *self.items.get(&kid).expect("checked by caller");
        let cur_section = self.blocks[&item.virtual_block].section;
        let target = cur_section.saturating_sub(1);
        if let Some(vb) = self.blocks.get_mut(&item.virtual_block) {
            vb.members.retain(|&m| m != kid);
        }
        let new_virt = self.active_virtual(target);
        let phys_section = self.blocks[&item.physical_block].section;
        let new_phys = if phys_section == cur_section && self.active_physical(cur_section) == item.physical_block {
            let p = self.active_physical(target);
            let pblock = self.blocks.get_mut(&item.physical_block).expect("checked above");
            pblock.members.retain(|&m| m != kid);
            let pblock = self.blocks.get_mut(&p).expect("active block must exist");
            pblock.members.push(kid);
            pblock.filled_bytes += item.size;
            p
        } else {
            item.physical_block
        };
        let vblock = self.blocks.get_mut(&new_virt).expect("active virtual block must exist");
        vblock.members.push(kid);
        vblock.filled_bytes += item.size;
        self.items.insert(
            kid,
            ItemRef { size: item.size, physical_block: new_phys, virtual_block: new_virt, ghost: false },
        );
    }
}

impl Policy for Ripq {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let size = req.size();
        if size > self.config.section_size() {
            return Err(PolicyError::RequestTooLarge {
                kid: req.kid,
                size,
                limit: self.config.section_size(),
            });
        }

        if let Some(item) = self.items.get(&req.kid).copied() {
            if item.size == size {
                self.promote(req.kid);
                if !warmup {
                    self.stats.record_hit(None);
                }
                return Ok(Outcome::hit());
            }
            if let Some(vb) = self.blocks.get_mut(&item.virtual_block) {
                vb.members.retain(|&m| m != req.kid);
            }
            self.items.remove(&req.kid);
            self.bytes_cached -= item.size;
        }

        self.admit(req.kid, size);
        self.stats.bytes_cached = self.bytes_cached;
        if !warmup {
            self.stats.record_miss();
        }
        Ok(Outcome::Miss)
    }

    fn bytes_cached(&self) -> u64 {
        self.bytes_cached
    }

    fn name(&self) -> &'static str {
        "ripq"
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(kid: u32, size: u32) -> Request {
        Request::new(0.0, 0, 0, 0, size, kid)
    }

    #[test]
    fn virtual_section_never_exceeds_physical_section() {
        let mut cfg = RipqConfig::new(24, 3);
        cfg.block_size = 4;
        let mut c = Ripq::new(cfg);
        for kid in [1u32, 2, 3, 4] {
            c.process_request(&req(kid, 1), false).unwrap();
        }
        c.process_request(&req(1, 1), false).unwrap();
        c.process_request(&req(1, 1), false).unwrap();

        for item in c.items.values() {
            let v = c.blocks[&item.virtual_block].section;
            let p = c.blocks[&item.physical_block].section;
            assert!(v <= p);
        }
    }

    #[test]
    fn oversize_request_is_rejected() {
        let mut cfg = RipqConfig::new(24, 3);
        cfg.block_size = 4;
        let mut c = Ripq::new(cfg);
        let err = c.process_request(&req(1, 100), false).unwrap_err();
        assert!(matches!(err, PolicyError::RequestTooLarge { .. }));
    }
}
