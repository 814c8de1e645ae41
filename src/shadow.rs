//! Non-caching reuse-distance tracers and an offline packing estimator
//! (spec §4.13).
//!
//! Grounded on `original_source/src/shadowlru.cpp`. These don't admit or
//! evict anything: `ShadowLru` keeps an unbounded recency list and, on
//! every request, walks it front-to-back summing byte sizes until it finds
//! the key (the walk's running sum is the *reuse distance*), records that
//! distance into a [`HitRateCurve`], then moves the key to the front.
//! `ShadowSlab` and `PartSlab` compose several such shadow LRUs (one per
//! slab class, or one per hash partition) into one approximate global
//! distance. `SegmentUtil` is unrelated to the other three: a one-shot,
//! off-line bin-packer used to estimate flash segment packing efficiency.

use crate::collections::{BTreeMap, HashMap, String, Vec};
use crate::hashing::sha1_shard;
use crate::policy::{Outcome, Policy};
use crate::request::Request;
use crate::slabclass::SlabClassTable;
use crate::stats::Stats;
use crate::{IdList, PolicyError};

const ONE_GIB: u64 = 1024 * 1024 * 1024;

/// Histogram of reuse distances, indexed sparsely since distances span up
/// to [`ONE_GIB`].
#[derive(Debug, Clone, Default)]
pub struct HitRateCurve {
    hits: BTreeMap<u64, u64>,
    too_big_hit: u64,
    misses: u64,
}

impl HitRateCurve {
    /// An empty curve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a hit at reuse distance `distance` bytes; distances at or
    /// beyond 1 GiB collapse into `too_big_hit`.
    pub fn record_hit(&mut self, distance: u64) {
        if distance >= ONE_GIB {
            self.too_big_hit += 1;
        } else {
            *self.hits.entry(distance).or_insert(0) += 1;
        }
    }

    /// Records a miss (no reuse distance to bucket).
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Count of hits collapsed into the overflow bucket.
    pub fn too_big_hit(&self) -> u64 {
        self.too_big_hit
    }

    /// Writes the empirical CDF: a `distance cumfrac` header, then one
    /// `d f` line per distance with a nonzero hit count, where `f` is the
    /// fraction of all accesses (hits + misses) that hit at or before `d`.
    pub fn dump_cdf<W: core::fmt::Write>(&self, w: &mut W) -> core::fmt::Result {
        writeln!(w, "distance cumfrac")?;
        let total = self.misses + self.too_big_hit + self.hits.values().sum::<u64>();
        if total == 0 {
            return Ok(());
        }
        let mut cum = 0u64;
        for (&d, &count) in &self.hits {
            cum += count;
            let f = cum as f64 / total as f64;
            writeln!(w, "{d} {f}")?;
        }
        Ok(())
    }
}

/// Unbounded recency-list reuse-distance tracer (spec §4.13).
#[derive(Debug)]
pub struct ShadowLru {
    sizes: HashMap<u32, u64>,
    order: IdList,
    curve: HitRateCurve,
    stats: Stats,
}

impl ShadowLru {
    /// Builds an empty tracer.
    pub fn new() -> Self {
        Self {
            sizes: HashMap::default(),
            order: IdList::new(),
            curve: HitRateCurve::new(),
            stats: Stats::new(),
        }
    }

    /// Reference to the accumulated hit-rate curve.
    pub fn hit_rate_curve(&self) -> &HitRateCurve {
        &self.curve
    }

    fn distance_of(&self, kid: u32) -> u64 {
        let mut sum = 0u64;
        for id in self.order.iter() {
            if id == kid {
                return sum;
            }
            sum += self.sizes[&id];
        }
        sum
    }
}

impl Default for ShadowLru {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for ShadowLru {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let size = req.size();
        let outcome = if self.order.contains(req.kid) {
            let distance = self.distance_of(req.kid);
            self.order.move_to_front(req.kid);
            if !warmup {
                self.curve.record_hit(distance);
                self.stats.record_hit(None);
            }
            Outcome::Hit { distance: Some(distance) }
        } else {
            self.order.push_front(req.kid);
            self.sizes.insert(req.kid, size);
            if !warmup {
                self.curve.record_miss();
                self.stats.record_miss();
            }
            Outcome::Miss
        };
        self.stats.bytes_cached = self.sizes.values().sum();
        Ok(outcome)
    }

    fn bytes_cached(&self) -> u64 {
        self.sizes.values().sum()
    }

    fn name(&self) -> &'static str {
        "shadow_lru"
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

/// Per-slab-class shadow LRU composing an *approximate global* reuse
/// distance: `slab_id * SLABSIZE + (dist_in_class mod SLABSIZE)` (spec
/// §4.13).
#[derive(Debug)]
pub struct ShadowSlab {
    table: SlabClassTable,
    per_class: HashMap<u32, ShadowLru>,
    curve: HitRateCurve,
    stats: Stats,
}

const SLABSIZE: u64 = 1024 * 1024;

impl ShadowSlab {
    /// Builds an empty tracer over the memcached class table at
    /// `growth_factor`.
    pub fn new(growth_factor: f64) -> Self {
        Self {
            table: SlabClassTable::memcached(growth_factor),
            per_class: HashMap::default(),
            curve: HitRateCurve::new(),
            stats: Stats::new(),
        }
    }

    /// Reference to the accumulated hit-rate curve.
    pub fn hit_rate_curve(&self) -> &HitRateCurve {
        &self.curve
    }
}

impl Policy for ShadowSlab {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let Some(class) = self.table.classify(req.size()) else {
            if !warmup {
                self.stats.record_miss();
                self.curve.record_miss();
            }
            return Ok(Outcome::Miss);
        };

        let shadow = self.per_class.entry(class.id).or_insert_with(ShadowLru::new);
        let was_hit = shadow.order.contains(req.kid);
        let dist_in_class = if was_hit { shadow.distance_of(req.kid) } else { 0 };
        let outcome = shadow.process_request(req, true)?;

        if !outcome.is_hit() {
            if !warmup {
                self.curve.record_miss();
                self.stats.record_miss();
            }
            self.stats.bytes_cached = self.bytes_cached();
            return Ok(Outcome::Miss);
        }

        let global_dist = u64::from(class.id) * SLABSIZE + (dist_in_class % SLABSIZE);
        if !warmup {
            self.curve.record_hit(global_dist);
            self.stats.record_hit(None);
        }
        self.stats.bytes_cached = self.bytes_cached();
        Ok(Outcome::Hit { distance: Some(global_dist) })
    }

    fn bytes_cached(&self) -> u64 {
        self.per_class.values().map(Policy::bytes_cached).sum()
    }

    fn name(&self) -> &'static str {
        "shadow_slab"
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

/// Hash-partitioned shadow LRU composing `global_dist ≈ partition_dist *
/// P + partition_id` (spec §4.13).
#[derive(Debug)]
pub struct PartSlab {
    partitions: Vec<ShadowLru>,
    curve: HitRateCurve,
    stats: Stats,
}

impl PartSlab {
    /// Builds `num_partitions` independent shadow LRUs.
    pub fn new(num_partitions: u32) -> Self {
        Self {
            partitions: (0..num_partitions).map(|_| ShadowLru::new()).collect(),
            curve: HitRateCurve::new(),
            stats: Stats::new(),
        }
    }

    /// Reference to the accumulated hit-rate curve.
    pub fn hit_rate_curve(&self) -> &HitRateCurve {
        &self.curve
    }

    fn partition_of(&self, kid: u32) -> usize {
        sha1_shard(kid, self.partitions.len() as u64) as usize
    }
}

impl Policy for PartSlab {
    fn process_request(&mut self, req: &Request, warmup: bool) -> Result<Outcome, PolicyError> {
        let p = self.partition_of(req.kid);
        let was_hit = self.partitions[p].order.contains(req.kid);
        let partition_dist = if was_hit { self.partitions[p].distance_of(req.kid) } else { 0 };
        let outcome = self.partitions[p].process_request(req, true)?;

        if !outcome.is_hit() {
            if !warmup {
                self.curve.record_miss();
                self.stats.record_miss();
            }
            self.stats.bytes_cached = self.bytes_cached();
            return Ok(Outcome::Miss);
        }

        let global_dist = partition_dist * self.partitions.len() as u64 + p as u64;
        if !warmup {
            self.curve.record_hit(global_dist);
            self.stats.record_hit(None);
        }
        self.stats.bytes_cached = self.bytes_cached();
        Ok(Outcome::Hit { distance: Some(global_dist) })
    }

    fn bytes_cached(&self) -> u64 {
        self.partitions.iter().map(Policy::bytes_cached).sum()
    }

    fn name(&self) -> &'static str {
        "part_slab"
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

/// 32-bit MurmurHash3 finalizer-style mix, used only to pick candidate
/// page offsets for [`SegmentUtil`]; not a general hashing API.
fn murmur3_32(key: u64, seed: u32) -> u32 {
    let mut h = seed ^ (key as u32) ^ ((key >> 32) as u32).wrapping_mul(0x9747_b28c);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

const PAGE_SIZE: u64 = 4096;

/// One-shot off-line flash-segment packing estimator (spec §4.13).
///
/// Accumulates items until the configured bound is reached, then packs
/// them largest-first into a fixed page array by probing
/// `num_hash_functions` MurmurHash3 offsets per item; an item occupies one
/// head page, zero or more full pages and one tail page, and an offset is
/// rejected if any page in the run is already occupied or the run would
/// cross the end of the array.
#[derive(Debug)]
pub struct SegmentUtil {
    bound: u64,
    num_hash_functions: u32,
    page_count: usize,
    items: Vec<u64>,
    accumulated: u64,
}

impl SegmentUtil {
    /// Builds a packer targeting `page_count` pages of [`PAGE_SIZE`] bytes
    /// each, accumulating input up to `bound` bytes before packing.
    pub fn new(bound: u64, page_count: usize, num_hash_functions: u32) -> Self {
        Self {
            bound,
            num_hash_functions,
            page_count,
            items: Vec::new(),
            accumulated: 0,
        }
    }

    /// Adds one item's size to the pending batch. Returns `true` once the
    /// configured bound has been reached (the batch is ready to pack).
    pub fn add(&mut self, size: u64) -> bool {
        self.items.push(size);
        self.accumulated += size;
        self.accumulated >= self.bound
    }

    /// Packs the accumulated batch and returns the achieved utilization
    /// (placed bytes / total page-array bytes), clearing the batch.
    pub fn pack(&mut self) -> f64 {
        let mut items = core::mem::take(&mut self.items);
        self.accumulated = 0;
        items.sort_unstable_by(|a, b| b.cmp(a));

        let mut pages = crate::collections::vec![false; self.page_count];
        let mut placed_bytes = 0u64;

        for (idx, &size) in items.iter().enumerate() {
            let needed = ((size + PAGE_SIZE - 1) / PAGE_SIZE).max(1) as usize;
            let mut placed = false;
            for h in 0..self.num_hash_functions {
                let offset = (murmur3_32(idx as u64, h) as usize) % self.page_count.max(1);
                if offset + needed > self.page_count {
                    continue;
                }
                if pages[offset..offset + needed].iter().any(|&occupied| occupied) {
                    continue;
                }
                for p in &mut pages[offset..offset + needed] {
                    *p = true;
                }
                placed_bytes += size;
                placed = true;
                break;
            }
            let _ = placed;
        }

        let total_page_bytes = self.page_count as u64 * PAGE_SIZE;
        if total_page_bytes == 0 {
            0.0
        } else {
            placed_bytes as f64 / total_page_bytes as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(kid: u32, size: u32) -> Request {
        Request::new(0.0, 0, 0, 0, size, kid)
    }

    #[test]
    fn repeat_access_records_a_reuse_distance_and_refreshes_recency() {
        let mut c = ShadowLru::new();
        c.process_request(&req(1, 10), false).unwrap();
        c.process_request(&req(2, 10), false).unwrap();
        let outcome = c.process_request(&req(1, 10), false).unwrap();
        assert_eq!(outcome, Outcome::hit());
        assert_eq!(c.hit_rate_curve().hits.get(&10), Some(&1));
        assert_eq!(c.order.front(), Some(1));
    }

    #[test]
    fn huge_distance_collapses_into_too_big_bucket() {
        let mut c = ShadowLru::new();
        c.process_request(&req(1, (ONE_GIB + 1) as u32), false).unwrap();
        for kid in 2..20u32 {
            c.process_request(&req(kid, u32::MAX / 4), false).unwrap();
        }
        c.process_request(&req(1, (ONE_GIB + 1) as u32), false).unwrap();
        assert!(c.hit_rate_curve().too_big_hit() >= 1);
    }

    #[test]
    fn dump_cdf_reports_nondecreasing_cumulative_fraction() {
        let mut c = ShadowLru::new();
        c.process_request(&req(1, 1), false).unwrap();
        c.process_request(&req(2, 1), false).unwrap();
        c.process_request(&req(1, 1), false).unwrap();
        c.process_request(&req(2, 1), false).unwrap();
        let mut out = String::new();
        c.hit_rate_curve().dump_cdf(&mut out).unwrap();
        assert!(out.starts_with("distance cumfrac"));
    }

    #[test]
    fn part_slab_partitions_are_independent() {
        let mut c = PartSlab::new(4);
        for kid in 0..50u32 {
            c.process_request(&req(kid, 1), false).unwrap();
        }
        assert_eq!(c.bytes_cached(), 50);
    }

    #[test]
    fn segment_util_never_exceeds_full_utilization() {
        let mut su = SegmentUtil::new(64 * 1024, 32, 3);
        for size in [4096u64, 8192, 2048, 4096, 16384] {
            su.add(size);
        }
        let util = su.pack();
        assert!(util <= 1.0);
        assert!(util >= 0.0);
    }
}
