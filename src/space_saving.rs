//! Space-Saving top-k heavy-hitters structure.
//!
//! Based on [Efficient Computation of Frequent and Top-k Elements in Data
//! Streams][paper] (Metwally, Agrawal, Abbadi). The source this crate's
//! algorithm is distilled from uses a linked list of count-ordered buckets,
//! each owning a linked list of same-count counters, with a hash map from
//! key to counter node for O(1) lookup; per [Finding Frequent Items in Data
//! Streams][cormode] the linked-list variant is faster in practice than a
//! heap.
//!
//! This implementation keeps that bucket-ordered structure but replaces the
//! source's doubly linked lists of heap nodes with two index-addressed
//! arenas (`Vec<Slot<_>>`), so that "pointers" are plain `usize` indices with
//! no cyclic ownership and no linked-list allocator. Each bucket's
//! counter list is itself intrusive — counters carry their own
//! previous/next links — so removing a counter from the middle of a
//! bucket (on promotion to the next count) is O(1) rather than a scan.
//!
//! [paper]: https://www.cse.ust.hk/~raywong/comp5331/References/EfficientComputationOfFrequentAndTop-kElementsInDataStreams.pdf
//! [cormode]: https://dimacs.rutgers.edu/~graham/pubs/papers/freq.pdf

use std::collections::HashMap;
use std::hash::Hash;

type BucketIdx = usize;
type CounterIdx = usize;

#[derive(Debug, Clone)]
struct Bucket {
    count: u64,
    /// Head (front, oldest) of this bucket's intrusive counter list.
    counters_head: Option<CounterIdx>,
    /// Tail (back, newest) of this bucket's intrusive counter list.
    counters_tail: Option<CounterIdx>,
    prev: Option<BucketIdx>,
    next: Option<BucketIdx>,
}

/// A tracked key and its approximate count, as returned by
/// [`SpaceSaving::observe`] and [`SpaceSaving::top_k`].
#[derive(Debug, Clone, PartialEq)]
pub struct Counter<K> {
    pub key: K,
    /// Upper-bound estimate of the key's true frequency.
    pub count: u64,
    /// The count this counter inherited when it replaced an evicted key (0
    /// if it has never replaced one). `true_count` satisfies
    /// `count - error <= true_count <= count`.
    pub error: u64,
    bucket: BucketIdx,
    /// Previous/next counter within `bucket`'s own list, in insertion
    /// (FIFO) order. Intrusive so that removing a counter from the middle
    /// of a bucket's list on promotion is O(1).
    prev_in_bucket: Option<CounterIdx>,
    next_in_bucket: Option<CounterIdx>,
}

/// Bounded top-k heavy-hitters tracker over keys of type `K`.
///
/// Capacity `C` is fixed at construction; at most `C` distinct keys are
/// tracked at once. All operations are O(1) amortized except `top_k`, which
/// is O(k).
#[derive(Debug)]
pub struct SpaceSaving<K> {
    capacity: usize,
    index: HashMap<K, CounterIdx>,
    counters: Vec<Counter<K>>,
    buckets: Vec<Bucket>,
    free_counters: Vec<CounterIdx>,
    free_buckets: Vec<BucketIdx>,
    head: Option<BucketIdx>,
    tail: Option<BucketIdx>,
}

impl<K> SpaceSaving<K>
where
    K: Eq + Hash + Clone,
{
    /// Create a tracker holding at most `capacity` distinct keys.
    pub fn new(capacity: usize) -> Self {
        SpaceSaving {
            capacity,
            index: HashMap::new(),
            counters: Vec::new(),
            buckets: Vec::new(),
            free_counters: Vec::new(),
            free_buckets: Vec::new(),
            head: None,
            tail: None,
        }
    }

    /// Number of distinct keys currently tracked.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Look up the current counter for `key`, if it is tracked.
    pub fn get(&self, key: &K) -> Option<&Counter<K>> {
        self.index.get(key).map(|&ci| &self.counters[ci])
    }

    fn alloc_bucket(&mut self, count: u64) -> BucketIdx {
        match self.free_buckets.pop() {
            Some(idx) => {
                self.buckets[idx] = Bucket {
                    count,
                    counters_head: None,
                    counters_tail: None,
                    prev: None,
                    next: None,
                };
                idx
            }
            None => {
                self.buckets.push(Bucket {
                    count,
                    counters_head: None,
                    counters_tail: None,
                    prev: None,
                    next: None,
                });
                self.buckets.len() - 1
            }
        }
    }

    /// Append `counter_idx` to the tail of `bucket_idx`'s counter list.
    fn push_counter(&mut self, bucket_idx: BucketIdx, counter_idx: CounterIdx) {
        let old_tail = self.buckets[bucket_idx].counters_tail;
        self.counters[counter_idx].prev_in_bucket = old_tail;
        self.counters[counter_idx].next_in_bucket = None;
        match old_tail {
            Some(t) => self.counters[t].next_in_bucket = Some(counter_idx),
            None => self.buckets[bucket_idx].counters_head = Some(counter_idx),
        }
        self.buckets[bucket_idx].counters_tail = Some(counter_idx);
    }

    /// Unlink `counter_idx` from its current bucket's counter list, in
    /// O(1), using its own intrusive prev/next links.
    fn unlink_counter(&mut self, counter_idx: CounterIdx) {
        let bucket_idx = self.counters[counter_idx].bucket;
        let prev = self.counters[counter_idx].prev_in_bucket;
        let next = self.counters[counter_idx].next_in_bucket;
        match prev {
            Some(p) => self.counters[p].next_in_bucket = next,
            None => self.buckets[bucket_idx].counters_head = next,
        }
        match next {
            Some(n) => self.counters[n].prev_in_bucket = prev,
            None => self.buckets[bucket_idx].counters_tail = prev,
        }
        self.counters[counter_idx].prev_in_bucket = None;
        self.counters[counter_idx].next_in_bucket = None;
    }

    fn free_bucket(&mut self, idx: BucketIdx) {
        let (prev, next) = {
            let b = &self.buckets[idx];
            (b.prev, b.next)
        };
        match prev {
            Some(p) => self.buckets[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.buckets[n].prev = prev,
            None => self.tail = prev,
        }
        self.free_buckets.push(idx);
    }

    /// Insert a fresh bucket of the given `count` immediately after `after`
    /// (or at the front of the list if `after` is `None`), returning its
    /// index.
    fn insert_bucket_after(&mut self, after: Option<BucketIdx>, count: u64) -> BucketIdx {
        let new_idx = self.alloc_bucket(count);
        let next = match after {
            Some(a) => self.buckets[a].next,
            None => self.head,
        };
        self.buckets[new_idx].prev = after;
        self.buckets[new_idx].next = next;
        match after {
            Some(a) => self.buckets[a].next = Some(new_idx),
            None => self.head = Some(new_idx),
        }
        match next {
            Some(n) => self.buckets[n].prev = Some(new_idx),
            None => self.tail = Some(new_idx),
        }
        new_idx
    }

    /// Move `counter_idx` out of its current bucket and into the bucket for
    /// `count + 1`, creating that bucket if needed, and freeing the old
    /// bucket if it is now empty. Returns the new bucket index.
    fn promote(&mut self, counter_idx: CounterIdx) -> BucketIdx {
        let old_bucket_idx = self.counters[counter_idx].bucket;
        self.unlink_counter(counter_idx);

        let new_count = self.counters[counter_idx].count + 1;
        self.counters[counter_idx].count = new_count;

        let next_of_old = self.buckets[old_bucket_idx].next;
        let new_bucket_idx = match next_of_old {
            Some(n) if self.buckets[n].count == new_count => n,
            _ => self.insert_bucket_after(Some(old_bucket_idx), new_count),
        };
        self.push_counter(new_bucket_idx, counter_idx);
        self.counters[counter_idx].bucket = new_bucket_idx;

        if self.buckets[old_bucket_idx].counters_head.is_none() {
            self.free_bucket(old_bucket_idx);
        }

        new_bucket_idx
    }

    fn alloc_counter(&mut self, key: K, count: u64, error: u64, bucket: BucketIdx) -> CounterIdx {
        let counter = Counter {
            key,
            count,
            error,
            bucket,
            prev_in_bucket: None,
            next_in_bucket: None,
        };
        match self.free_counters.pop() {
            Some(idx) => {
                self.counters[idx] = counter;
                idx
            }
            None => {
                self.counters.push(counter);
                self.counters.len() - 1
            }
        }
    }

    /// Record one observation of `key`, returning its updated counter.
    ///
    /// * If `key` is already tracked, its count is incremented.
    /// * Else if there is free capacity, `key` starts a new counter at
    ///   count 1.
    /// * Else the least-recently-promoted key in the lowest-count bucket is
    ///   evicted and re-keyed to `key`, inheriting that bucket's count as
    ///   its `error`.
    pub fn observe(&mut self, key: K) -> Counter<K> {
        if let Some(&counter_idx) = self.index.get(&key) {
            self.promote(counter_idx);
            return self.counters[counter_idx].clone();
        }

        if self.index.len() < self.capacity {
            let bucket_idx = match self.head {
                Some(h) if self.buckets[h].count == 1 => h,
                _ => self.insert_bucket_after(None, 1),
            };
            let counter_idx = self.alloc_counter(key.clone(), 1, 0, bucket_idx);
            self.push_counter(bucket_idx, counter_idx);
            self.index.insert(key, counter_idx);
            return self.counters[counter_idx].clone();
        }

        // At capacity: evict the front counter of the lowest-count bucket.
        let min_bucket_idx = self.head.expect("at capacity implies a min bucket exists");
        let min_counter_idx = self.buckets[min_bucket_idx]
            .counters_head
            .expect("bucket list never contains an empty bucket");
        let evicted_count = self.buckets[min_bucket_idx].count;

        let evicted_key = self.counters[min_counter_idx].key.clone();
        self.index.remove(&evicted_key);
        self.counters[min_counter_idx].key = key.clone();
        self.counters[min_counter_idx].error = evicted_count;
        self.promote(min_counter_idx);
        self.index.insert(key, min_counter_idx);
        self.counters[min_counter_idx].clone()
    }

    /// The top `k` counters by descending count, ties broken by insertion
    /// order within a bucket (earliest-promoted first). Returns fewer than
    /// `k` entries if fewer than `k` distinct keys have been observed.
    pub fn top_k(&self, k: usize) -> Vec<&Counter<K>> {
        let mut result = Vec::with_capacity(k.min(self.index.len()));
        let mut cur = self.tail;
        while let Some(bucket_idx) = cur {
            if result.len() >= k {
                break;
            }
            let bucket = &self.buckets[bucket_idx];
            let mut counter_cur = bucket.counters_head;
            while let Some(counter_idx) = counter_cur {
                if result.len() >= k {
                    break;
                }
                result.push(&self.counters[counter_idx]);
                counter_cur = self.counters[counter_idx].next_in_bucket;
            }
            cur = bucket.prev;
        }
        result
    }

    /// Debug/test helper: validate the structural invariants — strictly
    /// increasing bucket counts, no empty buckets, index consistency, and
    /// capacity bound.
    #[cfg(test)]
    fn check_invariants(&self) {
        assert!(self.index.len() <= self.capacity);
        let mut cur = self.head;
        let mut prev_count: Option<u64> = None;
        let mut visited = 0;
        while let Some(idx) = cur {
            let bucket = &self.buckets[idx];
            assert!(bucket.counters_head.is_some(), "bucket {} is empty", idx);
            if let Some(pc) = prev_count {
                assert!(bucket.count > pc, "bucket counts not strictly increasing");
            }
            prev_count = Some(bucket.count);
            let mut counter_cur = bucket.counters_head;
            let mut prev_counter: Option<CounterIdx> = None;
            while let Some(ci) = counter_cur {
                assert_eq!(self.counters[ci].bucket, idx);
                assert_eq!(self.counters[ci].prev_in_bucket, prev_counter);
                assert!(self.index.contains_key(&self.counters[ci].key));
                prev_counter = Some(ci);
                counter_cur = self.counters[ci].next_in_bucket;
            }
            assert_eq!(bucket.counters_tail, prev_counter);
            cur = bucket.next;
            visited += 1;
            assert!(visited <= self.buckets.len() + 1, "cycle in bucket list");
        }
        assert_eq!(self.index.len(), self.counters.len() - self.free_counters.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanity_count_reaches_ten() {
        let mut ss: SpaceSaving<&str> = SpaceSaving::new(4);
        for _ in 0..10 {
            ss.observe("a");
        }
        assert_eq!(ss.get(&"a").unwrap().count, 10);
        ss.check_invariants();
    }

    #[test]
    fn capacity_bounds_distinct_keys() {
        let mut ss: SpaceSaving<u64> = SpaceSaving::new(4);
        for i in 0..20u64 {
            ss.observe(i);
        }
        assert_eq!(ss.len(), 4);
        ss.check_invariants();
    }

    #[test]
    fn fewer_than_capacity_keys_all_tracked() {
        let mut ss: SpaceSaving<u64> = SpaceSaving::new(100);
        for i in 0..10u64 {
            ss.observe(i);
        }
        assert_eq!(ss.len(), 10);
        ss.check_invariants();
    }

    #[test]
    fn heavy_hitters_scenario() {
        let mut ss: SpaceSaving<&str> = SpaceSaving::new(4);
        for key in ["a", "b", "c", "d", "a", "b", "e", "a", "b"] {
            ss.observe(key);
        }
        let top = ss.top_k(2);
        assert_eq!(top.len(), 2);
        let keys: Vec<&str> = top.iter().map(|c| c.key).collect();
        assert!(keys.contains(&"a"));
        assert!(keys.contains(&"b"));
        for c in &top {
            assert_eq!(c.count, 3);
        }
        ss.check_invariants();
    }

    #[test]
    fn error_bound_holds_against_ground_truth() {
        let mut ss: SpaceSaving<u64> = SpaceSaving::new(8);
        let mut truth: HashMap<u64, u64> = HashMap::new();
        let stream = [1u64, 2, 1, 3, 1, 2, 4, 5, 6, 7, 8, 9, 1, 2, 1, 10, 11, 1, 2, 1];
        for &key in &stream {
            ss.observe(key);
            *truth.entry(key).or_insert(0) += 1;
        }
        ss.check_invariants();
        for (key, true_count) in &truth {
            if let Some(counter) = ss.get(key) {
                assert!(counter.count >= *true_count);
                assert!(counter.count - counter.error <= *true_count);
            }
        }
    }

    #[test]
    fn top_k_returns_fewer_when_not_enough_distinct_keys() {
        let mut ss: SpaceSaving<&str> = SpaceSaving::new(10);
        ss.observe("a");
        ss.observe("b");
        let top = ss.top_k(5);
        assert_eq!(top.len(), 2);
    }

    proptest::proptest! {
        #[test]
        fn invariants_and_error_bound_hold_for_any_stream(
            stream in proptest::collection::vec(0u32..20, 1..300),
            capacity in 2usize..12,
        ) {
            let mut ss: SpaceSaving<u32> = SpaceSaving::new(capacity);
            let mut truth: HashMap<u32, u64> = HashMap::new();
            for key in &stream {
                ss.observe(*key);
                *truth.entry(*key).or_insert(0) += 1;
            }
            ss.check_invariants();
            for (key, true_count) in &truth {
                if let Some(counter) = ss.get(key) {
                    proptest::prop_assert!(counter.count >= *true_count);
                    proptest::prop_assert!(counter.count - counter.error <= *true_count);
                }
            }
        }
    }
}
