//! Incremental dedup-by-key accumulator.
//!
//! Records are keyed by [`RecordId`]; the first payload seen for a key wins
//! and later payloads for that key are ignored (no field merging). Insertion
//! order is kept so snapshots are deterministic.
//!
//! The accumulator is shared between the crawler and the exchange handler it
//! registers on the session, so `absorb` takes `&self` and serializes
//! insertions behind a mutex.

use crate::record::{Record, RecordId};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Inner {
    index: HashMap<RecordId, usize>,
    records: Vec<Record>,
}

#[derive(Debug, Default)]
pub struct DedupAccumulator {
    inner: Mutex<Inner>,
}

impl DedupAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every record whose key is not yet present.
    ///
    /// Returns the number of newly inserted records.
    pub fn absorb<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = Record>,
    {
        let mut inner = self.inner.lock();
        let mut inserted = 0usize;
        for record in records {
            if inner.index.contains_key(record.id()) {
                continue;
            }
            let pos = inner.records.len();
            inner.index.insert(record.id().clone(), pos);
            inner.records.push(record);
            inserted += 1;
        }
        inserted
    }

    pub fn get(&self, id: &RecordId) -> Option<Record> {
        let inner = self.inner.lock();
        inner.index.get(id).map(|&pos| inner.records[pos].clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current records in first-insertion order.
    pub fn snapshot(&self) -> Vec<Record> {
        self.inner.lock().records.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn rec(id: &str, title: &str) -> Record {
        Record::from_payload(json!({"id": id, "title": title})).unwrap()
    }

    #[test]
    fn absorb_reports_new_only() {
        let acc = DedupAccumulator::new();
        assert_eq!(acc.absorb(vec![rec("a", "1"), rec("b", "1")]), 2);
        assert_eq!(acc.absorb(vec![rec("b", "2"), rec("c", "2")]), 1);
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn duplicate_within_one_batch_counts_once() {
        let acc = DedupAccumulator::new();
        assert_eq!(acc.absorb(vec![rec("a", "first"), rec("a", "second")]), 1);
        assert_eq!(acc.get(&RecordId::new("a")).unwrap().payload()["title"], "first");
    }

    #[test]
    fn first_seen_payload_wins() {
        let acc = DedupAccumulator::new();
        acc.absorb(vec![rec("c1", "batch one")]);
        acc.absorb(vec![rec("c1", "batch two")]);
        let snap = acc.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].payload()["title"], "batch one");
    }

    #[test]
    fn numeric_and_string_ids_do_not_collide() {
        let acc = DedupAccumulator::new();
        let batch = vec![
            Record::from_payload(json!({"id": 1, "title": "numeric"})).unwrap(),
            Record::from_payload(json!({"id": "1", "title": "string"})).unwrap(),
        ];
        assert_eq!(acc.absorb(batch), 2);
        assert_eq!(acc.get(&RecordId::from(1)).unwrap().payload()["title"], "numeric");
        assert_eq!(acc.get(&RecordId::new("1")).unwrap().payload()["title"], "string");
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let acc = DedupAccumulator::new();
        acc.absorb(vec![rec("z", ""), rec("a", "")]);
        acc.absorb(vec![rec("m", ""), rec("a", "")]);
        let ids: Vec<String> = acc.snapshot().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn concurrent_absorb_keeps_keys_unique() {
        let acc = Arc::new(DedupAccumulator::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let acc = Arc::clone(&acc);
                thread::spawn(move || {
                    // Overlapping key ranges across threads.
                    let batch: Vec<Record> =
                        (t * 10..t * 10 + 30).map(|i| rec(&i.to_string(), "")).collect();
                    acc.absorb(batch)
                })
            })
            .collect();
        let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(inserted, 100);
        assert_eq!(acc.len(), 100);
    }
}
