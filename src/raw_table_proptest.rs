#![cfg(test)]

// Property tests for RawTable kept inside the crate so they can
// cross-check the cached counters against the slot array itself.
//
// Property 1: behavioral equivalence with std::collections::HashMap
//   under random put/remove/get/contains sequences.
// Property 2: structural invariants hold after every operation:
//   - capacity >= MIN_CAPACITY
//   - count <= load < capacity (an Empty slot always remains while
//     allocation succeeds)
//   - cached count/load equal a recount of the slot array
// Pool-indexed keys improve shrinking: indices shrink toward earlier
// keys and op lists shrink in length.

use crate::raw_table::{RawTable, MIN_CAPACITY};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug)]
enum Op {
    Put(usize, i64),
    Remove(usize),
    Get(usize),
    Contains(usize),
}

fn op_strategy(pool: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..pool, any::<i64>()).prop_map(|(k, v)| Op::Put(k, v)),
        (0..pool).prop_map(Op::Remove),
        (0..pool).prop_map(Op::Get),
        (0..pool).prop_map(Op::Contains),
    ]
}

fn check_invariants(t: &RawTable<i64>) {
    assert!(t.capacity() >= MIN_CAPACITY);
    let (occupied, non_empty) = t.recount();
    assert_eq!(occupied, t.count(), "cached count drifted from slots");
    assert_eq!(non_empty, t.load(), "cached load drifted from slots");
    assert!(t.count() <= t.load());
    assert!(
        t.load() < t.capacity(),
        "resize policy must keep an Empty slot"
    );
}

proptest! {
    #[test]
    fn prop_matches_std_hashmap(
        pool in 1usize..=12,
        ops in proptest::collection::vec(any::<(u8, usize, i64)>(), 1..200),
    ) {
        let mut table: RawTable<i64> = RawTable::new().unwrap();
        let mut model: HashMap<String, i64> = HashMap::new();

        for (op, raw_k, v) in ops {
            let key = format!("k{}", raw_k % pool);
            match op % 4 {
                0 => {
                    let displaced = table.put(&key, v).unwrap();
                    let expected = model.insert(key.clone(), v);
                    prop_assert_eq!(displaced, expected);
                }
                1 => {
                    prop_assert_eq!(table.remove(&key), model.remove(&key));
                }
                2 => {
                    prop_assert_eq!(table.get(&key), model.get(&key));
                }
                _ => {
                    prop_assert_eq!(table.contains(&key), model.contains_key(&key));
                }
            }
            prop_assert_eq!(table.count(), model.len());
            check_invariants(&table);
        }

        for (key, value) in &model {
            prop_assert_eq!(table.get(key), Some(value));
        }
    }

    #[test]
    fn prop_invariants_under_ops(
        pool in 1usize..=8,
        ops in proptest::collection::vec(op_strategy(8), 1..300),
    ) {
        let mut table: RawTable<i64> = RawTable::new().unwrap();
        for op in ops {
            match op {
                Op::Put(k, v) => {
                    table.put(&format!("k{}", k % pool), v).unwrap();
                }
                Op::Remove(k) => {
                    let _ = table.remove(&format!("k{}", k % pool));
                }
                Op::Get(k) => {
                    let _ = table.get(&format!("k{}", k % pool));
                }
                Op::Contains(k) => {
                    let _ = table.contains(&format!("k{}", k % pool));
                }
            }
            check_invariants(&table);
        }
    }
}
