//! Property-Based Tests for the LRU cache
//!
//! # Test Properties
//!
//! 1. **Capacity**: `len() <= max_size` after every put
//! 2. **Recency**: the last key written or read is always last in order
//! 3. **Model agreement**: contents match a naive Vec-based LRU model
//! 4. **Size accounting**: `total_size_bytes` equals the sum over live entries

#![cfg(test)]

use proptest::prelude::*;
use serde_json::json;

use super::lru::AdvancedLruCache;
use crate::config::CacheConfig;

#[derive(Debug, Clone)]
enum Op {
    Put(u8),
    Get(u8),
    Invalidate(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..16).prop_map(Op::Put),
        (0u8..16).prop_map(Op::Get),
        (0u8..16).prop_map(Op::Invalidate),
    ]
}

fn make_cache(max_size: usize) -> AdvancedLruCache {
    AdvancedLruCache::with_config(CacheConfig {
        max_size,
        ..Default::default()
    })
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_capacity_never_exceeded(
        max_size in 1usize..8,
        keys in prop::collection::vec(0u8..32, 0..100),
    ) {
        let cache = make_cache(max_size);
        for k in keys {
            cache.put(format!("k{}", k), json!(k));
            prop_assert!(cache.len() <= max_size);
        }
    }

    #[test]
    fn prop_matches_reference_model(
        max_size in 1usize..6,
        ops in prop::collection::vec(op_strategy(), 0..80),
    ) {
        let cache = make_cache(max_size);
        // Oldest first
        let mut model: Vec<String> = Vec::new();

        for op in ops {
            match op {
                Op::Put(k) => {
                    let key = format!("k{}", k);
                    cache.put(key.clone(), json!(k));
                    model.retain(|m| m != &key);
                    model.push(key.clone());
                    while model.len() > max_size {
                        model.remove(0);
                    }
                    let keys = cache.keys();
                    prop_assert_eq!(keys.last(), Some(&key));
                }
                Op::Get(k) => {
                    let key = format!("k{}", k);
                    let hit = cache.get(&key);
                    if let Some(pos) = model.iter().position(|m| m == &key) {
                        prop_assert_eq!(hit, Some(json!(k)));
                        let moved = model.remove(pos);
                        model.push(moved);
                    } else {
                        prop_assert!(hit.is_none());
                    }
                }
                Op::Invalidate(k) => {
                    let key = format!("k{}", k);
                    let was_present = model.iter().any(|m| m == &key);
                    prop_assert_eq!(cache.invalidate(&key), was_present);
                    model.retain(|m| m != &key);
                }
            }
            prop_assert_eq!(cache.keys(), model.clone());
        }
    }

    #[test]
    fn prop_size_accounting(
        values in prop::collection::vec((0u8..10, "[a-z]{0,20}"), 0..50),
    ) {
        let cache = make_cache(4);
        for (k, v) in values {
            cache.put(format!("k{}", k), json!(v));
            let expected: u64 = cache.get_entries_info().iter().map(|e| e.size_bytes).sum();
            prop_assert_eq!(cache.get_stats().total_size_bytes, expected);
        }
    }
}
