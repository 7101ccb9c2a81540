use proptest::prelude::*;
use std::collections::HashMap;
use suspense_store::letter::next_letter;
use suspense_store::SuspenseStore;

/// Value of a token read as a bijective base-52 numeral, with the empty
/// token at zero.
fn token_value(token: &str) -> u64 {
  token.bytes().fold(0, |value, b| {
    let rank = match b {
      b'a'..=b'z' => b - b'a',
      _ => 26 + b - b'A',
    };
    value * 52 + u64::from(rank) + 1
  })
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  #[test]
  fn successor_increments_token_value(token in "[a-zA-Z]{0,6}") {
    prop_assert_eq!(token_value(&next_letter(&token)), token_value(&token) + 1);
  }

  #[test]
  fn successor_stays_in_the_alphabet(token in "[a-zA-Z]{0,6}") {
    let next = next_letter(&token);
    prop_assert!(next.bytes().all(|b| b.is_ascii_alphabetic()));
    prop_assert!(next.len() >= token.len());
  }

  #[test]
  fn distinct_cache_keys_mint_distinct_boundary_ids(
    ops in prop::collection::vec((0usize..3, 0usize..64), 1..96),
  ) {
    const PARENTS: [&str; 3] = ["", "root", "root:a"];
    let mut store = SuspenseStore::new();
    let mut by_key: HashMap<usize, String> = HashMap::new();
    let mut taken: HashMap<String, usize> = HashMap::new();
    for (parent, key) in ops {
      let id = store.create_boundary_id(PARENTS[parent], &format!("k{key}"));
      match by_key.get(&key) {
        Some(prev) => prop_assert_eq!(prev, &id),
        None => {
          by_key.insert(key, id.clone());
          if let Some(clash) = taken.insert(id.clone(), key) {
            prop_assert!(false, "id {} minted for keys k{} and k{}", id, clash, key);
          }
        }
      }
    }
  }

  #[test]
  fn boundary_reset_replays_any_prefix(count in 1usize..64) {
    let mut store = SuspenseStore::new();
    let first: Vec<String> = (0..count)
      .map(|i| store.create_boundary_id("root", &format!("first-{i}")))
      .collect();
    store.reset_boundary("root");
    let second: Vec<String> = (0..count)
      .map(|i| store.create_boundary_id("root", &format!("second-{i}")))
      .collect();
    prop_assert_eq!(first, second);
  }

  #[test]
  fn cached_recall_leaves_counters_alone(repeats in 1usize..16) {
    let mut store = SuspenseStore::new();
    let pinned = store.create_boundary_id("root", "pinned");
    for _ in 0..repeats {
      prop_assert_eq!(&store.create_boundary_id("root", "pinned"), &pinned);
    }
    prop_assert_eq!(store.create_boundary_id("root", "next"), "root:b");
  }
}
