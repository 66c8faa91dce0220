//! Hash collections backed by AHash.
//!
//! Used for the pipeline cache and glyph tables where keys are small and
//! lookups are on the hot path.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_ahash() {
        let mut map = HashMap::new();
        map.insert('a', 7u32);
        assert_eq!(map.get(&'a'), Some(&7));
        assert_eq!(map.get(&'b'), None);
    }

    #[test]
    fn test_hashset_ahash() {
        let mut set = HashSet::new();
        assert!(set.insert(42u64));
        assert!(!set.insert(42u64));
    }
}
