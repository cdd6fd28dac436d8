use flatblog_types::PostId;

/// Ascending set of approved post identifiers.
///
/// Backed by a sorted `Vec` so pages of the newest posts are plain slices
/// taken from the tail. Inserts and removals keep the order and never
/// introduce duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValiditySet {
    ids: Vec<PostId>,
}

impl ValiditySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` approved. Returns `false` if it already was.
    pub fn insert(&mut self, id: PostId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.ids.insert(pos, id);
                true
            }
        }
    }

    /// Withdraw approval of `id`. Returns `false` if it was not approved.
    pub fn remove(&mut self, id: PostId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(pos) => {
                self.ids.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, id: PostId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_slice(&self) -> &[PostId] {
        &self.ids
    }

    /// Identifiers on zero-based `page`, newest first.
    ///
    /// Page 0 holds the `page_size` highest identifiers; pages past the end
    /// are empty.
    pub fn newest_first(&self, page: usize, page_size: usize) -> Vec<PostId> {
        let skip = match page.checked_mul(page_size) {
            Some(skip) if skip < self.ids.len() => skip,
            _ => return Vec::new(),
        };
        let end = self.ids.len() - skip;
        let start = end.saturating_sub(page_size);
        self.ids[start..end].iter().rev().copied().collect()
    }
}

impl FromIterator<PostId> for ValiditySet {
    fn from_iter<I: IntoIterator<Item = PostId>>(iter: I) -> Self {
        let mut ids: Vec<PostId> = iter.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn set(ids: &[u64]) -> ValiditySet {
        ids.iter().copied().map(PostId::new).collect()
    }

    fn raw(set: &ValiditySet) -> Vec<u64> {
        set.as_slice().iter().map(|id| id.get()).collect()
    }

    #[test]
    fn remove_and_restore_keep_order() {
        let mut valid = set(&[0, 1, 2, 3, 4, 5]);

        valid.remove(PostId::new(2));
        assert_eq!(raw(&valid), [0, 1, 3, 4, 5]);

        valid.remove(PostId::new(3));
        assert_eq!(raw(&valid), [0, 1, 4, 5]);

        valid.insert(PostId::new(3));
        assert_eq!(raw(&valid), [0, 1, 3, 4, 5]);

        valid.insert(PostId::new(6));
        valid.insert(PostId::new(7));
        valid.insert(PostId::new(8));
        assert_eq!(raw(&valid), [0, 1, 3, 4, 5, 6, 7, 8]);

        valid.remove(PostId::new(7));
        assert_eq!(raw(&valid), [0, 1, 3, 4, 5, 6, 8]);
    }

    #[test]
    fn repeated_operations_are_idempotent() {
        let mut valid = set(&[1, 2]);
        assert!(!valid.insert(PostId::new(2)));
        assert_eq!(raw(&valid), [1, 2]);
        assert!(valid.remove(PostId::new(2)));
        assert!(!valid.remove(PostId::new(2)));
        assert_eq!(raw(&valid), [1]);
    }

    #[test]
    fn pages_walk_backwards_from_the_tail() {
        let valid = set(&[0, 1, 2, 3, 4, 5, 6]);
        let page = |n| -> Vec<u64> { valid.newest_first(n, 5).into_iter().map(PostId::get).collect() };
        assert_eq!(page(0), [6, 5, 4, 3, 2]);
        assert_eq!(page(1), [1, 0]);
        assert!(page(2).is_empty());
        assert!(page(usize::MAX).is_empty());
    }

    #[test]
    fn empty_set_has_empty_pages() {
        assert!(ValiditySet::new().newest_first(0, 5).is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u64),
        Remove(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0u64..32).prop_map(Op::Insert), (0u64..32).prop_map(Op::Remove)]
    }

    proptest! {
        #[test]
        fn behaves_like_an_ordered_set(ops in proptest::collection::vec(op(), 0..64)) {
            let mut valid = ValiditySet::new();
            let mut model = BTreeSet::new();
            for op in ops {
                match op {
                    Op::Insert(id) => prop_assert_eq!(valid.insert(PostId::new(id)), model.insert(id)),
                    Op::Remove(id) => prop_assert_eq!(valid.remove(PostId::new(id)), model.remove(&id)),
                }
                prop_assert!(valid.as_slice().windows(2).all(|w| w[0] < w[1]));
            }
            prop_assert_eq!(raw(&valid), model.into_iter().collect::<Vec<_>>());
        }

        #[test]
        fn pages_partition_the_set(ids in proptest::collection::btree_set(0u64..500, 0..40), size in 1usize..8) {
            let valid: ValiditySet = ids.iter().copied().map(PostId::new).collect();
            let mut seen = Vec::new();
            let mut page = 0;
            loop {
                let ids = valid.newest_first(page, size);
                if ids.is_empty() {
                    break;
                }
                prop_assert!(ids.len() <= size);
                seen.extend(ids);
                page += 1;
            }
            let expected: Vec<PostId> = valid.as_slice().iter().rev().copied().collect();
            prop_assert_eq!(seen, expected);
        }
    }
}
