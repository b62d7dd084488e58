//! Hash-based relational joins over row slices.
//!
//! Output preserves left order, then right order for duplicate keys.
//! A `None` key never matches anything.

use std::collections::HashMap;
use std::hash::Hash;

/// Index `rows` by key, keeping input order within each bucket.
pub fn index_by<'a, T, K, F>(rows: &'a [T], key: F) -> HashMap<K, Vec<&'a T>>
where
    K: Eq + Hash,
    F: Fn(&T) -> Option<K>,
{
    let mut index: HashMap<K, Vec<&T>> = HashMap::new();
    for row in rows {
        if let Some(k) = key(row) {
            index.entry(k).or_default().push(row);
        }
    }
    index
}

/// Rows of `left` paired with every matching row of `right`.
pub fn inner_join<'l, 'r, L, R, K, O>(
    left: &'l [L],
    right: &'r [R],
    left_key: impl Fn(&L) -> Option<K>,
    right_key: impl Fn(&R) -> Option<K>,
    mut merge: impl FnMut(&'l L, &'r R) -> O,
) -> Vec<O>
where
    K: Eq + Hash,
{
    let index = index_by(right, right_key);
    let mut out = Vec::with_capacity(left.len());

    for l in left {
        let Some(matches) = left_key(l).and_then(|k| index.get(&k)) else {
            continue;
        };
        for &r in matches {
            out.push(merge(l, r));
        }
    }

    out
}

/// Every row of `left`, paired with its matches in `right` or with `None`.
pub fn left_join<'l, 'r, L, R, K, O>(
    left: &'l [L],
    right: &'r [R],
    left_key: impl Fn(&L) -> Option<K>,
    right_key: impl Fn(&R) -> Option<K>,
    mut merge: impl FnMut(&'l L, Option<&'r R>) -> O,
) -> Vec<O>
where
    K: Eq + Hash,
{
    let index = index_by(right, right_key);
    let mut out = Vec::with_capacity(left.len());

    for l in left {
        match left_key(l).and_then(|k| index.get(&k)) {
            Some(matches) => {
                for &r in matches {
                    out.push(merge(l, Some(r)));
                }
            }
            None => out.push(merge(l, None)),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_join_drops_unmatched() {
        let left = vec![(1, "a"), (2, "b"), (3, "c")];
        let right = vec![(1, "x"), (3, "y")];

        let joined = inner_join(
            &left,
            &right,
            |l| Some(l.0),
            |r| Some(r.0),
            |l, r| (l.1, r.1),
        );

        assert_eq!(joined, vec![("a", "x"), ("c", "y")]);
    }

    #[test]
    fn test_inner_join_multiplies_duplicates_in_order() {
        let left = vec![(1, "a")];
        let right = vec![(1, "x"), (2, "z"), (1, "y")];

        let joined = inner_join(
            &left,
            &right,
            |l| Some(l.0),
            |r| Some(r.0),
            |_, r| r.1,
        );

        assert_eq!(joined, vec!["x", "y"]);
    }

    #[test]
    fn test_left_join_keeps_unmatched() {
        let left = vec![(Some(1), "a"), (None, "b"), (Some(9), "c")];
        let right = vec![(1, "x")];

        let joined = left_join(
            &left,
            &right,
            |l| l.0,
            |r| Some(r.0),
            |l, r| (l.1, r.map(|r| r.1)),
        );

        assert_eq!(joined, vec![("a", Some("x")), ("b", None), ("c", None)]);
    }

    #[test]
    fn test_none_keys_never_match() {
        let left: Vec<Option<i32>> = vec![None];
        let right: Vec<Option<i32>> = vec![None];

        let joined = inner_join(&left, &right, |l| *l, |r| *r, |_, _| ());
        assert!(joined.is_empty());
    }
}
