//! Binary search over a node's sorted keys, in the two modes the tree needs.

/// How a probe result is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Pick the child slot to descend into.  An exact hit routes to the
    /// right child: equal keys live in the right subtree, and `find` after a
    /// split depends on that.
    Child,
    /// Find the position where an entry is, or would be inserted.
    Entry,
}

/// Returns `(index, found)` for `probe` within the sorted `keys`.
pub fn binary_search(keys: &[String], probe: &str, mode: Mode) -> (usize, bool) {
    match keys.binary_search_by(|k| k.as_str().cmp(probe)) {
        Ok(i) => match mode {
            Mode::Child => (i + 1, true),
            Mode::Entry => (i, true),
        },
        Err(i) => (i, false),
    }
}

#[cfg(test)]
fn probe_keys() -> Vec<String> {
    ["a", "c", "e", "g", "i"].iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_child_mode_positions() {
    let keys = probe_keys();
    assert_eq!(binary_search(&keys, "b", Mode::Child), (1, false));
    assert_eq!(binary_search(&keys, "c", Mode::Child), (2, true));
    assert_eq!(binary_search(&keys, "j", Mode::Child), (5, false));
}

#[test]
fn test_entry_mode_positions() {
    let keys = probe_keys();
    assert_eq!(binary_search(&keys, "a", Mode::Entry), (0, true));
    assert_eq!(binary_search(&keys, "b", Mode::Entry), (1, false));
    assert_eq!(binary_search(&keys, "i", Mode::Entry), (4, true));
    assert_eq!(binary_search(&keys, "", Mode::Entry), (0, false));
}
