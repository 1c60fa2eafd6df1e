//! Lexical path resolution and sandbox containment.
//!
//! Nothing in here touches the filesystem: callers that need symlink-aware
//! checks canonicalize on their side and feed the result back through
//! [`is_contained`].

use std::path::{Component, Path, PathBuf};

/// Resolves `.` and `..` and collapses repeated separators.
///
/// A `..` at the root is dropped, so the result never climbs above the
/// first root or prefix component. Relative input stays relative, with
/// leading `..` segments preserved.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(Component::ParentDir),
            },
            other => components.push(other),
        }
    }

    if components.is_empty() {
        PathBuf::from(".")
    } else {
        components.iter().collect()
    }
}

/// Resolves a user supplied fragment against the current folder.
///
/// `".."` yields the parent of `current`; anything else is joined onto it.
/// An absolute fragment replaces `current` entirely, which is why the result
/// must still go through [`is_contained`] before use.
pub fn resolve_relative(current: &Path, fragment: &str) -> PathBuf {
    if fragment == ".." {
        return normalize(current.parent().unwrap_or(current));
    }

    normalize(&current.join(fragment))
}

/// True when `candidate` equals `base` or lies below it.
///
/// The comparison is done per path segment on the normalized forms, so a
/// sibling such as `/data/foobar` is not inside `/data/foo`.
pub fn is_contained(base: &Path, candidate: &Path) -> bool {
    let base = normalize(base);
    let candidate = normalize(candidate);

    let mut candidate_segments = candidate.components();
    base.components()
        .all(|segment| candidate_segments.next() == Some(segment))
}
