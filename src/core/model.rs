//! core::model
//!
//! Value types returned by the repository service.
//!
//! Everything here is derived from the open repository on demand and owned
//! by the caller afterwards. Nothing in this module touches git.
//!
//! # Status classification
//!
//! A [`StatusEntry`] carries the raw [`StatusFlags`] for one path. A
//! [`StatusSnapshot`] sorts entries into buckets:
//!
//! - **staged**: any index-level flag is set
//! - **untracked**: the path is new in the worktree
//! - **unstaged**: the worktree copy is modified, deleted, renamed, retyped or conflicted
//! - **ignored**: matched by an ignore rule (reported, never counted as a change)
//!
//! One path may land in both `staged` and `unstaged` when index and worktree
//! both differ.
//!
//! ```
//! use gitward::core::model::{StatusEntry, StatusFlags, StatusSnapshot};
//!
//! let snapshot = StatusSnapshot::from_entries(vec![
//!     StatusEntry::new("a.txt", StatusFlags::INDEX_MODIFIED | StatusFlags::WT_MODIFIED),
//!     StatusEntry::new("new.txt", StatusFlags::WT_NEW),
//! ]);
//! assert_eq!(snapshot.staged.len(), 1);
//! assert_eq!(snapshot.unstaged.len(), 1);
//! assert_eq!(snapshot.untracked.len(), 1);
//! assert!(!snapshot.clean);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::Oid;

/// Bitset of per-path status flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusFlags(u16);

impl StatusFlags {
    pub const INDEX_NEW: Self = Self(1 << 0);
    pub const INDEX_MODIFIED: Self = Self(1 << 1);
    pub const INDEX_DELETED: Self = Self(1 << 2);
    pub const INDEX_RENAMED: Self = Self(1 << 3);
    pub const INDEX_TYPECHANGE: Self = Self(1 << 4);
    pub const WT_NEW: Self = Self(1 << 5);
    pub const WT_MODIFIED: Self = Self(1 << 6);
    pub const WT_DELETED: Self = Self(1 << 7);
    pub const WT_RENAMED: Self = Self(1 << 8);
    pub const WT_TYPECHANGE: Self = Self(1 << 9);
    pub const IGNORED: Self = Self(1 << 10);
    pub const CONFLICTED: Self = Self(1 << 11);

    const INDEX_ANY: Self = Self(0b1_1111);
    const WT_CHANGED: Self = Self((1 << 6) | (1 << 7) | (1 << 8) | (1 << 9) | (1 << 11));

    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build from raw bits, discarding unknown ones.
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & 0x0fff)
    }

    /// The raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True if every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag in `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Staged: any index-level flag.
    pub const fn is_staged(self) -> bool {
        self.intersects(Self::INDEX_ANY)
    }

    /// Untracked: new in the worktree and not in the index.
    pub const fn is_untracked(self) -> bool {
        self.contains(Self::WT_NEW)
    }

    /// Unstaged: the worktree copy differs from the index.
    pub const fn is_unstaged(self) -> bool {
        self.intersects(Self::WT_CHANGED)
    }

    pub const fn is_ignored(self) -> bool {
        self.contains(Self::IGNORED)
    }
}

impl std::ops::BitOr for StatusFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for StatusFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Status of a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Path relative to the worktree root.
    pub path: String,
    pub flags: StatusFlags,
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, flags: StatusFlags) -> Self {
        Self {
            path: path.into(),
            flags,
        }
    }
}

/// Classified working tree status.
///
/// Invariant: `clean` is true iff `staged`, `unstaged` and `untracked` are all empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub staged: Vec<StatusEntry>,
    pub unstaged: Vec<StatusEntry>,
    pub untracked: Vec<StatusEntry>,
    pub ignored: Vec<StatusEntry>,
    pub clean: bool,
}

impl StatusSnapshot {
    /// Classify raw entries into buckets.
    pub fn from_entries(entries: impl IntoIterator<Item = StatusEntry>) -> Self {
        let mut snapshot = Self::default();

        for entry in entries {
            let flags = entry.flags;
            if flags.is_ignored() && !flags.is_staged() {
                snapshot.ignored.push(entry);
                continue;
            }
            if flags.is_staged() {
                snapshot.staged.push(entry.clone());
            }
            if flags.is_untracked() {
                snapshot.untracked.push(entry);
            } else if flags.is_unstaged() {
                snapshot.unstaged.push(entry);
            }
        }

        snapshot.clean =
            snapshot.staged.is_empty() && snapshot.unstaged.is_empty() && snapshot.untracked.is_empty();
        snapshot
    }

    /// Paths with worktree-level changes (untracked or unstaged), in enumeration order.
    pub fn modified_paths(&self) -> Vec<String> {
        self.untracked
            .iter()
            .chain(self.unstaged.iter())
            .map(|e| e.path.clone())
            .collect()
    }

    /// Every path the snapshot mentions once, with its flags. Used for fingerprinting.
    pub fn flag_pairs(&self) -> Vec<(String, u16)> {
        let mut pairs: Vec<(String, u16)> = self
            .staged
            .iter()
            .chain(&self.unstaged)
            .chain(&self.untracked)
            .map(|e| (e.path.clone(), e.flags.bits()))
            .collect();
        pairs.sort();
        pairs.dedup();
        pairs
    }
}

/// Author or committer identity with timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub email: String,
    pub time: DateTime<Utc>,
}

/// A commit as read from history. Immutable; `id` is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: Oid,
    pub short_id: String,
    pub author: Person,
    pub committer: Person,
    /// Full message with surrounding whitespace trimmed.
    pub message: String,
    /// First line of the message.
    pub summary: String,
    pub parent_count: usize,
    pub parent_ids: Vec<Oid>,
    /// Result of the configured signature policy.
    pub verified: bool,
}

impl CommitRecord {
    pub fn is_merge(&self) -> bool {
        self.parent_count > 1
    }
}

/// Whether a branch is local or remote-tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchKind {
    Local,
    Remote,
}

impl std::fmt::Display for BranchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BranchKind::Local => f.write_str("local"),
            BranchKind::Remote => f.write_str("remote"),
        }
    }
}

/// A branch as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    /// Short name (`main`, `origin/main`).
    pub name: String,
    pub kind: BranchKind,
    pub is_current: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod flags {
        use super::*;

        #[test]
        fn index_flags_are_staged() {
            for f in [
                StatusFlags::INDEX_NEW,
                StatusFlags::INDEX_MODIFIED,
                StatusFlags::INDEX_DELETED,
                StatusFlags::INDEX_RENAMED,
                StatusFlags::INDEX_TYPECHANGE,
            ] {
                assert!(f.is_staged());
                assert!(!f.is_unstaged());
            }
        }

        #[test]
        fn worktree_new_is_untracked_only() {
            let f = StatusFlags::WT_NEW;
            assert!(f.is_untracked());
            assert!(!f.is_unstaged());
            assert!(!f.is_staged());
        }

        #[test]
        fn conflicted_counts_as_unstaged() {
            assert!(StatusFlags::CONFLICTED.is_unstaged());
        }

        #[test]
        fn truncate_drops_unknown_bits() {
            assert_eq!(StatusFlags::from_bits_truncate(0xffff).bits(), 0x0fff);
        }
    }

    mod snapshot {
        use super::*;

        #[test]
        fn empty_is_clean() {
            let s = StatusSnapshot::from_entries(Vec::new());
            assert!(s.clean);
        }

        #[test]
        fn staged_and_unstaged_same_path() {
            let s = StatusSnapshot::from_entries(vec![StatusEntry::new(
                "a.txt",
                StatusFlags::INDEX_MODIFIED | StatusFlags::WT_MODIFIED,
            )]);
            assert_eq!(s.staged.len(), 1);
            assert_eq!(s.unstaged.len(), 1);
            assert!(s.untracked.is_empty());
            assert!(!s.clean);
        }

        #[test]
        fn ignored_does_not_dirty() {
            let s = StatusSnapshot::from_entries(vec![StatusEntry::new(
                "target/out",
                StatusFlags::IGNORED,
            )]);
            assert!(s.clean);
            assert_eq!(s.ignored.len(), 1);
        }

        #[test]
        fn modified_paths_cover_worktree_changes() {
            let s = StatusSnapshot::from_entries(vec![
                StatusEntry::new("new.txt", StatusFlags::WT_NEW),
                StatusEntry::new("gone.txt", StatusFlags::WT_DELETED),
                StatusEntry::new("staged.txt", StatusFlags::INDEX_NEW),
            ]);
            assert_eq!(s.modified_paths(), vec!["new.txt", "gone.txt"]);
        }

        #[test]
        fn flag_pairs_deduplicates() {
            let s = StatusSnapshot::from_entries(vec![StatusEntry::new(
                "a.txt",
                StatusFlags::INDEX_MODIFIED | StatusFlags::WT_MODIFIED,
            )]);
            assert_eq!(s.flag_pairs().len(), 1);
        }
    }

    #[test]
    fn branch_kind_serializes_lowercase() {
        let json = serde_json::to_string(&BranchKind::Remote).unwrap();
        assert_eq!(json, "\"remote\"");
    }
}
