//! An agent's persistent notes.
//!
//! Notes are shown to the model as an enumerated list (`0. first`). A
//! decision may delete notes by those indices, so deletions are checked
//! against the [`NoteEnumeration`] taken when the list was rendered: any
//! change to the list bumps its generation, and indices from an older
//! generation are ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notes {
    entries: Vec<String>,
    #[serde(default)]
    generation: u64,
}

/// Snapshot of the note list as it was enumerated for one prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEnumeration {
    generation: u64,
    len: usize,
}

impl NoteEnumeration {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Notes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = String>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            generation: 0,
        }
    }

    pub fn enumerate(&self) -> NoteEnumeration {
        NoteEnumeration {
            generation: self.generation,
            len: self.entries.len(),
        }
    }

    /// `index. note` lines, one per note.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, note)| format!("{}. {}", i, note))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Delete notes by index. Returns how many were removed.
    ///
    /// Indices that are negative, out of range for `enumeration`, or taken
    /// from a stale enumeration are ignored.
    pub fn delete_indices(&mut self, indices: &[i64], enumeration: &NoteEnumeration) -> usize {
        if enumeration.generation != self.generation {
            return 0;
        }
        let limit = enumeration.len.min(self.entries.len());
        let doomed: std::collections::BTreeSet<usize> = indices
            .iter()
            .filter_map(|&i| usize::try_from(i).ok())
            .filter(|&i| i < limit)
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        let mut index = 0;
        self.entries.retain(|_| {
            let keep = !doomed.contains(&index);
            index += 1;
            keep
        });
        self.generation += 1;
        doomed.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }

    pub fn add(&mut self, note: impl Into<String>) {
        self.entries.push(note.into());
        self.generation += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(n: usize) -> Notes {
        Notes::from_entries((0..n).map(|i| format!("n{}", i)))
    }

    #[test]
    fn test_render_is_zero_based() {
        assert_eq!(notes(2).render(), "0. n0\n1. n1");
        assert_eq!(Notes::new().render(), "");
    }

    #[test]
    fn test_delete_by_index() {
        let mut n = notes(4);
        let e = n.enumerate();
        assert_eq!(n.delete_indices(&[2, 0, 2], &e), 2);
        assert_eq!(n.iter().collect::<Vec<_>>(), vec!["n1", "n3"]);
    }

    #[test]
    fn test_out_of_range_and_negative_ignored() {
        let mut n = notes(2);
        let e = n.enumerate();
        assert_eq!(n.delete_indices(&[5, -1], &e), 0);
        assert_eq!(n.len(), 2);
    }

    #[test]
    fn test_stale_enumeration_is_ignored() {
        let mut n = notes(3);
        let stale = n.enumerate();
        n.add("n3");
        assert_eq!(n.delete_indices(&[0], &stale), 0);
        assert_eq!(n.len(), 4);

        let fresh = n.enumerate();
        assert_eq!(n.delete_indices(&[0], &fresh), 1);
    }

    #[test]
    fn test_delete_after_clear_is_noop() {
        let mut n = notes(3);
        let e = n.enumerate();
        n.clear();
        assert_eq!(n.delete_indices(&[0], &e), 0);
        assert!(n.is_empty());
    }
}
