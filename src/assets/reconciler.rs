// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::batch::UploadedFile;
use super::correlator::AssetEntry;
use super::directory::AssetDirectory;
use super::store::{AssetError, AssetStore, DeleteOutcome};
use std::collections::HashSet;

/// Tracks the files one save wrote and the files it made obsolete.
///
/// Exactly one of [`AssetLedger::rollback`] or [`AssetLedger::reclaim`] settles the ledger.
/// Dropping an unsettled ledger rolls back, so an early return never leaves new files behind.
pub struct AssetLedger<'a> {
    store: &'a AssetStore,
    written: Vec<String>,
    superseded: Vec<String>,
    settled: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReclaimSummary {
    pub deleted: usize,
    pub kept: usize,
}

impl<'a> AssetLedger<'a> {
    pub fn new(store: &'a AssetStore) -> Self {
        Self {
            store,
            written: Vec::new(),
            superseded: Vec::new(),
            settled: false,
        }
    }

    pub fn store_file(
        &mut self,
        file: UploadedFile,
        dir: &AssetDirectory,
        prefix: &str,
    ) -> Result<String, AssetError> {
        let stored = self.store.save(file, dir, prefix)?;
        self.written.push(stored.clone());
        Ok(stored)
    }

    /// Marks an existing path obsolete. It is deleted only after a successful commit.
    pub fn supersede(&mut self, path: &str) {
        if path.is_empty() || self.superseded.iter().any(|known| known == path) {
            return;
        }
        self.superseded.push(path.to_string());
    }

    pub fn written(&self) -> &[String] {
        &self.written
    }

    pub fn superseded(&self) -> &[String] {
        &self.superseded
    }

    /// Removes every file written during this save. Superseded files stay untouched.
    pub fn rollback(mut self) -> usize {
        self.settled = true;
        self.remove_written()
    }

    /// Deletes superseded files that the committed record no longer references.
    pub fn reclaim(mut self, still_referenced: &HashSet<String>) -> ReclaimSummary {
        self.settled = true;
        let mut summary = ReclaimSummary::default();
        for path in &self.superseded {
            if still_referenced.contains(path) {
                summary.kept += 1;
                continue;
            }
            if self.store.delete(path) == DeleteOutcome::Removed {
                summary.deleted += 1;
            }
        }
        summary
    }

    fn remove_written(&mut self) -> usize {
        let mut removed = 0;
        for path in self.written.drain(..) {
            if self.store.delete(&path) == DeleteOutcome::Removed {
                removed += 1;
            }
        }
        if removed > 0 {
            log::info!("Rolled back {} newly written asset(s)", removed);
        }
        removed
    }
}

impl Drop for AssetLedger<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.remove_written();
        }
    }
}

/// Schedules the assets of entries named in `delete_ids` and removes those entries from
/// `entries`. Paths come from `existing` so a client cannot name arbitrary files.
pub fn apply_delete_list<T: AssetEntry>(
    entries: &mut Vec<T>,
    existing: &[T],
    delete_ids: &[String],
    ledger: &mut AssetLedger<'_>,
) -> usize {
    if delete_ids.is_empty() {
        return 0;
    }
    let doomed: HashSet<&str> = delete_ids.iter().map(String::as_str).collect();
    for old in existing {
        if let Some(id) = old.entry_id()
            && doomed.contains(id)
        {
            ledger.supersede(old.asset_path());
        }
    }
    let before = entries.len();
    entries.retain(|entry| {
        entry
            .entry_id()
            .map(|id| !doomed.contains(id))
            .unwrap_or(true)
    });
    let removed = before - entries.len();
    log::debug!(
        "Delete list removed {} {} entr(ies) of {} requested",
        removed,
        T::KIND,
        delete_ids.len()
    );
    removed
}

/// Schedules the stored path of every resubmitted entry that no longer points at it, whether
/// the entry was rebound, lost its echoed path or is about to be dropped as assetless.
pub fn supersede_abandoned<T: AssetEntry>(
    entries: &[T],
    existing: &[T],
    ledger: &mut AssetLedger<'_>,
) -> usize {
    let mut scheduled = 0;
    for entry in entries {
        let Some(old) = entry
            .entry_id()
            .and_then(|id| existing.iter().find(|old| old.entry_id() == Some(id)))
        else {
            continue;
        };
        if !old.asset_path().is_empty() && old.asset_path() != entry.asset_path() {
            ledger.supersede(old.asset_path());
            scheduled += 1;
        }
    }
    scheduled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::correlator::tests::Tile;
    use crate::assets::directory::DirectoryResolver;

    fn setup() -> (tempfile::TempDir, AssetStore, AssetDirectory) {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = AssetStore::new(temp.path());
        let dir = DirectoryResolver::new(temp.path(), "projects").directory("demo");
        (temp, store, dir)
    }

    fn upload() -> UploadedFile {
        UploadedFile::in_memory("cardImage", "card.png", "image/png", vec![1, 2, 3])
    }

    #[test]
    fn rollback_removes_written_files_only() {
        let (_temp, store, dir) = setup();
        let kept = store.save(upload(), &dir, "card").expect("seed");
        let mut ledger = AssetLedger::new(&store);
        let written = ledger.store_file(upload(), &dir, "card").expect("write");
        ledger.supersede(&kept);

        assert_eq!(ledger.rollback(), 1);
        assert!(!store.exists(&written));
        assert!(store.exists(&kept));
    }

    #[test]
    fn dropping_unsettled_ledger_rolls_back() {
        let (_temp, store, dir) = setup();
        let written = {
            let mut ledger = AssetLedger::new(&store);
            ledger.store_file(upload(), &dir, "card").expect("write")
        };
        assert!(!store.exists(&written));
    }

    #[test]
    fn reclaim_skips_paths_still_referenced() {
        let (_temp, store, dir) = setup();
        let old = store.save(upload(), &dir, "card").expect("old");
        let shared = store.save(upload(), &dir, "card").expect("shared");
        let mut ledger = AssetLedger::new(&store);
        let fresh = ledger.store_file(upload(), &dir, "card").expect("fresh");
        ledger.supersede(&old);
        ledger.supersede(&shared);
        ledger.supersede(&old);

        let keep: HashSet<String> = [shared.clone(), fresh.clone()].into_iter().collect();
        let summary = ledger.reclaim(&keep);

        assert_eq!(summary, ReclaimSummary { deleted: 1, kept: 1 });
        assert!(!store.exists(&old));
        assert!(store.exists(&shared));
        assert!(store.exists(&fresh));
    }

    #[test]
    fn delete_list_uses_existing_paths() {
        let (_temp, store, _dir) = setup();
        let existing = vec![
            Tile::new("pool").with_path("uploads/projects/demo/pool.svg"),
            Tile::new("gym").with_path("uploads/projects/demo/gym.svg"),
        ];
        let mut entries = vec![
            Tile::new("pool").with_path("uploads/projects/demo/forged.svg"),
            Tile::new("gym").with_path("uploads/projects/demo/gym.svg"),
        ];
        let mut ledger = AssetLedger::new(&store);

        let removed = apply_delete_list(&mut entries, &existing, &["pool".to_string()], &mut ledger);

        assert_eq!(removed, 1);
        assert_eq!(entries.len(), 1);
        assert_eq!(ledger.superseded(), ["uploads/projects/demo/pool.svg".to_string()]);
        ledger.reclaim(&HashSet::new());
    }

    #[test]
    fn abandoned_stored_paths_are_scheduled() {
        let (_temp, store, _dir) = setup();
        let existing = vec![
            Tile::new("a").with_path("uploads/projects/demo/a.png"),
            Tile::new("b").with_path("uploads/projects/demo/b.png"),
            Tile::new("c").with_path("uploads/projects/demo/c.png"),
        ];
        let entries = vec![
            Tile::new("a").with_path("uploads/projects/demo/a.png"),
            Tile::new("b"),
            Tile::new("new").with_path("uploads/projects/demo/fresh.png"),
        ];
        let mut ledger = AssetLedger::new(&store);

        assert_eq!(supersede_abandoned(&entries, &existing, &mut ledger), 1);
        assert_eq!(ledger.superseded(), ["uploads/projects/demo/b.png".to_string()]);
        ledger.reclaim(&HashSet::new());
    }
}
