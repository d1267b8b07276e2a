// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Binds uploaded files to the collection entries that describe them.
//!
//! Entries carrying an upload key are matched with the file part named `<field>[<key>]`.
//! Remaining entries are matched in order with the untagged parts of the field. On create
//! every entry is eligible; on update only entries flagged `hasNewFile` take a file. When
//! files run out, entries keep whatever path they already referenced.

use super::batch::{FieldFiles, UploadedFile};
use super::directory::AssetDirectory;
use super::reconciler::AssetLedger;
use super::store::AssetError;
use std::collections::{HashMap, HashSet};

/// A collection entry backed by one stored file.
pub trait AssetEntry {
    /// Human readable kind, used in logs.
    const KIND: &'static str;

    fn entry_id(&self) -> Option<&str>;
    fn set_entry_id(&mut self, id: String);
    fn asset_path(&self) -> &str;
    fn set_asset_path(&mut self, path: String);
    fn has_new_file(&self) -> bool;
    fn upload_key(&self) -> Option<&str>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Create,
    Update,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CorrelationReport {
    pub assigned: usize,
    /// Eligible entries that found no file.
    pub starved: usize,
    /// Files nothing claimed.
    pub unclaimed: usize,
}

/// Clears echoed paths the server did not hand out to that same entry. A path is kept only when
/// the entry's id names an existing entry storing exactly that path, and only for the first entry
/// claiming it.
pub fn retain_trusted_paths<T: AssetEntry>(entries: &mut [T], existing: &[T]) -> usize {
    let stored: HashMap<&str, &str> = existing
        .iter()
        .filter_map(|old| old.entry_id().map(|id| (id, old.asset_path())))
        .filter(|(_, path)| !path.is_empty())
        .collect();
    let mut claimed: HashSet<String> = HashSet::new();
    let mut cleared = 0;
    for entry in entries.iter_mut() {
        if entry.asset_path().is_empty() {
            continue;
        }
        let owned = entry
            .entry_id()
            .and_then(|id| stored.get(id))
            .is_some_and(|path| *path == entry.asset_path());
        if owned && claimed.insert(entry.asset_path().to_string()) {
            continue;
        }
        log::warn!(
            "Ignoring {} path not owned by entry {}: {}",
            T::KIND,
            entry.entry_id().unwrap_or("(new)"),
            entry.asset_path()
        );
        entry.set_asset_path(String::new());
        cleared += 1;
    }
    cleared
}

/// Correlates `files` with `entries`, storing each consumed file through `ledger`.
///
/// A replaced path is scheduled for reclamation: the prior path of the matching existing entry
/// (by id) when there is one, otherwise the path the entry itself carried.
pub fn correlate<T: AssetEntry>(
    entries: &mut [T],
    mut files: FieldFiles,
    existing: &[T],
    mode: SaveMode,
    dir: &AssetDirectory,
    prefix: &str,
    ledger: &mut AssetLedger<'_>,
) -> Result<CorrelationReport, AssetError> {
    let mut report = CorrelationReport::default();

    for entry in entries.iter_mut() {
        let eligible = mode == SaveMode::Create || entry.has_new_file();
        if !eligible {
            continue;
        }
        let file = match entry.upload_key() {
            Some(key) => files.take_keyed(key),
            None => files.next_positional(),
        };
        match file {
            Some(file) => {
                bind(entry, file, existing, dir, prefix, ledger)?;
                report.assigned += 1;
            }
            None => {
                log::debug!(
                    "No upload for {} entry {}; keeping {}",
                    T::KIND,
                    entry.entry_id().unwrap_or("(new)"),
                    if entry.asset_path().is_empty() {
                        "no asset"
                    } else {
                        entry.asset_path()
                    }
                );
                report.starved += 1;
            }
        }
    }

    report.unclaimed = files.remaining();
    if report.unclaimed > 0 {
        log::warn!(
            "{} {} upload(s) matched no entry and were discarded",
            report.unclaimed,
            T::KIND
        );
    }
    Ok(report)
}

fn bind<T: AssetEntry>(
    entry: &mut T,
    file: UploadedFile,
    existing: &[T],
    dir: &AssetDirectory,
    prefix: &str,
    ledger: &mut AssetLedger<'_>,
) -> Result<(), AssetError> {
    let stored = ledger.store_file(file, dir, prefix)?;
    let prior = entry
        .entry_id()
        .and_then(|id| existing.iter().find(|old| old.entry_id() == Some(id)))
        .map(|old| old.asset_path().to_string())
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| entry.asset_path().to_string());
    entry.set_asset_path(stored);
    if !prior.is_empty() {
        ledger.supersede(&prior);
    }
    Ok(())
}

/// Stores the single file for a one-per-record slot, returning the previous value when replaced.
pub fn replace_single(
    slot: &mut String,
    file: Option<UploadedFile>,
    dir: &AssetDirectory,
    prefix: &str,
    ledger: &mut AssetLedger<'_>,
) -> Result<bool, AssetError> {
    let Some(file) = file else {
        return Ok(false);
    };
    let stored = ledger.store_file(file, dir, prefix)?;
    let prior = std::mem::replace(slot, stored);
    if !prior.is_empty() {
        ledger.supersede(&prior);
    }
    Ok(true)
}

/// Drops entries left without an asset.
pub fn drop_assetless<T: AssetEntry>(entries: &mut Vec<T>) -> usize {
    let before = entries.len();
    entries.retain(|entry| !entry.asset_path().is_empty());
    let dropped = before - entries.len();
    if dropped > 0 {
        log::info!("Dropped {} {} entr(ies) without an asset", dropped, T::KIND);
    }
    dropped
}
