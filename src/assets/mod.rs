// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod batch;
pub mod correlator;
pub mod directory;
pub mod reconciler;
pub mod store;

pub use batch::{FieldFiles, FileBatch, SpooledFile, UploadSource, UploadedFile};
pub use correlator::{AssetEntry, SaveMode};
pub use directory::{AssetDirectory, DirectoryResolver, safe_directory_name};
pub use reconciler::{AssetLedger, ReclaimSummary};
pub use store::{AssetError, AssetStore, DeleteOutcome};
