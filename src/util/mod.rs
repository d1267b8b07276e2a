// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod blocking;
pub mod log_level_changer;
pub mod mime_helper;
pub mod upload_temp;

// Re-export commonly used items for convenience
pub use blocking::{BlockingError, BlockingErrorKind, BlockingPool};
pub use log_level_changer::{LevelRule, init_logger};
pub use mime_helper::detect_mime_type;
pub use upload_temp::{is_temp_upload_name, sweep_stale_uploads};
