// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use crate::api::UploadLimits;
use crate::projects::ProjectService;
use crate::runtime_paths::RuntimePaths;
use crate::util::BlockingPool;

pub struct AppState {
    pub runtime_paths: RuntimePaths,
    pub projects: Arc<ProjectService>,
    pub blocking: BlockingPool,
    pub upload_limits: UploadLimits,
}

impl AppState {
    pub fn new(
        runtime_paths: RuntimePaths,
        projects: Arc<ProjectService>,
        blocking: BlockingPool,
        upload_limits: UploadLimits,
    ) -> Self {
        Self {
            runtime_paths,
            projects,
            blocking,
            upload_limits,
        }
    }
}

