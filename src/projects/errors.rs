// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::form::FormError;
use super::repository::RepositoryError;
use crate::assets::AssetError;
use crate::util::{BlockingError, BlockingErrorKind};
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectErrorKind {
    Validation,
    Conflict,
    NotFound,
    AssetWrite,
    Persistence,
    Busy,
    Internal,
}

#[derive(Debug)]
pub enum ProjectError {
    Validation(Vec<String>),
    Conflict(String),
    VersionMismatch { expected: u64, actual: u64 },
    NotFound(String),
    AssetWrite(AssetError),
    Persistence(RepositoryError),
    /// Too many save pipelines in flight; the request may be retried.
    Busy(BlockingError),
    Internal(BlockingError),
}

impl ProjectError {
    pub fn validation(message: impl Into<String>) -> Self {
        ProjectError::Validation(vec![message.into()])
    }

    pub fn kind(&self) -> ProjectErrorKind {
        match self {
            ProjectError::Validation(_) => ProjectErrorKind::Validation,
            ProjectError::Conflict(_) | ProjectError::VersionMismatch { .. } => {
                ProjectErrorKind::Conflict
            }
            ProjectError::NotFound(_) => ProjectErrorKind::NotFound,
            ProjectError::AssetWrite(_) => ProjectErrorKind::AssetWrite,
            ProjectError::Persistence(err) => match err {
                RepositoryError::Validation(_) => ProjectErrorKind::Validation,
                RepositoryError::DuplicateSlug(_) | RepositoryError::VersionConflict { .. } => {
                    ProjectErrorKind::Conflict
                }
                RepositoryError::NotFound(_) => ProjectErrorKind::NotFound,
                RepositoryError::Storage(_) => ProjectErrorKind::Persistence,
            },
            ProjectError::Busy(_) => ProjectErrorKind::Busy,
            ProjectError::Internal(_) => ProjectErrorKind::Internal,
        }
    }
}

impl fmt::Display for ProjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectError::Validation(errors) => write!(f, "{}", errors.join("; ")),
            ProjectError::Conflict(message) => write!(f, "{}", message),
            ProjectError::VersionMismatch { expected, actual } => write!(
                f,
                "Project has changed since it was loaded (expected version {}, current {})",
                expected, actual
            ),
            ProjectError::NotFound(message) => write!(f, "{}", message),
            ProjectError::AssetWrite(err) => write!(f, "Failed to store asset: {}", err),
            ProjectError::Persistence(err) => write!(f, "{}", err),
            ProjectError::Busy(err) => write!(f, "Project service is busy ({})", err),
            ProjectError::Internal(err) => write!(f, "{}", err),
        }
    }
}

impl Error for ProjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProjectError::AssetWrite(err) => Some(err),
            ProjectError::Persistence(err) => Some(err),
            ProjectError::Busy(err) | ProjectError::Internal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AssetError> for ProjectError {
    fn from(err: AssetError) -> Self {
        ProjectError::AssetWrite(err)
    }
}

impl From<RepositoryError> for ProjectError {
    fn from(err: RepositoryError) -> Self {
        ProjectError::Persistence(err)
    }
}

impl From<BlockingError> for ProjectError {
    fn from(err: BlockingError) -> Self {
        match err.kind() {
            BlockingErrorKind::Busy => ProjectError::Busy(err),
            BlockingErrorKind::Internal => ProjectError::Internal(err),
        }
    }
}

impl From<FormError> for ProjectError {
    fn from(err: FormError) -> Self {
        ProjectError::validation(err.to_string())
    }
}
