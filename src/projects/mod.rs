// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod draft;
pub mod errors;
pub mod form;
pub mod model;
pub mod query;
pub mod repository;
pub mod service;
pub mod slug;
pub mod yaml_store;

pub use errors::{ProjectError, ProjectErrorKind};
pub use form::{DeletionDirectives, FormError, FormFields, ProjectInput};
pub use model::{Project, ProjectId, ProjectState, ProjectType};
pub use query::{ProjectPage, ProjectQuery, ProjectStats};
pub use repository::{MemoryProjectRepository, ProjectRepository, RepositoryError, SaveOptions};
pub use service::{DeleteMode, ProjectService};
pub use yaml_store::YamlProjectRepository;
