// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Spools a multipart save request: text parts into [`FormFields`], file parts onto disk.

use crate::assets::batch::{fields, split_field_name};
use crate::assets::{FileBatch, SpooledFile, UploadSource, UploadedFile};
use crate::config::UploadConfig;
use crate::projects::FormFields;
use crate::util::mime_helper::{detect_mime_type, sniff_file};
use crate::util::upload_temp::temp_upload_path;
use actix_multipart::{Field, Multipart, MultipartError};
use futures_util::TryStreamExt;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

const MAX_TEXT_FIELD_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_size: Option<u64>,
    pub max_files: usize,
}

impl From<&UploadConfig> for UploadLimits {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size_bytes(),
            max_files: config.max_files,
        }
    }
}

#[derive(Debug)]
pub enum MultipartReadError {
    Malformed(String),
    FileTooLarge { field: String, limit: u64 },
    TooManyFiles(usize),
    TextTooLarge(String),
    Io(io::Error),
}

impl MultipartReadError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, MultipartReadError::Io(_))
    }
}

impl fmt::Display for MultipartReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultipartReadError::Malformed(message) => {
                write!(f, "Malformed multipart request: {}", message)
            }
            MultipartReadError::FileTooLarge { field, limit } => write!(
                f,
                "File in field '{}' exceeds the {} MB limit",
                field,
                limit / (1024 * 1024)
            ),
            MultipartReadError::TooManyFiles(limit) => {
                write!(f, "Too many files; at most {} per request", limit)
            }
            MultipartReadError::TextTooLarge(field) => {
                write!(f, "Field '{}' is too large", field)
            }
            MultipartReadError::Io(err) => write!(f, "Failed to spool upload: {}", err),
        }
    }
}

impl Error for MultipartReadError {}

impl From<MultipartError> for MultipartReadError {
    fn from(err: MultipartError) -> Self {
        MultipartReadError::Malformed(err.to_string())
    }
}

impl From<io::Error> for MultipartReadError {
    fn from(err: io::Error) -> Self {
        MultipartReadError::Io(err)
    }
}

pub struct ParsedMultipart {
    pub fields: FormFields,
    pub files: FileBatch,
}

/// Reads the whole request. On error every part spooled so far is removed.
pub async fn read_multipart(
    mut payload: Multipart,
    incoming_dir: &Path,
    limits: UploadLimits,
) -> Result<ParsedMultipart, MultipartReadError> {
    let mut form = FormFields::new();
    let mut files = FileBatch::new();

    while let Some(mut field) = payload.try_next().await? {
        let (name, file_name) = match field.content_disposition() {
            Some(disposition) => (
                disposition.get_name().unwrap_or_default().to_string(),
                disposition.get_filename().map(str::to_string),
            ),
            None => {
                drain(&mut field).await?;
                continue;
            }
        };

        let Some(file_name) = file_name else {
            let value = read_text(&mut field, &name).await?;
            form.insert(name, value);
            continue;
        };

        let (base, key) = split_field_name(&name);
        if !fields::is_known(base) {
            log::warn!("Ignoring file part in unknown field '{}'", name);
            drain(&mut field).await?;
            continue;
        }
        if file_name.trim().is_empty() {
            drain(&mut field).await?;
            continue;
        }
        if files.len() >= limits.max_files {
            return Err(MultipartReadError::TooManyFiles(limits.max_files));
        }

        let key = key.map(str::to_string);
        let base = base.to_string();
        let upload = spool_file(&mut field, incoming_dir, &base, &file_name, limits).await?;
        files.push(UploadedFile {
            correlation_key: key,
            ..upload
        });
    }

    Ok(ParsedMultipart {
        fields: form,
        files,
    })
}

async fn spool_file(
    field: &mut Field,
    incoming_dir: &Path,
    field_name: &str,
    original_name: &str,
    limits: UploadLimits,
) -> Result<UploadedFile, MultipartReadError> {
    let path = temp_upload_path(incoming_dir);
    let spooled = SpooledFile::new(path.clone());
    let mut out = File::create(&path)?;
    let mut size: u64 = 0;

    while let Some(chunk) = field.try_next().await? {
        size += chunk.len() as u64;
        if let Some(limit) = limits.max_file_size
            && size > limit
        {
            return Err(MultipartReadError::FileTooLarge {
                field: field_name.to_string(),
                limit,
            });
        }
        out.write_all(&chunk)?;
    }
    out.flush()?;
    drop(out);

    let head = sniff_file(&path)?;
    let mime_type = detect_mime_type(Path::new(original_name), &head);
    log::debug!(
        "Spooled {} ({} bytes, {}) for field {}",
        original_name,
        size,
        mime_type,
        field_name
    );

    Ok(UploadedFile {
        field: field_name.to_string(),
        correlation_key: None,
        original_name: original_name.to_string(),
        size_bytes: size,
        mime_type,
        source: Some(UploadSource::Spooled(spooled)),
    })
}

async fn read_text(field: &mut Field, name: &str) -> Result<String, MultipartReadError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if bytes.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(MultipartReadError::TextTooLarge(name.to_string()));
        }
        bytes.extend_from_slice(&chunk);
    }
    String::from_utf8(bytes)
        .map_err(|_| MultipartReadError::Malformed(format!("field '{}' is not UTF-8", name)))
}

async fn drain(field: &mut Field) -> Result<(), MultipartReadError> {
    while field.try_next().await?.is_some() {}
    Ok(())
}
