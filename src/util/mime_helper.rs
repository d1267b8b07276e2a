// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::fs::File;
use std::io::Read;
use std::path::Path;

const SNIFF_BYTES: usize = 8192;

/// Detect MIME type using content-based detection (infer) with fallback to extension-based (mime_guess)
pub fn detect_mime_type(file_name: &Path, file_content: &[u8]) -> String {
    // infer reports SVG documents as generic XML
    if looks_like_svg(file_name, file_content) {
        return "image/svg+xml".to_string();
    }

    if let Some(mime_type) = infer::get(file_content) {
        return mime_type.mime_type().to_string();
    }

    if let Some(mime_type) = mime_guess::from_path(file_name).first() {
        return mime_type.to_string();
    }

    "application/octet-stream".to_string()
}

fn looks_like_svg(file_name: &Path, file_content: &[u8]) -> bool {
    let has_svg_extension = file_name
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);
    has_svg_extension && String::from_utf8_lossy(file_content).contains("<svg")
}

/// Reads the leading bytes of a spooled file for content sniffing.
pub fn sniff_file(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(SNIFF_BYTES);
    File::open(path)?
        .take(SNIFF_BYTES as u64)
        .read_to_end(&mut head)?;
    Ok(head)
}

pub fn is_pdf(mime: &str) -> bool {
    mime.eq_ignore_ascii_case("application/pdf")
}

pub fn is_image(mime: &str) -> bool {
    mime.to_ascii_lowercase().starts_with("image/")
}
