// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

const MAX_SLUG_ATTEMPTS: usize = 10_000;

/// URL slug for a title: word characters and hyphens only, whitespace runs become a single
/// hyphen, no leading or trailing hyphen.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.trim().to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_hyphen = true;
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        }
    }
    slug
}

/// First of `base`, `base-1`, `base-2`, ... that `is_taken` rejects.
pub fn unique_slug<E, F>(base: &str, mut is_taken: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<bool, E>,
{
    if !is_taken(base)? {
        return Ok(base.to_string());
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !is_taken(&candidate)? || counter >= MAX_SLUG_ATTEMPTS {
            return Ok(candidate);
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_title() {
        assert_eq!(generate_slug("  Palm Grove -- Phase 2! "), "palm-grove-phase-2");
        assert_eq!(generate_slug("Draft 1700000000000"), "draft-1700000000000");
        assert_eq!(generate_slug("***"), "");
    }

    #[test]
    fn unique_slug_appends_counter() {
        let taken = ["palm-grove", "palm-grove-1"];
        let slug: Result<String, ()> = unique_slug("palm-grove", |s| Ok(taken.contains(&s)));
        assert_eq!(slug, Ok("palm-grove-2".to_string()));
    }
}
