// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use env_logger::Logger;
use log::{Level, Log, Metadata, Record, SetLoggerError};

/// Rewrites records from `target_prefix` logged at `from` so they are emitted at `to`.
#[derive(Debug, Clone)]
pub struct LevelRule {
    pub target_prefix: String,
    pub from: Level,
    pub to: Level,
}

impl LevelRule {
    pub fn new(target_prefix: impl Into<String>, from: Level, to: Level) -> Self {
        Self {
            target_prefix: target_prefix.into(),
            from,
            to,
        }
    }
}

struct LevelModifierLogger {
    inner: Logger,
    rules: Vec<LevelRule>,
}

impl LevelModifierLogger {
    fn remap(&self, target: &str, original: Level) -> Level {
        self.rules
            .iter()
            .find(|rule| rule.from == original && target.starts_with(&rule.target_prefix))
            .map(|rule| rule.to)
            .unwrap_or(original)
    }
}

impl Log for LevelModifierLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let remapped = Metadata::builder()
            .level(self.remap(metadata.target(), metadata.level()))
            .target(metadata.target())
            .build();
        self.inner.enabled(&remapped)
    }

    fn log(&self, record: &Record) {
        let remapped = Record::builder()
            .level(self.remap(record.target(), record.level()))
            .target(record.target())
            .args(*record.args())
            .module_path(record.module_path())
            .file(record.file())
            .line(record.line())
            .build();
        self.inner.log(&remapped);
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn init_logger(rules: Vec<LevelRule>, logger: Logger) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(LevelModifierLogger {
        inner: logger,
        rules,
    }))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
