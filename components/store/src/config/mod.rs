/*
 * Copyright (c) 2023 Ephemail Contributors.
 *
 * This file is part of the Ephemail Server.
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of
 * the License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 * in the LICENSE file at the top-level directory of this distribution.
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

pub mod env_settings;

use self::env_settings::EnvSettings;

pub const DEFAULT_MAX_ATTACHMENT_SIZE: usize = 200_000_000;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub max_attachment_size: usize,
    pub poll_timeout_secs: u64,
    pub notify_once: bool,
}

impl From<&EnvSettings> for MailConfig {
    fn from(settings: &EnvSettings) -> Self {
        MailConfig {
            max_attachment_size: settings
                .parse("max-attachment-size")
                .unwrap_or(DEFAULT_MAX_ATTACHMENT_SIZE),
            poll_timeout_secs: settings
                .parse("poll-timeout")
                .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
            notify_once: settings.parse("notify-once").unwrap_or(true),
        }
    }
}
