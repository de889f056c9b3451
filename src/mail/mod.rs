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

pub mod ingest;
pub mod parse;

/// A decomposed inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub from: String,
    pub content: String,
    pub attachments: Vec<MailPart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailPart {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Normalizes a mailbox address so storage sharding and subscription lookup
/// agree on the key. Returns None for anything that is not a plausible
/// single address.
pub fn sanitize_address(address: &str) -> Option<String> {
    let address = address.trim().to_lowercase();
    let (local, domain) = address.split_once('@')?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || address.chars().any(char::is_whitespace)
    {
        return None;
    }
    Some(address)
}
