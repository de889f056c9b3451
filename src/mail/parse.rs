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

use std::fmt::Display;

use mail_parser::{MessageParser, MimeHeaders, PartType};

use super::{MailMessage, MailPart};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError;

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Failed to parse MIME message.")
    }
}

impl std::error::Error for ParseError {}

/// Decomposes a raw MIME byte stream into subject, sender, rendered content
/// and the named attachment parts. Fails only when the stream cannot be
/// parsed as a message at all; a missing body never fails and maps to an
/// empty content string.
pub fn decompose(raw: &[u8]) -> Result<MailMessage, ParseError> {
    let parser = MessageParser::default();
    let message = parser.parse(raw).ok_or(ParseError)?;

    let subject = message.subject().unwrap_or_default().to_string();

    let from = message
        .from()
        .and_then(|address| address.first())
        .map(|addr| match (addr.name(), addr.address()) {
            (Some(name), Some(address)) => format!("{} <{}>", name, address),
            (None, Some(address)) => address.to_string(),
            (Some(name), None) => name.to_string(),
            (None, None) => String::new(),
        })
        .unwrap_or_default();

    // Prefer the HTML body. mail-parser synthesizes an HTML rendition from
    // plain text, so only a genuine HTML part counts here; the plain-text
    // body is the fallback.
    let content = message
        .html_body
        .first()
        .and_then(|part_id| message.parts.get(*part_id))
        .and_then(|part| match &part.body {
            PartType::Html(html) if !html.is_empty() => Some(html.as_ref().to_string()),
            _ => None,
        })
        .or_else(|| {
            message
                .body_text(0)
                .map(|text| text.into_owned())
                .filter(|text| !text.is_empty())
        })
        .unwrap_or_default();

    let attachments = message
        .attachments()
        .filter_map(|part| {
            // Parts without a filename (inline signatures and the like) are
            // not attachments.
            let filename = part.attachment_name()?.to_string();
            Some(MailPart {
                filename,
                content_type: part
                    .content_type()
                    .map(|ct| match ct.subtype() {
                        Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
                        None => ct.ctype().to_string(),
                    })
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                bytes: part.contents().to_vec(),
            })
        })
        .collect();

    Ok(MailMessage {
        subject,
        from,
        content,
        attachments,
    })
}
