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

use crate::mail::{parse::decompose, sanitize_address};

pub const HTML_AND_TEXT: &[u8] = b"From: Sender <sender@remote.test>\r\n\
To: alice@x.test\r\n\
Subject: Greetings\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
hi in plain text\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>hi</p>\r\n\
--b1--\r\n";

const TEXT_ONLY: &[u8] = b"From: sender@remote.test\r\n\
To: alice@x.test\r\n\
Subject: Plain\r\n\
\r\n\
just text\r\n";

const HEADERS_ONLY: &[u8] = b"From: sender@remote.test\r\n\
To: alice@x.test\r\n\
Subject: Empty\r\n\
\r\n";

const WITH_ATTACHMENTS: &[u8] = b"From: sender@remote.test\r\n\
To: bob@x.test\r\n\
Subject: Files\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"mix\"\r\n\
\r\n\
--mix\r\n\
Content-Type: text/plain\r\n\
\r\n\
see attachments\r\n\
--mix\r\n\
Content-Type: text/plain; name=\"a.txt\"\r\n\
Content-Disposition: attachment; filename=\"a.txt\"\r\n\
\r\n\
attached text\r\n\
--mix\r\n\
Content-Type: application/pgp-signature\r\n\
\r\n\
fakesignature\r\n\
--mix--\r\n";

#[test]
fn prefers_html_body() {
    let message = decompose(HTML_AND_TEXT).unwrap();
    assert_eq!(message.subject, "Greetings");
    assert_eq!(message.from, "Sender <sender@remote.test>");
    assert_eq!(message.content, "<p>hi</p>");
    assert_eq!(message.attachments, vec![]);
}

#[test]
fn falls_back_to_plain_text() {
    let message = decompose(TEXT_ONLY).unwrap();
    assert_eq!(message.from, "sender@remote.test");
    assert_eq!(message.content.trim_end(), "just text");
}

#[test]
fn missing_body_is_not_an_error() {
    let message = decompose(HEADERS_ONLY).unwrap();
    assert_eq!(message.subject, "Empty");
    assert_eq!(message.content, "");
}

#[test]
fn unnamed_parts_are_not_attachments() {
    let message = decompose(WITH_ATTACHMENTS).unwrap();
    assert_eq!(message.content.trim_end(), "see attachments");
    assert_eq!(message.attachments.len(), 1);

    let attachment = &message.attachments[0];
    assert_eq!(attachment.filename, "a.txt");
    assert_eq!(attachment.content_type, "text/plain");
    assert_eq!(
        String::from_utf8_lossy(&attachment.bytes).trim_end(),
        "attached text"
    );
}

#[test]
fn rejects_unparseable_input() {
    assert!(decompose(b"").is_err());
}

#[test]
fn address_sanitization() {
    assert_eq!(
        sanitize_address("  Alice@X.Test "),
        Some("alice@x.test".to_string())
    );
    assert_eq!(sanitize_address("not-an-address"), None);
    assert_eq!(sanitize_address("@x.test"), None);
    assert_eq!(sanitize_address("alice@"), None);
    assert_eq!(sanitize_address("a@b@c"), None);
    assert_eq!(sanitize_address("a b@x.test"), None);
}
