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

use std::{path::Path, time::Duration};

use actix_web::{body::to_bytes, http::StatusCode, web, HttpResponse};
use store::{
    config::{env_settings::EnvSettings, MailConfig},
    files::FileStore,
    Attachment, EnvelopeId, MailStore, Store, StoreError,
};
use store_rocksdb::RocksDB;
use tokio::time;

use crate::{
    api::ingest::{handle_ingest, IngestResponse, Params},
    mail::{
        ingest::{persist_attachment, persist_attachments},
        MailPart,
    },
    server::http::init_mail_server,
    tests::{destroy_temp_dir, init_settings, mail_parse::HTML_AND_TEXT},
    MailServer,
};

fn open_store(settings: &EnvSettings) -> MailStore<RocksDB> {
    MailStore::new(
        RocksDB::open(settings).unwrap(),
        MailConfig::from(settings),
        settings,
    )
    .unwrap()
}

async fn report(
    server: &web::Data<MailServer<RocksDB>>,
    to: &str,
    raw: Vec<u8>,
) -> HttpResponse {
    handle_ingest(
        web::Query(Params { to: to.to_string() }),
        web::Bytes::from(raw),
        server.clone(),
    )
    .await
}

async fn report_ok(
    server: &web::Data<MailServer<RocksDB>>,
    to: &str,
    raw: Vec<u8>,
) -> EnvelopeId {
    let response = report(server, to, raw).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice::<IngestResponse>(&body).unwrap().id
}

fn message_with_attachments(small: &str, large: &str) -> Vec<u8> {
    format!(
        "From: sender@remote.test\r\n\
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
         {}\r\n\
         --mix\r\n\
         Content-Type: application/octet-stream; name=\"b.bin\"\r\n\
         Content-Disposition: attachment; filename=\"b.bin\"\r\n\
         \r\n\
         {}\r\n\
         --mix--\r\n",
        small, large
    )
    .into_bytes()
}

#[actix_web::test]
async fn ingest_html_message() {
    let (settings, temp_dir) = init_settings("ingest_html", true);
    let server = init_mail_server::<RocksDB>(&settings);

    let id = report_ok(&server, "alice@x.test", HTML_AND_TEXT.to_vec()).await;

    let envelope = server.store.get_envelope(id).unwrap().unwrap();
    assert_eq!(envelope.to, "alice@x.test");
    assert_eq!(envelope.from, "Sender <sender@remote.test>");
    assert_eq!(envelope.subject, "Greetings");
    assert_eq!(envelope.content, "<p>hi</p>");

    // No attachment records may appear for an attachment-free message.
    time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.store.query_attachments(id).unwrap(), vec![]);

    destroy_temp_dir(temp_dir);
}

#[actix_web::test]
async fn ingest_drops_oversized_attachment() {
    let (mut settings, temp_dir) = init_settings("ingest_oversized", true);
    settings
        .args
        .insert("max-attachment-size".to_string(), "1000".to_string());
    let server = init_mail_server::<RocksDB>(&settings);

    let small = "x".repeat(50);
    let large = "y".repeat(1001);
    let id = report_ok(&server, "bob@x.test", message_with_attachments(&small, &large)).await;

    let mut attachments = Vec::new();
    for _ in 0..50 {
        attachments = server.store.query_attachments(id).unwrap();
        if !attachments.is_empty() {
            break;
        }
        time::sleep(Duration::from_millis(50)).await;
    }
    // Only a.txt may be registered; b.bin is silently dropped.
    time::sleep(Duration::from_millis(200)).await;
    attachments = server.store.query_attachments(id).unwrap();
    assert_eq!(attachments.len(), 1);

    let attachment = &attachments[0];
    assert_eq!(attachment.filename, "a.txt");
    assert_eq!(attachment.owner_id, id);
    assert_eq!(
        server
            .store
            .files
            .get(Path::new(&attachment.filepath))
            .unwrap()
            .unwrap(),
        small.as_bytes()
    );

    destroy_temp_dir(temp_dir);
}

#[actix_web::test]
async fn ingest_notifies_live_subscriber() {
    let (settings, temp_dir) = init_settings("ingest_notify", true);
    let server = init_mail_server::<RocksDB>(&settings);

    let mut subscription = server
        .subscribe_mailbox("bob@x.test".to_string())
        .await
        .unwrap();

    let id = report_ok(&server, "bob@x.test", HTML_AND_TEXT.to_vec()).await;

    let envelope = subscription.next(Duration::from_secs(3)).await.unwrap();
    assert_eq!(envelope.id, id);
    assert_eq!(envelope.to, "bob@x.test");

    // A subscription opened after delivery waits out its timeout.
    let mut late = server
        .subscribe_mailbox("bob@x.test".to_string())
        .await
        .unwrap();
    assert!(late.next(Duration::from_millis(300)).await.is_none());
    late.unsubscribe().await;

    destroy_temp_dir(temp_dir);
}

#[actix_web::test]
async fn rejects_malformed_message() {
    let (settings, temp_dir) = init_settings("ingest_malformed", true);
    let server = init_mail_server::<RocksDB>(&settings);

    let response = report(&server, "carol@x.test", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Rejection leaves no partial state behind.
    assert_eq!(
        server.store.query_mailbox("carol@x.test", 10).unwrap(),
        vec![]
    );

    destroy_temp_dir(temp_dir);
}

#[actix_web::test]
async fn rejects_invalid_recipient() {
    let (settings, temp_dir) = init_settings("ingest_bad_rcpt", true);
    let server = init_mail_server::<RocksDB>(&settings);

    let response = report(&server, "not-an-address", HTML_AND_TEXT.to_vec()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    destroy_temp_dir(temp_dir);
}

#[test]
fn same_filename_gets_distinct_ids() {
    let (settings, temp_dir) = init_settings("attachments_distinct", true);
    let db = open_store(&settings);

    let part = MailPart {
        filename: "dup.txt".to_string(),
        content_type: "text/plain".to_string(),
        bytes: b"same name, distinct record".to_vec(),
    };
    let stored = persist_attachments(&db, "eve@x.test", 1, vec![part.clone(), part]);
    assert_eq!(stored, 2);

    let attachments = db.query_attachments(1).unwrap();
    assert_eq!(attachments.len(), 2);
    assert_ne!(attachments[0].id, attachments[1].id);

    destroy_temp_dir(temp_dir);
}

#[test]
fn skips_anonymous_and_oversized_parts() {
    let (mut settings, temp_dir) = init_settings("attachments_skip", true);
    settings
        .args
        .insert("max-attachment-size".to_string(), "10".to_string());
    let db = open_store(&settings);

    let anonymous = MailPart {
        filename: String::new(),
        content_type: "text/plain".to_string(),
        bytes: b"unnamed".to_vec(),
    };
    let oversized = MailPart {
        filename: "big.bin".to_string(),
        content_type: "application/octet-stream".to_string(),
        bytes: vec![0; 11],
    };
    let accepted = MailPart {
        filename: "ok.txt".to_string(),
        content_type: "text/plain".to_string(),
        bytes: b"ten bytes!".to_vec(),
    };

    let stored = persist_attachments(&db, "eve@x.test", 1, vec![anonymous, oversized, accepted]);
    assert_eq!(stored, 1);

    let attachments = db.query_attachments(1).unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].filename, "ok.txt");

    // Skipped parts leave no files behind.
    let mailbox_dir = db.files.mailbox_dir("eve@x.test");
    assert!(!mailbox_dir
        .join(FileStore::hashed_name("big.bin"))
        .exists());

    destroy_temp_dir(temp_dir);
}

#[test]
fn failed_registration_removes_file() {
    let (settings, temp_dir) = init_settings("attachments_rollback", true);
    let db = open_store(&settings);

    let mailbox_dir = db.files.mailbox_dir("dave@x.test");

    // Occupy an attachment id so registration fails on the uniqueness
    // constraint.
    let taken = Attachment {
        id: "fixed-id".to_string(),
        filename: "first.txt".to_string(),
        filepath: mailbox_dir
            .join(FileStore::hashed_name("first.txt"))
            .to_string_lossy()
            .into_owned(),
        content_type: "text/plain".to_string(),
        owner_id: 1,
    };
    db.create_attachment(&taken).unwrap();

    let part = MailPart {
        filename: "second.txt".to_string(),
        content_type: "text/plain".to_string(),
        bytes: b"will be rolled back".to_vec(),
    };
    let hashed_name = FileStore::hashed_name(&part.filename);

    let result = persist_attachment(
        &db,
        &mailbox_dir,
        &hashed_name,
        "fixed-id".to_string(),
        1,
        part,
    );
    assert!(matches!(result, Err(StoreError::AlreadyExists(_))));

    // The just-written file must not remain on disk.
    assert!(!mailbox_dir.join(&hashed_name).exists());
    assert_eq!(db.query_attachments(1).unwrap().len(), 1);

    destroy_temp_dir(temp_dir);
}
