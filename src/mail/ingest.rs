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

use std::path::Path;

use store::{
    files::FileStore,
    tracing::{debug, error, info},
    Attachment, EnvelopeId, MailStore, Result, Store,
};

use super::MailPart;

/// Persists the attachments of one ingested message. Runs off the request's
/// critical path; failures are per-attachment and never abort the siblings.
/// Oversized or anonymous parts are expected noise from untrusted mail and
/// are skipped, not reported.
pub fn persist_attachments<T>(
    store: &MailStore<T>,
    address: &str,
    owner_id: EnvelopeId,
    parts: Vec<MailPart>,
) -> usize
where
    T: Store + 'static,
{
    let mailbox_dir = store.files.mailbox_dir(address);
    let mut stored = 0;

    for part in parts {
        if part.filename.is_empty() || part.bytes.len() > store.config.max_attachment_size {
            debug!(
                "Skipping attachment for {} ({} bytes, name {:?})",
                address,
                part.bytes.len(),
                part.filename
            );
            continue;
        }

        let hashed_name = FileStore::hashed_name(&part.filename);
        let id = FileStore::attachment_id(&mailbox_dir, &hashed_name);
        match persist_attachment(store, &mailbox_dir, &hashed_name, id, owner_id, part) {
            Ok(attachment) => {
                info!("Attachment: {} -> {}", attachment.filename, attachment.filepath);
                stored += 1;
            }
            Err(err) => {
                error!("Failed to store attachment for {}: {}", address, err);
            }
        }
    }

    stored
}

/// Writes the attachment bytes before registering the metadata record, so a
/// record never points at a file that was not durably written. A failed
/// registration removes the file again to avoid orphaned bytes.
pub fn persist_attachment<T>(
    store: &MailStore<T>,
    mailbox_dir: &Path,
    hashed_name: &str,
    id: String,
    owner_id: EnvelopeId,
    part: MailPart,
) -> Result<Attachment>
where
    T: Store + 'static,
{
    let path = mailbox_dir.join(hashed_name);
    store.files.put(&path, &part.bytes)?;

    let attachment = Attachment {
        id,
        filename: part.filename,
        filepath: path.to_string_lossy().into_owned(),
        content_type: part.content_type,
        owner_id,
    };

    if let Err(err) = store.create_attachment(&attachment) {
        if let Err(delete_err) = store.files.delete(&path) {
            error!(
                "Failed to remove attachment file {}: {}",
                attachment.filepath, delete_err
            );
        }
        return Err(err);
    }

    Ok(attachment)
}
