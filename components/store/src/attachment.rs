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

use crate::{
    serialize::{
        deserialize, deserialize_indexed_attachment_id, serialize, serialize_owner_index_key,
        serialize_owner_index_prefix,
    },
    Attachment, ColumnFamily, EnvelopeId, MailStore, Result, Store, StoreError, WriteOperation,
};

impl<T> MailStore<T>
where
    T: Store + 'static,
{
    /// Registers an attachment record. Ids are unique; registering an id
    /// that already exists fails without touching the stored record.
    pub fn create_attachment(&self, attachment: &Attachment) -> Result<()> {
        if self
            .db
            .exists(ColumnFamily::Attachments, attachment.id.as_bytes())?
        {
            return Err(StoreError::AlreadyExists(attachment.id.clone()));
        }

        self.db.write(vec![
            WriteOperation::set(
                ColumnFamily::Attachments,
                attachment.id.as_bytes().to_vec(),
                serialize(attachment)?,
            ),
            WriteOperation::set(
                ColumnFamily::Indexes,
                serialize_owner_index_key(attachment.owner_id, &attachment.id),
                vec![],
            ),
        ])
    }

    pub fn get_attachment(&self, id: &str) -> Result<Option<Attachment>> {
        self.db
            .get(ColumnFamily::Attachments, id.as_bytes())?
            .map(|bytes| deserialize(&bytes))
            .transpose()
    }

    pub fn query_attachments(&self, owner_id: EnvelopeId) -> Result<Vec<Attachment>> {
        let prefix = serialize_owner_index_prefix(owner_id);
        let entries = self.db.scan_prefix(ColumnFamily::Indexes, &prefix)?;

        let mut attachments = Vec::with_capacity(entries.len());
        for (key, _) in entries {
            let id = deserialize_indexed_attachment_id(&key, prefix.len())?;
            if let Some(attachment) = self.get_attachment(&id)? {
                attachments.push(attachment);
            }
        }
        Ok(attachments)
    }
}
