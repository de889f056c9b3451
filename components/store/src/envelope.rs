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

use chrono::Utc;

use crate::{
    serialize::{
        deserialize, deserialize_indexed_envelope_id, serialize, serialize_envelope_key,
        serialize_mailbox_index_key, serialize_mailbox_index_prefix,
    },
    ColumnFamily, Envelope, EnvelopeId, MailStore, Result, Store, WriteOperation,
};

impl<T> MailStore<T>
where
    T: Store + 'static,
{
    /// Persists a new envelope and returns it with its assigned id. The
    /// record and its mailbox index entry are written in one atomic batch.
    pub fn create_envelope(
        &self,
        to: String,
        from: String,
        subject: String,
        content: String,
    ) -> Result<Envelope> {
        let envelope = Envelope {
            id: self.assign_envelope_id(),
            to,
            from,
            subject,
            content,
            received_at: Utc::now(),
        };

        self.db.write(vec![
            WriteOperation::set(
                ColumnFamily::Envelopes,
                serialize_envelope_key(envelope.id),
                serialize(&envelope)?,
            ),
            WriteOperation::set(
                ColumnFamily::Indexes,
                serialize_mailbox_index_key(&envelope.to, envelope.id),
                vec![],
            ),
        ])?;

        Ok(envelope)
    }

    pub fn get_envelope(&self, id: EnvelopeId) -> Result<Option<Envelope>> {
        self.db
            .get(ColumnFamily::Envelopes, &serialize_envelope_key(id))?
            .map(|bytes| deserialize(&bytes))
            .transpose()
    }

    /// Returns up to `limit` envelopes for a mailbox, most recent first.
    pub fn query_mailbox(&self, address: &str, limit: usize) -> Result<Vec<Envelope>> {
        let prefix = serialize_mailbox_index_prefix(address);
        let entries = self.db.scan_prefix(ColumnFamily::Indexes, &prefix)?;

        let mut envelopes = Vec::with_capacity(limit.min(entries.len()));
        for (key, _) in entries.iter().rev().take(limit) {
            let id = deserialize_indexed_envelope_id(key, prefix.len())?;
            if let Some(envelope) = self.get_envelope(id)? {
                envelopes.push(envelope);
            }
        }
        Ok(envelopes)
    }

    pub fn latest_envelope(&self, address: &str) -> Result<Option<Envelope>> {
        Ok(self.query_mailbox(address, 1)?.pop())
    }
}
