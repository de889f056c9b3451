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

use serde::{de::DeserializeOwned, Serialize};

use crate::{EnvelopeId, Result, StoreError};

pub const MAILBOX_INDEX: u8 = 0;
pub const OWNER_INDEX: u8 = 1;

pub const FIELD_SEPARATOR: u8 = 0;

pub fn serialize<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize,
{
    bincode::serialize(value).map_err(|err| StoreError::SerializeError(err.to_string()))
}

pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    bincode::deserialize(bytes).map_err(|err| StoreError::DeserializeError(err.to_string()))
}

/// Envelope record keys are big-endian so the key order is the id order.
pub fn serialize_envelope_key(id: EnvelopeId) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

pub fn deserialize_envelope_id(key: &[u8]) -> Result<EnvelopeId> {
    key.try_into()
        .map(EnvelopeId::from_be_bytes)
        .map_err(|_| StoreError::DeserializeError("Invalid envelope key.".to_string()))
}

pub fn serialize_mailbox_index_key(address: &str, id: EnvelopeId) -> Vec<u8> {
    let mut key = serialize_mailbox_index_prefix(address);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

pub fn serialize_mailbox_index_prefix(address: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(address.len() + 2);
    key.push(MAILBOX_INDEX);
    key.extend_from_slice(address.as_bytes());
    key.push(FIELD_SEPARATOR);
    key
}

pub fn deserialize_indexed_envelope_id(key: &[u8], prefix_len: usize) -> Result<EnvelopeId> {
    key.get(prefix_len..)
        .ok_or_else(|| StoreError::DeserializeError("Invalid mailbox index key.".to_string()))
        .and_then(deserialize_envelope_id)
}

pub fn serialize_owner_index_key(owner_id: EnvelopeId, attachment_id: &str) -> Vec<u8> {
    let mut key = serialize_owner_index_prefix(owner_id);
    key.extend_from_slice(attachment_id.as_bytes());
    key
}

pub fn serialize_owner_index_prefix(owner_id: EnvelopeId) -> Vec<u8> {
    let mut key = Vec::with_capacity(std::mem::size_of::<EnvelopeId>() + 1);
    key.push(OWNER_INDEX);
    key.extend_from_slice(&owner_id.to_be_bytes());
    key
}

pub fn deserialize_indexed_attachment_id(key: &[u8], prefix_len: usize) -> Result<String> {
    key.get(prefix_len..)
        .and_then(|id| std::str::from_utf8(id).ok())
        .map(|id| id.to_string())
        .ok_or_else(|| StoreError::DeserializeError("Invalid owner index key.".to_string()))
}
