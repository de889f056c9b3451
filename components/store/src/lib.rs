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

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

pub mod attachment;
pub mod config;
pub mod core;
pub mod envelope;
pub mod files;
pub mod serialize;

pub use ahash;
pub use bincode;
pub use chrono;
pub use rand;
pub use sha2;
pub use tracing;

use crate::{
    config::{env_settings::EnvSettings, MailConfig},
    files::FileStore,
};

pub use crate::core::error::{Result, StoreError};

pub type EnvelopeId = u64;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColumnFamily {
    Envelopes,
    Attachments,
    Indexes,
}

impl ColumnFamily {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnFamily::Envelopes => "envelopes",
            ColumnFamily::Attachments => "attachments",
            ColumnFamily::Indexes => "indexes",
        }
    }
}

#[derive(Debug)]
pub enum WriteOperation {
    Set {
        cf: ColumnFamily,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: ColumnFamily,
        key: Vec<u8>,
    },
}

impl WriteOperation {
    pub fn set(cf: ColumnFamily, key: Vec<u8>, value: Vec<u8>) -> Self {
        WriteOperation::Set { cf, key, value }
    }

    pub fn delete(cf: ColumnFamily, key: Vec<u8>) -> Self {
        WriteOperation::Delete { cf, key }
    }
}

/// Raw key-value backend. Implementations provide durability and atomic
/// multi-key writes; everything above this trait is backend-agnostic.
pub trait Store: Sized + Send + Sync {
    fn open(settings: &EnvSettings) -> Result<Self>;
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn set(&self, cf: ColumnFamily, key: &[u8], value: &[u8]) -> Result<()>;
    fn delete(&self, cf: ColumnFamily, key: &[u8]) -> Result<()>;
    fn write(&self, batch: Vec<WriteOperation>) -> Result<()>;
    fn scan_prefix(&self, cf: ColumnFamily, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
    fn last_key(&self, cf: ColumnFamily) -> Result<Option<Vec<u8>>>;

    fn exists(&self, cf: ColumnFamily, key: &[u8]) -> Result<bool> {
        Ok(self.get(cf, key)?.is_some())
    }
}

/// The persisted record of one received e-mail's routing and content
/// metadata, not the raw MIME bytes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Envelope {
    pub id: EnvelopeId,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub content: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub filepath: String,
    pub content_type: String,
    pub owner_id: EnvelopeId,
}

pub struct MailStore<T> {
    pub db: T,
    pub files: FileStore,
    pub config: MailConfig,
    envelope_id: AtomicU64,
}

impl<T> MailStore<T>
where
    T: Store + 'static,
{
    pub fn new(db: T, config: MailConfig, settings: &EnvSettings) -> Result<Self> {
        // Resume the envelope sequence from the highest stored key.
        let last_envelope_id = db
            .last_key(ColumnFamily::Envelopes)?
            .map(|key| serialize::deserialize_envelope_id(&key))
            .transpose()?
            .unwrap_or(0);

        Ok(MailStore {
            db,
            files: FileStore::new(settings)?,
            config,
            envelope_id: AtomicU64::new(last_envelope_id),
        })
    }

    pub fn assign_envelope_id(&self) -> EnvelopeId {
        self.envelope_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}
