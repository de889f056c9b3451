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

use std::path::PathBuf;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};
use store::{
    config::env_settings::EnvSettings, ColumnFamily, Result, Store, StoreError, WriteOperation,
};


static COLUMN_FAMILIES: [ColumnFamily; 3] = [
    ColumnFamily::Envelopes,
    ColumnFamily::Attachments,
    ColumnFamily::Indexes,
];

pub struct RocksDB {
    db: DBWithThreadMode<MultiThreaded>,
}

impl RocksDB {
    fn cf_handle(&self, cf: ColumnFamily) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db.cf_handle(cf.name()).ok_or_else(|| {
            StoreError::InternalError(format!("No '{}' column family found.", cf.name()))
        })
    }
}

impl Store for RocksDB {
    fn open(settings: &EnvSettings) -> Result<Self> {
        let mut path = PathBuf::from(
            settings
                .get("db-path")
                .unwrap_or_else(|| "ephemail-data".to_string()),
        );
        path.push("db");

        let cfs = COLUMN_FAMILIES
            .iter()
            .map(|cf| ColumnFamilyDescriptor::new(cf.name(), Options::default()))
            .collect::<Vec<_>>();

        let mut db_opts = Options::default();
        db_opts.create_missing_column_families(true);
        db_opts.create_if_missing(true);

        Ok(RocksDB {
            db: DBWithThreadMode::open_cf_descriptors(&db_opts, path, cfs)
                .map_err(|e| StoreError::InternalError(e.into_string()))?,
        })
    }

    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get_cf(&self.cf_handle(cf)?, key)
            .map_err(|e| StoreError::InternalError(e.into_string()))
    }

    fn set(&self, cf: ColumnFamily, key: &[u8], value: &[u8]) -> Result<()> {
        self.db
            .put_cf(&self.cf_handle(cf)?, key, value)
            .map_err(|e| StoreError::InternalError(e.into_string()))
    }

    fn delete(&self, cf: ColumnFamily, key: &[u8]) -> Result<()> {
        self.db
            .delete_cf(&self.cf_handle(cf)?, key)
            .map_err(|e| StoreError::InternalError(e.into_string()))
    }

    fn write(&self, batch: Vec<WriteOperation>) -> Result<()> {
        let mut write_batch = WriteBatch::default();
        for op in batch {
            match op {
                WriteOperation::Set { cf, key, value } => {
                    write_batch.put_cf(&self.cf_handle(cf)?, key, value);
                }
                WriteOperation::Delete { cf, key } => {
                    write_batch.delete_cf(&self.cf_handle(cf)?, key);
                }
            }
        }
        self.db
            .write(write_batch)
            .map_err(|e| StoreError::InternalError(e.into_string()))
    }

    fn scan_prefix(&self, cf: ColumnFamily, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let handle = self.cf_handle(cf)?;
        let mut entries = Vec::new();
        for item in self
            .db
            .iterator_cf(&handle, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item.map_err(|e| StoreError::InternalError(e.into_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }

    fn last_key(&self, cf: ColumnFamily) -> Result<Option<Vec<u8>>> {
        let handle = self.cf_handle(cf)?;
        self.db
            .iterator_cf(&handle, IteratorMode::End)
            .next()
            .transpose()
            .map(|entry| entry.map(|(key, _)| key.to_vec()))
            .map_err(|e| StoreError::InternalError(e.into_string()))
    }
}
