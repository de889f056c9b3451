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

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

use crate::{config::env_settings::EnvSettings, Result};

/// Length of the hashed mailbox directory name.
pub const MAILBOX_DIR_LEN: usize = 16;
/// Length of the hashed on-disk file name.
pub const FILE_NAME_LEN: usize = 32;
/// Length of the random attachment id suffix.
pub const ID_SUFFIX_LEN: usize = 4;

/// Attachment file storage. Mailbox directories and file names are one-way
/// hashes, so the on-disk layout never exposes a plaintext address or
/// filename and the attachment id alone does not enumerate a mailbox.
pub struct FileStore {
    pub base_path: PathBuf,
}

impl FileStore {
    pub fn new(settings: &EnvSettings) -> Result<Self> {
        let mut base_path = PathBuf::from(
            settings
                .get("db-path")
                .unwrap_or_else(|| "ephemail-data".to_string()),
        );
        base_path.push("attachments");
        Ok(FileStore { base_path })
    }

    pub fn mailbox_dir(&self, address: &str) -> PathBuf {
        let mut path = self.base_path.clone();
        path.push(hash_hex(address.as_bytes(), MAILBOX_DIR_LEN));
        path
    }

    pub fn hashed_name(filename: &str) -> String {
        hash_hex(filename.as_bytes(), FILE_NAME_LEN)
    }

    /// Builds a globally unique, filesystem-safe attachment id from the
    /// mailbox directory name, a prefix of the hashed filename and a short
    /// random suffix.
    pub fn attachment_id(mailbox_dir: &Path, hashed_name: &str) -> String {
        let mut id = String::with_capacity(MAILBOX_DIR_LEN + 6 + ID_SUFFIX_LEN);
        if let Some(dir_name) = mailbox_dir.file_name().and_then(|name| name.to_str()) {
            id.push_str(dir_name);
        }
        id.push_str(&hashed_name[..6]);
        id.push_str(&random_suffix(ID_SUFFIX_LEN));
        id
    }

    pub fn put(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(())
    }

    pub fn get(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        if !path.exists() {
            return Ok(None);
        }
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    pub fn delete(&self, path: &Path) -> Result<bool> {
        if path.exists() {
            fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

fn hash_hex(bytes: &[u8], len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hash = hasher.finalize();

    let mut hex = String::with_capacity(len);
    for byte in hash.iter().take(len / 2) {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
