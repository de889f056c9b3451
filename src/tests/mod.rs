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

use store::config::env_settings::EnvSettings;

pub mod mail_ingest;
pub mod mail_parse;

pub fn init_settings(name: &str, delete_if_exists: bool) -> (EnvSettings, PathBuf) {
    let mut temp_dir = std::env::temp_dir();
    temp_dir.push(format!("ephemail_{}", name));

    if delete_if_exists && temp_dir.exists() {
        std::fs::remove_dir_all(&temp_dir).unwrap();
    }

    (
        EnvSettings {
            args: [(
                "db-path".to_string(),
                temp_dir.to_str().unwrap().to_string(),
            )]
            .into_iter()
            .collect(),
        },
        temp_dir,
    )
}

pub fn destroy_temp_dir(temp_dir: PathBuf) {
    std::fs::remove_dir_all(temp_dir).unwrap();
}
