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

use std::sync::Arc;

use store::MailStore;
use tokio::sync::mpsc;

pub mod api;
pub mod mail;
pub mod server;
pub mod services;

#[cfg(test)]
pub mod tests;

pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const IPC_CHANNEL_BUFFER: usize = 1024;

pub struct MailServer<T> {
    pub store: Arc<MailStore<T>>,
    pub worker_pool: rayon::ThreadPool,
    pub state_change: mpsc::Sender<services::state_change::Event>,
    pub domains: Vec<String>,
}
