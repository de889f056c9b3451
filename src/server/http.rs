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

use std::{net::SocketAddr, sync::Arc};

use actix_web::{middleware, web, App, HttpServer};
use store::{
    config::{env_settings::EnvSettings, MailConfig},
    tracing::info,
    MailStore, Store,
};

use crate::{
    api::{
        domain::handle_domain_list,
        download::handle_download,
        fetch::{handle_fetch, handle_fetch_detail, handle_fetch_latest},
        ingest::handle_ingest,
    },
    services::state_change::{init_state_manager, spawn_state_manager},
    MailServer, DEFAULT_HTTP_PORT,
};

pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 25 * 1024 * 1024;

pub fn init_mail_server<T>(settings: &EnvSettings) -> web::Data<MailServer<T>>
where
    T: Store + 'static,
{
    // Build the mail store
    let config = MailConfig::from(settings);
    let store = Arc::new(MailStore::new(T::open(settings).unwrap(), config, settings).unwrap());

    // Spawn the notification hub
    let (change_tx, change_rx) = init_state_manager();
    spawn_state_manager(change_rx);

    web::Data::new(MailServer {
        store,
        worker_pool: rayon::ThreadPoolBuilder::new()
            .num_threads(
                settings
                    .parse("worker-pool-size")
                    .filter(|v| *v > 0)
                    .unwrap_or_else(num_cpus::get),
            )
            .build()
            .unwrap(),
        state_change: change_tx,
        domains: settings.parse_list("domain-list").unwrap_or_default(),
    })
}

pub async fn start_mail_server<T>(
    mail_server: web::Data<MailServer<T>>,
    settings: EnvSettings,
) -> std::io::Result<()>
where
    T: Store + 'static,
{
    let http_addr = SocketAddr::from((
        settings.parse_ipaddr("bind-addr", "127.0.0.1"),
        settings.parse("http-port").unwrap_or(DEFAULT_HTTP_PORT),
    ));
    let max_message_size = settings
        .parse("max-message-size")
        .unwrap_or(DEFAULT_MAX_MESSAGE_SIZE);

    info!("Starting Ephemail server at {} (TCP)...", http_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .app_data(web::PayloadConfig::new(max_message_size))
            .app_data(mail_server.clone())
            .route("/api/report", web::post().to(handle_ingest::<T>))
            .route("/api/fetch", web::get().to(handle_fetch::<T>))
            .route("/api/fetch/latest", web::get().to(handle_fetch_latest::<T>))
            .route("/api/fetch/{id}", web::get().to(handle_fetch_detail::<T>))
            .route("/api/download/{id}", web::get().to(handle_download::<T>))
            .route("/api/domain", web::get().to(handle_domain_list::<T>))
    })
    .bind(http_addr)?
    .run()
    .await
}
