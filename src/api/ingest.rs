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

use actix_web::{error::ResponseError, web, HttpResponse};
use store::{
    tracing::{debug, error},
    EnvelopeId, Store,
};

use crate::{
    api::ProblemDetails,
    mail::{ingest::persist_attachments, parse::decompose, sanitize_address, MailMessage},
    MailServer,
};

#[derive(Debug, serde::Deserialize)]
pub struct Params {
    pub to: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct IngestResponse {
    pub id: EnvelopeId,
}

/// Ingestion entry point, called by the mail-receiving gateway with the raw
/// MIME payload. Parsing and envelope persistence gate the response; the
/// live notification and attachment persistence are dispatched as
/// fire-and-forget tasks so a slow disk or subscriber never delays the
/// gateway or turns a received message into a reported failure.
pub async fn handle_ingest<T>(
    params: web::Query<Params>,
    bytes: web::Bytes,
    core: web::Data<MailServer<T>>,
) -> HttpResponse
where
    T: Store + 'static,
{
    let error = if let Some(to) = sanitize_address(&params.to) {
        let raw = bytes.to_vec();
        match core.spawn_worker(move || Ok(decompose(&raw))).await {
            Ok(Ok(message)) => {
                let MailMessage {
                    subject,
                    from,
                    content,
                    attachments,
                } = message;

                let store = core.store.clone();
                let envelope_to = to.clone();
                match core
                    .spawn_worker(move || store.create_envelope(envelope_to, from, subject, content))
                    .await
                {
                    Ok(envelope) => {
                        debug!(
                            "Report: {} <- {}: {}",
                            envelope.to, envelope.from, envelope.subject
                        );

                        let server = core.clone();
                        let published = envelope.clone();
                        tokio::spawn(async move {
                            server.publish_envelope(published).await;
                        });

                        if !attachments.is_empty() {
                            let server = core.clone();
                            let owner_id = envelope.id;
                            tokio::spawn(async move {
                                let store = server.store.clone();
                                if let Err(err) = server
                                    .spawn_worker(move || {
                                        Ok(persist_attachments(&store, &to, owner_id, attachments))
                                    })
                                    .await
                                {
                                    error!(
                                        "Failed to persist attachments of envelope {}: {}",
                                        owner_id, err
                                    );
                                }
                            });
                        }

                        return HttpResponse::Ok().json(IngestResponse { id: envelope.id });
                    }
                    Err(err) => {
                        error!("Failed to persist envelope: {}", err);
                        ProblemDetails::internal_server_error()
                    }
                }
            }
            Ok(Err(err)) => {
                debug!("Rejected message for {}: {}", to, err);
                ProblemDetails::invalid_parameters()
            }
            Err(err) => {
                error!("Worker failure while parsing message: {}", err);
                ProblemDetails::internal_server_error()
            }
        }
    } else {
        debug!("Rejected report with invalid recipient {:?}", params.to);
        ProblemDetails::invalid_parameters()
    };

    error.error_response()
}
