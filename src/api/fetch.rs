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

use std::time::Duration;

use actix_web::{error::ResponseError, web, HttpResponse};
use store::{tracing::error, Attachment, Envelope, EnvelopeId, Store};

use crate::{api::ProblemDetails, mail::sanitize_address, MailServer};

pub const DEFAULT_FETCH_LIMIT: usize = 20;
pub const MAX_FETCH_LIMIT: usize = 100;

#[derive(Debug, serde::Deserialize)]
pub struct Params {
    pub address: String,
    pub limit: Option<usize>,
}

#[derive(Debug, serde::Deserialize)]
pub struct LatestParams {
    pub address: String,
    pub timeout: Option<u64>,
}

#[derive(Debug, serde::Serialize)]
pub struct EnvelopeDetail {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub attachments: Vec<AttachmentEntry>,
}

/// Attachment metadata as exposed to clients; the on-disk path stays
/// internal.
#[derive(Debug, serde::Serialize)]
pub struct AttachmentEntry {
    pub id: String,
    pub filename: String,
    pub content_type: String,
}

impl From<Attachment> for AttachmentEntry {
    fn from(attachment: Attachment) -> Self {
        AttachmentEntry {
            id: attachment.id,
            filename: attachment.filename,
            content_type: attachment.content_type,
        }
    }
}

pub async fn handle_fetch<T>(
    params: web::Query<Params>,
    core: web::Data<MailServer<T>>,
) -> HttpResponse
where
    T: Store + 'static,
{
    let error = if let Some(address) = sanitize_address(&params.address) {
        let limit = params
            .limit
            .unwrap_or(DEFAULT_FETCH_LIMIT)
            .min(MAX_FETCH_LIMIT);
        let store = core.store.clone();
        match core
            .spawn_worker(move || store.query_mailbox(&address, limit))
            .await
        {
            Ok(envelopes) => return HttpResponse::Ok().json(envelopes),
            Err(err) => {
                error!("Failed to query mailbox: {}", err);
                ProblemDetails::internal_server_error()
            }
        }
    } else {
        ProblemDetails::invalid_parameters()
    };

    error.error_response()
}

pub async fn handle_fetch_detail<T>(
    path: web::Path<EnvelopeId>,
    core: web::Data<MailServer<T>>,
) -> HttpResponse
where
    T: Store + 'static,
{
    let id = path.into_inner();
    let store = core.store.clone();

    let error = match core
        .spawn_worker(move || {
            if let Some(envelope) = store.get_envelope(id)? {
                let attachments = store.query_attachments(envelope.id)?;
                Ok(Some((envelope, attachments)))
            } else {
                Ok(None)
            }
        })
        .await
    {
        Ok(Some((envelope, attachments))) => {
            return HttpResponse::Ok().json(EnvelopeDetail {
                envelope,
                attachments: attachments.into_iter().map(Into::into).collect(),
            });
        }
        Ok(None) => ProblemDetails::not_found(),
        Err(err) => {
            error!("Failed to fetch envelope {}: {}", id, err);
            ProblemDetails::internal_server_error()
        }
    };

    error.error_response()
}

/// Long-poll endpoint backing the interactive "wait for my next mail"
/// client: registers a live subscription and waits for the next envelope
/// published to the mailbox. Already-stored mail is served by the list
/// endpoint; this one only observes new arrivals.
pub async fn handle_fetch_latest<T>(
    params: web::Query<LatestParams>,
    core: web::Data<MailServer<T>>,
) -> HttpResponse
where
    T: Store + 'static,
{
    let error = if let Some(address) = sanitize_address(&params.address) {
        let ceiling = core.store.config.poll_timeout_secs;
        let timeout = Duration::from_secs(params.timeout.unwrap_or(ceiling).min(ceiling).max(1));

        match core.subscribe_mailbox(address).await {
            Some(mut subscription) => {
                let envelope = subscription.next(timeout).await;
                subscription.unsubscribe().await;
                match envelope {
                    Some(envelope) => return HttpResponse::Ok().json(envelope),
                    None => return HttpResponse::NoContent().finish(),
                }
            }
            None => ProblemDetails::internal_server_error(),
        }
    } else {
        ProblemDetails::invalid_parameters()
    };

    error.error_response()
}
