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

use std::path::Path;

use actix_web::{error::ResponseError, http::StatusCode, web, HttpResponse};
use store::{tracing::error, Store};

use crate::{api::ProblemDetails, MailServer};

pub async fn handle_download<T>(
    path: web::Path<String>,
    core: web::Data<MailServer<T>>,
) -> HttpResponse
where
    T: Store + 'static,
{
    let id = path.into_inner();
    let store = core.store.clone();

    let error = match core
        .spawn_worker(move || {
            if let Some(attachment) = store.get_attachment(&id)? {
                Ok(store
                    .files
                    .get(Path::new(&attachment.filepath))?
                    .map(|bytes| (attachment, bytes)))
            } else {
                Ok(None)
            }
        })
        .await
    {
        Ok(Some((attachment, bytes))) => {
            return HttpResponse::build(StatusCode::OK)
                .insert_header(("Content-Type", attachment.content_type))
                .insert_header((
                    "Content-Disposition",
                    format!(
                        "attachment; filename=\"{}\"",
                        attachment.filename.replace('"', "'")
                    ),
                ))
                .body(bytes);
        }
        Ok(None) => ProblemDetails::not_found(),
        Err(err) => {
            error!("Attachment download failed: {}", err);
            ProblemDetails::internal_server_error()
        }
    };

    error.error_response()
}
