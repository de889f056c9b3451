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

use std::{borrow::Cow, fmt::Display};

use actix_web::{error, http::StatusCode, HttpResponse};

pub mod domain;
pub mod download;
pub mod fetch;
pub mod ingest;

#[derive(Debug, serde::Serialize)]
pub struct ProblemDetails {
    #[serde(rename(serialize = "type"))]
    p_type: Cow<'static, str>,
    pub status: u16,
    title: Cow<'static, str>,
    detail: Cow<'static, str>,
}

impl ProblemDetails {
    pub fn new(
        status: u16,
        title: impl Into<Cow<'static, str>>,
        detail: impl Into<Cow<'static, str>>,
    ) -> Self {
        ProblemDetails {
            p_type: "about:blank".into(),
            status,
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn internal_server_error() -> Self {
        ProblemDetails::new(
            500,
            "Internal Server Error",
            concat!(
                "There was a problem while processing your request. ",
                "Please contact the system administrator."
            ),
        )
    }

    pub fn invalid_parameters() -> Self {
        ProblemDetails::new(
            400,
            "Invalid Parameters",
            "One or multiple parameters could not be parsed.",
        )
    }

    pub fn not_found() -> Self {
        ProblemDetails::new(
            404,
            "Not Found",
            "The requested resource does not exist on this server.",
        )
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self).unwrap_or_default()
    }
}

impl Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.detail)
    }
}

impl error::ResponseError for ProblemDetails {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(("Content-Type", "application/problem+json"))
            .body(self.to_json())
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
