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

use actix_web::{web, HttpResponse};
use store::Store;

use crate::MailServer;

/// Domain suffixes available for generated mailbox addresses.
pub async fn handle_domain_list<T>(core: web::Data<MailServer<T>>) -> HttpResponse
where
    T: Store + 'static,
{
    HttpResponse::Ok().json(&core.domains)
}
