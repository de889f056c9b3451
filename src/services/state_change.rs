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
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use store::{
    ahash::AHashMap,
    tracing::{debug, error},
    Envelope, Store,
};
use tokio::{sync::mpsc, time};

use crate::{MailServer, IPC_CHANNEL_BUFFER};

pub type SubscriberId = u64;

pub const SUBSCRIBER_BUFFER: usize = 32;

const PURGE_EVERY_SECS: u64 = 3600;
const SEND_TIMEOUT_MS: u64 = 500;

static SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub enum Event {
    Subscribe {
        id: SubscriberId,
        address: String,
        once: bool,
        tx: mpsc::Sender<Envelope>,
    },
    Unsubscribe {
        id: SubscriberId,
        address: String,
    },
    Publish {
        envelope: Envelope,
    },
}

#[derive(Debug)]
struct Subscriber {
    id: SubscriberId,
    once: bool,
    tx: mpsc::Sender<Envelope>,
}

pub fn init_state_manager() -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
    mpsc::channel::<Event>(IPC_CHANNEL_BUFFER)
}

/// Spawns the notification hub. The manager task owns the subscriber
/// registry, so registrations and publishes never contend on a lock; all
/// mutation happens through the event channel.
pub fn spawn_state_manager(mut change_rx: mpsc::Receiver<Event>) {
    tokio::spawn(async move {
        let mut subscribers: AHashMap<String, Vec<Subscriber>> = AHashMap::default();
        let mut last_purge = Instant::now();

        while let Some(event) = change_rx.recv().await {
            match event {
                Event::Subscribe {
                    id,
                    address,
                    once,
                    tx,
                } => {
                    subscribers
                        .entry(address)
                        .or_insert_with(Vec::new)
                        .push(Subscriber { id, once, tx });
                }
                Event::Unsubscribe { id, address } => {
                    if let Some(list) = subscribers.get_mut(&address) {
                        list.retain(|subscriber| subscriber.id != id);
                        if list.is_empty() {
                            subscribers.remove(&address);
                        }
                    }
                }
                Event::Publish { envelope } => {
                    if let Some(list) = subscribers.get_mut(&envelope.to) {
                        list.retain(|subscriber| {
                            if subscriber.tx.is_closed() {
                                return false;
                            }
                            let subscriber_tx = subscriber.tx.clone();
                            let envelope = envelope.clone();

                            tokio::spawn(async move {
                                // Timeout in case there is a blocked client
                                if let Err(err) = subscriber_tx
                                    .send_timeout(
                                        envelope,
                                        Duration::from_millis(SEND_TIMEOUT_MS),
                                    )
                                    .await
                                {
                                    debug!("Error sending envelope to subscriber: {}", err);
                                }
                            });

                            !subscriber.once
                        });
                        if list.is_empty() {
                            subscribers.remove(&envelope.to);
                        }
                    }
                }
            }

            // Addresses are high-cardinality; drop entries whose consumers
            // disconnected without unsubscribing.
            if last_purge.elapsed() >= Duration::from_secs(PURGE_EVERY_SECS) {
                subscribers.retain(|_, list| {
                    list.retain(|subscriber| !subscriber.tx.is_closed());
                    !list.is_empty()
                });
                last_purge = Instant::now();
            }
        }
    });
}

/// Handle held by a live consumer waiting for new mail on one mailbox.
pub struct MailboxSubscription {
    id: SubscriberId,
    address: String,
    state_tx: mpsc::Sender<Event>,
    rx: mpsc::Receiver<Envelope>,
}

impl MailboxSubscription {
    /// Waits for the next envelope published to this mailbox. Returns None
    /// when `timeout` elapses or the subscription was removed.
    pub async fn next(&mut self, timeout: Duration) -> Option<Envelope> {
        time::timeout(timeout, self.rx.recv()).await.ok().flatten()
    }

    /// Removes this consumer from the registry. Safe to call after the
    /// registry already dropped it (deliver-once dispatch or disconnect).
    pub async fn unsubscribe(self) {
        let MailboxSubscription {
            id,
            address,
            state_tx,
            ..
        } = self;
        if let Err(err) = state_tx.send(Event::Unsubscribe { id, address }).await {
            debug!("Channel failure while unsubscribing: {}", err);
        }
    }
}

impl<T> MailServer<T>
where
    T: Store + 'static,
{
    pub async fn subscribe_mailbox(&self, address: String) -> Option<MailboxSubscription> {
        let (tx, rx) = mpsc::channel::<Envelope>(SUBSCRIBER_BUFFER);
        let id = SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed);

        if let Err(err) = self
            .state_change
            .send(Event::Subscribe {
                id,
                address: address.clone(),
                once: self.store.config.notify_once,
                tx,
            })
            .await
        {
            error!(
                "Channel failure while subscribing to state manager: {}",
                err
            );
            return None;
        }

        Some(MailboxSubscription {
            id,
            address,
            state_tx: self.state_change.clone(),
            rx,
        })
    }

    pub async fn publish_envelope(&self, envelope: Envelope) {
        if let Err(err) = self
            .state_change
            .send(Event::Publish { envelope })
            .await
        {
            error!("Channel failure while publishing envelope: {}", err);
        }
    }
}
