//! Master actor: one Tokio task that owns the [`Master`].
//!
//! Connection handlers never touch lobby state directly. They send
//! commands over a bounded channel and the actor applies them one at a
//! time, in arrival order, then fans the resulting notifications out to
//! each client's outbox.

use std::collections::HashMap;

use dropfour_protocol::{ClientId, ServerMessage};
use tokio::sync::{mpsc, oneshot};

use crate::{LobbyStats, Master, MasterUnavailable, Outbox, Signal};

/// Channel sender for delivering notifications to one client.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

enum MasterCommand {
    /// Register the outbox for a freshly accepted connection.
    Connect {
        client: ClientId,
        outbox: ClientSender,
        reply: oneshot::Sender<()>,
    },

    /// Apply a signal from a client (fire-and-forget).
    Signal { client: ClientId, signal: Signal },

    Stats {
        reply: oneshot::Sender<LobbyStats>,
    },

    Shutdown,
}

/// Handle to the running master actor.
///
/// Cheap to clone; every connection handler holds one.
#[derive(Clone)]
pub struct MasterHandle {
    sender: mpsc::Sender<MasterCommand>,
}

impl MasterHandle {
    /// Registers `client`'s outbox. Returns once the actor has recorded
    /// it, so later notifications for `client` are never lost.
    pub async fn connect(
        &self,
        client: ClientId,
        outbox: ClientSender,
    ) -> Result<(), MasterUnavailable> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MasterCommand::Connect {
                client,
                outbox,
                reply: reply_tx,
            })
            .await
            .map_err(|_| MasterUnavailable)?;
        reply_rx.await.map_err(|_| MasterUnavailable)
    }

    /// Queues `signal` for processing. Replies arrive on the outbox.
    pub async fn signal(
        &self,
        client: ClientId,
        signal: Signal,
    ) -> Result<(), MasterUnavailable> {
        self.sender
            .send(MasterCommand::Signal { client, signal })
            .await
            .map_err(|_| MasterUnavailable)
    }

    pub async fn stats(&self) -> Result<LobbyStats, MasterUnavailable> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MasterCommand::Stats { reply: reply_tx })
            .await
            .map_err(|_| MasterUnavailable)?;
        reply_rx.await.map_err(|_| MasterUnavailable)
    }

    /// Stops the actor after the commands already queued.
    pub async fn shutdown(&self) -> Result<(), MasterUnavailable> {
        self.sender
            .send(MasterCommand::Shutdown)
            .await
            .map_err(|_| MasterUnavailable)
    }
}

struct MasterActor {
    master: Master,
    outboxes: HashMap<ClientId, ClientSender>,
    receiver: mpsc::Receiver<MasterCommand>,
}

impl MasterActor {
    async fn run(mut self) {
        tracing::info!("master actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                MasterCommand::Connect {
                    client,
                    outbox,
                    reply,
                } => {
                    self.outboxes.insert(client, outbox);
                    tracing::debug!(%client, connected = self.outboxes.len(), "client connected");
                    let _ = reply.send(());
                }
                MasterCommand::Signal { client, signal } => {
                    let outbox = self.master.handle(client, signal);
                    self.dispatch(outbox);
                    if signal == Signal::Disconnect {
                        self.outboxes.remove(&client);
                    }
                }
                MasterCommand::Stats { reply } => {
                    let _ = reply.send(self.master.stats());
                }
                MasterCommand::Shutdown => {
                    tracing::info!("master shutting down");
                    break;
                }
            }
        }

        tracing::info!("master actor stopped");
    }

    /// Silently drops notifications for clients whose connection is gone.
    fn dispatch(&self, outbox: Outbox) {
        for (client, msg) in outbox {
            if let Some(tx) = self.outboxes.get(&client) {
                let _ = tx.send(msg);
            }
        }
    }
}

/// Spawns the master actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_master(master: Master, channel_size: usize) -> MasterHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = MasterActor {
        master,
        outboxes: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    MasterHandle { sender: tx }
}
