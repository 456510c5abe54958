use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_postgres::Client;

use crate::notice::Notice;

/// A scoped delivery slot for backend notices.
///
/// The connection driver task holds a clone for the client's full lifetime
/// and forwards every notice it sees; a sender is only present while one
/// statement is executing, so notices never leak across statements and no
/// per-statement listener is ever attached to the client itself.
#[derive(Clone, Default)]
pub(crate) struct NoticeSlot {
    sender: Arc<Mutex<Option<UnboundedSender<Notice>>>>,
}

impl NoticeSlot {
    /// Install a fresh channel for the duration of one statement.
    pub(crate) fn install(&self) -> UnboundedReceiver<Notice> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.lock() = Some(tx);
        rx
    }

    /// Remove the current channel; notices raised afterwards are dropped.
    pub(crate) fn clear(&self) {
        *self.lock() = None;
    }

    /// Deliver a notice to the installed channel, if any.
    pub(crate) fn forward(&self, notice: Notice) {
        if let Some(tx) = self.lock().as_ref() {
            let _ = tx.send(notice);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<UnboundedSender<Notice>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One physical backend client plus the bookkeeping the pool needs: the
/// notice slot its driver task feeds, and the poison flag that tells the
/// pool to destroy rather than recycle it.
pub struct PooledClient {
    pub(crate) client: Client,
    pub(crate) notices: NoticeSlot,
    poisoned: bool,
}

impl PooledClient {
    pub(crate) fn new(client: Client, notices: NoticeSlot) -> Self {
        Self {
            client,
            notices,
            poisoned: false,
        }
    }

    /// The underlying driver client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Mark this client's state as unknown; the pool will evict it on release.
    pub(crate) fn poison(&mut self) {
        self.poisoned = true;
    }

    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}
