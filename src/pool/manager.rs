use std::future::Future;

use bb8::ManageConnection;
use futures_util::StreamExt;
use futures_util::stream;
use tokio_postgres::{AsyncMessage, NoTls};

use super::client::{NoticeSlot, PooledClient};
use crate::notice::Notice;

/// bb8 manager for backend clients.
///
/// Each established client gets exactly one driver task for its full
/// lifetime; that task both pumps the connection and forwards notices into
/// the client's slot.
pub struct ClientManager {
    pub(crate) config: tokio_postgres::Config,
}

impl ClientManager {
    #[must_use]
    pub fn new(config: tokio_postgres::Config) -> Self {
        Self { config }
    }
}

impl ManageConnection for ClientManager {
    type Connection = PooledClient;
    type Error = tokio_postgres::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let cfg = self.config.clone();
        async move {
            let (client, mut connection) = cfg.connect(NoTls).await?;
            tracing::debug!(
                hosts = ?cfg.get_hosts(),
                dbname = cfg.get_dbname(),
                "postgres client established"
            );

            let notices = NoticeSlot::default();
            let sink = notices.clone();
            tokio::spawn(async move {
                let mut messages = stream::poll_fn(move |cx| connection.poll_message(cx));
                while let Some(message) = messages.next().await {
                    match message {
                        Ok(AsyncMessage::Notice(db_error)) => {
                            sink.forward(Notice::from_db_error(&db_error));
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::debug!("postgres connection task ended: {e}");
                            break;
                        }
                    }
                }
            });

            Ok(PooledClient::new(client, notices))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move { conn.client.simple_query("SELECT 1").await.map(|_| ()) }
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        if conn.is_poisoned() {
            tracing::warn!("evicting poisoned postgres client");
            return true;
        }
        conn.client.is_closed()
    }
}
