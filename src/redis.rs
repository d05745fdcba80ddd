// Redis client lifecycle.
//
// The connection is constructed once and handed to the components that
// need it (queue, result store, workers) instead of living in a module
// global. Workers get their own client so a blocking dequeue never stalls
// the connection the HTTP handlers share.

use redis::aio::ConnectionManager;

use crate::types::AppResult;

#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
}

impl RedisClient {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }

    /// Cheap multiplexed handle; clones share the underlying connection.
    pub fn connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
