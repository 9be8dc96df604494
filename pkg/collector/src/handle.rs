use std::future::Future;

/// Lazily initialized client.
///
/// A failed initialization leaves the handle `Uninitialized`, so the next
/// call tries again.
#[derive(Debug)]
pub enum ConnectionHandle<T> {
    Uninitialized,
    Ready(T),
}

impl<T> Default for ConnectionHandle<T> {
    fn default() -> Self {
        ConnectionHandle::Uninitialized
    }
}

impl<T: Clone> ConnectionHandle<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionHandle::Ready(_))
    }

    pub fn get(&self) -> Option<T> {
        match self {
            ConnectionHandle::Ready(client) => Some(client.clone()),
            ConnectionHandle::Uninitialized => None,
        }
    }

    /// Return the ready client, running `init` only while uninitialized.
    pub async fn get_or_try_init<F, Fut, E>(&mut self, init: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let ConnectionHandle::Ready(client) = self {
            return Ok(client.clone());
        }
        let client = init().await?;
        *self = ConnectionHandle::Ready(client.clone());
        Ok(client)
    }
}
