//! Deferred Work
//!
//! Results of background work (config file reads, platform notifications)
//! are posted here from any thread and consumed by the simulation only at
//! the start of the next tick.

use std::path::PathBuf;

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::ParsedConfig;
use crate::platform::UserId;

/// Work item applied at the next tick boundary.
#[derive(Debug)]
pub enum Deferred {
    /// A background config read finished
    ConfigLoaded(Result<ParsedConfig, String>),
    /// The platform reported a disconnect
    UserDisconnected(UserId),
}

/// Sending half, cloneable across tasks.
pub type DeferredSender = UnboundedSender<Deferred>;

/// Single-consumer, multi-producer handoff.
#[derive(Debug)]
pub struct DeferredQueue {
    tx: DeferredSender,
    rx: UnboundedReceiver<Deferred>,
}

impl Default for DeferredQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredQueue {
    /// Empty queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// A sender for background producers.
    pub fn sender(&self) -> DeferredSender {
        self.tx.clone()
    }

    /// Take everything posted so far, in arrival order. Never blocks.
    pub fn drain(&mut self) -> Vec<Deferred> {
        let mut items = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(item) => items.push(item),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        items
    }
}

/// Read and parse `path` on a blocking task and post the result.
///
/// Must be called from within a tokio runtime.
pub fn spawn_config_reload(path: PathBuf, sender: DeferredSender) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let result = ParsedConfig::read(&path).map_err(|err| err.to_string());
        debug!(path = %path.display(), ok = result.is_ok(), "config read finished");
        // The receiver is gone only when the game shut down.
        let _ = sender.send(Deferred::ConfigLoaded(result));
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order_across_threads() {
        let mut queue = DeferredQueue::new();
        let sender = queue.sender();
        std::thread::spawn(move || {
            for byte in 1..=3u8 {
                sender.send(Deferred::UserDisconnected(UserId::new([byte; 16]))).unwrap();
            }
        })
        .join()
        .unwrap();

        let drained: Vec<UserId> = queue
            .drain()
            .into_iter()
            .filter_map(|item| match item {
                Deferred::UserDisconnected(user) => Some(user),
                Deferred::ConfigLoaded(_) => None,
            })
            .collect();
        assert_eq!(drained, vec![UserId::new([1; 16]), UserId::new([2; 16]), UserId::new([3; 16])]);
        assert!(queue.drain().is_empty());
    }

    #[tokio::test]
    async fn test_background_reload_posts_result() {
        let dir = std::env::temp_dir().join(format!("bending-deferred-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.json");
        std::fs::write(&good, r#"{"abilities": {"blast": {"damage": 2.5}}}"#).unwrap();
        let missing = dir.join("missing.json");

        let mut queue = DeferredQueue::new();
        spawn_config_reload(good, queue.sender()).await.unwrap();
        spawn_config_reload(missing, queue.sender()).await.unwrap();

        let items = queue.drain();
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], Deferred::ConfigLoaded(Ok(_))));
        assert!(matches!(&items[1], Deferred::ConfigLoaded(Err(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
