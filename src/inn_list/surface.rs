//! Render targets for [`InnList`](super::InnList).

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;

/// A display target that accepts fully rendered markup.
///
/// The list is the sole writer; every render replaces the whole content.
pub trait RenderSurface: Send {
    /// Replace everything currently displayed with `markup`.
    fn replace_all(&mut self, markup: String);
}

/// In-memory surface. Keeps the last markup and counts writes.
#[derive(Debug, Default, Clone)]
pub struct BufferSurface {
    content: String,
    writes: usize,
}

impl BufferSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of `replace_all` calls received so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl RenderSurface for BufferSurface {
    fn replace_all(&mut self, markup: String) {
        self.content = markup;
        self.writes += 1;
    }
}

/// Surface that republishes every render to live subscribers.
///
/// The latest markup is also kept so late joiners (plain `GET` of the list
/// fragment) see the current state without waiting for the next push.
#[derive(Debug, Clone)]
pub struct BroadcastSurface {
    latest: Arc<RwLock<String>>,
    tx: broadcast::Sender<String>,
}

impl BroadcastSurface {
    /// Create a surface whose channel buffers up to `buffer` renders per subscriber.
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            latest: Arc::new(RwLock::new(String::new())),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> String {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RenderSurface for BroadcastSurface {
    fn replace_all(&mut self, markup: String) {
        {
            let mut guard = self.latest.write().unwrap_or_else(PoisonError::into_inner);
            guard.clone_from(&markup);
        }
        // No subscribers is fine: the page may not have opened its stream yet.
        let _ = self.tx.send(markup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_surface_replaces_content() {
        let mut surface = BufferSurface::new();
        surface.replace_all("<li>a</li>".to_string());
        surface.replace_all("<li>b</li>".to_string());
        assert_eq!(surface.content(), "<li>b</li>");
        assert_eq!(surface.writes(), 2);
    }

    #[tokio::test]
    async fn test_broadcast_surface_publishes_renders() {
        let mut surface = BroadcastSurface::new(4);
        let mut rx = surface.subscribe();

        surface.replace_all("<li>x</li>".to_string());

        assert_eq!(rx.recv().await.unwrap(), "<li>x</li>");
        assert_eq!(surface.latest(), "<li>x</li>");
    }

    #[test]
    fn test_broadcast_surface_without_subscribers() {
        let mut surface = BroadcastSurface::new(1);
        surface.replace_all("<li>y</li>".to_string());
        assert_eq!(surface.latest(), "<li>y</li>");
    }
}
