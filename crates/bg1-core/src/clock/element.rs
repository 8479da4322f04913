use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// A text cell owned by a live widget and observed by a watchdog.
///
/// Only content changes are observable: rewriting the same text is not a
/// mutation.
#[derive(Clone)]
pub struct LiveElement {
    id: String,
    content: Arc<watch::Sender<String>>,
}

impl LiveElement {
    pub fn new(id: impl Into<String>) -> Self {
        let (content, _) = watch::channel(String::new());
        Self {
            id: id.into(),
            content: Arc::new(content),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replace the element's text. Returns whether the content changed.
    pub fn write(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.content.send_if_modified(|current| {
            if *current == text {
                false
            } else {
                *current = text;
                true
            }
        })
    }

    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }

    /// Observe future mutations. The current content counts as already seen.
    pub fn observe(&self) -> watch::Receiver<String> {
        self.content.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.content.receiver_count()
    }
}

impl fmt::Debug for LiveElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveElement")
            .field("id", &self.id)
            .field("content", &*self.content.borrow())
            .finish()
    }
}
