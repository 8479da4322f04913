use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::element::LiveElement;
use super::source::DateTimeSource;
use crate::utils::truncate_fraction;

/// How often the system widget rewrites its element
const SYSTEM_WIDGET_PERIOD: Duration = Duration::from_secs(1);

/// An external updater keeping a clock element current.
pub trait LiveClockWidget: Send + Sync {
    /// Begin live updates of `element`. Called once per location.
    fn init(&self, element: LiveElement) -> WidgetHandle;
}

/// Keeps a widget's updates running; dropping it stops them.
#[derive(Debug)]
pub struct WidgetHandle {
    cancel: CancellationToken,
}

impl WidgetHandle {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for WidgetHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Widget rendering the local clock from a `DateTimeSource`.
///
/// Must be initialized from within a tokio runtime.
pub struct SystemClockWidget {
    source: Arc<dyn DateTimeSource>,
}

impl SystemClockWidget {
    pub fn new(source: Arc<dyn DateTimeSource>) -> Self {
        Self { source }
    }
}

impl LiveClockWidget for SystemClockWidget {
    fn init(&self, element: LiveElement) -> WidgetHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let source = Arc::clone(&self.source);

        debug!(element = element.id(), "Clock widget started");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SYSTEM_WIDGET_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let now = source.now();
                        element.write(truncate_fraction(&now.time));
                    }
                }
            }
            debug!(element = element.id(), "Clock widget stopped");
        });

        WidgetHandle::new(cancel)
    }
}
