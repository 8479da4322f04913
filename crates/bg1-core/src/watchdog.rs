//! Clock sync watchdog.
//!
//! Each location's time board delegates the live clock to an external widget
//! writing into a `LiveElement`. The watchdog treats every content change of
//! that element as a heartbeat. When no heartbeat arrives for `SYNC_TIMEOUT`
//! the board is flagged "(unsynced)"; the next heartbeat clears the flag.
//!
//! Timing decisions live in `Freshness`, which is pure and takes explicit
//! instants. The spawned supervisor task only feeds it events.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{DateTimeSource, LiveClockWidget, LiveElement, WidgetHandle};
use crate::models::Location;
use crate::utils::truncate_fraction;

/// Quiet period after which the clock is considered stale
pub const SYNC_TIMEOUT: Duration = Duration::from_secs(5);

pub const NEXT_OPENING_LABEL: &str = "Next queue opening:";
pub const CURRENT_TIME_LABEL: &str = "Current time:";
pub const UNSYNCED_LABEL: &str = "(unsynced)";

/// Timer resolution. The timer fires one tick past the deadline, so a
/// heartbeat landing exactly on the deadline is always seen first.
const TIMER_TICK: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Synced,
    Unsynced,
}

/// Sync state plus the last displayed date/time payload.
///
/// `date` is re-read from the date-time source on every heartbeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub state: SyncState,
    pub date: String,
    pub time: String,
}

/// Deadline bookkeeping for one location.
#[derive(Debug, Clone)]
pub struct Freshness {
    timeout: Duration,
    deadline: Instant,
    state: SyncState,
}

impl Freshness {
    pub fn new(started: Instant, timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: started + timeout,
            state: SyncState::Synced,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// When the supervisor's timer should fire
    pub fn timer_at(&self) -> Instant {
        self.deadline + TIMER_TICK
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Record a heartbeat seen at `at`. Returns true when this recovers sync.
    pub fn heartbeat(&mut self, at: Instant) -> bool {
        self.deadline = at + self.timeout;
        let recovered = self.state == SyncState::Unsynced;
        self.state = SyncState::Synced;
        recovered
    }

    /// The timer fired at `now`. Returns true when this flips to unsynced.
    ///
    /// The deadline itself still counts as on time.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.state == SyncState::Unsynced || now <= self.deadline {
            return false;
        }
        self.state = SyncState::Unsynced;
        true
    }
}

/// One label/value row of the time board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRow {
    pub label: &'static str,
    pub value: String,
    /// Degraded indicator shown beside the value
    pub flag: Option<&'static str>,
}

/// Watchdog for a single location. Dropping it stops supervision.
pub struct SyncWatchdog {
    location: Location,
    opening: String,
    element: LiveElement,
    status: watch::Receiver<SyncStatus>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    _widget: WidgetHandle,
}

impl SyncWatchdog {
    /// Snapshot the time, attach the widget and start the freshness timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(
        location: Location,
        opening: impl Into<String>,
        source: Arc<dyn DateTimeSource>,
        widget: &dyn LiveClockWidget,
        timeout: Duration,
    ) -> Self {
        let snapshot = source.now();
        let element = LiveElement::new(location.element_id());
        let (status_tx, status) = watch::channel(SyncStatus {
            state: SyncState::Synced,
            date: snapshot.date,
            time: snapshot.time,
        });

        // Observe before the widget starts so its first write counts
        let observed = element.observe();
        let cancel = CancellationToken::new();
        let freshness = Freshness::new(Instant::now(), timeout);
        let task = tokio::spawn(supervise(
            location.clone(),
            source,
            observed,
            status_tx,
            freshness,
            cancel.clone(),
        ));
        let widget = widget.init(element.clone());

        info!(location = %location, element = element.id(), "Time board mounted");
        Self {
            location,
            opening: opening.into(),
            element,
            status,
            cancel,
            task: Some(task),
            _widget: widget,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn element(&self) -> &LiveElement {
        &self.element
    }

    pub fn opening(&self) -> &str {
        &self.opening
    }

    pub fn set_opening(&mut self, opening: impl Into<String>) {
        self.opening = opening.into();
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn is_synced(&self) -> bool {
        self.status.borrow().state == SyncState::Synced
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    /// The two rows of the time board
    pub fn rows(&self) -> [TimeRow; 2] {
        let status = self.status.borrow();
        [
            TimeRow {
                label: NEXT_OPENING_LABEL,
                value: self.opening.clone(),
                flag: None,
            },
            TimeRow {
                label: CURRENT_TIME_LABEL,
                value: truncate_fraction(&status.time).to_string(),
                flag: (status.state == SyncState::Unsynced).then_some(UNSYNCED_LABEL),
            },
        ]
    }

    /// Stop supervision and wait until the observer is released.
    pub async fn unmount(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        debug!(location = %self.location, "Time board unmounted");
    }
}

impl Drop for SyncWatchdog {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(ref task) = self.task {
            task.abort();
        }
    }
}

/// Supervisor loop: heartbeats reset a single deadline timer.
async fn supervise(
    location: Location,
    source: Arc<dyn DateTimeSource>,
    mut observed: watch::Receiver<String>,
    status: watch::Sender<SyncStatus>,
    mut freshness: Freshness,
    cancel: CancellationToken,
) {
    let timer = tokio::time::sleep_until(freshness.timer_at());
    tokio::pin!(timer);

    loop {
        tokio::select! {
            // Heartbeats are checked before the timer so ties favor liveness
            biased;

            _ = cancel.cancelled() => break,

            changed = observed.changed() => {
                if changed.is_err() {
                    debug!(location = %location, "Clock element dropped");
                    break;
                }
                let text = observed.borrow_and_update().clone();
                let recovered = freshness.heartbeat(Instant::now());
                timer.as_mut().reset(freshness.timer_at());
                let date = source.now().date;
                status.send_modify(|s| {
                    s.state = SyncState::Synced;
                    s.date = date;
                    s.time = text;
                });
                if recovered {
                    info!(location = %location, "Clock sync recovered");
                }
            }

            _ = &mut timer, if freshness.state() == SyncState::Synced => {
                if freshness.expire(Instant::now()) {
                    warn!(location = %location, "Clock widget stopped updating, marking unsynced");
                    status.send_modify(|s| s.state = SyncState::Unsynced);
                } else {
                    timer.as_mut().reset(freshness.timer_at());
                }
            }
        }
    }
}

/// The set of mounted time boards, at most one per location.
pub struct TimeBoards {
    source: Arc<dyn DateTimeSource>,
    widget: Arc<dyn LiveClockWidget>,
    timeout: Duration,
    boards: HashMap<Location, SyncWatchdog>,
}

impl TimeBoards {
    pub fn new(
        source: Arc<dyn DateTimeSource>,
        widget: Arc<dyn LiveClockWidget>,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            widget,
            timeout,
            boards: HashMap::new(),
        }
    }

    /// Mount a board for `location`, replacing any existing one.
    pub fn mount(&mut self, location: Location, opening: impl Into<String>) -> &SyncWatchdog {
        // The old watchdog stops before the new one starts observing
        if self.boards.remove(&location).is_some() {
            debug!(location = %location, "Replacing time board");
        }
        let board = SyncWatchdog::mount(
            location.clone(),
            opening,
            Arc::clone(&self.source),
            self.widget.as_ref(),
            self.timeout,
        );
        self.boards.entry(location).or_insert(board)
    }

    /// Update the opening time shown for `location`, mounting it if needed.
    pub fn show(&mut self, location: &Location, opening: &str) {
        match self.boards.get_mut(location) {
            Some(board) => board.set_opening(opening),
            None => {
                self.mount(location.clone(), opening);
            }
        }
    }

    pub fn get(&self, location: &Location) -> Option<&SyncWatchdog> {
        self.boards.get(location)
    }

    pub async fn unmount(&mut self, location: &Location) -> bool {
        match self.boards.remove(location) {
            Some(board) => {
                board.unmount().await;
                true
            }
            None => false,
        }
    }

    pub async fn unmount_all(&mut self) {
        let boards: Vec<SyncWatchdog> = self.boards.drain().map(|(_, b)| b).collect();
        join_all(boards.into_iter().map(SyncWatchdog::unmount)).await;
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedDateTime;
    use parking_lot::Mutex;

    /// A widget that never writes; tests mutate the element themselves.
    #[derive(Default)]
    struct StubWidget {
        inits: Mutex<Vec<String>>,
        handles: Mutex<Vec<CancellationToken>>,
    }

    impl LiveClockWidget for StubWidget {
        fn init(&self, element: LiveElement) -> WidgetHandle {
            self.inits.lock().push(element.id().to_string());
            let token = CancellationToken::new();
            self.handles.lock().push(token.clone());
            WidgetHandle::new(token)
        }
    }

    fn source() -> FixedDateTime {
        FixedDateTime::new("2020-04-05", "12:59:47.328")
    }

    fn mount(widget: &StubWidget, location: Location) -> SyncWatchdog {
        SyncWatchdog::mount(location, "13:00:00", Arc::new(source()), widget, SYNC_TIMEOUT)
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Every state published by `board`, in order
    fn record_states(board: &SyncWatchdog) -> Arc<Mutex<Vec<SyncState>>> {
        let mut rx = board.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().state;
                log.lock().push(state);
            }
        });
        seen
    }

    /// Write to the element from a separate task after `delay`
    fn write_later(element: &LiveElement, delay: Duration, text: &'static str) {
        let element = element.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            element.write(text);
        });
    }

    // -------------------------------------------------------------------------
    // Freshness
    // -------------------------------------------------------------------------

    #[test]
    fn test_freshness_expires_after_deadline() {
        let start = Instant::now();
        let mut f = Freshness::new(start, SYNC_TIMEOUT);
        assert!(!f.expire(start + SYNC_TIMEOUT - Duration::from_millis(1)));
        assert!(!f.expire(start + SYNC_TIMEOUT));
        assert_eq!(f.state(), SyncState::Synced);
        assert_eq!(f.timer_at(), start + SYNC_TIMEOUT + TIMER_TICK);

        assert!(f.expire(f.timer_at()));
        assert_eq!(f.state(), SyncState::Unsynced);
        assert!(!f.expire(start + SYNC_TIMEOUT * 2));
    }

    #[test]
    fn test_freshness_heartbeat_on_deadline_wins() {
        let start = Instant::now();
        let mut f = Freshness::new(start, SYNC_TIMEOUT);
        f.heartbeat(start + SYNC_TIMEOUT);
        assert!(!f.expire(start + SYNC_TIMEOUT));
        assert_eq!(f.state(), SyncState::Synced);
        assert_eq!(f.deadline(), start + SYNC_TIMEOUT * 2);
    }

    #[test]
    fn test_freshness_late_heartbeat_recovers() {
        let start = Instant::now();
        let mut f = Freshness::new(start, SYNC_TIMEOUT);
        assert!(f.expire(f.timer_at()));
        assert!(f.heartbeat(f.timer_at() + Duration::from_millis(1)));
        assert_eq!(f.state(), SyncState::Synced);
    }

    // -------------------------------------------------------------------------
    // SyncWatchdog
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_rows_show_opening_and_current_time() {
        let widget = StubWidget::default();
        let board = mount(&widget, Location::orlando());

        let rows = board.rows();
        assert_eq!(rows[0].label, "Next queue opening:");
        assert_eq!(rows[0].value, "13:00:00");
        assert_eq!(rows[1].label, "Current time:");
        assert_eq!(rows[1].value, "12:59:47");
        assert_eq!(rows[1].flag, None);
        assert_eq!(board.status().date, "2020-04-05");
        assert_eq!(*widget.inits.lock(), ["time-is-orlando"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsynced_after_timeout_without_mutation() {
        let widget = StubWidget::default();
        let board = mount(&widget, Location::orlando());

        sleep_ms(5_000).await;
        assert!(board.is_synced());

        sleep_ms(5).await;
        assert!(!board.is_synced());
        assert_eq!(board.rows()[1].flag, Some(UNSYNCED_LABEL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_on_deadline_from_widget_task_never_flags() {
        let widget = StubWidget::default();
        let board = mount(&widget, Location::orlando());
        let seen = record_states(&board);

        write_later(board.element(), SYNC_TIMEOUT, "12:59:52");
        sleep_ms(5_500).await;

        assert!(board.is_synced());
        assert_eq!(board.rows()[1].value, "12:59:52");
        assert!(!seen.lock().contains(&SyncState::Unsynced), "{:?}", seen.lock());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_past_deadline_flags_then_recovers() {
        let widget = StubWidget::default();
        let board = mount(&widget, Location::orlando());
        let seen = record_states(&board);

        write_later(board.element(), SYNC_TIMEOUT + 2 * TIMER_TICK, "12:59:53");
        sleep_ms(5_500).await;

        assert!(board.is_synced());
        assert_eq!(*seen.lock(), [SyncState::Unsynced, SyncState::Synced]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_keeps_board_synced() {
        let widget = StubWidget::default();
        let board = mount(&widget, Location::orlando());

        board.element().write("12:59:48");
        sleep_ms(4_999).await;
        assert!(board.is_synced());

        board.element().write("12:59:55");
        sleep_ms(4_000).await;
        assert!(board.is_synced());
        assert_eq!(board.rows()[1].value, "12:59:55");
        assert_eq!(board.rows()[1].flag, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_recovers_sync() {
        let widget = StubWidget::default();
        let board = mount(&widget, Location::orlando());
        let mut rx = board.subscribe();

        sleep_ms(6_000).await;
        assert!(!board.is_synced());

        board.element().write("12:59:54");
        sleep_ms(1).await;
        assert!(board.is_synced());
        assert_eq!(rx.borrow_and_update().time, "12:59:54");

        // And the timer was re-armed from the recovery heartbeat
        sleep_ms(5_010).await;
        assert!(!board.is_synced());
    }

    #[tokio::test(start_paused = true)]
    async fn test_locations_are_independent() {
        let widget = StubWidget::default();
        let orlando = mount(&widget, Location::orlando());
        let anaheim = mount(&widget, Location::anaheim());

        for second in 0..8 {
            orlando.element().write(format!("13:00:{:02}", second));
            sleep_ms(1_000).await;
        }

        assert!(orlando.is_synced());
        assert!(!anaheim.is_synced());
        assert_ne!(orlando.element().id(), anaheim.element().id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_releases_observer_and_widget() {
        let widget = StubWidget::default();
        let board = mount(&widget, Location::orlando());
        let element = board.element().clone();
        let mut status = board.subscribe();
        assert_eq!(element.observer_count(), 1);

        board.unmount().await;
        assert_eq!(element.observer_count(), 0);
        assert!(widget.handles.lock()[0].is_cancelled());

        // No callback fires against the removed board
        sleep_ms(10_000).await;
        assert!(!status.has_changed().unwrap_or(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_widget_keeps_board_synced() {
        use crate::clock::{DateTimeStrings, SystemClockWidget};
        use std::sync::atomic::{AtomicU32, Ordering};

        struct Ticking(AtomicU32);
        impl DateTimeSource for Ticking {
            fn now(&self) -> DateTimeStrings {
                let n = self.0.fetch_add(1, Ordering::SeqCst);
                DateTimeStrings {
                    date: "2020-04-05".into(),
                    time: format!("12:{:02}:{:02}.000", n / 60, n % 60),
                }
            }
        }

        let source = Arc::new(Ticking(AtomicU32::new(0)));
        let widget = SystemClockWidget::new(source.clone());
        let board = SyncWatchdog::mount(Location::orlando(), "13:00:00", source, &widget, SYNC_TIMEOUT);

        sleep_ms(30_000).await;
        assert!(board.is_synced());
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_refreshes_date() {
        struct Calendar(Mutex<&'static str>);
        impl DateTimeSource for Calendar {
            fn now(&self) -> crate::clock::DateTimeStrings {
                crate::clock::DateTimeStrings {
                    date: self.0.lock().to_string(),
                    time: "23:59:59.900".into(),
                }
            }
        }

        let calendar = Arc::new(Calendar(Mutex::new("2020-04-05")));
        let widget = StubWidget::default();
        let board = SyncWatchdog::mount(
            Location::orlando(),
            "13:00:00",
            calendar.clone(),
            &widget,
            SYNC_TIMEOUT,
        );
        assert_eq!(board.status().date, "2020-04-05");

        *calendar.0.lock() = "2020-04-06";
        board.element().write("00:00:00");
        sleep_ms(1).await;
        assert_eq!(board.status().date, "2020-04-06");
    }

    // -------------------------------------------------------------------------
    // TimeBoards
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_remount_replaces_board() {
        let widget = Arc::new(StubWidget::default());
        let mut boards = TimeBoards::new(Arc::new(source()), widget.clone(), SYNC_TIMEOUT);

        let first = boards.mount(Location::orlando(), "13:00:00").element().clone();
        boards.mount(Location::orlando(), "14:00:00");
        sleep_ms(1).await;

        assert_eq!(boards.len(), 1);
        assert_eq!(first.observer_count(), 0);
        assert!(widget.handles.lock()[0].is_cancelled());
        let board = boards.get(&Location::orlando()).unwrap();
        assert_eq!(board.opening(), "14:00:00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_updates_opening_in_place() {
        let widget = Arc::new(StubWidget::default());
        let mut boards = TimeBoards::new(Arc::new(source()), widget.clone(), SYNC_TIMEOUT);

        boards.show(&Location::orlando(), "13:00:00");
        boards.show(&Location::orlando(), "13:30:00");

        assert_eq!(widget.inits.lock().len(), 1);
        assert_eq!(boards.get(&Location::orlando()).unwrap().rows()[0].value, "13:30:00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_all() {
        let widget = Arc::new(StubWidget::default());
        let mut boards = TimeBoards::new(Arc::new(source()), widget.clone(), SYNC_TIMEOUT);
        boards.mount(Location::orlando(), "13:00:00");
        boards.mount(Location::anaheim(), "10:00:00");

        assert!(boards.unmount(&Location::anaheim()).await);
        assert!(!boards.unmount(&Location::anaheim()).await);
        boards.unmount_all().await;

        assert!(boards.is_empty());
        assert!(widget.handles.lock().iter().all(CancellationToken::is_cancelled));
    }
}
