//! In-memory session manager, sessions and timer for tests

use crate::error::{Result, SessionError};
use crate::platform::{
    EventHandler, MediaProperties, MediaSession, PlaybackStatus, SessionEvent, SessionManager,
    SubscriptionToken, TimelineProperties,
};
use crate::poll::PollTimer;
use crate::publish::StateCell;
use crate::shutdown::ShutdownSignal;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tunewatch_core::MediaPlayerState;

type SharedHandler = Arc<dyn Fn() + Send + Sync>;
type Hook = Box<dyn FnOnce() + Send>;

struct FakeTrack {
    properties: MediaProperties,
    status: PlaybackStatus,
    timeline: TimelineProperties,
}

struct FakeSessionInner {
    name: String,
    track: Mutex<FakeTrack>,
    handlers: Mutex<HashMap<i64, (SessionEvent, SharedHandler)>>,
    next_token: AtomicI64,
    subscribes: AtomicUsize,
    unsubscribes: AtomicUsize,
    failing_queries: AtomicUsize,
    failing_timelines: AtomicUsize,
    query_hook: Mutex<Option<Hook>>,
}

/// Scriptable media session
#[derive(Clone)]
pub(crate) struct FakeSession {
    inner: Arc<FakeSessionInner>,
}

impl FakeSession {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            inner: Arc::new(FakeSessionInner {
                name: name.to_string(),
                track: Mutex::new(FakeTrack {
                    properties: MediaProperties::default(),
                    status: PlaybackStatus::Stopped,
                    timeline: TimelineProperties::default(),
                }),
                handlers: Mutex::new(HashMap::new()),
                next_token: AtomicI64::new(1),
                subscribes: AtomicUsize::new(0),
                unsubscribes: AtomicUsize::new(0),
                failing_queries: AtomicUsize::new(0),
                failing_timelines: AtomicUsize::new(0),
                query_hook: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn set_track(&self, title: &str, artist: &str, art: Option<&str>) {
        self.inner.track.lock().unwrap().properties = MediaProperties {
            title: Some(title.to_string()),
            artist: Some(artist.to_string()),
            album: None,
            album_art_url: art.map(str::to_string),
        };
    }

    pub(crate) fn set_status(&self, status: PlaybackStatus) {
        self.inner.track.lock().unwrap().status = status;
    }

    pub(crate) fn set_timeline(&self, position_seconds: f64, length_seconds: f64) {
        self.inner.track.lock().unwrap().timeline = TimelineProperties {
            position: Duration::from_secs_f64(position_seconds),
            end_time: Duration::from_secs_f64(length_seconds),
        };
    }

    /// The next `count` media property queries fail
    pub(crate) fn fail_next_queries(&self, count: usize) {
        self.inner.failing_queries.store(count, Ordering::SeqCst);
    }

    /// The next `count` timeline queries fail
    pub(crate) fn fail_next_timeline(&self, count: usize) {
        self.inner.failing_timelines.store(count, Ordering::SeqCst);
    }

    /// Run `hook` in the middle of the next media property query
    pub(crate) fn on_next_query(&self, hook: impl FnOnce() + Send + 'static) {
        *self.inner.query_hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Deliver a notification to every handler registered for `event`
    pub(crate) fn fire(&self, event: SessionEvent) {
        let handlers: Vec<SharedHandler> = self
            .inner
            .handlers
            .lock()
            .unwrap()
            .values()
            .filter(|(registered, _)| *registered == event)
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    pub(crate) fn active_subscriptions(&self) -> usize {
        self.inner.handlers.lock().unwrap().len()
    }

    pub(crate) fn total_subscribes(&self) -> usize {
        self.inner.subscribes.load(Ordering::SeqCst)
    }

    pub(crate) fn total_unsubscribes(&self) -> usize {
        self.inner.unsubscribes.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl MediaSession for FakeSession {
    fn source_app(&self) -> Option<String> {
        Some(self.inner.name.clone())
    }

    fn media_properties(&self) -> Result<MediaProperties> {
        let hook = self.inner.query_hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        if Self::take_failure(&self.inner.failing_queries) {
            return Err(SessionError::query("media properties", format!("{} went away", self.inner.name)));
        }
        Ok(self.inner.track.lock().unwrap().properties.clone())
    }

    fn playback_status(&self) -> Result<PlaybackStatus> {
        Ok(self.inner.track.lock().unwrap().status)
    }

    fn timeline(&self) -> Result<TimelineProperties> {
        if Self::take_failure(&self.inner.failing_timelines) {
            return Err(SessionError::query("timeline", format!("{} went away", self.inner.name)));
        }
        Ok(self.inner.track.lock().unwrap().timeline)
    }

    fn subscribe(&self, event: SessionEvent, handler: EventHandler) -> Result<SubscriptionToken> {
        let token = self.inner.next_token.fetch_add(1, Ordering::SeqCst);
        self.inner
            .handlers
            .lock()
            .unwrap()
            .insert(token, (event, Arc::from(handler)));
        self.inner.subscribes.fetch_add(1, Ordering::SeqCst);
        Ok(SubscriptionToken(token))
    }

    fn unsubscribe(&self, _event: SessionEvent, token: SubscriptionToken) -> Result<()> {
        // Like SMTC, removing an unknown token is not an error
        self.inner.handlers.lock().unwrap().remove(&token.0);
        self.inner.unsubscribes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct FakeManagerInner {
    current: Mutex<Option<FakeSession>>,
    handlers: Mutex<Vec<SharedHandler>>,
    fail_current: AtomicBool,
}

/// Scriptable session manager; clones share state
#[derive(Clone, Default)]
pub(crate) struct FakeManager {
    inner: Arc<FakeManagerInner>,
}

impl FakeManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_session(session: FakeSession) -> Self {
        let manager = Self::new();
        *manager.inner.current.lock().unwrap() = Some(session);
        manager
    }

    pub(crate) fn fail_current_session(&self, fail: bool) {
        self.inner.fail_current.store(fail, Ordering::SeqCst);
    }

    /// Switch the current session and notify, synchronously on this thread
    pub(crate) fn change_session(&self, session: Option<FakeSession>) {
        *self.inner.current.lock().unwrap() = session;
        let handlers: Vec<SharedHandler> = self.inner.handlers.lock().unwrap().clone();
        for handler in handlers {
            handler();
        }
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.inner.handlers.lock().unwrap().len()
    }
}

impl SessionManager for FakeManager {
    type Session = FakeSession;

    fn current_session(&self) -> Result<Option<FakeSession>> {
        if self.inner.fail_current.load(Ordering::SeqCst) {
            return Err(SessionError::query("current session", "manager is gone"));
        }
        Ok(self.inner.current.lock().unwrap().clone())
    }

    fn on_current_session_changed(&self, handler: EventHandler) -> Result<SubscriptionToken> {
        let mut handlers = self.inner.handlers.lock().unwrap();
        handlers.push(Arc::from(handler));
        Ok(SubscriptionToken(handlers.len() as i64))
    }
}

/// Timer that records requested delays instead of sleeping
///
/// Requests shutdown once `stop_after` delays were recorded. `on_tick` runs
/// with the index of each delay before the loop continues.
pub(crate) struct RecordingTimer {
    delays: Mutex<Vec<Duration>>,
    stop_after: usize,
    shutdown: ShutdownSignal,
    on_tick: Box<dyn Fn(usize) + Send + Sync>,
}

impl RecordingTimer {
    pub(crate) fn stopping_after(stop_after: usize, shutdown: ShutdownSignal) -> Self {
        Self::with_hook(stop_after, shutdown, |_| {})
    }

    pub(crate) fn with_hook(
        stop_after: usize,
        shutdown: ShutdownSignal,
        on_tick: impl Fn(usize) + Send + Sync + 'static,
    ) -> Self {
        Self {
            delays: Mutex::new(Vec::new()),
            stop_after,
            shutdown,
            on_tick: Box::new(on_tick),
        }
    }

    pub(crate) fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl PollTimer for RecordingTimer {
    async fn sleep(&self, delay: Duration) {
        let tick = {
            let mut delays = self.delays.lock().unwrap();
            delays.push(delay);
            delays.len()
        };
        (self.on_tick)(tick - 1);
        if tick >= self.stop_after {
            self.shutdown.request();
        }
        tokio::task::yield_now().await;
    }
}

/// Wait (up to two seconds) until the published state matches `pred`
pub(crate) async fn wait_for_state(
    state: &StateCell,
    pred: impl Fn(&MediaPlayerState) -> bool,
) -> MediaPlayerState {
    let wait = async {
        loop {
            let current = state.load();
            if pred(&current) {
                return current;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(2), wait)
        .await
        .expect("published state never matched")
}
