//! Current-session tracking for platforms with a session manager (SMTC)
//!
//! The tracker owns the bound session and its three change subscriptions.
//! Every change to "which session is bound" happens under one mutex, while
//! the published state lives in a [`StateCell`] that readers load without
//! touching that mutex.

use crate::error::Result;
use crate::platform::{
    EventHandler, MediaSession, SessionEvent, SessionManager, SubscriptionToken,
};
use crate::poll::Refresher;
use crate::publish::StateCell;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};
use tunewatch_core::MediaPlayerState;

/// A session together with the subscriptions attached to it
///
/// Detaching consumes the value, so a session's handlers can only be removed
/// once and a replaced session cannot keep any.
struct BoundSession<S: MediaSession> {
    session: S,
    subscriptions: Vec<(SessionEvent, SubscriptionToken)>,
}

impl<S: MediaSession> BoundSession<S> {
    fn attach(session: S, mut handler_for: impl FnMut(SessionEvent) -> EventHandler) -> Self {
        let mut subscriptions = Vec::with_capacity(SessionEvent::ALL.len());
        for event in SessionEvent::ALL {
            match session.subscribe(event, handler_for(event)) {
                Ok(token) => subscriptions.push((event, token)),
                // Polling still covers this session
                Err(e) => warn!("Failed to attach media session handler: {}", e),
            }
        }
        debug!("Attached {} media session handlers", subscriptions.len());
        Self {
            session,
            subscriptions,
        }
    }

    fn detach(self) {
        for (event, token) in self.subscriptions {
            if let Err(e) = self.session.unsubscribe(event, token) {
                warn!("Failed to detach {:?} handler from media session: {}", event, e);
            }
        }
        debug!("Detached media session handlers");
    }
}

struct Binding<S: MediaSession> {
    current: Option<BoundSession<S>>,
    /// Bumped on every session change; refreshes publish only if it is unchanged
    generation: u64,
}

pub(crate) struct SessionTracker<M: SessionManager> {
    manager: M,
    binding: Mutex<Binding<M::Session>>,
    state: Arc<StateCell>,
    runtime: Handle,
}

impl<M: SessionManager> SessionTracker<M> {
    pub(crate) fn new(manager: M, state: Arc<StateCell>, runtime: Handle) -> Self {
        Self {
            manager,
            binding: Mutex::new(Binding {
                current: None,
                generation: 0,
            }),
            state,
            runtime,
        }
    }

    /// Subscribe to session changes and bind the initial session.
    ///
    /// Handlers only hold a weak reference, so once the tracker is dropped
    /// late notifications do nothing.
    pub(crate) fn start(self: &Arc<Self>) -> Result<()> {
        let tracker = Arc::downgrade(self);
        self.manager
            .on_current_session_changed(Box::new(move || {
                trace!("Current media session changed notification");
                if let Some(tracker) = tracker.upgrade() {
                    tracker.on_current_session_changed();
                }
            }))?;

        // A change delivered during registration may already have bound a session
        let mut binding = self.lock_binding();
        if let Some(early) = binding.current.take() {
            early.detach();
        }
        binding.generation = binding.generation.wrapping_add(1);

        match self.manager.current_session()? {
            Some(session) => {
                info!("Found current media session");
                binding.current = Some(self.bind(session));
            }
            None => debug!("No current media session"),
        }
        Ok(())
    }

    /// Replace the bound session with whatever the OS now reports as current.
    ///
    /// Runs on the notifier's thread. With no session the default state is
    /// published before returning.
    pub(crate) fn on_current_session_changed(self: &Arc<Self>) {
        let mut binding = self.lock_binding();
        if let Some(old) = binding.current.take() {
            old.detach();
        }
        binding.generation = binding.generation.wrapping_add(1);

        match self.manager.current_session() {
            Ok(Some(session)) => {
                info!("Media session changed, tracking new session");
                binding.current = Some(self.bind(session));
                drop(binding);
                self.schedule_refresh();
            }
            Ok(None) => {
                info!("Media session closed");
                self.state.reset();
            }
            Err(e) => {
                warn!("Failed to query current media session: {}", e);
                self.state.reset();
            }
        }
    }

    /// Query the bound session and publish the result as one snapshot.
    ///
    /// Overlapping refreshes are last-completed-wins. A refresh that started
    /// before a session change is dropped instead of published.
    pub(crate) fn refresh(&self) {
        let (session, generation) = {
            let binding = self.lock_binding();
            (
                binding.current.as_ref().map(|bound| bound.session.clone()),
                binding.generation,
            )
        };

        let next = match session {
            Some(session) => read_state(&session).unwrap_or_else(|e| {
                warn!("Failed to update media session status: {}", e);
                MediaPlayerState::default()
            }),
            None => MediaPlayerState::default(),
        };

        let binding = self.lock_binding();
        if binding.generation == generation {
            self.state.publish(next);
        } else {
            debug!("Discarding refresh of a replaced media session");
        }
    }

    fn bind(self: &Arc<Self>, session: M::Session) -> BoundSession<M::Session> {
        if let Some(app) = session.source_app() {
            info!("Tracking media session from {}", app);
        }
        BoundSession::attach(session, |event| self.refresh_trigger(event))
    }

    fn refresh_trigger(self: &Arc<Self>, event: SessionEvent) -> EventHandler {
        let tracker = Arc::downgrade(self);
        Box::new(move || {
            trace!("Media session {:?} notification", event);
            if let Some(tracker) = tracker.upgrade() {
                tracker.schedule_refresh();
            }
        })
    }

    /// Fire-and-forget refresh on the runtime's blocking pool
    fn schedule_refresh(self: &Arc<Self>) {
        let tracker = Arc::clone(self);
        let refresh = self.runtime.spawn_blocking(move || tracker.refresh());
        let state = Arc::clone(&self.state);
        self.runtime.spawn(async move {
            if let Err(e) = refresh.await {
                warn!("Media refresh task failed: {}", e);
                state.reset();
            }
        });
    }

    fn lock_binding(&self) -> MutexGuard<'_, Binding<M::Session>> {
        self.binding.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<M: SessionManager> Refresher for SessionTracker<M> {
    fn refresh(&self) {
        SessionTracker::refresh(self);
    }
}

/// Read all three facets of a session; any failure fails the whole read.
fn read_state<S: MediaSession>(session: &S) -> Result<MediaPlayerState> {
    let properties = session.media_properties()?;
    let status = session.playback_status()?;
    let timeline = session.timeline()?;

    Ok(MediaPlayerState {
        title: properties.title,
        artist: properties.artist,
        album: properties.album,
        album_art_url: properties.album_art_url,
        is_playing: status.is_playing(),
        position_seconds: timeline.position.as_secs_f64(),
        length_seconds: timeline.end_time.as_secs_f64(),
    })
}
