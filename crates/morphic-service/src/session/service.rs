//! Session service: signs users in and out and applies their preferences.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{info, warn};
use uuid::Uuid;

use morphic_core::error::AppError;
use morphic_core::result::AppResult;
use morphic_entity::preferences::DEFAULT_PREFERENCES_ID;
use morphic_entity::{PreferenceKey, PreferenceValue, Preferences, User};
use morphic_storage::LoadStatus;

use crate::apply::ApplyReport;
use crate::capture::CaptureReport;
use crate::context::SessionContext;

use super::events::SessionEvent;

/// Capacity of the event channel.
const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    preferences: Option<Preferences>,
}

/// The signed-in user and the preferences record the bar operates on.
///
/// Clones share state and the event channel. Every sequence that changes
/// the loaded record and saves it runs under `update`, so applies, captures
/// and sign-ins never interleave and saves land in the order they ran.
#[derive(Debug, Clone)]
pub struct Session {
    context: SessionContext,
    state: Arc<RwLock<SessionState>>,
    update: Arc<Mutex<()>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Creates a session with nothing loaded.
    pub fn new(context: SessionContext) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            context,
            state: Arc::new(RwLock::new(SessionState::default())),
            update: Arc::new(Mutex::new(())),
            events,
        }
    }

    /// The collaborators this session uses.
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Receive future session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The signed-in user.
    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    /// The loaded preferences record.
    pub async fn preferences(&self) -> Option<Preferences> {
        self.state.read().await.preferences.clone()
    }

    /// Load `user_id` and their preferences, or the default record when no
    /// user is given or the user cannot be loaded. Replays the preferences
    /// when `apply_on_open` is configured.
    pub async fn open(&self, user_id: Option<Uuid>) -> AppResult<()> {
        let user = match user_id {
            Some(id) => match self.context.storage.load::<User>(&id.to_string()).await {
                (LoadStatus::Success, Some(user)) => Some(user),
                (status, _) => {
                    warn!(user_id = %id, status = %status, "Could not load user, opening with defaults");
                    None
                }
            },
            None => None,
        };

        match user {
            Some(user) => self.activate(user).await?,
            None => self.activate_defaults().await?,
        }

        if self.context.config.apply_on_open {
            self.apply_preferences().await;
        }
        Ok(())
    }

    /// Persist `user` and make them the signed-in user.
    pub async fn sign_in(&self, user: User) -> AppResult<()> {
        if !self.context.storage.save(&user).await {
            return Err(AppError::storage(format!(
                "Failed to save user {}",
                user.identifier
            )));
        }
        self.activate(user).await
    }

    /// Drop the signed-in user and fall back to the default record.
    pub async fn sign_out(&self) -> AppResult<()> {
        self.activate_defaults().await
    }

    async fn activate(&self, mut user: User) -> AppResult<()> {
        let _update = self.update.lock().await;
        let identifier = match user.preferences_identifier() {
            Some(identifier) => identifier,
            None => {
                let preferences_id = Uuid::new_v4();
                user.preferences_id = Some(preferences_id);
                if !self.context.storage.save(&user).await {
                    return Err(AppError::storage(format!(
                        "Failed to save user {}",
                        user.identifier
                    )));
                }
                preferences_id.to_string()
            }
        };

        let preferences = match self.context.storage.load::<Preferences>(&identifier).await {
            (LoadStatus::Success, Some(preferences)) => preferences,
            (LoadStatus::NotFound, _) => {
                Preferences::for_user(identifier.clone(), user.identifier.to_string())
            }
            _ => {
                return Err(AppError::storage(format!(
                    "Failed to load preferences '{identifier}'"
                )));
            }
        };

        let user_id = user.identifier;
        {
            let mut state = self.state.write().await;
            state.user = Some(user);
            state.preferences = Some(preferences);
        }
        info!(user_id = %user_id, preferences = %identifier, "Session opened for user");
        self.emit(SessionEvent::UserChanged {
            user_id: Some(user_id),
        });
        self.emit(SessionEvent::PreferencesChanged { identifier });
        Ok(())
    }

    async fn activate_defaults(&self) -> AppResult<()> {
        let _update = self.update.lock().await;
        let preferences = match self
            .context
            .storage
            .load::<Preferences>(DEFAULT_PREFERENCES_ID)
            .await
        {
            (LoadStatus::Success, Some(preferences)) => preferences,
            _ => {
                return Err(AppError::storage("Failed to load the default preferences"));
            }
        };

        let had_user = {
            let mut state = self.state.write().await;
            state.preferences = Some(preferences);
            state.user.take().is_some()
        };
        info!("Session opened with default preferences");
        if had_user {
            self.emit(SessionEvent::UserChanged { user_id: None });
        }
        self.emit(SessionEvent::PreferencesChanged {
            identifier: DEFAULT_PREFERENCES_ID.to_string(),
        });
        Ok(())
    }

    /// Apply one value and, when the write succeeds, record it in the
    /// loaded preferences and save them.
    pub async fn apply(&self, value: impl Into<PreferenceValue>, key: PreferenceKey) -> ApplyReport {
        let value = value.into();
        let _update = self.update.lock().await;
        let report = self
            .context
            .apply([(key.clone(), value.clone())])
            .run()
            .await;

        if report.outcome(&key).is_some_and(|o| o.is_applied()) {
            let updated = {
                let mut state = self.state.write().await;
                state.preferences.as_mut().map(|preferences| {
                    preferences.set(key, value);
                    preferences.clone()
                })
            };
            if let Some(preferences) = updated {
                self.persist(&preferences).await;
            }
        }
        report
    }

    /// Replay every value of the loaded preferences onto the system.
    pub async fn apply_preferences(&self) -> ApplyReport {
        match self.preferences().await {
            Some(preferences) => self.context.apply_preferences(&preferences).run().await,
            None => ApplyReport::default(),
        }
    }

    /// Capture `keys` into the loaded preferences and save them.
    pub async fn capture(
        &self,
        keys: impl IntoIterator<Item = PreferenceKey>,
    ) -> AppResult<CaptureReport> {
        let _update = self.update.lock().await;
        let preferences = self
            .preferences()
            .await
            .ok_or_else(|| AppError::session("No preferences loaded; open the session first"))?;

        let report = self.context.capture(preferences, keys).run().await;

        let merged = {
            let mut state = self.state.write().await;
            let current = state
                .preferences
                .as_mut()
                .ok_or_else(|| AppError::session("Preferences were unloaded during capture"))?;
            let previous = current.clone();
            for (key, outcome) in &report.outcomes {
                if let (true, Some(value)) = (outcome.is_captured(), report.preferences.get(key)) {
                    current.set(key.clone(), value.clone());
                }
            }
            let merged = current.clone();
            if !self.context.storage.save(&merged).await {
                *current = previous;
                return Err(AppError::storage(format!(
                    "Failed to save preferences '{}'",
                    merged.identifier()
                )));
            }
            merged
        };

        self.emit(SessionEvent::PreferencesChanged {
            identifier: merged.identifier().to_string(),
        });
        Ok(report)
    }

    /// Save the loaded preferences. Returns `false` when nothing is loaded
    /// or the save fails.
    pub async fn save_preferences(&self) -> bool {
        match self.preferences().await {
            Some(preferences) => self.context.storage.save(&preferences).await,
            None => false,
        }
    }

    async fn persist(&self, preferences: &Preferences) {
        if !self.context.storage.save(preferences).await {
            warn!(identifier = preferences.identifier(), "Failed to save preferences");
        }
        self.emit(SessionEvent::PreferencesChanged {
            identifier: preferences.identifier().to_string(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::settings::{InMemorySettingsManager, keys};

    fn session() -> (Session, InMemorySettingsManager) {
        let manager = InMemorySettingsManager::with_well_known();
        (Session::new(SessionContext::in_memory(manager.clone())), manager)
    }

    #[tokio::test]
    async fn test_open_without_user_loads_defaults() {
        let (session, _) = session();
        session.open(None).await.unwrap();

        assert!(session.user().await.is_none());
        let prefs = session.preferences().await.unwrap();
        assert_eq!(prefs.identifier(), DEFAULT_PREFERENCES_ID);
        assert!(prefs.is_empty());
    }

    #[tokio::test]
    async fn test_open_unknown_user_falls_back_to_defaults() {
        let (session, _) = session();
        session.open(Some(Uuid::new_v4())).await.unwrap();
        assert!(session.user().await.is_none());
        assert!(session.preferences().await.unwrap().is_default());
    }

    #[tokio::test]
    async fn test_sign_in_creates_user_preferences() {
        let (session, _) = session();
        let user = User::new();
        let prefs_id = user.preferences_identifier().unwrap();
        let mut events = session.subscribe();

        session.sign_in(user.clone()).await.unwrap();

        let prefs = session.preferences().await.unwrap();
        assert_eq!(prefs.identifier(), prefs_id);
        assert_eq!(prefs.user_id(), Some(user.identifier.to_string().as_str()));
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::UserChanged {
                user_id: Some(user.identifier)
            }
        );
        assert!(session.context().storage.contains::<User>(&user.identifier.to_string()));
    }

    #[tokio::test]
    async fn test_user_without_preferences_id_gets_one() {
        let (session, _) = session();
        let user = User::with_identifier(Uuid::new_v4());
        session.sign_in(user.clone()).await.unwrap();

        let signed_in = session.user().await.unwrap();
        assert!(signed_in.preferences_id.is_some());
        let (status, stored) = session
            .context()
            .storage
            .load::<User>(&user.identifier.to_string())
            .await;
        assert_eq!(status, LoadStatus::Success);
        assert_eq!(stored.unwrap().preferences_id, signed_in.preferences_id);
    }

    #[tokio::test]
    async fn test_apply_records_and_saves() {
        let (session, manager) = session();
        session.open(None).await.unwrap();

        let report = session.apply(true, keys::display_contrast_enabled()).await;
        assert!(report.all_applied());
        assert_eq!(
            manager.current(&keys::display_contrast_enabled()),
            Some(PreferenceValue::Bool(true))
        );

        let (status, stored) = session
            .context()
            .storage
            .load::<Preferences>(DEFAULT_PREFERENCES_ID)
            .await;
        assert_eq!(status, LoadStatus::Success);
        assert_eq!(
            stored.unwrap().get(&keys::display_contrast_enabled()),
            Some(&PreferenceValue::Bool(true))
        );
    }

    #[tokio::test]
    async fn test_failed_apply_is_not_recorded() {
        let (session, manager) = session();
        manager.reject(keys::voiceover_enabled());
        session.open(None).await.unwrap();

        let report = session.apply(true, keys::voiceover_enabled()).await;
        assert!(!report.all_applied());
        assert!(session.preferences().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_capture_saves_into_loaded_record() {
        let (session, manager) = session();
        session.sign_in(User::new()).await.unwrap();
        manager.set_current(&keys::audio_volume(), 0.2);

        let report = session
            .capture([keys::audio_volume(), keys::zoom_enabled()])
            .await
            .unwrap();
        assert_eq!(report.captured_count(), 1);

        let prefs = session.preferences().await.unwrap();
        let (status, stored) = session
            .context()
            .storage
            .load::<Preferences>(prefs.identifier())
            .await;
        assert_eq!(status, LoadStatus::Success);
        assert_eq!(stored.unwrap(), prefs);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_capture_and_apply_keep_both_values() {
        let manager =
            InMemorySettingsManager::with_well_known().with_latency(Duration::from_millis(50));
        let session = Session::new(SessionContext::in_memory(manager.clone()));
        session.open(None).await.unwrap();
        manager.set_current(&keys::audio_volume(), 0.9);

        let capturing = tokio::spawn({
            let session = session.clone();
            async move { session.capture([keys::audio_volume()]).await }
        });
        let applying = tokio::spawn({
            let session = session.clone();
            async move { session.apply(true, keys::display_contrast_enabled()).await }
        });
        capturing.await.unwrap().unwrap();
        assert!(applying.await.unwrap().all_applied());

        let prefs = session.preferences().await.unwrap();
        assert_eq!(
            prefs.get(&keys::display_contrast_enabled()),
            Some(&PreferenceValue::Bool(true))
        );
        assert_eq!(
            prefs.get(&keys::audio_volume()),
            Some(&PreferenceValue::Double(0.9))
        );

        let (status, stored) = session
            .context()
            .storage
            .load::<Preferences>(DEFAULT_PREFERENCES_ID)
            .await;
        assert_eq!(status, LoadStatus::Success);
        assert_eq!(stored.unwrap(), prefs);
    }

    #[tokio::test]
    async fn test_capture_requires_open_session() {
        let (session, _) = session();
        assert!(session.capture([keys::zoom_enabled()]).await.is_err());
    }

    #[tokio::test]
    async fn test_apply_on_open_replays_preferences() {
        let manager = InMemorySettingsManager::with_well_known();
        let mut ctx = SessionContext::in_memory(manager.clone());
        ctx.config.apply_on_open = true;

        let mut defaults = Preferences::defaults();
        defaults.set(keys::night_shift_enabled(), true);
        assert!(ctx.storage.save(&defaults).await);

        Session::new(ctx).open(None).await.unwrap();
        assert_eq!(
            manager.current(&keys::night_shift_enabled()),
            Some(PreferenceValue::Bool(true))
        );
    }

    #[tokio::test]
    async fn test_sign_out_emits_user_change() {
        let (session, _) = session();
        session.sign_in(User::new()).await.unwrap();
        let mut events = session.subscribe();

        session.sign_out().await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::UserChanged { user_id: None }
        );
        assert!(session.preferences().await.unwrap().is_default());
    }
}
