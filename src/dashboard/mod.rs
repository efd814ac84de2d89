//! Dashboard controller: the state machine between the backend and a view.
//!
//! [`Dashboard`] owns the last good feed, the channel preferences, and the
//! retention window, plus one [`ViewState`] per view. Background callers use
//! the `begin_*`/`finish_*` pairs around work they run elsewhere; the async
//! methods (`load_feed`, `add_channel`, ...) run the whole round trip inline.
//!
//! A result carries the generation it was started under. Anything older than
//! the latest `begin_*` call is discarded.

pub mod sync;

use crate::api::{ApiClient, ApiError};
use crate::model::{CategorizedFeed, ChannelPreferences, DurationSetting};
use crate::view::{self, DashboardView, ManagerView};
use chrono::{DateTime, Utc};
use std::fmt;
use sync::{DurationOutcome, Mutation, MutationOutcome};
use thiserror::Error;

// ============================================================================
// Operations and Errors
// ============================================================================

/// A user-visible backend action, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadFeed,
    RefreshFeed,
    LoadPreferences,
    AddCategory,
    DeleteCategory,
    AddChannel,
    RemoveChannel,
    LoadDuration,
    SaveDuration,
}

impl Operation {
    pub fn describe(self) -> &'static str {
        match self {
            Self::LoadFeed => "load videos",
            Self::RefreshFeed => "refresh videos",
            Self::LoadPreferences => "load categories",
            Self::AddCategory => "add category",
            Self::DeleteCategory => "delete category",
            Self::AddChannel => "add channel",
            Self::RemoveChannel => "remove channel",
            Self::LoadDuration => "load duration setting",
            Self::SaveDuration => "save duration setting",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Failed to {operation}: {source}")]
    Api {
        operation: Operation,
        #[source]
        source: ApiError,
    },
    /// Rejected locally; no request was sent.
    #[error("{0}")]
    InvalidInput(String),
}

impl DashboardError {
    pub fn api(operation: Operation, source: ApiError) -> Self {
        Self::Api { operation, source }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Api { operation, .. } => Some(*operation),
            Self::InvalidInput(_) => None,
        }
    }

    /// One-line message for the status bar.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { operation, source } => {
                format!("Failed to {}: {}", operation, source.user_message())
            }
            Self::InvalidInput(msg) => msg.clone(),
        }
    }
}

// ============================================================================
// View State
// ============================================================================

/// Lifecycle of one view. There is no partial-render state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Rendered,
    /// The last load failed. Previously rendered data, if any, is still shown.
    Errored(String),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Errored(msg) => Some(msg),
            _ => None,
        }
    }
}

// ============================================================================
// Dashboard
// ============================================================================

pub struct Dashboard {
    client: ApiClient,

    feed: Option<CategorizedFeed>,
    feed_state: ViewState,
    feed_generation: u64,
    loaded_at: Option<DateTime<Utc>>,

    preferences: Option<ChannelPreferences>,
    manager_state: ViewState,
    manager_generation: u64,

    duration: Option<DurationSetting>,
}

impl Dashboard {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            feed: None,
            feed_state: ViewState::Idle,
            feed_generation: 0,
            loaded_at: None,
            preferences: None,
            manager_state: ViewState::Idle,
            manager_generation: 0,
            duration: None,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Last successfully loaded feed.
    pub fn feed(&self) -> Option<&CategorizedFeed> {
        self.feed.as_ref()
    }

    pub fn feed_state(&self) -> &ViewState {
        &self.feed_state
    }

    /// When the current feed was received.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn preferences(&self) -> Option<&ChannelPreferences> {
        self.preferences.as_ref()
    }

    pub fn manager_state(&self) -> &ViewState {
        &self.manager_state
    }

    pub fn duration(&self) -> Option<DurationSetting> {
        self.duration
    }

    /// Project the current feed. `None` until the first feed arrives.
    pub fn view(&self, now: DateTime<Utc>) -> Option<DashboardView> {
        self.feed.as_ref().map(|feed| view::render(feed, now))
    }

    /// Project the current preferences. `None` until they are first loaded.
    pub fn manager_view(&self) -> Option<ManagerView> {
        self.preferences.as_ref().map(view::manager_view)
    }

    // ------------------------------------------------------------------------
    // Feed view transitions
    // ------------------------------------------------------------------------

    /// Enter `Loading` for the feed view and return the new generation.
    pub fn begin_feed_load(&mut self) -> u64 {
        self.feed_generation += 1;
        self.feed_state = ViewState::Loading;
        self.feed_generation
    }

    pub fn is_current_feed(&self, generation: u64) -> bool {
        generation == self.feed_generation
    }

    /// Settle a feed load.
    ///
    /// Returns `Ok(false)` when the result was stale and discarded. On
    /// failure the previous feed is kept and the state becomes `Errored`.
    pub fn finish_feed_load(
        &mut self,
        generation: u64,
        result: Result<CategorizedFeed, DashboardError>,
    ) -> Result<bool, DashboardError> {
        if !self.is_current_feed(generation) {
            tracing::debug!(
                generation,
                current = self.feed_generation,
                "Discarding stale feed result"
            );
            return Ok(false);
        }

        match result {
            Ok(feed) => {
                tracing::debug!(
                    categories = feed.categories().len(),
                    videos = feed.video_count(),
                    "Feed rendered"
                );
                self.feed = Some(feed);
                self.loaded_at = Some(Utc::now());
                self.feed_state = ViewState::Rendered;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, kept_previous = self.feed.is_some(), "Feed load failed");
                self.feed_state = ViewState::Errored(e.user_message());
                Err(e)
            }
        }
    }

    /// Settle a duration save. A successful save records the new window
    /// even when the reload that follows fails.
    pub fn finish_duration_save(
        &mut self,
        generation: u64,
        outcome: DurationOutcome,
    ) -> Result<bool, DashboardError> {
        let DurationOutcome {
            setting,
            saved,
            feed,
        } = outcome;

        match (saved, feed) {
            (Ok(()), Some(feed)) => {
                self.duration = Some(setting);
                self.finish_feed_load(generation, feed)
            }
            (Ok(()), None) => {
                self.duration = Some(setting);
                if self.is_current_feed(generation) {
                    self.feed_state = self.settled_feed_state();
                }
                Ok(true)
            }
            (Err(e), _) => {
                tracing::warn!(error = %e, "Duration save failed");
                if self.is_current_feed(generation) {
                    self.feed_state = self.settled_feed_state();
                }
                Err(e)
            }
        }
    }

    /// Mark a feed load that will never report back (its task died) as failed.
    pub fn abandon_feed_load(&mut self, generation: u64, reason: &str) {
        if self.is_current_feed(generation) {
            self.feed_state = ViewState::Errored(reason.to_string());
        }
    }

    fn settled_feed_state(&self) -> ViewState {
        if self.feed.is_some() {
            ViewState::Rendered
        } else {
            ViewState::Idle
        }
    }

    // ------------------------------------------------------------------------
    // Manager view transitions
    // ------------------------------------------------------------------------

    /// Enter `Loading` for the manager view and return the new generation.
    pub fn begin_manager_load(&mut self) -> u64 {
        self.manager_generation += 1;
        self.manager_state = ViewState::Loading;
        self.manager_generation
    }

    pub fn is_current_manager(&self, generation: u64) -> bool {
        generation == self.manager_generation
    }

    pub fn abandon_manager_load(&mut self, generation: u64, reason: &str) {
        if self.is_current_manager(generation) {
            self.manager_state = ViewState::Errored(reason.to_string());
        }
    }

    /// Settle a preferences load. Returns `Ok(false)` for a stale result.
    pub fn finish_preferences_load(
        &mut self,
        generation: u64,
        result: Result<ChannelPreferences, DashboardError>,
    ) -> Result<bool, DashboardError> {
        if !self.is_current_manager(generation) {
            tracing::debug!(generation, "Discarding stale preferences result");
            return Ok(false);
        }

        match result {
            Ok(prefs) => {
                self.preferences = Some(prefs);
                self.manager_state = ViewState::Rendered;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Preferences load failed");
                self.manager_state = ViewState::Errored(e.user_message());
                Err(e)
            }
        }
    }

    /// Settle a mutation. On success returns the status text to show.
    pub fn finish_mutation(
        &mut self,
        generation: u64,
        outcome: MutationOutcome,
    ) -> Result<Option<String>, DashboardError> {
        let message = outcome.mutation().success_message();
        let applied = matches!(outcome, MutationOutcome::Applied { .. });
        let accepted = self.finish_preferences_load(generation, outcome.into_result())?;
        Ok((accepted && applied).then_some(message))
    }

    /// Record a duration read for the dialog.
    pub fn finish_duration_load(
        &mut self,
        result: Result<DurationSetting, DashboardError>,
    ) -> Result<DurationSetting, DashboardError> {
        let setting = result?;
        self.duration = Some(setting);
        Ok(setting)
    }

    // ------------------------------------------------------------------------
    // Inline round trips
    // ------------------------------------------------------------------------

    pub async fn load_feed(&mut self) -> Result<(), DashboardError> {
        let generation = self.begin_feed_load();
        let result = sync::load_feed(&self.client).await;
        self.finish_feed_load(generation, result).map(|_| ())
    }

    pub async fn refresh_feed(&mut self) -> Result<(), DashboardError> {
        let generation = self.begin_feed_load();
        let result = sync::refresh_then_load(&self.client).await;
        self.finish_feed_load(generation, result).map(|_| ())
    }

    pub async fn load_preferences(&mut self) -> Result<(), DashboardError> {
        let generation = self.begin_manager_load();
        let result = sync::load_preferences(&self.client).await;
        self.finish_preferences_load(generation, result).map(|_| ())
    }

    /// Apply a mutation and return the status text on success.
    pub async fn apply(&mut self, mutation: Mutation) -> Result<String, DashboardError> {
        let generation = self.begin_manager_load();
        let message = mutation.success_message();
        let outcome = sync::apply_mutation(&self.client, mutation).await;
        self.finish_mutation(generation, outcome)?;
        Ok(message)
    }

    pub async fn add_category(&mut self, name: &str) -> Result<String, DashboardError> {
        self.apply(Mutation::add_category(name)?).await
    }

    pub async fn delete_category(&mut self, name: &str) -> Result<String, DashboardError> {
        self.apply(Mutation::delete_category(name)?).await
    }

    pub async fn add_channel(
        &mut self,
        channel: &str,
        category: &str,
    ) -> Result<String, DashboardError> {
        self.apply(Mutation::add_channel(channel, category)?).await
    }

    pub async fn remove_channel(
        &mut self,
        channel: &str,
        category: Option<&str>,
    ) -> Result<String, DashboardError> {
        self.apply(Mutation::remove_channel(channel, category)?).await
    }

    /// Persist the retention window, then reload the feed.
    pub async fn save_duration_setting(
        &mut self,
        setting: DurationSetting,
    ) -> Result<(), DashboardError> {
        let generation = self.begin_feed_load();
        let outcome = sync::save_duration_then_load(&self.client, setting).await;
        self.finish_duration_save(generation, outcome).map(|_| ())
    }

    /// Like [`save_duration_setting`](Self::save_duration_setting) from raw
    /// text fields, defaulting whatever does not parse.
    pub async fn save_duration_from_inputs(
        &mut self,
        days: Option<&str>,
        months: Option<&str>,
    ) -> Result<DurationSetting, DashboardError> {
        let setting = DurationSetting::from_inputs(days, months);
        self.save_duration_setting(setting).await?;
        Ok(setting)
    }

    pub async fn load_duration_setting(&mut self) -> Result<DurationSetting, DashboardError> {
        let result = sync::load_duration(&self.client).await;
        self.finish_duration_load(result)
    }
}
