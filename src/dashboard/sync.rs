//! Backend round trips that change or re-fetch dashboard data.
//!
//! Every function here is free of UI state: it takes an [`ApiClient`],
//! performs the calls, and returns a value describing what happened. The
//! [`Dashboard`](super::Dashboard) folds those values into its state.

use super::{DashboardError, Operation};
use crate::api::{ApiClient, ApiError};
use crate::model::{CategorizedFeed, ChannelPreferences, DurationSetting, RefreshOutcome};

// ============================================================================
// Mutations
// ============================================================================

/// A change to the category/channel assignments.
///
/// Built through the validating constructors, so names are always trimmed
/// and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    AddCategory {
        name: String,
    },
    DeleteCategory {
        name: String,
    },
    AddChannel {
        channel: String,
        category: String,
    },
    /// Without a category the backend removes the first assignment it finds.
    RemoveChannel {
        channel: String,
        category: Option<String>,
    },
}

fn required(value: &str, what: &str) -> Result<String, DashboardError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::InvalidInput(format!(
            "{} name must not be empty",
            what
        )));
    }
    Ok(trimmed.to_string())
}

impl Mutation {
    pub fn add_category(name: &str) -> Result<Self, DashboardError> {
        Ok(Self::AddCategory {
            name: required(name, "Category")?,
        })
    }

    pub fn delete_category(name: &str) -> Result<Self, DashboardError> {
        Ok(Self::DeleteCategory {
            name: required(name, "Category")?,
        })
    }

    pub fn add_channel(channel: &str, category: &str) -> Result<Self, DashboardError> {
        Ok(Self::AddChannel {
            channel: required(channel, "Channel")?,
            category: required(category, "Category")?,
        })
    }

    pub fn remove_channel(channel: &str, category: Option<&str>) -> Result<Self, DashboardError> {
        Ok(Self::RemoveChannel {
            channel: required(channel, "Channel")?,
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        })
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::AddCategory { .. } => Operation::AddCategory,
            Self::DeleteCategory { .. } => Operation::DeleteCategory,
            Self::AddChannel { .. } => Operation::AddChannel,
            Self::RemoveChannel { .. } => Operation::RemoveChannel,
        }
    }

    /// Status text shown after the mutation succeeds.
    pub fn success_message(&self) -> String {
        match self {
            Self::AddCategory { name } => format!("Added category '{}'", name),
            Self::DeleteCategory { name } => format!("Deleted category '{}'", name),
            Self::AddChannel { channel, category } => {
                format!("Added '{}' to '{}'", channel, category)
            }
            Self::RemoveChannel {
                channel,
                category: Some(category),
            } => format!("Removed '{}' from '{}'", channel, category),
            Self::RemoveChannel {
                channel,
                category: None,
            } => format!("Removed '{}'", channel),
        }
    }

    async fn send(&self, client: &ApiClient) -> Result<(), ApiError> {
        match self {
            Self::AddCategory { name } => client.create_category(name).await,
            Self::DeleteCategory { name } => client.delete_category(name).await,
            Self::AddChannel { channel, category } => {
                client.assign_channel(channel, category).await
            }
            Self::RemoveChannel { channel, category } => {
                client.unassign_channel(channel, category.as_deref()).await
            }
        }
    }
}

/// Result of [`apply_mutation`].
#[derive(Debug)]
pub enum MutationOutcome {
    /// The backend refused the change or could not be reached. No resync was issued.
    Rejected { mutation: Mutation, error: ApiError },
    /// The change was accepted and preferences were fetched exactly once.
    Applied {
        mutation: Mutation,
        resync: Result<ChannelPreferences, ApiError>,
    },
}

impl MutationOutcome {
    pub fn mutation(&self) -> &Mutation {
        match self {
            Self::Rejected { mutation, .. } | Self::Applied { mutation, .. } => mutation,
        }
    }

    /// Collapse into the refreshed preferences, attributing a failure to
    /// either the mutation or the resync that followed it.
    pub fn into_result(self) -> Result<ChannelPreferences, DashboardError> {
        match self {
            Self::Rejected { mutation, error } => Err(DashboardError::api(mutation.operation(), error)),
            Self::Applied { resync, .. } => {
                resync.map_err(|e| DashboardError::api(Operation::LoadPreferences, e))
            }
        }
    }
}

/// Send one mutation; on success re-fetch the preferences once.
pub async fn apply_mutation(client: &ApiClient, mutation: Mutation) -> MutationOutcome {
    tracing::info!(operation = %mutation.operation(), ?mutation, "Applying mutation");

    if let Err(error) = mutation.send(client).await {
        tracing::warn!(
            operation = %mutation.operation(),
            error = %error,
            "Mutation failed"
        );
        return MutationOutcome::Rejected { mutation, error };
    }

    let resync = client.fetch_preferences().await;
    if let Err(ref e) = resync {
        tracing::warn!(error = %e, "Preferences resync failed after mutation");
    }
    MutationOutcome::Applied { mutation, resync }
}

// ============================================================================
// Feed pipelines
// ============================================================================

/// Fetch the categorized feed.
pub async fn load_feed(client: &ApiClient) -> Result<CategorizedFeed, DashboardError> {
    client
        .fetch_feed()
        .await
        .map_err(|e| DashboardError::api(Operation::LoadFeed, e))
}

/// Fetch the channel preferences.
pub async fn load_preferences(client: &ApiClient) -> Result<ChannelPreferences, DashboardError> {
    client
        .fetch_preferences()
        .await
        .map_err(|e| DashboardError::api(Operation::LoadPreferences, e))
}

/// Ask the backend to re-collect, then end on a full feed.
///
/// A summary response is followed by a normal feed load.
pub async fn refresh_then_load(client: &ApiClient) -> Result<CategorizedFeed, DashboardError> {
    let outcome = client
        .refresh()
        .await
        .map_err(|e| DashboardError::api(Operation::RefreshFeed, e))?;

    match outcome {
        RefreshOutcome::Feed(feed) => Ok(feed),
        RefreshOutcome::Summary { count } => {
            tracing::info!(count, "Backend refresh reported a summary, reloading feed");
            load_feed(client).await
        }
    }
}

/// Result of [`save_duration_then_load`].
#[derive(Debug)]
pub struct DurationOutcome {
    pub setting: DurationSetting,
    pub saved: Result<(), DashboardError>,
    /// `None` when the save failed and no reload was attempted.
    pub feed: Option<Result<CategorizedFeed, DashboardError>>,
}

/// Persist the retention window, then reload the feed if the save succeeded.
pub async fn save_duration_then_load(client: &ApiClient, setting: DurationSetting) -> DurationOutcome {
    tracing::info!(days = setting.days, months = setting.months, "Saving duration setting");

    if let Err(e) = client.save_duration(setting).await {
        return DurationOutcome {
            setting,
            saved: Err(DashboardError::api(Operation::SaveDuration, e)),
            feed: None,
        };
    }

    DurationOutcome {
        setting,
        saved: Ok(()),
        feed: Some(load_feed(client).await),
    }
}

/// Read the current retention window.
pub async fn load_duration(client: &ApiClient) -> Result<DurationSetting, DashboardError> {
    client
        .fetch_duration()
        .await
        .map_err(|e| DashboardError::api(Operation::LoadDuration, e))
}
