//! Background task spawning for the UI loop.
//!
//! Every backend round trip runs on its own task and reports back through an
//! `AppEvent`. Each slot (feed, manager, duration read) holds at most one
//! task; starting a new one aborts the old and bumps the dashboard generation
//! so a late result from the aborted task is ignored.

use crate::app::{App, AppEvent, FeedOrigin, TaskKind};
use crate::dashboard::sync::{self, Mutation};
use crate::model::DurationSetting;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Wraps a future to catch panics and convert them to errors.
///
/// Returns `Err(panic_message)` if the future panics.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

/// Spawn `work`, send its event, and report a panic as `TaskPanicked`.
fn spawn_reporting<F>(
    task: TaskKind,
    generation: u64,
    event_tx: &mpsc::Sender<AppEvent>,
    work: F,
) -> JoinHandle<()>
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match catch_task_panic(work).await {
            Ok(event) => event,
            Err(error) => {
                tracing::error!(task = task.name(), error = %error, "Background task panicked");
                AppEvent::TaskPanicked {
                    task,
                    generation,
                    error,
                }
            }
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(task = task.name(), error = %e, "Channel send failed (receiver dropped)");
        }
    })
}

fn replace_task(slot: &mut Option<JoinHandle<()>>, handle: JoinHandle<()>) {
    if let Some(previous) = slot.replace(handle) {
        previous.abort();
        tracing::debug!("Aborted superseded background task");
    }
}

// ============================================================================
// Feed
// ============================================================================

/// Start a `/videos.json` load, superseding any plain load in flight.
pub(super) fn spawn_feed_load(app: &mut App, origin: FeedOrigin, event_tx: &mpsc::Sender<AppEvent>) {
    let generation = app.dashboard.begin_feed_load();
    let client = app.dashboard.client().clone();
    app.last_feed_request = tokio::time::Instant::now();
    tracing::debug!(generation, ?origin, "Spawning feed load");

    let handle = spawn_reporting(TaskKind::Feed, generation, event_tx, async move {
        AppEvent::FeedLoaded {
            generation,
            origin,
            result: sync::load_feed(&client).await,
        }
    });
    replace_task(&mut app.feed_task, handle);
}

/// Start a backend re-collection followed by a feed load.
pub(super) fn spawn_refresh(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let generation = app.dashboard.begin_feed_load();
    let client = app.dashboard.client().clone();
    app.refresh_in_flight = true;
    app.last_feed_request = tokio::time::Instant::now();
    tracing::info!(generation, "Spawning backend refresh");

    let handle = spawn_reporting(TaskKind::Feed, generation, event_tx, async move {
        AppEvent::FeedLoaded {
            generation,
            origin: FeedOrigin::Refresh,
            result: sync::refresh_then_load(&client).await,
        }
    });
    replace_task(&mut app.feed_task, handle);
}

pub(super) fn spawn_duration_save(
    app: &mut App,
    setting: DurationSetting,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let generation = app.dashboard.begin_feed_load();
    let client = app.dashboard.client().clone();
    app.last_feed_request = tokio::time::Instant::now();

    let handle = spawn_reporting(TaskKind::Feed, generation, event_tx, async move {
        AppEvent::DurationSaved {
            generation,
            outcome: sync::save_duration_then_load(&client, setting).await,
        }
    });
    replace_task(&mut app.feed_task, handle);
}

pub(super) fn spawn_duration_read(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let client = app.dashboard.client().clone();
    let handle = spawn_reporting(TaskKind::DurationRead, 0, event_tx, async move {
        AppEvent::DurationLoaded(sync::load_duration(&client).await)
    });
    replace_task(&mut app.duration_task, handle);
}

// ============================================================================
// Manager
// ============================================================================

pub(super) fn spawn_preferences_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let generation = app.dashboard.begin_manager_load();
    let client = app.dashboard.client().clone();

    let handle = spawn_reporting(TaskKind::Manager, generation, event_tx, async move {
        AppEvent::PreferencesLoaded {
            generation,
            result: sync::load_preferences(&client).await,
        }
    });
    replace_task(&mut app.manager_task, handle);
}

/// Start a mutation. Callers check that no manager round trip is in flight,
/// since aborting a mutation midway would leave its outcome unknown.
pub(super) fn spawn_mutation(app: &mut App, mutation: Mutation, event_tx: &mpsc::Sender<AppEvent>) {
    let generation = app.dashboard.begin_manager_load();
    let client = app.dashboard.client().clone();

    let handle = spawn_reporting(TaskKind::Manager, generation, event_tx, async move {
        AppEvent::MutationFinished {
            generation,
            outcome: sync::apply_mutation(&client, mutation).await,
        }
    });
    replace_task(&mut app.manager_task, handle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_ok() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_message() {
        let result: Result<(), String> = catch_task_panic(async { panic!("boom") }).await;
        assert_eq!(result, Err("boom".to_string()));

        let code = 3;
        let result: Result<(), String> =
            catch_task_panic(async move { panic!("failed with {}", code) }).await;
        assert_eq!(result, Err("failed with 3".to_string()));
    }
}
