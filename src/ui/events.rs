//! Applies background task results to the app state.

use crate::app::{App, AppEvent, FeedOrigin, Overlay, TaskKind};
use crate::dashboard::DashboardError;
use crate::model::CategorizedFeed;

/// Fold one background event into `app`.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::FeedLoaded {
            generation,
            origin,
            result,
        } => {
            let video_count = result.as_ref().map(CategorizedFeed::video_count).ok();
            if origin == FeedOrigin::Refresh && app.dashboard.is_current_feed(generation) {
                app.refresh_in_flight = false;
            }
            match app.dashboard.finish_feed_load(generation, result) {
                Ok(true) => {
                    app.rebuild_view();
                    if let Some(count) = video_count {
                        match origin {
                            FeedOrigin::Refresh => {
                                app.set_status(format!("Refreshed: {} videos", count))
                            }
                            FeedOrigin::Reload => {
                                app.set_status(format!("Loaded {} videos", count))
                            }
                            FeedOrigin::Startup | FeedOrigin::Periodic => {}
                        }
                    }
                }
                Ok(false) => {}
                Err(e) => report_feed_error(app, &e),
            }
        }

        AppEvent::DurationSaved {
            generation,
            outcome,
        } => {
            let setting = outcome.setting;
            let saved = outcome.saved.is_ok();
            match app.dashboard.finish_duration_save(generation, outcome) {
                Ok(accepted) => {
                    if accepted {
                        app.rebuild_view();
                    }
                    app.set_status(format!("Duration set to {}", setting));
                }
                Err(e) if saved => {
                    // saved, but the reload afterwards failed
                    app.rebuild_view();
                    report_feed_error(app, &e);
                }
                Err(e) => app.set_error(e.user_message()),
            }
        }

        AppEvent::PreferencesLoaded { generation, result } => {
            match app.dashboard.finish_preferences_load(generation, result) {
                Ok(_) => app.clamp_manager_selection(),
                Err(e) => app.set_error(e.user_message()),
            }
        }

        AppEvent::MutationFinished {
            generation,
            outcome,
        } => match app.dashboard.finish_mutation(generation, outcome) {
            Ok(Some(message)) => {
                app.clamp_manager_selection();
                app.set_status(message);
            }
            Ok(None) => {}
            Err(e) => app.set_error(e.user_message()),
        },

        AppEvent::DurationLoaded(result) => match app.dashboard.finish_duration_load(result) {
            Ok(setting) => {
                if let Overlay::Duration(dialog) = &mut app.overlay {
                    if !dialog.edited {
                        dialog.days = setting.days.to_string();
                        dialog.months = setting.months.to_string();
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read duration setting");
                if matches!(app.overlay, Overlay::Duration(_)) {
                    app.set_error(e.user_message());
                }
            }
        },

        AppEvent::TaskPanicked {
            task,
            generation,
            error,
        } => {
            let reason = format!("Internal error in {} task: {}", task.name(), error);
            match task {
                TaskKind::Feed => {
                    if app.dashboard.is_current_feed(generation) {
                        app.refresh_in_flight = false;
                    }
                    app.dashboard.abandon_feed_load(generation, &reason);
                }
                TaskKind::Manager => app.dashboard.abandon_manager_load(generation, &reason),
                TaskKind::DurationRead => {}
            }
            app.set_error(reason);
        }
    }
}

fn report_feed_error(app: &mut App, err: &DashboardError) {
    let retry = app
        .keybindings
        .key_for(crate::keybindings::Action::Reload, crate::keybindings::Context::Global)
        .map(|key| format!(" (press {} to retry)", key))
        .unwrap_or_default();
    app.set_error(format!("{}{}", err.user_message(), retry));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::app::tests::{app_with_feed, sample_feed, test_app};
    use crate::app::{ManagerState, StatusKind};
    use crate::dashboard::sync::{Mutation, MutationOutcome};
    use crate::dashboard::{Operation, ViewState};
    use crate::model::ChannelPreferences;

    fn server_error() -> DashboardError {
        DashboardError::api(
            Operation::LoadFeed,
            ApiError::HttpStatus {
                status: 500,
                detail: "Failed to retrieve videos data".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_feed_loaded_rebuilds_view() {
        let mut app = test_app();
        let generation = app.dashboard.begin_feed_load();
        handle_app_event(
            &mut app,
            AppEvent::FeedLoaded {
                generation,
                origin: FeedOrigin::Reload,
                result: Ok(sample_feed()),
            },
        );
        assert_eq!(app.card_count(), 3);
        assert_eq!(app.status.as_ref().unwrap().text, "Loaded 3 videos");
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_cards_and_shows_retry() {
        let mut app = app_with_feed();
        let generation = app.dashboard.begin_feed_load();
        handle_app_event(
            &mut app,
            AppEvent::FeedLoaded {
                generation,
                origin: FeedOrigin::Reload,
                result: Err(server_error()),
            },
        );
        assert_eq!(app.card_count(), 3);
        let status = app.status.as_ref().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(
            status.text,
            "Failed to load videos: Failed to retrieve videos data (press r to retry)"
        );
    }

    #[tokio::test]
    async fn test_refresh_completion_reenables_refresh() {
        let mut app = test_app();
        let generation = app.dashboard.begin_feed_load();
        app.refresh_in_flight = true;
        handle_app_event(
            &mut app,
            AppEvent::FeedLoaded {
                generation,
                origin: FeedOrigin::Refresh,
                result: Err(server_error()),
            },
        );
        assert!(!app.refresh_in_flight);
    }

    #[tokio::test]
    async fn test_stale_feed_event_ignored() {
        let mut app = app_with_feed();
        let stale = app.dashboard.begin_feed_load();
        let _current = app.dashboard.begin_feed_load();
        handle_app_event(
            &mut app,
            AppEvent::FeedLoaded {
                generation: stale,
                origin: FeedOrigin::Reload,
                result: Ok(CategorizedFeed::default()),
            },
        );
        assert_eq!(app.card_count(), 3);
        assert!(app.dashboard.feed_state().is_loading());
    }

    #[tokio::test]
    async fn test_mutation_success_sets_status() {
        let mut app = test_app();
        app.overlay = Overlay::Manager(ManagerState::default());
        let generation = app.dashboard.begin_manager_load();
        let prefs = ChannelPreferences::from_entries(vec![("Music".to_string(), vec![])]);
        handle_app_event(
            &mut app,
            AppEvent::MutationFinished {
                generation,
                outcome: MutationOutcome::Applied {
                    mutation: Mutation::add_category("Music").unwrap(),
                    resync: Ok(prefs),
                },
            },
        );
        assert_eq!(app.status.as_ref().unwrap().text, "Added category 'Music'");
        assert_eq!(app.dashboard.manager_state(), &ViewState::Rendered);
    }

    #[tokio::test]
    async fn test_mutation_failure_sets_error() {
        let mut app = test_app();
        let generation = app.dashboard.begin_manager_load();
        handle_app_event(
            &mut app,
            AppEvent::MutationFinished {
                generation,
                outcome: MutationOutcome::Rejected {
                    mutation: Mutation::delete_category("Music").unwrap(),
                    error: ApiError::HttpStatus {
                        status: 404,
                        detail: "Category not found".to_string(),
                    },
                },
            },
        );
        let status = app.status.as_ref().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "Failed to delete category: Category not found");
    }

    #[tokio::test]
    async fn test_panicked_feed_task_leaves_loading() {
        let mut app = test_app();
        let generation = app.dashboard.begin_feed_load();
        app.refresh_in_flight = true;
        handle_app_event(
            &mut app,
            AppEvent::TaskPanicked {
                task: TaskKind::Feed,
                generation,
                error: "boom".to_string(),
            },
        );
        assert!(!app.refresh_in_flight);
        assert!(app.dashboard.feed_state().error().is_some());
    }
}
