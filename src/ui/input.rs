//! Input handling for the TUI.
//!
//! Keys go to the topmost overlay first (help, channel manager, duration
//! dialog) and fall through to the dashboard only when none is open.

use crate::app::{App, AppEvent, DurationDialog, FeedOrigin, ManagerState, Overlay, Prompt, PromptKind};
use crate::dashboard::sync::Mutation;
use crate::dashboard::DashboardError;
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::util::validate_url_for_open;
use crate::view::ManagerRow;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{
    spawn_duration_read, spawn_duration_save, spawn_feed_load, spawn_mutation,
    spawn_preferences_load, spawn_refresh,
};
use super::Action;

const ERR_REFRESH_IN_FLIGHT: &str = "Refresh already in progress";
const ERR_MANAGER_BUSY: &str = "Still saving the previous change";

/// Cap on prompt input so a held key cannot grow it without bound.
const MAX_PROMPT_LEN: usize = 256;
const MAX_DURATION_DIGITS: usize = 6;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Errors stay on screen until the next key
    app.acknowledge_error();

    match app.overlay {
        Overlay::Help => Ok(handle_help_input(app, code)),
        Overlay::Manager(_) => handle_manager_input(app, code, modifiers, event_tx),
        Overlay::Duration(_) => Ok(handle_duration_input(app, code, event_tx)),
        Overlay::None => handle_dashboard_input(app, code, modifiers, event_tx),
    }
}

/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.overlay = Overlay::None;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

// ============================================================================
// Dashboard
// ============================================================================

fn handle_dashboard_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let action = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Global);

    match action {
        Some(KbAction::Quit) => return Ok(Action::Quit),
        Some(KbAction::NavDown) => app.select_next(),
        Some(KbAction::NavUp) => app.select_prev(),
        Some(KbAction::PageDown) => app.select_next_section(),
        Some(KbAction::PageUp) => app.select_prev_section(),
        Some(KbAction::OpenVideo) => open_selected_video(app),
        Some(KbAction::Reload) => {
            if app.refresh_in_flight {
                app.set_status(ERR_REFRESH_IN_FLIGHT);
            } else {
                spawn_feed_load(app, FeedOrigin::Reload, event_tx);
                app.set_status("Loading videos...");
            }
        }
        Some(KbAction::Refresh) => {
            if app.refresh_in_flight {
                app.set_status(ERR_REFRESH_IN_FLIGHT);
            } else {
                spawn_refresh(app, event_tx);
                app.set_status("Collecting new videos...");
            }
        }
        Some(KbAction::ManageChannels) => {
            app.overlay = Overlay::Manager(ManagerState::default());
            // A pending load or mutation resyncs the preferences on its own
            if !app.dashboard.manager_state().is_loading() {
                spawn_preferences_load(app, event_tx);
            }
        }
        Some(KbAction::EditDuration) => {
            let current = app.dashboard.duration().unwrap_or_default();
            app.overlay = Overlay::Duration(DurationDialog::new(current));
            spawn_duration_read(app, event_tx);
        }
        Some(KbAction::CycleTheme) => app.cycle_theme(),
        Some(KbAction::ShowHelp) => {
            app.overlay = Overlay::Help;
            app.help_scroll_offset = 0;
        }
        Some(KbAction::Back) => app.status = None,
        Some(KbAction::AddChannel | KbAction::AddCategory | KbAction::Remove) | None => {}
    }
    Ok(Action::Continue)
}

fn open_selected_video(app: &mut App) {
    let Some(card) = app.selected_card() else {
        return;
    };
    let url = card.url.clone();

    // Only http(s) links reach the system opener
    match validate_url_for_open(&url) {
        Err(e) => app.set_error(e.to_string()),
        Ok(valid) => {
            if let Err(e) = open::that(valid.as_str()) {
                tracing::warn!(url = %valid, error = %e, "Failed to open browser");
                app.set_error(format!("Failed to open browser: {}", e));
            }
        }
    }
}

// ============================================================================
// Channel Manager
// ============================================================================

fn handle_manager_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Take ownership temporarily; every path below puts it back unless closing
    let Overlay::Manager(mut state) = std::mem::take(&mut app.overlay) else {
        return Ok(Action::Continue);
    };

    if let Some(prompt) = state.prompt.take() {
        state.prompt = handle_prompt_input(app, prompt, code, event_tx);
        app.overlay = Overlay::Manager(state);
        return Ok(Action::Continue);
    }

    if let Some(category) = state.confirm_delete.take() {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if !submit_mutation(app, Mutation::delete_category(&category), event_tx) {
                    state.confirm_delete = Some(category);
                }
            }
            _ => app.set_status("Delete cancelled"),
        }
        app.overlay = Overlay::Manager(state);
        return Ok(Action::Continue);
    }

    let view = app.manager_view();
    let rows = view.as_ref().map(|v| v.rows()).unwrap_or_default();
    let row = rows.get(state.selected).copied();

    let action = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Manager);

    match action {
        Some(KbAction::Quit) => return Ok(Action::Quit),
        Some(KbAction::Back) => return Ok(Action::Continue),
        Some(KbAction::NavDown) => {
            if state.selected + 1 < rows.len() {
                state.selected += 1;
            }
        }
        Some(KbAction::NavUp) => state.selected = state.selected.saturating_sub(1),
        Some(KbAction::PageDown) => {
            if let Some(next) = (state.selected + 1..rows.len())
                .find(|&i| matches!(rows[i], ManagerRow::Category(_)))
            {
                state.selected = next;
            }
        }
        Some(KbAction::PageUp) => {
            if let Some(prev) = (0..state.selected)
                .rev()
                .find(|&i| matches!(rows[i], ManagerRow::Category(_)))
            {
                state.selected = prev;
            }
        }
        Some(KbAction::AddChannel) => {
            match row.and_then(|r| view.as_ref()?.category_name(r)) {
                Some(category) => {
                    state.prompt = Some(Prompt {
                        kind: PromptKind::AddChannel {
                            category: category.to_string(),
                        },
                        input: String::new(),
                    });
                }
                None => app.set_status("Create a category first"),
            }
        }
        Some(KbAction::AddCategory) => {
            state.prompt = Some(Prompt {
                kind: PromptKind::AddCategory,
                input: String::new(),
            });
        }
        Some(KbAction::Remove) => {
            if let (Some(view), Some(row)) = (&view, row) {
                match row {
                    ManagerRow::Channel { .. } => {
                        let channel = view.channel_name(row).unwrap_or_default();
                        let category = view.category_name(row);
                        submit_mutation(app, Mutation::remove_channel(channel, category), event_tx);
                    }
                    ManagerRow::Category(_) => {
                        state.confirm_delete = view.category_name(row).map(str::to_string);
                    }
                }
            }
        }
        Some(KbAction::Reload) => {
            if app.dashboard.manager_state().is_loading() {
                app.set_status(ERR_MANAGER_BUSY);
            } else {
                spawn_preferences_load(app, event_tx);
            }
        }
        _ => {}
    }

    app.overlay = Overlay::Manager(state);
    Ok(Action::Continue)
}

/// Returns the prompt to keep open, or `None` once it is submitted or cancelled.
fn handle_prompt_input(
    app: &mut App,
    mut prompt: Prompt,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Option<Prompt> {
    match code {
        KeyCode::Char(c) => {
            if prompt.input.chars().count() < MAX_PROMPT_LEN {
                prompt.input.push(c);
            }
            Some(prompt)
        }
        KeyCode::Backspace => {
            prompt.input.pop();
            Some(prompt)
        }
        KeyCode::Esc => None,
        KeyCode::Enter => {
            let mutation = match &prompt.kind {
                PromptKind::AddChannel { category } => Mutation::add_channel(&prompt.input, category),
                PromptKind::AddCategory => Mutation::add_category(&prompt.input),
            };
            if submit_mutation(app, mutation, event_tx) {
                None
            } else {
                Some(prompt)
            }
        }
        _ => Some(prompt),
    }
}

/// Start `mutation` unless it is invalid or another round trip is in flight.
/// Returns true if it was sent.
fn submit_mutation(
    app: &mut App,
    mutation: Result<Mutation, DashboardError>,
    event_tx: &mpsc::Sender<AppEvent>,
) -> bool {
    let mutation = match mutation {
        Ok(m) => m,
        Err(e) => {
            app.set_error(e.user_message());
            return false;
        }
    };
    if app.dashboard.manager_state().is_loading() {
        app.set_status(ERR_MANAGER_BUSY);
        return false;
    }
    tracing::debug!(?mutation, "Submitting preferences change");
    spawn_mutation(app, mutation, event_tx);
    true
}

// ============================================================================
// Duration Dialog
// ============================================================================

fn handle_duration_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    let Overlay::Duration(mut dialog) = std::mem::take(&mut app.overlay) else {
        return Action::Continue;
    };

    match code {
        KeyCode::Esc => return Action::Continue,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => dialog.toggle_focus(),
        KeyCode::Char(c) if c.is_ascii_digit() => {
            let field = dialog.focused_mut();
            if field.len() < MAX_DURATION_DIGITS {
                field.push(c);
            }
            dialog.edited = true;
        }
        KeyCode::Backspace => {
            dialog.focused_mut().pop();
            dialog.edited = true;
        }
        KeyCode::Enter => {
            if app.refresh_in_flight {
                app.set_status(ERR_REFRESH_IN_FLIGHT);
            } else {
                let setting = dialog.setting();
                spawn_duration_save(app, setting, event_tx);
                app.set_status(format!("Saving duration: {}...", setting));
                return Action::Continue;
            }
        }
        _ => {}
    }

    app.overlay = Overlay::Duration(dialog);
    Action::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{app_with_feed, test_app};
    use crate::app::StatusKind;
    use crate::dashboard::sync::MutationOutcome;
    use crate::api::{ApiClient, ApiSettings};
    use crate::dashboard::Dashboard;
    use crate::keybindings::KeybindingRegistry;
    use crate::model::{ChannelPreferences, DurationSetting};
    use crate::theme::ThemeVariant;
    use crate::ui::events::handle_app_event;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app_for(server: &MockServer) -> App {
        let settings = ApiSettings {
            base_url: server.uri(),
            ..ApiSettings::default()
        };
        App::new(
            Dashboard::new(ApiClient::new(&settings).unwrap()),
            KeybindingRegistry::new(),
            ThemeVariant::Dark,
        )
    }

    fn channel() -> (mpsc::Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
        mpsc::channel(16)
    }

    fn press(app: &mut App, code: KeyCode, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx).unwrap()
    }

    fn type_text(app: &mut App, text: &str, tx: &mpsc::Sender<AppEvent>) {
        for c in text.chars() {
            press(app, KeyCode::Char(c), tx);
        }
    }

    /// Open the manager with `prefs` already loaded.
    fn open_manager(app: &mut App, prefs: ChannelPreferences) {
        app.overlay = Overlay::Manager(ManagerState::default());
        let generation = app.dashboard.begin_manager_load();
        app.dashboard
            .finish_preferences_load(generation, Ok(prefs))
            .unwrap();
    }

    fn music_prefs() -> ChannelPreferences {
        ChannelPreferences::from_entries(vec![
            ("Music".to_string(), vec!["@a".to_string(), "@b".to_string()]),
            ("Tech".to_string(), vec![]),
        ])
    }

    fn manager_state(app: &App) -> &ManagerState {
        match &app.overlay {
            Overlay::Manager(state) => state,
            other => panic!("expected manager overlay, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quit_key() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Quit));
        let action = handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL, &tx).unwrap();
        assert!(matches!(action, Action::Quit));
    }

    #[tokio::test]
    async fn test_navigation_moves_selection() {
        let (tx, _rx) = channel();
        let mut app = app_with_feed();
        press(&mut app, KeyCode::Char('j'), &tx);
        assert_eq!(app.selected, 1);
        press(&mut app, KeyCode::Up, &tx);
        assert_eq!(app.selected, 0);
        press(&mut app, KeyCode::Char('J'), &tx);
        assert_eq!(app.selected, 2);
    }

    #[tokio::test]
    async fn test_refresh_refused_while_in_flight() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        app.refresh_in_flight = true;
        let before = app.dashboard.feed_state().clone();

        press(&mut app, KeyCode::Char('R'), &tx);
        assert_eq!(app.status.as_ref().unwrap().text, ERR_REFRESH_IN_FLIGHT);
        press(&mut app, KeyCode::Char('r'), &tx);
        assert_eq!(app.status.as_ref().unwrap().text, ERR_REFRESH_IN_FLIGHT);
        assert_eq!(app.dashboard.feed_state(), &before);
        assert!(app.feed_task.is_none());
    }

    #[tokio::test]
    async fn test_refresh_marks_in_flight() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        press(&mut app, KeyCode::Char('R'), &tx);
        assert!(app.refresh_in_flight);
        assert!(app.dashboard.feed_state().is_loading());
        app.abort_tasks();
    }

    #[tokio::test]
    async fn test_open_refuses_non_http_url() {
        let (tx, _rx) = channel();
        let mut app = app_with_feed();
        if let Some(crate::view::DashboardView::Sections(sections)) = &mut app.view {
            if let crate::view::SectionBody::Cards(cards) = &mut sections[0].body {
                cards[0].url = "javascript:alert(1)".to_string();
            }
        }
        press(&mut app, KeyCode::Char('o'), &tx);
        let status = app.status.as_ref().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("Unsupported scheme"));
    }

    #[tokio::test]
    async fn test_error_acknowledged_by_next_key() {
        let (tx, _rx) = channel();
        let mut app = app_with_feed();
        app.set_error("Failed to load videos: boom");
        press(&mut app, KeyCode::Char('j'), &tx);
        assert!(app.status.is_none());
    }

    #[tokio::test]
    async fn test_help_overlay_captures_keys() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        press(&mut app, KeyCode::Char('?'), &tx);
        assert!(matches!(app.overlay, Overlay::Help));

        // 'q' closes help instead of quitting
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Continue));
        assert!(matches!(app.overlay, Overlay::None));
    }

    #[tokio::test]
    async fn test_add_category_prompt_submits_mutation() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        open_manager(&mut app, music_prefs());

        press(&mut app, KeyCode::Char('n'), &tx);
        type_text(&mut app, "Gaming", &tx);
        assert_eq!(manager_state(&app).prompt.as_ref().unwrap().input, "Gaming");

        press(&mut app, KeyCode::Enter, &tx);
        assert!(manager_state(&app).prompt.is_none());
        assert!(app.dashboard.manager_state().is_loading());
        app.abort_tasks();
    }

    #[tokio::test]
    async fn test_blank_prompt_is_rejected_locally() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        open_manager(&mut app, music_prefs());

        press(&mut app, KeyCode::Char('n'), &tx);
        type_text(&mut app, "   ", &tx);
        press(&mut app, KeyCode::Enter, &tx);

        let status = app.status.as_ref().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "Category name must not be empty");
        assert!(manager_state(&app).prompt.is_some());
        assert!(!app.dashboard.manager_state().is_loading());
    }

    #[tokio::test]
    async fn test_add_channel_targets_selected_category() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        open_manager(&mut app, music_prefs());

        // Rows: Music, @a, @b, Tech
        press(&mut app, KeyCode::Char('J'), &tx);
        assert_eq!(manager_state(&app).selected, 3);
        press(&mut app, KeyCode::Char('a'), &tx);
        let prompt = manager_state(&app).prompt.clone().unwrap();
        assert_eq!(
            prompt.kind,
            PromptKind::AddChannel {
                category: "Tech".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_delete_category_needs_confirmation() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        open_manager(&mut app, music_prefs());

        press(&mut app, KeyCode::Char('x'), &tx);
        assert_eq!(manager_state(&app).confirm_delete.as_deref(), Some("Music"));

        press(&mut app, KeyCode::Char('n'), &tx);
        assert!(manager_state(&app).confirm_delete.is_none());
        assert!(!app.dashboard.manager_state().is_loading());

        press(&mut app, KeyCode::Char('x'), &tx);
        press(&mut app, KeyCode::Char('y'), &tx);
        assert!(app.dashboard.manager_state().is_loading());
        app.abort_tasks();
    }

    #[tokio::test]
    async fn test_delete_confirmation_uses_raw_category_name() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        open_manager(
            &mut app,
            ChannelPreferences::from_entries(vec![("Deep\tCuts".to_string(), vec![])]),
        );

        press(&mut app, KeyCode::Char('x'), &tx);
        assert_eq!(manager_state(&app).confirm_delete.as_deref(), Some("Deep\tCuts"));
    }

    #[tokio::test]
    async fn test_reopening_manager_keeps_pending_mutation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/categories"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "ok"}))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Music": []})))
            .expect(1)
            .mount(&server)
            .await;

        let (tx, mut rx) = channel();
        let mut app = app_for(&server);
        open_manager(&mut app, ChannelPreferences::default());

        press(&mut app, KeyCode::Char('n'), &tx);
        type_text(&mut app, "Music", &tx);
        press(&mut app, KeyCode::Enter, &tx);
        press(&mut app, KeyCode::Esc, &tx);
        assert!(matches!(app.overlay, Overlay::None));

        press(&mut app, KeyCode::Char('m'), &tx);
        assert!(matches!(app.overlay, Overlay::Manager(_)));
        assert!(app.dashboard.manager_state().is_loading());

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(
            matches!(event, AppEvent::MutationFinished { .. }),
            "expected MutationFinished, got {:?}",
            event
        );
        handle_app_event(&mut app, event);
        assert_eq!(app.status.as_ref().unwrap().text, "Added category 'Music'");
    }

    #[tokio::test]
    async fn test_second_mutation_waits_for_first() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        open_manager(&mut app, music_prefs());

        // Select @a and remove it
        press(&mut app, KeyCode::Down, &tx);
        press(&mut app, KeyCode::Char('x'), &tx);
        assert!(app.dashboard.manager_state().is_loading());

        press(&mut app, KeyCode::Down, &tx);
        press(&mut app, KeyCode::Char('x'), &tx);
        assert_eq!(app.status.as_ref().unwrap().text, ERR_MANAGER_BUSY);
        app.abort_tasks();
    }

    #[tokio::test]
    async fn test_mutation_result_reaches_manager() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        open_manager(&mut app, music_prefs());
        press(&mut app, KeyCode::Char('n'), &tx);
        type_text(&mut app, "Gaming", &tx);
        press(&mut app, KeyCode::Enter, &tx);
        app.abort_tasks();

        let generation = app.dashboard.begin_manager_load();
        let message = app
            .dashboard
            .finish_mutation(
                generation,
                MutationOutcome::Applied {
                    mutation: Mutation::add_category("Gaming").unwrap(),
                    resync: Ok(music_prefs()),
                },
            )
            .unwrap();
        assert_eq!(message.as_deref(), Some("Added category 'Gaming'"));
    }

    #[tokio::test]
    async fn test_manager_back_closes_overlay() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        open_manager(&mut app, music_prefs());
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Continue));
        assert!(matches!(app.overlay, Overlay::None));
    }

    #[tokio::test]
    async fn test_duration_dialog_edits_and_saves() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        press(&mut app, KeyCode::Char('d'), &tx);
        match &app.overlay {
            Overlay::Duration(dialog) => {
                assert_eq!(dialog.setting(), DurationSetting::default());
            }
            other => panic!("expected duration dialog, got {:?}", other),
        }

        press(&mut app, KeyCode::Backspace, &tx);
        type_text(&mut app, "14x", &tx);
        press(&mut app, KeyCode::Tab, &tx);
        type_text(&mut app, "1", &tx);
        match &app.overlay {
            Overlay::Duration(dialog) => {
                assert!(dialog.edited);
                assert_eq!(dialog.setting(), DurationSetting { days: 14, months: 1 });
            }
            other => panic!("expected duration dialog, got {:?}", other),
        }

        press(&mut app, KeyCode::Enter, &tx);
        assert!(matches!(app.overlay, Overlay::None));
        assert!(app.dashboard.feed_state().is_loading());
        app.abort_tasks();
    }
}
