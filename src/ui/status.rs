use crate::app::{App, Overlay, StatusKind};
use crate::keybindings::{Action, Context};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

const DASHBOARD_HINTS: &[(Action, &str)] = &[
    (Action::OpenVideo, "open"),
    (Action::Reload, "reload"),
    (Action::Refresh, "refresh"),
    (Action::ManageChannels, "channels"),
    (Action::EditDuration, "duration"),
    (Action::ShowHelp, "help"),
    (Action::Quit, "quit"),
];

const MANAGER_HINTS: &[(Action, &str)] = &[
    (Action::AddChannel, "add channel"),
    (Action::AddCategory, "new category"),
    (Action::Remove, "remove"),
    (Action::Back, "close"),
];

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let (text, style): (Cow<'_, str>, _) = match &app.status {
        Some(status) => {
            let style = match status.kind {
                StatusKind::Info => app.palette.status_bar,
                StatusKind::Error => app.palette.status_error,
            };
            (Cow::Borrowed(status.text.as_ref()), style)
        }
        None if app.refresh_in_flight => (
            Cow::Borrowed("Collecting new videos..."),
            app.palette.status_bar,
        ),
        None => (Cow::Owned(key_hints(app)), app.palette.status_bar),
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}

/// Hints for the keys that matter on the current screen.
fn key_hints(app: &App) -> String {
    let (context, actions) = match app.overlay {
        Overlay::Manager(_) => (Context::Manager, MANAGER_HINTS),
        Overlay::Duration(_) => return "Tab switch field | Enter save | Esc cancel".to_string(),
        Overlay::Help => return "j/k scroll | ? close".to_string(),
        Overlay::None => (Context::Global, DASHBOARD_HINTS),
    };

    actions
        .iter()
        .filter_map(|&(action, label)| {
            app.keybindings
                .key_for(action, context)
                .map(|key| format!("[{}] {}", key, label))
        })
        .collect::<Vec<_>>()
        .join(" ")
}
