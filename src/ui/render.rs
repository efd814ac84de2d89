//! Render functions for the TUI.
//!
//! Draws the feed panel and status bar, then whichever overlay is open.

use crate::app::{App, Overlay};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    widgets::Paragraph,
    Frame,
};

use super::{dialogs, help, manager, sections, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Nothing meaningful fits in a zero-sized frame
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    sections::render(f, app, chunks[0]);
    status::render(f, app, chunks[1]);

    match &app.overlay {
        Overlay::None => {}
        Overlay::Help => help::render(f, app),
        Overlay::Manager(state) => manager::render(f, app, state),
        Overlay::Duration(dialog) => dialogs::render_duration(f, app, dialog),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{app_with_feed, test_app};
    use crate::app::ManagerState;
    use crate::model::ChannelPreferences;
    use crate::view::{LOADING_VIDEOS, NO_CATEGORIES};
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[tokio::test]
    async fn test_startup_shows_loading_marker() {
        let mut app = test_app();
        app.dashboard.begin_feed_load();
        let screen = draw(&mut app, 80, 20);
        assert!(screen.contains(LOADING_VIDEOS));
    }

    #[tokio::test]
    async fn test_feed_sections_drawn() {
        let mut app = app_with_feed();
        let screen = draw(&mut app, 80, 20);
        assert!(screen.contains("a1"));
        assert!(screen.contains("No videos available"));
        assert!(screen.contains("[q] quit"));
    }

    #[tokio::test]
    async fn test_selection_scrolls_into_view() {
        let mut app = app_with_feed();
        app.selected = 2;
        // Seven lines fit inside the border; b1 is the ninth
        let screen = draw(&mut app, 80, MIN_HEIGHT);
        assert!(screen.contains("b1"));
    }

    #[tokio::test]
    async fn test_small_terminal_message() {
        let mut app = test_app();
        let screen = draw(&mut app, 40, 8);
        assert!(screen.contains("Terminal too small"));
    }

    #[tokio::test]
    async fn test_manager_overlay_empty_marker() {
        let mut app = test_app();
        app.overlay = Overlay::Manager(ManagerState::default());
        let generation = app.dashboard.begin_manager_load();
        app.dashboard
            .finish_preferences_load(generation, Ok(ChannelPreferences::default()))
            .unwrap();
        let screen = draw(&mut app, 80, 20);
        assert!(screen.contains(NO_CATEGORIES));
    }
}
