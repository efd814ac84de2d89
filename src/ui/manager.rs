//! Channel manager overlay: categories with their channel tags.

use crate::app::{App, ManagerState};
use crate::dashboard::ViewState;
use crate::keybindings::{Action, Context};
use crate::theme::ColorPalette;
use crate::util::{sanitize_line, truncate_to_width};
use crate::view::{ManagerRow, ManagerView, NO_CATEGORIES};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::dialogs;
use super::help::centered_rect;

pub fn render(f: &mut Frame, app: &App, state: &ManagerState) {
    let overlay = centered_rect(70, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);

    let mut title = String::from(" Channels ");
    if app.dashboard.manager_state().is_loading() {
        title.push_str("[saving] ");
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.palette.overlay_border)
        .title(title);
    let inner = block.inner(overlay);
    f.render_widget(block, overlay);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let width = chunks[0].width as usize;
    let visible = chunks[0].height as usize;

    let lines = match app.manager_view() {
        Some(view) => row_lines(&view, &app.palette, state.selected, width),
        None => {
            let text = match app.dashboard.manager_state() {
                ViewState::Errored(msg) => msg.clone(),
                _ => "Loading categories...".to_string(),
            };
            vec![Line::from(Span::styled(
                truncate_to_width(&text, width).into_owned(),
                app.palette.empty_marker,
            ))]
        }
    };

    // Keep the cursor on screen without storing a scroll position
    let offset = state.selected.saturating_sub(visible.saturating_sub(1));
    let visible_lines: Vec<Line> = lines.into_iter().skip(offset).take(visible).collect();
    f.render_widget(Paragraph::new(visible_lines), chunks[0]);

    f.render_widget(
        Paragraph::new(Span::styled(hint_text(app), app.palette.hint)),
        chunks[1],
    );

    if let Some(prompt) = &state.prompt {
        dialogs::render_prompt(f, app, prompt);
    } else if let Some(category) = &state.confirm_delete {
        dialogs::render_confirm(f, app, category);
    }
}

/// One line per manager row, in `ManagerView::rows()` order.
fn row_lines(
    view: &ManagerView,
    palette: &ColorPalette,
    selected: usize,
    width: usize,
) -> Vec<Line<'static>> {
    let rows = view.rows();
    if rows.is_empty() {
        return vec![Line::from(Span::styled(NO_CATEGORIES, palette.empty_marker))];
    }

    rows.iter()
        .enumerate()
        .map(|(i, &row)| {
            let (text, style) = match row {
                ManagerRow::Category(_) => (
                    sanitize_line(view.category_name(row).unwrap_or_default()).into_owned(),
                    palette.category_name,
                ),
                ManagerRow::Channel { .. } => (
                    format!("    {}", sanitize_line(view.channel_name(row).unwrap_or_default())),
                    palette.channel_tag,
                ),
            };
            let style = if i == selected { palette.row_selected } else { style };
            Line::from(Span::styled(truncate_to_width(&text, width).into_owned(), style))
        })
        .collect()
}

fn hint_text(app: &App) -> String {
    let key = |action| {
        app.keybindings
            .key_for(action, Context::Manager)
            .unwrap_or_else(|| "?".to_string())
    };
    format!(
        "{} add channel  {} new category  {} remove  {} close",
        key(Action::AddChannel),
        key(Action::AddCategory),
        key(Action::Remove),
        key(Action::Back),
    )
}
