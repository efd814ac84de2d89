//! Video feed panel: one section per category, one line per video card.

use crate::app::App;
use crate::dashboard::ViewState;
use crate::theme::ColorPalette;
use crate::util::{display_width, truncate_to_width};
use crate::view::{DashboardView, SectionBody, VideoCard, LOADING_VIDEOS, NO_CONTENT, NO_VIDEOS};
use chrono::Local;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Below this many columns for the title, the channel name is dropped.
const MIN_TITLE_WIDTH: usize = 16;

/// Render the feed panel, scrolling so the selected card stays visible.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let visible = area.height.saturating_sub(2) as usize;

    let (lines, selected_line) = match &app.view {
        Some(view) => feed_lines(view, &app.palette, app.selected, inner_width),
        None => (vec![placeholder_line(app, inner_width)], None),
    };

    let max_offset = lines.len().saturating_sub(visible);
    app.scroll_offset = match selected_line {
        Some(line) => keep_visible(app.scroll_offset, line, visible),
        None => app.scroll_offset,
    }
    .min(max_offset);

    let visible_lines: Vec<Line> = lines
        .into_iter()
        .skip(app.scroll_offset)
        .take(visible)
        .collect();

    let mut title = match app.dashboard.loaded_at() {
        Some(at) => format!(
            " Videos (updated {}) ",
            at.with_timezone(&Local).format("%H:%M")
        ),
        None => " Videos ".to_string(),
    };
    if app.view.is_some() && app.dashboard.feed_state().is_loading() {
        title.push_str("[loading] ");
    }

    let paragraph = Paragraph::new(visible_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.panel_border)
            .title(Span::styled(title, app.palette.header)),
    );
    f.render_widget(paragraph, area);
}

/// Shown before the first feed arrives.
fn placeholder_line(app: &App, width: usize) -> Line<'static> {
    let text = match app.dashboard.feed_state() {
        ViewState::Errored(msg) => msg.clone(),
        ViewState::Idle | ViewState::Loading | ViewState::Rendered => LOADING_VIDEOS.to_string(),
    };
    Line::from(Span::styled(
        truncate_to_width(&text, width).into_owned(),
        app.palette.empty_marker,
    ))
}

/// Lay out the whole view. Also returns the line index of the selected card.
fn feed_lines(
    view: &DashboardView,
    palette: &ColorPalette,
    selected: usize,
    width: usize,
) -> (Vec<Line<'static>>, Option<usize>) {
    let sections = match view {
        DashboardView::NoContent => {
            return (
                vec![Line::from(Span::styled(NO_CONTENT, palette.empty_marker))],
                None,
            );
        }
        DashboardView::Sections(sections) => sections,
    };

    let mut lines = Vec::new();
    let mut selected_line = None;
    let mut card_index = 0;

    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            truncate_to_width(&section.title, width).into_owned(),
            palette.section_title,
        )));

        match &section.body {
            SectionBody::NoVideos => lines.push(Line::from(Span::styled(
                format!("  {}", NO_VIDEOS),
                palette.empty_marker,
            ))),
            SectionBody::Cards(cards) => {
                for card in cards {
                    let is_selected = card_index == selected;
                    if is_selected {
                        selected_line = Some(lines.len());
                    }
                    lines.push(card_line(card, palette, is_selected, width));
                    card_index += 1;
                }
            }
        }
    }

    (lines, selected_line)
}

fn card_line(card: &VideoCard, palette: &ColorPalette, selected: bool, width: usize) -> Line<'static> {
    let age = format!("  {:>4}  ", card.age.to_string());
    let mut channel = format!("  {}", card.channel);

    let fixed = display_width(&age);
    let mut title_budget = width.saturating_sub(fixed + display_width(&channel));
    if title_budget < MIN_TITLE_WIDTH {
        channel.clear();
        title_budget = width.saturating_sub(fixed);
    }
    let title = truncate_to_width(&card.title, title_budget).into_owned();

    let (age_style, title_style, channel_style) = if selected {
        (palette.card_selected, palette.card_selected, palette.card_selected)
    } else {
        (palette.card_age, palette.card_title, palette.card_channel)
    };

    Line::from(vec![
        Span::styled(age, age_style),
        Span::styled(title, title_style),
        Span::styled(channel, channel_style),
    ])
}

/// Smallest change to `offset` that keeps `line` inside a window of `height`.
fn keep_visible(offset: usize, line: usize, height: usize) -> usize {
    if height == 0 {
        offset
    } else if line < offset {
        line
    } else if line >= offset + height {
        line + 1 - height
    } else {
        offset
    }
}
