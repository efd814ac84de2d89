//! Small centered dialogs: text prompt, delete confirmation, duration editor.

use crate::app::{App, DurationDialog, DurationField, Prompt};
use crate::util::sanitize_line;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Centered box of at most `width` x `height`, or `None` if it would not fit.
fn dialog_rect(area: Rect, width: u16, height: u16) -> Option<Rect> {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let rect = Rect::new(x, y, width, height);
    (rect.width >= 20 && rect.height >= 5).then_some(rect)
}

fn render_box(f: &mut Frame, app: &App, rect: Rect, title: String, lines: Vec<Line<'_>>) {
    f.render_widget(Clear, rect);
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.overlay_border)
            .title(title),
    );
    f.render_widget(paragraph, rect);
}

pub fn render_prompt(f: &mut Frame, app: &App, prompt: &Prompt) {
    let Some(rect) = dialog_rect(f.area(), 50, 7) else {
        return;
    };
    let lines = vec![
        Line::default(),
        Line::from(vec![
            Span::raw("> "),
            Span::styled(format!("{}_", prompt.input), app.palette.input_field),
        ]),
        Line::default(),
        Line::from(Span::styled("(Enter) Save  (Esc) Cancel", app.palette.hint)),
    ];
    render_box(f, app, rect, prompt.title(), lines);
}

pub fn render_confirm(f: &mut Frame, app: &App, category: &str) {
    let Some(rect) = dialog_rect(f.area(), 50, 7) else {
        return;
    };
    let text = format!(
        "Delete category \"{}\"?\n\nIts channel assignments are removed too.\n\n(y) Confirm  (n/Esc) Cancel",
        sanitize_line(category)
    );
    f.render_widget(Clear, rect);
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.overlay_border)
                .title(" Confirm "),
        )
        .alignment(Alignment::Center);
    f.render_widget(paragraph, rect);
}

pub fn render_duration(f: &mut Frame, app: &App, dialog: &DurationDialog) {
    let Some(rect) = dialog_rect(f.area(), 44, 9) else {
        return;
    };

    let field = |label: &'static str, value: &str, which: DurationField| {
        let focused = dialog.focus == which;
        let cursor = if focused { "_" } else { " " };
        let style = if focused {
            app.palette.input_field
        } else {
            app.palette.hint
        };
        Line::from(vec![
            Span::raw(format!("{:<8}", label)),
            Span::styled(format!("{:>6}{}", value, cursor), style),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("Keep videos published within:", app.palette.header)),
        Line::default(),
        field("Days", &dialog.days, DurationField::Days),
        field("Months", &dialog.months, DurationField::Months),
        Line::default(),
        Line::from(Span::styled(
            "(Tab) Switch  (Enter) Save  (Esc) Cancel",
            app.palette.hint,
        )),
    ];
    render_box(f, app, rect, " Video retention ".to_string(), lines);
}
