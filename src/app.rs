use crate::dashboard::sync::{DurationOutcome, MutationOutcome};
use crate::dashboard::{Dashboard, DashboardError};
use crate::keybindings::KeybindingRegistry;
use crate::model::{CategorizedFeed, ChannelPreferences, DurationSetting};
use crate::theme::{ColorPalette, ThemeVariant};
use crate::util::sanitize_line;
use crate::view::{DashboardView, ManagerRow, ManagerView, VideoCard};
use chrono::Utc;
use std::borrow::Cow;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Info messages clear after this long; errors stay until the next key press.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Ages are recomputed at least this often while the dashboard is open.
const VIEW_REFRESH: Duration = Duration::from_secs(60);

// ============================================================================
// Status Line
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: Cow<'static, str>,
    pub kind: StatusKind,
    pub set_at: Instant,
}

// ============================================================================
// Overlays
// ============================================================================

/// What a manager text prompt will do on Enter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    AddChannel { category: String },
    AddCategory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

impl Prompt {
    pub fn title(&self) -> String {
        match &self.kind {
            PromptKind::AddChannel { category } => format!(" Add channel to {} ", sanitize_line(category)),
            PromptKind::AddCategory => " New category ".to_string(),
        }
    }
}

/// Channel/category manager overlay.
#[derive(Debug, Clone, Default)]
pub struct ManagerState {
    /// Index into `ManagerView::rows()`.
    pub selected: usize,
    pub prompt: Option<Prompt>,
    /// Category awaiting a y/n delete confirmation.
    pub confirm_delete: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationField {
    Days,
    Months,
}

/// Retention window dialog with two numeric text fields.
#[derive(Debug, Clone)]
pub struct DurationDialog {
    pub days: String,
    pub months: String,
    pub focus: DurationField,
    /// Set once the user types, so a late server read does not clobber input.
    pub edited: bool,
}

impl DurationDialog {
    pub fn new(current: DurationSetting) -> Self {
        Self {
            days: current.days.to_string(),
            months: current.months.to_string(),
            focus: DurationField::Days,
            edited: false,
        }
    }

    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            DurationField::Days => &mut self.days,
            DurationField::Months => &mut self.months,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            DurationField::Days => DurationField::Months,
            DurationField::Months => DurationField::Days,
        };
    }

    /// Defaults apply to any field that is blank or not a number.
    pub fn setting(&self) -> DurationSetting {
        DurationSetting::from_inputs(Some(&self.days), Some(&self.months))
    }
}

#[derive(Debug, Clone, Default)]
pub enum Overlay {
    #[default]
    None,
    Help,
    Manager(ManagerState),
    Duration(DurationDialog),
}

// ============================================================================
// Background Events
// ============================================================================

/// Where a feed load came from, for the status text it ends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOrigin {
    Startup,
    Reload,
    Refresh,
    Periodic,
}

/// Which background slot a task occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Feed,
    Manager,
    DurationRead,
}

impl TaskKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Manager => "manager",
            Self::DurationRead => "duration_read",
        }
    }
}

/// Results sent from spawned tasks back to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    FeedLoaded {
        generation: u64,
        origin: FeedOrigin,
        result: Result<CategorizedFeed, DashboardError>,
    },
    DurationSaved {
        generation: u64,
        outcome: DurationOutcome,
    },
    PreferencesLoaded {
        generation: u64,
        result: Result<ChannelPreferences, DashboardError>,
    },
    MutationFinished {
        generation: u64,
        outcome: MutationOutcome,
    },
    DurationLoaded(Result<DurationSetting, DashboardError>),
    TaskPanicked {
        task: TaskKind,
        generation: u64,
        error: String,
    },
}

// ============================================================================
// App State
// ============================================================================

pub struct App {
    pub dashboard: Dashboard,
    pub keybindings: KeybindingRegistry,
    pub theme: ThemeVariant,
    pub palette: ColorPalette,

    /// Projection of the current feed, rebuilt when the feed changes.
    pub view: Option<DashboardView>,
    view_built_at: Option<Instant>,
    /// Flat card index into `view`.
    pub selected: usize,
    /// First visible line of the feed list, maintained by the renderer.
    pub scroll_offset: usize,

    pub overlay: Overlay,
    pub help_scroll_offset: usize,

    pub status: Option<StatusMessage>,
    pub needs_redraw: bool,

    /// Set while `/api/refresh` is outstanding; the refresh key is ignored meanwhile.
    pub refresh_in_flight: bool,
    pub feed_task: Option<JoinHandle<()>>,
    pub manager_task: Option<JoinHandle<()>>,
    pub duration_task: Option<JoinHandle<()>>,

    pub refresh_interval: Option<Duration>,
    pub last_feed_request: Instant,
}

impl App {
    pub fn new(dashboard: Dashboard, keybindings: KeybindingRegistry, theme: ThemeVariant) -> Self {
        Self {
            dashboard,
            keybindings,
            theme,
            palette: theme.palette(),
            view: None,
            view_built_at: None,
            selected: 0,
            scroll_offset: 0,
            overlay: Overlay::None,
            help_scroll_offset: 0,
            status: None,
            needs_redraw: true,
            refresh_in_flight: false,
            feed_task: None,
            manager_task: None,
            duration_task: None,
            refresh_interval: None,
            last_feed_request: Instant::now(),
        }
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    /// Set an info message (expires after 3 seconds).
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status = Some(StatusMessage {
            text: msg.into(),
            kind: StatusKind::Info,
            set_at: Instant::now(),
        });
    }

    /// Set an error message (stays until the next key press).
    pub fn set_error(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status = Some(StatusMessage {
            text: msg.into(),
            kind: StatusKind::Error,
            set_at: Instant::now(),
        });
    }

    /// Clear an expired info message. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        match &self.status {
            Some(s) if s.kind == StatusKind::Info && s.set_at.elapsed() >= STATUS_TTL => {
                self.status = None;
                true
            }
            _ => false,
        }
    }

    /// Dismiss a sticky error once the user acts again.
    pub fn acknowledge_error(&mut self) {
        if matches!(&self.status, Some(s) if s.kind == StatusKind::Error) {
            self.status = None;
        }
    }

    // ------------------------------------------------------------------------
    // Theme
    // ------------------------------------------------------------------------

    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        self.palette = self.theme.palette();
        self.set_status(format!("Theme: {}", self.theme.name()));
    }

    // ------------------------------------------------------------------------
    // Feed view
    // ------------------------------------------------------------------------

    /// Re-project the feed with current ages and keep the selection in range.
    pub fn rebuild_view(&mut self) {
        self.view = self.dashboard.view(Utc::now());
        self.view_built_at = Some(Instant::now());
        self.clamp_selection();
    }

    /// Rebuild if ages may have moved on. Returns true if rebuilt.
    pub fn refresh_stale_view(&mut self) -> bool {
        match self.view_built_at {
            Some(at) if self.view.is_some() && at.elapsed() >= VIEW_REFRESH => {
                self.rebuild_view();
                true
            }
            _ => false,
        }
    }

    pub fn card_count(&self) -> usize {
        self.view.as_ref().map_or(0, DashboardView::card_count)
    }

    pub fn selected_card(&self) -> Option<&VideoCard> {
        self.view.as_ref().and_then(|v| v.card(self.selected))
    }

    pub fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.card_count().saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.card_count() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Jump to the first card of the next section that has cards.
    pub fn select_next_section(&mut self) {
        if let Some(start) = self.section_starts().into_iter().find(|&s| s > self.selected) {
            self.selected = start;
        }
    }

    /// Jump to the first card of the current section, or the previous one.
    pub fn select_prev_section(&mut self) {
        if let Some(start) = self
            .section_starts()
            .into_iter()
            .rev()
            .find(|&s| s < self.selected)
        {
            self.selected = start;
        }
    }

    /// Flat index of each non-empty section's first card.
    fn section_starts(&self) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut index = 0;
        if let Some(view) = &self.view {
            for section in view.sections() {
                let n = section.cards().len();
                if n > 0 {
                    starts.push(index);
                }
                index += n;
            }
        }
        starts
    }

    // ------------------------------------------------------------------------
    // Manager view
    // ------------------------------------------------------------------------

    pub fn manager_view(&self) -> Option<ManagerView> {
        self.dashboard.manager_view()
    }

    /// The manager row under the cursor, if the overlay is open.
    pub fn selected_manager_row(&self) -> Option<(ManagerView, ManagerRow)> {
        let Overlay::Manager(state) = &self.overlay else {
            return None;
        };
        let view = self.manager_view()?;
        let row = *view.rows().get(state.selected)?;
        Some((view, row))
    }

    pub fn clamp_manager_selection(&mut self) {
        let rows = self.manager_view().map_or(0, |v| v.rows().len());
        if let Overlay::Manager(state) = &mut self.overlay {
            state.selected = state.selected.min(rows.saturating_sub(1));
        }
    }

    // ------------------------------------------------------------------------
    // Shutdown
    // ------------------------------------------------------------------------

    /// Abort every in-flight background task.
    pub fn abort_tasks(&mut self) {
        for handle in [
            self.feed_task.take(),
            self.manager_task.take(),
            self.duration_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}
