//! Keybinding registry: maps keys to dashboard actions, with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    PageDown,
    PageUp,
    OpenVideo,
    Reload,
    Refresh,
    ManageChannels,
    EditDuration,
    CycleTheme,
    ShowHelp,
    Back,
    AddChannel,
    AddCategory,
    Remove,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::NavDown => "Move down",
            Self::NavUp => "Move up",
            Self::PageDown => "Next category",
            Self::PageUp => "Previous category",
            Self::OpenVideo => "Open video in browser",
            Self::Reload => "Reload videos",
            Self::Refresh => "Re-collect videos on the server",
            Self::ManageChannels => "Manage categories and channels",
            Self::EditDuration => "Set video age window",
            Self::CycleTheme => "Cycle theme",
            Self::ShowHelp => "Show help",
            Self::Back => "Close / go back",
            Self::AddChannel => "Add channel to category",
            Self::AddCategory => "New category",
            Self::Remove => "Remove channel / delete category",
        }
    }
}

/// Parse an action name from config (snake_case, with a few short aliases).
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "nav_down" | "down" => Some(Action::NavDown),
        "nav_up" | "up" => Some(Action::NavUp),
        "page_down" | "next_category" => Some(Action::PageDown),
        "page_up" | "prev_category" => Some(Action::PageUp),
        "open_video" | "open" => Some(Action::OpenVideo),
        "reload" => Some(Action::Reload),
        "refresh" => Some(Action::Refresh),
        "manage_channels" | "manage" => Some(Action::ManageChannels),
        "edit_duration" | "duration" => Some(Action::EditDuration),
        "cycle_theme" | "theme" => Some(Action::CycleTheme),
        "show_help" | "help" => Some(Action::ShowHelp),
        "back" => Some(Action::Back),
        "add_channel" => Some(Action::AddChannel),
        "add_category" => Some(Action::AddCategory),
        "remove" | "delete" => Some(Action::Remove),
        _ => None,
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context. Lookups fall back to `Global`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Manager,
}

impl Context {
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "Dashboard",
            Self::Manager => "Manager",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config.
///
/// Accepts single characters ("q", "?"), named keys ("Enter", "Esc", "Tab",
/// "Up", "Down", "Backspace", "Delete", "Space"), "Ctrl+<char>", and F1-F12.
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+").or_else(|| s.strip_prefix("ctrl+")) {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "pageup" => Some(KeyCode::PageUp),
        "pagedown" => Some(KeyCode::PageDown),
        "backspace" => Some(KeyCode::Backspace),
        "delete" | "del" => Some(KeyCode::Delete),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix('F')
        .or_else(|| s.strip_prefix('f'))
        .and_then(|n| n.parse::<u8>().ok())
    {
        return (1..=12).contains(&n).then(|| KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::char(c)),
        _ => None,
    }
}

/// Display form for the help screen.
fn format_key(key: &KeySpec) -> String {
    let name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl+{}", name)
    } else {
        name
    }
}

// ============================================================================
// Keybinding Registry
// ============================================================================

const DEFAULT_BINDINGS: &[(Context, KeySpec, Action)] = &[
    (Context::Global, KeySpec::char('q'), Action::Quit),
    (Context::Global, KeySpec::ctrl('c'), Action::Quit),
    (Context::Global, KeySpec::char('j'), Action::NavDown),
    (Context::Global, KeySpec::plain(KeyCode::Down), Action::NavDown),
    (Context::Global, KeySpec::char('k'), Action::NavUp),
    (Context::Global, KeySpec::plain(KeyCode::Up), Action::NavUp),
    (Context::Global, KeySpec::char('J'), Action::PageDown),
    (Context::Global, KeySpec::plain(KeyCode::PageDown), Action::PageDown),
    (Context::Global, KeySpec::char('K'), Action::PageUp),
    (Context::Global, KeySpec::plain(KeyCode::PageUp), Action::PageUp),
    (Context::Global, KeySpec::char('o'), Action::OpenVideo),
    (Context::Global, KeySpec::plain(KeyCode::Enter), Action::OpenVideo),
    (Context::Global, KeySpec::char('r'), Action::Reload),
    (Context::Global, KeySpec::char('R'), Action::Refresh),
    (Context::Global, KeySpec::char('m'), Action::ManageChannels),
    (Context::Global, KeySpec::char('d'), Action::EditDuration),
    (Context::Global, KeySpec::char('T'), Action::CycleTheme),
    (Context::Global, KeySpec::char('?'), Action::ShowHelp),
    (Context::Global, KeySpec::plain(KeyCode::Esc), Action::Back),
    (Context::Manager, KeySpec::char('a'), Action::AddChannel),
    (Context::Manager, KeySpec::char('n'), Action::AddCategory),
    (Context::Manager, KeySpec::char('x'), Action::Remove),
    (Context::Manager, KeySpec::plain(KeyCode::Delete), Action::Remove),
    (Context::Manager, KeySpec::char('q'), Action::Back),
];

/// Registry of keybindings: defaults plus config overrides.
///
/// The same key can mean different things per context; a miss in a specific
/// context falls back to `Global`.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// Kept in registration order for the help screen.
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::with_capacity(DEFAULT_BINDINGS.len()),
        };
        for &(context, key, action) in DEFAULT_BINDINGS {
            registry.bind(context, key, action);
        }
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        if let Some(previous) = self.lookup.insert((context, key), action) {
            self.bindings
                .retain(|(c, k, a)| !(*c == context && *k == key && *a == previous));
        }
        self.bindings.push((context, key, action));
    }

    /// Apply `action name → key` overrides from the config file.
    ///
    /// An override replaces every default key of that action, in every
    /// context the action was bound in. Returns one warning per entry that
    /// could not be applied.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        // Sorted so repeated runs apply (and warn) in a stable order
        let mut entries: Vec<(&String, &String)> = overrides.iter().collect();
        entries.sort();

        for (action_name, key_str) in entries {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = Vec::new();
            for (c, _, a) in &self.bindings {
                if *a == action && !contexts.contains(c) {
                    contexts.push(*c);
                }
            }

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for context in contexts {
                self.bind(context, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// Resolve a key press in `context`, falling back to `Global`.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers);
        self.lookup
            .get(&(context, key))
            .or_else(|| self.lookup.get(&(Context::Global, key)))
            .copied()
    }

    /// First key bound to `action` in `context`, for inline hints.
    pub fn key_for(&self, action: Action, context: Context) -> Option<String> {
        self.bindings
            .iter()
            .find(|(c, _, a)| *c == context && *a == action)
            .map(|(_, key, _)| format_key(key))
    }

    /// `(context, key, action, description)` rows for the help screen.
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(reg: &KeybindingRegistry, key: KeySpec, ctx: Context) -> Option<Action> {
        reg.action_for_key(key.code, key.modifiers, ctx)
    }

    #[test]
    fn test_default_dashboard_keys() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::char('q'), Context::Global), Some(Action::Quit));
        assert_eq!(lookup(&reg, KeySpec::char('r'), Context::Global), Some(Action::Reload));
        assert_eq!(lookup(&reg, KeySpec::char('R'), Context::Global), Some(Action::Refresh));
        assert_eq!(
            lookup(&reg, KeySpec::plain(KeyCode::Enter), Context::Global),
            Some(Action::OpenVideo)
        );
        assert_eq!(
            lookup(&reg, KeySpec::plain(KeyCode::Down), Context::Global),
            Some(Action::NavDown)
        );
    }

    #[test]
    fn test_manager_context_overrides_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::char('q'), Context::Manager), Some(Action::Back));
        assert_eq!(lookup(&reg, KeySpec::char('a'), Context::Manager), Some(Action::AddChannel));
        // not bound on the dashboard
        assert_eq!(lookup(&reg, KeySpec::char('a'), Context::Global), None);
    }

    #[test]
    fn test_manager_falls_back_to_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::char('j'), Context::Manager), Some(Action::NavDown));
        assert_eq!(
            lookup(&reg, KeySpec::plain(KeyCode::Esc), Context::Manager),
            Some(Action::Back)
        );
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::plain(KeyCode::F(12)), Context::Global), None);
    }

    #[test]
    fn test_override_replaces_all_default_keys() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("reload".to_string(), "F5".to_string())]);
        assert!(reg.apply_overrides(&overrides).is_empty());

        assert_eq!(lookup(&reg, KeySpec::char('r'), Context::Global), None);
        assert_eq!(
            lookup(&reg, KeySpec::plain(KeyCode::F(5)), Context::Global),
            Some(Action::Reload)
        );
        assert_eq!(reg.key_for(Action::Reload, Context::Global).as_deref(), Some("F5"));
    }

    #[test]
    fn test_override_keeps_manager_context() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("remove".to_string(), "D".to_string())]);
        assert!(reg.apply_overrides(&overrides).is_empty());
        assert_eq!(lookup(&reg, KeySpec::char('D'), Context::Manager), Some(Action::Remove));
        assert_eq!(lookup(&reg, KeySpec::char('x'), Context::Manager), None);
        assert_eq!(lookup(&reg, KeySpec::char('D'), Context::Global), None);
    }

    #[test]
    fn test_override_warnings() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([
            ("nonexistent".to_string(), "q".to_string()),
            ("quit".to_string(), "Ctrl+Alt+Q".to_string()),
        ]);
        let warnings = reg.apply_overrides(&overrides);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Unknown action"));
        assert!(warnings[1].contains("Cannot parse key"));
        // failed override leaves the default in place
        assert_eq!(lookup(&reg, KeySpec::char('q'), Context::Global), Some(Action::Quit));
    }

    #[test]
    fn test_parse_key_string() {
        assert_eq!(parse_key_string("Enter"), Some(KeySpec::plain(KeyCode::Enter)));
        assert_eq!(parse_key_string("esc"), Some(KeySpec::plain(KeyCode::Esc)));
        assert_eq!(parse_key_string("space"), Some(KeySpec::char(' ')));
        assert_eq!(parse_key_string("Ctrl+r"), Some(KeySpec::ctrl('r')));
        assert_eq!(parse_key_string("F12"), Some(KeySpec::plain(KeyCode::F(12))));
        assert_eq!(parse_key_string("F13"), None);
        assert_eq!(parse_key_string("?"), Some(KeySpec::char('?')));
        assert_eq!(parse_key_string("é"), Some(KeySpec::char('é')));
        assert_eq!(parse_key_string("qq"), None);
        assert_eq!(parse_key_string(""), None);
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key(&KeySpec::char('q')), "q");
        assert_eq!(format_key(&KeySpec::ctrl('c')), "Ctrl+c");
        assert_eq!(format_key(&KeySpec::plain(KeyCode::Delete)), "Delete");
        assert_eq!(format_key(&KeySpec::char(' ')), "Space");
    }

    #[test]
    fn test_all_bindings_cover_every_action() {
        let reg = KeybindingRegistry::new();
        let bindings = reg.all_bindings();
        for action in [
            Action::Quit,
            Action::OpenVideo,
            Action::Refresh,
            Action::ManageChannels,
            Action::EditDuration,
            Action::AddCategory,
            Action::Remove,
        ] {
            assert!(bindings.iter().any(|(_, _, a, _)| *a == action), "{:?}", action);
        }
    }
}
