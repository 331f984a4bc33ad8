//! Keybinding configuration for the user list: parse `keybinds.conf`, provide
//! defaults, and map keys to actions.
//!
//! Form screens take raw text input and do not go through the keymap.
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;
use std::path::Path;

/// Semantic actions available on the user list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Move the row cursor up.
    MoveUp,
    /// Move the row cursor down.
    MoveDown,
    /// Toggle selection of the row under the cursor.
    ToggleSelect,
    /// Select every row, or clear the selection when all are selected.
    ToggleSelectAll,
    /// Delete every selected user.
    DeleteSelected,
    /// Re-fetch the user list.
    Refresh,
    /// Open the create form.
    NewUser,
    /// Open the edit form for the row under the cursor.
    EditUser,
    /// Ignore this key.
    Ignore,
}

const ACTIONS: [(KeyAction, &str); 10] = [
    (KeyAction::Quit, "Quit"),
    (KeyAction::MoveUp, "MoveUp"),
    (KeyAction::MoveDown, "MoveDown"),
    (KeyAction::ToggleSelect, "ToggleSelect"),
    (KeyAction::ToggleSelectAll, "ToggleSelectAll"),
    (KeyAction::DeleteSelected, "DeleteSelected"),
    (KeyAction::Refresh, "Refresh"),
    (KeyAction::NewUser, "NewUser"),
    (KeyAction::EditUser, "EditUser"),
    (KeyAction::Ignore, "Ignore"),
];

/// Mapping from `(KeyModifiers, KeyCode)` pairs to [`KeyAction`]s.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    /// Arrow keys and vim-style `j`/`k` for movement, single letters for actions.
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::CONTROL, Char('c')), KeyAction::Quit);
        bindings.insert((M::NONE, Esc), KeyAction::Ignore);
        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char(' ')), KeyAction::ToggleSelect);
        bindings.insert((M::NONE, Char('a')), KeyAction::ToggleSelectAll);
        bindings.insert((M::NONE, Delete), KeyAction::DeleteSelected);
        bindings.insert((M::NONE, Char('d')), KeyAction::DeleteSelected);
        bindings.insert((M::NONE, Char('r')), KeyAction::Refresh);
        bindings.insert((M::NONE, Char('n')), KeyAction::NewUser);
        bindings.insert((M::NONE, Enter), KeyAction::EditUser);
        bindings.insert((M::NONE, Char('e')), KeyAction::EditUser);
        Self { bindings }
    }

    /// Load the keymap at `path`, or write the defaults there if it does not exist.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(e) = km.write_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not write default keybinds");
        }
        km
    }

    /// Read `Action = KeySpec` lines on top of the defaults.
    ///
    /// Returns `None` when the file cannot be read.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Parse keybind file contents. Unknown actions or keys are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let lhs = parts.next().map(|s| s.trim()).unwrap_or("");
            let rhs = parts.next().map(|s| s.trim()).unwrap_or("");
            if lhs.is_empty() || rhs.is_empty() {
                continue;
            }
            match (parse_action(lhs), parse_key(rhs)) {
                (Some(action), Some(key)) => {
                    map.bindings.insert(key, action);
                }
                _ => tracing::warn!(line, "ignoring keybind line"),
            }
        }
        map
    }

    /// Write the current keymap in `Action = KeySpec` form.
    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# user-panel keybindings (user list)\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+c, Enter, Esc, Space, Up, Down, Delete, a, d, r, n, e\n");
        buf.push_str("# Actions: ");
        buf.push_str(&ACTIONS.iter().map(|(_, n)| *n).collect::<Vec<_>>().join(", "));
        buf.push_str("\n\n");

        let mut entries: Vec<(String, &'static str)> = self
            .bindings
            .iter()
            .map(|((m, c), a)| (Self::format_key(*m, *c), format_action(*a)))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(&b.0)));
        for (key, action) in entries {
            let _ = writeln!(&mut buf, "{} = {}", action, key);
        }

        std::fs::write(path, buf)
    }

    /// Resolve a key event to its action, if bound.
    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    /// Keys bound to `action`, formatted and sorted, for the status bar.
    pub fn keys_for(&self, action: KeyAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((m, c), _)| Self::format_key(*m, *c))
            .collect();
        keys.sort();
        keys
    }

    /// Format a key like "Ctrl+c", "Space", "Delete".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Delete => "Delete".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            BackTab => "BackTab".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Char(' ') => "Space".to_string(),
            Char(c) => c.to_string(),
            _ => format!("{:?}", code),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", base)
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let s = spec.trim();
    let (mods, rest) = match s.strip_prefix("Ctrl+") {
        Some(after) => (KeyModifiers::CONTROL, after),
        None => (KeyModifiers::NONE, s),
    };
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "BackTab" => BackTab,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "Space" => Char(' '),
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    ACTIONS.iter().find(|(_, n)| *n == s.trim()).map(|(a, _)| *a)
}

pub fn format_action(a: KeyAction) -> &'static str {
    ACTIONS
        .iter()
        .find(|(x, _)| *x == a)
        .map(|(_, n)| *n)
        .unwrap_or("Ignore")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_list_actions() {
        let km = Keymap::default();
        let key = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        assert_eq!(km.resolve(&key(' ')), Some(KeyAction::ToggleSelect));
        assert_eq!(km.resolve(&key('a')), Some(KeyAction::ToggleSelectAll));
        assert_eq!(km.resolve(&key('n')), Some(KeyAction::NewUser));
        assert_eq!(km.resolve(&key('z')), None);
    }

    #[test]
    fn parse_overrides_defaults_and_skips_garbage() {
        let km = Keymap::parse("# comment\nRefresh = Ctrl+r\nBogus = x\nQuit = \nNewUser = Space\n");
        assert_eq!(
            km.resolve(&KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(KeyAction::Refresh)
        );
        assert_eq!(
            km.resolve(&KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)),
            Some(KeyAction::NewUser)
        );
        assert_eq!(
            km.resolve(&KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)),
            None
        );
    }

    #[test]
    fn written_file_parses_back_to_same_bindings() {
        let mut path = std::env::temp_dir();
        path.push(format!("user_panel_keybinds_{}.conf", std::process::id()));
        let km = Keymap::default();
        km.write_file(&path).unwrap();
        let back = Keymap::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let mut a = km.all_sorted();
        let mut b = back.all_sorted();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    impl Keymap {
        fn all_sorted(&self) -> Vec<(String, &'static str)> {
            self.bindings
                .iter()
                .map(|((m, c), a)| (Keymap::format_key(*m, *c), format_action(*a)))
                .collect()
        }
    }

    #[test]
    fn format_key_names_space_and_ctrl() {
        assert_eq!(Keymap::format_key(KeyModifiers::NONE, KeyCode::Char(' ')), "Space");
        assert_eq!(Keymap::format_key(KeyModifiers::CONTROL, KeyCode::Char('c')), "Ctrl+c");
    }
}
