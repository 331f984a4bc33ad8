//! Application state types and entry glue.
//!
//! Defines the screens, their view state, the theme, and the `AppState` that
//! ties them to an injected user store. The event loop lives in `update`
//! (re-exported as `run`), user-triggered operations in `actions`.
//!
pub mod actions;
pub mod keymap;
pub mod route;
pub mod toast;
pub mod update;

use ratatui::style::Color;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::query::{DEFAULT_STALE_AFTER, UsersQuery};
use crate::store::{User, UserStore};
use crate::validation::{Field, FieldErrors, UserForm};

pub use keymap::{KeyAction, Keymap};
pub use route::Route;
pub use toast::{DEFAULT_TOAST_LIFETIME, Toast, ToastKind, Toasts};

/// Delay between a successful create and the return to the list.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_secs(1);

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub accent: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub success: Color,
    pub error: Color,
}

const THEME_KEYS: [&str; 13] = [
    "text",
    "muted",
    "title",
    "accent",
    "border",
    "header_bg",
    "header_fg",
    "status_bg",
    "status_fg",
    "highlight_fg",
    "highlight_bg",
    "success",
    "error",
];

impl Theme {
    /// Catppuccin Mocha defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            accent: Color::Rgb(0xf5, 0xc2, 0xe7),       // pink
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x1e, 0x1e, 0x2e),    // base
            header_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x31, 0x32, 0x44), // surface0
            success: Color::Rgb(0xa6, 0xe3, 0xa1),      // green
            error: Color::Rgb(0xf3, 0x8b, 0xa8),        // red
        }
    }

    fn slot(&mut self, key: &str) -> Option<&mut Color> {
        Some(match key {
            "text" => &mut self.text,
            "muted" => &mut self.muted,
            "title" => &mut self.title,
            "accent" => &mut self.accent,
            "border" => &mut self.border,
            "header_bg" => &mut self.header_bg,
            "header_fg" => &mut self.header_fg,
            "status_bg" => &mut self.status_bg,
            "status_fg" => &mut self.status_fg,
            "highlight_fg" => &mut self.highlight_fg,
            "highlight_bg" => &mut self.highlight_bg,
            "success" => &mut self.success,
            "error" => &mut self.error,
            _ => return None,
        })
    }

    /// Parse `key = color` lines on top of `mocha`. Unknown keys are ignored.
    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::mocha();
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().map(|s| s.trim()).unwrap_or("");
            let val = parts.next().map(|s| s.trim()).unwrap_or("");
            if let (Some(color), Some(slot)) = (Self::parse_color(val), theme.slot(key)) {
                *slot = color;
            }
        }
        theme
    }

    /// Load a theme file. `None` when it cannot be read.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Parse a color from hex ("#RRGGBB" or "RRGGBB") or "reset".
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color::Rgb(r, g, b))
    }

    fn color_to_str(c: Color) -> String {
        match c {
            Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
            Color::Reset => "reset".to_string(),
            // named colors get a best-effort hex approximation
            Color::Black => "#000000".to_string(),
            Color::Red => "#FF0000".to_string(),
            Color::Green => "#00FF00".to_string(),
            Color::Yellow => "#FFFF00".to_string(),
            Color::Blue => "#0000FF".to_string(),
            Color::Magenta => "#FF00FF".to_string(),
            Color::Cyan => "#00FFFF".to_string(),
            Color::Gray => "#B3B3B3".to_string(),
            Color::DarkGray => "#4D4D4D".to_string(),
            Color::LightRed => "#FF6666".to_string(),
            Color::LightGreen => "#66FF66".to_string(),
            Color::LightYellow => "#FFFF66".to_string(),
            Color::LightBlue => "#6666FF".to_string(),
            Color::LightMagenta => "#FF66FF".to_string(),
            Color::LightCyan => "#66FFFF".to_string(),
            Color::White => "#FFFFFF".to_string(),
            Color::Indexed(_) => "reset".to_string(),
        }
    }

    /// Persist the theme in key=value format.
    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# user-panel theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n\n");
        let mut copy = *self;
        for key in THEME_KEYS {
            if let Some(c) = copy.slot(key) {
                let _ = writeln!(&mut buf, "{} = {}", key, Self::color_to_str(*c));
            }
        }
        std::fs::write(path, buf)
    }

    /// Load the theme at `path`, or write `mocha` there if the file is missing.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(e) = t.write_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not write default theme");
        }
        t
    }
}

/// State of the user list screen.
#[derive(Clone, Debug, Default)]
pub struct ListView {
    /// Ids checked for bulk deletion.
    pub selected: BTreeSet<u64>,
    /// Row under the cursor.
    pub cursor: usize,
}

impl ListView {
    pub fn toggle(&mut self, id: u64) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// True iff every visible row is selected and there is at least one row.
    pub fn all_selected(&self, users: &[User]) -> bool {
        !users.is_empty()
            && self.selected.len() == users.len()
            && users.iter().all(|u| self.selected.contains(&u.id))
    }

    pub fn set_all(&mut self, users: &[User], on: bool) {
        self.selected.clear();
        if on {
            self.selected.extend(users.iter().map(|u| u.id));
        }
    }

    /// Forget selections and clamp the cursor after the snapshot changed.
    pub fn sync_with(&mut self, users: &[User]) {
        self.selected.retain(|id| users.iter().any(|u| u.id == *id));
        self.cursor = self.cursor.min(users.len().saturating_sub(1));
    }
}

/// State of the create and edit forms.
#[derive(Clone, Debug)]
pub struct FormView {
    pub form: UserForm,
    pub focus: Field,
    pub errors: FieldErrors,
    /// Set after the first submit; from then on every edit re-validates.
    pub attempted: bool,
    /// A successful submit is waiting for its redirect.
    pub submitting: bool,
}

impl Default for FormView {
    fn default() -> Self {
        Self {
            form: UserForm::default(),
            focus: Field::Name,
            errors: FieldErrors::default(),
            attempted: false,
            submitting: false,
        }
    }
}

impl FormView {
    /// Pre-fill from a stored record; the stored password seeds both password fields.
    pub fn prefilled(user: &User) -> Self {
        Self {
            form: UserForm {
                name: user.name.clone(),
                email: user.email.clone(),
                password: user.password.clone(),
                password_confirmation: user.password.clone(),
            },
            ..Self::default()
        }
    }

    pub fn input(&mut self, c: char) {
        self.form.value_mut(self.focus).push(c);
        self.revalidate();
    }

    pub fn backspace(&mut self) {
        self.form.value_mut(self.focus).pop();
        self.revalidate();
    }

    fn revalidate(&mut self) {
        if self.attempted {
            self.errors = crate::validation::validate(&self.form).err().unwrap_or_default();
        }
    }
}

#[derive(Clone, Debug)]
pub enum Screen {
    List(ListView),
    Create(FormView),
    Edit {
        id: u64,
        view: FormView,
        /// False when the id did not resolve to a record on load.
        found: bool,
    },
}

/// Navigation scheduled for later, valid only inside the scope that created it.
#[derive(Clone, Copy, Debug)]
pub struct PendingRedirect {
    pub to: Route,
    pub scope: u64,
    pub at: Instant,
}

/// Tunables for a session, usually filled from the command line.
#[derive(Clone, Debug)]
pub struct AppOptions {
    pub stale_after: Duration,
    pub toast_lifetime: Duration,
    pub redirect_delay: Duration,
    pub theme: Theme,
    pub keymap: Keymap,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            toast_lifetime: DEFAULT_TOAST_LIFETIME,
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            theme: Theme::mocha(),
            keymap: Keymap::default(),
        }
    }
}

pub struct AppState {
    pub started_at: Instant,
    pub store: Arc<dyn UserStore>,
    pub users: UsersQuery,
    pub route: Route,
    pub screen: Screen,
    /// Bumped on every navigation; deferred work from an older scope is dropped.
    pub scope: u64,
    pub redirect: Option<PendingRedirect>,
    pub redirect_delay: Duration,
    pub toasts: Toasts,
    pub theme: Theme,
    pub keymap: Keymap,
    /// Terminal is wide enough for the full layout; updated on every render.
    pub wide: bool,
    pub should_quit: bool,
}

impl AppState {
    /// Build the state around an injected store. Call [`AppState::navigate`] to mount a screen.
    pub fn new(store: Arc<dyn UserStore>, options: AppOptions) -> Self {
        Self {
            started_at: Instant::now(),
            users: UsersQuery::new(Arc::clone(&store), options.stale_after),
            store,
            route: Route::List,
            screen: Screen::List(ListView::default()),
            scope: 0,
            redirect: None,
            redirect_delay: options.redirect_delay,
            toasts: Toasts::new(options.toast_lifetime),
            theme: options.theme,
            keymap: options.keymap,
            wide: true,
            should_quit: false,
        }
    }

    /// Users currently shown on the list, empty while nothing was fetched
    /// or the last fetch failed.
    pub fn visible_users(&self) -> &[User] {
        self.users.visible()
    }

    pub fn list_view(&self) -> Option<&ListView> {
        match &self.screen {
            Screen::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn form_view(&self) -> Option<&FormView> {
        match &self.screen {
            Screen::Create(v) | Screen::Edit { view: v, .. } => Some(v),
            Screen::List(_) => None,
        }
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
