//! Screen addresses: `/`, `/user/create`, `/user/edit/{id}`.
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    List,
    Create,
    Edit(u64),
}

impl Route {
    /// Parse a route path. Trailing slashes are ignored.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(Route::List);
        }
        let mut parts = trimmed.strip_prefix('/')?.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("user"), Some("create"), None, None) => Some(Route::Create),
            (Some("user"), Some("edit"), Some(id), None) => id.parse().ok().map(Route::Edit),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::List => "/".to_string(),
            Route::Create => "/user/create".to_string(),
            Route::Edit(id) => format!("/user/edit/{id}"),
        }
    }

    /// Header title for the screen at this route.
    pub fn title(&self) -> &'static str {
        match self {
            Route::List => "Dashboard",
            Route::Create => "User Create",
            Route::Edit(_) => "User Edit",
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}
