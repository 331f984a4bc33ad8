//! Operations triggered from the screens: navigation, selection, bulk delete,
//! create and edit submission.
//!
//! Store failures are caught here, logged, and turned into toasts; nothing
//! propagates past the screen that issued the call.
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::{AppState, FormView, ListView, PendingRedirect, Route, Screen};
use crate::query::fetch_users;
use crate::store::{NewUser, UserChanges};
use crate::validation::validate;

impl AppState {
    /// Mount the screen for `route` in a fresh scope.
    pub fn navigate(&mut self, route: Route) {
        self.scope += 1;
        self.route = route;
        info!(route = %route, scope = self.scope, "navigate");
        self.screen = match route {
            Route::List => {
                self.users.ensure_fresh(Instant::now());
                let mut view = ListView::default();
                view.sync_with(self.visible_users());
                Screen::List(view)
            }
            Route::Create => Screen::Create(FormView::default()),
            Route::Edit(id) => self.load_edit(id),
        };
    }

    fn load_edit(&mut self, id: u64) -> Screen {
        match self.store.get(id) {
            Ok(Some(user)) => Screen::Edit {
                id,
                view: FormView::prefilled(&user),
                found: true,
            },
            Ok(None) => {
                warn!(id, "edit requested for unknown user");
                self.toasts.error("User not found");
                Screen::Edit {
                    id,
                    view: FormView::default(),
                    found: false,
                }
            }
            Err(e) => {
                error!(id, error = %e, "failed to load user");
                self.toasts.error("Failed to load user");
                Screen::Edit {
                    id,
                    view: FormView::default(),
                    found: false,
                }
            }
        }
    }

    /// Advance timers and apply background results.
    pub fn tick(&mut self, now: Instant) {
        if self.users.poll() {
            self.sync_list();
        }
        self.toasts.prune(now);

        if let Some(redirect) = self.redirect {
            if redirect.scope != self.scope {
                debug!(scope = redirect.scope, "dropping redirect from closed screen");
                self.redirect = None;
            } else if now >= redirect.at {
                self.redirect = None;
                self.navigate(redirect.to);
            }
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible_users().len();
        if let Screen::List(view) = &mut self.screen {
            if len == 0 {
                view.cursor = 0;
                return;
            }
            let next = view.cursor.saturating_add_signed(delta);
            view.cursor = next.min(len - 1);
        }
    }

    /// Toggle the row under the cursor.
    pub fn toggle_select(&mut self) {
        let users = self.users.visible();
        if let Screen::List(view) = &mut self.screen {
            if let Some(user) = users.get(view.cursor) {
                view.toggle(user.id);
                debug!(selected = ?view.selected, "users selected");
            }
        }
    }

    /// Select every visible row, or clear the selection if all are already selected.
    pub fn toggle_select_all(&mut self) {
        let users = self.users.visible();
        if let Screen::List(view) = &mut self.screen {
            let on = !view.all_selected(users);
            view.set_all(users, on);
            debug!(selected = ?view.selected, "users selected");
        }
    }

    /// Delete every selected user still on screen, then re-fetch.
    pub fn delete_selected(&mut self) {
        let Screen::List(view) = &mut self.screen else {
            return;
        };
        let visible = self.users.visible();
        let ids: Vec<u64> = view
            .selected
            .iter()
            .copied()
            .filter(|id| visible.iter().any(|u| u.id == *id))
            .collect();
        if ids.is_empty() {
            self.toasts.info("No users selected");
            return;
        }
        match self.store.bulk_delete(&ids) {
            Ok(removed) => {
                info!(requested = ids.len(), removed, "users deleted");
                view.selected.clear();
                self.toasts.success("Users deleted successfully");
                self.users.refetch();
            }
            Err(e) => {
                error!(error = %e, "failed to delete users");
                self.toasts.error("Failed to delete users");
            }
        }
    }

    pub fn refresh(&mut self) {
        self.users.refetch();
    }

    /// Open the edit form for the row under the cursor.
    pub fn edit_at_cursor(&mut self) {
        let target = self
            .list_view()
            .and_then(|v| self.visible_users().get(v.cursor))
            .map(|u| u.id);
        if let Some(id) = target {
            self.navigate(Route::Edit(id));
        }
    }

    /// Submit whichever form is mounted.
    pub fn submit(&mut self) {
        match self.screen {
            Screen::Create(_) => self.submit_create(),
            Screen::Edit { .. } => self.submit_edit(),
            Screen::List(_) => {}
        }
    }

    fn submit_create(&mut self) {
        let Screen::Create(view) = &mut self.screen else {
            return;
        };
        if view.submitting {
            return;
        }
        let Some(new_user) = validated(view) else {
            return;
        };

        match fetch_users(self.store.as_ref()) {
            Ok(existing) if existing.iter().any(|u| u.email == new_user.email) => {
                warn!(email = %new_user.email, "create rejected: e-mail already exists");
                self.toasts.error("E-mail already exists");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "failed to scan users before insert");
                self.toasts.error("Failed to create user");
                return;
            }
        }

        view.submitting = true;
        match self.store.insert(new_user) {
            Ok(id) => {
                info!(id, "user created");
                self.toasts.success("User created successfully");
                self.users.invalidate();
                self.redirect = Some(PendingRedirect {
                    to: Route::List,
                    scope: self.scope,
                    at: Instant::now() + self.redirect_delay,
                });
            }
            Err(e) => {
                error!(error = %e, "failed to create user");
                view.submitting = false;
                self.toasts.error("Failed to create user");
            }
        }
    }

    fn submit_edit(&mut self) {
        let Screen::Edit { id, view, .. } = &mut self.screen else {
            return;
        };
        let id = *id;
        let Some(changes) = validated(view) else {
            return;
        };

        match self.store.update(id, UserChanges::from(changes)) {
            Ok(()) => {
                info!(id, "user updated");
                self.toasts.success("User updated successfully");
                self.users.invalidate();
            }
            Err(e) => {
                error!(id, error = %e, "failed to update user");
                self.toasts.error("Failed to update user");
            }
        }
    }

    /// Block until the user fetch settles and apply it to the mounted list.
    pub fn wait_for_users(&mut self) {
        self.users.wait();
        self.sync_list();
    }

    fn sync_list(&mut self) {
        let users = self.users.visible();
        if let Screen::List(view) = &mut self.screen {
            view.sync_with(users);
        }
    }
}

/// Run the form rules; on failure keep the messages on the view.
fn validated(view: &mut FormView) -> Option<NewUser> {
    view.attempted = true;
    match validate(&view.form) {
        Ok(user) => {
            view.errors = Default::default();
            Some(user)
        }
        Err(errors) => {
            warn!(
                fields = ?errors.iter().map(|(f, _)| f.key()).collect::<Vec<_>>(),
                "form rejected"
            );
            view.errors = errors;
            None
        }
    }
}
