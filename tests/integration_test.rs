// Integration tests for user-panel: full screen flows against real stores

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use user_panel::app::update::handle_key;
use user_panel::app::{AppOptions, AppState, Route, Screen, ToastKind};
use user_panel::store::{
    FileStore, MemoryStore, NewUser, StoreError, StoreResult, User, UserChanges, UserStore,
};

fn tmp_path(tag: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    let n = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    p.push(format!("user_panel_it_{tag}_{}_{}", std::process::id(), n));
    p.push("users.json");
    p
}

fn new_user(name: &str, email: &str, password: &str) -> NewUser {
    NewUser {
        name: name.into(),
        email: email.into(),
        password: password.into(),
    }
}

fn app_with(store: Arc<dyn UserStore>) -> AppState {
    let options = AppOptions {
        redirect_delay: Duration::from_millis(500),
        ..AppOptions::default()
    };
    let mut app = AppState::new(store, options);
    app.navigate(Route::List);
    app.wait_for_users();
    app
}

fn press(app: &mut AppState, code: KeyCode) {
    handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
}

fn type_str(app: &mut AppState, s: &str) {
    for c in s.chars() {
        press(app, KeyCode::Char(c));
    }
}

/// Fill the create form field by field (Name, E-mail, Password, Confirmation).
fn fill_form(app: &mut AppState, name: &str, email: &str, password: &str, confirmation: &str) {
    for (i, value) in [name, email, password, confirmation].iter().enumerate() {
        if i > 0 {
            press(app, KeyCode::Tab);
        }
        type_str(app, value);
    }
}

/// Counts writes so tests can prove nothing reached the table.
struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    fn new(inner: MemoryStore) -> Self {
        Self { inner, writes: AtomicUsize::new(0) }
    }
    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl UserStore for CountingStore {
    fn list(&self) -> StoreResult<Vec<User>> {
        self.inner.list()
    }
    fn get(&self, id: u64) -> StoreResult<Option<User>> {
        self.inner.get(id)
    }
    fn insert(&self, user: NewUser) -> StoreResult<u64> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(user)
    }
    fn update(&self, id: u64, changes: UserChanges) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, changes)
    }
    fn bulk_delete(&self, ids: &[u64]) -> StoreResult<usize> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.bulk_delete(ids)
    }
}

/// Reads work, every write fails.
struct ReadOnlyStore(MemoryStore);

impl UserStore for ReadOnlyStore {
    fn list(&self) -> StoreResult<Vec<User>> {
        self.0.list()
    }
    fn get(&self, id: u64) -> StoreResult<Option<User>> {
        self.0.get(id)
    }
    fn insert(&self, _user: NewUser) -> StoreResult<u64> {
        Err(StoreError::Io(std::io::Error::other("read-only")))
    }
    fn update(&self, _id: u64, _changes: UserChanges) -> StoreResult<()> {
        Err(StoreError::Io(std::io::Error::other("read-only")))
    }
    fn bulk_delete(&self, _ids: &[u64]) -> StoreResult<usize> {
        Err(StoreError::Io(std::io::Error::other("read-only")))
    }
}

/// Lists successfully once, then every scan fails.
struct FlakyStore {
    inner: MemoryStore,
    lists: AtomicUsize,
}

impl UserStore for FlakyStore {
    fn list(&self) -> StoreResult<Vec<User>> {
        if self.lists.fetch_add(1, Ordering::SeqCst) == 0 {
            self.inner.list()
        } else {
            Err(StoreError::Io(std::io::Error::other("denied")))
        }
    }
    fn get(&self, id: u64) -> StoreResult<Option<User>> {
        self.inner.get(id)
    }
    fn insert(&self, user: NewUser) -> StoreResult<u64> {
        self.inner.insert(user)
    }
    fn update(&self, id: u64, changes: UserChanges) -> StoreResult<()> {
        self.inner.update(id, changes)
    }
    fn bulk_delete(&self, ids: &[u64]) -> StoreResult<usize> {
        self.inner.bulk_delete(ids)
    }
}

/// Scans work, point reads fail.
struct UnreadableRecordStore(MemoryStore);

impl UserStore for UnreadableRecordStore {
    fn list(&self) -> StoreResult<Vec<User>> {
        self.0.list()
    }
    fn get(&self, _id: u64) -> StoreResult<Option<User>> {
        Err(StoreError::Io(std::io::Error::other("unreadable")))
    }
    fn insert(&self, user: NewUser) -> StoreResult<u64> {
        self.0.insert(user)
    }
    fn update(&self, id: u64, changes: UserChanges) -> StoreResult<()> {
        self.0.update(id, changes)
    }
    fn bulk_delete(&self, ids: &[u64]) -> StoreResult<usize> {
        self.0.bulk_delete(ids)
    }
}

// 1) Create through the form, land back on the list, see the new row
#[test]
fn create_then_list_shows_new_user_with_fresh_id() {
    let path = tmp_path("create");
    let store = Arc::new(FileStore::open(&path).unwrap());
    store.insert(new_user("Existing", "old@example.com", "secret1")).unwrap();
    let mut app = app_with(store.clone());

    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.route, Route::Create);
    fill_form(&mut app, "Ann Lee", "ann@example.com", "hunter22", "hunter22");
    press(&mut app, KeyCode::Enter);

    assert!(app.toasts.contains(ToastKind::Success, "User created successfully"));
    assert!(app.form_view().unwrap().submitting);
    // redirect waits for its delay
    app.tick(Instant::now());
    assert_eq!(app.route, Route::Create);

    app.tick(Instant::now() + Duration::from_secs(1));
    assert_eq!(app.route, Route::List);
    app.wait_for_users();

    let users = app.visible_users();
    assert_eq!(users.len(), 2);
    let ann = users.iter().find(|u| u.email == "ann@example.com").unwrap();
    assert_eq!(ann.name, "Ann Lee");
    assert_eq!(ann.password, "hunter22");
    assert_ne!(ann.id, users[0].id);

    // durable across reopen
    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.list().unwrap().len(), 2);
    std::fs::remove_dir_all(path.parent().unwrap()).ok();
}

// 2) Validation blocks the store
#[test]
fn missing_name_never_reaches_the_store() {
    let store = Arc::new(CountingStore::new(MemoryStore::new()));
    let mut app = app_with(store.clone());
    app.navigate(Route::Create);

    fill_form(&mut app, "", "ann@example.com", "hunter22", "hunter22");
    press(&mut app, KeyCode::Enter);

    let view = app.form_view().unwrap();
    assert_eq!(view.errors.message(user_panel::validation::Field::Name), Some("Name is required"));
    assert_eq!(store.writes(), 0);
    assert!(app.redirect.is_none());
}

#[test]
fn mismatched_confirmation_is_flagged_and_clears_once_fixed() {
    use user_panel::validation::Field;
    let mut app = app_with(Arc::new(MemoryStore::new()));
    app.navigate(Route::Create);

    fill_form(&mut app, "Ann", "ann@example.com", "hunter22", "hunter2");
    press(&mut app, KeyCode::Enter);
    assert_eq!(
        app.form_view().unwrap().errors.message(Field::PasswordConfirmation),
        Some("Passwords must match")
    );

    // focus is still on the confirmation field; typing re-validates
    type_str(&mut app, "2");
    assert!(app.form_view().unwrap().errors.is_empty());
}

// 3) Duplicate e-mail
#[test]
fn duplicate_email_is_rejected_before_insert() {
    let store = Arc::new(MemoryStore::with_users([new_user("A", "a@example.com", "secret1")]));
    let mut app = app_with(store.clone());
    app.navigate(Route::Create);

    fill_form(&mut app, "Other", "a@example.com", "secret22", "secret22");
    press(&mut app, KeyCode::Enter);

    assert!(app.toasts.contains(ToastKind::Error, "E-mail already exists"));
    assert_eq!(store.list().unwrap().len(), 1);
    assert!(app.redirect.is_none());
    assert_eq!(app.route, Route::Create);
}

// 4) Select all + bulk delete
#[test]
fn select_all_then_delete_empties_table_and_selection() {
    let store = Arc::new(MemoryStore::with_users([
        new_user("A", "a@example.com", "secret1"),
        new_user("B", "b@example.com", "secret1"),
        new_user("C", "c@example.com", "secret1"),
    ]));
    let mut app = app_with(store.clone());

    press(&mut app, KeyCode::Char('a'));
    let view = app.list_view().unwrap();
    assert!(view.all_selected(app.visible_users()));

    press(&mut app, KeyCode::Char('d'));
    assert!(app.toasts.contains(ToastKind::Success, "Users deleted successfully"));
    assert!(app.list_view().unwrap().selected.is_empty());
    assert!(app.users.is_fetching());

    app.wait_for_users();
    assert!(app.visible_users().is_empty());
    assert!(store.list().unwrap().is_empty());
    // nothing left to select
    assert!(!app.list_view().unwrap().all_selected(app.visible_users()));
}

#[test]
fn single_selection_toggles_and_select_all_clears() {
    let store = Arc::new(MemoryStore::with_users([
        new_user("A", "a@example.com", "secret1"),
        new_user("B", "b@example.com", "secret1"),
    ]));
    let mut app = app_with(store.clone());

    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Char(' '));
    assert_eq!(app.list_view().unwrap().selected.iter().copied().collect::<Vec<_>>(), vec![2]);
    press(&mut app, KeyCode::Up);
    press(&mut app, KeyCode::Char(' '));
    assert!(app.list_view().unwrap().all_selected(app.visible_users()));

    // all selected: toggling select-all clears
    press(&mut app, KeyCode::Char('a'));
    assert!(app.list_view().unwrap().selected.is_empty());

    press(&mut app, KeyCode::Delete);
    assert!(app.toasts.contains(ToastKind::Info, "No users selected"));
    assert_eq!(store.list().unwrap().len(), 2);
}

#[test]
fn failed_bulk_delete_keeps_selection() {
    let store = Arc::new(ReadOnlyStore(MemoryStore::with_users([new_user("A", "a@example.com", "secret1")])));
    let mut app = app_with(store);

    press(&mut app, KeyCode::Char('a'));
    press(&mut app, KeyCode::Char('d'));
    assert!(app.toasts.contains(ToastKind::Error, "Failed to delete users"));
    assert_eq!(app.list_view().unwrap().selected.len(), 1);
}

#[test]
fn failure_screen_hides_rows_from_selection_and_delete() {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::with_users([
            new_user("A", "a@example.com", "secret1"),
            new_user("B", "b@example.com", "secret1"),
            new_user("C", "c@example.com", "secret1"),
        ]),
        lists: AtomicUsize::new(0),
    });
    let mut app = app_with(store.clone());
    press(&mut app, KeyCode::Char('a'));
    assert_eq!(app.list_view().unwrap().selected.len(), 3);

    press(&mut app, KeyCode::Char('r'));
    app.wait_for_users();
    assert!(app.users.error().is_some());
    assert!(app.visible_users().is_empty());
    assert!(app.list_view().unwrap().selected.is_empty());

    press(&mut app, KeyCode::Char('a'));
    press(&mut app, KeyCode::Char('d'));
    assert!(app.toasts.contains(ToastKind::Info, "No users selected"));
    assert_eq!(store.inner.list().unwrap().len(), 3);

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.route, Route::List);
}

// 5) Edit
#[test]
fn editing_name_only_keeps_email_and_password() {
    let store = Arc::new(MemoryStore::with_users([new_user("Ann", "ann@example.com", "p@ss-wörd")]));
    let mut app = app_with(store.clone());

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.route, Route::Edit(1));
    for _ in 0.."Ann".len() {
        press(&mut app, KeyCode::Backspace);
    }
    type_str(&mut app, "Annabel");
    press(&mut app, KeyCode::Enter);

    assert!(app.toasts.contains(ToastKind::Success, "User updated successfully"));
    let stored = store.get(1).unwrap().unwrap();
    assert_eq!(stored.name, "Annabel");
    assert_eq!(stored.email, "ann@example.com");
    assert_eq!(stored.password.as_bytes(), "p@ss-wörd".as_bytes());
    // edit stays on its screen
    assert_eq!(app.route, Route::Edit(1));
}

#[test]
fn create_then_edit_prefills_stored_values() {
    let store = Arc::new(MemoryStore::new());
    let mut app = app_with(store.clone());
    app.navigate(Route::Create);
    fill_form(&mut app, "Bo", "bo@example.com", "abcdef", "abcdef");
    press(&mut app, KeyCode::Enter);
    let id = store.list().unwrap()[0].id;

    app.navigate(Route::Edit(id));
    let form = &app.form_view().unwrap().form;
    assert_eq!(form.name, "Bo");
    assert_eq!(form.email, "bo@example.com");
    assert_eq!(form.password, "abcdef");
    assert_eq!(form.password_confirmation, "abcdef");
}

#[test]
fn edit_unknown_id_reports_and_update_fails() {
    let mut app = app_with(Arc::new(MemoryStore::new()));
    app.navigate(Route::Edit(77));
    assert!(app.toasts.contains(ToastKind::Error, "User not found"));
    assert!(matches!(app.screen, Screen::Edit { found: false, .. }));

    fill_form(&mut app, "Ghost", "ghost@example.com", "secret1", "secret1");
    press(&mut app, KeyCode::Enter);
    assert!(app.toasts.contains(ToastKind::Error, "Failed to update user"));
}

#[test]
fn invalid_edit_never_reaches_the_store() {
    let store = Arc::new(CountingStore::new(MemoryStore::with_users([new_user(
        "Ann",
        "ann@example.com",
        "secret1",
    )])));
    let mut app = app_with(store.clone());
    press(&mut app, KeyCode::Char('e'));
    assert_eq!(app.route, Route::Edit(1));

    press(&mut app, KeyCode::Tab);
    for _ in 0.."ann@example.com".len() {
        press(&mut app, KeyCode::Backspace);
    }
    press(&mut app, KeyCode::Enter);

    let view = app.form_view().unwrap();
    assert_eq!(view.errors.message(user_panel::validation::Field::Email), Some("E-mail is required"));
    assert_eq!(store.writes(), 0);
    assert_eq!(store.get(1).unwrap().unwrap().email, "ann@example.com");
}

#[test]
fn unreadable_record_reports_load_failure() {
    let store = Arc::new(UnreadableRecordStore(MemoryStore::with_users([new_user(
        "Ann",
        "ann@example.com",
        "secret1",
    )])));
    let mut app = app_with(store);
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.route, Route::Edit(1));
    assert!(app.toasts.contains(ToastKind::Error, "Failed to load user"));
    assert!(matches!(app.screen, Screen::Edit { found: false, .. }));
    assert!(app.form_view().unwrap().form.name.is_empty());
}

// 6) Failures surface, no redirect
#[test]
fn failed_insert_is_visible_and_stays_on_create() {
    let mut app = app_with(Arc::new(ReadOnlyStore(MemoryStore::new())));
    app.navigate(Route::Create);
    fill_form(&mut app, "Ann", "ann@example.com", "secret1", "secret1");
    press(&mut app, KeyCode::Enter);

    assert!(app.toasts.contains(ToastKind::Error, "Failed to create user"));
    assert!(!app.form_view().unwrap().submitting);
    assert!(app.redirect.is_none());
    app.tick(Instant::now() + Duration::from_secs(5));
    assert_eq!(app.route, Route::Create);
}

// 7) Deferred redirect is bound to the screen that scheduled it
#[test]
fn leaving_create_cancels_pending_redirect() {
    let mut app = app_with(Arc::new(MemoryStore::new()));
    app.navigate(Route::Create);
    fill_form(&mut app, "Ann", "ann@example.com", "secret1", "secret1");
    press(&mut app, KeyCode::Enter);
    assert!(app.redirect.is_some());

    app.navigate(Route::Edit(1));
    app.tick(Instant::now() + Duration::from_secs(5));
    assert!(app.redirect.is_none());
    assert_eq!(app.route, Route::Edit(1));
}

#[test]
fn escape_returns_to_list_and_reuses_fresh_snapshot() {
    let store = Arc::new(MemoryStore::with_users([new_user("A", "a@example.com", "secret1")]));
    let mut app = app_with(store.clone());
    app.navigate(Route::Create);
    press(&mut app, KeyCode::Esc);

    assert_eq!(app.route, Route::List);
    // snapshot is within the freshness window: no new fetch on remount
    assert!(!app.users.is_fetching());
    assert_eq!(app.visible_users().len(), 1);

    // a row added behind the cache only shows after an explicit refresh
    store.insert(new_user("B", "b@example.com", "secret1")).unwrap();
    press(&mut app, KeyCode::Char('r'));
    assert!(app.users.is_fetching());
    app.wait_for_users();
    assert_eq!(app.visible_users().len(), 2);
}

#[test]
fn quit_key_sets_flag() {
    let mut app = app_with(Arc::new(MemoryStore::new()));
    press(&mut app, KeyCode::Char('q'));
    assert!(app.should_quit);
}
