//! Form rules for creating and editing users.
//!
//! [`validate`] is a pure function: it never touches the store, so it runs
//! before any write and can be exercised on its own.
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::store::NewUser;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

/// Raw values as typed into the create/edit form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl UserForm {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::PasswordConfirmation => &self.password_confirmation,
        }
    }

    pub fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::PasswordConfirmation => &mut self.password_confirmation,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Email,
    Password,
    PasswordConfirmation,
}

impl Field {
    /// Form order.
    pub const ALL: [Field; 4] = [
        Field::Name,
        Field::Email,
        Field::Password,
        Field::PasswordConfirmation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "E-mail",
            Field::Password => "Password",
            Field::PasswordConfirmation => "Password Confirmation",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Password => "password",
            Field::PasswordConfirmation => "password_confirmation",
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(self, Field::Password | Field::PasswordConfirmation)
    }

    pub fn next(self) -> Field {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Field {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// First rule a field broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    Required,
    InvalidFormat,
    TooShort,
    Mismatch,
}

impl Violation {
    pub fn message(self, field: Field) -> &'static str {
        match (field, self) {
            (Field::Name, _) => "Name is required",
            (Field::Email, Violation::InvalidFormat) => "E-mail is invalid",
            (Field::Email, _) => "E-mail is required",
            (Field::Password, Violation::TooShort) => "Password must be at least 6 characters",
            (Field::Password, _) => "Password is required",
            (Field::PasswordConfirmation, _) => "Passwords must match",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, Violation>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<Violation> {
        self.0.get(&field).copied()
    }

    pub fn message(&self, field: Field) -> Option<&'static str> {
        self.get(field).map(|v| v.message(field))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, Violation)> + '_ {
        self.0.iter().map(|(f, v)| (*f, *v))
    }

    fn insert(&mut self, field: Field, violation: Violation) {
        self.0.entry(field).or_insert(violation);
    }
}

pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// Check every rule against `form`, returning the record to store or the
/// first violation per field.
pub fn validate(form: &UserForm) -> Result<NewUser, FieldErrors> {
    let mut errors = FieldErrors::default();

    if form.name.trim().is_empty() {
        errors.insert(Field::Name, Violation::Required);
    }

    if form.email.is_empty() {
        errors.insert(Field::Email, Violation::Required);
    } else if !is_valid_email(&form.email) {
        errors.insert(Field::Email, Violation::InvalidFormat);
    }

    if form.password.is_empty() {
        errors.insert(Field::Password, Violation::Required);
    } else if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(Field::Password, Violation::TooShort);
    }

    if form.password_confirmation != form.password {
        errors.insert(Field::PasswordConfirmation, Violation::Mismatch);
    }

    if errors.is_empty() {
        Ok(NewUser {
            name: form.name.clone(),
            email: form.email.clone(),
            password: form.password.clone(),
        })
    } else {
        Err(errors)
    }
}
