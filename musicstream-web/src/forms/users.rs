//! Account and profile forms

use chrono::NaiveDate;
use serde::Deserialize;

use super::{FormErrors, MultipartForm, REQUIRED};
use crate::db::profiles::ProfileUpdate;
use crate::media::UploadedFile;

pub const USERNAME_MAX: usize = 150;
pub const PASSWORD_MIN: usize = 8;
const LOCATION_MAX: usize = 100;
const EMAIL_MAX: usize = 254;
const SIMILARITY_THRESHOLD: f64 = 0.7;

pub const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const PASSWORD_TOO_SHORT: &str =
    "This password is too short. It must contain at least 8 characters.";
pub const PASSWORD_NUMERIC: &str = "This password is entirely numeric.";
pub const PASSWORD_COMMON: &str = "This password is too common.";
pub const PASSWORD_SIMILAR: &str = "The password is too similar to the username.";
pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Passwords rejected outright
const COMMON_PASSWORDS: &[&str] = &[
    "123456", "123456789", "12345678", "password", "qwerty", "qwerty123", "1234567890",
    "1234567", "password1", "password123", "111111", "123123", "abc123", "iloveyou",
    "000000", "1q2w3e4r", "qwertyuiop", "monkey", "dragon", "letmein", "football",
    "baseball", "sunshine", "princess", "welcome", "shadow", "superman", "michael",
    "starwars", "trustno1", "passw0rd", "master", "whatever", "freedom", "computer",
    "internet", "zaq12wsx", "1qaz2wsx", "asdfghjkl", "qazwsxedc", "changeme",
    "administrator", "musiclover", "football1", "iloveyou1", "11111111", "12341234",
    "88888888", "87654321", "abcd1234", "password!", "welcome1",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    /// Everything except username uniqueness, which needs the database
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        let username = self.username.trim();
        let email = self.email.trim();

        errors.check_text("username", username, true, Some(USERNAME_MAX));
        if !username.is_empty() && !is_valid_username(username) {
            errors.add("username", INVALID_USERNAME);
        }

        errors.check_text("email", email, false, Some(EMAIL_MAX));
        if !email.is_empty() && !is_plausible_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        }
        if self.password1.is_empty() || self.password2.is_empty() {
            return errors;
        }

        if self.password1 != self.password2 {
            errors.add("password2", PASSWORD_MISMATCH);
            return errors;
        }

        for message in password_problems(&self.password2, username) {
            errors.add("password2", message);
        }
        errors
    }
}

pub fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Password policy: minimum length, not all digits, not common, not like the username
pub fn password_problems(password: &str, username: &str) -> Vec<&'static str> {
    let mut problems = Vec::new();

    if !username.is_empty() && too_similar(password, username) {
        problems.push(PASSWORD_SIMILAR);
    }
    if password.chars().count() < PASSWORD_MIN {
        problems.push(PASSWORD_TOO_SHORT);
    }
    let lowered = password.trim().to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        problems.push(PASSWORD_COMMON);
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        problems.push(PASSWORD_NUMERIC);
    }

    problems
}

/// Compares against the whole username and each of its word-like parts
fn too_similar(password: &str, username: &str) -> bool {
    let password = password.to_lowercase();
    let username = username.to_lowercase();

    std::iter::once(username.as_str())
        .chain(username.split(|c: char| !c.is_alphanumeric()))
        .filter(|part| !part.is_empty())
        .any(|part| similarity_ratio(&password, part) >= SIMILARITY_THRESHOLD)
}

/// `2 * matches / (len(a) + len(b))`, matches counted from recursively
/// taking the longest common substring on either side
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Longest common substring by dynamic programming over one row
    let mut best = (0usize, 0usize, 0usize);
    let mut prev = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        let mut row = vec![0usize; b.len() + 1];
        for j in 1..=b.len() {
            if a[i - 1] == b[j - 1] {
                row[j] = prev[j - 1] + 1;
                if row[j] > best.2 {
                    best = (i - row[j], j - row[j], row[j]);
                }
            }
        }
        prev = row;
    }

    let (ai, bj, len) = best;
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..ai], &b[..bj]) + matching_chars(&a[ai + len..], &b[bj + len..])
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        errors.check_text("username", self.username.trim(), true, None);
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors
    }
}

#[derive(Debug, Default)]
pub struct ProfileForm {
    pub bio: String,
    pub location: String,
    pub birth_date: String,
    pub profile_image: Option<UploadedFile>,
}

impl ProfileForm {
    pub fn from_multipart(mut form: MultipartForm) -> Self {
        Self {
            bio: form.text("bio"),
            location: form.text("location"),
            birth_date: form.text("birth_date"),
            profile_image: form.take_file("profile_image"),
        }
    }

    pub fn validate(&self) -> Result<ProfileUpdate, FormErrors> {
        let mut errors = FormErrors::new();
        errors.check_text("location", &self.location, false, Some(LOCATION_MAX));
        errors.check_image("profile_image", self.profile_image.as_ref());

        let birth_date = if self.birth_date.is_empty() {
            None
        } else {
            match NaiveDate::parse_from_str(&self.birth_date, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("birth_date", "Enter a valid date.");
                    None
                }
            }
        };

        if errors.is_empty() {
            Ok(ProfileUpdate {
                bio: self.bio.clone(),
                location: self.location.clone(),
                birth_date,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Default)]
pub struct ProfileImageForm {
    pub profile_image: Option<UploadedFile>,
}

impl ProfileImageForm {
    pub fn from_multipart(mut form: MultipartForm) -> Self {
        Self {
            profile_image: form.take_file("profile_image"),
        }
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        match &self.profile_image {
            None => errors.add("profile_image", REQUIRED),
            Some(_) => errors.check_image("profile_image", self.profile_image.as_ref()),
        }
        errors
    }
}
