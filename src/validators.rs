/// Input validators for account and task payloads
///
/// Every validator returns the normalized (trimmed) value on success.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;
use crate::models::{NewTask, TaskQuery, TaskUpdate};

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_EMAIL_LOCAL_PART: usize = 64;
const MAX_USERNAME_LENGTH: usize = 64;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 64;
const MAX_TITLE_LENGTH: usize = 255;
const MAX_DESCRIPTION_LENGTH: usize = 1000;
const MAX_SEARCH_LENGTH: usize = 255;
const MAX_PAGE_SIZE: i64 = 100;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address
/// - Checks length constraints
/// - Checks format using RFC 5322 simplified regex
/// - Rejects an oversized local part
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    if let Some((local_part, _)) = trimmed.split_once('@') {
        if local_part.len() > MAX_EMAIL_LOCAL_PART {
            return Err(ValidationError::SuspiciousContent("email"));
        }
    }

    Ok(trimmed.to_string())
}

/// Validates a username: 1 to 64 characters, no control characters
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username"));
    }

    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username", MAX_USERNAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("username"));
    }

    Ok(trimmed.to_string())
}

/// Validates password length. The password is not trimmed.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    // bcrypt only looks at the first 72 bytes
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

fn is_valid_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("title"));
    }

    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong("title", MAX_TITLE_LENGTH));
    }

    Ok(trimmed.to_string())
}

fn is_valid_description(description: &str) -> Result<String, ValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong("description", MAX_DESCRIPTION_LENGTH));
    }
    Ok(description.to_string())
}

pub fn validate_new_task(task: NewTask) -> Result<NewTask, ValidationError> {
    Ok(NewTask {
        title: is_valid_title(&task.title)?,
        description: task.description.as_deref().map(is_valid_description).transpose()?,
        ..task
    })
}

pub fn validate_task_update(update: TaskUpdate) -> Result<TaskUpdate, ValidationError> {
    Ok(TaskUpdate {
        title: update.title.as_deref().map(is_valid_title).transpose()?,
        description: update.description.as_deref().map(is_valid_description).transpose()?,
        ..update
    })
}

pub fn validate_task_query(query: TaskQuery) -> Result<TaskQuery, ValidationError> {
    if !(1..=MAX_PAGE_SIZE).contains(&query.limit) {
        return Err(ValidationError::OutOfRange("limit"));
    }

    if query.offset < 0 {
        return Err(ValidationError::OutOfRange("offset"));
    }

    if let Some(search) = &query.search {
        if search.chars().count() > MAX_SEARCH_LENGTH {
            return Err(ValidationError::TooLong("search", MAX_SEARCH_LENGTH));
        }
    }

    let search = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(TaskQuery { search, ..query })
}
