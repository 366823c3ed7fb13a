use validator::ValidateEmail;

pub const MAX_PROJECT_NAME_LEN: usize = 100;
pub const MAX_USER_ID_LEN: usize = 100;
pub const MAX_API_KEY_NAME_LEN: usize = 100;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Normalizes a project name, returning `None` when it is unusable.
/// Rules:
/// - Surrounding whitespace is trimmed
/// - 1-100 characters after trimming
/// - No control characters
pub fn normalize_project_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_PROJECT_NAME_LEN {
        return None;
    }
    if name.chars().any(|c| c.is_control()) {
        return None;
    }
    Some(name.to_string())
}

/// The caller-supplied end-user id is free text; only its length is checked.
pub fn is_valid_user_id(user_id: &str) -> bool {
    !user_id.trim().is_empty() && user_id.chars().count() <= MAX_USER_ID_LEN
}
