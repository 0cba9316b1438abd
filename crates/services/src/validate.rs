//! Field rules shared by the use-cases. The HTTP layer validates request
//! shapes too, but services never trust their callers.

use domains::{DomainError, Result};

/// Trims `value` and requires `1..=max` characters.
pub fn required(field: &str, value: &str, max: usize) -> Result<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    if v.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(v.to_string())
}

/// Like [`required`] but `None` and blank strings collapse to `None`.
pub fn optional(field: &str, value: Option<String>, max: usize) -> Result<Option<String>> {
    match value {
        Some(v) if !v.trim().is_empty() => required(field, &v, max).map(Some),
        _ => Ok(None),
    }
}

pub fn username(value: &str) -> Result<String> {
    let v = value.trim();
    let len = v.chars().count();
    if !(3..=32).contains(&len) {
        return Err(DomainError::validation("username must be 3 to 32 characters"));
    }
    if !v.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DomainError::validation(
            "username may only contain letters, digits and underscores",
        ));
    }
    Ok(v.to_string())
}

pub fn email(value: &str) -> Result<String> {
    let v = value.trim().to_lowercase();
    let valid = match v.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || v.contains(char::is_whitespace) {
        return Err(DomainError::validation("email is not valid"));
    }
    Ok(v)
}

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn password(value: &str) -> Result<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn positive(field: &str, value: Option<i32>) -> Result<()> {
    match value {
        Some(v) if v <= 0 => Err(DomainError::validation(format!("{field} must be positive"))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_bounds() {
        assert_eq!(required("title", "  Up  ", 10).unwrap(), "Up");
        assert!(required("title", "   ", 10).is_err());
        assert!(required("title", "abcdefghijk", 10).is_err());
    }

    #[test]
    fn optional_collapses_blank() {
        assert_eq!(optional("bio", Some("  ".into()), 5).unwrap(), None);
        assert_eq!(optional("bio", None, 5).unwrap(), None);
        assert_eq!(optional("bio", Some("hi".into()), 5).unwrap(), Some("hi".into()));
    }

    #[test]
    fn username_rules() {
        assert!(username("film_buff_42").is_ok());
        assert!(username("ab").is_err());
        assert!(username("has space").is_err());
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(email(" Ada@Example.COM ").unwrap(), "ada@example.com");
        assert!(email("no-at-sign.com").is_err());
        assert!(email("a@nodot").is_err());
        assert!(email("@example.com").is_err());
    }
}
