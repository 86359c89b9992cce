//! Normalizers for contact details entered on the public forms.

use std::sync::LazyLock;

use regex::Regex;

use super::ValidationError;

/// Country prefix added to every stored phone number.
pub const PHONE_PREFIX: &str = "+48";

static POSTAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-\d{3}$").expect("static regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("static regex")
});

/// Keep only digits, require exactly nine, return `+48XXXXXXXXX`.
pub fn normalize_phone(input: &str) -> Result<String, ValidationError> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 9 {
        return Err(ValidationError::new(
            "Numer telefonu musi zawierać dokładnie 9 cyfr.",
        ));
    }
    Ok(format!("{PHONE_PREFIX}{digits}"))
}

/// Normalize a postal code to `DD-DDD`.
///
/// Five bare digits get the dash inserted after the second digit.
pub fn normalize_postal_code(input: &str) -> Result<String, ValidationError> {
    let mut code: String = input.trim().chars().filter(|c| *c != ' ').collect();

    if code.len() == 5 && code.chars().all(|c| c.is_ascii_digit()) {
        code.insert(2, '-');
    }

    if !POSTAL_CODE_RE.is_match(&code) {
        return Err(ValidationError::new(
            "Kod pocztowy musi mieć format XX-XXX (np. 00-001).",
        ));
    }
    Ok(code)
}

pub fn normalize_email(input: &str) -> Result<String, ValidationError> {
    let email = input.trim();
    if email.is_empty() {
        return Err(ValidationError::required());
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::new("Wprowadź poprawny adres email."));
    }
    Ok(email.to_string())
}

/// Trimmed non-empty text capped at `max_chars`.
pub fn required_text(input: &str, max_chars: usize) -> Result<String, ValidationError> {
    let value = input.trim();
    if value.is_empty() {
        return Err(ValidationError::required());
    }
    if value.chars().count() > max_chars {
        return Err(ValidationError::new(format!(
            "Upewnij się, że ta wartość ma co najwyżej {max_chars} znaków."
        )));
    }
    Ok(value.to_string())
}
