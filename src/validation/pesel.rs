//! PESEL (Polish national identification number) validation.

use thiserror::Error;

/// Checksum weights applied to the eleven PESEL digits.
pub const PESEL_WEIGHTS: [u32; 11] = [1, 3, 7, 9, 1, 3, 7, 9, 1, 3, 1];

/// Each failure cause is its own variant; the display text is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeselError {
    #[error("Numer PESEL jest wymagany.")]
    Empty,

    #[error("Numer PESEL musi składać się z dokładnie 11 cyfr.")]
    InvalidLength,

    #[error("Numer PESEL może zawierać tylko cyfry.")]
    NonDigit,

    #[error("Nieprawidłowy numer PESEL - błędna suma kontrolna.")]
    InvalidChecksum,
}

/// Validate a PESEL and return its normalized 11-digit form.
///
/// Surrounding whitespace, inner spaces and dashes are ignored, so
/// `"900 214 01384"` normalizes to `"90021401384"`.
pub fn validate_pesel(input: &str) -> Result<String, PeselError> {
    let trimmed = input.trim();
    // Whitespace-only input counts as missing, not as a short number.
    if trimmed.is_empty() {
        return Err(PeselError::Empty);
    }

    let normalized: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if normalized.chars().count() != 11 {
        return Err(PeselError::InvalidLength);
    }
    if !normalized.chars().all(|c| c.is_ascii_digit()) {
        return Err(PeselError::NonDigit);
    }

    let sum: u32 = normalized
        .bytes()
        .zip(PESEL_WEIGHTS)
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();

    if sum % 10 != 0 {
        return Err(PeselError::InvalidChecksum);
    }

    Ok(normalized)
}
