//! Property-based tests using proptest.
//!
//! These tests verify invariants that should hold for any valid input.

use proptest::prelude::*;

use rejs::crypto::{compute_field_aad, decrypt_field, encrypt_field, generate_key};
use rejs::validation::{
    normalize_phone, normalize_postal_code, validate_pesel, PeselError, PESEL_WEIGHTS,
};

// ============================================================================
// Custom Strategies
// ============================================================================

/// Eleven digits with a correct check digit.
fn arb_valid_pesel() -> impl Strategy<Value = String> {
    prop::collection::vec(0u32..10, 10).prop_map(|digits| {
        let sum: u32 = digits
            .iter()
            .zip(PESEL_WEIGHTS)
            .map(|(d, w)| d * w)
            .sum();
        let check = (10 - sum % 10) % 10;
        digits
            .iter()
            .chain(std::iter::once(&check))
            .map(|d| char::from_digit(*d, 10).unwrap_or('0'))
            .collect()
    })
}

/// Nine digits interleaved with the separators people type.
fn arb_phone_input() -> impl Strategy<Value = (String, String)> {
    (
        prop::collection::vec(0u32..10, 9),
        prop::collection::vec(prop_oneof![Just(""), Just(" "), Just("-"), Just("  ")], 9),
    )
        .prop_map(|(digits, separators)| {
            let digits: String = digits
                .iter()
                .map(|d| char::from_digit(*d, 10).unwrap_or('0'))
                .collect();
            let typed: String = digits
                .chars()
                .zip(separators)
                .map(|(c, sep)| format!("{c}{sep}"))
                .collect();
            (typed, digits)
        })
}

// ============================================================================
// PESEL
// ============================================================================

proptest! {
    #[test]
    fn valid_pesel_is_accepted(pesel in arb_valid_pesel()) {
        prop_assert_eq!(validate_pesel(&pesel), Ok(pesel.clone()));
    }

    #[test]
    fn spaced_pesel_normalizes(pesel in arb_valid_pesel()) {
        let spaced = format!(" {} {}-{} ", &pesel[..3], &pesel[3..6], &pesel[6..]);
        prop_assert_eq!(validate_pesel(&spaced), Ok(pesel));
    }

    /// Every weight is coprime with 10, so any single-digit change breaks the checksum.
    #[test]
    fn single_digit_corruption_is_detected(
        pesel in arb_valid_pesel(),
        position in 0usize..11,
        delta in 1u32..10,
    ) {
        let mut digits: Vec<u32> = pesel.chars().filter_map(|c| c.to_digit(10)).collect();
        digits[position] = (digits[position] + delta) % 10;
        let corrupted: String = digits
            .iter()
            .map(|d| char::from_digit(*d, 10).unwrap_or('0'))
            .collect();
        prop_assert_eq!(validate_pesel(&corrupted), Err(PeselError::InvalidChecksum));
    }

    #[test]
    fn wrong_length_is_rejected(digits in "[0-9]{1,10}|[0-9]{12,20}") {
        prop_assert_eq!(validate_pesel(&digits), Err(PeselError::InvalidLength));
    }

    #[test]
    fn letters_are_rejected(prefix in "[0-9]{10}", letter in "[a-zA-Z]") {
        let input = format!("{prefix}{letter}");
        prop_assert_eq!(validate_pesel(&input), Err(PeselError::NonDigit));
    }
}

// ============================================================================
// Contact details
// ============================================================================

proptest! {
    #[test]
    fn phone_keeps_only_digits((typed, digits) in arb_phone_input()) {
        let normalized = normalize_phone(&typed).unwrap();
        prop_assert_eq!(normalized, format!("+48{digits}"));
    }

    #[test]
    fn phone_with_wrong_digit_count_is_rejected(digits in "[0-9]{0,8}|[0-9]{10,15}") {
        prop_assert!(normalize_phone(&digits).is_err());
    }

    #[test]
    fn bare_postal_code_gets_dash(code in "[0-9]{5}") {
        let normalized = normalize_postal_code(&code).unwrap();
        prop_assert_eq!(normalized, format!("{}-{}", &code[..2], &code[2..]));
    }

    #[test]
    fn postal_code_is_idempotent(code in "[0-9]{2}-[0-9]{3}") {
        let once = normalize_postal_code(&code).unwrap();
        prop_assert_eq!(normalize_postal_code(&once).unwrap(), code);
    }

    #[test]
    fn malformed_postal_code_is_rejected(code in "[0-9]{1,4}|[0-9]{6,8}|[a-z]{2}-[0-9]{3}") {
        prop_assert!(normalize_postal_code(&code).is_err());
    }
}

// ============================================================================
// Field encryption
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn ciphertext_is_bound_to_its_row(
        plaintext in "[0-9A-Z]{1,50}",
        row in 1i64..10_000,
        other_row in 1i64..10_000,
    ) {
        prop_assume!(row != other_row);
        let key = generate_key();
        let aad = compute_field_aad("sensitive_data", row, "document_number");
        let ciphertext = encrypt_field(&key, &aad, plaintext.as_bytes()).unwrap();

        prop_assert_eq!(decrypt_field(&key, &aad, &ciphertext).unwrap(), plaintext.as_bytes());

        let moved = compute_field_aad("sensitive_data", other_row, "document_number");
        prop_assert!(decrypt_field(&key, &moved, &ciphertext).is_err());
    }
}
