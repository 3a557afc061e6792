//! Validation helpers for DTOs.

use std::collections::BTreeMap;

use validator::ValidationError;

use crate::state::question::normalize;

/// Letters a bank question may offer.
pub const QUESTION_LETTERS: [&str; 5] = ["A", "B", "C", "D", "E"];
/// Letters a challenge sub-question may offer.
pub const CHALLENGE_LETTERS: [&str; 4] = ["A", "B", "C", "D"];

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Rejects empty or whitespace-only text.
pub fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(error("blank", "Value must not be blank".into()));
    }
    Ok(())
}

/// Validates that `letter` is one of the option letters A to E, ignoring case and spaces.
///
/// ```ignore
/// validate_option_letter(" b ") // Ok
/// validate_option_letter("F")   // Err
/// ```
pub fn validate_option_letter(letter: &str) -> Result<(), ValidationError> {
    let normalized = normalize(letter);
    if !QUESTION_LETTERS.contains(&normalized.as_str()) {
        return Err(error(
            "option_letter",
            format!("Option letter must be one of A-E (got `{}`)", letter.trim()),
        ));
    }
    Ok(())
}

/// Validates an option map and its correct letter.
///
/// Every key must be one of `allowed`, each letter in `required` must carry
/// text, and `correct` must name an option with text.
pub fn validate_answer_options(
    options: &BTreeMap<String, String>,
    correct: &str,
    allowed: &[&str],
    required: &[&str],
) -> Result<(), ValidationError> {
    let normalized = options
        .iter()
        .map(|(letter, text)| (normalize(letter), text.trim()))
        .collect::<BTreeMap<_, _>>();

    if let Some(letter) = normalized
        .keys()
        .find(|letter| !allowed.contains(&letter.as_str()))
    {
        return Err(error(
            "option_letter",
            format!("Unexpected option letter `{letter}`"),
        ));
    }

    for letter in required {
        if normalized.get(*letter).is_none_or(|text| text.is_empty()) {
            return Err(error(
                "option_missing",
                format!("Option {letter} must have text"),
            ));
        }
    }

    let correct = normalize(correct);
    if normalized.get(&correct).is_none_or(|text| text.is_empty()) {
        return Err(error(
            "correct_answer",
            format!("Correct answer `{correct}` does not name an option with text"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(letter, text)| (letter.to_string(), text.to_string()))
            .collect()
    }

    #[test]
    fn option_letters_are_normalized() {
        assert!(validate_option_letter(" b ").is_ok());
        assert!(validate_option_letter("e").is_ok());
        assert!(validate_option_letter("F").is_err());
        assert!(validate_option_letter("").is_err());
    }

    #[test]
    fn challenge_options_need_a_and_b() {
        let valid = options(&[("A", "one"), ("b", "two"), ("C", "")]);
        assert!(validate_answer_options(&valid, "b", &CHALLENGE_LETTERS, &["A", "B"]).is_ok());

        let missing_b = options(&[("A", "one"), ("B", "  ")]);
        let err = validate_answer_options(&missing_b, "A", &CHALLENGE_LETTERS, &["A", "B"])
            .unwrap_err();
        assert_eq!(err.code, "option_missing");
    }

    #[test]
    fn correct_letter_must_name_filled_option() {
        let opts = options(&[("A", "one"), ("B", "two"), ("C", "")]);
        let err =
            validate_answer_options(&opts, "C", &CHALLENGE_LETTERS, &["A", "B"]).unwrap_err();
        assert_eq!(err.code, "correct_answer");
    }

    #[test]
    fn letters_outside_range_are_rejected() {
        let opts = options(&[("A", "one"), ("B", "two"), ("E", "five")]);
        let err =
            validate_answer_options(&opts, "A", &CHALLENGE_LETTERS, &["A", "B"]).unwrap_err();
        assert_eq!(err.code, "option_letter");
    }
}
