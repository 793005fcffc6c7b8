//! Parsing of ISO 18013-5 `age_over_NN` data element identifiers.

pub(crate) const AGE_OVER_PREFIX: &str = "age_over_";

/// Parse the age threshold out of an `age_over_NN` identifier.
///
/// The suffix must be two or more decimal digits, with no sign and nothing
/// trailing. Leading zeros are accepted, so `age_over_08` parses to 8.
pub(crate) fn parse_age_over(identifier: &str) -> Option<u32> {
    let digits = identifier.strip_prefix(AGE_OVER_PREFIX)?;
    if digits.len() < 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
