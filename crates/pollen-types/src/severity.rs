//! Severity codes as published in the pollen feed.
//!
//! The feed encodes pollen load as a short token on a 0-3 scale with
//! half-steps written as ranges (`"1-2"`). Days without data carry an
//! empty token.

/// Translate a severity code into its German description.
///
/// Unknown or empty codes yield an empty string.
///
/// # Examples
///
/// ```
/// use pollen_types::severity::translate;
///
/// assert_eq!(translate("2"), "mittlere Belastung");
/// assert_eq!(translate(""), "");
/// ```
#[must_use]
pub fn translate(code: &str) -> &'static str {
    match code {
        "0" => "keine Belastung",
        "0-1" => "keine bis geringe Belastung",
        "1" => "geringe Belastung",
        "1-2" => "geringe bis mittlere Belastung",
        "2" => "mittlere Belastung",
        "2-3" => "mittlere bis hohe Belastung",
        "3" => "hohe Belastung",
        _ => "",
    }
}
