//! Canonical form of display labels used inside storage keys.

/// Normalize a display label into an index key.
///
/// Every `.` and `,` is removed, and every `/`, ASCII whitespace character
/// and `-` is replaced by `_`. Each character is handled on its own, so runs
/// of separators are not collapsed. Case is preserved.
///
/// Labels that differ only in punctuation or separators map to the same
/// key and therefore address the same stored report.
///
/// # Examples
///
/// ```
/// use pollen_store::normalize;
///
/// assert_eq!(normalize("region-a"), "region_a");
/// assert_eq!(normalize("Region A"), "Region_A");
/// assert_eq!(normalize("Rhein.-Main"), "Rhein_Main");
/// ```
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '.' | ','))
        .map(|c| match c {
            '/' | '-' => '_',
            c if c.is_ascii_whitespace() => '_',
            c => c,
        })
        .collect()
}
