/// Trimmed value, or `None` when absent or blank.
pub fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

/// Cart quantity from a form field. Anything that is not a positive integer
/// becomes 1.
pub fn parse_quantity(raw: Option<&str>) -> u32 {
    non_empty(raw)
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|quantity| *quantity >= 1)
        .unwrap_or(1)
}
