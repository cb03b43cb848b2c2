//! Normalization of free-form identifiers coming from requests and seed files

/// Report and observation categories
pub const CATEGORIES: [&str; 5] = ["traffic", "construction", "event", "music", "other"];

/// Normalize a zone identifier: `z3`, `Z3`, `3` and `Z003` all become `Z03`
///
/// Identifiers that do not follow the `Z<number>` scheme are upper-cased
/// and otherwise kept, so custom seed files still work.
pub fn zone_id(raw: &str) -> String {
    let value = raw.trim().to_uppercase();
    let digits = value.strip_prefix('Z').unwrap_or(&value);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = digits.parse::<u32>() {
            return format!("Z{:02}", n);
        }
    }
    value
}

/// Normalize a category label, mapping legacy aliases
pub fn category(raw: &str) -> String {
    let value = raw.trim().to_lowercase();
    match value.as_str() {
        "nightlife" => "music".to_string(),
        "general" => "other".to_string(),
        _ => value,
    }
}

/// Whether a normalized category is one of [`CATEGORIES`]
pub fn is_known_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

/// Normalize free text for equality comparison
pub fn description(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Next sequential identifier for `prefix`
///
/// Takes the largest numeric suffix among `existing` ids that carry the
/// prefix followed only by digits and adds one. Ids with another scheme
/// (e.g. `REP00001` when the prefix is `R`) are ignored.
pub fn next_sequential_id<'a, I>(existing: I, prefix: &str, width: usize) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing
        .into_iter()
        .filter_map(|id| id.trim().strip_prefix(prefix))
        .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|rest| rest.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{:0width$}", prefix, max + 1, width = width)
}
