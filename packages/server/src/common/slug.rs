//! Normalization rules behind every identity key in the pipeline.
//!
//! A lead's identity is `normalize(name)|normalize(address)`; a leads file is
//! named after `normalize("query-location")`. Keeping these in one place is
//! what makes "the same business never appears twice" testable.

/// Lowercase, collapse every run of non-alphanumerics to a single `-`, and
/// trim leading/trailing `-`.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Stable identity key for a lead: same business name + address in any
/// casing or punctuation maps to the same key.
pub fn lead_key(name: &str, address: &str) -> String {
    format!("{}|{}", normalize(name), normalize(address))
}

/// File slug for a query + location pair (`plumbers`, `Austin` ->
/// `plumbers-austin`).
pub fn query_slug(query: &str, location: &str) -> String {
    normalize(&format!("{}-{}", query, location))
}

/// Artifact slug for a lead: business name scoped by location.
pub fn lead_slug(name: &str, location: &str) -> String {
    format!("{}-{}", normalize(name), normalize(location))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_punctuation_runs() {
        assert_eq!(normalize("Joe's  Plumbing, LLC."), "joe-s-plumbing-llc");
        assert_eq!(normalize("--A--"), "a");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn lead_key_is_case_and_punctuation_insensitive() {
        let a = lead_key("Joe's Plumbing", "123 Main St, Austin");
        let b = lead_key("JOE'S PLUMBING", "123 Main St., Austin");
        assert_eq!(a, b);
        assert_eq!(a, "joe-s-plumbing|123-main-st-austin");
    }

    #[test]
    fn different_addresses_are_different_keys() {
        assert_ne!(
            lead_key("Joe's Plumbing", "123 Main St"),
            lead_key("Joe's Plumbing", "900 Oak Ave")
        );
    }

    #[test]
    fn query_slug_matches_file_naming() {
        assert_eq!(query_slug("plumbers", "Austin"), "plumbers-austin");
        assert_eq!(query_slug("tax prep", "San Marcos, TX"), "tax-prep-san-marcos-tx");
    }
}
