//! Email and social-handle extraction from raw page HTML.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MAILTO_RE: Regex = Regex::new(r#"(?i)mailto:([^\s"'<>?#,]+)"#).unwrap();
    static ref EMAIL_RE: Regex =
        Regex::new(r"\b[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}\b").unwrap();
    static ref SOCIAL_RES: Vec<(&'static str, Regex)> = vec![
        ("instagram", Regex::new(r"(?i)instagram\.com/([\w.]+)").unwrap()),
        ("facebook", Regex::new(r"(?i)facebook\.com/([\w.]+)").unwrap()),
        ("linkedin", Regex::new(r"(?i)linkedin\.com/(?:company|in)/([\w\-]+)").unwrap()),
        ("tiktok", Regex::new(r"(?i)tiktok\.com/@([\w.]+)").unwrap()),
    ];
}

/// All distinct addresses on the page, mailto links first, lowercased, with
/// obvious junk (example domains, image filenames the pattern overmatches)
/// filtered out.
pub fn extract_emails(html: &str) -> Vec<String> {
    let mut seen = Vec::new();
    let candidates = MAILTO_RE
        .captures_iter(html)
        .map(|c| c[1].to_lowercase())
        .chain(EMAIL_RE.find_iter(html).map(|m| m.as_str().to_lowercase()));
    for email in candidates {
        if email.contains("example.") || email.contains(".png") || email.contains(".jpg") {
            continue;
        }
        if !seen.contains(&email) {
            seen.push(email);
        }
    }
    seen
}

/// First handle per network, rebuilt as a canonical profile URL.
pub fn extract_socials(html: &str) -> BTreeMap<String, String> {
    let mut socials = BTreeMap::new();
    for (network, re) in SOCIAL_RES.iter() {
        if let Some(captures) = re.captures(html) {
            socials.insert(
                network.to_string(),
                format!("https://{}.com/{}", network, &captures[1]),
            );
        }
    }
    socials
}
