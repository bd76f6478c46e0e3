//! Small, pure helpers for tidying the text we pull out of register pages.

use reqwest::Url;
use sha1::{Digest, Sha1};

use crate::parser::ParseError;
use crate::types::Role;

/// Cell values that mean "nothing declared".
const EMPTY_SENTINELS: [&str; 4] = ["nil", "none", "n/a", "-"];

const ALDERMAN_SUFFIX: &str = "(Alderman)";
const DEPUTY_SUFFIX: &str = ", Deputy";

/// Collapses every run of whitespace (including `&nbsp;`) to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trims a table cell and maps the "no value" placeholders to empty text.
///
/// Normalizing an already normalized value returns it unchanged.
pub fn normalize_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    if EMPTY_SENTINELS
        .iter()
        .any(|s| trimmed.eq_ignore_ascii_case(s))
    {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Splits a display name such as `"Jane Doe (Alderman)"` into the bare name and
/// the role its suffix denotes.
pub fn split_name_role(raw_name: &str) -> (String, Role) {
    let name = raw_name.trim();

    if let Some(stripped) = name.strip_suffix(ALDERMAN_SUFFIX) {
        (stripped.trim_end().to_string(), Role::Alderman)
    } else if let Some(stripped) = name.strip_suffix(DEPUTY_SUFFIX) {
        (stripped.trim_end().to_string(), Role::Deputy)
    } else {
        (name.to_string(), Role::Member)
    }
}

/// The index page's location with its final path segment, query and fragment
/// removed, e.g. `http://host/dir/page.aspx?x=1` becomes `http://host/dir`.
pub fn base_url(index_url: &str) -> Result<String, ParseError> {
    let mut url = Url::parse(index_url)
        .map_err(|e| ParseError::UrlParse(format!("{index_url}: {e}")))?;
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| ParseError::UrlParse(format!("{index_url}: cannot be a base")))?
        .pop();

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Makes `href` absolute against `base` (as produced by [`base_url`]).
pub fn resolve_url(href: &str, base: &str) -> String {
    let href = href.trim();
    if Url::parse(href).is_ok() {
        return href.to_string();
    }

    // The trailing slash keeps the base's last segment as a directory.
    let dir = format!("{}/", base.trim_end_matches('/'));
    match Url::parse(&dir).and_then(|base| base.join(href)) {
        Ok(joined) => joined.to_string(),
        Err(_) => format!("{}{}", dir, href),
    }
}

/// Identifier for entities that only exist as a name (wards, interest
/// categories): the first 8 hex digits of the name's SHA-1.
///
/// The relational loader derives the same value, so both sides agree on
/// identity for a given name.
pub fn short_hash(name: &str) -> String {
    let digest = Sha1::digest(name.as_bytes());
    format!("{digest:x}")[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://democracy.cityoflondon.gov.uk";

    #[test]
    fn test_normalize_cell_sentinels() {
        for raw in ["nil", "NIL", " Nil ", "none", "None", "n/a", "N/A", "-", "  -  "] {
            assert_eq!(normalize_cell(raw), "", "'{}' should normalize to empty", raw);
        }
    }

    #[test]
    fn test_normalize_cell_keeps_values() {
        assert_eq!(normalize_cell("  Director, Acme Ltd "), "Director, Acme Ltd");
        assert_eq!(normalize_cell("Nile Trading"), "Nile Trading");
        assert_eq!(normalize_cell("--"), "--");
        assert_eq!(normalize_cell(""), "");
    }

    #[test]
    fn test_normalize_cell_is_idempotent() {
        for raw in ["nil", " Shareholder ", "-", "N/A ", "x"] {
            let once = normalize_cell(raw);
            assert_eq!(normalize_cell(&once), once);
        }
    }

    #[test]
    fn test_split_name_role() {
        assert_eq!(
            split_name_role("Jane Doe (Alderman)"),
            ("Jane Doe".to_string(), Role::Alderman)
        );
        assert_eq!(
            split_name_role("John Smith, Deputy"),
            ("John Smith".to_string(), Role::Deputy)
        );
        assert_eq!(
            split_name_role("  Ann Lee "),
            ("Ann Lee".to_string(), Role::Member)
        );
    }

    #[test]
    fn test_split_name_role_strips_suffix_text_not_length() {
        assert_eq!(
            split_name_role("Sir Christopher Longname-Smythe (Alderman)").0,
            "Sir Christopher Longname-Smythe"
        );
        assert_eq!(split_name_role("Al Li (Alderman)").0, "Al Li");
        assert_eq!(split_name_role("Bo,Deputy").1, Role::Member);
    }

    #[test]
    fn test_base_url() {
        assert_eq!(
            base_url("http://democracy.cityoflondon.gov.uk/mgMemberIndex.aspx?VW=TABLE&PIC=1&FN=")
                .unwrap(),
            BASE
        );
        assert_eq!(
            base_url("https://example.org/council/mgMemberIndex.aspx").unwrap(),
            "https://example.org/council"
        );
        assert!(base_url("not a url").is_err());
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("mgRofI.aspx?UID=292&FID=-1", BASE),
            "http://democracy.cityoflondon.gov.uk/mgRofI.aspx?UID=292&FID=-1"
        );
        assert_eq!(
            resolve_url("https://other.example/x.aspx", BASE),
            "https://other.example/x.aspx"
        );
        assert_eq!(
            resolve_url("/mgCommitteeDetails.aspx?ID=5", "https://example.org/council"),
            "https://example.org/mgCommitteeDetails.aspx?ID=5"
        );
    }

    #[test]
    fn test_resolve_url_normalizes_dot_segments() {
        let base = "https://example.org/council/members";
        assert_eq!(
            resolve_url("../mgCommitteeDetails.aspx?ID=5", base),
            "https://example.org/council/mgCommitteeDetails.aspx?ID=5"
        );
        assert_eq!(
            resolve_url("./mgUserInfo.aspx?UID=1", base),
            "https://example.org/council/members/mgUserInfo.aspx?UID=1"
        );
    }

    #[test]
    fn test_short_hash_is_stable() {
        let first = short_hash("Land and Property");
        let second = short_hash("Land and Property");
        assert_eq!(first, second);
        assert_eq!(first.len(), 8);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, short_hash("Land and property"));
    }

    #[test]
    fn test_short_hash_known_value() {
        // sha1("abc") = a9993e36...
        assert_eq!(short_hash("abc"), "a9993e36");
    }
}
