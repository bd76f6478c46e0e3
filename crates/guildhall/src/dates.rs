//! Turning the free-text dates on gift declarations into calendar dates.
//!
//! Declarations are typed by hand, so the same day shows up as "3 Jan 2021",
//! "3rd January, 2021", "03/01/2021" and so on. We only commit to a date when
//! the text carries an explicit 20xx year: without one any guess at the year
//! would be silently wrong.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";

static RE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)20\d{2}(?:\D|$)").expect("invalid regex: year"));

static RE_ORDINAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("invalid regex: ordinal")
});

static RE_ISO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(20\d{2})-(\d{1,2})-(\d{1,2})\b").expect("invalid regex: iso date")
});

static RE_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](20\d{2})\b").expect("invalid regex: numeric date")
});

static RE_DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(\d{{1,2}})\s+{MONTH}\s+(20\d{{2}})\b"))
        .expect("invalid regex: day month year")
});

static RE_MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b{MONTH}\s+(\d{{1,2}})\s+(20\d{{2}})\b"))
        .expect("invalid regex: month day year")
});

/// Month number for a full or abbreviated English month name.
fn parse_month(month: &str) -> Option<u32> {
    let month = month.trim_end_matches('.').to_lowercase();
    let number = match month.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(number)
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

/// Parses a declaration date, reading numeric dates day-first.
///
/// Returns `None` when there is no explicit 20xx year, when the text has no
/// recognisable day and month, or when the pieces do not form a real date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if !RE_YEAR.is_match(raw) {
        return None;
    }

    let cleaned = RE_ORDINAL.replace_all(raw, "$1").replace(',', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(caps) = RE_ISO.captures(&cleaned) {
        return ymd(&caps[1], caps[2].parse().ok()?, &caps[3]);
    }
    if let Some(caps) = RE_NUMERIC.captures(&cleaned) {
        return ymd(&caps[3], caps[2].parse().ok()?, &caps[1]);
    }
    if let Some(caps) = RE_DAY_MONTH_YEAR.captures(&cleaned) {
        return ymd(&caps[3], parse_month(&caps[2])?, &caps[1]);
    }
    if let Some(caps) = RE_MONTH_DAY_YEAR.captures(&cleaned) {
        return ymd(&caps[3], parse_month(&caps[1])?, &caps[2]);
    }

    log::debug!("No date recognised in {:?}", raw);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_requires_a_20xx_year() {
        assert_eq!(parse_date("12 March"), None);
        assert_eq!(parse_date("3 Jan"), None);
        assert_eq!(parse_date("12/03/19"), None);
        assert_eq!(parse_date("12 March 1999"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("Ref 120190"), None);
    }

    #[test]
    fn test_named_months() {
        let cases = [
            ("12 March 2019", date(2019, 3, 12)),
            ("3 Jan 2021", date(2021, 1, 3)),
            ("3rd January, 2021", date(2021, 1, 3)),
            ("Tuesday 12th Mar 2019", date(2019, 3, 12)),
            ("21 Sept 2018", date(2018, 9, 21)),
            ("1 Dec. 2020", date(2020, 12, 1)),
            ("March 12, 2019", date(2019, 3, 12)),
            ("received on 5 June 2022 at the Mansion House", date(2022, 6, 5)),
        ];
        for (raw, expected) in cases {
            assert_eq!(parse_date(raw), expected, "parsing {:?}", raw);
        }
    }

    #[test]
    fn test_numeric_dates_are_day_first() {
        assert_eq!(parse_date("12/03/2019"), date(2019, 3, 12));
        assert_eq!(parse_date("01.02.2020"), date(2020, 2, 1));
        assert_eq!(parse_date("5-11-2017"), date(2017, 11, 5));
        assert_eq!(parse_date("13/12/2019"), date(2019, 12, 13));
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(parse_date("2019-03-12"), date(2019, 3, 12));
    }

    #[test]
    fn test_unparseable_text_with_year_is_none() {
        assert_eq!(parse_date("Spring 2019"), None);
        assert_eq!(parse_date("sometime in 2019, not sure"), None);
        assert_eq!(parse_date("March 2019"), None);
        assert_eq!(parse_date("31/02/2020"), None);
        assert_eq!(parse_date("12/13/2019"), None);
        assert_eq!(parse_date("45 March 2019"), None);
    }
}
