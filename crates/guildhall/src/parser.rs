use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::dates::parse_date;
use crate::text::{normalize_cell, normalize_whitespace, resolve_url, split_name_role};
use crate::types::{
    CommitteeMembership, Gift, InterestCategory, InterestEntry, MemberSummary, Profile, Register,
    Section,
};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse URL: {0}")]
    UrlParse(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Invalid identifier in link: {0}")]
    InvalidId(String),
}

/// Target of every link in the committee memberships list.
const COMMITTEE_LINK_PREFIX: &str = "mgcommitteedetails.aspx";

const REGISTER_LINK_TEXT: &str = "Register of interests";

const GIFTS_CAPTION: &str = "Gifts of Hospitality";

/// Roles a member can hold on a committee, as written in brackets after the
/// committee's name.
const COMMITTEE_ROLES: [&str; 10] = [
    "Chairman",
    "Chair",
    "Chairwoman",
    "Deputy Chairman",
    "Deputy Chair",
    "Vice-Chairman",
    "Vice Chairman",
    "Vice-Chair",
    "Ex-Officio",
    "Ex-Officio Member",
];

static RE_UID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[?&]UID=(\d+)").expect("invalid regex: member uid"));

static RE_COMMITTEE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[?&]ID=(\d+)").expect("invalid regex: committee id"));

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn parse_query_id(re: &Regex, href: &str) -> Result<u32, ParseError> {
    re.captures(href)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .ok_or_else(|| ParseError::InvalidId(href.to_string()))
}

/// What a bulleted list on a profile page holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Committees,
    Unknown,
}

/// Fingerprints a list by where its first entry links to.
///
/// Profile pages carry several look-alike `ul` blocks (navigation, member
/// links, committees); only the committee list points at committee pages.
pub fn classify_block(list: ElementRef) -> BlockKind {
    let item_sel = Selector::parse("li").unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();

    let first_href = list
        .select(&item_sel)
        .next()
        .and_then(|li| li.select(&link_sel).next())
        .and_then(|a| a.value().attr("href"));

    match first_href {
        Some(href) => {
            let target = href.rsplit('/').next().unwrap_or(href).to_lowercase();
            if target.starts_with(COMMITTEE_LINK_PREFIX) {
                BlockKind::Committees
            } else {
                BlockKind::Unknown
            }
        }
        None => BlockKind::Unknown,
    }
}

pub fn parse_member_index(html: &str, base: &str) -> Result<Vec<MemberSummary>, ParseError> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table.mgStatsTable").unwrap();
    let row_sel = Selector::parse("tbody tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| ParseError::MissingField("member index table".to_string()))?;

    let mut members = Vec::new();

    for row in table.select(&row_sel) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.is_empty() {
            continue;
        }
        let [_photo, member_cell, party_cell, ward_cell, ..] = cells[..] else {
            log::warn!("Skipping index row with {} cell(s)", cells.len());
            continue;
        };

        let Some(link) = member_cell.select(&link_sel).next() else {
            log::warn!(
                "Skipping index row without a member link: '{}'",
                normalize_whitespace(&elem_text(member_cell))
            );
            continue;
        };
        let href = link.value().attr("href").unwrap_or_default();

        let id = match parse_query_id(&RE_UID, href) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Skipping index row: {}", e);
                continue;
            }
        };

        let (name, role) = split_name_role(&normalize_whitespace(&elem_text(link)));

        members.push(MemberSummary {
            id,
            name,
            role,
            party: normalize_whitespace(&elem_text(party_cell)),
            ward: normalize_whitespace(&elem_text(ward_cell)),
            url: resolve_url(href, base),
        });
    }

    Ok(members)
}

pub fn extract_profile(document: &Html) -> Result<Profile, ParseError> {
    let content_heading_sel = Selector::parse(".header-page-content h1").unwrap();
    let heading_sel = Selector::parse("h1").unwrap();
    let sidebar_sel = Selector::parse(".mgUserSideBar p").unwrap();
    let label_sel = Selector::parse(".mgLabel").unwrap();

    let first_heading = |sel: &Selector| {
        document
            .select(sel)
            .map(|e| normalize_whitespace(&elem_text(e)))
            .find(|s| !s.is_empty())
    };

    // Site chrome may carry its own h1 ahead of the page content.
    let raw_name = first_heading(&content_heading_sel)
        .or_else(|| first_heading(&heading_sel))
        .ok_or_else(|| ParseError::MissingField("member name".to_string()))?;
    let (name, role) = split_name_role(&raw_name);

    let mut ward = String::new();
    let mut party = String::new();

    for p in document.select(&sidebar_sel) {
        let text = normalize_whitespace(&elem_text(p));
        let label = p
            .select(&label_sel)
            .next()
            .map(|e| normalize_whitespace(&elem_text(e)))
            .unwrap_or_else(|| text.clone());

        if label.starts_with("Ward:")
            && let Some((_, value)) = text.split_once("Ward:")
        {
            ward = value.trim().to_string();
        } else if label.starts_with("Party:")
            && let Some((_, value)) = text.split_once("Party:")
        {
            party = value.trim().to_string();
        }
    }

    Ok(Profile {
        name,
        role,
        ward,
        party,
    })
}

/// Splits a bracketed committee role off the end of an entry, e.g.
/// `"Finance Committee (Chairman)"` gives `("Finance Committee", "Chairman")`.
fn split_committee_role(text: &str) -> (String, String) {
    let text = text.trim();
    if let Some(rest) = text.strip_suffix(')')
        && let Some(open) = rest.rfind('(')
    {
        let inner = rest[open + 1..].trim();
        if let Some(role) = COMMITTEE_ROLES
            .iter()
            .find(|r| r.eq_ignore_ascii_case(inner))
        {
            return (rest[..open].trim_end().to_string(), role.to_string());
        }
    }
    (text.to_string(), String::new())
}

pub fn extract_committees(
    document: &Html,
    base: &str,
) -> Result<Section<Vec<CommitteeMembership>>, ParseError> {
    let list_sel = Selector::parse("ul").unwrap();
    let item_sel = Selector::parse("li").unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();

    let Some(list) = document
        .select(&list_sel)
        .find(|ul| classify_block(*ul) == BlockKind::Committees)
    else {
        return Ok(Section::Absent);
    };

    let mut committees = Vec::new();

    for item in list.select(&item_sel) {
        let Some(link) = item.select(&link_sel).next() else {
            log::warn!(
                "Committee entry without a link: '{}'",
                normalize_whitespace(&elem_text(item))
            );
            continue;
        };
        let href = link.value().attr("href").unwrap_or_default();
        let id = parse_query_id(&RE_COMMITTEE_ID, href)?;
        let (name, role) = split_committee_role(&normalize_whitespace(&elem_text(item)));

        committees.push(CommitteeMembership {
            id,
            name,
            role,
            url: Some(resolve_url(href, base)),
        });
    }

    Ok(Section::Found(committees))
}

/// The (unresolved) href of the "Register of interests" link, if the member
/// has one.
pub fn find_register_link(document: &Html) -> Section<String> {
    let link_sel = Selector::parse("a[href]").unwrap();

    document
        .select(&link_sel)
        .find(|a| normalize_whitespace(&elem_text(*a)) == REGISTER_LINK_TEXT)
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
        .into()
}

/// Everything the profile page itself tells us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPage {
    pub profile: Profile,
    pub committees: Section<Vec<CommitteeMembership>>,
    /// Absolute URL of the member's register of interests.
    pub register_url: Section<String>,
}

pub fn parse_member_page(html: &str, base: &str) -> Result<MemberPage, ParseError> {
    let document = Html::parse_document(html);

    let profile = extract_profile(&document)?;
    let committees = extract_committees(&document, base)?;
    let register_url = match find_register_link(&document) {
        Section::Found(href) => Section::Found(resolve_url(&href, base)),
        Section::Absent => Section::Absent,
    };

    Ok(MemberPage {
        profile,
        committees,
        register_url,
    })
}

pub fn parse_register(html: &str) -> Result<Register, ParseError> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table.mgInterestsTable").unwrap();
    let caption_sel = Selector::parse("caption").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();

    let mut register = Register::default();

    for table in document.select(&table_sel) {
        let caption = table
            .select(&caption_sel)
            .next()
            .map(|e| normalize_whitespace(&elem_text(e)))
            .ok_or_else(|| ParseError::MissingField("interests table caption".to_string()))?;
        let is_gifts = caption == GIFTS_CAPTION;

        let mut items = Vec::new();

        for row in table.select(&row_sel) {
            let mut cells = row
                .select(&cell_sel)
                .map(|td| normalize_cell(&normalize_whitespace(&elem_text(td))));
            let Some(first) = cells.next() else {
                continue;
            };
            // Some tables only have the member's column.
            let second = cells.next().unwrap_or_default();

            if first.is_empty() && second.is_empty() {
                continue;
            }

            if is_gifts {
                let date = parse_date(&second);
                if date.is_none() && !second.is_empty() {
                    log::debug!("Gift '{}' has no usable date: {:?}", first, second);
                }
                register.gifts.push(Gift {
                    name: first,
                    date_str: second,
                    date,
                });
            } else {
                items.push(InterestEntry {
                    member: first,
                    partner: second,
                });
            }
        }

        if !is_gifts {
            register.interests.push(InterestCategory {
                name: caption,
                items,
            });
        }
    }

    Ok(register)
}
