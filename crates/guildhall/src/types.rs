use std::fmt::Display;

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::text::short_hash;

/// Office a member holds, derived from the suffix on their display name.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Role {
    #[default]
    #[serde(rename = "")]
    Member,
    Alderman,
    Deputy,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Member => write!(f, "Member"),
            Role::Alderman => write!(f, "Alderman"),
            Role::Deputy => write!(f, "Deputy"),
        }
    }
}

/// Outcome of looking for an optional part of a page.
///
/// `Absent` means the page legitimately has no such section. A page that has
/// the section but in a shape we cannot read is a [`crate::ParseError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section<T> {
    Found(T),
    Absent,
}

impl<T> Section<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Section::Found(value) => Some(value),
            Section::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for Section<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Section::Found(value),
            None => Section::Absent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Meta {
    pub time_created: DateTime<Utc>,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            time_created: Utc::now(),
        }
    }
}

/// One row of the member index table, used to seed a member's document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSummary {
    pub id: u32,
    pub name: String,
    pub role: Role,
    pub party: String,
    pub ward: String,
    pub url: String,
}

impl Display for MemberSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.id, self.name)?;
        if self.role != Role::Member {
            write!(f, " ({})", self.role)?;
        }
        if !self.ward.is_empty() {
            write!(f, " · {}", self.ward)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Member {
    pub id: u32,
    pub url: String,
    pub name: String,
    pub role: Role,
    pub ward: String,
    pub party: String,
}

impl From<&Member> for MemberSummary {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            name: member.name.clone(),
            role: member.role,
            party: member.party.clone(),
            ward: member.ward.clone(),
            url: member.url.clone(),
        }
    }
}

/// What the profile page says about a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub role: Role,
    pub ward: String,
    pub party: String,
}

/// A member's seat on a committee. `role` is the member's role on that
/// committee (e.g. "Chairman"), empty for an ordinary seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommitteeMembership {
    pub id: u32,
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A declaration row: what the member declared, and what they declared for
/// their partner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InterestEntry {
    pub member: String,
    pub partner: String,
}

/// All declarations filed under one category (one table on the register page).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InterestCategory {
    pub name: String,
    pub items: Vec<InterestEntry>,
}

impl InterestCategory {
    pub fn id(&self) -> String {
        short_hash(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Gift {
    pub name: String,
    pub date_str: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Register {
    pub interests: Vec<InterestCategory>,
    pub gifts: Vec<Gift>,
}

/// Everything extracted for one member; written to `members/<id>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MemberDocument {
    pub meta: Meta,
    pub member: Member,
    #[serde(default)]
    pub committees: Vec<CommitteeMembership>,
    #[serde(default)]
    pub interests: Vec<InterestCategory>,
    #[serde(default)]
    pub gifts: Vec<Gift>,
}

impl Display for MemberDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = &self.member;
        writeln!(f, "┌─ #{} ─ {} ─ {}", m.id, m.name, m.role)?;
        if !m.ward.is_empty() {
            writeln!(f, "│  Ward: {}", m.ward)?;
        }
        if !m.party.is_empty() {
            writeln!(f, "│  Party: {}", m.party)?;
        }
        writeln!(f, "│  Profile: {}", m.url)?;
        writeln!(
            f,
            "└─ {} committee(s), {} interest category(ies), {} gift(s)",
            self.committees.len(),
            self.interests.len(),
            self.gifts.len()
        )?;

        for committee in &self.committees {
            write!(f, "  ▸ {} [{}]", committee.name, committee.id)?;
            if !committee.role.is_empty() {
                write!(f, " · {}", committee.role)?;
            }
            writeln!(f)?;
        }
        for category in &self.interests {
            writeln!(f, "  ── {} ({})", category.name, category.items.len())?;
            for item in &category.items {
                writeln!(f, "    member: {} | partner: {}", item.member, item.partner)?;
            }
        }
        for gift in &self.gifts {
            match gift.date {
                Some(date) => writeln!(f, "  ✦ {} ({})", gift.name, date)?,
                None => writeln!(f, "  ✦ {} ({:?}, undated)", gift.name, gift.date_str)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MemberEntry {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Ward {
    pub id: String,
    pub name: String,
}

impl Ward {
    pub fn named(name: &str) -> Self {
        Self {
            id: short_hash(name),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Committee {
    pub id: u32,
    pub name: String,
}

/// `members.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MembersDocument {
    pub meta: Meta,
    pub members: Vec<MemberEntry>,
}

/// `wards.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WardsDocument {
    pub meta: Meta,
    pub wards: Vec<Ward>,
}

/// `committees.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommitteesDocument {
    pub meta: Meta,
    pub committees: Vec<Committee>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_to_register_strings() {
        assert_eq!(serde_json::to_string(&Role::Member).unwrap(), "\"\"");
        assert_eq!(serde_json::to_string(&Role::Alderman).unwrap(), "\"Alderman\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"Deputy\"").unwrap(),
            Role::Deputy
        );
    }

    #[test]
    fn test_gift_date_serializes_as_iso_or_null() {
        let dated = Gift {
            name: "Theatre tickets".into(),
            date_str: "3 Jan 2021".into(),
            date: NaiveDate::from_ymd_opt(2021, 1, 3),
        };
        let undated = Gift {
            name: "Lunch".into(),
            date_str: "March".into(),
            date: None,
        };
        let dated = serde_json::to_value(&dated).unwrap();
        let undated = serde_json::to_value(&undated).unwrap();
        assert_eq!(dated["date"], "2021-01-03");
        assert!(undated["date"].is_null());
    }

    #[test]
    fn test_committee_url_is_optional_in_documents() {
        let json = r#"{"id": 5, "name": "Finance Committee", "role": "Chairman"}"#;
        let committee: CommitteeMembership = serde_json::from_str(json).unwrap();
        assert_eq!(committee.url, None);
        assert!(!serde_json::to_string(&committee).unwrap().contains("url"));
    }

    #[test]
    fn test_section_from_option() {
        assert_eq!(Section::from(Some(3)), Section::Found(3));
        assert_eq!(Section::<u8>::from(None), Section::Absent);
        assert_eq!(Section::Found("Aldgate").found(), Some("Aldgate"));
    }

    #[test]
    fn test_ward_id_is_name_hash() {
        assert_eq!(Ward::named("Aldgate").id, short_hash("Aldgate"));
    }
}
