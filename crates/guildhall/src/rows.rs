//! Flat, relational view of a set of member documents, in the shape the
//! database loader inserts.
//!
//! Members, wards, committees and interest categories are keyed and upserted.
//! Memberships, interests and gifts have no natural key: the loader deletes a
//! member's rows and reinserts them, so they are emitted per member in
//! document order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{MemberDocument, Role, Ward};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MemberRow {
    pub id: u32,
    pub name: String,
    pub role: Role,
    pub party: String,
    pub ward: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommitteeRow {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MembershipRow {
    pub member_id: u32,
    pub committee_id: u32,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
}

/// Which column of the declaration table an interest came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InterestKind {
    Member,
    Partner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InterestRow {
    pub member_id: u32,
    pub category_id: String,
    pub kind: InterestKind,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GiftRow {
    pub member_id: u32,
    pub name: String,
    pub date_str: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RowSet {
    pub members: Vec<MemberRow>,
    pub wards: Vec<Ward>,
    pub committees: Vec<CommitteeRow>,
    pub memberships: Vec<MembershipRow>,
    pub categories: Vec<CategoryRow>,
    pub interests: Vec<InterestRow>,
    pub gifts: Vec<GiftRow>,
}

impl RowSet {
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a MemberDocument>) -> Self {
        let mut documents: Vec<&MemberDocument> = documents.into_iter().collect();
        documents.sort_by_key(|doc| doc.member.id);

        let mut rows = RowSet::default();
        let mut wards = BTreeMap::new();
        let mut committees = BTreeMap::new();
        let mut categories = BTreeMap::new();

        for doc in documents {
            let member = &doc.member;
            rows.members.push(MemberRow {
                id: member.id,
                name: member.name.clone(),
                role: member.role,
                party: member.party.clone(),
                ward: member.ward.clone(),
                url: member.url.clone(),
            });

            if !member.ward.is_empty() {
                wards
                    .entry(member.ward.clone())
                    .or_insert_with(|| Ward::named(&member.ward));
            }

            for committee in &doc.committees {
                // Committees are keyed by id; the first name seen for an id wins.
                let row = committees
                    .entry(committee.id)
                    .or_insert_with(|| CommitteeRow {
                        id: committee.id,
                        name: committee.name.clone(),
                        url: None,
                    });
                if row.name != committee.name {
                    log::debug!(
                        "Committee {} also listed as {:?}; keeping {:?}",
                        committee.id,
                        committee.name,
                        row.name
                    );
                }
                if row.url.is_none() {
                    row.url = committee.url.clone();
                }

                rows.memberships.push(MembershipRow {
                    member_id: member.id,
                    committee_id: committee.id,
                    role: committee.role.clone(),
                });
            }

            for category in &doc.interests {
                let category_id = categories
                    .entry(category.name.clone())
                    .or_insert_with(|| category.id())
                    .clone();

                for item in &category.items {
                    let columns = [
                        (InterestKind::Member, &item.member),
                        (InterestKind::Partner, &item.partner),
                    ];
                    for (kind, name) in columns {
                        if name.is_empty() {
                            continue;
                        }
                        rows.interests.push(InterestRow {
                            member_id: member.id,
                            category_id: category_id.clone(),
                            kind,
                            name: name.clone(),
                        });
                    }
                }
            }

            rows.gifts.extend(doc.gifts.iter().map(|gift| GiftRow {
                member_id: member.id,
                name: gift.name.clone(),
                date_str: gift.date_str.clone(),
                date: gift.date,
            }));
        }

        rows.wards = wards.into_values().collect();
        rows.committees = committees.into_values().collect();
        rows.categories = categories
            .into_iter()
            .map(|(name, id)| CategoryRow { id, name })
            .collect();

        rows
    }
}

impl std::fmt::Display for RowSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nRows:")?;
        writeln!(f, "  members:             {}", self.members.len())?;
        writeln!(f, "  wards:               {}", self.wards.len())?;
        writeln!(f, "  committees:          {}", self.committees.len())?;
        writeln!(f, "  committee_members:   {}", self.memberships.len())?;
        writeln!(f, "  interest_categories: {}", self.categories.len())?;
        writeln!(f, "  interests:           {}", self.interests.len())?;
        writeln!(f, "  gifts:               {}", self.gifts.len())
    }
}
