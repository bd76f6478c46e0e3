use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::store::{COMMITTEES_FILE, DocumentStore, MEMBERS_FILE, StoreError, WARDS_FILE};
use crate::types::{
    Committee, CommitteesDocument, MemberDocument, MemberEntry, MembersDocument, Meta, Ward,
    WardsDocument,
};

/// The cross-member views derived from a set of member documents.
///
/// Every list is sorted, so the result depends only on the set of documents,
/// not on the order they were read in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub members: Vec<MemberEntry>,
    pub wards: Vec<Ward>,
    pub committees: Vec<Committee>,
}

impl Aggregation {
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a MemberDocument>) -> Self {
        let mut members = BTreeMap::new();
        let mut wards = BTreeSet::new();
        let mut committees = BTreeSet::new();

        for doc in documents {
            members.insert(doc.member.id, doc.member.name.clone());

            if !doc.member.ward.is_empty() {
                wards.insert(doc.member.ward.clone());
            }

            for committee in &doc.committees {
                committees.insert((committee.id, committee.name.clone()));
            }
        }

        Self {
            members: members
                .into_iter()
                .map(|(id, name)| MemberEntry { id, name })
                .collect(),
            wards: wards.iter().map(|name| Ward::named(name)).collect(),
            committees: committees
                .into_iter()
                .map(|(id, name)| Committee { id, name })
                .collect(),
        }
    }

    pub fn members_document(&self, meta: &Meta) -> MembersDocument {
        MembersDocument {
            meta: meta.clone(),
            members: self.members.clone(),
        }
    }

    pub fn wards_document(&self, meta: &Meta) -> WardsDocument {
        WardsDocument {
            meta: meta.clone(),
            wards: self.wards.clone(),
        }
    }

    pub fn committees_document(&self, meta: &Meta) -> CommitteesDocument {
        CommitteesDocument {
            meta: meta.clone(),
            committees: self.committees.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AggregateReport {
    pub members: usize,
    pub wards: usize,
    pub committees: usize,
    /// Member documents left out because they could not be read.
    pub rejected: Vec<PathBuf>,
}

impl std::fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nSummaries:")?;
        writeln!(f, "  Members:    {}", self.members)?;
        writeln!(f, "  Wards:      {}", self.wards)?;
        writeln!(f, "  Committees: {}", self.committees)?;
        if !self.rejected.is_empty() {
            writeln!(f, "  Rejected documents:")?;
            for path in &self.rejected {
                writeln!(f, "    {}", path.display())?;
            }
        }
        Ok(())
    }
}

/// Reads every member document in `store` and writes `members.json`,
/// `wards.json` and `committees.json` stamped with `meta`.
pub fn aggregate(store: &DocumentStore, meta: &Meta) -> Result<AggregateReport, StoreError> {
    log::info!("Aggregating member documents in {}...", store.root().display());

    let loaded = store.read_members()?;
    let aggregation = Aggregation::from_documents(&loaded.documents);

    store.write_summary(MEMBERS_FILE, &aggregation.members_document(meta))?;
    store.write_summary(WARDS_FILE, &aggregation.wards_document(meta))?;
    store.write_summary(COMMITTEES_FILE, &aggregation.committees_document(meta))?;

    let report = AggregateReport {
        members: aggregation.members.len(),
        wards: aggregation.wards.len(),
        committees: aggregation.committees.len(),
        rejected: loaded.rejected.into_iter().map(|(path, _)| path).collect(),
    };

    log::info!(
        "Wrote summaries for {} member(s), {} ward(s), {} committee(s)",
        report.members,
        report.wards,
        report.committees
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommitteeMembership, Member, Role};
    use chrono::{TimeZone, Utc};
    use std::fs;

    fn document(id: u32, name: &str, ward: &str, committees: &[(u32, &str, &str)]) -> MemberDocument {
        MemberDocument {
            meta: Meta::now(),
            member: Member {
                id,
                url: format!("http://democracy.cityoflondon.gov.uk/mgUserInfo.aspx?UID={id}"),
                name: name.to_string(),
                role: Role::Member,
                ward: ward.to_string(),
                party: String::new(),
            },
            committees: committees
                .iter()
                .map(|(id, name, role)| CommitteeMembership {
                    id: *id,
                    name: name.to_string(),
                    role: role.to_string(),
                    url: None,
                })
                .collect(),
            interests: Vec::new(),
            gifts: Vec::new(),
        }
    }

    fn fixed_meta() -> Meta {
        Meta {
            time_created: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        }
    }

    fn sample() -> Vec<MemberDocument> {
        vec![
            document(515, "Bob Jones", "Aldgate", &[(5, "Finance Committee", "Chairman")]),
            document(
                292,
                "John Smith",
                "Farringdon Within",
                &[(5, "Finance Committee", ""), (171, "Planning Committee", "")],
            ),
            document(1101, "Ann Lee", "Aldgate", &[]),
            document(42, "Cat Ng", "", &[(171, "Planning Committee", "Deputy Chairman")]),
        ]
    }

    #[test]
    fn test_roster_is_sorted_by_id() {
        let aggregation = Aggregation::from_documents(&sample());
        let ids: Vec<u32> = aggregation.members.iter().map(|m| m.id).collect();
        assert_eq!(ids, [42, 292, 515, 1101]);
    }

    #[test]
    fn test_wards_are_distinct_sorted_and_non_empty() {
        let aggregation = Aggregation::from_documents(&sample());
        let names: Vec<&str> = aggregation.wards.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["Aldgate", "Farringdon Within"]);
    }

    #[test]
    fn test_wards_are_case_sensitive() {
        let docs = [
            document(1, "A", "Cheap", &[]),
            document(2, "B", "cheap", &[]),
        ];
        let aggregation = Aggregation::from_documents(&docs);
        assert_eq!(aggregation.wards.len(), 2);
    }

    #[test]
    fn test_committees_are_deduplicated_by_id_and_name() {
        let aggregation = Aggregation::from_documents(&sample());
        assert_eq!(
            aggregation.committees,
            [
                Committee {
                    id: 5,
                    name: "Finance Committee".into()
                },
                Committee {
                    id: 171,
                    name: "Planning Committee".into()
                },
            ]
        );
    }

    #[test]
    fn test_aggregation_ignores_input_order() {
        let docs = sample();
        let mut reversed = docs.clone();
        reversed.reverse();
        assert_eq!(
            Aggregation::from_documents(&docs),
            Aggregation::from_documents(&reversed)
        );
    }

    #[test]
    fn test_aggregate_twice_is_byte_identical() {
        let dir = tempfile::tempdir().expect("failed creating tempdir");
        let store = DocumentStore::new(dir.path());
        for doc in sample() {
            store.write_member(&doc).unwrap();
        }

        let read_all = || {
            [MEMBERS_FILE, WARDS_FILE, COMMITTEES_FILE]
                .map(|f| fs::read(dir.path().join(f)).expect("summary should exist"))
        };

        aggregate(&store, &fixed_meta()).expect("first aggregation");
        let first = read_all();
        aggregate(&store, &fixed_meta()).expect("second aggregation");
        let second = read_all();

        assert_eq!(first, second);
    }

    #[test]
    fn test_aggregate_skips_malformed_documents() {
        let dir = tempfile::tempdir().expect("failed creating tempdir");
        let store = DocumentStore::new(dir.path());
        for doc in sample() {
            store.write_member(&doc).unwrap();
        }
        fs::write(store.members_dir().join("999.json"), r#"{"member": {"id": 999}}"#).unwrap();

        let report = aggregate(&store, &fixed_meta()).expect("aggregation should succeed");

        assert_eq!(report.members, 4);
        assert_eq!(report.wards, 2);
        assert_eq!(report.committees, 2);
        assert_eq!(report.rejected, [store.members_dir().join("999.json")]);
    }

    #[test]
    fn test_summary_document_shapes() {
        let dir = tempfile::tempdir().expect("failed creating tempdir");
        let store = DocumentStore::new(dir.path());
        for doc in sample() {
            store.write_member(&doc).unwrap();
        }
        aggregate(&store, &fixed_meta()).unwrap();

        let wards: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(WARDS_FILE)).unwrap())
                .unwrap();
        assert_eq!(wards["meta"]["time_created"], "2024-05-01T09:30:00Z");
        assert_eq!(wards["wards"][0]["name"], "Aldgate");
        assert_eq!(wards["wards"][0]["id"].as_str().map(str::len), Some(8));

        let members: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(MEMBERS_FILE)).unwrap())
                .unwrap();
        assert_eq!(members["members"][0], serde_json::json!({"id": 42, "name": "Cat Ng"}));
    }
}
