use crate::types::{MemberSummary, Role};

/// Narrows the member index before crawling.
#[derive(Debug, Default)]
pub struct SeedFilter {
    pub ward: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SeedFilter {
    pub fn apply(self, mut seeds: Vec<MemberSummary>) -> Vec<MemberSummary> {
        if let Some(ward) = &self.ward {
            seeds.retain(|s| s.ward.eq_ignore_ascii_case(ward));
        }
        if let Some(off) = self.offset {
            seeds = seeds.into_iter().skip(off).collect();
        }
        if let Some(lim) = self.limit {
            seeds.truncate(lim);
        }
        seeds
    }

    pub fn validate(self) -> Result<Self, String> {
        if self.limit.is_some_and(|l| l == 0) {
            return Err("Limit must be greater than 0".to_string());
        }
        if self.ward.as_deref().is_some_and(|w| w.trim().is_empty()) {
            return Err("Ward must not be blank".to_string());
        }
        Ok(self)
    }
}

#[derive(Debug)]
pub struct RosterStats {
    pub aldermen: usize,
    pub deputies: usize,
    pub members: usize,
    pub total: usize,
}

impl RosterStats {
    pub fn from_roster(roster: &[MemberSummary]) -> RosterStats {
        let count = |role: Role| roster.iter().filter(|m| m.role == role).count();
        RosterStats {
            aldermen: count(Role::Alderman),
            deputies: count(Role::Deputy),
            members: count(Role::Member),
            total: roster.len(),
        }
    }
}

impl std::fmt::Display for RosterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Aldermen:           {}", self.aldermen)?;
        writeln!(f, "  Deputies:           {}", self.deputies)?;
        writeln!(f, "  Common Councillors: {}", self.members)?;
        writeln!(f, "  Total:              {}", self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(id: u32, role: Role, ward: &str) -> MemberSummary {
        MemberSummary {
            id,
            name: format!("Member {id}"),
            role,
            party: String::new(),
            ward: ward.to_string(),
            url: format!("http://democracy.cityoflondon.gov.uk/mgUserInfo.aspx?UID={id}"),
        }
    }

    fn roster() -> Vec<MemberSummary> {
        vec![
            seed(1, Role::Alderman, "Aldgate"),
            seed(2, Role::Deputy, "Cheap"),
            seed(3, Role::Member, "Aldgate"),
            seed(4, Role::Member, "Bassishaw"),
        ]
    }

    #[test]
    fn test_filter_by_ward_then_paginate() {
        let filter = SeedFilter {
            ward: Some("aldgate".into()),
            limit: Some(1),
            offset: Some(1),
        };
        let ids: Vec<u32> = filter.apply(roster()).iter().map(|s| s.id).collect();
        assert_eq!(ids, [3]);
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        assert_eq!(SeedFilter::default().apply(roster()).len(), 4);
    }

    #[test]
    fn test_validate_rejects_zero_limit_and_blank_ward() {
        let zero_limit = SeedFilter {
            limit: Some(0),
            ..Default::default()
        };
        let blank_ward = SeedFilter {
            ward: Some("  ".into()),
            ..Default::default()
        };
        assert!(zero_limit.validate().is_err());
        assert!(blank_ward.validate().is_err());
        assert!(SeedFilter::default().validate().is_ok());
    }

    #[test]
    fn test_zero_offset_skips_nothing() {
        let filter = SeedFilter {
            offset: Some(0),
            ..Default::default()
        }
        .validate()
        .expect("Offset 0 is valid");
        assert_eq!(filter.apply(roster()).len(), 4);
    }

    #[test]
    fn test_roster_stats() {
        let stats = RosterStats::from_roster(&roster());
        assert_eq!(stats.aldermen, 1);
        assert_eq!(stats.deputies, 1);
        assert_eq!(stats.members, 2);
        assert_eq!(stats.total, 4);
    }
}
