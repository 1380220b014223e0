//! Peer group resolution
//!
//! A peer group is a borrowed subset of the report table chosen by exactly
//! one rule. Attribute rules key off the focal company's own value, so the
//! focal company always lands in its own group.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dataset::{Dataset, ReportRecord};
use crate::error::{BenchError, Result};

/// Upper bound on a hand-picked peer list
pub const MAX_EXPLICIT_PEERS: usize = 3;

const RULE_KEYS: &str = "all, country, sector, market-cap, employees, rating";

/// How the peer group is chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "names", rename_all = "snake_case")]
pub enum GroupRule {
    AllFirms,
    Country,
    Sector,
    MarketCapTercile,
    EmployeeTercile,
    RatingTercile,
    ExplicitPeers(Vec<String>),
}

impl GroupRule {
    /// Parse a benchmark key as used on the command line and in query strings.
    pub fn parse(key: &str) -> Result<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "all" | "all-firms" => Ok(GroupRule::AllFirms),
            "country" => Ok(GroupRule::Country),
            "sector" | "economic-sector" => Ok(GroupRule::Sector),
            "market-cap" | "market_cap" => Ok(GroupRule::MarketCapTercile),
            "employees" | "emp" => Ok(GroupRule::EmployeeTercile),
            "rating" | "esg-rating" => Ok(GroupRule::RatingTercile),
            _ => Err(BenchError::UnknownOption {
                kind: "benchmark",
                value: key.to_string(),
                expected: RULE_KEYS,
            }),
        }
    }

    /// Stable key, the inverse of [`GroupRule::parse`]
    pub fn key(&self) -> &'static str {
        match self {
            GroupRule::AllFirms => "all",
            GroupRule::Country => "country",
            GroupRule::Sector => "sector",
            GroupRule::MarketCapTercile => "market-cap",
            GroupRule::EmployeeTercile => "employees",
            GroupRule::RatingTercile => "rating",
            GroupRule::ExplicitPeers(_) => "peers",
        }
    }

    /// Human label shown in the sidebar and chart titles
    pub fn label(&self) -> &'static str {
        match self {
            GroupRule::AllFirms => "All Firms",
            GroupRule::Country => "Country",
            GroupRule::Sector => "Economic Sector",
            GroupRule::MarketCapTercile => "Market Cap Tercile",
            GroupRule::EmployeeTercile => "Employee Tercile",
            GroupRule::RatingTercile => "ESG Rating Tercile",
            GroupRule::ExplicitPeers(_) => "Selected Peers",
        }
    }

    fn tercile_of(&self, record: &ReportRecord) -> Option<Option<u8>> {
        match self {
            GroupRule::MarketCapTercile => Some(record.market_cap_tercile),
            GroupRule::EmployeeTercile => Some(record.emp_tercile),
            GroupRule::RatingTercile => Some(record.rating_tercile),
            _ => None,
        }
    }

    fn column_present(&self, dataset: &Dataset) -> bool {
        let columns = dataset.columns();
        match self {
            GroupRule::MarketCapTercile => columns.market_cap_tercile,
            GroupRule::EmployeeTercile => columns.emp_tercile,
            GroupRule::RatingTercile => columns.rating_tercile,
            _ => true,
        }
    }
}

impl fmt::Display for GroupRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Benchmark rules the dataset can actually support, in sidebar order.
pub fn available_rules(dataset: &Dataset) -> Vec<GroupRule> {
    [
        GroupRule::AllFirms,
        GroupRule::Country,
        GroupRule::Sector,
        GroupRule::MarketCapTercile,
        GroupRule::EmployeeTercile,
        GroupRule::RatingTercile,
    ]
    .into_iter()
    .filter(|rule| rule.column_present(dataset))
    .collect()
}

/// The user's current choice: focal company plus the rule that picks peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub focal_name: String,
    pub rule: GroupRule,
}

impl Selection {
    /// A non-empty `peers` list overrides `benchmark`.
    pub fn new(
        focal_name: impl Into<String>,
        benchmark: GroupRule,
        peers: Vec<String>,
    ) -> Result<Self> {
        let rule = if peers.is_empty() {
            benchmark
        } else {
            GroupRule::ExplicitPeers(peers)
        };

        if let GroupRule::ExplicitPeers(names) = &rule {
            if names.len() > MAX_EXPLICIT_PEERS {
                return Err(BenchError::TooManyPeers {
                    max: MAX_EXPLICIT_PEERS,
                    given: names.len(),
                });
            }
        }

        Ok(Self {
            focal_name: focal_name.into(),
            rule,
        })
    }
}

/// Borrowed view of the rows that make up the benchmark
#[derive(Debug, Clone)]
pub struct PeerGroup<'a> {
    pub focal: &'a ReportRecord,
    pub records: Vec<&'a ReportRecord>,
    /// Rule actually applied (after any fallback)
    pub rule: GroupRule,
    pub description: String,
}

impl<'a> PeerGroup<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the focal row itself is part of the group
    pub fn contains_focal(&self) -> bool {
        self.records.iter().any(|r| std::ptr::eq(*r, self.focal))
    }
}

/// Apply the selection's rule to the full table.
pub fn resolve<'a>(dataset: &'a Dataset, selection: &Selection) -> Result<PeerGroup<'a>> {
    let focal = dataset.find(&selection.focal_name)?;

    let mut rule = selection.rule.clone();
    if !rule.column_present(dataset) {
        warn!(
            rule = rule.key(),
            "benchmark column absent from report data, comparing against all firms"
        );
        rule = GroupRule::AllFirms;
    }

    let all = dataset.records().iter();
    let (records, description): (Vec<&ReportRecord>, String) = match &rule {
        GroupRule::AllFirms => (all.collect(), rule.label().to_string()),
        GroupRule::Country => (
            all.filter(|r| matches_text(&focal.country, &r.country))
                .collect(),
            describe(&rule, &focal.country),
        ),
        GroupRule::Sector => (
            all.filter(|r| matches_text(&focal.sector, &r.sector))
                .collect(),
            describe(&rule, &focal.sector),
        ),
        GroupRule::MarketCapTercile | GroupRule::EmployeeTercile | GroupRule::RatingTercile => {
            let key = rule.tercile_of(focal).flatten();
            let shown = key.map(|t| t.to_string()).unwrap_or_default();
            (
                all.filter(|r| key.is_some() && rule.tercile_of(r).flatten() == key)
                    .collect(),
                describe(&rule, &shown),
            )
        }
        GroupRule::ExplicitPeers(names) => (
            all.filter(|r| !r.name.is_empty() && names.iter().any(|n| n == &r.name))
                .collect(),
            describe(&rule, &names.join(", ")),
        ),
    };

    debug!(
        focal = %focal.name,
        rule = rule.key(),
        peers = records.len(),
        "resolved peer group"
    );

    Ok(PeerGroup {
        focal,
        records,
        rule,
        description,
    })
}

/// Missing attribute values never match, not even each other.
fn matches_text(key: &str, value: &str) -> bool {
    !key.is_empty() && key == value
}

fn describe(rule: &GroupRule, value: &str) -> String {
    if value.is_empty() {
        format!("{}: n/a", rule.label())
    } else {
        format!("{}: {}", rule.label(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LoadOptions;

    fn fixture() -> Dataset {
        let raw = "\
name,country,trbceconomicsectorname,pagespdf,market_cap_tercile,emp_tercile
A,France,Energy,15,1,
B,France,Utilities,25,1,2
C,Germany,Energy,40,2,2
D,Spain,Energy,30,3,3
E,Italy,Materials,10,2,1
";
        Dataset::from_reader(raw.as_bytes(), LoadOptions::default()).unwrap()
    }

    fn names(group: &PeerGroup<'_>) -> Vec<String> {
        group.records.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn test_parse_round_trips_keys() {
        for rule in available_rules(&fixture()) {
            assert_eq!(GroupRule::parse(rule.key()).unwrap(), rule);
        }
        assert!(GroupRule::parse("galaxy").is_err());
    }

    #[test]
    fn test_country_rule() {
        let data = fixture();
        let sel = Selection::new("A", GroupRule::Country, vec![]).unwrap();
        let group = resolve(&data, &sel).unwrap();
        assert_eq!(names(&group), vec!["A", "B"]);
        assert_eq!(group.description, "Country: France");
        assert!(group.contains_focal());
    }

    #[test]
    fn test_sector_rule() {
        let data = fixture();
        let sel = Selection::new("C", GroupRule::Sector, vec![]).unwrap();
        let group = resolve(&data, &sel).unwrap();
        assert_eq!(names(&group), vec!["A", "C", "D"]);
        assert_eq!(group.description, "Economic Sector: Energy");
    }

    #[test]
    fn test_tercile_rule() {
        let data = fixture();
        let sel = Selection::new("C", GroupRule::MarketCapTercile, vec![]).unwrap();
        let group = resolve(&data, &sel).unwrap();
        assert_eq!(names(&group), vec!["C", "E"]);
        assert_eq!(group.description, "Market Cap Tercile: 2");
    }

    #[test]
    fn test_blank_focal_tercile_gives_empty_group() {
        let data = fixture();
        let sel = Selection::new("A", GroupRule::EmployeeTercile, vec![]).unwrap();
        let group = resolve(&data, &sel).unwrap();
        assert!(group.is_empty());
        assert_eq!(group.description, "Employee Tercile: n/a");
    }

    #[test]
    fn test_absent_column_falls_back_to_all_firms() {
        let data = fixture();
        let sel = Selection::new("A", GroupRule::RatingTercile, vec![]).unwrap();
        let group = resolve(&data, &sel).unwrap();
        assert_eq!(group.rule, GroupRule::AllFirms);
        assert_eq!(group.len(), data.len());
        assert!(!available_rules(&data).contains(&GroupRule::RatingTercile));
    }

    #[test]
    fn test_explicit_peers_override_rule() {
        let data = fixture();
        let sel = Selection::new("A", GroupRule::Country, vec!["D".into(), "E".into()]).unwrap();
        let group = resolve(&data, &sel).unwrap();
        assert_eq!(names(&group), vec!["D", "E"]);
        assert!(!group.contains_focal());
        assert_eq!(group.description, "Selected Peers: D, E");
    }

    #[test]
    fn test_too_many_peers() {
        let peers = vec!["A".into(), "B".into(), "C".into(), "D".into()];
        let err = Selection::new("A", GroupRule::AllFirms, peers).unwrap_err();
        assert!(matches!(err, BenchError::TooManyPeers { max: 3, given: 4 }));
    }

    #[test]
    fn test_unknown_focal() {
        let data = fixture();
        let sel = Selection::new("Zed", GroupRule::AllFirms, vec![]).unwrap();
        assert!(matches!(
            resolve(&data, &sel),
            Err(BenchError::FocalNotFound(_))
        ));
    }
}
