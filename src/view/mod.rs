//! Benchmark view - one full render pass
//!
//! The view is a pure function of (dataset, selection, chart kind): it
//! resolves the peer group, builds one chart per metric, and tabulates the
//! peers. Nothing is cached between calls; every interaction re-runs it.

pub mod html;

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, warn};

use crate::chart::{self, ChartKind, ChartOptions, ChartSpec, Metric};
use crate::dataset::{Dataset, ReportRecord};
use crate::error::{BenchError, Result};
use crate::peer::{self, GroupRule, PeerGroup, Selection};

pub const PAGE_TITLE: &str = "Sustainability Report Length Benchmark";

/// Direction of the table's page-count sort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn parse(key: &str) -> Result<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            _ => Err(BenchError::UnknownOption {
                kind: "sort order",
                value: key.to_string(),
                expected: "asc, desc",
            }),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewOptions {
    pub chart: ChartOptions,
    pub sort: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocalSummary {
    pub name: String,
    pub country: String,
    pub sector: String,
    pub pages: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<f64>,
    /// False only for hand-picked peer lists that leave the focal company out
    pub in_group: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub name: String,
    pub country: String,
    pub sector: String,
    pub pages: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<f64>,
}

impl TableRow {
    fn from_record(record: &ReportRecord) -> Self {
        Self {
            name: record.name.clone(),
            country: record.country.clone(),
            sector: record.sector.clone(),
            pages: record.pages,
            words: record.words,
        }
    }
}

/// Peer rows restricted to the comparison columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerTable {
    pub columns: Vec<&'static str>,
    pub sort: SortOrder,
    pub rows: Vec<TableRow>,
}

impl PeerTable {
    /// Sorted by page count; rows without a page count always go last.
    pub fn build(records: &[&ReportRecord], include_words: bool, sort: SortOrder) -> Self {
        let mut rows: Vec<TableRow> = records.iter().map(|r| TableRow::from_record(r)).collect();
        rows.sort_by(|a, b| match (a.pages, b.pages) {
            (Some(x), Some(y)) => match sort {
                SortOrder::Ascending => x.total_cmp(&y),
                SortOrder::Descending => y.total_cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        let mut columns = vec!["name", "country", "sector", "pages"];
        if include_words {
            columns.push("words");
        } else {
            rows.iter_mut().for_each(|r| r.words = None);
        }

        Self {
            columns,
            sort,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Everything the dashboard shows for one interaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkView {
    pub title: String,
    pub focal: FocalSummary,
    /// Rule actually applied
    pub rule: GroupRule,
    pub group: String,
    pub peer_count: usize,
    pub chart: ChartKind,
    /// Pages first; words only when the dataset carries that column
    pub panels: Vec<ChartSpec>,
    pub table: PeerTable,
}

impl BenchmarkView {
    pub fn panel(&self, metric: Metric) -> Option<&ChartSpec> {
        self.panels.iter().find(|p| p.metric == metric)
    }
}

/// Run one render pass.
pub fn render(
    dataset: &Dataset,
    selection: &Selection,
    chart: ChartKind,
    options: &ViewOptions,
) -> Result<BenchmarkView> {
    let group = peer::resolve(dataset, selection)?;
    let has_words = dataset.columns().words;

    let mut panels = vec![chart::build(Metric::Pages, chart, &group, &options.chart)];
    if has_words {
        panels.push(chart::build(Metric::Words, chart, &group, &options.chart));
    } else {
        warn!(
            column = Metric::Words.column(),
            "report data has no words column, skipping words chart"
        );
    }

    let view = BenchmarkView {
        title: PAGE_TITLE.to_string(),
        focal: focal_summary(&group),
        rule: group.rule.clone(),
        group: group.description.clone(),
        peer_count: group.len(),
        chart,
        panels,
        table: PeerTable::build(&group.records, has_words, options.sort),
    };

    debug!(
        focal = %view.focal.name,
        group = %view.group,
        chart = chart.key(),
        panels = view.panels.len(),
        "rendered benchmark view"
    );
    Ok(view)
}

fn focal_summary(group: &PeerGroup<'_>) -> FocalSummary {
    let f = group.focal;
    FocalSummary {
        name: f.name.clone(),
        country: f.country.clone(),
        sector: f.sector.clone(),
        pages: f.pages,
        words: f.words,
        in_group: group.contains_focal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LoadOptions;

    fn data(raw: &str) -> Dataset {
        Dataset::from_reader(raw.as_bytes(), LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_table_sorted_ascending_by_pages() {
        let d = data("name,country,trbceconomicsectorname,pagespdf\nA,X,S,30\nB,X,S,10\nC,X,S,20\n");
        let sel = Selection::new("A", GroupRule::AllFirms, vec![]).unwrap();
        let view = render(&d, &sel, ChartKind::Histogram, &ViewOptions::default()).unwrap();
        let pages: Vec<f64> = view.table.rows.iter().filter_map(|r| r.pages).collect();
        assert_eq!(pages, vec![10.0, 20.0, 30.0]);
        assert_eq!(view.table.columns, vec!["name", "country", "sector", "pages"]);
    }

    #[test]
    fn test_table_descending_keeps_missing_last() {
        let d = data("name,country,trbceconomicsectorname,pagespdf\nA,X,S,30\nB,X,S,\nC,X,S,20\n");
        let sel = Selection::new("A", GroupRule::AllFirms, vec![]).unwrap();
        let options = ViewOptions {
            sort: SortOrder::Descending,
            ..Default::default()
        };
        let view = render(&d, &sel, ChartKind::BarChart, &options).unwrap();
        let names: Vec<&str> = view.table.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "B"]);
    }

    #[test]
    fn test_words_panel_present_with_column() {
        let d = data("name,country,trbceconomicsectorname,pagespdf,words\nA,X,S,30,900\n");
        let sel = Selection::new("A", GroupRule::AllFirms, vec![]).unwrap();
        let view = render(&d, &sel, ChartKind::ViolinPlot, &ViewOptions::default()).unwrap();
        assert_eq!(view.panels.len(), 2);
        assert!(view.panel(Metric::Words).is_some());
        assert!(view.table.columns.contains(&"words"));
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("DESC").unwrap(), SortOrder::Descending);
        assert_eq!(SortOrder::Ascending.flipped(), SortOrder::Descending);
        assert!(SortOrder::parse("sideways").is_err());
    }
}
