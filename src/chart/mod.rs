//! Chart specifications for one metric over a peer group
//!
//! A [`ChartSpec`] is a render-agnostic description of what to draw: the
//! statistics behind the chart, the focal marker, and the axis labels.
//! [`svg::render`] turns a spec into markup; the JSON API ships specs as-is.

pub mod svg;

use serde::Serialize;

use crate::dataset::{ReportRecord, COL_PAGES, COL_WORDS};
use crate::error::{BenchError, Result};
use crate::peer::PeerGroup;
use crate::stats::{self, Bin, BoxSummary, DensityPoint, Jitter};

const CHART_KEYS: &str = "histogram, strip, violin, bar";

/// Report-length metric being compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Pages,
    Words,
}

impl Metric {
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Pages => COL_PAGES,
            Metric::Words => COL_WORDS,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Pages => "Pages",
            Metric::Words => "Words",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Pages => "pages",
            Metric::Words => "words",
        }
    }

    pub fn axis_label(&self) -> &'static str {
        match self {
            Metric::Pages => "Number of Pages in PDF Report",
            Metric::Words => "Number of Words in Report",
        }
    }

    pub fn value(&self, record: &ReportRecord) -> Option<f64> {
        match self {
            Metric::Pages => record.pages,
            Metric::Words => record.words,
        }
    }

    /// Present values over the group, missing cells dropped.
    pub fn values(&self, records: &[&ReportRecord]) -> Vec<f64> {
        records.iter().filter_map(|r| self.value(r)).collect()
    }
}

/// Chart family selected in the sidebar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Histogram,
    StripPlot,
    ViolinPlot,
    BarChart,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Histogram,
        ChartKind::StripPlot,
        ChartKind::ViolinPlot,
        ChartKind::BarChart,
    ];

    pub fn parse(key: &str) -> Result<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "histogram" | "hist" => Ok(ChartKind::Histogram),
            "strip" | "stripplot" | "strip-plot" => Ok(ChartKind::StripPlot),
            "violin" | "violinplot" | "violin-plot" => Ok(ChartKind::ViolinPlot),
            "bar" | "barchart" | "bar-chart" => Ok(ChartKind::BarChart),
            _ => Err(BenchError::UnknownOption {
                kind: "chart type",
                value: key.to_string(),
                expected: CHART_KEYS,
            }),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "histogram",
            ChartKind::StripPlot => "strip",
            ChartKind::ViolinPlot => "violin",
            ChartKind::BarChart => "bar",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "Histogram",
            ChartKind::StripPlot => "Strip Plot",
            ChartKind::ViolinPlot => "Violin Plot",
            ChartKind::BarChart => "Bar Chart",
        }
    }
}

/// Tunables for chart construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub bins: usize,
    pub kde_points: usize,
    /// Fixed seed for strip plot jitter; `None` draws fresh offsets.
    pub jitter_seed: Option<u64>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            bins: stats::DEFAULT_BINS,
            kde_points: 100,
            jitter_seed: None,
        }
    }
}

/// The focal company's value and legend entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocalMarker {
    pub name: String,
    pub value: Option<f64>,
    pub legend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StripPoint {
    pub name: String,
    pub value: f64,
    /// Cosmetic vertical offset
    pub offset: f64,
    pub focal: bool,
}

/// Chart-kind specific payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartBody {
    Histogram {
        bins: Vec<Bin>,
    },
    Strip {
        points: Vec<StripPoint>,
        mean: Option<f64>,
    },
    Violin {
        density: Vec<DensityPoint>,
        summary: Option<BoxSummary>,
    },
    Bar {
        mean: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub metric: Metric,
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Number of peer values behind the chart
    pub sample_size: usize,
    pub focal: FocalMarker,
    pub body: ChartBody,
}

impl ChartSpec {
    /// Nothing to draw besides the focal marker
    pub fn is_empty(&self) -> bool {
        self.sample_size == 0
    }
}

/// Format a metric value the way legends and tables show it.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn focal_marker(metric: Metric, focal: &ReportRecord) -> FocalMarker {
    let value = metric.value(focal);
    let legend = match value {
        Some(v) => format!("{} ({} {})", focal.name, format_value(v), metric.unit()),
        None => format!("{} (no {} data)", focal.name, metric.unit()),
    };
    FocalMarker {
        name: focal.name.clone(),
        value,
        legend,
    }
}

/// Build the chart for `metric` over the peer group.
pub fn build(
    metric: Metric,
    kind: ChartKind,
    group: &PeerGroup<'_>,
    options: &ChartOptions,
) -> ChartSpec {
    let values = metric.values(&group.records);
    let focal = focal_marker(metric, group.focal);
    let title = format!("Distribution of {} ({})", metric.label(), group.description);

    let (x_label, y_label, body) = match kind {
        ChartKind::Histogram => (
            metric.axis_label().to_string(),
            "Number of Companies".to_string(),
            ChartBody::Histogram {
                bins: stats::histogram(&values, options.bins),
            },
        ),
        ChartKind::StripPlot => (
            metric.axis_label().to_string(),
            group.description.clone(),
            ChartBody::Strip {
                points: strip_points(metric, group, &focal, options.jitter_seed),
                mean: stats::mean(&values),
            },
        ),
        ChartKind::ViolinPlot => (
            metric.axis_label().to_string(),
            group.description.clone(),
            ChartBody::Violin {
                density: stats::kde(&values, options.kde_points),
                summary: stats::box_summary(&values),
            },
        ),
        ChartKind::BarChart => (
            group.description.clone(),
            format!("Average {}", metric.axis_label()),
            ChartBody::Bar {
                mean: stats::mean(&values),
            },
        ),
    };

    ChartSpec {
        metric,
        kind,
        title,
        x_label,
        y_label,
        sample_size: values.len(),
        focal,
        body,
    }
}

fn strip_points(
    metric: Metric,
    group: &PeerGroup<'_>,
    focal: &FocalMarker,
    seed: Option<u64>,
) -> Vec<StripPoint> {
    let mut jitter = Jitter::from_seed(seed);
    let mut points: Vec<StripPoint> = group
        .records
        .iter()
        .filter_map(|r| {
            metric.value(r).map(|value| StripPoint {
                name: r.name.clone(),
                value,
                offset: jitter.offset(),
                focal: std::ptr::eq(*r, group.focal),
            })
        })
        .collect();

    // hand-picked peers may leave the focal company out; still show it
    if !points.iter().any(|p| p.focal) {
        if let Some(value) = focal.value {
            points.push(StripPoint {
                name: focal.name.clone(),
                value,
                offset: 0.0,
                focal: true,
            });
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, LoadOptions};
    use crate::peer::{resolve, GroupRule, Selection};
    use approx::assert_relative_eq;

    fn fixture() -> Dataset {
        let raw = "\
name,country,trbceconomicsectorname,pagespdf,words
A,France,Energy,15,1000
B,France,Energy,25,3000
C,Germany,Energy,40,
";
        Dataset::from_reader(raw.as_bytes(), LoadOptions::default()).unwrap()
    }

    fn group<'a>(data: &'a Dataset, rule: GroupRule, peers: Vec<String>) -> PeerGroup<'a> {
        resolve(data, &Selection::new("A", rule, peers).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_chart_kind() {
        for kind in ChartKind::ALL {
            assert_eq!(ChartKind::parse(kind.key()).unwrap(), kind);
        }
        assert!(matches!(
            ChartKind::parse("pie"),
            Err(BenchError::UnknownOption { kind: "chart type", .. })
        ));
    }

    #[test]
    fn test_bar_mean_and_focal() {
        let data = fixture();
        let g = group(&data, GroupRule::Country, vec![]);
        let spec = build(Metric::Pages, ChartKind::BarChart, &g, &ChartOptions::default());
        match spec.body {
            ChartBody::Bar { mean } => assert_relative_eq!(mean.unwrap(), 20.0),
            other => panic!("unexpected body {:?}", other),
        }
        assert_eq!(spec.focal.value, Some(15.0));
        assert_eq!(spec.focal.legend, "A (15 pages)");
        assert_eq!(spec.title, "Distribution of Pages (Country: France)");
    }

    #[test]
    fn test_words_skip_missing_cells() {
        let data = fixture();
        let g = group(&data, GroupRule::AllFirms, vec![]);
        let spec = build(Metric::Words, ChartKind::Histogram, &g, &ChartOptions::default());
        assert_eq!(spec.sample_size, 2);
        assert_eq!(spec.y_label, "Number of Companies");
    }

    #[test]
    fn test_strip_highlights_focal_once() {
        let data = fixture();
        let g = group(&data, GroupRule::AllFirms, vec![]);
        let options = ChartOptions {
            jitter_seed: Some(7),
            ..Default::default()
        };
        let spec = build(Metric::Pages, ChartKind::StripPlot, &g, &options);
        let ChartBody::Strip { points, mean } = spec.body else {
            panic!("expected strip body");
        };
        assert_eq!(points.len(), 3);
        assert_eq!(points.iter().filter(|p| p.focal).count(), 1);
        assert_relative_eq!(mean.unwrap(), 80.0 / 3.0);
    }

    #[test]
    fn test_strip_adds_focal_outside_explicit_group() {
        let data = fixture();
        let g = group(&data, GroupRule::AllFirms, vec!["B".into(), "C".into()]);
        let spec = build(Metric::Pages, ChartKind::StripPlot, &g, &ChartOptions::default());
        let ChartBody::Strip { points, mean } = spec.body else {
            panic!("expected strip body");
        };
        assert_eq!(points.len(), 3);
        assert!(points.iter().any(|p| p.focal && p.name == "A"));
        // the mean covers the peer group only
        assert_relative_eq!(mean.unwrap(), 32.5);
    }

    #[test]
    fn test_violin_has_box_summary() {
        let data = fixture();
        let g = group(&data, GroupRule::Sector, vec![]);
        let spec = build(Metric::Pages, ChartKind::ViolinPlot, &g, &ChartOptions::default());
        let ChartBody::Violin { density, summary } = spec.body else {
            panic!("expected violin body");
        };
        assert_eq!(density.len(), 100);
        assert_relative_eq!(summary.unwrap().median, 25.0);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(15.0), "15");
        assert_eq!(format_value(15.26), "15.3");
    }
}
