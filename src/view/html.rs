//! Dashboard page markup
//!
//! Sidebar form on the left (focal company, benchmark rule, hand-picked
//! peers, chart type), charts and the peer table on the right. The form
//! submits with GET so every interaction is a fresh, bookmarkable render.

use crate::chart::svg::{self, escape};
use crate::chart::{format_value, ChartKind};
use crate::error::BenchError;
use crate::peer::{GroupRule, MAX_EXPLICIT_PEERS};

use super::{BenchmarkView, SortOrder, PAGE_TITLE};

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 0; display: flex; color: #1f2937; }
aside { width: 280px; min-height: 100vh; padding: 20px; background: #f3f4f6; box-sizing: border-box; }
aside h2 { font-size: 16px; margin-top: 0; }
aside fieldset { border: none; padding: 0; margin: 0 0 16px 0; }
aside legend, aside label.head { font-weight: 600; font-size: 13px; margin-bottom: 6px; display: block; }
aside select { width: 100%; }
main { flex: 1; padding: 24px 32px; }
.panel { margin-bottom: 24px; }
.error { padding: 12px 16px; background: #fee2e2; color: #991b1b; border-radius: 6px; }
.note { color: #6b7280; font-size: 13px; }
table { border-collapse: collapse; font-size: 13px; }
th, td { padding: 4px 10px; border-bottom: 1px solid #e5e7eb; text-align: left; }
td.num { text-align: right; }
tr.focal td { font-weight: 600; color: #dc2626; }
"#;

/// Current sidebar state, echoed back into the form
pub struct Sidebar<'a> {
    pub companies: Vec<&'a str>,
    pub rules: Vec<GroupRule>,
    pub focal: &'a str,
    /// Radio choice; hand-picked peers override it without clearing it
    pub benchmark: &'a GroupRule,
    pub peers: &'a [String],
    pub chart: ChartKind,
    pub sort: SortOrder,
}

impl Sidebar<'_> {
    /// Query string reproducing this state with a different sort order
    pub fn query_with_sort(&self, sort: SortOrder) -> String {
        let mut parts = vec![
            format!("focal={}", urlencoding::encode(self.focal)),
            format!("rule={}", self.benchmark.key()),
        ];
        parts.extend(
            self.peers
                .iter()
                .map(|p| format!("peers={}", urlencoding::encode(p))),
        );
        parts.push(format!("chart={}", self.chart.key()));
        parts.push(format!("sort={}", sort.key()));
        parts.join("&")
    }
}

/// Full dashboard page for a successful or failed render.
pub fn page(sidebar: &Sidebar<'_>, outcome: Result<&BenchmarkView, &BenchError>) -> String {
    let main = match outcome {
        Ok(view) => content(sidebar, view),
        Err(e) => format!(
            r#"<h1>{}</h1><div class="error">{}</div>"#,
            PAGE_TITLE,
            escape(&e.to_string())
        ),
    };
    document(&sidebar_form(sidebar), &main)
}

/// Page shown when the dataset itself could not be loaded.
pub fn load_failure_page(error: &str) -> String {
    let main = format!(
        r#"<h1>{}</h1><div class="error">Could not load report data: {}</div>"#,
        PAGE_TITLE,
        escape(error)
    );
    document("", &main)
}

fn document(aside: &str, main: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<aside>{}</aside>\n<main>{}</main>\n</body>\n</html>\n",
        PAGE_TITLE, STYLE, aside, main
    )
}

fn sidebar_form(s: &Sidebar<'_>) -> String {
    let mut html = String::from(r#"<h2>Focal Company Selection</h2><form method="get" action="/">"#);

    html.push_str(r#"<fieldset><label class="head" for="focal">Select a focal company:</label><select id="focal" name="focal">"#);
    for name in &s.companies {
        html.push_str(&option(name, name, *name == s.focal));
    }
    html.push_str("</select></fieldset>");

    html.push_str("<fieldset><legend>Benchmark by:</legend>");
    for rule in &s.rules {
        html.push_str(&radio("rule", rule.key(), rule.label(), rule == s.benchmark));
    }
    html.push_str("</fieldset>");

    html.push_str(&format!(
        r#"<fieldset><label class="head" for="peers">Or pick up to {} peer companies:</label><select id="peers" name="peers" multiple size="6">"#,
        MAX_EXPLICIT_PEERS
    ));
    for name in &s.companies {
        html.push_str(&option(name, name, s.peers.iter().any(|p| p.as_str() == *name)));
    }
    html.push_str(r#"</select><p class="note">A peer selection overrides the benchmark choice.</p></fieldset>"#);

    html.push_str("<fieldset><legend>Chart type:</legend>");
    for kind in ChartKind::ALL {
        html.push_str(&radio("chart", kind.key(), kind.label(), kind == s.chart));
    }
    html.push_str("</fieldset>");

    html.push_str(&format!(
        r#"<input type="hidden" name="sort" value="{}"><button type="submit">Update</button></form>"#,
        s.sort.key()
    ));
    html
}

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        r#"<option value="{}"{}>{}</option>"#,
        escape(value),
        if selected { " selected" } else { "" },
        escape(label)
    )
}

fn radio(name: &str, value: &str, label: &str, checked: bool) -> String {
    format!(
        r#"<label><input type="radio" name="{}" value="{}"{}> {}</label><br>"#,
        name,
        value,
        if checked { " checked" } else { "" },
        escape(label)
    )
}

fn content(sidebar: &Sidebar<'_>, view: &BenchmarkView) -> String {
    let mut html = format!("<h1>{}</h1>", escape(&view.title));
    html.push_str(&format!(
        r#"<p class="note">Benchmark: {} ({} companies)</p>"#,
        escape(&view.group),
        view.peer_count
    ));
    if !view.focal.in_group {
        html.push_str(&format!(
            r#"<p class="note">{} is not part of the selected peers.</p>"#,
            escape(&view.focal.name)
        ));
    }

    for panel in &view.panels {
        html.push_str(&format!(
            r#"<section class="panel"><h3>{}</h3>{}</section>"#,
            escape(&panel.title),
            svg::render(panel)
        ));
    }

    html.push_str(&table(sidebar, view));
    html
}

fn table(sidebar: &Sidebar<'_>, view: &BenchmarkView) -> String {
    let show_words = view.table.columns.contains(&"words");
    let arrow = match view.table.sort {
        SortOrder::Ascending => "&#9650;",
        SortOrder::Descending => "&#9660;",
    };

    let mut html = String::from("<h3>Benchmark Data</h3><table><thead><tr><th>Name</th><th>Country</th><th>Economic Sector</th>");
    html.push_str(&format!(
        r#"<th><a href="/?{}">Pages {}</a></th>"#,
        escape(&sidebar.query_with_sort(view.table.sort.flipped())),
        arrow
    ));
    if show_words {
        html.push_str("<th>Words</th>");
    }
    html.push_str("</tr></thead><tbody>");

    let cell = |v: Option<f64>| v.map(format_value).unwrap_or_default();
    for row in &view.table.rows {
        let class = if row.name == view.focal.name {
            r#" class="focal""#
        } else {
            ""
        };
        html.push_str(&format!(
            r#"<tr{}><td>{}</td><td>{}</td><td>{}</td><td class="num">{}</td>"#,
            class,
            escape(&row.name),
            escape(&row.country),
            escape(&row.sector),
            cell(row.pages)
        ));
        if show_words {
            html.push_str(&format!(r#"<td class="num">{}</td>"#, cell(row.words)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, LoadOptions};
    use crate::peer::Selection;
    use crate::view::{render, ViewOptions};

    const RAW: &str = "\
name,country,trbceconomicsectorname,pagespdf,words
Acme <AG>,France,Energy,15,5000
Beta,France,Energy,25,7000
";

    #[test]
    fn test_page_renders_panels_and_table() {
        let data = Dataset::from_reader(RAW.as_bytes(), LoadOptions::default()).unwrap();
        let peers: Vec<String> = vec![];
        let sel = Selection::new("Acme <AG>", GroupRule::Country, peers.clone()).unwrap();
        let view = render(&data, &sel, ChartKind::BarChart, &ViewOptions::default()).unwrap();
        let sidebar = Sidebar {
            companies: data.company_names(),
            rules: crate::peer::available_rules(&data),
            focal: "Acme <AG>",
            benchmark: &GroupRule::Country,
            peers: &peers,
            chart: ChartKind::BarChart,
            sort: SortOrder::Ascending,
        };

        let html = page(&sidebar, Ok(&view));
        assert!(html.contains("<title>Sustainability Report Length Benchmark</title>"));
        assert_eq!(html.matches("<svg").count(), 2);
        assert!(html.contains("Acme &lt;AG&gt;"));
        assert!(!html.contains("Acme <AG>"));
        assert!(html.contains(r#"value="country" checked"#));
        assert!(html.contains("sort=desc"));
        assert!(html.contains("<th>Words</th>"));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let peers: Vec<String> = vec![];
        let sidebar = Sidebar {
            companies: vec![],
            rules: vec![GroupRule::AllFirms],
            focal: "<x>",
            benchmark: &GroupRule::AllFirms,
            peers: &peers,
            chart: ChartKind::Histogram,
            sort: SortOrder::Ascending,
        };
        let err = BenchError::FocalNotFound("<x>".into());
        let html = page(&sidebar, Err(&err));
        assert!(html.contains(r#"<div class="error">company &#39;&lt;x&gt;&#39; not found"#));
    }

    #[test]
    fn test_query_with_sort_encodes_names() {
        let peers = vec!["B & C".to_string()];
        let sidebar = Sidebar {
            companies: vec![],
            rules: vec![],
            focal: "A B",
            benchmark: &GroupRule::Sector,
            peers: &peers,
            chart: ChartKind::StripPlot,
            sort: SortOrder::Ascending,
        };
        assert_eq!(
            sidebar.query_with_sort(SortOrder::Descending),
            "focal=A%20B&rule=sector&peers=B%20%26%20C&chart=strip&sort=desc"
        );
    }
}
