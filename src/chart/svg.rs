//! SVG rendering for chart specs
//!
//! Produces self-contained `<svg>` markup sized for one dashboard panel.
//! Numeric axes are linear; the focal company is always drawn in red.

use super::{format_value, ChartBody, ChartSpec, StripPoint};
use crate::stats::{Bin, BoxSummary, DensityPoint, JITTER_WIDTH};

const WIDTH: f64 = 680.0;
const HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 44.0;
const MARGIN_BOTTOM: f64 = 56.0;
const TICKS: usize = 5;

const FOCAL_COLOR: &str = "#dc2626";
const PEER_COLOR: &str = "#9ca3af";
const MEAN_COLOR: &str = "#2563eb";
const AXIS_COLOR: &str = "#e5e7eb";
const LABEL_COLOR: &str = "#6b7280";
const TITLE_COLOR: &str = "#374151";

/// Escape text for use in SVG/HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Plot area in pixel space
struct Area {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl Area {
    fn panel() -> Self {
        Self {
            left: MARGIN_LEFT,
            right: WIDTH - MARGIN_RIGHT,
            top: MARGIN_TOP,
            bottom: HEIGHT - MARGIN_BOTTOM,
        }
    }

    fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    fn half_height(&self) -> f64 {
        (self.bottom - self.top) / 2.0
    }
}

/// Linear map from a data domain onto a pixel range
#[derive(Clone, Copy)]
struct Scale {
    lo: f64,
    hi: f64,
    from: f64,
    to: f64,
}

impl Scale {
    fn new((lo, hi): (f64, f64), from: f64, to: f64) -> Self {
        Self { lo, hi, from, to }
    }

    fn map(&self, v: f64) -> f64 {
        if self.hi == self.lo {
            return (self.from + self.to) / 2.0;
        }
        self.from + (v - self.lo) / (self.hi - self.lo) * (self.to - self.from)
    }

    fn ticks(&self) -> Vec<f64> {
        let step = (self.hi - self.lo) / (TICKS - 1) as f64;
        (0..TICKS).map(|i| self.lo + step * i as f64).collect()
    }
}

/// Data extent widened by 5% on each side; a point gets a unit range.
fn padded(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn tick_label(v: f64) -> String {
    format_value((v * 10.0).round() / 10.0)
}

/// Render a chart spec as an SVG document fragment.
pub fn render(spec: &ChartSpec) -> String {
    let area = Area::panel();
    let mut body = String::new();
    let mut legend = vec![(FOCAL_COLOR, spec.focal.legend.clone())];

    if spec.is_empty() {
        body.push_str(&format!(
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13" fill="{}">No {} data for this peer group</text>"##,
            (area.left + area.right) / 2.0,
            area.center_y(),
            LABEL_COLOR,
            spec.metric.unit()
        ));
    } else {
        match &spec.body {
            ChartBody::Histogram { bins } => histogram(&mut body, &area, bins, spec.focal.value),
            ChartBody::Strip { points, mean } => {
                strip(&mut body, &area, points, *mean);
                if let Some(m) = mean {
                    legend.push((MEAN_COLOR, format!("Peer mean ({})", format_value(*m))));
                }
            }
            ChartBody::Violin { density, summary } => violin(
                &mut body,
                &area,
                density,
                summary.as_ref(),
                spec.focal.value,
            ),
            ChartBody::Bar { mean } => {
                bar(&mut body, &area, *mean, spec.focal.value);
                if let Some(m) = mean {
                    legend.push((PEER_COLOR, format!("Peer mean ({})", format_value(*m))));
                }
            }
        }
    }

    frame(spec, &area, &body, &legend)
}

fn frame(spec: &ChartSpec, area: &Area, body: &str, legend: &[(&str, String)]) -> String {
    let mut legend_svg = String::new();
    for (i, (color, text)) in legend.iter().enumerate() {
        let y = area.top + 14.0 + i as f64 * 16.0;
        legend_svg.push_str(&format!(
            r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="2" stroke-dasharray="4,2"/><text x="{:.1}" y="{:.1}" font-size="11" fill="{}">{}</text>"##,
            area.right - 190.0,
            y - 4.0,
            area.right - 170.0,
            y - 4.0,
            color,
            area.right - 164.0,
            y,
            TITLE_COLOR,
            escape(text)
        ));
    }

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" style="background:white; border-radius:8px">
  <text x="{cx:.1}" y="22" text-anchor="middle" font-size="14" font-weight="600" fill="{title_color}">{title}</text>
  <line x1="{l:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}" stroke="{axis}" stroke-width="2"/>
  <line x1="{l:.1}" y1="{t:.1}" x2="{l:.1}" y2="{b:.1}" stroke="{axis}" stroke-width="2"/>
  <text x="{cx:.1}" y="{xl:.1}" text-anchor="middle" font-size="12" fill="{label}">{x_label}</text>
  <text x="16" y="{cy:.1}" text-anchor="middle" font-size="12" fill="{label}" transform="rotate(-90, 16, {cy:.1})">{y_label}</text>
  {body}
  {legend_svg}
</svg>"##,
        w = WIDTH,
        h = HEIGHT,
        cx = (area.left + area.right) / 2.0,
        cy = area.center_y(),
        l = area.left,
        r = area.right,
        t = area.top,
        b = area.bottom,
        xl = HEIGHT - 14.0,
        axis = AXIS_COLOR,
        label = LABEL_COLOR,
        title_color = TITLE_COLOR,
        title = escape(&spec.title),
        x_label = escape(&spec.x_label),
        y_label = escape(&spec.y_label),
        body = body,
        legend_svg = legend_svg,
    )
}

fn x_ticks(out: &mut String, area: &Area, scale: &Scale) {
    for v in scale.ticks() {
        out.push_str(&format!(
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11" fill="{}">{}</text>"##,
            scale.map(v),
            area.bottom + 16.0,
            LABEL_COLOR,
            tick_label(v)
        ));
    }
}

fn y_ticks(out: &mut String, area: &Area, scale: &Scale) {
    for v in scale.ticks() {
        out.push_str(&format!(
            r##"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11" fill="{}">{}</text>"##,
            area.left - 6.0,
            scale.map(v) + 4.0,
            LABEL_COLOR,
            tick_label(v)
        ));
    }
}

fn vertical_marker(out: &mut String, area: &Area, x: f64, color: &str) {
    out.push_str(&format!(
        r##"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="{}" stroke-width="2" stroke-dasharray="6,3"/>"##,
        area.top,
        area.bottom,
        color,
        x = x
    ));
}

fn histogram(out: &mut String, area: &Area, bins: &[Bin], focal: Option<f64>) {
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return;
    };
    let mut lo = first.start;
    let mut hi = last.end;
    if let Some(f) = focal {
        lo = lo.min(f);
        hi = hi.max(f);
    }
    let x = Scale::new((lo, hi), area.left, area.right);
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(1).max(1);
    let y = Scale::new((0.0, max_count as f64), area.bottom, area.top);

    for bin in bins.iter().filter(|b| b.count > 0) {
        let x0 = x.map(bin.start);
        let x1 = x.map(bin.end);
        let top = y.map(bin.count as f64);
        out.push_str(&format!(
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" stroke="white" stroke-width="1"/>"##,
            x0,
            top,
            (x1 - x0).max(1.0),
            area.bottom - top,
            PEER_COLOR
        ));
    }

    x_ticks(out, area, &x);
    y_ticks(out, area, &y);
    if let Some(f) = focal {
        vertical_marker(out, area, x.map(f), FOCAL_COLOR);
    }
}

fn strip(out: &mut String, area: &Area, points: &[StripPoint], mean: Option<f64>) {
    let x = Scale::new(
        padded(points.iter().map(|p| p.value).chain(mean)),
        area.left,
        area.right,
    );
    let spread = area.half_height() * 0.6 / JITTER_WIDTH;

    // focal drawn last so it sits on top
    for p in points.iter().filter(|p| !p.focal).chain(points.iter().filter(|p| p.focal)) {
        let (r, fill) = if p.focal {
            (6.0, FOCAL_COLOR)
        } else {
            (4.0, PEER_COLOR)
        };
        out.push_str(&format!(
            r##"<circle cx="{:.1}" cy="{:.1}" r="{}" fill="{}" opacity="0.85"><title>{}: {}</title></circle>"##,
            x.map(p.value),
            area.center_y() + p.offset * spread,
            r,
            fill,
            escape(&p.name),
            format_value(p.value)
        ));
    }

    x_ticks(out, area, &x);
    if let Some(m) = mean {
        vertical_marker(out, area, x.map(m), MEAN_COLOR);
    }
}

fn violin(
    out: &mut String,
    area: &Area,
    density: &[DensityPoint],
    summary: Option<&BoxSummary>,
    focal: Option<f64>,
) {
    let mut extent: Vec<f64> = density.iter().map(|p| p.x).collect();
    if let Some(s) = summary {
        extent.extend([s.whisker_low, s.whisker_high]);
        extent.extend(s.outliers.iter().copied());
    }
    extent.extend(focal);
    let x = Scale::new(padded(extent), area.left, area.right);
    let cy = area.center_y();

    let peak = density.iter().map(|p| p.density).fold(0.0, f64::max);
    if peak > 0.0 {
        let half = area.half_height() * 0.8;
        let upper = density
            .iter()
            .map(|p| format!("{:.1},{:.1}", x.map(p.x), cy - p.density / peak * half));
        let lower = density
            .iter()
            .rev()
            .map(|p| format!("{:.1},{:.1}", x.map(p.x), cy + p.density / peak * half));
        let outline: Vec<String> = upper.chain(lower).collect();
        out.push_str(&format!(
            r##"<polygon points="{}" fill="{}" fill-opacity="0.5" stroke="{}" stroke-width="1"/>"##,
            outline.join(" "),
            PEER_COLOR,
            LABEL_COLOR
        ));
    }

    if let Some(s) = summary {
        let box_h = 16.0;
        out.push_str(&format!(
            r##"<line x1="{:.1}" y1="{cy:.1}" x2="{:.1}" y2="{cy:.1}" stroke="{c}" stroke-width="1.5"/><line x1="{:.1}" y1="{cy:.1}" x2="{:.1}" y2="{cy:.1}" stroke="{c}" stroke-width="1.5"/>"##,
            x.map(s.whisker_low),
            x.map(s.q1),
            x.map(s.q3),
            x.map(s.whisker_high),
            cy = cy,
            c = TITLE_COLOR
        ));
        out.push_str(&format!(
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{}" fill="{}"/><line x1="{m:.1}" y1="{:.1}" x2="{m:.1}" y2="{:.1}" stroke="white" stroke-width="2"/>"##,
            x.map(s.q1),
            cy - box_h / 2.0,
            (x.map(s.q3) - x.map(s.q1)).max(1.0),
            box_h,
            TITLE_COLOR,
            cy - box_h / 2.0,
            cy + box_h / 2.0,
            m = x.map(s.median)
        ));
        for o in &s.outliers {
            out.push_str(&format!(
                r##"<circle cx="{:.1}" cy="{:.1}" r="2.5" fill="none" stroke="{}"/>"##,
                x.map(*o),
                cy,
                TITLE_COLOR
            ));
        }
    }

    x_ticks(out, area, &x);
    if let Some(f) = focal {
        vertical_marker(out, area, x.map(f), FOCAL_COLOR);
    }
}

fn bar(out: &mut String, area: &Area, mean: Option<f64>, focal: Option<f64>) {
    let top = mean.into_iter().chain(focal).fold(0.0, f64::max);
    let y = Scale::new((0.0, if top > 0.0 { top * 1.1 } else { 1.0 }), area.bottom, area.top);
    let cx = (area.left + area.right) / 2.0;
    let bar_w = 120.0;

    if let Some(m) = mean {
        let y0 = y.map(m);
        out.push_str(&format!(
            r##"<rect x="{:.1}" y="{:.1}" width="{}" height="{:.1}" fill="{}"/><text x="{cx:.1}" y="{:.1}" text-anchor="middle" font-size="12" fill="{}">{}</text>"##,
            cx - bar_w / 2.0,
            y0,
            bar_w,
            area.bottom - y0,
            PEER_COLOR,
            y0 - 6.0,
            TITLE_COLOR,
            format_value(m),
            cx = cx
        ));
    }

    y_ticks(out, area, &y);
    if let Some(f) = focal {
        let fy = y.map(f);
        out.push_str(&format!(
            r##"<line x1="{:.1}" y1="{fy:.1}" x2="{:.1}" y2="{fy:.1}" stroke="{}" stroke-width="2" stroke-dasharray="6,3"/>"##,
            area.left,
            area.right,
            FOCAL_COLOR,
            fy = fy
        ));
    }
}
