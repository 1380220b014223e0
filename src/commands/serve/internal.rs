//! Internal implementation of the dashboard server

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use peerbench::chart::ChartKind;
use peerbench::config::Config;
use peerbench::dataset::Dataset;
use peerbench::peer::{self, GroupRule, Selection};
use peerbench::view::{self, html, BenchmarkView, SortOrder, ViewOptions};
use peerbench::BenchError;

use super::microserver::{self, HttpRequest, HttpResponse};
use super::ServeOptions;

// === Server state ===

/// Server state shared across request handlers. Holds configuration only;
/// report data is reloaded per request.
pub struct ServerState {
    config: Config,
    start_time: Instant,
    version: String,
}

impl ServerState {
    fn new(config: Config) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    fn load_dataset(&self) -> Result<Dataset, String> {
        let options = self.config.load_options().map_err(|e| e.to_string())?;
        Dataset::load_with(&self.config.data.path, options).map_err(|e| e.to_string())
    }
}

// === API types ===

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_secs: u64,
}

#[derive(Serialize)]
struct RuleJson {
    key: &'static str,
    label: &'static str,
}

/// Focal choices and the options the dataset supports
#[derive(Serialize)]
struct CompaniesResponse<'a> {
    companies: Vec<&'a str>,
    rules: Vec<RuleJson>,
    charts: Vec<&'static str>,
    words_available: bool,
}

/// Dashboard parameters shared by `/` and `/api/view`
struct ViewParams {
    focal: Option<String>,
    benchmark: GroupRule,
    peers: Vec<String>,
    chart: ChartKind,
    sort: SortOrder,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            focal: None,
            benchmark: GroupRule::AllFirms,
            peers: Vec::new(),
            chart: ChartKind::default(),
            sort: SortOrder::default(),
        }
    }
}

impl ViewParams {
    fn from_request(request: &HttpRequest) -> Result<Self, BenchError> {
        let present = |key: &str| request.param(key).filter(|v| !v.is_empty());

        Ok(Self {
            focal: present("focal").map(str::to_string),
            benchmark: present("rule")
                .map(GroupRule::parse)
                .transpose()?
                .unwrap_or(GroupRule::AllFirms),
            peers: request.params("peers"),
            chart: present("chart")
                .map(ChartKind::parse)
                .transpose()?
                .unwrap_or_default(),
            sort: present("sort")
                .map(SortOrder::parse)
                .transpose()?
                .unwrap_or_default(),
        })
    }

    /// Explicit focal, or the first company like an untouched select box
    fn focal_or_first<'a>(&'a self, dataset: &'a Dataset) -> Option<&'a str> {
        self.focal
            .as_deref()
            .or_else(|| dataset.company_names().first().copied())
    }
}

// === Helpers ===

/// Add security headers to response
fn with_security_headers(response: HttpResponse) -> HttpResponse {
    response
        .with_header("X-Content-Type-Options", "nosniff")
        .with_header("X-Frame-Options", "DENY")
}

/// Consistent JSON error response
fn json_error(status: u16, message: &str) -> HttpResponse {
    HttpResponse::json(status, &serde_json::json!({"error": message}))
}

fn status_for(error: &BenchError) -> u16 {
    match error {
        BenchError::FocalNotFound(_) => 404,
        e if e.is_selection_error() => 400,
        _ => 500,
    }
}

fn render_view(
    dataset: &Dataset,
    params: &ViewParams,
    focal: &str,
    state: &ServerState,
) -> Result<BenchmarkView, BenchError> {
    let selection = Selection::new(focal, params.benchmark.clone(), params.peers.clone())?;
    let options = ViewOptions {
        chart: state.config.chart_options(),
        sort: params.sort,
    };
    view::render(dataset, &selection, params.chart, &options)
}

// === Transport-free handlers ===

/// Route request to handler
fn route_request(request: &HttpRequest, state: &ServerState) -> HttpResponse {
    debug!(
        method = %request.method,
        path = %request.path,
        host = request.header("host").unwrap_or("-"),
        "request"
    );
    let response = match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/") => handle_dashboard(request, state),
        ("GET", "/api/view") => handle_view_json(request, state),
        ("GET", "/api/companies") => handle_companies(state),
        ("GET", "/health") => handle_health(state),
        (_, "/" | "/api/view" | "/api/companies" | "/health") => {
            json_error(405, "Method not allowed")
        }
        _ => json_error(404, "Not found"),
    };
    with_security_headers(response)
}

/// Handle GET /health
fn handle_health(state: &ServerState) -> HttpResponse {
    HttpResponse::json(
        200,
        &HealthResponse {
            status: "ok".to_string(),
            version: state.version.clone(),
            uptime_secs: state.uptime_secs(),
        },
    )
}

/// Handle GET /api/companies
fn handle_companies(state: &ServerState) -> HttpResponse {
    let dataset = match state.load_dataset() {
        Ok(d) => d,
        Err(msg) => return json_error(500, &msg),
    };

    let response = CompaniesResponse {
        companies: dataset.company_names(),
        rules: peer::available_rules(&dataset)
            .iter()
            .map(|r| RuleJson {
                key: r.key(),
                label: r.label(),
            })
            .collect(),
        charts: ChartKind::ALL.iter().map(|k| k.key()).collect(),
        words_available: dataset.columns().words,
    };
    HttpResponse::json(200, &response)
}

/// Handle GET /api/view
fn handle_view_json(request: &HttpRequest, state: &ServerState) -> HttpResponse {
    let dataset = match state.load_dataset() {
        Ok(d) => d,
        Err(msg) => {
            error!(error = %msg, "report data unavailable");
            return json_error(500, &msg);
        }
    };

    let params = match ViewParams::from_request(request) {
        Ok(p) => p,
        Err(e) => return json_error(status_for(&e), &e.to_string()),
    };
    let Some(focal) = params.focal_or_first(&dataset) else {
        return json_error(500, "Report data contains no companies");
    };

    match render_view(&dataset, &params, focal, state) {
        Ok(view) => HttpResponse::json(200, &view),
        Err(e) => json_error(status_for(&e), &e.to_string()),
    }
}

/// Handle GET / - the dashboard page
fn handle_dashboard(request: &HttpRequest, state: &ServerState) -> HttpResponse {
    let dataset = match state.load_dataset() {
        Ok(d) => d,
        Err(msg) => {
            error!(error = %msg, "report data unavailable");
            return HttpResponse::html(500, html::load_failure_page(&msg));
        }
    };

    // bad parameters still get a usable sidebar
    let (params, param_error) = match ViewParams::from_request(request) {
        Ok(p) => (p, None),
        Err(e) => {
            let fallback = ViewParams {
                focal: request.param("focal").map(str::to_string),
                ..Default::default()
            };
            (fallback, Some(e))
        }
    };
    let Some(focal) = params.focal_or_first(&dataset) else {
        return HttpResponse::html(
            500,
            html::load_failure_page("report data contains no companies"),
        );
    };

    let outcome = match param_error {
        Some(e) => Err(e),
        None => render_view(&dataset, &params, focal, state),
    };
    let status = outcome.as_ref().err().map(status_for).unwrap_or(200);
    if let Err(e) = &outcome {
        warn!(error = %e, "render failed");
    }

    let sidebar = html::Sidebar {
        companies: dataset.company_names(),
        rules: peer::available_rules(&dataset),
        focal,
        benchmark: &params.benchmark,
        peers: &params.peers,
        chart: params.chart,
        sort: params.sort,
    };
    HttpResponse::html(status, html::page(&sidebar, outcome.as_ref()))
}

// === Transport: microserver accept loop ===
// One request per connection. Thread per connection.

/// Handle one connection on any Read + Write stream.
fn handle_connection(stream: &mut (impl Read + Write), state: &ServerState) {
    let req = match microserver::read_request(stream) {
        Some(Ok(req)) => req,
        Some(Err(msg)) => {
            let resp = with_security_headers(json_error(400, &msg));
            microserver::write_response(stream, &resp);
            return;
        }
        None => return,
    };

    microserver::write_response(stream, &route_request(&req, state));
}

/// Run the dashboard server
pub fn run_server(config: Config, options: ServeOptions) -> Result<()> {
    let host = options.host.unwrap_or_else(|| config.serve.host.clone());
    let port = options.port.unwrap_or(config.serve.port);
    let addr = format!("{}:{}", host, port);

    if host != "127.0.0.1" && host != "localhost" {
        warn!(
            %host,
            "binding beyond localhost exposes the dashboard to the network (HTTP only)"
        );
    }

    let state = Arc::new(ServerState::new(config));
    match state.load_dataset() {
        Ok(d) => info!(
            path = %state.config.data.path.display(),
            rows = d.len(),
            "report data found"
        ),
        Err(msg) => warn!(error = %msg, "report data not loadable yet, pages will show the error"),
    }

    let listener = TcpListener::bind(&addr).with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "dashboard listening");
    println!("📊 peerbench dashboard starting...");
    println!("   Open http://{}/", addr);
    println!("   Press Ctrl+C to stop\n");

    accept_loop(listener, state);
    Ok(())
}

fn accept_loop(listener: TcpListener, state: Arc<ServerState>) {
    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    handle_connection(&mut stream, &state);
                    let _ = stream.shutdown(Shutdown::Write);
                });
            }
            Err(e) => error!(error = %e, "accept failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    const CSV: &str = "\
name,country,trbceconomicsectorname,pagespdf,words
Alpha,France,Energy,15,5000
Beta,France,Utilities,25,6000
Gamma,Germany,Energy,40,9000
";

    fn state_with(csv: Option<&str>) -> (TempDir, ServerState) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report_data.csv");
        if let Some(csv) = csv {
            std::fs::write(&path, csv).unwrap();
        }
        let mut config = Config::default();
        config.data.path = path;
        config.chart.jitter_seed = Some(1);
        (tmp, ServerState::new(config))
    }

    fn get(target: &str) -> HttpRequest {
        let (path, query) = microserver::split_target(target);
        HttpRequest {
            method: "GET".to_string(),
            path,
            query,
            headers: vec![],
        }
    }

    fn body(resp: &HttpResponse) -> String {
        String::from_utf8_lossy(&resp.body).to_string()
    }

    #[test]
    fn test_health() {
        let (_tmp, state) = state_with(Some(CSV));
        let resp = route_request(&get("/health"), &state);
        assert_eq!(resp.status, 200);
        assert!(body(&resp).contains(r#""status":"ok""#));
    }

    #[test]
    fn test_dashboard_defaults_to_first_company() {
        let (_tmp, state) = state_with(Some(CSV));
        let resp = route_request(&get("/"), &state);
        assert_eq!(resp.status, 200);
        let html = body(&resp);
        assert!(html.contains(r#"<option value="Alpha" selected>"#));
        assert!(html.contains("All Firms (3 companies)"));
    }

    #[test]
    fn test_api_view_country() {
        let (_tmp, state) = state_with(Some(CSV));
        let resp = route_request(&get("/api/view?focal=Alpha&rule=country&chart=bar"), &state);
        assert_eq!(resp.status, 200);
        let json: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(json["group"], "Country: France");
        assert_eq!(json["peer_count"], 2);
        assert_eq!(json["panels"][0]["body"]["mean"], 20.0);
        assert_eq!(json["panels"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_api_view_unknown_focal_is_404() {
        let (_tmp, state) = state_with(Some(CSV));
        let resp = route_request(&get("/api/view?focal=Nobody"), &state);
        assert_eq!(resp.status, 404);
        assert!(body(&resp).contains("not found"));
    }

    #[test]
    fn test_bad_chart_keeps_sidebar() {
        let (_tmp, state) = state_with(Some(CSV));
        let resp = route_request(&get("/?focal=Beta&chart=pie"), &state);
        assert_eq!(resp.status, 400);
        let html = body(&resp);
        assert!(html.contains("unknown chart type"));
        assert!(html.contains(r#"<option value="Beta" selected>"#));
    }

    #[test]
    fn test_too_many_peers() {
        let (_tmp, state) = state_with(Some(CSV));
        let resp = route_request(
            &get("/api/view?focal=Alpha&peers=Alpha&peers=Beta&peers=Gamma&peers=Delta"),
            &state,
        );
        assert_eq!(resp.status, 400);
    }

    #[test]
    fn test_missing_data_file() {
        let (_tmp, state) = state_with(None);
        let resp = route_request(&get("/"), &state);
        assert_eq!(resp.status, 500);
        assert!(body(&resp).contains("Could not load report data"));
    }

    #[test]
    fn test_companies() {
        let (_tmp, state) = state_with(Some(CSV));
        let resp = route_request(&get("/api/companies"), &state);
        let json: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(json["companies"].as_array().unwrap().len(), 3);
        assert_eq!(json["rules"].as_array().unwrap().len(), 3);
        assert_eq!(json["words_available"], true);
    }

    #[test]
    fn test_unknown_route_and_method() {
        let (_tmp, state) = state_with(Some(CSV));
        assert_eq!(route_request(&get("/nope"), &state).status, 404);
        let mut req = get("/health");
        req.method = "DELETE".to_string();
        assert_eq!(route_request(&req, &state).status, 405);
    }

    #[test]
    fn test_handle_connection_round_trip() {
        let (_tmp, state) = state_with(Some(CSV));
        let mut stream = Cursor::new(b"GET /health HTTP/1.1\r\nHost: x\r\n\r\n".to_vec());
        handle_connection(&mut stream, &state);
        let written = String::from_utf8_lossy(stream.get_ref()).to_string();
        assert!(written.contains("HTTP/1.1 200 OK"));
        assert!(written.contains("X-Frame-Options: DENY"));
    }
}
