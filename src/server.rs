//! The form shell: one page with the seven letter fields, a generate action
//! that answers with the PDF as a download, and a liveness endpoint.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::letter::{self, LetterRequest, LoanType};
use crate::officers::OfficerDirectory;
use crate::telemetry;
use axum::extract::{Form, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// The file name the browser saves the generated letter under
pub const DOWNLOAD_FILE_NAME: &str = "PreApproval_Letter.pdf";

const DEFAULT_BORROWER: &str = "Sanjaya Regimi";
const DEFAULT_ADDRESS: &str = "26 Pisgah Forest Cir. Greensboro, NC 27455";
const DEFAULT_PRICE: u32 = 285_000;
const DEFAULT_DOWN_PAYMENT: u32 = 30;
const DEFAULT_INTEREST_RATE: &str = "7.0";

#[derive(Parser, Debug, Default)]
#[command(
    name = "preletter",
    about = "Serve the mortgage pre-approval letter form",
    version
)]
pub struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub port: Option<u16>,
    /// Override the configured directory holding the logo and signature images
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,
}

/// Immutable per-process state: the officer roster and where the letterhead
/// logo lives. Nothing here mutates after startup, so submissions never
/// interact.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<OfficerDirectory>,
    pub logo_path: Arc<PathBuf>,
}

/// The seven form fields, exactly as the page posts them
#[derive(Debug, Deserialize)]
pub struct LetterForm {
    pub officer: String,
    pub borrower_name: String,
    pub property_address: String,
    pub purchase_price: f64,
    pub loan_type: LoanType,
    pub down_payment: f64,
    pub interest_rate: f64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(form_page))
        .route("/letter", post(generate_letter))
        .route("/health", get(healthcheck))
        .with_state(state)
}

pub async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dir) = args.assets_dir.take() {
        config.assets.dir = dir;
    }

    telemetry::init(&config.telemetry)?;

    let state = AppState {
        directory: Arc::new(OfficerDirectory::builtin(&config.assets.dir)),
        logo_path: Arc::new(config.assets.logo_path()),
    };

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(?config.environment, %addr, "pre-approval letter form ready");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn form_page(State(state): State<AppState>) -> Html<String> {
    let officer_options: String = state
        .directory
        .iter()
        .map(|officer| format!(r#"<option value="{0}">{0}</option>"#, officer.name))
        .collect();
    let loan_type_options: String = LoanType::ALL
        .iter()
        .map(|loan_type| format!(r#"<option value="{0}">{0}</option>"#, loan_type))
        .collect();

    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Pre-Approval Letter Generator</title>
<style>
  body {{ font-family: sans-serif; max-width: 34rem; margin: 2rem auto; }}
  label {{ display: block; margin-top: 0.75rem; }}
  input, select {{ width: 100%; padding: 0.35rem; }}
  button {{ margin-top: 1.25rem; padding: 0.5rem 1.5rem; }}
</style>
</head>
<body>
<h1>Pre-Approval Letter Generator</h1>
<form method="post" action="/letter">
  <label>Loan Officer
    <select name="officer">{officer_options}</select>
  </label>
  <label>Borrower Name
    <input name="borrower_name" value="{DEFAULT_BORROWER}">
  </label>
  <label>Property Address
    <input name="property_address" value="{DEFAULT_ADDRESS}">
  </label>
  <label>Purchase Price
    <input name="purchase_price" type="number" value="{DEFAULT_PRICE}">
  </label>
  <label>Loan Type
    <select name="loan_type">{loan_type_options}</select>
  </label>
  <label>Down Payment (%)
    <input name="down_payment" type="number" step="any" value="{DEFAULT_DOWN_PAYMENT}">
  </label>
  <label>Interest Rate (%)
    <input name="interest_rate" type="number" step="any" value="{DEFAULT_INTEREST_RATE}">
  </label>
  <button type="submit">Generate Letter</button>
</form>
</body>
</html>
"#
    ))
}

pub(crate) async fn generate_letter(
    State(state): State<AppState>,
    Form(form): Form<LetterForm>,
) -> Result<Response, AppError> {
    let officer = state.directory.get(&form.officer)?.clone();

    info!(
        officer = %officer.name,
        borrower = %form.borrower_name,
        loan_type = %form.loan_type,
        "generating pre-approval letter"
    );

    let request = LetterRequest {
        borrower_name: form.borrower_name,
        property_address: form.property_address,
        purchase_price: form.purchase_price,
        loan_type: form.loan_type,
        down_payment: form.down_payment,
        interest_rate: form.interest_rate,
        officer,
    };

    let pdf = letter::render(&request, Some(state.logo_path.as_path()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::path::Path;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            directory: Arc::new(OfficerDirectory::builtin(Path::new("assets"))),
            logo_path: Arc::new(PathBuf::from("assets/miller_logo.png")),
        }
    }

    fn sample_form() -> LetterForm {
        LetterForm {
            officer: "Danny Davis".to_string(),
            borrower_name: "Sanjaya Regimi".to_string(),
            property_address: DEFAULT_ADDRESS.to_string(),
            purchase_price: 285000.0,
            loan_type: LoanType::Conventional,
            down_payment: 30.0,
            interest_rate: 7.0,
        }
    }

    #[tokio::test]
    async fn form_page_lists_officers_and_programs() {
        let Html(body) = form_page(State(test_state())).await;
        assert!(body.contains("Danny Davis"));
        assert!(body.contains("Maria Keller"));
        assert!(body.contains("USDA"));
        assert!(body.contains("285000"));
    }

    #[tokio::test]
    async fn generate_letter_answers_a_pdf_download() {
        let response = generate_letter(State(test_state()), Form(sample_form()))
            .await
            .expect("letter generates")
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .expect("content type set");
        assert_eq!(content_type.to_str().expect("ascii header"), "application/pdf");
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .expect("disposition set");
        assert_eq!(
            disposition.to_str().expect("ascii header"),
            "attachment; filename=\"PreApproval_Letter.pdf\""
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body collects");
        assert!(body.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn unknown_officer_is_a_bad_request() {
        let mut form = sample_form();
        form.officer = "Nobody Particular".to_string();

        let err = generate_letter(State(test_state()), Form(form))
            .await
            .expect_err("lookup fails before any PDF bytes exist");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
