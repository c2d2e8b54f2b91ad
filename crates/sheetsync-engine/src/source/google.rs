//! Google Sheets v4 source authenticated with a service-account key
//!
//! One OAuth access token is obtained per `open_by_url` through the JWT
//! bearer grant. No request is retried here; quota rejections surface as
//! `ResourceExhausted` so a `CredentialSet` can move to another account.

use super::{rectangular, DatasetSource, Workbook};
use crate::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sheetsync_core::{ExError, SheetSyncError};
use sheetsync_core_types::Sensitive;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ERROR_BODY: usize = 512;
const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account key file this client uses
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: Sensitive<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn source_error(op: &str, message: impl std::fmt::Display) -> ExError {
    SheetSyncError::Source {
        op: op.to_string(),
        message: message.to_string(),
    }
    .into()
}

fn credential_error(reason: impl std::fmt::Display) -> ExError {
    SheetSyncError::Credential {
        reason: reason.to_string(),
    }
    .into()
}

#[derive(Debug)]
pub struct GoogleSheetsSource {
    client: Client,
    key: ServiceAccountKey,
    api_base: String,
}

impl GoogleSheetsSource {
    pub fn from_credential_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| credential_error(format!("cannot read service account key file: {e}")))?;
        Self::from_credential_json(&json)
    }

    pub fn from_credential_json(json: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(json)
            .map_err(|e| credential_error(format!("malformed service account key: {e}")))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| source_error("http_client", e))?;
        Ok(Self {
            client,
            key,
            api_base: SHEETS_API_BASE.to_string(),
        })
    }

    /// Point requests at another Sheets-compatible endpoint
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: READONLY_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.expose().as_bytes())
            .map_err(|e| credential_error(format!("invalid private key: {e}")))?;
        encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .map_err(|e| credential_error(format!("cannot sign assertion: {e}")))
    }

    fn access_token(&self) -> Result<Sensitive<String>> {
        let assertion = self.assertion(Utc::now())?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .map_err(|e| source_error("token", e))?;
        let token: TokenResponse = ensure_success(response, "token")?
            .json()
            .map_err(|e| source_error("token", e))?;
        tracing::debug!(client_email = %self.key.client_email, "Obtained access token");
        Ok(Sensitive::new(token.access_token))
    }
}

impl DatasetSource for GoogleSheetsSource {
    type Workbook = GoogleWorkbook;

    fn open_by_url(&self, url: &str) -> Result<GoogleWorkbook> {
        let spreadsheet_id = spreadsheet_id_from_url(url)?;
        let token = self.access_token()?;
        Ok(GoogleWorkbook {
            client: self.client.clone(),
            api_base: self.api_base.clone(),
            spreadsheet_id,
            token,
        })
    }
}

#[derive(Debug)]
pub struct GoogleWorkbook {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    token: Sensitive<String>,
}

impl GoogleWorkbook {
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base).map_err(|e| source_error("endpoint", e))?;
        url.path_segments_mut()
            .map_err(|_| source_error("endpoint", "API base cannot carry a path"))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, op: &str, url: Url) -> Result<T> {
        tracing::debug!(op, url = %url, "Sheets request");
        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.expose())
            .send()
            .map_err(|e| source_error(op, e))?;
        ensure_success(response, op)?
            .json()
            .map_err(|e| source_error(op, e))
    }
}

impl Workbook for GoogleWorkbook {
    fn sheet_titles(&self) -> Result<Vec<String>> {
        let mut url = self.endpoint(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let meta: SpreadsheetMeta = self.get_json("sheet_titles", url)?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    fn get_all_rows(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        let range = quote_sheet_range(sheet);
        let mut url = self.endpoint(&["values", &range])?;
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "FORMATTED_VALUE")
            .append_pair("majorDimension", "ROWS");
        let values: ValueRange = self.get_json("get_all_rows", url)?;
        let rows = values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        Ok(rectangular(rows))
    }
}

fn ensure_success(response: Response, op: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().unwrap_or_default();
    if is_resource_exhausted(status, &body) {
        return Err(SheetSyncError::ResourceExhausted {
            op: op.to_string(),
            message: format!("HTTP {status}"),
        }
        .into());
    }
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        body.truncate(cut);
    }
    Err(source_error(op, format!("HTTP {status}: {body}")))
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorStatus,
}

#[derive(Deserialize)]
struct ApiErrorStatus {
    #[serde(default)]
    status: String,
}

/// Quota rejection: HTTP 429, or an error body whose status is `RESOURCE_EXHAUSTED`
fn is_resource_exhausted(status: StatusCode, body: &str) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || serde_json::from_str::<ApiErrorBody>(body)
            .is_ok_and(|b| b.error.status == RESOURCE_EXHAUSTED)
}

/// Spreadsheet id from a `.../spreadsheets/d/<id>/...` URL
pub fn spreadsheet_id_from_url(url: &str) -> Result<String> {
    let invalid = || -> ExError {
        SheetSyncError::Config {
            reason: format!("not a spreadsheet URL: {url}"),
        }
        .into()
    };
    let (_, rest) = url.split_once("/spreadsheets/d/").ok_or_else(invalid)?;
    let id = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if id.is_empty() {
        return Err(invalid());
    }
    Ok(id.to_string())
}

/// A1 range naming a whole sheet
fn quote_sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
