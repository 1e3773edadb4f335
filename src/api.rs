// API client module: a small blocking HTTP client for the quick-search
// endpoint. Authentication rides on a cookie jar that is seeded from the
// saved cookie header and updated by any Set-Cookie the server sends back.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://solutions.careempartner.com/user/quickSearch";
/// Overrides [`DEFAULT_ENDPOINT`].
pub const ENDPOINT_ENV: &str = "SOLUTIONS_SEARCH_URL";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const ERROR_BODY_LIMIT: u64 = 2048;
const SERVICE_PROVIDER_ID: i64 = 1;
/// Terms shorter than this many bytes are searched as `#<term>`.
const SHORT_TERM_LEN: usize = 9;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("reading response failed: {0}")]
    Body(#[source] reqwest::Error),
    #[error("malformed response: {0}")]
    Malformed(#[source] serde_json::Error),
}

impl ApiError {
    /// 401 or 403: the saved session is no longer accepted.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Http { status: 401 | 403, .. })
    }

    /// The server answered with a 2xx, so the jar may hold fresh cookies
    /// even though the call failed afterwards.
    pub fn reached_server(&self) -> bool {
        matches!(self, ApiError::Body(_) | ApiError::Malformed(_))
    }
}

/// Quick-search request payload.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest<'a> {
    pub service_provider_id: i64,
    pub search_key: &'a str,
    pub start: i64,
}

#[derive(Deserialize, Debug)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Row>,
}

/// A single value of a result row.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Absent,
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Absent,
            Value::String(s) => FieldValue::Text(s),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else {
                    FieldValue::from(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::Bool(b) => FieldValue::Text(b.to_string()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            FieldValue::Integer(f as i64)
        } else {
            FieldValue::Float(f)
        }
    }
}

/// One search hit: field name to value. Unknown fields are kept but only
/// the ones the formatter asks for are ever read.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(from = "HashMap<String, serde_json::Value>")]
pub struct Row {
    fields: HashMap<String, FieldValue>,
}

impl Row {
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&FieldValue::Absent)
    }
}

impl From<HashMap<String, serde_json::Value>> for Row {
    fn from(map: HashMap<String, serde_json::Value>) -> Self {
        Row {
            fields: map.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

/// Blocking client bound to one endpoint, holding the cookie jar that
/// carries the session between calls.
pub struct ApiClient {
    client: Client,
    jar: Arc<Jar>,
    endpoint: Url,
}

impl ApiClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("Invalid endpoint URL {endpoint:?}"))?;
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            jar,
            endpoint,
        })
    }

    /// Create an ApiClient for `SOLUTIONS_SEARCH_URL`, or the production
    /// endpoint when the variable is unset.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var(ENDPOINT_ENV).unwrap_or_else(|_| DEFAULT_ENDPOINT.into());
        Self::new(&endpoint)
    }

    /// Install every `name=value` pair of a Cookie header into the jar for
    /// the endpoint, with path `/`. Pairs the jar refuses to parse are
    /// dropped silently, so the return value is the number of cookies the
    /// jar actually holds for the endpoint afterwards.
    pub fn seed(&self, header: &str) -> usize {
        let pairs = parse_cookie_header(header);
        for (name, value) in &pairs {
            self.jar
                .add_cookie_str(&format!("{name}={value}; Path=/"), &self.endpoint);
        }
        let held = parse_cookie_header(&self.cookie_header()).len();
        debug!(
            "seeded {held} of {} cookie(s) for {}",
            pairs.len(),
            self.endpoint
        );
        held
    }

    /// The jar's cookies for the endpoint as a Cookie header, or an empty
    /// string when there are none.
    pub fn cookie_header(&self) -> String {
        self.jar
            .cookies(&self.endpoint)
            .and_then(|value| value.to_str().ok().map(str::to_string))
            .unwrap_or_default()
    }

    /// POST one search term and decode the result rows.
    pub fn quick_search(&self, term: &str) -> Result<Vec<Row>, ApiError> {
        let key = normalize_term(term);
        let payload = SearchRequest {
            service_provider_id: SERVICE_PROVIDER_ID,
            search_key: &key,
            start: 0,
        };
        debug!("POST {} searchKey={key:?}", self.endpoint);

        let res = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, "*/*")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .json(&payload)
            .send()?;
        let status = res.status();
        debug!("{} answered {status}", self.endpoint);

        if !status.is_success() {
            let mut body = Vec::new();
            // The body is diagnostic only; a failed read leaves it short.
            let _ = res.take(ERROR_BODY_LIMIT).read_to_end(&mut body);
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        // Past this point the server answered 2xx and may have set cookies.
        let bytes = res.bytes().map_err(ApiError::Body)?;
        let parsed: SearchResponse = serde_json::from_slice(&bytes).map_err(ApiError::Malformed)?;
        Ok(parsed.data)
    }
}

/// Split a Cookie header into `(name, value)` pairs. Only the first `=`
/// separates name from value; entries without `=` or with an empty name
/// are dropped.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.split_once('='))
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Turn a command-line term into a search key: drop one leading `+`, then
/// prefix `#` when what is left is shorter than nine bytes.
pub fn normalize_term(term: &str) -> String {
    let term = term.strip_prefix('+').unwrap_or(term);
    if term.len() < SHORT_TERM_LEN {
        format!("#{term}")
    } else {
        term.to_string()
    }
}
