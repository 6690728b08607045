//! Blocking HTTP client for the node's REST API.

use std::time::Duration;

use camino::Utf8Path;
use mmt_config::DEFAULT_API_PORT;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::errors::ApiError;
use super::payloads::{
    ContextScore, Domain, FeatureWeights, Session, Translation, TranslationOptions,
    encode_context,
};
use super::{API_TARGET, DecoderFeatures, DomainApi, TranslationApi};

/// Request timeout; tuning-time translations can be slow.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Client for one node's REST API.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base: Url,
}

impl RestClient {
    /// Connects to `host`, which may carry an `http://` prefix and an
    /// embedded `:port`. An embedded port wins over `port`; the default is
    /// the standard API port.
    pub fn new(host: &str, port: Option<u16>) -> Result<Self, ApiError> {
        let invalid = || ApiError::InvalidHost {
            host: host.to_owned(),
        };
        let bare = host.strip_prefix("http://").unwrap_or(host);
        let (name, resolved_port) = match bare.split_once(':') {
            Some((name, embedded)) => (name, embedded.parse::<u16>().map_err(|_| invalid())?),
            None => (bare, port.unwrap_or(DEFAULT_API_PORT)),
        };
        if name.is_empty() {
            return Err(invalid());
        }
        let base =
            Url::parse(&format!("http://{name}:{resolved_port}/")).map_err(|_| invalid())?;
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self { http, base })
    }

    /// Connects to the API on localhost.
    pub fn local(port: u16) -> Result<Self, ApiError> {
        Self::new("localhost", Some(port))
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Port the client talks to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.base.port().unwrap_or(DEFAULT_API_PORT)
    }

    fn url(&self, endpoint: &str) -> Result<Url, ApiError> {
        self.base
            .join(endpoint)
            .map_err(|source| ApiError::InvalidUrl {
                endpoint: endpoint.to_owned(),
                source,
            })
    }

    fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Option<Value>, ApiError> {
        let url = self.url(endpoint)?;
        self.send("GET", self.http.get(url.clone()).query(query), &url)
    }

    fn delete(&self, endpoint: &str) -> Result<Option<Value>, ApiError> {
        let url = self.url(endpoint)?;
        self.send("DELETE", self.http.delete(url.clone()), &url)
    }

    fn put_json(&self, endpoint: &str, body: &impl serde::Serialize) -> Result<Option<Value>, ApiError> {
        let url = self.url(endpoint)?;
        self.send("PUT", self.http.put(url.clone()).json(body), &url)
    }

    fn put_form(&self, endpoint: &str, form: &[(&str, String)]) -> Result<Option<Value>, ApiError> {
        let url = self.url(endpoint)?;
        self.send("PUT", self.http.put(url.clone()).form(form), &url)
    }

    fn post_form(&self, endpoint: &str, form: &[(&str, String)]) -> Result<Option<Value>, ApiError> {
        let url = self.url(endpoint)?;
        self.send("POST", self.http.post(url.clone()).form(form), &url)
    }

    fn send(
        &self,
        method: &'static str,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<Option<Value>, ApiError> {
        let request_error = |source| ApiError::Request {
            url: url.to_string(),
            source,
        };
        let response = request.send().map_err(request_error)?;
        let status = response.status();
        debug!(target: API_TARGET, method, url = %url, status = status.as_u16(), "api call");
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        let body = response.text().map_err(request_error)?;
        unpack(url, &body)
    }

    /// Node statistics.
    pub fn stats(&self) -> Result<Option<Value>, ApiError> {
        self.get("_stat", &[])
    }

    /// Current decoder feature weights.
    pub fn features(&self) -> Result<Option<Value>, ApiError> {
        self.get("decoder/features", &[])
    }

    /// Creates a domain, then imports a TMX file into it.
    pub fn create_domain_from_tmx(
        &self,
        tmx: &Utf8Path,
        name: Option<&str>,
    ) -> Result<Domain, ApiError> {
        super::domains::create_domain_from_tmx(self, tmx, name)
    }
}

/// Unwraps the JSON envelope, returning its `data` field.
fn unpack(url: &Url, body: &str) -> Result<Option<Value>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let envelope: Value = serde_json::from_str(body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })?;
    match envelope {
        Value::Object(mut fields) => Ok(fields.remove("data")),
        _ => Ok(None),
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, data: Option<Value>) -> Result<T, ApiError> {
    let payload = data.ok_or_else(|| ApiError::MissingData {
        endpoint: endpoint.to_owned(),
    })?;
    serde_json::from_value(payload).map_err(|source| ApiError::Payload {
        endpoint: endpoint.to_owned(),
        source,
    })
}

fn with_limit(mut query: Vec<(&'static str, String)>, limit: Option<u32>) -> Vec<(&'static str, String)> {
    if let Some(count) = limit {
        query.push(("limit", count.to_string()));
    }
    query
}

impl DecoderFeatures for RestClient {
    fn update_features(&self, weights: &FeatureWeights) -> Result<(), ApiError> {
        self.put_json("decoder/features", weights).map(|_| ())
    }
}

impl DomainApi for RestClient {
    fn domains(&self) -> Result<Vec<Domain>, ApiError> {
        let data = self.get("domains", &[])?;
        if data.is_none() {
            return Ok(Vec::new());
        }
        decode("domains", data)
    }

    fn create_domain(&self, name: &str) -> Result<Domain, ApiError> {
        decode("domains", self.post_form("domains", &[("name", name.to_owned())])?)
    }

    fn import_into_domain(&self, domain: u64, tmx: &Utf8Path) -> Result<Option<Value>, ApiError> {
        self.post_form(
            "imports",
            &[
                ("domain", domain.to_string()),
                ("content_type", "tmx".to_owned()),
                ("local_file", tmx.to_string()),
            ],
        )
    }

    fn append_to_domain(
        &self,
        domain: u64,
        source: &str,
        target: &str,
    ) -> Result<Option<Value>, ApiError> {
        self.put_form(
            &format!("domains/{domain}"),
            &[("source", source.to_owned()), ("target", target.to_owned())],
        )
    }
}

impl TranslationApi for RestClient {
    fn context_from_text(
        &self,
        text: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ContextScore>, ApiError> {
        let query = with_limit(vec![("text", text.to_owned())], limit);
        let data = self.get("context", &query)?;
        data.map_or_else(|| Ok(Vec::new()), |value| decode("context", Some(value)))
    }

    fn context_from_file(
        &self,
        path: &Utf8Path,
        limit: Option<u32>,
    ) -> Result<Vec<ContextScore>, ApiError> {
        let query = with_limit(vec![("local_file", path.to_string())], limit);
        let data = self.get("context", &query)?;
        data.map_or_else(|| Ok(Vec::new()), |value| decode("context", Some(value)))
    }

    fn create_session(&self, context: &[ContextScore]) -> Result<Session, ApiError> {
        let form = [("context_weights", encode_context(context))];
        decode("sessions", self.post_form("sessions", &form)?)
    }

    fn close_session(&self, session: u64) -> Result<(), ApiError> {
        self.delete(&format!("sessions/{session}")).map(|_| ())
    }

    fn translate(
        &self,
        source: &str,
        options: &TranslationOptions,
    ) -> Result<Translation, ApiError> {
        let mut query = vec![("q", source.to_owned())];
        if let Some(session) = options.session {
            query.push(("session", session.to_string()));
        }
        if let Some(nbest) = options.nbest {
            query.push(("nbest", nbest.to_string()));
        }
        if let Some(context) = &options.context {
            query.push(("context_weights", encode_context(context)));
        }
        decode("translate", self.get("translate", &query)?)
    }
}
