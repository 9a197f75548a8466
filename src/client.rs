use std::{env, ops::Deref, time::Duration};

use crate::{
    error::Error,
    models::{
        records::{Data, Envelope, Records},
        token::Token,
    },
    query::Query,
    rate_limit::{parse_header, RateLimit},
    result::Result,
};
use reqwest::{header::AUTHORIZATION, Client as ReqwestClient, Url};
use serde::{de::DeserializeOwned, Deserialize};

const TOKEN_URL: &str = "https://accounts.veracross.com";
const DATA_URL: &str = "https://api.veracross.com";
const USER_AGENT: &str = concat!("VeracrossClient/", env!("CARGO_PKG_VERSION"));

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

pub(crate) const PAGE_SIZE: &str = "x-page-size";
pub(crate) const PAGE_NUMBER: &str = "x-page-number";
pub(crate) const TOTAL_COUNT: &str = "x-total-count";
pub(crate) const VALUE_LISTS: &str = "x-api-value-lists";

/// Client for the v3 data API of a single school.
///
/// A token has to be fetched with [`Client::get_token`] before any data can be pulled.
pub struct Client {
    http: ReqwestClient,
    school: String,
    token_url: String,
    data_url: String,
    client_id: String,
    client_secret: String,
    token: Option<Token>,
    scopes: Vec<String>,
    limiter: RateLimit,
    page_size: u32,
    value_lists: bool,
}

/// Configures and builds a [`Client`].
#[derive(Clone)]
pub struct ClientBuilder {
    school: String,
    client_id: String,
    client_secret: String,
    token_url: Option<String>,
    data_url: Option<String>,
    page_size: u32,
    value_lists: bool,
    user_agent: String,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Starts a builder for `school` with the given client credentials.
    pub fn new(
        school: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            school: school.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: None,
            data_url: None,
            page_size: DEFAULT_PAGE_SIZE,
            value_lists: true,
            user_agent: USER_AGENT.to_string(),
            timeout: None,
        }
    }

    /// Starts a builder from `VERACROSS_SCHOOL`, `VERACROSS_CLIENT_ID`
    /// and `VERACROSS_CLIENT_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingEnv`] naming the first variable that is not set.
    pub fn from_env() -> Result<Self> {
        let var = |name: &'static str| env::var(name).map_err(|_| Error::MissingEnv(name));
        Ok(Self::new(
            var("VERACROSS_SCHOOL")?,
            var("VERACROSS_CLIENT_ID")?,
            var("VERACROSS_CLIENT_SECRET")?,
        ))
    }

    /// Overrides the OAuth2 token endpoint.
    #[must_use]
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// Overrides the data API base URL.
    #[must_use]
    pub fn data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = Some(url.into());
        self
    }

    /// Sets the number of records requested per page. Zero is treated as one.
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets whether value lists are requested alongside the data.
    #[must_use]
    pub fn value_lists(mut self, include: bool) -> Self {
        self.value_lists = include;
        self
    }

    /// Overrides the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets a timeout for every request.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client. No request is made.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client could not be initialized.
    pub fn build(self) -> Result<Client> {
        let mut http = ReqwestClient::builder().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        let token_url = self
            .token_url
            .unwrap_or_else(|| format!("{TOKEN_URL}/{}/oauth/token", self.school));
        let data_url = self
            .data_url
            .unwrap_or_else(|| format!("{DATA_URL}/{}/v3", self.school));

        Ok(Client {
            http: http.build()?,
            school: self.school,
            token_url,
            data_url: data_url.trim_end_matches('/').to_string(),
            client_id: self.client_id,
            client_secret: self.client_secret,
            token: None,
            scopes: Vec::new(),
            limiter: RateLimit::default(),
            page_size: self.page_size,
            value_lists: self.value_lists,
        })
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("school", &self.school)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url)
            .field("data_url", &self.data_url)
            .field("page_size", &self.page_size)
            .field("value_lists", &self.value_lists)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("school", &self.school)
            .field("token_url", &self.token_url)
            .field("data_url", &self.data_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token", &self.token)
            .field("scopes", &self.scopes)
            .field("limiter", &self.limiter)
            .field("page_size", &self.page_size)
            .field("value_lists", &self.value_lists)
            .finish_non_exhaustive()
    }
}

/// Error body of a rejected token request.
#[derive(Debug, Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// One GET against the data API.
#[derive(Debug, Clone, Copy)]
struct Request<'a> {
    url: &'a str,
    filters: &'a [(String, String)],
    page: Option<(u32, u32)>,
    value_lists: bool,
}

impl Client {
    /// Creates a client for `school` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client could not be initialized.
    pub fn new(
        school: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Client> {
        ClientBuilder::new(school, client_id, client_secret).build()
    }

    /// Creates a client with default settings from the environment.
    ///
    /// # Errors
    ///
    /// See [`ClientBuilder::from_env`] and [`ClientBuilder::build`].
    pub fn from_env() -> Result<Client> {
        ClientBuilder::from_env()?.build()
    }

    /// Returns a [`ClientBuilder`].
    pub fn builder(
        school: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> ClientBuilder {
        ClientBuilder::new(school, client_id, client_secret)
    }

    /// Fetches an access token with the given scopes using the
    /// client-credentials grant and stores it in the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server rejected the request with an OAuth2
    /// error body, [`Error::UnexpectedStatus`] for any other non-success status,
    /// or a transport/decoding error.
    pub async fn get_token<I, S>(&mut self, scopes: I) -> Result<&Token>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scopes: Vec<String> = scopes
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let scope = scopes.join(" ");

        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", scope.as_str()),
        ];

        log::info!("token request for {} dispatched", self.token_url);
        let response = self.http.post(&self.token_url).form(&form).send().await?;
        let status = response.status();
        log::info!("token response status: {status}");

        if !status.is_success() {
            let body = response.text().await?;
            return Err(match serde_json::from_str::<OAuthError>(&body) {
                Ok(e) => Error::Auth {
                    error: e.error,
                    description: e.error_description,
                },
                Err(_) => Error::UnexpectedStatus(status),
            });
        }

        let body = response.bytes().await?;
        let token: Token = serde_json::from_slice(&body)?;
        log::debug!("token granted, expires in {:?}s", token.expires_in());

        self.scopes = scopes;
        Ok(&*self.token.insert(token))
    }

    /// Returns the bearer value of a valid token, refreshing an expired one
    /// with the scopes it was originally requested with.
    async fn bearer(&mut self) -> Result<String> {
        let expired = match &self.token {
            Some(token) => token.is_expired(),
            None => return Err(Error::NoToken),
        };
        if expired {
            log::info!("access token expired, requesting a new one");
            let scopes = self.scopes.clone();
            self.get_token(scopes).await?;
        }
        self.token
            .as_ref()
            .map(Token::bearer)
            .ok_or(Error::NoToken)
    }

    /// Pulls every record of `endpoint`, following pagination until exhausted.
    ///
    /// Records are returned in the order the API sent them. Value lists are
    /// collected from every page if the client requests them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoToken`] if no token was fetched yet, or the first
    /// error of any page request. Records of earlier pages are discarded.
    pub async fn pull(&mut self, endpoint: &str, query: &Query) -> Result<Records> {
        self.pull_pages(endpoint, query, self.value_lists).await
    }

    /// Pulls every record of `endpoint` and replaces coded values with their
    /// descriptions. Value lists are always requested.
    ///
    /// # Errors
    ///
    /// See [`Client::pull`].
    pub async fn pull_resolved(&mut self, endpoint: &str, query: &Query) -> Result<Records> {
        let mut records = self.pull_pages(endpoint, query, true).await?;
        records.resolve();
        Ok(records)
    }

    /// Pulls a single record, `{endpoint}/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoToken`] if no token was fetched yet,
    /// [`Error::UnexpectedBody`] if the response holds a list,
    /// or the error of the request.
    pub async fn pull_one(&mut self, endpoint: &str, id: impl std::fmt::Display) -> Result<Records> {
        let bearer = self.bearer().await?;
        let url = self.record_url(endpoint, &id.to_string())?;
        let request = Request {
            url: &url,
            filters: &[],
            page: None,
            value_lists: self.value_lists,
        };

        let reply: Reply<Envelope> = self.fetch_json(&bearer, request).await?;
        if matches!(reply.data, Data::Many(_)) {
            return Err(Error::UnexpectedBody(format!(
                "expected a single record from {url}"
            )));
        }

        let mut records = Records::new(url, self.value_lists);
        records.push_page(reply.inner);
        Ok(records)
    }

    async fn pull_pages(
        &mut self,
        endpoint: &str,
        query: &Query,
        value_lists: bool,
    ) -> Result<Records> {
        let bearer = self.bearer().await?;
        let url = self.endpoint_url(endpoint);
        let page_size = query.page_size_override().unwrap_or(self.page_size).max(1);
        let mut records = Records::new(url.clone(), value_lists);

        let mut page = 1;
        loop {
            let request = Request {
                url: &url,
                filters: query.filters(),
                page: Some((page, page_size)),
                value_lists,
            };
            let reply: Reply<Envelope> = self.fetch_json(&bearer, request).await?;
            let total_count = reply.total_count;
            let received = records.push_page(reply.inner);
            records.metadata.total_count = total_count;

            log::debug!(
                "page {page} of {url}: {received} records ({} of {:?})",
                records.len(),
                total_count
            );

            // servers may cap the page size, so a short page only ends
            // the pull when no total is known
            let Some(total) = total_count else {
                break;
            };
            let collected = u64::try_from(records.len()).unwrap_or(u64::MAX);
            if collected >= total || received == 0 {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    async fn fetch_json<T>(&mut self, bearer: &str, request: Request<'_>) -> Result<Reply<T>>
    where
        T: DeserializeOwned,
    {
        self.limiter.throttle().await;

        let response = {
            let mut builder = self.http.get(request.url).header(AUTHORIZATION, bearer);
            if !request.filters.is_empty() {
                builder = builder.query(request.filters);
            }
            if let Some((number, size)) = request.page {
                builder = builder.header(PAGE_NUMBER, number).header(PAGE_SIZE, size);
            }
            if request.value_lists {
                builder = builder.header(VALUE_LISTS, "include");
            }
            log::info!("request for {} dispatched", request.url);
            builder.send().await?
        };

        log::info!("response status: {}", &response.status());

        let status = response.status();
        if !status.is_success() {
            // keep the throttle state when the headers are readable
            if let Ok(Some(limit)) = RateLimit::from_headers(response.headers()) {
                self.limiter = limit;
            }
            return Err(Error::UnexpectedStatus(status));
        }

        if let Some(limit) = RateLimit::from_headers(response.headers())? {
            self.limiter = limit;
        }
        let total_count = parse_header(response.headers(), TOTAL_COUNT)?;

        let body = response.bytes().await?;
        let inner = serde_json::from_slice::<T>(&body)?;

        Ok(Reply { inner, total_count })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.data_url, endpoint.trim_matches('/'))
    }

    /// `{endpoint}/{id}` with `id` percent-encoded as a single path segment.
    fn record_url(&self, endpoint: &str, id: &str) -> Result<String> {
        let base = self.endpoint_url(endpoint);
        let mut url = Url::parse(&base).map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(format!("{base} cannot hold a record id")))?
            .push(id);
        Ok(url.into())
    }

    /// Returns the current token (if one was fetched).
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Returns the rate-limit state reported by the last response.
    pub fn rate_limit(&self) -> RateLimit {
        self.limiter
    }

    /// Returns the school short name.
    pub fn school(&self) -> &str {
        &self.school
    }

    /// Returns the OAuth2 token endpoint.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Returns the data API base URL.
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Returns the default page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

#[derive(Debug)]
pub(crate) struct Reply<T> {
    pub(crate) inner: T,
    pub(crate) total_count: Option<u64>,
}

impl<T> Deref for Reply<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_derived_from_the_school() {
        let client = Client::new("demo", "id", "secret").unwrap();
        assert_eq!(client.token_url(), "https://accounts.veracross.com/demo/oauth/token");
        assert_eq!(client.data_url(), "https://api.veracross.com/demo/v3");
        assert_eq!(client.endpoint_url("/students/"), "https://api.veracross.com/demo/v3/students");
        assert_eq!(client.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(client.rate_limit(), RateLimit::default());
        assert!(client.token().is_none());
    }

    #[test]
    fn builder_overrides() {
        let client = Client::builder("demo", "id", "secret")
            .data_url("http://localhost:1234/v3/")
            .token_url("http://localhost:1234/token")
            .page_size(0)
            .build()
            .unwrap();
        assert_eq!(client.data_url(), "http://localhost:1234/v3");
        assert_eq!(client.token_url(), "http://localhost:1234/token");
        assert_eq!(client.page_size(), 1);
    }

    #[tokio::test]
    async fn pulling_without_a_token_fails_before_any_request() {
        let mut client = Client::builder("demo", "id", "secret")
            .data_url("http://127.0.0.1:9/v3")
            .build()
            .unwrap();
        let err = client.pull("students", &Query::new()).await.unwrap_err();
        assert!(matches!(err, Error::NoToken));
        let err = client.pull_one("students", 1).await.unwrap_err();
        assert!(matches!(err, Error::NoToken));
    }

    #[test]
    fn debug_output_hides_the_client_secret() {
        let builder = Client::builder("demo", "id", "TOP-SECRET");
        assert!(!format!("{builder:?}").contains("TOP-SECRET"));

        let client = builder.build().unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("TOP-SECRET"));
        assert!(debug.contains("demo"));
    }

    #[test]
    fn record_ids_are_a_single_encoded_segment() {
        let client = Client::new("demo", "id", "secret").unwrap();
        assert_eq!(
            client.record_url("students", "42").unwrap(),
            "https://api.veracross.com/demo/v3/students/42"
        );
        assert_eq!(
            client.record_url("/students/", "a/b c?d").unwrap(),
            "https://api.veracross.com/demo/v3/students/a%2Fb%20c%3Fd"
        );
    }
}
