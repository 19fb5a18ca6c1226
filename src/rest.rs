use crate::cache::Cache;
use crate::client::{create_transport, Config};
use crate::error::{ClientError, Result};
use crate::token::{OrgClaim, Signer};
use chrono::Utc;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Client for the device server REST API.
///
/// Every request carries a freshly signed bearer token. GET responses are
/// cached by URL; with `read_through_cache` enabled a fresh cached response
/// is returned without touching the network.
pub struct Client {
    base_url: Url,
    config: Config,
    signer: Signer,
    token_lifetime: chrono::Duration,
    transport: HttpClient,
    cache: Cache<Value>,
    read_headers: HeaderMap,
    write_headers: HeaderMap,
}

impl Client {
    /// Create a new client, validating the configuration
    pub fn new(config: Config) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClientError::Config(format!("invalid base URL {:?}: {}", config.base_url, e))
        })?;

        let signer = Signer::new(config.algorithm, config.psk.as_bytes())?;

        // exp has whole-second resolution
        if config.token_lifetime < Duration::from_secs(1) {
            return Err(ClientError::Config(
                "token lifetime must be at least one second".to_string(),
            ));
        }
        let token_lifetime = chrono::Duration::from_std(config.token_lifetime)
            .ok()
            .filter(|lifetime| Utc::now().checked_add_signed(*lifetime).is_some())
            .ok_or_else(|| {
                ClientError::Config(format!(
                    "token lifetime out of range: {:?}",
                    config.token_lifetime
                ))
            })?;

        let transport = create_transport(&config)?;
        let cache = Cache::new(config.cache_ttl, config.sweep_interval);

        let mut read_headers = HeaderMap::new();
        read_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut write_headers = read_headers.clone();
        write_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Client {
            base_url,
            config,
            signer,
            token_lifetime,
            transport,
            cache,
            read_headers,
            write_headers,
        })
    }

    /// Entry point URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Response cache shared by all GET requests
    pub fn cache(&self) -> &Cache<Value> {
        &self.cache
    }

    /// Default headers for reads (`Accept: application/json`)
    pub fn read_headers(&self) -> &HeaderMap {
        &self.read_headers
    }

    /// Default headers for writes (`Accept` and `Content-Type: application/json`)
    pub fn write_headers(&self) -> &HeaderMap {
        &self.write_headers
    }

    /// Resolve a possibly relative href against the base URL
    pub fn resolve(&self, href: &str) -> Result<Url> {
        Ok(self.base_url.join(href)?)
    }

    /// Mint a fresh `Authorization` header value
    pub fn authorize(&self) -> Result<String> {
        let claim = OrgClaim::expiring_in(self.config.org_id, self.token_lifetime)
            .ok_or_else(|| ClientError::auth("token expiry out of range", None))?;
        let token = self.signer.sign(&claim)?;
        Ok(format!("Bearer {}", token))
    }

    /// GET a resource and decode it into `T`
    pub fn get<T>(&self, url: &str, headers: &HeaderMap) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.get_inner(url, headers, self.config.timeout)
    }

    /// GET with a deadline for this call only
    pub fn get_with_timeout<T>(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.get_inner(url, headers, Some(timeout))
    }

    /// POST a JSON body and decode the response into `T`
    pub fn post<T, B>(&self, url: &str, headers: &HeaderMap, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.post_inner(url, headers, body, self.config.timeout)
    }

    /// POST with a deadline for this call only
    pub fn post_with_timeout<T, B>(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: &B,
        timeout: Duration,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.post_inner(url, headers, body, Some(timeout))
    }

    /// DELETE a resource; the response body is ignored
    pub fn delete(&self, url: &str, headers: &HeaderMap) -> Result<()> {
        let url = self.target(&Method::DELETE, url)?;
        self.send(Method::DELETE, &url, headers, None, self.config.timeout)?;

        // collections listing the resource are cached under other URLs
        self.cache.clear();
        Ok(())
    }

    /// Release the transport and stop the cache sweep
    pub fn close(self) {
        self.cache.close();
    }

    fn get_inner<T>(&self, url: &str, headers: &HeaderMap, timeout: Option<Duration>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.target(&Method::GET, url)?;

        if self.config.read_through_cache {
            if let Some(cached) = self.cache.get(url.as_str()) {
                tracing::debug!(method = "GET", url = %url, "served from cache");
                return T::deserialize(&cached).map_err(|e| decode_failed(&Method::GET, &url, e));
            }
        }

        let body = self.send(Method::GET, &url, headers, None, timeout)?;
        let (value, result) = decode::<T>(&Method::GET, &url, &body)?;

        self.cache.set(url.as_str(), value, None);
        Ok(result)
    }

    fn post_inner<T, B>(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.target(&Method::POST, url)?;
        let payload = serde_json::to_vec(body).map_err(|e| {
            tracing::warn!(method = "POST", url = %url, error = %e, "encoding body failed");
            ClientError::Encode(e)
        })?;

        let body = self.send(Method::POST, &url, headers, Some(payload), timeout)?;
        let (_, result) = decode::<T>(&Method::POST, &url, &body)?;

        // the server changed state, any cached listing may be stale
        self.cache.clear();
        Ok(result)
    }

    /// Resolve the request URL, logging the attempt if it cannot be built
    fn target(&self, method: &Method, href: &str) -> Result<Url> {
        self.resolve(href).inspect_err(|e| {
            tracing::warn!(method = %method, url = href, error = %e, "invalid request URL");
        })
    }

    /// Execute one authorized request and return the body of a successful response
    fn send(
        &self,
        method: Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<Vec<u8>>,
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>> {
        let authorization = self.authorize().map_err(|e| {
            tracing::warn!(method = %method, url = %url, error = %e, "authorize failed");
            e
        })?;

        let mut request = self
            .transport
            .request(method.clone(), url.clone())
            .headers(headers.clone())
            .header(AUTHORIZATION, authorization);

        if let Some(body) = body {
            request = request.body(body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().map_err(|e| {
            tracing::warn!(method = %method, url = %url, error = %e, "request failed");
            ClientError::Transport(e)
        })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let reason = status.canonical_reason().unwrap_or("unknown status");
            tracing::warn!(method = %method, url = %url, status = status.as_u16(), "{}", reason);
            return Err(ClientError::http_status(status.as_u16(), reason));
        }

        let body = response.bytes().map_err(|e| {
            tracing::warn!(method = %method, url = %url, error = %e, "reading body failed");
            ClientError::Transport(e)
        })?;

        tracing::debug!(method = %method, url = %url, status = status.as_u16(), "OK");
        Ok(body.to_vec())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("signer", &self.signer)
            .field("read_through_cache", &self.config.read_through_cache)
            .finish()
    }
}

/// Decode a body into both the cacheable JSON snapshot and the caller's type
fn decode<T>(method: &Method, url: &Url, body: &[u8]) -> Result<(Value, T)>
where
    T: DeserializeOwned,
{
    let value: Value = serde_json::from_slice(body).map_err(|e| decode_failed(method, url, e))?;
    let result = T::deserialize(&value).map_err(|e| decode_failed(method, url, e))?;
    Ok((value, result))
}

fn decode_failed(method: &Method, url: &Url, error: serde_json::Error) -> ClientError {
    tracing::warn!(method = %method, url = %url, error = %error, "decode failed");
    ClientError::Decode(error)
}
