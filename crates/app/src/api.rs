//! HTTP client for the storefront API.

use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::errors::CartError;

#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base: Url,
    assets: Url,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a client for `base`; relative image paths resolve against `assets`,
    /// or against `base` when no asset URL is configured.
    ///
    /// # Errors
    ///
    /// Returns an error when either URL cannot be parsed.
    pub fn new(base: &str, assets: Option<&str>) -> Result<Self, CartError> {
        let base = parse_base(base)?;
        let assets = match assets {
            Some(assets) => parse_base(assets)?,
            None => base.clone(),
        };

        Ok(Self {
            http: Client::new(),
            base,
            assets,
            token: RwLock::new(None),
        })
    }

    /// Use `token` as the bearer token for subsequent requests.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    /// Make an image URL absolute, dropping blank values.
    pub fn normalize_image_url(&self, raw: &str) -> Option<String> {
        normalize_image_url(&self.assets, raw)
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails, the server rejects it, or the
    /// body cannot be decoded.
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, CartError> {
        self.execute(self.request(Method::GET, segments)?).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails, the server rejects it, or the
    /// body cannot be decoded.
    pub async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T, CartError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::POST, segments)?.json(body))
            .await
    }

    /// `PATCH` a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails, the server rejects it, or the
    /// body cannot be decoded.
    pub async fn patch<B, T>(&self, segments: &[&str], body: &B) -> Result<T, CartError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::PATCH, segments)?.json(body))
            .await
    }

    /// `DELETE` a resource.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails, the server rejects it, or the
    /// body cannot be decoded.
    pub async fn delete<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, CartError> {
        self.execute(self.request(Method::DELETE, segments)?).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CartError> {
        let mut url = self.base.clone();

        url.path_segments_mut()
            .map_err(|()| CartError::Endpoint {
                base: self.base.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, CartError> {
        let url = self.endpoint(segments)?;

        debug!(%method, %url, "api request");

        let request = self.http.request(method, url);

        Ok(match self.token.read().as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, CartError> {
        let response = request.send().await.map_err(CartError::from_transport)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(CartError::from_status(status.as_u16(), &body));
        }

        response.json().await.map_err(CartError::from_transport)
    }
}

fn parse_base(raw: &str) -> Result<Url, CartError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    Url::parse(&with_slash).map_err(|error| {
        debug!(%error, raw, "invalid base url");

        CartError::Endpoint {
            base: raw.to_string(),
        }
    })
}

/// Resolve an image reference against `assets`.
///
/// Absolute `http(s)` URLs are kept, protocol-relative URLs take the asset
/// scheme, and anything else is joined onto the asset base. Blank values are
/// dropped.
pub fn normalize_image_url(assets: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();

    if raw.is_empty() {
        return None;
    }

    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(raw.to_string());
    }

    if raw.starts_with("//") {
        return Some(format!("{}:{raw}", assets.scheme()));
    }

    assets.join(raw).ok().map(String::from)
}
