//! Access key operations.
//!
//! Each operation starts from the entry point and follows the `accesskeys`
//! relation, so no resource URL other than the base URL is hardcoded.

use crate::error::{ClientError, Result};
use crate::resources::{AccessKey, AccessKeys, EntryPoint, NewAccessKey};
use crate::rest::Client;
use url::Url;

/// Relation on the entry point that locates the access key collection
pub const ACCESS_KEYS_REL: &str = "accesskeys";

impl Client {
    /// Fetch the entry point document
    pub fn entry_point(&self) -> Result<EntryPoint> {
        self.get(self.base_url().as_str(), self.read_headers())
            .inspect_err(|e| tracing::error!(error = %e, "failed to fetch entry point"))
    }

    /// Create a new access key called `name`
    pub fn create_access_key(&self, name: &str) -> Result<AccessKey> {
        let entry = self.entry_point()?;
        let accesskeys = entry
            .links
            .get_link(ACCESS_KEYS_REL)
            .inspect_err(|e| tracing::error!(error = %e, "cannot locate access keys"))?;

        self.post(&accesskeys.href, self.write_headers(), &NewAccessKey { name })
            .inspect_err(|e| tracing::error!(error = %e, name, "failed to create access key"))
    }

    /// List the known access keys
    pub fn access_keys(&self) -> Result<AccessKeys> {
        let entry = self.entry_point()?;
        let accesskeys = entry
            .links
            .get_link(ACCESS_KEYS_REL)
            .inspect_err(|e| tracing::error!(error = %e, "cannot locate access keys"))?;

        self.get(&accesskeys.href, self.read_headers())
            .inspect_err(|e| tracing::error!(error = %e, "failed to list access keys"))
    }

    /// Delete the access key at `self_url`.
    ///
    /// The link is checked against the base URL before any request is made.
    pub fn delete_access_key(&self, self_url: &str) -> Result<()> {
        let url = validate_self_link(self_url, self.base_url())?;
        self.delete(url.as_str(), self.read_headers())
            .inspect_err(|e| tracing::error!(error = %e, url = %url, "failed to delete access key"))
    }
}

/// Check that a self link is an http(s) URL on the same server as `base_url`
pub fn validate_self_link(self_url: &str, base_url: &Url) -> Result<Url> {
    let url = Url::parse(self_url)
        .map_err(|e| ClientError::Validation(format!("invalid self link {:?}: {}", self_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ClientError::Validation(format!(
            "invalid scheme for self link: {}",
            url.scheme()
        )));
    }

    if url.host_str() != base_url.host_str()
        || url.port_or_known_default() != base_url.port_or_known_default()
    {
        return Err(ClientError::Validation(
            "self link is not for this device server".to_string(),
        ));
    }

    Ok(url)
}
