//! # deviceserver - device server REST client
//!
//! An authenticated client for the device server's hypermedia API. Resource
//! URLs are discovered by following named relations from the entry point
//! instead of being hardcoded.
//!
//! ## Features
//!
//! - Short-lived HMAC-signed bearer tokens minted for every request
//! - Generic JSON decoding into caller-chosen types
//! - Hypermedia link resolution with distinct errors for optional and required relations
//! - Time-bounded response cache with an opt-in read-through mode
//! - Classified errors for configuration, auth, transport, status, decoding and validation failures
//!
//! ## Basic Usage
//!
//! ```no_run
//! use deviceserver::{Client, Config};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(Config::new("https://ds.example.com/", "pre-shared-key"))?;
//!
//!     let key = client.create_access_key("ci")?;
//!     println!("{} = {}", key.name, key.key);
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Following links
//!
//! ```no_run
//! use deviceserver::{AccessKeys, Client, Config};
//!
//! let client = Client::new(Config::new("https://ds.example.com/", "psk"))?;
//! let entry = client.entry_point()?;
//! let href = &entry.links.get_link("accesskeys")?.href;
//! let keys: AccessKeys = client.get(href, client.read_headers())?;
//! # Ok::<(), deviceserver::ClientError>(())
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod keys;
pub mod links;
pub mod resources;
pub mod rest;
pub mod token;

// Re-export main types for convenience
pub use cache::Cache;
pub use client::Config;
pub use error::{ClientError, Result};
pub use keys::{validate_self_link, ACCESS_KEYS_REL};
pub use links::{Link, Links};
pub use resources::{AccessKey, AccessKeys, EntryPoint, NewAccessKey};
pub use rest::Client;
pub use token::{OrgClaim, Signer};
