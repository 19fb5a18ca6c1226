use crate::error::{ClientError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Link is a navigable pointer to another resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL
    pub href: String,

    /// Any other metadata the server attaches (media type, allowed methods, ...)
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

impl Link {
    /// Create a link with no metadata
    pub fn new(href: impl Into<String>) -> Self {
        Link {
            href: href.into(),
            meta: Map::new(),
        }
    }
}

/// Links maps relation names to links within one hypermedia document.
///
/// Decodes from either an object keyed by relation or a list of links that
/// each carry a `rel` field. A relation that appears twice keeps the last
/// entry. Serializes back as an object, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LinksRepr")]
pub struct Links(IndexMap<String, Link>);

#[derive(Deserialize)]
#[serde(untagged)]
enum LinksRepr {
    Map(IndexMap<String, Link>),
    List(Vec<RelLink>),
}

#[derive(Deserialize)]
struct RelLink {
    rel: String,
    #[serde(flatten)]
    link: Link,
}

impl From<LinksRepr> for Links {
    fn from(repr: LinksRepr) -> Self {
        match repr {
            LinksRepr::Map(map) => Links(map),
            LinksRepr::List(list) => list.into_iter().map(|l| (l.rel, l.link)).collect(),
        }
    }
}

impl FromIterator<(String, Link)> for Links {
    fn from_iter<I: IntoIterator<Item = (String, Link)>>(iter: I) -> Self {
        let mut links = Links::default();
        for (rel, link) in iter {
            links.insert(rel, link);
        }
        links
    }
}

impl Links {
    /// Add or replace the link for a relation
    pub fn insert(&mut self, rel: impl Into<String>, link: Link) {
        let rel = rel.into();
        // shift_remove so a replaced relation moves to its latest position
        self.0.shift_remove(&rel);
        self.0.insert(rel, link);
    }

    /// Look up a relation where absence is tolerable
    pub fn get(&self, rel: &str) -> Result<&Link> {
        self.0.get(rel).ok_or_else(|| ClientError::LinkNotFound {
            rel: rel.to_string(),
        })
    }

    /// Look up a relation the caller cannot proceed without
    pub fn get_link(&self, rel: &str) -> Result<&Link> {
        self.0.get(rel).ok_or_else(|| ClientError::MissingRelation {
            rel: rel.to_string(),
        })
    }

    /// Iterate relations in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Link)> {
        self.0.iter().map(|(rel, link)| (rel.as_str(), link))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
