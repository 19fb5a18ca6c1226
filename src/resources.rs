use crate::links::Links;
use serde::{Deserialize, Serialize};

/// EntryPoint is the root document every other resource is discovered from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntryPoint {
    #[serde(default)]
    pub links: Links,
}

/// AccessKey is a named key/secret pair issued by the device server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessKey {
    pub name: String,

    #[serde(default)]
    pub key: String,

    /// Only returned when the key is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    #[serde(default)]
    pub links: Links,
}

/// AccessKeys is a page of access keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessKeys {
    #[serde(default)]
    pub items: Vec<AccessKey>,

    #[serde(default)]
    pub links: Links,
}

/// Request body for creating an access key
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewAccessKey<'a> {
    pub name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_access_key_deserialization() {
        let key: AccessKey = serde_json::from_value(json!({
            "Name": "ci",
            "Key": "k-123",
            "Secret": "s3cr3t",
            "Links": [{"rel": "self", "href": "https://ds.example.com/keys/1"}]
        }))
        .unwrap();

        assert_eq!(key.name, "ci");
        assert_eq!(key.key, "k-123");
        assert_eq!(key.secret.as_deref(), Some("s3cr3t"));
        assert_eq!(key.links.get("self").unwrap().href, "https://ds.example.com/keys/1");
    }

    #[test]
    fn test_new_access_key_body() {
        let body = serde_json::to_string(&NewAccessKey { name: "foo" }).unwrap();
        assert_eq!(body, r#"{"Name":"foo"}"#);

        // names are escaped rather than spliced into the document
        let body = serde_json::to_value(NewAccessKey { name: "a\"b" }).unwrap();
        assert_eq!(body, json!({"Name": "a\"b"}));
    }

    #[test]
    fn test_entry_point_without_links() {
        let entry: EntryPoint = serde_json::from_value(json!({})).unwrap();
        assert!(entry.links.is_empty());
    }
}
