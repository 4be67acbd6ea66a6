//! Topology and site payloads returned by the controller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field that identifies a link record within a topology document.
pub const PATH_ID_FIELD: &str = "path_id";

/// A single link (SWI/path) record.
///
/// Only `path_id` is interpreted by the gateway; all other attributes are
/// backend-defined and passed through untouched.
pub type LinkRecord = Value;

/// Site topology as returned by a `basenet` query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyDocument {
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

impl TopologyDocument {
    /// Reads the document out of a raw controller payload.
    ///
    /// A payload without a usable `links` array yields an empty document.
    pub fn from_payload(payload: &Value) -> Self {
        let links = payload
            .get("links")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Self { links }
    }

    /// Returns the first link whose `path_id` equals `path_id`.
    ///
    /// Later records sharing the same identifier are ignored.
    pub fn find_link(&self, path_id: &str) -> Option<&LinkRecord> {
        self.links
            .iter()
            .find(|link| link_path_id(link).as_deref() == Some(path_id))
    }
}

/// Reads a link's `path_id`, accepting string or numeric identifiers.
fn link_path_id(link: &LinkRecord) -> Option<String> {
    match link.get(PATH_ID_FIELD)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Site listing payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitesPayload {
    #[serde(default)]
    pub items: Vec<Value>,
}

impl SitesPayload {
    /// Reads the `items` sequence out of a raw controller payload.
    pub fn from_payload(payload: &Value) -> Self {
        let items = payload
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Self { items }
    }
}
