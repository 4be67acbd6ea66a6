//! Typed queries derived from inbound request paths.

use std::borrow::Cow;

/// Cache key used for the full site listing.
///
/// Site topologies are keyed by their bare site id, so `/site/allsites`
/// reads and writes the same entry as the listing.
pub const ALL_SITES_KEY: &str = "allsites";

/// A backend lookup resolved from a request path.
///
/// Queries are never stored; they exist only for the lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `site/{site_id}` - every link in the site topology.
    SiteTopology { site_id: String },
    /// `site/{site_id}/{swi|path}/{path_id}` - a single link record.
    SitePath { site_id: String, path_id: String },
    /// The full site listing, reached through its own route.
    SitesList,
}

impl Query {
    /// Parses a request path into a topology query.
    ///
    /// The path is percent-decoded first (`/site/A%20B` names site `A B`);
    /// a path that does not decode to UTF-8 is matched as written. Leading
    /// and trailing slashes are ignored and the literal segments (`site`,
    /// `swi`, `path`) match case-insensitively. Identifiers are kept as
    /// written.
    ///
    /// Returns `None` for any other shape, including the bare `site` path
    /// (the listing is routed separately).
    ///
    /// # Examples
    ///
    /// ```
    /// use topology_gateway::domain::entities::Query;
    ///
    /// assert_eq!(
    ///     Query::parse("/site/SITE123/"),
    ///     Some(Query::SiteTopology { site_id: "SITE123".into() })
    /// );
    /// assert_eq!(Query::parse("/site/SITE123/bar/P1"), None);
    /// ```
    pub fn parse(path: &str) -> Option<Self> {
        let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
        let segments: Vec<&str> = decoded.trim_matches('/').split('/').collect();

        match segments.as_slice() {
            [site, site_id] if site.eq_ignore_ascii_case("site") && !site_id.is_empty() => {
                Some(Self::SiteTopology {
                    site_id: (*site_id).to_string(),
                })
            }
            [site, site_id, kind, path_id]
                if site.eq_ignore_ascii_case("site")
                    && (kind.eq_ignore_ascii_case("swi") || kind.eq_ignore_ascii_case("path"))
                    && !site_id.is_empty()
                    && !path_id.is_empty() =>
            {
                Some(Self::SitePath {
                    site_id: (*site_id).to_string(),
                    path_id: (*path_id).to_string(),
                })
            }
            _ => None,
        }
    }

    /// Returns the cache key this query reads and writes.
    pub fn cache_key(&self) -> &str {
        match self {
            Self::SiteTopology { site_id } | Self::SitePath { site_id, .. } => site_id,
            Self::SitesList => ALL_SITES_KEY,
        }
    }
}
