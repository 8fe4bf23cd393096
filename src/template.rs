//! Path templates for endpoint definitions
//!
//! Handles `{name}` placeholders in endpoint paths such as `users/{id}`.
//! Parameters named in an endpoint's query whitelist are routed to the query
//! string instead of being substituted into the path.

use crate::error::{Error, Result};
use crate::types::{Query, API_VERSION};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Regex for matching path placeholders: {name}
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").unwrap());

/// Bytes escaped in a substituted value so it stays one path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Encode `value` as a single path segment.
///
/// Empty values and dot segments are rejected: URL resolution would collapse
/// them (even percent-encoded) and move the request to another path.
fn encode_segment(name: &str, value: &str) -> Result<String> {
    if matches!(value, "" | "." | "..") {
        return Err(Error::invalid_param(name, value));
    }
    Ok(utf8_percent_encode(value, SEGMENT).to_string())
}

/// Named parameters supplied by the caller of an endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(BTreeMap<String, String>);

impl PathParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a parameter, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Get a parameter
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Take a parameter out of the set
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    /// Whether no parameters are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A versioned endpoint path with `{name}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    template: String,
}

impl PathTemplate {
    /// Create a template; `path` is relative to the versioned API root
    pub fn new(path: &str) -> Self {
        Self {
            template: format!("/{API_VERSION}/{}", path.trim_start_matches('/')),
        }
    }

    /// The full template, e.g. `/v1/users/{id}`
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Names of all placeholders, in order of appearance
    pub fn placeholders(&self) -> Vec<&str> {
        PLACEHOLDER_REGEX
            .captures_iter(&self.template)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str())
            .collect()
    }

    /// Substitute every placeholder from `params`.
    ///
    /// Values are percent-encoded so each fills exactly one segment.
    /// Parameters without a matching placeholder are ignored.
    pub fn render(&self, params: &PathParams) -> Result<String> {
        let mut result = String::with_capacity(self.template.len());
        let mut last = 0;

        for cap in PLACEHOLDER_REGEX.captures_iter(&self.template) {
            let (Some(full_match), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let value = params
                .get(name.as_str())
                .ok_or_else(|| Error::missing_param(name.as_str(), &self.template))?;

            result.push_str(&self.template[last..full_match.start()]);
            result.push_str(&encode_segment(name.as_str(), value)?);
            last = full_match.end();
        }

        result.push_str(&self.template[last..]);
        Ok(result)
    }

    /// Split `params` into a rendered path and query parameters.
    ///
    /// Names listed in `query_names` are moved to the query (in list order)
    /// when they carry a non-empty value; the rest fill the placeholders.
    pub fn resolve(&self, mut params: PathParams, query_names: &[String]) -> Result<(String, Query)> {
        let mut query = Query::new();
        for name in query_names {
            if let Some(value) = params.remove(name) {
                if !value.is_empty() {
                    query.push((name.clone(), value));
                }
            }
        }

        let path = self.render(&params)?;
        Ok((path, query))
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("user", "/v1/user" ; "plain path")]
    #[test_case("/users/{id}", "/v1/users/{id}" ; "leading slash")]
    #[test_case("orgs/{organizationId}/spaces", "/v1/orgs/{organizationId}/spaces" ; "inner placeholder")]
    fn test_versioned_template(path: &str, expected: &str) {
        assert_eq!(PathTemplate::new(path).as_str(), expected);
    }

    #[test]
    fn test_simple_substitution() {
        let template = PathTemplate::new("user/{id}");
        let params = PathParams::new().with("id", "abc");

        let (path, query) = template.resolve(params, &[]).unwrap();
        assert_eq!(path, "/v1/user/abc");
        assert!(query.is_empty());
    }

    #[test]
    fn test_multiple_substitutions() {
        let template = PathTemplate::new("orgs/{org}/spaces/{space}");
        let params = PathParams::new().with("org", "o1").with("space", "s2");

        assert_eq!(template.render(&params).unwrap(), "/v1/orgs/o1/spaces/s2");
    }

    #[test]
    fn test_missing_placeholder() {
        let template = PathTemplate::new("users/{id}");
        let err = template.render(&PathParams::new()).unwrap_err();

        assert!(matches!(
            err,
            Error::MissingPathParam { ref name, ref template } if name == "id" && template == "/v1/users/{id}"
        ));
    }

    #[test_case("a/b", "/v1/users/a%2Fb" ; "slash")]
    #[test_case("a?admin=1", "/v1/users/a%3Fadmin=1" ; "question mark")]
    #[test_case("x#frag", "/v1/users/x%23frag" ; "hash")]
    #[test_case("../orgs", "/v1/users/..%2Forgs" ; "parent traversal")]
    #[test_case("100%", "/v1/users/100%25" ; "percent")]
    #[test_case("a b", "/v1/users/a%20b" ; "space")]
    #[test_case("ünï", "/v1/users/%C3%BCn%C3%AF" ; "non ascii")]
    #[test_case("user.name-1_~", "/v1/users/user.name-1_~" ; "unreserved kept")]
    fn test_values_stay_in_one_segment(id: &str, expected: &str) {
        let template = PathTemplate::new("users/{id}");
        let params = PathParams::new().with("id", id);

        assert_eq!(template.render(&params).unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("." ; "current dir")]
    #[test_case(".." ; "parent dir")]
    fn test_dot_and_empty_segments_rejected(id: &str) {
        let template = PathTemplate::new("users/{id}");
        let err = template
            .render(&PathParams::new().with("id", id))
            .unwrap_err();

        assert!(matches!(err, Error::InvalidPathParam { ref name, ref value } if name == "id" && value == id));
    }

    #[test]
    fn test_extra_params_ignored() {
        let template = PathTemplate::new("user");
        let params = PathParams::new().with("unused", "x");

        assert_eq!(template.render(&params).unwrap(), "/v1/user");
    }

    #[test]
    fn test_query_routing() {
        let template = PathTemplate::new("orgs/{org}/spaces");
        let params: PathParams = [("org", "o1"), ("search", "docs"), ("admin", "")]
            .into_iter()
            .collect();
        let names = vec!["search".to_string(), "admin".to_string()];

        let (path, query) = template.resolve(params, &names).unwrap();
        assert_eq!(path, "/v1/orgs/o1/spaces");
        assert_eq!(query, vec![("search".to_string(), "docs".to_string())]);
    }

    #[test]
    fn test_query_name_never_fills_placeholder() {
        let template = PathTemplate::new("users/{id}");
        let params = PathParams::new().with("id", "abc");
        let names = vec!["id".to_string()];

        assert!(template.resolve(params, &names).is_err());
    }

    #[test]
    fn test_placeholders() {
        let template = PathTemplate::new("orgs/{organizationId}/spaces/{spaceId}");
        assert_eq!(template.placeholders(), vec!["organizationId", "spaceId"]);
        assert!(PathTemplate::new("user").placeholders().is_empty());
    }
}
