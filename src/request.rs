//! Typed request builder: path templates, parameters and cache keys.
//!
//! A template such as `/pokemon/[id]` is parsed once into literal and
//! placeholder segments. Resolving it against [`Params`] yields the request
//! URL and a [`CacheKey`] that depends only on the template and the parameter
//! values, never on the order they were inserted in.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Errors raised while turning a template and parameters into a request.
///
/// These indicate a programming error at the call site and are never
/// retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
  #[error("missing parameter '{name}' for template '{template}'")]
  MissingParameter { template: String, name: String },

  #[error("malformed template '{template}': {reason}")]
  MalformedTemplate { template: String, reason: &'static str },

  /// The value would not survive as a path segment (`.`, `..`, empty).
  #[error("parameter '{name}' of template '{template}' cannot be a path segment: '{value}'")]
  InvalidParameter {
    template: String,
    name: String,
    value: String,
  },

  #[error("invalid url '{url}': {reason}")]
  InvalidUrl { url: String, reason: String },
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
  Text(String),
  Number(i64),
}

impl fmt::Display for ParamValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParamValue::Text(s) => f.write_str(s),
      ParamValue::Number(n) => write!(f, "{}", n),
    }
  }
}

impl From<&str> for ParamValue {
  fn from(value: &str) -> Self {
    ParamValue::Text(value.to_string())
  }
}

impl From<String> for ParamValue {
  fn from(value: String) -> Self {
    ParamValue::Text(value)
  }
}

impl From<i64> for ParamValue {
  fn from(value: i64) -> Self {
    ParamValue::Number(value)
  }
}

impl From<i32> for ParamValue {
  fn from(value: i32) -> Self {
    ParamValue::Number(value.into())
  }
}

impl From<u32> for ParamValue {
  fn from(value: u32) -> Self {
    ParamValue::Number(value.into())
  }
}

/// Parameter map for a request. Iteration is always sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style insert.
  pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
    self.insert(name, value);
    self
  }

  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
    self.0.insert(name.into(), value.into());
  }

  pub fn get(&self, name: &str) -> Option<&ParamValue> {
    self.0.get(name)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut params = Params::new();
    for (name, value) in iter {
      params.insert(name, value);
    }
    params
  }
}

/// Deterministic identifier of a resolved request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
  /// Wrap an already-canonical key.
  pub fn new(key: impl Into<String>) -> Self {
    Self(key.into())
  }

  /// Key for `template` with `params`: the template followed by the
  /// name-sorted, percent-encoded parameters.
  pub fn for_request(template: &str, params: &Params) -> Self {
    if params.is_empty() {
      return Self(template.to_string());
    }

    let query = params
      .iter()
      .map(|(name, value)| {
        format!(
          "{}={}",
          urlencoding::encode(name),
          urlencoding::encode(&value.to_string())
        )
      })
      .collect::<Vec<_>>()
      .join("&");

    Self(format!("{}?{}", template, query))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
  Literal(String),
  Placeholder(String),
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
  source: String,
  segments: Vec<Segment>,
}

impl PathTemplate {
  pub fn parse(source: &str) -> Result<Self, RequestError> {
    let malformed = |reason| RequestError::MalformedTemplate {
      template: source.to_string(),
      reason,
    };

    let mut segments = Vec::new();
    let mut rest = source;

    while let Some(open) = rest.find(['[', ']']) {
      if rest[open..].starts_with(']') {
        return Err(malformed("unmatched ']'"));
      }

      if open > 0 {
        segments.push(Segment::Literal(rest[..open].to_string()));
      }

      let after = &rest[open + 1..];
      let close = after
        .find(['[', ']'])
        .filter(|&i| after[i..].starts_with(']'))
        .ok_or_else(|| malformed("unterminated placeholder"))?;

      let name = after[..close].trim();
      if name.is_empty() {
        return Err(malformed("empty placeholder"));
      }
      segments.push(Segment::Placeholder(name.to_string()));
      rest = &after[close + 1..];
    }

    if !rest.is_empty() {
      segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(Self {
      source: source.to_string(),
      segments,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.source
  }

  /// Placeholder names in template order.
  pub fn placeholders(&self) -> impl Iterator<Item = &str> {
    self.segments.iter().filter_map(|s| match s {
      Segment::Placeholder(name) => Some(name.as_str()),
      Segment::Literal(_) => None,
    })
  }

  pub fn has_placeholder(&self, name: &str) -> bool {
    self.placeholders().any(|p| p == name)
  }

  /// Substitute every placeholder with its percent-encoded value.
  pub fn render(&self, params: &Params) -> Result<String, RequestError> {
    let mut path = String::with_capacity(self.source.len());

    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => path.push_str(text),
        Segment::Placeholder(name) => {
          let value = params
            .get(name)
            .ok_or_else(|| RequestError::MissingParameter {
              template: self.source.clone(),
              name: name.clone(),
            })?;
          // URL parsing collapses dot segments, even percent-encoded ones
          let text = value.to_string();
          if matches!(text.as_str(), "" | "." | "..") {
            return Err(RequestError::InvalidParameter {
              template: self.source.clone(),
              name: name.clone(),
              value: text,
            });
          }
          path.push_str(&urlencoding::encode(&text));
        }
      }
    }

    Ok(path)
  }
}

/// A fully resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
  pub url: Url,
  pub key: CacheKey,
}

/// Resolves templates against a base URL, memoizing parsed templates.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
  base_url: Url,
  templates: HashMap<String, PathTemplate>,
}

impl RequestBuilder {
  pub fn new(base_url: Url) -> Self {
    Self {
      base_url,
      templates: HashMap::new(),
    }
  }

  /// Resolve `template` with `params` into a URL and cache key.
  ///
  /// Parameters that don't name a placeholder are appended as a query
  /// string, sorted by name.
  pub fn resolve(
    &mut self,
    template: &str,
    params: &Params,
  ) -> Result<ResolvedRequest, RequestError> {
    let parsed = match self.templates.entry(template.to_string()) {
      Entry::Occupied(e) => e.into_mut(),
      Entry::Vacant(e) => e.insert(PathTemplate::parse(template)?),
    };

    let path = parsed.render(params)?;
    let raw = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
    let mut url = Url::parse(&raw).map_err(|e| RequestError::InvalidUrl {
      url: raw.clone(),
      reason: e.to_string(),
    })?;

    let mut extra = params
      .iter()
      .filter(|(name, _)| !parsed.has_placeholder(name))
      .peekable();
    if extra.peek().is_some() {
      let mut pairs = url.query_pairs_mut();
      for (name, value) in extra {
        pairs.append_pair(name, &value.to_string());
      }
    }

    Ok(ResolvedRequest {
      url,
      key: CacheKey::for_request(template, params),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn builder() -> RequestBuilder {
    RequestBuilder::new(Url::parse("https://pokeapi.co/api/v2").unwrap())
  }

  #[test]
  fn test_parse_placeholders() {
    let template = PathTemplate::parse("/pokemon/[id]/encounters/[area]").unwrap();
    let names: Vec<_> = template.placeholders().collect();
    assert_eq!(names, vec!["id", "area"]);
    assert_eq!(template.as_str(), "/pokemon/[id]/encounters/[area]");
  }

  #[test]
  fn test_parse_without_placeholders() {
    let template = PathTemplate::parse("/pokemon").unwrap();
    assert_eq!(template.placeholders().count(), 0);
    assert_eq!(template.render(&Params::new()).unwrap(), "/pokemon");
  }

  #[test]
  fn test_parse_malformed_templates() {
    for source in ["/pokemon/[id", "/pokemon/[]", "/pokemon/id]", "/a/[b[c]]"] {
      let err = PathTemplate::parse(source).unwrap_err();
      assert!(
        matches!(err, RequestError::MalformedTemplate { .. }),
        "{} parsed as {:?}",
        source,
        err
      );
    }
  }

  #[test]
  fn test_resolve_pokemon_url() {
    let request = builder()
      .resolve("/pokemon/[id]", &Params::new().with("id", "1"))
      .unwrap();
    assert_eq!(request.url.as_str(), "https://pokeapi.co/api/v2/pokemon/1");
    assert!(request.url.path().ends_with("/pokemon/1"));
    assert_eq!(request.key.as_str(), "/pokemon/[id]?id=1");
  }

  #[test]
  fn test_missing_parameter() {
    let err = builder()
      .resolve("/pokemon/[id]", &Params::new())
      .unwrap_err();
    assert_eq!(
      err,
      RequestError::MissingParameter {
        template: "/pokemon/[id]".to_string(),
        name: "id".to_string(),
      }
    );
  }

  #[test]
  fn test_number_and_text_share_key() {
    let mut b = builder();
    let text = b
      .resolve("/pokemon/[id]", &Params::new().with("id", "25"))
      .unwrap();
    let number = b
      .resolve("/pokemon/[id]", &Params::new().with("id", 25))
      .unwrap();
    assert_eq!(text, number);
  }

  #[test]
  fn test_extra_params_become_sorted_query() {
    let params: Params = [("offset", 0), ("limit", 21)].into_iter().collect();
    let request = builder().resolve("/pokemon", &params).unwrap();
    assert_eq!(request.url.query(), Some("limit=21&offset=0"));
    assert_eq!(request.key.as_str(), "/pokemon?limit=21&offset=0");
  }

  #[test]
  fn test_values_are_percent_encoded() {
    let request = builder()
      .resolve("/pokemon/[name]", &Params::new().with("name", "mr mime/x"))
      .unwrap();
    assert_eq!(request.url.path(), "/api/v2/pokemon/mr%20mime%2Fx");
  }

  #[test]
  fn test_dot_segment_values_rejected() {
    let mut b = builder();
    for value in ["..", ".", ""] {
      let err = b
        .resolve("/pokemon/[id]", &Params::new().with("id", value))
        .unwrap_err();
      assert_eq!(
        err,
        RequestError::InvalidParameter {
          template: "/pokemon/[id]".to_string(),
          name: "id".to_string(),
          value: value.to_string(),
        }
      );
    }

    // Dots inside a value are ordinary characters
    let request = b
      .resolve("/pokemon/[name]", &Params::new().with("name", "mr.mime"))
      .unwrap();
    assert_eq!(request.url.path(), "/api/v2/pokemon/mr.mime");
  }

  #[test]
  fn test_key_escapes_separators() {
    let joined = CacheKey::for_request("/search", &Params::new().with("q", "a=1&b=2"));
    let split = CacheKey::for_request(
      "/search",
      &Params::new().with("q", "a").with("b", "2"),
    );
    assert_ne!(joined, split);
  }

  #[test]
  fn test_templates_are_memoized() {
    let mut b = builder();
    b.resolve("/pokemon/[id]", &Params::new().with("id", 1))
      .unwrap();
    b.resolve("/pokemon/[id]", &Params::new().with("id", 2))
      .unwrap();
    assert_eq!(b.templates.len(), 1);
  }

  proptest! {
    #[test]
    fn prop_key_ignores_insertion_order(
      pairs in prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9 ]{0,6}", 0..6)
    ) {
      let forward: Params = pairs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
      let backward: Params = pairs.iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect();

      let mut b = builder();
      let a = b.resolve("/items", &forward).unwrap();
      let z = b.resolve("/items", &backward).unwrap();
      prop_assert_eq!(a.key, z.key);
      prop_assert_eq!(a.url, z.url);
    }

    #[test]
    fn prop_missing_placeholder_always_fails(
      pairs in prop::collection::btree_map("[a-h]{1,4}", "[0-9]{1,3}", 0..4)
    ) {
      let params: Params = pairs.into_iter().collect();
      let err = builder().resolve("/pokemon/[zz]", &params).unwrap_err();
      let is_missing = matches!(err, RequestError::MissingParameter { .. });
      prop_assert!(is_missing);
    }
  }
}
