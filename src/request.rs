//! Handler request context.
//!
//! What a route handler actually receives: the extracted path parameters,
//! the parsed query string, and the decoded JSON body (if any). The body is
//! deliberately untyped — handlers narrow it into a concrete shape
//! themselves instead of trusting field presence.

use std::collections::HashMap;

use http::Method;
use serde_json::Value;

/// An incoming request, routed and decoded, ready for a handler.
pub struct Request {
    method: Method,
    path: String,
    params: HashMap<String, String>,
    query: HashMap<String, Vec<String>>,
    body: Option<Value>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: String,
        params: HashMap<String, String>,
        query: HashMap<String, Vec<String>>,
        body: Option<Value>,
    ) -> Self {
        Self { method, path, params, query, body }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// A named path parameter, already URL-decoded.
    ///
    /// For a route `/listings/:id`, `req.param("id")` on `/listings/42`
    /// returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The first value for a query key.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// Every value for a query key, in order of appearance.
    pub fn query_all(&self, key: &str) -> &[String] {
        self.query.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The decoded JSON body, if the request carried one.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Consumes the context and takes the body. Handlers that build a record
    /// out of the payload use this to avoid cloning it.
    pub fn into_body(self) -> Option<Value> {
        self.body
    }

    /// Parses a raw query string into a multi-value map. Keys may repeat;
    /// values are percent-decoded.
    pub(crate) fn parse_query(raw: Option<&str>) -> HashMap<String, Vec<String>> {
        let mut query: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(raw) = raw {
            for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                query.entry(key.into_owned()).or_default().push(value.into_owned());
            }
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_query(raw: &str) -> Request {
        Request::new(
            Method::GET,
            "/listings".to_owned(),
            HashMap::new(),
            Request::parse_query(Some(raw)),
            None,
        )
    }

    #[test]
    fn query_keys_may_repeat() {
        let req = request_with_query("tag=rare&tag=shiny&limit=5");
        assert_eq!(req.query("tag"), Some("rare"));
        assert_eq!(req.query_all("tag"), ["rare", "shiny"]);
        assert_eq!(req.query("limit"), Some("5"));
        assert!(req.query_all("missing").is_empty());
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let req = request_with_query("seller=alice%20b&note=a%2Fb");
        assert_eq!(req.query("seller"), Some("alice b"));
        assert_eq!(req.query("note"), Some("a/b"));
    }

    #[test]
    fn absent_query_is_empty() {
        let query = Request::parse_query(None);
        assert!(query.is_empty());
    }
}
