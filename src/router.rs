//! Ordered first-match request router.
//!
//! Patterns are compiled at registration into a list of segment matchers:
//! a segment is either a literal (matched verbatim, case-sensitive) or a
//! `:name` parameter capturing any run of non-slash characters. Dispatch
//! scans the routes in registration order and takes the first whose method
//! and every segment match.
//!
//! First-registered-wins is the tie-break among overlapping patterns:
//! `/items/:id` registered before `/items/new` swallows the literal `new`.
//! No literal-before-parameter precedence exists; register literals first.

use std::collections::HashMap;

use http::Method;

use crate::handler::{BoxedHandler, Handler};

/// One compiled pattern segment.
#[derive(Debug, PartialEq)]
enum Segment {
    Literal(String),
    Param(String),
}

struct Route {
    method: Method,
    segments: Vec<Segment>,
    handler: BoxedHandler,
}

/// The application router: an append-only ordered route table.
///
/// Build it once at startup, then move it into
/// [`Server::serve`](crate::Server::serve) — it is frozen from that point
/// on. Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a handler for a method + pattern pair.
    ///
    /// Path parameters use `:name` syntax — `req.param("name")` retrieves
    /// them:
    ///
    /// ```rust,no_run
    /// # use souk::{Error, Request, Response, Router};
    /// # async fn get_listing(_: Request) -> Result<Response, Error> { todo!() }
    /// # async fn create_listing(_: Request) -> Result<Response, Error> { todo!() }
    /// Router::new()
    ///     .get("/listings/:id", get_listing)
    ///     .post("/listings", create_listing);
    /// ```
    pub fn on(mut self, method: Method, pattern: &str, handler: impl Handler) -> Self {
        self.routes.push(Route {
            method,
            segments: compile(pattern),
            handler: handler.into_boxed_handler(),
        });
        self
    }

    pub fn get(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, pattern, handler)
    }

    pub fn put(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, pattern, handler)
    }

    pub fn patch(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, pattern, handler)
    }

    pub fn delete(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, pattern, handler)
    }

    /// Finds the first registered route matching `method` + `path`.
    ///
    /// The path is normalized exactly like patterns are (trailing slashes
    /// stripped), and captured parameter values are URL-decoded.
    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let path_segments: Vec<&str> = split_segments(path);
        for route in &self.routes {
            if route.method != *method {
                continue;
            }
            if let Some(params) = match_segments(&route.segments, &path_segments) {
                return Some((std::sync::Arc::clone(&route.handler), params));
            }
        }
        None
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles a pattern into its segment matchers. Pure; well-formed patterns
/// cannot fail to compile.
fn compile(pattern: &str) -> Vec<Segment> {
    split_segments(pattern)
        .into_iter()
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => Segment::Param(name.to_owned()),
            _ => Segment::Literal(segment.to_owned()),
        })
        .collect()
}

/// Splits on `/`, dropping empty segments. Strips trailing slashes and
/// collapses the bare root to zero segments, so `/listings/` and
/// `/listings` normalize identically.
fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_segments(
    segments: &[Segment],
    path_segments: &[&str],
) -> Option<HashMap<String, String>> {
    if segments.len() != path_segments.len() {
        return None;
    }
    let mut params = HashMap::new();
    for (segment, &value) in segments.iter().zip(path_segments) {
        match segment {
            Segment::Literal(literal) if literal == value => {}
            Segment::Literal(_) => return None,
            Segment::Param(name) => {
                let decoded = urlencoding::decode(value)
                    .map(std::borrow::Cow::into_owned)
                    .unwrap_or_else(|_| value.to_owned());
                params.insert(name.clone(), decoded);
            }
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::request::Request;
    use crate::response::Response;
    use http::StatusCode;

    async fn ok(_req: Request) -> Result<Response, Error> {
        Ok(Response::status(StatusCode::NO_CONTENT))
    }

    #[test]
    fn compile_splits_literals_and_params() {
        assert_eq!(
            compile("/escrows/:id/accept"),
            vec![
                Segment::Literal("escrows".into()),
                Segment::Param("id".into()),
                Segment::Literal("accept".into()),
            ]
        );
        assert_eq!(compile("/"), Vec::<Segment>::new());
        assert_eq!(compile("/listings/"), vec![Segment::Literal("listings".into())]);
    }

    #[test]
    fn lookup_extracts_params() {
        let router = Router::new().get("/listings/:id", ok);
        let (_, params) = router.lookup(&Method::GET, "/listings/listing_42").unwrap();
        assert_eq!(params["id"], "listing_42");
    }

    #[test]
    fn params_are_url_decoded() {
        let router = Router::new().get("/tents/:name", ok);
        let (_, params) = router.lookup(&Method::GET, "/tents/big%20top").unwrap();
        assert_eq!(params["name"], "big top");
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let router = Router::new().get("/mints", ok);
        assert!(router.lookup(&Method::GET, "/mints/").is_some());
        assert!(router.lookup(&Method::GET, "/mints").is_some());
    }

    #[test]
    fn root_pattern_matches_only_root() {
        let router = Router::new().get("/", ok);
        assert!(router.lookup(&Method::GET, "/").is_some());
        assert!(router.lookup(&Method::GET, "/anything").is_none());
    }

    #[test]
    fn method_must_match_exactly() {
        let router = Router::new().get("/listings", ok);
        assert!(router.lookup(&Method::POST, "/listings").is_none());
    }

    #[test]
    fn no_route_is_none() {
        let router = Router::new().get("/listings", ok);
        assert!(router.lookup(&Method::GET, "/does-not-exist").is_none());
    }

    #[test]
    fn literal_segments_are_case_sensitive() {
        let router = Router::new().get("/listings", ok);
        assert!(router.lookup(&Method::GET, "/Listings").is_none());
    }

    #[test]
    fn first_registered_wins_among_overlaps() {
        // `:id` swallows the literal `new` because it was registered first.
        let router = Router::new().get("/items/:id", ok).get("/items/new", ok);
        let (_, params) = router.lookup(&Method::GET, "/items/new").unwrap();
        assert_eq!(params["id"], "new");
    }

    #[test]
    fn param_does_not_span_segments() {
        let router = Router::new().get("/listings/:id", ok);
        assert!(router.lookup(&Method::GET, "/listings/a/b").is_none());
    }
}
