//! Request routing.

use tiny_http::Method;

use crate::core::{DocumentName, LiveError};

/// Where a request goes.
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    /// `GET /watch/:page`
    Watch(DocumentName),
    /// `GET /edit/:page`
    Edit(DocumentName),
    /// `/quiz`, signals in the query (GET) or the body
    Quiz { query: String, from_body: bool },
    /// `GET /page/*`
    Page(String),
    MethodNotAllowed(&'static str),
    NotFound,
}

/// Match `url` (path plus optional query) to a route.
///
/// A document segment that is not a valid name fails with `MalformedSignal`.
pub fn route(method: &Method, url: &str) -> Result<Route, LiveError> {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    if let Some(rest) = path.strip_prefix("/page/") {
        return Ok(if matches!(method, Method::Get | Method::Head) {
            Route::Page(rest.to_string())
        } else {
            Route::MethodNotAllowed("GET, HEAD")
        });
    }

    if matches!(path, "/quiz" | "/teacher") {
        return Ok(match method {
            Method::Get => Route::Quiz {
                query: query.to_string(),
                from_body: false,
            },
            Method::Post | Method::Put | Method::Patch => Route::Quiz {
                query: query.to_string(),
                from_body: true,
            },
            _ => Route::MethodNotAllowed("GET, POST, PUT, PATCH"),
        });
    }

    let Some((kind, segment)) = path.trim_start_matches('/').split_once('/') else {
        return Ok(Route::NotFound);
    };
    if segment.is_empty() || segment.contains('/') || !matches!(kind, "watch" | "edit") {
        return Ok(Route::NotFound);
    }
    if *method != Method::Get {
        return Ok(Route::MethodNotAllowed("GET"));
    }

    let name = DocumentName::from_segment(segment)?;
    Ok(match kind {
        "watch" => Route::Watch(name),
        _ => Route::Edit(name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> DocumentName {
        DocumentName::parse(raw).unwrap()
    }

    #[test]
    fn test_document_routes() {
        assert_eq!(route(&Method::Get, "/watch/a.html").unwrap(), Route::Watch(name("a.html")));
        assert_eq!(route(&Method::Get, "/edit/a.html?x=1").unwrap(), Route::Edit(name("a.html")));
        assert_eq!(
            route(&Method::Get, "/watch/my%20page.html").unwrap(),
            Route::Watch(name("my page.html"))
        );
    }

    #[test]
    fn test_bad_document_segment() {
        assert!(matches!(
            route(&Method::Get, "/watch/..%2Fsecret"),
            Err(LiveError::MalformedSignal(_))
        ));
        assert_eq!(route(&Method::Get, "/watch/").unwrap(), Route::NotFound);
        assert_eq!(route(&Method::Get, "/watch/a/b").unwrap(), Route::NotFound);
    }

    #[test]
    fn test_quiz_routes() {
        assert_eq!(
            route(&Method::Get, "/quiz?datastar=%7B%7D").unwrap(),
            Route::Quiz {
                query: "datastar=%7B%7D".into(),
                from_body: false
            }
        );
        assert!(matches!(
            route(&Method::Post, "/teacher").unwrap(),
            Route::Quiz { from_body: true, .. }
        ));
        assert!(matches!(
            route(&Method::Delete, "/quiz").unwrap(),
            Route::MethodNotAllowed(_)
        ));
    }

    #[test]
    fn test_page_and_fallback() {
        assert_eq!(
            route(&Method::Head, "/page/style.css").unwrap(),
            Route::Page("style.css".into())
        );
        assert_eq!(route(&Method::Get, "/").unwrap(), Route::NotFound);
        assert_eq!(route(&Method::Get, "/other/a.html").unwrap(), Route::NotFound);
        assert_eq!(
            route(&Method::Post, "/edit/a.html").unwrap(),
            Route::MethodNotAllowed("GET")
        );
    }

    #[test]
    fn test_head_does_not_open_document_routes() {
        assert_eq!(
            route(&Method::Head, "/watch/a.html").unwrap(),
            Route::MethodNotAllowed("GET")
        );
        assert_eq!(
            route(&Method::Head, "/edit/a.html").unwrap(),
            Route::MethodNotAllowed("GET")
        );
    }
}
