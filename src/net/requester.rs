//! Request preparation and exchange handling.
//!
//! A request is prepared synchronously, reading the form at call time, and
//! then performed on the [`Transport`]. Preparation and the exchange are
//! split so a command can serialize its form before spawning the send.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;
use url::Url;

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::form::serialize_form;
use crate::runtime::SxOptions;
use crate::value::Record;

use super::{HttpRequest, Method, Transport};

// ============================================================================
// RequestSpec
// ============================================================================

/// What a command asked to send.
///
/// Kept by the command so polling can replay it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// HTTP method.
    pub method: Method,

    /// URL as given, before joining against the base.
    pub url: String,

    /// Selector of the form whose data is posted.
    pub form: Option<String>,
}

impl RequestSpec {
    /// Creates a request description.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>, form: Option<&str>) -> Self {
        Self {
            method,
            url: url.into(),
            form: form.map(str::to_string),
        }
    }
}

// ============================================================================
// Exchange
// ============================================================================

/// A successful exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exchange {
    /// Raw response text.
    pub text: String,

    /// Response parsed as a keyed value, when it is one.
    pub structured: Option<Record>,
}

impl Exchange {
    /// Wraps response text, parsing it best-effort.
    #[must_use]
    pub fn from_text(text: String) -> Self {
        let structured = parse_structured(&text);
        Self { text, structured }
    }
}

/// Parses response text as a keyed value.
///
/// Returns `None` for anything that is not a JSON object; this is never an
/// error because most responses are markup.
#[must_use]
pub fn parse_structured(text: &str) -> Option<Record> {
    match Record::parse(text) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(error = %e, "Response is not structured");
            None
        }
    }
}

// ============================================================================
// Preparation
// ============================================================================

/// Builds the wire request for `spec`.
///
/// A POST with a form serializes it now and sends it as JSON, with the
/// CSRF token header when the form carries one. Other requests carry no
/// body.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if the URL cannot be joined to the base
/// - [`Error::ElementNotFound`] if the form selector matches nothing
/// - [`Error::NotAForm`] if it matches something other than a form
pub fn prepare(document: &dyn Document, options: &SxOptions, spec: &RequestSpec) -> Result<HttpRequest> {
    let url = resolve_url(options.base_url.as_ref(), &spec.url)?;
    let mut request = HttpRequest::new(spec.method, url);

    if spec.method == Method::Post
        && let Some(selector) = &spec.form
    {
        let form = document
            .query(selector)
            .ok_or_else(|| Error::element_not_found(selector))?;
        if !document.kind(form).is_some_and(|kind| kind.is_form()) {
            return Err(Error::not_a_form(selector));
        }

        let serialized = serialize_form(document, form, &options.csrf_field);
        request
            .headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        if let Some(token) = serialized.csrf_token {
            request.headers.push((options.csrf_header.clone(), token));
        }
        request.body = Some(serialized.data.to_json_string()?);
    }

    Ok(request)
}

/// Joins `url` against `base`, or passes it through when there is no base.
fn resolve_url(base: Option<&Url>, url: &str) -> Result<String> {
    match base {
        Some(base) => Ok(base.join(url)?.to_string()),
        None => Ok(url.to_string()),
    }
}

// ============================================================================
// Exchange
// ============================================================================

/// Sends `request` and checks the status.
///
/// # Errors
///
/// - [`Error::Transport`] for a non-2xx status
/// - Whatever the transport returns when the exchange itself fails
pub async fn perform(transport: &dyn Transport, request: HttpRequest) -> Result<Exchange> {
    let method = request.method;
    let url = request.url.clone();
    debug!(%method, url = %url, body = request.body.is_some(), "Sending request");

    let response = transport.send(request).await?;
    if !response.is_success() {
        return Err(Error::transport(response.status, url));
    }

    let exchange = Exchange::from_text(response.body);
    debug!(
        %method,
        url = %url,
        status = response.status,
        structured = exchange.structured.is_some(),
        "Response received"
    );
    Ok(exchange)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dom::MemoryDocument;
    use crate::testing::MockTransport;

    fn login_form(doc: &MemoryDocument, token: &str) {
        let form = doc.append(doc.body(), "form", &[("id", "login")]);
        doc.append(form, "input", &[("name", "user"), ("value", "ada")]);
        doc.append(form, "input", &[("name", "_csrf"), ("type", "hidden"), ("value", token)]);
    }

    #[test]
    fn test_post_serializes_form_with_csrf() {
        let doc = MemoryDocument::new();
        login_form(&doc, "tok");
        let spec = RequestSpec::new(Method::Post, "/login", Some("#login"));

        let request = prepare(&doc, &SxOptions::default(), &spec).unwrap();

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("X-CSRF-TOKEN"), Some("tok"));
        assert_eq!(
            request.body.as_deref(),
            Some(r#"{"user":"ada","_csrf":"tok"}"#)
        );
    }

    #[test]
    fn test_post_without_token_has_no_csrf_header() {
        let doc = MemoryDocument::new();
        login_form(&doc, "");
        let spec = RequestSpec::new(Method::Post, "/login", Some("#login"));

        let request = prepare(&doc, &SxOptions::default(), &spec).unwrap();

        assert_eq!(request.header("X-CSRF-TOKEN"), None);
    }

    #[test]
    fn test_post_without_form_has_no_body() {
        let doc = MemoryDocument::new();
        let spec = RequestSpec::new(Method::Post, "/ping", None);

        let request = prepare(&doc, &SxOptions::default(), &spec).unwrap();

        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_get_ignores_form() {
        let doc = MemoryDocument::new();
        login_form(&doc, "tok");
        let spec = RequestSpec::new(Method::Get, "/items", Some("#login"));

        let request = prepare(&doc, &SxOptions::default(), &spec).unwrap();

        assert!(request.body.is_none());
    }

    #[test]
    fn test_form_resolution_errors() {
        let doc = MemoryDocument::new();
        doc.append(doc.body(), "div", &[("id", "box")]);
        let options = SxOptions::default();

        let missing = RequestSpec::new(Method::Post, "/x", Some("#nope"));
        assert_eq!(
            prepare(&doc, &options, &missing).unwrap_err(),
            Error::element_not_found("#nope")
        );

        let not_form = RequestSpec::new(Method::Post, "/x", Some("#box"));
        assert_eq!(
            prepare(&doc, &options, &not_form).unwrap_err(),
            Error::not_a_form("#box")
        );
    }

    #[test]
    fn test_base_url_join() {
        let doc = MemoryDocument::new();
        let options =
            SxOptions::new().with_base_url(Url::parse("https://example.com/app/").unwrap());

        let request = prepare(&doc, &options, &RequestSpec::new(Method::Get, "items", None)).unwrap();
        assert_eq!(request.url, "https://example.com/app/items");

        let request = prepare(&doc, &options, &RequestSpec::new(Method::Get, "/root", None)).unwrap();
        assert_eq!(request.url, "https://example.com/root");
    }

    #[test]
    fn test_parse_structured() {
        assert!(parse_structured(r#"{"a":1}"#).is_some());
        assert!(parse_structured("[1,2]").is_none());
        assert!(parse_structured("<li>x</li>").is_none());
    }

    #[tokio::test]
    async fn test_perform_success() {
        let transport = MockTransport::new();
        transport.route(Method::Get, "/items", 200, r#"{"name":"a"}"#);

        let exchange = perform(transport.as_ref(), HttpRequest::new(Method::Get, "/items"))
            .await
            .unwrap();

        assert_eq!(exchange.text, r#"{"name":"a"}"#);
        assert_eq!(exchange.structured.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_perform_error_status() {
        let transport = MockTransport::new();
        transport.route(Method::Get, "/boom", 500, "oops");

        let err = perform(transport.as_ref(), HttpRequest::new(Method::Get, "/boom"))
            .await
            .unwrap_err();

        assert!(err.is_transport_error());
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_perform_network_failure() {
        let transport = MockTransport::new();
        transport.fail(Method::Get, "/down", "connection refused");

        let err = perform(transport.as_ref(), HttpRequest::new(Method::Get, "/down"))
            .await
            .unwrap_err();

        assert_eq!(err, Error::network("connection refused"));
    }
}
