//! Operator-injection sanitizer.
//!
//! Removes keys that a document-store query language would interpret as
//! operators: keys starting with `$` or containing `.`. Applies to the
//! parsed JSON body (recursively) and to the query string, including
//! bracketed keys such as `price[$gt]`. Path parameters are named by the
//! route templates of each collaborator, so they never carry such keys.
//!
//! Only removes, never rejects.

use axum::{
    body::Body,
    extract::{OriginalUri, Request},
    http::{header, uri::PathAndQuery, HeaderValue, Uri},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use url::form_urlencoded;

use crate::http::error::ApiError;
use crate::security::limits::JsonBody;

/// True for keys that must not reach a query builder.
pub fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// Strip operator keys from `value` in place, at any depth.
///
/// Returns the number of keys removed.
pub fn sanitize_value(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => {
            let before = map.len();
            map.retain(|key, _| !is_operator_key(key));
            let removed = before - map.len();
            removed + map.values_mut().map(sanitize_value).sum::<usize>()
        }
        Value::Array(items) => items.iter_mut().map(sanitize_value).sum(),
        _ => 0,
    }
}

/// Drop query pairs whose key, or any bracketed segment of it, is an
/// operator key. Returns the rebuilt query and the number of pairs removed.
pub fn sanitize_query(query: &str) -> (String, usize) {
    let mut removed = 0;
    let mut clean = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if query_key_is_clean(&key) {
            clean.append_pair(&key, &value);
        } else {
            removed += 1;
        }
    }
    (clean.finish(), removed)
}

fn query_key_is_clean(key: &str) -> bool {
    key.split(['[', ']'])
        .filter(|segment| !segment.is_empty())
        .all(|segment| !is_operator_key(segment))
}

/// Middleware sanitizing the query string and the pre-parsed JSON body.
///
/// The URI as received is preserved in [`OriginalUri`] for error messages.
pub async fn sanitize_request(mut request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<OriginalUri>().is_none() {
        let original = OriginalUri(request.uri().clone());
        request.extensions_mut().insert(original);
    }

    if let Some(query) = request.uri().query() {
        let (clean, removed) = sanitize_query(query);
        if removed > 0 {
            tracing::warn!(removed, path = %request.uri().path(), "Stripped operator keys from query");
            let uri = with_query(request.uri(), &clean)?;
            *request.uri_mut() = uri;
        }
    }

    if let Some(JsonBody(mut value)) = request.extensions_mut().remove::<JsonBody>() {
        let removed = sanitize_value(&mut value);
        if removed > 0 {
            tracing::warn!(removed, path = %request.uri().path(), "Stripped operator keys from body");
            let bytes = serde_json::to_vec(&value)
                .map_err(|err| ApiError::internal(format!("Failed to re-encode body: {err}")))?;
            request
                .headers_mut()
                .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            *request.body_mut() = Body::from(bytes);
        }
        request.extensions_mut().insert(JsonBody(value));
    }

    Ok(next.run(request).await)
}

fn with_query(uri: &Uri, query: &str) -> Result<Uri, ApiError> {
    let path_and_query = if query.is_empty() {
        uri.path().to_owned()
    } else {
        format!("{}?{}", uri.path(), query)
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        path_and_query
            .parse::<PathAndQuery>()
            .map_err(|_| ApiError::bad_request("Malformed request URI"))?,
    );
    Uri::from_parts(parts).map_err(|_| ApiError::bad_request("Malformed request URI"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operator_keys() {
        assert!(is_operator_key("$gt"));
        assert!(is_operator_key("$where"));
        assert!(is_operator_key("profile.role"));
        assert!(!is_operator_key("email"));
        assert!(!is_operator_key("price$"));
    }

    #[test]
    fn strips_nested_operator_keys() {
        let mut body = json!({
            "email": {"$gt": ""},
            "password": "hunter2",
            "$where": "sleep(1000)",
            "items": [{"sku": "A1", "qty.max": 3}, {"$set": {"admin": true}}],
        });

        let removed = sanitize_value(&mut body);

        assert_eq!(removed, 4);
        assert_eq!(
            body,
            json!({
                "email": {},
                "password": "hunter2",
                "items": [{"sku": "A1"}, {}],
            })
        );
    }

    #[test]
    fn clean_values_untouched() {
        let mut body = json!({"name": "$5 gift card", "tags": ["a.b", "$c"]});
        let expected = body.clone();
        assert_eq!(sanitize_value(&mut body), 0);
        assert_eq!(body, expected);
    }

    #[test]
    fn strips_query_operators() {
        let (clean, removed) = sanitize_query("category=shoes&price[$gt]=10&$where=1&a.b=2");
        assert_eq!(removed, 3);
        assert_eq!(clean, "category=shoes");
    }

    #[test]
    fn clean_query_counts_zero() {
        let (_, removed) = sanitize_query("page=2&sort=price&filter[brand]=acme");
        assert_eq!(removed, 0);
    }

    #[test]
    fn rewrites_uri_query() {
        let uri = Uri::from_static("/api/products?x=1&$ne=2");
        let (clean, _) = sanitize_query(uri.query().unwrap());
        assert_eq!(with_query(&uri, &clean).unwrap(), "/api/products?x=1");
        assert_eq!(with_query(&uri, "").unwrap(), "/api/products");
    }
}
