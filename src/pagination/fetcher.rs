//! Page fetching

use super::types::{ErrorEnvelope, FetchOptions, Page, PageEnvelope, FORMATTED_VALUE_ANNOTATION};
use crate::error::{Error, Result};
use crate::http::{ApiSession, RequestConfig};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Server message for filters/selects naming an attribute that does not exist
pub const UNKNOWN_PROPERTY_MESSAGE: &str = "Could not find a property named";

/// Captures the property name when the server quotes it
static UNKNOWN_PROPERTY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Could not find a property named '([^']*)'").expect("Invalid unknown-property regex")
});

/// Build the `Prefer` header value
pub fn prefer_header(options: &FetchOptions) -> String {
    let mut value = format!("odata.maxpagesize={}", options.page_size);
    if options.formatted_values {
        value.push_str(&format!(
            ", odata.include-annotations=\"{FORMATTED_VALUE_ANNOTATION}\""
        ));
    }
    value
}

/// Fetch one page of `collection`.
///
/// With a `cursor` the request goes to the cursor URL as-is and `query` is
/// ignored. Without one, `query` (already `&`-joined) is appended to the
/// collection URL when non-empty.
pub async fn fetch_page(
    session: &ApiSession,
    collection: &str,
    query: &str,
    cursor: Option<&str>,
    options: &FetchOptions,
) -> Result<Page> {
    let url = match cursor {
        Some(next_link) if !next_link.is_empty() => next_link.to_string(),
        _ if query.is_empty() => session.build_url(collection),
        _ => format!("{}?{query}", session.build_url(collection)),
    };

    let request = RequestConfig::new().header("Prefer", prefer_header(options));

    let response = session.get(&url, &request).await.map_err(|e| match e {
        Error::Transport(inner) => Error::query(collection, format!("Request failed: {inner}")),
        other => other,
    })?;

    if !response.is_ok() {
        return Err(Error::query(
            collection,
            query_error_message(response.status().as_u16(), response.body()),
        ));
    }

    let envelope: PageEnvelope = response
        .json()
        .map_err(|e| Error::query(collection, format!("Unexpected response payload: {e}")))?;

    let next_cursor = envelope.next_link.filter(|link| !link.is_empty());
    debug!(
        "Fetched {} records from \"{}\" (more: {})",
        envelope.value.len(),
        collection,
        next_cursor.is_some()
    );

    Ok(Page {
        records: envelope.value,
        next_cursor,
    })
}

/// Format a failed query, adding lookup-field guidance when the server
/// rejected an unknown property
pub fn query_error_message(status: u16, body: &str) -> String {
    let server_message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());

    let mut message = format!("Received: {status} - {server_message}");

    if server_message.contains(UNKNOWN_PROPERTY_MESSAGE) {
        let suggestion = UNKNOWN_PROPERTY_REGEX
            .captures(&server_message)
            .and_then(|captures| captures.get(1))
            .and_then(|property| property.as_str().strip_prefix("fk_"));
        if let Some(stripped) = suggestion {
            message.push_str(&format!(" Did you mean \"_{stripped}\"?"));
        }
        message.push_str(
            " When querying foreign key fields, do not forget to omit the \"fk\" part of the \
             field name, e.g. \"fk_accountid\" -> \"_accountid\". Lookup fields are exposed \
             under a leading-underscore name that differs from the declared attribute name.",
        );
    }

    message
}
