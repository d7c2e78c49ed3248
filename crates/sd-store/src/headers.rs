//! Turns an exchanged token pair into the header set sent to the store.

use crate::credentials::TokenPair;
use crate::errors::{Result, StoreError};
use crate::session::{HeaderSet, header};

fn check_token(kind: &str, token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(StoreError::InvalidToken(format!("{} token is empty", kind)));
    }
    // Tokens are embedded as quoted parameters
    if token.contains(['"', '\r', '\n']) {
        return Err(StoreError::InvalidToken(format!(
            "{} token contains characters that cannot be quoted",
            kind
        )));
    }
    Ok(())
}

/// Compose the `Authorization` value from the root macaroon and all its discharges
///
/// `Macaroon root="<root>", discharge="<d1>", discharge="<d2>"`, discharges in
/// the order they were issued.
pub fn authorization_value(tokens: &TokenPair) -> Result<String> {
    check_token("primary", tokens.primary())?;

    let mut value = format!(r#"Macaroon root="{}""#, tokens.primary());
    for discharge in tokens.discharges() {
        check_token("discharge", discharge)?;
        value.push_str(&format!(r#", discharge="{}""#, discharge));
    }

    Ok(value)
}

/// Build the complete header set for a brand store
pub fn assemble(tokens: &TokenPair, store_id: &str, series: &str, channel: &str) -> Result<HeaderSet> {
    let authorization = authorization_value(tokens)?;

    let mut headers = HeaderSet::new();
    headers.insert(header::STORE, store_id);
    headers.insert(header::SERIES, series);
    headers.insert(header::CHANNEL, channel);
    headers.insert(header::AUTHORIZATION, authorization);
    headers.insert(header::CONTENT_TYPE, header::JSON);
    headers.insert(header::ACCEPT, header::JSON);

    Ok(headers)
}
