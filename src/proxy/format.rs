//! Identity to endpoint formatting

use crate::error::{PoolError, Result};
use crate::models::ProxyEndpoints;

const DEFAULT_SCHEME: &str = "http";

/// Turn a catalog identity into the endpoint pair handed to callers.
///
/// A bare identity gets `http://` on both slots. An identity that already
/// carries a scheme is used verbatim on both slots.
pub fn format_proxy(identity: &str) -> Result<ProxyEndpoints> {
    let trimmed = identity.trim();
    if trimmed.is_empty() {
        return Err(PoolError::InvalidProxyFormat(
            "proxy identity is empty".to_string(),
        ));
    }

    let endpoint = match split_scheme(trimmed) {
        Some((_, rest)) if rest.is_empty() => {
            return Err(PoolError::InvalidProxyFormat(format!(
                "proxy identity has no address: {}",
                trimmed
            )));
        }
        Some(_) => trimmed.to_string(),
        None => format!("{}://{}", DEFAULT_SCHEME, trimmed),
    };

    Ok(ProxyEndpoints {
        identity: identity.to_string(),
        http: endpoint.clone(),
        https: endpoint,
    })
}

/// Split `scheme://rest` when the prefix is a valid URI scheme
fn split_scheme(identity: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = identity.split_once("://")?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some((scheme, rest))
}
