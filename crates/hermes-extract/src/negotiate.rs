//! Content negotiation.

use crate::error::BindError;
use crate::marshal::APPLICATION_JSON;
use mime::Mime;

/// `multipart/form-data`
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Returns the lower-cased essence (`type/subtype`) of a MIME string,
/// dropping parameters such as `charset` or `boundary`.
///
/// ```rust
/// use hermes_extract::essence;
///
/// assert_eq!(essence("Application/JSON; charset=utf-8"), "application/json");
/// assert_eq!(essence("not a mime"), "not a mime");
/// ```
#[must_use]
pub fn essence(raw: &str) -> String {
    raw.trim().parse::<Mime>().map_or_else(
        |_| {
            raw.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        },
        |mime| mime.essence_str().to_ascii_lowercase(),
    )
}

/// Returns the endpoint's list if it has one, else the service's.
#[must_use]
pub fn effective<'a>(endpoint: &'a [String], service: &'a [String]) -> &'a [String] {
    if endpoint.is_empty() {
        service
    } else {
        endpoint
    }
}

/// Resolves the request's content type.
///
/// A missing header means the service's first consumed type. The resolved
/// type must be consumed by the endpoint (or, without an endpoint list, by
/// the service); the raw header is returned so multipart boundaries survive.
pub fn resolve_content_type(
    header: Option<&str>,
    endpoint_consumes: &[String],
    service_consumes: &[String],
) -> Result<String, BindError> {
    let content_type = match header.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.to_string(),
        None => service_consumes
            .first()
            .cloned()
            .unwrap_or_else(|| APPLICATION_JSON.to_string()),
    };
    let accepted = effective(endpoint_consumes, service_consumes);
    if accepted.is_empty() {
        return Ok(content_type);
    }
    let wanted = essence(&content_type);
    if accepted.iter().any(|mime| essence(mime) == wanted) {
        Ok(content_type)
    } else {
        Err(BindError::unsupported_media_type(accepted, &content_type))
    }
}

/// Picks the response MIME type from the `Accept` header.
///
/// Accept entries are tried from highest to lowest quality. `*/*` and
/// `type/*` take the first produced type that fits; anything unmatched falls
/// back to the first produced type.
///
/// ```rust
/// use hermes_extract::resolve_output_mime;
///
/// let produces = vec!["application/json".to_string(), "text/plain".to_string()];
/// assert_eq!(resolve_output_mime(Some("text/plain"), &produces, &[]), "text/plain");
/// assert_eq!(resolve_output_mime(Some("text/*;q=0.9, */*;q=0.1"), &produces, &[]), "text/plain");
/// assert_eq!(resolve_output_mime(Some("image/png"), &produces, &[]), "application/json");
/// assert_eq!(resolve_output_mime(None, &[], &[]), "application/json");
/// ```
#[must_use]
pub fn resolve_output_mime(
    accept: Option<&str>,
    endpoint_produces: &[String],
    service_produces: &[String],
) -> String {
    let produces = effective(endpoint_produces, service_produces);
    let Some(fallback) = produces.first() else {
        return APPLICATION_JSON.to_string();
    };

    let mut ranges: Vec<(f32, Mime)> = accept
        .unwrap_or_default()
        .split(',')
        .filter_map(|entry| entry.trim().parse::<Mime>().ok())
        .map(|range| (quality(&range), range))
        .filter(|(q, _)| *q > 0.0)
        .collect();
    ranges.sort_by(|a, b| b.0.total_cmp(&a.0));

    for (_, range) in &ranges {
        let found = produces.iter().find(|candidate| {
            let Ok(candidate) = candidate.parse::<Mime>() else {
                return false;
            };
            let fits = |wanted: &str, offered: &str| wanted == "*" || wanted.eq_ignore_ascii_case(offered);
            fits(range.type_().as_str(), candidate.type_().as_str())
                && fits(range.subtype().as_str(), candidate.subtype().as_str())
        });
        if let Some(found) = found {
            return found.clone();
        }
    }
    fallback.clone()
}

fn quality(range: &Mime) -> f32 {
    range
        .get_param("q")
        .and_then(|q| q.as_str().parse::<f32>().ok())
        .unwrap_or(1.0)
}

/// Returns `true` if the MIME string is `multipart/form-data`.
#[must_use]
pub fn is_multipart(content_type: &str) -> bool {
    essence(content_type) == MULTIPART_FORM_DATA
}
