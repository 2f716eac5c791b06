//! Turns raw HTTP body bytes into a [`RequestBody`] the extractor can work with.

use std::io::Read;

use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::read::ZlibDecoder;
use http::HeaderMap;
use http::StatusCode;
use http::header::CONTENT_ENCODING;
use http::header::CONTENT_TYPE;

use crate::error::ExtractionError;
use crate::extraction::RequestBody;

pub(crate) const TOO_LARGE_MESSAGE: &str = "Request entity too large.";

/// Decode `bytes` according to the request's `content-encoding` and `content-type` charset.
///
/// * an unsupported charset or content-encoding is rejected with `415`,
/// * a (decompressed) body longer than `limit` bytes is rejected with `413`,
/// * a body that is not valid UTF-8 is rejected with `400`.
pub fn decode(
    headers: &HeaderMap,
    bytes: Bytes,
    limit: usize,
) -> Result<RequestBody, ExtractionError> {
    check_charset(headers)?;

    let decoded = match content_encoding(headers).as_str() {
        "" | "identity" => {
            if bytes.len() > limit {
                return Err(too_large());
            }
            bytes.to_vec()
        }
        "gzip" | "x-gzip" => inflate(GzDecoder::new(bytes.as_ref()), limit)?,
        "deflate" => inflate(ZlibDecoder::new(bytes.as_ref()), limit)?,
        other => {
            return Err(ExtractionError::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("Unsupported content-encoding \"{other}\"."),
            ));
        }
    };

    if decoded.is_empty() {
        return Ok(RequestBody::Empty);
    }
    String::from_utf8(decoded)
        .map(RequestBody::Text)
        .map_err(|_| ExtractionError::bad_request("Invalid body encoding."))
}

fn content_encoding(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_ENCODING)
        .map(|value| {
            String::from_utf8_lossy(value.as_bytes())
                .trim()
                .to_ascii_lowercase()
        })
        .unwrap_or_default()
}

fn check_charset(headers: &HeaderMap) -> Result<(), ExtractionError> {
    let charset = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .and_then(|mime| mime.get_param(mime::CHARSET).map(|c| c.as_str().to_string()));

    match charset {
        Some(charset) if !charset.eq_ignore_ascii_case("utf-8") => Err(ExtractionError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("Unsupported charset \"{}\".", charset.to_ascii_uppercase()),
        )),
        _ => Ok(()),
    }
}

fn inflate(decoder: impl Read, limit: usize) -> Result<Vec<u8>, ExtractionError> {
    let mut decoded = Vec::new();
    // one byte past the limit tells us the body is too large without inflating all of it
    decoder
        .take(u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1))
        .read_to_end(&mut decoded)
        .map_err(|error| {
            tracing::debug!("failed to decompress request body: {error}");
            ExtractionError::bad_request("Invalid compressed body.")
        })?;
    if decoded.len() > limit {
        return Err(too_large());
    }
    Ok(decoded)
}

fn too_large() -> ExtractionError {
    ExtractionError::new(StatusCode::PAYLOAD_TOO_LARGE, TOO_LARGE_MESSAGE)
}
