use crate::fetcher::{
    errors::FetchError,
    types::{Charset, PageResponse},
};
use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// How far into the body `<meta>` charset declarations are searched for.
const META_SNIFF_BYTES: usize = 4096;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

pub fn process_response(
    url_final: Url,
    body_bytes: &[u8],
    content_type: &str,
) -> Result<PageResponse, FetchError> {
    let charset = detect_charset(content_type, body_bytes);
    let body_utf8 = decode_to_utf8(body_bytes, &charset)?;
    debug!(?charset, "decoded page body");

    Ok(PageResponse {
        url_final,
        body_utf8,
    })
}

fn declared_encoding(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

/// Header charset first, then `<meta>` declarations, then a statistical guess.
fn detect_charset(content_type: &str, body_bytes: &[u8]) -> Charset {
    if let Some(encoding) = declared_encoding(&CHARSET_REGEX, content_type) {
        return Charset::from_encoding(encoding);
    }

    let head = &body_bytes[..body_bytes.len().min(META_SNIFF_BYTES)];
    let head_str = String::from_utf8_lossy(head);
    for regex in [&*META_CHARSET_REGEX, &*META_HTTP_EQUIV_REGEX] {
        if let Some(encoding) = declared_encoding(regex, &head_str) {
            return Charset::from_encoding(encoding);
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, head.len() == body_bytes.len());
    Charset::from_encoding(detector.guess(None, true))
}

fn decode_to_utf8(body_bytes: &[u8], charset: &Charset) -> Result<String, FetchError> {
    let encoding = charset.encoding();
    let (decoded, _encoding, had_errors) = encoding.decode(body_bytes);

    if had_errors {
        return Err(FetchError::Charset(format!(
            "Failed to decode content with encoding: {}",
            encoding.name()
        )));
    }

    Ok(decoded.into_owned())
}
