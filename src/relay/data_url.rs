//! `data:` URL decoding (RFC 2397) for inline images.

use base64::Engine as _;

use crate::{Error, Result};

const DATA_URL_PREFIX: &str = "data:";

pub fn is_data_url(url: &str) -> bool {
    url.as_bytes()
        .get(..DATA_URL_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(DATA_URL_PREFIX.as_bytes()))
}

/// Decode the payload of a `data:` URL into bytes.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    if !is_data_url(url) {
        return Err(invalid("URL does not start with 'data:'"));
    }

    let rest = &url[DATA_URL_PREFIX.len()..];
    let (metadata, data) = rest
        .split_once(',')
        .ok_or_else(|| invalid("missing comma in data URL"))?;

    let is_base64 = metadata
        .split(';')
        .skip(1)
        .any(|p| p.trim().eq_ignore_ascii_case("base64"));

    if is_base64 {
        let cleaned: Vec<u8> = data.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|e| invalid(&format!("invalid base64: {e}")))
    } else {
        percent_decode(data)
    }
}

/// Percent-decode without treating '+' specially.
fn percent_decode(input: &str) -> Result<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let hex = bytes
            .get(i + 1..i + 3)
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| invalid("invalid percent-escape"))?;
        out.push(hex);
        i += 3;
    }
    Ok(out)
}

fn invalid(reason: &str) -> Error {
    Error::image_load("data:", reason)
}
