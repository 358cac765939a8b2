//! `data:` URL decoding.
//!
//! The metadata before the first comma names a media type from a small
//! allow-list, optionally followed by `;`-separated parameters. A
//! `base64` parameter switches payload decoding from percent-escapes to
//! strict base64.

use crate::url::is_data_url;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use percent_encoding::percent_decode_str;

const SUPPORTED_MEDIA_TYPES: [&str; 4] =
    ["text/plain", "text/css", "text/html", "application/javascript"];

fn is_hex_digit(byte: u8) -> bool {
    byte.is_ascii_hexdigit()
}

/// Percent-decode the payload, rejecting malformed escapes.
fn percent_decode_payload(payload: &str) -> Result<String, String> {
    let bytes = payload.as_bytes();
    let mut cursor = 0;
    while cursor < bytes.len() {
        if bytes[cursor] == b'%' {
            let valid = cursor + 2 < bytes.len()
                && is_hex_digit(bytes[cursor + 1])
                && is_hex_digit(bytes[cursor + 2]);
            if !valid {
                return Err("Malformed data URL: invalid percent-encoding in payload".to_owned());
            }
            cursor += 3;
            continue;
        }
        cursor += 1;
    }

    let decoded = percent_decode_str(payload).collect::<Vec<u8>>();
    Ok(String::from_utf8_lossy(&decoded).into_owned())
}

/// Strict base64 decode: length must be a multiple of 4, digits valid,
/// and `=` padding only at the end.
fn base64_decode_payload(payload: &str) -> Result<String, String> {
    if payload.len() % 4 != 0 {
        return Err("Malformed data URL: invalid base64 payload".to_owned());
    }
    BASE64_STANDARD
        .decode(payload)
        .map(|decoded| String::from_utf8_lossy(&decoded).into_owned())
        .map_err(|_| "Malformed data URL: invalid base64 payload".to_owned())
}

/// Decode a `data:` URL to its text payload.
pub fn parse_data_text_url(data_url: &str) -> Result<String, String> {
    if !is_data_url(data_url) {
        return Err("URL is not a data URL".to_owned());
    }

    const DATA_PREFIX_LEN: usize = 5;
    let Some(comma_offset) = data_url[DATA_PREFIX_LEN..].find(',') else {
        return Err("Malformed data URL: missing ',' separator".to_owned());
    };
    let comma_pos = DATA_PREFIX_LEN + comma_offset;

    let metadata = &data_url[DATA_PREFIX_LEN..comma_pos];
    let mut parameters = metadata.split(';');
    let media_type = parameters
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if media_type.is_empty() {
        return Err("Malformed data URL: missing media type".to_owned());
    }
    if !SUPPORTED_MEDIA_TYPES.contains(&media_type.as_str()) {
        return Err(format!("Unsupported data URL media type: {media_type}"));
    }

    let uses_base64 = parameters.any(|parameter| parameter.trim().eq_ignore_ascii_case("base64"));

    let payload = &data_url[comma_pos + 1..];
    if uses_base64 {
        base64_decode_payload(payload)
    } else {
        percent_decode_payload(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::parse_data_text_url;

    #[test]
    fn plain_payloads_percent_decode() {
        assert_eq!(
            parse_data_text_url("data:text/plain,hello%20world").as_deref(),
            Ok("hello world")
        );
        assert_eq!(
            parse_data_text_url("data:text/html,<p>x</p>").as_deref(),
            Ok("<p>x</p>")
        );
    }

    #[test]
    fn base64_payloads_decode() {
        assert_eq!(
            parse_data_text_url("data:text/plain;base64,aGVsbG8=").as_deref(),
            Ok("hello")
        );
        assert_eq!(
            parse_data_text_url("data:text/css;base64,cCB7IH0=").as_deref(),
            Ok("p { }")
        );
    }

    #[test]
    fn missing_comma_is_rejected() {
        assert_eq!(
            parse_data_text_url("data:text/plain"),
            Err("Malformed data URL: missing ',' separator".to_owned())
        );
    }

    #[test]
    fn missing_or_unsupported_media_type_is_rejected() {
        assert_eq!(
            parse_data_text_url("data:,hi"),
            Err("Malformed data URL: missing media type".to_owned())
        );
        assert_eq!(
            parse_data_text_url("data:image/png;base64,AAAA"),
            Err("Unsupported data URL media type: image/png".to_owned())
        );
    }

    #[test]
    fn malformed_base64_is_rejected() {
        // Length not a multiple of four.
        assert!(parse_data_text_url("data:text/plain;base64,aGVsbG8").is_err());
        // Invalid digit.
        assert!(parse_data_text_url("data:text/plain;base64,aGV$bG8=").is_err());
        // Padding in the wrong position.
        assert!(parse_data_text_url("data:text/plain;base64,aG=sbG8=").is_err());
    }

    #[test]
    fn malformed_percent_escape_is_rejected() {
        assert!(parse_data_text_url("data:text/plain,bad%2").is_err());
        assert!(parse_data_text_url("data:text/plain,bad%zz").is_err());
    }
}
