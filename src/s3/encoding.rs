//! Byte-exact percent-encoding for SigV4 canonical URIs and query strings.

/// Hex lookup table for percent encoding (uppercase, as SigV4 requires)
static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// URI encode a string per the SigV4 rules.
///
/// Every byte of the UTF-8 encoding is emitted as `%XX` except the unreserved
/// set `A-Z a-z 0-9 - _ . ~`. `/` is kept literal when `encode_slash` is false
/// (canonical URI paths) and encoded otherwise (query keys and values).
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    uri_encode_bytes(input.as_bytes(), encode_slash)
}

/// [`uri_encode`] over raw bytes, for decoded input that is not UTF-8
pub fn uri_encode_bytes(input: &[u8], encode_slash: bool) -> String {
    let mut result = String::with_capacity(input.len() + 16);
    for &byte in input {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            b'/' if !encode_slash => {
                result.push('/');
            }
            _ => {
                result.push('%');
                result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                result.push(HEX_UPPER[(byte & 0xf) as usize] as char);
            }
        }
    }
    result
}

/// Percent-decode one query component.
///
/// `+` stays literal. Sequences that do not decode to UTF-8 fall back to the
/// raw text so an odd URL still signs deterministically.
pub fn uri_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Canonical URI for an already-valid URL path.
///
/// The path is decoded to bytes first and encoded once with slashes
/// preserved, so an input that was already percent-encoded is not
/// double-encoded, even when the escapes are not UTF-8.
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    uri_encode_bytes(&urlencoding::decode_binary(path.as_bytes()), false)
}

/// Split a raw query string into decoded key/value pairs.
///
/// Empty segments are dropped and a segment without `=` gets an empty value.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (uri_decode(key), uri_decode(value)),
            None => (uri_decode(segment), String::new()),
        })
        .collect()
}

/// Create the canonical query string from decoded pairs.
///
/// Keys and values are encoded independently, then sorted by encoded key
/// (encoded value breaks ties) and joined with `&`. The input order never
/// affects the output.
pub fn canonical_query_string(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
        .collect();
    encoded.sort_unstable();

    let mut result = String::with_capacity(encoded.len() * 32);
    for (i, (k, v)) in encoded.iter().enumerate() {
        if i > 0 {
            result.push('&');
        }
        result.push_str(k);
        result.push('=');
        result.push_str(v);
    }
    result
}
