//! Just enough of the macaroon v1 format to find a third-party caveat.
//!
//! A v1 macaroon is base64 of a sequence of packets, each `LLLLkey value\n`
//! where `LLLL` is the packet length (header included) as four hex digits.
//! Third-party caveats are a `cid` packet followed by `vid` and `cl`.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};

use crate::errors::{Result, StoreError};

const HEADER_LEN: usize = 4;

fn invalid(reason: &str) -> StoreError {
    StoreError::InvalidToken(format!("root macaroon {}", reason))
}

fn decode(serialized: &str) -> Result<Vec<u8>> {
    let trimmed = serialized.trim().trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|_| invalid("is not base64"))
}

fn packets(data: &[u8]) -> Result<Vec<(&str, &[u8])>> {
    let mut packets = Vec::new();
    let mut rest = data;

    while !rest.is_empty() {
        let len = rest
            .get(..HEADER_LEN)
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| usize::from_str_radix(h, 16).ok())
            .ok_or_else(|| invalid("has a malformed packet header"))?;

        // header, at least "k v", trailing newline
        if len < HEADER_LEN + 4 || len > rest.len() {
            return Err(invalid("has a truncated packet"));
        }

        let body = rest[HEADER_LEN..len]
            .strip_suffix(b"\n")
            .ok_or_else(|| invalid("has an unterminated packet"))?;
        let split = body
            .iter()
            .position(|b| *b == b' ')
            .ok_or_else(|| invalid("has a packet without a value"))?;
        let key = std::str::from_utf8(&body[..split]).map_err(|_| invalid("has a non-text packet key"))?;

        packets.push((key, &body[split + 1..]));
        rest = &rest[len..];
    }

    Ok(packets)
}

/// Caveat id of the third-party caveat at `location` in a serialized root macaroon
pub fn third_party_caveat_id(serialized: &str, location: &str) -> Result<String> {
    let data = decode(serialized)?;
    let packets = packets(&data)?;

    if packets.first().map(|(k, _)| *k) != Some("location") {
        return Err(invalid("does not start with a location"));
    }

    let mut pending_cid: Option<&[u8]> = None;
    for (key, value) in packets {
        match key {
            "cid" => pending_cid = Some(value),
            "cl" if value == location.as_bytes() => {
                let cid = pending_cid.ok_or_else(|| invalid("has a caveat location without an id"))?;
                return String::from_utf8(cid.to_vec()).map_err(|_| invalid("has a non-text caveat id"));
            }
            _ => {}
        }
    }

    Err(invalid(&format!("has no caveat for {}", location)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE;

    fn packet(key: &str, value: &str) -> Vec<u8> {
        let body = format!("{} {}\n", key, value);
        let mut out = format!("{:04x}", body.len() + HEADER_LEN).into_bytes();
        out.extend_from_slice(body.as_bytes());
        out
    }

    /// Serialize a v1 macaroon with one first-party and one third-party caveat
    pub(crate) fn root_macaroon(sso_location: &str, caveat_id: &str) -> String {
        let mut raw = Vec::new();
        raw.extend(packet("location", "myapps.developer.ubuntu.com"));
        raw.extend(packet("identifier", "a6d7c2e0"));
        raw.extend(packet("cid", "myapps.developer.ubuntu.com|valid_since|2026-01-01"));
        raw.extend(packet("cid", caveat_id));
        raw.extend(packet("vid", "vid-bytes"));
        raw.extend(packet("cl", sso_location));
        raw.extend(packet("signature", "0123456789abcdef"));
        URL_SAFE.encode(raw)
    }

    #[test]
    fn test_finds_sso_caveat() {
        let serialized = root_macaroon("login.ubuntu.com", "sso-caveat-id");
        let cid = third_party_caveat_id(&serialized, "login.ubuntu.com").unwrap();
        assert_eq!(cid, "sso-caveat-id");
    }

    #[test]
    fn test_accepts_standard_alphabet_without_padding() {
        let raw = URL_SAFE.decode(root_macaroon("login.ubuntu.com", "cid")).unwrap();
        let serialized = STANDARD_NO_PAD.encode(raw);
        assert_eq!(third_party_caveat_id(&serialized, "login.ubuntu.com").unwrap(), "cid");
    }

    #[test]
    fn test_other_location_is_invalid_token() {
        let serialized = root_macaroon("login.example.com", "cid");
        let result = third_party_caveat_id(&serialized, "login.ubuntu.com");
        assert!(matches!(result, Err(StoreError::InvalidToken(_))));
    }

    #[test]
    fn test_garbage_is_invalid_token() {
        for serialized in ["", "!!!", "bm90IGEgbWFjYXJvb24"] {
            let result = third_party_caveat_id(serialized, "login.ubuntu.com");
            assert!(matches!(result, Err(StoreError::InvalidToken(_))), "{serialized:?}");
        }
    }

    #[test]
    fn test_truncated_packet_is_invalid_token() {
        let mut raw = packet("location", "here");
        raw.extend_from_slice(b"00ffcid short\n");
        let result = third_party_caveat_id(&URL_SAFE.encode(raw), "here");
        assert!(matches!(result, Err(StoreError::InvalidToken(_))));
    }
}
