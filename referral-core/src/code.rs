//! Referral Code Policy
//!
//! Codes are 8 uppercase base36 characters derived from the owner's id
//! and the issuing timestamp, salted with randomness so a collision can
//! be resolved by regenerating. Links carry the code as a `ref` query
//! parameter; capture strips the parameter from the visible URL so the
//! page can be reloaded or shared without re-processing.

use chrono::{DateTime, Utc};
use rand::Rng;
use url::Url;

use crate::error::{ReferralError, ReferralResult};
use crate::types::{ReferralCode, UserId};

const CODE_LEN: usize = 8;
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Query parameter carrying the referral code.
pub const REF_PARAM: &str = "ref";

/// Generate a referral code for a user.
///
/// The first characters encode a fold of the owner id and the issuing
/// timestamp; the remainder is random salt. Uniqueness is enforced by
/// the store, not here - callers regenerate on collision.
pub fn generate_code(uid: &UserId, issued_at: DateTime<Utc>) -> ReferralCode {
    let mut seed: u64 = issued_at.timestamp_micros() as u64;
    for byte in uid.as_str().bytes() {
        seed = seed.wrapping_mul(31).wrapping_add(u64::from(byte));
    }

    let mut chars = [0u8; CODE_LEN];
    let mut remaining = seed;
    let mut len = 0;
    while remaining > 0 && len < CODE_LEN - 2 {
        chars[len] = ALPHABET[(remaining % 36) as usize];
        remaining /= 36;
        len += 1;
    }

    let mut rng = rand::thread_rng();
    while len < CODE_LEN {
        chars[len] = ALPHABET[rng.gen_range(0..36)];
        len += 1;
    }

    ReferralCode::new(chars.iter().map(|&b| b as char).collect::<String>())
}

/// Syntactic validity: exactly 8 uppercase base36 characters.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
}

/// Build the shareable referral link for a code.
pub fn referral_link(base_url: &str, code: &ReferralCode) -> String {
    format!("{}?{}={}", base_url.trim_end_matches('/'), REF_PARAM, code)
}

/// A referral code captured from a page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCode {
    /// The extracted code, uppercased
    pub code: ReferralCode,
    /// The page URL with the `ref` parameter removed
    pub sanitized_url: String,
}

/// Extract a referral code from a page URL.
///
/// Returns `Ok(None)` when no `ref` parameter is present (re-entry with
/// no code is a no-op), `Err(InvalidCode)` when the parameter is
/// syntactically malformed. Other query parameters survive in the
/// sanitized URL.
pub fn extract_code(page_url: &str) -> ReferralResult<Option<CapturedCode>> {
    let parsed =
        Url::parse(page_url).map_err(|e| ReferralError::Serialization(e.to_string()))?;

    let mut raw_code: Option<String> = None;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter_map(|(key, value)| {
            if key == REF_PARAM {
                raw_code = Some(value.to_string());
                None
            } else {
                Some((key.to_string(), value.to_string()))
            }
        })
        .collect();

    let raw = match raw_code {
        Some(raw) => raw.trim().to_ascii_uppercase(),
        None => return Ok(None),
    };
    if !is_valid_code(&raw) {
        return Err(ReferralError::InvalidCode { code: raw });
    }

    let mut sanitized = parsed.clone();
    sanitized.set_query(None);
    if !kept.is_empty() {
        let mut pairs = sanitized.query_pairs_mut();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
    }

    Ok(Some(CapturedCode {
        code: ReferralCode::new(raw),
        sanitized_url: sanitized.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_valid() {
        let uid = UserId::new("user_0001");
        for _ in 0..50 {
            let code = generate_code(&uid, Utc::now());
            assert!(is_valid_code(code.as_str()), "invalid code {}", code);
        }
    }

    #[test]
    fn test_code_syntax() {
        assert!(is_valid_code("ABC12345"));
        assert!(!is_valid_code("abc12345"));
        assert!(!is_valid_code("ABC1234"));
        assert!(!is_valid_code("ABC12345X"));
        assert!(!is_valid_code("ABC-1234"));
    }

    #[test]
    fn test_referral_link_format() {
        let code = ReferralCode::new("ABC12345");
        assert_eq!(
            referral_link("https://shop.example.com/", &code),
            "https://shop.example.com?ref=ABC12345"
        );
    }

    #[test]
    fn test_extract_code_strips_ref_param() {
        let captured = extract_code("https://shop.example.com/?ref=abc12345&page=2")
            .unwrap()
            .unwrap();
        assert_eq!(captured.code.as_str(), "ABC12345");
        assert_eq!(captured.sanitized_url, "https://shop.example.com/?page=2");
    }

    #[test]
    fn test_extract_code_absent_is_noop() {
        let result = extract_code("https://shop.example.com/products").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_extract_code_rejects_malformed() {
        let err = extract_code("https://shop.example.com/?ref=nope").unwrap_err();
        assert!(matches!(err, ReferralError::InvalidCode { .. }));
    }

    #[test]
    fn test_extract_code_drops_query_when_only_ref() {
        let captured = extract_code("https://shop.example.com/?ref=ABC12345")
            .unwrap()
            .unwrap();
        assert_eq!(captured.sanitized_url, "https://shop.example.com/");
    }
}
