//! Just enough JWT handling to build a keyless account: split the token,
//! base64url-decode the segments and read claims. Signatures are not
//! checked; the chain does that against its JWK set.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};

use super::KeylessError;

/// Header, claims and signature segments.
fn segments(jwt: &str) -> Result<[&str; 3], KeylessError> {
    let parts: Vec<&str> = jwt.trim().split('.').collect();
    <[&str; 3]>::try_from(parts).map_err(|found| {
        KeylessError::MalformedJwt(format!("expected 3 segments, got {}", found.len()))
    })
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, KeylessError> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|err| KeylessError::MalformedJwt(err.to_string()))
}

/// The decoded JSON header, as carried in a keyless signature.
pub fn decode_jwt_header(jwt: &str) -> Result<String, KeylessError> {
    let [header, ..] = segments(jwt)?;
    String::from_utf8(decode_segment(header)?)
        .map_err(|err| KeylessError::MalformedJwt(err.to_string()))
}

/// The claims object of a JWT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JwtClaims {
    claims: Map<String, Value>,
}

impl JwtClaims {
    /// Decode the claims segment of a compact JWT.
    pub fn from_jwt(jwt: &str) -> Result<Self, KeylessError> {
        let [_, payload, _] = segments(jwt)?;
        let value: Value = serde_json::from_slice(&decode_segment(payload)?)
            .map_err(|err| KeylessError::MalformedJwt(err.to_string()))?;
        let Value::Object(claims) = value else {
            return Err(KeylessError::MalformedJwt(
                "claims are not a json object".to_owned(),
            ));
        };
        Ok(Self { claims })
    }

    /// A string-valued claim.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }

    fn required(&self, name: &str) -> Result<&str, KeylessError> {
        self.claim(name)
            .ok_or_else(|| KeylessError::MissingClaim(name.to_owned()))
    }

    /// The issuer.
    pub fn iss(&self) -> Result<&str, KeylessError> {
        self.required("iss")
    }

    /// The audience, i.e. the OAuth client id.
    pub fn aud(&self) -> Result<&str, KeylessError> {
        self.required("aud")
    }

    /// The value of the claim identifying the user, usually `sub`.
    pub fn uid_val(&self, uid_key: &str) -> Result<&str, KeylessError> {
        self.required(uid_key)
    }

    /// The nonce the login was requested with.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.claim("nonce")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Assemble an unsigned JWT from JSON header and claims.
    pub(crate) fn encode_jwt(header: &str, claims: &str) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims),
            URL_SAFE_NO_PAD.encode(b"signature")
        )
    }

    const HEADER: &str = r#"{"alg":"RS256","kid":"test-kid","typ":"JWT"}"#;

    #[test]
    fn reads_claims() {
        let jwt = encode_jwt(
            HEADER,
            &serde_json::json!({
                "iss": "https://accounts.google.com",
                "aud": "client",
                "sub": "42",
                "nonce": "7",
                "email": "a@b.c",
            })
            .to_string(),
        );
        let claims = JwtClaims::from_jwt(&jwt).unwrap();
        assert_eq!(claims.iss(), Ok("https://accounts.google.com"));
        assert_eq!(claims.aud(), Ok("client"));
        assert_eq!(claims.uid_val("sub"), Ok("42"));
        assert_eq!(claims.uid_val("email"), Ok("a@b.c"));
        assert_eq!(claims.nonce(), Some("7"));
        assert_eq!(decode_jwt_header(&jwt).unwrap(), HEADER);
    }

    /// Non-string claims count as missing.
    #[test]
    fn missing_claims() {
        let jwt = encode_jwt(HEADER, r#"{"iss":"https://issuer","aud":["a","b"]}"#);
        let claims = JwtClaims::from_jwt(&jwt).unwrap();
        assert_eq!(claims.aud(), Err(KeylessError::MissingClaim("aud".to_owned())));
        assert_eq!(claims.uid_val("sub"), Err(KeylessError::MissingClaim("sub".to_owned())));
    }

    #[test]
    fn malformed_tokens() {
        assert!(matches!(
            JwtClaims::from_jwt("only.two"),
            Err(KeylessError::MalformedJwt(_))
        ));
        assert!(matches!(
            JwtClaims::from_jwt("a.!!!.c"),
            Err(KeylessError::MalformedJwt(_))
        ));
        let not_object = encode_jwt(HEADER, "[1,2]");
        assert!(matches!(
            JwtClaims::from_jwt(&not_object),
            Err(KeylessError::MalformedJwt(_))
        ));
    }
}
