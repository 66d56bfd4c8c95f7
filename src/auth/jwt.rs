use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;

pub const ISSUER: &str = "chirpy";
pub const MAX_ACCESS_TTL: Duration = Duration::hours(1);
const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and validates stateless HS256 access tokens.
///
/// Validation needs nothing but the token and the shared secret, so one codec
/// is shared by every request handler.
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AccessTokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Requests outside `(0, 1h]` get exactly one hour.
    pub fn clamp_lifetime(requested: Duration) -> Duration {
        if requested <= Duration::ZERO || requested > MAX_ACCESS_TTL {
            MAX_ACCESS_TTL
        } else {
            requested
        }
    }

    pub fn issue(&self, user_id: Uuid, lifetime: Duration) -> anyhow::Result<String> {
        self.issue_at(user_id, lifetime, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        lifetime: Duration,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now + Self::clamp_lifetime(lifetime);
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "access token signed");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Malformed)?;
        debug!(user_id = %user_id, "access token verified");
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    fn decode_claims(token: &str) -> serde_json::Value {
        let payload = token.split('.').nth(1).expect("payload segment");
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
    }

    fn lifetime_of(token: &str) -> i64 {
        let claims = decode_claims(token);
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap()
    }

    #[test]
    fn issue_and_validate_roundtrip() {
        let codec = AccessTokenCodec::new("Super secret!");
        for _ in 0..3 {
            let user_id = Uuid::new_v4();
            let token = codec.issue(user_id, Duration::hours(1)).expect("issue");
            assert_eq!(codec.validate(&token), Ok(user_id));
        }
    }

    #[test]
    fn claims_carry_issuer_and_subject() {
        let codec = AccessTokenCodec::new("secret");
        let user_id = Uuid::new_v4();
        let token = codec.issue(user_id, Duration::minutes(5)).unwrap();
        let claims = decode_claims(&token);
        assert_eq!(claims["iss"], ISSUER);
        assert_eq!(claims["sub"], user_id.to_string());
        assert_eq!(lifetime_of(&token), 300);
    }

    #[test]
    fn out_of_range_lifetimes_become_one_hour() {
        let codec = AccessTokenCodec::new("secret");
        let user_id = Uuid::new_v4();
        for requested in [Duration::ZERO, Duration::hours(-1), Duration::hours(5)] {
            let token = codec.issue(user_id, requested).unwrap();
            assert_eq!(lifetime_of(&token), 3600);
            assert_eq!(codec.validate(&token), Ok(user_id));
        }
    }

    #[test]
    fn negative_lifetime_token_expires_after_an_hour() {
        let codec = AccessTokenCodec::new("secret");
        let user_id = Uuid::new_v4();

        let almost = OffsetDateTime::now_utc() - Duration::minutes(59);
        let token = codec.issue_at(user_id, Duration::seconds(-10), almost).unwrap();
        assert_eq!(codec.validate(&token), Ok(user_id));

        let past = OffsetDateTime::now_utc() - Duration::minutes(61);
        let token = codec.issue_at(user_id, Duration::seconds(-10), past).unwrap();
        assert_eq!(codec.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_secret_is_bad_signature() {
        let token = AccessTokenCodec::new("correct-secret")
            .issue(Uuid::new_v4(), Duration::hours(1))
            .unwrap();
        let err = AccessTokenCodec::new("wrong-secret").validate(&token).unwrap_err();
        assert_eq!(err, TokenError::BadSignature);
    }

    #[test]
    fn tampered_payload_is_bad_signature() {
        let codec = AccessTokenCodec::new("secret");
        let token = codec.issue(Uuid::new_v4(), Duration::hours(1)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let mut claims = decode_claims(&token);
        claims["sub"] = serde_json::Value::String(Uuid::new_v4().to_string());
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);

        assert_eq!(codec.validate(&tampered), Err(TokenError::BadSignature));
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            iss: ISSUER.into(),
            sub: Uuid::new_v4().to_string(),
            iat: now.unix_timestamp(),
            exp: (now + Duration::hours(1)).unix_timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let err = AccessTokenCodec::new("secret").validate(&token).unwrap_err();
        assert_eq!(err, TokenError::BadSignature);
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = AccessTokenCodec::new("secret");
        assert_eq!(codec.validate("not.a.validtoken"), Err(TokenError::Malformed));
        assert_eq!(codec.validate(""), Err(TokenError::Malformed));
    }

    #[test]
    fn non_uuid_subject_is_malformed() {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            iss: ISSUER.into(),
            sub: "not-a-uuid".into(),
            iat: now.unix_timestamp(),
            exp: (now + Duration::hours(1)).unix_timestamp(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap();
        let err = AccessTokenCodec::new("secret").validate(&token).unwrap_err();
        assert_eq!(err, TokenError::Malformed);
    }
}
