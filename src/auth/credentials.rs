use axum::http::{header::AUTHORIZATION, HeaderMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("malformed Authorization header")]
    Malformed,
}

/// A parsed `Authorization` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    ApiKey(String),
}

/// Parses exactly `<scheme> <value>`; the scheme is case-insensitive.
pub fn parse_authorization(value: &str) -> Result<Credential, CredentialError> {
    let mut fields = value.split_whitespace();
    let (Some(scheme), Some(secret), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(CredentialError::Malformed);
    };

    if scheme.eq_ignore_ascii_case("Bearer") {
        Ok(Credential::Bearer(secret.to_string()))
    } else if scheme.eq_ignore_ascii_case("ApiKey") {
        Ok(Credential::ApiKey(secret.to_string()))
    } else {
        Err(CredentialError::Malformed)
    }
}

fn authorization(headers: &HeaderMap) -> Result<Credential, CredentialError> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or(CredentialError::MissingHeader)?
        .to_str()
        .map_err(|_| CredentialError::Malformed)?;
    parse_authorization(raw)
}

pub fn bearer_token(headers: &HeaderMap) -> Result<String, CredentialError> {
    match authorization(headers)? {
        Credential::Bearer(token) => Ok(token),
        Credential::ApiKey(_) => Err(CredentialError::Malformed),
    }
}

pub fn service_key(headers: &HeaderMap) -> Result<String, CredentialError> {
    match authorization(headers)? {
        Credential::ApiKey(key) => Ok(key),
        Credential::Bearer(_) => Err(CredentialError::Malformed),
    }
}
