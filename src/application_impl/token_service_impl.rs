use crate::application_port::{TokenError, TokenService, VerifiedAccess};
use crate::domain_model::*;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const REFRESH_TOKEN_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub expire_minutes: u64,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String, // account id
    email: String,
    roles: Vec<Role>,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
}

/// HS256 access tokens plus opaque refresh tokens.
pub struct JwtTokenService {
    cfg: JwtConfig,
}

impl JwtTokenService {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtTokenService { cfg }
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        v.set_audience(&[self.cfg.audience.clone()]);
        v.set_issuer(&[self.cfg.issuer.clone()]);
        v
    }

    fn decode_access(
        &self,
        token: &str,
        validation: Validation,
    ) -> Result<VerifiedAccess, TokenError> {
        let data = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(&self.cfg.signing_key),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        let claims = data.claims;
        let account_id = claims
            .sub
            .parse::<AccountId>()
            .map_err(|_| TokenError::Invalid)?;
        Ok(VerifiedAccess {
            account_id,
            email: Email::new(claims.email),
            roles: claims.roles,
        })
    }
}

#[async_trait::async_trait]
impl TokenService for JwtTokenService {
    async fn mint(
        &self,
        account: &AccountRecord,
        roles: &[Role],
    ) -> Result<TokenPair, TokenError> {
        let iat = Utc::now();
        let exp = i64::try_from(self.cfg.expire_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .and_then(|lifetime| iat.checked_add_signed(lifetime))
            .ok_or_else(|| {
                TokenError::InternalError(format!(
                    "token lifetime of {} minutes is out of range",
                    self.cfg.expire_minutes
                ))
            })?;
        let claims = AccessClaims {
            sub: account.account_id.to_string(),
            email: account.email.to_string(),
            roles: roles.to_vec(),
            exp: exp.timestamp(),
            iat: iat.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti: Self::gen_jti(),
        };
        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.cfg.signing_key),
        )
        .map_err(|e| TokenError::InternalError(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token: nanoid::nanoid!(REFRESH_TOKEN_LEN),
            expire_minutes: self.cfg.expire_minutes,
        })
    }

    async fn verify_access(&self, token: &str) -> Result<VerifiedAccess, TokenError> {
        self.decode_access(token, self.validation())
    }

    async fn decode_expired(&self, token: &str) -> Result<VerifiedAccess, TokenError> {
        let mut validation = self.validation();
        validation.validate_exp = false;
        self.decode_access(token, validation)
    }
}
