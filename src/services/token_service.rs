use std::error::Error;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::configs::Auth;
use crate::models::User;

/// Which of the two token flavors a JWT belongs to. Refresh tokens never
/// pass the request middleware; access tokens never pass the refresh
/// endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: i64,
    pub login: String,
    pub role: String,
    pub scope: TokenScope,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Clone)]
pub struct TokenService {
    expiration: u64,
    refresh_expiration: u64,
    secret: String,
}

impl TokenService {
    pub fn new(auth: Auth) -> Self {
        Self {
            expiration: auth.expiration,
            refresh_expiration: auth.refresh_expiration,
            secret: auth.secret.clone(),
        }
    }

    pub fn retrieve_token_claims(
        &self,
        token: &str,
        scope: TokenScope,
    ) -> Result<TokenData<TokenClaims>, Box<dyn Error>> {
        let data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )?;

        if data.claims.scope != scope {
            return Err("Unexpected token scope".into());
        }

        Ok(data)
    }

    pub fn generate_token(&self, user: &User, scope: TokenScope) -> Result<Token, Box<dyn Error>> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_secs();
        let lifetime = match scope {
            TokenScope::Access => self.expiration,
            TokenScope::Refresh => self.refresh_expiration,
        };
        let exp = iat + lifetime;

        let claims = TokenClaims {
            sub: user.id,
            login: user.login.to_string(),
            role: user.role().to_string(),
            scope,
            iat,
            exp,
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_ref());

        let token = encode(&Header::default(), &claims, &encoding_key)?;

        Ok(Token { token, iat, exp })
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn test_service() -> TokenService {
        TokenService::new(Auth {
            secret: String::from("test"),
            expiration: 1000,
            refresh_expiration: 10000,
        })
    }

    fn test_user() -> User {
        User {
            id: 1,
            login: String::from("resident"),
            password: String::from("hash"),
            first_name: None,
            last_name: None,
            middle_name: None,
            is_active: true,
            is_admin: false,
            application_submitted: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_generate_and_retrieve_token() {
        let token_service = test_service();
        let user = test_user();

        let token = token_service
            .generate_token(&user, TokenScope::Access)
            .unwrap();

        let claims = token_service
            .retrieve_token_claims(&token.token, TokenScope::Access)
            .unwrap()
            .claims;

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.login, user.login);
        assert_eq!(claims.role, "user");
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let token_service = test_service();
        let user = test_user();

        let refresh = token_service
            .generate_token(&user, TokenScope::Refresh)
            .unwrap();

        assert!(
            token_service
                .retrieve_token_claims(&refresh.token, TokenScope::Access)
                .is_err()
        );
        assert!(
            token_service
                .retrieve_token_claims(&refresh.token, TokenScope::Refresh)
                .is_ok()
        );
    }
}
