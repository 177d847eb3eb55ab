use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token payload. Tokens carry no expiry; clients hold them until the
/// account data they assert stops matching.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub role: String,
    pub iat: usize,
}

pub fn sign(email: &str, role: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let iat = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as usize;

    let claims = Claims {
        email: email.to_string(),
        role: role.to_string(),
        iat,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn verify(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_produces_three_part_jwt() {
        let token = sign("a@b.lt", "user", "secret").unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn verify_returns_original_email_and_role() {
        let token = sign("admin@shop.lt", "admin", "secret").unwrap();
        let claims = verify(&token, "secret").unwrap();
        assert_eq!(claims.email, "admin@shop.lt");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = sign("a@b.lt", "user", "secret").unwrap();
        assert!(verify(&token, "other-secret").is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(verify("not.a.token", "secret").is_err());
    }
}
