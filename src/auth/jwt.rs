use crate::types::{AppError, Claims, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};

/// Why a presented token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not a parseable JWT, or signed with an algorithm other than HS256.
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is missing a required claim")]
    MissingClaim,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::MissingRequiredClaim(_) | ErrorKind::Json(_) => TokenError::MissingClaim,
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and verifies HS256 access tokens.
///
/// The signing secret is handed over once at startup and never changes for
/// the life of the service. There is no refresh or revocation: a token stays
/// valid until its `exp`.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl TokenService {
    /// Creates a new TokenService.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `expiry_secs` - Token validity in seconds
    ///
    /// Fails when `expiry_secs` is not representable as a duration.
    pub fn new(secret: &str, expiry_secs: i64) -> Result<Self> {
        let expiry = Duration::try_seconds(expiry_secs).ok_or_else(|| {
            AppError::Token(format!("Token expiry out of range: {}s", expiry_secs))
        })?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry,
        })
    }

    /// Mints a token for the given identity, valid from now.
    pub fn issue(&self, user_id: i64, email: &str) -> Result<String> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// Mints a token as if it had been issued at `issued_at`.
    pub fn issue_at(&self, user_id: i64, email: &str, issued_at: DateTime<Utc>) -> Result<String> {
        let expires_at = issued_at
            .checked_add_signed(self.expiry)
            .ok_or_else(|| AppError::Token("Token expiry overflows the calendar".to_string()))?;
        let claims = Claims {
            email: email.to_string(),
            user_id,
            exp: expires_at.timestamp().max(0) as usize,
            iat: issued_at.timestamp().max(0) as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Token(format!("Failed to generate token: {}", e)))
    }

    /// Verifies signature and expiry and returns the carried claims.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        // Header problems are shape errors; a JSON failure after this point can
        // only come from the signed claims.
        decode_header(token).map_err(|_| TokenError::Malformed)?;

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    const SECRET: &str = "test-secret-key-that-is-at-least-32-chars";

    fn create_test_service() -> TokenService {
        TokenService::new(SECRET, 86_400).expect("valid expiry")
    }

    #[test]
    fn test_token_round_trip() {
        let service = create_test_service();

        let token = service.issue(42, "a@x.com").expect("should issue");
        let claims = service.verify(&token).expect("should verify");

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "a@x.com");
    }

    #[test]
    fn test_claims_expiration_window() {
        let service = create_test_service();
        let token = service.issue(1, "a@x.com").expect("should issue");
        let claims = service.verify(&token).expect("should verify");

        assert_eq!(claims.exp - claims.iat, 86_400);
        let now = Utc::now().timestamp() as usize;
        assert!(claims.iat <= now && claims.iat + 5 >= now);
    }

    #[test]
    fn test_malformed_token() {
        let service = create_test_service();

        assert_eq!(service.verify("invalid_token"), Err(TokenError::Malformed));
        assert_eq!(service.verify("invalid.token.here"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let issuer =
            TokenService::new("secret-one-that-is-32-chars-long", 900).expect("valid expiry");
        let verifier =
            TokenService::new("secret-two-that-is-32-chars-long", 900).expect("valid expiry");

        let token = issuer.issue(7, "test@example.com").expect("should issue");

        assert_eq!(verifier.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_token() {
        let service = create_test_service();
        let two_days_ago = Utc::now() - Duration::days(2);

        let token = service
            .issue_at(1, "a@x.com", two_days_ago)
            .expect("should issue");

        assert_eq!(service.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_unrepresentable_expiry_rejected() {
        assert!(matches!(
            TokenService::new(SECRET, i64::MAX),
            Err(AppError::Token(_))
        ));
    }

    #[test]
    fn test_expiry_past_calendar_end_is_an_error() {
        let service = TokenService::new(SECRET, 1_000_000_000_000_000).expect("valid duration");

        assert!(matches!(
            service.issue(1, "a@x.com"),
            Err(AppError::Token(_))
        ));
    }

    #[test]
    fn test_other_algorithm_is_malformed() {
        let service = create_test_service();
        let claims = Claims {
            email: "a@x.com".into(),
            user_id: 1,
            exp: (Utc::now().timestamp() + 600) as usize,
            iat: Utc::now().timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("should encode");

        assert_eq!(service.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_missing_user_id_claim() {
        #[derive(Serialize)]
        struct PartialClaims {
            email: String,
            exp: usize,
        }

        let service = create_test_service();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &PartialClaims {
                email: "a@x.com".into(),
                exp: (Utc::now().timestamp() + 600) as usize,
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("should encode");

        assert_eq!(service.verify(&token), Err(TokenError::MissingClaim));
    }

    #[test]
    fn test_missing_exp_claim() {
        #[derive(Serialize)]
        struct NoExpiry {
            email: String,
            #[serde(rename = "userId")]
            user_id: i64,
        }

        let service = create_test_service();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoExpiry {
                email: "a@x.com".into(),
                user_id: 1,
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("should encode");

        assert_eq!(service.verify(&token), Err(TokenError::MissingClaim));
    }
}
