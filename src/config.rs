use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Optional LLM verifier for parsed receipts. When the URL is absent the
/// rule-based parser runs alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifierConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub verifier: VerifierConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "tripledger".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "tripledger-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        let verifier = VerifierConfig {
            url: std::env::var("RECEIPT_VERIFIER_URL").ok(),
            token: std::env::var("RECEIPT_VERIFIER_TOKEN").ok(),
            timeout_secs: std::env::var("RECEIPT_VERIFIER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        Ok(Self {
            database_url,
            jwt,
            verifier,
        })
    }
}
