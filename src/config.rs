use serde::Deserialize;

/// Districts accepted when no `DISTRICTS` override is configured.
pub const DEFAULT_DISTRICTS: &[&str] = &[
    "Thiruvananthapuram",
    "Kollam",
    "Pathanamthitta",
    "Alappuzha",
    "Kottayam",
    "Idukki",
    "Ernakulam",
    "Thrissur",
    "Palakkad",
    "Malappuram",
    "Kozhikode",
    "Wayanad",
    "Kannur",
    "Kasaragod",
];

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// In-memory store when unset.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub districts: Vec<String>,
    pub advisor: AdvisorConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "foodbridge".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "foodbridge-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let districts = std::env::var("DISTRICTS")
            .ok()
            .map(|v| parse_districts(&v))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(default_districts);
        let advisor = AdvisorConfig {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|v| !v.is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".into()),
            endpoint: std::env::var("GEMINI_ENDPOINT").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta".into()
            }),
            timeout_secs: std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        Ok(Self {
            database_url,
            jwt,
            districts,
            advisor,
        })
    }

    pub fn is_known_district(&self, district: &str) -> bool {
        self.districts.iter().any(|d| d == district)
    }
}

pub fn default_districts() -> Vec<String> {
    DEFAULT_DISTRICTS.iter().map(|d| (*d).to_string()).collect()
}

fn parse_districts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_districts_trims_and_drops_blanks() {
        let parsed = parse_districts(" Alpha, Beta ,,Gamma ");
        assert_eq!(parsed, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn default_list_has_fourteen_entries() {
        assert_eq!(default_districts().len(), 14);
    }
}
