use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Which payloads a lead email carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Text body is the ADF XML document (for CRM importers).
    Adf,
    /// HTML table plus plain-text summary.
    Html,
    /// HTML table and text summary, with the ADF document attached.
    Both,
}

impl FromStr for PayloadFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adf" | "xml" => Ok(Self::Adf),
            "html" => Ok(Self::Html),
            "both" => Ok(Self::Both),
            other => anyhow::bail!("LEAD_PAYLOAD_FORMAT must be adf, html or both (got '{}')", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub email_api_key: String,
    pub email_api_base_url: String,
    pub lead_from: String,
    pub lead_recipients: Vec<String>,
    pub payload_format: PayloadFormat,
    pub subject_label: String,
    pub vendor_name: String,
    pub provider_name: String,
    pub phone_country_code: String,
    pub backup_webhook_url: Option<String>,
    pub backup_webhook_secret: Option<String>,
    pub honeypot_field: String,
    pub http_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            email_api_key: std::env::var("EMAIL_API_KEY")
                .or_else(|_| std::env::var("RESEND_API_KEY"))
                .map_err(|_| {
                    anyhow::anyhow!("EMAIL_API_KEY or RESEND_API_KEY environment variable required")
                })
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("EMAIL_API_KEY cannot be empty");
                    }
                    Ok(key.trim().to_string())
                })?,
            email_api_base_url: std::env::var("EMAIL_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string())
                .parse::<HttpUrl>()
                .map_err(|e| anyhow::anyhow!("EMAIL_API_BASE_URL {}", e))?
                .0,
            lead_from: std::env::var("LEAD_FROM")
                .map_err(|_| anyhow::anyhow!("LEAD_FROM environment variable required"))
                .and_then(|from| {
                    if from.trim().is_empty() {
                        anyhow::bail!("LEAD_FROM cannot be empty");
                    }
                    Ok(from.trim().to_string())
                })?,
            lead_recipients: std::env::var("LEAD_RECIPIENTS")
                .map_err(|_| anyhow::anyhow!("LEAD_RECIPIENTS environment variable required"))
                .and_then(|raw| {
                    let recipients = parse_recipients(&raw);
                    if recipients.is_empty() {
                        anyhow::bail!("LEAD_RECIPIENTS must list at least one address");
                    }
                    Ok(recipients)
                })?,
            payload_format: std::env::var("LEAD_PAYLOAD_FORMAT")
                .unwrap_or_else(|_| "both".to_string())
                .parse()?,
            subject_label: env_or("LEAD_SUBJECT_LABEL", "Trade-In Appraisal Lead"),
            vendor_name: env_or("ADF_VENDOR_NAME", "Dealership"),
            provider_name: env_or("ADF_PROVIDER_NAME", "Trade-In Appraisal Form"),
            phone_country_code: env_or("ADF_PHONE_COUNTRY_CODE", "+1"),
            backup_webhook_url: std::env::var("BACKUP_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    url.parse::<HttpUrl>()
                        .map(|u| u.0)
                        .map_err(|e| anyhow::anyhow!("BACKUP_WEBHOOK_URL {}", e))
                })
                .transpose()?,
            backup_webhook_secret: std::env::var("BACKUP_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            honeypot_field: env_or("HONEYPOT_FIELD", "company"),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a whole number of seconds"))?,
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .unwrap_or_else(|_| "1048576".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a number of bytes"))?,
            rate_limit_per_second: std::env::var("RATE_LIMIT_PER_SECOND")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<u64>()
                .ok()
                .filter(|n| (1..=1000).contains(n))
                .ok_or_else(|| {
                    anyhow::anyhow!("RATE_LIMIT_PER_SECOND must be a number between 1-1000")
                })?,
            rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_BURST must be a number"))?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Email API Base URL: {}", config.email_api_base_url);
        tracing::debug!("Lead recipients: {}", config.lead_recipients.len());
        tracing::debug!("Payload format: {:?}", config.payload_format);
        if config.backup_webhook_url.is_some() {
            tracing::info!("Backup webhook configured");
        } else {
            tracing::info!("No backup webhook configured, leads are only emailed");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

impl Config {
    /// Interval between replenished rate-limit tokens for one client IP.
    pub fn rate_limit_period(&self) -> Duration {
        Duration::from_millis(1000 / self.rate_limit_per_second.clamp(1, 1000))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Splits a recipient list on commas or semicolons, dropping blanks.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c == ';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// An absolute http(s) URL with any trailing slash removed.
struct HttpUrl(String);

impl FromStr for HttpUrl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            anyhow::bail!("cannot be empty");
        }
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            anyhow::bail!("must start with http:// or https://");
        }
        url::Url::parse(trimmed).map_err(|e| anyhow::anyhow!("is not a valid URL: {}", e))?;
        Ok(Self(trimmed.trim_end_matches('/').to_string()))
    }
}
