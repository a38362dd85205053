//! Application configuration loaded from the environment

use chrono::FixedOffset;
use rust_decimal::Decimal;

/// Runtime configuration for the service
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// Local timezone expressed as whole hours from UTC. Booking forms submit
    /// calendar dates which are interpreted in this offset.
    pub utc_offset_hours: i32,
    /// Fixed minimum deposit recorded on every payment.
    pub deposit_amount: Decimal,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let utc_offset_hours = std::env::var("APP_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7);
        let deposit_amount = std::env::var("DEPOSIT_AMOUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| Decimal::from(10_000));

        Ok(Self {
            database_url,
            bind_addr,
            utc_offset_hours,
            deposit_amount,
        })
    }

    /// The configured local timezone as a fixed offset.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_config(offset: i32) -> Config {
        Config {
            database_url: "postgres://localhost/test".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            utc_offset_hours: offset,
            deposit_amount: dec!(10000),
        }
    }

    #[test]
    fn timezone_uses_configured_offset() {
        assert_eq!(test_config(7).timezone().local_minus_utc(), 7 * 3600);
        assert_eq!(test_config(-5).timezone().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        assert_eq!(test_config(99).timezone().local_minus_utc(), 0);
    }
}
