//! Form DTOs for booking endpoints.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppError;

use super::models::PaymentMethod;

/// Booking submission from the venue detail page.
///
/// Add-on ids arrive as a comma separated list so the plain HTML form can
/// post them in a single field.
#[derive(Debug, Deserialize)]
pub struct BookingForm {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub addons: String,
}

impl BookingForm {
    pub fn addon_ids(&self) -> Result<Vec<i64>, AppError> {
        self.addons
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| AppError::Validation(format!("Invalid add-on id: {s}")))
            })
            .collect()
    }
}

/// Payment method selection
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub method: String,
}

impl PaymentForm {
    pub fn parse_method(&self) -> Result<PaymentMethod, AppError> {
        match self.method.as_str() {
            "qris" => Ok(PaymentMethod::Qris),
            "gopay" => Ok(PaymentMethod::Gopay),
            other => Err(AppError::Validation(format!(
                "Unsupported payment method: {other}"
            ))),
        }
    }
}

/// Admin approve/cancel decision submission
#[derive(Debug, Deserialize)]
pub struct DecisionForm {
    pub booking_id: i64,
    pub decision: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(addons: &str) -> BookingForm {
        BookingForm {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            notes: String::new(),
            addons: addons.to_string(),
        }
    }

    #[test]
    fn addon_ids_parse_comma_separated_values() {
        assert_eq!(form("1, 2,3").addon_ids().unwrap(), vec![1, 2, 3]);
        assert!(form("").addon_ids().unwrap().is_empty());
        assert!(form(" , ").addon_ids().unwrap().is_empty());
        assert!(form("1,abc").addon_ids().is_err());
    }

    #[test]
    fn payment_method_parsing() {
        let ok = PaymentForm { method: "gopay".to_string() };
        assert_eq!(ok.parse_method().unwrap(), PaymentMethod::Gopay);
        let bad = PaymentForm { method: "cash".to_string() };
        assert!(bad.parse_method().is_err());
    }
}
