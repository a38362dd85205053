//! Venue catalog models

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Sports venue category
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Venue row holding primary information
#[derive(Debug, Clone, FromRow)]
pub struct Venue {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub location: String,
    pub city: String,
    pub address: String,
    pub price_per_hour: Decimal,
    pub capacity: i32,
    pub facilities: String,
    pub image_url: String,
    pub available_start_time: Option<NaiveTime>,
    pub available_end_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Venue {
    /// Facilities are stored as a comma separated list.
    pub fn facilities_list(&self) -> Vec<String> {
        self.facilities
            .split(',')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect()
    }

    /// Base rental cost for a whole number of hours.
    pub fn hourly_total(&self, hours: i64) -> Decimal {
        self.price_per_hour * Decimal::from(hours)
    }
}

/// Optional priced add-on scoped to a venue
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AddOn {
    pub id: i64,
    pub venue_id: i64,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn venue(price: Decimal, facilities: &str) -> Venue {
        Venue {
            id: 1,
            category_id: 1,
            name: "Skyline Arena".to_string(),
            slug: "skyline-arena".to_string(),
            description: String::new(),
            location: String::new(),
            city: "Metropolis".to_string(),
            address: String::new(),
            price_per_hour: price,
            capacity: 1500,
            facilities: facilities.to_string(),
            image_url: String::new(),
            available_start_time: None,
            available_end_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn facilities_list_trims_and_drops_empties() {
        let v = venue(dec!(150000), " Lighting , Seating ,, ");
        assert_eq!(v.facilities_list(), vec!["Lighting", "Seating"]);
        assert!(venue(dec!(150000), "").facilities_list().is_empty());
    }

    #[test]
    fn hourly_total_multiplies_by_hours() {
        let v = venue(dec!(150000.00), "");
        assert_eq!(v.hourly_total(8), dec!(1200000.00));
        assert_eq!(v.hourly_total(0), dec!(0.00));
    }
}
