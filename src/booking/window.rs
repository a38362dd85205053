//! Booking window computation.
//!
//! Pure functions shared by the user-facing and admin-facing booking entry
//! points - no database access. The overlap query itself lives in
//! `booking::queries`; the interval test it encodes is mirrored here so it can
//! be exercised without a database.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use crate::error::AppError;
use crate::models::Venue;

/// A validated, timezone-aware booking window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BookingWindow {
    /// Window length floor-divided to whole hours.
    pub fn duration_hours(&self) -> i64 {
        (self.end - self.start).num_seconds() / 3600
    }
}

/// Combine calendar dates with a venue's operating hours into a concrete
/// window.
///
/// The venue's opening and closing time-of-day anchor the instants; a venue
/// without configured hours is treated as open the full day. When the closing
/// time is not after the opening time the venue operates overnight and the
/// end instant lands on the day after `end_date`.
///
/// Returns a validation error when the end date precedes the start date or
/// the resulting end instant is not after the start instant.
pub fn compute_window(
    venue: &Venue,
    start_date: NaiveDate,
    end_date: NaiveDate,
    tz: FixedOffset,
) -> Result<BookingWindow, AppError> {
    if end_date < start_date {
        return Err(AppError::Validation(
            "End date must be on or after the start date.".to_string(),
        ));
    }

    let (open, close) = operating_hours(venue);

    let mut end_date = end_date;
    if close <= open {
        // Overnight operation: closing wraps past midnight.
        end_date += Duration::days(1);
    }

    let start = local_instant(start_date, open, tz);
    let end = local_instant(end_date, close, tz);

    if end <= start {
        return Err(AppError::Validation(
            "Selected dates must fall within the venue's available hours.".to_string(),
        ));
    }

    Ok(BookingWindow { start, end })
}

/// Half-open interval intersection test used to prevent double-booking.
pub fn windows_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Total cost of a window at the venue: base hourly cost plus add-on prices.
pub fn total_cost(venue: &Venue, window: &BookingWindow, addon_prices: &[Decimal]) -> Decimal {
    let base = venue.hourly_total(window.duration_hours());
    let addons: Decimal = addon_prices.iter().copied().sum();
    base + addons
}

fn operating_hours(venue: &Venue) -> (NaiveTime, NaiveTime) {
    match (venue.available_start_time, venue.available_end_time) {
        (Some(open), Some(close)) => (open, close),
        // No configured hours: open the full day.
        _ => (
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
        ),
    }
}

fn local_instant(date: NaiveDate, time: NaiveTime, tz: FixedOffset) -> DateTime<Utc> {
    date.and_time(time)
        .and_local_timezone(tz)
        .single()
        .map(|local| local.with_timezone(&Utc))
        // Fixed offsets have no DST gaps; this arm is unreachable in practice.
        .unwrap_or_else(|| date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use rust_decimal_macros::dec;

    fn venue_with_hours(open: Option<(u32, u32)>, close: Option<(u32, u32)>) -> Venue {
        Venue {
            id: 1,
            category_id: 1,
            name: "Skyline Arena".to_string(),
            slug: "skyline-arena".to_string(),
            description: String::new(),
            location: String::new(),
            city: String::new(),
            address: String::new(),
            price_per_hour: dec!(150000.00),
            capacity: 1500,
            facilities: String::new(),
            image_url: String::new(),
            available_start_time: open.map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap()),
            available_end_time: close.map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn jakarta() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_day_window_uses_venue_hours() {
        let venue = venue_with_hours(Some((7, 0)), Some((22, 0)));
        let day = date(2025, 3, 10);
        let window = compute_window(&venue, day, day, jakarta()).unwrap();

        let local_start = window.start.with_timezone(&jakarta());
        let local_end = window.end.with_timezone(&jakarta());
        assert_eq!(local_start.date_naive(), day);
        assert_eq!(local_start.hour(), 7);
        assert_eq!(local_end.date_naive(), day);
        assert_eq!(local_end.hour(), 22);
        assert_eq!(window.duration_hours(), 15);
    }

    #[test]
    fn overnight_hours_anchor_end_to_next_day() {
        // Venue open 22:00-06:00; booking start=end=day D.
        let venue = venue_with_hours(Some((22, 0)), Some((6, 0)));
        let day = date(2025, 3, 10);
        let window = compute_window(&venue, day, day, jakarta()).unwrap();

        let local_start = window.start.with_timezone(&jakarta());
        let local_end = window.end.with_timezone(&jakarta());
        assert_eq!(local_start.date_naive(), day);
        assert_eq!(local_start.hour(), 22);
        assert_eq!(local_end.date_naive(), day + Duration::days(1));
        assert_eq!(local_end.hour(), 6);
        assert_eq!(window.duration_hours(), 8);
    }

    #[test]
    fn end_date_before_start_date_is_rejected() {
        let venue = venue_with_hours(Some((7, 0)), Some((22, 0)));
        let err = compute_window(&venue, date(2025, 3, 10), date(2025, 3, 9), jakarta())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn missing_hours_default_to_full_day() {
        let venue = venue_with_hours(None, None);
        let day = date(2025, 3, 10);
        let window = compute_window(&venue, day, day, jakarta()).unwrap();
        assert_eq!(window.duration_hours(), 23);

        let local_start = window.start.with_timezone(&jakarta());
        assert_eq!(local_start.hour(), 0);
    }

    #[test]
    fn multi_day_window_spans_dates() {
        let venue = venue_with_hours(Some((7, 0)), Some((22, 0)));
        let window = compute_window(&venue, date(2025, 3, 10), date(2025, 3, 11), jakarta())
            .unwrap();
        // 07:00 day one to 22:00 day two.
        assert_eq!(window.duration_hours(), 39);
    }

    #[test]
    fn instants_are_timezone_aware() {
        let venue = venue_with_hours(Some((7, 0)), Some((22, 0)));
        let day = date(2025, 3, 10);
        let window = compute_window(&venue, day, day, jakarta()).unwrap();
        // 07:00 at UTC+7 is midnight UTC.
        assert_eq!(window.start.hour(), 0);
        assert_eq!(window.start.date_naive(), day);
    }

    #[test]
    fn negative_offsets_convert_to_utc() {
        let venue = venue_with_hours(Some((7, 0)), Some((22, 0)));
        let day = date(2025, 3, 10);
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let window = compute_window(&venue, day, day, tz).unwrap();
        // 07:00 at UTC-5 is noon UTC.
        assert_eq!(window.start.hour(), 12);
        assert_eq!(window.start.date_naive(), day);
        assert_eq!(window.duration_hours(), 15);
    }

    #[test]
    fn overlap_is_half_open() {
        let venue = venue_with_hours(Some((7, 0)), Some((22, 0)));
        let a = compute_window(&venue, date(2025, 3, 10), date(2025, 3, 10), jakarta()).unwrap();
        let b = compute_window(&venue, date(2025, 3, 11), date(2025, 3, 11), jakarta()).unwrap();

        assert!(windows_overlap(a.start, a.end, a.start, a.end));
        // Disjoint days do not overlap.
        assert!(!windows_overlap(a.start, a.end, b.start, b.end));
        // Touching endpoints do not overlap.
        assert!(!windows_overlap(a.start, a.end, a.end, b.end));
    }

    #[test]
    fn partial_intersections_overlap() {
        let start = Utc::now();
        let a = (start, start + Duration::hours(4));
        let b = (start + Duration::hours(2), start + Duration::hours(6));
        assert!(windows_overlap(a.0, a.1, b.0, b.1));
        assert!(windows_overlap(b.0, b.1, a.0, a.1));
        // Containment overlaps too.
        let inner = (start + Duration::hours(1), start + Duration::hours(2));
        assert!(windows_overlap(a.0, a.1, inner.0, inner.1));
    }

    #[test]
    fn total_cost_adds_addons_to_base() {
        let venue = venue_with_hours(Some((22, 0)), Some((6, 0)));
        let day = date(2025, 3, 10);
        let window = compute_window(&venue, day, day, jakarta()).unwrap();

        // 8 hours at 150000 plus one 50000 add-on.
        let total = total_cost(&venue, &window, &[dec!(50000.00)]);
        assert_eq!(total, dec!(1250000.00));

        let bare = total_cost(&venue, &window, &[]);
        assert_eq!(bare, dec!(1200000.00));
    }
}
