// src/services/market_hours.rs
use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Asia::Kolkata;
use log::debug;

/// NSE/BSE regular session, Monday to Friday, both ends inclusive.
pub fn is_market_open<Tz: TimeZone>(now: &DateTime<Tz>) -> bool {
    let ist = now.with_timezone(&Kolkata);
    let open = NaiveTime::from_hms_opt(9, 15, 0).unwrap();
    let close = NaiveTime::from_hms_opt(15, 30, 59).unwrap();

    let weekday = ist.weekday();
    let time = ist.time();
    let is_open = !matches!(weekday, Weekday::Sat | Weekday::Sun) && time >= open && time <= close;

    debug!("IST {} {} - market open: {}", weekday, time.format("%H:%M"), is_open);
    is_open
}

pub fn is_market_open_now() -> bool {
    is_market_open(&Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ist(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<chrono_tz::Tz> {
        Kolkata.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn open_during_weekday_session() {
        // 2024-06-12 is a Wednesday
        assert!(is_market_open(&ist(2024, 6, 12, 9, 15)));
        assert!(is_market_open(&ist(2024, 6, 12, 12, 0)));
        assert!(is_market_open(&ist(2024, 6, 12, 15, 30)));
    }

    #[test]
    fn closed_outside_session_and_on_weekends() {
        assert!(!is_market_open(&ist(2024, 6, 12, 9, 14)));
        assert!(!is_market_open(&ist(2024, 6, 12, 15, 31)));
        assert!(!is_market_open(&ist(2024, 6, 15, 11, 0)));
        assert!(!is_market_open(&ist(2024, 6, 16, 11, 0)));
    }

    #[test]
    fn converts_from_utc() {
        // 04:00 UTC == 09:30 IST
        let utc = Utc.with_ymd_and_hms(2024, 6, 12, 4, 0, 0).unwrap();
        assert!(is_market_open(&utc));
        let utc = Utc.with_ymd_and_hms(2024, 6, 12, 11, 0, 0).unwrap();
        assert!(!is_market_open(&utc));
    }
}
