// src/common/dates.rs

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc, Weekday};

use crate::common::error::AppError;

/// Mês de competência no formato `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let invalid = || AppError::bad_request(format!("Invalid month '{}'. Expected format YYYY-MM.", raw));

        let (y, m) = raw.trim().split_once('-').ok_or_else(invalid)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn first_day(&self) -> NaiveDate {
        // Mês validado em parse/of: o dia 1 sempre existe.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (ny, nm) = if self.month == 12 { (self.year + 1, 1) } else { (self.year, self.month + 1) };
        NaiveDate::from_ymd_opt(ny, nm, 1)
            .map(|d| d - Duration::days(1))
            .unwrap_or(NaiveDate::MAX)
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Data no formato `YYYY-MM-DD`; qualquer outra coisa é 400.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("Invalid date '{}'. Expected format YYYY-MM-DD.", raw)))
}

/// Converte minutos de offset UTC do tenant num `FixedOffset`.
/// Offsets fora de ±18h caem para UTC.
pub fn tenant_offset(utc_offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).unwrap_or(Utc.fix())
}

pub fn local_date(at: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    at.with_timezone(&tenant_offset(utc_offset_minutes)).date_naive()
}

/// Dias do intervalo fechado `[from, to]`, em ordem. Vazio se `from > to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d <= to)
}

/// Quantidade de dias do intervalo fechado (0 se invertido).
pub fn inclusive_day_count(from: NaiveDate, to: NaiveDate) -> i64 {
    if from > to { 0 } else { (to - from).num_days() + 1 }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_month_and_rejects_garbage() {
        assert_eq!(YearMonth::parse("2024-02").unwrap(), YearMonth { year: 2024, month: 2 });
        assert!(YearMonth::parse("2024-13").is_err());
        assert!(YearMonth::parse("2024/02").is_err());
        assert!(YearMonth::parse("24-02").is_err());
        assert!(YearMonth::parse("").is_err());
    }

    #[test]
    fn month_bounds_handle_leap_years_and_december() {
        let feb = YearMonth::parse("2024-02").unwrap();
        assert_eq!(feb.first_day(), d(2024, 2, 1));
        assert_eq!(feb.last_day(), d(2024, 2, 29));

        let dec = YearMonth::parse("2023-12").unwrap();
        assert_eq!(dec.last_day(), d(2023, 12, 31));
        assert_eq!(dec.to_string(), "2023-12");
    }

    #[test]
    fn day_ranges_are_inclusive() {
        let days: Vec<_> = days_between(d(2024, 1, 30), d(2024, 2, 2)).collect();
        assert_eq!(days.len(), 4);
        assert_eq!(inclusive_day_count(d(2024, 1, 30), d(2024, 2, 2)), 4);
        assert_eq!(inclusive_day_count(d(2024, 2, 2), d(2024, 1, 30)), 0);
        assert_eq!(days_between(d(2024, 2, 2), d(2024, 1, 30)).count(), 0);
    }

    #[test]
    fn local_date_applies_offset() {
        let at = DateTime::parse_from_rfc3339("2024-03-01T23:30:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(local_date(at, 0), d(2024, 3, 1));
        assert_eq!(local_date(at, 330), d(2024, 3, 2));
        assert_eq!(local_date(at, -60), d(2024, 3, 1));
    }

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(parse_date("2024-02-29").unwrap(), d(2024, 2, 29));
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("29/02/2024").is_err());
        assert!(matches!(parse_date("yesterday"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn weekends() {
        assert!(is_weekend(d(2024, 3, 2)));
        assert!(!is_weekend(d(2024, 3, 4)));
    }
}
