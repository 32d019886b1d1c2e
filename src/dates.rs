use time::{Date, Duration, OffsetDateTime};

/// Serde adapter for plain `YYYY-MM-DD` dates (plan days, history dates).
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let out = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&out)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Date::parse(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// ISO week tag like `2026-W32`, used to mark merge targets.
pub fn iso_week_key(date: Date) -> String {
    let (year, week, _) = date.to_iso_week_date();
    format!("{year}-W{week:02}")
}

/// The date one ISO week before `date` (same weekday, previous week).
pub fn previous_week(date: Date) -> Date {
    date - Duration::days(7)
}

/// Start of the current Sunday-anchored week for a timestamp.
pub fn week_start_sunday(now: OffsetDateTime) -> Date {
    let date = now.date();
    date - Duration::days(i64::from(date.weekday().number_days_from_sunday()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn iso_week_key_formats_year_and_week() {
        assert_eq!(iso_week_key(date!(2026 - 08 - 07)), "2026-W32");
        // Jan 1st 2027 belongs to ISO week 53 of 2026.
        assert_eq!(iso_week_key(date!(2027 - 01 - 01)), "2026-W53");
    }

    #[test]
    fn previous_week_is_seven_days_back() {
        assert_eq!(previous_week(date!(2026 - 08 - 07)), date!(2026 - 07 - 31));
        assert_eq!(
            iso_week_key(previous_week(date!(2026 - 08 - 07))),
            "2026-W31"
        );
    }

    #[test]
    fn week_start_is_sunday() {
        // 2026-08-07 is a Friday; the week began on Sunday the 2nd.
        let start = week_start_sunday(datetime!(2026 - 08 - 07 15:30 UTC));
        assert_eq!(start, date!(2026 - 08 - 02));
        // A Sunday is its own week start.
        let start = week_start_sunday(datetime!(2026 - 08 - 02 00:10 UTC));
        assert_eq!(start, date!(2026 - 08 - 02));
    }
}
