use std::fmt;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Wall-clock time of day with minute precision, rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u32);

impl ClockTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self(hour * 60 + minute))
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    /// Accepts `HH:MM` and the `HH:MM:SS` form databases hand back for time columns.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(anyhow::anyhow!("invalid time format: {s}"));
        }
        let hour: u32 = parts[0]
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
        let minute: u32 = parts[1]
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
        if parts.len() == 3 && parts[2].parse::<u32>().map_or(true, |sec| sec > 59) {
            return Err(anyhow::anyhow!("invalid second in: {s}"));
        }
        Self::from_hm(hour, minute).ok_or_else(|| anyhow::anyhow!("time out of range: {s}"))
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn hour(self) -> u32 {
        self.0 / 60
    }

    pub fn minute(self) -> u32 {
        self.0 % 60
    }

    /// Adds minutes, returning `None` when the result would pass midnight.
    pub fn checked_add_minutes(self, minutes: u32) -> Option<Self> {
        self.0.checked_add(minutes).and_then(Self::from_minutes)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ClockTime::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// The salon's weekly opening policy: closed weekdays plus one daily window
/// sliced into fixed-size slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub closed_weekdays: Vec<Weekday>,
    pub opens_at: ClockTime,
    pub closes_at: ClockTime,
    pub slot_minutes: u32,
}

impl Default for OpeningHours {
    fn default() -> Self {
        Self {
            closed_weekdays: vec![Weekday::Sun, Weekday::Mon],
            opens_at: ClockTime(10 * 60),
            closes_at: ClockTime(19 * 60),
            slot_minutes: 30,
        }
    }
}

impl OpeningHours {
    pub fn is_closed_on(&self, weekday: Weekday) -> bool {
        self.closed_weekdays.contains(&weekday)
    }

    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        !self.is_closed_on(date.weekday())
    }

    /// True when `start..end` lies inside the daily window.
    pub fn contains(&self, start: ClockTime, end: ClockTime) -> bool {
        start >= self.opens_at && end <= self.closes_at && start < end
    }

    pub fn to_human_readable(&self) -> String {
        let open_days: Vec<String> = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .filter(|d| !self.is_closed_on(*d))
        .map(|d| d.to_string())
        .collect();

        if open_days.is_empty() {
            return String::new();
        }
        format!("{}: {}-{}", open_days.join(", "), self.opens_at, self.closes_at)
    }
}

/// Parses a comma separated weekday list such as `sun,mon`.
pub fn parse_weekdays(s: &str) -> anyhow::Result<Vec<Weekday>> {
    s.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            d.parse::<Weekday>()
                .map_err(|_| anyhow::anyhow!("invalid weekday: {d}"))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub day: u32,
    pub date: NaiveDate,
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: ClockTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(t("09:05").to_string(), "09:05");
        assert_eq!(t("18:40:00").to_string(), "18:40");
        assert_eq!(t(" 7:30 ").to_string(), "07:30");
    }

    #[test]
    fn test_parse_invalid_time() {
        assert!(ClockTime::parse("25:00").is_err());
        assert!(ClockTime::parse("10:60").is_err());
        assert!(ClockTime::parse("10").is_err());
        assert!(ClockTime::parse("ab:cd").is_err());
        assert!(ClockTime::parse("10:00:99").is_err());
    }

    #[test]
    fn test_checked_add_rolls_over_hours_not_days() {
        assert_eq!(t("18:40").checked_add_minutes(50), Some(t("19:30")));
        assert_eq!(t("23:30").checked_add_minutes(29), Some(t("23:59")));
        assert_eq!(t("23:30").checked_add_minutes(30), None);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&t("14:00")).unwrap();
        assert_eq!(json, "\"14:00\"");
        let back: ClockTime = serde_json::from_str("\"14:00:00\"").unwrap();
        assert_eq!(back, t("14:00"));
        assert!(serde_json::from_str::<ClockTime>("\"nope\"").is_err());
    }

    #[test]
    fn test_default_policy() {
        let hours = OpeningHours::default();
        // 2025-06-15 is a Sunday, 2025-06-16 a Monday, 2025-06-17 a Tuesday
        assert!(!hours.is_open_on(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()));
        assert!(!hours.is_open_on(NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()));
        assert!(hours.is_open_on(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap()));
    }

    #[test]
    fn test_contains_window() {
        let hours = OpeningHours::default();
        assert!(hours.contains(t("10:00"), t("11:00")));
        assert!(hours.contains(t("18:00"), t("19:00")));
        assert!(!hours.contains(t("18:30"), t("19:30")));
        assert!(!hours.contains(t("09:30"), t("10:30")));
    }

    #[test]
    fn test_parse_weekdays() {
        assert_eq!(
            parse_weekdays("sun, Mon").unwrap(),
            vec![Weekday::Sun, Weekday::Mon]
        );
        assert!(parse_weekdays("").unwrap().is_empty());
        assert!(parse_weekdays("sun,xyz").is_err());
    }

    #[test]
    fn test_to_human_readable() {
        let hours = OpeningHours::default();
        assert_eq!(hours.to_human_readable(), "Tue, Wed, Thu, Fri, Sat: 10:00-19:00");
    }
}
