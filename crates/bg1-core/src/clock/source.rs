use chrono::{DateTime, Local, TimeZone};

/// Date and time formatted for display
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateTimeStrings {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS.mmm`
    pub time: String,
}

impl DateTimeStrings {
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            date: dt.format("%Y-%m-%d").to_string(),
            time: dt.format("%H:%M:%S%.3f").to_string(),
        }
    }
}

pub trait DateTimeSource: Send + Sync {
    fn now(&self) -> DateTimeStrings;
}

/// Wall clock in the local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDateTime;

impl DateTimeSource for SystemDateTime {
    fn now(&self) -> DateTimeStrings {
        DateTimeStrings::from_datetime(&Local::now())
    }
}

/// A source frozen at one instant, for demos and tests
#[derive(Debug, Clone)]
pub struct FixedDateTime(DateTimeStrings);

impl FixedDateTime {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self(DateTimeStrings {
            date: date.into(),
            time: time.into(),
        })
    }
}

impl DateTimeSource for FixedDateTime {
    fn now(&self) -> DateTimeStrings {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_from_datetime_formats_millis() {
        let dt = NaiveDate::from_ymd_opt(2020, 4, 5)
            .unwrap()
            .and_hms_milli_opt(12, 59, 47, 328)
            .unwrap()
            .and_utc();
        let s = DateTimeStrings::from_datetime(&dt);
        assert_eq!(s.date, "2020-04-05");
        assert_eq!(s.time, "12:59:47.328");
    }

    #[test]
    fn test_system_time_shape() {
        let now = SystemDateTime.now();
        assert_eq!(now.date.len(), 10);
        assert_eq!(now.time.len(), 12);
    }

    #[test]
    fn test_fixed_source() {
        let src = FixedDateTime::new("2020-04-05", "12:59:47.328");
        assert_eq!(src.now(), src.now());
        assert_eq!(src.now().time, "12:59:47.328");
    }
}
