use time::{macros::format_description, Date, OffsetDateTime, Time, UtcOffset};

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Wall clock at the clinic's offset.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    offset: UtcOffset,
}

impl Clock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }

    pub fn today(&self) -> Date {
        self.now().date()
    }
}

pub fn format_time_of_day(t: Time) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

/// `MM/DD` chart label.
pub fn chart_label(date: Date) -> String {
    format!("{:02}/{:02}", u8::from(date.month()), date.day())
}

/// Lenient `YYYY-MM-DD` parse for dates read off a photo.
pub fn parse_iso_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    #[test]
    fn formats_labels() {
        assert_eq!(chart_label(date!(2024 - 03 - 07)), "03/07");
        assert_eq!(format_time_of_day(time!(7:05)), "07:05");
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_iso_date(" 2024-11-30 "), Some(date!(2024 - 11 - 30)));
        assert_eq!(parse_iso_date("30/11/2024"), None);
    }
}
