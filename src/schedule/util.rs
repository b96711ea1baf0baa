use time::Weekday::{self, *};

pub(crate) const DAYS_IN_WEEK: usize = 7;

/// The days of the week in display order
pub(crate) const WEEKDAYS: [Weekday; DAYS_IN_WEEK] = [
    Sunday, Monday, Tuesday, Wednesday, Thursday, Friday, Saturday,
];

pub(crate) trait WeekdayExt {
    fn index0(&self) -> u8;

    /// Three-letter English abbreviation, e.g., "Sun"
    fn short_name(&self) -> &'static str;

    /// Case-insensitively looks up a weekday by its abbreviation or full
    /// English name
    fn from_name(s: &str) -> Option<Self>
    where
        Self: Sized;
}

impl WeekdayExt for Weekday {
    fn index0(&self) -> u8 {
        self.number_days_from_sunday()
    }

    fn short_name(&self) -> &'static str {
        match self {
            Sunday => "Sun",
            Monday => "Mon",
            Tuesday => "Tue",
            Wednesday => "Wed",
            Thursday => "Thu",
            Friday => "Fri",
            Saturday => "Sat",
        }
    }

    fn from_name(s: &str) -> Option<Weekday> {
        WEEKDAYS.into_iter().find(|wd| {
            s.eq_ignore_ascii_case(wd.short_name()) || s.eq_ignore_ascii_case(&wd.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekdays_in_order() {
        for (i, wd) in WEEKDAYS.into_iter().enumerate() {
            assert_eq!(usize::from(wd.index0()), i);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Weekday::from_name("Sun"), Some(Sunday));
        assert_eq!(Weekday::from_name("wed"), Some(Wednesday));
        assert_eq!(Weekday::from_name("THURSDAY"), Some(Thursday));
        assert_eq!(Weekday::from_name("Funday"), None);
        assert_eq!(Weekday::from_name("Tues"), None);
        assert_eq!(Weekday::from_name(""), None);
    }
}
