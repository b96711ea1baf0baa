use super::util::{WeekdayExt, WEEKDAYS};
use crate::store::ScheduledTestRecord;
use std::fmt;
use thiserror::Error;
use time::{
    format_description::FormatItem, macros::format_description, Date, PrimitiveDateTime, Weekday,
};

static MINUTE_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]T[hour]:[minute]");

static SECOND_FMT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

static SUBSECOND_FMT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");

/// Color tag given to records that don't name one
pub(crate) const DEFAULT_COLOR: &str = "blue";

/// A set of days of the week, stored as a bitmask indexed by days from Sunday
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) struct WeekdaySet(u8);

impl WeekdaySet {
    pub(crate) const EMPTY: WeekdaySet = WeekdaySet(0);

    pub(crate) fn insert(&mut self, wd: Weekday) {
        self.0 |= 1 << wd.index0();
    }

    pub(crate) fn contains(self, wd: Weekday) -> bool {
        self.0 & (1 << wd.index0()) != 0
    }

    pub(crate) fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub(crate) fn iter(self) -> impl Iterator<Item = Weekday> {
        WEEKDAYS.into_iter().filter(move |&wd| self.contains(wd))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for wd in iter {
            set.insert(wd);
        }
        set
    }
}

impl std::str::FromStr for WeekdaySet {
    type Err = EventError;

    /// Parses a comma-separated list of weekday names, e.g., `"Sun,Wed"`.
    /// Empty input and empty items are allowed and contribute nothing.
    fn from_str(s: &str) -> Result<WeekdaySet, EventError> {
        s.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                Weekday::from_name(token)
                    .ok_or_else(|| EventError::UnknownWeekday(token.to_owned()))
            })
            .collect()
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for wd in self.iter() {
            if !std::mem::replace(&mut first, false) {
                write!(f, ",")?;
            }
            write!(f, "{}", wd.short_name())?;
        }
        Ok(())
    }
}

/// Opaque color identifier passed through to rendering
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct ColorTag(String);

impl ColorTag {
    pub(crate) fn new<S: Into<String>>(tag: S) -> ColorTag {
        ColorTag(tag.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ColorTag {
    fn default() -> ColorTag {
        ColorTag::new(DEFAULT_COLOR)
    }
}

/// A scheduled test run.
///
/// An event with no recurring days happens once, at `start`.  An event with
/// recurring days additionally happens at the same time of day on each of
/// those weekdays, every week, starting on the calendar date of `start`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Event {
    pub(crate) title: String,
    pub(crate) start: PrimitiveDateTime,
    pub(crate) recurring_days: WeekdaySet,
    pub(crate) color: ColorTag,
}

impl Event {
    pub(crate) fn new<S: Into<String>>(title: S, start: PrimitiveDateTime) -> Event {
        Event {
            title: title.into(),
            start,
            recurring_days: WeekdaySet::EMPTY,
            color: ColorTag::default(),
        }
    }

    pub(crate) fn recurring_on(mut self, days: WeekdaySet) -> Event {
        self.recurring_days = days;
        self
    }

    pub(crate) fn color(mut self, color: ColorTag) -> Event {
        self.color = color;
        self
    }

    pub(crate) fn is_recurring(&self) -> bool {
        !self.recurring_days.is_empty()
    }

    pub(crate) fn start_date(&self) -> Date {
        self.start.date()
    }

    pub(crate) fn minutes_from_midnight(&self) -> u16 {
        u16::from(self.start.hour()) * 60 + u16::from(self.start.minute())
    }

    /// The start time of day as shown on the grid, e.g., "2:30 PM"
    pub(crate) fn time_label(&self) -> String {
        let (hour, ampm) = match self.start.hour() {
            0 => (12, "AM"),
            h @ 1..=11 => (h, "AM"),
            12 => (12, "PM"),
            h => (h - 12, "PM"),
        };
        format!("{hour}:{:02} {ampm}", self.start.minute())
    }
}

impl TryFrom<&ScheduledTestRecord> for Event {
    type Error = EventError;

    fn try_from(record: &ScheduledTestRecord) -> Result<Event, EventError> {
        let start = parse_start(&record.start_date)?;
        let days = record.weekly_schedule.as_deref().unwrap_or("").parse()?;
        let color = record
            .color
            .as_deref()
            .map_or_else(ColorTag::default, ColorTag::new);
        Ok(Event::new(record.test_name.clone(), start)
            .recurring_on(days)
            .color(color))
    }
}

/// Parses a wall-clock start time.  A trailing `Z` or UTC offset is
/// discarded, not applied.
pub(crate) fn parse_start(s: &str) -> Result<PrimitiveDateTime, EventError> {
    let s = s.trim();
    let naive = strip_offset(s);
    [MINUTE_FMT, SECOND_FMT, SUBSECOND_FMT]
        .into_iter()
        .find_map(|fmt| PrimitiveDateTime::parse(naive, &fmt).ok())
        .ok_or_else(|| EventError::BadStart(s.to_owned()))
}

fn strip_offset(s: &str) -> &str {
    if let Some(rest) = s.strip_suffix(['Z', 'z']) {
        return rest;
    }
    // Offsets look like "+HH:MM", "-HH:MM", "+HHMM", or "+HH" and can only
    // appear after the 'T'
    let Some(tpos) = s.find('T') else {
        return s;
    };
    match s[tpos..].rfind(['+', '-']) {
        Some(i) => &s[..tpos + i],
        None => s,
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum EventError {
    #[error("invalid start time {0:?}; expected YYYY-MM-DDTHH:MM[:SS]")]
    BadStart(String),
    #[error("unknown weekday {0:?} in weekly schedule")]
    UnknownWeekday(String),
}

/// A record that could not be turned into an [`Event`]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("schedule #{index} ({title:?}): {source}")]
pub(crate) struct EventFault {
    pub(crate) index: usize,
    pub(crate) title: String,
    pub(crate) source: EventError,
}

/// The outcome of validating a batch of store records
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ParsedEvents {
    pub(crate) events: Vec<Event>,
    pub(crate) faults: Vec<EventFault>,
}

/// Validates each record independently; a bad record becomes a fault and
/// does not affect the others.
pub(crate) fn parse_events(records: &[ScheduledTestRecord]) -> ParsedEvents {
    let mut parsed = ParsedEvents::default();
    for (index, record) in records.iter().enumerate() {
        match Event::try_from(record) {
            Ok(ev) => parsed.events.push(ev),
            Err(source) => {
                log::warn!(
                    "event=parse_schedule module=schedule status=fault index={index} reason={source}"
                );
                parsed.faults.push(EventFault {
                    index,
                    title: record.test_name.clone(),
                    source,
                });
            }
        }
    }
    log::debug!(
        "event=parse_schedule module=schedule status=ok events={} faults={}",
        parsed.events.len(),
        parsed.faults.len()
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};
    use time::Weekday::*;

    fn record(name: &str, start: &str, days: Option<&str>) -> ScheduledTestRecord {
        ScheduledTestRecord {
            test_name: name.to_owned(),
            start_date: start.to_owned(),
            weekly_schedule: days.map(str::to_owned),
            color: None,
            user_id: String::from("alice"),
        }
    }

    #[test]
    fn test_weekday_set_from_str() {
        let set = "Sun,Wed".parse::<WeekdaySet>().unwrap();
        assert!(set.contains(Sunday));
        assert!(set.contains(Wednesday));
        assert!(!set.contains(Monday));
        assert_eq!(set.iter().collect::<Vec<_>>(), [Sunday, Wednesday]);
    }

    #[test]
    fn test_weekday_set_case_and_spacing() {
        let set = " mon , FRI,saturday ".parse::<WeekdaySet>().unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), [Monday, Friday, Saturday]);
    }

    #[test]
    fn test_weekday_set_empty() {
        assert_eq!("".parse::<WeekdaySet>(), Ok(WeekdaySet::EMPTY));
        assert_eq!(",,".parse::<WeekdaySet>(), Ok(WeekdaySet::EMPTY));
    }

    #[test]
    fn test_weekday_set_bad_token() {
        assert_eq!(
            "Mon,Funday".parse::<WeekdaySet>(),
            Err(EventError::UnknownWeekday(String::from("Funday")))
        );
    }

    #[test]
    fn test_weekday_set_display() {
        let set = [Wednesday, Sunday].into_iter().collect::<WeekdaySet>();
        assert_eq!(set.to_string(), "Sun,Wed");
        assert_eq!(WeekdaySet::EMPTY.to_string(), "");
    }

    #[test]
    fn test_parse_start_formats() {
        let expected = datetime!(2024-03-12 14:30);
        for s in [
            "2024-03-12T14:30",
            "2024-03-12T14:30:00",
            "2024-03-12T14:30:00.000",
            "2024-03-12T14:30:00Z",
            "2024-03-12T14:30:00+00:00",
            "2024-03-12T14:30:00-08:00",
            " 2024-03-12T14:30 ",
        ] {
            assert_eq!(parse_start(s), Ok(expected), "parsing {s:?}");
        }
    }

    #[test]
    fn test_parse_start_offset_not_applied() {
        let dt = parse_start("2024-03-12T23:30:00-08:00").unwrap();
        assert_eq!(dt.date(), date!(2024 - 03 - 12));
        assert_eq!(dt.hour(), 23);
    }

    #[test]
    fn test_parse_start_garbage() {
        for s in ["", "tomorrow", "2024-03-12", "2024-13-01T10:00", "2024-03-12T25:00"] {
            assert_eq!(
                parse_start(s),
                Err(EventError::BadStart(s.to_owned())),
                "parsing {s:?}"
            );
        }
    }

    #[test]
    fn test_minutes_and_label() {
        let ev = Event::new("nightly", datetime!(2024-03-12 14:05));
        assert_eq!(ev.minutes_from_midnight(), 14 * 60 + 5);
        assert_eq!(ev.time_label(), "2:05 PM");
        let ev = Event::new("midnight", datetime!(2024-03-12 00:00));
        assert_eq!(ev.minutes_from_midnight(), 0);
        assert_eq!(ev.time_label(), "12:00 AM");
        let ev = Event::new("noon", datetime!(2024-03-12 12:45));
        assert_eq!(ev.time_label(), "12:45 PM");
    }

    #[test]
    fn test_event_from_record() {
        let mut rec = record("smoke", "2024-03-11T09:00:00", Some("Mon,Wed"));
        rec.color = Some(String::from("green"));
        let ev = Event::try_from(&rec).unwrap();
        assert_eq!(ev.title, "smoke");
        assert_eq!(ev.start, datetime!(2024-03-11 09:00));
        assert!(ev.is_recurring());
        assert_eq!(ev.recurring_days.to_string(), "Mon,Wed");
        assert_eq!(ev.color.as_str(), "green");
    }

    #[test]
    fn test_event_from_record_defaults() {
        let ev = Event::try_from(&record("once", "2024-03-12T14:30", None)).unwrap();
        assert!(!ev.is_recurring());
        assert_eq!(ev.color, ColorTag::default());
    }

    #[test]
    fn test_parse_events_isolates_faults() {
        let records = [
            record("good", "2024-03-12T14:30", None),
            record("bad day", "2024-03-12T14:30", Some("Mon,Funday")),
            record("bad time", "half past two", None),
            record("also good", "2024-03-11T09:00", Some("Mon")),
        ];
        let parsed = parse_events(&records);
        assert_eq!(
            parsed
                .events
                .iter()
                .map(|ev| ev.title.as_str())
                .collect::<Vec<_>>(),
            ["good", "also good"]
        );
        assert_eq!(
            parsed.faults,
            [
                EventFault {
                    index: 1,
                    title: String::from("bad day"),
                    source: EventError::UnknownWeekday(String::from("Funday")),
                },
                EventFault {
                    index: 2,
                    title: String::from("bad time"),
                    source: EventError::BadStart(String::from("half past two")),
                },
            ]
        );
        assert_eq!(
            parsed.faults[0].to_string(),
            r#"schedule #1 ("bad day"): unknown weekday "Funday" in weekly schedule"#
        );
    }
}
