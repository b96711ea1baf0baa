use super::util::{WeekdayExt, DAYS_IN_WEEK};
use time::{
    format_description::FormatItem,
    macros::{date, format_description},
    Date, Duration, Month, Weekday,
};

static LABEL_FMT: &[FormatItem<'_>] =
    format_description!("[month padding:none]/[day padding:none]/[year]");

/// Earliest Sunday whose whole week is representable
const FIRST_WEEK_START: Date = date!(-9999 - 01 - 07);

/// Latest Sunday whose whole week is representable
const LAST_WEEK_START: Date = date!(9999 - 12 - 19);

/// One column of the week grid
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct DayCell(Date);

impl DayCell {
    pub(crate) fn date(self) -> Date {
        self.0
    }

    pub(crate) fn month(self) -> Month {
        self.0.month()
    }

    pub(crate) fn day(self) -> u8 {
        self.0.day()
    }

    pub(crate) fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    pub(crate) fn weekday_name(self) -> &'static str {
        self.0.weekday().short_name()
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

/// The displayed week, identified by its first day (a Sunday)
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct WeekWindow(Date);

impl WeekWindow {
    /// Returns the week containing `date`, which can be any day of the week
    pub(crate) fn containing(date: Date) -> WeekWindow {
        let offset = Duration::days(date.weekday().index0().into());
        let start = date
            .checked_sub(offset)
            .unwrap_or(FIRST_WEEK_START)
            .clamp(FIRST_WEEK_START, LAST_WEEK_START);
        WeekWindow(start)
    }

    pub(crate) fn first_day(self) -> Date {
        self.0
    }

    pub(crate) fn last_day(self) -> Date {
        self.0.saturating_add(Duration::days(6))
    }

    pub(crate) fn days(self) -> [DayCell; DAYS_IN_WEEK] {
        std::array::from_fn(|i| {
            let i = i64::try_from(i).unwrap_or_default();
            DayCell(self.0.saturating_add(Duration::days(i)))
        })
    }

    /// Moves one week in the given direction.  At the edges of the calendar,
    /// the window stays where it is, so `w.next().previous() == w` holds for
    /// every window except the last one (and likewise `previous().next()`
    /// for every window except the first).
    pub(crate) fn navigate(self, direction: Direction) -> WeekWindow {
        let shift = Duration::weeks(1);
        let moved = match direction {
            Direction::Forward => self.0.checked_add(shift),
            Direction::Backward => self.0.checked_sub(shift),
        };
        moved.map_or(self, WeekWindow::containing)
    }

    pub(crate) fn next(self) -> WeekWindow {
        self.navigate(Direction::Forward)
    }

    pub(crate) fn previous(self) -> WeekWindow {
        self.navigate(Direction::Backward)
    }

    /// Human-readable name for the window, e.g., "Week of 3/10/2024"
    pub(crate) fn label(self) -> String {
        match self.0.format(&LABEL_FMT) {
            Ok(s) => format!("Week of {s}"),
            Err(_) => format!("Week of {}", self.0),
        }
    }
}
