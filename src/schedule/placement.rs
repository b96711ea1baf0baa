use super::event::Event;
use super::util::DAYS_IN_WEEK;
use super::week::{DayCell, WeekWindow};
use time::Date;

pub(crate) const HOURS_PER_DAY: u8 = 24;

const MINUTES_PER_HOUR: u16 = 60;

/// How a one-time event's date is compared with a grid day
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) enum DateRule {
    /// Year, month, and day of month must all match
    #[default]
    ExactDate,
    /// Only the month and day of month of the cell's own date are compared,
    /// so a one-time event shows up on the same date every year.  Weeks that
    /// span two months use each day's month, not the month the week starts
    /// in.
    LegacyMonthDay,
}

/// Index of an event in the list being placed
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct EventId(pub(crate) usize);

/// One event shown in one cell of the grid
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Occurrence<'a> {
    pub(crate) id: EventId,
    pub(crate) event: &'a Event,
    pub(crate) day: DayCell,
    pub(crate) hour: u8,
}

impl DateRule {
    fn same_day(self, start: Date, day: DayCell) -> bool {
        match self {
            DateRule::ExactDate => start == day.date(),
            DateRule::LegacyMonthDay => start.month() == day.month() && start.day() == day.day(),
        }
    }
}

/// Tests whether `event` takes place in the hour-long slot beginning at
/// `hour` on `day`
pub(crate) fn occurs_at(event: &Event, day: DayCell, hour: u8, rule: DateRule) -> bool {
    if hour >= HOURS_PER_DAY {
        return false;
    }
    let slot_start = u16::from(hour) * MINUTES_PER_HOUR;
    let minutes = event.minutes_from_midnight();
    if !(slot_start..slot_start + MINUTES_PER_HOUR).contains(&minutes) {
        return false;
    }
    let one_time = rule.same_day(event.start_date(), day);
    let recurring = event.is_recurring()
        && event.recurring_days.contains(day.weekday())
        && day.date() >= event.start_date();
    one_time || recurring
}

/// Returns the events taking place in the given cell, in event order.  Each
/// event appears at most once.
pub(crate) fn occurrences_for(
    events: &[Event],
    day: DayCell,
    hour: u8,
    rule: DateRule,
) -> Vec<Occurrence<'_>> {
    events
        .iter()
        .enumerate()
        .filter(|&(_, event)| occurs_at(event, day, hour, rule))
        .map(|(i, event)| Occurrence {
            id: EventId(i),
            event,
            day,
            hour,
        })
        .collect()
}

/// All occurrences for one displayed week, indexed by day of week and hour
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct WeekGrid<'a> {
    window: WeekWindow,
    days: [DayCell; DAYS_IN_WEEK],
    cells: Vec<Vec<Occurrence<'a>>>,
}

impl<'a> WeekGrid<'a> {
    pub(crate) fn build(window: WeekWindow, events: &'a [Event], rule: DateRule) -> WeekGrid<'a> {
        let days = window.days();
        let mut cells = Vec::with_capacity(DAYS_IN_WEEK * usize::from(HOURS_PER_DAY));
        for day in days {
            for hour in 0..HOURS_PER_DAY {
                cells.push(occurrences_for(events, day, hour, rule));
            }
        }
        for occ in cells.iter().flatten() {
            log::trace!(
                "event=place module=schedule status=ok event_id={} day={} hour={}",
                occ.id.0,
                occ.day.date(),
                occ.hour
            );
        }
        WeekGrid {
            window,
            days,
            cells,
        }
    }

    pub(crate) fn window(&self) -> WeekWindow {
        self.window
    }

    pub(crate) fn days(&self) -> &[DayCell; DAYS_IN_WEEK] {
        &self.days
    }

    /// `day_index` is the number of days from the start of the week
    pub(crate) fn cell(&self, day_index: usize, hour: u8) -> &[Occurrence<'a>] {
        if day_index >= DAYS_IN_WEEK || hour >= HOURS_PER_DAY {
            return &[];
        }
        self.cells
            .get(day_index * usize::from(HOURS_PER_DAY) + usize::from(hour))
            .map_or(&[], Vec::as_slice)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Occurrence<'a>> + '_ {
        self.cells.iter().flatten()
    }

    /// Earliest hour of the week with at least one occurrence
    pub(crate) fn first_busy_hour(&self) -> Option<u8> {
        self.iter().map(|occ| occ.hour).min()
    }
}
