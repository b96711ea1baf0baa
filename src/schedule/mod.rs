mod event;
mod placement;
mod util;
mod week;
pub(crate) use self::event::{parse_events, parse_start, ColorTag, Event, EventFault, WeekdaySet};
pub(crate) use self::placement::{DateRule, Occurrence, WeekGrid, HOURS_PER_DAY};
pub(crate) use self::util::DAYS_IN_WEEK;
pub(crate) use self::week::WeekWindow;
