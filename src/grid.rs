use crate::schedule::{Occurrence, WeekGrid, DAYS_IN_WEEK, HOURS_PER_DAY};
use crate::theme::{event_style, FAULT_STYLE, HOUR_STYLE, LABEL_STYLE, TODAY_STYLE, WEEKDAY_STYLE};
use ratatui::{prelude::*, widgets::*};
use std::ops::Range;
use time::Date;

/// Number of lines above the first hour: the week label, the day header, and
/// the header's rule
const HEADER_LINES: u16 = 3;

/// Number of lines below the last hour, used for notices
const FOOTER_LINES: u16 = 1;

/// Width of the column of hour labels, including a trailing space
const HOUR_WIDTH: u16 = 6;

/// Columns per day never shrink below this, even if the calendar then runs
/// off the right edge
const MIN_DAY_WIDTH: u16 = 4;

/// Hour shown at the top when the week has nothing scheduled
pub(crate) const DEFAULT_TOP_HOUR: u8 = 8;

const CORNER_LABEL: &str = "Hour";

const ACS_HLINE: char = '─';
const ACS_VLINE: char = '│';

/// Which hours of the day are on screen
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct HourScroll {
    top: u8,
    visible: u8,
}

impl HourScroll {
    pub(crate) fn new(top: u8) -> HourScroll {
        // The number of visible rows isn't known until the first render
        HourScroll {
            top: top.min(HOURS_PER_DAY - 1),
            visible: 1,
        }
    }

    #[cfg(test)]
    pub(crate) fn top(&self) -> u8 {
        self.top
    }

    pub(crate) fn scroll_down(&mut self) -> bool {
        if self.top + self.visible.max(1) < HOURS_PER_DAY {
            self.top += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn scroll_up(&mut self) -> bool {
        if self.top > 0 {
            self.top -= 1;
            true
        } else {
            false
        }
    }

    /// Makes `hour` visible, placing it as near the top as possible
    pub(crate) fn show(&mut self, hour: u8) {
        self.top = hour.min(HOURS_PER_DAY - 1);
        self.fit(self.visible);
    }

    // Called on each render with the number of hour rows that fit on screen
    fn fit(&mut self, visible: u8) {
        self.visible = visible.min(HOURS_PER_DAY);
        self.top = self.top.min(HOURS_PER_DAY - self.visible);
    }

    fn hours(&self) -> Range<u8> {
        self.top..(self.top + self.visible)
    }
}

/// Draws one week of the schedule with a row per hour and a column per day
#[derive(Clone, Copy, Debug)]
pub(crate) struct WeekView<'g> {
    grid: &'g WeekGrid<'g>,
    today: Date,
    notice: Option<&'g str>,
}

impl<'g> WeekView<'g> {
    pub(crate) fn new(grid: &'g WeekGrid<'g>, today: Date) -> WeekView<'g> {
        WeekView {
            grid,
            today,
            notice: None,
        }
    }

    pub(crate) fn notice(mut self, notice: Option<&'g str>) -> WeekView<'g> {
        self.notice = notice;
        self
    }
}

impl StatefulWidget for WeekView<'_> {
    type State = HourScroll;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut HourScroll) {
        let rows = area.height.saturating_sub(HEADER_LINES + FOOTER_LINES);
        state.fit(u8::try_from(rows).unwrap_or(u8::MAX));
        let day_width = (area.width.saturating_sub(HOUR_WIDTH) / 7).max(MIN_DAY_WIDTH);
        let mut canvas = BufferCanvas::new(area, buf, day_width);
        canvas.draw_label(&self.grid.window().label());
        canvas.draw_header(self.grid, self.today);
        for (row, hour) in std::iter::zip(0u16.., state.hours()) {
            canvas.draw_hour(row, hour);
            for i in 0..DAYS_IN_WEEK {
                canvas.draw_cell(row, i, self.grid.cell(i, hour));
            }
        }
        if let Some(notice) = self.notice {
            canvas.draw_notice(area.height.saturating_sub(FOOTER_LINES), notice);
        }
    }
}

/// Label for the hour column, e.g., "12 AM" or "3 PM"
fn hour_label(hour: u8) -> String {
    match hour {
        0 => String::from("12 AM"),
        1..=11 => format!("{hour} AM"),
        12 => String::from("12 PM"),
        h => format!("{} PM", h - 12),
    }
}

/// Text for a cell: the lone event with its time, or the first event and a
/// count of the rest
fn cell_text(occurrences: &[Occurrence<'_>]) -> Option<String> {
    match occurrences {
        [] => None,
        [occ] => Some(format!("{} {}", occ.event.time_label(), occ.event.title)),
        [first, rest @ ..] => Some(format!("{} +{}", first.event.title, rest.len())),
    }
}

fn fit_width(s: &str, width: u16) -> String {
    let width = usize::from(width);
    let s = s.chars().take(width).collect::<String>();
    format!("{s:<width$}")
}

#[derive(Debug, Eq, PartialEq)]
struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
    day_width: u16,
}

impl<'a> BufferCanvas<'a> {
    fn new(area: Rect, buf: &'a mut Buffer, day_width: u16) -> Self {
        Self {
            area,
            buf,
            day_width,
        }
    }

    fn day_col(&self, index: usize) -> u16 {
        HOUR_WIDTH + self.day_width * u16::try_from(index).unwrap_or(u16::MAX)
    }

    fn draw_label(&mut self, label: &str) {
        self.mvprint(0, 0, label, Some(LABEL_STYLE));
    }

    fn draw_header(&mut self, grid: &WeekGrid<'_>, today: Date) {
        self.mvprint(1, 0, CORNER_LABEL, Some(HOUR_STYLE));
        for (i, day) in grid.days().iter().enumerate() {
            let x = self.day_col(i);
            let style = if day.date() == today {
                TODAY_STYLE
            } else {
                WEEKDAY_STYLE
            };
            self.mvaddch(1, x, ACS_VLINE);
            let text = format!("{:>2} {}", day.day(), day.weekday_name());
            self.mvprint(1, x + 1, fit_width(&text, self.day_width - 1), Some(style));
        }
        let width = self.day_col(DAYS_IN_WEEK);
        self.hline(2, 0, ACS_HLINE, width);
    }

    fn draw_hour(&mut self, row: u16, hour: u8) {
        self.mvprint(
            row + HEADER_LINES,
            0,
            format!("{:>5}", hour_label(hour)),
            Some(HOUR_STYLE),
        );
    }

    fn draw_cell(&mut self, row: u16, index: usize, occurrences: &[Occurrence<'_>]) {
        let y = row + HEADER_LINES;
        let x = self.day_col(index);
        self.mvaddch(y, x, ACS_VLINE);
        if let Some(text) = cell_text(occurrences) {
            let style = occurrences
                .first()
                .map(|occ| event_style(&occ.event.color));
            self.mvprint(y, x + 1, fit_width(&text, self.day_width - 1), style);
        }
    }

    fn draw_notice(&mut self, y: u16, notice: &str) {
        self.mvprint(y, 0, notice, Some(FAULT_STYLE));
    }

    fn mvaddch(&mut self, y: u16, x: u16, ch: char) {
        if y < self.area.height && x < self.area.width {
            if let Some(cell) = self.buf.cell_mut((x + self.area.x, y + self.area.y)) {
                cell.set_char(ch);
            }
        }
    }

    fn mvprint<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Option<Style>) {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style.unwrap_or_default());
            let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
            // A Paragraph truncates text that runs past the edge of the area,
            // but the Rect given to it must lie entirely within the frame.
            Paragraph::new(text).render(
                Rect {
                    x: x + self.area.x,
                    y: y + self.area.y,
                    width: (self.area.width - x).min(width),
                    height: 1,
                },
                self.buf,
            );
        }
    }

    fn hline(&mut self, y: u16, x: u16, ch: char, length: u16) {
        self.mvprint(y, x, String::from(ch).repeat(length.into()), None);
    }
}
