use crate::grid::{HourScroll, WeekView, DEFAULT_TOP_HOUR};
use crate::help::Help;
use crate::schedule::{parse_events, DateRule, Event, EventFault, WeekGrid, WeekWindow};
use crate::store::ScheduleStore;
use crate::theme::BASE_STYLE;
use crossterm::event::{read, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::Rect,
    widgets::{StatefulWidget, Widget},
    Terminal,
};
use std::io::{self, Write};
use time::Date;

/// Everything fetched for one user, validated and ready to place
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct LoadedSchedule {
    pub(crate) events: Vec<Event>,
    pub(crate) faults: Vec<EventFault>,
    /// Set when the store could not be read at all
    pub(crate) fetch_error: Option<String>,
}

impl LoadedSchedule {
    /// Fetches and validates the user's schedules.  Store failures leave the
    /// schedule empty rather than failing outright.
    pub(crate) fn fetch<S: ScheduleStore + ?Sized>(store: &S, user_id: &str) -> LoadedSchedule {
        match store.fetch_scheduled_events(user_id) {
            Ok(records) => {
                let parsed = parse_events(&records);
                LoadedSchedule {
                    events: parsed.events,
                    faults: parsed.faults,
                    fetch_error: None,
                }
            }
            Err(e) => {
                log::error!("event=fetch_schedules module=app status=error reason={e}");
                LoadedSchedule {
                    fetch_error: Some(e.to_string()),
                    ..LoadedSchedule::default()
                }
            }
        }
    }

    /// One-line summary of anything that kept schedules off the grid
    pub(crate) fn notice(&self) -> Option<String> {
        if let Some(e) = &self.fetch_error {
            return Some(format!("No schedules available: {e}"));
        }
        match self.faults.as_slice() {
            [] => None,
            [fault] => Some(format!("1 schedule could not be shown: {fault}")),
            [first, rest @ ..] => Some(format!(
                "{} schedules could not be shown: {first} (and {} more)",
                rest.len() + 1,
                rest.len()
            )),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct App {
    events: Vec<Event>,
    notice: Option<String>,
    rule: DateRule,
    today: Date,
    window: WeekWindow,
    scroll: HourScroll,
    source: String,
    state: AppState,
}

impl App {
    pub(crate) fn new(schedule: LoadedSchedule, today: Date) -> App {
        let notice = schedule.notice();
        let mut app = App {
            events: schedule.events,
            notice,
            rule: DateRule::default(),
            today,
            window: WeekWindow::containing(today),
            scroll: HourScroll::new(DEFAULT_TOP_HOUR),
            source: String::new(),
            state: AppState::Calendar,
        };
        app.scroll_to_first_event();
        app
    }

    pub(crate) fn date_rule(mut self, rule: DateRule) -> App {
        self.rule = rule;
        self.scroll_to_first_event();
        self
    }

    /// Shows the week containing `date` instead of the current week
    pub(crate) fn start_date(mut self, date: Date) -> App {
        self.window = WeekWindow::containing(date);
        self.scroll_to_first_event();
        self
    }

    /// Description of where the schedule came from, for the help screen
    pub(crate) fn source<S: Into<String>>(mut self, source: S) -> App {
        self.source = source.into();
        self
    }

    pub(crate) fn run<B: Backend>(mut self, mut terminal: Terminal<B>) -> io::Result<()> {
        while !self.quitting() {
            self.draw(&mut terminal)?;
            self.handle_input()?;
        }
        Ok(())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = read()?.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match self.state {
            AppState::Calendar => match key {
                KeyCode::Char('l' | 'n') | KeyCode::Right => self.next_week(),
                KeyCode::Char('h' | 'p') | KeyCode::Left => self.previous_week(),
                KeyCode::Char('j') | KeyCode::Down => self.scroll.scroll_down(),
                KeyCode::Char('k') | KeyCode::Up => self.scroll.scroll_up(),
                KeyCode::Char('0') | KeyCode::Home => {
                    self.jump_to_today();
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Quitting;
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Calendar;
                true
            }
            AppState::Quitting => false,
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }

    fn grid(&self) -> WeekGrid<'_> {
        WeekGrid::build(self.window, &self.events, self.rule)
    }

    // Returns `false` if the window could not move
    fn go_to(&mut self, window: WeekWindow) -> bool {
        let moved = window != self.window;
        self.window = window;
        log::debug!(
            "event=navigate module=app status=ok week_start={} week_end={}",
            self.window.first_day(),
            self.window.last_day()
        );
        moved
    }

    fn next_week(&mut self) -> bool {
        self.go_to(self.window.next())
    }

    fn previous_week(&mut self) -> bool {
        self.go_to(self.window.previous())
    }

    fn jump_to_today(&mut self) {
        self.go_to(WeekWindow::containing(self.today));
        self.scroll_to_first_event();
    }

    fn scroll_to_first_event(&mut self) {
        let hour = self.grid().first_busy_hour().unwrap_or(DEFAULT_TOP_HOUR);
        self.scroll.show(hour);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        let grid = WeekGrid::build(self.window, &self.events, self.rule);
        WeekView::new(&grid, self.today)
            .notice(self.notice.as_deref())
            .render(area, buf, &mut self.scroll);
        if self.state == AppState::Helping {
            Help::new(BASE_STYLE, &self.source).render(area, buf);
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Calendar,
    Helping,
    Quitting,
}
