mod app;
mod create;
mod grid;
mod help;
mod logging;
mod schedule;
mod store;
mod theme;
use crate::app::{App, LoadedSchedule};
use crate::create::{create_schedule, ScheduleRequest};
use crate::logging::{init_logging, DEFAULT_LOG_LEVEL};
use crate::schedule::{parse_start, DateRule, WeekdaySet};
use crate::store::{JsonFileStore, ScheduleStore};
use anyhow::Context;
use flexi_logger::LoggerHandle;
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use time::{
    format_description::FormatItem, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

const DEFAULT_SCHEDULE_FILE: &str = "schedule.json";

#[derive(Clone, Debug, Eq, PartialEq)]
struct Options {
    file: PathBuf,
    user: String,
    legacy_dates: bool,
    log_dir: Option<PathBuf>,
    log_level: String,
}

impl Options {
    fn from_env() -> Options {
        Options {
            file: PathBuf::from(DEFAULT_SCHEDULE_FILE),
            user: std::env::var("USER").unwrap_or_default(),
            legacy_dates: false,
            log_dir: None,
            log_level: String::from(DEFAULT_LOG_LEVEL),
        }
    }

    fn date_rule(&self) -> DateRule {
        if self.legacy_dates {
            DateRule::LegacyMonthDay
        } else {
            DateRule::ExactDate
        }
    }

    fn store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.file)
    }

    fn start_logging(&self) -> anyhow::Result<Option<LoggerHandle>> {
        self.log_dir
            .as_deref()
            .map(|dir| init_logging(&self.log_level, dir))
            .transpose()
            .context("failed to initialize logging")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mode {
    Run,
    Suites,
    Add,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run {
        opts: Options,
        date: Option<Date>,
    },
    Suites {
        opts: Options,
    },
    Add {
        opts: Options,
        request: ScheduleRequest,
    },
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser, mut opts: Options) -> Result<Command, lexopt::Error> {
        let mut mode = Mode::Run;
        let mut positional_seen = false;
        let mut date = None;
        let mut suite = None;
        let mut start = None;
        let mut days = WeekdaySet::EMPTY;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('f') | Arg::Long("file") => opts.file = parser.value()?.into(),
                Arg::Short('u') | Arg::Long("user") => opts.user = parser.value()?.string()?,
                Arg::Long("legacy-dates") => opts.legacy_dates = true,
                Arg::Long("log-dir") => opts.log_dir = Some(parser.value()?.into()),
                Arg::Long("log-level") => opts.log_level = parser.value()?.string()?,
                Arg::Long("suite") if mode == Mode::Add => {
                    suite = Some(parser.value()?.string()?);
                }
                Arg::Long("start") if mode == Mode::Add => {
                    start = Some(parser.value()?.parse_with(parse_start)?);
                }
                Arg::Long("days") if mode == Mode::Add => {
                    days = parser.value()?.parse_with(str::parse::<WeekdaySet>)?;
                }
                Arg::Value(value) if !positional_seen => {
                    positional_seen = true;
                    if value == "suites" {
                        mode = Mode::Suites;
                    } else if value == "add" {
                        mode = Mode::Add;
                    } else {
                        date = Some(value.parse_with(|s| Date::parse(s, &YMD_FMT))?);
                    }
                }
                _ => return Err(arg.unexpected()),
            }
        }
        match mode {
            Mode::Run => Ok(Command::Run { opts, date }),
            Mode::Suites => Ok(Command::Suites { opts }),
            Mode::Add => {
                let suite = suite.ok_or_else(|| missing("--suite"))?;
                let start = start.ok_or_else(|| missing("--start"))?;
                Ok(Command::Add {
                    opts,
                    request: ScheduleRequest { suite, start, days },
                })
            }
        }
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run { opts, date } => {
                let _logger = opts.start_logging()?;
                let today = OffsetDateTime::now_local()
                    .context("failed to determine local date")?
                    .date();
                let store = opts.store();
                let schedule = LoadedSchedule::fetch(&store, &opts.user);
                let mut app = App::new(schedule, today)
                    .date_rule(opts.date_rule())
                    .source(format!("{} ({})", store.path().display(), opts.user));
                if let Some(date) = date {
                    app = app.start_date(date);
                }
                with_terminal(|mut terminal| {
                    terminal.hide_cursor().context("failed to hide cursor")?;
                    app.run(terminal)?;
                    Ok(())
                })
            }
            Command::Suites { opts } => {
                let _logger = opts.start_logging()?;
                let suites = opts
                    .store()
                    .fetch_available_suites()
                    .context("failed to fetch test suites")?;
                for suite in suites {
                    println!("{}\t{}", suite.id, suite.name);
                }
                Ok(())
            }
            Command::Add { opts, request } => {
                let _logger = opts.start_logging()?;
                let now = OffsetDateTime::now_local().context("failed to determine local time")?;
                let now = PrimitiveDateTime::new(now.date(), now.time());
                let start = request.start;
                let name = create_schedule(&mut opts.store(), request, &opts.user, now)
                    .context("failed to schedule test")?;
                println!("Scheduled {name} starting {start}");
                Ok(())
            }
            Command::Help => {
                println!("Usage: weeksched [OPTIONS] [YYYY-MM-DD]");
                println!("       weeksched [OPTIONS] suites");
                println!(
                    "       weeksched [OPTIONS] add --suite NAME --start YYYY-MM-DDTHH:MM [--days Sun,Wed]"
                );
                println!();
                println!("Terminal week planner that places scheduled test runs on a 7x24 grid");
                println!();
                println!("Options:");
                println!("  -f, --file PATH       Schedule file [default: {DEFAULT_SCHEDULE_FILE}]");
                println!("  -u, --user ID         Show schedules for this user [default: $USER]");
                println!("      --legacy-dates    Show one-time tests on the same date every year");
                println!("      --log-dir DIR     Write log files to DIR");
                println!("      --log-level LEVEL Log level [default: {DEFAULT_LOG_LEVEL}]");
                println!("  -h, --help            Display this help message and exit");
                println!("  -V, --version         Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn missing(option: &str) -> lexopt::Error {
    lexopt::Error::MissingValue {
        option: Some(option.to_owned()),
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env(), Options::from_env())?.run()
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}
