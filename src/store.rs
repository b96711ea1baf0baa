//! Access to scheduled test runs and test suites.
//!
//! The schedule file is a JSON document of the form:
//!
//! ```json
//! {
//!     "test_suites": [{"id": "s1", "test_name": "Checkout flow"}],
//!     "scheduled_tests": [{
//!         "test_name": "Checkout flow",
//!         "start_date": "2024-03-11T09:00:00",
//!         "weekly_schedule": "Mon,Wed",
//!         "user_id": "alice"
//!     }]
//! }
//! ```
use crate::schedule::WeekdaySet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, PrimitiveDateTime};

static START_FMT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// A scheduled test run as stored, before validation
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct ScheduledTestRecord {
    pub(crate) test_name: String,
    pub(crate) start_date: String,
    /// Comma-separated weekday abbreviations, e.g., `"Sun,Wed"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) weekly_schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) color: Option<String>,
    pub(crate) user_id: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Suite {
    pub(crate) id: String,
    #[serde(rename = "test_name")]
    pub(crate) name: String,
}

/// A schedule to be added to the store
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct NewSchedule {
    pub(crate) name: String,
    pub(crate) start: PrimitiveDateTime,
    pub(crate) recurring_days: WeekdaySet,
    pub(crate) user_id: String,
}

pub(crate) trait ScheduleStore {
    fn fetch_scheduled_events(&self, user_id: &str)
        -> Result<Vec<ScheduledTestRecord>, StoreError>;

    fn fetch_available_suites(&self) -> Result<Vec<Suite>, StoreError>;

    fn create_scheduled_event(&mut self, schedule: NewSchedule) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
struct ScheduleFile {
    #[serde(default)]
    test_suites: Vec<Suite>,
    #[serde(default)]
    scheduled_tests: Vec<ScheduledTestRecord>,
}

/// A [`ScheduleStore`] kept in a JSON file.  A missing file reads as empty.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub(crate) fn new<P: Into<PathBuf>>(path: P) -> JsonFileStore {
        JsonFileStore { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<ScheduleFile, StoreError> {
        let src = match fs::read_to_string(&self.path) {
            Ok(src) => src,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!(
                    "event=store_load module=store status=missing path={}",
                    self.path.display()
                );
                return Ok(ScheduleFile::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&src).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes `data` to a temporary file beside the store, then renames it
    /// over the store.  The old contents stay in place if anything fails.
    fn save(&self, data: &ScheduleFile) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
        {
            let mut out = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut out, data).map_err(|e| write_err(e.into()))?;
            out.write_all(b"\n").map_err(write_err)?;
            out.flush().map_err(write_err)?;
        }
        temp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl ScheduleStore for JsonFileStore {
    fn fetch_scheduled_events(
        &self,
        user_id: &str,
    ) -> Result<Vec<ScheduledTestRecord>, StoreError> {
        if user_id.is_empty() {
            return Err(StoreError::NoUser);
        }
        let records = self
            .load()?
            .scheduled_tests
            .into_iter()
            .filter(|rec| rec.user_id == user_id)
            .collect::<Vec<_>>();
        log::info!(
            "event=fetch_schedules module=store status=ok count={}",
            records.len()
        );
        Ok(records)
    }

    fn fetch_available_suites(&self) -> Result<Vec<Suite>, StoreError> {
        Ok(self.load()?.test_suites)
    }

    fn create_scheduled_event(&mut self, schedule: NewSchedule) -> Result<(), StoreError> {
        if schedule.user_id.is_empty() {
            return Err(StoreError::NoUser);
        }
        let start_date = schedule
            .start
            .format(&START_FMT)
            .map_err(|_| StoreError::BadStart(schedule.start))?;
        let mut data = self.load()?;
        data.scheduled_tests.push(ScheduledTestRecord {
            test_name: schedule.name,
            start_date,
            weekly_schedule: Some(schedule.recurring_days.to_string()),
            color: None,
            user_id: schedule.user_id,
        });
        self.save(&data)?;
        log::info!(
            "event=create_schedule module=store status=ok total={}",
            data.scheduled_tests.len()
        );
        Ok(())
    }
}

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("no user id given")]
    NoUser,
    #[error("failed to read {}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("cannot store start time {0}")]
    BadStart(PrimitiveDateTime),
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    static SAMPLE: &str = r#"{
        "test_suites": [
            {"id": "s1", "test_name": "Checkout flow"},
            {"id": "s2", "test_name": "Login"}
        ],
        "scheduled_tests": [
            {
                "test_name": "Checkout flow",
                "start_date": "2024-03-11T09:00:00",
                "weekly_schedule": "Mon,Wed",
                "user_id": "alice"
            },
            {
                "test_name": "Login",
                "start_date": "2024-03-12T14:30:00",
                "weekly_schedule": "",
                "color": "green",
                "user_id": "bob"
            }
        ]
    }"#;

    fn sample_store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        fs::write(&path, SAMPLE).unwrap();
        (dir, JsonFileStore::new(path))
    }

    #[test]
    fn test_fetch_filters_by_user() {
        let (_dir, store) = sample_store();
        let records = store.fetch_scheduled_events("alice").unwrap();
        assert_eq!(
            records,
            [ScheduledTestRecord {
                test_name: String::from("Checkout flow"),
                start_date: String::from("2024-03-11T09:00:00"),
                weekly_schedule: Some(String::from("Mon,Wed")),
                color: None,
                user_id: String::from("alice"),
            }]
        );
        let records = store.fetch_scheduled_events("bob").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].color.as_deref(), Some("green"));
        assert!(store.fetch_scheduled_events("carol").unwrap().is_empty());
    }

    #[test]
    fn test_fetch_without_user() {
        let (_dir, store) = sample_store();
        assert!(matches!(
            store.fetch_scheduled_events(""),
            Err(StoreError::NoUser)
        ));
    }

    #[test]
    fn test_fetch_suites() {
        let (_dir, store) = sample_store();
        let suites = store.fetch_available_suites().unwrap();
        assert_eq!(
            suites.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            ["Checkout flow", "Login"]
        );
        assert_eq!(suites[1].id, "s2");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert!(store.fetch_scheduled_events("alice").unwrap().is_empty());
        assert!(store.fetch_available_suites().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::new(&path);
        let r = store.fetch_scheduled_events("alice");
        assert!(matches!(r, Err(StoreError::Parse { .. })));
        assert_eq!(
            r.unwrap_err().to_string(),
            format!("failed to parse {}", path.display())
        );
    }

    #[test]
    fn test_create_appends() {
        let (_dir, mut store) = sample_store();
        store
            .create_scheduled_event(NewSchedule {
                name: String::from("Login"),
                start: datetime!(2030-01-02 08:15),
                recurring_days: "Tue,Thu".parse().unwrap(),
                user_id: String::from("alice"),
            })
            .unwrap();
        let records = store.fetch_scheduled_events("alice").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1],
            ScheduledTestRecord {
                test_name: String::from("Login"),
                start_date: String::from("2030-01-02T08:15:00"),
                weekly_schedule: Some(String::from("Tue,Thu")),
                color: None,
                user_id: String::from("alice"),
            }
        );
        assert_eq!(store.fetch_available_suites().unwrap().len(), 2);
        assert_eq!(store.fetch_scheduled_events("bob").unwrap().len(), 1);
    }

    #[test]
    fn test_failed_save_keeps_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        // A non-empty directory can't be replaced by a file
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), SAMPLE).unwrap();
        let store = JsonFileStore::new(&path);
        let r = store.save(&ScheduleFile::default());
        assert!(matches!(r, Err(StoreError::Write { .. })));
        assert_eq!(fs::read_to_string(path.join("keep")).unwrap(), SAMPLE);
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1, "temporary file left behind");
    }

    #[test]
    fn test_failed_create_keeps_records() {
        let (dir, _) = sample_store();
        let path = dir.path().join("schedule.json");
        let mut store = JsonFileStore::new(dir.path().join("missing").join("schedule.json"));
        let r = store.create_scheduled_event(NewSchedule {
            name: String::from("Login"),
            start: datetime!(2030-01-02 08:15),
            recurring_days: WeekdaySet::EMPTY,
            user_id: String::from("alice"),
        });
        assert!(matches!(r, Err(StoreError::Write { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_replaces_whole_file() {
        let (_dir, store) = sample_store();
        store.save(&ScheduleFile::default()).unwrap();
        let src = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            serde_json::from_str::<ScheduleFile>(&src).unwrap(),
            ScheduleFile::default()
        );
        assert!(src.ends_with("}\n"));
    }

    #[test]
    fn test_create_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("schedule.json"));
        store
            .create_scheduled_event(NewSchedule {
                name: String::from("Nightly"),
                start: datetime!(2030-06-01 23:00),
                recurring_days: WeekdaySet::EMPTY,
                user_id: String::from("alice"),
            })
            .unwrap();
        assert!(store.path().exists());
        let records = store.fetch_scheduled_events("alice").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weekly_schedule.as_deref(), Some(""));
    }
}
