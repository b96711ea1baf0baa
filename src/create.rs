use crate::schedule::WeekdaySet;
use crate::store::{NewSchedule, ScheduleStore, StoreError};
use thiserror::Error;
use time::PrimitiveDateTime;

/// A request to schedule a test suite, as given on the command line
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ScheduleRequest {
    pub(crate) suite: String,
    pub(crate) start: PrimitiveDateTime,
    pub(crate) days: WeekdaySet,
}

/// Validates `request` and adds it to the store on behalf of `user_id`.
///
/// The suite may be given by name or by ID, and the start must not be
/// earlier than `now`.  Returns the name of the scheduled suite.
pub(crate) fn create_schedule<S: ScheduleStore + ?Sized>(
    store: &mut S,
    request: ScheduleRequest,
    user_id: &str,
    now: PrimitiveDateTime,
) -> Result<String, CreateError> {
    let wanted = request.suite.trim();
    if wanted.is_empty() {
        return Err(CreateError::NoSuite);
    }
    if user_id.is_empty() {
        return Err(CreateError::Store(StoreError::NoUser));
    }
    let suite = store
        .fetch_available_suites()?
        .into_iter()
        .find(|s| s.name == wanted || s.id == wanted)
        .ok_or_else(|| CreateError::UnknownSuite(wanted.to_owned()))?;
    if request.start < now {
        return Err(CreateError::StartInPast(request.start));
    }
    store.create_scheduled_event(NewSchedule {
        name: suite.name.clone(),
        start: request.start,
        recurring_days: request.days,
        user_id: user_id.to_owned(),
    })?;
    log::info!(
        "event=create_schedule module=create status=ok suite={} days={}",
        suite.id,
        request.days
    );
    Ok(suite.name)
}

#[derive(Debug, Error)]
pub(crate) enum CreateError {
    #[error("no test suite given")]
    NoSuite,
    #[error("unknown test suite {0:?}")]
    UnknownSuite(String),
    #[error("start time {0} is in the past")]
    StartInPast(PrimitiveDateTime),
    #[error(transparent)]
    Store(#[from] StoreError),
}
