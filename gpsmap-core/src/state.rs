//! Explicit view state and the actions that drive it.
//!
//! Every change to what the map shows goes through [`ViewState::apply`].
//! Fetch results are tagged with the [`RequestToken`] issued when the
//! request started; only the latest token is accepted, so a slow response
//! for an earlier date can never overwrite a newer selection.

use chrono::{NaiveDate, TimeZone};
use tracing::{debug, error};

use crate::{color::ColorTable, model::LocationRecord, snapshot::Snapshot};

/// Identifies one fetch request. Tokens increase monotonically per state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn get(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub enum Action {
    /// The user picked a day. Starts a new request.
    SelectDay(NaiveDate),
    /// A request finished, successfully or not.
    FetchCompleted {
        token: RequestToken,
        outcome: anyhow::Result<Vec<LocationRecord>>,
    },
    ToggleCalendar,
}

/// What the presentation layer should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewStatus<'a> {
    Loading,
    NoData(NaiveDate),
    Map(&'a Snapshot),
}

#[derive(Debug)]
pub struct ViewState<Tz: TimeZone> {
    selected_day: NaiveDate,
    records: Vec<LocationRecord>,
    snapshot: Snapshot,
    loading: bool,
    calendar_open: bool,
    next_token: u64,
    latest: Option<RequestToken>,
    colors: ColorTable,
    tz: Tz,
}

impl<Tz: TimeZone> ViewState<Tz> {
    pub fn new(today: NaiveDate, tz: Tz, colors: ColorTable) -> Self {
        let snapshot = Snapshot::build(&[], today, &tz, &colors);
        Self {
            selected_day: today,
            records: Vec::new(),
            snapshot,
            loading: false,
            calendar_open: true,
            next_token: 0,
            latest: None,
            colors,
            tz,
        }
    }

    /// Apply `action`. Returns the token of the request to start, if any.
    pub fn apply(&mut self, action: Action) -> Option<RequestToken> {
        match action {
            Action::SelectDay(day) => {
                self.selected_day = day;
                self.next_token += 1;
                let token = RequestToken(self.next_token);
                self.latest = Some(token);
                self.loading = true;
                debug!(%day, token = token.get(), "day selected");
                Some(token)
            }
            Action::FetchCompleted { token, outcome } => {
                if self.latest != Some(token) {
                    debug!(token = token.get(), "discarding stale response");
                    return None;
                }

                match outcome {
                    Ok(records) => {
                        self.records = records;
                        self.rebuild();
                    }
                    Err(e) => {
                        error!("Error fetching data: {e:#}");
                    }
                }
                self.loading = false;
                None
            }
            Action::ToggleCalendar => {
                self.calendar_open = !self.calendar_open;
                None
            }
        }
    }

    fn rebuild(&mut self) {
        self.snapshot = Snapshot::build(&self.records, self.selected_day, &self.tz, &self.colors);
    }

    pub fn status(&self) -> ViewStatus<'_> {
        if self.loading {
            ViewStatus::Loading
        } else if self.snapshot.is_empty() {
            ViewStatus::NoData(self.selected_day)
        } else {
            ViewStatus::Map(&self.snapshot)
        }
    }

    pub fn selected_day(&self) -> NaiveDate {
        self.selected_day
    }

    /// Current markers and center. May belong to an earlier day while loading
    /// or after a failed fetch.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn calendar_open(&self) -> bool {
        self.calendar_open
    }

    pub fn latest_token(&self) -> Option<RequestToken> {
        self.latest
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }
}
