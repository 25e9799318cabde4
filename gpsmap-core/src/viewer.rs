use std::sync::Arc;

use chrono::{NaiveDate, TimeZone};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

use crate::{
    color::ColorTable,
    model::LocationRecord,
    source::LocationSource,
    state::{Action, RequestToken, ViewState},
};

struct Completion {
    token: RequestToken,
    outcome: anyhow::Result<Vec<LocationRecord>>,
}

/// Drives fetch, filter and snapshot for one view.
///
/// Selecting a day aborts whatever fetch is still running and starts a new
/// one. Responses that still slip through carry an old token and are
/// dropped by the state.
pub struct Viewer<Tz: TimeZone> {
    source: Arc<dyn LocationSource>,
    state: ViewState<Tz>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    inflight: Option<JoinHandle<()>>,
}

impl<Tz: TimeZone> Viewer<Tz> {
    pub fn new(
        source: Arc<dyn LocationSource>,
        today: NaiveDate,
        tz: Tz,
        colors: ColorTable,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { source, state: ViewState::new(today, tz, colors), tx, rx, inflight: None }
    }

    /// Start fetching for `day`. Must be called from within a tokio runtime.
    pub fn select_day(&mut self, day: NaiveDate) -> Option<RequestToken> {
        let token = self.state.apply(Action::SelectDay(day))?;

        if let Some(previous) = self.inflight.take() {
            previous.abort();
        }

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.inflight = Some(tokio::spawn(async move {
            let outcome = source.fetch_all().await;
            // The receiver lives as long as the viewer.
            let _ = tx.send(Completion { token, outcome });
        }));

        Some(token)
    }

    /// Apply completions until the latest request has resolved.
    pub async fn settle(&mut self) -> &ViewState<Tz> {
        while self.state.is_loading() {
            let Some(done) = self.rx.recv().await else {
                break;
            };
            debug!(token = done.token.get(), "fetch completed");
            self.state.apply(Action::FetchCompleted { token: done.token, outcome: done.outcome });
        }
        self.inflight = None;
        &self.state
    }

    /// Select `day` and wait for its data.
    pub async fn show_day(&mut self, day: NaiveDate) -> &ViewState<Tz> {
        self.select_day(day);
        self.settle().await
    }

    pub fn toggle_calendar(&mut self) {
        self.state.apply(Action::ToggleCalendar);
    }

    pub fn state(&self) -> &ViewState<Tz> {
        &self.state
    }
}

impl<Tz: TimeZone> Drop for Viewer<Tz> {
    fn drop(&mut self) {
        if let Some(task) = self.inflight.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::Coordinates, state::ViewStatus, test_support::LogCapture};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn records() -> Vec<LocationRecord> {
        vec![
            LocationRecord::new("Test Test", "10", "20", "2024-01-01"),
            LocationRecord::new("test test", "30", "40", "2024-01-01"),
            LocationRecord::new("other", "0", "0", "2024-01-02"),
        ]
    }

    #[derive(Debug)]
    struct FixedSource(Vec<LocationRecord>);

    #[async_trait]
    impl LocationSource for FixedSource {
        async fn fetch_all(&self) -> anyhow::Result<Vec<LocationRecord>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug)]
    struct FailingSource;

    #[async_trait]
    impl LocationSource for FailingSource {
        async fn fetch_all(&self) -> anyhow::Result<Vec<LocationRecord>> {
            Err(anyhow::anyhow!("simulated network error"))
        }
    }

    /// First call is slow and returns a different data set than later calls.
    #[derive(Debug, Default)]
    struct SlowFirstSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LocationSource for SlowFirstSource {
        async fn fetch_all(&self) -> anyhow::Result<Vec<LocationRecord>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(vec![LocationRecord::new("stale", "1", "1", "2024-01-02")])
            } else {
                Ok(vec![LocationRecord::new("fresh", "2", "2", "2024-01-02")])
            }
        }
    }

    /// Answers immediately; each call's record is named after its call number.
    #[derive(Debug, Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LocationSource for CountingSource {
        async fn fetch_all(&self) -> anyhow::Result<Vec<LocationRecord>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(vec![LocationRecord::new(format!("call-{n}"), "3", "4", "2024-01-02")])
        }
    }

    fn viewer(source: impl LocationSource + 'static) -> Viewer<Utc> {
        Viewer::new(Arc::new(source), day(2024, 1, 1), Utc, ColorTable::default())
    }

    #[tokio::test]
    async fn show_day_filters_and_centers() {
        let mut v = viewer(FixedSource(records()));
        let state = v.show_day(day(2024, 1, 1)).await;

        match state.status() {
            ViewStatus::Map(snap) => {
                assert_eq!(snap.markers.len(), 2);
                assert_eq!(snap.center, Coordinates::new(20.0, 30.0));
                assert_eq!(snap.markers[0].color, snap.markers[1].color);
            }
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn day_without_records_is_no_data() {
        let mut v = viewer(FixedSource(records()));
        let state = v.show_day(day(2023, 6, 1)).await;

        assert_eq!(state.status(), ViewStatus::NoData(day(2023, 6, 1)));
        assert_eq!(state.snapshot().center, Coordinates::ORIGIN);
    }

    #[tokio::test]
    async fn fetch_error_leaves_no_markers_and_stops_loading() {
        let logs = LogCapture::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let mut v = viewer(FailingSource);
        let state = v.show_day(day(2024, 1, 1)).await;

        assert!(logs.contains("Error fetching data: simulated network error"));
        assert!(!state.is_loading());
        assert!(state.snapshot().markers.is_empty());
        assert_eq!(state.status(), ViewStatus::NoData(day(2024, 1, 1)));
    }

    #[tokio::test]
    async fn newer_selection_wins_over_slow_older_fetch() {
        let mut v = viewer(SlowFirstSource::default());

        let first = v.select_day(day(2024, 1, 1)).expect("token issued");
        // Let the first fetch reach the source before it gets aborted.
        tokio::task::yield_now().await;
        let second = v.select_day(day(2024, 1, 2)).expect("token issued");
        assert!(second > first);

        let state = v.settle().await;
        assert_eq!(state.latest_token(), Some(second));
        let snap = state.snapshot();
        assert_eq!(snap.day, day(2024, 1, 2));
        assert_eq!(snap.markers.len(), 1);
        assert_eq!(snap.markers[0].username, "fresh");

        // Let the aborted task's timer elapse; nothing must change.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(v.state().snapshot().markers[0].username, "fresh");
    }

    #[tokio::test]
    async fn queued_stale_completion_is_dropped_by_settle() {
        let mut v = viewer(CountingSource::default());

        v.select_day(day(2024, 1, 1)).expect("token issued");
        // First fetch finishes and its completion waits in the channel.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = v.select_day(day(2024, 1, 2)).expect("token issued");

        let state = v.settle().await;
        assert!(!state.is_loading());
        assert_eq!(state.latest_token(), Some(second));
        assert_eq!(state.selected_day(), day(2024, 1, 2));
        assert_eq!(state.records()[0].username, "call-2");
        assert_eq!(state.snapshot().day, day(2024, 1, 2));
        assert_eq!(state.snapshot().markers[0].username, "call-2");
    }

    #[tokio::test]
    async fn reselecting_refetches_whole_dataset() {
        let mut v = viewer(FixedSource(records()));
        v.show_day(day(2024, 1, 1)).await;
        let state = v.show_day(day(2024, 1, 2)).await;

        assert_eq!(state.records().len(), 3);
        assert_eq!(state.snapshot().markers.len(), 1);
        assert_eq!(state.snapshot().markers[0].username, "other");
    }

    #[test]
    fn calendar_toggle_passes_through() {
        let mut v = viewer(FixedSource(Vec::new()));
        v.toggle_calendar();
        assert!(!v.state().calendar_open());
    }
}
