use chrono::{NaiveDate, TimeZone};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    centroid::centroid,
    color::{ColorTable, MarkerColor},
    filter::records_on_day,
    model::{Coordinates, LocationRecord},
};

/// One plotted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub username: String,
    pub position: Coordinates,
    /// Coordinates as delivered, shown verbatim in popups and listings.
    pub latitude: String,
    pub longitude: String,
    /// Raw timestamp, shown verbatim in popups.
    pub timestamp: String,
    pub color: MarkerColor,
}

/// Markers and map center for one day, derived together from one record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub day: NaiveDate,
    pub markers: Vec<Marker>,
    pub center: Coordinates,
    /// Records on `day` left out because their coordinates did not parse.
    pub skipped: usize,
}

impl Snapshot {
    pub fn build<Tz: TimeZone>(
        records: &[LocationRecord],
        day: NaiveDate,
        tz: &Tz,
        colors: &ColorTable,
    ) -> Self {
        let on_day = records_on_day(records, day, tz);

        let mut skipped = 0;
        let mut markers = Vec::with_capacity(on_day.len());
        for record in on_day {
            match record.position() {
                Ok(position) => markers.push(Marker {
                    username: record.username.clone(),
                    position,
                    latitude: record.latitude.trim().to_string(),
                    longitude: record.longitude.trim().to_string(),
                    timestamp: record.timestamp.clone(),
                    color: colors.color_for(&record.username),
                }),
                Err(e) => {
                    warn!(user = %record.username, timestamp = %record.timestamp, "skipping record: {e}");
                    skipped += 1;
                }
            }
        }

        let points: Vec<_> = markers.iter().map(|m| m.position).collect();
        let center = centroid(&points);

        debug!(
            %day,
            total = records.len(),
            markers = markers.len(),
            skipped,
            "built snapshot centered at ({:.6}, {:.6})",
            center.latitude,
            center.longitude
        );

        Self { day, markers, center, skipped }
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn sample() -> Vec<LocationRecord> {
        vec![
            LocationRecord::new("Test Test", "10", "20", "2024-01-01"),
            LocationRecord::new("Maula Shaikh", "30", "40", "2024-01-01"),
            LocationRecord::new("someone", "0", "0", "2024-01-02"),
        ]
    }

    #[test]
    fn scenario_first_two_records_and_their_mean() {
        let snap = Snapshot::build(&sample(), day(2024, 1, 1), &Utc, &ColorTable::default());

        assert_eq!(snap.markers.len(), 2);
        assert_eq!(snap.markers[0].username, "Test Test");
        assert_eq!(snap.markers[0].color, MarkerColor::Orange);
        assert_eq!(snap.markers[1].color, MarkerColor::Green);
        assert!((snap.center.latitude - 20.0).abs() < 1e-9);
        assert!((snap.center.longitude - 30.0).abs() < 1e-9);
        assert_eq!(snap.skipped, 0);
    }

    #[test]
    fn scenario_no_matching_day() {
        let snap = Snapshot::build(&sample(), day(2023, 12, 31), &Utc, &ColorTable::default());

        assert!(snap.is_empty());
        assert_eq!(snap.center, Coordinates::ORIGIN);
    }

    #[test]
    fn markers_keep_coordinates_as_delivered() {
        let records =
            vec![LocationRecord::new("Test Test", "18.520400", "73.8567000", "2024-01-01")];
        let snap = Snapshot::build(&records, day(2024, 1, 1), &Utc, &ColorTable::default());

        let marker = &snap.markers[0];
        assert_eq!(marker.latitude, "18.520400");
        assert_eq!(marker.longitude, "73.8567000");
        assert_eq!(marker.position, Coordinates::new(18.5204, 73.8567));
    }

    #[test]
    fn bad_coordinates_are_skipped_not_averaged() {
        let mut records = sample();
        records.push(LocationRecord::new("broken", "n/a", "5", "2024-01-01"));

        let snap = Snapshot::build(&records, day(2024, 1, 1), &Utc, &ColorTable::default());

        assert_eq!(snap.markers.len(), 2);
        assert_eq!(snap.skipped, 1);
        assert!(snap.center.latitude.is_finite());
        assert!((snap.center.latitude - 20.0).abs() < 1e-9);
    }
}
