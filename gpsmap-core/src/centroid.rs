use crate::{
    error::RecordError,
    model::{Coordinates, LocationRecord},
};

/// Arithmetic mean of `points`, or [`Coordinates::ORIGIN`] when there are none.
pub fn centroid(points: &[Coordinates]) -> Coordinates {
    if points.is_empty() {
        return Coordinates::ORIGIN;
    }

    let n = points.len() as f64;
    let (lat_sum, lon_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.latitude, lon + p.longitude));

    Coordinates::new(lat_sum / n, lon_sum / n)
}

/// Mean position of `records`, parsing each coordinate from its string form.
pub fn centroid_of_records<R>(records: &[R]) -> Result<Coordinates, RecordError>
where
    R: AsRef<LocationRecord>,
{
    let points = records
        .iter()
        .map(|r| r.as_ref().position())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(centroid(&points))
}
