use chrono::{TimeZone, Utc};
use multiaxis::PlotError;
use multiaxis::core::DataPoint;
use multiaxis::extensions::{ColumnarDataSet, DataSource};

fn dataset(rows: usize) -> ColumnarDataSet {
    let time: Vec<f64> = (0..rows).map(|i| i as f64).collect();
    let power: Vec<f64> = (0..rows).map(|i| (i * 10) as f64).collect();
    ColumnarDataSet::new()
        .with_column("time", time)
        .and_then(|data| data.with_column("power", power))
        .expect("dataset")
}

#[test]
fn window_is_inclusive_on_both_ends() {
    let data = dataset(20);
    let points = data
        .fetch_window("time", "power", 5.0, 9.0, 0)
        .expect("window");
    assert_eq!(points.len(), 5);
    assert_eq!(points[0].x, 5.0);
    assert_eq!(points[4].y, 90.0);
}

#[test]
fn large_windows_are_decimated() {
    let data = dataset(1_000);
    let points = data
        .fetch_window("time", "power", 0.0, 999.0, 100)
        .expect("window");
    assert_eq!(points.len(), 100);
    assert_eq!(points[1].x, 10.0);

    let all = data
        .fetch_window("time", "power", 0.0, 999.0, 0)
        .expect("window");
    assert_eq!(all.len(), 1_000);
}

#[test]
fn non_finite_times_are_skipped() {
    let data = ColumnarDataSet::new()
        .with_column("time", vec![0.0, f64::NAN, 2.0, f64::INFINITY])
        .and_then(|data| data.with_column("v", vec![1.0, 2.0, 3.0, 4.0]))
        .expect("dataset");

    assert_eq!(data.time_bounds("time").expect("bounds"), Some((0.0, 2.0)));
    let points = data
        .fetch_window("time", "v", f64::NEG_INFINITY, f64::INFINITY, 0)
        .expect("window");
    assert_eq!(points.len(), 2);
}

#[test]
fn empty_time_column_has_no_bounds() {
    let data = ColumnarDataSet::new()
        .with_column("time", Vec::new())
        .expect("dataset");
    assert_eq!(data.time_bounds("time").expect("bounds"), None);
    assert_eq!(data.default_time_column().as_deref(), Some("time"));
}

#[test]
fn datetime_columns_are_stored_as_unix_seconds() {
    let stamps = [
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid date"),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 15, 0)
            .single()
            .expect("valid date"),
    ];
    let data = ColumnarDataSet::new()
        .with_datetime_column("time", &stamps)
        .and_then(|data| data.with_column("power", vec![1.0, 2.0]))
        .expect("dataset");

    let column = data.column("time").expect("time column");
    assert_eq!(column[1] - column[0], 900.0);
    assert_eq!(column[0], 1_704_067_200.0);
    assert_eq!(data.row_count(), 2);
    assert_eq!(DataPoint::from_datetime(stamps[1], 2.0).x, column[1]);
}

#[test]
fn malformed_columns_are_rejected() {
    let base = dataset(3);
    assert!(matches!(
        base.clone().with_column("short", vec![1.0]),
        Err(PlotError::InvalidData(_))
    ));
    assert!(base.clone().with_column("power", vec![0.0; 3]).is_err());
    assert!(base.clone().with_column(" ", vec![0.0; 3]).is_err());
    assert!(base.fetch_window("time", "ghost", 0.0, 1.0, 0).is_err());
}
