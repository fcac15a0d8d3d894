use std::rc::Rc;

use approx::assert_abs_diff_eq;
use multiaxis::PlotError;
use multiaxis::api::{AxisManager, ColumnMetadataManager};
use multiaxis::core::{
    AlignmentMode, AlignmentParams, AxisConfig, AxisRange, AxisSide, RangeMode, StyleDefaults,
    ViewportRect,
};
use multiaxis::render::{AxisCoordinateAligner, HeadlessSurface, RenderSurface};

fn axes() -> AxisManager {
    let metadata = Rc::new(ColumnMetadataManager::new(Vec::<String>::new()).expect("metadata"));
    AxisManager::new(0, "main", metadata, StyleDefaults::default()).expect("axes")
}

fn aligner() -> AxisCoordinateAligner<HeadlessSurface> {
    AxisCoordinateAligner::new(HeadlessSurface::default(), 0, "main")
}

fn manual(axes: &mut AxisManager, name: &str, lower: f64, upper: f64) {
    assert!(axes.update_axis(name, |config| {
        config.range_mode = RangeMode::Manual;
        config.manual_range = AxisRange { lower, upper };
    }));
}

#[test]
fn value_alignment_scenario_through_refresh() {
    let mut axes = axes();
    assert!(axes.add_axis_named("temp"));
    manual(&mut axes, "main", 0.0, 100.0);
    manual(&mut axes, "temp", -50.0, 50.0);
    assert!(axes.update_axis("temp", |config| {
        config.align_mode = AlignmentMode::Value;
        config.align = AlignmentParams {
            source_value: 10.0,
            target_value: 40.0,
            scale_ratio: 1.0,
        };
    }));

    let mut aligner = aligner();
    let report = aligner.refresh(&axes).expect("refresh");
    assert_eq!(report.attached.len(), 1);
    assert_eq!(report.aligned, 1);
    assert_eq!(report.alignment_failures, 0);

    let viewport = aligner.viewport_for("temp").expect("temp viewport");
    let range = aligner.surface().y_range(viewport).expect("range");
    assert_abs_diff_eq!(range.lower, -30.0, epsilon = 1e-9);
    assert_abs_diff_eq!(range.upper, 70.0, epsilon = 1e-9);
}

#[test]
fn refresh_aligns_targets_before_dependents_added_earlier() {
    let mut axes = axes();
    assert!(axes.add_axis_named("b"));
    assert!(axes.add_axis_named("a"));
    manual(&mut axes, "main", 0.0, 100.0);
    manual(&mut axes, "a", -50.0, 50.0);
    manual(&mut axes, "b", 0.0, 10.0);
    assert!(axes.update_axis("a", |config| {
        config.align_mode = AlignmentMode::Value;
        config.align = AlignmentParams {
            source_value: 10.0,
            target_value: 50.0,
            scale_ratio: 1.0,
        };
    }));
    assert!(axes.update_axis("b", |config| {
        config.align_mode = AlignmentMode::Zero;
        config.align_target = Some("a".to_owned());
    }));

    let mut aligner = aligner();
    let report = aligner.refresh(&axes).expect("refresh");
    assert_eq!(report.aligned, 2);
    assert_eq!(report.alignment_failures, 0);

    let range_of = |name: &str| {
        aligner
            .surface()
            .y_range(aligner.viewport_for(name).expect("viewport"))
            .expect("range")
    };
    let a = range_of("a");
    assert_abs_diff_eq!(a.lower, -40.0, epsilon = 1e-9);
    assert_abs_diff_eq!(a.upper, 60.0, epsilon = 1e-9);

    let b = range_of("b");
    assert_abs_diff_eq!(b.lower, -4.0, epsilon = 1e-9);
    assert_abs_diff_eq!(b.upper, 6.0, epsilon = 1e-9);
    let zero_fraction = |range: AxisRange| -range.lower / (range.upper - range.lower);
    assert_abs_diff_eq!(zero_fraction(a), zero_fraction(b), epsilon = 1e-9);
}

#[test]
fn refresh_terminates_on_alignment_cycle() {
    let mut axes = axes();
    assert!(axes.add_axes_batch(&["a", "b"]));
    manual(&mut axes, "a", -10.0, 10.0);
    manual(&mut axes, "b", 0.0, 1.0);
    assert!(axes.update_axis("a", |config| {
        config.align_mode = AlignmentMode::Zero;
        config.align_target = Some("b".to_owned());
    }));
    assert!(axes.update_axis("b", |config| {
        config.align_mode = AlignmentMode::Zero;
        config.align_target = Some("a".to_owned());
    }));

    let mut aligner = aligner();
    let report = aligner.refresh(&axes).expect("refresh");
    assert_eq!(report.aligned + report.alignment_failures, 2);
    assert_eq!(aligner.on_range_changed(&axes, "a").expect("realign"), 1);
}

#[test]
fn attach_creates_viewport_sharing_primary_geometry() {
    let axes_manager = {
        let mut axes = axes();
        assert!(axes.add_axis_named("temp"));
        axes
    };
    let mut aligner = aligner();
    let handle = aligner
        .attach_axis(axes_manager.axis_config("temp").expect("temp"))
        .expect("attach");

    let surface = aligner.surface();
    assert_eq!(surface.viewport_count(), 2);
    assert_eq!(surface.axis_item_count(), 1);
    let primary_rect = surface
        .viewport_rect(surface.primary_viewport())
        .expect("primary rect");
    assert_eq!(
        surface.viewport_rect(handle.viewport).expect("rect"),
        primary_rect
    );
    let item = surface
        .axis_item(handle.axis_item.expect("item"))
        .expect("item spec");
    assert_eq!(item.side, AxisSide::Right);
    assert_eq!(item.label, "temp [MWh]");
}

#[test]
fn left_side_secondary_is_rejected() {
    let mut aligner = aligner();
    let mut config = AxisConfig::secondary("left", &StyleDefaults::default(), 0);
    config.side = AxisSide::Left;
    let err = aligner.attach_axis(&config).expect_err("left secondary");
    assert!(matches!(err, PlotError::InvalidData(_)));
    assert_eq!(aligner.surface().viewport_count(), 1);
}

#[test]
fn primary_resize_propagates_to_every_dependent() {
    let mut axes = axes();
    assert!(axes.add_axes_batch(&["a", "b"]));
    let mut aligner = aligner();
    aligner.refresh(&axes).expect("refresh");

    let resized = ViewportRect::new(10.0, 20.0, 640.0, 360.0);
    aligner
        .surface_mut()
        .resize_primary(resized)
        .expect("resize");
    assert_eq!(aligner.on_primary_resized().expect("sync"), 2);

    for name in ["a", "b"] {
        let viewport = aligner.viewport_for(name).expect("viewport");
        assert_eq!(
            aligner.surface().viewport_rect(viewport).expect("rect"),
            resized
        );
    }
}

#[test]
fn pan_on_target_realigns_dependent_chain() {
    let mut axes = axes();
    assert!(axes.add_axes_batch(&["a", "b"]));
    manual(&mut axes, "main", 0.0, 100.0);
    manual(&mut axes, "a", -10.0, 10.0);
    manual(&mut axes, "b", 0.0, 1.0);
    assert!(axes.update_axis("a", |config| config.align_mode = AlignmentMode::Zero));
    assert!(axes.update_axis("b", |config| {
        config.align_mode = AlignmentMode::ValueWithScale;
        config.align_target = Some("a".to_owned());
        config.align = AlignmentParams {
            source_value: 0.0,
            target_value: 0.0,
            scale_ratio: 2.0,
        };
    }));

    let mut aligner = aligner();
    aligner.refresh(&axes).expect("refresh");

    let primary = aligner.surface().primary_viewport();
    aligner.surface_mut().pan(primary, -50.0).expect("pan");
    let updated = aligner.on_range_changed(&axes, "main").expect("realign");
    assert_eq!(updated, 2);

    let a = aligner
        .surface()
        .y_range(aligner.viewport_for("a").expect("a"))
        .expect("a range");
    // main is now [-50, 50]: zero sits at the middle.
    assert_abs_diff_eq!(a.lower, -10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(a.upper, 10.0, epsilon = 1e-9);

    let b = aligner
        .surface()
        .y_range(aligner.viewport_for("b").expect("b"))
        .expect("b range");
    assert_abs_diff_eq!(b.upper - b.lower, 40.0, epsilon = 1e-9);
    assert_abs_diff_eq!(b.lower, -20.0, epsilon = 1e-9);
}

#[test]
fn auto_range_axes_are_left_to_the_surface() {
    let mut axes = axes();
    assert!(axes.add_axis_named("temp"));
    let mut aligner = aligner();
    aligner.refresh(&axes).expect("refresh");

    let viewport = aligner.viewport_for("temp").expect("viewport");
    assert!(aligner.surface().is_auto_range(viewport));
    assert_eq!(aligner.surface().set_range_calls, 0);
}

#[test]
fn refresh_detaches_removed_axes_and_rebuilds_on_primary_switch() {
    let mut axes = axes();
    assert!(axes.add_axes_batch(&["a", "b"]));
    let mut aligner = aligner();
    aligner.refresh(&axes).expect("refresh");

    assert!(axes.remove_axis("a", false));
    let report = aligner.refresh(&axes).expect("refresh");
    assert_eq!(report.detached, vec!["a".to_owned()]);
    assert_eq!(aligner.surface().viewport_count(), 2);

    assert!(axes.switch_primary_axis("b"));
    let report = aligner.refresh(&axes).expect("refresh");
    assert_eq!(aligner.primary_axis(), "b");
    assert_eq!(report.detached, vec!["b".to_owned()]);
    // "main" is no longer added after the switch.
    assert!(report.attached.is_empty());
    assert_eq!(aligner.surface().viewport_count(), 1);
}

#[test]
fn flat_target_range_is_reported_not_applied() {
    let mut axes = axes();
    assert!(axes.add_axis_named("temp"));
    assert!(axes.update_axis("temp", |config| config.align_mode = AlignmentMode::Zero));

    let mut aligner = aligner();
    aligner.refresh(&axes).expect("refresh");
    let primary = aligner.surface().primary_viewport();
    aligner
        .surface_mut()
        .set_y_range(primary, AxisRange { lower: 5.0, upper: 5.0 })
        .expect("flat");

    let err = aligner
        .apply_alignment(axes.axis_config("temp").expect("temp"))
        .expect_err("flat target");
    assert!(matches!(err, PlotError::DegenerateRange { .. }));
}

#[test]
fn detach_unknown_axis_is_an_error() {
    let mut aligner = aligner();
    assert_eq!(
        aligner.detach_axis("ghost"),
        Err(PlotError::AxisNotFound("ghost".to_owned()))
    );
}
