use std::cell::RefCell;
use std::rc::Rc;

use multiaxis::api::{
    AxisManager, ColumnMetadataManager, ManagerEvent, NoticeLevel, Observable, StatusBarSink,
};
use multiaxis::core::{
    AlignmentMode, AxisConfig, AxisItemId, AxisRange, AxisRenderHandle, AxisSide, RangeMode,
    StyleDefaults, UnitValue, ViewportId,
};

struct Fixture {
    axes: AxisManager,
    events: Rc<RefCell<Vec<ManagerEvent>>>,
    status: Rc<RefCell<StatusBarSink>>,
}

fn fixture() -> Fixture {
    let metadata = Rc::new(ColumnMetadataManager::new(["time", "power"]).expect("metadata"));
    let axes = AxisManager::new(1, "main", metadata, StyleDefaults::default()).expect("axes");
    let events = Rc::new(RefCell::new(Vec::new()));
    {
        let events = Rc::clone(&events);
        axes.connect_all_signals(move |event| events.borrow_mut().push(event.clone()));
    }
    let status = Rc::new(RefCell::new(StatusBarSink::default()));
    axes.connect_to_status_channel(Rc::clone(&status));
    Fixture {
        axes,
        events,
        status,
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

#[test]
fn new_manager_has_exactly_one_left_primary() {
    let f = fixture();
    let primary = f.axes.primary_config().expect("primary config");
    assert_eq!(primary.name, "main");
    assert!(primary.is_primary);
    assert_eq!(primary.side, AxisSide::Left);
    assert_eq!(primary.unit, UnitValue::MWh);
    assert_eq!(primary.manual_range, AxisRange::new(0.0, 100.0).expect("range"));
    assert_eq!(f.axes.added_axis_names(), names(&["main"]));
    assert!(f.axes.secondary_axis_names().is_empty());
    f.axes.check_invariants().expect("invariants hold");
}

#[test]
fn empty_primary_name_is_rejected() {
    let metadata = Rc::new(ColumnMetadataManager::new(["time"]).expect("metadata"));
    assert!(AxisManager::new(0, "  ", metadata, StyleDefaults::default()).is_err());
}

#[test]
fn add_axis_named_creates_secondary_on_the_right() {
    let mut f = fixture();
    assert!(f.axes.add_axis_named("temp"));

    let config = f.axes.axis_config("temp").expect("temp config");
    assert_eq!(config.side, AxisSide::Right);
    assert!(!config.is_primary);
    assert_eq!(config.align_mode, AlignmentMode::None);
    assert_eq!(f.axes.secondary_axis_names(), names(&["temp"]));
    assert_eq!(
        *f.events.borrow(),
        vec![ManagerEvent::AxisAdded {
            name: "temp".to_owned()
        }]
    );
}

#[test]
fn primary_name_cannot_be_added_or_removed() {
    let mut f = fixture();
    assert!(!f.axes.add_axis_named("main"));
    assert!(!f.axes.remove_axis("main", true));

    let mut claimant = AxisConfig::secondary("other", f.axes.style(), 0);
    claimant.is_primary = true;
    assert!(!f.axes.add_axis(claimant));

    assert!(f.events.borrow().is_empty());
    assert_eq!(f.status.borrow().count(NoticeLevel::Warning), 3);
    f.axes.check_invariants().expect("invariants hold");
}

#[test]
fn adding_an_added_axis_by_name_fails_without_signal() {
    let mut f = fixture();
    assert!(f.axes.add_axis_named("temp"));
    assert!(!f.axes.add_axis_named("temp"));
    assert_eq!(f.events.borrow().len(), 1);
}

#[test]
fn add_axis_config_overwrites_with_info() {
    let mut f = fixture();
    assert!(f.axes.add_axis_named("temp"));

    let mut config = AxisConfig::secondary("temp", f.axes.style(), 0);
    config.unit = UnitValue::Celsius;
    assert!(f.axes.add_axis(config));

    assert_eq!(
        f.axes.axis_config("temp").expect("temp").unit,
        UnitValue::Celsius
    );
    assert_eq!(f.status.borrow().count(NoticeLevel::Info), 1);
    assert_eq!(f.events.borrow().len(), 2);
}

#[test]
fn add_axis_config_rejects_self_or_unknown_alignment_target() {
    let mut f = fixture();
    assert!(f.axes.add_axis_named("temp"));
    f.events.borrow_mut().clear();

    for target in ["temp", "ghost"] {
        let mut config = AxisConfig::secondary("temp", f.axes.style(), 0);
        config.unit = UnitValue::Celsius;
        config.align_mode = AlignmentMode::Zero;
        config.align_target = Some(target.to_owned());
        assert!(!f.axes.add_axis(config));
    }
    assert_eq!(f.status.borrow().count(NoticeLevel::Warning), 2);
    assert!(f.events.borrow().is_empty());
    let kept = f.axes.axis_config("temp").expect("temp");
    assert_ne!(kept.unit, UnitValue::Celsius);
    assert_eq!(kept.align_target, None);

    let mut config = AxisConfig::secondary("temp", f.axes.style(), 0);
    config.align_mode = AlignmentMode::Zero;
    config.align_target = Some("main".to_owned());
    assert!(f.axes.add_axis(config));
    f.axes.check_invariants().expect("invariants hold");
}

#[test]
fn removed_axis_can_keep_its_config_for_readd() {
    let mut f = fixture();
    assert!(f.axes.add_axis_named("temp"));
    assert!(f.axes.update_axis("temp", |config| config.unit = UnitValue::Kelvin));

    assert!(f.axes.remove_axis("temp", false));
    assert!(f.axes.is_axis_initialized("temp"));
    assert!(!f.axes.is_axis_added("temp"));
    assert!(!f.axes.remove_axis("temp", false), "already removed");

    assert!(f.axes.add_axis_named("temp"));
    assert_eq!(
        f.axes.axis_config("temp").expect("temp").unit,
        UnitValue::Kelvin
    );

    assert!(f.axes.remove_axis("temp", true));
    assert!(!f.axes.is_axis_initialized("temp"));
}

#[test]
fn batch_add_emits_one_signal_with_new_names_only() {
    let mut f = fixture();
    assert!(f.axes.add_axis_named("a"));
    f.events.borrow_mut().clear();

    assert!(f.axes.add_axes_batch(&["a", "b", "main", "c"]));
    assert_eq!(
        *f.events.borrow(),
        vec![ManagerEvent::AxesBatchAdded {
            names: names(&["b", "c"])
        }]
    );
    assert_eq!(f.status.borrow().count(NoticeLevel::Warning), 1);

    f.events.borrow_mut().clear();
    assert!(!f.axes.add_axes_batch::<&str>(&[]));
    assert!(!f.axes.add_axes_batch(&["a", "b"]));
    assert!(f.events.borrow().is_empty());
    assert_eq!(f.status.borrow().count(NoticeLevel::Warning), 1);
}

#[test]
fn clear_secondary_axes_emits_one_batch_removed() {
    let mut f = fixture();
    assert!(f.axes.add_axes_batch(&["a", "b"]));
    f.events.borrow_mut().clear();

    assert!(f.axes.clear_secondary_axes(false));
    assert_eq!(
        *f.events.borrow(),
        vec![ManagerEvent::AxesBatchRemoved {
            names: names(&["a", "b"])
        }]
    );
    assert_eq!(f.axes.added_axis_names(), names(&["main"]));
    assert_eq!(f.axes.initialized_axis_names(), names(&["main", "a", "b"]));
    assert!(!f.axes.clear_secondary_axes(false));
}

#[test]
fn switch_primary_moves_flag_side_and_membership() {
    let mut f = fixture();
    assert!(f.axes.add_axis_named("temp"));
    f.events.borrow_mut().clear();

    assert!(f.axes.switch_primary_axis("temp"));

    assert_eq!(f.axes.primary_axis_name(), "temp");
    let new_primary = f.axes.axis_config("temp").expect("temp");
    assert!(new_primary.is_primary);
    assert_eq!(new_primary.side, AxisSide::Left);
    let old_primary = f.axes.axis_config("main").expect("main");
    assert!(!old_primary.is_primary);
    assert_eq!(old_primary.side, AxisSide::Right);
    assert!(!f.axes.is_axis_added("main"));
    assert!(f.axes.is_axis_primary("temp"));
    assert!(!f.axes.is_axis_primary("main"));
    assert_eq!(
        *f.events.borrow(),
        vec![ManagerEvent::AxesBatchChanged {
            names: names(&["main", "temp"])
        }]
    );
    assert_eq!(f.status.borrow().count(NoticeLevel::Success), 1);
    f.axes.check_invariants().expect("invariants hold");
}

#[test]
fn switch_primary_to_unknown_axis_warns_once() {
    let mut f = fixture();
    assert!(!f.axes.switch_primary_axis("ghost"));

    assert_eq!(f.axes.primary_axis_name(), "main");
    assert!(f.axes.axis_config("main").expect("main").is_primary);
    assert_eq!(f.status.borrow().count(NoticeLevel::Warning), 1);
    assert_eq!(f.status.borrow().count(NoticeLevel::Error), 0);
    assert!(f.events.borrow().is_empty());
}

#[test]
fn update_axis_keeps_identity_and_primary_role() {
    let mut f = fixture();
    assert!(f.axes.update_axis("main", |config| {
        config.name = "renamed".to_owned();
        config.is_primary = false;
        config.side = AxisSide::Right;
        config.label = "Power".to_owned();
    }));

    let primary = f.axes.axis_config("main").expect("main");
    assert_eq!(primary.name, "main");
    assert!(primary.is_primary);
    assert_eq!(primary.side, AxisSide::Left);
    assert_eq!(primary.label, "Power");
    assert!(f.axes.axis_config("renamed").is_none());
}

#[test]
fn update_axis_rejects_degenerate_manual_range() {
    let mut f = fixture();
    assert!(f.axes.add_axis_named("temp"));
    let before = f.axes.axis_config("temp").cloned();

    assert!(!f.axes.update_axis("temp", |config| {
        config.range_mode = RangeMode::Manual;
        config.manual_range = AxisRange {
            lower: 5.0,
            upper: 5.0,
        };
    }));
    assert_eq!(f.axes.axis_config("temp").cloned(), before);
}

#[test]
fn update_axis_rejects_unknown_alignment_target() {
    let mut f = fixture();
    assert!(f.axes.add_axis_named("temp"));
    assert!(!f.axes.update_axis("temp", |config| {
        config.align_mode = AlignmentMode::Zero;
        config.align_target = Some("ghost".to_owned());
    }));
    assert!(f.axes.update_axis("temp", |config| {
        config.align_mode = AlignmentMode::Zero;
        config.align_target = Some("main".to_owned());
    }));
}

#[test]
fn unchanged_update_emits_nothing() {
    let mut f = fixture();
    assert!(f.axes.add_axis_named("temp"));
    f.events.borrow_mut().clear();
    assert!(f.axes.update_axis("temp", |_| {}));
    assert!(f.events.borrow().is_empty());
}

#[test]
fn render_handle_is_stored_without_signal() {
    let mut f = fixture();
    assert!(f.axes.add_axis_named("temp"));
    f.events.borrow_mut().clear();

    let handle = AxisRenderHandle {
        viewport: ViewportId::new(3),
        axis_item: Some(AxisItemId::new(4)),
    };
    assert!(f.axes.set_render_handle("temp", Some(handle)));
    assert!(!f.axes.set_render_handle("ghost", Some(handle)));
    assert_eq!(
        f.axes.axis_config("temp").expect("temp").render_handle,
        Some(handle)
    );
    assert!(f.events.borrow().is_empty());
}
