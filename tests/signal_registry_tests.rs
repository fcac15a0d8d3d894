use std::cell::RefCell;
use std::rc::Rc;

use multiaxis::PlotError;
use multiaxis::api::{
    AxisManager, ColumnMetadataManager, ManagerEvent, Notice, NoticeLevel, Observable,
    signal_names,
};
use multiaxis::core::StyleDefaults;

fn axis_manager() -> AxisManager {
    let metadata = Rc::new(ColumnMetadataManager::new(["time", "power"]).expect("metadata"));
    AxisManager::new(0, "main", metadata, StyleDefaults::default()).expect("axis manager")
}

#[test]
fn axis_manager_lists_signals_in_registration_order() {
    let axes = axis_manager();
    assert_eq!(
        axes.list_signal_names(),
        vec![
            "axis_added",
            "axis_removed",
            "axis_changed",
            "axes_batch_added",
            "axes_batch_removed",
            "axes_batch_changed",
        ]
    );
}

#[test]
fn unknown_signal_is_an_error_and_an_error_notice() {
    let axes = axis_manager();
    let notices = Rc::new(RefCell::new(Vec::<Notice>::new()));
    {
        let notices = Rc::clone(&notices);
        axes.notices()
            .error
            .connect(move |notice| notices.borrow_mut().push(notice.clone()));
    }

    let err = axes.signal("curve_added").expect_err("not an axis signal");
    assert_eq!(
        err,
        PlotError::UnknownSignal {
            manager: "axis_manager",
            name: "curve_added".to_owned(),
        }
    );

    let notices = notices.borrow();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].subplot, Some(0));
}

#[test]
fn duplicate_registration_is_rejected() {
    let axes = axis_manager();
    let err = axes
        .register_signal(signal_names::AXIS_ADDED)
        .expect_err("already registered");
    assert_eq!(err, PlotError::DuplicateSignal("axis_added".to_owned()));

    axes.register_signal("axis_styled").expect("new signal");
    assert!(axes.list_signal_names().contains(&"axis_styled".to_owned()));
}

#[test]
fn connect_all_signals_observes_every_signal() {
    let mut axes = axis_manager();
    let events = Rc::new(RefCell::new(Vec::<ManagerEvent>::new()));
    {
        let events = Rc::clone(&events);
        axes.connect_all_signals(move |event| events.borrow_mut().push(event.clone()));
    }

    assert!(axes.add_axis_named("temp"));
    assert!(axes.update_axis("temp", |config| config.label = "Temperature".to_owned()));
    assert!(axes.remove_axis("temp", false));

    assert_eq!(
        *events.borrow(),
        vec![
            ManagerEvent::AxisAdded {
                name: "temp".to_owned()
            },
            ManagerEvent::AxisChanged {
                name: "temp".to_owned()
            },
            ManagerEvent::AxisRemoved {
                name: "temp".to_owned()
            },
        ]
    );
}

#[test]
fn disconnected_slot_no_longer_fires() {
    let mut axes = axis_manager();
    let hits = Rc::new(RefCell::new(0_usize));
    let signal = axes.signal(signal_names::AXIS_ADDED).expect("signal");
    let id = {
        let hits = Rc::clone(&hits);
        signal.connect(move |_| *hits.borrow_mut() += 1)
    };

    assert!(axes.add_axis_named("a"));
    assert!(signal.disconnect(id));
    assert!(axes.add_axis_named("b"));

    assert_eq!(*hits.borrow(), 1);
    assert_eq!(signal.slot_count(), 0);
}
