//! Black-box coverage of the priority muxer through the public crate API.

use std::time::{Duration, Instant};

use hyperhdr_core::color::Rgb8;
use hyperhdr_core::muxer::{ComponentKind, Muxer, MuxerEvent, SENTINEL_PRIORITY};

#[test]
fn visibility_preemption_reports_a_muxer_event_at_every_transition() {
    let mut muxer = Muxer::new();
    let t0 = Instant::now();

    muxer.register_input(200, ComponentKind::Color, "A", Rgb8::BLACK, 0, "a");
    muxer.set_input(200, Rgb8::new(255, 0, 0), 1000, t0).unwrap();
    let event = muxer.tick(t0);
    assert_eq!(event, Some(MuxerEvent::VisiblePriorityChanged(200)));
    assert_eq!(muxer.current_color(), Rgb8::new(255, 0, 0));

    muxer.register_input(100, ComponentKind::Color, "B", Rgb8::BLACK, 0, "b");
    muxer.set_input(100, Rgb8::new(0, 0, 255), 500, t0).unwrap();
    let event = muxer.tick(t0);
    assert_eq!(event, Some(MuxerEvent::VisiblePriorityChanged(100)));
    assert_eq!(muxer.current_color(), Rgb8::new(0, 0, 255));

    let t600 = t0 + Duration::from_millis(600);
    let event = muxer.tick(t600);
    assert_eq!(event, Some(MuxerEvent::VisiblePriorityChanged(200)));
    assert_eq!(muxer.current_color(), Rgb8::new(255, 0, 0));

    let t1600 = t0 + Duration::from_millis(1600);
    let event = muxer.tick(t1600);
    assert_eq!(event, Some(MuxerEvent::VisiblePriorityChanged(SENTINEL_PRIORITY)));
    assert_eq!(muxer.current_priority(), SENTINEL_PRIORITY);
    assert_eq!(muxer.current_color(), Rgb8::BLACK);
}

#[test]
fn a_component_kind_change_is_reported_as_a_component_event_not_a_priority_event() {
    let mut muxer = Muxer::new();
    let t0 = Instant::now();

    muxer.register_input(50, ComponentKind::Effect, "effect", Rgb8::BLACK, 0, "engine");
    muxer.set_input(50, Rgb8::new(1, 2, 3), 0, t0).unwrap();
    let event = muxer.tick(t0);
    assert_eq!(event, Some(MuxerEvent::VisibleComponentChanged(ComponentKind::Effect)));
}
