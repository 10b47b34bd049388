//! Integration tests for slider-motion library
//!
//! These tests drive a complete slider through its state machine using
//! simulated axes, recording pins and a manual clock.

mod unit;

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};
use proptest::prelude::*;

use slider_motion::config::{load_settings, MemoryStore, SettingsStore, StoredSettings};
use slider_motion::error::{CommandError, ConfigError, Error};
use slider_motion::slider::{traverse_speed, AxisMove, AxisRates, BookmarkKind};
use slider_motion::time::ManualClock;
use slider_motion::{
    AxisTarget, Command, ConfigField, ControlCell, Degrees, DirectionSign, Endstop, EndstopGuard, Fault,
    GuardResponse, Millimeters, MotionAxis, SimulatedAxis, SimulatedSwitch, Slider, SliderBuilder,
    SliderConfig, SliderState, Steps,
};

// =============================================================================
// Test rig
// =============================================================================

/// Output pin that records its level and the number of writes.
#[derive(Debug, Clone, Default)]
struct LevelPin {
    high: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
}

impl LevelPin {
    fn is_high(&self) -> bool {
        self.high.get()
    }

    fn writes(&self) -> u32 {
        self.writes.get()
    }

    fn record(&self, high: bool) {
        self.high.set(high);
        self.writes.set(self.writes.get() + 1);
    }
}

impl ErrorType for LevelPin {
    type Error = Infallible;
}

impl OutputPin for LevelPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.record(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.record(true);
        Ok(())
    }
}

#[derive(Default)]
struct Pins {
    enable: LevelPin,
    shutter: LevelPin,
    led: LevelPin,
}

type TestSlider<'c> = Slider<
    'c,
    SimulatedAxis,
    SimulatedAxis,
    LevelPin,
    LevelPin,
    LevelPin,
    SimulatedSwitch,
    &'c ManualClock,
>;

/// Far enough that any move in these tests completes in one advance.
const FAST: u32 = 1_000_000;

fn build_slider<'c>(
    cell: &'c ControlCell,
    clock: &'c ManualClock,
    config: SliderConfig,
    slide: SimulatedAxis,
    pan: SimulatedAxis,
    pins: &Pins,
) -> TestSlider<'c> {
    SliderBuilder::new()
        .cell(cell)
        .config(config)
        .slide_axis(slide)
        .pan_axis(pan)
        .enable_pin(pins.enable.clone())
        .shutter_pin(pins.shutter.clone())
        .status_led(pins.led.clone())
        .home_switch(SimulatedSwitch::new(PinState::High))
        .clock(clock)
        .build()
        .expect("Failed to build slider")
}

fn tick_until(slider: &mut TestSlider<'_>, clock: &ManualClock, state: SliderState, max_ticks: u32) {
    for _ in 0..max_ticks {
        if slider.state() == state {
            return;
        }
        clock.advance_ms(10);
        slider.tick().expect("tick failed");
    }
    assert_eq!(slider.state(), state, "state not reached in {} ticks", max_ticks);
}

fn rates(speed: f32) -> AxisRates {
    AxisRates { speed, accel: 0.0 }
}

fn to(position: f32) -> AxisMove {
    AxisMove {
        position,
        speed: 10.0,
        accel: 20.0,
    }
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_build_leaves_slider_idle_with_drivers_on() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    assert_eq!(slider.state(), SliderState::Idle);
    assert!(slider.motors_enabled());
    assert!(!slider.is_homed());
    assert!(cell.guard_armed());
    // Enable is active low
    assert!(!pins.enable.is_high());
    assert_eq!(slider.duration_secs(), 1);
}

#[test]
fn test_build_without_axis_is_rejected() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let result: slider_motion::Result<TestSlider<'_>> = SliderBuilder::new()
        .cell(&cell)
        .pan_axis(SimulatedAxis::new(1))
        .enable_pin(LevelPin::default())
        .shutter_pin(LevelPin::default())
        .status_led(LevelPin::default())
        .home_switch(SimulatedSwitch::new(PinState::High))
        .clock(&clock)
        .build();

    assert!(result.is_err());
}

// =============================================================================
// State requests
// =============================================================================

#[test]
fn test_sentinel_state_requests_rejected() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    assert_eq!(
        slider.request_state(0),
        Err(Error::Command(CommandError::InvalidState(0)))
    );
    assert_eq!(
        slider.request_state(10),
        Err(Error::Command(CommandError::InvalidState(10)))
    );
    assert_eq!(slider.state(), SliderState::Idle);

    assert_eq!(slider.request_state(6), Ok(SliderState::Ready));
    assert_eq!(slider.state(), SliderState::Ready);
}

#[test]
fn test_set_state_command_checks_sentinels() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut store = MemoryStore::new();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    assert_eq!(
        slider.execute(Command::SetState { state: 0 }, &mut store),
        Err(Error::Command(CommandError::InvalidState(0)))
    );
    assert_eq!(
        slider.execute(Command::SetState { state: 10 }, &mut store),
        Err(Error::Command(CommandError::InvalidState(10)))
    );
    assert_eq!(slider.state(), SliderState::Idle);

    slider
        .execute(Command::SetState { state: 6 }, &mut store)
        .unwrap();
    assert_eq!(slider.state(), SliderState::Ready);
    assert_eq!(store.writes(), 0);
}

// =============================================================================
// Timed start-to-end motion
// =============================================================================

proptest! {
    #[test]
    fn prop_traverse_speed_covers_distance(
        start in -1.0e5f32..1.0e5,
        end in -1.0e5f32..1.0e5,
        duration in 1u32..3600,
    ) {
        let speed = traverse_speed(start, end, duration);
        prop_assert!(speed >= 0.0);
        let covered = speed * duration as f32;
        prop_assert!((covered - (end - start).abs()).abs() <= 1.0e-3 * (end - start).abs() + 1.0e-3);
    }

    #[test]
    fn prop_traverse_leg_uses_derived_speed(
        start_mm in 0.0f32..300.0,
        end_mm in 0.0f32..300.0,
        start_deg in -90.0f32..90.0,
        end_deg in -90.0f32..90.0,
        duration in 1u32..120,
    ) {
        let cell = ControlCell::new();
        let clock = ManualClock::new();
        let pins = Pins::default();
        let mut slider = build_slider(
            &cell,
            &clock,
            SliderConfig::default(),
            SimulatedAxis::new(FAST),
            SimulatedAxis::new(FAST),
            &pins,
        );

        slider.set_start(Millimeters(start_mm), Degrees(start_deg)).unwrap();
        slider.set_end(Millimeters(end_mm), Degrees(end_deg)).unwrap();
        slider.set_duration(duration).unwrap();
        slider.start_motion().unwrap();
        prop_assert_eq!(slider.state(), SliderState::MovingToStart);

        tick_until(&mut slider, &clock, SliderState::MovingToEnd, 10);

        let start = slider.start_bookmark();
        let end = slider.end_bookmark();
        let slide_speed = (end.slide.0 - start.slide.0).unsigned_abs() as f32 / duration as f32;
        let pan_speed = (end.pan.0 - start.pan.0).unsigned_abs() as f32 / duration as f32;

        prop_assert!((slider.slide_axis().speed() - slide_speed).abs() <= 1.0e-3 * slide_speed + 1.0e-3);
        prop_assert!((slider.pan_axis().speed() - pan_speed).abs() <= 1.0e-3 * pan_speed + 1.0e-3);
        prop_assert_eq!(slider.slide_axis().target(), end.slide);
        prop_assert_eq!(slider.pan_axis().target(), end.pan);
    }
}

#[test]
fn test_zero_duration_treated_as_one_second() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    slider.set_end(Millimeters(100.0), Degrees(0.0)).unwrap();
    slider.set_duration(0).unwrap();
    assert_eq!(slider.duration_secs(), 1);

    slider.start_motion().unwrap();
    tick_until(&mut slider, &clock, SliderState::MovingToEnd, 10);

    // 100 mm * 187 steps/mm in one second
    assert_eq!(slider.slide_axis().speed(), 18_700.0);
    assert_eq!(slider.pan_axis().speed(), 0.0);

    tick_until(&mut slider, &clock, SliderState::Ready, 10);
    assert!((slider.slide_position().value() - 100.0).abs() < 0.01);
}

#[test]
fn test_transition_waits_for_both_axes() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(1),
        &pins,
    );

    // Pan needs 78 single-step advances, slide needs one
    slider.move_absolute(to(10.0), to(1.0)).unwrap();
    assert_eq!(slider.state(), SliderState::Working);

    for _ in 0..10 {
        slider.tick().unwrap();
    }
    assert_eq!(slider.slide_axis().current_position(), Steps(1870));
    assert_eq!(slider.state(), SliderState::Working);

    tick_until(&mut slider, &clock, SliderState::Ready, 200);
    assert_eq!(slider.pan_axis().target(), Steps(78));
}

// =============================================================================
// Direct moves
// =============================================================================

#[test]
fn test_relative_move_offsets_both_axes() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST).with_position(Steps(1870)),
        SimulatedAxis::new(FAST).with_position(Steps(780)),
        &pins,
    );

    slider.move_relative(to(5.0), to(-5.0)).unwrap();

    assert_eq!(slider.slide_axis().target(), Steps(1870 + 935));
    assert_eq!(slider.pan_axis().target(), Steps(780 - 390));
    assert_eq!(slider.slide_axis().speed(), 1870.0);
    assert_eq!(slider.pan_axis().acceleration(), 1560.0);

    tick_until(&mut slider, &clock, SliderState::Ready, 10);
    assert!((slider.slide_position().value() - 15.0).abs() < 0.01);
    assert!((slider.pan_position().value() - 5.0).abs() < 0.01);
}

#[test]
fn test_move_to_bookmark_reaches_captured_position() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST).with_position(Steps(5000)),
        SimulatedAxis::new(FAST).with_position(Steps(-300)),
        &pins,
    );

    slider.capture_end().unwrap();
    slider.move_absolute(to(0.0), to(0.0)).unwrap();
    tick_until(&mut slider, &clock, SliderState::Ready, 10);

    slider
        .move_to_bookmark(BookmarkKind::End, rates(20.0), rates(20.0))
        .unwrap();
    assert_eq!(slider.state(), SliderState::Working);
    tick_until(&mut slider, &clock, SliderState::Ready, 10);

    assert_eq!(slider.end_bookmark().slide, Steps(5000));
    assert_eq!(slider.slide_axis().target(), Steps(5000));
    assert_eq!(slider.pan_axis().target(), Steps(-300));
}

#[test]
fn test_busy_and_disabled_rejections() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(1),
        SimulatedAxis::new(1),
        &pins,
    );

    slider.move_absolute(to(50.0), to(0.0)).unwrap();
    slider.tick().unwrap();

    assert_eq!(
        slider.set_start(Millimeters(1.0), Degrees(0.0)),
        Err(Error::Command(CommandError::Busy(SliderState::Working)))
    );
    assert!(matches!(
        slider.start_stepping(Millimeters(10.0), Millimeters(1.0)),
        Err(Error::Command(CommandError::Busy(_)))
    ));
    assert!(slider.home().is_err());

    // Always accepted, and stops the move
    slider.disable_motors().unwrap();
    assert_eq!(slider.state(), SliderState::MotorsOff);
    assert!(pins.enable.is_high());

    assert_eq!(
        slider.move_absolute(to(0.0), to(0.0)),
        Err(Error::Command(CommandError::MotorsDisabled))
    );
    assert_eq!(
        slider.start_motion(),
        Err(Error::Command(CommandError::MotorsDisabled))
    );

    slider.enable_motors().unwrap();
    assert_eq!(slider.state(), SliderState::Idle);
    assert!(!pins.enable.is_high());
}

#[test]
fn test_invalid_move_parameters_rejected() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    let stalled = AxisMove {
        position: 10.0,
        speed: 0.0,
        accel: 1.0,
    };
    assert!(slider.move_absolute(stalled, to(0.0)).is_err());
    assert!(slider.set_start(Millimeters(f32::NAN), Degrees(0.0)).is_err());
    assert_eq!(slider.state(), SliderState::Idle);
}

// =============================================================================
// Stop-motion stepping
// =============================================================================

#[test]
fn test_stepping_session_fires_once_per_step() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    slider
        .start_stepping(Millimeters(550.0), Millimeters(2.0))
        .unwrap();
    assert_eq!(slider.state(), SliderState::StepFinished);
    assert_eq!(slider.stepping_session().map(|s| s.ceiling()), Some(275));

    for _ in 0..10_000 {
        if slider.state() == SliderState::Idle {
            break;
        }
        clock.advance_ms(600);
        slider.tick().unwrap();
    }

    assert_eq!(slider.state(), SliderState::Idle);
    assert_eq!(slider.shutter_releases(), 275);
    assert!(!slider.motors_enabled());
    assert!(slider.stepping_session().is_none());
    assert!((slider.slide_position().value() - 550.0).abs() < 0.01);
    assert!(pins.enable.is_high());
    // Every release was a high pulse that ended
    assert!(!pins.shutter.is_high());
    assert_eq!(pins.shutter.writes(), 2 * 275);
}

#[test]
fn test_stepping_waits_for_settle_before_release() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    slider.start_stepping(Millimeters(10.0), Millimeters(5.0)).unwrap();

    clock.advance_ms(300);
    slider.tick().unwrap();
    assert_eq!(slider.shutter_releases(), 0);
    assert_eq!(slider.slide_position(), Millimeters(0.0));

    clock.advance_ms(300);
    slider.tick().unwrap();
    assert_eq!(slider.shutter_releases(), 1);
    assert!(pins.shutter.is_high());

    // Pulse ends, exposure still running
    clock.advance_ms(400);
    slider.tick().unwrap();
    assert!(!pins.shutter.is_high());
    assert_eq!(slider.state(), SliderState::StepFinished);
}

#[test]
fn test_invalid_stepping_parameters_rejected() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    assert_eq!(
        slider.start_stepping(Millimeters(100.0), Millimeters(0.0)),
        Err(Error::Command(CommandError::InvalidParameter("step_size")))
    );
    assert!(slider
        .start_stepping(Millimeters(-5.0), Millimeters(1.0))
        .is_err());
    assert_eq!(slider.state(), SliderState::Idle);
    assert!(slider.stepping_session().is_none());
}

#[test]
fn test_disabling_motors_aborts_stepping() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    slider.start_stepping(Millimeters(20.0), Millimeters(2.0)).unwrap();
    slider.disable_motors().unwrap();
    slider.tick().unwrap();

    assert_eq!(slider.state(), SliderState::MotorsOff);
    assert!(slider.stepping_session().is_none());

    for _ in 0..10 {
        clock.advance_ms(600);
        slider.tick().unwrap();
    }
    assert_eq!(slider.shutter_releases(), 0);
}

// =============================================================================
// Endstop guard
// =============================================================================

#[test]
fn test_endstop_trip_stops_motion() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(1),
        SimulatedAxis::new(1),
        &pins,
    );
    let guard = EndstopGuard::new(slider.cell());

    slider.move_absolute(to(100.0), to(0.0)).unwrap();
    for _ in 0..5 {
        slider.tick().unwrap();
    }
    let advances = slider.slide_axis().advances();
    assert_eq!(advances, 5);

    assert_eq!(guard.on_edge(Endstop::Right), GuardResponse::Tripped);
    assert_eq!(slider.state(), SliderState::MotorsOff);
    assert!(!slider.motors_enabled());
    assert_eq!(cell.endstop_events(), 1);
    assert_eq!(cell.guard_rearms(), 1);
    assert!(guard.is_armed());

    for _ in 0..5 {
        slider.tick().unwrap();
    }
    assert_eq!(slider.slide_axis().advances(), advances);
    assert!(pins.enable.is_high());
}

#[test]
fn test_endstop_ignored_while_homing() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(10)
            .with_position(Steps(1000))
            .with_home_at(Steps(0)),
        SimulatedAxis::new(FAST),
        &pins,
    );
    let guard = EndstopGuard::new(slider.cell());

    slider.home().unwrap();
    slider.tick().unwrap();

    // Switch found, backing off
    assert_eq!(slider.state(), SliderState::Homing);
    assert!(!cell.guard_armed());
    assert_eq!(guard.on_edge(Endstop::Left), GuardResponse::Ignored);
    assert_eq!(slider.state(), SliderState::Homing);
    assert!(slider.motors_enabled());
    assert_eq!(cell.endstop_events(), 0);

    tick_until(&mut slider, &clock, SliderState::Ready, 100);
    assert!(cell.guard_armed());
}

/// Slide axis that fires the endstop guard the next time its completion is
/// checked, the way an interrupt can land in the middle of a tick.
struct TrippingAxis<'c> {
    inner: SimulatedAxis,
    guard: EndstopGuard<'c>,
    trip_pending: Cell<bool>,
}

impl<'c> TrippingAxis<'c> {
    fn new(cell: &'c ControlCell) -> Self {
        Self {
            inner: SimulatedAxis::new(FAST),
            guard: EndstopGuard::new(cell),
            trip_pending: Cell::new(false),
        }
    }

    fn trip_on_next_check(&self) {
        self.trip_pending.set(true);
    }
}

impl MotionAxis for TrippingAxis<'_> {
    fn set_speed(&mut self, steps_per_sec: f32) {
        self.inner.set_speed(steps_per_sec);
    }

    fn set_acceleration(&mut self, steps_per_sec2: f32) {
        self.inner.set_acceleration(steps_per_sec2);
    }

    fn set_target(&mut self, target: AxisTarget) {
        self.inner.set_target(target);
    }

    fn set_current_position(&mut self, position: Steps) {
        self.inner.set_current_position(position);
    }

    fn advance(&mut self) -> slider_motion::Result<bool> {
        self.inner.advance()
    }

    fn motion_complete(&self) -> bool {
        if self.trip_pending.replace(false) {
            self.guard.on_edge(Endstop::Right);
        }
        self.inner.motion_complete()
    }

    fn current_position(&self) -> Steps {
        self.inner.current_position()
    }

    fn seek_home<L: InputPin>(
        &mut self,
        limit: &mut L,
        active: PinState,
        direction: DirectionSign,
        steps_per_sec: f32,
        max_travel: Steps,
    ) -> slider_motion::Result<bool> {
        self.inner
            .seek_home(limit, active, direction, steps_per_sec, max_travel)
    }
}

#[test]
fn test_endstop_trip_mid_tick_is_not_overwritten() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = SliderBuilder::new()
        .cell(&cell)
        .config(SliderConfig::default())
        .slide_axis(TrippingAxis::new(&cell))
        .pan_axis(SimulatedAxis::new(FAST))
        .enable_pin(pins.enable.clone())
        .shutter_pin(pins.shutter.clone())
        .status_led(pins.led.clone())
        .home_switch(SimulatedSwitch::new(PinState::High))
        .clock(&clock)
        .build()
        .expect("Failed to build slider");

    // Both axes already sit on the start bookmarks
    slider.set_end(Millimeters(50.0), Degrees(10.0)).unwrap();
    slider.start_motion().unwrap();
    assert_eq!(slider.state(), SliderState::MovingToStart);

    slider.slide_axis().trip_on_next_check();
    slider.tick().unwrap();

    assert_eq!(cell.endstop_events(), 1);
    assert_eq!(slider.state(), SliderState::MotorsOff);
    assert!(!slider.motors_enabled());

    for _ in 0..5 {
        clock.advance_ms(10);
        slider.tick().unwrap();
    }
    assert_eq!(slider.state(), SliderState::MotorsOff);
    assert_eq!(slider.slide_axis().inner.advances(), 0);
    assert_eq!(slider.pan_axis().advances(), 0);
    assert!(pins.enable.is_high());
}

// =============================================================================
// Homing
// =============================================================================

#[test]
fn test_homing_zeroes_slide_and_releases_drivers() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST)
            .with_position(Steps(5000))
            .with_home_at(Steps(100)),
        SimulatedAxis::new(FAST),
        &pins,
    );

    slider.home().unwrap();
    assert_eq!(slider.state(), SliderState::Homing);

    slider.tick().unwrap();
    // Zeroed at the switch, heading 2 mm away from it
    assert_eq!(slider.slide_axis().target(), Steps(374));

    tick_until(&mut slider, &clock, SliderState::Ready, 10);

    assert!(slider.is_homed());
    assert_eq!(slider.slide_position(), Millimeters(0.0));
    assert!(!slider.motors_enabled());
    assert!(pins.enable.is_high());
    assert!(slider.fault().is_none());

    let status = slider.status();
    assert!(status.homed);
    assert_eq!(status.state, SliderState::Ready.ordinal());
    assert_eq!(status.slide_pos, 0.0);
}

#[test]
fn test_homing_failure_latches_fault() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let config = SliderConfig {
        rail_length: 20,
        ..SliderConfig::default()
    };
    let mut slider = build_slider(
        &cell,
        &clock,
        config,
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    slider.home().unwrap();
    slider.tick().unwrap();

    assert_eq!(slider.fault(), Some(Fault::HomingFailed));
    assert!(!slider.is_homed());
    assert!(!slider.motors_enabled());
    assert!(slider.status().faulted);
    // Gave up after the rail length
    assert_eq!(slider.slide_axis().current_position(), Steps(-20 * 187));

    assert_eq!(slider.home(), Err(Error::Command(CommandError::Faulted)));
    assert_eq!(
        slider.enable_motors(),
        Err(Error::Command(CommandError::Faulted))
    );
    assert!(slider.request_state(2).is_err());

    // Blinks at 200 ms
    slider.tick().unwrap();
    assert!(pins.led.is_high());
    clock.advance_ms(100);
    slider.tick().unwrap();
    assert!(pins.led.is_high());
    clock.advance_ms(100);
    slider.tick().unwrap();
    assert!(!pins.led.is_high());
    clock.advance_ms(200);
    slider.tick().unwrap();
    assert!(pins.led.is_high());
    assert_eq!(pins.led.writes(), 3);
}

// =============================================================================
// Configuration and bookmarks
// =============================================================================

#[test]
fn test_config_update_persists_across_reload() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut store = MemoryStore::new();
    let config = load_settings(&mut store);
    let mut slider = build_slider(
        &cell,
        &clock,
        config,
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    slider
        .execute(
            Command::UpdateConfig {
                field: ConfigField::SliderStepsPerMm,
                value: 200.0,
            },
            &mut store,
        )
        .unwrap();
    slider
        .execute(Command::SetRailLength { rail_length: 800 }, &mut store)
        .unwrap();
    assert_eq!(store.writes(), 2);

    // Rejected, nothing written
    assert!(slider
        .execute(
            Command::UpdateConfig {
                field: ConfigField::PanDirection,
                value: 0.0,
            },
            &mut store,
        )
        .is_err());
    assert_eq!(store.writes(), 2);

    let reloaded = load_settings(&mut store);
    assert_eq!(reloaded.slide_steps_per_mm, 200);
    assert_eq!(reloaded.rail_length, 800);
    assert_eq!(&reloaded, slider.config());

    let snapshot = slider.config_snapshot();
    assert_eq!(snapshot.rail_length, 800);
    assert_eq!(snapshot.slide_steps_per_unit, 200);
}

/// Store whose writes always fail, as a full or worn flash would.
struct FailingStore;

impl SettingsStore for FailingStore {
    fn load(&mut self) -> slider_motion::Result<Option<StoredSettings>> {
        Ok(None)
    }

    fn save(&mut self, _settings: &StoredSettings) -> slider_motion::Result<()> {
        Err(Error::Config(ConfigError::MissingComponent("settings storage")))
    }
}

#[test]
fn test_failed_save_rolls_back_config() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut store = FailingStore;
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    let result = slider.execute(
        Command::UpdateConfig {
            field: ConfigField::SliderStepsPerMm,
            value: 200.0,
        },
        &mut store,
    );
    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(slider.config(), &SliderConfig::default());

    assert!(slider
        .execute(Command::SetRailLength { rail_length: 800 }, &mut store)
        .is_err());
    assert_eq!(slider.config().rail_length, 330);
    assert_eq!(slider.config_snapshot().slide_steps_per_unit, 187);
}

#[test]
fn test_direction_flip_inverts_reported_bookmarks() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut store = MemoryStore::new();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST),
        SimulatedAxis::new(FAST),
        &pins,
    );

    slider.set_start(Millimeters(10.0), Degrees(45.0)).unwrap();
    let raw = slider.start_bookmark();
    assert_eq!(raw.slide, Steps(1870));
    assert_eq!(raw.pan, Steps(3510));

    slider
        .update_config(ConfigField::SlidingDirection, -1.0, &mut store)
        .unwrap();
    slider
        .update_config(ConfigField::PanDirection, -1.0, &mut store)
        .unwrap();

    assert_eq!(slider.start_bookmark(), raw);
    let status = slider.status();
    assert!((status.start_slide + 10.0).abs() < 1.0e-3);
    assert!((status.start_pan_degrees + 45.0).abs() < 1.0e-3);
    assert_eq!(slider.config().slider_direction, DirectionSign::REVERSE);
}

proptest! {
    #[test]
    fn prop_direction_flip_negates_reported_position(
        slide_mm in -300.0f32..300.0,
        pan_deg in -180.0f32..180.0,
    ) {
        let cell = ControlCell::new();
        let clock = ManualClock::new();
        let pins = Pins::default();
        let mut store = MemoryStore::new();
        let mut slider = build_slider(
            &cell,
            &clock,
            SliderConfig::default(),
            SimulatedAxis::new(FAST),
            SimulatedAxis::new(FAST),
            &pins,
        );

        slider.move_absolute(to(slide_mm), to(pan_deg)).unwrap();
        tick_until(&mut slider, &clock, SliderState::Ready, 10);
        let before = slider.status();
        let raw_slide = slider.slide_axis().current_position();

        slider.update_config(ConfigField::SlidingDirection, -1.0, &mut store).unwrap();
        slider.update_config(ConfigField::PanDirection, -1.0, &mut store).unwrap();
        let after = slider.status();

        prop_assert_eq!(slider.slide_axis().current_position(), raw_slide);
        prop_assert!((after.slide_pos + before.slide_pos).abs() < 1.0e-3);
        prop_assert!((after.pan_pos_degrees + before.pan_pos_degrees).abs() < 1.0e-3);
    }
}

#[test]
fn test_set_pan_home_zeroes_pan_only() {
    let cell = ControlCell::new();
    let clock = ManualClock::new();
    let pins = Pins::default();
    let mut slider = build_slider(
        &cell,
        &clock,
        SliderConfig::default(),
        SimulatedAxis::new(FAST).with_position(Steps(374)),
        SimulatedAxis::new(FAST).with_position(Steps(780)),
        &pins,
    );

    slider.execute(Command::SetPanHome, &mut MemoryStore::new()).unwrap();

    assert_eq!(slider.pan_position(), Degrees(0.0));
    assert_eq!(slider.slide_position(), Millimeters(2.0));
}

#[cfg(feature = "std")]
#[test]
fn test_commands_parse_from_toml() {
    #[derive(serde::Deserialize)]
    struct Request {
        command: Command,
    }

    let home: Request = toml::from_str(r#"command = "home""#).expect("Failed to parse");
    assert_eq!(home.command, Command::Home);

    let stepping: Request = toml::from_str(
        r#"
[command.start_stepping]
total_distance = 550.0
step_size = 2.0
"#,
    )
    .expect("Failed to parse");
    assert_eq!(
        stepping.command,
        Command::StartStepping {
            total_distance: 550.0,
            step_size: 2.0
        }
    );
}

#[test]
fn test_stored_record_round_trips_through_store() {
    let mut store = MemoryStore::new();
    let config = SliderConfig {
        homing_direction: DirectionSign::FORWARD,
        ..SliderConfig::default()
    };
    store.save(&StoredSettings::current(config.clone())).unwrap();

    assert_eq!(load_settings(&mut store), config);
}
