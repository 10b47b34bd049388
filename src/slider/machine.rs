//! The slider state machine.
//!
//! [`Slider`] owns both axes, the bookmarks and the stepping session. It is
//! driven by calling [`Slider::tick`] from the control loop; commands only
//! program the axes and set the state, the tick does the moving.
//!
//! The endstop guard can drop the state to `MotorsOff` between any two
//! lines here. Forward moves are made with [`ControlCell::transition`] and
//! abandoned when it reports the state has changed underneath.

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use serde::{Deserialize, Serialize};

use crate::axis::{AxisTarget, MotionAxis};
use crate::config::units::{Degrees, Millimeters, Steps};
use crate::config::{ConfigField, SettingsStore, SliderConfig, StoredSettings};
use crate::error::{CommandError, HardwareError, Result};
use crate::indicator::{Fault, FaultIndicator};
use crate::shutter::{ShutterState, ShutterTrigger};
use crate::time::SystemClock;

use super::state::{ControlCell, SliderState};
use super::stepping::{StepOutcome, StepPause, SteppingSession};

/// Distance the carriage backs away from the home switch, mm.
pub const HOMING_BACKOFF_MM: f32 = 2.0;

/// Level the home switch reads when closed.
pub const HOME_SWITCH_ACTIVE: PinState = PinState::Low;

/// Stored start or end position, in raw motor steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bookmark {
    /// Slide position.
    pub slide: Steps,
    /// Pan position.
    pub pan: Steps,
}

/// Which bookmark a direct move heads for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookmarkKind {
    /// The start bookmark.
    Start,
    /// The end bookmark.
    End,
}

/// Speed and acceleration for one axis, in mm or degrees per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisRates {
    /// Cruise speed.
    pub speed: f32,
    /// Acceleration; zero runs at cruise speed from the first step.
    pub accel: f32,
}

impl AxisRates {
    /// Check the rates are usable.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidParameter` for a non-finite or
    /// non-positive speed, or a non-finite or negative acceleration.
    pub fn validate(&self) -> core::result::Result<(), CommandError> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(CommandError::InvalidParameter("speed"));
        }
        if !self.accel.is_finite() || self.accel < 0.0 {
            return Err(CommandError::InvalidParameter("accel"));
        }
        Ok(())
    }
}

/// One axis of a direct move: where to go and how fast.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisMove {
    /// Target (absolute) or offset (relative), mm or degrees.
    pub position: f32,
    /// Cruise speed.
    pub speed: f32,
    /// Acceleration; zero runs at cruise speed from the first step.
    pub accel: f32,
}

impl AxisMove {
    /// Check the position and rates are usable.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidParameter` if any number is unusable.
    pub fn validate(&self) -> core::result::Result<(), CommandError> {
        if !self.position.is_finite() {
            return Err(CommandError::InvalidParameter("position"));
        }
        self.rates().validate()
    }

    /// Speed and acceleration of this move.
    #[inline]
    pub fn rates(&self) -> AxisRates {
        AxisRates {
            speed: self.speed,
            accel: self.accel,
        }
    }
}

/// Speed needed to cover `start..end` in `duration_secs`.
///
/// The duration is clamped to at least one second; the result is never
/// negative.
pub fn traverse_speed(start: f32, end: f32, duration_secs: u32) -> f32 {
    libm::fabsf(end - start) / duration_secs.max(1) as f32
}

/// Two-axis camera slider.
///
/// Generic over the slide and pan axes, the driver enable line (active low),
/// the shutter release line, the status LED, the home switch and the clock.
/// Built with [`SliderBuilder`](super::SliderBuilder).
pub struct Slider<'c, SLIDE, PAN, EN, SH, LED, LIM, CLK>
where
    SLIDE: MotionAxis,
    PAN: MotionAxis,
    EN: OutputPin,
    SH: OutputPin,
    LED: OutputPin,
    LIM: InputPin,
    CLK: SystemClock,
{
    pub(super) cell: &'c ControlCell,
    pub(super) config: SliderConfig,
    pub(super) slide: SLIDE,
    pub(super) pan: PAN,
    pub(super) enable_pin: EN,
    pub(super) shutter: ShutterTrigger<SH>,
    pub(super) indicator: FaultIndicator<LED>,
    pub(super) home_switch: LIM,
    pub(super) clock: CLK,
    pub(super) start: Bookmark,
    pub(super) end: Bookmark,
    pub(super) duration_secs: u32,
    pub(super) homed: bool,
    pub(super) fault: Option<Fault>,
    pub(super) session: Option<SteppingSession>,
    pub(super) pause: Option<StepPause>,
    pub(super) backing_off: bool,
    pub(super) last_state: SliderState,
    pub(super) driver_enabled: Option<bool>,
}

impl<'c, SLIDE, PAN, EN, SH, LED, LIM, CLK> Slider<'c, SLIDE, PAN, EN, SH, LED, LIM, CLK>
where
    SLIDE: MotionAxis,
    PAN: MotionAxis,
    EN: OutputPin,
    SH: OutputPin,
    LED: OutputPin,
    LIM: InputPin,
    CLK: SystemClock,
{
    // ========================================================================
    // Queries
    // ========================================================================

    /// Current state.
    #[inline]
    pub fn state(&self) -> SliderState {
        self.cell.state()
    }

    /// Whether the motor drivers are enabled.
    #[inline]
    pub fn motors_enabled(&self) -> bool {
        self.cell.motors_enabled()
    }

    /// Whether homing has completed since power-on.
    #[inline]
    pub fn is_homed(&self) -> bool {
        self.homed
    }

    /// Latched fault, if any.
    #[inline]
    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &SliderConfig {
        &self.config
    }

    /// Shared control cell; hand this to the endstop guard.
    #[inline]
    pub fn cell(&self) -> &'c ControlCell {
        self.cell
    }

    /// Start bookmark in raw steps.
    #[inline]
    pub fn start_bookmark(&self) -> Bookmark {
        self.start
    }

    /// End bookmark in raw steps.
    #[inline]
    pub fn end_bookmark(&self) -> Bookmark {
        self.end
    }

    /// Traverse duration in seconds, at least one.
    #[inline]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Stepping session in progress, if any.
    #[inline]
    pub fn stepping_session(&self) -> Option<&SteppingSession> {
        self.session.as_ref()
    }

    /// Shutter release state.
    #[inline]
    pub fn shutter_state(&self) -> ShutterState {
        self.shutter.state()
    }

    /// Shutter releases fired so far.
    #[inline]
    pub fn shutter_releases(&self) -> u32 {
        self.shutter.releases()
    }

    /// Slide axis.
    #[inline]
    pub fn slide_axis(&self) -> &SLIDE {
        &self.slide
    }

    /// Pan axis.
    #[inline]
    pub fn pan_axis(&self) -> &PAN {
        &self.pan
    }

    /// Logical slide position.
    pub fn slide_position(&self) -> Millimeters {
        self.config.slide_from_steps(self.slide.current_position())
    }

    /// Logical pan angle.
    pub fn pan_position(&self) -> Degrees {
        self.config.pan_from_steps(self.pan.current_position())
    }

    // ========================================================================
    // Control loop
    // ========================================================================

    /// Run one iteration of the control loop.
    ///
    /// Advances whichever axes the current state drives by at most one step
    /// each, ends the shutter pulse when due and follows the transitions.
    /// Blocks only while seeking the home switch.
    pub fn tick(&mut self) -> Result<()> {
        let now = self.clock.elapsed();

        self.sync_driver_enable()?;
        self.shutter.poll(now)?;

        if self.fault.is_some() {
            return self.indicator.poll(now);
        }

        let state = self.cell.state();
        if state != self.last_state {
            info!("{}", state.name());
            self.last_state = state;
        }

        if !state.is_stepping() && (self.session.is_some() || self.pause.is_some()) {
            warn!("Stepping aborted in {}", state.name());
            self.session = None;
            self.pause = None;
        }
        if state != SliderState::Homing {
            self.backing_off = false;
        }

        match state {
            SliderState::MotorsOff | SliderState::Idle | SliderState::Ready => Ok(()),
            SliderState::Homing => self.tick_homing(),
            SliderState::MovingToStart => {
                if self.advance_both()? {
                    self.begin_traverse();
                }
                Ok(())
            }
            SliderState::MovingToEnd | SliderState::Working => {
                if self.advance_both()? {
                    self.cell.transition(state, SliderState::Ready);
                }
                Ok(())
            }
            SliderState::Stepping => {
                if self.slide.motion_complete() {
                    self.cell
                        .transition(SliderState::Stepping, SliderState::StepFinished);
                } else {
                    self.slide.advance()?;
                }
                Ok(())
            }
            SliderState::StepFinished => self.tick_step_finished(now),
        }
    }

    /// Advance both axes unless both are done. Returns `true` once they are.
    fn advance_both(&mut self) -> Result<bool> {
        if self.slide.motion_complete() && self.pan.motion_complete() {
            return Ok(true);
        }

        self.slide.advance()?;
        self.pan.advance()?;
        Ok(false)
    }

    /// Program the timed leg from the start bookmarks to the end bookmarks.
    fn begin_traverse(&mut self) {
        if !self
            .cell
            .transition(SliderState::MovingToStart, SliderState::MovingToEnd)
        {
            return;
        }

        let duration = self.duration_secs;
        let slide_speed = traverse_speed(self.start.slide.0 as f32, self.end.slide.0 as f32, duration);
        let pan_speed = traverse_speed(self.start.pan.0 as f32, self.end.pan.0 as f32, duration);

        let slide_accel = self.config.slide_rate_to_steps(self.config.default_slider_accel);
        let pan_accel = self.config.pan_rate_to_steps(self.config.default_rotate_accel);

        debug!(
            "Traverse over {}s: slide {} steps/s, pan {} steps/s",
            duration,
            slide_speed,
            pan_speed
        );

        self.program_axes(
            AxisTarget::Absolute(self.end.slide),
            slide_speed,
            slide_accel,
            AxisTarget::Absolute(self.end.pan),
            pan_speed,
            pan_accel,
        );
    }

    fn program_axes(
        &mut self,
        slide: AxisTarget,
        slide_speed: f32,
        slide_accel: f32,
        pan: AxisTarget,
        pan_speed: f32,
        pan_accel: f32,
    ) {
        self.slide.set_speed(slide_speed);
        self.slide.set_acceleration(slide_accel);
        self.slide.set_target(slide);

        self.pan.set_speed(pan_speed);
        self.pan.set_acceleration(pan_accel);
        self.pan.set_target(pan);
    }

    /// Drive the enable line to match the shared flag.
    fn sync_driver_enable(&mut self) -> Result<()> {
        let enabled = self.cell.motors_enabled();
        if self.driver_enabled == Some(enabled) {
            return Ok(());
        }

        // Active low
        let result = if enabled {
            self.enable_pin.set_low()
        } else {
            self.enable_pin.set_high()
        };
        result.map_err(|_| HardwareError::DriverEnablePin)?;

        self.driver_enabled = Some(enabled);
        Ok(())
    }

    // ========================================================================
    // Homing
    // ========================================================================

    fn tick_homing(&mut self) -> Result<()> {
        if !self.backing_off {
            return self.seek_home();
        }

        if self.slide.motion_complete() {
            self.finish_homing()
        } else {
            self.slide.advance()?;
            Ok(())
        }
    }

    /// Blocking search for the home switch, then program the back-off.
    fn seek_home(&mut self) -> Result<()> {
        self.cell.disarm_guard();
        // A trip that landed before the guard went quiet stands
        if self.cell.state() != SliderState::Homing {
            self.cell.arm_guard();
            return Ok(());
        }

        info!("Homing linear rail");
        self.cell.set_motors_enabled(true);
        self.cell.set_state(SliderState::Homing);
        self.sync_driver_enable()?;

        let speed = self
            .config
            .slide_rate_to_steps(f32::from(self.config.homing_speed_slide));
        let max_travel = Steps(
            i64::from(self.config.rail_length) * i64::from(self.config.slide_steps_per_mm),
        );
        self.slide.set_speed(speed);
        self.slide
            .set_acceleration(self.config.slide_rate_to_steps(self.config.default_slider_accel));

        let found = match self.slide.seek_home(
            &mut self.home_switch,
            HOME_SWITCH_ACTIVE,
            self.config.homing_direction,
            speed,
            max_travel,
        ) {
            Ok(found) => found,
            Err(e) => {
                self.fail_homing()?;
                return Err(e);
            }
        };

        if !found {
            return self.fail_homing();
        }

        // Zero at the switch, then step clear of it
        self.slide.set_current_position(Steps(0));
        let backoff = libm::roundf(HOMING_BACKOFF_MM * f32::from(self.config.slide_steps_per_mm)) as i64;
        let away = -i64::from(self.config.homing_direction.value());
        self.slide.set_target(AxisTarget::Absolute(Steps(away * backoff)));
        self.backing_off = true;
        Ok(())
    }

    fn finish_homing(&mut self) -> Result<()> {
        self.backing_off = false;
        self.slide.set_current_position(Steps(0));

        if !self.cell.transition(SliderState::Homing, SliderState::Ready) {
            warn!("Homing interrupted in {}", self.cell.state().name());
            self.cell.arm_guard();
            return Ok(());
        }

        self.homed = true;
        self.cell.release_drivers();
        self.sync_driver_enable()?;
        self.cell.arm_guard();

        info!("Homing done");
        Ok(())
    }

    fn fail_homing(&mut self) -> Result<()> {
        error!("Failed homing: switch not found within rail length");

        self.backing_off = false;
        self.homed = false;
        self.fault = Some(Fault::HomingFailed);

        self.cell.set_motors_enabled(false);
        self.cell.arm_guard();
        self.sync_driver_enable()
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    fn tick_step_finished(&mut self, now: core::time::Duration) -> Result<()> {
        match self.pause {
            None => self.run_step_iteration(now),
            Some(StepPause::Settling { until, target }) => {
                if until.is_due(now) {
                    self.shutter.fire(now)?;
                    self.pause = Some(StepPause::expose(now, &self.config.stepping, target));
                }
                Ok(())
            }
            Some(StepPause::Exposing { until, target }) => {
                if until.is_due(now) {
                    self.pause = None;
                    self.begin_step(target);
                }
                Ok(())
            }
        }
    }

    /// Count the next step and start its settle pause, or end the session.
    fn run_step_iteration(&mut self, now: core::time::Duration) -> Result<()> {
        let outcome = match self.session.as_mut() {
            Some(session) => session.next(),
            None => StepOutcome::Finished,
        };

        match outcome {
            StepOutcome::Finished => {
                self.end_stepping();
                self.sync_driver_enable()
            }
            StepOutcome::Step { index, target } => {
                debug!("Step {} settling", index);
                self.pause = Some(StepPause::settle(now, &self.config.stepping, target));
                Ok(())
            }
        }
    }

    fn begin_step(&mut self, target: Millimeters) {
        if !self
            .cell
            .transition(SliderState::StepFinished, SliderState::Stepping)
        {
            return;
        }

        let stepping = &self.config.stepping;
        let speed = self.config.slide_rate_to_steps(stepping.step_speed);
        let accel = self.config.slide_rate_to_steps(stepping.step_accel);

        self.slide.set_speed(speed);
        self.slide.set_acceleration(accel);
        self.slide
            .set_target(AxisTarget::Absolute(self.config.slide_to_steps(target)));

        if let Some(session) = self.session.as_ref() {
            info!(
                "Started step {} / {}, target {}",
                session.index(),
                session.ceiling(),
                target.0
            );
        }
    }

    fn end_stepping(&mut self) {
        self.session = None;
        self.pause = None;
        if self.cell.transition(SliderState::StepFinished, SliderState::Idle) {
            self.cell.release_drivers();
            info!("Reached final step, stopped stepping");
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    fn ensure_not_faulted(&self) -> Result<()> {
        if self.fault.is_some() {
            return Err(CommandError::Faulted.into());
        }
        Ok(())
    }

    fn ensure_at_rest(&self) -> Result<()> {
        self.ensure_not_faulted()?;
        let state = self.cell.state();
        if state.is_busy() {
            return Err(CommandError::Busy(state).into());
        }
        Ok(())
    }

    /// Returns the resting state the move starts from.
    fn ensure_can_move(&self) -> Result<SliderState> {
        self.ensure_at_rest()?;
        if !self.cell.motors_enabled() {
            return Err(CommandError::MotorsDisabled.into());
        }
        Ok(self.cell.state())
    }

    /// Leave resting state `from` for `to`.
    ///
    /// Fails with `MotorsDisabled` when the endstop guard dropped the
    /// drivers since `from` was read.
    fn begin(&self, from: SliderState, to: SliderState) -> Result<()> {
        if self.cell.transition(from, to) {
            return Ok(());
        }
        warn!("{} refused, now {}", to.name(), self.cell.state().name());
        Err(CommandError::MotorsDisabled.into())
    }

    /// Enable the drivers; the slider drops to `Idle`.
    pub fn enable_motors(&mut self) -> Result<()> {
        self.ensure_not_faulted()?;
        self.cell.set_motors_enabled(true);
        self.sync_driver_enable()
    }

    /// Disable the drivers; the slider drops to `MotorsOff`.
    ///
    /// Always accepted. Interrupts any move in flight.
    pub fn disable_motors(&mut self) -> Result<()> {
        self.cell.set_motors_enabled(false);
        self.sync_driver_enable()
    }

    /// Request a state by ordinal.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidState` for ordinals at or beyond the
    /// sentinels; the state is left unchanged.
    pub fn request_state(&mut self, ordinal: u8) -> Result<SliderState> {
        self.ensure_not_faulted()?;
        Ok(self.cell.try_set_state(ordinal)?)
    }

    /// Store the start bookmark.
    pub fn set_start(&mut self, slide: Millimeters, pan: Degrees) -> Result<()> {
        self.ensure_at_rest()?;
        self.start = self.bookmark_at(slide, pan)?;
        Ok(())
    }

    /// Store the end bookmark.
    pub fn set_end(&mut self, slide: Millimeters, pan: Degrees) -> Result<()> {
        self.ensure_at_rest()?;
        self.end = self.bookmark_at(slide, pan)?;
        Ok(())
    }

    /// Store the current position as the start bookmark.
    pub fn capture_start(&mut self) -> Result<()> {
        self.ensure_at_rest()?;
        self.start = self.current_bookmark();
        Ok(())
    }

    /// Store the current position as the end bookmark.
    pub fn capture_end(&mut self) -> Result<()> {
        self.ensure_at_rest()?;
        self.end = self.current_bookmark();
        Ok(())
    }

    fn bookmark_at(&self, slide: Millimeters, pan: Degrees) -> Result<Bookmark> {
        if !slide.0.is_finite() {
            return Err(CommandError::InvalidParameter("slide").into());
        }
        if !pan.0.is_finite() {
            return Err(CommandError::InvalidParameter("pan").into());
        }
        Ok(Bookmark {
            slide: self.config.slide_to_steps(slide),
            pan: self.config.pan_to_steps(pan),
        })
    }

    fn current_bookmark(&self) -> Bookmark {
        Bookmark {
            slide: self.slide.current_position(),
            pan: self.pan.current_position(),
        }
    }

    /// Set the start-to-end traverse time. Zero is treated as one second.
    pub fn set_duration(&mut self, secs: u32) -> Result<()> {
        self.ensure_at_rest()?;
        self.duration_secs = secs.max(1);
        Ok(())
    }

    /// Position on the start bookmarks, then traverse to the end bookmarks.
    pub fn start_motion(&mut self) -> Result<()> {
        let from = self.ensure_can_move()?;
        self.begin(from, SliderState::MovingToStart)?;

        let slide_speed = self.config.slide_rate_to_steps(self.config.default_slider_speed);
        let slide_accel = self.config.slide_rate_to_steps(self.config.default_slider_accel);
        let pan_speed = self.config.pan_rate_to_steps(self.config.default_rotate_speed);
        let pan_accel = self.config.pan_rate_to_steps(self.config.default_rotate_accel);

        self.program_axes(
            AxisTarget::Absolute(self.start.slide),
            slide_speed,
            slide_accel,
            AxisTarget::Absolute(self.start.pan),
            pan_speed,
            pan_accel,
        );
        Ok(())
    }

    /// Start homing on the next tick. Enables the drivers.
    pub fn home(&mut self) -> Result<()> {
        self.ensure_at_rest()?;
        self.cell.set_motors_enabled(true);
        let started = self.begin(SliderState::Idle, SliderState::Homing);
        self.sync_driver_enable()?;
        started
    }

    /// Move both axes to absolute logical positions.
    pub fn move_absolute(&mut self, slide: AxisMove, pan: AxisMove) -> Result<()> {
        let from = self.ensure_can_move()?;
        slide.validate()?;
        pan.validate()?;

        let slide_target = AxisTarget::Absolute(self.config.slide_to_steps(Millimeters(slide.position)));
        let pan_target = AxisTarget::Absolute(self.config.pan_to_steps(Degrees(pan.position)));
        self.start_direct_move(from, slide_target, slide.rates(), pan_target, pan.rates())
    }

    /// Move both axes by logical offsets.
    pub fn move_relative(&mut self, slide: AxisMove, pan: AxisMove) -> Result<()> {
        let from = self.ensure_can_move()?;
        slide.validate()?;
        pan.validate()?;

        let slide_target = AxisTarget::Relative(self.config.slide_to_steps(Millimeters(slide.position)));
        let pan_target = AxisTarget::Relative(self.config.pan_to_steps(Degrees(pan.position)));
        self.start_direct_move(from, slide_target, slide.rates(), pan_target, pan.rates())
    }

    /// Move both axes to a stored bookmark.
    pub fn move_to_bookmark(
        &mut self,
        which: BookmarkKind,
        slide: AxisRates,
        pan: AxisRates,
    ) -> Result<()> {
        let from = self.ensure_can_move()?;
        slide.validate()?;
        pan.validate()?;

        let bookmark = match which {
            BookmarkKind::Start => self.start,
            BookmarkKind::End => self.end,
        };
        self.start_direct_move(
            from,
            AxisTarget::Absolute(bookmark.slide),
            slide,
            AxisTarget::Absolute(bookmark.pan),
            pan,
        )
    }

    fn start_direct_move(
        &mut self,
        from: SliderState,
        slide: AxisTarget,
        slide_rates: AxisRates,
        pan: AxisTarget,
        pan_rates: AxisRates,
    ) -> Result<()> {
        self.begin(from, SliderState::Working)?;

        let slide_speed = self.config.slide_rate_to_steps(slide_rates.speed);
        let slide_accel = self.config.slide_rate_to_steps(slide_rates.accel);
        let pan_speed = self.config.pan_rate_to_steps(pan_rates.speed);
        let pan_accel = self.config.pan_rate_to_steps(pan_rates.accel);

        self.program_axes(slide, slide_speed, slide_accel, pan, pan_speed, pan_accel);
        Ok(())
    }

    /// Cut `total` millimeters of slide travel into `step` millimeter moves
    /// with a shutter release between each. Enables the drivers.
    pub fn start_stepping(&mut self, total: Millimeters, step: Millimeters) -> Result<()> {
        self.ensure_at_rest()?;

        let baseline = self.slide_position();
        let session = SteppingSession::start(total, step, baseline)?;
        info!("Start stepping: {} steps", session.ceiling());

        self.cell.set_motors_enabled(true);
        let started = self.begin(SliderState::Idle, SliderState::StepFinished);
        self.sync_driver_enable()?;
        started?;

        self.session = Some(session);
        self.pause = None;

        let now = self.clock.elapsed();
        self.run_step_iteration(now)
    }

    /// Make the current pan angle the pan zero.
    pub fn set_pan_home(&mut self) -> Result<()> {
        self.ensure_at_rest()?;
        self.pan.set_current_position(Steps(0));
        Ok(())
    }

    /// Validate, apply and persist one configuration field.
    ///
    /// # Errors
    ///
    /// Rejected values leave the configuration untouched. So does a failed
    /// write: the previous value is restored before the store error is
    /// returned, keeping memory and storage in step.
    pub fn update_config<S: SettingsStore>(
        &mut self,
        field: ConfigField,
        value: f32,
        store: &mut S,
    ) -> Result<()> {
        self.ensure_at_rest()?;
        let previous = self.config.clone();
        self.config.update(field, value)?;

        if let Err(e) = store.save(&StoredSettings::current(self.config.clone())) {
            warn!("Failed to persist {}, keeping previous value", field.name());
            self.config = previous;
            return Err(e);
        }
        info!("Updated {} to {}", field.name(), value);
        Ok(())
    }

    /// Change the rail length and persist it.
    pub fn update_rail_length<S: SettingsStore>(&mut self, rail_length_mm: u32, store: &mut S) -> Result<()> {
        self.update_config(ConfigField::RailLength, rail_length_mm as f32, store)
    }
}
