//! Stop-motion session on a simulated slider.
//!
//! Builds a slider from simulated axes and a manual clock, homes it, then
//! runs a short stepping session and prints the status as it goes.
//!
//! No hardware is needed; the clock is advanced by hand.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};
use slider_motion::config::MemoryStore;
use slider_motion::time::ManualClock;
use slider_motion::{
    load_settings, Command, ControlCell, SimulatedAxis, SimulatedSwitch,
    SliderBuilder, SliderState, Steps,
};

/// Output pin that only remembers its level.
struct MockPin {
    state: bool,
}

impl MockPin {
    fn new() -> Self {
        Self { state: false }
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state = true;
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state = false;
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

static CELL: ControlCell = ControlCell::new();

fn main() {
    println!("=== Stop-Motion Example ===\n");

    let clock = ManualClock::new();
    let mut store = MemoryStore::new();
    let config = load_settings(&mut store);

    let mut slider = SliderBuilder::new()
        .cell(&CELL)
        .config(config)
        .slide_axis(
            SimulatedAxis::new(200)
                .with_position(Steps(12_000))
                .with_home_at(Steps(0)),
        )
        .pan_axis(SimulatedAxis::new(200))
        .enable_pin(MockPin::new())
        .shutter_pin(MockPin::new())
        .status_led(MockPin::new())
        .home_switch(SimulatedSwitch::new(PinState::High))
        .clock(&clock)
        .build()
        .expect("Failed to build slider");

    println!("Initial state: {}", slider.state());

    // Homing blocks while seeking, then backs off over a few ticks
    slider
        .execute(Command::Home, &mut store)
        .expect("Homing rejected");
    while slider.state() != SliderState::Ready {
        clock.advance_ms(10);
        slider.tick().expect("tick failed");
    }
    println!("Homed: {:?}\n", slider.status());

    slider
        .execute(
            Command::StartStepping {
                total_distance: 20.0,
                step_size: 5.0,
            },
            &mut store,
        )
        .expect("Stepping rejected");

    let mut released = 0;
    while slider.state() != SliderState::Idle {
        clock.advance_ms(50);
        slider.tick().expect("tick failed");

        if slider.shutter_releases() != released {
            released = slider.shutter_releases();
            println!(
                "Frame {} at {:.2} mm",
                released,
                slider.slide_position().value()
            );
        }
    }

    println!("\nSession finished after {} frames", released);
    println!("Final position: {:.2} mm", slider.slide_position().value());
    println!("Motors enabled: {}", slider.motors_enabled());
    println!("\n=== Example Complete ===");
}
