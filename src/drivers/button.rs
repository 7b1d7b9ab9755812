//! Polled, debounced push-button driver.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up. The input loop calls
//! [`DebouncedButton::poll`] at a fixed rate; a level change is reported
//! only after the pin has held the new level for the debounce time.
//!
//! ```text
//!   raw:   ‾‾‾‾\_/‾\___________________/‾\_/‾‾‾‾‾‾‾‾‾‾
//!   edge:               Pressed ▲                Released ▲
//!                     (+debounce)              (+debounce)
//! ```
//!
//! Any `embedded-hal` 1.0 [`InputPin`] works, which keeps the driver
//! testable on the host with a fake pin.

use embedded_hal::digital::InputPin;

/// Debounced level transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Stable,
    Settling { since_ms: u32 },
}

pub struct DebouncedButton<P> {
    pin: P,
    debounce_ms: u32,
    pressed: bool,
    state: DebounceState,
}

impl<P: InputPin> DebouncedButton<P> {
    /// Wrap `pin`. The button is assumed released at start.
    pub fn new(pin: P, debounce_ms: u32) -> Self {
        Self {
            pin,
            debounce_ms,
            pressed: false,
            state: DebounceState::Stable,
        }
    }

    /// Sample the pin. `now_ms` is a monotonic millisecond clock.
    pub fn poll(&mut self, now_ms: u32) -> Result<Option<Edge>, P::Error> {
        // Active-low: a closed switch pulls the line to ground.
        let raw_pressed = self.pin.is_low()?;

        match self.state {
            DebounceState::Stable => {
                if raw_pressed != self.pressed {
                    self.state = DebounceState::Settling { since_ms: now_ms };
                }
                Ok(None)
            }

            DebounceState::Settling { since_ms } => {
                if raw_pressed == self.pressed {
                    // Bounced back before settling.
                    self.state = DebounceState::Stable;
                    return Ok(None);
                }
                if now_ms.wrapping_sub(since_ms) < self.debounce_ms {
                    return Ok(None);
                }
                self.state = DebounceState::Stable;
                self.pressed = raw_pressed;
                Ok(Some(if raw_pressed {
                    Edge::Pressed
                } else {
                    Edge::Released
                }))
            }
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}
