// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use std::time::Duration;

use crate::error::DeviceResult;
use crate::hal::Completion;

/// Brick LED colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Black,
    Red,
    Green,
    Amber,
    Orange,
    Yellow,
}

impl LedColor {
    /// (red, green) brightness fractions of the two-color LED
    pub fn mix(self) -> (f32, f32) {
        match self {
            LedColor::Black => (0.0, 0.0),
            LedColor::Red => (1.0, 0.0),
            LedColor::Green => (0.0, 1.0),
            LedColor::Amber => (1.0, 1.0),
            LedColor::Orange => (1.0, 0.5),
            LedColor::Yellow => (0.1, 1.0),
        }
    }
}

/// Left or right LED of the brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedGroup {
    Left,
    Right,
}

/// What the indicator lights should show
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorPattern {
    /// Both LEDs one color
    Solid(LedColor),
    /// One group one color, the other left as is
    Group(LedGroup, LedColor),
    /// Alternate `first` on the left/`second` on the right with the swapped
    /// assignment every `period`, for `duration`, then switch off
    PoliceLights {
        first: LedColor,
        second: LedColor,
        period: Duration,
        duration: Duration,
    },
}

pub trait Speaker: Send + Sync {
    /// Play a WAV file at `volume` percent
    fn play_file(&self, path: &Path, volume: u8, completion: Completion) -> DeviceResult<()>;
}

/// The brick status LEDs
///
/// Animated patterns run in the background; setting a new pattern or
/// clearing replaces any running animation.
pub trait Indicators: Send + Sync {
    fn set_pattern(&self, pattern: IndicatorPattern) -> DeviceResult<()>;

    /// Switch all LEDs off
    fn clear(&self) -> DeviceResult<()>;
}
