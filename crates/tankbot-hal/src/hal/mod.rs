// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Drive pair and accessory motor traits.
pub mod motor;
/// Speaker and indicator light traits.
pub mod output;
/// Touch, color and infrared sensor traits.
pub mod sensor;

/// Device trait definitions for the tracked robot
///
/// Each physical unit gets one trait so backends can be mixed and tests can
/// substitute any single device:
/// - Actuation (TankDrive, AccessoryMotor)
/// - Point-in-time sensing (TouchSensor, ColorSensor, InfraredSensor)
/// - Feedback (Speaker, Indicators)
///
/// All traits are `Send + Sync`: every behavior loop runs on its own thread
/// and shares the same device handles.
pub use motor::{AccessoryMotor, Braking, Completion, Speed, TankDrive};
pub use output::{IndicatorPattern, Indicators, LedColor, LedGroup, Speaker};
pub use sensor::{ColorSensor, InfraredSensor, IrMode, RemoteButtons, RemoteSignal, TouchSensor};
