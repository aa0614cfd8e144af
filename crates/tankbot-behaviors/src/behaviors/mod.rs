// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Random drive while the beacon is on.
pub mod beacon_dance;
/// Object alarm with the IR sensor in proximity mode.
pub mod proximity_alert;
/// Foreground remote-controlled driving.
pub mod remote_drive;
/// Touch-triggered accessory action.
pub mod touch_blast;

pub use beacon_dance::BeaconDance;
pub use proximity_alert::ProximityAlert;
pub use remote_drive::{RemoteDrive, RemoteDriveState};
pub use touch_blast::{BlastOutcome, TouchBlast};
