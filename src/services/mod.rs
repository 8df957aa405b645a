// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod fitbit;
pub mod gateway;
pub mod sync;

pub use fitbit::{ClientCredentials, FitbitClient, FitbitResource};
pub use gateway::{FetchTarget, GatewayAction, GatewayRequest, GatewayService};
pub use sync::{DaySyncReport, SyncOutcome, SyncRange, SyncService};
