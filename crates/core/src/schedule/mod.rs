// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler: tick source and start-request delivery

mod delivery;
mod tick;

pub use delivery::{Delivery, DeliveryEvent, DeliveryState};
pub use tick::{Tick, TickSchedule};
