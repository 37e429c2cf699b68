// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod notification;
pub mod recipient;
pub mod segment;
pub mod user;

pub use notification::{Notification, StorylineUpdate, DATA_UPLOAD_REASON};
pub use recipient::RecipientPhone;
pub use segment::{DailySegments, Location, Place, Segment};
pub use user::User;
