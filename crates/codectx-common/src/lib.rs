// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

pub mod error;
pub mod types;

pub use error::{Error, Result};
