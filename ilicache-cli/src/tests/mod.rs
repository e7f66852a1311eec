//! Shared test harness modules for the ilicache CLI.

use super::*;

mod helpers;
mod unit;
