//! A status-bar indicator for window-manager spaces: lays out one slot per
//! visible space, draws the icon through a single-entry cache, probes window
//! occupancy in the background, and routes clicks back to spaces.

pub mod actor;
pub mod common;
pub mod layout_engine;
pub mod model;
pub mod sys;
pub mod ui;

#[cfg(test)]
mod testing;
