//! Loaders for the four input sources.
//!
//! Each loader turns decoded CSV into a lookup structure that is built once
//! and then only read during matching.

pub mod consist;
pub mod delays;
pub mod roster;
pub mod schedule;
pub mod table;

pub use consist::{ConsistEntry, ConsistLayout, TripEquipmentMap};
pub use delays::{DelayColumns, DelayLog, load_delay_log};
pub use roster::{EquipmentVendorMap, RosterLayout, RosterParse, parse_roster};
pub use schedule::{ScheduleColumns, ScheduledServiceIndex};
pub use table::{Table, read_grid};
