//! Defense system - Armor mitigation

mod armor;

pub use armor::{armor_reduction, calculate_armor_mitigation};
