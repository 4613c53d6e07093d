//! Общие утилиты симуляции

pub mod smoothing;

pub use smoothing::{delta_angle, smooth_damp, smooth_damp_angle, yaw_towards};
