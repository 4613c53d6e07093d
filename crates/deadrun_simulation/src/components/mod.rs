//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: базовые характеристики (faction, health, точка выстрела)
//! - оружие живёт в combat::weapon, AI в ai::components,
//!   навигация в navigation, объёмы коллизий в physics

pub mod actor;

pub use actor::*;
