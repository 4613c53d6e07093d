//! Combat подсистема: оружие + урон
//!
//! ECS ответственность:
//! - State machines: WeaponState (Ready/Empty/Reloading), Health
//! - Правила: cooldown, разброс, перенос патронов, floor здоровья
//! - События: WeaponFired, DamageApplied, EntityDied
//!
//! Презентация (трассеры, хит-флэши, звуки) подписывается на события
//! снаружи, симуляция про неё не знает.

use bevy::prelude::*;

use crate::SimStep;

pub mod damage;
pub mod spread;
pub mod weapon;

// Re-export основных типов
pub use damage::{
    apply_damage, handle_actor_death, DamageApplied, DamageMessage, DamageRequest, Dead, EntityDied,
};
pub use spread::random_normal;
pub use weapon::{
    process_fire_intents, process_reload_intents, tick_weapons, RangedWeapon, WeaponFireIntent,
    WeaponFired, WeaponReloadIntent, WeaponState,
};

/// Combat Plugin
///
/// Порядок выполнения (FixedUpdate):
/// 1. Decide: tick_weapons - завершение перезарядки и затухание разброса
///    до любых выстрелов тика
/// 2. Act: process_reload_intents -> process_fire_intents
/// 3. Resolve: apply_damage -> handle_actor_death
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<DamageRequest>()
            .add_event::<DamageApplied>()
            .add_event::<EntityDied>()
            .add_event::<WeaponFireIntent>()
            .add_event::<WeaponReloadIntent>()
            .add_event::<WeaponFired>();

        app.add_systems(FixedUpdate, tick_weapons.in_set(SimStep::Decide));
        app.add_systems(
            FixedUpdate,
            (process_reload_intents, process_fire_intents)
                .chain()
                .in_set(SimStep::Act),
        );
        app.add_systems(
            FixedUpdate,
            (apply_damage, handle_actor_death).chain().in_set(SimStep::Resolve),
        );
    }
}
