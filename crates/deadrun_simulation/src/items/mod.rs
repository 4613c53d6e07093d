//! Подбираемые предметы
//!
//! Триггер подбора (коллизия с игроком) живёт в engine adapter, симуляция
//! получает готовое событие ItemUsed.

use bevy::prelude::*;

use crate::combat::weapon::RangedWeapon;
use crate::SimStep;

/// Пачка патронов: пополняет резерв оружия
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct AmmoPack {
    pub ammo: u32,
}

impl Default for AmmoPack {
    fn default() -> Self {
        Self { ammo: 30 }
    }
}

/// Событие: актор использовал предмет
#[derive(Event, Debug, Clone)]
pub struct ItemUsed {
    pub item: Entity,
    pub user: Entity,
}

/// Система: применение предметов
pub fn apply_item_use(
    mut commands: Commands,
    mut events: EventReader<ItemUsed>,
    packs: Query<&AmmoPack>,
    mut weapons: Query<&mut RangedWeapon>,
) {
    for event in events.read() {
        let Ok(pack) = packs.get(event.item) else {
            continue;
        };
        let Ok(mut weapon) = weapons.get_mut(event.user) else {
            continue;
        };

        weapon.ammo_remain = weapon.ammo_remain.saturating_add(pack.ammo);
        crate::logger::log(&format!("{:?} picked up {} rounds", event.user, pack.ammo));

        if let Ok(mut entity_commands) = commands.get_entity(event.item) {
            entity_commands.despawn();
        }
    }
}

/// Plugin: предметы в фазе Resolve
pub struct ItemPlugin;

impl Plugin for ItemPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ItemUsed>().add_systems(
            FixedUpdate,
            apply_item_use
                .after(crate::combat::damage::handle_actor_death)
                .in_set(SimStep::Resolve),
        );
    }
}
