//! Урон и смерть
//!
//! DamageMessage - value type (Copy): получатели работают со своей копией
//! и не могут повлиять друг на друга через общую ссылку.
//!
//! Поток: DamageRequest -> apply_damage -> DamageApplied (+ EntityDied при
//! смерти) -> посмертная уборка. Урон по мёртвому - тихий no-op.

use bevy::prelude::*;

use crate::combat::weapon::RangedWeapon;
use crate::components::Health;
use crate::navigation::NavAgent;
use crate::physics::BodyCollider;

/// Сообщение об уроне (передаётся по значению)
#[derive(Debug, Clone, Copy, Reflect)]
pub struct DamageMessage {
    /// Кто нанёс урон
    pub damager: Entity,
    /// Величина урона
    pub amount: f32,
    /// Точка попадания (мир)
    pub hit_point: Vec3,
    /// Нормаль в точке попадания
    pub hit_normal: Vec3,
}

/// Запрос на применение урона к цели
#[derive(Event, Debug, Clone)]
pub struct DamageRequest {
    pub target: Entity,
    pub message: DamageMessage,
}

/// Урон применён (хит-эффекты, звуки, реакция AI)
///
/// Пишется только при успешном применении: по мёртвой цели события нет.
#[derive(Event, Debug, Clone)]
pub struct DamageApplied {
    pub target: Entity,
    pub message: DamageMessage,
    /// Цель умерла от этого урона
    pub fatal: bool,
}

/// Актор умер (ровно один раз на актора)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Маркер: актор мёртв. Системы AI и движения фильтруют Without<Dead>.
#[derive(Component, Debug, Default)]
pub struct Dead;

/// Система: применение DamageRequest к Health
pub fn apply_damage(
    mut requests: EventReader<DamageRequest>,
    mut targets: Query<&mut Health>,
    mut applied_events: EventWriter<DamageApplied>,
    mut died_events: EventWriter<EntityDied>,
) {
    for request in requests.read() {
        let Ok(mut health) = targets.get_mut(request.target) else {
            continue;
        };

        let was_alive = health.is_alive();
        if !health.apply_damage(request.message.amount) {
            continue;
        }

        let fatal = was_alive && !health.is_alive();
        applied_events.write(DamageApplied {
            target: request.target,
            message: request.message,
            fatal,
        });

        if fatal {
            died_events.write(EntityDied {
                entity: request.target,
                killer: Some(request.message.damager),
            });
            crate::logger::log_info(&format!(
                "{:?} killed by {:?}",
                request.target, request.message.damager
            ));
        }
    }
}

/// Система: посмертная уборка
///
/// Навигация останавливается навсегда, объём коллизии снимается (труп не
/// блокирует лучи и не ловит урон), незавершённая перезарядка отменяется.
pub fn handle_actor_death(
    mut commands: Commands,
    mut died_events: EventReader<EntityDied>,
    mut agents: Query<&mut NavAgent>,
    mut weapons: Query<&mut RangedWeapon>,
) {
    for event in died_events.read() {
        if let Ok(mut agent) = agents.get_mut(event.entity) {
            agent.is_stopped = true;
            agent.destination = None;
            agent.velocity = Vec3::ZERO;
        }

        if let Ok(mut weapon) = weapons.get_mut(event.entity) {
            weapon.cancel_reload();
        }

        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.insert(Dead);
            entity_commands.remove::<BodyCollider>();
        }

        crate::logger::log(&format!("Death cleanup for {:?}", event.entity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_message_is_copy() {
        let message = DamageMessage {
            damager: Entity::PLACEHOLDER,
            amount: 25.0,
            hit_point: Vec3::new(1.0, 2.0, 3.0),
            hit_normal: Vec3::Y,
        };

        // Копия независима от оригинала
        let mut copy = message;
        copy.amount = 0.0;
        assert_eq!(message.amount, 25.0);
    }

    #[test]
    fn test_damage_applied_event() {
        let event = DamageApplied {
            target: Entity::PLACEHOLDER,
            message: DamageMessage {
                damager: Entity::PLACEHOLDER,
                amount: 30.0,
                hit_point: Vec3::ZERO,
                hit_normal: Vec3::Z,
            },
            fatal: false,
        };

        assert_eq!(event.message.amount, 30.0);
        assert!(!event.fatal);
    }
}
