//! AI события: стык с анимационным слоем
//!
//! Анимация атаки авторится снаружи; активная фаза взмаха начинается и
//! заканчивается на authored-кадрах, о которых animation driver сообщает
//! через AttackPhaseEvent. Симуляция в ответ на замах публикует
//! AttackWindupStarted, чтобы драйвер запустил анимацию.

use bevy::prelude::*;

/// Фаза melee-взмаха (приходит от animation driver)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum AttackPhase {
    /// Кадр начала удара: hitbox включается
    Enable,
    /// Кадр конца удара: hitbox выключается
    Disable,
}

/// Событие от animation driver: анимация дошла до authored-кадра
#[derive(Event, Debug, Clone)]
pub struct AttackPhaseEvent {
    pub entity: Entity,
    pub phase: AttackPhase,
}

/// Событие наружу: враг начал замах (пора играть анимацию атаки)
#[derive(Event, Debug, Clone)]
pub struct AttackWindupStarted {
    pub entity: Entity,
    pub target: Entity,
}
