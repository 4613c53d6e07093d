//! Базовые компоненты акторов: Actor, Health, Muzzle

use bevy::prelude::*;

/// Фракция игрока и его союзников
pub const FACTION_PLAYER: u64 = 1;
/// Фракция врагов
pub const FACTION_ENEMY: u64 = 2;

/// Актор (игрок, враг) - базовый компонент для живых существ
///
/// Автоматически добавляет Health через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health)]
pub struct Actor {
    /// Stable ID фракции
    pub faction_id: u64,
}

/// Здоровье актора
///
/// Инварианты: 0 ≤ current ≤ max; dead монотонен (после смерти актор
/// не оживает, повторный урон - no-op).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    pub dead: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            dead: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Применяет урон. false без эффектов, если актор уже мёртв.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }

        self.current = (self.current - amount).max(0.0);
        if self.current <= 0.0 {
            self.current = 0.0;
            self.dead = true;
        }
        true
    }

    /// Лечение. Мёртвых не лечим.
    pub fn heal(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }
        self.current = (self.current + amount).min(self.max);
        true
    }
}

/// Точка выстрела (дуло): локальный offset от origin актора
///
/// Forward актора в Bevy - это -Z, поэтому offset.z отрицательный.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Muzzle {
    pub offset: Vec3,
}

impl Default for Muzzle {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, 1.4, -0.5),
        }
    }
}
