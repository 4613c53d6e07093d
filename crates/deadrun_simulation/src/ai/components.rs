//! Компоненты боевого AI врага

use bevy::prelude::*;

use crate::physics::LayerMask;

/// Состояния боевого AI
///
/// Выход из Attacking - только по animation event (AttackPhaseEvent),
/// не по внутреннему таймеру.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum EnemyState {
    /// Патруль: случайные точки, поиск целей
    Patrol,
    /// Преследование живой цели
    Tracking,
    /// Замах: навигация остановлена, доворачиваемся к цели
    AttackBegin,
    /// Активная фаза атаки: sweep каждый тик
    Attacking,
}

/// Боевой AI врага (melee)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct EnemyAI {
    pub state: EnemyState,

    /// Текущая цель: слабая ссылка, валидность перепроверяется каждый
    /// decision тик (умерла/пропала - сбрасываем)
    pub target: Option<Entity>,

    /// Скорость преследования (м/с)
    pub run_speed: f32,
    /// Скорость патруля (м/с)
    pub patrol_speed: f32,
    /// Радиус выбора патрульной точки (метры)
    pub patrol_radius: f32,

    /// Урон melee-атаки
    pub damage: f32,
    /// Радиус сферы атаки (метры)
    pub attack_radius: f32,
    /// Локальный offset центра атаки (перед грудью)
    pub attack_root_offset: Vec3,

    /// Горизонтальный угол обзора (градусы)
    pub field_of_view: f32,
    /// Дальность обзора (метры)
    pub view_distance: f32,
    /// Высота глаз над origin (метры)
    pub eye_height: f32,
    /// Слои, в которых ищем цели
    pub what_is_target: LayerMask,

    /// Время сглаживания разворота к цели (секунды)
    pub turn_smooth_time: f32,
    pub turn_smooth_velocity: f32,

    /// Отсчёт до следующего decision тика (секунды)
    pub decision_timer: f32,

    /// Цели, уже задетые текущим взмахом. Чистится при входе в Attacking:
    /// один взмах - максимум один DamageRequest на цель.
    pub last_attacked_targets: Vec<Entity>,
}

impl Default for EnemyAI {
    fn default() -> Self {
        Self::walker()
    }
}

impl EnemyAI {
    /// Рядовой пеший враг
    pub fn walker() -> Self {
        Self {
            state: EnemyState::Patrol,
            target: None,
            run_speed: 10.0,
            patrol_speed: 3.0,
            patrol_radius: 20.0,
            damage: 30.0,
            attack_radius: 2.0,
            attack_root_offset: Vec3::new(0.0, 1.0, -0.8),
            field_of_view: 50.0,
            view_distance: 10.0,
            eye_height: 1.6,
            what_is_target: LayerMask::PLAYER,
            turn_smooth_time: 0.1,
            turn_smooth_velocity: 0.0,
            decision_timer: 0.0,
            last_attacked_targets: Vec::new(),
        }
    }

    /// Дистанция входа в атаку: вынос центра атаки + её радиус
    pub fn attack_distance(&self) -> f32 {
        Vec3::new(self.attack_root_offset.x, 0.0, self.attack_root_offset.z).length()
            + self.attack_radius
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }
}
