//! Навигация: интерфейсный компонент + headless backend
//!
//! Pathfinding внешний (navmesh живёт в engine adapter). NavAgent - это
//! интерфейс: destination/speed/stopping_distance/is_stopped пишет
//! симуляция, движение исполняет внешний агент. Headless backend
//! drive_nav_agents ведёт актора к цели по прямой, этого достаточно для
//! тестов и открытых арен.

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::combat::Dead;
use crate::shared::yaw_towards;
use crate::SimStep;

/// Навигационный агент
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct NavAgent {
    /// Текущая цель движения (None = стоим)
    pub destination: Option<Vec3>,
    /// Скорость (м/с); AI переключает patrol/run
    pub speed: f32,
    /// Дистанция остановки до цели (метры)
    pub stopping_distance: f32,
    /// Полная остановка (attack states, смерть)
    pub is_stopped: bool,
    /// Фактическая скорость за последний тик (м/с), для melee sweep
    pub velocity: Vec3,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            destination: None,
            speed: 3.0,
            stopping_distance: 0.0,
            is_stopped: false,
            velocity: Vec3::ZERO,
        }
    }
}

impl NavAgent {
    pub fn set_destination(&mut self, point: Vec3) {
        self.destination = Some(point);
    }

    /// Оставшаяся дистанция до цели по прямой (0 если цели нет)
    pub fn remaining_distance(&self, position: Vec3) -> f32 {
        match self.destination {
            Some(destination) => horizontal(destination - position).length(),
            None => 0.0,
        }
    }
}

fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Случайная достижимая точка в диске вокруг center
///
/// Headless-аналог sample-запроса к navmesh: плоскость y == 0 считается
/// проходимой целиком.
pub fn sample_reachable_point(rng: &mut ChaCha8Rng, center: Vec3, radius: f32) -> Vec3 {
    let angle = rng.gen::<f32>() * std::f32::consts::TAU;
    let distance = rng.gen::<f32>() * radius;
    Vec3::new(
        center.x + angle.cos() * distance,
        0.0,
        center.z + angle.sin() * distance,
    )
}

/// Система: headless движение агентов к destination по прямой
///
/// Агент разворачивается по ходу движения; остановка - на
/// stopping_distance от цели, без перелёта.
pub fn drive_nav_agents(
    mut agents: Query<(&mut NavAgent, &mut Transform), Without<Dead>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }

    for (mut agent, mut transform) in agents.iter_mut() {
        agent.velocity = Vec3::ZERO;
        if agent.is_stopped {
            continue;
        }
        let Some(destination) = agent.destination else {
            continue;
        };

        let to_target = horizontal(destination - transform.translation);
        let distance = to_target.length();
        if distance <= agent.stopping_distance.max(1e-3) {
            continue;
        }

        let direction = to_target / distance;
        let step = (agent.speed * delta).min(distance - agent.stopping_distance);
        transform.translation += direction * step;
        transform.rotation = Quat::from_rotation_y(yaw_towards(direction));
        agent.velocity = direction * (step / delta);
    }
}

/// Plugin: headless движение в фазе Move
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, drive_nav_agents.in_set(SimStep::Move));
    }
}
