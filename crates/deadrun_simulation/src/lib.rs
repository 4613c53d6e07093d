//! DEADRUN Simulation Core
//!
//! ECS-симуляция combat-ядра third-person shooter прототипа на Bevy 0.16.
//! Здесь живёт вся игровая логика: оружие, урон, восприятие, боевой AI.
//!
//! HYBRID ARCHITECTURE:
//! - ECS = strategic layer (game state, combat rules, AI решения)
//! - Engine adapter = tactical layer (рендер, анимации, ввод, navmesh) -
//!   вне этого crate; общается через компоненты-интерфейсы и события
//!
//! Headless backend'ы (SpatialSnapshot, drive_nav_agents) закрывают
//! интерфейсы мировых запросов и навигации для тестов и headless прогонов.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod items;
pub mod logger;
pub mod navigation;
pub mod perception;
pub mod physics;
pub mod player;
pub mod scenario;
pub mod shared;

// Re-export базовых типов для удобства
pub use ai::{AIPlugin, AttackPhase, AttackPhaseEvent, AttackWindupStarted, EnemyAI, EnemyState};
pub use combat::{
    CombatPlugin, DamageApplied, DamageMessage, DamageRequest, Dead, EntityDied, RangedWeapon,
    WeaponFireIntent, WeaponFired, WeaponReloadIntent, WeaponState,
};
pub use components::*;
pub use items::{AmmoPack, ItemUsed};
pub use navigation::NavAgent;
pub use physics::{BodyCollider, LayerMask, Obstacle, SpatialSnapshot};
pub use player::{AimSource, AimState, Shooter, ShooterControls};

/// Шаг симуляции: 60Hz fixed timestep
pub const SIM_DT: f32 = 1.0 / 60.0;

/// Фазы одного simulation tick
///
/// Жёсткий порядок: сначала переходы state machine, потом эффекты мировых
/// запросов (инвариант тика: перезарядка не может завершиться "посреди"
/// выстрела). Конфликтующие системы упорядочены явно ради детерминизма.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimStep {
    /// Пересборка SpatialSnapshot: мир, каким его видят запросы этого тика
    Snapshot,
    /// Переходы state machine (оружие, AI, aim state)
    Decide,
    /// Headless движение агентов
    Move,
    /// Эффекты: выстрелы, melee sweep, повороты
    Act,
    /// Применение урона, реакции, посмертная уборка
    Resolve,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .configure_sets(
                FixedUpdate,
                (
                    SimStep::Snapshot,
                    SimStep::Decide,
                    SimStep::Move,
                    SimStep::Act,
                    SimStep::Resolve,
                )
                    .chain(),
            )
            // Подсистемы (strategic layer)
            .add_plugins((
                physics::SpatialPlugin,
                navigation::NavigationPlugin,
                CombatPlugin,
                AIPlugin,
                player::PlayerShooterPlugin,
                items::ItemPlugin,
            ));

        // Детерминистичный RNG (seed по умолчанию, если хост не вставил свой)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// ManualDuration: каждый app.update() продвигает время ровно на SIM_DT,
/// поэтому прогон на N тиков воспроизводим бит-в-бит.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(
            std::time::Duration::from_secs_f64(SIM_DT as f64),
        ))
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Снапшот боевого состояния мира для сравнения детерминизма
///
/// Собирает Health, Transform, AI state и оружие в байты, сортируя по
/// Entity index.
pub fn combat_snapshot(world: &mut World) -> Vec<u8> {
    let mut snapshot = Vec::new();

    let mut health_query = world.query::<(Entity, &Health)>();
    let mut health_rows: Vec<_> = health_query.iter(world).collect();
    health_rows.sort_by_key(|(entity, _)| entity.index());
    for (entity, health) in health_rows {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(&health.current.to_le_bytes());
        snapshot.push(health.dead as u8);
    }

    let mut transform_query = world.query::<(Entity, &Transform)>();
    let mut transform_rows: Vec<_> = transform_query.iter(world).collect();
    transform_rows.sort_by_key(|(entity, _)| entity.index());
    for (entity, transform) in transform_rows {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        for value in transform.translation.to_array() {
            snapshot.extend_from_slice(&value.to_le_bytes());
        }
    }

    let mut ai_query = world.query::<(Entity, &EnemyAI)>();
    let mut ai_rows: Vec<_> = ai_query.iter(world).collect();
    ai_rows.sort_by_key(|(entity, _)| entity.index());
    for (entity, ai) in ai_rows {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}/{:?}", ai.state, ai.target).as_bytes());
    }

    let mut weapon_query = world.query::<(Entity, &RangedWeapon)>();
    let mut weapon_rows: Vec<_> = weapon_query.iter(world).collect();
    weapon_rows.sort_by_key(|(entity, _)| entity.index());
    for (entity, weapon) in weapon_rows {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(&weapon.mag_ammo.to_le_bytes());
        snapshot.extend_from_slice(&weapon.ammo_remain.to_le_bytes());
        snapshot.extend_from_slice(&weapon.current_spread.to_le_bytes());
    }

    snapshot
}
