//! Сценарии: декларативная раскладка арены
//!
//! YAML-конфиг (seed, стены, спавны) для headless бинаря и тестов.
//! Spawn-хелперы собирают полные bundle'ы акторов; headless stand-in
//! анимационного драйвера превращает замах в Enable/Disable по таймерам,
//! как это делал бы authored-клип в engine adapter.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::{AttackPhase, AttackPhaseEvent, AttackWindupStarted, EnemyAI};
use crate::combat::{Dead, RangedWeapon};
use crate::components::{Actor, Health, Muzzle, FACTION_ENEMY, FACTION_PLAYER};
use crate::navigation::NavAgent;
use crate::physics::{BodyCollider, LayerMask, Obstacle};
use crate::player::{AimSource, Shooter, ShooterControls};
use crate::SimStep;

fn vec3(values: [f32; 3]) -> Vec3 {
    Vec3::from_array(values)
}

/// Конфиг сценария
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub seed: u64,
    #[serde(default)]
    pub walls: Vec<WallSpawn>,
    pub player: PlayerSpawn,
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
}

/// AABB-стена
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallSpawn {
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
}

/// Спавн игрока
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSpawn {
    pub position: [f32; 3],
    pub health: f32,
}

/// Спавн врага (разные волны тюнингуются здесь)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub position: [f32; 3],
    pub health: f32,
    pub damage: f32,
    pub run_speed: f32,
    pub patrol_speed: f32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let arena = 20.0;
        let wall = |center: [f32; 3], half_extents: [f32; 3]| WallSpawn { center, half_extents };

        Self {
            seed: 42,
            walls: vec![
                wall([0.0, 1.5, -arena], [arena, 1.5, 0.5]),
                wall([0.0, 1.5, arena], [arena, 1.5, 0.5]),
                wall([-arena, 1.5, 0.0], [0.5, 1.5, arena]),
                wall([arena, 1.5, 0.0], [0.5, 1.5, arena]),
            ],
            player: PlayerSpawn {
                position: [0.0, 0.0, 0.0],
                health: 100.0,
            },
            enemies: vec![
                EnemySpawn {
                    position: [8.0, 0.0, -8.0],
                    health: 100.0,
                    damage: 30.0,
                    run_speed: 10.0,
                    patrol_speed: 3.0,
                },
                EnemySpawn {
                    position: [-10.0, 0.0, 6.0],
                    health: 75.0,
                    damage: 20.0,
                    run_speed: 8.0,
                    patrol_speed: 2.5,
                },
                EnemySpawn {
                    position: [5.0, 0.0, 12.0],
                    health: 50.0,
                    damage: 20.0,
                    run_speed: 12.0,
                    patrol_speed: 3.5,
                },
            ],
        }
    }
}

impl ScenarioConfig {
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Спавн игрока: стрелок с винтовкой
pub fn spawn_player(commands: &mut Commands, spawn: &PlayerSpawn) -> Entity {
    commands
        .spawn((
            Transform::from_translation(vec3(spawn.position)),
            Actor {
                faction_id: FACTION_PLAYER,
            },
            Health::new(spawn.health),
            BodyCollider {
                radius: 0.4,
                center_height: 0.9,
                layer: LayerMask::PLAYER,
            },
            Muzzle::default(),
            RangedWeapon::assault_rifle(),
            Shooter::default(),
            ShooterControls::default(),
            AimSource::default(),
        ))
        .id()
}

/// Спавн врага с тюнингом из конфига
pub fn spawn_enemy(commands: &mut Commands, spawn: &EnemySpawn) -> Entity {
    let mut ai = EnemyAI::walker();
    ai.damage = spawn.damage;
    ai.run_speed = spawn.run_speed;
    ai.patrol_speed = spawn.patrol_speed;

    let stopping_distance = ai.attack_distance();

    commands
        .spawn((
            Transform::from_translation(vec3(spawn.position)),
            Actor {
                faction_id: FACTION_ENEMY,
            },
            Health::new(spawn.health),
            BodyCollider {
                radius: 0.5,
                center_height: 0.9,
                layer: LayerMask::ENEMY,
            },
            NavAgent {
                speed: spawn.patrol_speed,
                stopping_distance,
                ..Default::default()
            },
            ai,
        ))
        .id()
}

pub fn spawn_wall(commands: &mut Commands, spawn: &WallSpawn) -> Entity {
    commands
        .spawn((
            Transform::from_translation(vec3(spawn.center)),
            Obstacle {
                half_extents: vec3(spawn.half_extents),
                layer: LayerMask::DEFAULT,
            },
        ))
        .id()
}

/// Разворачивает весь сценарий, возвращает (player, enemies)
pub fn spawn_scenario(commands: &mut Commands, config: &ScenarioConfig) -> (Entity, Vec<Entity>) {
    for wall in &config.walls {
        spawn_wall(commands, wall);
    }

    let player = spawn_player(commands, &config.player);
    let enemies = config
        .enemies
        .iter()
        .map(|spawn| spawn_enemy(commands, spawn))
        .collect();

    (player, enemies)
}

// --- Headless stand-in анимационного драйвера ---

/// Таймер проигрываемого взмаха (вместо authored-клипа)
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct SwingTimer {
    /// До кадра Enable (секунды)
    pub until_enable: f32,
    /// Длительность активной фазы после Enable (секунды)
    pub active_for: f32,
    pub enabled_sent: bool,
}

impl Default for SwingTimer {
    fn default() -> Self {
        Self {
            until_enable: 0.33,
            active_for: 0.33,
            enabled_sent: false,
        }
    }
}

/// Система: запуск таймера взмаха по AttackWindupStarted
pub fn start_swing_timers(mut commands: Commands, mut windups: EventReader<AttackWindupStarted>) {
    for windup in windups.read() {
        if let Ok(mut entity_commands) = commands.get_entity(windup.entity) {
            entity_commands.insert(SwingTimer::default());
        }
    }
}

/// Система: проигрывание таймеров взмаха -> AttackPhaseEvent
pub fn drive_swing_timers(
    mut commands: Commands,
    mut timers: Query<(Entity, &mut SwingTimer), Without<Dead>>,
    mut phase_events: EventWriter<AttackPhaseEvent>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut timer) in timers.iter_mut() {
        if !timer.enabled_sent {
            timer.until_enable -= delta;
            if timer.until_enable <= 0.0 {
                timer.enabled_sent = true;
                phase_events.write(AttackPhaseEvent {
                    entity,
                    phase: AttackPhase::Enable,
                });
            }
        } else {
            timer.active_for -= delta;
            if timer.active_for <= 0.0 {
                phase_events.write(AttackPhaseEvent {
                    entity,
                    phase: AttackPhase::Disable,
                });
                if let Ok(mut entity_commands) = commands.get_entity(entity) {
                    entity_commands.remove::<SwingTimer>();
                }
            }
        }
    }
}

/// Plugin: headless анимационный драйвер (только для тестов/headless бинаря,
/// в игре его место занимает настоящий animation driver)
pub struct HeadlessAnimationPlugin;

impl Plugin for HeadlessAnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (start_swing_timers, drive_swing_timers)
                .chain()
                .before(crate::ai::systems::ai_update_path)
                .in_set(SimStep::Decide),
        );
    }
}
