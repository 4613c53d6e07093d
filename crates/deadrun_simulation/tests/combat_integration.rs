//! Combat integration tests
//!
//! Headless прогон полного боевого цикла: восприятие, преследование,
//! melee-атаки, реакция на урон, смерть. Проверяем инварианты и
//! одиночность переходов.

use bevy::prelude::*;
use deadrun_simulation::scenario::{
    spawn_enemy, spawn_player, spawn_wall, EnemySpawn, HeadlessAnimationPlugin, PlayerSpawn,
    WallSpawn,
};
use deadrun_simulation::*;

/// Helper: полный combat App
fn create_combat_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins((SimulationPlugin, HeadlessAnimationPlugin));
    app
}

fn enemy_spawn(position: [f32; 3]) -> EnemySpawn {
    EnemySpawn {
        position,
        health: 100.0,
        damage: 30.0,
        run_speed: 10.0,
        patrol_speed: 3.0,
    }
}

fn dummy_spawn(position: [f32; 3], health: f32) -> PlayerSpawn {
    PlayerSpawn { position, health }
}

/// Лог смертей: EntityDied обязан приходить ровно один раз на актора
#[derive(Resource, Default)]
struct DeathLog(Vec<Entity>);

fn collect_deaths(mut events: EventReader<EntityDied>, mut log: ResMut<DeathLog>) {
    for event in events.read() {
        log.0.push(event.entity);
    }
}

/// Helper: прогон до нужного состояния AI
fn run_until_state(app: &mut App, enemy: Entity, state: EnemyState, max_ticks: usize) -> bool {
    for _ in 0..max_ticks {
        app.update();
        if app.world().get::<EnemyAI>(enemy).unwrap().state == state {
            return true;
        }
    }
    false
}

#[test]
fn test_enemy_spots_target_and_tracks() {
    let mut app = create_combat_app(42);

    let enemy = spawn_enemy(&mut app.world_mut().commands(), &enemy_spawn([0.0, 0.0, 0.0]));
    let dummy = spawn_player(
        &mut app.world_mut().commands(),
        &dummy_spawn([0.0, 0.0, -5.0], 100.0),
    );

    // Враг смотрит в -Z, цель прямо по курсу в 5м
    assert!(
        run_until_state(&mut app, enemy, EnemyState::Tracking, 30),
        "enemy never started tracking"
    );
    assert_eq!(app.world().get::<EnemyAI>(enemy).unwrap().target, Some(dummy));

    // Скорость переключена на run
    let agent = app.world().get::<NavAgent>(enemy).unwrap();
    assert_eq!(agent.speed, 10.0);
}

#[test]
fn test_enemy_does_not_spot_target_behind() {
    let mut app = create_combat_app(42);

    let enemy = spawn_enemy(&mut app.world_mut().commands(), &enemy_spawn([0.0, 0.0, 0.0]));
    let _dummy = spawn_player(
        &mut app.world_mut().commands(),
        &dummy_spawn([0.0, 0.0, 5.0], 100.0),
    );
    app.world_mut().flush();

    // Замораживаем навигацию, чтобы патруль не развернул врага к цели
    app.world_mut().get_mut::<NavAgent>(enemy).unwrap().is_stopped = true;

    for _ in 0..100 {
        app.update();
        let ai = app.world().get::<EnemyAI>(enemy).unwrap();
        assert_eq!(ai.state, EnemyState::Patrol);
        assert!(ai.target.is_none(), "spotted target outside the view cone");
    }
}

#[test]
fn test_wall_blocks_perception() {
    let mut app = create_combat_app(42);

    let enemy = spawn_enemy(&mut app.world_mut().commands(), &enemy_spawn([0.0, 0.0, 0.0]));
    let _dummy = spawn_player(
        &mut app.world_mut().commands(),
        &dummy_spawn([0.0, 0.0, -6.0], 100.0),
    );
    spawn_wall(
        &mut app.world_mut().commands(),
        &WallSpawn {
            center: [0.0, 1.5, -3.0],
            half_extents: [4.0, 1.5, 0.3],
        },
    );
    app.world_mut().flush();

    app.world_mut().get_mut::<NavAgent>(enemy).unwrap().is_stopped = true;

    for _ in 0..100 {
        app.update();
        assert!(
            app.world().get::<EnemyAI>(enemy).unwrap().target.is_none(),
            "spotted target through a wall"
        );
    }
}

#[test]
fn test_aggro_on_damage_from_outside_view() {
    let mut app = create_combat_app(42);

    let enemy = spawn_enemy(&mut app.world_mut().commands(), &enemy_spawn([0.0, 0.0, 0.0]));
    let dummy = spawn_player(
        &mut app.world_mut().commands(),
        &dummy_spawn([0.0, 0.0, 8.0], 100.0),
    );
    app.world_mut().flush();

    app.world_mut().get_mut::<NavAgent>(enemy).unwrap().is_stopped = true;
    app.update();
    assert!(app.world().get::<EnemyAI>(enemy).unwrap().target.is_none());

    // Выстрел в спину: урон приходит от цели вне конуса зрения
    app.world_mut().send_event(DamageRequest {
        target: enemy,
        message: DamageMessage {
            damager: dummy,
            amount: 10.0,
            hit_point: Vec3::new(0.0, 0.9, 0.5),
            hit_normal: Vec3::Z,
        },
    });

    app.update();
    assert_eq!(
        app.world().get::<EnemyAI>(enemy).unwrap().target,
        Some(dummy),
        "damage did not aggro the enemy"
    );

    assert!(run_until_state(&mut app, enemy, EnemyState::Tracking, 10));
}

#[test]
fn test_full_melee_loop_and_single_hit_per_swing() {
    let mut app = create_combat_app(42);
    app.init_resource::<DeathLog>();
    app.add_systems(Update, collect_deaths);

    let enemy = spawn_enemy(&mut app.world_mut().commands(), &enemy_spawn([0.0, 0.0, 0.0]));
    let dummy = spawn_player(
        &mut app.world_mut().commands(),
        &dummy_spawn([0.0, 0.0, -5.0], 100.0),
    );

    // Полный цикл: Patrol -> Tracking -> AttackBegin -> Attacking
    assert!(run_until_state(&mut app, enemy, EnemyState::AttackBegin, 120));
    assert!(run_until_state(&mut app, enemy, EnemyState::Attacking, 60));

    // Цель неподвижна внутри сферы атаки десятки тиков, но за один взмах
    // получает ровно один пакет урона
    let mut seen_health = vec![100.0f32];
    for _ in 0..600 {
        app.update();
        let health = app.world().get::<Health>(dummy).unwrap();
        let current = health.current;
        if *seen_health.last().unwrap() != current {
            seen_health.push(current);
        }
        if health.dead {
            break;
        }
    }

    // Каждая ступень - ровно один удар на 30
    assert_eq!(seen_health, vec![100.0, 70.0, 40.0, 10.0, 0.0]);

    let health = app.world().get::<Health>(dummy).unwrap();
    assert!(health.dead);
    assert_eq!(health.current, 0.0);

    // Дальнейшие взмахи по трупу ничего не меняют, смерть пришла один раз
    for _ in 0..120 {
        app.update();
    }
    assert_eq!(app.world().get::<Health>(dummy).unwrap().current, 0.0);
    assert_eq!(app.world().resource::<DeathLog>().0, vec![dummy]);
}

#[test]
fn test_target_death_returns_enemy_to_patrol_once() {
    let mut app = create_combat_app(42);

    let enemy = spawn_enemy(&mut app.world_mut().commands(), &enemy_spawn([0.0, 0.0, 0.0]));
    let dummy = spawn_player(
        &mut app.world_mut().commands(),
        &dummy_spawn([0.0, 0.0, -5.0], 30.0),
    );

    assert!(run_until_state(&mut app, enemy, EnemyState::Tracking, 60));

    // Один удар убивает цель
    let mut died_tick = None;
    for tick in 0..600 {
        app.update();
        if app.world().get::<Health>(dummy).unwrap().dead {
            died_tick = Some(tick);
            break;
        }
    }
    assert!(died_tick.is_some(), "enemy never killed the dummy");

    // Труп не ловит лучи и урон
    assert!(app.world().get::<BodyCollider>(dummy).is_none());

    // AI возвращается в Patrol ровно один раз и не осциллирует
    assert!(run_until_state(&mut app, enemy, EnemyState::Patrol, 60));
    for _ in 0..200 {
        app.update();
        let ai = app.world().get::<EnemyAI>(enemy).unwrap();
        assert_eq!(ai.state, EnemyState::Patrol);
        assert!(ai.target.is_none());
    }
}

#[test]
fn test_enemy_death_disables_ai_permanently() {
    let mut app = create_combat_app(42);

    let enemy = spawn_enemy(&mut app.world_mut().commands(), &enemy_spawn([0.0, 0.0, 0.0]));
    let dummy = spawn_player(
        &mut app.world_mut().commands(),
        &dummy_spawn([0.0, 0.0, -5.0], 100.0),
    );

    assert!(run_until_state(&mut app, enemy, EnemyState::Tracking, 60));

    // Добиваем врага
    app.world_mut().send_event(DamageRequest {
        target: enemy,
        message: DamageMessage {
            damager: dummy,
            amount: 1000.0,
            hit_point: Vec3::ZERO,
            hit_normal: Vec3::Z,
        },
    });
    app.update();

    let world = app.world();
    assert!(world.get::<Health>(enemy).unwrap().dead);
    assert!(world.get::<Dead>(enemy).is_some());
    assert!(world.get::<BodyCollider>(enemy).is_none());

    let agent = world.get::<NavAgent>(enemy).unwrap();
    assert!(agent.is_stopped);
    assert!(agent.destination.is_none());

    // Состояние AI заморожено навсегда
    let frozen_state = world.get::<EnemyAI>(enemy).unwrap().state;
    let frozen_position = world.get::<Transform>(enemy).unwrap().translation;
    for _ in 0..100 {
        app.update();
    }
    assert_eq!(app.world().get::<EnemyAI>(enemy).unwrap().state, frozen_state);
    assert_eq!(
        app.world().get::<Transform>(enemy).unwrap().translation,
        frozen_position
    );
}

#[test]
fn test_player_shoots_and_enemy_aggroes() {
    let mut app = create_combat_app(42);

    let player = spawn_player(
        &mut app.world_mut().commands(),
        &dummy_spawn([0.0, 0.0, 0.0], 100.0),
    );
    let enemy = spawn_enemy(&mut app.world_mut().commands(), &enemy_spawn([0.0, 0.0, -6.0]));
    app.world_mut().flush();

    // Враг смотрит от игрока и стоит: увидеть не может, только почувствовать
    app.world_mut().get_mut::<Transform>(enemy).unwrap().rotation =
        Quat::from_rotation_y(std::f32::consts::PI);
    app.world_mut().get_mut::<NavAgent>(enemy).unwrap().is_stopped = true;

    // Камера на высоте центра цели, смотрит в -Z
    {
        let mut aim = app.world_mut().get_mut::<AimSource>(player).unwrap();
        aim.origin = Vec3::new(0.0, 0.9, 0.0);
        aim.forward = Vec3::NEG_Z;
    }
    app.world_mut().get_mut::<ShooterControls>(player).unwrap().fire = true;

    for _ in 0..60 {
        app.update();
    }

    let world = app.world();
    let weapon = world.get::<RangedWeapon>(player).unwrap();
    assert!(weapon.mag_ammo < 30, "weapon never fired");
    assert!(weapon.current_spread > 0.0);

    // Первый выстрел без разброса гарантированно попадает
    let enemy_health = world.get::<Health>(enemy).unwrap();
    assert!(enemy_health.current < 100.0, "no damage landed");

    // Враг получил урон и немедленно взял стрелка в цель
    assert_eq!(world.get::<EnemyAI>(enemy).unwrap().target, Some(player));
}

#[test]
fn test_ammo_pack_pickup() {
    let mut app = create_combat_app(42);

    let player = spawn_player(
        &mut app.world_mut().commands(),
        &dummy_spawn([0.0, 0.0, 0.0], 100.0),
    );
    let pack = app.world_mut().spawn(AmmoPack { ammo: 40 }).id();
    app.update();

    app.world_mut().send_event(ItemUsed { item: pack, user: player });
    app.update();

    assert_eq!(app.world().get::<RangedWeapon>(player).unwrap().ammo_remain, 140);
    assert!(app.world().get::<AmmoPack>(pack).is_none(), "pack survived pickup");
}

#[test]
fn test_health_invariants_full_scenario() {
    use deadrun_simulation::scenario::{spawn_scenario, ScenarioConfig};

    let mut app = create_combat_app(123);
    let config = ScenarioConfig::default();
    let (player, enemies) = spawn_scenario(&mut app.world_mut().commands(), &config);

    for tick in 0..1000 {
        app.update();

        if tick % 100 != 0 {
            continue;
        }

        let world = app.world();
        for &entity in enemies.iter().chain(std::iter::once(&player)) {
            let health = world.get::<Health>(entity).unwrap();
            assert!(
                health.current >= 0.0 && health.current <= health.max,
                "tick {}: health out of bounds: {:?}",
                tick,
                health
            );
            assert_eq!(health.dead, health.current <= 0.0);
        }

        let weapon = world.get::<RangedWeapon>(player).unwrap();
        assert!(weapon.mag_ammo <= weapon.mag_capacity);
        assert!(
            weapon.current_spread >= 0.0 && weapon.current_spread <= weapon.max_spread,
            "tick {}: spread out of bounds: {}",
            tick,
            weapon.current_spread
        );
    }
}
