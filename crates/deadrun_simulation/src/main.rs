//! Headless запуск DEADRUN симуляции
//!
//! Прогоняет дефолтный сценарий без рендера: smoke-прогон боевого цикла
//! (патруль, обнаружение, преследование, атаки) на фиксированном seed.

use deadrun_simulation::scenario::{spawn_scenario, HeadlessAnimationPlugin, ScenarioConfig};
use deadrun_simulation::{create_headless_app, EnemyAI, Health, SimulationPlugin};

fn main() {
    let config = ScenarioConfig::default();
    println!(
        "Starting DEADRUN headless simulation (seed: {}, {} enemies)",
        config.seed,
        config.enemies.len()
    );

    let mut app = create_headless_app(config.seed);
    app.add_plugins((SimulationPlugin, HeadlessAnimationPlugin));

    let (player, _enemies) = spawn_scenario(&mut app.world_mut().commands(), &config);
    app.world_mut().flush();

    for tick in 0..2000 {
        app.update();

        if tick % 200 == 0 {
            let world = app.world_mut();
            let player_health = world
                .get::<Health>(player)
                .map(|health| health.current)
                .unwrap_or(0.0);

            let mut enemy_query = world.query::<(&EnemyAI, &Health)>();
            let enemies_alive = enemy_query
                .iter(world)
                .filter(|(_, health)| health.is_alive())
                .count();

            println!(
                "Tick {}: player hp {:.0}, enemies alive {}",
                tick, player_health, enemies_alive
            );
        }
    }

    println!("Simulation complete");
}
