//! Enemy combat AI module
//!
//! FSM: Patrol -> Tracking -> AttackBegin -> Attacking. Вход в Attacking и
//! выход из него управляются animation events, не внутренними таймерами -
//! это точка стыка с анимационным слоем.

use bevy::prelude::*;

use crate::SimStep;

pub mod components;
pub mod events;
pub mod systems;

// Re-export основных типов
pub use components::{EnemyAI, EnemyState};
pub use events::{AttackPhase, AttackPhaseEvent, AttackWindupStarted};

/// AI Plugin
///
/// Порядок выполнения:
/// 1. Decide: ai_update_path (20Hz) -> ai_check_attack_range ->
///    ai_process_attack_phase
/// 2. Act: ai_face_target -> ai_attack_sweep (после выстрелов оружия,
///    чтобы очередь DamageRequest была детерминированной)
/// 3. Resolve: ai_react_to_damage (после apply_damage)
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AttackPhaseEvent>()
            .add_event::<AttackWindupStarted>();

        app.add_systems(
            FixedUpdate,
            (
                systems::ai_update_path,
                systems::ai_check_attack_range,
                systems::ai_process_attack_phase,
            )
                .chain()
                .in_set(SimStep::Decide),
        );

        app.add_systems(
            FixedUpdate,
            (systems::ai_face_target, systems::ai_attack_sweep)
                .chain()
                .after(crate::combat::weapon::process_fire_intents)
                .in_set(SimStep::Act),
        );

        app.add_systems(
            FixedUpdate,
            systems::ai_react_to_damage
                .after(crate::combat::damage::apply_damage)
                .in_set(SimStep::Resolve),
        );
    }
}
