//! Системы боевого AI врага
//!
//! Решения (патруль, поиск целей, преследование) идут на медленном
//! decision тике (20Hz), эффекты (разворот, sweep) - на каждом
//! simulation тике. Мёртвые отфильтрованы Without<Dead> навсегда.

use bevy::math::EulerRot;
use bevy::prelude::*;

use crate::ai::components::{EnemyAI, EnemyState};
use crate::ai::events::{AttackPhase, AttackPhaseEvent, AttackWindupStarted};
use crate::combat::damage::{DamageApplied, DamageMessage, DamageRequest, Dead};
use crate::components::Health;
use crate::navigation::{sample_reachable_point, NavAgent};
use crate::perception::is_target_visible;
use crate::physics::{LayerMask, SpatialSnapshot};
use crate::shared::{smooth_damp_angle, yaw_towards};
use crate::DeterministicRng;

/// Период decision тика (секунды): навигация и восприятие дешевле кадра
pub const DECISION_INTERVAL: f32 = 0.05;

/// Патрульная точка считается достигнутой на этой дистанции
const PATROL_ARRIVE_DISTANCE: f32 = 1.0;

/// Допуск проверки дистанции атаки: агент останавливается ровно на
/// stopping_distance, ошибка округления не должна оставить его вне радиуса
const ATTACK_RANGE_EPSILON: f32 = 0.01;

fn target_is_alive(target: Entity, healths: &Query<&Health>) -> bool {
    healths.get(target).map(|health| health.is_alive()).unwrap_or(false)
}

/// Система: медленный decision тик
///
/// С целью: Patrol -> Tracking (скорость run) и обновление destination на
/// позицию цели. Без цели: сброс в Patrol (скорость patrol), новая
/// случайная точка при подходе к старой, скан целей в радиусе обзора -
/// первая живая видимая становится целью.
pub fn ai_update_path(
    mut enemies: Query<(Entity, &mut EnemyAI, &Transform, &mut NavAgent), Without<Dead>>,
    healths: Query<&Health>,
    snapshot: Res<SpatialSnapshot>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut ai, transform, mut agent) in enemies.iter_mut() {
        ai.decision_timer -= delta;
        if ai.decision_timer > 0.0 {
            continue;
        }
        ai.decision_timer += DECISION_INTERVAL;

        let position = transform.translation;
        let has_live_target = ai
            .target
            .map(|target| target_is_alive(target, &healths))
            .unwrap_or(false);

        if has_live_target {
            let target = ai.target.unwrap();

            if ai.state == EnemyState::Patrol {
                ai.state = EnemyState::Tracking;
                agent.speed = ai.run_speed;
                crate::logger::log(&format!(
                    "{:?} Patrol -> Tracking (target {:?})",
                    entity, target
                ));
            }

            if let Some(center) = snapshot.actor_center(target) {
                agent.set_destination(Vec3::new(center.x, 0.0, center.z));
            }
        } else {
            ai.target = None;

            if ai.state != EnemyState::Patrol {
                crate::logger::log(&format!("{:?} -> Patrol (target lost)", entity));
                ai.state = EnemyState::Patrol;
                agent.speed = ai.patrol_speed;
            }

            if agent.remaining_distance(position) <= PATROL_ARRIVE_DISTANCE {
                let point = sample_reachable_point(&mut rng.rng, position, ai.patrol_radius);
                agent.set_destination(point);
            }

            let eye_position = position + Vec3::Y * ai.eye_height;
            let eye_forward = transform.forward() * 1.0;
            let occlusion_mask = ai.what_is_target.with(LayerMask::DEFAULT);

            for candidate in snapshot.overlap_sphere(eye_position, ai.view_distance, ai.what_is_target)
            {
                if candidate == entity {
                    continue;
                }
                let Some(candidate_center) = snapshot.actor_center(candidate) else {
                    continue;
                };
                if !is_target_visible(
                    &snapshot,
                    eye_position,
                    eye_forward,
                    ai.field_of_view,
                    ai.view_distance,
                    candidate,
                    candidate_center,
                    occlusion_mask,
                ) {
                    continue;
                }
                if target_is_alive(candidate, &healths) {
                    ai.target = Some(candidate);
                    crate::logger::log(&format!("{:?} spotted {:?}", entity, candidate));
                    break;
                }
            }
        }
    }
}

/// Система: вход в атаку по дистанции (каждый тик)
///
/// Tracking -> AttackBegin, когда цель внутри attack_distance: навигация
/// замирает, наружу уходит AttackWindupStarted для анимации замаха.
pub fn ai_check_attack_range(
    mut enemies: Query<(Entity, &mut EnemyAI, &Transform, &mut NavAgent), Without<Dead>>,
    healths: Query<&Health>,
    snapshot: Res<SpatialSnapshot>,
    mut windup_events: EventWriter<AttackWindupStarted>,
) {
    for (entity, mut ai, transform, mut agent) in enemies.iter_mut() {
        if ai.state != EnemyState::Tracking {
            continue;
        }
        let Some(target) = ai.target else { continue };
        if !target_is_alive(target, &healths) {
            continue;
        }
        let Some(center) = snapshot.actor_center(target) else {
            continue;
        };

        let to_target = Vec3::new(
            center.x - transform.translation.x,
            0.0,
            center.z - transform.translation.z,
        );
        if to_target.length() <= ai.attack_distance() + ATTACK_RANGE_EPSILON {
            ai.state = EnemyState::AttackBegin;
            agent.is_stopped = true;
            windup_events.write(AttackWindupStarted { entity, target });
            crate::logger::log(&format!("{:?} Tracking -> AttackBegin", entity));
        }
    }
}

/// Система: обработка animation events
///
/// Enable: AttackBegin -> Attacking, трекер взмаха чистится. Disable:
/// выход в Tracking (цель жива) либо Patrol, навигация продолжается.
pub fn ai_process_attack_phase(
    mut events: EventReader<AttackPhaseEvent>,
    mut enemies: Query<(&mut EnemyAI, &mut NavAgent), Without<Dead>>,
    healths: Query<&Health>,
) {
    for event in events.read() {
        let Ok((mut ai, mut agent)) = enemies.get_mut(event.entity) else {
            continue;
        };

        match event.phase {
            AttackPhase::Enable => {
                if ai.state == EnemyState::AttackBegin {
                    ai.state = EnemyState::Attacking;
                    ai.last_attacked_targets.clear();
                    crate::logger::log(&format!("{:?} AttackBegin -> Attacking", event.entity));
                }
            }
            AttackPhase::Disable => {
                let has_live_target = ai
                    .target
                    .map(|target| target_is_alive(target, &healths))
                    .unwrap_or(false);

                ai.state = if has_live_target {
                    EnemyState::Tracking
                } else {
                    EnemyState::Patrol
                };
                agent.is_stopped = false;
            }
        }
    }
}

/// Система: плавный доворот к цели в attack states
///
/// Угловая скорость ограничена критически-демпфированным сглаживанием,
/// вращение только вокруг Y.
pub fn ai_face_target(
    mut enemies: Query<(&mut EnemyAI, &mut Transform), Without<Dead>>,
    snapshot: Res<SpatialSnapshot>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut ai, mut transform) in enemies.iter_mut() {
        if ai.state != EnemyState::AttackBegin && ai.state != EnemyState::Attacking {
            continue;
        }
        let Some(target) = ai.target else { continue };
        let Some(center) = snapshot.actor_center(target) else {
            continue;
        };

        let to_target = Vec3::new(
            center.x - transform.translation.x,
            0.0,
            center.z - transform.translation.z,
        );
        if to_target.length_squared() <= 1e-6 {
            continue;
        }

        let target_yaw = yaw_towards(to_target);
        let current_yaw = transform.rotation.to_euler(EulerRot::YXZ).0;

        let smooth_time = ai.turn_smooth_time;
        let mut velocity = ai.turn_smooth_velocity;
        let new_yaw = smooth_damp_angle(current_yaw, target_yaw, &mut velocity, smooth_time, delta);
        ai.turn_smooth_velocity = velocity;

        transform.rotation = Quat::from_rotation_y(new_yaw);
    }
}

/// Система: melee sweep в Attacking
///
/// Сфера атаки протягивается по ходу движения на velocity * dt: быстрый
/// агент не проскакивает цель между тиками. За тик урон получает максимум
/// одна новая цель (первая по дистанции), затем break.
pub fn ai_attack_sweep(
    mut enemies: Query<(Entity, &mut EnemyAI, &Transform, &NavAgent), Without<Dead>>,
    snapshot: Res<SpatialSnapshot>,
    mut damage_events: EventWriter<DamageRequest>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut ai, transform, agent) in enemies.iter_mut() {
        if ai.state != EnemyState::Attacking {
            continue;
        }

        let origin = transform.transform_point(ai.attack_root_offset);
        let direction = transform.forward() * 1.0;
        let sweep_distance = agent.velocity.length() * delta;

        for hit in snapshot.sphere_cast_all(
            origin,
            ai.attack_radius,
            direction,
            sweep_distance,
            ai.what_is_target,
        ) {
            if hit.entity == entity {
                continue;
            }
            if ai.last_attacked_targets.contains(&hit.entity) {
                continue;
            }

            // Стартовое пересечение не даёт точки контакта: берём центр атаки
            let hit_point = if hit.distance <= 0.0 { origin } else { hit.point };

            damage_events.write(DamageRequest {
                target: hit.entity,
                message: DamageMessage {
                    damager: entity,
                    amount: ai.damage,
                    hit_point,
                    hit_normal: hit.normal,
                },
            });
            ai.last_attacked_targets.push(hit.entity);
            break;
        }
    }
}

/// Система: мгновенное aggro на источник урона
///
/// Выстрел в спину из-за конуса зрения сразу делает стрелка целью, минуя
/// перцепционный скан патруля. Только если цели ещё нет.
pub fn ai_react_to_damage(
    mut applied_events: EventReader<DamageApplied>,
    mut enemies: Query<&mut EnemyAI, Without<Dead>>,
) {
    for event in applied_events.read() {
        let Ok(mut ai) = enemies.get_mut(event.target) else {
            continue;
        };
        if ai.target.is_none() {
            ai.target = Some(event.message.damager);
            crate::logger::log(&format!(
                "{:?} aggro on damager {:?}",
                event.target, event.message.damager
            ));
        }
    }
}
