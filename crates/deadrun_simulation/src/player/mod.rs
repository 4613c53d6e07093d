//! Player shooter: aim state и intents на выстрел/перезарядку
//!
//! Ввод и камера внешние: input-адаптер пишет ShooterControls, camera-адаптер
//! пишет AimSource (в headless тестах оба компонента заполняются напрямую).
//! Симуляция превращает их в WeaponFireIntent/WeaponReloadIntent и ведёт
//! прицельную точку.

use bevy::math::EulerRot;
use bevy::prelude::*;

use crate::combat::weapon::{RangedWeapon, WeaponFireIntent, WeaponReloadIntent};
use crate::components::Muzzle;
use crate::physics::SpatialSnapshot;
use crate::shared::{delta_angle, yaw_towards};
use crate::SimStep;

/// Состояние прицеливания
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum AimState {
    /// Оружие опущено
    #[default]
    Idle,
    /// Стрельба от бедра
    HipFire,
}

/// Ввод стрелка (пишется внешним input-адаптером, в тестах напрямую)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ShooterControls {
    /// Кнопка огня удерживается
    pub fire: bool,
    /// Запрошена перезарядка
    pub reload: bool,
}

/// Поза камеры прицеливания (пишется внешним camera-адаптером)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct AimSource {
    pub origin: Vec3,
    pub forward: Vec3,
}

impl Default for AimSource {
    fn default() -> Self {
        Self {
            origin: Vec3::new(0.0, 1.6, 0.0),
            forward: Vec3::NEG_Z,
        }
    }
}

/// Состояние player shooter
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Shooter {
    pub aim_state: AimState,
    /// Актуальная прицельная точка (мир)
    pub aim_point: Vec3,
    /// Время последнего удержания огня (секунды от старта)
    pub last_fire_input_time: f32,
    /// Сколько держим HipFire после отпускания огня (секунды)
    pub waiting_time_for_releasing_aim: f32,
    /// Допуск рассогласования камеры и корпуса (градусы)
    pub lined_up_tolerance: f32,
}

impl Default for Shooter {
    fn default() -> Self {
        Self {
            aim_state: AimState::Idle,
            aim_point: Vec3::ZERO,
            last_fire_input_time: f32::NEG_INFINITY,
            waiting_time_for_releasing_aim: 2.5,
            lined_up_tolerance: 1.0,
        }
    }
}

/// Система: пересчёт прицельной точки от камеры
///
/// Луч камеры до первого препятствия, затем linecast от дула уточняет
/// точку (ствол может смотреть из-за укрытия). Без попадания - точка на
/// максимальной дальности.
pub fn update_aim_point(
    mut shooters: Query<
        (&mut Shooter, &AimSource, &Transform, &Muzzle, &RangedWeapon),
        Without<crate::combat::Dead>,
    >,
    snapshot: Res<SpatialSnapshot>,
) {
    for (mut shooter, aim, transform, muzzle, weapon) in shooters.iter_mut() {
        let mask = weapon.exclude_target.inverse();

        match snapshot.raycast(aim.origin, aim.forward, weapon.fire_distance, mask) {
            Some(hit) => {
                shooter.aim_point = hit.point;

                let muzzle_position = transform.transform_point(muzzle.offset);
                if let Some(refine) = snapshot.linecast(muzzle_position, hit.point, mask) {
                    shooter.aim_point = refine.point;
                }
            }
            None => {
                shooter.aim_point =
                    aim.origin + aim.forward.normalize_or_zero() * weapon.fire_distance;
            }
        }
    }
}

/// Система: огонь/перезарядка из ввода
///
/// Idle -> HipFire только когда корпус довернулся к камере; из HipFire
/// стреляем, пока дуло не упирается в препятствие, иначе откат в Idle.
/// HipFire отпускается по таймауту после отпускания кнопки.
pub fn drive_shooter(
    mut shooters: Query<
        (
            Entity,
            &mut Shooter,
            &ShooterControls,
            &AimSource,
            &Transform,
            &Muzzle,
            &RangedWeapon,
        ),
        Without<crate::combat::Dead>,
    >,
    snapshot: Res<SpatialSnapshot>,
    mut fire_events: EventWriter<WeaponFireIntent>,
    mut reload_events: EventWriter<WeaponReloadIntent>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for (entity, mut shooter, controls, aim, transform, muzzle, weapon) in shooters.iter_mut() {
        if controls.fire {
            shooter.last_fire_input_time = now;

            match shooter.aim_state {
                AimState::Idle => {
                    if lined_up(&shooter, aim, transform) {
                        shooter.aim_state = AimState::HipFire;
                    }
                }
                AimState::HipFire => {
                    if has_enough_distance(&snapshot, transform, muzzle, weapon) {
                        fire_events.write(WeaponFireIntent {
                            shooter: entity,
                            aim_point: shooter.aim_point,
                        });
                    } else {
                        shooter.aim_state = AimState::Idle;
                    }
                }
            }
        } else if controls.reload {
            reload_events.write(WeaponReloadIntent { shooter: entity });
        }

        if !controls.fire
            && now >= shooter.last_fire_input_time + shooter.waiting_time_for_releasing_aim
        {
            shooter.aim_state = AimState::Idle;
        }
    }
}

/// Корпус довернулся к камере (допуск в градусах, с корректным wrap)
fn lined_up(shooter: &Shooter, aim: &AimSource, transform: &Transform) -> bool {
    let camera_yaw = yaw_towards(Vec3::new(aim.forward.x, 0.0, aim.forward.z));
    let body_yaw = transform.rotation.to_euler(EulerRot::YXZ).0;
    delta_angle(body_yaw, camera_yaw).abs().to_degrees() <= shooter.lined_up_tolerance
}

/// Дуло не упирается в препятствие: linecast от корпуса на высоте дула
fn has_enough_distance(
    snapshot: &SpatialSnapshot,
    transform: &Transform,
    muzzle: &Muzzle,
    weapon: &RangedWeapon,
) -> bool {
    let muzzle_position = transform.transform_point(muzzle.offset);
    let chest = Vec3::new(
        transform.translation.x,
        muzzle_position.y,
        transform.translation.z,
    );
    snapshot
        .linecast(chest, muzzle_position, weapon.exclude_target.inverse())
        .is_none()
}

/// Plugin: aim и ввод стрелка в фазе Decide
pub struct PlayerShooterPlugin;

impl Plugin for PlayerShooterPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (update_aim_point, drive_shooter).chain().in_set(SimStep::Decide),
        );
    }
}
