//! Критически-демпфированное сглаживание скалярных величин и углов
//!
//! Используется для затухания разброса оружия и плавного разворота врага
//! к цели. Сглаживание через аппроксимацию exp(-omega*t), без перелёта
//! через target.

use bevy::math::Vec3;
use std::f32::consts::{PI, TAU};

/// Плавно двигает current к target за ~smooth_time секунд
///
/// velocity - состояние сглаживания между вызовами (хранится вызывающим).
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    delta: f32,
) -> f32 {
    let smooth_time = smooth_time.max(1e-4);
    let delta = delta.max(1e-6);

    let omega = 2.0 / smooth_time;
    let x = omega * delta;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * delta;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Защита от перелёта через target
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = (output - target) / delta;
    }

    output
}

/// Кратчайшая угловая разница a -> b (радианы), результат в [-PI, PI]
pub fn delta_angle(a: f32, b: f32) -> f32 {
    let mut diff = (b - a).rem_euclid(TAU);
    if diff > PI {
        diff -= TAU;
    }
    diff
}

/// smooth_damp для углов: идёт по кратчайшей дуге через границу 2π
pub fn smooth_damp_angle(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    delta: f32,
) -> f32 {
    let target = current + delta_angle(current, target);
    smooth_damp(current, target, velocity, smooth_time, delta)
}

/// Yaw (вращение вокруг Y), при котором forward (-Z) смотрит вдоль direction
pub fn yaw_towards(direction: Vec3) -> f32 {
    (-direction.x).atan2(-direction.z)
}
