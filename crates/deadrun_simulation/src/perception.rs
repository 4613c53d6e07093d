//! Зрение врагов: конус обзора + проверка окклюзии
//!
//! Двухфазная проверка: сперва дешёвый угловой тест, и только для целей
//! внутри конуса - луч на перекрытие. Конус горизонтальный: вертикальная
//! составляющая направления на цель приравнивается к forward.y, чтобы
//! цель выше или ниже глаз не выпадала из сектора.

use bevy::prelude::*;

use crate::physics::{LayerMask, SpatialSnapshot};

/// Допуск на границе конуса: цель ровно на половине FOV считается видимой
const BOUNDARY_EPSILON_DEGREES: f32 = 1e-3;

/// Видна ли цель наблюдателю
///
/// Фаза 2 пускает луч по настоящему 3D-направлению (вертикаль
/// восстановлена): первое перекрытие обязано быть самой целью.
pub fn is_target_visible(
    snapshot: &SpatialSnapshot,
    eye_position: Vec3,
    eye_forward: Vec3,
    field_of_view_degrees: f32,
    view_distance: f32,
    target: Entity,
    target_position: Vec3,
    occlusion_mask: LayerMask,
) -> bool {
    let mut flat_direction = target_position - eye_position;
    flat_direction.y = eye_forward.y;

    if flat_direction.length_squared() > 1e-8 && eye_forward.length_squared() > 1e-8 {
        let deviation = flat_direction.angle_between(eye_forward).to_degrees();
        if deviation > field_of_view_degrees * 0.5 + BOUNDARY_EPSILON_DEGREES {
            return false;
        }
    }

    let direction = target_position - eye_position;
    match snapshot.raycast(eye_position, direction, view_distance, occlusion_mask) {
        Some(hit) => hit.entity == target,
        None => false,
    }
}
