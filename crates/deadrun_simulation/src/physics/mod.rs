//! Мировые запросы: headless backend
//!
//! Симуляции не нужна полноценная физика, только запросы по маскам слоёв:
//! raycast, linecast, sphere sweep, overlap. SpatialSnapshot пересобирается
//! в начале каждого тика из сферических объёмов акторов (BodyCollider) и
//! статических AABB-препятствий (Obstacle). Engine adapter может заполнять
//! resource из своей сцены, интерфейс запросов тот же.
//!
//! Детерминизм: снапшот сортируется по Entity index, запросы возвращают
//! стабильный порядок.

use bevy::prelude::*;

use crate::SimStep;

/// Битовая маска слоёв
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    /// Статическая геометрия (стены, ящики)
    pub const DEFAULT: LayerMask = LayerMask(1 << 0);
    /// Игрок и союзники
    pub const PLAYER: LayerMask = LayerMask(1 << 1);
    /// Враги
    pub const ENEMY: LayerMask = LayerMask(1 << 2);

    pub fn contains(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn with(self, other: LayerMask) -> LayerMask {
        LayerMask(self.0 | other.0)
    }

    pub fn without(self, other: LayerMask) -> LayerMask {
        LayerMask(self.0 & !other.0)
    }

    pub fn inverse(self) -> LayerMask {
        LayerMask(!self.0)
    }
}

/// Сферический объём коллизии актора
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct BodyCollider {
    /// Радиус сферы (метры)
    pub radius: f32,
    /// Высота центра сферы над origin актора (метры)
    pub center_height: f32,
    /// Слой актора
    pub layer: LayerMask,
}

impl Default for BodyCollider {
    fn default() -> Self {
        Self {
            radius: 0.5,
            center_height: 0.9,
            layer: LayerMask::DEFAULT,
        }
    }
}

/// Статическое AABB-препятствие (стена, ящик)
///
/// Поворот не учитывается: бокс осево-выровнен вокруг translation.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Obstacle {
    pub half_extents: Vec3,
    pub layer: LayerMask,
}

impl Default for Obstacle {
    fn default() -> Self {
        Self {
            half_extents: Vec3::ONE,
            layer: LayerMask::DEFAULT,
        }
    }
}

/// Результат ray/line запроса
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Результат sphere sweep
///
/// Объёмы, пересекающиеся со сферой уже на старте, возвращаются с
/// distance == 0 и point == Vec3::ZERO.
#[derive(Debug, Clone, Copy)]
pub struct SweepHit {
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Сфера актора в снапшоте
#[derive(Debug, Clone, Copy)]
pub struct ActorVolume {
    pub entity: Entity,
    pub center: Vec3,
    pub radius: f32,
    pub layer: LayerMask,
}

/// AABB препятствия в снапшоте
#[derive(Debug, Clone, Copy)]
pub struct ObstacleVolume {
    pub entity: Entity,
    pub min: Vec3,
    pub max: Vec3,
    pub layer: LayerMask,
}

/// Снимок мира для запросов текущего тика
#[derive(Resource, Debug, Default)]
pub struct SpatialSnapshot {
    pub actors: Vec<ActorVolume>,
    pub obstacles: Vec<ObstacleVolume>,
}

impl SpatialSnapshot {
    /// Центр объёма актора (None если актора нет в снапшоте, например труп)
    pub fn actor_center(&self, entity: Entity) -> Option<Vec3> {
        self.actors
            .iter()
            .find(|actor| actor.entity == entity)
            .map(|actor| actor.center)
    }

    /// Ближайшее попадание луча. Объёмы, в которых луч начинается, не
    /// считаются попаданием.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let length_squared = direction.length_squared();
        if length_squared <= 1e-12 || max_distance <= 0.0 {
            return None;
        }
        let direction = direction / length_squared.sqrt();

        let mut best: Option<RayHit> = None;

        for actor in &self.actors {
            if !mask.contains(actor.layer) {
                continue;
            }
            if let Some(t) = ray_sphere(origin, direction, actor.center, actor.radius, max_distance)
            {
                if best.map(|hit| t < hit.distance).unwrap_or(true) {
                    let point = origin + direction * t;
                    let normal = (point - actor.center).normalize_or_zero();
                    best = Some(RayHit {
                        entity: actor.entity,
                        point,
                        normal,
                        distance: t,
                    });
                }
            }
        }

        for obstacle in &self.obstacles {
            if !mask.contains(obstacle.layer) {
                continue;
            }
            if let Some((t, normal)) =
                ray_aabb(origin, direction, obstacle.min, obstacle.max, max_distance)
            {
                if best.map(|hit| t < hit.distance).unwrap_or(true) {
                    best = Some(RayHit {
                        entity: obstacle.entity,
                        point: origin + direction * t,
                        normal,
                        distance: t,
                    });
                }
            }
        }

        best
    }

    /// Ближайшее попадание на отрезке a -> b
    pub fn linecast(&self, a: Vec3, b: Vec3, mask: LayerMask) -> Option<RayHit> {
        let segment = b - a;
        self.raycast(a, segment, segment.length(), mask)
    }

    /// Все попадания сферы, протянутой вдоль direction на max_distance,
    /// по возрастанию distance. Стартовые пересечения идут первыми
    /// (distance == 0).
    pub fn sphere_cast_all(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Vec<SweepHit> {
        let mut hits = Vec::new();
        let direction = direction.normalize_or_zero();

        for actor in &self.actors {
            if !mask.contains(actor.layer) {
                continue;
            }

            let inflated = actor.radius + radius;
            let to_center = origin - actor.center;
            if to_center.length_squared() <= inflated * inflated {
                hits.push(SweepHit {
                    entity: actor.entity,
                    point: Vec3::ZERO,
                    normal: to_center.normalize_or_zero(),
                    distance: 0.0,
                });
                continue;
            }

            if direction == Vec3::ZERO {
                continue;
            }
            if let Some(t) = ray_sphere(origin, direction, actor.center, inflated, max_distance) {
                let sweep_center = origin + direction * t;
                let normal = (sweep_center - actor.center).normalize_or_zero();
                hits.push(SweepHit {
                    entity: actor.entity,
                    point: actor.center + normal * actor.radius,
                    normal,
                    distance: t,
                });
            }
        }

        for obstacle in &self.obstacles {
            if !mask.contains(obstacle.layer) {
                continue;
            }

            // Minkowski: бокс, раздутый на радиус сферы
            let min = obstacle.min - Vec3::splat(radius);
            let max = obstacle.max + Vec3::splat(radius);

            if origin.cmpge(min).all() && origin.cmple(max).all() {
                hits.push(SweepHit {
                    entity: obstacle.entity,
                    point: Vec3::ZERO,
                    normal: Vec3::ZERO,
                    distance: 0.0,
                });
                continue;
            }

            if direction == Vec3::ZERO {
                continue;
            }
            if let Some((t, normal)) = ray_aabb(origin, direction, min, max, max_distance) {
                hits.push(SweepHit {
                    entity: obstacle.entity,
                    point: origin + direction * t,
                    normal,
                    distance: t,
                });
            }
        }

        // Стабильная сортировка: при равной дистанции порядок снапшота
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits
    }

    /// Акторы, чьи объёмы пересекают сферу
    pub fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<Entity> {
        self.actors
            .iter()
            .filter(|actor| mask.contains(actor.layer))
            .filter(|actor| {
                let inflated = radius + actor.radius;
                (actor.center - center).length_squared() <= inflated * inflated
            })
            .map(|actor| actor.entity)
            .collect()
    }
}

/// Пересечение луча со сферой. Лучи изнутри сферы не попадают.
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32, max_distance: f32) -> Option<f32> {
    let to_origin = origin - center;
    let c = to_origin.length_squared() - radius * radius;
    if c <= 0.0 {
        return None;
    }

    let b = to_origin.dot(direction);
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let t = -b - discriminant.sqrt();
    if t < 0.0 || t > max_distance {
        return None;
    }
    Some(t)
}

/// Пересечение луча с AABB (slab-метод). Лучи изнутри бокса не попадают.
/// Возвращает (t, нормаль грани входа).
fn ray_aabb(
    origin: Vec3,
    direction: Vec3,
    min: Vec3,
    max: Vec3,
    max_distance: f32,
) -> Option<(f32, Vec3)> {
    let origin_a = origin.to_array();
    let direction_a = direction.to_array();
    let min_a = min.to_array();
    let max_a = max.to_array();

    let mut t_enter = 0.0f32;
    let mut t_exit = max_distance;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin_a[axis];
        let d = direction_a[axis];

        if d.abs() < 1e-8 {
            if o < min_a[axis] || o > max_a[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t_near = (min_a[axis] - o) * inv;
        let mut t_far = (max_a[axis] - o) * inv;
        // Нормаль входа всегда против направления движения по оси
        let axis_unit = match axis {
            0 => Vec3::X,
            1 => Vec3::Y,
            _ => Vec3::Z,
        };
        let axis_normal = axis_unit * -d.signum();

        if t_near > t_far {
            std::mem::swap(&mut t_near, &mut t_far);
        }

        if t_near > t_enter {
            t_enter = t_near;
            normal = axis_normal;
        }
        t_exit = t_exit.min(t_far);

        if t_enter > t_exit {
            return None;
        }
    }

    // normal == ZERO значит старт внутри бокса
    if normal == Vec3::ZERO {
        return None;
    }
    Some((t_enter, normal))
}

/// Система: пересборка снапшота из объёмов сцены
pub fn rebuild_spatial_snapshot(
    mut snapshot: ResMut<SpatialSnapshot>,
    actors: Query<(Entity, &Transform, &BodyCollider)>,
    obstacles: Query<(Entity, &Transform, &Obstacle)>,
) {
    snapshot.actors.clear();
    for (entity, transform, collider) in actors.iter() {
        snapshot.actors.push(ActorVolume {
            entity,
            center: transform.translation + Vec3::Y * collider.center_height,
            radius: collider.radius,
            layer: collider.layer,
        });
    }
    snapshot.actors.sort_by_key(|actor| actor.entity.index());

    snapshot.obstacles.clear();
    for (entity, transform, obstacle) in obstacles.iter() {
        snapshot.obstacles.push(ObstacleVolume {
            entity,
            min: transform.translation - obstacle.half_extents,
            max: transform.translation + obstacle.half_extents,
            layer: obstacle.layer,
        });
    }
    snapshot.obstacles.sort_by_key(|obstacle| obstacle.entity.index());
}

/// Plugin: снапшот мира в начале каждого тика
pub struct SpatialPlugin;

impl Plugin for SpatialPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpatialSnapshot>()
            .add_systems(FixedUpdate, rebuild_spatial_snapshot.in_set(SimStep::Snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(index: u32, center: Vec3, radius: f32, layer: LayerMask) -> ActorVolume {
        ActorVolume {
            entity: Entity::from_raw(index),
            center,
            radius,
            layer,
        }
    }

    fn wall(index: u32, min: Vec3, max: Vec3) -> ObstacleVolume {
        ObstacleVolume {
            entity: Entity::from_raw(index),
            min,
            max,
            layer: LayerMask::DEFAULT,
        }
    }

    #[test]
    fn test_raycast_hits_nearest_sphere() {
        let snapshot = SpatialSnapshot {
            actors: vec![
                actor(1, Vec3::new(0.0, 0.0, -10.0), 1.0, LayerMask::PLAYER),
                actor(2, Vec3::new(0.0, 0.0, -5.0), 1.0, LayerMask::PLAYER),
            ],
            obstacles: vec![],
        };

        let hit = snapshot
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 100.0, LayerMask::ALL)
            .unwrap();
        assert_eq!(hit.entity, Entity::from_raw(2));
        assert!((hit.distance - 4.0).abs() < 1e-4);
        assert!((hit.point.z + 4.0).abs() < 1e-4);
        assert!((hit.normal - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_raycast_respects_mask_and_range() {
        let snapshot = SpatialSnapshot {
            actors: vec![actor(1, Vec3::new(0.0, 0.0, -5.0), 1.0, LayerMask::PLAYER)],
            obstacles: vec![],
        };

        assert!(snapshot
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 100.0, LayerMask::ENEMY)
            .is_none());
        assert!(snapshot
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 3.0, LayerMask::ALL)
            .is_none());
    }

    #[test]
    fn test_raycast_wall_blocks_actor() {
        let snapshot = SpatialSnapshot {
            actors: vec![actor(1, Vec3::new(0.0, 0.0, -10.0), 1.0, LayerMask::PLAYER)],
            obstacles: vec![wall(
                2,
                Vec3::new(-5.0, -5.0, -6.0),
                Vec3::new(5.0, 5.0, -4.0),
            )],
        };

        let hit = snapshot
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 100.0, LayerMask::ALL)
            .unwrap();
        assert_eq!(hit.entity, Entity::from_raw(2));
        assert!((hit.distance - 4.0).abs() < 1e-4);
        assert!((hit.normal - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_raycast_from_inside_volume_misses() {
        let snapshot = SpatialSnapshot {
            actors: vec![actor(1, Vec3::ZERO, 2.0, LayerMask::PLAYER)],
            obstacles: vec![wall(2, Vec3::splat(-1.0), Vec3::splat(1.0))],
        };

        assert!(snapshot
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 100.0, LayerMask::ALL)
            .is_none());
    }

    #[test]
    fn test_linecast_segment_bounds() {
        let snapshot = SpatialSnapshot {
            actors: vec![actor(1, Vec3::new(0.0, 0.0, -5.0), 0.5, LayerMask::PLAYER)],
            obstacles: vec![],
        };

        assert!(snapshot
            .linecast(Vec3::ZERO, Vec3::new(0.0, 0.0, -3.0), LayerMask::ALL)
            .is_none());
        assert!(snapshot
            .linecast(Vec3::ZERO, Vec3::new(0.0, 0.0, -6.0), LayerMask::ALL)
            .is_some());
    }

    #[test]
    fn test_sphere_cast_overlap_reports_zero_distance() {
        let snapshot = SpatialSnapshot {
            actors: vec![actor(1, Vec3::new(0.0, 0.0, -1.0), 0.5, LayerMask::PLAYER)],
            obstacles: vec![],
        };

        let hits = snapshot.sphere_cast_all(Vec3::ZERO, 2.0, Vec3::NEG_Z, 0.0, LayerMask::ALL);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[0].point, Vec3::ZERO);
    }

    #[test]
    fn test_sphere_cast_sorted_by_distance() {
        let snapshot = SpatialSnapshot {
            actors: vec![
                actor(1, Vec3::new(0.0, 0.0, -10.0), 0.5, LayerMask::PLAYER),
                actor(2, Vec3::new(0.0, 0.0, -4.0), 0.5, LayerMask::PLAYER),
            ],
            obstacles: vec![],
        };

        let hits = snapshot.sphere_cast_all(Vec3::ZERO, 0.5, Vec3::NEG_Z, 20.0, LayerMask::ALL);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entity, Entity::from_raw(2));
        assert_eq!(hits[1].entity, Entity::from_raw(1));
        assert!(hits[0].distance < hits[1].distance);
        // Попадание на поверхности сферы цели
        assert!((hits[0].point.z + 3.5).abs() < 1e-3);
    }

    #[test]
    fn test_overlap_sphere_inflates_by_actor_radius() {
        let snapshot = SpatialSnapshot {
            actors: vec![
                actor(1, Vec3::new(3.0, 0.0, 0.0), 0.5, LayerMask::PLAYER),
                actor(2, Vec3::new(6.0, 0.0, 0.0), 0.5, LayerMask::PLAYER),
                actor(3, Vec3::new(3.0, 0.0, 0.0), 0.5, LayerMask::ENEMY),
            ],
            obstacles: vec![],
        };

        let found = snapshot.overlap_sphere(Vec3::ZERO, 3.2, LayerMask::PLAYER);
        assert_eq!(found, vec![Entity::from_raw(1)]);
    }

    #[test]
    fn test_layer_mask_ops() {
        let mask = LayerMask::ALL.without(LayerMask::PLAYER);
        assert!(mask.contains(LayerMask::ENEMY));
        assert!(mask.contains(LayerMask::DEFAULT));
        assert!(!mask.contains(LayerMask::PLAYER));
        assert!(LayerMask::PLAYER.inverse().contains(LayerMask::DEFAULT));
        assert!(!LayerMask::NONE.contains(LayerMask::ALL));
    }
}
