//! Оружие дальнего боя: state machine, патроны, разброс, разрешение выстрела
//!
//! Архитектура:
//! - RangedWeapon - компонент состояния (магазин/резерв, spread, таймеры)
//! - Intents (WeaponFireIntent/WeaponReloadIntent) пишет внешний слой:
//!   player системы сейчас, AI-стрелки в будущем
//! - process_fire_intents разрешает попадание raycast'ом по SpatialSnapshot
//!   и публикует DamageRequest + WeaponFired (трассер для презентации)
//!
//! Перезарядка - не блокирующее ожидание, а countdown в состоянии
//! Reloading: тик уменьшает остаток, смерть владельца отменяет перенос.

use bevy::prelude::*;

use crate::combat::damage::{DamageMessage, DamageRequest};
use crate::combat::spread::random_normal;
use crate::components::{Health, Muzzle};
use crate::physics::{LayerMask, SpatialSnapshot};
use crate::shared::smooth_damp;
use crate::DeterministicRng;

/// Состояние оружия
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum WeaponState {
    /// Готово к выстрелу
    Ready,
    /// Магазин пуст
    Empty,
    /// Перезарядка, remaining секунд до завершения
    Reloading { remaining: f32 },
}

/// Оружие дальнего боя
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct RangedWeapon {
    pub state: WeaponState,

    /// Урон за попадание
    pub damage: f32,
    /// Максимальная дальность (метры)
    pub fire_distance: f32,

    /// Патроны в магазине
    pub mag_ammo: u32,
    /// Ёмкость магазина
    pub mag_capacity: u32,
    /// Запас патронов вне магазина
    pub ammo_remain: u32,

    /// Интервал между выстрелами (секунды)
    pub time_between_fire: f32,
    /// Длительность перезарядки (секунды)
    pub reload_time: f32,

    /// Потолок разброса (градусы)
    pub max_spread: f32,
    /// Прирост разброса за выстрел = 1/stability
    pub stability: f32,
    /// Скорость восстановления разброса к нулю
    pub restore_from_recoil_speed: f32,
    /// Текущий разброс (градусы)
    pub current_spread: f32,
    pub current_spread_velocity: f32,

    /// Время последнего выстрела (секунды от старта симуляции)
    pub last_fire_time: f32,

    /// Слои, исключённые из попаданий (владелец и его фракция)
    pub exclude_target: LayerMask,
}

impl Default for RangedWeapon {
    fn default() -> Self {
        Self::assault_rifle()
    }
}

impl RangedWeapon {
    /// Штурмовая винтовка (ствол игрока по умолчанию)
    pub fn assault_rifle() -> Self {
        Self {
            state: WeaponState::Ready,
            damage: 25.0,
            fire_distance: 100.0,
            mag_ammo: 30,
            mag_capacity: 30,
            ammo_remain: 100,
            time_between_fire: 0.12,
            reload_time: 1.8,
            max_spread: 3.0,
            stability: 1.0,
            restore_from_recoil_speed: 2.0,
            current_spread: 0.0,
            current_spread_velocity: 0.0,
            last_fire_time: f32::NEG_INFINITY,
            exclude_target: LayerMask::PLAYER,
        }
    }

    /// Сброс при (ре)активации владельца: полный магазин, нулевой разброс
    pub fn reset(&mut self) {
        self.mag_ammo = self.mag_capacity;
        self.current_spread = 0.0;
        self.current_spread_velocity = 0.0;
        self.last_fire_time = f32::NEG_INFINITY;
        self.state = WeaponState::Ready;
    }

    pub fn can_fire(&self, now: f32) -> bool {
        self.state == WeaponState::Ready && now >= self.last_fire_time + self.time_between_fire
    }

    /// Регистрирует выстрел: расход патрона, рост разброса, cooldown.
    /// false без побочных эффектов, если стрелять нельзя.
    pub fn try_fire(&mut self, now: f32) -> bool {
        if !self.can_fire(now) {
            return false;
        }

        self.current_spread += 1.0 / self.stability;
        self.last_fire_time = now;
        self.mag_ammo = self.mag_ammo.saturating_sub(1);
        if self.mag_ammo == 0 {
            self.state = WeaponState::Empty;
        }
        true
    }

    /// Запуск перезарядки. false если уже идёт, резерв пуст или магазин полон.
    pub fn try_reload(&mut self) -> bool {
        if matches!(self.state, WeaponState::Reloading { .. })
            || self.ammo_remain == 0
            || self.mag_ammo >= self.mag_capacity
        {
            return false;
        }

        self.state = WeaponState::Reloading {
            remaining: self.reload_time,
        };
        true
    }

    /// Отмена незавершённой перезарядки (деактивация/смерть владельца).
    /// Патроны не переносятся.
    pub fn cancel_reload(&mut self) {
        if matches!(self.state, WeaponState::Reloading { .. }) {
            self.state = if self.mag_ammo > 0 {
                WeaponState::Ready
            } else {
                WeaponState::Empty
            };
        }
    }

    /// Тик: отсчёт перезарядки + затухание разброса
    ///
    /// Разброс зажимается в [0, max_spread] и плавно стекает к нулю
    /// независимо от состояния стрельбы.
    pub fn tick(&mut self, delta: f32) {
        if let WeaponState::Reloading { remaining } = self.state {
            let remaining = remaining - delta;
            if remaining <= 0.0 {
                let transfer = (self.mag_capacity - self.mag_ammo).min(self.ammo_remain);
                self.mag_ammo += transfer;
                self.ammo_remain -= transfer;
                self.state = if self.mag_ammo > 0 {
                    WeaponState::Ready
                } else {
                    WeaponState::Empty
                };
            } else {
                self.state = WeaponState::Reloading { remaining };
            }
        }

        self.current_spread = self.current_spread.clamp(0.0, self.max_spread);
        self.current_spread = smooth_damp(
            self.current_spread,
            0.0,
            &mut self.current_spread_velocity,
            1.0 / self.restore_from_recoil_speed,
            delta,
        );
    }
}

/// Intent: владелец хочет выстрелить в точку прицеливания
#[derive(Event, Debug, Clone)]
pub struct WeaponFireIntent {
    pub shooter: Entity,
    pub aim_point: Vec3,
}

/// Intent: владелец хочет перезарядиться
#[derive(Event, Debug, Clone)]
pub struct WeaponReloadIntent {
    pub shooter: Entity,
}

/// Выстрел состоялся (трассер/звук/анимация для презентации)
#[derive(Event, Debug, Clone)]
pub struct WeaponFired {
    pub shooter: Entity,
    /// Позиция дула в момент выстрела
    pub origin: Vec3,
    /// Точка попадания либо конец максимальной дальности
    pub hit_position: Vec3,
    /// Во что попали (None = промах)
    pub target: Option<Entity>,
}

/// Система: тик оружия (перезарядка + затухание разброса)
pub fn tick_weapons(mut weapons: Query<(Entity, &mut RangedWeapon)>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for (entity, mut weapon) in weapons.iter_mut() {
        let was_reloading = matches!(weapon.state, WeaponState::Reloading { .. });
        weapon.tick(delta);

        if was_reloading && !matches!(weapon.state, WeaponState::Reloading { .. }) {
            crate::logger::log(&format!(
                "{:?} reload complete: mag {} / reserve {}",
                entity, weapon.mag_ammo, weapon.ammo_remain
            ));
        }
    }
}

/// Система: обработка intents на перезарядку
pub fn process_reload_intents(
    mut intents: EventReader<WeaponReloadIntent>,
    mut weapons: Query<&mut RangedWeapon>,
) {
    for intent in intents.read() {
        let Ok(mut weapon) = weapons.get_mut(intent.shooter) else {
            continue;
        };
        if weapon.try_reload() {
            crate::logger::log(&format!(
                "{:?} reloading ({} in reserve)",
                intent.shooter, weapon.ammo_remain
            ));
        }
    }
}

/// Система: разрешение выстрелов
///
/// Разброс: две независимые выборки N(0, current_spread), yaw вокруг
/// мирового up, pitch вокруг right-оси направления. Затем raycast от дула,
/// повреждаемая цель получает DamageRequest, иначе промах на полной
/// дальности.
pub fn process_fire_intents(
    mut intents: EventReader<WeaponFireIntent>,
    mut shooters: Query<(&Transform, &Muzzle, &mut RangedWeapon)>,
    damageable: Query<&Health>,
    snapshot: Res<SpatialSnapshot>,
    mut rng: ResMut<DeterministicRng>,
    mut damage_events: EventWriter<DamageRequest>,
    mut fired_events: EventWriter<WeaponFired>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for intent in intents.read() {
        let Ok((transform, muzzle, mut weapon)) = shooters.get_mut(intent.shooter) else {
            continue;
        };
        // Гейт до выборки из rng: неудавшийся intent не сдвигает поток
        if !weapon.can_fire(now) {
            continue;
        }

        let origin = transform.transform_point(muzzle.offset);
        let mut direction = intent.aim_point - origin;
        if direction.length_squared() <= 1e-8 {
            // Дуло совпало с целью: промах на полной дальности вперёд
            direction = transform.forward() * 1.0;
        }

        let yaw_error = random_normal(&mut rng.rng, 0.0, weapon.current_spread);
        let pitch_error = random_normal(&mut rng.rng, 0.0, weapon.current_spread);

        direction = Quat::from_axis_angle(Vec3::Y, yaw_error.to_radians()) * direction;
        let mut right = direction.cross(Vec3::Y).normalize_or_zero();
        if right == Vec3::ZERO {
            right = Vec3::X;
        }
        direction = Quat::from_axis_angle(right, pitch_error.to_radians()) * direction;

        weapon.try_fire(now);

        let mask = weapon.exclude_target.inverse();
        let hit = snapshot.raycast(origin, direction, weapon.fire_distance, mask);

        let hit_position = match &hit {
            Some(hit) => {
                if damageable.contains(hit.entity) {
                    damage_events.write(DamageRequest {
                        target: hit.entity,
                        message: DamageMessage {
                            damager: intent.shooter,
                            amount: weapon.damage,
                            hit_point: hit.point,
                            hit_normal: hit.normal,
                        },
                    });
                }
                hit.point
            }
            None => origin + direction.normalize_or_zero() * weapon.fire_distance,
        };

        fired_events.write(WeaponFired {
            shooter: intent.shooter,
            origin,
            hit_position,
            target: hit.map(|hit| hit.entity),
        });
    }
}
