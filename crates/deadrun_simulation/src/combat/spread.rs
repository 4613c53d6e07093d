//! Разброс выстрелов: выборка из нормального распределения
//!
//! Угловая ошибка выстрела берётся из N(0, spread): большинство пуль ложится
//! около прицельной точки, с ростом spread всё больше уходит в стороны.

use rand::Rng;
use std::f32::consts::TAU;

/// Нижняя граница для u1: ln(0) не определён
const MIN_UNIFORM: f32 = 1e-7;

/// Выборка из N(mean, std_dev^2) через Box-Muller transform
///
/// Детерминирована при seeded rng: одинаковый поток выборок на одинаковом
/// seed.
pub fn random_normal(rng: &mut impl Rng, mean: f32, std_dev: f32) -> f32 {
    let u1 = rng.gen::<f32>().max(MIN_UNIFORM);
    let u2 = rng.gen::<f32>();
    mean + std_dev * (-2.0 * u1.ln()).sqrt() * (TAU * u2).sin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_deterministic_with_seed() {
        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..100 {
            assert_eq!(
                random_normal(&mut rng_a, 0.0, 3.0),
                random_normal(&mut rng_b, 0.0, 3.0)
            );
        }
    }

    #[test]
    fn test_zero_std_dev_returns_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(random_normal(&mut rng, 5.0, 0.0), 5.0);
        }
    }

    #[test]
    fn test_samples_finite() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10_000 {
            let sample = random_normal(&mut rng, 0.0, 3.0);
            assert!(sample.is_finite(), "sample = {}", sample);
        }
    }

    #[test]
    fn test_sample_mean_near_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let n = 20_000;
        let sum: f32 = (0..n).map(|_| random_normal(&mut rng, 0.0, 2.0)).sum();
        let mean = sum / n as f32;
        assert!(mean.abs() < 0.1, "mean = {}", mean);
    }
}
