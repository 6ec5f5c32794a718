//! Spatial-query collaborator.
//!
//! Core не знает про broad/narrow phase: ground probes, sweeps и LOS-проверки
//! идут через `SpatialQuery` trait. Хост подставляет свою реализацию (Rapier,
//! engine raycasts) в `SpatialQueries` resource. По умолчанию - `FlatArena`.

use bevy::math::Vec3Swizzles;
use bevy::prelude::*;

/// Результат короткого downward probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    pub point: Vec3,
    pub normal: Vec3,
    /// Расстояние от origin до поверхности (отрицательное = origin под землёй)
    pub distance: f32,
}

/// Результат swept-volume запроса.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Доля motion (0.0..=1.0), пройденная до контакта
    pub fraction: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Static-world queries consumed by locomotion and adversary perception.
pub trait SpatialQuery: Send + Sync + 'static {
    /// Downward probe from `origin` (feet position), up to `max_distance`.
    fn query_ground_contact(&self, origin: Vec3, max_distance: f32) -> Option<GroundContact>;

    /// Sweep a sphere of `radius` from `origin` along `motion`.
    fn query_sweep(&self, origin: Vec3, motion: Vec3, radius: f32) -> Option<SweepHit>;

    /// Static obstruction between two points (attack origin → target).
    fn is_obstructed(&self, from: Vec3, to: Vec3) -> bool;
}

/// Injected spatial backend (resource вместо singleton manager).
#[derive(Resource)]
pub struct SpatialQueries(Box<dyn SpatialQuery>);

impl SpatialQueries {
    pub fn new(backend: impl SpatialQuery) -> Self {
        Self(Box::new(backend))
    }

    pub fn backend(&self) -> &dyn SpatialQuery {
        self.0.as_ref()
    }
}

impl Default for SpatialQueries {
    fn default() -> Self {
        Self::new(FlatArena::default())
    }
}

/// Headless world: бесконечная плоскость на `ground_height`, опционально
/// круглая арена (стена по радиусу). Occluders нет.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatArena {
    pub ground_height: f32,
    pub radius: Option<f32>,
}

impl Default for FlatArena {
    fn default() -> Self {
        Self {
            ground_height: 0.0,
            radius: None,
        }
    }
}

impl FlatArena {
    pub fn with_radius(radius: f32) -> Self {
        Self {
            ground_height: 0.0,
            radius: Some(radius),
        }
    }
}

impl SpatialQuery for FlatArena {
    fn query_ground_contact(&self, origin: Vec3, max_distance: f32) -> Option<GroundContact> {
        let distance = origin.y - self.ground_height;
        if distance > max_distance {
            return None;
        }

        Some(GroundContact {
            point: Vec3::new(origin.x, self.ground_height, origin.z),
            normal: Vec3::Y,
            distance,
        })
    }

    fn query_sweep(&self, origin: Vec3, motion: Vec3, radius: f32) -> Option<SweepHit> {
        let arena_radius = self.radius?;
        let limit = (arena_radius - radius).max(0.0);

        let start = origin.xz();
        let delta = motion.xz();

        if start.length() >= limit {
            // Уже на стене: пропускаем только движение внутрь
            if delta.dot(start) >= 0.0 {
                let normal = -start.normalize_or_zero();
                return Some(SweepHit {
                    fraction: 0.0,
                    point: origin,
                    normal: Vec3::new(normal.x, 0.0, normal.y),
                });
            }
            return None;
        }

        let end = start + delta;
        if end.length() < limit {
            return None;
        }

        // |start + t·delta| = limit → квадратное уравнение по t
        let a = delta.length_squared();
        let b = 2.0 * start.dot(delta);
        let c = start.length_squared() - limit * limit;
        let discriminant = b * b - 4.0 * a * c;
        if a <= f32::EPSILON || discriminant < 0.0 {
            return None;
        }

        let fraction = ((-b + discriminant.sqrt()) / (2.0 * a)).clamp(0.0, 1.0);
        let contact = start + delta * fraction;
        let normal = -contact.normalize_or_zero();

        Some(SweepHit {
            fraction,
            point: Vec3::new(contact.x, origin.y + motion.y * fraction, contact.y),
            normal: Vec3::new(normal.x, 0.0, normal.y),
        })
    }

    fn is_obstructed(&self, _from: Vec3, _to: Vec3) -> bool {
        false
    }
}
