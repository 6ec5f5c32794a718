//! Hit Volume + hurtboxes
//!
//! Архитектура:
//! - HitVolume живёт на атакующем постоянно, включается trigger'ами
//!   (HitStart/HitEnd), а не спавнится на каждый swing
//! - Sphere volume, offset в локальном frame владельца
//! - Overlap против `Hurtbox` компонентов, фильтр по `CollisionMask`
//! - Hit set очищается на каждом activate → не больше одного урона на цель

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::damage::DamageReason;

/// Collision layers (bitmask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub struct CollisionMask(pub u32);

impl CollisionMask {
    pub const NONE: Self = Self(0);
    pub const PLAYER: Self = Self(1 << 0);
    pub const ADVERSARY: Self = Self(1 << 1);
    pub const ALL: Self = Self(u32::MAX);

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for CollisionMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Damageable collider (сфера на высоте `height` над ногами).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Hurtbox {
    pub radius: f32,
    pub height: f32,
    pub layers: CollisionMask,
}

impl Hurtbox {
    pub fn new(radius: f32, layers: CollisionMask) -> Self {
        Self {
            radius,
            height: 1.0,
            layers,
        }
    }

    pub fn center(&self, transform: &Transform) -> Vec3 {
        transform.translation + Vec3::Y * self.height
    }
}

/// Сфера для `query_overlap`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Toggleable detection volume владельца.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct HitVolume {
    pub radius: f32,
    /// Offset в локальном frame (−Z = вперёд)
    pub offset: Vec3,
    pub mask: CollisionMask,
    pub reason: DamageReason,
    active: bool,
    damage: f32,
    hit_entities: Vec<Entity>,
    notified: bool,
}

impl Default for HitVolume {
    fn default() -> Self {
        Self::new(1.2, Vec3::new(0.0, 1.0, -1.0), CollisionMask::ALL)
    }
}

impl HitVolume {
    pub fn new(radius: f32, offset: Vec3, mask: CollisionMask) -> Self {
        Self {
            radius,
            offset,
            mask,
            reason: DamageReason::Normal,
            active: false,
            damage: 0.0,
            hit_entities: Vec::new(),
            notified: false,
        }
    }

    /// Очищает hit set и включает detection. Повторный activate во время
    /// активной фазы - no-op (returns false).
    pub fn activate(&mut self, damage: f32) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.damage = damage.max(0.0);
        self.hit_entities.clear();
        self.notified = false;
        true
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn hit_entities(&self) -> &[Entity] {
        &self.hit_entities
    }

    pub fn can_hit(&self, target: Entity) -> bool {
        self.active && !self.hit_entities.contains(&target)
    }

    /// Регистрирует принятый урон. Returns true для первого попадания за
    /// activation (→ один `HitConfirmed`).
    pub fn register_hit(&mut self, target: Entity) -> bool {
        if !self.hit_entities.contains(&target) {
            self.hit_entities.push(target);
        }
        if self.notified {
            return false;
        }
        self.notified = true;
        true
    }

    pub fn shape(&self, owner: &Transform) -> OverlapSphere {
        OverlapSphere {
            center: owner.transform_point(self.offset),
            radius: self.radius,
        }
    }
}

/// `queryOverlap(shape, mask)`: hurtboxes, пересекающие сферу.
pub fn query_overlap<'a>(
    shape: OverlapSphere,
    mask: CollisionMask,
    candidates: impl IntoIterator<Item = (Entity, &'a Transform, &'a Hurtbox)>,
) -> Vec<Entity> {
    candidates
        .into_iter()
        .filter(|(_, _, hurtbox)| mask.intersects(hurtbox.layers))
        .filter(|(_, transform, hurtbox)| {
            let reach = shape.radius + hurtbox.radius;
            shape.center.distance_squared(hurtbox.center(transform)) <= reach * reach
        })
        .map(|(entity, _, _)| entity)
        .collect()
}

/// Событие: первый принятый урон за activation
#[derive(Event, Debug, Clone, Copy)]
pub struct HitConfirmed {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: f32,
}
