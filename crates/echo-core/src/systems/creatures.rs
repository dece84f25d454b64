//! Creature system - patrol/alert state machine and contact damage

use hecs::World;
use rand::Rng;

use crate::components::{
    Behavior, Creature, Grid, Position, Vec2, Vehicle, ALERT_ARRIVAL_DISTANCE, CONTACT_COOLDOWN,
    PASSIVE_ALERT_DURATION, PATROL_ARRIVAL_DISTANCE,
};

/// Patrol steps stop when the creature is this close to its waypoint
const PATROL_STEP_EPSILON: f32 = 1.0;

/// Alert every creature that can hear a ping fired at `origin`.
/// Returns how many were alerted.
pub fn alert_creatures_to_ping(world: &mut World, origin: Vec2) -> usize {
    let mut alerted = 0;
    for (_, (pos, creature)) in world.query_mut::<(&Position, &mut Creature)>() {
        if creature.hear_ping(pos.0, origin) {
            alerted += 1;
        }
    }
    alerted
}

/// Advance every creature by `dt`: cooldowns, alert charges, passive
/// detection and patrol wandering
pub fn creature_system(
    world: &mut World,
    grid: &Grid,
    vehicle_pos: Vec2,
    vehicle_silent: bool,
    dt: f32,
    rng: &mut impl Rng,
) {
    for (_, (pos, creature)) in world.query_mut::<(&mut Position, &mut Creature)>() {
        if creature.contact_cooldown > 0.0 {
            creature.contact_cooldown = (creature.contact_cooldown - dt).max(0.0);
        }

        match creature.behavior {
            Behavior::Alerted => charge(pos, creature, grid, dt),
            Behavior::Patrolling => {
                patrol(pos, creature, grid, vehicle_pos, vehicle_silent, dt, rng)
            }
        }
    }
}

fn charge(pos: &mut Position, creature: &mut Creature, grid: &Grid, dt: f32) {
    creature.alert_timer -= dt;

    let to_target = creature.ping_target - pos.0;
    let dist = to_target.length();
    if dist > ALERT_ARRIVAL_DISTANCE {
        let speed = creature.speed * creature.params().charge_multiplier;
        let next = pos.0 + to_target.normalize() * (speed * dt);
        // Walls halt the charge without ending it
        if !grid.is_wall_at(next) {
            pos.0 = next;
        }
    }

    if creature.alert_timer <= 0.0 || dist <= ALERT_ARRIVAL_DISTANCE {
        creature.calm();
    }
}

fn patrol(
    pos: &mut Position,
    creature: &mut Creature,
    grid: &Grid,
    vehicle_pos: Vec2,
    vehicle_silent: bool,
    dt: f32,
    rng: &mut impl Rng,
) {
    let params = creature.params();

    let needs_waypoint = match creature.patrol_target {
        None => true,
        Some(target) => pos.0.distance(&target) < PATROL_ARRIVAL_DISTANCE,
    };
    if needs_waypoint {
        let r = params.patrol_radius;
        let offset = Vec2::new(rng.gen_range(-r..=r), rng.gen_range(-r..=r));
        creature.patrol_target = Some(pos.0 + offset);
    }

    if let Some(range) = params.detect_range {
        if !vehicle_silent && pos.0.distance(&vehicle_pos) < range {
            creature.alert_toward(vehicle_pos, PASSIVE_ALERT_DURATION);
            return;
        }
    }

    let Some(target) = creature.patrol_target else {
        return;
    };
    let to_target = target - pos.0;
    if to_target.length() > PATROL_STEP_EPSILON {
        let next = pos.0 + to_target.normalize() * (creature.speed * dt);
        if grid.is_wall_at(next) {
            creature.patrol_target = None;
        } else {
            pos.0 = next;
        }
    }
}

/// Apply contact hits to the vehicle. Returns total damage dealt.
pub fn contact_damage_system(world: &mut World, vehicle: &mut Vehicle) -> f32 {
    let mut dealt = 0.0;
    for (_, (pos, creature)) in world.query_mut::<(&Position, &mut Creature)>() {
        if vehicle.is_invulnerable() || creature.contact_cooldown > 0.0 {
            continue;
        }
        if pos.0.distance(&vehicle.position) < creature.params().contact_radius {
            vehicle.take_damage(creature.contact_damage);
            creature.contact_cooldown = CONTACT_COOLDOWN;
            dealt += creature.contact_damage;
        }
    }
    dealt
}
