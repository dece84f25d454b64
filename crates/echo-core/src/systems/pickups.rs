//! Pickup system - specimen collection

use hecs::{Entity, World};

use crate::components::{Position, Specimen, Vec2};

/// Collect the single nearest uncollected specimen within `radius` of
/// `position`. Returns the collected entity.
pub fn collect_nearest(world: &mut World, position: Vec2, radius: f32) -> Option<Entity> {
    let mut nearest: Option<(Entity, f32)> = None;
    for (entity, (pos, specimen)) in world.query::<(&Position, &Specimen)>().iter() {
        if specimen.collected {
            continue;
        }
        let dist = pos.0.distance(&position);
        if dist < radius && nearest.map_or(true, |(_, best)| dist < best) {
            nearest = Some((entity, dist));
        }
    }

    let (entity, _) = nearest?;
    if let Ok(mut specimen) = world.get::<&mut Specimen>(entity) {
        specimen.collected = true;
    }
    Some(entity)
}

/// Specimens still waiting in the level
pub fn remaining_specimens(world: &World) -> usize {
    world
        .query::<&Specimen>()
        .iter()
        .filter(|(_, s)| !s.collected)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_nearest_only() {
        let mut world = World::new();
        let near = world.spawn((Position::new(110.0, 100.0), Specimen::default()));
        let other = world.spawn((Position::new(130.0, 100.0), Specimen::default()));

        let got = collect_nearest(&mut world, Vec2::new(100.0, 100.0), 50.0);
        assert_eq!(got, Some(near));
        assert!(world.get::<&Specimen>(near).unwrap().collected);
        assert!(!world.get::<&Specimen>(other).unwrap().collected);
        assert_eq!(remaining_specimens(&world), 1);

        assert_eq!(
            collect_nearest(&mut world, Vec2::new(100.0, 100.0), 50.0),
            Some(other)
        );
        assert_eq!(collect_nearest(&mut world, Vec2::new(100.0, 100.0), 50.0), None);
    }

    #[test]
    fn test_out_of_radius() {
        let mut world = World::new();
        world.spawn((Position::new(200.0, 100.0), Specimen::default()));
        assert_eq!(collect_nearest(&mut world, Vec2::new(100.0, 100.0), 50.0), None);
        assert_eq!(remaining_specimens(&world), 1);
    }
}
