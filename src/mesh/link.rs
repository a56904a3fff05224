//! Side and subsector to surface back-references.

use smallvec::SmallVec;

use super::{LevelSubmesh, SurfaceType};
use crate::level::Level;

/// Surface slots of one side or subsector plane. Unused slots are `None`.
type Slots = SmallVec<[Option<usize>; 4]>;

fn set_slot(slots: &mut Slots, slot: usize, surface: usize) {
    if slots.len() <= slot {
        slots.resize(slot + 1, None);
    }
    slots[slot] = Some(surface);
}

/// Which surface renders each part of the level.
///
/// Side slots: 0 upper, 1 and 2 middle, 3 lower, `4 + i` the side of 3D
/// floor `i` of the side's sector. Subsector slots per plane (floor, ceiling):
/// 0 the sector's own flat, `i + 1` the face of 3D floor `i` lying in that
/// plane's direction.
#[derive(Clone, Debug, Default)]
pub struct SurfaceLinks {
    sides: Vec<Slots>,
    subsectors: Vec<[Slots; 2]>,
    sector_has_lightmaps: Vec<bool>,
}

impl SurfaceLinks {
    /// Empty table sized for a level.
    pub fn new(level: &Level) -> Self {
        Self {
            sides: vec![Slots::new(); level.sides.len()],
            subsectors: vec![[Slots::new(), Slots::new()]; level.subsectors.len()],
            sector_has_lightmaps: vec![false; level.sectors.len()],
        }
    }

    /// Number of sides tracked.
    pub fn sides(&self) -> usize {
        self.sides.len()
    }

    /// Surface in a side slot.
    pub fn side_slot(&self, side: usize, slot: usize) -> Option<usize> {
        self.sides.get(side)?.get(slot).copied().flatten()
    }

    /// Surface in a subsector plane slot; plane 0 is the floor, 1 the ceiling.
    pub fn subsector_slot(&self, subsector: usize, plane: usize, slot: usize) -> Option<usize> {
        self.subsectors.get(subsector)?.get(plane)?.get(slot).copied().flatten()
    }

    /// Distinct surfaces linked to a side, in slot order.
    pub fn side(&self, side: usize) -> impl Iterator<Item = usize> + '_ {
        let mut linked: SmallVec<[usize; 4]> =
            self.sides.get(side).into_iter().flatten().flatten().copied().collect();
        linked.dedup();
        linked.into_iter()
    }

    /// Surfaces linked to a subsector, floor slots first.
    pub fn subsector(&self, subsector: usize) -> impl Iterator<Item = usize> + '_ {
        self.subsectors
            .get(subsector)
            .into_iter()
            .flat_map(|planes| planes.iter())
            .flatten()
            .flatten()
            .copied()
    }

    pub fn sector_has_lightmaps(&self, sector: usize) -> bool {
        self.sector_has_lightmaps.get(sector).copied().unwrap_or(false)
    }
}

/// Register every surface of the submesh with its side or subsector.
pub(crate) fn link_surfaces(mesh: &mut LevelSubmesh, level: &Level) {
    let mut links = SurfaceLinks::new(level);
    for (index, surface) in mesh.surfaces.iter().enumerate() {
        if surface.ty.is_flat() {
            link_subsector(&mut links, level, index, surface.ty, surface.type_index, surface.control_sector);
        } else {
            link_side(&mut links, level, index, surface.ty, surface.type_index, surface.control_sector);
        }
    }
    mesh.links = links;
}

fn link_subsector(
    links: &mut SurfaceLinks,
    level: &Level,
    index: usize,
    ty: SurfaceType,
    subsector: usize,
    control: Option<usize>,
) {
    let sector_index = level.subsectors[subsector].sector;
    links.sector_has_lightmaps[sector_index] = true;

    let ceiling = ty == SurfaceType::Ceiling;
    let planes = &mut links.subsectors[subsector];
    match control {
        None => set_slot(&mut planes[usize::from(ceiling)], 0, index),
        Some(model) => {
            // A 3D floor's ceiling faces down into the floor slot list and vice versa.
            let plane = usize::from(!ceiling);
            for (i, ffloor) in level.sectors[sector_index].ffloors.iter().enumerate() {
                if ffloor.model == model {
                    set_slot(&mut planes[plane], i + 1, index);
                }
            }
        }
    }
}

fn link_side(
    links: &mut SurfaceLinks,
    level: &Level,
    index: usize,
    ty: SurfaceType,
    side: usize,
    control: Option<usize>,
) {
    let slots = &mut links.sides[side];
    match control {
        None => match ty {
            SurfaceType::UpperSide => set_slot(slots, 0, index),
            SurfaceType::MiddleSide => {
                set_slot(slots, 1, index);
                set_slot(slots, 2, index);
            }
            SurfaceType::LowerSide => set_slot(slots, 3, index),
            SurfaceType::Floor | SurfaceType::Ceiling => {}
        },
        Some(model) => {
            let sector = &level.sectors[level.sides[side].sector];
            let mut linked = false;
            for (i, ffloor) in sector.ffloors.iter().enumerate() {
                if ffloor.model == model {
                    set_slot(slots, 4 + i, index);
                    linked = true;
                }
            }
            if !linked {
                tracing::trace!(side, model, "3D floor side has no matching floor in its sector");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{LevelBuilder, SectorDef};
    use crate::mesh::LevelMeshSurface;
    use glam::Vec2;

    fn flat(ty: SurfaceType, subsector: usize, control: Option<usize>) -> LevelMeshSurface {
        let mut s = LevelMeshSurface::new(ty, subsector);
        s.subsector = Some(subsector);
        s.control_sector = control;
        s
    }

    fn wall(ty: SurfaceType, side: usize, control: Option<usize>) -> LevelMeshSurface {
        let mut s = LevelMeshSurface::new(ty, side);
        s.side = Some(side);
        s.control_sector = control;
        s
    }

    fn level_with_ffloor() -> (Level, usize, usize) {
        let mut b = LevelBuilder::new();
        let model = b.add_sector(SectorDef::new(32.0, 64.0));
        let other = b.add_sector(SectorDef::new(0.0, 8.0));
        let room = b.add_sector(SectorDef::new(0.0, 128.0).ffloor(other, None).ffloor(model, None));
        b.add_rect(room, Vec2::ZERO, Vec2::splat(64.0));
        (b.build(), room, model)
    }

    #[test]
    fn test_plain_slots() {
        let (level, room, _) = level_with_ffloor();
        let mut mesh = LevelSubmesh::default();
        mesh.surfaces = vec![
            flat(SurfaceType::Floor, 0, None),
            flat(SurfaceType::Ceiling, 0, None),
            wall(SurfaceType::UpperSide, 0, None),
            wall(SurfaceType::MiddleSide, 1, None),
            wall(SurfaceType::LowerSide, 2, None),
        ];
        link_surfaces(&mut mesh, &level);
        let links = &mesh.links;

        assert!(links.sector_has_lightmaps(room));
        assert!(!links.sector_has_lightmaps(0));
        assert_eq!(links.subsector_slot(0, 0, 0), Some(0));
        assert_eq!(links.subsector_slot(0, 1, 0), Some(1));
        assert_eq!(links.side_slot(0, 0), Some(2));
        assert_eq!(links.side_slot(1, 1), Some(3));
        assert_eq!(links.side_slot(1, 2), Some(3));
        assert_eq!(links.side_slot(2, 3), Some(4));
        assert_eq!(links.side(1).collect::<Vec<_>>(), vec![3]);
        assert_eq!(links.subsector(0).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_control_sector_slots() {
        let (level, _, model) = level_with_ffloor();
        let mut mesh = LevelSubmesh::default();
        mesh.surfaces = vec![
            flat(SurfaceType::Floor, 0, Some(model)),
            flat(SurfaceType::Ceiling, 0, Some(model)),
            wall(SurfaceType::MiddleSide, 0, Some(model)),
        ];
        link_surfaces(&mut mesh, &level);
        let links = &mesh.links;

        // The model is the room's second 3D floor.
        assert_eq!(links.subsector_slot(0, 1, 2), Some(0));
        assert_eq!(links.subsector_slot(0, 0, 2), Some(1));
        assert_eq!(links.subsector_slot(0, 0, 0), None);
        assert_eq!(links.side_slot(0, 5), Some(2));
        assert_eq!(links.side_slot(0, 1), None);
    }

    #[test]
    fn test_unmatched_control_sector_left_unlinked() {
        let (level, _, _) = level_with_ffloor();
        let mut mesh = LevelSubmesh::default();
        mesh.surfaces = vec![wall(SurfaceType::MiddleSide, 0, Some(2))];
        link_surfaces(&mut mesh, &level);
        assert_eq!(mesh.links.side(0).count(), 0);
    }
}
