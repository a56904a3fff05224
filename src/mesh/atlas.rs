//! Lightmap atlas packing.

use tracing::debug;

use super::LevelSubmesh;
use crate::config::MeshConfig;
use crate::util::{Error, Result};

/// Placement returned by [`RectPacker::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedRect {
    pub x: u32,
    pub y: u32,
    /// Page index, counted from the packer's first page.
    pub page: usize,
}

#[derive(Clone, Debug)]
struct Shelf {
    y: u32,
    height: u32,
    /// Next free x on the shelf.
    cursor: u32,
}

#[derive(Clone, Debug, Default)]
struct Page {
    shelves: Vec<Shelf>,
    /// Height taken by shelves so far.
    used: u32,
}

/// Shelf packer over any number of fixed-size pages.
///
/// Rectangles go onto the first shelf that is tall enough and has room
/// left, then onto a new shelf of the first page with vertical room, then
/// onto a new page.
#[derive(Clone, Debug)]
pub struct RectPacker {
    width: u32,
    height: u32,
    pages: Vec<Page>,
}

impl RectPacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, pages: Vec::new() }
    }

    /// Pages opened so far.
    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    /// Place a `width` x `height` rectangle, opening pages as needed.
    ///
    /// Returns `None` only when the rectangle is larger than a page.
    pub fn insert(&mut self, width: u32, height: u32) -> Option<PackedRect> {
        self.insert_limited(width, height, None)
    }

    /// Like [`insert`](Self::insert) but never opens more than `max_pages`.
    pub fn insert_limited(&mut self, width: u32, height: u32, max_pages: Option<usize>) -> Option<PackedRect> {
        if width > self.width || height > self.height {
            return None;
        }

        for (page_index, page) in self.pages.iter_mut().enumerate() {
            for shelf in &mut page.shelves {
                if shelf.height >= height && self.width - shelf.cursor >= width {
                    let x = shelf.cursor;
                    shelf.cursor += width;
                    return Some(PackedRect { x, y: shelf.y, page: page_index });
                }
            }
        }

        for (page_index, page) in self.pages.iter_mut().enumerate() {
            if self.height - page.used >= height {
                return Some(Self::open_shelf(page, page_index, width, height));
            }
        }

        if max_pages.is_some_and(|max| self.pages.len() >= max) {
            return None;
        }
        let page_index = self.pages.len();
        self.pages.push(Page::default());
        let page = self.pages.last_mut()?;
        Some(Self::open_shelf(page, page_index, width, height))
    }

    fn open_shelf(page: &mut Page, page_index: usize, width: u32, height: u32) -> PackedRect {
        let y = page.used;
        page.used += height;
        page.shelves.push(Shelf { y, height, cursor: width });
        PackedRect { x: 0, y, page: page_index }
    }
}

/// Place every surface's tile in the atlas and turn its tile-local
/// lightmap coordinates into page UVs.
///
/// Pages are numbered from `start_index`. Fails with [`Error::AtlasFull`]
/// when a tile does not fit a page or the page limit is reached, and with
/// [`Error::InvalidConfig`] when a page number would overflow `u32`; the
/// surfaces placed before the failure keep their new coordinates.
///
/// Surfaces with an empty tile (no vertices) take no atlas space and keep
/// `page == None`.
#[tracing::instrument(skip_all, fields(surfaces = mesh.surfaces.len(), start_index))]
pub(crate) fn pack_lightmap_atlas(mesh: &mut LevelSubmesh, config: &MeshConfig, start_index: u32) -> Result<()> {
    let page_size = config.page_size;
    mesh.page_size = page_size;

    let mut order: Vec<usize> = (0..mesh.surfaces.len()).collect();
    order.sort_by(|&a, &b| {
        let (ta, tb) = (&mesh.surfaces[a].atlas_tile, &mesh.surfaces[b].atlas_tile);
        tb.height.cmp(&ta.height).then(tb.width.cmp(&ta.width))
    });

    let max_pages = config.max_pages.map(|m| m as usize);
    let mut packer = RectPacker::new(page_size, page_size);
    let scale = page_size as f32;

    for index in order {
        let surface = &mut mesh.surfaces[index];
        let tile = surface.atlas_tile;
        if tile.width == 0 || tile.height == 0 {
            continue;
        }
        let Some(placed) = packer.insert_limited(tile.width, tile.height, max_pages) else {
            return Err(Error::AtlasFull {
                width: tile.width,
                height: tile.height,
                page_size,
                pages: packer.num_pages(),
            });
        };

        let page = u32::try_from(placed.page)
            .ok()
            .and_then(|p| start_index.checked_add(p))
            .ok_or_else(|| Error::config(format!("lightmap page {start_index}+{} overflows", placed.page)))?;
        surface.atlas_tile.x = placed.x;
        surface.atlas_tile.y = placed.y;
        surface.atlas_tile.page = Some(page);

        let loc = surface.location;
        for v in &mut mesh.vertices[loc.start_vert..loc.start_vert + loc.num_verts] {
            v.lu = (v.lu + placed.x as f32) / scale;
            v.lv = (v.lv + placed.y as f32) / scale;
            v.lindex = page as f32;
        }
    }

    mesh.page_count = packer.num_pages();
    debug!(pages = mesh.page_count, "lightmap atlas packed");
    Ok(())
}
