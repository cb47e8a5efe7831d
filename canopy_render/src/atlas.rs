// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture atlases: shelf-packed shape tiles and fixed-size node slots.

use kurbo::Rect;

use crate::canvas::{Canvas, TextureId};

/// Side of an atlas page in pixels.
pub const MAX_TEXTURE_SIZE: u32 = 8192;

/// A rectangle of one atlas page.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AtlasSlot {
    /// Page texture.
    pub texture: TextureId,
    /// Pixel rectangle inside the page.
    pub rect: Rect,
}

#[derive(Copy, Clone, Debug)]
struct ShelfPage {
    texture: TextureId,
    cursor_x: u32,
    shelf_y: u32,
    shelf_h: u32,
}

/// Packs variable-size rectangles into rows ("shelves") of square pages.
///
/// Only the newest page is filled; space left on older pages is not reclaimed.
#[derive(Clone, Debug)]
pub struct ShelfAtlas {
    page_size: u32,
    pages: Vec<ShelfPage>,
}

impl Default for ShelfAtlas {
    fn default() -> Self {
        Self::new(MAX_TEXTURE_SIZE)
    }
}

impl ShelfAtlas {
    /// An atlas whose pages are `page_size` pixels square. Pages are created on demand.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
        }
    }

    /// Number of pages created so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Reserve `width` x `height` pixels. `None` if the rectangle exceeds a page.
    pub fn allocate<C: Canvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        width: u32,
        height: u32,
    ) -> Option<AtlasSlot> {
        if width == 0 || height == 0 || width > self.page_size || height > self.page_size {
            return None;
        }
        let size = self.page_size;
        if let Some(page) = self.pages.last_mut() {
            if let Some(slot) = place(page, size, width, height) {
                return Some(slot);
            }
        }
        let texture = canvas.create_texture(size, size);
        log::debug!("shape atlas: new page {texture:?}");
        let mut page = ShelfPage {
            texture,
            cursor_x: 0,
            shelf_y: 0,
            shelf_h: 0,
        };
        let slot = place(&mut page, size, width, height);
        self.pages.push(page);
        slot
    }

    /// Free every page.
    pub fn release<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        for page in self.pages.drain(..) {
            canvas.release_texture(page.texture);
        }
    }
}

fn place(page: &mut ShelfPage, size: u32, width: u32, height: u32) -> Option<AtlasSlot> {
    if page.cursor_x + width > size {
        page.shelf_y += page.shelf_h;
        page.cursor_x = 0;
        page.shelf_h = 0;
    }
    if page.shelf_y + height > size {
        return None;
    }
    let rect = Rect::new(
        f64::from(page.cursor_x),
        f64::from(page.shelf_y),
        f64::from(page.cursor_x + width),
        f64::from(page.shelf_y + height),
    );
    page.cursor_x += width;
    page.shelf_h = page.shelf_h.max(height);
    Some(AtlasSlot {
        texture: page.texture,
        rect,
    })
}

/// Index of a fixed-size slot in a [`SlotAtlas`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotIndex(pub u32);

/// Square slots of one size laid out row-major over square pages.
#[derive(Clone, Debug)]
pub struct SlotAtlas {
    slot_size: u32,
    per_row: u32,
    pages: Vec<TextureId>,
    next: u32,
    free: Vec<SlotIndex>,
}

impl SlotAtlas {
    /// Slots of `slot_size` pixels on pages of `page_size` pixels.
    ///
    /// Panics if a slot does not fit on a page.
    pub fn new(slot_size: u32, page_size: u32) -> Self {
        assert!(
            slot_size > 0 && slot_size <= page_size,
            "slot size must be in 1..=page size"
        );
        Self {
            slot_size,
            per_row: page_size / slot_size,
            pages: Vec::new(),
            next: 0,
            free: Vec::new(),
        }
    }

    /// Slots per page.
    pub fn slots_per_page(&self) -> u32 {
        self.per_row * self.per_row
    }

    /// Number of pages created so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Take a slot, reusing freed ones first and creating a page when needed.
    pub fn assign<C: Canvas + ?Sized>(&mut self, canvas: &mut C) -> SlotIndex {
        let index = self.free.pop().unwrap_or_else(|| {
            let i = SlotIndex(self.next);
            self.next += 1;
            i
        });
        let page = (index.0 / self.slots_per_page()) as usize;
        while self.pages.len() <= page {
            let side = self.per_row * self.slot_size;
            let texture = canvas.create_texture(side, side);
            log::debug!("node atlas: new page {texture:?}");
            self.pages.push(texture);
        }
        index
    }

    /// Give a slot back.
    pub fn free(&mut self, index: SlotIndex) {
        self.free.push(index);
    }

    /// Page and pixel rectangle of an assigned slot.
    pub fn slot(&self, index: SlotIndex) -> Option<AtlasSlot> {
        let per_page = self.slots_per_page();
        let texture = *self.pages.get((index.0 / per_page) as usize)?;
        let n = index.0 % per_page;
        let (x, y) = (n % self.per_row, n / self.per_row);
        let s = f64::from(self.slot_size);
        let rect = Rect::from_origin_size(
            (f64::from(x) * s, f64::from(y) * s),
            (s, s),
        );
        Some(AtlasSlot { texture, rect })
    }

    /// Free every page and forget every slot.
    pub fn release<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        for texture in self.pages.drain(..) {
            canvas.release_texture(texture);
        }
        self.next = 0;
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordingCanvas;

    #[test]
    fn shelves_wrap_and_pages_grow() {
        let mut canvas = RecordingCanvas::new();
        let mut atlas = ShelfAtlas::new(100);
        let a = atlas.allocate(&mut canvas, 60, 30).unwrap();
        let b = atlas.allocate(&mut canvas, 30, 50).unwrap();
        let c = atlas.allocate(&mut canvas, 60, 10).unwrap();
        assert_eq!(a.rect, Rect::new(0.0, 0.0, 60.0, 30.0));
        assert_eq!(b.rect, Rect::new(60.0, 0.0, 90.0, 50.0));
        // Next shelf starts under the tallest tile of the first one.
        assert_eq!(c.rect, Rect::new(0.0, 50.0, 60.0, 60.0));
        assert_eq!(atlas.page_count(), 1);

        let d = atlas.allocate(&mut canvas, 100, 60).unwrap();
        assert_eq!(atlas.page_count(), 2);
        assert_ne!(d.texture, a.texture);
        assert!(atlas.allocate(&mut canvas, 101, 1).is_none());

        atlas.release(&mut canvas);
        assert!(canvas.textures().is_empty());
    }

    #[test]
    fn slots_are_row_major_and_reused() {
        let mut canvas = RecordingCanvas::new();
        let mut atlas = SlotAtlas::new(100, 250);
        assert_eq!(atlas.slots_per_page(), 4);
        let slots: Vec<_> = (0..5).map(|_| atlas.assign(&mut canvas)).collect();
        assert_eq!(atlas.page_count(), 2);
        assert_eq!(
            atlas.slot(slots[3]).unwrap().rect,
            Rect::new(100.0, 100.0, 200.0, 200.0)
        );
        let fifth = atlas.slot(slots[4]).unwrap();
        assert_eq!(fifth.rect, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_ne!(fifth.texture, atlas.slot(slots[0]).unwrap().texture);

        atlas.free(slots[1]);
        assert_eq!(atlas.assign(&mut canvas), slots[1]);
        assert_eq!(canvas.textures().len(), 2);
        assert_eq!(canvas.textures()[0].1, 200);
    }
}
