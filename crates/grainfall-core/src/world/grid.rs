//! Cell store - fixed-size 2D grid of cells
//!
//! Coordinates are `i32` with `(0, 0)` at the top-left; `y` grows downward,
//! so "falling" means `y + 1`. Reads outside the grid return `None`, writes
//! outside the grid are dropped.

use glam::IVec2;

use crate::simulation::{Cell, CellData, MaterialDef, MaterialId, Materials, Phase, cell_flags};

/// 2D array of cells with a running count of non-empty cells
#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    /// Cell data, row-major order
    /// Index = y * width + x
    cells: Vec<Cell>,
    non_empty: usize,
}

impl Grid {
    /// Grid of empty cells
    ///
    /// Sizes whose cell count does not fit an `i32` index are clamped.
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = match Self::cell_count(width, height) {
            Some(_) => (width as i32, height as i32),
            None => {
                let w = width.min(i32::MAX as u32) as i32;
                let h = (height.min(i32::MAX as u32) as i32).min(i32::MAX / w.max(1));
                log::warn!("Grid {}x{} is too large, clamped to {}x{}", width, height, w, h);
                (w, h)
            }
        };
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width as usize * height as usize],
            non_empty: 0,
        }
    }

    /// Number of cells in a `width` x `height` grid, `None` when it overflows
    /// the grid's `i32` indexing
    pub fn cell_count(width: u32, height: u32) -> Option<usize> {
        let count = (width as usize).checked_mul(height as usize)?;
        let fits = |n: usize| n <= i32::MAX as usize;
        (fits(width as usize) && fits(height as usize) && fits(count)).then_some(count)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    /// Get cell at grid coordinates
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Material id at grid coordinates
    #[inline]
    pub fn material_at(&self, x: i32, y: i32) -> Option<u16> {
        self.get(x, y).map(|c| c.material)
    }

    /// True only for in-bounds empty cells
    #[inline]
    pub fn is_empty_at(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(Cell::is_empty)
    }

    /// Mutable access to a cell's auxiliary data
    ///
    /// Material and lifetime are only changed through [`Grid::set`] so the
    /// non-empty counter stays correct.
    pub fn data_mut(&mut self, x: i32, y: i32) -> Option<&mut CellData> {
        self.index(x, y).map(|i| &mut self.cells[i].data)
    }

    /// Replace the material at a position
    ///
    /// Resets lifetime to the material's default, clears the updated flag and
    /// the auxiliary data.
    pub fn set(&mut self, x: i32, y: i32, material: &MaterialDef) {
        self.set_with_data(x, y, material, CellData::None);
    }

    /// [`Grid::set`] with initial auxiliary data
    pub fn set_with_data(&mut self, x: i32, y: i32, material: &MaterialDef, data: CellData) {
        let Some(i) = self.index(x, y) else {
            return;
        };

        let was_empty = self.cells[i].is_empty();
        let mut cell = Cell::new(material);
        cell.data = data;
        self.cells[i] = cell;

        match (was_empty, cell.is_empty()) {
            (true, false) => self.non_empty += 1,
            (false, true) => self.non_empty -= 1,
            _ => {}
        }
    }

    /// Set by material id. Unknown ids are a no-op.
    pub fn set_id(&mut self, materials: &Materials, x: i32, y: i32, material_id: u16) -> bool {
        match materials.get(material_id) {
            Some(def) => {
                self.set(x, y, def);
                true
            }
            None => {
                log::warn!("set_id: unknown material {} at ({}, {})", material_id, x, y);
                false
            }
        }
    }

    /// Turn a cell empty
    pub fn clear(&mut self, x: i32, y: i32) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if !self.cells[i].is_empty() {
            self.non_empty -= 1;
        }
        self.cells[i] = Cell::EMPTY;
    }

    /// Exchange two cells' full state and mark the destination as updated
    ///
    /// Returns false (and changes nothing) if either position is out of bounds.
    pub fn swap(&mut self, ax: i32, ay: i32, bx: i32, by: i32) -> bool {
        let (Some(a), Some(b)) = (self.index(ax, ay), self.index(bx, by)) else {
            return false;
        };
        self.cells.swap(a, b);
        self.cells[b].flags |= cell_flags::UPDATED;
        true
    }

    /// Whether the cell at `from` may move into `to`
    ///
    /// True if `to` is empty, or if the mover is strictly denser than a
    /// movable destination. Powders never displace powders, which keeps piles
    /// of different powders from trickling through each other.
    pub fn can_move_to(&self, materials: &Materials, from: IVec2, to: IVec2) -> bool {
        let (Some(src), Some(dst)) = (self.get(from.x, from.y), self.get(to.x, to.y)) else {
            return false;
        };
        if src.is_empty() {
            return false;
        }
        if dst.is_empty() {
            return true;
        }

        let (Some(src_material), Some(dst_material)) =
            (materials.get(src.material), materials.get(dst.material))
        else {
            return false;
        };

        if src_material.phase == Phase::Powder && dst_material.phase == Phase::Powder {
            return false;
        }

        dst_material.movable && src_material.density > dst_material.density
    }

    /// Count down the lifetime of a cell; returns true if it expired and was emptied
    pub fn tick_lifetime(&mut self, x: i32, y: i32) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        let cell = &mut self.cells[i];
        if cell.lifetime <= 0 {
            return false;
        }
        cell.lifetime -= 1;
        if cell.lifetime == 0 {
            self.clear(x, y);
            return true;
        }
        false
    }

    #[inline]
    pub fn is_updated(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(Cell::is_updated)
    }

    pub fn mark_updated(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.cells[i].flags |= cell_flags::UPDATED;
        }
    }

    /// Clear the updated flag on every cell
    pub fn clear_updated_flags(&mut self) {
        for cell in &mut self.cells {
            cell.flags &= !cell_flags::UPDATED;
        }
    }

    /// Running count of non-empty cells
    #[inline]
    pub fn count_non_empty(&self) -> usize {
        self.non_empty
    }

    /// Count non-empty cells by scanning the grid
    pub fn recount_non_empty(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    /// Fill an axis-aligned rectangle (clipped to the grid)
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, material: &MaterialDef) {
        for yy in y.max(0)..(y + h).min(self.height) {
            for xx in x.max(0)..(x + w).min(self.width) {
                self.set(xx, yy, material);
            }
        }
    }

    /// Circular brush, the way input tools paint into the grid
    pub fn paint_circle(&mut self, cx: i32, cy: i32, radius: i32, material: &MaterialDef) {
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= r2 {
                    self.set(cx + dx, cy + dy, material);
                }
            }
        }
    }

    /// All cells, row-major
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Material ids row-major, the order persistence writes them in
    pub fn material_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.cells.iter().map(|c| c.material)
    }

    /// Count cells of one material (debugging and tests)
    pub fn count_material(&self, material_id: u16) -> usize {
        if material_id == MaterialId::EMPTY {
            return self.cells.len() - self.non_empty;
        }
        self.cells
            .iter()
            .filter(|c| c.material == material_id)
            .count()
    }
}
