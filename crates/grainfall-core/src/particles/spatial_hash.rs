//! Uniform spatial hash for particle neighbour queries
//!
//! Buckets cover the world in square cells of `cell_size`. Positions outside
//! the world are clamped into the border buckets.

use glam::Vec2;
use smallvec::SmallVec;

type Bucket = SmallVec<[usize; 8]>;

pub struct SpatialHash {
    cell_size: f32,
    cols: i32,
    rows: i32,
    buckets: Vec<Bucket>,
    /// Bucket currently holding each particle index
    location: Vec<Option<usize>>,
}

impl SpatialHash {
    pub fn new(world_width: f32, world_height: f32, cell_size: f32, capacity: usize) -> Self {
        let cell_size = cell_size.max(f32::EPSILON);
        let cols = ((world_width / cell_size).ceil() as i32).max(1);
        let rows = ((world_height / cell_size).ceil() as i32).max(1);
        Self {
            cell_size,
            cols,
            rows,
            buckets: vec![Bucket::new(); (cols * rows) as usize],
            location: vec![None; capacity],
        }
    }

    #[inline]
    fn coords(&self, pos: Vec2) -> (i32, i32) {
        let cx = ((pos.x / self.cell_size).floor() as i32).clamp(0, self.cols - 1);
        let cy = ((pos.y / self.cell_size).floor() as i32).clamp(0, self.rows - 1);
        (cx, cy)
    }

    #[inline]
    fn bucket_of(&self, pos: Vec2) -> usize {
        let (cx, cy) = self.coords(pos);
        (cy * self.cols + cx) as usize
    }

    pub fn insert(&mut self, index: usize, pos: Vec2) {
        if index >= self.location.len() {
            self.location.resize(index + 1, None);
        }
        if self.location[index].is_some() {
            self.update(index, pos);
            return;
        }
        let bucket = self.bucket_of(pos);
        self.buckets[bucket].push(index);
        self.location[index] = Some(bucket);
    }

    /// Move an index to the bucket for `pos`; returns true if the bucket changed
    pub fn update(&mut self, index: usize, pos: Vec2) -> bool {
        let bucket = self.bucket_of(pos);
        match self.location.get(index).copied().flatten() {
            Some(current) if current == bucket => false,
            Some(current) => {
                Self::take_from(&mut self.buckets[current], index);
                self.buckets[bucket].push(index);
                self.location[index] = Some(bucket);
                true
            }
            None => {
                self.insert(index, pos);
                true
            }
        }
    }

    pub fn remove(&mut self, index: usize) {
        if let Some(bucket) = self.location.get_mut(index).and_then(Option::take) {
            Self::take_from(&mut self.buckets[bucket], index);
        }
    }

    fn take_from(bucket: &mut Bucket, index: usize) {
        if let Some(i) = bucket.iter().position(|&j| j == index) {
            bucket.swap_remove(i);
        }
    }

    /// Collect indices from every bucket touching the square around `pos`
    ///
    /// The result is a superset of the particles within `radius`; callers
    /// filter by exact distance.
    pub fn query(&self, pos: Vec2, radius: f32, out: &mut Vec<usize>) {
        out.clear();
        let (x0, y0) = self.coords(pos - Vec2::splat(radius));
        let (x1, y1) = self.coords(pos + Vec2::splat(radius));
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                out.extend_from_slice(&self.buckets[(cy * self.cols + cx) as usize]);
            }
        }
    }

    /// Number of indexed particles
    pub fn len(&self) -> usize {
        self.location.iter().filter(|l| l.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.location.fill(None);
    }
}
