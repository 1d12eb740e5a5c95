/// A 2D grid stored in row-major order. Edges do not wrap.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

/// Integer grid coordinate `(x, y)`.
pub type GridPoint = (usize, usize);

/// Orthogonal offsets in N, E, S, W order.
pub const ORTHOGONAL_OFFSETS: [(i64, i64); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Diagonal offsets in NE, SE, SW, NW order.
pub const DIAGONAL_OFFSETS: [(i64, i64); 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

/// All 8 neighbor offsets, row by row.
pub const ALL_OFFSETS: [(i64, i64); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build a map by evaluating `f` at every coordinate, row by row.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Fill the entire map with a value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Get a cell by signed coordinate, `None` when outside the map.
    pub fn get_checked(&self, x: i64, y: i64) -> Option<&T> {
        if self.in_bounds(x, y) {
            Some(self.get(x as usize, y as usize))
        } else {
            None
        }
    }

    /// Translate a point by an offset, `None` when the result leaves the map.
    pub fn offset(&self, (x, y): GridPoint, (dx, dy): (i64, i64)) -> Option<GridPoint> {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        self.in_bounds(nx, ny).then_some((nx as usize, ny as usize))
    }

    /// Whether the cell touches the outer border of the map.
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    fn collect_offsets(&self, point: GridPoint, offsets: &[(i64, i64)]) -> Vec<GridPoint> {
        offsets
            .iter()
            .filter_map(|&offset| self.offset(point, offset))
            .collect()
    }

    /// Orthogonal (4-connected) neighbors inside the map.
    pub fn neighbors(&self, x: usize, y: usize) -> Vec<GridPoint> {
        self.collect_offsets((x, y), &ORTHOGONAL_OFFSETS)
    }

    /// Diagonal neighbors inside the map.
    pub fn diagonal_neighbors(&self, x: usize, y: usize) -> Vec<GridPoint> {
        self.collect_offsets((x, y), &DIAGONAL_OFFSETS)
    }

    /// All 8-connected neighbors inside the map.
    pub fn neighbors_8(&self, x: usize, y: usize) -> Vec<GridPoint> {
        self.collect_offsets((x, y), &ALL_OFFSETS)
    }

    /// Count 8-connected neighbors matching a predicate. Cells off the map are not counted.
    pub fn count_neighbors_8(&self, x: usize, y: usize, mut pred: impl FnMut(&T) -> bool) -> usize {
        ALL_OFFSETS
            .iter()
            .filter_map(|&(dx, dy)| self.get_checked(x as i64 + dx, y as i64 + dy))
            .filter(|value| pred(value))
            .count()
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }

    /// Copy out a `width` x `height` window whose top-left corner is `(x0, y0)`.
    pub fn crop(&self, x0: usize, y0: usize, width: usize, height: usize) -> Self {
        debug_assert!(x0 + width <= self.width && y0 + height <= self.height);
        Self::from_fn(width, height, |x, y| self.get(x0 + x, y0 + y).clone())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Tilemap<f32> {
    /// Minimum and maximum value in the map.
    pub fn min_max(&self) -> (f32, f32) {
        self.data.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    /// Linearly rescale all values into `[0, 1]`. A flat map becomes all zeros.
    pub fn normalize(&mut self) {
        let (min_h, max_h) = self.min_max();
        let range = max_h - min_h;
        if range <= f32::EPSILON {
            self.fill(0.0);
            return;
        }
        for value in self.data.iter_mut() {
            *value = (*value - min_h) / range;
        }
    }
}

impl Tilemap<bool> {
    /// Number of `true` cells.
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Rotate the grid 90 degrees clockwise.
    pub fn rotated_clockwise(&self) -> Self {
        let (w, h) = (self.width, self.height);
        Self::from_fn(h, w, |x, y| *self.get(y, h - 1 - x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_clip_at_edges() {
        let map = Tilemap::new_with(4, 3, 0u8);
        assert_eq!(map.neighbors(0, 0).len(), 2);
        assert_eq!(map.neighbors_8(0, 0).len(), 3);
        assert_eq!(map.neighbors_8(1, 1).len(), 8);
        assert_eq!(map.diagonal_neighbors(3, 2), vec![(2, 1)]);
    }

    #[test]
    fn test_get_checked_rejects_out_of_bounds() {
        let map = Tilemap::new_with(2, 2, 7);
        assert_eq!(map.get_checked(-1, 0), None);
        assert_eq!(map.get_checked(1, 2), None);
        assert_eq!(map.get_checked(1, 1), Some(&7));
    }

    #[test]
    fn test_normalize_rescales_to_unit_range() {
        let mut map = Tilemap::from_fn(3, 1, |x, _| x as f32 * 10.0 - 5.0);
        map.normalize();
        assert_eq!(*map.get(0, 0), 0.0);
        assert_eq!(*map.get(1, 0), 0.5);
        assert_eq!(*map.get(2, 0), 1.0);
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let mut mask = Tilemap::new_with(3, 1, false);
        mask.set(0, 0, true);
        let rotated = mask.rotated_clockwise();
        assert_eq!((rotated.width, rotated.height), (1, 3));
        assert!(*rotated.get(0, 0));
        assert_eq!(rotated.count_set(), 1);
    }

    #[test]
    fn test_crop_copies_window() {
        let map = Tilemap::from_fn(5, 5, |x, y| x + y * 10);
        let cropped = map.crop(1, 2, 2, 2);
        assert_eq!(*cropped.get(0, 0), 21);
        assert_eq!(*cropped.get(1, 1), 32);
    }
}
