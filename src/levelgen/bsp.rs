//! Binary space partition tree: regions, rooms and corridors.
//!
//! Trees are built as values. [`BspNode::partition`] splits top-down, then
//! [`BspNode::furnish`] consumes the bare tree and returns one with a room in
//! every leaf and a corridor on every internal node.

use crate::grid::GridPos;
use rand::Rng;

/// Aspect ratio beyond which a region is always cut across its long axis.
const FORCED_SPLIT_RATIO: f32 = 1.25;

/// Axis-aligned rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True if `room` sits inside this region with a free cell on every side.
    pub fn holds_with_margin(&self, room: &Room) -> bool {
        room.x > self.x
            && room.y > self.y
            && room.x + room.width < self.x + self.width
            && room.y + room.height < self.y + self.height
    }
}

/// A carved rectangular room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub center: GridPos,
    /// Wall code painted around the room's perimeter.
    pub zone: u8,
}

impl Room {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            center: GridPos::new(x + width / 2, y + height / 2),
            zone: crate::grid::WALL,
        }
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= self.x
            && pos.x < self.x + self.width
            && pos.y >= self.y
            && pos.y < self.y + self.height
    }

    /// Size and place a room inside `region`, leaving a one-cell margin.
    fn carve_in<R: Rng + ?Sized>(region: Region, limits: RoomLimits, rng: &mut R) -> Self {
        let width = pick_extent(region.width, limits, rng);
        let height = pick_extent(region.height, limits, rng);
        let x = region.x + 1 + rng.random_range(0..(region.width - width - 1).max(1));
        let y = region.y + 1 + rng.random_range(0..(region.height - height - 1).max(1));
        Self::new(x, y, width, height)
    }
}

/// Room side length bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomLimits {
    pub min: i32,
    pub max: i32,
}

/// Room side for a region side, clipped so the margin always fits.
fn pick_extent<R: Rng + ?Sized>(region_extent: i32, limits: RoomLimits, rng: &mut R) -> i32 {
    let hi = (region_extent - 2).min(limits.max);
    if hi <= limits.min {
        return hi.max(1);
    }
    rng.random_range(limits.min..=hi)
}

/// L-shaped path between two room centres.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corridor {
    /// Start, corner and end. The corner shares the start's x and the end's y.
    pub points: Vec<GridPos>,
}

impl Corridor {
    pub fn between(start: GridPos, end: GridPos) -> Self {
        Self {
            points: vec![start, GridPos::new(start.x, end.y), end],
        }
    }

    pub fn corner(&self) -> Option<GridPos> {
        self.points.get(1).copied()
    }

    /// Consecutive waypoint pairs. Each pair is a straight run.
    pub fn segments(&self) -> impl Iterator<Item = (GridPos, GridPos)> + '_ {
        self.points.windows(2).filter_map(|pair| match pair {
            [a, b] => Some((*a, *b)),
            _ => None,
        })
    }
}

/// One node of the partition tree. Leaves have no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BspNode {
    pub region: Region,
    children: Option<Box<(BspNode, BspNode)>>,
    pub room: Option<Room>,
    pub corridor: Option<Corridor>,
}

impl BspNode {
    pub fn leaf(region: Region) -> Self {
        Self {
            region,
            children: None,
            room: None,
            corridor: None,
        }
    }

    /// Recursively split `region` until regions are too small or `depth`
    /// runs out. The tree may be shallower than `depth`.
    pub fn partition<R: Rng + ?Sized>(
        region: Region,
        depth: u32,
        min_leaf: i32,
        rng: &mut R,
    ) -> Self {
        if depth == 0 {
            return Self::leaf(region);
        }
        let Some((a, b)) = split(region, min_leaf, rng) else {
            return Self::leaf(region);
        };
        let left = Self::partition(a, depth - 1, min_leaf, rng);
        let right = Self::partition(b, depth - 1, min_leaf, rng);
        Self {
            region,
            children: Some(Box::new((left, right))),
            room: None,
            corridor: None,
        }
    }

    /// Give every leaf a room and link sibling subtrees, bottom-up.
    pub fn furnish<R: Rng + ?Sized>(self, limits: RoomLimits, rng: &mut R) -> Self {
        let Self {
            region, children, ..
        } = self;
        let Some(pair) = children else {
            return Self {
                region,
                children: None,
                room: Some(Room::carve_in(region, limits, rng)),
                corridor: None,
            };
        };
        let (left, right) = *pair;
        let left = left.furnish(limits, rng);
        let right = right.furnish(limits, rng);
        let corridor = match (left.representative_room(), right.representative_room()) {
            (Some(a), Some(b)) => Some(Corridor::between(a.center, b.center)),
            _ => None,
        };
        Self {
            region,
            children: Some(Box::new((left, right))),
            room: None,
            corridor,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn left(&self) -> Option<&Self> {
        self.children.as_deref().map(|(left, _)| left)
    }

    pub fn right(&self) -> Option<&Self> {
        self.children.as_deref().map(|(_, right)| right)
    }

    /// First room found in this subtree, preferring the left side.
    pub fn representative_room(&self) -> Option<&Room> {
        if let Some(room) = &self.room {
            return Some(room);
        }
        let (left, right) = self.children.as_deref()?;
        left.representative_room()
            .or_else(|| right.representative_room())
    }

    /// Rooms in generation order (pre-order, left before right).
    pub fn rooms(&self) -> Vec<&Room> {
        let mut out = Vec::new();
        self.walk(&mut |node| out.extend(node.room.as_ref()));
        out
    }

    /// Corridors in pre-order.
    pub fn corridors(&self) -> Vec<&Corridor> {
        let mut out = Vec::new();
        self.walk(&mut |node| out.extend(node.corridor.as_ref()));
        out
    }

    pub fn leaves(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if node.is_leaf() {
                out.push(node);
            }
        });
        out
    }

    /// Number of levels below this node.
    pub fn depth(&self) -> u32 {
        self.children
            .as_deref()
            .map_or(0, |(left, right)| 1 + left.depth().max(right.depth()))
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        if let Some((left, right)) = self.children.as_deref() {
            left.walk(visit);
            right.walk(visit);
        }
    }
}

/// Cut a region in two, or `None` if either side would drop below `min_leaf`.
///
/// Elongated regions are cut across their long axis; square-ish ones pick a
/// direction at random.
pub fn split<R: Rng + ?Sized>(
    region: Region,
    min_leaf: i32,
    rng: &mut R,
) -> Option<(Region, Region)> {
    if region.width < min_leaf * 2 || region.height < min_leaf * 2 {
        return None;
    }

    let w = region.width as f32;
    let h = region.height as f32;
    let horizontal = if region.width > region.height && w / h >= FORCED_SPLIT_RATIO {
        false
    } else if region.height > region.width && h / w >= FORCED_SPLIT_RATIO {
        true
    } else {
        rng.random_bool(0.5)
    };

    if horizontal {
        let at = cut(region.height, min_leaf, rng)?;
        Some((
            Region::new(region.x, region.y, region.width, at),
            Region::new(region.x, region.y + at, region.width, region.height - at),
        ))
    } else {
        let at = cut(region.width, min_leaf, rng)?;
        Some((
            Region::new(region.x, region.y, at, region.height),
            Region::new(region.x + at, region.y, region.width - at, region.height),
        ))
    }
}

fn cut<R: Rng + ?Sized>(extent: i32, min_leaf: i32, rng: &mut R) -> Option<i32> {
    let max_split = extent - min_leaf;
    if max_split < min_leaf {
        return None;
    }
    if max_split == min_leaf {
        return Some(min_leaf);
    }
    Some(rng.random_range(min_leaf..max_split))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    const LIMITS: RoomLimits = RoomLimits { min: 4, max: 8 };

    fn rng(seed: u64) -> SmallRng {
        SmallRng::seed_from_u64(seed)
    }

    // -- split ---------------------------------------------------------------

    #[test]
    fn wide_regions_split_vertically() {
        for seed in 0..32 {
            let (a, b) = split(Region::new(0, 0, 40, 20), 6, &mut rng(seed)).expect("splittable");
            assert_eq!(a.height, 20);
            assert_eq!(b.height, 20);
            assert_eq!(a.width + b.width, 40);
            assert_eq!(b.x, a.width);
        }
    }

    #[test]
    fn tall_regions_split_horizontally() {
        for seed in 0..32 {
            let (a, b) = split(Region::new(3, 5, 20, 40), 6, &mut rng(seed)).expect("splittable");
            assert_eq!(a.width, 20);
            assert_eq!(a.height + b.height, 40);
            assert_eq!(b.y, 5 + a.height);
        }
    }

    #[test]
    fn split_keeps_both_halves_at_least_min_leaf() {
        for seed in 0..64 {
            if let Some((a, b)) = split(Region::new(0, 0, 30, 28), 6, &mut rng(seed)) {
                for half in [a, b] {
                    assert!(half.width >= 6 && half.height >= 6, "{half:?}");
                }
            }
        }
    }

    #[test]
    fn small_regions_do_not_split() {
        assert_eq!(split(Region::new(0, 0, 11, 40), 6, &mut rng(1)), None);
        assert_eq!(split(Region::new(0, 0, 40, 11), 6, &mut rng(1)), None);
    }

    #[test]
    fn exact_double_min_splits_in_the_middle() {
        let (a, b) = split(Region::new(0, 0, 12, 12), 6, &mut rng(9)).expect("splittable");
        assert_eq!((a.width * a.height, b.width * b.height), (72, 72));
    }

    // -- partition -----------------------------------------------------------

    #[test]
    fn depth_budget_bounds_the_tree() {
        let tree = BspNode::partition(Region::new(0, 0, 64, 64), 2, 6, &mut rng(4));
        assert!(tree.depth() <= 2);
        assert!(tree.leaves().len() <= 4);
    }

    #[test]
    fn undersized_root_stays_a_single_leaf() {
        let tree = BspNode::partition(Region::new(0, 0, 10, 10), 5, 6, &mut rng(4));
        assert!(tree.is_leaf());
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn leaves_tile_the_root() {
        let root = Region::new(0, 0, 64, 48);
        let tree = BspNode::partition(root, 4, 6, &mut rng(11));
        let area: i32 = tree
            .leaves()
            .iter()
            .map(|leaf| leaf.region.width * leaf.region.height)
            .sum();
        assert_eq!(area, 64 * 48);
    }

    // -- furnish -------------------------------------------------------------

    #[test]
    fn every_leaf_gets_a_room_with_margin() {
        for seed in 0..16 {
            let tree = BspNode::partition(Region::new(0, 0, 64, 64), 5, 6, &mut rng(seed))
                .furnish(LIMITS, &mut rng(seed + 100));
            for leaf in tree.leaves() {
                let room = leaf.room.as_ref().expect("leaf room");
                assert!(leaf.region.holds_with_margin(room), "{room:?} in {:?}", leaf.region);
            }
        }
    }

    #[test]
    fn internal_nodes_hold_corridors_not_rooms() {
        let tree = BspNode::partition(Region::new(0, 0, 64, 64), 4, 6, &mut rng(2))
            .furnish(LIMITS, &mut rng(3));
        assert!(!tree.is_leaf());
        assert!(tree.room.is_none());
        let corridor = tree.corridor.as_ref().expect("root corridor");
        let left = tree.left().and_then(BspNode::representative_room).expect("left room");
        let right = tree.right().and_then(BspNode::representative_room).expect("right room");
        assert_eq!(corridor.points.first(), Some(&left.center));
        assert_eq!(corridor.points.last(), Some(&right.center));
    }

    #[test]
    fn room_and_corridor_counts_match_tree_shape() {
        let tree = BspNode::partition(Region::new(0, 0, 64, 64), 4, 6, &mut rng(21))
            .furnish(LIMITS, &mut rng(22));
        let leaves = tree.leaves().len();
        assert_eq!(tree.rooms().len(), leaves);
        assert_eq!(tree.corridors().len(), leaves - 1);
    }

    // -- corridor ------------------------------------------------------------

    #[test]
    fn corridor_is_l_shaped() {
        let c = Corridor::between(GridPos::new(3, 4), GridPos::new(20, 9));
        assert_eq!(c.corner(), Some(GridPos::new(3, 9)));
        let segments: Vec<_> = c.segments().collect();
        assert_eq!(segments.len(), 2);
        for (a, b) in segments {
            assert!(a.x == b.x || a.y == b.y, "segment {a:?} -> {b:?} is not straight");
        }
    }

    #[test]
    fn room_center_uses_integer_halves() {
        let room = Room::new(10, 20, 5, 4);
        assert_eq!(room.center, GridPos::new(12, 22));
        assert!(room.contains(GridPos::new(14, 23)));
        assert!(!room.contains(GridPos::new(15, 23)));
    }
}
