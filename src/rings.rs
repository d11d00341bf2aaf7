use geo::Coord;

/// Declared function of a ring inside an area relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    Outer,
    Inner,
}

/// Ordered coordinates stitched from one or more ways. Closed when the
/// first coordinate equals the last.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub coords: Vec<Coord<f64>>,
    pub way_ids: Vec<i64>,
    pub role: Role,
}

impl Ring {
    pub fn new(coords: Vec<Coord<f64>>) -> Self {
        Ring {
            coords,
            way_ids: Vec::new(),
            role: Role::Outer,
        }
    }

    pub fn from_way(way_id: i64, coords: Vec<Coord<f64>>, role: Role) -> Self {
        Ring {
            coords,
            way_ids: vec![way_id],
            role,
        }
    }

    pub fn head(&self) -> Option<Coord<f64>> {
        self.coords.first().copied()
    }

    pub fn tail(&self) -> Option<Coord<f64>> {
        self.coords.last().copied()
    }

    pub fn is_closed(&self) -> bool {
        self.coords.len() >= 2 && self.head() == self.tail()
    }

    /// Fewer than two coordinates, or every coordinate identical.
    pub fn is_degenerate(&self) -> bool {
        match self.coords.first() {
            Some(first) => self.coords.iter().all(|c| c == first),
            None => true,
        }
    }

    fn reversed(mut self) -> Self {
        self.coords.reverse();
        self
    }
}

/// Output of [`assemble`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub closed: Vec<Ring>,
    pub open: Vec<Ring>,
}

struct Chain {
    ring: Ring,
    // Smallest input position among the merged segments.
    origin: usize,
}

/// Join segments sharing endpoints into maximal rings.
///
/// Segments may come in any order and direction. Each pass merges the first
/// pair (in input order) whose endpoints touch, reversing the later chain
/// when needed, and repeats until nothing more joins. Chains that close are
/// returned in `closed`, ordered by the position of their first segment in
/// the input; the rest end up in `open`. Degenerate segments skip merging
/// and go straight to `open` unchanged.
pub fn assemble(segments: Vec<Ring>) -> Assembly {
    let mut closed: Vec<Chain> = Vec::new();
    let mut open = Vec::new();
    let mut working: Vec<Chain> = Vec::new();

    for (origin, ring) in segments.into_iter().enumerate() {
        if ring.is_degenerate() {
            open.push(ring);
        } else if ring.is_closed() {
            closed.push(Chain { ring, origin });
        } else {
            working.push(Chain { ring, origin });
        }
    }

    while let Some((i, j)) = find_mergeable(&working) {
        let later = working.remove(j);
        let earlier = &mut working[i];
        merge_into(earlier, later);

        if earlier.ring.is_closed() {
            closed.push(working.remove(i));
        }
    }

    closed.sort_by_key(|chain| chain.origin);
    open.extend(working.into_iter().map(|chain| chain.ring));

    Assembly {
        closed: closed.into_iter().map(|chain| chain.ring).collect(),
        open,
    }
}

fn find_mergeable(working: &[Chain]) -> Option<(usize, usize)> {
    for i in 0..working.len() {
        for j in (i + 1)..working.len() {
            if touches(&working[i].ring, &working[j].ring) {
                return Some((i, j));
            }
        }
    }
    None
}

fn touches(a: &Ring, b: &Ring) -> bool {
    let (a_head, a_tail, b_head, b_tail) = (a.head(), a.tail(), b.head(), b.tail());
    a_tail == b_head || a_tail == b_tail || a_head == b_tail || a_head == b_head
}

fn merge_into(target: &mut Chain, other: Chain) {
    let origin = target.origin.min(other.origin);
    let a = std::mem::replace(&mut target.ring, Ring::new(Vec::new()));
    let b = other.ring;

    let merged = if a.tail() == b.head() {
        concat(a, b)
    } else if a.tail() == b.tail() {
        concat(a, b.reversed())
    } else if a.head() == b.tail() {
        concat(b, a)
    } else {
        concat(b.reversed(), a)
    };

    target.ring = merged;
    target.origin = origin;
}

// `first` ends where `second` starts; the shared coordinate is kept once.
fn concat(first: Ring, second: Ring) -> Ring {
    let mut coords = first.coords;
    coords.extend(second.coords.into_iter().skip(1));
    let mut way_ids = first.way_ids;
    way_ids.extend(second.way_ids);
    Ring {
        coords,
        way_ids,
        role: first.role,
    }
}
