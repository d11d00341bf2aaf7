use crate::rings::{Ring, Role};
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Area, BooleanOps, Contains, Line, LineString, MultiPolygon, Polygon};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("ring from ways {0:?} is not closed")]
    UnclosedRing(Vec<i64>),

    #[error("no outer ring")]
    NoOuterRing,

    #[error("{0}")]
    Invalid(String),
}

/// Polygons built from a set of rings, plus inner rings no outer contains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipolygonAssembly {
    pub polygons: Vec<Polygon<f64>>,
    pub orphans: Vec<Ring>,
}

struct OuterShell {
    shell: Polygon<f64>,
    area: f64,
    holes: Vec<LineString<f64>>,
}

/// Bind every inner ring to the smallest outer ring containing it and turn
/// each outer with its holes into one polygon.
///
/// Outers keep their input order. Holes are bound one level deep only: an
/// inner ring lying inside another inner ring is still attached to the
/// enclosing outer rather than promoted to an island of its own. Invalid
/// polygons go through [`repair`] once before failing.
pub fn build_multipolygon(rings: Vec<Ring>) -> Result<MultipolygonAssembly, GeometryError> {
    if let Some(open) = rings.iter().find(|ring| !ring.is_closed()) {
        return Err(GeometryError::UnclosedRing(open.way_ids.clone()));
    }

    let (outers, inners): (Vec<Ring>, Vec<Ring>) =
        rings.into_iter().partition(|ring| ring.role == Role::Outer);
    if outers.is_empty() {
        return Err(GeometryError::NoOuterRing);
    }

    let mut shells: Vec<OuterShell> = outers
        .into_iter()
        .map(|ring| {
            let shell = Polygon::new(LineString::new(ring.coords), vec![]);
            let area = shell.unsigned_area();
            OuterShell {
                shell,
                area,
                holes: Vec::new(),
            }
        })
        .collect();

    let mut orphans = Vec::new();
    for inner in inners {
        let exterior = LineString::new(inner.coords.clone());
        match smallest_container(&shells, &exterior) {
            Some(i) => shells[i].holes.push(exterior),
            None => orphans.push(inner),
        }
    }

    let mut polygons = Vec::with_capacity(shells.len());
    for shell in shells {
        let polygon = Polygon::new(shell.shell.exterior().clone(), shell.holes);
        polygons.extend(validated(polygon)?);
    }

    Ok(MultipolygonAssembly { polygons, orphans })
}

fn smallest_container(shells: &[OuterShell], ring: &LineString<f64>) -> Option<usize> {
    let candidate = Polygon::new(ring.clone(), vec![]);
    shells
        .iter()
        .enumerate()
        .filter(|(_, shell)| shell.shell.contains(&candidate))
        .min_by(|(_, a), (_, b)| a.area.total_cmp(&b.area))
        .map(|(i, _)| i)
}

fn validated(polygon: Polygon<f64>) -> Result<Vec<Polygon<f64>>, GeometryError> {
    let reason = match check_validity(&polygon) {
        Ok(()) => return Ok(vec![polygon]),
        Err(reason) => reason,
    };

    log::info!("Invalid polygon ({reason}), trying to repair it");
    let repaired = repair(&polygon);
    if repaired.0.is_empty() {
        return Err(GeometryError::Invalid(format!("{reason}; repair left nothing")));
    }
    for part in &repaired.0 {
        if let Err(still) = check_validity(part) {
            return Err(GeometryError::Invalid(format!(
                "{reason}; repair failed: {still}"
            )));
        }
    }
    log::info!("Polygon repaired into {} part(s)", repaired.0.len());
    Ok(repaired.0)
}

/// Zero-width union smoothing: rebuild the shell through a boolean union,
/// then cut the holes out of it one by one.
pub fn repair(polygon: &Polygon<f64>) -> MultiPolygon<f64> {
    let shell = Polygon::new(polygon.exterior().clone(), vec![]);
    let mut repaired = shell.union(&MultiPolygon::<f64>::new(vec![]));
    for hole in polygon.interiors() {
        let cut = Polygon::new(hole.clone(), vec![]);
        repaired = repaired.difference(&cut);
    }
    repaired
}

/// Simple-feature validity: rings closed with at least four positions and a
/// non-zero area, no ring crossing itself, holes neither crossing the shell
/// nor each other, every hole inside the shell and none inside another hole.
pub fn check_validity(polygon: &Polygon<f64>) -> Result<(), String> {
    let exterior = polygon.exterior();
    check_ring(exterior, "exterior")?;
    for (i, hole) in polygon.interiors().iter().enumerate() {
        check_ring(hole, &format!("hole {i}"))?;
    }

    let shell = Polygon::new(exterior.clone(), vec![]);
    let holes: Vec<Polygon<f64>> = polygon
        .interiors()
        .iter()
        .map(|hole| Polygon::new(hole.clone(), vec![]))
        .collect();

    for (i, hole) in holes.iter().enumerate() {
        if rings_cross(exterior, hole.exterior()) {
            return Err(format!("hole {i} crosses the exterior"));
        }
        if !shell.contains(hole) {
            return Err(format!("hole {i} lies outside the exterior"));
        }
        for (j, other) in holes.iter().enumerate().skip(i + 1) {
            if rings_cross(hole.exterior(), other.exterior()) {
                return Err(format!("holes {i} and {j} cross"));
            }
        }
        for (j, other) in holes.iter().enumerate() {
            if i != j && other.contains(hole) {
                return Err(format!("hole {i} is nested inside hole {j}"));
            }
        }
    }
    Ok(())
}

fn check_ring(ring: &LineString<f64>, name: &str) -> Result<(), String> {
    if ring.0.len() < 4 {
        return Err(format!("{name} has fewer than four positions"));
    }
    if !ring.is_closed() {
        return Err(format!("{name} is not closed"));
    }
    if Polygon::new(ring.clone(), vec![]).unsigned_area() == 0.0 {
        return Err(format!("{name} has zero area"));
    }
    if self_intersects(ring) {
        return Err(format!("{name} intersects itself"));
    }
    Ok(())
}

// Repeated positions give zero-length segments, which carry no edge.
fn segments(ring: &LineString<f64>) -> Vec<Line<f64>> {
    ring.lines().filter(|line| line.start != line.end).collect()
}

// A ring may touch itself at isolated points; crossing or folding back over
// one of its own edges is an intersection.
fn self_intersects(ring: &LineString<f64>) -> bool {
    let segs = segments(ring);
    let n = segs.len();
    for i in 0..n {
        for j in (i + 1)..n {
            match line_intersection(segs[i], segs[j]) {
                Some(LineIntersection::SinglePoint {
                    is_proper: true, ..
                })
                | Some(LineIntersection::Collinear { .. }) => return true,
                _ => {}
            }
        }
    }
    false
}

// Touching at isolated points is allowed; crossing or sharing an edge is not.
fn rings_cross(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    let b_segs = segments(b);
    segments(a).into_iter().any(|sa| {
        b_segs.iter().any(|&sb| {
            matches!(
                line_intersection(sa, sb),
                Some(LineIntersection::SinglePoint {
                    is_proper: true,
                    ..
                }) | Some(LineIntersection::Collinear { .. })
            )
        })
    })
}
