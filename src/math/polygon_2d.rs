use super::Point2;

/// Computes the signed area of a closed 2D ring (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise. The ring is
/// implicitly closed: an edge from the last point back to the first is
/// assumed, not stored.
#[must_use]
pub fn signed_area(ring: &[Point2]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += ring[i].x * ring[j].y - ring[j].x * ring[i].y;
    }
    sum * 0.5
}

/// Computes the perimeter of a closed 2D ring, including the implicit
/// closing edge.
#[must_use]
pub fn perimeter(ring: &[Point2]) -> f64 {
    let n = ring.len();
    if n < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += (ring[j] - ring[i]).norm();
    }
    sum
}

/// Point-in-ring test via the winding number algorithm.
///
/// Non-zero winding => inside. Returns `true` for interior points and
/// points on the boundary (boundary behavior follows the winding
/// convention and is not separately special-cased).
#[must_use]
pub fn point_in_ring(point: &Point2, ring: &[Point2]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    winding_number(point.x, point.y, ring) != 0
}

/// Winding number of point `(px, py)` with respect to `ring`.
fn winding_number(px: f64, py: f64, ring: &[Point2]) -> i32 {
    let n = ring.len();
    let mut winding = 0i32;
    for i in 0..n {
        let p0 = ring[i];
        let p1 = ring[(i + 1) % n];

        if p0.y <= py {
            if p1.y > py && cross_2d(p1.x - p0.x, p1.y - p0.y, px - p0.x, py - p0.y) > 0.0 {
                winding += 1;
            }
        } else if p1.y <= py && cross_2d(p1.x - p0.x, p1.y - p0.y, px - p0.x, py - p0.y) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// 2D cross product: `(ax * by - ay * bx)`.
#[inline]
fn cross_2d(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// Minimum distance from a point to any edge of a closed ring,
/// including the implicit closing edge.
#[must_use]
pub fn distance_to_ring(point: &Point2, ring: &[Point2]) -> f64 {
    let n = ring.len();
    if n == 0 {
        return f64::INFINITY;
    }
    if n == 1 {
        return (point - ring[0]).norm();
    }
    let mut best = f64::INFINITY;
    for i in 0..n {
        let d = point_to_segment_dist(point, &ring[i], &ring[(i + 1) % n]);
        if d < best {
            best = d;
        }
    }
    best
}

/// Minimum distance from `point` to the segment `(a, b)`.
#[must_use]
pub fn point_to_segment_dist(point: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        return (point - a).norm();
    }

    // Project onto the infinite line, clamp to [0, 1].
    let t = ((point - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    let closest = a + d * t;
    (point - closest).norm()
}
