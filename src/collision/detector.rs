use crate::bodies::{BodyId, BodyRef, Edge, EdgeShape, Polygon};
use crate::collision::ContactRecord;
use crate::math::Vector2;

/// Finds all contacts and collisions between pairs of bodies and appends
/// them to `out`. Duplicate records at the same location are pruned with
/// [`dedupe_contacts`].
///
/// The caller is responsible for the infinite-mass invariant check and for
/// appending connector-generated contacts.
pub fn find_collisions(bodies: &[Option<Polygon>], step_size: f64, out: &mut Vec<ContactRecord>) {
    let first = out.len();
    for i in 0..bodies.len() {
        let a = match &bodies[i] {
            Some(a) => a,
            None => continue,
        };
        for j in (i + 1)..bodies.len() {
            let b = match &bodies[j] {
                Some(b) => b,
                None => continue,
            };
            if a.does_not_collide(j) || b.does_not_collide(i) {
                continue;
            }
            if a.get_mass().is_infinite() && b.get_mass().is_infinite() {
                continue;
            }
            test_body_pair(i, a, j, b, step_size, out);
        }
    }
    dedupe_contacts(out, first);
}

/// Removes near-identical records produced at the same location, keeping the
/// deeper of each similar pair. Only records at or after `first` are
/// examined.
pub fn dedupe_contacts(list: &mut Vec<ContactRecord>, first: usize) {
    let mut k = first;
    while k < list.len() {
        let mut removed = false;
        for m in first..k {
            if list[k].similar_to(&list[m]) {
                if list[k].distance < list[m].distance {
                    list.swap(k, m);
                }
                list.remove(k);
                removed = true;
                break;
            }
        }
        if !removed {
            k += 1;
        }
    }
}

fn test_body_pair(
    a_id: BodyId,
    a: &Polygon,
    b_id: BodyId,
    b: &Polygon,
    step_size: f64,
    out: &mut Vec<ContactRecord>,
) {
    let distance_tol = a.get_distance_tol().max(b.get_distance_tol());
    // a pair moving slower than this cannot close the gap between their
    // bounding discs within one step
    let pair_speed = a.get_velocity().length()
        + a.get_angular_velocity().abs() * a.get_centroid_radius()
        + b.get_velocity().length()
        + b.get_angular_velocity().abs() * b.get_centroid_radius();
    let speed_limit = 2.0 * (a.get_min_height() + b.get_min_height()) / step_size;
    if pair_speed < speed_limit {
        let reach = a.get_centroid_radius() + b.get_centroid_radius() + 2.0 * distance_tol;
        if a.get_centroid_world().distance_squared(&b.get_centroid_world()) > reach * reach {
            return;
        }
    }
    let swellage = 2.0 * distance_tol;
    for ea in edges_to_test(a) {
        let ca = a.edge_centroid_world(ea.index());
        for eb in edges_to_test(b) {
            let cb = b.edge_centroid_world(eb.index());
            if !ea.intersection_possible(ca, eb, cb, swellage) {
                continue;
            }
            test_edge_pair(a_id, a, ea, b_id, b, eb, out);
        }
    }
}

fn edges_to_test(p: &Polygon) -> impl Iterator<Item = &Edge> {
    let special = p.get_special_edge();
    p.get_edges().iter().filter(move |e| {
        if let Some(s) = special {
            e.index() == s
        } else {
            !p.edge_excluded(e.index())
        }
    })
}

fn test_edge_pair(
    a_id: BodyId,
    a: &Polygon,
    ea: &Edge,
    b_id: BodyId,
    b: &Polygon,
    eb: &Edge,
    out: &mut Vec<ContactRecord>,
) {
    match (ea.is_straight(), eb.is_straight()) {
        (true, true) => {
            vertex_edge_test(a_id, a, ea, b_id, b, eb, out);
            vertex_edge_test(b_id, b, eb, a_id, a, ea, out);
        }
        (true, false) => {
            vertex_edge_test(a_id, a, ea, b_id, b, eb, out);
            vertex_edge_test(b_id, b, eb, a_id, a, ea, out);
            arc_line_test(b_id, b, eb, a_id, a, ea, out);
        }
        (false, true) => {
            vertex_edge_test(a_id, a, ea, b_id, b, eb, out);
            vertex_edge_test(b_id, b, eb, a_id, a, ea, out);
            arc_line_test(a_id, a, ea, b_id, b, eb, out);
        }
        (false, false) => {
            arc_arc_test(a_id, a, ea, b_id, b, eb, out);
        }
    }
}

/// Tests the start vertex of `edge_of_vertex` on the primary body against an
/// edge of the normal body. Every vertex is the start vertex of exactly one
/// edge, so iterating edge pairs covers each vertex once.
fn vertex_edge_test(
    primary_id: BodyId,
    primary: &Polygon,
    edge_of_vertex: &Edge,
    normal_id: BodyId,
    normal_owner: &Polygon,
    edge: &Edge,
    out: &mut Vec<ContactRecord>,
) {
    let distance_tol = primary.get_distance_tol().max(normal_owner.get_distance_tol());
    let vertex_world = primary.body_to_world(edge_of_vertex.point1());
    let p_body = normal_owner.world_to_body(vertex_world);
    let distance = edge.distance_to_point(p_body);
    if !distance.is_finite() || distance > distance_tol {
        return;
    }
    let near = edge.nearest_point(p_body);
    let normal = normal_owner.rotate_body_to_world(edge.normal_at(p_body));
    push_record(
        out,
        primary_id,
        primary,
        normal_id,
        normal_owner,
        Some(edge_of_vertex.index()),
        Some(edge.index()),
        vertex_world,
        normal_owner.body_to_world(near),
        normal,
        distance,
        0.0,
        edge.curvature_at(near),
    );
}

/// Tangential test of a convex circular edge against a straight edge:
/// compares the circle center's distance from the edge line with the radius.
fn arc_line_test(
    arc_id: BodyId,
    arc_owner: &Polygon,
    arc: &Edge,
    line_id: BodyId,
    line_owner: &Polygon,
    line: &Edge,
    out: &mut Vec<ContactRecord>,
) {
    let (center, radius) = match arc.shape() {
        EdgeShape::Circular {
            center,
            radius,
            outside_is_out,
            ..
        } => {
            if !outside_is_out {
                return;
            }
            (*center, *radius)
        }
        EdgeShape::Straight { .. } => return,
    };
    let normal_line = match line.shape() {
        EdgeShape::Straight { normal, .. } => *normal,
        EdgeShape::Circular { .. } => return,
    };
    let distance_tol = arc_owner.get_distance_tol().max(line_owner.get_distance_tol());
    let center_world = arc_owner.body_to_world(center);
    let cb = line_owner.world_to_body(center_world);
    let t = crate::math::line_projection_param(cb, line.point1(), line.point2());
    if !(0.0..=1.0).contains(&t) {
        return;
    }
    let d_center = (cb - line.point1()).dot(&normal_line);
    let distance = d_center - radius;
    if distance > distance_tol {
        return;
    }
    // nearest point of the circle toward the edge line
    let pc = cb - normal_line * radius;
    let pc_world = line_owner.body_to_world(pc);
    let pc_arc = arc_owner.world_to_body(pc_world);
    if !arc.is_within_arc((pc_arc - center).angle()) {
        return;
    }
    let foot = cb - normal_line * d_center;
    push_record(
        out,
        arc_id,
        arc_owner,
        line_id,
        line_owner,
        Some(arc.index()),
        Some(line.index()),
        pc_world,
        line_owner.body_to_world(foot),
        line_owner.rotate_body_to_world(normal_line),
        distance,
        radius,
        f64::INFINITY,
    );
}

/// Tests two circular edges: center distance compared against the summed
/// radii, signed by concavity. Two concave arcs cannot touch.
fn arc_arc_test(
    a_id: BodyId,
    a: &Polygon,
    ea: &Edge,
    b_id: BodyId,
    b: &Polygon,
    eb: &Edge,
    out: &mut Vec<ContactRecord>,
) {
    let (ca, ra, oa) = match ea.shape() {
        EdgeShape::Circular {
            center,
            radius,
            outside_is_out,
            ..
        } => (*center, *radius, *outside_is_out),
        EdgeShape::Straight { .. } => return,
    };
    let (cb, rb, ob) = match eb.shape() {
        EdgeShape::Circular {
            center,
            radius,
            outside_is_out,
            ..
        } => (*center, *radius, *outside_is_out),
        EdgeShape::Straight { .. } => return,
    };
    if !oa && !ob {
        return;
    }
    let distance_tol = a.get_distance_tol().max(b.get_distance_tol());
    let ca_w = a.body_to_world(ca);
    let cb_w = b.body_to_world(cb);
    let d = ca_w.distance(&cb_w);
    if d < crate::math::TINY {
        return;
    }
    if oa && ob {
        // convex against convex
        let distance = d - ra - rb;
        if distance > distance_tol {
            return;
        }
        let u = (ca_w - cb_w) / d;
        let impact1 = ca_w - u * ra;
        let impact2 = cb_w + u * rb;
        if !arc_contains(a, ea, ca, impact1) || !arc_contains(b, eb, cb, impact2) {
            return;
        }
        push_record(
            out,
            a_id,
            a,
            b_id,
            b,
            Some(ea.index()),
            Some(eb.index()),
            impact1,
            impact2,
            u,
            distance,
            ra,
            rb,
        );
    } else {
        // one concave arc enclosing a convex one; orient so the concave
        // side supplies the normal
        let (concave_id, concave, ec, cc_w, rc, convex_id, convex, ev, cv_w, rv) = if ob {
            (a_id, a, ea, ca_w, ra, b_id, b, eb, cb_w, rb)
        } else {
            (b_id, b, eb, cb_w, rb, a_id, a, ea, ca_w, ra)
        };
        let distance = rc - d - rv;
        if distance > distance_tol {
            return;
        }
        let dir = (cv_w - cc_w) / d;
        let impact_convex = cv_w + dir * rv;
        let impact_concave = cc_w + dir * rc;
        if !arc_contains(convex, ev, arc_center(ev), impact_convex)
            || !arc_contains(concave, ec, arc_center(ec), impact_concave)
        {
            return;
        }
        // normal points from the concave surface into the cavity
        push_record(
            out,
            convex_id,
            convex,
            concave_id,
            concave,
            Some(ev.index()),
            Some(ec.index()),
            impact_convex,
            impact_concave,
            -dir,
            distance,
            rv,
            -rc,
        );
    }
}

fn arc_center(e: &Edge) -> Vector2 {
    match e.shape() {
        EdgeShape::Circular { center, .. } => *center,
        EdgeShape::Straight { .. } => Vector2::zero(),
    }
}

fn arc_contains(owner: &Polygon, edge: &Edge, center_body: Vector2, point_world: Vector2) -> bool {
    let p_body = owner.world_to_body(point_world);
    edge.is_within_arc((p_body - center_body).angle())
}

#[allow(clippy::too_many_arguments)]
fn push_record(
    out: &mut Vec<ContactRecord>,
    primary_id: BodyId,
    primary: &Polygon,
    normal_id: BodyId,
    normal_owner: &Polygon,
    primary_edge: Option<usize>,
    normal_edge: Option<usize>,
    impact1: Vector2,
    impact2: Vector2,
    normal: Vector2,
    distance: f64,
    r1: f64,
    r2: f64,
) {
    let v1 = primary.world_point_velocity(impact1);
    let v2 = normal_owner.world_point_velocity(impact2);
    out.push(ContactRecord {
        primary: BodyRef::Body(primary_id),
        normal_body: BodyRef::Body(normal_id),
        primary_edge,
        normal_edge,
        impact1,
        impact2,
        normal,
        distance,
        normal_velocity: normal.dot(&(v1 - v2)),
        joint: false,
        r1,
        r2,
        elasticity: primary.get_elasticity() * normal_owner.get_elasticity(),
        normal_dot: None,
        impulse: 0.0,
        distance_tol: primary.get_distance_tol().max(normal_owner.get_distance_tol()),
        velocity_tol: primary.get_velocity_tol().max(normal_owner.get_velocity_tol()),
    });
}
