use approx::assert_relative_eq;
use rigid2d::bodies::Vertex;
use rigid2d::math::{lines_intersection, segments_intersection, Vector2};
use rigid2d::{make_ball, make_block, Polygon};

#[test]
fn test_vector_algebra() {
    let a = Vector2::new(3.0, 4.0);
    let b = Vector2::new(-2.0, 1.0);

    assert_relative_eq!(a.length(), 5.0);
    assert_relative_eq!(a.dot(&b), -2.0);
    assert_relative_eq!(a.cross(&b), 11.0);
    assert_eq!(a + b, Vector2::new(1.0, 5.0));
    assert_eq!(a - b, Vector2::new(5.0, 3.0));
    assert_eq!(a * 2.0, Vector2::new(6.0, 8.0));
    assert_eq!(-a, Vector2::new(-3.0, -4.0));

    // perpendicular is a +90 degree rotation
    let p = a.perpendicular();
    assert_relative_eq!(a.dot(&p), 0.0);
    assert_relative_eq!(a.cross(&p), a.length_squared());

    // rotation by 90 degrees
    let r = Vector2::unit_x().rotate(std::f64::consts::FRAC_PI_2);
    assert!((r - Vector2::unit_y()).length() < 1e-12);
}

#[test]
fn test_line_intersections() {
    let p = lines_intersection(
        Vector2::new(0.0, 0.0),
        Vector2::new(2.0, 2.0),
        Vector2::new(0.0, 2.0),
        Vector2::new(2.0, 0.0),
    )
    .unwrap();
    assert!((p - Vector2::new(1.0, 1.0)).length() < 1e-12);

    // parallel lines have no intersection
    assert!(lines_intersection(
        Vector2::new(0.0, 0.0),
        Vector2::new(1.0, 0.0),
        Vector2::new(0.0, 1.0),
        Vector2::new(1.0, 1.0),
    )
    .is_none());

    // segments that would only cross when extended
    assert!(segments_intersection(
        Vector2::new(0.0, 0.0),
        Vector2::new(1.0, 0.0),
        Vector2::new(3.0, -1.0),
        Vector2::new(3.0, 1.0),
    )
    .is_none());
}

#[test]
fn test_block_boundary() {
    let block = make_block(2.0, 3.0, "block").unwrap();
    assert_relative_eq!(block.get_width(), 2.0);
    assert_relative_eq!(block.get_height(), 3.0);
    assert_relative_eq!(block.get_left_body(), -1.0);
    assert_relative_eq!(block.get_right_body(), 1.0);
    assert_relative_eq!(block.get_top_body(), 1.5);
    assert_relative_eq!(block.get_bottom_body(), -1.5);
    assert_eq!(block.get_edges().len(), 4);
    assert_eq!(block.get_vertices().len(), 4);
}

#[test]
fn test_body_world_round_trip() {
    let mut block = make_block(1.0, 3.0, "block").unwrap();
    block.set_position(Vector2::new(-1.0, 2.5), std::f64::consts::PI / 3.0);

    for p in [
        Vector2::new(0.0, 0.0),
        Vector2::new(0.5, -1.5),
        Vector2::new(-3.0, 7.0),
    ] {
        let round = block.body_to_world(block.world_to_body(p));
        assert!((round - p).length() < 1e-12);
        let round = block.world_to_body(block.body_to_world(p));
        assert!((round - p).length() < 1e-12);
    }

    // velocity of a world point includes the rotational part
    block.set_velocity(Vector2::new(1.0, 0.0), 2.0);
    let p = block.get_position() + Vector2::new(0.0, 0.5);
    let v = block.world_point_velocity(p);
    assert!((v - Vector2::new(0.0, 0.0)).length() < 1e-12);
}

#[test]
fn test_circular_edge_geometry() {
    // quarter disc with an arc from (0,2) to (2,0) around the origin,
    // clockwise, outside out
    let mut p = Polygon::new("quarter");
    p.start_path(Vertex::new(Vector2::new(0.0, 2.0))).unwrap();
    p.add_circular_edge(Vector2::new(2.0, 0.0), Vector2::zero(), true, true)
        .unwrap();
    p.add_straight_edge(Vector2::new(0.0, 0.0), false).unwrap();
    p.add_straight_edge(Vector2::new(0.0, 2.0), false).unwrap();
    p.close_path().unwrap();
    p.finish().unwrap();

    let arc = &p.get_edges()[0];
    assert!(!arc.is_straight());
    assert_relative_eq!(arc.curvature_at(Vector2::new(2.0, 0.0)), 2.0);

    let normal = arc.normal_at(Vector2::new(2.0, 0.0));
    assert!((normal - Vector2::unit_x()).length() < 1e-12);

    assert_relative_eq!(arc.distance_to_point(Vector2::new(0.0, 0.0)), -2.0);
    assert_relative_eq!(arc.distance_to_point(Vector2::new(4.0, 0.0)), 2.0);
    assert_relative_eq!(arc.distance_to_point(Vector2::new(0.0, 3.0)), 1.0);

    // a point behind the arc's angular span is out of reach
    assert!(!arc
        .distance_to_point(Vector2::new(-3.0, -3.0))
        .is_finite());
}

#[test]
fn test_straight_edge_geometry() {
    let block = make_block(2.0, 2.0, "block").unwrap();
    // bottom edge runs from (-1,-1) to (1,-1) with the outside below
    let bottom = &block.get_edges()[0];
    assert!(bottom.is_straight());
    assert!(!bottom.curvature_at(Vector2::new(0.0, -1.0)).is_finite());
    let normal = bottom.normal_at(Vector2::new(0.0, -1.0));
    assert!((normal - Vector2::new(0.0, -1.0)).length() < 1e-12);
    assert_relative_eq!(bottom.distance_to_point(Vector2::new(0.5, -1.5)), 0.5);
    assert_relative_eq!(bottom.distance_to_point(Vector2::new(0.5, -0.5)), -0.5);
    // beyond the segment the distance is infinite
    assert!(!bottom.distance_to_point(Vector2::new(5.0, -1.5)).is_finite());
}

#[test]
fn test_centroid_radius_overshoot() {
    let block = make_block(2.0, 2.0, "block").unwrap();
    for edge in block.get_edges() {
        assert_relative_eq!(
            edge.centroid_radius(),
            1.25 * edge.max_distance_from_centroid()
        );
    }
}

#[test]
fn test_ball_geometry() {
    let ball = make_ball(0.5, "ball").unwrap();
    assert_eq!(ball.get_edges().len(), 2);
    assert_relative_eq!(ball.get_width(), 1.0);
    assert_relative_eq!(ball.get_height(), 1.0);
    assert_relative_eq!(ball.get_min_height(), 0.5);
    for edge in ball.get_edges() {
        assert_relative_eq!(edge.curvature_at(edge.point1()), 0.5);
    }
}

#[test]
fn test_construction_errors() {
    // adding an edge before starting a path
    let mut p = Polygon::new("bad");
    assert!(p.add_straight_edge(Vector2::new(1.0, 0.0), true).is_err());

    // closing a path that does not return to its start
    let mut p = Polygon::new("open");
    p.start_path(Vertex::new(Vector2::zero())).unwrap();
    p.add_straight_edge(Vector2::new(1.0, 0.0), false).unwrap();
    assert!(p.close_path().is_err());

    // arc endpoints must lie on the same circle
    let mut p = Polygon::new("arc");
    p.start_path(Vertex::new(Vector2::new(1.0, 0.0))).unwrap();
    assert!(p
        .add_circular_edge(Vector2::new(0.0, 2.0), Vector2::zero(), false, true)
        .is_err());

    // finishing with an open path
    let mut p = Polygon::new("unclosed");
    p.start_path(Vertex::new(Vector2::zero())).unwrap();
    p.add_straight_edge(Vector2::new(1.0, 0.0), false).unwrap();
    assert!(p.finish().is_err());
}
