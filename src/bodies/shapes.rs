use crate::bodies::{Polygon, Vertex};
use crate::math::Vector2;
use crate::Result;

/// Creates a rectangular block of the given width and height, centered on
/// the body origin, with mass 1 and the uniform-density moment of inertia.
pub fn make_block(width: f64, height: f64, name: impl Into<String>) -> Result<Polygon> {
    let w = width * 0.5;
    let h = height * 0.5;
    let mut p = Polygon::new(name);
    p.start_path(Vertex::new(Vector2::new(-w, -h)))?;
    p.add_straight_edge(Vector2::new(w, -h), false)?;
    p.add_straight_edge(Vector2::new(w, h), true)?;
    p.add_straight_edge(Vector2::new(-w, h), true)?;
    p.add_straight_edge(Vector2::new(-w, -h), false)?;
    p.close_path()?;
    p.finish()?;
    p.set_moment_about_cm((width * width + height * height) / 12.0)?;
    Ok(p)
}

/// Creates a circular body of the given radius from two half-circle edges,
/// centered on the body origin, with mass 1 and the uniform-density moment.
pub fn make_ball(radius: f64, name: impl Into<String>) -> Result<Polygon> {
    let mut p = Polygon::new(name);
    let center = Vector2::zero();
    p.start_path(Vertex::new(Vector2::new(radius, 0.0)))?;
    p.add_circular_edge(Vector2::new(-radius, 0.0), center, false, true)?;
    p.add_circular_edge(Vector2::new(radius, 0.0), center, false, true)?;
    p.close_path()?;
    p.finish()?;
    p.set_moment_about_cm(radius * radius / 2.0)?;
    Ok(p)
}

/// Creates an immovable wall: a block of the given length and thickness
/// whose top edge is the only one that participates in collisions.
pub fn make_wall(length: f64, thickness: f64, name: impl Into<String>) -> Result<Polygon> {
    let mut p = make_block(length, thickness, name)?;
    p.set_mass(f64::INFINITY)?;
    // edges are built bottom, right, top, left
    p.set_special_edge(2)?;
    Ok(p)
}
