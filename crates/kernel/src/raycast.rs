//! Ray intersection against collider shapes.
//!
//! Boxes use the slab method: entry and exit distances are computed per axis
//! and the ray hits when the latest entry precedes the earliest exit. The axis
//! of the latest entry gives the face normal.

use glam::Vec3;
use multitool_common::Ray;

use crate::body::Shape;

/// Distance and normal of the first intersection with `shape` centred at `center`.
///
/// A ray starting inside a shape hits it at distance zero, facing back along the ray.
pub fn intersect(ray: &Ray, shape: &Shape, center: Vec3) -> Option<(f32, Vec3)> {
    match *shape {
        Shape::Sphere { radius } => ray_sphere(ray, center, radius),
        Shape::Box { half_extents } => ray_aabb(ray, center - half_extents, center + half_extents),
    }
}

fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some((0.0, -ray.direction));
    }
    let disc = b * b - c;
    if b > 0.0 || disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    let normal = (ray.at(t) - center).try_normalize().unwrap_or(-ray.direction);
    Some((t, normal))
}

fn ray_aabb(ray: &Ray, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = -ray.direction;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];
        if dir.abs() < f32::EPSILON {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let mut t0 = (min[axis] - origin) * inv;
        let mut t1 = (max[axis] - origin) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > t_enter {
            t_enter = t0;
            let mut n = Vec3::ZERO;
            n[axis] = -dir.signum();
            normal = n;
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 {
        return None;
    }
    if t_enter < 0.0 {
        return Some((0.0, -ray.direction));
    }
    Some((t_enter, normal))
}
