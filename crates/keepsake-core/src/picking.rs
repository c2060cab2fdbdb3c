use glam::Vec3;

/// Distance along a normalized ray to the first intersection with a sphere.
///
/// Returns `None` when the ray misses or the sphere lies behind the origin.
/// An origin inside the sphere reports the exit point.
#[inline]
pub fn ray_sphere(ray_origin: Vec3, ray_dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray_origin - center;
    let b = oc.dot(ray_dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let near = -b - sq;
    if near >= 0.0 {
        return Some(near);
    }
    let far = -b + sq;
    (far >= 0.0).then_some(far)
}

/// Sort hits nearest first.
pub fn sort_hits<T>(hits: &mut [(T, f32)]) {
    hits.sort_by(|a, b| a.1.total_cmp(&b.1));
}
