use rand::{rngs::StdRng, Rng};

// Field generation tuning
const RADIUS_FILL_MIN: f32 = 0.6;
const RADIUS_FILL_MAX: f32 = 1.2; // points overfill the shell, the first step pulls strays in
const OPACITY_INIT_MIN: f32 = 0.3;
const OPACITY_INIT_MAX: f32 = 1.0;
const SIZE_MIN: f32 = 0.7;
const SIZE_MAX: f32 = 2.0;
const BREATHE_SPEED_MIN: f32 = 0.6;
const BREATHE_SPEED_MAX: f32 = 1.6;
const BREATHE_AMOUNT_MIN: f32 = 0.01;
const BREATHE_AMOUNT_MAX: f32 = 0.05;
const MOVE_SPEED_MIN: f32 = 0.5;
const MOVE_SPEED_MAX: f32 = 2.0;
const DRIFT_MAX: f32 = 0.05; // per axis, as a fraction of the sphere radius
const STRENGTH_MIN: f32 = 0.4;
const STRENGTH_MAX: f32 = 1.0;
const LINKS_MIN: usize = 5;
const LINKS_MAX: usize = 20;

// Neighbor eligibility radius, as a fraction of the sphere radius
pub(crate) const LINK_RADIUS_FACTOR: f32 = 0.45;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Activity {
    Active,
    Dormant,
}

impl Activity {
    pub(crate) fn flipped(self) -> Self {
        match self {
            Activity::Active => Activity::Dormant,
            Activity::Dormant => Activity::Active,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Link {
    pub(crate) to: usize,
    pub(crate) strength: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct Point {
    // live position, sphere-local
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) z: f32,
    // rest position the animation works from
    pub(crate) base_x: f32,
    pub(crate) base_y: f32,
    pub(crate) base_z: f32,
    // drift amplitudes, sign-damped on boundary contact
    pub(crate) vx: f32,
    pub(crate) vy: f32,
    pub(crate) vz: f32,
    pub(crate) opacity: f32,
    pub(crate) opacity_dir: f32, // +1 or -1
    pub(crate) size: f32,
    pub(crate) phase: f32,
    pub(crate) breathe_speed: f32,
    pub(crate) breathe_amount: f32,
    pub(crate) move_speed: f32,
    pub(crate) strength: f32,
    pub(crate) activity: Activity,
    pub(crate) max_links: usize,
    // fixed after construction, sorted by descending strength
    pub(crate) links: Vec<Link>,
}

pub(crate) struct Sphere {
    // center on the drawing surface, subpixels
    pub(crate) cx: f32,
    pub(crate) cy: f32,
    pub(crate) radius: f32,
    pub(crate) threshold: f32,
    pub(crate) layer: usize,
    pub(crate) rotation: f32,
    pub(crate) points: Vec<Point>,
}

impl Sphere {
    pub(crate) fn new(
        rng: &mut StdRng,
        layer: usize,
        cx: f32,
        cy: f32,
        radius: f32,
        count: usize,
    ) -> Self {
        let threshold = radius * LINK_RADIUS_FACTOR;
        let mut points = generate_points(rng, radius, count);
        build_links(&mut points, threshold);
        Self {
            cx,
            cy,
            radius,
            threshold,
            layer,
            rotation: 0.0,
            points,
        }
    }
}

pub(crate) fn generate_points(rng: &mut StdRng, radius: f32, count: usize) -> Vec<Point> {
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        // uniform over the sphere: azimuth flat, polar via arccos, radius jittered
        // through the volume so the field is a ball and not a shell
        let theta = rng.gen_range(0.0..std::f32::consts::TAU);
        let phi = rng.gen_range(-1.0f32..1.0).acos();
        let r = radius * rng.gen_range(RADIUS_FILL_MIN..RADIUS_FILL_MAX);

        let (sin_phi, cos_phi) = phi.sin_cos();
        let base_x = r * sin_phi * theta.cos();
        let base_y = r * cos_phi;
        let base_z = r * sin_phi * theta.sin();

        let drift = radius * DRIFT_MAX;

        points.push(Point {
            x: base_x,
            y: base_y,
            z: base_z,
            base_x,
            base_y,
            base_z,
            vx: rng.gen_range(-drift..drift),
            vy: rng.gen_range(-drift..drift),
            vz: rng.gen_range(-drift..drift),
            opacity: rng.gen_range(OPACITY_INIT_MIN..OPACITY_INIT_MAX),
            opacity_dir: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
            size: rng.gen_range(SIZE_MIN..SIZE_MAX),
            phase: rng.gen_range(0.0..std::f32::consts::TAU),
            breathe_speed: rng.gen_range(BREATHE_SPEED_MIN..BREATHE_SPEED_MAX),
            breathe_amount: rng.gen_range(BREATHE_AMOUNT_MIN..BREATHE_AMOUNT_MAX),
            move_speed: rng.gen_range(MOVE_SPEED_MIN..MOVE_SPEED_MAX),
            strength: rng.gen_range(STRENGTH_MIN..STRENGTH_MAX),
            activity: Activity::Active,
            max_links: rng.gen_range(LINKS_MIN..=LINKS_MAX),
            links: Vec::new(),
        });
    }
    points
}

// All-pairs pass over rest positions. Runs once per field build, never per frame.
// Lists are directional on purpose: a point keeps its own nearest picks and a
// neighbor may not reciprocate once its own cap truncates.
pub(crate) fn build_links(points: &mut [Point], threshold: f32) {
    let bases: Vec<(f32, f32, f32)> = points
        .iter()
        .map(|p| (p.base_x, p.base_y, p.base_z))
        .collect();

    for (i, p) in points.iter_mut().enumerate() {
        let mut candidates: Vec<Link> = Vec::new();
        for (j, &(bx, by, bz)) in bases.iter().enumerate() {
            if i == j {
                continue;
            }
            let dx = p.base_x - bx;
            let dy = p.base_y - by;
            let dz = p.base_z - bz;
            let d = (dx * dx + dy * dy + dz * dz).sqrt();
            if d >= threshold {
                continue;
            }
            candidates.push(Link {
                to: j,
                strength: 1.0 - d / threshold,
            });
        }
        candidates.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        candidates.truncate(p.max_links);
        p.links = candidates;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn bare_point(x: f32, y: f32, z: f32, max_links: usize) -> Point {
        Point {
            x,
            y,
            z,
            base_x: x,
            base_y: y,
            base_z: z,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            opacity: 0.5,
            opacity_dir: 1.0,
            size: 1.0,
            phase: 0.0,
            breathe_speed: 1.0,
            breathe_amount: 0.02,
            move_speed: 1.0,
            strength: 1.0,
            activity: Activity::Active,
            max_links,
            links: Vec::new(),
        }
    }

    #[test]
    fn field_has_count_bounds_and_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let points = generate_points(&mut rng, 100.0, 500);
        assert_eq!(points.len(), 500);

        for p in &points {
            let d = (p.base_x * p.base_x + p.base_y * p.base_y + p.base_z * p.base_z).sqrt();
            assert!(d <= 100.0 * RADIUS_FILL_MAX + 1e-3, "distance {} too large", d);
            assert!(p.opacity >= OPACITY_INIT_MIN && p.opacity <= OPACITY_INIT_MAX);
            assert!(p.strength >= STRENGTH_MIN && p.strength <= STRENGTH_MAX);
            assert!(p.max_links >= LINKS_MIN && p.max_links <= LINKS_MAX);
            assert!(p.size >= SIZE_MIN && p.size <= SIZE_MAX);
            assert!(p.opacity_dir == 1.0 || p.opacity_dir == -1.0);
        }
    }

    #[test]
    fn field_is_not_pole_clustered() {
        // arccos placement keeps the vertical coordinate balanced; with 500
        // samples the mean sits well inside a loose band around zero
        let mut rng = StdRng::seed_from_u64(11);
        let points = generate_points(&mut rng, 100.0, 500);
        let mean_y: f32 = points.iter().map(|p| p.base_y).sum::<f32>() / points.len() as f32;
        assert!(mean_y.abs() < 15.0, "mean y {} suggests pole clustering", mean_y);
    }

    #[test]
    fn links_respect_cap_threshold_and_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut points = generate_points(&mut rng, 80.0, 300);
        let threshold = 80.0 * LINK_RADIUS_FACTOR;
        build_links(&mut points, threshold);

        for p in &points {
            assert!(p.links.len() <= p.max_links);
            for pair in p.links.windows(2) {
                assert!(pair[0].strength >= pair[1].strength);
            }
            for l in &p.links {
                let q = &points[l.to];
                let dx = p.base_x - q.base_x;
                let dy = p.base_y - q.base_y;
                let dz = p.base_z - q.base_z;
                let d = (dx * dx + dy * dy + dz * dz).sqrt();
                assert!(d < threshold);
                assert!((l.strength - (1.0 - d / threshold)).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn links_are_deterministic_for_fixed_positions() {
        let mut rng = StdRng::seed_from_u64(19);
        let mut a = generate_points(&mut rng, 60.0, 200);
        let mut b = a.clone();
        let threshold = 60.0 * LINK_RADIUS_FACTOR;
        build_links(&mut a, threshold);
        build_links(&mut b, threshold);
        for (p, q) in a.iter().zip(b.iter()) {
            assert_eq!(p.links, q.links);
        }
    }

    #[test]
    fn links_may_be_asymmetric() {
        // a keeps only its single closest pick, so it lists c but not b,
        // while b still lists a from its own side
        let mut points = vec![
            bare_point(0.0, 0.0, 0.0, 1),
            bare_point(10.0, 0.0, 0.0, 2),
            bare_point(1.0, 0.0, 0.0, 2),
        ];
        build_links(&mut points, 20.0);

        assert_eq!(points[0].links.len(), 1);
        assert_eq!(points[0].links[0].to, 2);
        assert!(points[1].links.iter().any(|l| l.to == 0));
        assert!(!points[0].links.iter().any(|l| l.to == 1));
    }
}
