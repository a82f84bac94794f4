use crate::model::{Activity, Point, Sphere};
use rand::{rngs::StdRng, Rng};

// Fixed per-tick increments; playback speed rides the frame cap.
pub(crate) const TIME_STEP: f32 = 0.02;
pub(crate) const BREATH_STEP: f32 = 0.008;
pub(crate) const ROTATION_STEP: f32 = 0.0016;

// Bernoulli trial per point per tick for the Active/Dormant flip
pub(crate) const STATE_FLIP_CHANCE: f64 = 0.0003;

const GLOBAL_BREATHE_AMOUNT: f32 = 0.02;
const OPACITY_STEP: f32 = 0.005;
const OPACITY_LO: f32 = 0.3;
const OPACITY_HI: f32 = 0.9;
const OPACITY_MAX: f32 = 1.0;
pub(crate) const DORMANT_FADE: f32 = 0.003;
pub(crate) const DORMANT_FLOOR: f32 = 0.2;
const BOUNCE_DAMPING: f32 = -0.5;

// Simulation clock, owned by the app loop and threaded into every update.
pub(crate) struct Clock {
    pub(crate) time: f32,
    pub(crate) breath: f32,
}

impl Clock {
    pub(crate) fn new() -> Self {
        Self {
            time: 0.0,
            breath: 0.0,
        }
    }

    pub(crate) fn tick(&mut self) {
        self.time += TIME_STEP;
        self.breath += BREATH_STEP;
    }
}

pub(crate) fn update_point(p: &mut Point, clock: &Clock) {
    match p.activity {
        Activity::Active => {
            let breathe = GLOBAL_BREATHE_AMOUNT * clock.breath.sin()
                + p.breathe_amount * (clock.time * p.breathe_speed + p.phase).sin();
            let scale = 1.0 + breathe;

            // rest position scaled by the breathing factor, plus per-axis drift
            let t = clock.time * p.move_speed;
            p.x = p.base_x * scale + p.vx * (t + p.phase).sin();
            p.y = p.base_y * scale + p.vy * (t + p.phase * 1.7).cos();
            p.z = p.base_z * scale + p.vz * (t * 0.8 + p.phase * 0.6).sin();

            p.opacity = (p.opacity + p.opacity_dir * OPACITY_STEP).clamp(DORMANT_FLOOR, OPACITY_MAX);
            if p.opacity >= OPACITY_HI {
                p.opacity_dir = -1.0;
            } else if p.opacity <= OPACITY_LO {
                p.opacity_dir = 1.0;
            }
        }
        Activity::Dormant => {
            // fade toward the floor, hold position
            p.opacity = (p.opacity - DORMANT_FADE).max(DORMANT_FLOOR);
        }
    }
}

// Inelastic bounce: pull the point back onto the boundary and damp the drift.
pub(crate) fn clamp_to_radius(p: &mut Point, radius: f32) {
    let d2 = p.x * p.x + p.y * p.y + p.z * p.z;
    if d2 > radius * radius {
        let k = radius / d2.sqrt();
        p.x *= k;
        p.y *= k;
        p.z *= k;
        p.vx *= BOUNCE_DAMPING;
        p.vy *= BOUNCE_DAMPING;
        p.vz *= BOUNCE_DAMPING;
    }
}

impl Sphere {
    pub(crate) fn step(&mut self, rng: &mut StdRng, clock: &Clock) {
        for p in &mut self.points {
            if rng.gen_bool(STATE_FLIP_CHANCE) {
                p.activity = p.activity.flipped();
            }
            update_point(p, clock);
            clamp_to_radius(p, self.radius);
        }
        self.rotation += ROTATION_STEP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn fixed_point() -> Point {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = crate::model::generate_points(&mut rng, 100.0, 1).pop().unwrap();
        p.activity = Activity::Dormant;
        p
    }

    #[test]
    fn clock_advances_by_fixed_steps() {
        let mut clock = Clock::new();
        clock.tick();
        clock.tick();
        assert!((clock.time - 2.0 * TIME_STEP).abs() < 1e-6);
        assert!((clock.breath - 2.0 * BREATH_STEP).abs() < 1e-6);
    }

    #[test]
    fn bounce_rescales_and_damps() {
        let mut p = fixed_point();
        p.x = 150.0;
        p.y = 0.0;
        p.z = 0.0;
        p.vx = 2.0;
        p.vy = -1.0;
        p.vz = 0.5;

        clamp_to_radius(&mut p, 100.0);

        let d = (p.x * p.x + p.y * p.y + p.z * p.z).sqrt();
        assert!((d - 100.0).abs() < 1e-3);
        assert!((p.vx + 1.0).abs() < 1e-6);
        assert!((p.vy - 0.5).abs() < 1e-6);
        assert!((p.vz + 0.25).abs() < 1e-6);
    }

    #[test]
    fn dormant_point_fades_and_holds_position() {
        let mut p = fixed_point();
        p.opacity = 0.5;
        let (x, y, z) = (p.x, p.y, p.z);

        let clock = Clock::new();
        update_point(&mut p, &clock);

        assert!((p.opacity - 0.497).abs() < 1e-6);
        assert_eq!((p.x, p.y, p.z), (x, y, z));
    }

    #[test]
    fn dormant_fade_stops_at_floor() {
        let mut p = fixed_point();
        p.opacity = 0.201;
        let clock = Clock::new();
        update_point(&mut p, &clock);
        assert!((p.opacity - DORMANT_FLOOR).abs() < 1e-6);

        update_point(&mut p, &clock);
        assert!((p.opacity - DORMANT_FLOOR).abs() < 1e-6);
    }

    #[test]
    fn active_opacity_reflects_at_bounds() {
        let mut p = fixed_point();
        p.activity = Activity::Active;
        let clock = Clock::new();

        p.opacity = 0.9;
        p.opacity_dir = 1.0;
        update_point(&mut p, &clock);
        assert_eq!(p.opacity_dir, -1.0);
        assert!(p.opacity <= OPACITY_MAX);

        p.opacity = 0.3;
        p.opacity_dir = -1.0;
        update_point(&mut p, &clock);
        assert_eq!(p.opacity_dir, 1.0);
        assert!(p.opacity >= DORMANT_FLOOR);
    }

    #[test]
    fn invariants_hold_over_many_steps() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut sphere = Sphere::new(&mut rng, 0, 0.0, 0.0, 60.0, 150);
        let mut clock = Clock::new();

        for _ in 0..500 {
            clock.tick();
            sphere.step(&mut rng, &clock);
            for p in &sphere.points {
                let d = (p.x * p.x + p.y * p.y + p.z * p.z).sqrt();
                assert!(d <= 60.0 + 1e-3, "point escaped to {}", d);
                assert!(p.opacity >= DORMANT_FLOOR - 1e-6 && p.opacity <= OPACITY_MAX + 1e-6);
            }
        }
    }

    #[test]
    fn links_never_change_after_construction() {
        let mut rng = StdRng::seed_from_u64(29);
        let mut sphere = Sphere::new(&mut rng, 0, 0.0, 0.0, 60.0, 80);
        let before: Vec<_> = sphere.points.iter().map(|p| p.links.clone()).collect();
        let mut clock = Clock::new();
        for _ in 0..200 {
            clock.tick();
            sphere.step(&mut rng, &clock);
        }
        for (p, old) in sphere.points.iter().zip(before.iter()) {
            assert_eq!(&p.links, old);
        }
    }
}
