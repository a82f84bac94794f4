mod app;
mod canvas;
mod model;
mod render;
mod sim;

use anyhow::Result;
use std::env;

fn parse_args() -> app::Opts {
    // --fps N --points N --seed N
    let mut fps: u64 = 30;
    let mut points: usize = 320;
    let mut seed: u64 = 0;

    let mut it = env::args().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--fps" => {
                if let Some(v) = it.next() {
                    fps = v.parse().unwrap_or(fps);
                }
            }
            "--points" => {
                if let Some(v) = it.next() {
                    points = v.parse().unwrap_or(points);
                }
            }
            "--seed" => {
                if let Some(v) = it.next() {
                    seed = v.parse().unwrap_or(seed);
                }
            }
            "--help" | "-h" => {
                println!(
                    "netsphere\n\n\
                     Usage:\n\
                     \tnetsphere [--fps N] [--points N] [--seed N]\n\n\
                     Controls:\n\
                     \tQ / Esc quit\n\
                     \tSpace pause\n\
                     \tN step while paused\n\
                     \tC cycle palette\n\
                     \t+/- point density\n\
                     \tR reseed\n\
                     \tH toggle hud\n"
                );
                std::process::exit(0);
            }
            _ => {}
        }
    }

    app::Opts {
        fps: fps.clamp(5, 120),
        points: points.clamp(app::POINTS_MIN, app::POINTS_MAX),
        seed,
    }
}

fn main() -> Result<()> {
    app::run(parse_args())
}
