use crate::canvas::{Canvas, SUB_H, SUB_W};
use crate::model::Sphere;
use crate::render::{self, Screen, PALETTES};
use crate::sim::Clock;
use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    style::ResetColor,
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

pub(crate) struct Opts {
    pub(crate) fps: u64,
    pub(crate) points: usize,
    pub(crate) seed: u64,
}

const MIN_CELLS_W: u16 = 24;
const MIN_CELLS_H: u16 = 12;
const HUD_ROWS: u16 = 1;

pub(crate) const POINTS_MIN: usize = 80;
pub(crate) const POINTS_MAX: usize = 4000;
const POINTS_STEP: usize = 40;

// Two fields share the surface: a large one low-left, a small one high-right.
const PRIMARY_SHARE: f32 = 0.7;
const PRIMARY_RADIUS: f32 = 0.42;
const SECONDARY_RADIUS: f32 = 0.21;

pub(crate) fn run(opts: Opts) -> Result<()> {
    let mut out = io::stdout();

    execute!(out, EnterAlternateScreen, cursor::Hide, DisableLineWrap)?;
    terminal::enable_raw_mode()?;

    let res = run_loop(&mut out, &opts);

    terminal::disable_raw_mode().ok();
    execute!(out, ResetColor, EnableLineWrap, cursor::Show, LeaveAlternateScreen).ok();

    res
}

fn run_loop(out: &mut Stdout, opts: &Opts) -> Result<()> {
    let mut rng = if opts.seed != 0 {
        StdRng::seed_from_u64(opts.seed)
    } else {
        StdRng::from_entropy()
    };

    let mut palette_i: usize = 0;
    let mut target_points = opts.points.clamp(POINTS_MIN, POINTS_MAX);
    let mut show_hud = true;
    let mut paused = false;
    let mut step_once = false;

    let mut clock = Clock::new();
    let mut last_size = (0u16, 0u16);
    let mut canvas = Canvas::new(0, 0);
    let mut screen = Screen::new(0, 0);
    let mut spheres: Vec<Sphere> = Vec::new();

    execute!(out, Clear(ClearType::All))?;

    loop {
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(k) = event::read()? {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match k.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') => paused = !paused,
                    KeyCode::Char('n') | KeyCode::Char('N') => {
                        if paused {
                            step_once = true;
                        }
                    }
                    KeyCode::Char('c') | KeyCode::Char('C') => {
                        palette_i = (palette_i + 1) % PALETTES.len();
                    }
                    KeyCode::Char('+') | KeyCode::Char('=') => {
                        target_points = (target_points + POINTS_STEP).min(POINTS_MAX);
                        last_size = (0, 0);
                    }
                    KeyCode::Char('-') | KeyCode::Char('_') => {
                        target_points = target_points.saturating_sub(POINTS_STEP).max(POINTS_MIN);
                        last_size = (0, 0);
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') => last_size = (0, 0),
                    KeyCode::Char('h') | KeyCode::Char('H') => show_hud = !show_hud,
                    _ => {}
                }
            }
        }

        let frame_start = Instant::now();

        // Resize (or a forced rebuild): fields and graphs are rebuilt whole at
        // the new scale, then swapped in before the next frame reads them.
        let size = terminal::size()?;
        if size != last_size {
            last_size = size;
            let (tw, th) = size;
            if tw >= MIN_CELLS_W && th >= MIN_CELLS_H {
                let w_cells = tw as usize;
                let h_cells = (th - HUD_ROWS) as usize;
                let sw = w_cells * SUB_W;
                let sh = h_cells * SUB_H;
                spheres = build_scene(&mut rng, sw, sh, target_points);
                canvas = Canvas::new(sw, sh);
                screen = Screen::new(w_cells, h_cells);
                execute!(out, Clear(ClearType::All))?;
            } else {
                spheres.clear();
                canvas = Canvas::new(0, 0);
                screen = Screen::new(0, 0);
            }
        }

        // no usable surface: skip the frame, keep polling
        if canvas.is_degenerate() {
            sleep_to_cap(frame_start, opts.fps);
            continue;
        }

        let do_sim = !paused || step_once;
        step_once = false;
        if do_sim {
            clock.tick();
            for s in spheres.iter_mut() {
                s.step(&mut rng, &clock);
            }
        }

        canvas.clear();
        render::draw_scene(&mut canvas, &spheres);

        let hud_line = if show_hud {
            Some(format!(
                "netsphere | Q quit | Space pause | N step | C {} | +/- points {} | R reseed | H hud | {} fps{}",
                PALETTES[palette_i].name,
                target_points,
                opts.fps,
                if paused { " | paused" } else { "" },
            ))
        } else {
            None
        };
        screen.present(out, &canvas, &PALETTES[palette_i], hud_line.as_deref())?;

        sleep_to_cap(frame_start, opts.fps);
    }
}

fn build_scene(rng: &mut StdRng, sw: usize, sh: usize, total: usize) -> Vec<Sphere> {
    let min_dim = sw.min(sh) as f32;
    let primary = (total as f32 * PRIMARY_SHARE) as usize;
    let secondary = total - primary;

    vec![
        Sphere::new(
            rng,
            0,
            sw as f32 * 0.40,
            sh as f32 * 0.54,
            min_dim * PRIMARY_RADIUS,
            primary,
        ),
        Sphere::new(
            rng,
            1,
            sw as f32 * 0.76,
            sh as f32 * 0.30,
            min_dim * SECONDARY_RADIUS,
            secondary,
        ),
    ]
}

fn sleep_to_cap(frame_start: Instant, fps: u64) {
    let frame_ms = 1000 / fps.max(1);
    let elapsed_ms = frame_start.elapsed().as_millis() as u64;
    if elapsed_ms < frame_ms {
        std::thread::sleep(Duration::from_millis(frame_ms - elapsed_ms));
    }
}
