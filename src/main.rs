//! Particle Sandbox headless demo
//!
//! Builds the demo scene and runs ten simulated seconds at 60 Hz, logging
//! energy and collision totals once per second. Set `RUST_LOG=info` to see it.

use sandbox::Simulation;

const TICK_RATE: u32 = 60;
const SECONDS: u32 = 10;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(42);
    log::info!("Particle Sandbox (native) starting, seed {seed}");

    let mut sim = Simulation::demo(seed);
    let dt = 1.0 / TICK_RATE as f32;
    for tick in 1..=TICK_RATE * SECONDS {
        sim.advance(dt);
        if tick % TICK_RATE == 0 {
            let p = sim.momentum();
            log::info!(
                "t={:>5.2}s energy={:>12.1} momentum=({:.1}, {:.1}) collisions={}",
                sim.time(),
                sim.kinetic_energy(),
                p.x,
                p.y,
                sim.collision_count()
            );
        }
    }

    println!(
        "{} particles, {} collisions after {SECONDS}s",
        sim.particles().len(),
        sim.collision_count()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on wasm
}
