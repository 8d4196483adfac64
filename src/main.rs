//! Tether Sim - Entry point
//!
//! CLI Usage:
//!   cargo run --release                        # Default parameters
//!   cargo run --release -- --params data/parameters
//!   cargo run --release -- --duration 5 --segments 8
//!   cargo run --release -- --csv               # Export the trajectory

use anyhow::{bail, Result};
use tether_sim::{CsvExporter, Parameters, TetherSolver};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let mut params = Parameters::load_or_default();
    let mut export_csv = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--params" => {
                i += 1;
                let dir = args.get(i).map(String::as_str).unwrap_or("");
                if dir.is_empty() {
                    bail!("--params requires a directory");
                }
                params = Parameters::load_from_dir(dir);
            }
            "--duration" => {
                i += 1;
                params.simulation.duration_sec = parse_value(&args, i, "--duration")?;
            }
            "--segments" => {
                i += 1;
                params.tether.segments = parse_value(&args, i, "--segments")?;
            }
            "--reel" => {
                i += 1;
                params.tether.v_ro_m_per_sec = parse_value(&args, i, "--reel")?;
            }
            "--csv" => export_csv = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => bail!("unknown argument: {other} (try --help)"),
        }
        i += 1;
    }

    log::info!("Tether Sim starting...");

    println!("=== Tether Sim ===\n");
    println!("Segments:       {}", params.tether.segments);
    println!("Initial length: {:.1} m", params.tether.l0_m);
    println!("Reel-out speed: {:.2} m/s", params.tether.v_ro_m_per_sec);
    println!("Duration:       {:.1} s", params.simulation.duration_sec);
    println!();

    let mut solver = TetherSolver::new(&params)?;
    let start = std::time::Instant::now();
    let trajectory = solver.solve()?;
    let elapsed = start.elapsed();

    // Summary table, one row per second of simulated time.
    println!(
        "{:>8} {:>10} {:>10} {:>10} {:>12}",
        "Time(s)", "EndX(m)", "EndZ(m)", "L(t)(m)", "MaxTension(N)"
    );
    println!("{}", "-".repeat(54));

    let stride = (1.0 / params.simulation.sample_interval_sec).round().max(1.0) as usize;
    for sample in trajectory.iter().step_by(stride) {
        let end = sample.free_end();
        let tensions = solver.segment_tensions_at(sample);
        let max_tension = tensions.iter().cloned().fold(0.0, f64::max);
        println!(
            "{:8.2} {:10.3} {:10.3} {:10.3} {:12.1}",
            sample.time_sec,
            end.x,
            end.z,
            solver.schedule.total_length_m(sample.time_sec),
            max_tension,
        );
    }

    let stats = solver.stats();
    println!(
        "\nSolved in {:.2?}: {} samples, {} accepted / {} rejected steps, {} RHS evaluations",
        elapsed,
        trajectory.len(),
        stats.steps_accepted,
        stats.steps_rejected,
        stats.rhs_evaluations,
    );

    if export_csv {
        let mut exporter = CsvExporter::new()?;
        exporter.write_trajectory(&trajectory)?;
        let path = exporter.finish()?;
        println!("Trajectory written to {}", path.display());
    }

    Ok(())
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T> {
    args.get(i)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| anyhow::anyhow!("{flag} requires a numeric value"))
}

fn print_usage() {
    println!("Usage: tether-sim [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --params <dir>     Load parameter JSON files from <dir>");
    println!("  --duration <s>     Override simulated duration");
    println!("  --segments <n>     Override segment count");
    println!("  --reel <m/s>       Override reel-out speed (negative reels in)");
    println!("  --csv              Export the trajectory to exports/");
    println!("  --help             Show this help");
}
