use common::config::{load_config, SimulationConfig};
use common::TickSample;
use criterion::{black_box, Criterion};
use std::env;

fn analyze_results_detailed(samples: &[TickSample], name: &str) {
    if samples.is_empty() {
        println!("{}: No samples to analyze", name);
        return;
    }

    let total = samples.len();
    let pulses = samples.iter().filter(|s| s.pulse).count();
    let opening = samples.iter().filter(|s| s.command == 1).count();
    let closing = samples.iter().filter(|s| s.command == -1).count();
    let idle = total - opening - closing;

    let max_position = samples.iter().map(|s| s.position).fold(f64::MIN, f64::max);
    let min_position = samples.iter().map(|s| s.position).fold(f64::MAX, f64::min);
    let final_position = samples.last().map(|s| s.position).unwrap_or(0.0);

    println!("\n=== {} Detailed Analysis ===", name);
    println!("Recorded samples: {}", total);
    println!("Radio pulses: {}", pulses);
    println!(
        "Motor activity: {} opening, {} closing, {} idle samples",
        opening, closing, idle
    );
    println!(
        "Position range (m): min={:.3}, max={:.3}, final={:.3}",
        min_position, max_position, final_position
    );
}

/// Counts sample-level disagreements between two runs of the same
/// configuration. Identical input streams must yield identical sample
/// sequences, so any difference is a behavioural divergence.
fn report_parity(
    reference: &[TickSample],
    candidate: &[TickSample],
    name: &str,
    fault_ticks: u64,
) -> bool {
    let compared = reference.len().min(candidate.len());
    let mut mismatches = reference.len().abs_diff(candidate.len());
    let mut first_divergence: Option<usize> = None;

    for i in 0..compared {
        if reference[i] != candidate[i] {
            mismatches += 1;
            first_divergence.get_or_insert(i);
        }
    }

    println!("\n=== Parity: REFERENCE vs {} ===", name);
    println!(
        "Samples compared: {} (reference {}, {} {})",
        compared,
        reference.len(),
        name,
        candidate.len()
    );
    println!("Mismatched samples: {}", mismatches);
    if let Some(index) = first_divergence {
        println!(
            "First divergence at sample {} (hour {:.4})",
            index, reference[index].hour
        );
    }
    if fault_ticks > 0 {
        println!(
            "Link faults during the run: {} tick(s) fell back to the safe command",
            fault_ticks
        );
    }

    let pass = mismatches == 0;
    if pass {
        println!("Verdict: PASS - trajectories are identical");
    } else if fault_ticks > 0 {
        println!("Verdict: DIVERGED - see link faults above before judging the controller");
    } else {
        println!("Verdict: FAIL - controller behaviour differs from the reference");
    }
    pass
}

fn run_reference(config: &SimulationConfig) {
    println!("Running REFERENCE simulation...");
    let start = std::time::Instant::now();
    let recorder = reference_impl::run_simulation(config);
    let elapsed = start.elapsed();

    println!(
        "Reference simulation completed in {:.2} seconds",
        elapsed.as_secs_f64()
    );
    analyze_results_detailed(recorder.samples(), "REFERENCE");
    recorder
        .save_to_csv("reference_results.csv")
        .expect("Failed to save reference CSV");
}

fn run_compiled(config: &SimulationConfig) {
    println!("Running COMPILED simulation...");
    println!("Module: {}", config.ffi.library);
    match ffi_impl::run_simulation(config) {
        Ok(recorder) => {
            analyze_results_detailed(recorder.samples(), "COMPILED");
            recorder
                .save_to_csv("compiled_results.csv")
                .expect("Failed to save compiled CSV");
        }
        Err(e) => {
            eprintln!("Compiled tier unavailable: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_hardware(config: &SimulationConfig) {
    println!("Running HARDWARE simulation...");
    println!(
        "Port: {} @ {} baud, reply timeout {} ms",
        config.serial.port, config.serial.baud, config.serial.reply_timeout_ms
    );
    match serial_impl::run_simulation(config) {
        Ok((recorder, stats)) => {
            analyze_results_detailed(recorder.samples(), "HARDWARE");
            println!(
                "Link faults: {} timeouts, {} malformed replies",
                stats.timeouts, stats.malformed
            );
            recorder
                .save_to_csv("hardware_results.csv")
                .expect("Failed to save hardware CSV");
        }
        Err(e) => {
            eprintln!("Hardware tier unavailable: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_comparison(config: &SimulationConfig) {
    println!("Running REFERENCE simulation (baseline)...");
    let reference = reference_impl::run_simulation(config);
    analyze_results_detailed(reference.samples(), "REFERENCE");

    println!("\nRunning COMPILED simulation...");
    match ffi_impl::run_simulation(config) {
        Ok(compiled) => {
            report_parity(reference.samples(), compiled.samples(), "COMPILED", 0);
        }
        Err(e) => {
            eprintln!("Skipping compiled tier: {}", e);
        }
    }

    println!("\nRunning HARDWARE simulation...");
    match serial_impl::run_simulation(config) {
        Ok((hardware, stats)) => {
            report_parity(
                reference.samples(),
                hardware.samples(),
                "HARDWARE",
                stats.fault_ticks(),
            );
        }
        Err(e) => {
            eprintln!("Skipping hardware tier: {}", e);
        }
    }
}

fn benchmark_reference(c: &mut Criterion, config: &SimulationConfig) {
    let config = config.clone();
    c.bench_function("reference_simulation", |b| {
        b.iter(|| {
            let recorder = reference_impl::run_simulation(black_box(&config));
            black_box(recorder.len());
        });
    });
}

fn benchmark_compiled(c: &mut Criterion, config: &SimulationConfig) {
    let config = config.clone();
    c.bench_function("compiled_simulation", |b| {
        b.iter(|| {
            let recorder = ffi_impl::run_simulation(black_box(&config))
                .expect("compiled module vanished mid-benchmark");
            black_box(recorder.len());
        });
    });
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: validation_runner <config_file> [reference|compiled|hardware|compare] [--criterion]");
        eprintln!("Example: validation_runner configs/gate_24h_baseline.toml compare");
        std::process::exit(1);
    }

    let config_path = &args[1];
    let mode = args.get(2).map(|s| s.as_str()).unwrap_or("compare");
    let use_criterion = args.contains(&"--criterion".to_string());

    let config = load_config(config_path).expect("Failed to load config");

    println!("========================================");
    println!("Gate Controller Validation Runner");
    println!("========================================");
    println!("Config: {}", config_path);
    println!("Simulation: {}", config.simulation_name);
    println!("Duration: {} hours", config.run.duration_hours);
    println!(
        "Timestep: {} s ({} ticks)",
        config.run.timestep_s,
        config.run.total_ticks()
    );
    println!("Seed: {}", config.run.seed);
    println!("Mode: {}", mode);
    println!("========================================\n");

    if use_criterion {
        let mut criterion = Criterion::default()
            .sample_size(20)
            .measurement_time(std::time::Duration::from_secs(30));

        println!("Running REFERENCE statistical benchmarks...");
        benchmark_reference(&mut criterion, &config);

        if mode == "compiled" || mode == "compare" {
            println!("\nRunning COMPILED statistical benchmarks...");
            benchmark_compiled(&mut criterion, &config);
        }

        println!("\n========================================");
        println!("Criterion statistical analysis complete!");
        println!("Check the target/criterion directory for detailed HTML reports.");
        println!("========================================");
        return;
    }

    match mode {
        "reference" => run_reference(&config),
        "compiled" => run_compiled(&config),
        "hardware" => run_hardware(&config),
        "compare" => run_comparison(&config),
        other => {
            eprintln!("Unknown mode '{}'", other);
            std::process::exit(1);
        }
    }

    println!("\n========================================");
    println!("Validation run complete!");
    println!("========================================");
}
