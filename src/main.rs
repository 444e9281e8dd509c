mod menu;

use common::config::load_config;
use common::TickSample;

const CONFIG_PATH: &str = "configs/gate_24h_baseline.toml";

fn main() {
    println!("===========================================");
    println!("Welcome to the Gate Controller Validation Suite");
    println!("===========================================");

    loop {
        menu::show_menu();

        match menu::get_user_choice() {
            Ok(1) => run_reference_demo(),
            Ok(2) => run_compiled_demo(),
            Ok(3) => run_hardware_demo(),
            Ok(4) => run_comparison(),
            Ok(5) => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please select 1-5."),
        }
    }
}

fn run_reference_demo() {
    println!("\n=== Running Reference Simulation ===");

    let config = load_config(CONFIG_PATH).expect("Failed to load config");
    println!(
        "Configuration: {} hours at {} s per tick, seed {}",
        config.run.duration_hours, config.run.timestep_s, config.run.seed
    );

    let recorder = reference_impl::run_simulation(&config);
    display_results(recorder.samples());
    recorder
        .save_to_csv("reference_results.csv")
        .expect("Failed to save reference CSV");

    menu::wait_for_enter();
}

fn run_compiled_demo() {
    println!("\n=== Running Compiled Simulation ===");

    let config = load_config(CONFIG_PATH).expect("Failed to load config");
    println!("Module: {}", config.ffi.library);

    match ffi_impl::run_simulation(&config) {
        Ok(recorder) => {
            display_results(recorder.samples());
            recorder
                .save_to_csv("compiled_results.csv")
                .expect("Failed to save compiled CSV");
        }
        Err(e) => {
            println!("Compiled tier unavailable: {}", e);
            println!("Build the controller module and point [ffi].library at it.");
        }
    }

    menu::wait_for_enter();
}

fn run_hardware_demo() {
    println!("\n=== Running Hardware Simulation ===");

    let config = load_config(CONFIG_PATH).expect("Failed to load config");
    println!(
        "Port: {} @ {} baud (waiting {}s for the board to boot)",
        config.serial.port, config.serial.baud, config.serial.boot_delay_s
    );

    match serial_impl::run_simulation(&config) {
        Ok((recorder, stats)) => {
            display_results(recorder.samples());
            println!(
                "Link faults: {} timeouts, {} malformed replies",
                stats.timeouts, stats.malformed
            );
            recorder
                .save_to_csv("hardware_results.csv")
                .expect("Failed to save hardware CSV");
        }
        Err(e) => {
            println!("Hardware tier unavailable: {}", e);
            println!("Check the cable and the [serial].port setting.");
        }
    }

    menu::wait_for_enter();
}

fn run_comparison() {
    println!("\n=== Running Cross-Tier Comparison ===");
    println!("Note: runs every reachable tier against the reference");

    match std::process::Command::new("cargo")
        .args([
            "run",
            "--release",
            "--bin",
            "validation_runner",
            CONFIG_PATH,
            "compare",
        ])
        .status()
    {
        Ok(status) if status.success() => {
            println!("Comparison finished.");
        }
        Ok(status) => {
            println!("Comparison exited with status: {}", status);
        }
        Err(e) => {
            println!("Failed to launch the validation runner: {}", e);
            println!("Make sure you have the validation_runner binary available.");
        }
    }

    menu::wait_for_enter();
}

fn display_results(samples: &[TickSample]) {
    if samples.is_empty() {
        println!("No samples to display.");
        return;
    }

    let pulses = samples.iter().filter(|s| s.pulse).count();
    let active = samples.iter().filter(|s| s.command != 0).count();
    let final_position = samples.last().map(|s| s.position).unwrap_or(0.0);

    println!("\n=== Simulation Results ===");
    println!("Recorded samples: {}", samples.len());
    println!("Radio pulses: {}", pulses);
    println!("Samples with the motor running: {}", active);
    println!("Final gate position: {:.3} m", final_position);
}
