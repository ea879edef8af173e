//! Forecaster entry point — CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use homecast::config::ForecastConfig;
use homecast::history::ConsumptionHistory;
use homecast::io::export::{export_csv, export_json};
use homecast::models::ConsumptionProfile;
use homecast::scenario::{self, InputData};
use homecast::sim::battery::BatteryParams;
use homecast::sim::engine::{Engine, ForecastRun};
use homecast::sim::types::SimConfig;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    input_path: Option<String>,
    seed_override: Option<u64>,
    now_override: Option<String>,
    json_out: Option<String>,
    csv_out: Option<String>,
}

fn print_help() {
    eprintln!("homecast — Household net-energy and battery Monte Carlo forecaster");
    eprintln!();
    eprintln!("Usage: homecast [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>   Load forecast config from TOML file");
    eprintln!("  --preset <name>   Use a built-in preset (baseline, quick)");
    eprintln!("  --input <path>    Load meter history and solar forecast from JSON");
    eprintln!("  --seed <u64>      Override random seed");
    eprintln!("  --now <rfc3339>   Override the evaluation instant");
    eprintln!("  --out <path>      Export the forecast payload to JSON");
    eprintln!("  --csv <path>      Export per-step records to CSV");
    eprintln!("  --help            Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
    eprintln!("If no --input is given, a seeded synthetic scenario is generated.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        input_path: None,
        seed_override: None,
        now_override: None,
        json_out: None,
        csv_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--input" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --input requires a path argument");
                    process::exit(1);
                }
                cli.input_path = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--now" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --now requires an RFC 3339 timestamp argument");
                    process::exit(1);
                }
                cli.now_override = Some(args[i].clone());
            }
            "--out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --out requires a path argument");
                    process::exit(1);
                }
                cli.json_out = Some(args[i].clone());
            }
            "--csv" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --csv requires a path argument");
                    process::exit(1);
                }
                cli.csv_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Fits the consumption model and runs the forecast for one input set.
fn run_forecast(
    config: &ForecastConfig,
    input: &InputData,
    tz: Tz,
    now: DateTime<Tz>,
) -> Result<ForecastRun, String> {
    let window_start = scenario::local_midnight(now, -i64::from(config.history.window_days));
    let history = ConsumptionHistory::build(
        &input.meter_history,
        window_start,
        now,
        config.history.step_minutes,
    )
    .map_err(|err| err.to_string())?;
    let profile = ConsumptionProfile::fit(&history);

    let steps = input.forecast_steps(tz, config.history.step_minutes);
    let mut sim_config = SimConfig::new(config.simulation.samples, config.simulation.seed);
    sim_config.percentiles = config.simulation.percentiles;

    let battery = BatteryParams {
        soc_kwh: input.battery_soc_kwh,
        capacity_kwh: input.battery_capacity_kwh,
    };

    let mut engine = Engine::new(sim_config, steps, &profile, battery, now)
        .map_err(|err| err.to_string())?;
    Ok(engine.run())
}

fn main() {
    let cli = parse_args();

    // Load config: --config takes priority, then --preset, then baseline default
    let mut config = if let Some(ref path) = cli.config_path {
        match ForecastConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ForecastConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ForecastConfig::baseline()
    };

    // Apply seed override
    if let Some(seed) = cli.seed_override {
        config.simulation.seed = seed;
    }

    // Validate
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let tz = match config.timezone() {
        Ok(tz) => tz,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let now = if let Some(ref raw) = cli.now_override {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(t) => t.with_timezone(&tz),
            Err(e) => {
                eprintln!("error: --now value \"{raw}\" is not RFC 3339: {e}");
                process::exit(1);
            }
        }
    } else {
        Utc::now().with_timezone(&tz)
    };

    // Load input: --input takes priority over the seeded synthetic scenario
    let input = if let Some(ref path) = cli.input_path {
        match InputData::from_json_path(Path::new(path)) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
    } else {
        scenario::demo_input(&config, now)
    };

    let run = match run_forecast(&config, &input, tz, now) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    // Print per-step records and the daily totals
    for record in &run.records {
        println!("{record}");
    }
    println!("\n{}", run.daily);

    // Exports if requested
    if let Some(ref path) = cli.csv_out {
        if let Err(e) = export_csv(&run.records, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Forecast records written to {path}");
    }
    if let Some(ref path) = cli.json_out {
        if let Err(e) = export_json(&run, Path::new(path)) {
            eprintln!("error: failed to write JSON: {e}");
            process::exit(1);
        }
        eprintln!("Forecast payload written to {path}");
    }
}
