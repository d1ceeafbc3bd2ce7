use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use hc_app::{
    AppError, AppResult, CONTROLLER_VERSION, SimulationRequest, config_name, default_config_yaml,
    ensure_simulation, list_runs, load_config, load_run,
};
use hc_controls::TickRecord;
use hc_results::{RunManifest, RunMode, RunStore};
use hc_sim::{SensorFaultWindow, SimOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "humictl")]
#[command(about = "humictl - predictive humidity controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a controller config file
    Validate {
        /// Path to the config file (YAML, or JSON by extension)
        config_path: PathBuf,
    },
    /// Print or write the default config
    DefaultConfig {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the controller against the simulated chamber
    Simulate {
        /// Path to the config file
        config_path: PathBuf,
        /// Number of control ticks
        #[arg(long, default_value_t = 100)]
        ticks: usize,
        /// Chamber humidity at start (%RH)
        #[arg(long, default_value_t = 80.0)]
        initial: f64,
        /// Run store directory (defaults to .humictl/runs next to the config)
        #[arg(long)]
        store: Option<PathBuf>,
        /// First tick whose sensor read times out
        #[arg(long, requires = "fail_count")]
        fail_from: Option<usize>,
        /// Number of consecutive sensor timeouts
        #[arg(long, requires = "fail_from")]
        fail_count: Option<usize>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List stored runs
    Runs {
        /// Run store directory
        store_dir: PathBuf,
    },
    /// Show details of a stored run
    ShowRun {
        /// Run store directory
        store_dir: PathBuf,
        /// Run ID to display
        run_id: String,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::DefaultConfig { output } => cmd_default_config(output.as_deref()),
        Commands::Simulate {
            config_path,
            ticks,
            initial,
            store,
            fail_from,
            fail_count,
            no_cache,
        } => {
            let sensor_fault = match (fail_from, fail_count) {
                (Some(from_tick), Some(count)) => Some(SensorFaultWindow { from_tick, count }),
                _ => None,
            };
            let options = SimOptions {
                ticks,
                initial_humidity_pct: initial,
                sensor_fault,
                ..Default::default()
            };
            cmd_simulate(&config_path, options, store.as_deref(), !no_cache)
        }
        Commands::Runs { store_dir } => cmd_runs(&store_dir),
        Commands::ShowRun { store_dir, run_id } => cmd_show_run(&store_dir, &run_id),
    }
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating config: {}", config_path.display());
    let config = load_config(config_path)?;
    println!("✓ Config is valid");
    println!(
        "  target {:.1} %RH, period {} s, min on/off {}/{} s",
        config.target_humidity_pct,
        config.sampling_period_seconds,
        config.min_on_seconds,
        config.min_off_seconds
    );
    Ok(())
}

fn cmd_default_config(output: Option<&Path>) -> AppResult<()> {
    let yaml = default_config_yaml()?;
    match output {
        Some(path) => {
            std::fs::write(path, yaml).map_err(|e| AppError::ConfigFileWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
            println!("✓ Wrote default config to {}", path.display());
        }
        None => print!("{yaml}"),
    }
    Ok(())
}

fn cmd_simulate(
    config_path: &Path,
    options: SimOptions,
    store_dir: Option<&Path>,
    use_cache: bool,
) -> AppResult<()> {
    if !(0.0..=100.0).contains(&options.initial_humidity_pct) {
        return Err(AppError::InvalidInput(format!(
            "initial humidity {} is outside 0..=100",
            options.initial_humidity_pct
        )));
    }

    let config = load_config(config_path)?;
    let store = match store_dir {
        Some(dir) => RunStore::new(dir.to_path_buf())?,
        None => RunStore::for_config(config_path)?,
    };
    let name = config_name(config_path);

    println!(
        "Simulating {} ticks from {:.1} %RH (target {:.1} %RH)",
        options.ticks, options.initial_humidity_pct, config.target_humidity_pct
    );

    let response = ensure_simulation(&SimulationRequest {
        config: &config,
        config_name: &name,
        options,
        store: Some(&store),
        use_cache,
        version: CONTROLLER_VERSION,
    })?;

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!(
            "✓ Simulation completed: {} ({:.3} s)",
            response.run_id, response.elapsed_s
        );
    }
    print_manifest(&response.manifest);
    print_tail(&response.records, 5);
    Ok(())
}

fn cmd_runs(store_dir: &Path) -> AppResult<()> {
    let store = RunStore::new(store_dir.to_path_buf())?;
    let runs = list_runs(&store)?;

    if runs.is_empty() {
        println!("No runs found in {}", store_dir.display());
    } else {
        println!("Runs in {}:", store_dir.display());
        for run in runs {
            println!(
                "  {} - {} [{}] {}",
                short_id(&run.run_id),
                run.config_name,
                mode_label(&run.mode),
                run.timestamp
            );
        }
    }
    Ok(())
}

fn cmd_show_run(store_dir: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);
    let store = RunStore::new(store_dir.to_path_buf())?;
    let (manifest, records) = load_run(&store, run_id)?;
    print_manifest(&manifest);
    print_tail(&records, 10);
    Ok(())
}

fn short_id(run_id: &str) -> &str {
    &run_id[..run_id.len().min(12)]
}

fn mode_label(mode: &RunMode) -> String {
    match mode {
        RunMode::Simulation {
            ticks,
            initial_humidity_pct,
            sensor_fault,
        } => {
            let mut label = format!("sim {} ticks from {:.1}%", ticks, initial_humidity_pct);
            if let Some(fault) = sensor_fault {
                label.push_str(&format!(
                    ", sensor fault {}+{}",
                    fault.from_tick, fault.count
                ));
            }
            label
        }
        RunMode::Realtime => "realtime".to_string(),
    }
}

fn print_manifest(manifest: &RunManifest) {
    println!("\nRun {}", manifest.run_id);
    println!("  Config: {}", manifest.config_name);
    println!("  Mode: {}", mode_label(&manifest.mode));
    println!("  Created: {}", manifest.timestamp);
    println!("  Version: {}", manifest.version);
    if let Some(summary) = &manifest.summary {
        println!(
            "  Ticks: {} ({} controlled, {} sensor faults, {} actuator faults)",
            summary.ticks, summary.controlled_ticks, summary.sensor_faults, summary.actuator_faults
        );
        if let Some(h) = summary.final_humidity_pct {
            println!("  Final humidity: {:.2} %RH", h);
        }
        if let Some(e) = summary.mean_abs_error_pct {
            println!("  Mean |error|: {:.3} %RH", e);
        }
    }
}

fn print_tail(records: &[TickRecord], n: usize) {
    if records.is_empty() {
        return;
    }
    println!("\n{:>9} {:>8} {:>9} {:>6} {:>6} {:>6} {:>6}", "t [s]", "RH [%]", "pred [%]", "d_hum", "d_ven", "hum", "ven");
    for r in &records[records.len().saturating_sub(n)..] {
        println!(
            "{:>9.1} {:>8.2} {:>9.2} {:>6.3} {:>6.3} {:>6} {:>6}",
            r.timestamp,
            r.humidity,
            r.predicted_humidity,
            r.demand_humidifier,
            r.demand_ventilator,
            if r.humidifier_on { "ON" } else { "off" },
            if r.ventilator_on { "ON" } else { "off" },
        );
    }
}
