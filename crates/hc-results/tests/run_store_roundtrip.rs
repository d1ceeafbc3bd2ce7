use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use hc_controls::{ActuatorFault, ActuatorId, Arbitration, ControllerConfig, TickRecord};
use hc_results::{RunManifest, RunMode, RunStore, ResultsError, compute_run_id};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn record(t: f64, humidity: f64) -> TickRecord {
    TickRecord {
        timestamp: t,
        humidity,
        temperature: 21.0,
        humidifier_on: humidity < 95.0,
        ventilator_on: false,
        demand_humidifier: 0.4,
        demand_ventilator: 0.0,
        predicted_humidity: humidity + 0.5,
        confidence: 1.0,
        arbitration: Arbitration::None,
        actuator_faults: Vec::new(),
    }
}

fn manifest(run_id: &str) -> RunManifest {
    RunManifest {
        run_id: run_id.to_string(),
        config_name: "chamber".to_string(),
        timestamp: "2026-10-16T00:00:00Z".to_string(),
        mode: RunMode::Simulation {
            ticks: 2,
            initial_humidity_pct: 80.0,
            sensor_fault: None,
        },
        version: "0.1.0".to_string(),
        summary: None,
    }
}

#[test]
fn save_list_load_roundtrip() {
    let config_dir = unique_temp_dir("hc_results_config");
    fs::create_dir_all(&config_dir).expect("failed to create temp config dir");
    let config_path = config_dir.join("humictl.yaml");
    fs::write(&config_path, "target_humidity_pct: 95.0\n").expect("failed to write config");

    let store = RunStore::for_config(&config_path).expect("failed to create run store");
    assert!(store.root_dir().ends_with(".humictl/runs"));

    let mut faulty = record(1.0, 93.0);
    faulty.actuator_faults.push(ActuatorFault {
        actuator: ActuatorId::Humidifier,
        reason: "relay busy".to_string(),
    });
    let records = vec![record(0.0, 92.0), faulty];

    store
        .save_run(&manifest("run-123"), &records)
        .expect("failed to save run");
    assert!(store.has_run("run-123"));

    let runs = store.list_runs().expect("failed to list runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, "run-123");

    let loaded = store.load_timeseries("run-123").expect("failed to load records");
    assert_eq!(loaded, records);

    store.delete_run("run-123").expect("failed to delete run");
    assert!(!store.has_run("run-123"));
    let _ = fs::remove_dir_all(&config_dir);
}

#[test]
fn missing_run_is_reported() {
    let store = RunStore::new(unique_temp_dir("hc_results_missing")).unwrap();
    assert!(matches!(
        store.load_manifest("nope"),
        Err(ResultsError::RunNotFound { .. })
    ));
    assert!(matches!(
        store.load_timeseries("nope"),
        Err(ResultsError::RunNotFound { .. })
    ));
    let _ = fs::remove_dir_all(store.root_dir());
}

#[test]
fn runs_are_listed_oldest_first() {
    let store = RunStore::new(unique_temp_dir("hc_results_order")).unwrap();
    let mut newer = manifest("b");
    newer.timestamp = "2026-10-17T00:00:00Z".to_string();
    store.save_run(&newer, &[]).unwrap();
    store.save_run(&manifest("a"), &[]).unwrap();

    let ids: Vec<String> = store.list_runs().unwrap().into_iter().map(|m| m.run_id).collect();
    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    let _ = fs::remove_dir_all(store.root_dir());
}

#[test]
fn run_id_is_content_addressed() {
    let config = ControllerConfig::default();
    let mode = manifest("x").mode;
    assert_eq!(
        compute_run_id(&config, &mode, "0.1.0"),
        compute_run_id(&config.clone(), &mode, "0.1.0")
    );
}
