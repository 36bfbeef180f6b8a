//! Tests for command-line argument parsing and command output

use clap::Parser;
use gaze_estimation::cli::{run, Cli, Command};
use gaze_estimation::config::Config;
use gaze_estimation::orientation::Orientation;
use gaze_estimation::screen_mapping::ScreenUnit;
use gaze_estimation::Error;
use std::path::PathBuf;
use tempfile::tempdir;

fn run_args(args: &[&str]) -> gaze_estimation::Result<String> {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    run(&cli, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn test_map_defaults() {
    let cli = Cli::try_parse_from(["gaze-estimation", "map", "1.5", "-2"]).unwrap();
    assert!(!cli.debug);
    assert_eq!(cli.config, None);
    assert_eq!(
        cli.command,
        Command::Map {
            x: 1.5,
            y: -2.0,
            device: None,
            orientation: Orientation::Portrait,
            screen_width: None,
            screen_height: None,
            unit: None,
        }
    );
}

#[test]
fn test_map_all_options() {
    let cli = Cli::try_parse_from([
        "gaze-estimation",
        "--debug",
        "map",
        "-3.25",
        "4",
        "--device",
        "iPad Air",
        "-o",
        "landscape-left",
        "--screen-width",
        "2048",
        "--screen-height",
        "1536",
        "-u",
        "mm",
    ])
    .unwrap();

    assert!(cli.debug);
    let Command::Map {
        x,
        y,
        device,
        orientation,
        screen_width,
        screen_height,
        unit,
    } = cli.command
    else {
        panic!("expected map command");
    };
    assert_eq!((x, y), (-3.25, 4.0));
    assert_eq!(device.as_deref(), Some("iPad Air"));
    assert_eq!(orientation, Orientation::LandscapeLeft);
    assert_eq!((screen_width, screen_height), (Some(2048.0), Some(1536.0)));
    assert_eq!(unit, Some(ScreenUnit::Millimeters));
}

#[test]
fn test_global_config_after_subcommand() {
    let cli = Cli::try_parse_from(["gaze-estimation", "devices", "-C", "gaze.yaml"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("gaze.yaml")));
    assert_eq!(cli.command, Command::Devices);
}

#[test]
fn test_invalid_arguments() {
    assert!(Cli::try_parse_from(["gaze-estimation"]).is_err(), "subcommand is required");
    assert!(Cli::try_parse_from(["gaze-estimation", "map", "1"]).is_err());
    assert!(Cli::try_parse_from(["gaze-estimation", "map", "x", "1"]).is_err());
    assert!(Cli::try_parse_from(["gaze-estimation", "map", "0", "0", "-u", "inches"]).is_err());
    assert!(Cli::try_parse_from(["gaze-estimation", "grid", "640", "480", "0", "0", "10"]).is_err());
    assert!(Cli::try_parse_from(["gaze-estimation", "teleport"]).is_err());
}

#[test]
fn test_map_landscape_uses_transposed_screen() {
    let output = run_args(&["gaze-estimation", "map", "0", "0", "--device", "iPhone 6s", "-o", "landscape-right"]).unwrap();
    assert_eq!(output.trim(), "1437.0789 238.6305");
}

#[test]
fn test_map_in_centimetres() {
    let output = run_args(&["gaze-estimation", "map", "1", "-1", "--device", "iPhone 6s", "-u", "cm"]).unwrap();
    assert_eq!(output.trim(), "2.8610 0.1960");
}

#[test]
fn test_map_uses_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gaze.yaml");
    let mut config = Config::default();
    config.session.device = "Nokia 3310".to_string();
    config.to_file(&path).unwrap();

    let path = path.to_string_lossy().into_owned();
    let result = run_args(&["gaze-estimation", "-C", &path, "map", "0", "0"]);
    assert!(matches!(result, Err(Error::UnknownDevice(_))));

    // Explicit device wins over the configured one
    let output = run_args(&["gaze-estimation", "-C", &path, "map", "1", "-1", "--device", "iPhone 6s"]).unwrap();
    assert_eq!(output.trim(), "366.8576 25.1287");
}

#[test]
fn test_grid_output_shape() {
    let output = run_args(&["gaze-estimation", "grid", "480", "640", "120", "160", "240", "320"]).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 25);
    assert_eq!(lines[5], "0".repeat(25));
    assert_eq!(lines[6], format!("{}{}{}", "0".repeat(6), "1".repeat(13), "0".repeat(6)));
    assert_eq!(lines[19], "0".repeat(25));
}

#[test]
fn test_normalize_portrait() {
    let output = run_args(&["gaze-estimation", "normalize", "0.25", "0.25", "0.5", "0.5", "--roll", "270", "--yaw", "10"]).unwrap();
    assert!(output.contains("frame:  480 x 640"));
    assert!(output.contains("face:   x=120.00 y=160.00 w=240.00 h=320.00"));
    // Landmark padding: a quarter of the face width on every edge
    assert!(output.contains("padded: x=60.00 y=100.00 w=360.00 h=440.00"));
    assert!(output.contains("roll:   0.00"));
    assert!(output.contains("looking at camera: true"));
}

#[test]
fn test_normalize_degenerate_detection() {
    let result = run_args(&["gaze-estimation", "normalize", "0.1", "0.1", "0", "0.2"]);
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let result = run_args(&["gaze-estimation", "normalize", "0", "0", "10000", "10000"]);
    assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("out-of-range")));
}
