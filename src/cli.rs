//! Command line interface for inspecting the geometry pipeline.

use crate::config::{Config, EXAMPLE_CONFIG};
use crate::device::DeviceTable;
use crate::face_grid::rasterize;
use crate::geometry::{Point, Rect, Size};
use crate::normalizer::{DetectionNormalizer, RawFaceDetection};
use crate::orientation::Orientation;
use crate::screen_mapping::{GazeMapper, ScreenUnit};
use crate::{Error, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List known device profiles
    Devices,

    /// Map a camera-space prediction (cm) onto the screen
    Map {
        /// Horizontal offset from the camera in cm
        #[arg(allow_hyphen_values = true)]
        x: f64,

        /// Vertical offset from the camera in cm (up is positive)
        #[arg(allow_hyphen_values = true)]
        y: f64,

        /// Device model (defaults to the configured one)
        #[arg(long)]
        device: Option<String>,

        /// Device orientation
        #[arg(short, long, default_value = "portrait")]
        orientation: Orientation,

        /// Screen width in pixels as displayed (portrait width from config if omitted)
        #[arg(long)]
        screen_width: Option<f64>,

        /// Screen height in pixels as displayed
        #[arg(long)]
        screen_height: Option<f64>,

        /// Output unit (px, cm, mm)
        #[arg(short, long)]
        unit: Option<ScreenUnit>,
    },

    /// Rasterize a face box into the face grid
    Grid {
        frame_width: f64,
        frame_height: f64,
        #[arg(allow_hyphen_values = true)]
        face_x: f64,
        #[arg(allow_hyphen_values = true)]
        face_y: f64,
        face_width: f64,
        face_height: f64,
    },

    /// Normalize a raw sensor-space face detection
    Normalize {
        /// Normalized x of the detection (0-1)
        x: f64,
        /// Normalized y of the detection (0-1)
        y: f64,
        /// Normalized width of the detection
        width: f64,
        /// Normalized height of the detection
        height: f64,

        /// Device orientation
        #[arg(short, long, default_value = "portrait")]
        orientation: Orientation,

        /// Sensor frame width in pixels
        #[arg(long, default_value = "640")]
        sensor_width: f64,

        /// Sensor frame height in pixels
        #[arg(long, default_value = "480")]
        sensor_height: f64,

        /// Sensor-relative roll in degrees
        #[arg(long, allow_hyphen_values = true)]
        roll: Option<f64>,

        /// Yaw in degrees
        #[arg(long, allow_hyphen_values = true)]
        yaw: Option<f64>,

        /// Padding fraction (landmark default from config if omitted)
        #[arg(long)]
        padding: Option<f64>,
    },

    /// Print an example configuration file
    ExampleConfig,
}

/// Load the configured settings, or defaults when no file was given
///
/// # Errors
///
/// Returns an error if the configuration file cannot be read or parsed
pub fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path)
        }
        None => Ok(Config::default()),
    }
}

/// Execute one command, writing human-readable output to `out`
///
/// # Errors
///
/// Returns an error if the command fails or output cannot be written
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let config = load_config(cli)?;

    match &cli.command {
        Command::Devices => {
            let table = config.device_table()?;
            writeln!(out, "{:<16} {:>8} {:>8} {:>8} {:>8}", "device", "dx_mm", "dy_mm", "w_mm", "h_mm")?;
            for (name, geometry) in table.iter() {
                writeln!(
                    out,
                    "{:<16} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
                    name,
                    geometry.camera_to_screen_x_mm,
                    geometry.camera_to_screen_y_mm,
                    geometry.screen_width_mm,
                    geometry.screen_height_mm
                )?;
            }
        }
        Command::Map {
            x,
            y,
            device,
            orientation,
            screen_width,
            screen_height,
            unit,
        } => {
            let portrait = config.screen_size();
            let displayed = if orientation.is_landscape() {
                portrait.transposed()
            } else {
                portrait
            };
            let screen = Size::new(
                screen_width.unwrap_or(displayed.width),
                screen_height.unwrap_or(displayed.height),
            );
            let mapper = GazeMapper::new(
                config.device_table()?,
                device.clone().unwrap_or_else(|| config.session.device.clone()),
                screen,
                unit.unwrap_or(config.session.screen_unit),
            );
            let point = mapper.map(Point::new(*x, *y), *orientation)?;
            writeln!(out, "{:.4} {:.4}", point.x, point.y)?;
        }
        Command::Grid {
            frame_width,
            frame_height,
            face_x,
            face_y,
            face_width,
            face_height,
        } => {
            let face = Rect::new(*face_x, *face_y, *face_width, *face_height);
            let grid = rasterize(
                *frame_width,
                *frame_height,
                config.face_grid.width,
                config.face_grid.height,
                &face,
            );
            for row in grid.cells().chunks(grid.width().max(1)) {
                let line: String = row.iter().map(|&cell| if cell > 0.0 { '1' } else { '0' }).collect();
                writeln!(out, "{line}")?;
            }
        }
        Command::Normalize {
            x,
            y,
            width,
            height,
            orientation,
            sensor_width,
            sensor_height,
            roll,
            yaw,
            padding,
        } => {
            let normalizer = DetectionNormalizer::new(padding.unwrap_or(config.padding.landmark))?;
            let frame = orientation.oriented_size(Size::new(*sensor_width, *sensor_height));
            let raw = RawFaceDetection::with_angles(Rect::new(*x, *y, *width, *height), *yaw, *roll);
            let normalized = normalizer
                .normalize(&raw, *orientation, frame)
                .ok_or_else(|| Error::InvalidInput("Degenerate or out-of-range face detection".to_string()))?;
            let padded = normalizer.pad(&normalized.face_rect);

            writeln!(out, "frame:  {} x {}", frame.width, frame.height)?;
            writeln!(out, "face:   {}", format_rect(&normalized.face_rect))?;
            writeln!(out, "padded: {}", format_rect(&padded.padded))?;
            if let Some(roll) = normalized.roll {
                writeln!(out, "roll:   {roll:.2}")?;
            }
            writeln!(
                out,
                "looking at camera: {}",
                config.looking_at_camera(normalized.yaw, normalized.roll)
            )?;
        }
        Command::ExampleConfig => {
            write!(out, "{EXAMPLE_CONFIG}")?;
        }
    }

    Ok(())
}

fn format_rect(rect: &Rect) -> String {
    format!("x={:.2} y={:.2} w={:.2} h={:.2}", rect.x, rect.y, rect.width, rect.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> String {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_map_command() {
        let output = run_args(&["gaze-estimation", "map", "1.0", "-1.0", "--device", "iPhone 6s"]);
        assert_eq!(output.trim(), "366.8576 25.1287");
    }

    #[test]
    fn test_map_unknown_device() {
        let cli = Cli::try_parse_from(["gaze-estimation", "map", "0", "0", "--device", "Nokia"]).unwrap();
        let mut out = Vec::new();
        assert!(matches!(run(&cli, &mut out), Err(Error::UnknownDevice(_))));
    }

    #[test]
    fn test_grid_command_full_frame() {
        let output = run_args(&["gaze-estimation", "grid", "640", "480", "0", "0", "640", "480"]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 25);
        assert!(lines.iter().all(|line| *line == "1".repeat(25)));
    }

    #[test]
    fn test_normalize_command() {
        let output = run_args(&[
            "gaze-estimation",
            "normalize",
            "0.25",
            "0.5",
            "0.125",
            "0.25",
            "--orientation",
            "landscape-right",
            "--roll",
            "30",
        ]);
        assert!(output.contains("frame:  640 x 480"));
        assert!(output.contains("roll:   330.00"));
    }

    #[test]
    fn test_devices_and_example_config() {
        let output = run_args(&["gaze-estimation", "devices"]);
        assert!(output.contains("iPad Pro"));
        assert_eq!(output.lines().count(), 16);

        let output = run_args(&["gaze-estimation", "example-config"]);
        assert_eq!(output, EXAMPLE_CONFIG);
    }

    #[test]
    fn test_invalid_orientation_rejected() {
        assert!(Cli::try_parse_from(["gaze-estimation", "map", "0", "0", "-o", "face-up"]).is_err());
    }
}
