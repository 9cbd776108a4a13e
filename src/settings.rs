use crate::{
    agent::{SensorReach, DEFAULT_SENSOR_ANGLE, DEFAULT_SENSOR_DISTANCE},
    boundary::BoundaryPolicy,
    errors::PhysarumError,
    export::FrameFormat,
};
use log::info;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";
/// Environment variables starting with this prefix override settings, e.g. `PHYSARUM_GRID_ROWS`.
pub const ENV_PREFIX: &str = "PHYSARUM";

// Field settings
pub const GRID_ROWS: usize = 256;
pub const GRID_COLS: usize = 256;
pub const FIELD_DIFFUSION_RADIUS: usize = 1;
/// Fraction of every cell's intensity lost per tick
pub const FIELD_DECAY_RATE: f64 = 0.05;

// Agent settings
pub const AGENT_COUNT: usize = 20;
pub const AGENT_DEPOSITION_AMOUNT: u8 = 5;

// Run settings
pub const ITERATIONS: usize = 10;
pub const OUTPUT_DIR: &str = "img";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub agent_count: usize,
    pub agent_sensor_angle: f32,
    pub agent_sensor_distance: f32,
    pub agent_sensor_reach: SensorReach,
    pub agent_deposition_amount: u8,
    pub field_diffusion_radius: usize,
    pub field_decay_rate: f64,
    pub boundary_policy: BoundaryPolicy,
    pub iterations: usize,
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
    pub frame_format: FrameFormat,
    pub export_frames: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_rows: GRID_ROWS,
            grid_cols: GRID_COLS,
            agent_count: AGENT_COUNT,
            agent_sensor_angle: DEFAULT_SENSOR_ANGLE,
            agent_sensor_distance: DEFAULT_SENSOR_DISTANCE,
            agent_sensor_reach: SensorReach::default(),
            agent_deposition_amount: AGENT_DEPOSITION_AMOUNT,
            field_diffusion_radius: FIELD_DIFFUSION_RADIUS,
            field_decay_rate: FIELD_DECAY_RATE,
            boundary_policy: BoundaryPolicy::default(),
            iterations: ITERATIONS,
            seed: None,
            output_dir: PathBuf::from(OUTPUT_DIR),
            frame_format: FrameFormat::default(),
            export_frames: true,
        }
    }
}

impl Settings {
    /// Load settings from `settings_file_name` (which may be missing) with `PHYSARUM_*`
    /// environment variables layered on top. Anything unset keeps its default.
    pub fn load_from_file(settings_file_name: &str) -> Result<Self, PhysarumError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(settings_file_name).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize::<Settings>()?;

        info!(
            "successfully loaded settings from '{}'",
            &settings_file_name
        );

        Ok(settings)
    }

    /// Reject settings the simulation can't run with.
    pub fn validate(&self) -> Result<(), PhysarumError> {
        let invalid = |message: String| Err(PhysarumError::InvalidConfiguration(message));

        if self.grid_rows == 0 || self.grid_cols == 0 {
            return invalid(format!(
                "grid dimensions must be positive, got {}x{}",
                self.grid_rows, self.grid_cols
            ));
        }
        if self.field_diffusion_radius >= self.grid_rows.max(self.grid_cols) {
            return invalid(format!(
                "field_diffusion_radius must be smaller than the larger grid dimension ({}), got {}",
                self.grid_rows.max(self.grid_cols),
                self.field_diffusion_radius
            ));
        }
        if self.agent_count == 0 {
            return invalid("agent_count must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.field_decay_rate) {
            return invalid(format!(
                "field_decay_rate must be within [0, 1], got {}",
                self.field_decay_rate
            ));
        }
        if !self.agent_sensor_angle.is_finite() || self.agent_sensor_angle < 0.0 {
            return invalid(format!(
                "agent_sensor_angle must be a non-negative number, got {}",
                self.agent_sensor_angle
            ));
        }
        if !self.agent_sensor_distance.is_finite() || self.agent_sensor_distance < 0.0 {
            return invalid(format!(
                "agent_sensor_distance must be a non-negative number, got {}",
                self.agent_sensor_distance
            ));
        }

        Ok(())
    }
}
