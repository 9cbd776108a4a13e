use crate::{
    agent::{Agent, SteeringDecision},
    errors::PhysarumError,
    field::{FieldSnapshot, ScalarField},
    settings::Settings,
    Vector2,
};
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

pub struct World {
    agents: Vec<Agent>,
    field: ScalarField,
    rng: StdRng,
    settings: Settings,
    tick: u64,
}

impl World {
    /// Validate `settings`, then create an empty field and a freshly seeded population.
    pub fn new(settings: Settings) -> Result<Self, PhysarumError> {
        settings.validate()?;
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!("generating {} agents", settings.agent_count);
        let agents = seed_population(&settings, &mut rng);

        Self::from_parts(settings, agents, rng)
    }

    /// Create a world around an existing population. The field starts out empty.
    pub fn with_agents(settings: Settings, agents: Vec<Agent>) -> Result<Self, PhysarumError> {
        settings.validate()?;
        if agents.is_empty() {
            return Err(PhysarumError::InvalidConfiguration(
                "a world needs at least one agent".to_string(),
            ));
        }
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self::from_parts(settings, agents, rng)
    }

    fn from_parts(
        settings: Settings,
        agents: Vec<Agent>,
        rng: StdRng,
    ) -> Result<Self, PhysarumError> {
        info!(
            r#"
GRID	{}x{}
AGENT_COUNT	{:?}
SENSOR_ANGLE	{:?}
SENSOR_DISTANCE	{:?}
SENSOR_REACH	{:?}
DEPOSITION_AMOUNT	{:?}
DIFFUSION_RADIUS	{:?}
DECAY_RATE	{:?}
BOUNDARY_POLICY	{:?}
SEED	{:?}
"#,
            settings.grid_rows,
            settings.grid_cols,
            agents.len(),
            settings.agent_sensor_angle,
            settings.agent_sensor_distance,
            settings.agent_sensor_reach,
            settings.agent_deposition_amount,
            settings.field_diffusion_radius,
            settings.field_decay_rate,
            settings.boundary_policy,
            settings.seed,
        );

        let field = ScalarField::new(settings.grid_rows, settings.grid_cols)?;

        Ok(Self {
            agents,
            field,
            rng,
            settings,
            tick: 0,
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn field(&self) -> &ScalarField {
        &self.field
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Number of completed ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance the simulation by one tick. Each phase finishes for the whole population before
    /// the next one starts, so every agent senses the field as it stood at the start of the tick.
    pub fn update(&mut self) -> Result<(), PhysarumError> {
        let boundary = self.settings.boundary_policy;
        let reach = self.settings.agent_sensor_reach;
        let (rows, cols) = (self.field.rows(), self.field.cols());

        let field = &self.field;
        self.agents.par_iter_mut().for_each(|agent| {
            agent.sense(field, boundary, reach);
        });

        // Sequential so that a seeded run always hands out random turns in the same order
        let mut random_turns = 0usize;
        for agent in self.agents.iter_mut() {
            if agent.steer(&mut self.rng) == SteeringDecision::Random {
                random_turns += 1;
            }
        }

        self.agents
            .par_iter_mut()
            .for_each(|agent| agent.advance(boundary, rows, cols));

        self.field.deposit_agents(
            &self.agents,
            self.settings.agent_deposition_amount,
            boundary,
        )?;
        self.field.diffuse(self.settings.field_diffusion_radius);
        self.field.decay(self.settings.field_decay_rate);

        self.tick += 1;
        debug!(
            "tick {}: {} agents ({} random turns), total intensity {}",
            self.tick,
            self.agents.len(),
            random_turns,
            self.field.total_intensity()
        );

        Ok(())
    }

    /// Run iterations `0..=iterations`, handing a snapshot of the field to `on_frame` after
    /// each tick.
    pub fn run<F>(&mut self, iterations: usize, mut on_frame: F) -> Result<(), PhysarumError>
    where
        F: FnMut(usize, FieldSnapshot) -> Result<(), PhysarumError>,
    {
        for iteration in 0..=iterations {
            self.update()?;
            on_frame(iteration, self.field.snapshot())?;
        }

        Ok(())
    }
}

/// Agents scattered uniformly over the field with uniformly random headings.
pub fn seed_population<R: Rng + ?Sized>(settings: &Settings, rng: &mut R) -> Vec<Agent> {
    (0..settings.agent_count)
        .map(|_| {
            let location = Vector2::new(
                rng.gen_range(0.0..(settings.grid_cols as f32)),
                rng.gen_range(0.0..(settings.grid_rows as f32)),
            );
            let heading = rng.gen_range(0.0..360.0);

            Agent::builder()
                .location(location)
                .heading(heading)
                .sensor_angle(settings.agent_sensor_angle)
                .sensor_distance(settings.agent_sensor_distance)
                .build()
        })
        .collect()
}
