use crate::{boundary::BoundaryPolicy, field::ScalarField, Vector2};
use log::trace;
use num::Float;
use rand::Rng;
use serde::Deserialize;
use std::ops::Range;
use typed_builder::TypedBuilder;

pub const DEFAULT_SENSOR_ANGLE: f32 = 45.0;
pub const DEFAULT_SENSOR_DISTANCE: f32 = 9.0;
/// Heading change (in degrees) applied when the center sensor reads weakest.
pub const RANDOM_TURN_RANGE: Range<f32> = -5.0..5.0;

/// The last values read by an agent's left, center and right sensors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SensorReadings {
    pub left: u8,
    pub center: u8,
    pub right: u8,
}

impl SensorReadings {
    pub fn new(left: u8, center: u8, right: u8) -> Self {
        Self {
            left,
            center,
            right,
        }
    }
}

/// How far ahead of an agent its sensors sample the field.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SensorReach {
    /// One unit ahead, regardless of the agent's sensor distance.
    #[default]
    UnitStep,
    /// `sensor_distance` units ahead.
    SensorDistance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SteeringDecision {
    Straight,
    /// Turn by a uniformly random amount from [`RANDOM_TURN_RANGE`].
    Random,
    /// `heading += sensor_angle`
    TurnLeft,
    /// `heading -= sensor_angle`
    TurnRight,
}

impl SteeringDecision {
    pub fn from_readings(readings: SensorReadings) -> Self {
        let SensorReadings {
            left: fl,
            center: f,
            right: fr,
        } = readings;

        if f < fl && f > fr {
            SteeringDecision::Straight
        } else if f < fl && f < fr {
            SteeringDecision::Random
        } else if fl < fr {
            SteeringDecision::TurnLeft
        } else if fr < fl {
            SteeringDecision::TurnRight
        } else {
            SteeringDecision::Straight
        }
    }
}

#[derive(TypedBuilder, Clone, Debug)]
pub struct Agent {
    location: Vector2,
    // The heading an agent is facing. (In degrees, always in [0, 360))
    #[builder(default, setter(transform = |heading: f32| rotate_by_degrees(heading, 0.0)))]
    heading: f32,
    // There are three sensors per agent: A center sensor, a left sensor, and a right sensor. The side sensors are positioned based on this angle. (In degrees)
    #[builder(default = DEFAULT_SENSOR_ANGLE)]
    sensor_angle: f32,
    // How far out a sensor is from the agent
    #[builder(default = DEFAULT_SENSOR_DISTANCE)]
    sensor_distance: f32,
    #[builder(default, setter(skip))]
    sensor_readings: SensorReadings,
}

impl Agent {
    pub fn location(&self) -> Vector2 {
        self.location
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn sensor_angle(&self) -> f32 {
        self.sensor_angle
    }

    pub fn sensor_distance(&self) -> f32 {
        self.sensor_distance
    }

    pub fn sensor_readings(&self) -> SensorReadings {
        self.sensor_readings
    }

    /// Where the left, center and right sensors sample, before rounding to a cell.
    pub fn probe_locations(&self, reach: SensorReach) -> [Vector2; 3] {
        let distance = match reach {
            SensorReach::UnitStep => 1.0,
            SensorReach::SensorDistance => self.sensor_distance,
        };

        [
            self.heading - self.sensor_angle,
            self.heading,
            self.heading + self.sensor_angle,
        ]
        .map(|probe_heading| self.location + Vector2::from_heading(probe_heading, distance))
    }

    /// Sample the field at each probe and remember the readings. Probes that land outside the
    /// field are mapped back in with `boundary`.
    pub fn sense(
        &mut self,
        field: &ScalarField,
        boundary: BoundaryPolicy,
        reach: SensorReach,
    ) -> SensorReadings {
        let (rows, cols) = (field.rows(), field.cols());
        let [left, center, right] = self.probe_locations(reach).map(|probe| {
            let (row, col) = boundary.resolve_cell(probe, rows, cols);
            // resolved cells are always in bounds
            field.get(row, col).unwrap_or(0)
        });

        self.sensor_readings = SensorReadings::new(left, center, right);
        self.sensor_readings
    }

    /// Turn according to the last sensor readings.
    pub fn steer<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SteeringDecision {
        let decision = SteeringDecision::from_readings(self.sensor_readings);

        let rotation_in_degrees = match decision {
            SteeringDecision::Straight => {
                trace!("Agent is going straight");
                0.0
            }
            SteeringDecision::Random => {
                let rotation = rng.gen_range(RANDOM_TURN_RANGE);
                trace!("Agent's center value is weakest, rotating randomly by {}", rotation);
                rotation
            }
            SteeringDecision::TurnLeft => {
                trace!("Agent is rotating left");
                self.sensor_angle
            }
            SteeringDecision::TurnRight => {
                trace!("Agent is rotating right");
                -self.sensor_angle
            }
        };

        self.rotate(rotation_in_degrees);
        decision
    }

    pub fn rotate(&mut self, rotation_in_degrees: f32) {
        self.heading = rotate_by_degrees(self.heading, rotation_in_degrees);
        trace!("new heading is {}", self.heading);
    }

    /// Move one unit along the current heading, then apply `boundary`.
    pub fn advance(&mut self, boundary: BoundaryPolicy, rows: usize, cols: usize) {
        self.location = self.location + Vector2::from_heading(self.heading, 1.0);

        let reflection = boundary.constrain(&mut self.location, rows, cols);
        if reflection.x {
            self.heading = rotate_by_degrees(180.0 - self.heading, 0.0);
        }
        if reflection.y {
            self.heading = rotate_by_degrees(-self.heading, 0.0);
        }
    }
}

/// Rotate `n` and wrap the result into `[0, 360)`.
pub fn rotate_by_degrees<T: Float + From<u16>>(n: T, rotation_in_degrees: T) -> T {
    let full_turn = <T as From<u16>>::from(360);
    let rotated_n = (n + rotation_in_degrees) % full_turn;
    let rotated_n = if rotated_n < T::zero() {
        rotated_n + full_turn
    } else {
        rotated_n
    };

    // adding a full turn to a tiny negative remainder can round up to exactly 360
    if rotated_n >= full_turn {
        T::zero()
    } else {
        rotated_n
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn agent_at(x: f32, y: f32, heading: f32) -> Agent {
        Agent::builder()
            .location(Vector2::new(x, y))
            .heading(heading)
            .build()
    }

    fn agent_with_readings(heading: f32, readings: SensorReadings) -> Agent {
        let mut agent = agent_at(0.0, 0.0, heading);
        agent.sensor_readings = readings;
        agent
    }

    fn assert_close(expected: f32, actual: f32) {
        assert!(
            (expected - actual).abs() < 1e-3,
            "expected {} but got {}",
            expected,
            actual
        )
    }

    #[test]
    fn builder_uses_default_sensor_geometry() {
        let agent = agent_at(1.0, 1.0, 0.0);

        assert_eq!(45.0, agent.sensor_angle());
        assert_eq!(9.0, agent.sensor_distance());
        assert_eq!(SensorReadings::default(), agent.sensor_readings());
    }

    #[test]
    fn builder_normalizes_heading() {
        assert_eq!(10.0, agent_at(0.0, 0.0, 370.0).heading());
        assert_eq!(270.0, agent_at(0.0, 0.0, -90.0).heading());
    }

    #[test]
    fn rotate_by_degrees_handles_clockwise_rotations_correctly() {
        assert_eq!(45.0, rotate_by_degrees(0.0, 45.0))
    }

    #[test]
    fn rotate_by_degrees_handles_clockwise_rotations_correctly_wrapping() {
        assert_eq!(10.0, rotate_by_degrees(350.0, 20.0))
    }

    #[test]
    fn rotate_by_degrees_handles_clockwise_rotations_correctly_big_number() {
        assert_eq!(20.0, rotate_by_degrees(350.0, 6781350.0))
    }

    #[test]
    fn rotate_by_degrees_handles_counterclockwise_rotations_correctly() {
        assert_eq!(315.0, rotate_by_degrees(0.0, -45.0))
    }

    #[test]
    fn rotate_by_degrees_handles_counterclockwise_rotations_correctly_wrapping() {
        assert_eq!(350.0, rotate_by_degrees(10.0, -20.0))
    }

    #[test]
    fn rotate_by_degrees_handles_counterclockwise_rotations_correctly_big_number() {
        assert_eq!(140.0, rotate_by_degrees(10.0, -13246790.0))
    }

    #[test]
    fn rotate_by_degrees_maps_a_full_turn_to_zero() {
        assert_eq!(0.0, rotate_by_degrees(300.0f32, 60.0));
        assert_eq!(0.0, rotate_by_degrees(0.0f32, -1e-9));
    }

    #[test]
    fn sensing_an_empty_field_reads_zero() {
        let field = ScalarField::new(3, 3).unwrap();
        let mut agent = agent_at(1.0, 1.0, 0.0);

        let readings = agent.sense(&field, BoundaryPolicy::Wrap, SensorReach::UnitStep);

        assert_eq!(SensorReadings::new(0, 0, 0), readings);
        assert_eq!(readings, agent.sensor_readings());
    }

    #[test]
    fn unit_step_probes_sit_one_unit_ahead() {
        let mut field = ScalarField::new(3, 3).unwrap();
        // heading 0 points along +x; the left probe is at -45 degrees (up a row)
        field.set(0, 2, 10).unwrap();
        field.set(1, 2, 20).unwrap();
        field.set(2, 2, 30).unwrap();
        let mut agent = agent_at(1.0, 1.0, 0.0);

        let readings = agent.sense(&field, BoundaryPolicy::Wrap, SensorReach::UnitStep);

        assert_eq!(SensorReadings::new(10, 20, 30), readings);
        agent
            .probe_locations(SensorReach::UnitStep)
            .iter()
            .for_each(|probe| {
                let offset = Vector2::new(probe.x - 1.0, probe.y - 1.0);
                assert_close(1.0, offset.x.hypot(offset.y));
            });
    }

    #[test]
    fn sensor_distance_reach_scales_probe_placement() {
        let mut field = ScalarField::new(21, 21).unwrap();
        field.set(16, 16, 1).unwrap();
        field.set(19, 10, 2).unwrap();
        field.set(16, 4, 3).unwrap();
        let mut agent = agent_at(10.0, 10.0, 90.0);

        let unit_step = agent.sense(&field, BoundaryPolicy::Clamp, SensorReach::UnitStep);
        let far = agent.sense(&field, BoundaryPolicy::Clamp, SensorReach::SensorDistance);

        assert_eq!(SensorReadings::new(0, 0, 0), unit_step);
        assert_eq!(SensorReadings::new(1, 2, 3), far);
    }

    #[test]
    fn probes_past_the_edge_follow_the_boundary_policy() {
        let mut field = ScalarField::new(3, 3).unwrap();
        field.set(1, 0, 7).unwrap();
        field.set(1, 2, 9).unwrap();
        let mut agent = agent_at(2.0, 1.0, 0.0);

        let wrapped = agent.sense(&field, BoundaryPolicy::Wrap, SensorReach::UnitStep);
        let clamped = agent.sense(&field, BoundaryPolicy::Clamp, SensorReach::UnitStep);

        assert_eq!(7, wrapped.center);
        assert_eq!(9, clamped.center);
    }

    #[test]
    fn sensing_is_deterministic_and_leaves_the_field_alone() {
        let mut field = ScalarField::new(16, 16).unwrap();
        (0..16).for_each(|i| field.set(i, (i * 7) % 16, (i * 13) as i32).unwrap());
        let before = field.snapshot();
        let mut agent = agent_at(7.3, 8.6, 123.0);

        let first = agent.sense(&field, BoundaryPolicy::Reflect, SensorReach::SensorDistance);
        for _ in 0..10 {
            let again = agent.sense(&field, BoundaryPolicy::Reflect, SensorReach::SensorDistance);
            assert_eq!(first, again);
        }
        assert_eq!(before, field.snapshot());
    }

    #[test]
    fn decision_table_matches_sensor_readings() {
        use SteeringDecision::*;

        let cases = [
            ((20, 10, 5), Straight),
            ((10, 5, 20), Random),
            ((5, 10, 20), TurnLeft),
            ((20, 30, 5), TurnRight),
            ((5, 5, 5), Straight),
            ((5, 10, 5), Straight),
            ((5, 1, 5), Random),
        ];

        for ((fl, f, fr), expected) in cases {
            assert_eq!(
                expected,
                SteeringDecision::from_readings(SensorReadings::new(fl, f, fr)),
                "readings ({}, {}, {})",
                fl,
                f,
                fr
            );
        }
    }

    #[test]
    fn turn_left_adds_the_sensor_angle() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut agent = agent_with_readings(350.0, SensorReadings::new(5, 10, 20));

        let decision = agent.steer(&mut rng);

        assert_eq!(SteeringDecision::TurnLeft, decision);
        assert_eq!(35.0, agent.heading());
    }

    #[test]
    fn turn_right_subtracts_the_sensor_angle() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut agent = agent_with_readings(10.0, SensorReadings::new(20, 30, 5));

        let decision = agent.steer(&mut rng);

        assert_eq!(SteeringDecision::TurnRight, decision);
        assert_eq!(325.0, agent.heading());
    }

    #[test]
    fn going_straight_keeps_the_heading() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut agent = agent_with_readings(123.0, SensorReadings::new(20, 10, 5));

        agent.steer(&mut rng);

        assert_eq!(123.0, agent.heading());
    }

    #[test]
    fn weakest_center_turns_by_a_small_random_amount() {
        let mut rng = StdRng::seed_from_u64(42);

        for start in [0.0, 2.0, 180.0, 358.0] {
            for _ in 0..200 {
                let mut agent = agent_with_readings(start, SensorReadings::new(10, 5, 20));

                let decision = agent.steer(&mut rng);

                assert_eq!(SteeringDecision::Random, decision);
                let heading = agent.heading();
                assert!((0.0..360.0).contains(&heading), "heading {}", heading);
                // signed difference in (-180, 180]
                let turned = rotate_by_degrees(heading - start + 180.0, 0.0) - 180.0;
                assert!(
                    turned >= RANDOM_TURN_RANGE.start - 1e-3
                        && turned < RANDOM_TURN_RANGE.end + 1e-3,
                    "turned by {}",
                    turned
                );
            }
        }
    }

    #[test]
    fn random_turns_are_reproducible_with_a_seeded_rng() {
        let steer_with_seed = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut agent = agent_with_readings(90.0, SensorReadings::new(10, 5, 20));
            agent.steer(&mut rng);
            agent.heading()
        };

        assert_eq!(steer_with_seed(3), steer_with_seed(3));
    }

    #[test]
    fn steering_always_leaves_heading_normalized() {
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..2000 {
            let readings = SensorReadings::new(rng.gen(), rng.gen(), rng.gen());
            let mut agent = Agent::builder()
                .location(Vector2::new(0.0, 0.0))
                .heading(rng.gen_range(-720.0..720.0))
                .sensor_angle(rng.gen_range(0.0..400.0))
                .build();
            agent.sensor_readings = readings;

            agent.steer(&mut rng);

            assert!((0.0..360.0).contains(&agent.heading()));
        }
    }

    #[test]
    fn advance_moves_one_unit_along_the_heading() {
        let mut agent = agent_at(5.0, 5.0, 0.0);
        agent.advance(BoundaryPolicy::Wrap, 10, 10);
        assert_eq!(Vector2::new(6.0, 5.0), agent.location());

        let mut agent = agent_at(5.0, 5.0, 90.0);
        agent.advance(BoundaryPolicy::Wrap, 10, 10);
        assert_close(5.0, agent.location().x);
        assert_close(6.0, agent.location().y);

        let mut agent = agent_at(5.0, 5.0, 217.0);
        agent.advance(BoundaryPolicy::Wrap, 10, 10);
        let step = Vector2::new(agent.location().x - 5.0, agent.location().y - 5.0);
        assert_close(1.0, step.x.hypot(step.y));
    }

    #[test]
    fn advance_wraps_past_the_edge() {
        let mut agent = agent_at(2.5, 1.0, 0.0);

        agent.advance(BoundaryPolicy::Wrap, 3, 3);

        assert_eq!(Vector2::new(0.5, 1.0), agent.location());
        assert_eq!(0.0, agent.heading());
    }

    #[test]
    fn advance_clamps_at_the_edge() {
        let mut agent = agent_at(2.5, 1.0, 0.0);

        agent.advance(BoundaryPolicy::Clamp, 3, 3);

        assert_eq!(Vector2::new(2.0, 1.0), agent.location());
    }

    #[test]
    fn advance_reflects_off_the_edge_and_mirrors_heading() {
        let mut agent = agent_at(2.5, 1.0, 0.0);
        agent.advance(BoundaryPolicy::Reflect, 3, 3);
        assert_eq!(Vector2::new(0.5, 1.0), agent.location());
        assert_eq!(180.0, agent.heading());

        let mut agent = agent_at(1.0, 0.5, 270.0);
        agent.advance(BoundaryPolicy::Reflect, 3, 3);
        assert_close(1.0, agent.location().x);
        assert_close(0.5, agent.location().y);
        assert_eq!(90.0, agent.heading());
    }
}
