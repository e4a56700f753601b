use glam::Vec2;
use serde::Serialize;

/// Pending "wait until position" predicate.
///
/// The travel direction on each axis is captured when the wait is
/// registered. A velocity of exactly zero counts as moving right/down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionWait {
    pub target: Vec2,
    pub positive_x: bool,
    pub positive_y: bool,
}

impl PositionWait {
    fn capture(target: Vec2, velocity: Vec2) -> Self {
        Self {
            target,
            positive_x: velocity.x >= 0.0,
            positive_y: velocity.y >= 0.0,
        }
    }

    pub fn reached(&self, position: Vec2) -> bool {
        let past_x = if self.positive_x {
            position.x >= self.target.x
        } else {
            position.x <= self.target.x
        };
        let past_y = if self.positive_y {
            position.y >= self.target.y
        } else {
            position.y <= self.target.y
        };
        past_x && past_y
    }
}

/// Explicit Euler body shared by drawings and the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Motion {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    wait: Option<PositionWait>,
}

impl Motion {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.velocity += self.acceleration * dt;
    }

    pub fn wait_till_position(&mut self, target: Vec2) {
        self.wait = Some(PositionWait::capture(target, self.velocity));
    }

    pub fn pending_wait(&self) -> Option<&PositionWait> {
        self.wait.as_ref()
    }

    pub fn cancel_wait(&mut self) {
        self.wait = None;
    }

    /// Integrate one tick; returns true on the tick a pending wait is met.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.integrate(dt);
        match self.wait {
            Some(wait) if wait.reached(self.position) => {
                self.wait = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_step_moves_before_accelerating() {
        let mut motion = Motion::default();
        motion.velocity = Vec2::new(10.0, 0.0);
        motion.acceleration = Vec2::new(0.0, 4.0);
        motion.integrate(0.5);
        assert_eq!(motion.position, Vec2::new(5.0, 0.0));
        assert_eq!(motion.velocity, Vec2::new(10.0, 2.0));
        motion.integrate(0.5);
        assert_eq!(motion.position, Vec2::new(10.0, 1.0));
    }

    #[test]
    fn wait_in_positive_direction() {
        let mut motion = Motion::at(Vec2::ZERO);
        motion.velocity = Vec2::new(50.0, 0.0);
        motion.wait_till_position(Vec2::new(100.0, 0.0));

        assert!(!motion.advance(1.0));
        assert_eq!(motion.position.x, 50.0);
        assert!(motion.advance(1.0));
        assert_eq!(motion.position.x, 100.0);
        assert!(motion.pending_wait().is_none());
    }

    #[test]
    fn wait_in_negative_direction() {
        let mut motion = Motion::at(Vec2::new(200.0, 0.0));
        motion.velocity = Vec2::new(-40.0, 0.0);
        motion.wait_till_position(Vec2::new(100.0, 0.0));

        for _ in 0..2 {
            assert!(!motion.advance(1.0));
        }
        assert!(motion.advance(1.0));
        assert!(motion.position.x <= 100.0);
    }

    #[test]
    fn direction_is_captured_at_registration() {
        let mut motion = Motion::at(Vec2::new(200.0, 0.0));
        motion.velocity = Vec2::new(-40.0, 0.0);
        motion.wait_till_position(Vec2::new(100.0, 0.0));
        motion.velocity = Vec2::new(40.0, 0.0);

        // Still judged as travelling left even though it now moves right.
        assert!(!motion.advance(1.0));
        assert_eq!(motion.pending_wait().map(|wait| wait.positive_x), Some(false));
    }

    #[test]
    fn zero_velocity_counts_as_positive() {
        let mut motion = Motion::at(Vec2::new(5.0, 5.0));
        motion.wait_till_position(Vec2::new(5.0, 5.0));
        let wait = *motion.pending_wait().unwrap();
        assert!(wait.positive_x && wait.positive_y);
        assert!(motion.advance(0.1));
    }
}
