//! Ping-pong trajectory between two joint configurations.
use ndarray::Array1;
use rrc_core::error::RrcError;

/// Upper joint configuration of one finger, repeated for the three fingers.
pub const POSITION_UP: [f32; 3] = [0.5, 1.2, -2.4];

/// Lower joint configuration of one finger, repeated for the three fingers.
pub const POSITION_DOWN: [f32; 3] = [-0.08, 0.84, -1.2];

fn three_fingers(position: [f32; 3]) -> Array1<f32> {
    position.iter().cycle().take(9).cloned().collect()
}

/// Sequence of waypoints which is read back and forth.
///
/// With `steps` waypoints `w[0..steps)`, consecutive reads return
/// `w[0], .., w[steps-1], w[steps-1], .., w[0], w[0], ..`: when the cursor
/// runs past the end, the sequence is reversed in place and reading starts
/// over. The reversal happens on the read that would otherwise go out of
/// bounds.
#[derive(Clone, Debug)]
pub struct Trajectory {
    waypoints: Vec<Array1<f32>>,
    i: usize,
}

impl Trajectory {
    /// Builds `steps` waypoints `down + i * (up - down) / steps`, `i` in `[0, steps)`.
    ///
    /// `steps = 0` gives an empty trajectory, see [`Trajectory::next_waypoint`].
    pub fn new(down: &Array1<f32>, up: &Array1<f32>, steps: usize) -> Self {
        let waypoints = if steps == 0 {
            vec![]
        } else {
            let delta = (up - down) / steps as f32;
            (0..steps).map(|i| down + &(&delta * i as f32)).collect()
        };
        Self { waypoints, i: 0 }
    }

    /// Trajectory between [`POSITION_DOWN`] and [`POSITION_UP`] for all three fingers.
    pub fn fingers(steps: usize) -> Self {
        Self::new(
            &three_fingers(POSITION_DOWN),
            &three_fingers(POSITION_UP),
            steps,
        )
    }

    /// Returns the waypoint under the cursor and advances the cursor.
    ///
    /// Fails with [`RrcError::EmptySequenceError`] for an empty trajectory.
    pub fn next_waypoint(&mut self) -> Result<Array1<f32>, RrcError> {
        if self.waypoints.is_empty() {
            return Err(RrcError::EmptySequenceError);
        }
        if self.i >= self.waypoints.len() {
            self.waypoints.reverse();
            self.i = 0;
        }
        let waypoint = self.waypoints[self.i].clone();
        self.i += 1;
        Ok(waypoint)
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Returns `true` if there are no waypoints.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoints in their current order.
    pub fn waypoints(&self) -> &[Array1<f32>] {
        &self.waypoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_waypoints() {
        let t = Trajectory::new(&array![0.0, 1.0], &array![4.0, -1.0], 4);
        assert_eq!(
            t.waypoints(),
            &[
                array![0.0, 1.0],
                array![1.0, 0.5],
                array![2.0, 0.0],
                array![3.0, -0.5]
            ]
        );
    }

    #[test]
    fn test_full_cycle_reverses_at_the_ends() {
        for n in [1usize, 2, 3, 7, 1000] {
            let mut t = Trajectory::fingers(n);
            let w: Vec<_> = t.waypoints().to_vec();
            let mut expected: Vec<_> = w.clone();
            expected.extend(w.iter().rev().cloned());

            let got: Vec<_> = (0..2 * n).map(|_| t.next_waypoint().unwrap()).collect();
            assert_eq!(got, expected, "steps = {}", n);

            // Third pass goes up again, starting from the lower end.
            assert_eq!(t.next_waypoint().unwrap(), w[0]);
        }
    }

    #[test]
    fn test_reversal_is_lazy() {
        let mut t = Trajectory::new(&array![0.0], &array![3.0], 3);
        for _ in 0..3 {
            t.next_waypoint().unwrap();
        }
        // The sequence is only reversed by the next read.
        assert_eq!(t.waypoints()[0], array![0.0]);
        assert_eq!(t.next_waypoint().unwrap(), array![2.0]);
        assert_eq!(t.waypoints()[0], array![2.0]);
    }

    #[test]
    fn test_empty_trajectory_fails_deterministically() {
        let mut t = Trajectory::fingers(0);
        assert!(t.is_empty());
        for _ in 0..3 {
            assert!(matches!(t.next_waypoint(), Err(RrcError::EmptySequenceError)));
        }
    }

    #[test]
    fn test_endpoints() {
        let t = Trajectory::fingers(1000);
        assert_eq!(t.len(), 1000);
        assert_eq!(t.waypoints()[0], three_fingers(POSITION_DOWN));
        let last = &t.waypoints()[999];
        let up = three_fingers(POSITION_UP);
        for (a, b) in last.iter().zip(up.iter()) {
            assert!((a - b).abs() < 1e-2);
        }
    }
}
