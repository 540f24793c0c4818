use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use lumber_geom::Vec2;
use lumber_stream::{SharedObserver, Streamer};

use crate::renderer::HeadlessRenderer;
use crate::scatter::ScatterListener;

pub struct App {
    pub streamer: Streamer,
    pub observer: SharedObserver,
    pub renderer: HeadlessRenderer,
    pub scatter: ScatterListener,
    pub motion: Motion,
    pub(crate) position: Vec2,
    pub(crate) frames: u64,
    pub(crate) started: Instant,
    pub(crate) config_event_rx: Receiver<()>,
    pub(crate) config_path: PathBuf,
    pub(crate) seed_override: Option<i32>,
}

/// Constant-velocity observer path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    pub velocity: Vec2,
}

impl Motion {
    /// `heading` in degrees counter-clockwise from +x, `speed` in units per second.
    pub fn from_heading(heading: f32, speed: f32) -> Self {
        let (s, c) = heading.to_radians().sin_cos();
        Self {
            velocity: Vec2::new(c, s) * speed,
        }
    }

    pub fn advance(&self, from: Vec2, dt: f32) -> Vec2 {
        from + self.velocity * dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_zero_walks_plus_x() {
        let m = Motion::from_heading(0.0, 10.0);
        let p = m.advance(Vec2::ZERO, 0.5);
        assert!((p.x - 5.0).abs() < 1e-5);
        assert!(p.y.abs() < 1e-5);
    }

    #[test]
    fn heading_ninety_walks_plus_y() {
        let m = Motion::from_heading(90.0, 2.0);
        let p = m.advance(Vec2::new(1.0, 1.0), 1.0);
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 3.0).abs() < 1e-5);
    }
}
