//! Reverb sources: a fixed ring of directional emitters around the
//! listener that render the FDN's diffuse tail as if it arrived from a
//! small number of discrete directions, each fed by one FDN channel.

use racoustic_dsp::linear_to_db;
use racoustic_math::Vec3;
use racoustic_room::Room;

/// One reverb source: a direction fixed at init time and the FDN channel
/// whose output it renders.
#[derive(Debug, Clone, Copy)]
pub struct ReverbSource {
    direction: Vec3,
    channel: usize,
}

impl ReverbSource {
    /// Direction from the listener this source is pinned to, fixed for
    /// the source's lifetime.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// FDN channel this source renders.
    pub fn channel(&self) -> usize {
        self.channel
    }
}

/// A fixed ring of reverb sources, one per FDN channel, spread evenly in
/// azimuth around the listener at unit distance.
#[derive(Debug, Clone)]
pub struct ReverbSourceRing {
    sources: Vec<ReverbSource>,
}

impl ReverbSourceRing {
    /// Build a ring of `channel_count` sources spread evenly in azimuth at
    /// a fixed elevation of zero (the horizontal plane through the
    /// listener).
    pub fn new(channel_count: usize) -> Self {
        let sources = (0..channel_count)
            .map(|i| {
                let theta = core::f32::consts::TAU * i as f32 / channel_count.max(1) as f32;
                let direction = Vec3::new(libm::cosf(theta), 0.0, libm::sinf(theta));
                ReverbSource { direction, channel: i }
            })
            .collect();
        Self { sources }
    }

    /// The ring's sources, in channel order.
    pub fn sources(&self) -> &[ReverbSource] {
        &self.sources
    }

    /// For each source, cast a ray from `listener` along its direction,
    /// find the closest wall it exits through, and return that wall's
    /// per-band absorption as gains in dB (silence if no wall is hit,
    /// matching an anechoic boundary in that direction).
    pub fn reflection_gains_db(&self, room: &Room, listener: Vec3) -> Vec<Vec<f32>> {
        self.sources
            .iter()
            .map(|source| nearest_wall_gains_db(room, listener, source.direction))
            .collect()
    }
}

fn nearest_wall_gains_db(room: &Room, origin: Vec3, direction: Vec3) -> Vec<f32> {
    let mut closest_t = f32::INFINITY;
    let mut closest_bands: Option<Vec<f32>> = None;

    for wall in room.walls() {
        let denom = wall.normal().dot(direction);
        if denom.abs() < 1e-6 {
            continue;
        }
        let t = (wall.distance() - wall.normal().dot(origin)) / denom;
        if t <= 1e-4 || t >= closest_t {
            continue;
        }
        let hit = origin + direction * t;
        if !point_roughly_in_wall(wall.vertices(), wall.normal(), hit) {
            continue;
        }
        closest_t = t;
        closest_bands = Some(
            (0..wall.absorption().num_bands())
                .map(|b| linear_to_db(wall.absorption().reflection_coefficient(b).max(1e-6)))
                .collect(),
        );
    }

    closest_bands.unwrap_or_else(|| vec![0.0; room.num_bands()])
}

fn point_roughly_in_wall(vertices: &[Vec3], normal: Vec3, point: Vec3) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f32;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let edge = b - a;
        let to_point = point - a;
        let cross = edge.cross(to_point).dot(normal);
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != 0.0 && cross.signum() != sign {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use racoustic_math::AbsorptionVector;

    fn floor_room() -> Room {
        let mut room = Room::new(2);
        room.add_wall(
            vec![
                Vec3::new(-5.0, -1.0, -5.0),
                Vec3::new(5.0, -1.0, -5.0),
                Vec3::new(5.0, -1.0, 5.0),
                Vec3::new(-5.0, -1.0, 5.0),
            ],
            AbsorptionVector::from_alpha(&[0.2, 0.2], 100.0),
        )
        .unwrap();
        room
    }

    #[test]
    fn ring_spreads_sources_evenly_in_azimuth() {
        let ring = ReverbSourceRing::new(4);
        assert_eq!(ring.sources().len(), 4);
        for source in ring.sources() {
            assert!((source.direction().length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn downward_ray_hits_the_floor() {
        let ring = ReverbSourceRing::new(1);
        let room = floor_room();
        let gains = nearest_wall_gains_db(&room, Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(gains.len(), 2);
        let _ = ring;
    }

    #[test]
    fn ray_with_no_wall_in_path_is_silent() {
        let room = floor_room();
        let gains = nearest_wall_gains_db(&room, Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert!(gains.iter().all(|&g| g == 0.0));
    }
}
