//! # Obstacle sensors
//!
//! Geometry of the short range ray sensors mounted on the front of the rover, and the casting of
//! those rays into the world.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Serialize;

use super::ObstAvoidParams;
use crate::auto::{ext::RayQuery, loc::Pose};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point at which a sensor ray hit an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorHit {
    pub point_m: Vector3<f64>,

    /// Surface normal at the hit, in the world frame
    pub normal: Vector3<f64>,

    pub distance_m: f64,
}

/// The result of casting one sensor ray.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    pub sensor: Sensor,

    /// The obstacle hit, `None` if the ray was clear (or hit something that is not an obstacle)
    pub hit: Option<SensorHit>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Identifies one sensor ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sensor {
    /// Straight ahead from the left of the sensor bar
    LeftSide,

    /// From the left of the sensor bar, turned outwards to the left
    LeftAngled,

    RightSide,
    RightAngled,

    /// Straight ahead, one of the parallel rays of the centre fan
    Centre(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Sensor {
    /// Origin and unit direction of the sensor ray in the rover's local frame.
    pub fn local_ray(&self, params: &ObstAvoidParams) -> (Vector3<f64>, Vector3<f64>) {
        let fwd = params.sensor_forward_offset_m;
        let h = params.sensor_height_m;
        let side = params.side_sensor_offset_m;
        let (sin_a, cos_a) = params.angled_sensor_rad.sin_cos();

        match self {
            Sensor::LeftSide => (Vector3::new(-side, h, fwd), Vector3::z()),
            Sensor::LeftAngled => (Vector3::new(-side, h, fwd), Vector3::new(-sin_a, 0.0, cos_a)),
            Sensor::RightSide => (Vector3::new(side, h, fwd), Vector3::z()),
            Sensor::RightAngled => (Vector3::new(side, h, fwd), Vector3::new(sin_a, 0.0, cos_a)),
            Sensor::Centre(i) => {
                let n = params.centre_fan_num_rays;
                let lat = if n <= 1 {
                    0.0
                } else {
                    -0.5 * params.centre_fan_width_m
                        + params.centre_fan_width_m * (*i as f64) / ((n - 1) as f64)
                };
                (Vector3::new(lat, h, fwd), Vector3::z())
            }
        }
    }

    /// Fixed avoidance weight contributed by a hit on this sensor.
    ///
    /// Positive weights steer right. Centre fan weights depend on the hit normal, see
    /// [`centre_weight`].
    pub fn weight(&self) -> f64 {
        match self {
            Sensor::LeftSide => 1.0,
            Sensor::LeftAngled => 0.5,
            Sensor::RightSide => -1.0,
            Sensor::RightAngled => -0.5,
            Sensor::Centre(_) => 0.0,
        }
    }
}

impl SensorReading {
    pub fn is_hit(&self) -> bool {
        self.hit.is_some()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Cast a sensor's ray from the given pose.
///
/// Hits on colliders whose tag does not match the obstacle tag are reported as clear.
pub fn cast(
    query: &dyn RayQuery,
    pose: &Pose,
    params: &ObstAvoidParams,
    sensor: Sensor,
) -> SensorReading {
    let (origin_local, dir_local) = sensor.local_ray(params);
    let origin = pose.local_point_to_world(&origin_local);
    let dir = pose.local_dir_to_world(&dir_local);

    let hit = query
        .raycast(&origin, &dir, params.sensor_range_m)
        .filter(|h| h.tag == params.obstacle_tag)
        .map(|h| SensorHit {
            point_m: h.point_m,
            normal: h.normal,
            distance_m: h.distance_m,
        });

    SensorReading { sensor, hit }
}

/// Cast every ray of the centre fan.
pub fn cast_centre_fan(
    query: &dyn RayQuery,
    pose: &Pose,
    params: &ObstAvoidParams,
) -> Vec<SensorReading> {
    (0..params.centre_fan_num_rays.max(1))
        .map(|i| cast(query, pose, params, Sensor::Centre(i)))
        .collect()
}

/// Lateral normal components smaller than this are treated as head-on.
const LATERAL_EPS: f64 = 1e-9;

/// Avoidance weight of a centre fan hit.
///
/// A surface whose normal points to the rover's left gives -1 (steer left), otherwise +1, so a
/// head-on surface always steers right whatever the heading.
pub fn centre_weight(pose: &Pose, hit: &SensorHit) -> f64 {
    if hit.normal.dot(&pose.right()) < -LATERAL_EPS {
        -1.0
    } else {
        1.0
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sensor_geometry() {
        let params = ObstAvoidParams {
            centre_fan_width_m: 1.0,
            centre_fan_num_rays: 3,
            ..Default::default()
        };

        let (o, d) = Sensor::LeftAngled.local_ray(&params);
        assert!(o[0] < 0.0);
        assert!(d[0] < 0.0 && d[2] > 0.0);
        assert!((d.norm() - 1.0).abs() < 1e-12);

        let (o, d) = Sensor::RightAngled.local_ray(&params);
        assert!(o[0] > 0.0);
        assert!(d[0] > 0.0 && d[2] > 0.0);

        let lats: Vec<f64> = (0..3)
            .map(|i| Sensor::Centre(i).local_ray(&params).0[0])
            .collect();
        assert_eq!(lats, vec![-0.5, 0.0, 0.5]);

        let single = ObstAvoidParams {
            centre_fan_num_rays: 1,
            ..Default::default()
        };
        assert_eq!(Sensor::Centre(0).local_ray(&single).0[0], 0.0);
    }

    #[test]
    fn test_centre_weight() {
        // Facing +X, so the rover's right is -Z
        let pose = Pose::new(Vector3::zeros(), std::f64::consts::FRAC_PI_2);
        let hit = |normal: Vector3<f64>| SensorHit {
            point_m: Vector3::zeros(),
            normal,
            distance_m: 1.0,
        };

        assert_eq!(centre_weight(&pose, &hit(Vector3::new(-1.0, 0.0, 0.5))), -1.0);
        assert_eq!(centre_weight(&pose, &hit(Vector3::new(-1.0, 0.0, -0.5))), 1.0);
        assert_eq!(centre_weight(&pose, &hit(Vector3::new(-1.0, 0.0, 0.0))), 1.0);
    }

    #[test]
    fn test_centre_weight_head_on_any_heading() {
        for i in 0..16 {
            let heading = -std::f64::consts::PI + i as f64 * std::f64::consts::PI / 8.0;
            let pose = Pose::new(Vector3::zeros(), heading);
            let hit = SensorHit {
                point_m: pose.forward(),
                normal: -pose.forward(),
                distance_m: 1.0,
            };

            assert_eq!(centre_weight(&pose, &hit), 1.0, "heading {}", heading);
        }
    }
}
