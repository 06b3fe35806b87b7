use serde::{Deserialize, Serialize};
use transforms::Transform;

/// Fields every sensor carries. `update_period` is in seconds, zero means every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorCommon {
    pub name: String,
    pub transform_to_joint: Transform,
    pub update_period: f64,
}

impl SensorCommon {
    pub fn new(name: &str, transform_to_joint: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform_to_joint,
            update_period: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IMUSensorDefinition {
    pub common: SensorCommon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrenchSensorDefinition {
    pub common: SensorCommon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSensorDefinition {
    pub common: SensorCommon,
    pub enable: bool,
    /// Horizontal field of view in radians.
    pub field_of_view: f64,
    pub clip_near: f64,
    pub clip_far: f64,
    pub image_width: u32,
    pub image_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LidarSensorDefinition {
    pub common: SensorCommon,
    pub min_range: f64,
    pub max_range: f64,
    pub sweep_samples: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorDefinition {
    Camera(CameraSensorDefinition),
    Imu(IMUSensorDefinition),
    Lidar(LidarSensorDefinition),
    Wrench(WrenchSensorDefinition),
}

impl SensorDefinition {
    pub fn imu(name: &str, transform_to_joint: Transform) -> Self {
        SensorDefinition::Imu(IMUSensorDefinition {
            common: SensorCommon::new(name, transform_to_joint),
        })
    }

    pub fn wrench(name: &str, transform_to_joint: Transform) -> Self {
        SensorDefinition::Wrench(WrenchSensorDefinition {
            common: SensorCommon::new(name, transform_to_joint),
        })
    }

    pub fn camera(name: &str, transform_to_joint: Transform) -> Self {
        SensorDefinition::Camera(CameraSensorDefinition {
            common: SensorCommon::new(name, transform_to_joint),
            enable: true,
            field_of_view: std::f64::consts::FRAC_PI_2,
            clip_near: 0.05,
            clip_far: 50.0,
            image_width: 640,
            image_height: 480,
        })
    }

    pub fn lidar(name: &str, transform_to_joint: Transform) -> Self {
        SensorDefinition::Lidar(LidarSensorDefinition {
            common: SensorCommon::new(name, transform_to_joint),
            min_range: 0.1,
            max_range: 30.0,
            sweep_samples: 360,
        })
    }

    pub fn common(&self) -> &SensorCommon {
        match self {
            SensorDefinition::Camera(sensor) => &sensor.common,
            SensorDefinition::Imu(sensor) => &sensor.common,
            SensorDefinition::Lidar(sensor) => &sensor.common,
            SensorDefinition::Wrench(sensor) => &sensor.common,
        }
    }

    pub fn with_update_period(mut self, update_period: f64) -> Self {
        let common = match &mut self {
            SensorDefinition::Camera(sensor) => &mut sensor.common,
            SensorDefinition::Imu(sensor) => &mut sensor.common,
            SensorDefinition::Lidar(sensor) => &mut sensor.common,
            SensorDefinition::Wrench(sensor) => &mut sensor.common,
        };
        common.update_period = update_period;
        self
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SensorDefinition::Camera(_) => "camera",
            SensorDefinition::Imu(_) => "imu",
            SensorDefinition::Lidar(_) => "lidar",
            SensorDefinition::Wrench(_) => "wrench",
        }
    }
}
