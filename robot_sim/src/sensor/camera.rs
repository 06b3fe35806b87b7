use crate::body::{BodyId, SimRigidBody};
use nalgebra::Vector3;
use robot_definition::sensor::CameraSensorDefinition;
use serde::{Deserialize, Serialize};
use transforms::Transform;

/// Camera frame carried by a body. The camera looks along its +x axis with
/// +z up. Rendering is done elsewhere, the physics only keeps the pose current.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimCameraSensor {
    pub name: String,
    pub body: BodyId,
    pub offset: Transform,
    pub enable: bool,
    pub field_of_view: f64,
    pub clip_near: f64,
    pub clip_far: f64,
    pub image_width: u32,
    pub image_height: u32,
    update_period: f64,
    pose: Transform,
}

impl SimCameraSensor {
    pub fn new(definition: &CameraSensorDefinition, body: BodyId) -> Self {
        let common = &definition.common;
        Self {
            name: common.name.clone(),
            body,
            offset: common.transform_to_joint,
            enable: definition.enable,
            field_of_view: definition.field_of_view,
            clip_near: definition.clip_near,
            clip_far: definition.clip_far,
            image_width: definition.image_width,
            image_height: definition.image_height,
            update_period: common.update_period,
            pose: common.transform_to_joint,
        }
    }

    pub fn update_period(&self) -> f64 {
        self.update_period
    }

    pub fn pose(&self) -> &Transform {
        &self.pose
    }

    pub fn update(&mut self, body: &SimRigidBody) {
        self.pose = body.pose * self.offset;
    }

    /// Whether a point of the inertial frame lies in the view frustum.
    pub fn is_point_in_view(&self, point: &Vector3<f64>) -> bool {
        let p = self.pose.inverse_transform_point(point);
        if p.x < self.clip_near || p.x > self.clip_far {
            return false;
        }
        let half_width = (0.5 * self.field_of_view).tan();
        let aspect = self.image_height as f64 / self.image_width.max(1) as f64;
        p.y.abs() <= half_width * p.x && p.z.abs() <= half_width * aspect * p.x
    }
}
