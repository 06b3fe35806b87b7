use super::{Robot, RobotErrors};
use crate::{
    auxiliary::SimJointAuxiliaryData,
    body::{BodyId, SimRigidBody},
    collidable::Collidable,
    controller::{loop_closure::LoopClosureSoftConstraintController, RobotControllerManager},
    joint::{JointModels, SimJoint},
    registry::VariableRegistry,
    system::MultiBodySystem,
};
use robot_definition::{joint::JointDefinition, rigid_body::RigidBodyDefinition, RobotDefinition};
use spatial_algebra::SpatialInertia;
use transforms::Transform;

/// Arena and side tables filled while walking the definition tree.
struct TreeBuilder<'a> {
    system: MultiBodySystem,
    auxiliary: Vec<SimJointAuxiliaryData>,
    collidables: Vec<Collidable>,
    loop_closures: Vec<(&'a JointDefinition, BodyId)>,
}

impl<'a> TreeBuilder<'a> {
    fn add_body_collidables(&mut self, definition: &RigidBodyDefinition, body: BodyId) {
        for shape in &definition.collision_shapes {
            self.collidables.push(Collidable::new(shape, Some(body)));
        }
    }

    /// Depth first, children in definition order.
    fn add_children(
        &mut self,
        definition: &'a RigidBodyDefinition,
        body: BodyId,
    ) -> Result<(), RobotErrors> {
        for child in &definition.children_joints {
            // the kind is resolved first so unknown tags fail for loop closures too
            let model = JointModels::from_definition(&child.name, &child.joint_type)?;
            if child.is_loop_closure() {
                self.loop_closures.push((child, body));
                continue;
            }

            let successor = child
                .successor
                .as_deref()
                .ok_or_else(|| RobotErrors::MissingSuccessor(child.name.clone()))?;
            if self.system.contains_joint_name(&child.name) {
                return Err(RobotErrors::DuplicateJointName(child.name.clone()));
            }
            if self.system.contains_body_name(&successor.name) {
                return Err(RobotErrors::DuplicateBodyName(successor.name.clone()));
            }
            successor
                .mass_properties
                .validate()
                .map_err(|source| RobotErrors::MassProperties {
                    body: successor.name.clone(),
                    source,
                })?;
            validate_soft_limits(child)?;

            let mut joint = SimJoint::new(
                &child.name,
                model,
                body,
                body,
                child.transform_to_parent,
            );
            joint.one_dof_parameters = child.joint_type.one_dof_parameters().copied();
            if let Some(initial_state) = &child.initial_state {
                joint.apply_state_definition(initial_state)?;
            }
            let rigid_body = SimRigidBody::new(
                &successor.name,
                SpatialInertia(successor.mass_properties),
                None,
            );
            let joint_id = self.system.push_joint(joint, rigid_body);
            let successor_id = self.system.joint(joint_id).successor;

            self.auxiliary.push(SimJointAuxiliaryData::from_definition(
                child,
                joint_id,
                successor_id,
            ));
            self.add_body_collidables(successor, successor_id);
            self.add_children(successor, successor_id)?;
        }
        Ok(())
    }
}

/// Soft stops need a well formed range, an infinite bound only means no stop.
fn validate_soft_limits(definition: &JointDefinition) -> Result<(), RobotErrors> {
    let Some(parameters) = definition.joint_type.one_dof_parameters() else {
        return Ok(());
    };
    let requested = parameters.kp_soft_limit_stop > 0.0 || parameters.kd_soft_limit_stop > 0.0;
    let lower = parameters.position_lower_limit;
    let upper = parameters.position_upper_limit;
    if requested && (lower.is_nan() || upper.is_nan() || lower > upper) {
        return Err(RobotErrors::InvalidSoftLimits {
            joint: definition.name.clone(),
            lower,
            upper,
        });
    }
    Ok(())
}

impl Robot {
    /// Instantiates the runtime tree of a robot whose root body sits at
    /// `root_pose` in the inertial frame.
    pub fn new(definition: RobotDefinition, root_pose: Transform) -> Result<Self, RobotErrors> {
        let root_definition = &definition.root_body;
        let root = SimRigidBody::new(
            &root_definition.name,
            SpatialInertia(root_definition.mass_properties),
            None,
        );
        let mut builder = TreeBuilder {
            system: MultiBodySystem::new(root, root_pose),
            auxiliary: Vec::new(),
            collidables: Vec::new(),
            loop_closures: Vec::new(),
        };
        let root_id = builder.system.root();
        builder.add_body_collidables(root_definition, root_id);
        builder.add_children(root_definition, root_id)?;

        for name in &definition.joints_to_ignore {
            let joint = builder
                .system
                .find_joint(name)
                .ok_or_else(|| RobotErrors::UnknownJointToIgnore(name.clone()))?;
            builder.system.ignore_joint(joint);
        }

        let mut constraints = Vec::with_capacity(builder.loop_closures.len());
        for (joint, predecessor) in &builder.loop_closures {
            let Some(loop_closure) = &joint.loop_closure else {
                continue;
            };
            let successor = builder
                .system
                .find_body(&loop_closure.successor)
                .ok_or_else(|| RobotErrors::LoopClosureBodyNotFound {
                    joint: joint.name.clone(),
                    body: loop_closure.successor.clone(),
                })?;
            let constraint =
                LoopClosureSoftConstraintController::from_definition(joint, *predecessor, successor)
                    .ok_or_else(|| RobotErrors::UnsupportedLoopClosure {
                        joint: joint.name.clone(),
                        joint_type: joint.joint_type.tag().to_string(),
                    })?;
            constraints.push(constraint);
        }

        let TreeBuilder {
            mut system,
            auxiliary,
            collidables,
            ..
        } = builder;
        system.update_frames();

        let mut controller_manager = RobotControllerManager::new(&system);
        for constraint in constraints {
            controller_manager.add_controller(Box::new(constraint));
        }
        let initial_states = system
            .joints
            .iter()
            .map(|joint| {
                definition
                    .joint_definition(&joint.name)
                    .and_then(|d| d.initial_state.clone())
            })
            .collect();

        log::debug!(
            "built robot '{}': {} joints, {} bodies, {} ignored, {} loop closures",
            definition.name,
            system.joints.len(),
            system.bodies.len(),
            system.joints_to_ignore().len(),
            controller_manager.number_of_controllers()
        );

        let mut robot = Self {
            name: definition.name.clone(),
            registry: VariableRegistry::new(&definition.name),
            definition,
            system,
            auxiliary,
            collidables,
            controller_manager,
            initial_states,
        };
        robot.update_collidable_bounding_boxes();
        Ok(robot)
    }
}
