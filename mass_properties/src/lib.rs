use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MassPropertiesErrors {
    #[error("Ixx cant be less than or equal to zero")]
    IxxLessThanOrEqualToZero,
    #[error("Iyy cant be less than or equal to zero")]
    IyyLessThanOrEqualToZero,
    #[error("Izz cant be less than or equal to zero")]
    IzzLessThanOrEqualToZero,
    #[error("mass cannot be less than or equal to zero")]
    MassLessThanOrEqualToZero,
    #[error("mass properties must be finite")]
    NotFinite,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CenterOfMass {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CenterOfMass {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<Vector3<f64>> for CenterOfMass {
    fn from(v: Vector3<f64>) -> CenterOfMass {
        CenterOfMass::new(v[0], v[1], v[2])
    }
}

/// Inertia tensor about the center of mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inertia {
    pub ixx: f64,
    pub ixy: f64,
    pub ixz: f64,
    pub iyy: f64,
    pub iyz: f64,
    pub izz: f64,
}

impl Inertia {
    pub fn new(
        ixx: f64,
        iyy: f64,
        izz: f64,
        ixy: f64,
        ixz: f64,
        iyz: f64,
    ) -> Result<Self, MassPropertiesErrors> {
        if ixx <= f64::EPSILON {
            return Err(MassPropertiesErrors::IxxLessThanOrEqualToZero);
        }
        if iyy <= f64::EPSILON {
            return Err(MassPropertiesErrors::IyyLessThanOrEqualToZero);
        }
        if izz <= f64::EPSILON {
            return Err(MassPropertiesErrors::IzzLessThanOrEqualToZero);
        }
        if ![ixx, iyy, izz, ixy, ixz, iyz].iter().all(|v| v.is_finite()) {
            return Err(MassPropertiesErrors::NotFinite);
        }
        Ok(Self {
            ixx,
            iyy,
            izz,
            ixy,
            ixz,
            iyz,
        })
    }

    /// Principal moments only.
    pub fn diagonal(ixx: f64, iyy: f64, izz: f64) -> Result<Self, MassPropertiesErrors> {
        Self::new(ixx, iyy, izz, 0.0, 0.0, 0.0)
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.ixx, self.ixy, self.ixz, self.ixy, self.iyy, self.iyz, self.ixz, self.iyz,
            self.izz,
        )
    }
}

impl TryFrom<Matrix3<f64>> for Inertia {
    type Error = MassPropertiesErrors;
    fn try_from(m: Matrix3<f64>) -> Result<Inertia, MassPropertiesErrors> {
        Inertia::new(
            m[(0, 0)],
            m[(1, 1)],
            m[(2, 2)],
            m[(0, 1)],
            m[(0, 2)],
            m[(2, 1)],
        )
    }
}

/// Represents the mass properties of an object
/// Mass, Center of Mass, Inertia
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    pub center_of_mass: CenterOfMass,
    pub mass: f64,
    pub inertia: Inertia,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            center_of_mass: CenterOfMass::default(),
            mass: 1.0,
            inertia: Inertia {
                ixx: 1.0,
                ixy: 0.0,
                ixz: 0.0,
                iyy: 1.0,
                iyz: 0.0,
                izz: 1.0,
            },
        }
    }
}

impl MassProperties {
    pub fn new(
        mass: f64,
        center_of_mass: CenterOfMass,
        inertia: Inertia,
    ) -> Result<Self, MassPropertiesErrors> {
        if !mass.is_finite() {
            return Err(MassPropertiesErrors::NotFinite);
        }
        if mass <= f64::EPSILON {
            return Err(MassPropertiesErrors::MassLessThanOrEqualToZero);
        }
        if !center_of_mass.vector().iter().all(|v| v.is_finite()) {
            return Err(MassPropertiesErrors::NotFinite);
        }
        Ok(MassProperties {
            mass,
            center_of_mass,
            inertia,
        })
    }

    /// Checks values that may have bypassed the constructors, e.g. deserialized ones.
    pub fn validate(&self) -> Result<(), MassPropertiesErrors> {
        let inertia = &self.inertia;
        Inertia::new(
            inertia.ixx,
            inertia.iyy,
            inertia.izz,
            inertia.ixy,
            inertia.ixz,
            inertia.iyz,
        )?;
        MassProperties::new(self.mass, self.center_of_mass, self.inertia)?;
        Ok(())
    }
}
