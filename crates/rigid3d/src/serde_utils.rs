//! Serde proxies for glam types.
//!
//! Vectors serialize as `{ "x", "y", "z" }`. Matrices serialize as three
//! rows, the same layout the host reads rotations in. Box bounds write an
//! unbounded axis as `null`, since JSON has no infinity.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::math::{mat3_from_rows, mat3_to_rows};

/// Serde proxy for Vec3
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Vec3Def {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Def {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Vec3Def> for Vec3 {
    fn from(def: Vec3Def) -> Self {
        Vec3::new(def.x, def.y, def.z)
    }
}

/// `#[serde(with = "serde_utils::vec3")]`
pub mod vec3 {
    use super::Vec3Def;
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(v: &Vec3, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Vec3Def::from(*v).serialize(s)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec3Def::deserialize(d).map(Vec3::from)
    }
}

/// Serde proxy for a box bound; `None` marks an unbounded axis.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BoundDef {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl BoundDef {
    fn from_vec3(v: Vec3) -> Self {
        let finite = |c: f32| c.is_finite().then_some(c);
        Self {
            x: finite(v.x),
            y: finite(v.y),
            z: finite(v.z),
        }
    }

    fn to_vec3(self, unbounded: f32) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(unbounded),
            self.y.unwrap_or(unbounded),
            self.z.unwrap_or(unbounded),
        )
    }
}

/// `#[serde(with = "serde_utils::lower_bound")]`, `null` reads back as -inf.
pub mod lower_bound {
    use super::BoundDef;
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(v: &Vec3, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        BoundDef::from_vec3(*v).serialize(s)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        BoundDef::deserialize(d).map(|b| b.to_vec3(f32::NEG_INFINITY))
    }
}

/// `#[serde(with = "serde_utils::upper_bound")]`, `null` reads back as +inf.
pub mod upper_bound {
    use super::BoundDef;
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(v: &Vec3, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        BoundDef::from_vec3(*v).serialize(s)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        BoundDef::deserialize(d).map(|b| b.to_vec3(f32::INFINITY))
    }
}

/// `#[serde(with = "serde_utils::mat3_rows")]`
pub mod mat3_rows {
    use super::{mat3_from_rows, mat3_to_rows};
    use glam::Mat3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(m: &Mat3, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        mat3_to_rows(*m).serialize(s)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Mat3, D::Error>
    where
        D: Deserializer<'de>,
    {
        <[[f32; 3]; 3]>::deserialize(d).map(mat3_from_rows)
    }
}
