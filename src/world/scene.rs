//! JSON scene files: a world configuration plus a list of bodies.
//!
//! Shape parameters coming from data are validated here and rejected with
//! `PhysicsError::InvalidShape`, so the shape constructors' assertions never
//! fire on user input.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::common::Material;
use crate::error::{PhysicsError, Result};
use crate::math::Vec2;
use crate::objects::{BodyHandle, BodyType, RigidBody};
use crate::shapes::polygon::{is_convex, signed_area};
use crate::shapes::{Circle, Collider, Polygon, Segment, Shape, TileCell, TileKind};

use super::config::WorldConfig;
use super::physics_world::PhysicsWorld;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneDesc {
    /// Replaces the world configuration when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<WorldConfig>,
    #[serde(default)]
    pub bodies: Vec<BodyDesc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDesc {
    pub body_type: BodyType,
    /// Body origin, the point the shapes' local coordinates are relative to.
    pub position: Vec2,
    pub angle: f64,
    pub linear_velocity: Vec2,
    pub angular_velocity: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub fixed_rotation: bool,
    pub category_bits: u32,
    pub mask_bits: u32,
    pub shapes: Vec<ShapeDesc>,
}

impl Default for BodyDesc {
    fn default() -> Self {
        BodyDesc {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            fixed_rotation: false,
            category_bits: 0x0001,
            mask_bits: 0xFFFF,
            shapes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeDesc {
    Circle {
        #[serde(default)]
        center: Vec2,
        radius: f64,
        #[serde(default)]
        material: Material,
    },
    Segment {
        a: Vec2,
        b: Vec2,
        #[serde(default)]
        radius: f64,
        #[serde(default)]
        material: Material,
    },
    Polygon {
        vertices: Vec<Vec2>,
        #[serde(default)]
        material: Material,
    },
    Tile {
        kind: TileKind,
        #[serde(default)]
        offset: Vec2,
        xw: f64,
        yw: f64,
        #[serde(default)]
        signx: i8,
        #[serde(default)]
        signy: i8,
        #[serde(default)]
        material: Material,
    },
}

fn invalid(msg: impl Into<String>) -> PhysicsError {
    PhysicsError::InvalidShape(msg.into())
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

fn finite_point(name: &str, p: Vec2) -> Result<()> {
    if p.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite, got ({}, {})", p.x, p.y)))
    }
}

impl ShapeDesc {
    pub fn from_collider(collider: &Collider) -> Self {
        let material = collider.material;
        match &collider.shape {
            Shape::Circle(c) => ShapeDesc::Circle {
                center: c.center,
                radius: c.radius,
                material,
            },
            Shape::Segment(s) => ShapeDesc::Segment {
                a: s.a,
                b: s.b,
                radius: s.radius,
                material,
            },
            Shape::Polygon(p) => ShapeDesc::Polygon {
                vertices: p.vertices().to_vec(),
                material,
            },
            Shape::Tile(t) => ShapeDesc::Tile {
                kind: t.kind,
                offset: t.offset,
                xw: t.xw,
                yw: t.yw,
                signx: t.signx,
                signy: t.signy,
                material,
            },
        }
    }

    /// Checks the parameters and builds the collider.
    pub fn to_collider(&self) -> Result<Collider> {
        let (shape, material) = match self {
            ShapeDesc::Circle { center, radius, material } => {
                finite_point("circle center", *center)?;
                positive("circle radius", *radius)?;
                (Shape::Circle(Circle::with_center(*center, *radius)), material)
            }
            ShapeDesc::Segment { a, b, radius, material } => {
                finite_point("segment endpoint", *a)?;
                finite_point("segment endpoint", *b)?;
                if !(*radius >= 0.0 && radius.is_finite()) {
                    return Err(invalid(format!("segment radius must be non-negative, got {radius}")));
                }
                if a == b && *radius == 0.0 {
                    return Err(invalid("segment has no length and no radius"));
                }
                (Shape::Segment(Segment::new(*a, *b, *radius)), material)
            }
            ShapeDesc::Polygon { vertices, material } => {
                if vertices.len() < 3 {
                    return Err(invalid(format!("polygon needs at least 3 vertices, got {}", vertices.len())));
                }
                for v in vertices {
                    finite_point("polygon vertex", *v)?;
                }
                let mut ring = vertices.clone();
                let area = signed_area(&ring);
                if area.abs() < 1e-12 {
                    return Err(invalid("polygon has zero area"));
                }
                if area < 0.0 {
                    ring.reverse();
                }
                if !is_convex(&ring) {
                    return Err(invalid("polygon is not convex"));
                }
                (Shape::Polygon(Polygon::new(ring)), material)
            }
            ShapeDesc::Tile {
                kind,
                offset,
                xw,
                yw,
                signx,
                signy,
                material,
            } => {
                finite_point("tile offset", *offset)?;
                positive("tile xw", *xw)?;
                positive("tile yw", *yw)?;
                if !kind.accepts_signs(*signx, *signy) {
                    return Err(invalid(format!("tile signs ({signx}, {signy}) do not fit {kind:?}")));
                }
                let tile = TileCell::new(*kind, *xw, *yw, *signx, *signy).at(*offset);
                (Shape::Tile(tile), material)
            }
        };
        let material = Material::new(material.restitution, material.friction, material.density);
        Ok(Collider::new(shape).with_material(material))
    }
}

impl BodyDesc {
    pub fn from_body(body: &RigidBody) -> Self {
        BodyDesc {
            body_type: body.body_type(),
            position: body.origin(),
            angle: body.rotation(),
            linear_velocity: body.linear_velocity(),
            angular_velocity: body.angular_velocity(),
            linear_damping: body.linear_damping,
            angular_damping: body.angular_damping,
            fixed_rotation: body.is_fixed_rotation(),
            category_bits: body.category_bits,
            mask_bits: body.mask_bits,
            shapes: body.colliders().iter().map(ShapeDesc::from_collider).collect(),
        }
    }

    pub fn build(&self) -> Result<RigidBody> {
        let colliders = self
            .shapes
            .iter()
            .map(ShapeDesc::to_collider)
            .collect::<Result<Vec<_>>>()?;

        let mut body = RigidBody::new(self.body_type, self.position, self.angle);
        body.set_fixed_rotation(self.fixed_rotation);
        for collider in colliders {
            body.add_collider(collider);
        }
        body.set_velocity(self.linear_velocity);
        body.set_angular_velocity(self.angular_velocity);
        body.linear_damping = self.linear_damping;
        body.angular_damping = self.angular_damping;
        body.category_bits = self.category_bits;
        body.mask_bits = self.mask_bits;
        Ok(body)
    }
}

impl PhysicsWorld {
    /// Adds every body described by `json`. Nothing is added unless the whole
    /// scene is valid.
    pub fn load_scene(&mut self, json: &str) -> Result<Vec<BodyHandle>> {
        let scene: SceneDesc = serde_json::from_str(json)?;
        let bodies = scene
            .bodies
            .iter()
            .map(BodyDesc::build)
            .collect::<Result<Vec<_>>>()?;
        if let Some(config) = scene.config {
            self.set_config(config)?;
        }

        let handles: Vec<BodyHandle> = bodies.into_iter().map(|body| self.add_body(body)).collect();
        debug!("loaded scene with {} bodies", handles.len());
        Ok(handles)
    }

    /// Snapshot of the configuration and every body.
    pub fn scene(&self) -> SceneDesc {
        SceneDesc {
            config: Some(self.config().clone()),
            bodies: self.bodies().iter().map(BodyDesc::from_body).collect(),
        }
    }

    pub fn scene_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.scene())?)
    }
}
