use crate::math::vec2::Vec2;
use crate::objects::BodyHandle;

/// A single contact point produced by the narrow phase.
///
/// `normal` points from the first shape of the tested pair toward the second;
/// `depth` is the positive overlap along it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub point: Vec2,
    pub normal: Vec2,
    pub depth: f64,
}

impl Contact {
    pub fn new(point: Vec2, normal: Vec2, depth: f64) -> Self {
        Contact { point, normal, depth }
    }

    /// Same contact seen from the other shape.
    pub fn flipped(self) -> Self {
        Contact {
            normal: -self.normal,
            ..self
        }
    }
}

/// All contacts between one pair of bodies for the current step.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifold {
    pub body_a_idx: usize,
    pub body_b_idx: usize,
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub contacts: Vec<Contact>,
    pub restitution: f64,
    pub friction: f64,
}

impl Manifold {
    pub fn deepest(&self) -> Option<&Contact> {
        self.contacts
            .iter()
            .max_by(|a, b| a.depth.total_cmp(&b.depth))
    }
}
