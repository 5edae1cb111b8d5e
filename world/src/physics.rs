//! Axis-aligned rectangle dynamics shared by every moving entity.
//!
//! The integrator knows nothing about game rules: it applies gravity, drag
//! and velocity clamps, then resolves overlap against solids one axis at a
//! time (vertical first, then horizontal, always in that order so corner
//! cases resolve identically every tick) and recomputes the per-frame
//! contact flags.

use glam::Vec2;
use squarelife_core::ContactFlags;

/// Distance within which a resting edge still counts as contact.
pub(crate) const CONTACT_EPSILON: f32 = 1.0;

/// Axis-aligned rectangle described by its center and half extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rect {
    pub(crate) center: Vec2,
    pub(crate) half: Vec2,
}

impl Rect {
    pub(crate) const fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    pub(crate) fn from_min_size(min: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            center: min + half,
            half,
        }
    }

    pub(crate) fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub(crate) fn max(&self) -> Vec2 {
        self.center + self.half
    }

    pub(crate) fn overlaps(&self, other: Rect) -> bool {
        let delta = (other.center - self.center).abs();
        let reach = self.half + other.half;
        delta.x < reach.x && delta.y < reach.y
    }
}

/// Dynamic body owned by a single entity.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Body {
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) half: Vec2,
    pub(crate) contact: ContactFlags,
}

impl Body {
    pub(crate) fn at(position: Vec2, half: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            half,
            contact: ContactFlags::default(),
        }
    }

    pub(crate) fn rect(&self) -> Rect {
        Rect::new(self.position, self.half)
    }

    /// Accelerates the body downward. Positive y points down.
    pub(crate) fn apply_gravity(&mut self, gravity: f32, dt: f32) {
        self.velocity.y += gravity * dt;
    }

    /// Decelerates horizontal velocity toward zero when nothing drives it.
    pub(crate) fn apply_drag(&mut self, drag: f32, dt: f32) {
        let step = drag * dt;
        if self.velocity.x.abs() <= step {
            self.velocity.x = 0.0;
        } else {
            self.velocity.x -= step * self.velocity.x.signum();
        }
    }

    pub(crate) fn clamp_velocity(&mut self, max: Vec2) {
        self.velocity.x = self.velocity.x.clamp(-max.x, max.x);
        self.velocity.y = self.velocity.y.clamp(-max.y, max.y);
    }

    /// Integrates position over `dt` and resolves overlap against `solids`,
    /// refreshing the contact flags as a side effect.
    pub(crate) fn move_and_collide(&mut self, dt: f32, solids: &[Rect]) {
        self.contact = ContactFlags::default();

        self.position.y += self.velocity.y * dt;
        for solid in solids {
            if !self.rect().overlaps(*solid) {
                continue;
            }
            if self.velocity.y >= 0.0 {
                self.position.y = solid.min().y - self.half.y;
                self.velocity.y = 0.0;
                self.contact.down = true;
            } else {
                self.position.y = solid.max().y + self.half.y;
                self.velocity.y = 0.0;
                self.contact.up = true;
            }
        }

        self.position.x += self.velocity.x * dt;
        for solid in solids {
            if !self.rect().overlaps(*solid) {
                continue;
            }
            if self.velocity.x > 0.0 {
                self.position.x = solid.min().x - self.half.x;
                self.velocity.x = 0.0;
                self.contact.right = true;
            } else if self.velocity.x < 0.0 {
                self.position.x = solid.max().x + self.half.x;
                self.velocity.x = 0.0;
                self.contact.left = true;
            } else {
                // A solid moved into us (a closing door); push out the
                // shallow way and record the side that blocked.
                let delta = self.position.x - solid.center.x;
                if delta >= 0.0 {
                    self.position.x = solid.max().x + self.half.x;
                    self.contact.left = true;
                } else {
                    self.position.x = solid.min().x - self.half.x;
                    self.contact.right = true;
                }
            }
        }
    }

    /// Reports whether this body rests flush against the top of `solid`.
    pub(crate) fn standing_on(&self, solid: Rect) -> bool {
        let lateral = (self.position.x - solid.center.x).abs() < self.half.x + solid.half.x;
        let gap = solid.min().y - (self.position.y + self.half.y);
        lateral && gap.abs() <= CONTACT_EPSILON
    }

    /// Reports whether this body presses flush against the given side of
    /// `solid` ("left" meaning the solid sits to this body's left).
    pub(crate) fn beside(&self, solid: Rect, solid_on_left: bool) -> bool {
        let vertical = (self.position.y - solid.center.y).abs() < self.half.y + solid.half.y;
        let gap = if solid_on_left {
            self.position.x - self.half.x - solid.max().x
        } else {
            solid.min().x - (self.position.x + self.half.x)
        };
        vertical && gap.abs() <= CONTACT_EPSILON
    }
}
