//! DOM types for parsed SDF documents.
//!
//! These types mirror the SDF XML structure. Raw `attached_to` /
//! `relative_to` strings are kept exactly as they appear in the document
//! (empty string = unspecified); resolved semantics live in the frame
//! graphs built at load time.

use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdfError};
use crate::graph::ScopeGraphs;
use crate::pose::Pose;

/// Binding of an entity to the graphs of its enclosing scope.
///
/// Unset until the document is loaded; stays unset (with the scope name
/// recorded) when the scope failed validation, so resolved-pose accessors
/// can report a structured error instead of an identity pose.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScopeRef {
    pub(crate) scope: String,
    pub(crate) graphs: Option<Arc<ScopeGraphs>>,
}

impl ScopeRef {
    fn graphs(&self) -> Result<&ScopeGraphs> {
        self.graphs
            .as_deref()
            .ok_or_else(|| SdfError::GraphInvalid(self.scope.clone()))
    }
}

/// A `<pose>` element: a parsed literal plus the raw `relative_to` string.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SdfPose {
    /// Raw `relative_to` attribute (empty = unspecified).
    pub relative_to: String,
    /// Parsed pose literal.
    pub value: Pose,
}

impl SdfPose {
    /// Create a pose element with no `relative_to` attribute.
    #[must_use]
    pub fn new(value: Pose) -> Self {
        Self {
            relative_to: String::new(),
            value,
        }
    }

    /// Create a pose element with an explicit `relative_to` attribute.
    #[must_use]
    pub fn relative_to(value: Pose, relative_to: impl Into<String>) -> Self {
        Self {
            relative_to: relative_to.into(),
            value,
        }
    }
}

macro_rules! pose_accessors {
    () => {
        /// The raw pose literal (identity if the document had no pose element).
        #[must_use]
        pub fn raw_pose(&self) -> Pose {
            self.pose.as_ref().map_or_else(Pose::identity, |p| p.value)
        }

        /// Raw `relative_to` string from the pose element (empty = unspecified).
        #[must_use]
        pub fn pose_relative_to(&self) -> &str {
            self.pose.as_ref().map_or("", |p| p.relative_to.as_str())
        }

        /// Whether the document carried an explicit pose element.
        #[must_use]
        pub fn has_pose(&self) -> bool {
            self.pose.is_some()
        }

        /// Pose of this entity resolved relative to the enclosing scope's root.
        ///
        /// # Errors
        ///
        /// Returns [`SdfError::GraphInvalid`] if the scope failed validation
        /// (or was never loaded), or a resolution error from the graph walk.
        pub fn pose_in_scope(&self) -> Result<Pose> {
            self.scope.graphs()?.relative_to.resolve_pose(&self.name)
        }

        /// Pose of this entity resolved relative to a named frame in the
        /// same scope.
        ///
        /// # Errors
        ///
        /// Same conditions as [`Self::pose_in_scope`], plus
        /// [`SdfError::UnreachableTarget`] when `to` is not on this
        /// entity's path to the scope root.
        pub fn pose_in_frame(&self, to: &str) -> Result<Pose> {
            self.scope
                .graphs()?
                .relative_to
                .resolve_pose_in(&self.name, to)
        }
    };
}

macro_rules! indexed_accessors {
    ($field:ident, $index:ident, $ty:ty, $count:ident, $by_index:ident, $by_name:ident, $exists:ident) => {
        /// Number of entries, in document order.
        #[must_use]
        pub fn $count(&self) -> usize {
            self.$field.len()
        }

        /// Entry by document-order index.
        #[must_use]
        pub fn $by_index(&self, index: usize) -> Option<&$ty> {
            self.$field.get(index)
        }

        /// Entry by name.
        #[must_use]
        pub fn $by_name(&self, name: &str) -> Option<&$ty> {
            self.$index.get(name).map(|&i| &self.$field[i])
        }

        /// Whether an entry with this name exists.
        #[must_use]
        pub fn $exists(&self, name: &str) -> bool {
            self.$index.contains_key(name)
        }
    };
}

// ============================================================================
// Link
// ============================================================================

/// A `<link>` element.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SdfLink {
    /// Link name, unique within its scope.
    pub name: String,
    /// Optional pose element.
    pub pose: Option<SdfPose>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) scope: ScopeRef,
}

impl SdfLink {
    /// Create a link with a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the pose element.
    #[must_use]
    pub fn with_pose(mut self, pose: SdfPose) -> Self {
        self.pose = Some(pose);
        self
    }

    /// Link name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pose_accessors!();
}

// ============================================================================
// Joint
// ============================================================================

/// A `<joint>` element.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SdfJoint {
    /// Joint name, unique within its scope.
    pub name: String,
    /// Raw joint type string (`revolute`, `prismatic`, `fixed`, ...).
    pub joint_type: String,
    /// Parent link (or frame) name.
    pub parent: String,
    /// Child link (or frame) name.
    pub child: String,
    /// Optional pose element.
    pub pose: Option<SdfPose>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) scope: ScopeRef,
}

impl SdfJoint {
    /// Create a joint with a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the parent and child link names.
    #[must_use]
    pub fn with_parent_child(mut self, parent: impl Into<String>, child: impl Into<String>) -> Self {
        self.parent = parent.into();
        self.child = child.into();
        self
    }

    /// Set the pose element.
    #[must_use]
    pub fn with_pose(mut self, pose: SdfPose) -> Self {
        self.pose = Some(pose);
        self
    }

    /// Joint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent link name.
    #[must_use]
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// Child link name.
    #[must_use]
    pub fn child(&self) -> &str {
        &self.child
    }

    pose_accessors!();
}

// ============================================================================
// Frame
// ============================================================================

/// A `<frame>` element: a named coordinate frame with an optional rigid
/// attachment.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SdfFrame {
    /// Frame name, unique within its scope.
    pub name: String,
    /// Raw `attached_to` attribute (empty = unspecified, defaults to the
    /// scope's canonical link or root at graph-build time).
    pub attached_to: String,
    /// Optional pose element.
    pub pose: Option<SdfPose>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) scope: ScopeRef,
}

impl SdfFrame {
    /// Create a frame with a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the raw `attached_to` name.
    #[must_use]
    pub fn with_attached_to(mut self, attached_to: impl Into<String>) -> Self {
        self.attached_to = attached_to.into();
        self
    }

    /// Set the pose element.
    #[must_use]
    pub fn with_pose(mut self, pose: SdfPose) -> Self {
        self.pose = Some(pose);
        self
    }

    /// Frame name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw `attached_to` string exactly as declared (empty = unspecified).
    #[must_use]
    pub fn attached_to(&self) -> &str {
        &self.attached_to
    }

    /// The link, joint, model, or scope root this frame is transitively
    /// attached to, following attached-to edges through intermediate frames.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::GraphInvalid`] if the scope failed validation.
    pub fn attached_to_body(&self) -> Result<String> {
        self.scope
            .graphs()?
            .attached_to
            .resolve_attached_to_body(&self.name)
    }

    pose_accessors!();
}

// ============================================================================
// Light
// ============================================================================

/// A `<light>` element.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SdfLight {
    /// Light name, unique within its scope.
    pub name: String,
    /// Raw light type string (`point`, `spot`, `directional`).
    pub light_type: String,
    /// Optional pose element.
    pub pose: Option<SdfPose>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) scope: ScopeRef,
}

impl Default for SdfLight {
    fn default() -> Self {
        Self {
            name: String::new(),
            light_type: "point".to_string(),
            pose: None,
            scope: ScopeRef::default(),
        }
    }
}

impl SdfLight {
    /// Create a light with a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the pose element.
    #[must_use]
    pub fn with_pose(mut self, pose: SdfPose) -> Self {
        self.pose = Some(pose);
        self
    }

    /// Light name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pose_accessors!();
}

// ============================================================================
// Model
// ============================================================================

/// A `<model>` element: one nesting scope of links, joints, frames, and
/// nested models.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SdfModel {
    /// Model name, unique within its scope.
    pub name: String,
    /// Raw `canonical_link` attribute (empty = first link in document order).
    pub canonical_link: String,
    /// Optional pose element (expressed in the enclosing scope).
    pub pose: Option<SdfPose>,
    /// Links in document order.
    pub links: Vec<SdfLink>,
    /// Joints in document order.
    pub joints: Vec<SdfJoint>,
    /// Explicit frames in document order.
    pub frames: Vec<SdfFrame>,
    /// Nested models in document order.
    pub models: Vec<SdfModel>,
    link_index: HashMap<String, usize>,
    joint_index: HashMap<String, usize>,
    frame_index: HashMap<String, usize>,
    model_index: HashMap<String, usize>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) scope: ScopeRef,
}

impl SdfModel {
    /// Create a model with a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the pose element.
    #[must_use]
    pub fn with_pose(mut self, pose: SdfPose) -> Self {
        self.pose = Some(pose);
        self
    }

    /// Add a link.
    #[must_use]
    pub fn with_link(mut self, link: SdfLink) -> Self {
        self.push_link(link);
        self
    }

    /// Add a joint.
    #[must_use]
    pub fn with_joint(mut self, joint: SdfJoint) -> Self {
        self.push_joint(joint);
        self
    }

    /// Add a frame.
    #[must_use]
    pub fn with_frame(mut self, frame: SdfFrame) -> Self {
        self.push_frame(frame);
        self
    }

    /// Add a nested model.
    #[must_use]
    pub fn with_model(mut self, model: SdfModel) -> Self {
        self.push_model(model);
        self
    }

    pub(crate) fn push_link(&mut self, link: SdfLink) {
        self.link_index
            .entry(link.name.clone())
            .or_insert(self.links.len());
        self.links.push(link);
    }

    pub(crate) fn push_joint(&mut self, joint: SdfJoint) {
        self.joint_index
            .entry(joint.name.clone())
            .or_insert(self.joints.len());
        self.joints.push(joint);
    }

    pub(crate) fn push_frame(&mut self, frame: SdfFrame) {
        self.frame_index
            .entry(frame.name.clone())
            .or_insert(self.frames.len());
        self.frames.push(frame);
    }

    pub(crate) fn push_model(&mut self, model: SdfModel) {
        self.model_index
            .entry(model.name.clone())
            .or_insert(self.models.len());
        self.models.push(model);
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw `canonical_link` attribute (empty = unspecified).
    #[must_use]
    pub fn canonical_link_name(&self) -> &str {
        &self.canonical_link
    }

    indexed_accessors!(links, link_index, SdfLink, link_count, link_by_index, link_by_name, link_name_exists);
    indexed_accessors!(joints, joint_index, SdfJoint, joint_count, joint_by_index, joint_by_name, joint_name_exists);
    indexed_accessors!(frames, frame_index, SdfFrame, frame_count, frame_by_index, frame_by_name, frame_name_exists);
    indexed_accessors!(models, model_index, SdfModel, model_count, model_by_index, model_by_name, model_name_exists);

    pose_accessors!();
}

// ============================================================================
// World
// ============================================================================

/// A `<world>` element: the outermost nesting scope.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SdfWorld {
    /// World name.
    pub name: String,
    /// Models in document order.
    pub models: Vec<SdfModel>,
    /// Explicit frames in document order.
    pub frames: Vec<SdfFrame>,
    /// Lights in document order.
    pub lights: Vec<SdfLight>,
    model_index: HashMap<String, usize>,
    frame_index: HashMap<String, usize>,
    light_index: HashMap<String, usize>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) graphs: Option<Arc<ScopeGraphs>>,
}

impl SdfWorld {
    /// Create a world with a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a model.
    #[must_use]
    pub fn with_model(mut self, model: SdfModel) -> Self {
        self.push_model(model);
        self
    }

    /// Add a frame.
    #[must_use]
    pub fn with_frame(mut self, frame: SdfFrame) -> Self {
        self.push_frame(frame);
        self
    }

    /// Add a light.
    #[must_use]
    pub fn with_light(mut self, light: SdfLight) -> Self {
        self.push_light(light);
        self
    }

    pub(crate) fn push_model(&mut self, model: SdfModel) {
        self.model_index
            .entry(model.name.clone())
            .or_insert(self.models.len());
        self.models.push(model);
    }

    pub(crate) fn push_frame(&mut self, frame: SdfFrame) {
        self.frame_index
            .entry(frame.name.clone())
            .or_insert(self.frames.len());
        self.frames.push(frame);
    }

    pub(crate) fn push_light(&mut self, light: SdfLight) {
        self.light_index
            .entry(light.name.clone())
            .or_insert(self.lights.len());
        self.lights.push(light);
    }

    /// World name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The validated frame graphs of this world's scope, if loading
    /// succeeded for it.
    #[must_use]
    pub fn frame_graphs(&self) -> Option<&ScopeGraphs> {
        self.graphs.as_deref()
    }

    indexed_accessors!(models, model_index, SdfModel, model_count, model_by_index, model_by_name, model_name_exists);
    indexed_accessors!(frames, frame_index, SdfFrame, frame_count, frame_by_index, frame_by_name, frame_name_exists);
    indexed_accessors!(lights, light_index, SdfLight, light_count, light_by_index, light_by_name, light_name_exists);
}

// ============================================================================
// Root
// ============================================================================

/// A parsed `<sdf>` document: top-level worlds and models.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SdfRoot {
    /// SDF format version string from the root element.
    pub version: String,
    /// Worlds in document order.
    pub worlds: Vec<SdfWorld>,
    /// Top-level models in document order.
    pub models: Vec<SdfModel>,
    world_index: HashMap<String, usize>,
    model_index: HashMap<String, usize>,
}

impl SdfRoot {
    pub(crate) fn push_world(&mut self, world: SdfWorld) {
        self.world_index
            .entry(world.name.clone())
            .or_insert(self.worlds.len());
        self.worlds.push(world);
    }

    pub(crate) fn push_model(&mut self, model: SdfModel) {
        self.model_index
            .entry(model.name.clone())
            .or_insert(self.models.len());
        self.models.push(model);
    }

    indexed_accessors!(worlds, world_index, SdfWorld, world_count, world_by_index, world_by_name, world_name_exists);
    indexed_accessors!(models, model_index, SdfModel, model_count, model_by_index, model_by_name, model_name_exists);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::pose::Pose;

    #[test]
    fn test_model_builder_and_lookup() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L1"))
            .with_link(SdfLink::new("L2"))
            .with_frame(SdfFrame::new("F1").with_attached_to("L1"));

        assert_eq!(model.link_count(), 2);
        assert_eq!(model.frame_count(), 1);
        assert_eq!(model.joint_count(), 0);
        assert!(model.link_name_exists("L2"));
        assert!(!model.link_name_exists("L3"));
        assert_eq!(model.link_by_index(1).map(SdfLink::name), Some("L2"));
        assert!(model.link_by_index(2).is_none());
        assert_eq!(model.frame_by_name("F1").map(SdfFrame::attached_to), Some("L1"));
    }

    #[test]
    fn test_raw_pose_defaults_to_identity() {
        let link = SdfLink::new("L");
        assert!(!link.has_pose());
        assert_eq!(link.raw_pose(), Pose::identity());
        assert_eq!(link.pose_relative_to(), "");
    }

    #[test]
    fn test_raw_pose_reads_literal() {
        let frame = SdfFrame::new("F")
            .with_pose(SdfPose::relative_to(Pose::from_translation(1.0, 1.0, 0.0), "/world"));
        assert!(frame.has_pose());
        assert_eq!(frame.pose_relative_to(), "/world");
        assert_eq!(frame.raw_pose().position.x, 1.0);
    }

    #[test]
    fn test_resolved_pose_before_load_is_error() {
        let link = SdfLink::new("L");
        assert!(matches!(link.pose_in_scope(), Err(SdfError::GraphInvalid(_))));
    }

    #[test]
    fn test_index_keeps_first_on_duplicate() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L").with_pose(SdfPose::new(Pose::from_translation(1.0, 0.0, 0.0))))
            .with_link(SdfLink::new("L"));

        // Both entries exist positionally, but the name resolves once,
        // to the first occurrence.
        assert_eq!(model.link_count(), 2);
        let by_name = model.link_by_name("L").expect("should exist");
        assert!(by_name.has_pose());
    }

    #[test]
    fn test_world_lookup() {
        let world = SdfWorld::new("w")
            .with_model(SdfModel::new("M1"))
            .with_frame(SdfFrame::new("F0"))
            .with_light(SdfLight::new("sun"));

        assert_eq!(world.model_count(), 1);
        assert!(world.frame_name_exists("F0"));
        assert!(world.light_name_exists("sun"));
        assert_eq!(world.light_by_index(0).map(SdfLight::name), Some("sun"));
    }
}
