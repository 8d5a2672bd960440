//! Frame-graph construction, validation, and pose resolution.
//!
//! Each world or model element defines one *scope*: the set of named
//! entities it directly introduces, plus one implicit root vertex
//! (`"world"` for worlds, `"__model__"` for models). Two directed graphs
//! are built per scope:
//!
//! - the **attached-to graph** encodes rigid attachment of frames (one
//!   outgoing edge per frame, chains must bottom out at a non-frame
//!   vertex), and
//! - the **relative-to graph** encodes pose references (one posed outgoing
//!   edge per non-root vertex, chains must reach the scope root).
//!
//! Validation is exhaustive: dangling references and cycles are collected
//! into a full error list rather than aborting at the first violation.
//! After successful validation the graphs are immutable and shared by the
//! scope's facades for read-only pose queries.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, SdfError};
use crate::pose::Pose;
use crate::types::{SdfModel, SdfWorld};

/// Name of the implicit root vertex of a world scope.
pub const WORLD_ROOT_NAME: &str = "world";

/// Name of the implicit root vertex of a model scope.
pub const MODEL_ROOT_NAME: &str = "__model__";

/// Kind tag of a scope vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    /// The implicit scope-root vertex.
    Root,
    /// A link.
    Link,
    /// A joint.
    Joint,
    /// An explicit frame.
    Frame,
    /// A nested model.
    Model,
    /// A light.
    Light,
}

impl VertexKind {
    /// Human-readable kind name used in error messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "scope root",
            Self::Link => "link",
            Self::Joint => "joint",
            Self::Frame => "frame",
            Self::Model => "model",
            Self::Light => "light",
        }
    }

    /// Whether this vertex is an explicit frame (the only movable kind in
    /// the attached-to graph).
    #[must_use]
    pub fn is_frame(&self) -> bool {
        matches!(self, Self::Frame)
    }
}

/// A named, kind-tagged vertex in a scope's graphs.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Vertex name, unique within the scope.
    pub name: String,
    /// Vertex kind.
    pub kind: VertexKind,
}

/// One enumerated entity of a scope, before graph construction.
#[derive(Debug, Clone)]
struct ScopeEntity {
    name: String,
    kind: VertexKind,
    attached_to: String,
    relative_to: String,
    pose: Pose,
}

impl ScopeEntity {
    fn posed(name: &str, kind: VertexKind, relative_to: &str, pose: Pose) -> Self {
        Self {
            name: name.to_string(),
            kind,
            attached_to: String::new(),
            relative_to: relative_to.to_string(),
            pose,
        }
    }
}

/// A joint's parent or child reference, checked against the scope.
#[derive(Debug, Clone)]
struct JointRef {
    joint: String,
    relation: &'static str,
    target: String,
}

/// The enumerated vertex set of one world or model scope.
///
/// Pure transform of the DOM: no graph edges yet, just ordered entities,
/// the implicit root, the canonical attachment target, and the raw
/// reference strings. Duplicate sibling names are reported here.
#[derive(Debug)]
pub(crate) struct Scope {
    name: String,
    root_name: &'static str,
    canonical_link: String,
    entities: Vec<ScopeEntity>,
    joint_refs: Vec<JointRef>,
}

impl Scope {
    /// Enumerate the scope introduced by a model element.
    pub(crate) fn from_model(model: &SdfModel) -> (Self, Vec<SdfError>) {
        let mut errors = Vec::new();

        let canonical_link = if model.canonical_link.is_empty() {
            model.links.first().map(|l| l.name.clone()).unwrap_or_default()
        } else {
            if !model.link_name_exists(&model.canonical_link) {
                errors.push(SdfError::dangling_reference(
                    "canonical_link",
                    &model.name,
                    &model.canonical_link,
                    &model.name,
                ));
            }
            model.canonical_link.clone()
        };

        let mut scope = Self {
            name: model.name.clone(),
            root_name: MODEL_ROOT_NAME,
            canonical_link,
            entities: Vec::new(),
            joint_refs: Vec::new(),
        };
        let mut seen: HashMap<String, VertexKind> = HashMap::new();
        seen.insert(MODEL_ROOT_NAME.to_string(), VertexKind::Root);

        for link in &model.links {
            scope.push_entity(
                ScopeEntity::posed(&link.name, VertexKind::Link, link.pose_relative_to(), link.raw_pose()),
                &mut seen,
                &mut errors,
            );
        }
        for joint in &model.joints {
            scope.push_entity(
                ScopeEntity::posed(&joint.name, VertexKind::Joint, joint.pose_relative_to(), joint.raw_pose()),
                &mut seen,
                &mut errors,
            );
            for (relation, target) in [("joint parent", &joint.parent), ("joint child", &joint.child)] {
                if target.is_empty() {
                    errors.push(SdfError::missing_attribute(
                        if relation == "joint parent" { "parent" } else { "child" },
                        format!("joint '{}'", joint.name),
                    ));
                } else {
                    scope.joint_refs.push(JointRef {
                        joint: joint.name.clone(),
                        relation,
                        target: target.clone(),
                    });
                }
            }
        }
        for frame in &model.frames {
            scope.push_entity(
                ScopeEntity {
                    name: frame.name.clone(),
                    kind: VertexKind::Frame,
                    attached_to: frame.attached_to.clone(),
                    relative_to: frame.pose_relative_to().to_string(),
                    pose: frame.raw_pose(),
                },
                &mut seen,
                &mut errors,
            );
        }
        for nested in &model.models {
            scope.push_entity(
                ScopeEntity::posed(&nested.name, VertexKind::Model, nested.pose_relative_to(), nested.raw_pose()),
                &mut seen,
                &mut errors,
            );
        }

        (scope, errors)
    }

    /// Enumerate the scope introduced by a world element.
    pub(crate) fn from_world(world: &SdfWorld) -> (Self, Vec<SdfError>) {
        let mut errors = Vec::new();
        let mut scope = Self {
            name: world.name.clone(),
            root_name: WORLD_ROOT_NAME,
            canonical_link: String::new(),
            entities: Vec::new(),
            joint_refs: Vec::new(),
        };
        let mut seen: HashMap<String, VertexKind> = HashMap::new();
        seen.insert(WORLD_ROOT_NAME.to_string(), VertexKind::Root);

        for model in &world.models {
            scope.push_entity(
                ScopeEntity::posed(&model.name, VertexKind::Model, model.pose_relative_to(), model.raw_pose()),
                &mut seen,
                &mut errors,
            );
        }
        for frame in &world.frames {
            scope.push_entity(
                ScopeEntity {
                    name: frame.name.clone(),
                    kind: VertexKind::Frame,
                    attached_to: frame.attached_to.clone(),
                    relative_to: frame.pose_relative_to().to_string(),
                    pose: frame.raw_pose(),
                },
                &mut seen,
                &mut errors,
            );
        }
        for light in &world.lights {
            scope.push_entity(
                ScopeEntity::posed(&light.name, VertexKind::Light, light.pose_relative_to(), light.raw_pose()),
                &mut seen,
                &mut errors,
            );
        }

        (scope, errors)
    }

    fn push_entity(
        &mut self,
        entity: ScopeEntity,
        seen: &mut HashMap<String, VertexKind>,
        errors: &mut Vec<SdfError>,
    ) {
        if let Some(first_kind) = seen.get(&entity.name) {
            errors.push(SdfError::duplicate_name(
                &entity.name,
                &self.name,
                first_kind.as_str(),
                entity.kind.as_str(),
            ));
            return;
        }
        seen.insert(entity.name.clone(), entity.kind);
        self.entities.push(entity);
    }
}

/// Resolve a declared reference name to a vertex name.
///
/// The world-absolute form `/world` addresses the enclosing scope's root;
/// any other name (including other leading-`/` strings) is looked up
/// verbatim and dangles when no vertex carries it.
fn resolve_reference<'a>(raw: &'a str, root_name: &'a str) -> &'a str {
    if raw == "/world" { root_name } else { raw }
}

// ============================================================================
// Attached-to graph
// ============================================================================

/// Directed graph of rigid frame attachments within one scope.
///
/// Only frames have outgoing edges; the edge target is the declared
/// `attached_to` name, or the scope's canonical link (falling back to the
/// scope root) when unspecified.
#[derive(Debug)]
pub struct FrameAttachedToGraph {
    scope: String,
    root_name: &'static str,
    vertices: Vec<Vertex>,
    index: HashMap<String, usize>,
    edges: HashMap<usize, usize>,
    canonical_link: String,
}

impl FrameAttachedToGraph {
    /// Name of the scope this graph belongs to.
    #[must_use]
    pub fn scope_name(&self) -> &str {
        &self.scope
    }

    /// The scope's canonical link name (empty if the scope has no links).
    #[must_use]
    pub fn canonical_link(&self) -> &str {
        &self.canonical_link
    }

    /// Number of vertices, including the implicit root.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Whether a vertex with this name exists in the scope.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The one-hop attachment target of a frame, exactly as declared or
    /// defaulted at build time. `None` for non-frame vertices and unknown
    /// names.
    #[must_use]
    pub fn attached_to(&self, name: &str) -> Option<&str> {
        let idx = *self.index.get(name)?;
        let target = *self.edges.get(&idx)?;
        Some(self.vertices[target].name.as_str())
    }

    /// Follow attached-to edges from a frame to the terminal non-frame
    /// vertex (link, joint, nested model, or scope root). Non-frame
    /// vertices resolve to themselves.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::UnreachableTarget`] if `name` is not a vertex of
    /// this scope, or [`SdfError::GraphInvalid`] when called on a graph
    /// that failed validation.
    pub fn resolve_attached_to_body(&self, name: &str) -> Result<String> {
        let mut cur = *self
            .index
            .get(name)
            .ok_or_else(|| SdfError::unreachable_target(name, self.root_name, &self.scope))?;

        let mut hops = 0usize;
        while self.vertices[cur].kind.is_frame() {
            let Some(&next) = self.edges.get(&cur) else {
                // A validated graph has one edge per frame.
                return Err(SdfError::GraphInvalid(self.scope.clone()));
            };
            cur = next;
            hops += 1;
            if hops > self.vertices.len() {
                return Err(SdfError::GraphInvalid(self.scope.clone()));
            }
        }

        Ok(self.vertices[cur].name.clone())
    }
}

// ============================================================================
// Relative-to graph
// ============================================================================

/// Directed graph of pose references within one scope.
///
/// Every non-root vertex has one outgoing edge labeled with its pose
/// literal; the target is the declared `relative_to` name, or the scope
/// root when unspecified. The root is the sink.
#[derive(Debug)]
pub struct PoseRelativeToGraph {
    scope: String,
    root_name: &'static str,
    vertices: Vec<Vertex>,
    index: HashMap<String, usize>,
    edges: HashMap<usize, (usize, Pose)>,
}

impl PoseRelativeToGraph {
    /// Name of the scope this graph belongs to.
    #[must_use]
    pub fn scope_name(&self) -> &str {
        &self.scope
    }

    /// Name of the scope's implicit root vertex.
    #[must_use]
    pub fn root_name(&self) -> &str {
        self.root_name
    }

    /// Number of vertices, including the implicit root.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Whether a vertex with this name exists in the scope.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The one-hop pose-reference target of a vertex, exactly as declared
    /// or defaulted at build time. `None` for the root and unknown names.
    #[must_use]
    pub fn relative_to(&self, name: &str) -> Option<&str> {
        let idx = *self.index.get(name)?;
        let (target, _) = *self.edges.get(&idx)?;
        Some(self.vertices[target].name.as_str())
    }

    /// Resolve the pose of `from` relative to the scope root.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_pose_in`].
    pub fn resolve_pose(&self, from: &str) -> Result<Pose> {
        self.resolve_pose_in(from, self.root_name)
    }

    /// Resolve the pose of `from` expressed in the frame of `to`.
    ///
    /// Walks relative-to edges strictly forward from `from`, composing each
    /// hop's pose literal, until `to` is reached. `to` must lie on the walk
    /// from `from` to the scope root.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::UnreachableTarget`] if either name is not a
    /// vertex of this scope or `to` is never reached.
    pub fn resolve_pose_in(&self, from: &str, to: &str) -> Result<Pose> {
        let from_idx = *self
            .index
            .get(from)
            .ok_or_else(|| SdfError::unreachable_target(from, to, &self.scope))?;
        let to_idx = *self
            .index
            .get(to)
            .ok_or_else(|| SdfError::unreachable_target(from, to, &self.scope))?;

        let mut acc = Pose::identity();
        let mut cur = from_idx;
        let mut hops = 0usize;
        while cur != to_idx {
            let Some(&(next, pose)) = self.edges.get(&cur) else {
                return Err(SdfError::unreachable_target(from, to, &self.scope));
            };
            // The hop carries the pose of `cur` in its target's frame, so the
            // accumulated pose of `from` is pre-multiplied at each step.
            acc = pose.compose(&acc);
            cur = next;
            hops += 1;
            if hops > self.vertices.len() {
                // Cannot happen on a validated graph.
                return Err(SdfError::GraphInvalid(self.scope.clone()));
            }
        }
        Ok(acc)
    }
}

// ============================================================================
// Construction & validation
// ============================================================================

/// The built-and-validated graph pair of one scope.
#[derive(Debug)]
pub struct ScopeGraphs {
    /// Rigid-attachment graph.
    pub attached_to: FrameAttachedToGraph,
    /// Pose-reference graph.
    pub relative_to: PoseRelativeToGraph,
}

impl ScopeGraphs {
    /// Build both graphs for an enumerated scope and validate them.
    ///
    /// Validation is exhaustive: all dangling references, invalid
    /// attachments, and cycles found in either graph are returned together.
    /// The graphs are returned even when errors were found so callers can
    /// decide what to keep; edges whose target failed to resolve are
    /// simply absent.
    pub(crate) fn build(scope: &Scope) -> (Self, Vec<SdfError>) {
        let mut errors = Vec::new();

        let mut vertices = vec![Vertex {
            name: scope.root_name.to_string(),
            kind: VertexKind::Root,
        }];
        for entity in &scope.entities {
            vertices.push(Vertex {
                name: entity.name.clone(),
                kind: entity.kind,
            });
        }
        let index: HashMap<String, usize> = vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.name.clone(), i))
            .collect();

        let attached_to_edges =
            build_attached_to_edges(scope, &vertices, &index, &mut errors);
        validate_cycles(
            "attached_to",
            &scope.name,
            &vertices,
            &attached_to_edges,
            &mut errors,
        );

        let relative_to_edges =
            build_relative_to_edges(scope, &vertices, &index, &mut errors);
        let bare_edges: HashMap<usize, usize> = relative_to_edges
            .iter()
            .map(|(&from, &(to, _))| (from, to))
            .collect();
        validate_cycles("relative_to", &scope.name, &vertices, &bare_edges, &mut errors);

        for joint_ref in &scope.joint_refs {
            let target = resolve_reference(&joint_ref.target, scope.root_name);
            if !index.contains_key(target) && target != WORLD_ROOT_NAME {
                errors.push(SdfError::dangling_reference(
                    joint_ref.relation,
                    &joint_ref.joint,
                    &joint_ref.target,
                    &scope.name,
                ));
            }
        }

        let graphs = Self {
            attached_to: FrameAttachedToGraph {
                scope: scope.name.clone(),
                root_name: scope.root_name,
                vertices: vertices.clone(),
                index: index.clone(),
                edges: attached_to_edges,
                canonical_link: scope.canonical_link.clone(),
            },
            relative_to: PoseRelativeToGraph {
                scope: scope.name.clone(),
                root_name: scope.root_name,
                vertices,
                index,
                edges: relative_to_edges,
            },
        };
        (graphs, errors)
    }
}

/// One outgoing attachment edge per frame vertex.
fn build_attached_to_edges(
    scope: &Scope,
    vertices: &[Vertex],
    index: &HashMap<String, usize>,
    errors: &mut Vec<SdfError>,
) -> HashMap<usize, usize> {
    let mut edges = HashMap::new();

    for entity in &scope.entities {
        if !entity.kind.is_frame() {
            continue;
        }
        let from = index[&entity.name];
        let declared = if entity.attached_to.is_empty() {
            if scope.canonical_link.is_empty() {
                scope.root_name
            } else {
                scope.canonical_link.as_str()
            }
        } else {
            resolve_reference(&entity.attached_to, scope.root_name)
        };

        match index.get(declared) {
            // Report the name actually looked up, so a defaulted target
            // (the canonical link) shows up by name rather than as "".
            None => errors.push(SdfError::dangling_reference(
                "attached_to",
                &entity.name,
                declared,
                &scope.name,
            )),
            Some(&to) => {
                if vertices[to].kind == VertexKind::Light {
                    errors.push(SdfError::invalid_attachment(
                        &entity.name,
                        &vertices[to].name,
                        vertices[to].kind.as_str(),
                        &scope.name,
                    ));
                } else {
                    edges.insert(from, to);
                }
            }
        }
    }

    edges
}

/// One outgoing posed edge per non-root vertex.
fn build_relative_to_edges(
    scope: &Scope,
    _vertices: &[Vertex],
    index: &HashMap<String, usize>,
    errors: &mut Vec<SdfError>,
) -> HashMap<usize, (usize, Pose)> {
    let mut edges = HashMap::new();

    for entity in &scope.entities {
        let from = index[&entity.name];
        let declared = if entity.relative_to.is_empty() {
            scope.root_name
        } else {
            resolve_reference(&entity.relative_to, scope.root_name)
        };

        match index.get(declared) {
            None => errors.push(SdfError::dangling_reference(
                "relative_to",
                &entity.name,
                &entity.relative_to,
                &scope.name,
            )),
            Some(&to) => {
                edges.insert(from, (to, entity.pose));
            }
        }
    }

    edges
}

/// Shared cycle detector for both graphs.
///
/// Depth-first walk from every vertex with a per-traversal path set. Each
/// distinct cycle is reported once, naming the edge that closes it;
/// vertices known to lie on or feed into a reported cycle are not walked
/// again, keeping the scan linear and the error list free of duplicates
/// for the same cycle.
fn validate_cycles(
    relation: &'static str,
    scope_name: &str,
    vertices: &[Vertex],
    edges: &HashMap<usize, usize>,
    errors: &mut Vec<SdfError>,
) {
    let mut flagged: HashSet<usize> = HashSet::new();
    let mut terminated: HashSet<usize> = HashSet::new();

    for start in 0..vertices.len() {
        if flagged.contains(&start) || terminated.contains(&start) {
            continue;
        }

        let mut path: Vec<usize> = Vec::new();
        let mut on_path: HashSet<usize> = HashSet::new();
        let mut cur = start;
        loop {
            path.push(cur);
            on_path.insert(cur);

            let Some(&next) = edges.get(&cur) else {
                // Sink (root / non-frame terminal) or a dangling edge
                // reported during construction.
                terminated.extend(path);
                break;
            };
            if on_path.contains(&next) {
                errors.push(SdfError::cycle(
                    relation,
                    &vertices[cur].name,
                    &vertices[next].name,
                    scope_name,
                ));
                flagged.extend(path);
                break;
            }
            if flagged.contains(&next) {
                flagged.extend(path);
                break;
            }
            if terminated.contains(&next) {
                terminated.extend(path);
                break;
            }
            cur = next;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::{SdfFrame, SdfJoint, SdfLight, SdfLink, SdfPose};
    use approx::assert_relative_eq;

    fn build_model(model: &SdfModel) -> (ScopeGraphs, Vec<SdfError>) {
        let (scope, mut errors) = Scope::from_model(model);
        let (graphs, mut build_errors) = ScopeGraphs::build(&scope);
        errors.append(&mut build_errors);
        (graphs, errors)
    }

    fn build_world(world: &SdfWorld) -> (ScopeGraphs, Vec<SdfError>) {
        let (scope, mut errors) = Scope::from_world(world);
        let (graphs, mut build_errors) = ScopeGraphs::build(&scope);
        errors.append(&mut build_errors);
        (graphs, errors)
    }

    #[test]
    fn test_duplicate_name_detected() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("X"))
            .with_frame(SdfFrame::new("X"));

        let (_, errors) = build_model(&model);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SdfError::DuplicateName { .. }));
        assert!(errors[0].to_string().contains("link"));
        assert!(errors[0].to_string().contains("frame"));
    }

    #[test]
    fn test_frame_defaults_to_canonical_link() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(SdfFrame::new("F"));

        let (graphs, errors) = build_model(&model);
        assert!(errors.is_empty());
        assert_eq!(graphs.attached_to.canonical_link(), "L");
        assert_eq!(graphs.attached_to.attached_to("F"), Some("L"));
        assert_eq!(graphs.attached_to.resolve_attached_to_body("F").unwrap(), "L");
    }

    #[test]
    fn test_frame_defaults_to_root_without_links() {
        let model = SdfModel::new("m").with_frame(SdfFrame::new("F"));

        let (graphs, errors) = build_model(&model);
        assert!(errors.is_empty());
        assert_eq!(graphs.attached_to.canonical_link(), "");
        assert_eq!(graphs.attached_to.attached_to("F"), Some(MODEL_ROOT_NAME));
    }

    #[test]
    fn test_canonical_link_attribute_override() {
        let mut model = SdfModel::new("m")
            .with_link(SdfLink::new("L1"))
            .with_link(SdfLink::new("L2"))
            .with_frame(SdfFrame::new("F"));
        model.canonical_link = "L2".to_string();

        let (graphs, errors) = build_model(&model);
        assert!(errors.is_empty());
        assert_eq!(graphs.attached_to.attached_to("F"), Some("L2"));
    }

    #[test]
    fn test_canonical_link_attribute_dangling() {
        let mut model = SdfModel::new("m").with_link(SdfLink::new("L"));
        model.canonical_link = "missing".to_string();

        let (_, errors) = build_model(&model);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SdfError::DanglingReference { .. }));
    }

    #[test]
    fn test_dangling_canonical_link_named_in_frame_error() {
        // A frame defaulting onto a dangling canonical link reports the
        // defaulted name it looked up, not an empty target.
        let mut model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(SdfFrame::new("F"));
        model.canonical_link = "missing".to_string();

        let (_, errors) = build_model(&model);
        assert_eq!(errors.len(), 2);
        let frame_error = errors
            .iter()
            .find(|e| matches!(e, SdfError::DanglingReference { origin, .. } if origin == "F"))
            .expect("frame error");
        match frame_error {
            SdfError::DanglingReference { target, .. } => assert_eq!(target, "missing"),
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn test_relative_to_defaults_to_root() {
        let model = SdfModel::new("m").with_link(SdfLink::new("L"));

        let (graphs, errors) = build_model(&model);
        assert!(errors.is_empty());
        assert_eq!(graphs.relative_to.relative_to("L"), Some(MODEL_ROOT_NAME));
        assert_eq!(graphs.relative_to.relative_to(MODEL_ROOT_NAME), None);
    }

    #[test]
    fn test_attached_to_chain_through_frames() {
        // F1 -> P (link), F2 -> C, F3 -> J, F4 -> F3: chains may pass
        // through frames and terminate at links or joints.
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("P"))
            .with_link(SdfLink::new("C"))
            .with_joint(SdfJoint::new("J").with_parent_child("P", "C"))
            .with_frame(SdfFrame::new("F1").with_attached_to("P"))
            .with_frame(SdfFrame::new("F2").with_attached_to("C"))
            .with_frame(SdfFrame::new("F3").with_attached_to("J"))
            .with_frame(SdfFrame::new("F4").with_attached_to("F3"));

        let (graphs, errors) = build_model(&model);
        assert!(errors.is_empty(), "unexpected: {errors:?}");
        assert_eq!(graphs.attached_to.attached_to("F4"), Some("F3"));
        assert_eq!(graphs.attached_to.resolve_attached_to_body("F4").unwrap(), "J");
        assert_eq!(graphs.attached_to.resolve_attached_to_body("F2").unwrap(), "C");
        // Non-frame vertices resolve to themselves.
        assert_eq!(graphs.attached_to.resolve_attached_to_body("P").unwrap(), "P");
    }

    #[test]
    fn test_attached_to_self_cycle() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(SdfFrame::new("F4").with_attached_to("F4"));

        let (_, errors) = build_model(&model);
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            SdfError::Cycle { relation, origin, repeated, .. } => {
                assert_eq!(*relation, "attached_to");
                assert_eq!(origin, "F4");
                assert_eq!(repeated, "F4");
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_attached_to_two_cycle_reported_once() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(SdfFrame::new("A").with_attached_to("B"))
            .with_frame(SdfFrame::new("B").with_attached_to("A"));

        let (_, errors) = build_model(&model);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SdfError::Cycle { .. }));
    }

    #[test]
    fn test_attached_to_dangling() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(SdfFrame::new("F3").with_attached_to("A"));

        let (_, errors) = build_model(&model);
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            SdfError::DanglingReference { relation, origin, target, .. } => {
                assert_eq!(*relation, "attached_to");
                assert_eq!(origin, "F3");
                assert_eq!(target, "A");
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn test_relative_to_cycle_and_dangling_both_reported() {
        // Two independent mistakes in one scope come back in one pass.
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(
                SdfFrame::new("F").with_pose(SdfPose::relative_to(Pose::identity(), "A")),
            )
            .with_frame(
                SdfFrame::new("cycle").with_pose(SdfPose::relative_to(Pose::identity(), "cycle")),
            );

        let (_, errors) = build_model(&model);
        let dangling = errors
            .iter()
            .filter(|e| matches!(e, SdfError::DanglingReference { .. }))
            .count();
        let cycles = errors
            .iter()
            .filter(|e| matches!(e, SdfError::Cycle { .. }))
            .count();
        assert_eq!(dangling, 1);
        assert_eq!(cycles, 1);
    }

    #[test]
    fn test_relative_to_termination_bound() {
        // Every vertex reaches the root in at most vertex_count hops.
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(SdfFrame::new("F0").with_pose(SdfPose::relative_to(Pose::identity(), "L")))
            .with_frame(SdfFrame::new("F1").with_pose(SdfPose::relative_to(Pose::identity(), "F0")))
            .with_frame(SdfFrame::new("F2").with_pose(SdfPose::relative_to(Pose::identity(), "F1")));

        let (graphs, errors) = build_model(&model);
        assert!(errors.is_empty());
        for name in ["L", "F0", "F1", "F2"] {
            graphs.relative_to.resolve_pose(name).expect("should reach root");
        }
    }

    #[test]
    fn test_pose_composition_two_frames() {
        // F1 posed (1,1,0) in the root; F2 posed (1,0,0, yaw=pi/2) in F1.
        let yaw = std::f64::consts::FRAC_PI_2;
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(
                SdfFrame::new("F1").with_pose(SdfPose::new(Pose::from_translation(1.0, 1.0, 0.0))),
            )
            .with_frame(SdfFrame::new("F2").with_pose(SdfPose::relative_to(
                Pose::from_translation_rpy(1.0, 0.0, 0.0, 0.0, 0.0, yaw),
                "F1",
            )));

        let (graphs, errors) = build_model(&model);
        assert!(errors.is_empty());

        let resolved = graphs.relative_to.resolve_pose("F2").expect("should resolve");
        // Hand-computed product: translation (1,1,0) + (1,0,0), rotation yaw.
        assert_relative_eq!(resolved.position.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(resolved.position.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(resolved.position.z, 0.0, epsilon = 1e-12);
        let (_, _, resolved_yaw) = resolved.euler_angles();
        assert_relative_eq!(resolved_yaw, yaw, epsilon = 1e-10);
    }

    #[test]
    fn test_pose_resolution_intermediate_target() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(
                SdfFrame::new("F1").with_pose(SdfPose::new(Pose::from_translation(5.0, 0.0, 0.0))),
            )
            .with_frame(SdfFrame::new("F2").with_pose(SdfPose::relative_to(
                Pose::from_translation(0.0, 3.0, 0.0),
                "F1",
            )));

        let (graphs, errors) = build_model(&model);
        assert!(errors.is_empty());

        let in_f1 = graphs.relative_to.resolve_pose_in("F2", "F1").expect("should resolve");
        assert_relative_eq!(in_f1.position.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(in_f1.position.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pose_resolution_unreachable_target() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(SdfFrame::new("F1"))
            .with_frame(SdfFrame::new("F2"));

        let (graphs, errors) = build_model(&model);
        assert!(errors.is_empty());

        // F2 is not on F1's path to the root.
        let result = graphs.relative_to.resolve_pose_in("F1", "F2");
        assert!(matches!(result, Err(SdfError::UnreachableTarget { .. })));

        // Unknown names are unreachable too.
        let result = graphs.relative_to.resolve_pose("nope");
        assert!(matches!(result, Err(SdfError::UnreachableTarget { .. })));
    }

    #[test]
    fn test_world_frames_attached_to_model() {
        let world = SdfWorld::new("w")
            .with_model(SdfModel::new("M1").with_link(SdfLink::new("L")))
            .with_frame(SdfFrame::new("F0"))
            .with_frame(SdfFrame::new("F1").with_attached_to("F0"))
            .with_frame(SdfFrame::new("F2").with_attached_to("M1"));

        let (graphs, errors) = build_world(&world);
        assert!(errors.is_empty(), "unexpected: {errors:?}");
        // World scope has no canonical link; unattached frames default to
        // the world root.
        assert_eq!(graphs.attached_to.attached_to("F0"), Some(WORLD_ROOT_NAME));
        assert_eq!(graphs.attached_to.attached_to("F2"), Some("M1"));
        assert_eq!(graphs.attached_to.resolve_attached_to_body("F1").unwrap(), WORLD_ROOT_NAME);
        assert_eq!(graphs.attached_to.resolve_attached_to_body("F2").unwrap(), "M1");
    }

    #[test]
    fn test_frame_attached_to_light_rejected() {
        let world = SdfWorld::new("w")
            .with_light(SdfLight::new("sun"))
            .with_frame(SdfFrame::new("F").with_attached_to("sun"));

        let (_, errors) = build_world(&world);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SdfError::InvalidAttachment { .. }));
    }

    #[test]
    fn test_world_light_relative_to_frame() {
        let world = SdfWorld::new("w")
            .with_frame(
                SdfFrame::new("F0").with_pose(SdfPose::new(Pose::from_translation(0.0, 0.0, 2.0))),
            )
            .with_light(SdfLight::new("lamp").with_pose(SdfPose::relative_to(
                Pose::from_translation(1.0, 0.0, 0.0),
                "F0",
            )));

        let (graphs, errors) = build_world(&world);
        assert!(errors.is_empty());
        let resolved = graphs.relative_to.resolve_pose("lamp").expect("should resolve");
        assert_relative_eq!(resolved.position.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(resolved.position.z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_slash_reference_addresses_scope_root() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(SdfFrame::new("F").with_pose(SdfPose::relative_to(
                Pose::from_translation(1.0, 1.0, 0.0),
                "/world",
            )));

        let (graphs, errors) = build_model(&model);
        assert!(errors.is_empty());
        assert_eq!(graphs.relative_to.relative_to("F"), Some(MODEL_ROOT_NAME));
    }

    #[test]
    fn test_misspelled_slash_reference_dangles() {
        // Only the exact form "/world" is absolute; a typo must not be
        // silently accepted as the scope root.
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("L"))
            .with_frame(SdfFrame::new("F").with_pose(SdfPose::relative_to(
                Pose::from_translation(1.0, 1.0, 0.0),
                "/wrold",
            )));

        let (graphs, errors) = build_model(&model);
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            SdfError::DanglingReference { relation, target, .. } => {
                assert_eq!(*relation, "relative_to");
                assert_eq!(target, "/wrold");
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
        assert_eq!(graphs.relative_to.relative_to("F"), None);
    }

    #[test]
    fn test_joint_dangling_parent_child() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("A"))
            .with_joint(SdfJoint::new("J").with_parent_child("A", "missing"));

        let (_, errors) = build_model(&model);
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            SdfError::DanglingReference { relation, origin, target, .. } => {
                assert_eq!(*relation, "joint child");
                assert_eq!(origin, "J");
                assert_eq!(target, "missing");
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn test_joint_world_parent_allowed() {
        let model = SdfModel::new("m")
            .with_link(SdfLink::new("A"))
            .with_joint(SdfJoint::new("J").with_parent_child("world", "A"));

        let (_, errors) = build_model(&model);
        assert!(errors.is_empty(), "unexpected: {errors:?}");
    }

    #[test]
    fn test_nested_model_vertex_in_parent_scope() {
        let model = SdfModel::new("outer")
            .with_link(SdfLink::new("base"))
            .with_model(
                SdfModel::new("inner")
                    .with_link(SdfLink::new("L"))
                    .with_pose(SdfPose::relative_to(Pose::from_translation(0.0, 1.0, 0.0), "base")),
            )
            .with_frame(SdfFrame::new("F").with_attached_to("inner"));

        let (graphs, errors) = build_model(&model);
        assert!(errors.is_empty(), "unexpected: {errors:?}");
        assert!(graphs.relative_to.contains("inner"));
        // The inner model's own link is not a vertex of the outer scope.
        assert!(!graphs.relative_to.contains("L"));
        assert_eq!(graphs.attached_to.resolve_attached_to_body("F").unwrap(), "inner");
    }
}
