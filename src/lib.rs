//! SDF (Simulation Description Format) document loader with frame-graph
//! semantics.
//!
//! This crate parses [SDF](http://sdformat.org/) XML describing worlds,
//! models, links, joints, frames, and lights, then builds and validates
//! the two directed graphs that give SDF poses their meaning:
//!
//! - the **attached-to graph**, encoding which body each explicit frame is
//!   rigidly attached to, and
//! - the **relative-to graph**, encoding which frame each pose literal is
//!   expressed in.
//!
//! Validation is exhaustive: every dangling reference, duplicate name,
//! invalid attachment, and cycle in a document is reported in one pass
//! rather than stopping at the first problem. Scopes that validate share
//! their graphs with the DOM for read-only pose resolution; scopes that do
//! not stay structurally accessible while resolved accessors return
//! structured errors.
//!
//! # Example
//!
//! ```
//! use sdf_dom::load_sdf_str;
//!
//! let sdf = r#"
//!     <sdf version="1.7">
//!       <model name="arm">
//!         <link name="base"/>
//!         <frame name="tool" attached_to="base">
//!           <pose>0 0 0.5 0 0 0</pose>
//!         </frame>
//!       </model>
//!     </sdf>
//! "#;
//!
//! let (root, errors) = load_sdf_str(sdf).expect("should load");
//! assert!(errors.is_empty());
//!
//! let model = root.model_by_name("arm").expect("model");
//! let tool = model.frame_by_name("tool").expect("frame");
//! assert_eq!(tool.attached_to_body().expect("resolves"), "base");
//! let pose = tool.pose_in_scope().expect("resolves");
//! assert_eq!(pose.position.z, 0.5);
//! ```
//!
//! # Supported SDF Elements
//!
//! - `<sdf version="...">` - Root element
//! - `<world name="...">` - World scope: models, frames, lights
//! - `<model name="..." canonical_link="...">` - Model scope: links,
//!   joints, frames, nested models
//! - `<link name="...">` - Rigid body (pose only; geometry is skipped)
//! - `<joint name="..." type="...">` - Joint with `<parent>` / `<child>`
//! - `<frame name="..." attached_to="...">` - Explicit coordinate frame
//! - `<light name="..." type="...">` - World light (posed, not attachable)
//! - `<pose relative_to="...">x y z roll pitch yaw</pose>`
//!
//! # Limitations
//!
//! - Geometry, visuals, collisions, sensors, and physics settings are
//!   skipped, not loaded
//! - `<include>` files are not supported
//! - Cross-scope name paths (`a::b`) are not supported

#![doc(html_root_url = "https://docs.rs/sdf-dom/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::unnested_or_patterns,
    clippy::similar_names,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_wraps,
    clippy::redundant_closure_for_method_calls,
    clippy::should_implement_trait,
    clippy::items_after_statements,
    clippy::unnecessary_lazy_evaluations,
    clippy::needless_pass_by_value,
    clippy::map_unwrap_or,
    clippy::option_if_let_else,
    clippy::unused_self,
    clippy::redundant_pattern_matching,
    clippy::doc_markdown,
    clippy::cast_sign_loss,
    clippy::field_reassign_with_default,
    clippy::suboptimal_flops,
    clippy::derivable_impls,
    clippy::too_many_lines,
    clippy::too_many_arguments,
    clippy::struct_field_names,
    clippy::use_self
)]

mod error;
mod graph;
mod loader;
mod parser;
mod pose;
mod types;

// Re-export main types
pub use error::{Result, SdfError};
pub use graph::{
    FrameAttachedToGraph, MODEL_ROOT_NAME, PoseRelativeToGraph, ScopeGraphs, Vertex, VertexKind,
    WORLD_ROOT_NAME,
};
pub use loader::{load_sdf_file, load_sdf_str};
pub use parser::parse_sdf_str;
pub use pose::{Pose, parse_pose};
pub use types::{SdfFrame, SdfJoint, SdfLight, SdfLink, SdfModel, SdfPose, SdfRoot, SdfWorld};
