//! Document loading: parse, build frame graphs, validate, bind facades.
//!
//! Loading is eager: every world and model scope gets its attached-to and
//! relative-to graphs built and validated up front. Scopes that validate
//! cleanly share their graphs with their entities for read-only pose
//! queries; scopes that do not stay structurally accessible (names, raw
//! poses, raw reference strings) while resolved accessors report
//! [`SdfError::GraphInvalid`].

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::error::{Result, SdfError};
use crate::graph::{Scope, ScopeGraphs};
use crate::parser::parse_sdf_str;
use crate::types::{ScopeRef, SdfModel, SdfRoot, SdfWorld};

/// Load an SDF document from a string.
///
/// Returns the document root together with every validation error found in
/// any scope: the error list is exhaustive, not first-error-wins. An empty
/// list means all scopes validated and all resolved-pose accessors are
/// live.
///
/// # Errors
///
/// Returns an error only when the XML itself is malformed; validation
/// problems are reported through the accumulated list instead.
pub fn load_sdf_str(xml: &str) -> Result<(SdfRoot, Vec<SdfError>)> {
    let (mut root, mut errors) = parse_sdf_str(xml)?;

    for world in &mut root.worlds {
        finish_world(world, &mut errors);
    }
    for model in &mut root.models {
        finish_model(model, ScopeRef::default(), &mut errors);
    }

    Ok((root, errors))
}

/// Load an SDF document from a file path.
///
/// # Errors
///
/// Returns an error when the file cannot be read or the XML is malformed.
pub fn load_sdf_file(path: impl AsRef<Path>) -> Result<(SdfRoot, Vec<SdfError>)> {
    let xml = std::fs::read_to_string(path)?;
    load_sdf_str(&xml)
}

/// Build and validate a world's scope, then bind its entities.
fn finish_world(world: &mut SdfWorld, errors: &mut Vec<SdfError>) {
    let (scope, mut scope_errors) = Scope::from_world(world);
    let (graphs, mut build_errors) = ScopeGraphs::build(&scope);
    scope_errors.append(&mut build_errors);

    let valid = scope_errors.is_empty();
    if !valid {
        warn!(
            scope = %world.name,
            count = scope_errors.len(),
            "world scope failed frame-graph validation"
        );
    }
    errors.append(&mut scope_errors);

    world.graphs = valid.then(|| Arc::new(graphs));
    let own = ScopeRef {
        scope: world.name.clone(),
        graphs: world.graphs.clone(),
    };

    for frame in &mut world.frames {
        frame.scope = own.clone();
    }
    for light in &mut world.lights {
        light.scope = own.clone();
    }
    for model in &mut world.models {
        finish_model(model, own.clone(), errors);
    }
}

/// Build and validate a model's scope, then bind its entities.
///
/// The model vertex itself lives in the enclosing scope; its children live
/// in the scope the model introduces. Nested models are finished
/// recursively, so an invalid outer scope does not poison valid inner
/// ones.
fn finish_model(model: &mut SdfModel, enclosing: ScopeRef, errors: &mut Vec<SdfError>) {
    let (scope, mut scope_errors) = Scope::from_model(model);
    let (graphs, mut build_errors) = ScopeGraphs::build(&scope);
    scope_errors.append(&mut build_errors);

    let valid = scope_errors.is_empty();
    if !valid {
        warn!(
            scope = %model.name,
            count = scope_errors.len(),
            "model scope failed frame-graph validation"
        );
    }
    errors.append(&mut scope_errors);

    model.scope = enclosing;
    let own = ScopeRef {
        scope: model.name.clone(),
        graphs: valid.then(|| Arc::new(graphs)),
    };

    for link in &mut model.links {
        link.scope = own.clone();
    }
    for joint in &mut model.joints {
        joint.scope = own.clone();
    }
    for frame in &mut model.frames {
        frame.scope = own.clone();
    }
    for nested in &mut model.models {
        finish_model(nested, own.clone(), errors);
    }
}
