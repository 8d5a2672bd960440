//! SDF XML parser.
//!
//! Parses SDF XML into the DOM types. Structural problems that do not
//! prevent parsing the rest of the document (a missing `name` attribute, a
//! malformed pose literal) are accumulated as soft errors; malformed XML
//! aborts the parse.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;
use tracing::warn;

use crate::error::{Result, SdfError};
use crate::pose::{Pose, parse_pose};
use crate::types::{SdfFrame, SdfJoint, SdfLight, SdfLink, SdfModel, SdfPose, SdfRoot, SdfWorld};

/// Parse an SDF string into a document root.
///
/// Returns the root together with the soft errors encountered while
/// parsing. The caller decides whether soft errors are fatal.
///
/// # Errors
///
/// Returns an error if the XML is malformed or has no `<sdf>` root element.
pub fn parse_sdf_str(xml: &str) -> Result<(SdfRoot, Vec<SdfError>)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    parse_sdf_reader(&mut reader)
}

/// Parse SDF from a reader.
fn parse_sdf_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<(SdfRoot, Vec<SdfError>)> {
    let mut buf = Vec::new();
    let mut root: Option<SdfRoot> = None;
    let mut errors = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"sdf" => {
                root = Some(parse_root(reader, e, &mut errors)?);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(SdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    let root = root.ok_or_else(|| SdfError::XmlParse("missing <sdf> root element".into()))?;
    Ok((root, errors))
}

/// Parse the sdf root element and its children.
fn parse_root<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    errors: &mut Vec<SdfError>,
) -> Result<SdfRoot> {
    let mut root = SdfRoot::default();
    root.version = get_attribute_opt(start, "version").unwrap_or_default();
    if root.version.is_empty() {
        errors.push(SdfError::missing_attribute("version", "sdf"));
    }

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"world" => {
                        if let Some(world) = parse_world(reader, e, errors)? {
                            root.push_world(world);
                        }
                    }
                    b"model" => {
                        if let Some(model) = parse_model(reader, e, errors)? {
                            root.push_model(model);
                        }
                    }
                    _ => skip_element(reader, &elem_name)?,
                }
            }
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"world" => {
                    if let Some(name) = require_name(e, "world", errors) {
                        root.push_world(SdfWorld::new(name));
                    }
                }
                b"model" => {
                    if let Some(model) = parse_model_attrs(e, errors) {
                        root.push_model(model);
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"sdf" => break,
            Ok(Event::Eof) => return Err(SdfError::XmlParse("unexpected EOF in sdf".into())),
            Ok(_) => {}
            Err(e) => return Err(SdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(root)
}

/// Parse a world element and its children.
fn parse_world<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    errors: &mut Vec<SdfError>,
) -> Result<Option<SdfWorld>> {
    let Some(name) = require_name(start, "world", errors) else {
        skip_element(reader, b"world")?;
        return Ok(None);
    };
    let mut world = SdfWorld::new(name);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"model" => {
                        if let Some(model) = parse_model(reader, e, errors)? {
                            world.push_model(model);
                        }
                    }
                    b"frame" => {
                        if let Some(frame) = parse_frame(reader, e, errors)? {
                            world.push_frame(frame);
                        }
                    }
                    b"light" => {
                        if let Some(light) = parse_light(reader, e, errors)? {
                            world.push_light(light);
                        }
                    }
                    // Skip elements outside the kinematic structure
                    // (physics, scene, gui, plugins, ...).
                    _ => skip_element(reader, &elem_name)?,
                }
            }
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"model" => {
                    if let Some(model) = parse_model_attrs(e, errors) {
                        world.push_model(model);
                    }
                }
                b"frame" => {
                    if let Some(frame) = parse_frame_attrs(e, errors) {
                        world.push_frame(frame);
                    }
                }
                b"light" => {
                    if let Some(light) = parse_light_attrs(e, errors) {
                        world.push_light(light);
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"world" => break,
            Ok(Event::Eof) => return Err(SdfError::XmlParse("unexpected EOF in world".into())),
            Ok(_) => {}
            Err(e) => return Err(SdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(Some(world))
}

/// Parse a model element (top-level or nested) and its children.
fn parse_model<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    errors: &mut Vec<SdfError>,
) -> Result<Option<SdfModel>> {
    let Some(mut model) = parse_model_attrs(start, errors) else {
        skip_element(reader, b"model")?;
        return Ok(None);
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"link" => {
                        if let Some(link) = parse_link(reader, e, errors)? {
                            model.push_link(link);
                        }
                    }
                    b"joint" => {
                        if let Some(joint) = parse_joint(reader, e, errors)? {
                            model.push_joint(joint);
                        }
                    }
                    b"frame" => {
                        if let Some(frame) = parse_frame(reader, e, errors)? {
                            model.push_frame(frame);
                        }
                    }
                    b"model" => {
                        if let Some(nested) = parse_model(reader, e, errors)? {
                            model.push_model(nested);
                        }
                    }
                    b"pose" => {
                        model.pose = Some(parse_pose_element(reader, e, errors)?);
                    }
                    _ => skip_element(reader, &elem_name)?,
                }
            }
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"link" => {
                    if let Some(name) = require_name(e, "link", errors) {
                        model.push_link(SdfLink::new(name));
                    }
                }
                b"joint" => {
                    if let Some(joint) = parse_joint_attrs(e, errors) {
                        model.push_joint(joint);
                    }
                }
                b"frame" => {
                    if let Some(frame) = parse_frame_attrs(e, errors) {
                        model.push_frame(frame);
                    }
                }
                b"model" => {
                    if let Some(nested) = parse_model_attrs(e, errors) {
                        model.push_model(nested);
                    }
                }
                b"pose" => {
                    model.pose = Some(parse_pose_attrs(e));
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"model" => break,
            Ok(Event::Eof) => return Err(SdfError::XmlParse("unexpected EOF in model".into())),
            Ok(_) => {}
            Err(e) => return Err(SdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(Some(model))
}

/// Parse model attributes only (used for self-closing models too).
fn parse_model_attrs(e: &BytesStart, errors: &mut Vec<SdfError>) -> Option<SdfModel> {
    let name = require_name(e, "model", errors)?;
    let mut model = SdfModel::new(name);
    model.canonical_link = get_attribute_opt(e, "canonical_link").unwrap_or_default();
    Some(model)
}

/// Parse a link element.
fn parse_link<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    errors: &mut Vec<SdfError>,
) -> Result<Option<SdfLink>> {
    let Some(name) = require_name(start, "link", errors) else {
        skip_element(reader, b"link")?;
        return Ok(None);
    };
    let mut link = SdfLink::new(name);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                if elem_name == b"pose" {
                    link.pose = Some(parse_pose_element(reader, e, errors)?);
                } else {
                    // Visual, collision, inertial, sensors: outside the
                    // kinematic structure.
                    skip_element(reader, &elem_name)?;
                }
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"pose" => {
                link.pose = Some(parse_pose_attrs(e));
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"link" => break,
            Ok(Event::Eof) => return Err(SdfError::XmlParse("unexpected EOF in link".into())),
            Ok(_) => {}
            Err(e) => return Err(SdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(Some(link))
}

/// Parse a joint element.
fn parse_joint<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    errors: &mut Vec<SdfError>,
) -> Result<Option<SdfJoint>> {
    let Some(mut joint) = parse_joint_attrs(start, errors) else {
        skip_element(reader, b"joint")?;
        return Ok(None);
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"parent" => joint.parent = read_element_text(reader, b"parent")?,
                    b"child" => joint.child = read_element_text(reader, b"child")?,
                    b"pose" => joint.pose = Some(parse_pose_element(reader, e, errors)?),
                    _ => skip_element(reader, &elem_name)?,
                }
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"pose" => {
                joint.pose = Some(parse_pose_attrs(e));
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"joint" => break,
            Ok(Event::Eof) => return Err(SdfError::XmlParse("unexpected EOF in joint".into())),
            Ok(_) => {}
            Err(e) => return Err(SdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(Some(joint))
}

/// Parse joint attributes only (used for self-closing joints too; a joint
/// without `<parent>`/`<child>` children is flagged at graph-build time).
fn parse_joint_attrs(e: &BytesStart, errors: &mut Vec<SdfError>) -> Option<SdfJoint> {
    let name = require_name(e, "joint", errors)?;
    let mut joint = SdfJoint::new(name);
    joint.joint_type = get_attribute_opt(e, "type").unwrap_or_default();
    Some(joint)
}

/// Parse a frame element.
fn parse_frame<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    errors: &mut Vec<SdfError>,
) -> Result<Option<SdfFrame>> {
    let Some(mut frame) = parse_frame_attrs(start, errors) else {
        skip_element(reader, b"frame")?;
        return Ok(None);
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                if elem_name == b"pose" {
                    frame.pose = Some(parse_pose_element(reader, e, errors)?);
                } else {
                    skip_element(reader, &elem_name)?;
                }
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"pose" => {
                frame.pose = Some(parse_pose_attrs(e));
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"frame" => break,
            Ok(Event::Eof) => return Err(SdfError::XmlParse("unexpected EOF in frame".into())),
            Ok(_) => {}
            Err(e) => return Err(SdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(Some(frame))
}

/// Parse frame attributes only (used for self-closing frames too).
fn parse_frame_attrs(e: &BytesStart, errors: &mut Vec<SdfError>) -> Option<SdfFrame> {
    let name = require_name(e, "frame", errors)?;
    let mut frame = SdfFrame::new(name);
    frame.attached_to = get_attribute_opt(e, "attached_to").unwrap_or_default();
    Some(frame)
}

/// Parse a light element.
fn parse_light<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    errors: &mut Vec<SdfError>,
) -> Result<Option<SdfLight>> {
    let Some(mut light) = parse_light_attrs(start, errors) else {
        skip_element(reader, b"light")?;
        return Ok(None);
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let elem_name = e.name().as_ref().to_vec();
                if elem_name == b"pose" {
                    light.pose = Some(parse_pose_element(reader, e, errors)?);
                } else {
                    skip_element(reader, &elem_name)?;
                }
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"pose" => {
                light.pose = Some(parse_pose_attrs(e));
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"light" => break,
            Ok(Event::Eof) => return Err(SdfError::XmlParse("unexpected EOF in light".into())),
            Ok(_) => {}
            Err(e) => return Err(SdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(Some(light))
}

/// Parse light attributes only (used for self-closing lights too).
fn parse_light_attrs(e: &BytesStart, errors: &mut Vec<SdfError>) -> Option<SdfLight> {
    let name = require_name(e, "light", errors)?;
    let mut light = SdfLight::new(name);
    if let Some(light_type) = get_attribute_opt(e, "type") {
        light.light_type = light_type;
    }
    Some(light)
}

/// Parse a pose element: `relative_to` attribute plus a six-number text
/// literal. A malformed literal is a soft error and falls back to identity.
fn parse_pose_element<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    errors: &mut Vec<SdfError>,
) -> Result<SdfPose> {
    let relative_to = get_attribute_opt(start, "relative_to").unwrap_or_default();
    let text = read_element_text(reader, b"pose")?;
    let value = match parse_pose(&text) {
        Ok(pose) => pose,
        Err(err) => {
            warn!(literal = %text, "malformed pose literal, using identity");
            errors.push(err);
            Pose::identity()
        }
    };
    Ok(SdfPose { relative_to, value })
}

/// A self-closing `<pose/>` carries only the attribute; the literal is
/// identity.
fn parse_pose_attrs(e: &BytesStart) -> SdfPose {
    SdfPose {
        relative_to: get_attribute_opt(e, "relative_to").unwrap_or_default(),
        value: Pose::identity(),
    }
}

/// Read the `name` attribute, recording a soft error when absent.
fn require_name(e: &BytesStart, element: &str, errors: &mut Vec<SdfError>) -> Option<String> {
    match get_attribute_opt(e, "name") {
        Some(name) if !name.is_empty() => Some(name),
        _ => {
            warn!(element, "element without name attribute, skipping");
            errors.push(SdfError::missing_attribute("name", element));
            None
        }
    }
}

/// Get an attribute value as a string, if present.
fn get_attribute_opt(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return String::from_utf8(attr.value.to_vec()).ok();
        }
    }
    None
}

/// Read the text content of the current element up to its end tag.
fn read_element_text<R: BufRead>(reader: &mut Reader<R>, name: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(ref t)) => {
                text = t
                    .unescape()
                    .map_err(|e| SdfError::XmlParse(e.to_string()))?
                    .into_owned();
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == name => break,
            Ok(Event::Eof) => {
                return Err(SdfError::XmlParse(format!(
                    "unexpected EOF in {}",
                    String::from_utf8_lossy(name)
                )));
            }
            Ok(_) => {}
            Err(e) => return Err(SdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(text)
}

/// Skip an element and all of its children.
fn skip_element<R: BufRead>(reader: &mut Reader<R>, name: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == name => {
                depth += 1;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == name => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(SdfError::XmlParse(e.to_string())),
        }
        buf.clear();
    }

    Ok(())
}
