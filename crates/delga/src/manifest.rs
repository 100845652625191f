//! Generated game manifest (`*.degame`).
//!
//! Written as the final archive entry so the required-format list
//! reflects the complete scan.

use std::collections::BTreeSet;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use dropforge_protocol::DistributionProfile;
use dropforge_vfs::Vfs;

use crate::{DelgaError, ModuleRegistry};

/// Renders the XML game manifest for `profile`.
///
/// `required_formats` is the merged set of extensions seen during the
/// scan plus the profile's declared required extensions. Icons are
/// re-loaded by path to embed their pixel width as `size` attribute.
pub fn write_manifest(
    vfs: &dyn Vfs,
    profile: &DistributionProfile,
    script_module: &str,
    script_module_version: &str,
    required_formats: &BTreeSet<String>,
    registry: &ModuleRegistry,
) -> Result<Vec<u8>, DelgaError> {
    let mut buf = Vec::new();
    let mut writer = Writer::new_with_indent(&mut buf, b' ', 2);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(&mut writer, Event::Start(BytesStart::new("degame")))?;

    data_tag(&mut writer, "identifier", &profile.identifier_hex())?;
    if !profile.alias_identifier.is_empty() {
        data_tag(&mut writer, "aliasIdentifier", &profile.alias_identifier)?;
    }
    data_tag(&mut writer, "title", &profile.title)?;
    data_tag(&mut writer, "description", &profile.description)?;
    data_tag(&mut writer, "creator", &profile.creator)?;
    data_tag(&mut writer, "homepage", &profile.website)?;

    for icon_path in &profile.icons {
        let data = vfs.read(icon_path)?;
        let icon = image::load_from_memory(&data).map_err(|source| DelgaError::Icon {
            path: icon_path.clone(),
            source,
        })?;
        let mut start = BytesStart::new("icon");
        start.push_attribute(("size", icon.width().to_string().as_str()));
        emit(&mut writer, Event::Start(start))?;
        emit(&mut writer, Event::Text(BytesText::new(icon_path)))?;
        emit(&mut writer, Event::End(BytesEnd::new("icon")))?;
    }

    data_tag(&mut writer, "scriptDirectory", &profile.script_directory)?;
    data_tag(&mut writer, "gameObject", &profile.game_object)?;
    data_tag(&mut writer, "pathConfig", &profile.path_config)?;
    data_tag(&mut writer, "pathCapture", &profile.path_capture)?;

    let mut start = BytesStart::new("scriptModule");
    if !script_module_version.is_empty() {
        start.push_attribute(("version", script_module_version));
    }
    emit(&mut writer, Event::Start(start))?;
    emit(&mut writer, Event::Text(BytesText::new(script_module)))?;
    emit(&mut writer, Event::End(BytesEnd::new("scriptModule")))?;

    if profile.window_size.is_set() {
        let mut start = BytesStart::new("windowSize");
        start.push_attribute(("x", profile.window_size.width.to_string().as_str()));
        start.push_attribute(("y", profile.window_size.height.to_string().as_str()));
        emit(&mut writer, Event::Empty(start))?;
    }

    // Formats without a matching content module are dropped; the
    // launcher could not resolve them anyway.
    for extension in required_formats {
        let Some(module) = registry.find_matching(extension) else {
            tracing::debug!(extension, "no content module, format not listed");
            continue;
        };
        let mut start = BytesStart::new("requireFormat");
        start.push_attribute(("type", module.kind.type_name()));
        emit(&mut writer, Event::Start(start))?;
        emit(&mut writer, Event::Text(BytesText::new(extension)))?;
        emit(&mut writer, Event::End(BytesEnd::new("requireFormat")))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("degame")))?;
    Ok(buf)
}

fn data_tag<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), DelgaError> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn emit<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), DelgaError> {
    writer
        .write_event(event)
        .map_err(|e| DelgaError::Io(std::io::Error::other(e.to_string())))
}
