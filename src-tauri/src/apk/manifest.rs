//! Manifest field extraction
//!
//! Walks the decoded XML events and picks out the four fields shown in the
//! results table. Values that are resource references are resolved against
//! `resources.arsc` when one is available.

use crate::error::{ApkMetaError, ApkMetaResult};

use super::arsc::ResourceTable;
use super::axml::{parse_xml, XmlAttribute, XmlEvent};
use super::types::*;
use super::PackageInfo;

/// Raw manifest fields before resource resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub package: Option<String>,
    pub version_code: Option<AttrValue>,
    pub version_name: Option<AttrValue>,
    /// `<application android:label>`
    pub application_label: Option<AttrValue>,
    /// Label of the first activity handling MAIN/LAUNCHER
    pub launcher_label: Option<AttrValue>,
}

/// Activity being walked, until its end tag
#[derive(Default)]
struct ActivityScan {
    label: Option<AttrValue>,
    launcher: bool,
    filter_main: bool,
    filter_launcher: bool,
}

impl Manifest {
    /// Decode binary XML and extract manifest fields
    pub fn parse(data: &[u8]) -> ApkMetaResult<Self> {
        Self::from_events(&parse_xml(data)?)
    }

    pub fn from_events(events: &[XmlEvent]) -> ApkMetaResult<Self> {
        let mut manifest = Manifest::default();
        let mut stack: Vec<&str> = Vec::new();
        let mut activity: Option<ActivityScan> = None;

        for event in events {
            match event {
                XmlEvent::Start { name, attributes } => {
                    let parent = stack.last().copied();
                    match (parent, name.as_str()) {
                        (None, "manifest") => {
                            manifest.package = attributes
                                .iter()
                                .find(|a| a.name == "package" && a.namespace.is_none())
                                .and_then(text_of);
                            manifest.version_code =
                                android_attr(attributes, "versionCode", ATTR_VERSION_CODE);
                            manifest.version_name =
                                android_attr(attributes, "versionName", ATTR_VERSION_NAME);
                        }
                        (None, other) => {
                            return Err(ApkMetaError::parse(format!(
                                "Root element is <{}>, not <manifest>",
                                other
                            )));
                        }
                        (Some("manifest"), "application") => {
                            manifest.application_label =
                                android_attr(attributes, "label", ATTR_LABEL);
                        }
                        (Some("application"), "activity" | "activity-alias") => {
                            activity = Some(ActivityScan {
                                label: android_attr(attributes, "label", ATTR_LABEL),
                                ..Default::default()
                            });
                        }
                        (Some("activity" | "activity-alias"), "intent-filter") => {
                            if let Some(scan) = activity.as_mut() {
                                scan.filter_main = false;
                                scan.filter_launcher = false;
                            }
                        }
                        (Some("intent-filter"), "action") => {
                            if let Some(scan) = activity.as_mut() {
                                scan.filter_main |= android_name_is(attributes, ACTION_MAIN);
                            }
                        }
                        (Some("intent-filter"), "category") => {
                            if let Some(scan) = activity.as_mut() {
                                scan.filter_launcher |= android_name_is(attributes, CATEGORY_LAUNCHER);
                            }
                        }
                        _ => {}
                    }
                    stack.push(name.as_str());
                }
                XmlEvent::End { name } => {
                    match name.as_str() {
                        "intent-filter" => {
                            if let Some(scan) = activity.as_mut() {
                                scan.launcher |= scan.filter_main && scan.filter_launcher;
                            }
                        }
                        "activity" | "activity-alias" => {
                            if let Some(scan) = activity.take() {
                                if scan.launcher && manifest.launcher_label.is_none() {
                                    manifest.launcher_label = scan.label;
                                }
                            }
                        }
                        _ => {}
                    }
                    stack.pop();
                }
            }
        }

        if events.is_empty() {
            return Err(ApkMetaError::parse("Manifest contains no elements"));
        }
        Ok(manifest)
    }

    /// Resolve references and produce the parser output
    ///
    /// A reference that cannot be resolved is shown as `@XXXXXXXX`.
    pub fn resolve(&self, table: Option<&ResourceTable>) -> PackageInfo {
        let resolve = |value: &Option<AttrValue>| -> Option<String> {
            match value.as_ref()? {
                AttrValue::Text(text) => Some(text.clone()),
                AttrValue::Reference(id) => table
                    .and_then(|t| t.resolve_string(*id).ok().flatten())
                    .or_else(|| Some(format!("@{:08X}", id))),
            }
        };

        let label = self.application_label.as_ref().or(self.launcher_label.as_ref()).cloned();

        PackageInfo {
            package_name: self.package.clone(),
            app_name: resolve(&label),
            version_name: resolve(&self.version_name),
            version_code: resolve(&self.version_code),
        }
    }
}

fn text_of(attr: &XmlAttribute) -> Option<String> {
    match attr.value.as_ref()? {
        AttrValue::Text(text) => Some(text.clone()),
        AttrValue::Reference(_) => None,
    }
}

fn android_attr(attributes: &[XmlAttribute], name: &str, id: u32) -> Option<AttrValue> {
    attributes
        .iter()
        .find(|a| a.is_android_attr(name, id))
        .and_then(|a| a.value.clone())
}

fn android_name_is(attributes: &[XmlAttribute], expected: &str) -> bool {
    matches!(
        android_attr(attributes, "name", ATTR_NAME),
        Some(AttrValue::Text(ref text)) if text == expected
    )
}
