//! # Semantics Library Extraction
//!
//! A semantics document is a nested tree of field definitions. Fields of
//! type `library` list the sub-content types an author may choose from, as
//! option strings like `"H5P.Text 1.1"`. Those are optional dependencies of
//! the library owning the document, at any nesting depth.
//!
//! Only three shapes matter when walking the tree:
//!
//! - `{ "type": "library", "options": ["Machine.Name major.minor", ...] }`
//! - `{ "fields": [ ... ] }` (group or list of subfields)
//! - `{ "field": { ... } }` (single nested field, e.g. a list item template)
//!
//! Everything else is opaque. In particular `options` of non-library fields
//! (select lists) are never interpreted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::library::DependencyRef;

const LIBRARY_TYPE: &str = "library";

/// One node of a semantics tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticsField {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<SemanticsField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<Box<SemanticsField>>,
}

impl SemanticsField {
    pub fn is_library(&self) -> bool {
        self.field_type.as_deref() == Some(LIBRARY_TYPE)
    }

    /// A `library` field offering the given option strings.
    pub fn library(options: &[&str]) -> Self {
        Self {
            field_type: Some(LIBRARY_TYPE.to_string()),
            options: Some(options.iter().map(|o| Value::from(*o)).collect()),
            ..Default::default()
        }
    }

    /// A group field wrapping `fields`.
    pub fn group(fields: Vec<SemanticsField>) -> Self {
        Self {
            field_type: Some("group".to_string()),
            fields: Some(fields),
            ..Default::default()
        }
    }

    /// A list field whose item template is `field`.
    pub fn list(field: SemanticsField) -> Self {
        Self {
            field_type: Some("list".to_string()),
            field: Some(Box::new(field)),
            ..Default::default()
        }
    }
}

/// Parse a semantics document (a JSON array of fields).
pub fn parse(text: &str) -> Result<Vec<SemanticsField>> {
    Ok(serde_json::from_str(text)?)
}

/// Collect every library reference embedded in `fields`, depth first, in
/// document order.
///
/// Fails on the first malformed option; a partially extracted list is never
/// returned.
pub fn extract(fields: &[SemanticsField]) -> Result<Vec<DependencyRef>> {
    let mut refs = Vec::new();
    collect(fields, &mut refs)?;
    Ok(refs)
}

fn collect(fields: &[SemanticsField], refs: &mut Vec<DependencyRef>) -> Result<()> {
    for field in fields {
        if field.is_library() {
            for option in field.options.iter().flatten() {
                refs.push(parse_option_value(option)?);
            }
        }
        if let Some(children) = &field.fields {
            collect(children, refs)?;
        }
        if let Some(child) = &field.field {
            collect(std::slice::from_ref(child.as_ref()), refs)?;
        }
    }
    Ok(())
}

fn parse_option_value(option: &Value) -> Result<DependencyRef> {
    match option {
        Value::String(s) => parse_option(s),
        other => Err(Error::MalformedSemanticsOption {
            option: other.to_string(),
            message: "library options must be strings".to_string(),
        }),
    }
}

/// Parse `"Machine.Name major.minor"` into a dependency edge.
pub fn parse_option(option: &str) -> Result<DependencyRef> {
    let malformed = |message: &str| Error::MalformedSemanticsOption {
        option: option.to_string(),
        message: message.to_string(),
    };

    let (machine_name, version) = option
        .split_once(' ')
        .ok_or_else(|| malformed("expected \"<machineName> <major>.<minor>\""))?;
    if machine_name.is_empty() {
        return Err(malformed("empty machine name"));
    }
    let (major, minor) = version
        .split_once('.')
        .ok_or_else(|| malformed("version must be <major>.<minor>"))?;
    let major = major
        .parse::<u32>()
        .map_err(|_| malformed("major version is not a number"))?;
    let minor = minor
        .parse::<u32>()
        .map_err(|_| malformed("minor version is not a number"))?;

    Ok(DependencyRef::new(machine_name, major, minor))
}

/// Whether any well-formed `library` option in `fields` names `machine_name`.
fn mentions(fields: &[SemanticsField], machine_name: &str) -> bool {
    fields.iter().any(|field| {
        let own = field.is_library()
            && field
                .options
                .iter()
                .flatten()
                .filter_map(Value::as_str)
                .filter_map(|option| parse_option(option).ok())
                .any(|dep| dep.machine_name == machine_name);
        own || field
            .fields
            .as_deref()
            .is_some_and(|children| mentions(children, machine_name))
            || field
                .field
                .as_deref()
                .is_some_and(|child| mentions(std::slice::from_ref(child), machine_name))
    })
}

/// Rewrite every `library` option naming `machine_name` in a raw semantics
/// document so it references `minor_version`.
///
/// Returns the number of option strings that changed. Malformed options are
/// left as they are.
pub fn rewrite_library_options(doc: &mut Value, machine_name: &str, minor_version: u32) -> usize {
    let mut changed = 0;
    rewrite_node(doc, machine_name, minor_version, &mut changed);
    changed
}

fn rewrite_node(node: &mut Value, machine_name: &str, minor_version: u32, changed: &mut usize) {
    match node {
        Value::Array(items) => {
            for item in items {
                rewrite_node(item, machine_name, minor_version, changed);
            }
        }
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some(LIBRARY_TYPE) {
                if let Some(Value::Array(options)) = map.get_mut("options") {
                    for option in options.iter_mut() {
                        let Value::String(text) = option else {
                            continue;
                        };
                        let Ok(mut dep) = parse_option(text) else {
                            continue;
                        };
                        if dep.machine_name == machine_name && dep.minor_version != minor_version
                        {
                            dep.minor_version = minor_version;
                            *text = dep.to_string();
                            *changed += 1;
                        }
                    }
                }
            }
            if let Some(fields) = map.get_mut("fields") {
                rewrite_node(fields, machine_name, minor_version, changed);
            }
            if let Some(field) = map.get_mut("field") {
                rewrite_node(field, machine_name, minor_version, changed);
            }
        }
        _ => {}
    }
}

/// A parsed semantics tree plus the raw document, for write-back.
#[derive(Debug, Clone)]
pub struct SemanticsDocument {
    fields: Vec<SemanticsField>,
    raw: Value,
}

impl SemanticsDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text)?;
        let fields = serde_json::from_value(raw.clone())?;
        Ok(Self { fields, raw })
    }

    /// Library references in this document; see [`extract`].
    pub fn library_refs(&self) -> Result<Vec<DependencyRef>> {
        extract(&self.fields)
    }

    /// Whether any `library` option of this document names `machine_name`.
    pub fn references(&self, machine_name: &str) -> bool {
        mentions(&self.fields, machine_name)
    }

    /// See [`rewrite_library_options`].
    pub fn retarget_library(&mut self, machine_name: &str, minor_version: u32) -> Result<usize> {
        let changed = rewrite_library_options(&mut self.raw, machine_name, minor_version);
        if changed > 0 {
            self.fields = serde_json::from_value(self.raw.clone())?;
        }
        Ok(changed)
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.raw)?;
        text.push('\n');
        Ok(text)
    }
}
