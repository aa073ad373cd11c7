//! An in-memory member reflector.
//!
//! [`StaticCatalog`] holds precomputed [`ClassMetadata`], either registered
//! in code or loaded from a TOML description:
//!
//! ```text
//! TOML text
//!   ↓ serde (DTO layer)
//! CatalogDto
//!   ↓ validate + convert
//! StaticCatalog
//! ```
//!
//! ```toml
//! [[classes]]
//! name = "com.example.ArchitectureTest"
//! tags = ["architecture"]
//! analyze = { packages = ["com.example"] }
//!
//! [[classes.members]]
//! kind = "field"
//! name = "no_cycles"
//!
//! [[classes.members]]
//! kind = "library"
//! name = "layer_rules"
//! class = "com.example.LayerRules"
//! ```

use crate::collaborators::MemberReflector;
use crate::model::{
    AnalysisConfiguration, ClassMetadata, ClassName, DeclaredMember, Ignore, MemberMarkers, Tag,
};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

/// Errors from loading a catalog description.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// TOML deserialization failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A field failed validation.
    #[error("{context}: {message}")]
    Validation {
        /// Where the error occurred (e.g. "classes[0].members[1].name").
        context: String,
        /// What is wrong.
        message: String,
    },

    /// A class is described twice.
    #[error("class {0} is defined more than once")]
    DuplicateClass(ClassName),
}

/// Class metadata registered up front.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    classes: HashMap<ClassName, ClassMetadata>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class, replacing any previous metadata for it.
    #[must_use]
    pub fn with(mut self, metadata: ClassMetadata) -> Self {
        self.insert(metadata);
        self
    }

    /// Registers a class, replacing any previous metadata for it.
    pub fn insert(&mut self, metadata: ClassMetadata) {
        self.classes.insert(metadata.name.clone(), metadata);
    }

    /// Returns the number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if no classes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Parses a catalog from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a class fails validation.
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let dto: CatalogDto = toml::from_str(content)?;
        load(dto)
    }
}

impl MemberReflector for StaticCatalog {
    fn class_metadata(&self, class: &ClassName) -> Option<ClassMetadata> {
        self.classes.get(class).cloned()
    }
}

// ────────────────────────────────────────────
// DTO layer
// ────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct CatalogDto {
    #[serde(default)]
    classes: Vec<ClassDto>,
}

#[derive(Debug, Deserialize)]
struct ClassDto {
    name: String,
    #[serde(default)]
    analyze: Option<AnalysisConfiguration>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    ignore: Option<IgnoreDto>,
    #[serde(default)]
    members: Vec<MemberDto>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IgnoreDto {
    Flag(bool),
    Reason(String),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum MemberDto {
    Field {
        name: String,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        ignore: Option<IgnoreDto>,
    },
    Method {
        name: String,
        #[serde(rename = "static", default = "default_true")]
        is_static: bool,
        #[serde(default)]
        parameters: Vec<String>,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        ignore: Option<IgnoreDto>,
    },
    Library {
        name: String,
        class: String,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        ignore: Option<IgnoreDto>,
    },
}

fn default_true() -> bool {
    true
}

// ────────────────────────────────────────────
// DTO → model
// ────────────────────────────────────────────

fn load(dto: CatalogDto) -> Result<StaticCatalog, CatalogError> {
    let mut catalog = StaticCatalog::new();
    for (i, class) in dto.classes.into_iter().enumerate() {
        let metadata = convert_class(class, i)?;
        if catalog.classes.contains_key(&metadata.name) {
            return Err(CatalogError::DuplicateClass(metadata.name));
        }
        catalog.insert(metadata);
    }
    Ok(catalog)
}

fn convert_class(dto: ClassDto, index: usize) -> Result<ClassMetadata, CatalogError> {
    let ctx = format!("classes[{index}]");
    let name = non_empty(&dto.name, &format!("{ctx}.name"))?;

    let members = dto
        .members
        .into_iter()
        .enumerate()
        .map(|(j, m)| convert_member(m, &format!("{ctx}.members[{j}]")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClassMetadata {
        name: ClassName::new(name),
        analysis: dto.analyze,
        tags: convert_tags(dto.tags),
        ignore: dto.ignore.and_then(convert_ignore),
        members,
    })
}

fn convert_member(dto: MemberDto, ctx: &str) -> Result<DeclaredMember, CatalogError> {
    let member = match dto {
        MemberDto::Field { name, tags, ignore } => DeclaredMember::Field {
            name: non_empty(&name, &format!("{ctx}.name"))?,
            markers: markers(tags, ignore),
        },
        MemberDto::Method {
            name,
            is_static,
            parameters,
            tags,
            ignore,
        } => DeclaredMember::Method {
            name: non_empty(&name, &format!("{ctx}.name"))?,
            is_static,
            parameter_types: parameters,
            markers: markers(tags, ignore),
        },
        MemberDto::Library {
            name,
            class,
            tags,
            ignore,
        } => DeclaredMember::Library {
            name: non_empty(&name, &format!("{ctx}.name"))?,
            class: ClassName::new(non_empty(&class, &format!("{ctx}.class"))?),
            markers: markers(tags, ignore),
        },
    };
    Ok(member)
}

fn non_empty(value: &str, context: &str) -> Result<String, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::Validation {
            context: context.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn markers(tags: Vec<String>, ignore: Option<IgnoreDto>) -> MemberMarkers {
    MemberMarkers {
        tags: convert_tags(tags),
        ignore: ignore.and_then(convert_ignore),
    }
}

fn convert_tags(tags: Vec<String>) -> BTreeSet<Tag> {
    tags.into_iter().map(Tag::new).collect()
}

fn convert_ignore(dto: IgnoreDto) -> Option<Ignore> {
    match dto {
        IgnoreDto::Flag(false) => None,
        IgnoreDto::Flag(true) => Some(Ignore::default()),
        IgnoreDto::Reason(reason) => Some(Ignore::because(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
[[classes]]
name = "com.example.ArchitectureTest"
tags = ["architecture"]
analyze = { packages = ["com.example"], import_options = ["DoNotIncludeTests"] }

[[classes.members]]
kind = "field"
name = "no_cycles"
tags = ["slow"]

[[classes.members]]
kind = "method"
name = "layers"
parameters = ["com.tngtech.archunit.core.domain.JavaClasses"]
ignore = "pending migration"

[[classes.members]]
kind = "library"
name = "shared"
class = "com.example.SharedRules"

[[classes]]
name = "com.example.SharedRules"
ignore = true
"#;

    #[test]
    fn loads_classes_and_members_in_order() {
        let catalog = StaticCatalog::from_toml(CATALOG).expect("valid catalog");
        assert_eq!(catalog.len(), 2);

        let class = catalog
            .class_metadata(&ClassName::new("com.example.ArchitectureTest"))
            .expect("class registered");
        assert!(class.is_rule_class());
        assert_eq!(
            class.analysis,
            Some(
                AnalysisConfiguration::new()
                    .package("com.example")
                    .import_option("DoNotIncludeTests")
            )
        );
        let names: Vec<&str> = class.members.iter().map(DeclaredMember::name).collect();
        assert_eq!(names, vec!["no_cycles", "layers", "shared"]);

        match &class.members[1] {
            DeclaredMember::Method {
                is_static,
                markers,
                ..
            } => {
                assert!(*is_static);
                assert_eq!(
                    markers.ignore.as_ref().and_then(|i| i.reason.as_deref()),
                    Some("pending migration")
                );
            }
            other => panic!("expected method, got {other:?}"),
        }
    }

    #[test]
    fn ignore_flag_without_reason() {
        let catalog = StaticCatalog::from_toml(CATALOG).expect("valid catalog");
        let library = catalog
            .class_metadata(&ClassName::new("com.example.SharedRules"))
            .expect("library registered");
        assert!(!library.is_rule_class());
        assert_eq!(library.ignore, Some(Ignore::default()));
    }

    #[test]
    fn rejects_empty_member_name() {
        let toml = r#"
[[classes]]
name = "com.example.A"

[[classes.members]]
kind = "field"
name = ""
"#;
        let err = StaticCatalog::from_toml(toml).unwrap_err();
        assert_eq!(err.to_string(), "classes[0].members[0].name: must not be empty");
    }

    #[test]
    fn rejects_duplicate_class() {
        let toml = r#"
[[classes]]
name = "com.example.A"

[[classes]]
name = "com.example.A"
"#;
        assert!(matches!(
            StaticCatalog::from_toml(toml),
            Err(CatalogError::DuplicateClass(_))
        ));
    }

    #[test]
    fn unknown_class_is_none() {
        assert!(StaticCatalog::new()
            .class_metadata(&ClassName::new("com.example.Missing"))
            .is_none());
    }
}
