//! Constructs: the typed data holders the execution engine populates.
//!
//! A description file declares three kinds of construct: a [`Root`] (a build
//! target aggregating modules and build parameters), a [`Module`] (one
//! compilation unit with outputs and dependencies), and a [`Schema`] (a
//! reusable template a module can instantiate from). Roots and modules hold
//! their state in named [`Field`]s; schemas hold unexecuted statement bodies.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::dsl::ast::Program;
use crate::engine::field::{Field, FieldError, FieldValueRef};
use crate::engine::types::{
    Architecture, InvalidEnumValue, LanguageStandard, Optimization, OutputType, Platform,
    RuntimeLibraries,
};

/// Field names of a [`Root`] construct.
pub mod root_fields {
    pub const PATH: &str = "Path";
    pub const CONFIGURATIONS: &str = "Configurations";
    pub const ARCHITECTURES: &str = "Architectures";
    pub const PLATFORMS: &str = "Platforms";
    pub const MODULES: &str = "Modules";
    pub const MAIN_MODULE: &str = "MainModule";
    pub const BUILD_COMMAND: &str = "BuildCommand";
    pub const REBUILD_COMMAND: &str = "ReBuildCommand";
    pub const CLEAN_COMMAND: &str = "CleanCommand";
}

/// Field names of a [`Module`] construct.
pub mod module_fields {
    pub const PATH: &str = "Path";
    pub const LANGUAGE_STANDARD: &str = "LanguageStandard";
    pub const OUTPUT_TYPE: &str = "OutputType";
    pub const OUTPUT_NAME: &str = "OutputName";
    pub const OUTPUT_PATH: &str = "OutputPath";
    pub const INTERMEDIATE_PATH: &str = "IntermediatePath";
    pub const ROOT_SOURCE_PATHS: &str = "RootSourcePaths";
    pub const SOURCE_FILES: &str = "SourceFiles";
    pub const DEFINITIONS: &str = "Definitions";
    pub const RUNTIME_LIBRARIES: &str = "RuntimeLibraries";
    pub const OPTIMIZATION: &str = "Optimization";
    pub const DEBUG_SYMBOLS: &str = "bDebugSymbols";
    pub const LINKAGES: &str = "Linkages";
    pub const LIBRARIES: &str = "Libraries";
    pub const DEPENDS_ON: &str = "DependsOn";
    pub const INCLUDE_PATHS: &str = "IncludePaths";
    pub const EXPOSED_INCLUDE_PATHS: &str = "ExposedIncludePaths";
}

/// Shared shape of the fielded constructs: a name, the declaring file, and a
/// set of uniquely named fields.
#[derive(Debug, Clone)]
pub struct Construct {
    pub name: String,
    pub filepath: PathBuf,
    fields: BTreeMap<String, Field>,
}

impl Construct {
    fn new(name: String, filepath: PathBuf, fields: Vec<Field>) -> Self {
        let fields = fields
            .into_iter()
            .map(|f| (f.name().to_string(), f))
            .collect();
        Construct {
            name,
            filepath,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Result<&Field, FieldError> {
        self.fields.get(name).ok_or_else(|| FieldError::FieldDoesNotExist {
            field: name.to_string(),
        })
    }

    pub fn field_mut(&mut self, name: &str) -> Result<&mut Field, FieldError> {
        self.fields
            .get_mut(name)
            .ok_or_else(|| FieldError::FieldDoesNotExist {
                field: name.to_string(),
            })
    }

    pub fn assign(&mut self, name: &str, value: FieldValueRef<'_>) -> Result<(), FieldError> {
        self.field_mut(name)?.assign(value)
    }

    pub fn append(&mut self, name: &str, value: FieldValueRef<'_>) -> Result<(), FieldError> {
        self.field_mut(name)?.append(value)
    }

    pub fn erase(&mut self, name: &str, value: FieldValueRef<'_>) -> Result<(), FieldError> {
        self.field_mut(name)?.erase(value)
    }

    pub fn unassign(&mut self, name: &str) -> Result<(), FieldError> {
        self.field_mut(name)?.unassign();
        Ok(())
    }

    pub fn dubious_assign(
        &mut self,
        name: &str,
        value: FieldValueRef<'_>,
    ) -> Result<(), FieldError> {
        self.field_mut(name)?.dubious_assign(value)
    }

    pub fn protect(&mut self, name: &str) -> Result<(), FieldError> {
        self.field_mut(name)?.protect();
        Ok(())
    }

    pub fn protect_all(&mut self) {
        for field in self.fields.values_mut() {
            field.protect();
        }
    }

    pub fn str_of(&self, name: &str) -> Result<&str, FieldError> {
        self.field(name)?.as_str()
    }

    pub fn arr_of(&self, name: &str) -> Result<&[String], FieldError> {
        self.field(name)?.as_array()
    }

    pub fn bool_of(&self, name: &str) -> Result<bool, FieldError> {
        self.field(name)?.as_bool()
    }

    pub fn enum_of<T>(&self, name: &str) -> Result<T, FieldError>
    where
        T: FromStr<Err = InvalidEnumValue>,
    {
        self.field(name)?.as_enum()
    }
}

/// A named build target aggregating modules, configurations, architectures
/// and platforms.
#[derive(Debug, Clone)]
pub struct Root {
    pub construct: Construct,
}

impl Root {
    pub fn new(name: impl Into<String>, filepath: impl Into<PathBuf>) -> Self {
        let filepath = filepath.into();
        let fields = vec![
            Field::string(root_fields::PATH, default_origin(&filepath)),
            Field::array(
                root_fields::CONFIGURATIONS,
                vec!["Debug".to_string(), "Release".to_string()],
            ),
            Field::array(
                root_fields::ARCHITECTURES,
                vec![Architecture::X64.as_str().to_string()],
            ),
            Field::array(
                root_fields::PLATFORMS,
                vec![Platform::host().as_str().to_string()],
            ),
            Field::array(root_fields::MODULES, vec![]),
            Field::string(root_fields::MAIN_MODULE, ""),
            Field::string(root_fields::BUILD_COMMAND, ""),
            Field::string(root_fields::REBUILD_COMMAND, ""),
            Field::string(root_fields::CLEAN_COMMAND, ""),
        ];
        Root {
            construct: Construct::new(name.into(), filepath, fields),
        }
    }

    pub fn name(&self) -> &str {
        &self.construct.name
    }

    pub fn modules(&self) -> Result<&[String], FieldError> {
        self.construct.arr_of(root_fields::MODULES)
    }
}

/// A named compilation unit description with sources, outputs, and
/// dependencies. Optionally instantiated from a [`Schema`] template.
#[derive(Debug, Clone)]
pub struct Module {
    pub construct: Construct,
    /// Name of the schema this module was instantiated from, if any.
    pub template: Option<String>,
}

impl Module {
    pub fn new(name: impl Into<String>, filepath: impl Into<PathBuf>) -> Self {
        let filepath = filepath.into();
        let name = name.into();
        let fields = vec![
            Field::string(module_fields::PATH, default_origin(&filepath)),
            Field::constraint(
                module_fields::LANGUAGE_STANDARD,
                LanguageStandard::Cpp14.as_str(),
                LanguageStandard::NAMES,
            ),
            Field::constraint(
                module_fields::OUTPUT_TYPE,
                OutputType::ConsoleExecutable.as_str(),
                OutputType::NAMES,
            ),
            Field::string(module_fields::OUTPUT_NAME, name.clone()),
            Field::string(module_fields::OUTPUT_PATH, "Binaries"),
            Field::string(module_fields::INTERMEDIATE_PATH, "Intermediate"),
            Field::array(module_fields::ROOT_SOURCE_PATHS, vec![]),
            Field::array(module_fields::SOURCE_FILES, vec![]),
            Field::array(module_fields::DEFINITIONS, vec![]),
            Field::constraint(
                module_fields::RUNTIME_LIBRARIES,
                RuntimeLibraries::UseDebug.as_str(),
                RuntimeLibraries::NAMES,
            ),
            Field::constraint(
                module_fields::OPTIMIZATION,
                Optimization::Off.as_str(),
                Optimization::NAMES,
            ),
            Field::boolean(module_fields::DEBUG_SYMBOLS, false),
            Field::array(module_fields::LINKAGES, vec![]),
            Field::array(module_fields::LIBRARIES, vec![]),
            Field::array(module_fields::DEPENDS_ON, vec![]),
            Field::array(module_fields::INCLUDE_PATHS, vec![]),
            Field::array(module_fields::EXPOSED_INCLUDE_PATHS, vec![]),
        ];
        Module {
            construct: Construct::new(name, filepath, fields),
            template: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.construct.name
    }
}

/// A reusable module template: an ordinary statement body plus at most one
/// deferred body (the single permitted `Defer` block). Neither body executes
/// at declaration; both are cloned and executed per instantiating module.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub filepath: PathBuf,
    pub body: Program,
    pub deferred: Option<Program>,
}

/// The default value of a construct's `Path` field: the directory of the
/// file that declared it.
fn default_origin(filepath: &Path) -> String {
    filepath
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .display()
        .to_string()
}
