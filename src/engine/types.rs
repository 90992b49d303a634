//! Enumerated build parameter and module option types.
//!
//! Each enum is the typed face of a constraint field: the field stores the
//! canonical string, these types give the rest of the engine something to
//! match on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{value}' is not one of the allowed values: {allowed:?}")]
pub struct InvalidEnumValue {
    pub value: String,
    pub allowed: &'static [&'static str],
}

macro_rules! constraint_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];
            pub const NAMES: &'static [&'static str] = &[$($text,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = InvalidEnumValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(InvalidEnumValue {
                        value: other.to_string(),
                        allowed: $name::NAMES,
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

constraint_enum! {
    /// C++ language standard a module compiles against.
    LanguageStandard {
        Cpp11 => "Cpp11",
        Cpp14 => "Cpp14",
        Cpp17 => "Cpp17",
        Cpp20 => "Cpp20",
        Cpp23 => "Cpp23",
    }
}

constraint_enum! {
    /// What kind of binary a module produces.
    OutputType {
        ConsoleExecutable => "ConsoleExecutable",
        WindowedExecutable => "WindowedExecutable",
        StaticLibrary => "StaticLibrary",
        DynamicLibrary => "DynamicLibrary",
    }
}

impl OutputType {
    pub fn is_executable(&self) -> bool {
        matches!(
            self,
            OutputType::ConsoleExecutable | OutputType::WindowedExecutable
        )
    }
}

constraint_enum! {
    /// Which C/C++ runtime library flavor to link.
    RuntimeLibraries {
        UseDebug => "UseDebug",
        UseRelease => "UseRelease",
    }
}

constraint_enum! {
    /// Optimization level for a module's translation units.
    Optimization {
        Off => "Off",
        Balanced => "Balanced",
        Smallest => "Smallest",
        Fastest => "Fastest",
        Full => "Full",
    }
}

constraint_enum! {
    /// Target CPU architecture.
    Architecture {
        X64 => "x64",
        Arm64 => "ARM64",
        X86 => "x86",
    }
}

impl Architecture {
    /// The architecture of the machine running the tool.
    pub fn host() -> Architecture {
        if cfg!(target_arch = "aarch64") {
            Architecture::Arm64
        } else if cfg!(target_arch = "x86") {
            Architecture::X86
        } else {
            Architecture::X64
        }
    }
}

constraint_enum! {
    /// Target operating system.
    Platform {
        Windows => "Windows",
        Linux => "Linux",
    }
}

impl Platform {
    /// The platform the tool is running on.
    pub fn host() -> Platform {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Token a dynamic library uses to export symbols on this platform.
    pub fn dll_export_token(&self) -> &'static str {
        match self {
            Platform::Windows => "__declspec(dllexport)",
            Platform::Linux => "__attribute__((visibility(\"default\")))",
        }
    }

    /// Token a consumer uses to import symbols from a dynamic library.
    pub fn dll_import_token(&self) -> &'static str {
        match self {
            Platform::Windows => "__declspec(dllimport)",
            Platform::Linux => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for standard in LanguageStandard::ALL {
            assert_eq!(standard.as_str().parse(), Ok(*standard));
        }
        for arch in Architecture::ALL {
            assert_eq!(arch.as_str().parse(), Ok(*arch));
        }
    }

    #[test]
    fn test_invalid_value_lists_allowed() {
        let err = "Cpp99".parse::<LanguageStandard>().unwrap_err();
        assert_eq!(err.value, "Cpp99");
        assert!(err.allowed.contains(&"Cpp14"));
    }

    #[test]
    fn test_executable_classification() {
        assert!(OutputType::ConsoleExecutable.is_executable());
        assert!(OutputType::WindowedExecutable.is_executable());
        assert!(!OutputType::StaticLibrary.is_executable());
        assert!(!OutputType::DynamicLibrary.is_executable());
    }

    #[test]
    fn test_architecture_enumeration_is_exhaustive() {
        assert_eq!(Architecture::ALL.len(), 3);
        assert_eq!(Architecture::Arm64.as_str(), "ARM64");
    }
}
