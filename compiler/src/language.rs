use std::fmt;
use std::str::FromStr;

use sdgen_schema::WireFormat;

use crate::{
    error::CompilerError,
    gen_cpp::CppEmitter,
    gen_cs::CSharpEmitter,
    gen_go::GoEmitter,
    gen_java::JavaEmitter,
    gen_rust::RustEmitter,
    gen_swift::SwiftEmitter,
    traits::Emitter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Cpp,
    Rust,
    Java,
    Go,
    CSharp,
    Swift,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Cpp,
        Language::Rust,
        Language::Java,
        Language::Go,
        Language::CSharp,
        Language::Swift,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::Cpp    => "cpp",
            Language::Rust   => "rust",
            Language::Java   => "java",
            Language::Go     => "go",
            Language::CSharp => "csharp",
            Language::Swift  => "swift",
        }
    }

    /// Conventional source file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Language::Cpp    => "hpp",
            Language::Rust   => "rs",
            Language::Java   => "java",
            Language::Go     => "go",
            Language::CSharp => "cs",
            Language::Swift  => "swift",
        }
    }

    pub fn emitter(self, options: &EmitterOptions) -> Box<dyn Emitter> {
        match self {
            Language::Cpp    => Box::new(CppEmitter),
            Language::Rust   => Box::new(RustEmitter),
            Language::Java   => Box::new(JavaEmitter::new(options.java_package.clone())),
            Language::Go     => Box::new(GoEmitter::new(options.go_package.clone())),
            Language::CSharp => Box::new(CSharpEmitter::new(options.cs_namespace.clone())),
            Language::Swift  => Box::new(SwiftEmitter),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = CompilerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpp" | "c++" | "cxx"  => Ok(Language::Cpp),
            "rust" | "rs"          => Ok(Language::Rust),
            "java"                 => Ok(Language::Java),
            "go" | "golang"        => Ok(Language::Go),
            "csharp" | "cs" | "c#" => Ok(Language::CSharp),
            "swift"                => Ok(Language::Swift),
            other => Err(CompilerError::UnknownLanguage(other.to_string())),
        }
    }
}

/// Per-language knobs that do not change the generated types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterOptions {
    pub go_package:   String,
    pub java_package: Option<String>,
    pub cs_namespace: Option<String>,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        EmitterOptions {
            go_package:   "model".to_string(),
            java_package: None,
            cs_namespace: None,
        }
    }
}

/// Look up whether `language` generates code for `format`.
pub fn check_format(language: Language, format: WireFormat) -> Result<(), CompilerError> {
    if language.emitter(&EmitterOptions::default()).supports(format) {
        Ok(())
    } else {
        Err(CompilerError::UnsupportedFormat {
            language: language.name().to_string(),
            format:   format.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("C++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("cs".parse::<Language>().unwrap(), Language::CSharp);
        assert_eq!("golang".parse::<Language>().unwrap(), Language::Go);
        assert!(matches!("cobol".parse::<Language>(), Err(CompilerError::UnknownLanguage(_))));
    }

    #[test]
    fn test_names_round_trip() {
        for language in Language::ALL {
            assert_eq!(language.name().parse::<Language>().unwrap(), language);
            assert_eq!(language.emitter(&EmitterOptions::default()).language(), language);
        }
    }

    #[test]
    fn test_swift_is_json_only() {
        assert!(check_format(Language::Swift, WireFormat::Json).is_ok());
        assert!(check_format(Language::Swift, WireFormat::Xml).is_err());
        assert!(check_format(Language::Go, WireFormat::Yaml).is_ok());
    }
}
