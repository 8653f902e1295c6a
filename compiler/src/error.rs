use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("Unknown target language \"{0}\" (expected one of cpp, rust, java, go, csharp, swift)")]
    UnknownLanguage(String),

    #[error("{language} bindings do not support {format}")]
    UnsupportedFormat {
        language: String,
        format:   String,
    },
}
