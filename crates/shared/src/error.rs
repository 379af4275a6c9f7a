use thiserror::Error;

/// Reasons a catalog body cannot be turned into a [`crate::domain::CompilerConfigModel`].
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog body is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("catalog is missing the `languages` field")]
    MissingLanguages,
    #[error("catalog lists no languages")]
    NoLanguages,
    #[error("catalog contains a language without an id")]
    MissingLanguageId,
    #[error("language `{language}` appears more than once")]
    DuplicateLanguage { language: String },
    #[error("language `{language}` has no compilers")]
    NoCompilers { language: String },
    #[error("language `{language}` lists compiler `{compiler}` more than once")]
    DuplicateCompiler { language: String, compiler: String },
    #[error("language `{language}` marks {count} compilers as default")]
    MultipleDefaultCompilers { language: String, count: usize },
}
