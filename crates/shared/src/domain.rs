use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(LanguageId);
id_newtype!(CompilerId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerInfo {
    pub id: CompilerId,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub default_args: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageConfig {
    pub id: LanguageId,
    pub name: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub allow_custom_args: bool,
    #[serde(default, alias = "defaultSource", skip_serializing_if = "Option::is_none")]
    pub default_code: Option<String>,
    #[serde(default, alias = "monacoLanguage", skip_serializing_if = "Option::is_none")]
    pub editor_language: Option<String>,
    #[serde(default)]
    pub compilers: Vec<CompilerInfo>,
}

impl LanguageConfig {
    /// Compiler flagged `default`, falling back to the first listed one.
    ///
    /// Validated catalogs always carry at least one compiler per language, so
    /// this only returns `None` for hand-built configs that skipped validation.
    pub fn default_compiler(&self) -> Option<&CompilerInfo> {
        self.compilers
            .iter()
            .find(|compiler| compiler.default)
            .or_else(|| self.compilers.first())
    }

    pub fn compiler(&self, id: &str) -> Option<&CompilerInfo> {
        self.compilers.iter().find(|compiler| compiler.id.as_str() == id)
    }

    pub fn has_compiler(&self, id: &CompilerId) -> bool {
        self.compilers.iter().any(|compiler| &compiler.id == id)
    }

    pub fn editor_language(&self) -> &str {
        self.editor_language
            .as_deref()
            .unwrap_or_else(|| self.id.as_str())
    }

    pub fn default_source(&self) -> &str {
        self.default_code.as_deref().unwrap_or_default()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.id.as_str().trim().is_empty() {
            return Err(CatalogError::MissingLanguageId);
        }
        if self.compilers.is_empty() {
            return Err(CatalogError::NoCompilers {
                language: self.id.to_string(),
            });
        }

        let mut seen = HashSet::new();
        for compiler in &self.compilers {
            if !seen.insert(compiler.id.as_str()) {
                return Err(CatalogError::DuplicateCompiler {
                    language: self.id.to_string(),
                    compiler: compiler.id.to_string(),
                });
            }
        }

        let defaults = self.compilers.iter().filter(|c| c.default).count();
        if defaults > 1 {
            return Err(CatalogError::MultipleDefaultCompilers {
                language: self.id.to_string(),
                count: defaults,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    languages: Option<Vec<LanguageConfig>>,
}

/// Validated language catalog. Construction goes through [`CompilerConfigModel::new`]
/// or [`CompilerConfigModel::from_json`], so every instance has at least one
/// language and every language at least one compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerConfigModel {
    languages: Vec<LanguageConfig>,
}

impl CompilerConfigModel {
    pub fn new(languages: Vec<LanguageConfig>) -> Result<Self, CatalogError> {
        if languages.is_empty() {
            return Err(CatalogError::NoLanguages);
        }

        let mut seen = HashSet::new();
        for language in &languages {
            language.validate()?;
            if !seen.insert(language.id.as_str()) {
                return Err(CatalogError::DuplicateLanguage {
                    language: language.id.to_string(),
                });
            }
        }
        Ok(Self { languages })
    }

    pub fn from_json(body: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(body)?;
        let languages = raw.languages.ok_or(CatalogError::MissingLanguages)?;
        Self::new(languages)
    }

    pub fn languages(&self) -> &[LanguageConfig] {
        &self.languages
    }

    pub fn language(&self, id: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|language| language.id.as_str() == id)
    }

    pub fn default_language(&self) -> &LanguageConfig {
        &self.languages[0]
    }

    /// Stock Java and C++ entries used when no remote catalog is wanted.
    pub fn builtin() -> Self {
        Self {
            languages: vec![
                LanguageConfig {
                    id: "java".into(),
                    name: "Java".to_string(),
                    extension: "java".to_string(),
                    allow_custom_args: false,
                    default_code: Some(JAVA_STARTER.to_string()),
                    editor_language: None,
                    compilers: vec![CompilerInfo {
                        id: "javac".into(),
                        name: "javac".to_string(),
                        path: "javac".to_string(),
                        version: String::new(),
                        default_args: String::new(),
                        default: true,
                    }],
                },
                LanguageConfig {
                    id: "cpp".into(),
                    name: "C++".to_string(),
                    extension: "cpp".to_string(),
                    allow_custom_args: true,
                    default_code: Some(CPP_STARTER.to_string()),
                    editor_language: None,
                    compilers: vec![
                        CompilerInfo {
                            id: "cl".into(),
                            name: "MSVC".to_string(),
                            path: "cl".to_string(),
                            version: String::new(),
                            default_args: "/O2".to_string(),
                            default: true,
                        },
                        CompilerInfo {
                            id: "g++".into(),
                            name: "G++".to_string(),
                            path: "g++".to_string(),
                            version: String::new(),
                            default_args: "-O2".to_string(),
                            default: false,
                        },
                    ],
                },
            ],
        }
    }
}

const JAVA_STARTER: &str = r#"public class TestClass {
    private int number = 42;

    public int getNumber() {
        return number;
    }

    public static void main(String[] args) {
        System.out.println(new TestClass().getNumber());
    }
}"#;

const CPP_STARTER: &str = r#"#include <cstdio>
int main() {
    int number = 42;
    printf("%d\n", number);
}"#;
