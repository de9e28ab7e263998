//! The Template Catalog and Character-Class Catalog. Both catalogs are
//! process-wide, read-only after construction, and therefore freely
//! shareable across threads.
//!
//! The default catalog is compiled in as a constant table. A second
//! entry point, [`Catalog::from_toml_str`], accepts a user-supplied
//! catalog document in TOML, so the wire format remains pluggable even
//! though the default never leaves the binary.

use std::collections::HashMap;

use crate::error::{DerivationError, DerivationErrorKind};

/// `V`: uppercase vowel.
const CLASS_V: &str = "AEIOU";
/// `C`: uppercase consonant.
const CLASS_C: &str = "BCDFGHJKLMNPQRSTVWXYZ";
/// `v`: lowercase vowel.
const CLASS_LOWER_V: &str = "aeiou";
/// `c`: lowercase consonant.
const CLASS_LOWER_C: &str = "bcdfghjklmnpqrstvwxyz";
/// `A`: any-case letter, uppercase-biased.
const CLASS_A: &str = "AEIOUBCDFGHJKLMNPQRSTVWXYZ";
/// `a`: any-case letter.
const CLASS_LOWER_A: &str = "AEIOUaeiouBCDFGHJKLMNPQRSTVWXYZbcdfghjklmnpqrstvwxyz";
/// `n`: digit.
const CLASS_N: &str = "0123456789";
/// `o`: special symbol.
const CLASS_O: &str = "@&%?,=[]_:-+*$#!'^~;()/.";

/// A non-empty ordered alphabet keyed by a single class letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterClassCatalog(HashMap<char, String>);

impl CharacterClassCatalog {
    /// The nine character classes of the published Master Password
    /// alphabet. `x` is not hand-copied; it is the literal union of
    /// `A`, `n`, and `o`, so it cannot silently drift from their
    /// definitions.
    pub fn default_catalog() -> Self {
        let mut classes = HashMap::new();
        classes.insert('V', CLASS_V.to_string());
        classes.insert('C', CLASS_C.to_string());
        classes.insert('v', CLASS_LOWER_V.to_string());
        classes.insert('c', CLASS_LOWER_C.to_string());
        classes.insert('A', CLASS_A.to_string());
        classes.insert('a', CLASS_LOWER_A.to_string());
        classes.insert('n', CLASS_N.to_string());
        classes.insert('o', CLASS_O.to_string());
        classes.insert('x', format!("{CLASS_A}{CLASS_N}{CLASS_O}"));
        // The "Phrase" templates use a literal space as a separator; it is
        // its own one-character class so the integrity invariant (every
        // class letter referenced by a template has a catalog entry) holds
        // with no special case in `validate`.
        classes.insert(' ', " ".to_string());
        CharacterClassCatalog(classes)
    }

    pub fn from_table(table: HashMap<char, String>) -> Result<Self, DerivationError> {
        for (letter, chars) in &table {
            if chars.is_empty() {
                return Err(DerivationError::new(
                    DerivationErrorKind::CatalogLoadFailed,
                    format!("character class '{letter}' has an empty alphabet"),
                ));
            }
        }
        Ok(CharacterClassCatalog(table))
    }

    /// Look up the alphabet for a class letter.
    pub fn chars_for(&self, class_letter: char) -> Result<&str, DerivationError> {
        self.0.get(&class_letter).map(String::as_str).ok_or_else(|| {
            DerivationError::new(
                DerivationErrorKind::InvalidTemplate,
                format!("no character class defined for '{class_letter}'"),
            )
        })
    }
}

/// An ordered list of templates for each (class-name, type-name) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCatalog(HashMap<String, HashMap<String, Vec<String>>>);

impl TemplateCatalog {
    /// The published Master Password templates for the eight generated
    /// site types. These strings are part of the cross-implementation
    /// wire contract: reordering or editing them changes every user's
    /// output.
    pub fn default_catalog() -> Self {
        let mut generated = HashMap::new();
        generated.insert(
            "Maximum".to_string(),
            strs(&["anoxxxxxxxxxxxxxxxxx", "axxxxxxxxxxxxxxxxxno"]),
        );
        generated.insert(
            "Long".to_string(),
            strs(&[
                "CvcvnoCvcvCvcv", "CvcvCvcvnoCvcv", "CvcvCvcvCvcvno", "CvccnoCvcvCvcv",
                "CvccCvcvnoCvcv", "CvccCvcvCvcvno", "CvcvnoCvccCvcv", "CvcvCvccnoCvcv",
                "CvcvCvccCvcvno", "CvcvnoCvcvCvcc", "CvcvCvcvnoCvcc", "CvcvCvcvCvccno",
                "CvccnoCvccCvcv", "CvccCvccnoCvcv", "CvccCvccCvcvno", "CvcvnoCvccCvcc",
                "CvcvCvccnoCvcc", "CvcvCvccCvccno", "CvccnoCvcvCvcc", "CvccCvcvnoCvcc",
                "CvccCvcvCvccno",
            ]),
        );
        generated.insert(
            "Medium".to_string(),
            strs(&["CvcnoCvc", "CvcCvcno"]),
        );
        generated.insert(
            "Basic".to_string(),
            strs(&["aaanaaan", "aannaaan", "aaannaaa"]),
        );
        generated.insert("Short".to_string(), strs(&["Cvcn"]));
        generated.insert("PIN".to_string(), strs(&["nnnn"]));
        generated.insert("Name".to_string(), strs(&["cvccvcvcv"]));
        generated.insert(
            "Phrase".to_string(),
            strs(&[
                "cvcc cvc cvccvcv cvc",
                "cvc cvccvcvcv cvcv",
                "cv cvccv cvc cvcvccv",
            ]),
        );

        let mut classes = HashMap::new();
        classes.insert("generated".to_string(), generated);
        TemplateCatalog(classes)
    }

    pub fn from_table(table: HashMap<String, HashMap<String, Vec<String>>>) -> Result<Self, DerivationError> {
        for (class_name, types) in &table {
            for (type_name, templates) in types {
                if templates.is_empty() {
                    return Err(DerivationError::new(
                        DerivationErrorKind::CatalogLoadFailed,
                        format!("{class_name}.{type_name} has no templates"),
                    ));
                }
            }
        }
        Ok(TemplateCatalog(table))
    }

    /// Look up the templates for a `PasswordType`.
    pub fn templates_for(&self, password_type: &PasswordType) -> Result<&[String], DerivationError> {
        self.0
            .get(&password_type.class_name)
            .and_then(|types| types.get(&password_type.type_name))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                DerivationError::new(
                    DerivationErrorKind::UnknownType,
                    format!(
                        "no templates for type {}.{}",
                        password_type.class_name, password_type.type_name
                    ),
                )
            })
    }
}

fn strs(templates: &[&str]) -> Vec<String> {
    templates.iter().map(|s| s.to_string()).collect()
}

/// The tag a derivation request uses to index the Template Catalog.
///
/// `class_name` is `"generated"` for every site type this crate
/// supports, and `type_name` is the capitalized type name (`"Long"`,
/// `"PIN"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PasswordType {
    pub class_name: String,
    pub type_name: String,
}

impl PasswordType {
    pub fn generated(type_name: &str) -> Self {
        PasswordType {
            class_name: "generated".to_string(),
            type_name: type_name.to_string(),
        }
    }
}

/// Both catalogs, bundled so they can be validated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub templates: TemplateCatalog,
    pub classes: CharacterClassCatalog,
}

impl Catalog {
    pub fn default_catalog() -> Self {
        Catalog {
            templates: TemplateCatalog::default_catalog(),
            classes: CharacterClassCatalog::default_catalog(),
        }
    }

    /// Parse a catalog document: one table per class name mapping type
    /// name to a template list, plus a `MPCharacterClasses` table
    /// mapping single-character keys to alphabets.
    pub fn from_toml_str(doc: &str) -> Result<Self, DerivationError> {
        let value: toml::Value = toml::from_str(doc).map_err(|e| {
            DerivationError::new(DerivationErrorKind::CatalogLoadFailed, e.to_string())
        })?;
        let root = value.as_table().ok_or_else(|| {
            DerivationError::new(
                DerivationErrorKind::CatalogLoadFailed,
                "catalog document must be a table",
            )
        })?;

        let mut classes = HashMap::new();
        if let Some(raw) = root.get("MPCharacterClasses") {
            let table = raw.as_table().ok_or_else(|| {
                DerivationError::new(
                    DerivationErrorKind::CatalogLoadFailed,
                    "MPCharacterClasses must be a table",
                )
            })?;
            for (key, value) in table {
                let letter = key.chars().next().ok_or_else(|| {
                    DerivationError::new(
                        DerivationErrorKind::CatalogLoadFailed,
                        "character class key must be one character",
                    )
                })?;
                let chars = value.as_str().ok_or_else(|| {
                    DerivationError::new(
                        DerivationErrorKind::CatalogLoadFailed,
                        format!("character class '{letter}' must be a string"),
                    )
                })?;
                classes.insert(letter, chars.to_string());
            }
        }

        let mut templates = HashMap::new();
        for (class_name, raw_types) in root {
            if class_name == "MPCharacterClasses" {
                continue;
            }
            let type_table = raw_types.as_table().ok_or_else(|| {
                DerivationError::new(
                    DerivationErrorKind::CatalogLoadFailed,
                    format!("{class_name} must be a table of type names"),
                )
            })?;
            let mut types = HashMap::new();
            for (type_name, raw_list) in type_table {
                let array = raw_list.as_array().ok_or_else(|| {
                    DerivationError::new(
                        DerivationErrorKind::CatalogLoadFailed,
                        format!("{class_name}.{type_name} must be a list of templates"),
                    )
                })?;
                let mut list = Vec::with_capacity(array.len());
                for item in array {
                    let template = item.as_str().ok_or_else(|| {
                        DerivationError::new(
                            DerivationErrorKind::CatalogLoadFailed,
                            format!("{class_name}.{type_name} must contain only strings"),
                        )
                    })?;
                    list.push(template.to_string());
                }
                types.insert(type_name.clone(), list);
            }
            templates.insert(class_name.clone(), types);
        }

        let catalog = Catalog {
            templates: TemplateCatalog::from_table(templates)?,
            classes: CharacterClassCatalog::from_table(classes)?,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the integrity invariant: every class letter referenced by
    /// any template has a catalog entry.
    pub fn validate(&self) -> Result<(), DerivationError> {
        for types in self.templates.0.values() {
            for templates in types.values() {
                for template in templates {
                    for class_letter in template.chars() {
                        self.classes.chars_for(class_letter)?;
                    }
                }
            }
        }
        Ok(())
    }
}
