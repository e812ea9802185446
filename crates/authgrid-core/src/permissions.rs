//! Permission registry and packed-permission codec.
//!
//! The embedding application defines a fixed enumeration of
//! permissions, each with a unique numeric code in `[1, 65535]`.
//! A permission set is stored and transported as a *packed* string,
//! one character per permission, where the character's scalar value is
//! the permission's code. Code 0 is reserved as an error sentinel, and
//! the UTF-16 surrogate range cannot be represented as a Rust `char`,
//! so both are rejected.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    #[error("invalid permission data: '{name}' has unencodable code {code}")]
    InvalidPermissionData { name: String, code: u16 },

    #[error("duplicate permission name: {0}")]
    DuplicateName(String),

    #[error("duplicate permission code: {0}")]
    DuplicateCode(u16),
}

/// One entry of the application-defined permission enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDef {
    pub name: String,
    /// Unique code in `[1, 65535]`; becomes the packed character.
    pub code: u16,
    /// Optional display grouping, e.g. for admin UIs.
    pub display_group: Option<String>,
    /// Marks a permission whose grant deserves an extra warning;
    /// surfaced only through the `on_advanced` packing callback.
    pub advanced: bool,
}

impl PermissionDef {
    pub fn new(name: impl Into<String>, code: u16) -> Self {
        Self {
            name: name.into(),
            code,
            display_group: None,
            advanced: false,
        }
    }

    fn encode(&self) -> Result<char, PermissionError> {
        char::from_u32(u32::from(self.code))
            .filter(|_| self.code != 0)
            .ok_or(PermissionError::InvalidPermissionData {
                name: self.name.clone(),
                code: self.code,
            })
    }
}

/// Builder for a validated [`PermissionSet`].
#[derive(Debug, Default)]
pub struct PermissionSetBuilder {
    defs: Vec<PermissionDef>,
}

impl PermissionSetBuilder {
    pub fn permission(mut self, name: impl Into<String>, code: u16) -> Self {
        self.defs.push(PermissionDef::new(name, code));
        self
    }

    pub fn permission_in_group(
        mut self,
        name: impl Into<String>,
        code: u16,
        group: impl Into<String>,
    ) -> Self {
        let mut def = PermissionDef::new(name, code);
        def.display_group = Some(group.into());
        self.defs.push(def);
        self
    }

    pub fn advanced(mut self, name: impl Into<String>, code: u16) -> Self {
        let mut def = PermissionDef::new(name, code);
        def.advanced = true;
        self.defs.push(def);
        self
    }

    /// Validate and build. Rejects duplicate names, duplicate codes,
    /// the reserved code 0, and surrogate-range codes.
    pub fn build(self) -> Result<PermissionSet, PermissionError> {
        for def in &self.defs {
            def.encode()?;
        }
        let mut names = HashMap::new();
        let mut codes = HashMap::new();
        for (index, def) in self.defs.iter().enumerate() {
            if names.insert(def.name.clone(), index).is_some() {
                return Err(PermissionError::DuplicateName(def.name.clone()));
            }
            if codes.insert(def.code, index).is_some() {
                return Err(PermissionError::DuplicateCode(def.code));
            }
        }
        Ok(PermissionSet {
            defs: self.defs,
            by_name: names,
            by_code: codes,
        })
    }
}

/// The immutable permission enumeration plus both lookup directions.
#[derive(Debug, Clone)]
pub struct PermissionSet {
    defs: Vec<PermissionDef>,
    by_name: HashMap<String, usize>,
    by_code: HashMap<u16, usize>,
}

impl PermissionSet {
    pub fn builder() -> PermissionSetBuilder {
        PermissionSetBuilder::default()
    }

    /// Build without validation. A misconfigured enumeration (code 0,
    /// surrogate codes) then surfaces as [`PermissionError`] at pack
    /// time instead of construction time.
    pub fn from_defs(defs: Vec<PermissionDef>) -> Self {
        let by_name = defs
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();
        let by_code = defs.iter().enumerate().map(|(i, d)| (d.code, i)).collect();
        Self {
            defs,
            by_name,
            by_code,
        }
    }

    pub fn defs(&self) -> &[PermissionDef] {
        &self.defs
    }

    pub fn find(&self, name: &str) -> Option<&PermissionDef> {
        self.by_name.get(name).map(|&i| &self.defs[i])
    }

    pub fn find_by_code(&self, code: u16) -> Option<&PermissionDef> {
        self.by_code.get(&code).map(|&i| &self.defs[i])
    }

    /// Pack permission names into the compact string form.
    ///
    /// Duplicate names are packed as given; deduplication is the
    /// responsibility of the final merge (see the claims calculator).
    pub fn pack<I>(&self, names: I) -> Result<String, PermissionError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut packed = String::new();
        for name in names {
            let name = name.as_ref();
            let def = self
                .find(name)
                .ok_or_else(|| PermissionError::UnknownPermission(name.into()))?;
            packed.push(def.encode()?);
        }
        Ok(packed)
    }

    /// Pack, reporting each invalid name through `on_invalid` instead
    /// of failing the whole operation, and signalling each packed
    /// advanced permission through `on_advanced`.
    pub fn pack_with_validation<I>(
        &self,
        names: I,
        mut on_invalid: impl FnMut(&str),
        mut on_advanced: impl FnMut(&PermissionDef),
    ) -> String
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut packed = String::new();
        for name in names {
            let name = name.as_ref();
            let Some(def) = self.find(name) else {
                on_invalid(name);
                continue;
            };
            match def.encode() {
                Ok(ch) => {
                    if def.advanced {
                        on_advanced(def);
                    }
                    packed.push(ch);
                }
                Err(_) => on_invalid(name),
            }
        }
        packed
    }

    /// Unpack a packed string back into permission names.
    ///
    /// Characters with no matching code are silently dropped so that a
    /// grant outlives the removal of a permission from the
    /// enumeration.
    pub fn unpack(&self, packed: &str) -> Vec<String> {
        packed
            .chars()
            .filter_map(|ch| u16::try_from(u32::from(ch)).ok())
            .filter_map(|code| self.find_by_code(code))
            .map(|def| def.name.clone())
            .collect()
    }
}

/// Union of packed strings, deduplicated by character value and keeping
/// first-occurrence order. Used wherever packed permissions from
/// several roles merge into one effective set.
pub fn union_packed(packed_strings: impl IntoIterator<Item = String>) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut union = String::new();
    for packed in packed_strings {
        for ch in packed.chars() {
            if seen.insert(ch) {
                union.push(ch);
            }
        }
    }
    union
}
