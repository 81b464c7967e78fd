use std::path::Path;

use serde_yaml::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Mapping file not found: {0}")]
    NotFound(String),
    #[error("Malformed mapping document: {0}")]
    Malformed(String),
    #[error("IO error reading mapping: {0}")]
    Io(#[from] std::io::Error),
}

/// The category ruleset: an ordered tree of topcat → seccat → patterns.
/// Declaration order is match precedence: first match wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    pub topcats: Vec<TopCat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopCat {
    pub name: String,
    pub seccats: Vec<SecCat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecCat {
    pub name: String,
    pub patterns: Vec<String>,
}

/// One row of the tabular mapping representation. Comments exist only in this
/// form: the YAML document carries structure, the sheet carries annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingRow {
    pub topcat: String,
    pub seccat: String,
    pub pattern: String,
    pub comment: Option<String>,
}

impl Mapping {
    /// Load the ruleset from a YAML file with a top-level `mapping` key.
    pub fn load(path: &Path) -> Result<Mapping, MappingError> {
        let doc = match std::fs::read_to_string(path) {
            Ok(doc) => doc,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MappingError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Mapping::from_yaml(&doc)
    }

    pub fn from_yaml(doc: &str) -> Result<Mapping, MappingError> {
        let root: Value =
            serde_yaml::from_str(doc).map_err(|e| MappingError::Malformed(e.to_string()))?;

        let tree = root
            .get("mapping")
            .ok_or_else(|| MappingError::Malformed("missing top-level 'mapping' key".into()))?;
        let tree = tree
            .as_mapping()
            .ok_or_else(|| MappingError::Malformed("'mapping' is not a mapping".into()))?;

        let mut topcats = Vec::new();
        for (name, seccats) in tree {
            let name = yaml_str(name)?;
            let seccats = seccats.as_mapping().ok_or_else(|| {
                MappingError::Malformed(format!("topcat '{name}' is not a mapping"))
            })?;

            let mut out = Vec::new();
            for (seccat, patterns) in seccats {
                let seccat = yaml_str(seccat)?;
                let patterns = patterns.as_sequence().ok_or_else(|| {
                    MappingError::Malformed(format!("seccat '{seccat}' is not a list"))
                })?;
                let patterns = patterns
                    .iter()
                    .map(yaml_str)
                    .collect::<Result<Vec<_>, _>>()?;
                out.push(SecCat { name: seccat, patterns });
            }
            topcats.push(TopCat { name, seccats: out });
        }

        Ok(Mapping { topcats })
    }

    /// Render back to the YAML document form, with a blank line above each
    /// topcat so the file stays hand-editable.
    pub fn to_yaml(&self) -> String {
        let mut tree = serde_yaml::Mapping::new();
        for topcat in &self.topcats {
            let mut seccats = serde_yaml::Mapping::new();
            for seccat in &topcat.seccats {
                let patterns: Vec<Value> = seccat
                    .patterns
                    .iter()
                    .map(|p| Value::String(p.clone()))
                    .collect();
                seccats.insert(Value::String(seccat.name.clone()), Value::Sequence(patterns));
            }
            tree.insert(Value::String(topcat.name.clone()), Value::Mapping(seccats));
        }

        let mut root = serde_yaml::Mapping::new();
        root.insert(Value::String("mapping".into()), Value::Mapping(tree));

        let dumped = serde_yaml::to_string(&Value::Mapping(root)).unwrap_or_default();

        // Inject a newline above each topcat (2-space indented key).
        let mut lines = Vec::new();
        let mut first_topcat = true;
        for line in dumped.lines() {
            if is_topcat_line(line) {
                if !first_topcat {
                    lines.push(String::new());
                }
                first_topcat = false;
            }
            lines.push(line.to_string());
        }
        lines.push(String::new());
        lines.join("\n")
    }

    /// Flatten to tabular rows in declaration order. Comments are not part of
    /// the tree, so every row comes back without one.
    pub fn to_rows(&self) -> Vec<MappingRow> {
        self.topcats
            .iter()
            .flat_map(|topcat| {
                topcat.seccats.iter().flat_map(|seccat| {
                    seccat.patterns.iter().map(|pattern| MappingRow {
                        topcat: topcat.name.clone(),
                        seccat: seccat.name.clone(),
                        pattern: pattern.clone(),
                        comment: None,
                    })
                })
            })
            .collect()
    }

    /// Rebuild the tree from tabular rows, preserving row order.
    pub fn from_rows(rows: &[MappingRow]) -> Mapping {
        let mut mapping = Mapping::default();
        for row in rows {
            mapping.append_pattern(&row.topcat, &row.seccat, &row.pattern);
        }
        mapping
    }

    /// Append a pattern under (topcat, seccat), creating either as needed.
    /// New patterns land last, so they never preempt existing rules.
    pub fn append_pattern(&mut self, topcat: &str, seccat: &str, pattern: &str) {
        let t = match self.topcats.iter().position(|t| t.name == topcat) {
            Some(i) => i,
            None => {
                self.topcats.push(TopCat { name: topcat.to_string(), seccats: Vec::new() });
                self.topcats.len() - 1
            }
        };
        let topcat = &mut self.topcats[t];

        let s = match topcat.seccats.iter().position(|s| s.name == seccat) {
            Some(i) => i,
            None => {
                topcat.seccats.push(SecCat { name: seccat.to_string(), patterns: Vec::new() });
                topcat.seccats.len() - 1
            }
        };
        topcat.seccats[s].patterns.push(pattern.to_string());
    }
}

/// Outer join of freshly flattened rows against the previously persisted ones,
/// keyed by (topcat, seccat, pattern). Upstream rows keep their comments and
/// their positions; rows new on our side are appended without comments.
pub fn merge_comments(ours: &[MappingRow], upstream: &[MappingRow]) -> Vec<MappingRow> {
    let mut merged: Vec<MappingRow> = upstream.to_vec();
    for row in ours {
        let present = merged
            .iter()
            .any(|m| m.topcat == row.topcat && m.seccat == row.seccat && m.pattern == row.pattern);
        if !present {
            merged.push(row.clone());
        }
    }
    merged
}

fn yaml_str(value: &Value) -> Result<String, MappingError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| MappingError::Malformed(format!("expected a string, got: {value:?}")))
}

fn is_topcat_line(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("  ") else {
        return false;
    };
    !rest.starts_with(' ') && !rest.starts_with('-') && rest.trim_end().ends_with(':')
}
