//! Platform partitions of the documentation store.
//!
//! The store is split into four fixed partitions, one per target platform. Each
//! partition maps to exactly one table and one display label. The set is
//! closed: adding a platform means extending [`Partition`] and provisioning its
//! table, not discovering it at runtime.
//!
//! | partition | framework    | default table          | label   |
//! |-----------|--------------|------------------------|---------|
//! | web       | React        | `react_pages`          | Web     |
//! | desktop   | Electron     | `electron_pages`       | Desktop |
//! | server    | Node.js      | `node_pages`           | Server  |
//! | mobile    | NativeScript | `native_script_pages`  | Mobile  |
//!
//! [`Partition::ALL`] is also the probe order used by fan-out and by the page
//! reader.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four platform partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Web,
    Desktop,
    Server,
    Mobile,
}

impl Partition {
    /// Every partition, in probe order.
    pub const ALL: [Partition; 4] = [
        Partition::Web,
        Partition::Desktop,
        Partition::Server,
        Partition::Mobile,
    ];

    /// Resolve a user supplied platform name.
    ///
    /// Accepts the canonical keys and the framework names the agent tends to
    /// use, case-insensitively. Anything else is `None`, which callers treat
    /// as "no partition requested".
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "web" | "react" => Some(Self::Web),
            "desktop" | "electron" => Some(Self::Desktop),
            "server" | "nodejs" | "node" | "node.js" => Some(Self::Server),
            "mobile" | "nativescript" => Some(Self::Mobile),
            _ => None,
        }
    }

    /// Canonical lowercase key.
    pub fn key(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Desktop => "desktop",
            Self::Server => "server",
            Self::Mobile => "mobile",
        }
    }

    /// Framework whose documentation lives in this partition.
    pub fn framework(self) -> &'static str {
        match self {
            Self::Web => "React",
            Self::Desktop => "Electron",
            Self::Server => "Node.js",
            Self::Mobile => "NativeScript",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Web => 0,
            Self::Desktop => 1,
            Self::Server => 2,
            Self::Mobile => 3,
        }
    }

    fn default_spec(self) -> PartitionSpec {
        let (table, label) = match self {
            Self::Web => ("react_pages", "Web"),
            Self::Desktop => ("electron_pages", "Desktop"),
            Self::Server => ("node_pages", "Server"),
            Self::Mobile => ("native_script_pages", "Mobile"),
        };
        PartitionSpec {
            table: table.to_string(),
            label: label.to_string(),
            similarity_index: true,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Static configuration of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionSpec {
    /// Store table holding the partition's chunks
    pub table: String,
    /// Human readable label used in headings and page listings
    pub label: String,
    /// Whether the store can rank this partition by vector similarity
    pub similarity_index: bool,
}

/// Optional per-partition overrides, as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PartitionOverride {
    pub table: Option<String>,
    pub label: Option<String>,
    pub similarity_index: Option<bool>,
}

/// Errors building a [`PartitionMap`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("invalid table name {table:?} for partition {partition}")]
    InvalidTable { partition: Partition, table: String },
    #[error("table {table:?} is assigned to both {first} and {second}")]
    DuplicateTable {
        table: String,
        first: Partition,
        second: Partition,
    },
}

/// The closed partition → table/label mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionMap {
    specs: [PartitionSpec; 4],
}

impl Default for PartitionMap {
    fn default() -> Self {
        Self {
            specs: Partition::ALL.map(Partition::default_spec),
        }
    }
}

impl PartitionMap {
    /// Build a map from the defaults plus overrides.
    ///
    /// Table names are interpolated into SQL, so they must be plain
    /// identifiers and distinct across partitions.
    pub fn with_overrides<'a, I>(overrides: I) -> Result<Self, PartitionError>
    where
        I: IntoIterator<Item = (Partition, &'a PartitionOverride)>,
    {
        let mut map = Self::default();
        for (partition, o) in overrides {
            let spec = &mut map.specs[partition.index()];
            if let Some(table) = &o.table {
                spec.table = table.clone();
            }
            if let Some(label) = &o.label {
                spec.label = label.clone();
            }
            if let Some(similarity_index) = o.similarity_index {
                spec.similarity_index = similarity_index;
            }
        }
        map.validate()?;
        Ok(map)
    }

    /// Disable or enable similarity ranking for one partition (builder style).
    pub fn with_similarity(mut self, partition: Partition, enabled: bool) -> Self {
        self.specs[partition.index()].similarity_index = enabled;
        self
    }

    /// Configuration of a partition.
    pub fn spec(&self, partition: Partition) -> &PartitionSpec {
        &self.specs[partition.index()]
    }

    /// Table name of a partition.
    pub fn table(&self, partition: Partition) -> &str {
        &self.spec(partition).table
    }

    /// Display label of a partition.
    pub fn label(&self, partition: Partition) -> &str {
        &self.spec(partition).label
    }

    /// Iterate partitions with their specs in probe order.
    pub fn iter(&self) -> impl Iterator<Item = (Partition, &PartitionSpec)> {
        Partition::ALL.into_iter().map(move |p| (p, self.spec(p)))
    }

    fn validate(&self) -> Result<(), PartitionError> {
        for (partition, spec) in self.iter() {
            if !is_identifier(&spec.table) {
                return Err(PartitionError::InvalidTable {
                    partition,
                    table: spec.table.clone(),
                });
            }
        }
        for (i, first) in Partition::ALL.iter().enumerate() {
            for second in &Partition::ALL[i + 1..] {
                if self.table(*first) == self.table(*second) {
                    return Err(PartitionError::DuplicateTable {
                        table: self.table(*first).to_string(),
                        first: *first,
                        second: *second,
                    });
                }
            }
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Partition::parse("web"), Some(Partition::Web));
        assert_eq!(Partition::parse("React"), Some(Partition::Web));
        assert_eq!(Partition::parse("ELECTRON"), Some(Partition::Desktop));
        assert_eq!(Partition::parse("nodejs"), Some(Partition::Server));
        assert_eq!(Partition::parse("Node.js"), Some(Partition::Server));
        assert_eq!(Partition::parse(" nativescript "), Some(Partition::Mobile));
        assert_eq!(Partition::parse("flutter"), None);
        assert_eq!(Partition::parse(""), None);
    }

    #[test]
    fn test_probe_order() {
        let keys: Vec<_> = Partition::ALL.iter().map(|p| p.key()).collect();
        assert_eq!(keys, ["web", "desktop", "server", "mobile"]);
    }

    #[test]
    fn test_default_map() {
        let map = PartitionMap::default();
        assert_eq!(map.table(Partition::Web), "react_pages");
        assert_eq!(map.table(Partition::Mobile), "native_script_pages");
        assert_eq!(map.label(Partition::Server), "Server");
        assert!(map.iter().all(|(_, spec)| spec.similarity_index));
    }

    #[test]
    fn test_overrides_apply() {
        let o = PartitionOverride {
            table: Some("web_docs".into()),
            label: Some("React".into()),
            similarity_index: Some(false),
        };
        let map = PartitionMap::with_overrides([(Partition::Web, &o)]).unwrap();
        assert_eq!(map.table(Partition::Web), "web_docs");
        assert_eq!(map.label(Partition::Web), "React");
        assert!(!map.spec(Partition::Web).similarity_index);
        assert_eq!(map.table(Partition::Desktop), "electron_pages");
    }

    #[test]
    fn test_rejects_unsafe_table_names() {
        let o = PartitionOverride {
            table: Some("pages; DROP TABLE x".into()),
            ..Default::default()
        };
        let err = PartitionMap::with_overrides([(Partition::Mobile, &o)]).unwrap_err();
        assert!(matches!(err, PartitionError::InvalidTable { .. }));
    }

    #[test]
    fn test_rejects_shared_tables() {
        let o = PartitionOverride {
            table: Some("react_pages".into()),
            ..Default::default()
        };
        let err = PartitionMap::with_overrides([(Partition::Server, &o)]).unwrap_err();
        assert_eq!(
            err,
            PartitionError::DuplicateTable {
                table: "react_pages".into(),
                first: Partition::Web,
                second: Partition::Server,
            }
        );
    }
}
