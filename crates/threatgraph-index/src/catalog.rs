//! STIX-style technique catalog loading.
//!
//! The catalog is a JSON bundle: an envelope with an `objects` array in
//! which technique records have `"type": "attack-pattern"`. Only the
//! fields named below are recognized; unknown fields are ignored. The
//! loader is a pure transformation with no side effects.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use threatgraph_core::error::CatalogError;
use threatgraph_core::types::TechniqueRecord;

/// Kill-chain / external-reference source recognized in the bundle.
const MITRE_SOURCE: &str = "mitre-attack";

/// A loaded technique catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Usable technique records, in bundle order.
    pub records: Vec<TechniqueRecord>,
    /// Catalog source version, e.g. `ATT&CK-18.0`, or the bundle's
    /// `spec_version`, or `unknown`.
    pub source_version: String,
}

#[derive(Deserialize)]
struct Bundle {
    #[serde(default)]
    spec_version: Option<String>,
    objects: Vec<BundleObject>,
}

/// Permissive view of one bundle object; heterogeneous object types all
/// deserialize into this with defaults.
#[derive(Deserialize)]
struct BundleObject {
    #[serde(rename = "type")]
    object_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    external_references: Vec<ExternalReference>,
    #[serde(default)]
    kill_chain_phases: Vec<KillChainPhase>,
    #[serde(default)]
    revoked: bool,
    #[serde(default, rename = "x_mitre_deprecated")]
    deprecated: bool,
}

#[derive(Deserialize)]
struct ExternalReference {
    #[serde(default)]
    source_name: String,
    #[serde(default)]
    external_id: Option<String>,
}

#[derive(Deserialize)]
struct KillChainPhase {
    #[serde(default)]
    kill_chain_name: String,
    #[serde(default)]
    phase_name: String,
}

/// Load a technique catalog from a bundle file.
///
/// # Errors
///
/// - [`CatalogError::Io`] if the file cannot be read
/// - [`CatalogError::Malformed`] if it is not a bundle
/// - [`CatalogError::Empty`] if no usable records are found
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let catalog = parse_catalog(&raw)?;
    info!(
        path = %path.display(),
        records = catalog.records.len(),
        version = %catalog.source_version,
        "catalog loaded"
    );
    Ok(catalog)
}

/// Parse a technique catalog from bundle JSON.
pub fn parse_catalog(raw: &str) -> Result<Catalog, CatalogError> {
    let bundle: Bundle =
        serde_json::from_str(raw).map_err(|e| CatalogError::Malformed(e.to_string()))?;

    let source_version = source_version(&bundle);

    let mut records = Vec::new();
    for obj in &bundle.objects {
        if obj.object_type != "attack-pattern" {
            continue;
        }
        if obj.revoked || obj.deprecated {
            debug!(name = %obj.name, "skipping revoked/deprecated technique");
            continue;
        }
        let Some(id) = primary_external_id(obj) else {
            debug!(name = %obj.name, "skipping attack-pattern without external id");
            continue;
        };
        let tactics: Vec<String> = obj
            .kill_chain_phases
            .iter()
            .filter(|p| p.kill_chain_name == MITRE_SOURCE)
            .map(|p| p.phase_name.clone())
            .filter(|p| !p.is_empty())
            .collect();

        records.push(TechniqueRecord::new(
            id,
            obj.name.clone(),
            obj.description.clone(),
            tactics,
        ));
    }

    if records.is_empty() {
        return Err(CatalogError::Empty);
    }

    Ok(Catalog {
        records,
        source_version,
    })
}

fn primary_external_id(obj: &BundleObject) -> Option<String> {
    obj.external_references
        .iter()
        .filter(|r| r.source_name == MITRE_SOURCE)
        .find_map(|r| r.external_id.clone())
        .filter(|id| !id.is_empty())
}

/// Best-effort source version: an ATT&CK release tag from the collection
/// object when present, otherwise the bundle's `spec_version`.
fn source_version(bundle: &Bundle) -> String {
    for obj in &bundle.objects {
        if obj.object_type == "x-mitre-collection" {
            if let Some(version) = attack_version(&obj.description) {
                return format!("ATT&CK-{version}");
            }
        }
    }
    bundle
        .spec_version
        .clone()
        .unwrap_or_else(|| "unknown".to_string())
}

/// Extract a `vN.N` release token from a collection description.
fn attack_version(description: &str) -> Option<String> {
    if !description.contains("ATT&CK") {
        return None;
    }
    description
        .split_whitespace()
        .filter_map(|word| word.strip_prefix('v'))
        .map(|rest| rest.trim_end_matches(|c: char| !c.is_ascii_digit()))
        .find(|rest| {
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.')
        })
        .map(str::to_string)
}
