use crate::config::RegionSpec;
use crate::core::fetcher::CatalogClient;
use crate::domain::model::{Language, Localized, Municipality, Province, RegionContext};
use crate::domain::raw::{CodeListEntry, LocalizedText};
use crate::utils::error::{Result, SyncError};
use std::collections::HashSet;

/// First upstream name per language.
fn first_names(names: &[LocalizedText]) -> Localized<Option<String>> {
    Localized::from_fn(|language| {
        names
            .iter()
            .filter(|name| language.matches(name.language.as_deref()))
            .find_map(|name| name.value.clone())
    })
}

/// Keeps the municipalities whose Finnish name is on the allow-list,
/// preserving upstream order.
pub fn select_municipalities(entries: Vec<CodeListEntry>, allowed: &[String]) -> Vec<Municipality> {
    let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();

    entries
        .into_iter()
        .filter_map(|entry| {
            let name = first_names(&entry.names);
            let code = entry.code?;
            match name.fi.as_deref() {
                Some(fi) if allowed.contains(fi) => Some(Municipality { id: code, name }),
                _ => None,
            }
        })
        .collect()
}

/// Resolves exactly one province whose Finnish name equals `province_name`.
pub fn select_province(entries: Vec<CodeListEntry>, province_name: &str) -> Result<Province> {
    let mut matches: Vec<Province> = entries
        .into_iter()
        .filter(|entry| {
            entry
                .names
                .iter()
                .any(|n| Language::Fi.matches(n.language.as_deref()) && n.value.as_deref() == Some(province_name))
        })
        .filter_map(|entry| {
            let names = first_names(&entry.names);
            entry.code.map(|code| Province { code, names })
        })
        .collect();

    match matches.len() {
        0 => Err(SyncError::RegionNotFound {
            name: province_name.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        n => Err(SyncError::AmbiguousRegion {
            name: province_name.to_string(),
            matches: n,
        }),
    }
}

impl RegionContext {
    /// Fetches both code lists and narrows them to `spec`. No fallback: an
    /// unreachable catalog or a missing province fails the load.
    pub async fn load(catalog: &CatalogClient, spec: &RegionSpec) -> Result<Self> {
        let municipalities =
            select_municipalities(catalog.municipality_codes().await?, &spec.municipality_names);
        let province = select_province(catalog.province_codes().await?, &spec.province_name)?;

        if municipalities.len() < spec.municipality_names.len() {
            tracing::warn!(
                "⚠️ Only {} of {} configured municipalities found in the code list",
                municipalities.len(),
                spec.municipality_names.len()
            );
        }
        tracing::info!(
            "🗺️ Region {} ({}) with {} municipalities",
            spec.province_name,
            province.code,
            municipalities.len()
        );

        Ok(Self::new(municipalities, province))
    }
}
