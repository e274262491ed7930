//! Regional suitability rules. Both predicates look at the Finnish projection
//! of a normalized record only.

use crate::domain::model::{NormalizedChannel, NormalizedService, RegionContext};

pub const SUITABLE_TARGET_GROUPS: [&str; 2] = ["KR1", "KR1.2"];
/// Known non-suitable citizen subgroups. Membership is reported in logs; the
/// allow-list alone decides suitability.
pub const NONSUITABLE_TARGET_GROUPS: [&str; 5] = ["KR1.1", "KR1.3", "KR1.4", "KR1.5", "KR1.6"];

pub const SERVICE_LOCATION: &str = "ServiceLocation";
const PROVINCE_AREA_TYPES: [&str; 2] = ["Province", "Region"];
const MUNICIPALITY_AREA_TYPE: &str = "Municipality";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetGroupVerdict {
    /// The service declares no target groups.
    Unrestricted,
    Suitable,
    /// Every code is outside the allow-list and at least one is a known
    /// non-suitable group.
    Denied,
    /// Every code is outside both lists.
    Unclassified,
}

impl TargetGroupVerdict {
    pub fn is_ok(self) -> bool {
        matches!(self, TargetGroupVerdict::Unrestricted | TargetGroupVerdict::Suitable)
    }
}

pub fn classify_target_groups(service: &NormalizedService) -> TargetGroupVerdict {
    let codes: Vec<&str> = service
        .target_groups
        .fi
        .iter()
        .filter_map(|group| group.code.as_deref())
        .collect();

    if service.target_groups.fi.is_empty() {
        TargetGroupVerdict::Unrestricted
    } else if codes.iter().any(|code| SUITABLE_TARGET_GROUPS.contains(code)) {
        TargetGroupVerdict::Suitable
    } else if codes.iter().any(|code| NONSUITABLE_TARGET_GROUPS.contains(code)) {
        TargetGroupVerdict::Denied
    } else {
        TargetGroupVerdict::Unclassified
    }
}

/// True when the service has no areas, or one of its province/region areas
/// is the target province, or one of its municipality areas is in the region.
pub fn region_matches(service: &NormalizedService, region: &RegionContext) -> bool {
    let areas = &service.areas.fi;
    if areas.is_empty() {
        return true;
    }

    let province_codes = region.province_codes();
    let municipality_codes = region.municipality_codes();

    let province_match = areas
        .iter()
        .filter(|area| {
            area.kind
                .as_deref()
                .is_some_and(|kind| PROVINCE_AREA_TYPES.contains(&kind))
        })
        .filter_map(|area| area.code.as_deref())
        .any(|code| province_codes.contains(code));

    let municipality_match = areas
        .iter()
        .filter(|area| area.kind.as_deref() == Some(MUNICIPALITY_AREA_TYPE))
        .filter_map(|area| area.code.as_deref())
        .any(|code| municipality_codes.contains(code));

    province_match || municipality_match
}

pub fn is_suitable_service(service: &NormalizedService, region: &RegionContext) -> bool {
    let verdict = classify_target_groups(service);
    if !verdict.is_ok() {
        tracing::debug!("🚫 service {} excluded by target groups ({:?})", service.id, verdict);
        return false;
    }

    if !region_matches(service, region) {
        tracing::debug!("🚫 service {} excluded by area", service.id);
        return false;
    }

    true
}

/// Only physical service locations are filtered by geography; a location
/// without addresses is kept.
pub fn is_suitable_channel(channel: &NormalizedChannel, region: &RegionContext) -> bool {
    if channel.kind.as_deref() != Some(SERVICE_LOCATION) {
        return true;
    }

    let addresses = &channel.addresses.fi;
    if addresses.is_empty() {
        return true;
    }

    let suitable = addresses
        .iter()
        .filter_map(|address| address.municipality_code.as_deref())
        .any(|code| region.has_municipality(code));
    if !suitable {
        tracing::debug!("🚫 channel {} has no address in the region", channel.id);
    }
    suitable
}
