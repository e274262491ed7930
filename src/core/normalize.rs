//! Flattens raw catalog records into per-language documents.
//!
//! For every language the raw sub-items tagged with that language are selected
//! and their values extracted, dropping missing ones. Single-valued text is
//! joined (`" - "` for names, `" "` for prose); collections stay ordered lists
//! with one entry per surviving raw item. `lastUpdated` is left unset; the
//! importer stamps it per fetch round.

use crate::domain::model::{
    Address, Area, ChannelUrl, Description, Language, LifeEvent, Localized, NormalizedChannel,
    NormalizedService, Organization, PhoneNumber, ServiceClass, TargetGroup,
};
use crate::domain::raw::{
    LocalizedText, RawAddress, RawArea, RawChannel, RawPhone, RawService, RawServiceOrganization,
};
use crate::utils::error::{Result, SyncError};

pub const NAME_SEPARATOR: &str = " - ";
pub const TEXT_SEPARATOR: &str = " ";
pub const MUNICIPALITY_AREA: &str = "Municipality";

fn values_for(items: &[LocalizedText], language: Language) -> impl Iterator<Item = &str> {
    items
        .iter()
        .filter(move |item| language.matches(item.language.as_deref()))
        .filter_map(|item| item.value.as_deref())
}

/// Joins the values tagged with `language`; `None` when nothing survives.
fn joined(items: &[LocalizedText], language: Language, separator: &str) -> Option<String> {
    let values: Vec<&str> = values_for(items, language).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(separator))
    }
}

fn descriptions(items: &[LocalizedText], language: Language) -> Vec<Description> {
    items
        .iter()
        .filter(|item| language.matches(item.language.as_deref()))
        .filter_map(|item| {
            item.value.as_ref().map(|value| Description {
                value: value.clone(),
                kind: item.kind.clone(),
            })
        })
        .collect()
}

fn organizations(raw: &[RawServiceOrganization]) -> Vec<Organization> {
    raw.iter()
        .filter_map(|entry| match &entry.organization {
            Some(organization) => Some(Organization {
                name: organization.name.clone(),
                id: organization.id.clone(),
                role_type: entry.role_type.clone(),
            }),
            // organizations outside the catalog only carry a free-text name
            None => entry.additional_information.first().map(|info| Organization {
                name: info.value.clone(),
                id: None,
                role_type: entry.role_type.clone(),
            }),
        })
        .collect()
}

/// A `Municipality` area is a wrapper around one nested municipality; the
/// nested record supplies the code and names.
fn area(raw: &RawArea, language: Language, record_id: &str) -> Result<Area> {
    if raw.kind.as_deref() == Some(MUNICIPALITY_AREA) {
        let municipality = raw
            .municipalities
            .first()
            .ok_or_else(|| SyncError::MalformedRecord {
                message: format!("record {}: Municipality area without a municipality", record_id),
            })?;
        return Ok(Area {
            name: joined(&municipality.name, language, NAME_SEPARATOR),
            kind: raw.kind.clone(),
            code: municipality.code.clone(),
        });
    }

    Ok(Area {
        name: joined(&raw.name, language, NAME_SEPARATOR),
        kind: raw.kind.clone(),
        code: raw.code.clone(),
    })
}

fn areas(raw: &[RawArea], record_id: &str) -> Result<Localized<Vec<Area>>> {
    Localized::try_from_fn(|language| {
        raw.iter()
            .map(|item| area(item, language, record_id))
            .collect::<Result<Vec<_>>>()
    })
}

pub fn normalize_service(raw: &RawService) -> Result<NormalizedService> {
    let channel_ids = raw
        .service_channels
        .iter()
        .map(|link| link.service_channel.id.clone())
        .collect();

    Ok(NormalizedService {
        id: raw.id.clone(),
        kind: raw.kind.clone(),
        subtype: raw.sub_type.clone(),
        channel_ids,
        organizations: organizations(&raw.organizations),
        name: Localized::from_fn(|lang| joined(&raw.service_names, lang, NAME_SEPARATOR)),
        descriptions: Localized::from_fn(|lang| descriptions(&raw.service_descriptions, lang)),
        requirement: Localized::from_fn(|lang| joined(&raw.requirements, lang, TEXT_SEPARATOR)),
        target_groups: Localized::from_fn(|lang| {
            raw.target_groups
                .iter()
                .map(|group| TargetGroup {
                    name: joined(&group.name, lang, TEXT_SEPARATOR),
                    code: group.code.clone(),
                })
                .collect()
        }),
        service_classes: Localized::from_fn(|lang| {
            raw.service_classes
                .iter()
                .map(|class| ServiceClass {
                    name: joined(&class.name, lang, NAME_SEPARATOR),
                    description: joined(&class.description, lang, TEXT_SEPARATOR),
                    code: class.code.clone(),
                })
                .collect()
        }),
        areas: areas(&raw.areas, &raw.id)?,
        life_events: Localized::from_fn(|lang| {
            raw.life_events
                .iter()
                .map(|event| LifeEvent {
                    name: joined(&event.name, lang, NAME_SEPARATOR),
                    code: event.code.clone(),
                })
                .collect()
        }),
        last_updated: None,
    })
}

fn phone_numbers(raw: &RawChannel, language: Language) -> Vec<PhoneNumber> {
    raw.support_phones
        .iter()
        .chain(raw.phone_numbers.iter())
        .filter(|phone| language.matches(phone.language.as_deref()))
        .map(|phone: &RawPhone| PhoneNumber {
            number: phone.number.clone(),
            prefix_number: phone.prefix_number.clone(),
            charge_description: phone.charge_description.clone(),
            service_charge_type: phone.service_charge_type.clone(),
        })
        .collect()
}

fn emails(raw: &RawChannel, language: Language) -> Vec<String> {
    raw.support_emails
        .iter()
        .chain(raw.emails.iter())
        .filter(|email| language.matches(email.language.as_deref()))
        .filter_map(|email| email.value.clone())
        .collect()
}

fn address(raw: &RawAddress, language: Language) -> Address {
    let mut address = Address {
        kind: raw.kind.clone(),
        subtype: raw.sub_type.clone(),
        ..Address::default()
    };

    if let Some(street) = &raw.street_address {
        address.street_number = street.street_number.clone();
        address.postal_code = street.postal_code.clone();
        address.latitude = street.latitude.clone();
        address.longitude = street.longitude.clone();
        address.street_name = joined(&street.street, language, NAME_SEPARATOR);
        address.post_office = joined(&street.post_office, language, NAME_SEPARATOR);
        if let Some(municipality) = &street.municipality {
            address.municipality_code = municipality.code.clone();
            address.municipality_name = joined(&municipality.name, language, NAME_SEPARATOR);
        }
    }

    address
}

pub fn normalize_channel(raw: &RawChannel) -> Result<NormalizedChannel> {
    let service_ids = raw
        .services
        .iter()
        .map(|link| link.service.id.clone())
        .collect();

    Ok(NormalizedChannel {
        id: raw.id.clone(),
        kind: raw.service_channel_type.clone(),
        area_type: raw.area_type.clone(),
        organization_id: raw.organization_id.clone(),
        service_ids,
        name: Localized::from_fn(|lang| joined(&raw.service_channel_names, lang, NAME_SEPARATOR)),
        descriptions: Localized::from_fn(|lang| {
            descriptions(&raw.service_channel_descriptions, lang)
        }),
        web_pages: Localized::from_fn(|lang| {
            raw.web_pages
                .iter()
                .filter(|page| lang.matches(page.language.as_deref()))
                .filter_map(|page| page.url.clone())
                .collect()
        }),
        emails: Localized::from_fn(|lang| emails(raw, lang)),
        phone_numbers: Localized::from_fn(|lang| phone_numbers(raw, lang)),
        addresses: Localized::from_fn(|lang| {
            raw.addresses.iter().map(|item| address(item, lang)).collect()
        }),
        areas: areas(&raw.areas, &raw.id)?,
        channel_urls: Localized::from_fn(|lang| {
            raw.channel_urls
                .iter()
                .filter(|url| lang.matches(url.language.as_deref()))
                .map(|url| ChannelUrl {
                    url: url.value.clone(),
                    kind: url.kind.clone(),
                })
                .collect()
        }),
        last_updated: None,
    })
}
