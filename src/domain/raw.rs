//! Upstream catalog records as they arrive on the wire.
//!
//! Only the fields the normalizer reads are modelled; everything else in the
//! catalog payload is ignored. Collections that the catalog sometimes sends as
//! `null` deserialize to an empty list.

use serde::{Deserialize, Deserializer};

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts a JSON string or number and keeps it as text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|value| match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }),
    )
}

/// `{language, value}` pair, the building block of every translated field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalizedText {
    pub language: Option<String>,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    pub id: String,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub item_list: Vec<IdRef>,
    #[serde(default)]
    pub page_count: u32,
}

/// Entry of `/CodeList/GetMunicipalityCodes` or `/CodeList/GetAreaCodes/...`.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeListEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub names: Vec<LocalizedText>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceChannelLink {
    pub service_channel: IdRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOrganization {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawServiceOrganization {
    pub role_type: Option<String>,
    pub organization: Option<RawOrganization>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub additional_information: Vec<LocalizedText>,
}

/// Target groups and life events share this shape.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCodedItem {
    pub code: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: Vec<LocalizedText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawServiceClass {
    pub code: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: Vec<LocalizedText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAreaMunicipality {
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: Vec<LocalizedText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawArea {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub municipalities: Vec<RawAreaMunicipality>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawService {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(alias = "subtype")]
    pub sub_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_channels: Vec<ServiceChannelLink>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub organizations: Vec<RawServiceOrganization>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_names: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_descriptions: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub requirements: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_groups: Vec<RawCodedItem>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_classes: Vec<RawServiceClass>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub life_events: Vec<RawCodedItem>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub areas: Vec<RawArea>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceLink {
    pub service: IdRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWebPage {
    pub language: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPhone {
    pub language: Option<String>,
    pub number: Option<String>,
    pub prefix_number: Option<String>,
    pub charge_description: Option<String>,
    pub service_charge_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAddressMunicipality {
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: Vec<LocalizedText>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStreetAddress {
    #[serde(default, deserialize_with = "lenient_string")]
    pub street_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub postal_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub longitude: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub street: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub post_office: Vec<LocalizedText>,
    pub municipality: Option<RawAddressMunicipality>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddress {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(alias = "subtype")]
    pub sub_type: Option<String>,
    pub street_address: Option<RawStreetAddress>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChannel {
    pub id: String,
    pub service_channel_type: Option<String>,
    pub area_type: Option<String>,
    pub organization_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub services: Vec<ServiceLink>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_channel_names: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_channel_descriptions: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub web_pages: Vec<RawWebPage>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub support_phones: Vec<RawPhone>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone_numbers: Vec<RawPhone>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub support_emails: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub emails: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub addresses: Vec<RawAddress>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub areas: Vec<RawArea>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub channel_urls: Vec<LocalizedText>,
}
