use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fi,
    Sv,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fi => "fi",
            Language::Sv => "sv",
        }
    }

    /// Upstream tags are compared case-sensitively, as the catalog emits them.
    pub fn matches(self, tag: Option<&str>) -> bool {
        tag == Some(self.code())
    }
}

/// One value per supported language. Every key is always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Localized<T> {
    pub en: T,
    pub fi: T,
    pub sv: T,
}

impl<T> Localized<T> {
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(Language) -> T,
    {
        Self {
            en: f(Language::En),
            fi: f(Language::Fi),
            sv: f(Language::Sv),
        }
    }

    pub fn try_from_fn<E, F>(mut f: F) -> std::result::Result<Self, E>
    where
        F: FnMut(Language) -> std::result::Result<T, E>,
    {
        Ok(Self {
            en: f(Language::En)?,
            fi: f(Language::Fi)?,
            sv: f(Language::Sv)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipality {
    pub id: String,
    pub name: Localized<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Province {
    pub code: String,
    pub names: Localized<Option<String>>,
}

/// Geography of the target region, resolved once per importer instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionContext {
    pub municipalities: Vec<Municipality>,
    pub province: Province,
}

impl RegionContext {
    pub fn new(municipalities: Vec<Municipality>, province: Province) -> Self {
        Self {
            municipalities,
            province,
        }
    }

    pub fn municipality_codes(&self) -> HashSet<&str> {
        self.municipalities.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn province_codes(&self) -> HashSet<&str> {
        std::iter::once(self.province.code.as_str()).collect()
    }

    pub fn has_municipality(&self, code: &str) -> bool {
        self.municipalities.iter().any(|m| m.id == code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub name: Option<String>,
    pub id: Option<String>,
    pub role_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceClass {
    pub name: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeEvent {
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedService {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub subtype: Option<String>,
    pub channel_ids: Vec<String>,
    pub organizations: Vec<Organization>,
    pub name: Localized<Option<String>>,
    pub descriptions: Localized<Vec<Description>>,
    pub requirement: Localized<Option<String>>,
    pub target_groups: Localized<Vec<TargetGroup>>,
    pub service_classes: Localized<Vec<ServiceClass>>,
    pub areas: Localized<Vec<Area>>,
    pub life_events: Localized<Vec<LifeEvent>>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    pub number: Option<String>,
    pub prefix_number: Option<String>,
    pub charge_description: Option<String>,
    pub service_charge_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub subtype: Option<String>,
    pub street_number: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub street_name: Option<String>,
    pub post_office: Option<String>,
    pub municipality_code: Option<String>,
    pub municipality_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelUrl {
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedChannel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub area_type: Option<String>,
    pub organization_id: Option<String>,
    pub service_ids: Vec<String>,
    pub name: Localized<Option<String>>,
    pub descriptions: Localized<Vec<Description>>,
    pub web_pages: Localized<Vec<String>>,
    pub emails: Localized<Vec<String>>,
    pub phone_numbers: Localized<Vec<PhoneNumber>>,
    pub addresses: Localized<Vec<Address>>,
    pub areas: Localized<Vec<Area>>,
    pub channel_urls: Localized<Vec<ChannelUrl>>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localized_serializes_every_language_key() {
        let name: Localized<Option<String>> = Localized::from_fn(|lang| match lang {
            Language::Fi => Some("Turku".to_string()),
            _ => None,
        });

        let json = serde_json::to_value(&name).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"en": null, "fi": "Turku", "sv": null})
        );
    }

    #[test]
    fn test_service_uses_camel_case_field_names() {
        let service = NormalizedService {
            id: "1".to_string(),
            kind: Some("Service".to_string()),
            subtype: None,
            channel_ids: vec!["0011".to_string()],
            organizations: vec![],
            name: Localized::default(),
            descriptions: Localized::default(),
            requirement: Localized::default(),
            target_groups: Localized::default(),
            service_classes: Localized::default(),
            areas: Localized::default(),
            life_events: Localized::default(),
            last_updated: None,
        };

        let json = serde_json::to_value(&service).unwrap();
        assert_eq!(json["type"], "Service");
        assert_eq!(json["channelIds"][0], "0011");
        assert!(json.get("lastUpdated").is_some());
        assert!(json["lifeEvents"].get("sv").is_some());
    }

    #[test]
    fn test_region_context_code_lookups() {
        let region = RegionContext::new(
            vec![Municipality {
                id: "853".to_string(),
                name: Localized::default(),
            }],
            Province {
                code: "02".to_string(),
                names: Localized::default(),
            },
        );

        assert!(region.has_municipality("853"));
        assert!(!region.has_municipality("091"));
        assert!(region.province_codes().contains("02"));
        assert_eq!(region.municipality_codes().len(), 1);
    }
}
