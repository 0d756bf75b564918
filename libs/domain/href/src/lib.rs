// INICIO DEL ARCHIVO [libs/domain/href/src/lib.rs]
/*!
 * =================================================================
 * APARATO: HREF PARSER/COMPOSER (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: TRADUCIR ENTRE `subscribedResource` HREFS Y SCOPES TIPADOS
 *
 * Unicamente las cinco plantillas de la tabla de suscripcion son
 * reconocidas. Suscribirse a una tasa con granularidad TimeTariffInterval
 * no esta soportado: los clientes se suscriben al listado RateComponent
 * y reciben los cuatro pricing types.
 * =================================================================
 */

use sep2_domain_model::SubscriptionResource;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HrefError {
    #[error("[HREF_INVALID_MAPPING]: '{0}' does not match any recognised subscription template")]
    InvalidMapping(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSubscriptionHref {
    pub resource_type: SubscriptionResource,
    pub scoped_site_id: Option<i64>,
    pub resource_id: Option<i64>,
}

fn strip_prefix_and_split(href_prefix: Option<&str>, href: &str) -> Vec<String> {
    let stripped = match href_prefix {
        Some(prefix) if !prefix.is_empty() => href.strip_prefix(prefix).unwrap_or(href),
        _ => href,
    };
    stripped
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parsea un `subscribedResource` href contra las cinco plantillas
/// reconocidas. Rutas no reconocidas son **InvalidMappingError**.
pub fn parse_subscribed_resource_href(
    href_prefix: Option<&str>,
    href: &str,
) -> Result<ParsedSubscriptionHref, HrefError> {
    let segments = strip_prefix_and_split(href_prefix, href);
    let as_slices: Vec<&str> = segments.iter().map(String::as_str).collect();

    let parsed = match as_slices.as_slice() {
        ["edev"] => ParsedSubscriptionHref {
            resource_type: SubscriptionResource::EndDeviceList,
            scoped_site_id: None,
            resource_id: None,
        },
        ["edev", site_id] => ParsedSubscriptionHref {
            resource_type: SubscriptionResource::EndDevice,
            scoped_site_id: Some(parse_i64(site_id, href)?),
            resource_id: None,
        },
        ["edev", site_id, "derp", "doe", "derc"] => ParsedSubscriptionHref {
            resource_type: SubscriptionResource::DerControlList,
            scoped_site_id: Some(parse_i64(site_id, href)?),
            resource_id: None,
        },
        ["upt", site_id, "mr", srt_id, "rs", "all", "r"] => ParsedSubscriptionHref {
            resource_type: SubscriptionResource::ReadingList,
            scoped_site_id: Some(parse_i64(site_id, href)?),
            resource_id: Some(parse_i64(srt_id, href)?),
        },
        ["edev", site_id, "tp", tariff_id, "rc"] => ParsedSubscriptionHref {
            resource_type: SubscriptionResource::RateComponentList,
            scoped_site_id: Some(parse_i64(site_id, href)?),
            resource_id: Some(parse_i64(tariff_id, href)?),
        },
        _ => return Err(HrefError::InvalidMapping(href.to_string())),
    };
    Ok(parsed)
}

fn parse_i64(segment: &str, href: &str) -> Result<i64, HrefError> {
    segment
        .parse::<i64>()
        .map_err(|_| HrefError::InvalidMapping(href.to_string()))
}

/// Compone el href de un recurso observado por una suscripcion, en
/// sentido inverso a la tabla de parseo.
pub fn calculate_resource_href(
    href_prefix: &str,
    resource_type: SubscriptionResource,
    scoped_site_id: Option<i64>,
    resource_id: Option<i64>,
) -> String {
    let body = match (resource_type, scoped_site_id, resource_id) {
        (SubscriptionResource::EndDeviceList, _, _) => "edev".to_string(),
        (SubscriptionResource::EndDevice, Some(site_id), _) => format!("edev/{site_id}"),
        (SubscriptionResource::DerControlList, Some(site_id), _) => {
            format!("edev/{site_id}/derp/doe/derc")
        }
        (SubscriptionResource::ReadingList, Some(site_id), Some(srt_id)) => {
            format!("upt/{site_id}/mr/{srt_id}/rs/all/r")
        }
        (SubscriptionResource::RateComponentList, Some(site_id), Some(tariff_id)) => {
            format!("edev/{site_id}/tp/{tariff_id}/rc")
        }
        _ => "edev".to_string(),
    };
    format!("{href_prefix}/{body}")
}

/// Compone el href de la propia suscripcion: difiere entre suscripciones
/// con alcance global (agregador) y con alcance de Site.
pub fn calculate_subscription_href(
    href_prefix: &str,
    scoped_site_id: Option<i64>,
    subscription_id: i64,
) -> String {
    match scoped_site_id {
        Some(site_id) => format!("{href_prefix}/edev/{site_id}/sub/{subscription_id}"),
        None => format!("{href_prefix}/edev/sub/{subscription_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_site_list() {
        let parsed = parse_subscribed_resource_href(None, "/edev").unwrap();
        assert_eq!(parsed.resource_type, SubscriptionResource::EndDeviceList);
        assert_eq!(parsed.scoped_site_id, None);
    }

    #[test]
    fn parses_doe_list_with_prefix() {
        let parsed =
            parse_subscribed_resource_href(Some("/sep2"), "/sep2/edev/7/derp/doe/derc").unwrap();
        assert_eq!(parsed.resource_type, SubscriptionResource::DerControlList);
        assert_eq!(parsed.scoped_site_id, Some(7));
    }

    #[test]
    fn parses_reading_list() {
        let parsed =
            parse_subscribed_resource_href(None, "/upt/7/mr/3/rs/all/r").unwrap();
        assert_eq!(parsed.resource_type, SubscriptionResource::ReadingList);
        assert_eq!(parsed.scoped_site_id, Some(7));
        assert_eq!(parsed.resource_id, Some(3));
    }

    #[test]
    fn rejects_time_tariff_interval_granularity() {
        let result = parse_subscribed_resource_href(None, "/edev/7/tp/5/rc/2023-01-01/1/tti");
        assert!(result.is_err());
    }

    #[test]
    fn round_trips_rate_component_href() {
        let original = "/edev/7/tp/5/rc";
        let parsed = parse_subscribed_resource_href(None, original).unwrap();
        let composed = calculate_resource_href(
            "",
            parsed.resource_type,
            parsed.scoped_site_id,
            parsed.resource_id,
        );
        assert_eq!(composed, original);
    }

    #[test]
    fn subscription_href_differs_by_scope() {
        assert_eq!(
            calculate_subscription_href("", Some(7), 42),
            "/edev/7/sub/42"
        );
        assert_eq!(calculate_subscription_href("", None, 42), "/edev/sub/42");
    }
}
// FIN DEL ARCHIVO [libs/domain/href/src/lib.rs]
