// INICIO DEL ARCHIVO [apps/server/src/handlers/xml.rs]
/*!
 * =================================================================
 * APARATO: 2030.5 XML RESPONSE DTOS (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: SERIALIZACIÓN XML DE LAS ENTIDADES DE DOMINIO
 *
 * Capa de traduccion pura dominio -> DTO. No contiene SQL ni logica de
 * scope; recibe entidades ya resueltas por el handler y las serializa
 * en la forma XML esperada por un cliente CSIP-AUS.
 * =================================================================
 */

use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use sep2_domain_model::{
    DefaultSiteControl, DynamicOperatingEnvelope, RuntimeServerConfig, Site,
    SiteDERAvailability, SiteDERRating, SiteDERSetting, SiteDERStatus, SiteReadingType,
    Subscription, Tariff, TariffGeneratedRate,
};
use sep2_domain_pricing::PricingReadingType;
use serde::Serialize;

/// Envoltura que serializa un DTO como `application/sep+xml`.
pub struct XmlResponse<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for XmlResponse<T> {
    fn into_response(self) -> Response {
        match quick_xml::se::to_string(&self.0) {
            Ok(body) => (
                [(header::CONTENT_TYPE, "application/sep+xml")],
                format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}"),
            )
                .into_response(),
            Err(fault) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("XML_SERIALIZATION_FAULT: {fault}"),
            )
                .into_response(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "DeviceCapability")]
pub struct DeviceCapabilityDto {
    pub href: String,
    #[serde(rename = "pollRate")]
    pub poll_rate: i64,
    #[serde(rename = "EndDeviceListLink")]
    pub end_device_list_link: LinkDto,
    #[serde(rename = "MirrorUsagePointListLink")]
    pub mirror_usage_point_list_link: LinkDto,
    #[serde(rename = "TimeLink")]
    pub time_link: LinkDto,
}

#[derive(Debug, Serialize)]
pub struct LinkDto {
    pub href: String,
}

impl DeviceCapabilityDto {
    pub fn build(href_prefix: &str, config: &RuntimeServerConfig) -> Self {
        Self {
            href: format!("{href_prefix}/dcap"),
            poll_rate: config.dcap_pollrate_seconds,
            end_device_list_link: LinkDto {
                href: format!("{href_prefix}/edev"),
            },
            mirror_usage_point_list_link: LinkDto {
                href: format!("{href_prefix}/mup"),
            },
            time_link: LinkDto {
                href: format!("{href_prefix}/tm"),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "EndDevice")]
pub struct EndDeviceDto {
    pub href: String,
    pub sfdi: i64,
    pub lfdi: String,
    #[serde(rename = "deviceCategory")]
    pub device_category: i64,
    #[serde(rename = "DERListLink")]
    pub der_list_link: LinkDto,
    #[serde(rename = "SubscriptionListLink")]
    pub subscription_list_link: LinkDto,
}

impl EndDeviceDto {
    pub fn from_site(href_prefix: &str, site: &Site) -> Self {
        Self {
            href: format!("{href_prefix}/edev/{}", site.site_id),
            sfdi: site.sfdi,
            lfdi: site.lfdi.clone(),
            device_category: site.device_category,
            der_list_link: LinkDto {
                href: format!("{href_prefix}/edev/{}/der", site.site_id),
            },
            subscription_list_link: LinkDto {
                href: format!("{href_prefix}/edev/{}/sub", site.site_id),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "EndDeviceList")]
pub struct EndDeviceListDto {
    pub href: String,
    pub all: i64,
    pub results: i64,
    #[serde(rename = "EndDevice")]
    pub end_devices: Vec<EndDeviceDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "DERControl")]
pub struct DerControlDto {
    pub mrid: String,
    pub description: String,
    #[serde(rename = "creationTime")]
    pub creation_time: i64,
    #[serde(rename = "EventStatus")]
    pub event_status: EventStatusDto,
    pub interval: IntervalDto,
    #[serde(rename = "DERControlBase")]
    pub der_control_base: DerControlBaseDto,
}

#[derive(Debug, Serialize)]
pub struct EventStatusDto {
    #[serde(rename = "currentStatus")]
    pub current_status: i64,
}

#[derive(Debug, Serialize)]
pub struct IntervalDto {
    pub start: i64,
    pub duration: i64,
}

#[derive(Debug, Serialize)]
pub struct DerControlBaseDto {
    #[serde(rename = "opModImpLimW", skip_serializing_if = "Option::is_none")]
    pub import_limit_active_watts: Option<f64>,
    #[serde(rename = "opModExpLimW", skip_serializing_if = "Option::is_none")]
    pub export_limit_watts: Option<f64>,
}

impl DerControlDto {
    pub fn from_doe(mrid: String, doe: &DynamicOperatingEnvelope, superseded: bool) -> Self {
        Self {
            mrid,
            description: format!("doe-{}", doe.dynamic_operating_envelope_id),
            creation_time: doe.changed_time.timestamp(),
            event_status: EventStatusDto {
                current_status: if superseded { 5 } else { 1 },
            },
            interval: IntervalDto {
                start: doe.start_time.timestamp(),
                duration: doe.duration_seconds,
            },
            der_control_base: DerControlBaseDto {
                import_limit_active_watts: doe.import_limit_active_watts,
                export_limit_watts: doe.export_limit_watts,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "DERControlList")]
pub struct DerControlListDto {
    pub href: String,
    pub all: i64,
    pub results: i64,
    #[serde(rename = "DERControl")]
    pub controls: Vec<DerControlDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "TariffProfile")]
pub struct TariffProfileDto {
    pub href: String,
    pub mrid: String,
    #[serde(rename = "currencyCode")]
    pub currency_code: i64,
    #[serde(rename = "pricePowerOfTenMultiplier")]
    pub price_power_of_ten_multiplier: i32,
    #[serde(rename = "RateComponentListLink")]
    pub rate_component_list_link: LinkDto,
}

impl TariffProfileDto {
    pub fn from_tariff(href_prefix: &str, mrid: String, tariff: &Tariff) -> Self {
        Self {
            href: format!("{href_prefix}/tp/{}", tariff.tariff_id),
            mrid,
            currency_code: tariff.currency_code,
            price_power_of_ten_multiplier: sep2_domain_pricing::PRICE_POWER_OF_TEN_MULTIPLIER,
            rate_component_list_link: LinkDto {
                href: format!("{href_prefix}/tp/{}/rc", tariff.tariff_id),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "Subscription")]
pub struct SubscriptionDto {
    pub href: String,
    pub mrid: String,
    #[serde(rename = "subscribedResource")]
    pub subscribed_resource: String,
    #[serde(rename = "notificationURI")]
    pub notification_uri: String,
}

impl SubscriptionDto {
    pub fn from_subscription(href: String, mrid: String, resource: String, sub: &Subscription) -> Self {
        Self {
            href,
            mrid,
            subscribed_resource: resource,
            notification_uri: sub.notification_uri.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "SubscriptionList")]
pub struct SubscriptionListDto {
    pub href: String,
    pub all: i64,
    pub results: i64,
    #[serde(rename = "Subscription")]
    pub subscriptions: Vec<SubscriptionDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "TimeTariffInterval")]
pub struct TimeTariffIntervalDto {
    pub href: String,
    pub mrid: String,
    pub description: String,
    #[serde(rename = "creationTime")]
    pub creation_time: i64,
    pub interval: IntervalDto,
    #[serde(rename = "ConsumptionTariffIntervalListLink")]
    pub consumption_tariff_interval_list_link: LinkDto,
}

impl TimeTariffIntervalDto {
    pub fn from_rate(
        href_prefix: &str,
        mrid: String,
        tariff_id: i64,
        site_id: i64,
        rate: &TariffGeneratedRate,
        pricing_reading_type: PricingReadingType,
    ) -> Self {
        let start = rate.start_date.and_time(rate.start_time).and_utc();
        let tti_id = rate.start_time.format("%H:%M").to_string();
        let prt = pricing_reading_type.ordinal();
        let day = rate.start_date;
        Self {
            href: format!("{href_prefix}/edev/{site_id}/tp/{tariff_id}/rc/{day}/{prt}/tti/{tti_id}"),
            mrid,
            description: start.to_rfc3339(),
            creation_time: rate.changed_time.timestamp(),
            interval: IntervalDto {
                start: start.timestamp(),
                duration: rate.duration_seconds,
            },
            consumption_tariff_interval_list_link: LinkDto {
                href: format!(
                    "{href_prefix}/edev/{site_id}/tp/{tariff_id}/rc/{day}/{prt}/tti/{tti_id}/cti"
                ),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "TimeTariffIntervalList")]
pub struct TimeTariffIntervalListDto {
    pub href: String,
    pub all: i64,
    pub results: i64,
    #[serde(rename = "TimeTariffInterval")]
    pub intervals: Vec<TimeTariffIntervalDto>,
}

/// Envoltura `Notification` enviada al `notificationURI` de una
/// suscripcion: referencia el recurso observado, la suscripcion que la
/// origino, y transporta la pagina de entidades serializada como el
/// recurso correspondiente (`R`).
#[derive(Debug, Serialize)]
#[serde(rename = "Notification")]
pub struct NotificationDto<R: Serialize> {
    #[serde(rename = "subscribedResource")]
    pub subscribed_resource: String,
    #[serde(rename = "subscriptionURI")]
    pub subscription_uri: String,
    pub status: i64,
    pub resource: R,
}

#[derive(Debug, Serialize)]
#[serde(rename = "Time")]
pub struct TimeDto {
    #[serde(rename = "currentTime")]
    pub current_time: i64,
}

impl Default for TimeDto {
    fn default() -> Self {
        Self {
            current_time: Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "Registration")]
pub struct RegistrationDto {
    pub href: String,
    pub pin: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename = "ConnectionPoint")]
pub struct ConnectionPointDto {
    pub href: String,
    #[serde(rename = "connectionPointId", skip_serializing_if = "Option::is_none")]
    pub connection_point_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "DER")]
pub struct DerDto {
    pub href: String,
    #[serde(rename = "DERAvailabilityLink")]
    pub der_availability_link: LinkDto,
    #[serde(rename = "DERCapabilityLink")]
    pub der_capability_link: LinkDto,
    #[serde(rename = "DERSettingsLink")]
    pub der_settings_link: LinkDto,
    #[serde(rename = "DERStatusLink")]
    pub der_status_link: LinkDto,
}

impl DerDto {
    pub fn for_site(href_prefix: &str, site_id: i64, der_id: i64) -> Self {
        let base = format!("{href_prefix}/edev/{site_id}/der/{der_id}");
        Self {
            der_availability_link: LinkDto {
                href: format!("{base}/dera"),
            },
            der_capability_link: LinkDto {
                href: format!("{base}/dercap"),
            },
            der_settings_link: LinkDto {
                href: format!("{base}/ders"),
            },
            der_status_link: LinkDto {
                href: format!("{base}/derg"),
            },
            href: base,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "DERList")]
pub struct DerListDto {
    pub href: String,
    pub all: i64,
    pub results: i64,
    #[serde(rename = "DER")]
    pub ders: Vec<DerDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "DERAvailability")]
pub struct DerAvailabilityDto {
    pub href: String,
    #[serde(rename = "availabilityDuration", skip_serializing_if = "Option::is_none")]
    pub available_w: Option<i64>,
    #[serde(rename = "readingTime")]
    pub reading_time: i64,
}

impl DerAvailabilityDto {
    pub fn from_model(href: String, availability: &SiteDERAvailability) -> Self {
        Self {
            href,
            available_w: availability.available_w,
            reading_time: availability.reading_time.timestamp(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "DERCapability")]
pub struct DerCapabilityDto {
    pub href: String,
    #[serde(rename = "modesSupported")]
    pub modes_supported: i64,
    #[serde(rename = "maxW")]
    pub max_w: i64,
    #[serde(rename = "maxVA", skip_serializing_if = "Option::is_none")]
    pub max_var: Option<i64>,
}

impl DerCapabilityDto {
    pub fn from_model(href: String, rating: &SiteDERRating) -> Self {
        Self {
            href,
            modes_supported: rating.modes_supported,
            max_w: rating.max_w,
            max_var: Some(rating.max_var),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "DERSettings")]
pub struct DerSettingsDto {
    pub href: String,
    #[serde(rename = "modesEnabled")]
    pub modes_enabled: i64,
    #[serde(rename = "gradW", skip_serializing_if = "Option::is_none")]
    pub grad_w: Option<i64>,
}

impl DerSettingsDto {
    pub fn from_model(href: String, setting: &SiteDERSetting) -> Self {
        Self {
            href,
            modes_enabled: setting.modes_enabled,
            grad_w: setting.grad_w,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "DERStatus")]
pub struct DerStatusDto {
    pub href: String,
    #[serde(rename = "operationalModeStatus", skip_serializing_if = "Option::is_none")]
    pub operational_mode_status: Option<i64>,
    #[serde(rename = "genConnectStatus", skip_serializing_if = "Option::is_none")]
    pub generator_connect_status: Option<i64>,
}

impl DerStatusDto {
    pub fn from_model(href: String, status: &SiteDERStatus) -> Self {
        Self {
            href,
            operational_mode_status: status.operational_mode_status,
            generator_connect_status: status.generator_connect_status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "DERProgram")]
pub struct DerProgramDto {
    pub href: String,
    pub mrid: String,
    pub primacy: i64,
    #[serde(rename = "DefaultDERControlLink")]
    pub default_der_control_link: LinkDto,
    #[serde(rename = "DERControlListLink")]
    pub der_control_list_link: LinkDto,
    #[serde(rename = "ActiveDERControlListLink")]
    pub active_der_control_list_link: LinkDto,
}

impl DerProgramDto {
    pub fn doe_program(href_prefix: &str, site_id: i64, mrid: String, primacy: i64) -> Self {
        let base = format!("{href_prefix}/edev/{site_id}/derp/doe");
        Self {
            default_der_control_link: LinkDto {
                href: format!("{base}/dderc"),
            },
            der_control_list_link: LinkDto {
                href: format!("{base}/derc"),
            },
            active_der_control_list_link: LinkDto {
                href: format!("{base}/actderc"),
            },
            href: base,
            mrid,
            primacy,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "DERProgramList")]
pub struct DerProgramListDto {
    pub href: String,
    pub all: i64,
    pub results: i64,
    #[serde(rename = "DERProgram")]
    pub programs: Vec<DerProgramDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "DefaultDERControl")]
pub struct DefaultDerControlDto {
    pub href: String,
    #[serde(rename = "DERControlBase")]
    pub der_control_base: DerControlBaseDto,
}

impl DefaultDerControlDto {
    pub fn from_model(href: String, default_control: &DefaultSiteControl) -> Self {
        Self {
            href,
            der_control_base: DerControlBaseDto {
                import_limit_active_watts: default_control.import_limit_active_watts,
                export_limit_watts: default_control.export_limit_watts,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "TariffProfileList")]
pub struct TariffProfileListDto {
    pub href: String,
    pub all: i64,
    pub results: i64,
    #[serde(rename = "TariffProfile")]
    pub tariffs: Vec<TariffProfileDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "RateComponent")]
pub struct RateComponentDto {
    pub href: String,
    pub mrid: String,
    #[serde(rename = "TimeTariffIntervalListLink")]
    pub time_tariff_interval_list_link: LinkDto,
}

impl RateComponentDto {
    pub fn build(
        href_prefix: &str,
        site_id: i64,
        tariff_id: i64,
        mrid: String,
        day: chrono::NaiveDate,
        pricing_reading_type: PricingReadingType,
    ) -> Self {
        let prt = pricing_reading_type.ordinal();
        let base = format!("{href_prefix}/edev/{site_id}/tp/{tariff_id}/rc/{day}/{prt}");
        Self {
            time_tariff_interval_list_link: LinkDto {
                href: format!("{base}/tti"),
            },
            href: base,
            mrid,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "RateComponentList")]
pub struct RateComponentListDto {
    pub href: String,
    pub all: i64,
    pub results: i64,
    #[serde(rename = "RateComponent")]
    pub components: Vec<RateComponentDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "ConsumptionTariffInterval")]
pub struct ConsumptionTariffIntervalDto {
    pub href: String,
    pub mrid: String,
    #[serde(rename = "price")]
    pub price: i64,
}

impl ConsumptionTariffIntervalDto {
    pub fn build(href_prefix: &str, site_id: i64, tariff_id: i64, day: chrono::NaiveDate, tti_id: &str, mrid: String, price: i64) -> Self {
        Self {
            href: format!("{href_prefix}/edev/{site_id}/tp/{tariff_id}/rc/{day}/tti/{tti_id}/cti/1"),
            mrid,
            price: sep2_domain_pricing::consumption_tariff_interval_price(price),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "ConsumptionTariffIntervalList")]
pub struct ConsumptionTariffIntervalListDto {
    pub href: String,
    pub all: i64,
    pub results: i64,
    #[serde(rename = "ConsumptionTariffInterval")]
    pub intervals: Vec<ConsumptionTariffIntervalDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "MirrorUsagePoint")]
pub struct MirrorUsagePointDto {
    pub href: String,
    pub mrid: String,
    pub description: String,
    #[serde(rename = "roleFlags")]
    pub role_flags: i64,
}

impl MirrorUsagePointDto {
    pub fn from_model(href_prefix: &str, mrid: String, reading_type: &SiteReadingType) -> Self {
        Self {
            href: format!("{href_prefix}/mup/{}", reading_type.site_reading_type_id),
            mrid,
            description: format!("site-{}-reading-{}", reading_type.site_id, reading_type.site_reading_type_id),
            role_flags: reading_type.flow_direction,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "MirrorUsagePointList")]
pub struct MirrorUsagePointListDto {
    pub href: String,
    pub all: i64,
    pub results: i64,
    #[serde(rename = "MirrorUsagePoint")]
    pub points: Vec<MirrorUsagePointDto>,
}
// FIN DEL ARCHIVO [apps/server/src/handlers/xml.rs]
