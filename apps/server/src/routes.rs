// INICIO DEL ARCHIVO [apps/server/src/routes.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN ROUTING MATRIX (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: COMPOSICIÓN DE LA SUPERFICIE 2030.5 Y LA ADMIN
 *
 * Dos estratos, dos guardias: la superficie 2030.5 (XML, escopada por
 * LFDI de certificado) y la superficie admin (JSON, gateada por bearer
 * token compartido). Ambas pasan primero por `health_guard`.
 * =================================================================
 */

use crate::handlers::{admin, der, mup, pricing, sep2};
use crate::middleware::{admin_auth_guard, health_guard, sep2_auth_guard};
use crate::state::AppState;
use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_sovereign_router(application_shared_state: AppState) -> Router {
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // ESTRATO 2030.5 (XML, escopado por LFDI de certificado cliente)
    let sep2_surface = Router::new()
        .route("/tm", get(sep2::get_current_time))
        .route("/dcap", get(sep2::get_device_capability))
        .route(
            "/edev",
            get(sep2::list_end_devices).post(sep2::create_end_device),
        )
        .route(
            "/edev/:site_id",
            get(sep2::get_end_device).delete(sep2::delete_end_device),
        )
        .route("/edev/:site_id/reg", get(sep2::get_registration))
        .route("/edev/:site_id/cp", get(sep2::get_connection_point))
        .route("/edev/:site_id/der", get(der::list_ders))
        .route("/edev/:site_id/der/:der_id/dera", get(der::get_der_availability))
        .route("/edev/:site_id/der/:der_id/dercap", get(der::get_der_capability))
        .route("/edev/:site_id/der/:der_id/ders", get(der::get_der_settings))
        .route("/edev/:site_id/der/:der_id/derg", get(der::get_der_status))
        .route("/edev/:site_id/derp", get(sep2::list_der_programs))
        .route("/edev/:site_id/derp/:derp_id", get(sep2::get_der_program))
        .route("/edev/:site_id/derp/doe/derc", get(sep2::list_der_controls))
        .route("/edev/:site_id/derp/doe/actderc", get(sep2::list_active_der_controls))
        .route("/edev/:site_id/derp/doe/dderc", get(sep2::get_default_der_control))
        .route(
            "/edev/:site_id/derp/doe/derc/:dynamic_operating_envelope_id",
            get(sep2::get_der_control),
        )
        .route("/tp", get(pricing::list_tariff_profiles))
        .route("/tp/:tariff_id", get(sep2::list_tariffs))
        .route("/edev/:site_id/tp", get(pricing::list_tariff_profiles))
        .route("/edev/:site_id/tp/:tariff_id", get(sep2::list_tariffs))
        .route(
            "/edev/:site_id/tp/:tariff_id/rc",
            get(pricing::list_rate_components),
        )
        .route(
            "/edev/:site_id/tp/:tariff_id/rc/:day/:prt_ordinal/tti",
            get(pricing::list_time_tariff_intervals),
        )
        .route(
            "/edev/:site_id/tp/:tariff_id/rc/:day/tti/:tti_id/cti",
            get(pricing::list_consumption_tariff_intervals),
        )
        .route(
            "/edev/:site_id/sub",
            get(sep2::list_subscriptions).post(sep2::create_subscription),
        )
        .route(
            "/edev/:site_id/sub/:subscription_id",
            axum::routing::delete(sep2::delete_subscription),
        )
        .route(
            "/mup",
            get(mup::list_mirror_usage_points).post(mup::create_mirror_usage_point),
        )
        .route(
            "/mup/:site_reading_type_id",
            get(mup::get_mirror_usage_point)
                .delete(mup::delete_mirror_usage_point)
                .post(mup::post_meter_readings),
        )
        .route_layer(middleware::from_fn_with_state(
            application_shared_state.clone(),
            sep2_auth_guard,
        ));

    // ESTRATO ADMIN (JSON, sin escope de certificado, gateado por bearer token)
    let admin_surface = Router::new()
        .route("/aggregators", post(admin::upsert_aggregator))
        .route("/aggregators/:aggregator_id", get(admin::get_aggregator))
        .route("/aggregators/:aggregator_id/sites", get(admin::list_sites))
        .route("/certificates", post(admin::register_certificate))
        .route("/sites", post(admin::create_site))
        .route(
            "/site-control-groups",
            post(admin::create_site_control_group),
        )
        .route("/does/bulk", post(admin::bulk_upsert_does))
        .route(
            "/does/range",
            axum::routing::delete(admin::delete_does_in_range),
        )
        .route(
            "/default-site-controls",
            post(admin::upsert_default_site_control),
        )
        .route(
            "/default-site-controls/:site_control_group_id/:site_id",
            get(admin::get_default_site_control),
        )
        .route("/tariffs", post(admin::create_tariff))
        .route("/tariffs/:tariff_id", get(admin::get_tariff))
        .route(
            "/tariffs/generated-rates/bulk",
            post(admin::bulk_upsert_generated_rates),
        )
        .route(
            "/tariffs/:tariff_id/sites/:site_id/calculation-log",
            get(admin::get_calculation_log),
        )
        .route(
            "/runtime-config",
            get(admin::get_runtime_config).put(admin::update_runtime_config),
        )
        .route(
            "/system-mode",
            get(admin::get_system_mode).post(admin::set_system_mode),
        )
        .route_layer(middleware::from_fn_with_state(
            application_shared_state.clone(),
            admin_auth_guard,
        ));

    Router::new()
        .merge(sep2_surface)
        .nest("/admin", admin_surface)
        .route_layer(middleware::from_fn_with_state(
            application_shared_state.clone(),
            health_guard,
        ))
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
// FIN DEL ARCHIVO [apps/server/src/routes.rs]
