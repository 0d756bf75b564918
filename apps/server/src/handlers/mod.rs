// INICIO DEL ARCHIVO [apps/server/src/handlers/mod.rs]
//! Adaptadores de entrada HTTP: superficie 2030.5 (XML) y superficie admin (JSON).

pub mod admin;
pub mod der;
pub mod mup;
pub mod pricing;
pub mod sep2;
pub mod xml;
// FIN DEL ARCHIVO [apps/server/src/handlers/mod.rs]
