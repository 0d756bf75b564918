// INICIO DEL ARCHIVO [libs/domain/mrid/src/lib.rs]
/*!
 * =================================================================
 * APARATO: MRID CODEC (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: EMPAQUETADO/DESEMPAQUETADO DE IDENTIFICADORES DE 128 BITS
 *
 * Un mrid es 32 caracteres hex en minuscula. Layout MSB->LSB:
 * bits 127..124 mrid_type (4), bits 123..32 id (92), bits 31..0 iana_pen (32).
 * =================================================================
 */

use thiserror::Error;

const ID_WIDTH_BITS: u32 = 92;
const IANA_PEN_WIDTH_BITS: u32 = 32;

/// Literal id usado por el unico mrid DEFAULT_DOE del sistema.
pub const DEFAULT_DOE_ID: u128 = 0xdefa017;

/// Prefijo de 12 bits que marca los mrid DER_PROGRAM dentro del campo id.
const DER_PROGRAM_PREFIX: u128 = 0xd0e;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MridError {
    #[error("[MRID_MALFORMED]: expected 32 hex characters, got {0}")]
    MalformedLength(usize),
    #[error("[MRID_MALFORMED]: not valid hexadecimal")]
    NotHex,
    #[error("[MRID_UNKNOWN_TYPE]: discriminant {0} does not map to a known mrid_type")]
    UnknownMridType(u8),
    #[error("[MRID_FIELD_OVERFLOW]: {0}")]
    FieldOverflow(&'static str),
    #[error("[MRID_INVALID_PRT]: pricingReadingType must be in 1..=4, got {0}")]
    InvalidPricingReadingType(u8),
    #[error("[MRID_IANA_PEN_MISMATCH]: mrid carries pen {found}, scope expects {expected}")]
    IanaPenMismatch { expected: u32, found: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MridType {
    DefaultDoe = 0,
    DerProgram = 1,
    DynamicOperatingEnvelope = 2,
    FunctionSetAssignment = 3,
    MirrorUsagePoint = 4,
    MirrorMeterReading = 5,
    Tariff = 6,
    RateComponent = 7,
    TimeTariffInterval = 8,
    ResponseSet = 9,
}

impl MridType {
    fn from_discriminant(value: u8) -> Result<Self, MridError> {
        Ok(match value {
            0 => MridType::DefaultDoe,
            1 => MridType::DerProgram,
            2 => MridType::DynamicOperatingEnvelope,
            3 => MridType::FunctionSetAssignment,
            4 => MridType::MirrorUsagePoint,
            5 => MridType::MirrorMeterReading,
            6 => MridType::Tariff,
            7 => MridType::RateComponent,
            8 => MridType::TimeTariffInterval,
            9 => MridType::ResponseSet,
            other => return Err(MridError::UnknownMridType(other)),
        })
    }
}

fn id_field_mask() -> u128 {
    (1u128 << ID_WIDTH_BITS) - 1
}

/// Empaqueta `(mrid_type, id, iana_pen)` en los 32 caracteres hex finales.
pub fn encode_mrid(mrid_type: MridType, id: u128, iana_pen: u32) -> Result<String, MridError> {
    if id > id_field_mask() {
        return Err(MridError::FieldOverflow("id exceeds 92 bits"));
    }
    let value = ((mrid_type as u128) << (ID_WIDTH_BITS + IANA_PEN_WIDTH_BITS))
        | (id << IANA_PEN_WIDTH_BITS)
        | (iana_pen as u128);
    Ok(format!("{value:032x}"))
}

/// Desempaqueta un mrid en sus tres campos. Acepta hex en mayuscula o minuscula.
pub fn decode_mrid(mrid: &str) -> Result<(MridType, u128, u32), MridError> {
    if mrid.len() != 32 {
        return Err(MridError::MalformedLength(mrid.len()));
    }
    let value = u128::from_str_radix(mrid, 16).map_err(|_| MridError::NotHex)?;
    let mrid_type_bits = (value >> (ID_WIDTH_BITS + IANA_PEN_WIDTH_BITS)) as u8 & 0xF;
    let mrid_type = MridType::from_discriminant(mrid_type_bits)?;
    let id = (value >> IANA_PEN_WIDTH_BITS) & id_field_mask();
    let iana_pen = (value & 0xFFFF_FFFF) as u32;
    Ok((mrid_type, id, iana_pen))
}

pub fn decode_iana_pen(mrid: &str) -> Result<u32, MridError> {
    decode_mrid(mrid).map(|(_, _, pen)| pen)
}

/// Falla si el `iana_pen` codificado no coincide con el esperado por el
/// scope del solicitante, previniendo la reutilizacion de mrid entre
/// despliegues distintos.
pub fn decode_and_validate_mrid_type(
    mrid: &str,
    expected_iana_pen: u32,
) -> Result<(MridType, u128), MridError> {
    let (mrid_type, id, found) = decode_mrid(mrid)?;
    if found != expected_iana_pen {
        return Err(MridError::IanaPenMismatch {
            expected: expected_iana_pen,
            found,
        });
    }
    Ok((mrid_type, id))
}

pub fn encode_doe_id(doe_id: u64) -> u128 {
    doe_id as u128
}

pub fn encode_der_program_id(site_id: u32) -> u128 {
    (DER_PROGRAM_PREFIX << 80) | site_id as u128
}

pub fn encode_fsa_id(site_id: u32, fsa_id: u32) -> u128 {
    ((site_id as u128) << 32) | fsa_id as u128
}

pub fn encode_reading_type_id(site_reading_type_id: u32) -> u128 {
    site_reading_type_id as u128
}

pub fn encode_tariff_id(tariff_id: u32) -> u128 {
    tariff_id as u128
}

/// `tariff_id(32) << 60 | site_id(32) << 28 | (prt-1)(2) << 26 | minutes_since_2000utc(26)`.
pub fn encode_rate_component_id(
    tariff_id: u32,
    site_id: u32,
    pricing_reading_type: u8,
    minutes_since_2000_utc: u32,
) -> Result<u128, MridError> {
    if !(1..=4).contains(&pricing_reading_type) {
        return Err(MridError::InvalidPricingReadingType(pricing_reading_type));
    }
    if minutes_since_2000_utc >= (1 << 26) {
        return Err(MridError::FieldOverflow("minutes_since_2000_utc exceeds 26 bits"));
    }
    let prt_bits = (pricing_reading_type - 1) as u128;
    Ok(((tariff_id as u128) << 60)
        | ((site_id as u128) << 28)
        | (prt_bits << 26)
        | minutes_since_2000_utc as u128)
}

/// `(prt-1)(2) << 90 | tariff_generated_rate_id(64)`.
pub fn encode_time_tariff_interval_id(
    tariff_generated_rate_id: u64,
    pricing_reading_type: u8,
) -> Result<u128, MridError> {
    if !(1..=4).contains(&pricing_reading_type) {
        return Err(MridError::InvalidPricingReadingType(pricing_reading_type));
    }
    let prt_bits = (pricing_reading_type - 1) as u128;
    Ok((prt_bits << 90) | tariff_generated_rate_id as u128)
}

pub fn encode_response_set_id(response_set_type: u32) -> u128 {
    response_set_type as u128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_doe_mrid() {
        let id = encode_doe_id(42);
        let mrid = encode_mrid(MridType::DynamicOperatingEnvelope, id, 1).unwrap();
        assert_eq!(mrid.len(), 32);
        let (mrid_type, decoded_id, pen) = decode_mrid(&mrid).unwrap();
        assert_eq!(mrid_type, MridType::DynamicOperatingEnvelope);
        assert_eq!(decoded_id, 42);
        assert_eq!(pen, 1);
    }

    #[test]
    fn decode_is_case_insensitive() {
        let id = encode_doe_id(7);
        let mrid = encode_mrid(MridType::DynamicOperatingEnvelope, id, 9).unwrap();
        let upper = mrid.to_uppercase();
        assert_eq!(decode_mrid(&mrid).unwrap(), decode_mrid(&upper).unwrap());
    }

    #[test]
    fn der_program_prefix_is_embedded() {
        let id = encode_der_program_id(99);
        assert_eq!(id >> 80, DER_PROGRAM_PREFIX);
        assert_eq!(id & 0xFFFF_FFFF, 99);
    }

    #[test]
    fn rate_component_rejects_bad_prt() {
        assert_eq!(
            encode_rate_component_id(1, 1, 5, 0),
            Err(MridError::InvalidPricingReadingType(5))
        );
    }

    #[test]
    fn rate_component_layout_matches_spec() {
        let id = encode_rate_component_id(3, 7, 2, 120).unwrap();
        assert_eq!((id >> 60) & 0xFFFF_FFFF, 3);
        assert_eq!((id >> 28) & 0xFFFF_FFFF, 7);
        assert_eq!((id >> 26) & 0b11, 1);
        assert_eq!(id & ((1 << 26) - 1), 120);
    }

    #[test]
    fn validate_mrid_type_checks_iana_pen() {
        let id = encode_doe_id(1);
        let mrid = encode_mrid(MridType::DynamicOperatingEnvelope, id, 5).unwrap();
        assert_eq!(
            decode_and_validate_mrid_type(&mrid, 6),
            Err(MridError::IanaPenMismatch {
                expected: 6,
                found: 5
            })
        );
        assert!(decode_and_validate_mrid_type(&mrid, 5).is_ok());
    }

    #[test]
    fn rejects_malformed_length() {
        assert_eq!(decode_mrid("deadbeef"), Err(MridError::MalformedLength(8)));
    }

    #[test]
    fn default_doe_literal_id() {
        let mrid = encode_mrid(MridType::DefaultDoe, DEFAULT_DOE_ID, 1).unwrap();
        let (mrid_type, id, _) = decode_mrid(&mrid).unwrap();
        assert_eq!(mrid_type, MridType::DefaultDoe);
        assert_eq!(id, 0xdefa017);
    }
}
// FIN DEL ARCHIVO [libs/domain/mrid/src/lib.rs]
