//! Record kinds: madurador (maturation) and lote (batch)
//!
//! Each kind has a typed creation record and a typed patch. Both convert into
//! storage documents; patches only carry the fields that were supplied.

use bson::{Bson, Document};

use crate::config::StoreConfig;
use crate::error::ValidationError;
use crate::normalize::{
    coerce_date, coerce_embedded, coerce_number, coerce_text, RawField, RawInput, Volume,
};

/// A storable record kind
///
/// `NAME` is the singular name used in route paths (`create_<NAME>`).
pub trait RecordKind: Sized + Into<Document> + Send + Sync + 'static {
    const NAME: &'static str;

    type Patch: Into<Document> + Send;

    fn collection(config: &StoreConfig) -> &str;

    /// Creation: required fields must be present, optional fields default
    fn from_input(input: &RawInput) -> Result<Self, ValidationError>;

    /// Partial update: only supplied non-null fields are kept
    fn patch_from_input(input: &RawInput) -> Result<Self::Patch, ValidationError>;
}

fn optional<T>(
    input: &RawInput,
    field: &str,
    coerce: impl Fn(&str, &RawField) -> Result<T, ValidationError>,
) -> Result<Option<T>, ValidationError> {
    input.get(field).map(|raw| coerce(field, raw)).transpose()
}

fn required<T>(
    input: &RawInput,
    field: &str,
    coerce: impl Fn(&str, &RawField) -> Result<T, ValidationError>,
) -> Result<T, ValidationError> {
    coerce(field, input.required(field)?)
}

fn set(doc: &mut Document, key: &str, value: Option<impl Into<Bson>>) {
    if let Some(value) = value {
        doc.insert(key, value.into());
    }
}

// =============================================================================
// Madurador
// =============================================================================

/// Maturation record
#[derive(Debug, Clone, PartialEq)]
pub struct Madurador {
    pub litros: Volume,
    pub estado: String,
    pub notas: String,
    /// Embedded snapshot of the lote, `_id` stored as an object id
    pub lote: Document,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaduradorPatch {
    pub litros: Option<Volume>,
    pub estado: Option<String>,
    pub notas: Option<String>,
    pub lote: Option<Document>,
}

impl RecordKind for Madurador {
    const NAME: &'static str = "madurador";

    type Patch = MaduradorPatch;

    fn collection(config: &StoreConfig) -> &str {
        &config.maduradores_collection
    }

    fn from_input(input: &RawInput) -> Result<Self, ValidationError> {
        Ok(Self {
            litros: required(input, "litros", coerce_number)?,
            estado: required(input, "estado", coerce_text)?,
            notas: optional(input, "notas", coerce_text)?.unwrap_or_default(),
            lote: required(input, "lote", coerce_embedded)?,
        })
    }

    fn patch_from_input(input: &RawInput) -> Result<MaduradorPatch, ValidationError> {
        Ok(MaduradorPatch {
            litros: optional(input, "litros", coerce_number)?,
            estado: optional(input, "estado", coerce_text)?,
            notas: optional(input, "notas", coerce_text)?,
            lote: optional(input, "lote", coerce_embedded)?,
        })
    }
}

impl From<Madurador> for Document {
    fn from(record: Madurador) -> Self {
        let mut doc = Document::new();
        doc.insert("litros", Bson::from(record.litros));
        doc.insert("estado", record.estado);
        doc.insert("notas", record.notas);
        doc.insert("lote", record.lote);
        doc
    }
}

impl From<MaduradorPatch> for Document {
    fn from(patch: MaduradorPatch) -> Self {
        let mut doc = Document::new();
        set(&mut doc, "litros", patch.litros);
        set(&mut doc, "estado", patch.estado);
        set(&mut doc, "notas", patch.notas);
        set(&mut doc, "lote", patch.lote);
        doc
    }
}

// =============================================================================
// Lote
// =============================================================================

/// Batch record
#[derive(Debug, Clone, PartialEq)]
pub struct Lote {
    pub cerveza: String,
    pub estado: String,
    pub cantidad_litros: Volume,
    pub fecha_carga: bson::DateTime,
    pub fecha_vencimiento: bson::DateTime,
    pub notas: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LotePatch {
    pub cerveza: Option<String>,
    pub estado: Option<String>,
    pub cantidad_litros: Option<Volume>,
    pub fecha_carga: Option<bson::DateTime>,
    pub fecha_vencimiento: Option<bson::DateTime>,
    pub notas: Option<String>,
}

impl RecordKind for Lote {
    const NAME: &'static str = "lote";

    type Patch = LotePatch;

    fn collection(config: &StoreConfig) -> &str {
        &config.lotes_collection
    }

    fn from_input(input: &RawInput) -> Result<Self, ValidationError> {
        Ok(Self {
            cerveza: required(input, "cerveza", coerce_text)?,
            estado: required(input, "estado", coerce_text)?,
            cantidad_litros: required(input, "cantidadLitros", coerce_number)?,
            fecha_carga: required(input, "fechaCarga", coerce_date)?,
            fecha_vencimiento: required(input, "fechaVencimiento", coerce_date)?,
            notas: optional(input, "notas", coerce_text)?.unwrap_or_default(),
        })
    }

    fn patch_from_input(input: &RawInput) -> Result<LotePatch, ValidationError> {
        Ok(LotePatch {
            cerveza: optional(input, "cerveza", coerce_text)?,
            estado: optional(input, "estado", coerce_text)?,
            cantidad_litros: optional(input, "cantidadLitros", coerce_number)?,
            fecha_carga: optional(input, "fechaCarga", coerce_date)?,
            fecha_vencimiento: optional(input, "fechaVencimiento", coerce_date)?,
            notas: optional(input, "notas", coerce_text)?,
        })
    }
}

impl From<Lote> for Document {
    fn from(record: Lote) -> Self {
        let mut doc = Document::new();
        doc.insert("cerveza", record.cerveza);
        doc.insert("estado", record.estado);
        doc.insert("cantidadLitros", Bson::from(record.cantidad_litros));
        doc.insert("fechaCarga", record.fecha_carga);
        doc.insert("fechaVencimiento", record.fecha_vencimiento);
        doc.insert("notas", record.notas);
        doc
    }
}

impl From<LotePatch> for Document {
    fn from(patch: LotePatch) -> Self {
        let mut doc = Document::new();
        set(&mut doc, "cerveza", patch.cerveza);
        set(&mut doc, "estado", patch.estado);
        set(&mut doc, "cantidadLitros", patch.cantidad_litros);
        set(&mut doc, "fechaCarga", patch.fecha_carga);
        set(&mut doc, "fechaVencimiento", patch.fecha_vencimiento);
        set(&mut doc, "notas", patch.notas);
        doc
    }
}
