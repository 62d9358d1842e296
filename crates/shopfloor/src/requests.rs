//! Request payloads and their validation.
//!
//! Payload fields are optional at the serde level so that a missing field
//! surfaces as a `Validation` error naming it, not as a body rejection.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, ShopfloorError};

/// An identifier or count sent either as a JSON integer or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Int(n) => n.to_string(),
            Scalar::Text(s) => s.trim().to_string(),
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Scalar::Text(s) if s.trim().is_empty())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

fn required_text(value: &Option<Scalar>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.is_blank() => Ok(v.to_text()),
        _ => Err(ShopfloorError::validation(format!(
            "Missing required field: {}",
            field
        ))),
    }
}

fn required_int(value: &Option<Scalar>, field: &str) -> Result<i64> {
    let text = required_text(value, field)?;
    value
        .as_ref()
        .and_then(Scalar::to_i64)
        .ok_or_else(|| {
            ShopfloorError::validation(format!("Field {} must be an integer, got '{}'", field, text))
        })
}

fn required_id(value: &Option<Scalar>, field: &str) -> Result<i64> {
    match required_int(value, field)? {
        id if id > 0 => Ok(id),
        _ => Err(ShopfloorError::validation(format!(
            "Missing required field: {}",
            field
        ))),
    }
}

fn non_negative(quantity: i64, field: &str) -> Result<i64> {
    if quantity < 0 {
        return Err(ShopfloorError::validation(format!(
            "Field {} must not be negative",
            field
        )));
    }
    Ok(quantity)
}

/// Validates the `operator_code` query parameter.
pub fn validate_operator_code(value: Option<&str>) -> Result<&str> {
    match value.map(str::trim) {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(ShopfloorError::validation("Operator code not provided")),
    }
}

/// Validates the `file_path` query parameter. Runs before any filesystem
/// access.
pub fn validate_file_path(value: Option<&str>) -> Result<&str> {
    let path = match value {
        Some(p) if !p.trim().is_empty() => p,
        _ => return Err(ShopfloorError::validation("File path not provided")),
    };
    if path.contains("..") {
        return Err(ShopfloorError::validation("Invalid file path"));
    }
    Ok(path)
}

/// Body of `POST /apontamento/start`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRequest {
    pub of_id: Option<Scalar>,
    pub empresa_id: Option<Scalar>,
    pub operator_code: Option<Scalar>,
    pub operac: Option<Scalar>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartApontamento {
    pub job_number: String,
    pub company_id: String,
    pub operator_code: String,
    pub operation_code: String,
}

impl StartRequest {
    pub fn validate(&self) -> Result<StartApontamento> {
        let operation_code = match &self.operac {
            Some(op) if !op.is_blank() => op.to_text(),
            _ => "1".to_string(),
        };
        Ok(StartApontamento {
            job_number: required_text(&self.of_id, "of_id")?,
            company_id: required_text(&self.empresa_id, "empresa_id")?,
            operator_code: required_text(&self.operator_code, "operator_code")?,
            operation_code,
        })
    }
}

/// Body of `POST /apontamento/pause`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PauseRequest {
    pub apontamento_id: Option<Scalar>,
}

impl PauseRequest {
    pub fn validate(&self) -> Result<i64> {
        required_id(&self.apontamento_id, "apontamento_id")
    }
}

/// Body of `POST /apontamento/finish`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinishRequest {
    pub apontamento_id: Option<Scalar>,
    pub quantidade_boa: Option<Scalar>,
}

impl FinishRequest {
    /// Returns `(apontamento_id, good_quantity)`.
    pub fn validate(&self) -> Result<(i64, i64)> {
        let id = required_id(&self.apontamento_id, "apontamento_id")?;
        let quantity = required_int(&self.quantidade_boa, "quantidade_boa")?;
        Ok((id, non_negative(quantity, "quantidade_boa")?))
    }
}

/// Body of `POST /submit_apontamento`, the legacy one-shot submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    pub sof_apontamentoid: Option<Value>,
    pub of_numero: Option<Scalar>,
    pub operador_codigo: Option<Scalar>,
    pub data_inicio: Option<String>,
    pub tempo_total_pdf: Option<String>,
    pub quantidade_realizada: Option<Scalar>,
    pub soc_codseq: Option<Scalar>,
    pub soc_empresa: Option<Scalar>,
    pub sof_errointegra: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitApontamento {
    pub job_number: String,
    pub operator_code: String,
    pub start_time: String,
    pub duration: String,
    pub sequence_code: String,
    pub quantity: i64,
    pub company_id: String,
    pub integration_error: String,
}

impl SubmitRequest {
    pub fn validate(&self) -> Result<SubmitApontamento> {
        let missing = |field: &str| {
            ShopfloorError::validation(format!("Missing or null required field: {}", field))
        };

        if self.sof_apontamentoid.is_none() {
            return Err(missing("sof_apontamentoid"));
        }
        let job_number = required_text(&self.of_numero, "of_numero")?;
        let operator_code = required_text(&self.operador_codigo, "operador_codigo")?;
        let start_time = self
            .data_inicio
            .clone()
            .ok_or_else(|| missing("data_inicio"))?;
        let duration = self
            .tempo_total_pdf
            .clone()
            .ok_or_else(|| missing("tempo_total_pdf"))?;
        let quantity = required_int(&self.quantidade_realizada, "quantidade_realizada")?;
        let sequence_code = required_text(&self.soc_codseq, "soc_codseq")?;
        let company_id = required_text(&self.soc_empresa, "soc_empresa")?;
        let integration_error = match &self.sof_errointegra {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => return Err(missing("sof_errointegra")),
        };

        Ok(SubmitApontamento {
            job_number,
            operator_code,
            start_time,
            duration,
            sequence_code,
            quantity: non_negative(quantity, "quantidade_realizada")?,
            company_id,
            integration_error,
        })
    }
}

/// Body of `POST /apontamento/confirm_batch`.
///
/// `apontamento_id` carries the job number all items are booked against.
/// Items stay raw JSON so that a malformed item fails alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmBatchRequest {
    pub apontamento_id: Option<Scalar>,
    pub operator_code: Option<Scalar>,
    pub soc_empresa: Option<Scalar>,
    pub soc_codseq: Option<Scalar>,
    #[serde(default)]
    pub items: Vec<Value>,
}

/// Fields shared by every item of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchHeader {
    pub job_number: String,
    pub operator_code: String,
    pub company_id: String,
    pub sequence_code: String,
}

/// One timed entry of a batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchItem {
    pub start_time: String,
    pub total_time: String,
    pub qtd_apontar: Option<Scalar>,
}

impl BatchItem {
    pub fn quantity(&self) -> Result<i64> {
        let quantity = match &self.qtd_apontar {
            None => 0,
            Some(q) => q.to_i64().ok_or_else(|| {
                ShopfloorError::validation(format!(
                    "Field qtd_apontar must be an integer, got '{}'",
                    q.to_text()
                ))
            })?,
        };
        non_negative(quantity, "qtd_apontar")
    }
}

impl ConfirmBatchRequest {
    pub fn validate(&self) -> Result<BatchHeader> {
        Ok(BatchHeader {
            job_number: required_text(&self.apontamento_id, "apontamento_id")?,
            operator_code: required_text(&self.operator_code, "operator_code")?,
            company_id: required_text(&self.soc_empresa, "soc_empresa")?,
            sequence_code: required_text(&self.soc_codseq, "soc_codseq")?,
        })
    }
}
