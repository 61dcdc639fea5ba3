use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// JSON RPC parsing errors for [`Receipt`].
#[derive(Debug, Error)]
pub enum Error {
    /// JSON parsing error.
    #[error("Unable to parse JSON")]
    Json(#[from] serde_json::Error),

    /// The node answered with a JSON RPC error object. The message is kept verbatim.
    #[error("{message}")]
    Response { code: i64, message: String },

    /// Response is missing a field.
    #[error("JSON RPC response is missing field `{0}`")]
    MissingField(&'static str),

    /// Response has the wrong type for a field.
    #[error("JSON RPC response has wrong type for field `{0}`")]
    WrongFieldType(&'static str),

    /// Response field is not a valid hex `QUANTITY`.
    #[error("JSON RPC response field `{0}` is not a valid quantity")]
    Quantity(&'static str, #[source] std::num::ParseIntError),
}

/// The subset of an `eth_getTransactionReceipt` result this crate cares about.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub struct Receipt {
    /// Hash of the transaction.
    pub transaction_hash: String,

    /// Sender address.
    pub from: String,

    /// Recipient address. `None` for contract creation.
    pub to: Option<String>,

    /// Address of the deployed contract, for contract creation only.
    pub contract_address: Option<String>,

    /// Total gas used in the block up to and including this transaction.
    pub cumulative_gas_used: u64,

    /// Number of the block containing the transaction.
    pub block_number: u64,
}

impl Receipt {
    /// Parse a JSON RPC response from any type that implements [`Read`].
    ///
    /// Returns `Ok(None)` when the node does not know the transaction (`"result": null`).
    ///
    /// [`Read`]: std::io::Read
    pub fn from_rpc_reader<R>(value: R) -> Result<Option<Self>, Error>
    where
        R: std::io::Read,
    {
        Self::from_rpc_value(&serde_json::from_reader(value)?)
    }

    /// Parse a JSON RPC response from a string.
    pub fn from_rpc_str(value: &str) -> Result<Option<Self>, Error> {
        Self::from_rpc_value(&serde_json::from_str(value)?)
    }

    /// Parse a JSON RPC response from a [`Value`].
    pub fn from_rpc_value(value: &Value) -> Result<Option<Self>, Error> {
        use Error::*;

        if !value["error"].is_null() {
            let error = &value["error"];

            return Err(Response {
                code: error["code"].as_i64().unwrap_or_default(),
                message: error["message"].as_str().unwrap_or_default().to_string(),
            });
        }

        let value = value.get("result").ok_or(MissingField("result"))?;
        if value.is_null() {
            return Ok(None);
        }

        Ok(Some(Receipt {
            transaction_hash: parse_field_str(value, "transactionHash")?,
            from: parse_field_str(value, "from")?,
            to: parse_field_opt_str(value, "to")?,
            contract_address: parse_field_opt_str(value, "contractAddress")?,
            cumulative_gas_used: parse_field_quantity(value, "cumulativeGasUsed")?,
            block_number: parse_field_quantity(value, "blockNumber")?,
        }))
    }
}

fn get_field<F, T>(value: &Value, field: &'static str, map: F) -> Result<T, Error>
where
    F: Fn(&Value) -> Result<T, Error>,
{
    value
        .get(field)
        .ok_or_else(|| Error::MissingField(field))
        .and_then(map)
}

fn parse_field_str(value: &Value, field: &'static str) -> Result<String, Error> {
    get_field(value, field, |value| {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::WrongFieldType(field))
    })
}

/// Absent and `null` fields are both `None`.
fn parse_field_opt_str(value: &Value, field: &'static str) -> Result<Option<String>, Error> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(Error::WrongFieldType(field)),
    }
}

/// Quantities are `0x`-prefixed hex strings on the wire. Plain JSON numbers are also accepted.
fn parse_field_quantity(value: &Value, field: &'static str) -> Result<u64, Error> {
    use Error::*;

    get_field(value, field, |value| match value {
        Value::String(text) => {
            let digits = text
                .strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .ok_or_else(|| WrongFieldType(field))?;

            u64::from_str_radix(digits, 16).map_err(|err| Quantity(field, err))
        }
        Value::Number(num) => num.as_u64().ok_or_else(|| WrongFieldType(field)),
        _ => Err(WrongFieldType(field)),
    })
}
