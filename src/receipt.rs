//! Transaction receipts as they are shown on screen and exported.

use rootrpc::Receipt;

const TRUNCATE_CHARS: usize = 6;

/// Snapshot of a successful receipt lookup.
///
/// Created by a successful fetch and replaced wholesale by the next one. Nothing hands out a
/// mutable borrow of a held receipt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionReceiptView {
    pub transaction_hash: String,
    pub from: String,

    /// Empty for contract creation, which has no recipient.
    pub to: String,

    /// Only present for contract creation.
    pub contract_address: Option<String>,

    pub cumulative_gas_used: u64,
    pub block_number: u64,
}

/// [`TransactionReceiptView`] fields formatted for the results panel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DisplayFields {
    /// First and last six characters of the hash, joined by `...`.
    pub transaction_hash: String,
    pub from: String,
    pub contract_address: String,
    pub to: String,
    pub cumulative_gas_used: String,
    pub block_number: String,
}

impl From<Receipt> for TransactionReceiptView {
    fn from(receipt: Receipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            from: receipt.from,
            to: receipt.to.unwrap_or_default(),
            contract_address: receipt.contract_address,
            cumulative_gas_used: receipt.cumulative_gas_used,
            block_number: receipt.block_number,
        }
    }
}

impl TransactionReceiptView {
    pub fn to_display_fields(&self) -> DisplayFields {
        DisplayFields {
            transaction_hash: truncate_hash(&self.transaction_hash),
            from: self.from.clone(),
            contract_address: self.contract_address.clone().unwrap_or_default(),
            to: self.to.clone(),
            cumulative_gas_used: self.cumulative_gas_used.to_string(),
            block_number: self.block_number.to_string(),
        }
    }

    /// The text block encoded in the QR code and written to the PDF, one field per line.
    ///
    /// Line order is fixed. A missing contract address is rendered as an empty value instead of
    /// dropping the line.
    pub fn to_export_payload(&self) -> String {
        let contract_address = self.contract_address.as_deref().unwrap_or_default();

        [
            format!("Transaction Hash: {}", self.transaction_hash),
            format!("From: {}", self.from),
            format!("To: {}", self.to),
            format!("Contract Address: {contract_address}"),
            format!("Cumulative Gas Used: {}", self.cumulative_gas_used),
            format!("Block Number: {}", self.block_number),
        ]
        .join("\n")
    }
}

/// Hashes shorter than twelve characters overlap, e.g. `0xabc` becomes `0xabc...0xabc`.
fn truncate_hash(hash: &str) -> String {
    let chars = hash.chars().collect::<Vec<_>>();
    let head = chars.iter().take(TRUNCATE_CHARS).collect::<String>();
    let tail = chars[chars.len().saturating_sub(TRUNCATE_CHARS)..]
        .iter()
        .collect::<String>();

    format!("{head}...{tail}")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use arbtest::arbtest;

    pub(crate) const SAMPLE_HASH: &str =
        "0xabc1230000000000000000000000000000000000000000000000000000def456";

    pub(crate) fn sample_receipt() -> TransactionReceiptView {
        TransactionReceiptView {
            transaction_hash: SAMPLE_HASH.to_string(),
            from: "0x1111".to_string(),
            to: "0x2222".to_string(),
            contract_address: None,
            cumulative_gas_used: 21000,
            block_number: 500,
        }
    }

    #[test]
    fn test_display_fields() {
        let fields = sample_receipt().to_display_fields();

        assert_eq!(
            fields,
            DisplayFields {
                transaction_hash: "0xabc1...def456".to_string(),
                from: "0x1111".to_string(),
                contract_address: String::new(),
                to: "0x2222".to_string(),
                cumulative_gas_used: "21000".to_string(),
                block_number: "500".to_string(),
            },
        );
    }

    #[test]
    fn test_export_payload() {
        let payload = sample_receipt().to_export_payload();

        assert_eq!(
            payload,
            "Transaction Hash: 0xabc1230000000000000000000000000000000000000000000000000000def456\n\
             From: 0x1111\n\
             To: 0x2222\n\
             Contract Address: \n\
             Cumulative Gas Used: 21000\n\
             Block Number: 500",
        );
        assert_eq!(payload.lines().count(), 6);
        assert_eq!(payload, sample_receipt().to_export_payload());
    }

    #[test]
    fn test_export_payload_contract_creation() {
        let receipt = TransactionReceiptView {
            to: String::new(),
            contract_address: Some("0x3333".to_string()),
            ..sample_receipt()
        };
        let lines = receipt.to_export_payload();
        let lines = lines.lines().collect::<Vec<_>>();

        assert_eq!(lines[2], "To: ");
        assert_eq!(lines[3], "Contract Address: 0x3333");
    }

    #[test]
    fn test_from_rpc_receipt() {
        let receipt = Receipt {
            transaction_hash: SAMPLE_HASH.to_string(),
            from: "0x1111".to_string(),
            to: None,
            contract_address: Some("0x3333".to_string()),
            cumulative_gas_used: 1,
            block_number: 2,
        };
        let view = TransactionReceiptView::from(receipt);

        assert_eq!(view.to, "");
        assert_eq!(view.contract_address.as_deref(), Some("0x3333"));
    }

    #[test]
    fn test_truncate_short_hashes() {
        assert_eq!(truncate_hash(""), "...");
        assert_eq!(truncate_hash("0xabc"), "0xabc...0xabc");
        assert_eq!(truncate_hash("0x12345678"), "0x1234...345678");
    }

    #[test]
    fn prop_test_truncate_hash() {
        let test = |u: &mut arbtest::arbitrary::Unstructured<'_>| {
            let hash: String = u.arbitrary()?;
            let chars = hash.chars().collect::<Vec<_>>();
            let truncated = truncate_hash(&hash);

            let head = chars.iter().take(6).collect::<String>();
            let tail = chars[chars.len().saturating_sub(6)..]
                .iter()
                .collect::<String>();

            assert_eq!(truncated, format!("{head}...{tail}"));
            if chars.len() >= 12 {
                assert_eq!(truncated.chars().count(), 15);
            }

            Ok(())
        };

        arbtest(test).budget_ms(200).run();
    }
}
