//! Text rendering of the receipt screen.

use crate::controller::{Controller, ViewState};
use crate::export::qr;
use std::fmt;

pub const TITLE: &str = "Transaction Receipt Generator";

/// Keys accepted by the interactive session, shown while idle.
pub const HELP: &str =
    "Enter a transaction hash to fetch its receipt. `:pdf` exports, `:qr <path>` saves the QR code, `:quit` exits.";

/// The whole screen for one controller state.
///
/// The QR code is derived from the held receipt every time the screen is drawn.
pub struct Screen<'a>(pub &'a Controller);

impl fmt::Display for Screen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let controller = self.0;

        writeln!(f, "{TITLE}")?;
        writeln!(f, "> {}", controller.query())?;
        writeln!(f)?;

        match controller.state() {
            ViewState::Idle => writeln!(f, "{HELP}")?,
            ViewState::Loading => writeln!(f, "Loading...")?,
            ViewState::Failed(message) => writeln!(f, "Error: {message}")?,
            ViewState::Success(receipt) => {
                let fields = receipt.to_display_fields();

                writeln!(f, "Transaction Details")?;
                writeln!(f, "  Transaction Hash: {}", fields.transaction_hash)?;
                writeln!(f, "  From: {}", fields.from)?;
                writeln!(f, "  Contract Address: {}", fields.contract_address)?;
                writeln!(f, "  To: {}", fields.to)?;
                writeln!(f, "  Cumulative Gas Used: {}", fields.cumulative_gas_used)?;
                writeln!(f, "  Block Number: {}", fields.block_number)?;
                writeln!(f)?;
                writeln!(f, "QR Code")?;

                match controller.qr_code() {
                    Some(Ok(code)) => writeln!(f, "{}", qr::to_terminal(&code))?,
                    Some(Err(err)) => writeln!(f, "{err}")?,
                    None => (),
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchError;
    use crate::receipt::tests::{sample_receipt, SAMPLE_HASH};

    #[test]
    fn test_idle_screen() {
        let screen = Screen(&Controller::default()).to_string();

        assert!(screen.starts_with("Transaction Receipt Generator\n> \n"));
        assert!(screen.contains(HELP));
    }

    #[test]
    fn test_loading_screen() {
        let mut controller = Controller::default();
        controller.set_query(SAMPLE_HASH);
        controller.submit();

        let screen = Screen(&controller).to_string();

        assert!(screen.contains(&format!("> {SAMPLE_HASH}\n")));
        assert!(screen.contains("Loading..."));
        assert!(!screen.contains("Transaction Details"));
    }

    #[test]
    fn test_error_screen() {
        let mut controller = Controller::default();
        let ticket = controller.submit();
        controller.resolve(ticket, Err(FetchError::NotFound));

        let screen = Screen(&controller).to_string();

        assert!(screen.contains("Error: Transaction not found!\n"));
        assert!(!screen.contains("Transaction Details"));
        assert!(!screen.contains("QR Code"));
    }

    #[test]
    fn test_success_screen() {
        let mut controller = Controller::default();
        let ticket = controller.submit();
        controller.resolve(ticket, Ok(sample_receipt()));

        let screen = Screen(&controller).to_string();
        let details = screen
            .lines()
            .skip_while(|line| *line != "Transaction Details")
            .take(7)
            .collect::<Vec<_>>();

        assert_eq!(
            details,
            [
                "Transaction Details",
                "  Transaction Hash: 0xabc1...def456",
                "  From: 0x1111",
                "  Contract Address: ",
                "  To: 0x2222",
                "  Cumulative Gas Used: 21000",
                "  Block Number: 500",
            ],
        );
        assert!(screen.contains("QR Code\n"));
        assert!(!screen.contains("Error:"));
    }
}
