//! Receipt lookup state machine.
//!
//! [`Controller`] owns the query and the [`ViewState`]. A lookup is split in two halves so that
//! the network call can happen elsewhere: [`Controller::submit`] hands out a [`Ticket`], and
//! [`Controller::resolve`] applies the outcome for that ticket.
//!
//! Superseded lookups are not cancelled. With the default [`ResolvePolicy::LastResolved`] the last
//! outcome to arrive wins, even when it belongs to an older submit. Out-of-order responses can
//! therefore leave a stale receipt on screen. [`ResolvePolicy::LatestSubmit`] drops outcomes for
//! anything but the newest ticket instead.

use crate::client::{FetchError, ReceiptApi};
use crate::export::{self, ExportError, QrError};
use crate::receipt::TransactionReceiptView;
use qrcode::QrCode;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What the screen shows. Receipt and error are mutually exclusive.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Success(TransactionReceiptView),
    Failed(String),
}

impl ViewState {
    pub fn receipt(&self) -> Option<&TransactionReceiptView> {
        match self {
            Self::Success(receipt) => Some(receipt),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// How outcomes of overlapping lookups are applied.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ResolvePolicy {
    /// Every outcome is applied in arrival order.
    #[default]
    LastResolved,

    /// Only the outcome for the most recent submit is applied.
    LatestSubmit,
}

/// A pending lookup, created by [`Controller::submit`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ticket {
    seq: u64,
    query: String,
}

impl Ticket {
    /// Position of this lookup among all submits of its controller, starting at zero.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The transaction hash as it was entered when submitted.
    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Default)]
pub struct Controller {
    query: String,
    state: ViewState,
    policy: ResolvePolicy,
    next_seq: u64,
}

impl Controller {
    pub fn new(policy: ResolvePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn policy(&self) -> ResolvePolicy {
        self.policy
    }

    /// Start a lookup for the current query.
    ///
    /// Any receipt or error is cleared immediately. The query is not validated, an empty query is
    /// still looked up.
    pub fn submit(&mut self) -> Ticket {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.state = ViewState::Loading;

        debug!("Submitted lookup #{seq} for `{}`", self.query);

        Ticket {
            seq,
            query: self.query.clone(),
        }
    }

    /// Apply the outcome of a lookup. Returns `false` when the outcome was dropped by the policy.
    pub fn resolve(
        &mut self,
        ticket: Ticket,
        result: Result<TransactionReceiptView, FetchError>,
    ) -> bool {
        if self.policy == ResolvePolicy::LatestSubmit && ticket.seq + 1 != self.next_seq {
            debug!(
                "Ignoring lookup #{} for `{}`, superseded by #{}",
                ticket.seq,
                ticket.query,
                self.next_seq - 1,
            );

            return false;
        }

        self.state = match result {
            Ok(receipt) => {
                info!("Lookup #{} found `{}`", ticket.seq, receipt.transaction_hash);
                ViewState::Success(receipt)
            }
            Err(err) => {
                warn!("Lookup #{} for `{}` failed: {err}", ticket.seq, ticket.query);
                ViewState::Failed(err.to_string())
            }
        };

        true
    }

    /// Submit and resolve with a single blocking call to `api`.
    pub fn submit_with<A>(&mut self, api: &A) -> &ViewState
    where
        A: ReceiptApi + ?Sized,
    {
        let ticket = self.submit();
        let result = api.fetch_receipt(ticket.query());
        self.resolve(ticket, result);

        &self.state
    }

    /// Write the PDF receipt into `dir`.
    ///
    /// Returns `Ok(None)` without writing anything when no receipt is held.
    pub fn export_pdf(&self, dir: &Path) -> Result<Option<PathBuf>, ExportError> {
        self.state
            .receipt()
            .map(|receipt| export::write_pdf(receipt, dir))
            .transpose()
    }

    /// Write the QR code of the held receipt as an SVG image. Returns `Ok(false)` when no receipt
    /// is held.
    pub fn export_qr_svg(&self, path: &Path) -> Result<bool, ExportError> {
        match self.state.receipt() {
            Some(receipt) => export::write_qr_svg(receipt, path).map(|_| true),
            None => Ok(false),
        }
    }

    /// QR code for the held receipt, if any.
    pub fn qr_code(&self) -> Option<Result<QrCode, QrError>> {
        self.state.receipt().map(export::qr::encode)
    }
}
