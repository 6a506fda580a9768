//! Postal code (CEP) address lookup against ViaCEP.
//!
//! [`AddressClient`] performs the HTTP lookup and maps the response into an
//! [`Address`]. [`AddressLookup`] owns the checkout address form and tags each
//! lookup with a generation number, so a slow response for an older postal
//! code can never overwrite the result of a newer one.
//!
//! Lookups are never retried. A failure leaves the form as it was and the
//! shopper fills the address in by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use noscope_core::{PostalCode, format_postal_code_input};

use crate::config::AddressLookupConfig;

/// Shown while a lookup is in flight.
pub const MSG_SEARCHING: &str = "Buscando endereço...";
/// Shown after the form was filled from a lookup.
pub const MSG_FOUND: &str = "Endereço preenchido automaticamente.";
/// Shown when the service knows no address for the code.
pub const MSG_NOT_FOUND: &str = "CEP não encontrado. Preencha manualmente.";
/// Shown when the service could not be reached.
pub const MSG_FAILED: &str = "Erro ao buscar CEP. Preencha manualmente.";

/// Errors that can occur when talking to the lookup service.
#[derive(Debug, Error)]
pub enum AddressError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("API error: {status}")]
    Api { status: u16 },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Address fields returned by a successful lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// Result of one lookup, as seen by the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Input is not yet a complete postal code; nothing was requested.
    Skipped,
    /// Address found.
    Found(Address),
    /// Valid code, but the service has no address for it.
    NotFound,
    /// Network or service failure.
    Failed,
}

impl LookupOutcome {
    /// Help text for the postal code field. `None` clears it.
    #[must_use]
    pub const fn message(&self) -> Option<&'static str> {
        match self {
            Self::Skipped => None,
            Self::Found(_) => Some(MSG_FOUND),
            Self::NotFound => Some(MSG_NOT_FOUND),
            Self::Failed => Some(MSG_FAILED),
        }
    }

    /// Short machine-readable name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Found(_) => "found",
            Self::NotFound => "not_found",
            Self::Failed => "failed",
        }
    }
}

/// ViaCEP JSON body.
///
/// Unknown codes come back as `{"erro": true}`; some deployments send the
/// string `"true"` instead of a boolean.
#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    logradouro: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

impl ViaCepResponse {
    fn is_not_found(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn into_address(self) -> Address {
        Address {
            street: self.logradouro.unwrap_or_default(),
            neighborhood: self.bairro.unwrap_or_default(),
            city: self.localidade.unwrap_or_default(),
            state: self.uf.unwrap_or_default(),
        }
    }
}

// =============================================================================
// AddressClient
// =============================================================================

/// HTTP client for the address lookup service.
///
/// Successful lookups are memoized for the configured TTL; misses and
/// failures are not.
#[derive(Clone)]
pub struct AddressClient {
    inner: Arc<AddressClientInner>,
}

struct AddressClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<PostalCode, Address>,
}

impl AddressClient {
    /// Create a new lookup client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &AddressLookupConfig) -> Result<Self, AddressError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(AddressClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
                cache,
            }),
        })
    }

    /// Fetch the address for a postal code. `Ok(None)` means the service
    /// has no address for it.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the service answers with a
    /// non-success status, or the body cannot be parsed.
    #[instrument(skip(self), fields(cep = %code.as_str()))]
    pub async fn fetch(&self, code: &PostalCode) -> Result<Option<Address>, AddressError> {
        if let Some(address) = self.inner.cache.get(code).await {
            debug!("Address cache hit");
            return Ok(Some(address));
        }

        let url = format!("{}/{}/json/", self.inner.base_url, code.as_str());
        let response = self.inner.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AddressError::Api {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: ViaCepResponse =
            serde_json::from_str(&body).map_err(|e| AddressError::Parse(e.to_string()))?;

        if parsed.is_not_found() {
            debug!("Postal code not found");
            return Ok(None);
        }

        let address = parsed.into_address();
        self.inner.cache.insert(code.clone(), address.clone()).await;
        Ok(Some(address))
    }

    /// Look up raw postal code input.
    ///
    /// Incomplete or malformed input is skipped without a request.
    pub async fn lookup(&self, raw: &str) -> LookupOutcome {
        let Ok(code) = PostalCode::parse(raw) else {
            return LookupOutcome::Skipped;
        };

        match self.fetch(&code).await {
            Ok(Some(address)) => LookupOutcome::Found(address),
            Ok(None) => LookupOutcome::NotFound,
            Err(e) => {
                warn!(cep = %code.as_str(), error = %e, "Address lookup failed");
                LookupOutcome::Failed
            }
        }
    }
}

// =============================================================================
// AddressLookup
// =============================================================================

/// Checkout address form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressForm {
    /// Postal code as typed, with the `12345-678` mask applied.
    pub postal_code: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    /// Help text under the postal code field.
    pub help: Option<String>,
}

impl AddressForm {
    /// The postal code, if the field holds a complete one.
    #[must_use]
    pub fn complete_postal_code(&self) -> Option<PostalCode> {
        PostalCode::parse(&self.postal_code).ok()
    }

    fn fill(&mut self, address: &Address) {
        self.street.clone_from(&address.street);
        self.neighborhood.clone_from(&address.neighborhood);
        self.city.clone_from(&address.city);
        self.state.clone_from(&address.state);
    }
}

/// Identifies one lookup request. Only the most recently issued ticket may
/// write to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket(u64);

/// What a lookup did, returned to the caller.
#[derive(Debug, Clone)]
pub struct LookupReport {
    pub outcome: LookupOutcome,
    /// False when a newer lookup superseded this one before it finished.
    pub applied: bool,
    pub form: AddressForm,
}

/// The shopper's address form plus the lookup generation counter.
pub struct AddressLookup {
    client: AddressClient,
    generation: AtomicU64,
    form: Mutex<AddressForm>,
}

impl AddressLookup {
    #[must_use]
    pub fn new(client: AddressClient) -> Self {
        Self {
            client,
            generation: AtomicU64::new(0),
            form: Mutex::new(AddressForm::default()),
        }
    }

    /// Record new postal code input and issue a ticket for it.
    ///
    /// Issuing a ticket invalidates every earlier one. The ticket is issued
    /// under the form lock, so the form always holds the input of the latest
    /// ticket.
    pub fn begin(&self, raw: &str) -> LookupTicket {
        let mut form = self.lock_form();
        let ticket = LookupTicket(self.generation.fetch_add(1, Ordering::AcqRel) + 1);
        form.postal_code = format_postal_code_input(raw);
        form.help = PostalCode::parse(raw).ok().map(|_| MSG_SEARCHING.to_owned());
        ticket
    }

    /// Whether `ticket` is still the latest.
    #[must_use]
    pub fn is_current(&self, ticket: LookupTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.0
    }

    /// Apply an outcome to the form if `ticket` is still current.
    ///
    /// A found address overwrites the address fields; not-found and failures
    /// only update the help text. Returns whether anything was applied.
    pub fn apply(&self, ticket: LookupTicket, outcome: &LookupOutcome) -> bool {
        let mut form = self.lock_form();
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, "Discarding stale address lookup");
            return false;
        }
        if let LookupOutcome::Found(address) = outcome {
            form.fill(address);
        }
        form.help = outcome.message().map(str::to_owned);
        true
    }

    /// Handle postal code input end to end: issue a ticket, look up, apply.
    #[instrument(skip(self))]
    pub async fn lookup(&self, raw: &str) -> LookupReport {
        let ticket = self.begin(raw);
        let outcome = self.client.lookup(raw).await;
        let applied = self.apply(ticket, &outcome);
        LookupReport {
            outcome,
            applied,
            form: self.form(),
        }
    }

    /// Snapshot of the form.
    #[must_use]
    pub fn form(&self) -> AddressForm {
        self.lock_form().clone()
    }

    fn lock_form(&self) -> std::sync::MutexGuard<'_, AddressForm> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
