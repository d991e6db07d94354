//! Card offer synthesis
//!
//! Proxies a single LLM call that produces current offer data for a
//! bank/card pair and parses the model's JSON output into [`Offer`]s the
//! mobile client renders directly. One attempt per request, nothing
//! persisted.

mod anthropic;

pub use anthropic::AnthropicClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Request body of `POST /api/offers/fetch`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOffersRequest {
    /// Issuing bank, e.g. "HDFC Bank"
    pub bank_name: String,
    /// Card product name, e.g. "Infinia"
    pub card_type: String,
}

/// Offer category as the client groups them.
///
/// Deserialization goes through [`From<String>`] so unrecognized model
/// output degrades to [`OfferCategory::Other`] instead of failing the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum OfferCategory {
    /// Cashback on spend
    Cashback,
    /// Flat or percentage discount
    Discount,
    /// Points or miles
    Rewards,
    /// Anything else, also the fallback for unrecognized categories
    #[default]
    Other,
}

impl From<String> for OfferCategory {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "cashback" => Self::Cashback,
            "discount" => Self::Discount,
            "rewards" => Self::Rewards,
            _ => Self::Other,
        }
    }
}

/// A single card offer, serialized camelCase for the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    /// Stable identifier; generated when the model omits one
    #[serde(default)]
    pub id: String,
    /// Short offer headline
    pub title: String,
    /// Longer description
    pub description: String,
    /// Merchant the offer applies to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    /// Offer category
    #[serde(default)]
    pub category: OfferCategory,
    /// Discount text, e.g. "10% off"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    /// Validity text, e.g. "Valid till 31 Dec 2026"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<String>,
    /// Terms and conditions summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
    /// Issuing bank, backfilled from the request when the model omits it
    #[serde(default)]
    pub bank_name: String,
    /// Card product, backfilled from the request when the model omits it
    #[serde(default)]
    pub card_type: String,
}

/// Offer synthesis failures, mapped to HTTP at the router.
#[derive(Debug, Error)]
pub enum OffersError {
    /// LLM API key missing; operator intervention required.
    #[error("Offer synthesis not configured")]
    NotConfigured,

    /// The upstream LLM call failed.
    #[error("Offer synthesis failed: {0}")]
    Upstream(String),

    /// The model's output did not parse as an offer array.
    #[error("Model returned malformed offer data: {0}")]
    Malformed(String),
}

/// One-shot text completion seam.
///
/// The real implementation is [`AnthropicClient`]; tests inject fakes.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a prompt, returning the model's text output.
    async fn complete(&self, prompt: &str) -> crate::Result<String>;
}

/// Synthesize offers for a bank/card pair with one LLM call.
pub async fn synthesize_offers(
    llm: &dyn LlmClient,
    request: &FetchOffersRequest,
) -> Result<Vec<Offer>, OffersError> {
    let prompt = offer_prompt(&request.bank_name, &request.card_type);

    let raw = llm
        .complete(&prompt)
        .await
        .map_err(|e| OffersError::Upstream(e.to_string()))?;

    parse_offers(&raw, &request.bank_name, &request.card_type)
}

fn offer_prompt(bank_name: &str, card_type: &str) -> String {
    format!(
        "List current cardholder offers for the {card_type} card issued by {bank_name}.\n\
         Respond with ONLY a JSON array. Each element must have the fields:\n\
         \"title\", \"description\", \"category\" (one of \"cashback\", \"discount\", \
         \"rewards\", \"other\"), and optionally \"merchant\", \"discount\", \
         \"validity\", \"terms\".\n\
         Do not include any text outside the JSON array."
    )
}

/// Parse the model output into offers, tolerating markdown code fences and
/// backfilling id, bank and card fields.
fn parse_offers(raw: &str, bank_name: &str, card_type: &str) -> Result<Vec<Offer>, OffersError> {
    let json = strip_code_fences(raw);

    let mut offers: Vec<Offer> =
        serde_json::from_str(json).map_err(|e| OffersError::Malformed(e.to_string()))?;

    for offer in &mut offers {
        if offer.id.is_empty() {
            offer.id = Uuid::new_v4().to_string();
        }
        if offer.bank_name.is_empty() {
            offer.bank_name = bank_name.to_string();
        }
        if offer.card_type.is_empty() {
            offer.card_type = card_type.to_string();
        }
    }

    Ok(offers)
}

/// Strip a surrounding markdown code fence (``` or ```json) if present.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag on the opening fence line
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}
