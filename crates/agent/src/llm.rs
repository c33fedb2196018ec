//! Model-backed intent parsing over an OpenAI-compatible chat API.
//!
//! The parser asks the model for a strict JSON verdict and converts it into
//! the same [`ParsedIntent`] the keyword rules produce. Every failure mode
//! (transport error, timeout, malformed reply, low confidence) degrades to
//! [`RuleBasedParser`], so a dead model never blocks a guest.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use concierge_core::{Department, LlmConfig, Menu, RequestType, RoomNumber};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::intent::{
    clamp_quantity, follow_up_request, DepartmentRequest, IntentParser, ParseContext, ParseSource,
    ParsedIntent, RequestedItem, RestaurantSlots, RoomServiceSlots, LLM_CONFIDENCE_FLOOR,
};
use crate::rules::RuleBasedParser;

/// Chat-completion boundary, kept narrow so tests can script replies.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Client for `/chat/completions` endpoints: OpenAI itself, or any
/// compatible server such as a local Ollama.
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl OpenAiCompatClient {
    pub fn from_config(config: &LlmConfig) -> Result<OpenAiCompatClient> {
        if config.provider.requires_api_key() && config.api_key.is_none() {
            anyhow::bail!("llm provider {} requires an api key", config.provider.as_str());
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(OpenAiCompatClient {
            http,
            base_url: config.resolved_base_url().trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
            temperature: 0.0,
            max_tokens: 500,
        };

        let mut builder =
            self.http.post(format!("{}/chat/completions", self.base_url)).json(&request);
        if let Some(api_key) = &self.api_key {
            builder =
                builder.header("Authorization", format!("Bearer {}", api_key.expose_secret()));
        }

        let response = builder.send().await.context("chat completion request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("chat completion returned {status}: {body}");
        }

        let parsed: ChatResponse =
            response.json().await.context("chat completion body was not valid json")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("chat completion contained no choices"))
    }
}

/// The verdict shape the system prompt instructs the model to emit. Every
/// field defaults so a partially formed reply still converts.
#[derive(Debug, Deserialize)]
struct LlmParsePayload {
    #[serde(default)]
    departments: Vec<LlmDepartmentPayload>,
    #[serde(default)]
    room_number: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct LlmDepartmentPayload {
    department: String,
    #[serde(default)]
    items: Vec<LlmItemPayload>,
    #[serde(default)]
    menu_requested: bool,
    #[serde(default)]
    request_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LlmItemPayload {
    name: String,
    #[serde(default = "default_quantity")]
    quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

pub struct LlmIntentParser {
    client: Box<dyn LlmClient>,
    fallback: RuleBasedParser,
    system_prompt: String,
    timeout: Duration,
}

impl LlmIntentParser {
    pub fn new(client: Box<dyn LlmClient>, menu: Menu, timeout: Duration) -> LlmIntentParser {
        let system_prompt = build_system_prompt(&menu);
        LlmIntentParser { client, fallback: RuleBasedParser::new(menu), system_prompt, timeout }
    }
}

#[async_trait]
impl IntentParser for LlmIntentParser {
    async fn parse(&self, message: &str, context: &ParseContext) -> ParsedIntent {
        let user_prompt = build_user_prompt(message, context);
        let reply = tokio::time::timeout(
            self.timeout,
            self.client.chat(&self.system_prompt, &user_prompt),
        )
        .await;

        let raw = match reply {
            Ok(Ok(raw)) => raw,
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "llm request failed, using keyword rules");
                return self.fallback.parse(message, context).await;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "llm request timed out, using keyword rules"
                );
                return self.fallback.parse(message, context).await;
            }
        };

        match payload_to_intent(&raw, context) {
            Some(intent) if intent.confidence >= LLM_CONFIDENCE_FLOOR => intent,
            Some(intent) => {
                tracing::debug!(
                    confidence = intent.confidence,
                    "llm verdict below confidence floor, using keyword rules"
                );
                self.fallback.parse(message, context).await
            }
            None => {
                tracing::warn!(reply = %raw, "llm reply was not a usable verdict, using keyword rules");
                self.fallback.parse(message, context).await
            }
        }
    }

    fn mode(&self) -> &'static str {
        "llm"
    }
}

fn payload_to_intent(raw: &str, context: &ParseContext) -> Option<ParsedIntent> {
    let payload: LlmParsePayload = serde_json::from_str(strip_code_fences(raw)).ok()?;

    let mut requests: Vec<DepartmentRequest> = Vec::new();
    for entry in payload.departments {
        // Hallucinated department names are dropped, not fatal.
        let Some(department) = Department::parse(&entry.department) else {
            continue;
        };
        if requests.iter().any(|request| request.department() == department) {
            continue;
        }
        requests.push(match department {
            Department::Receptionist => DepartmentRequest::Reception,
            Department::Restaurant => DepartmentRequest::Restaurant(RestaurantSlots {
                items: entry
                    .items
                    .into_iter()
                    .map(|item| RequestedItem {
                        name: item.name,
                        quantity: clamp_quantity(item.quantity),
                    })
                    .collect(),
                menu_requested: entry.menu_requested,
            }),
            Department::RoomService => DepartmentRequest::RoomService(RoomServiceSlots {
                request_type: entry.request_type.as_deref().and_then(RequestType::parse),
            }),
        });
    }

    if requests.is_empty() {
        if let Some(department) = context.last_department {
            requests.push(follow_up_request(department));
        }
    }

    let room_number = payload
        .room_number
        .as_deref()
        .and_then(RoomNumber::parse)
        .or_else(|| context.room_number.clone());

    Some(ParsedIntent {
        requests,
        room_number,
        confidence: payload.confidence.unwrap_or(0.0),
        source: ParseSource::Llm,
    })
}

/// Models wrap JSON in markdown fences despite instructions; both fenced
/// and bare replies are accepted.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn build_system_prompt(menu: &Menu) -> String {
    let mut prompt = String::from(
        "You route guest messages for a resort concierge. Respond with JSON only, no prose, in this shape:\n\
        {\"departments\": [{\"department\": \"restaurant\", \"items\": [{\"name\": \"Margherita Pizza\", \"quantity\": 2}], \"menu_requested\": false, \"request_type\": null}], \"room_number\": \"204\", \"confidence\": 0.9}\n\
        Departments: receptionist (check-in and check-out times, gym, spa, pool, room availability), restaurant (food and drink; fill items with menu names and integer quantities, set menu_requested when the guest asks what is on offer), room_service (set request_type to one of cleaning, laundry, amenity, other).\n\
        A message may need several departments; list each at most once, in the order the guest raises them. An empty departments list is valid when nothing matches.\n\
        room_number is the room the guest names, as digits, or null.\n\
        confidence is your certainty in this routing, 0.0 to 1.0.\n\
        The restaurant menu:\n",
    );
    for item in menu.items() {
        prompt.push_str("- ");
        prompt.push_str(&item.name);
        prompt.push('\n');
    }
    prompt
}

fn build_user_prompt(message: &str, context: &ParseContext) -> String {
    let mut prompt = String::new();
    if let Some(room) = &context.room_number {
        prompt.push_str(&format!("Known room number: {room}.\n"));
    }
    if let Some(department) = context.last_department {
        prompt.push_str(&format!("Previous topic: {department}.\n"));
    }
    prompt.push_str(&format!("Guest message: {message}"));
    prompt
}
