use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::error::Category;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{NamingDecision, NamingOracle, NamingRequest, OracleError};
use crate::config::OpenAiSettings;
use crate::error::Error;

const DIRECTORY_PROMPT: &str = "You catalogue a home film library. You are given the name of a \
directory produced by a disc ripper, usually an upper-case label with underscores such as \
SHAUN_OF_THE_DEAD. Reply with the film's canonical title followed by its release year in \
parentheses, for example \"Shaun of the Dead (2004)\". Use only characters that are valid in a \
file name; never use slashes.";

const LISTING_PROMPT: &str = "You catalogue a home film library. You are given the files of one \
ripped disc as a JSON list of {fileName, fileSize}. Identify the main feature (normally the \
largest file, but prefer the feature over extended bonus material). Reply with: oldMainTitleName, \
the exact fileName of the main feature as given; newNameWithoutExtension, the canonical title \
followed by the release year in parentheses, for example \"Shaun of the Dead (2004)\"; and \
newMainTitleName, that title with the main feature's original extension appended. Use only \
characters that are valid in a file name; never use slashes.";

/// Naming oracle backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiOracle {
    client: Client,
    settings: OpenAiSettings,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitleResponse {
    new_title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingResponse {
    old_main_title_name: String,
    new_main_title_name: String,
    new_name_without_extension: String,
}

impl OpenAiOracle {
    pub fn new(settings: OpenAiSettings) -> Result<Self, Error> {
        let client = Client::builder()
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl NamingOracle for OpenAiOracle {
    async fn name_directory(&self, request: &NamingRequest) -> Result<NamingDecision, OracleError> {
        info!("Asking {} for a name: {:?}", self.settings.model, request);

        let body = request_body(&self.settings.model, request)?;
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        let text = response
            .text()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let content = completion_content(&text)?;
        debug!("Oracle response: {}", content);

        parse_decision(request, &content)
    }
}

pub(crate) fn request_body(model: &str, request: &NamingRequest) -> Result<Value, OracleError> {
    let (prompt, schema) = match request {
        NamingRequest::Directory { .. } => (DIRECTORY_PROMPT, title_schema()),
        NamingRequest::Listing { .. } => (LISTING_PROMPT, listing_schema()),
    };
    let user = serde_json::to_value(request)
        .map_err(|e| OracleError::Parse(e.to_string()))?
        .to_string();

    Ok(json!({
        "model": model,
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": "naming_decision",
                "strict": true,
                "schema": schema,
            },
        },
        "messages": [
            { "role": "system", "content": prompt },
            { "role": "user", "content": user },
        ],
    }))
}

/// The first choice's message content from a chat completion body.
pub(crate) fn completion_content(text: &str) -> Result<String, OracleError> {
    let completion: ChatCompletion = from_json(text)?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(OracleError::MissingField("choices[0].message.content"))
}

pub(crate) fn parse_decision(
    request: &NamingRequest,
    content: &str,
) -> Result<NamingDecision, OracleError> {
    let decision = match request {
        NamingRequest::Directory { .. } => {
            let response: TitleResponse = from_json(content)?;
            NamingDecision::titled(response.new_title)
        }
        NamingRequest::Listing { .. } => {
            let response: ListingResponse = from_json(content)?;
            NamingDecision::with_principal(
                response.new_name_without_extension,
                response.old_main_title_name,
                response.new_main_title_name,
            )
        }
    };
    decision.validated()
}

/// Well-formed JSON of the wrong shape is a schema failure; anything else
/// is a parse failure.
fn from_json<T: DeserializeOwned>(text: &str) -> Result<T, OracleError> {
    serde_json::from_str(text).map_err(|e| match e.classify() {
        Category::Data => OracleError::Schema(e.to_string()),
        Category::Io | Category::Syntax | Category::Eof => OracleError::Parse(e.to_string()),
    })
}

fn title_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "newTitle": { "type": "string" },
        },
        "required": ["newTitle"],
        "additionalProperties": false,
    })
}

fn listing_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "oldMainTitleName": { "type": "string" },
            "newMainTitleName": { "type": "string" },
            "newNameWithoutExtension": { "type": "string" },
        },
        "required": ["oldMainTitleName", "newMainTitleName", "newNameWithoutExtension"],
        "additionalProperties": false,
    })
}
