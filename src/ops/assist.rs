use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::thread;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::config::AssistConfig;
use crate::model::grid::RING_LEN;

/// Leading bullet or numbering on a plain-text idea line
static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•+]|\d+[.)]|\(\d+\))\s*").expect("bullet pattern is valid")
});

/// Prompt used when an image is generated from an empty description
pub const DEFAULT_IMAGE_PROMPT: &str = "Abstract mandala art";

/// Question used when an image is analyzed without one
pub const DEFAULT_ANALYZE_PROMPT: &str = "What is in this image?";

/// Error type for the assistant services
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssistError {
    #[error("{0}")]
    NeedsContext(String),
    #[error("no assistant configured (set assist.command in mandala/config.toml)")]
    NotConfigured,
    #[error("assistant failed: {0}")]
    Service(String),
}

// ---------------------------------------------------------------------------
// Chat messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    /// Prefix used in transcripts
    pub fn label(self) -> &'static str {
        match self {
            ChatRole::User => "User",
            ChatRole::Model => "AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// The last `window` messages as `User: …` / `AI: …` lines.
pub fn transcript(messages: &[ChatMessage], window: usize) -> String {
    let start = messages.len().saturating_sub(window);
    messages[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// Everything the suggestion service needs to brainstorm one bucket
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuggestionRequest {
    pub main_goal: String,
    /// The focused sub-goal; `None` asks for sub-goals
    pub sub_goal: Option<String>,
    /// Texts already in the bucket
    pub existing: Vec<String>,
    pub transcript: String,
}

impl SuggestionRequest {
    /// Natural-language prompt for services that take free text
    pub fn prompt(&self, language: &str) -> String {
        let mut prompt = String::new();
        if !self.transcript.is_empty() {
            prompt.push_str(&format!(
                "Consider this conversation between the user and the assistant; it shows what the user is after:\n\n---\n{}\n---\n\n",
                self.transcript
            ));
        }
        let main = if self.main_goal.is_empty() {
            "(undefined, see the conversation)"
        } else {
            self.main_goal.as_str()
        };
        match &self.sub_goal {
            Some(sub) => {
                let sub = if sub.is_empty() { "(undefined)" } else { sub.as_str() };
                prompt.push_str(&format!(
                    "I am filling in a Mandala Chart. The main goal is \"{}\" and I am focusing on the sub-goal \"{}\". \
                     Suggest 8 concrete, actionable tasks that achieve \"{}\".",
                    main, sub, sub
                ));
            }
            None => prompt.push_str(&format!(
                "I am filling in a Mandala Chart. The main goal is \"{}\". \
                 Suggest 8 distinct sub-goals or key areas that achieve it.",
                main
            )),
        }
        prompt.push_str(&format!(
            "\nAlready present: {}. Return exactly 8 items as JSON {{\"ideas\": [...]}}, written in {}.",
            self.existing.join(", "),
            language
        ));
        prompt
    }
}

/// Check that there is enough context to ask for suggestions: the cell being
/// expanded has text, or the chat transcript is long enough to stand in for it.
pub fn check_context(
    target_text: &str,
    is_sub_goal: bool,
    transcript: &str,
    min_context_chars: usize,
) -> Result<(), AssistError> {
    if !target_text.trim().is_empty() || transcript.chars().count() >= min_context_chars {
        return Ok(());
    }
    let msg = if is_sub_goal {
        "give the sub-goal some text first, or discuss it with the assistant"
    } else {
        "enter a main goal first, or discuss your idea with the assistant"
    };
    Err(AssistError::NeedsContext(msg.to_string()))
}

/// Extract up to eight ideas from a service response.
///
/// Accepts `{"ideas": [...]}`, a bare JSON array, or a plain list with one
/// idea per line (bullets and numbering are stripped). Anything else yields
/// no ideas.
pub fn parse_ideas(raw: &str) -> Vec<String> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Vec::new();
    }

    let ideas: Vec<String> = if body.starts_with('{') || body.starts_with('[') {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(mut obj)) => match obj.shift_remove("ideas") {
                Some(Value::Array(items)) => strings(items),
                _ => Vec::new(),
            },
            Ok(Value::Array(items)) => strings(items),
            _ => Vec::new(),
        }
    } else {
        body.lines()
            .map(|line| BULLET.replace(line, "").into_owned())
            .collect()
    };

    ideas
        .into_iter()
        .map(|idea| idea.trim().to_string())
        .filter(|idea| !idea.is_empty())
        .take(RING_LEN)
        .collect()
}

fn strings(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Drop the info string (```json)
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

// ---------------------------------------------------------------------------
// Service contracts
// ---------------------------------------------------------------------------

pub trait Suggester {
    fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<String>, AssistError>;
}

pub trait ChatService {
    fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, AssistError>;
}

/// Image generation and analysis. `Ok(None)` means the service produced no image.
pub trait MediaGenerator {
    fn generate_image(&self, prompt: &str) -> Result<Option<String>, AssistError>;
    fn edit_image(&self, reference: &str, prompt: &str) -> Result<Option<String>, AssistError>;
    /// Describe the referenced image in answer to `prompt`.
    fn analyze_image(&self, reference: &str, prompt: &str) -> Result<String, AssistError>;
}

/// The prompt to send for an image request: the typed prompt, else the
/// cell's text, else [`DEFAULT_IMAGE_PROMPT`].
pub fn image_prompt(prompt: &str, cell_text: &str) -> String {
    [prompt, cell_text]
        .into_iter()
        .map(str::trim)
        .find(|p| !p.is_empty())
        .unwrap_or(DEFAULT_IMAGE_PROMPT)
        .to_string()
}

/// The question to send for an analysis; falls back to [`DEFAULT_ANALYZE_PROMPT`].
pub fn analyze_prompt(prompt: &str) -> &str {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        DEFAULT_ANALYZE_PROMPT
    } else {
        prompt
    }
}

// ---------------------------------------------------------------------------
// Command-backed implementation
// ---------------------------------------------------------------------------

/// Request written to the assist command's stdin
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
enum CommandRequest<'a> {
    Suggest {
        prompt: String,
        main_goal: &'a str,
        sub_goal: Option<&'a str>,
        existing: &'a [String],
        transcript: &'a str,
        language: &'a str,
    },
    Chat {
        history: &'a [ChatMessage],
        message: &'a str,
        language: &'a str,
    },
    Image {
        prompt: &'a str,
    },
    EditImage {
        image_ref: &'a str,
        prompt: &'a str,
    },
    AnalyzeImage {
        image_ref: &'a str,
        prompt: &'a str,
        language: &'a str,
    },
}

/// Runs an external program for every request: JSON on stdin, answer on stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandService {
    pub program: String,
    pub args: Vec<String>,
    pub language: String,
}

impl CommandService {
    /// `None` when no command is configured
    pub fn from_config(config: &AssistConfig) -> Option<CommandService> {
        let (program, args) = config.command.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(CommandService {
            program: program.clone(),
            args: args.to_vec(),
            language: config.language.clone(),
        })
    }

    fn run(&self, request: &CommandRequest<'_>) -> Result<String, AssistError> {
        let payload =
            serde_json::to_vec(request).map_err(|e| AssistError::Service(e.to_string()))?;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AssistError::Service(format!("could not start {}: {}", self.program, e)))?;
        // Write stdin on its own thread while stdout and stderr drain
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || stdin.write_all(&payload))
        });
        let output = child
            .wait_with_output()
            .map_err(|e| AssistError::Service(e.to_string()))?;
        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                // The child may exit without reading everything; its status decides.
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => return Err(AssistError::Service(e.to_string())),
                Err(_) => return Err(AssistError::Service("stdin writer panicked".to_string())),
            }
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().next().unwrap_or("").trim();
            return Err(AssistError::Service(if detail.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                format!("{} exited with {}: {}", self.program, output.status, detail)
            }));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Suggester for CommandService {
    fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<String>, AssistError> {
        let out = self.run(&CommandRequest::Suggest {
            prompt: request.prompt(&self.language),
            main_goal: &request.main_goal,
            sub_goal: request.sub_goal.as_deref(),
            existing: &request.existing,
            transcript: &request.transcript,
            language: &self.language,
        })?;
        Ok(parse_ideas(&out))
    }
}

impl ChatService for CommandService {
    fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, AssistError> {
        let out = self.run(&CommandRequest::Chat {
            history,
            message,
            language: &self.language,
        })?;
        let reply = out.trim();
        if reply.is_empty() {
            return Ok("I could not come up with a reply.".to_string());
        }
        Ok(reply.to_string())
    }
}

impl MediaGenerator for CommandService {
    fn generate_image(&self, prompt: &str) -> Result<Option<String>, AssistError> {
        let out = self.run(&CommandRequest::Image { prompt })?;
        Ok(non_empty(out))
    }

    fn edit_image(&self, reference: &str, prompt: &str) -> Result<Option<String>, AssistError> {
        let out = self.run(&CommandRequest::EditImage {
            image_ref: reference,
            prompt,
        })?;
        Ok(non_empty(out))
    }

    fn analyze_image(&self, reference: &str, prompt: &str) -> Result<String, AssistError> {
        let out = self.run(&CommandRequest::AnalyzeImage {
            image_ref: reference,
            prompt,
            language: &self.language,
        })?;
        Ok(non_empty(out).unwrap_or_else(|| "No description was returned.".to_string()))
    }
}

fn non_empty(out: String) -> Option<String> {
    let trimmed = out.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
