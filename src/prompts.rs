//! Chat-turn templating for the generation and critique calls,
//! and parsing of raw completions back into code and prose.

use once_cell::sync::Lazy;
use regex::Regex;
use log::trace;

use crate::request::CritiqueResult;

pub const TURN_START: &str = "<|im_start|>";
pub const TURN_END: &str = "<|im_end|>";

/// Longest improvement summary handed back to callers
pub const MAX_IMPROVEMENTS_CHARS: usize = 500;

pub const DEFAULT_IMPROVEMENTS: &str
  = "Code reviewed and enhanced for quality, efficiency, and \
     best practices.";

const GENERATION_SYSTEM_PROMPT: &str
  = "You are Qwen, created by Alibaba Cloud. You are a helpful \
     coding assistant that writes clean, efficient, and \
     well-documented code. Follow best practices and provide \
     explanations when helpful.";

const CRITIQUE_SYSTEM_PROMPT: &str
  = "You are an expert code reviewer. Your task is to review \
     code and suggest improvements focusing on: readability, \
     efficiency, error handling, security, and best practices. \
     Provide the improved code and explain the changes made.";

static SYSTEM_TURN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?s)<\|im_start\|>system.*?<\|im_end\|>")
    .expect("static regex")
});
static USER_TURN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?s)<\|im_start\|>user.*?<\|im_end\|>")
    .expect("static regex")
});
static ASSISTANT_OPEN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"<\|im_start\|>assistant").expect("static regex")
});
static TURN_CLOSE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"<\|im_end\|>").expect("static regex")
});
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?s)```[^\n`]*\n(.*?)\n```").expect("static regex")
});
static HEADING_MARKER: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?m)^#+\s*").expect("static regex")
});
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"\n\n+").expect("static regex")
});

/// Chat roles understood by the target model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role
{   System
  , User
  , Assistant
}

impl Role
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   Role::System => "system"
          , Role::User => "user"
          , Role::Assistant => "assistant"
        }
    }
}

fn push_turn(out: &mut String, role: Role, content: &str)
{   out.push_str(TURN_START);
    out.push_str(role.as_str());
    out.push('\n');
    out.push_str(content);
    out.push('\n');
    out.push_str(TURN_END);
    out.push('\n');
}

fn open_assistant_turn(out: &mut String)
{   out.push_str(TURN_START);
    out.push_str(Role::Assistant.as_str());
}

/// Wrap a user request for the code-generation call
pub fn format_generation_prompt(prompt: &str) -> String
{   let mut out = String::new();
    push_turn(&mut out, Role::System, GENERATION_SYSTEM_PROMPT);
    push_turn(&mut out, Role::User, prompt);
    open_assistant_turn(&mut out);
    out
}

/// Wrap candidate code and the original request for review
pub fn format_critique_prompt(code: &str, original_prompt: &str)
  -> String
{   let user = format!(
      "Original request: {}\n\nCurrent code:\n```\n{}\n```\n\n\
       Please review this code and provide improvements.",
      original_prompt, code
    );
    let mut out = String::new();
    push_turn(&mut out, Role::System, CRITIQUE_SYSTEM_PROMPT);
    push_turn(&mut out, Role::User, &user);
    open_assistant_turn(&mut out);
    out
}

/// Remove echoed system/user turns and stray turn sentinels.
/// Assistant content is kept, only its opening tag goes.
pub fn strip_sentinels(raw: &str) -> String
{   let text = SYSTEM_TURN.replace_all(raw, "");
    let text = USER_TURN.replace_all(&text, "");
    let text = ASSISTANT_OPEN.replace_all(&text, "");
    TURN_CLOSE.replace_all(&text, "").into_owned()
}

/// Code from a generation completion: the first fenced block's
/// interior, or else the whole stripped text. May be empty.
pub fn extract_code(raw: &str) -> String
{   let text = strip_sentinels(raw);
    match FENCED_BLOCK.captures(&text)
    {   Some(caps) => caps[1].trim().to_string()
      , None => {
          trace!("No fenced block in completion");
          text.trim().to_string()
        }
    }
}

/// Improved code (optional) and improvement summary from a
/// critique completion. Never fails.
pub fn extract_critique(raw: &str) -> CritiqueResult
{   let text = strip_sentinels(raw);

    let (improved_code, prose) = match FENCED_BLOCK.captures(&text)
    {   Some(caps) => {
          let code = caps[1].trim().to_string();
          let whole = caps.get(0).map(|m| m.range())
            .unwrap_or(0..0);
          let mut prose = String::with_capacity(text.len());
          prose.push_str(&text[..whole.start]);
          prose.push_str(&text[whole.end..]);
          (Some(code), prose)
        }
      , None => (None, text.clone())
    };

    let prose = HEADING_MARKER.replace_all(prose.trim(), "");
    let prose = BLANK_RUN.replace_all(&prose, "\n");
    let prose = prose.trim();

    let improvements = if prose.is_empty()
    {   DEFAULT_IMPROVEMENTS.to_string()
    } else
    {   prose.chars().take(MAX_IMPROVEMENTS_CHARS).collect()
    };

    CritiqueResult
    {   improved_code: improved_code.filter(|c| !c.is_empty())
      , improvements
    }
}
