//! Prompt guardrail: rejects unsafe or off-topic requests before
//! any inference budget is spent.
//!
//! Rules run in a fixed order against the trimmed, lowercased
//! prompt and the first failing rule wins:
//!
//! 1. length bounds
//! 2. unsafe-content denylist
//! 3. coding-relevance allowlist
//! 4. non-coding denylist
//!
//! Term matching is plain substring matching, so `exploitation`
//! trips the `exploit` entry.

use std::fmt;
use log::{debug, trace};

use crate::config::GuardrailConfig;
use crate::request::ValidationResult;

pub const DEFAULT_MIN_PROMPT_LENGTH: usize = 10;
pub const DEFAULT_MAX_PROMPT_LENGTH: usize = 5000;

pub const UNSAFE_TERMS: &[&str] = &[
  "malware", "exploit", "ransomware", "keylogger", "spyware"
, "rootkit", "botnet", "trojan", "ddos", "phishing"
, "credential stuffing", "steal password", "bypass authentication"
];

pub const CODING_TERMS: &[&str] = &[
  "code", "function", "algorithm", "program", "script", "class"
, "method", "variable", "array", "loop", "debug", "compile"
, "refactor", "implement", "optimize", "sort", "regex", "query"
, "database", "sql", "endpoint", "python", "javascript"
, "typescript", "java", "rust", "golang", "c++", "html", "css"
, "bash", "write"
];

pub const NON_CODING_TERMS: &[&str] = &[
  "recipe", "poem", "poetry", "lyrics", "short story", "essay"
, "love letter", "horoscope", "joke", "diet plan"
];

/// Why a prompt was turned away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection
{   TooShort { min: usize }
  , TooLong { max: usize }
  , UnsafeContent
  , NotCodingRelated
  , NonCodingContent
}

impl fmt::Display for Rejection
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Rejection::TooShort { min } => {
              write!(f,
                "Prompt is too short. Minimum {} characters \
                 required.",
                min
              )
            }
          , Rejection::TooLong { max } => {
              write!(f,
                "Prompt is too long. Maximum {} characters \
                 allowed.",
                max
              )
            }
          , Rejection::UnsafeContent => {
              write!(f,
                "Request contains potentially unsafe content. \
                 Please ask coding-related questions only."
              )
            }
          , Rejection::NotCodingRelated => {
              write!(f,
                "Your request does not appear to be \
                 coding-related. Please ask for help with \
                 programming, scripting, or development tasks."
              )
            }
          , Rejection::NonCodingContent => {
              write!(f,
                "Your request appears to be for non-coding \
                 content. Please focus on programming questions."
              )
            }
        }
    }
}

/// Keyword lists and bounds the guardrail is built from.
/// All terms are stored lowercase.
#[derive(Debug, Clone)]
pub struct GuardrailRules
{   pub min_len: usize
  , pub max_len: usize
  , pub unsafe_terms: Vec<String>
  , pub coding_terms: Vec<String>
  , pub non_coding_terms: Vec<String>
}

impl GuardrailRules
{   pub fn new(
      min_len: usize
    , max_len: usize
    , unsafe_terms: &[&str]
    , coding_terms: &[&str]
    , non_coding_terms: &[&str]
    ) -> Self
    {   GuardrailRules
        {   min_len
          , max_len
          , unsafe_terms: lowercase_all(unsafe_terms)
          , coding_terms: lowercase_all(coding_terms)
          , non_coding_terms: lowercase_all(non_coding_terms)
        }
    }

    /// Default term lists with bounds taken from config
    pub fn from_config(config: &GuardrailConfig) -> Self
    {   GuardrailRules::new(
          config.min_prompt_length
        , config.max_prompt_length
        , UNSAFE_TERMS
        , CODING_TERMS
        , NON_CODING_TERMS
        )
    }
}

impl Default for GuardrailRules
{   fn default() -> Self
    {   GuardrailRules::from_config(&GuardrailConfig::default())
    }
}

fn lowercase_all(terms: &[&str]) -> Vec<String>
{   terms.iter().map(|t| t.to_lowercase()).collect()
}

fn find_term<'a>(text: &str, terms: &'a [String])
  -> Option<&'a str>
{   terms.iter()
      .find(|term| text.contains(term.as_str()))
      .map(|term| term.as_str())
}

/// Stateless prompt validator
#[derive(Debug, Clone, Default)]
pub struct Guardrail
{   rules: GuardrailRules
}

impl Guardrail
{   pub fn new(rules: GuardrailRules) -> Self
    {   Guardrail { rules }
    }

    pub fn rules(&self) -> &GuardrailRules
    {   &self.rules
    }

    /// Classify a raw prompt. Produces exactly one result.
    pub fn validate(&self, prompt: &str) -> ValidationResult
    {   match self.check(prompt)
        {   Ok(()) => ValidationResult::accepted()
          , Err(rejection) => {
              debug!("Prompt rejected: {:?}", rejection);
              ValidationResult::rejected(rejection)
            }
        }
    }

    /// Same rules as [`Guardrail::validate`], as a `Result`
    pub fn check(&self, prompt: &str) -> Result<(), Rejection>
    {   let trimmed = prompt.trim();
        let len = trimmed.chars().count();
        trace!("Validating prompt of {} chars", len);

        if len < self.rules.min_len
        {   return Err(Rejection::TooShort {
              min: self.rules.min_len
            });
        }
        if len > self.rules.max_len
        {   return Err(Rejection::TooLong {
              max: self.rules.max_len
            });
        }

        let lowered = trimmed.to_lowercase();
        self.check_unsafe(&lowered)?;
        self.check_coding_relevance(&lowered)?;
        self.check_non_coding(&lowered)?;
        Ok(())
    }

    /// Expects already lowercased text
    pub fn check_unsafe(&self, text: &str)
      -> Result<(), Rejection>
    {   match find_term(text, &self.rules.unsafe_terms)
        {   Some(term) => {
              debug!("Unsafe term matched: {}", term);
              Err(Rejection::UnsafeContent)
            }
          , None => Ok(())
        }
    }

    /// Expects already lowercased text
    pub fn check_coding_relevance(&self, text: &str)
      -> Result<(), Rejection>
    {   match find_term(text, &self.rules.coding_terms)
        {   Some(_) => Ok(())
          , None => Err(Rejection::NotCodingRelated)
        }
    }

    /// Expects already lowercased text
    pub fn check_non_coding(&self, text: &str)
      -> Result<(), Rejection>
    {   match find_term(text, &self.rules.non_coding_terms)
        {   Some(term) => {
              debug!("Non-coding term matched: {}", term);
              Err(Rejection::NonCodingContent)
            }
          , None => Ok(())
        }
    }
}

/// Validate with the default rule set
pub fn validate_prompt(prompt: &str) -> ValidationResult
{   Guardrail::default().validate(prompt)
}
