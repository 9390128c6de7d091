//! Scoring prompts handed to the external model runner.
//!
//! Each chunk becomes one [`ScoringRequest`]: a fixed system instruction
//! plus the auditor template with the excerpt appended.

use serde::{Deserialize, Serialize};

/// Default maximum excerpt length in characters.
pub const DEFAULT_MAX_EXCERPT_CHARS: usize = 6000;

/// System instruction for the scoring model.
pub const SYSTEM_SCORER: &str = "You must return one valid JSON object that strictly matches the user's schema. \
Do not include any text outside JSON. Do not add extra fields.";

const EXCERPT_PLACEHOLDER: &str = "{chunk}";

/// Auditor instruction template. Contains literal braces, so the excerpt
/// is substituted by plain replacement rather than formatting.
const USER_SCORING_TEMPLATE: &str = r#"Act as a senior global privacy/compliance auditor. Given a privacy policy excerpt,
return ONE JSON object with category scores (0-10), concise rationales, red flags,
and optional evidence quotes. Be jurisdiction-agnostic yet globally aware of widely
recognized principles (e.g., purpose limitation, transparency, user rights, security,
third-party processing, retention, cross-border safeguards, children/sensitive data).
Do not opine on legal compliance; assess disclosure quality and user-protection clarity.

Schema (required fields):
{
  "scores": {
    "lawful_basis_and_purpose": int,
    "collection_and_minimization": int,
    "secondary_use_and_limits": int,
    "retention_and_deletion": int,
    "third_parties_and_processors": int,
    "cross_border_transfers": int,
    "user_rights_and_redress": int,
    "security_and_breach": int,
    "transparency_and_notice": int,
    "sensitive_children_ads_profiling": int
  },
  "rationales": {
    "lawful_basis_and_purpose": string,
    "collection_and_minimization": string,
    "secondary_use_and_limits": string,
    "retention_and_deletion": string,
    "third_parties_and_processors": string,
    "cross_border_transfers": string,
    "user_rights_and_redress": string,
    "security_and_breach": string,
    "transparency_and_notice": string,
    "sensitive_children_ads_profiling": string
  },
  "evidence": {
    "retention_and_deletion": string?,
    "user_rights_and_redress": string?,
    "security_and_breach": string?
  },
  "red_flags": string[],
  "notes": string[]
}

Scoring guidance (0-10 per category, balanced view):
- lawful_basis_and_purpose: stated purposes/bases or equivalent justification; purpose limitation; clarity of consent/choice where relevant.
- collection_and_minimization: necessity, proportionality, specificity of categories collected.
- secondary_use_and_limits: explicit limits on secondary/compatible use; avoid vague blanket purposes.
- retention_and_deletion: concrete periods or clear criteria; deletion/archiving; avoid indefinite retention without justification.
- third_parties_and_processors: processors/third parties; categories & purposes; role clarity (controller/processor/joint).
- cross_border_transfers: destination(s) and plain-language safeguards; user-facing clarity on transfers.
- user_rights_and_redress: how to exercise rights (access/rectification/erasure/restriction/portability/objection), timelines, contacts; escalation/appeal paths if relevant.
- security_and_breach: stated organizational/technical measures; breach handling language (if any); security contact/DPO info if applicable.
- transparency_and_notice: plain language; structure; change/version notices; contact details; cookie/consent pointers where relevant.
- sensitive_children_ads_profiling: handling of sensitive/special categories; children data statements/age gates; selling/sharing for ads and opt-out/limit choices; automated decision-making/profiling notices (if any).

Red flags (reduce scores where present):
- Indefinite or unspecified retention; "as long as we need" without criteria.
- Unspecified third-party sharing; selling/sharing for targeted ads without clear choice/basis.
- No actionable rights instructions or contacts.
- Contradictory or misleading statements vs. described practices.

Return only one JSON object. No extra text. Excerpt:
{chunk}
"#;

/// One chunk's scoring request, serialized as a JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    /// 1-based chunk position.
    pub index: usize,
    /// System instruction.
    pub system: String,
    /// User prompt with the excerpt.
    pub user: String,
}

impl ScoringRequest {
    pub fn new(index: usize, excerpt: &str, max_len: usize) -> Self {
        Self {
            index,
            system: SYSTEM_SCORER.to_string(),
            user: build_user_prompt(excerpt, max_len),
        }
    }
}

/// Build the user prompt, keeping at most `max_len` characters of the excerpt.
pub fn build_user_prompt(excerpt: &str, max_len: usize) -> String {
    let truncated: String = excerpt.chars().take(max_len).collect();
    USER_SCORING_TEMPLATE.replace(EXCERPT_PLACEHOLDER, &truncated)
}

/// Build one request per chunk, indexed from 1.
pub fn build_requests(chunks: &[String], max_len: usize) -> Vec<ScoringRequest> {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| ScoringRequest::new(i + 1, chunk, max_len))
        .collect()
}
