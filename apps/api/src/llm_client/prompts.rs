// Shared prompt fragments. Each feature that needs LLM calls defines its own
// prompts.rs alongside it; only cross-cutting fragments live here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Formatting rules shared by every LaTeX-producing assistant.
pub const LATEX_HYGIENE: &str = "Avoid unicode characters and any LaTeX command that the \
    surrounding template does not already define. Use only the plain apostrophe ' and the \
    plain hyphen - (never typographic quotes or dashes). Do not wrap the output in ```latex \
    fences or add commentary before or after it.";
