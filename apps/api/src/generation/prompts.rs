// Assistant instructions for the generation engine.
//
// Template fragments are kept out of the prompt: the engine wraps the model's
// body text with the preamble/postamble itself, so instructions describe the
// body only.

use crate::llm_client::prompts::LATEX_HYGIENE;

/// Model registered for every document assistant. Hardcoded to prevent drift.
pub const ASSISTANT_MODEL: &str = "gpt-4o";

pub const RESUME_ASSISTANT_NAME: &str = "LaTeX Resume Content Integrator";

pub const COVER_LETTER_ASSISTANT_NAME: &str = "LaTeX Cover Letter Content Integrator";

/// Instructions for the resume assistant. `{hygiene}` is replaced with `LATEX_HYGIENE`.
const RESUME_INSTRUCTIONS_TEMPLATE: &str = r#"You write the body of a one-page LaTeX resume.

The conversation contains two messages, in order:
1. The candidate's resume as plain text.
2. The job description the resume is being tailored to.

Produce ONLY the content that goes between \begin{document} and \end{document}.
The preamble and the closing \end{document} are added by the caller.

Cover these sections, in this order, using only facts from the candidate's resume:
Experience, Education, Projects, Technical Skills.

Rules:
- Bold (\textbf{...}) resume content that matches key terms in the job description,
  particularly in Experience and Projects.
- Emphasise what is relevant to the job description. Never add information that
  is not in the candidate's resume.
- If a detail such as a project date is missing from the resume, omit it rather than
  inventing one.
- The result must fit on one page.
- {hygiene}"#;

/// Instructions for the cover letter assistant. `{hygiene}` is replaced with `LATEX_HYGIENE`.
const COVER_LETTER_INSTRUCTIONS_TEMPLATE: &str = r#"You write the body of a one-page LaTeX cover letter.

The conversation contains two messages, in order:
1. The candidate's resume as plain text.
2. The job description the letter responds to.

Produce ONLY the content that goes between \begin{document} and \end{document}.
The preamble and the closing \end{document} are added by the caller.

Rules:
- Open with a compelling introduction naming the position and the company.
- Highlight the skills and experiences from the resume that the job description asks for.
- Close by expressing genuine enthusiasm for the role and the company.
- If the resume or job description lacks a detail, leave it out gracefully; never invent it.
- The result must fit on one page.
- {hygiene}"#;

pub fn resume_instructions() -> String {
    RESUME_INSTRUCTIONS_TEMPLATE.replace("{hygiene}", LATEX_HYGIENE)
}

pub fn cover_letter_instructions() -> String {
    COVER_LETTER_INSTRUCTIONS_TEMPLATE.replace("{hygiene}", LATEX_HYGIENE)
}
