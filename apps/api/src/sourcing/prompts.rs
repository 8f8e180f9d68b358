// Prompts for job sourcing: search-URL construction and listing extraction.

/// Builds a single Canada Job Bank search URL from a resume.
pub const SEARCH_URL_SYSTEM: &str = "You build job search links. Reply with ONE link and \
    nothing else: no greeting, no explanation, no markdown. \
    Every link targets the Canada Job Bank search page, \
    https://www.jobbank.gc.ca/jobsearch/jobsearch, with a `searchstring` query parameter \
    naming the role and a `locationstring` parameter naming the city or province. \
    Examples: a software developer in Toronto is \
    https://www.jobbank.gc.ca/jobsearch/jobsearch?searchstring=software+developer&locationstring=toronto \
    and a receptionist in Alberta is \
    https://www.jobbank.gc.ca/jobsearch/jobsearch?searchstring=receptionist&locationstring=alberta . \
    Prefer the broader title with more openings: search for roles a graduate of the \
    candidate's field would hold rather than the field name itself (an industrial engineering \
    resume may search for process or quality engineer roles), and search for software \
    developer rather than full stack developer.";

/// Extraction system prompt. Callers append `llm_client::prompts::JSON_ONLY_SYSTEM`.
pub const EXTRACTION_SYSTEM: &str = "You extract job postings from the raw HTML of a job board \
    search results page.";

/// Listing extraction prompt. Replace `{max_listings}`, `{source_url}`, `{page}`.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract at most {max_listings} job postings from the page below, in page order.

Return a JSON object with this EXACT schema:
{
  "job_postings": [
    {
      "title": "Software Developer",
      "company": "Example Corp",
      "location": "Toronto (ON)",
      "description": "The complete job description text available on the page",
      "url": "direct link to the posting (relative links are fine)",
      "posted_on": "2024-05-01 or null if not shown"
    }
  ]
}

If the page contains no postings, return {"job_postings": []}.

PAGE URL: {source_url}

PAGE HTML:
{page}"#;
