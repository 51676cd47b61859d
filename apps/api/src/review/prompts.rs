// Prompt constants for the review pipeline.
// The system prompt comes from llm_client::prompts.

use crate::models::resume::JobContext;

/// Shape the model must answer in. Embedded verbatim into the instructions.
pub const AI_RESPONSE_FORMAT: &str = r#"interface Feedback {
  ATS: {
    score: number; // overall ATS suitability, max 100
    tips: {
      type: "good" | "improve";
      tip: string; // give 3-4 tips
    }[];
  };
  toneAndStyle: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // short title for the explanation
      explanation: string;
    }[]; // give 3-4 tips
  };
  content: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // short title for the explanation
      explanation: string;
    }[]; // give 3-4 tips
  };
  structure: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // short title for the explanation
      explanation: string;
    }[]; // give 3-4 tips
  };
  skills: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // short title for the explanation
      explanation: string;
    }[]; // give 3-4 tips
  };
}"#;

/// Builds the review instructions for one submission.
///
/// Deterministic: identical job context always yields identical text. Empty
/// fields are passed through as-is; the instructions tell the model to fall
/// back to general expectations for the role when they are missing.
pub fn prepare_instructions(job: &JobContext) -> String {
    format!(
        "You are an expert in ATS (Applicant Tracking Systems) and resume analysis.

Your task is to evaluate and score this resume as if you were an ATS and recruiter. \
Be honest and critical: if the resume is weak or poorly aligned with the job, give a low score.

The following fields are user inputs and may vary:
- Company Name: {company}
- Job Title: {title}
- Job Description: {description}

Use the job title and job description to assess the resume's relevance and keyword alignment. \
If the job description is missing or vague, base your feedback on general expectations for the given role.

---
Important Output Instructions:
- Always return a valid JSON object.
- Do not include markdown, backticks, or any extra explanation outside the JSON.
- Follow the exact structure and property names in:
{format}
- Tip titles: max 4 words, single short line.
- Explanations: max 1 short line.
- Keep everything extremely brief, with no filler words.
- Never break the format, even if inputs are incomplete, missing, or irrelevant.

Return only the final result as a structured JSON object.
",
        company = job.company_name.trim(),
        title = job.job_title.trim(),
        description = job.job_description.trim(),
        format = AI_RESPONSE_FORMAT,
    )
}
