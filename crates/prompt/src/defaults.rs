//! Built-in prompt templates for the QA strategies.

use crate::types::PromptTemplate;
use docqa_core::AppResult;

/// Slot holding the user's question.
pub const QUESTION: &str = "question";

/// Slot holding passage text.
pub const CONTEXT: &str = "context";

/// Slot holding the running answer during refinement.
pub const PREVIOUS_ANSWER: &str = "previous_answer";

/// Slot holding the answer-format description.
pub const FORMAT_INSTRUCTIONS: &str = "format_instructions";

const DIRECT_TEMPLATE: &str = r#"HUMAN:
Answer the following question as briefly and accurately as you can.
Conclude your answer with "[STOP]" when you're finished.

Question: {{question}}

ASSISTANT:
"#;

const STUFF_TEMPLATE: &str = r#"{{format_instructions}}

HUMAN:
Answer the question using ONLY the given extracts from (possibly unrelated and irrelevant) documents, not your own knowledge.
If you are unsure of the answer or if it isn't provided in the extracts, answer "Unknown[STOP]".
Conclude your answer with "[STOP]" when you're finished.

Question: {{question}}

--------------
Here are the extracts:
{{context}}

--------------
Remark: do not repeat the question !

ASSISTANT:
"#;

const REFINE_QUESTION_TEMPLATE: &str = r#"{{format_instructions}}

HUMAN:
Answer the question using ONLY the given extract from a (possibly irrelevant) document, not your own knowledge.
If you are unsure of the answer or if it isn't provided in the extract, answer "Unknown[STOP]".
Conclude your answer with "[STOP]" when you're finished.
Avoid adding any extraneous information.

Question:
-----------------
{{question}}

Extract:
-----------------
{{context}}

ASSISTANT:
"#;

const REFINE_TEMPLATE: &str = r#"{{format_instructions}}

HUMAN:
Refine the original answer to the question using the new (possibly irrelevant) document extract.
Use ONLY the information from the extract and the previous answer, not your own knowledge.
The extract may not be relevant at all to the question.
Conclude your answer with "[STOP]" when you're finished.
Avoid adding any extraneous information.

Question:
-----------------
{{question}}

Original answer:
-----------------
{{previous_answer}}

New extract:
-----------------
{{context}}

Reminder:
-----------------
If the extract is not relevant or helpful, don't even talk about it. Simply copy the original answer, without adding anything.
Do not copy the question.

ASSISTANT:
"#;

/// Question-only prompt used by the one-shot fallback.
pub fn direct_prompt() -> AppResult<PromptTemplate> {
    PromptTemplate::new("qa.direct", DIRECT_TEMPLATE, vec![QUESTION])
}

/// Prompt holding every stuffed extract at once.
pub fn stuff_prompt() -> AppResult<PromptTemplate> {
    PromptTemplate::new(
        "qa.stuff",
        STUFF_TEMPLATE,
        vec![QUESTION, CONTEXT, FORMAT_INSTRUCTIONS],
    )
}

/// Prompt for the first refinement step (one extract, no prior answer).
pub fn refine_question_prompt() -> AppResult<PromptTemplate> {
    PromptTemplate::new(
        "qa.refine.question",
        REFINE_QUESTION_TEMPLATE,
        vec![QUESTION, CONTEXT, FORMAT_INSTRUCTIONS],
    )
}

/// Prompt for every later refinement step.
pub fn refine_prompt() -> AppResult<PromptTemplate> {
    PromptTemplate::new(
        "qa.refine",
        REFINE_TEMPLATE,
        vec![QUESTION, PREVIOUS_ANSWER, CONTEXT, FORMAT_INSTRUCTIONS],
    )
}
