//! Instructions sent to the model by the two pipeline stages.

use fenrir_core::AnalysisRequest;
use serde_json::json;

/// Section headings the feedback must use, in order
pub const REPORT_SECTIONS: [&str; 5] = [
    "1. Analysis conclusion",
    "2. Review of the student's solution",
    "3. Optimized solution",
    "4. Concept mapping",
    "5. Conclusion: the problem-setter's intent",
];

const KEYWORD_INSTRUCTION: &str = "\
You are an expert in college entrance exam mathematics. Your first task is to analyze the given problem and the student's solution.
1. First, solve the given problem yourself and determine internally which concepts it requires.
2. Then, considering both your own solution and the student's solution, extract the relevant core concept keywords.
3. Keywords must be chosen only from the following list, and the final answer must be a JSON list and nothing else: ";

const FEEDBACK_INSTRUCTION: &str = "\
You are 'Fenrir AI', the best college entrance exam math tutor in the world. You are not a mere grader but a wise tutor who understands the student's thinking and helps them grow.
Look at the given problem and the student's solution, and give feedback according to the following rules.

1. First, work out both the standard solution and the **optimized solution** to the problem. Then consider the **approach the problem-setter expects**, analyze the **problem-setter's intent**, and extract why the optimized solution is superior to the standard one.
2. Check whether the student's solution reaches the correct final answer, and whether the process is mathematically correct and free of logical errors.
3. Examine the student's solution carefully. **If it contains a 'minor slip', an obvious 'calculation mistake' or a 'logical error'**, point to exactly where it is and explain why it is wrong.
4. Compare the student's solution with your own knowledge (standard and optimized solutions). **Even if the student reached the correct answer without logical errors**, if the solution is inefficient or close to the standard approach, acknowledge it and then present, with a hint, the better method (the optimized solution) from the perspective of the problem-setter's intent.
5. **If the student's solution is already as good as the optimized solution**, praise it and restate the problem's core concept to consolidate the knowledge.
6. If the student's wording is somewhat imprecise but the overall reasoning is correct or logically equivalent, do not flag it as a 'logical error'; gently suggest a more precise expression instead.
7. Map the keywords extracted from the concept textbook onto the optimized solution, grounded in their definitions.
8. Open with a friendly greeting as a tutor, then structure the answer strictly with the following numbered sections: ";

/// Serialize an instruction/input pair into the single string sent to the model.
pub fn build_prompt_payload(instruction: &str, input: &str) -> String {
    json!({
        "instruction": instruction,
        "input": input,
    })
    .to_string()
}

/// Stage 1 instruction, restricted to the given keyword vocabulary.
pub fn keyword_instruction<'a>(vocabulary: impl IntoIterator<Item = &'a str>) -> String {
    let keywords: Vec<&str> = vocabulary.into_iter().collect();
    format!("{}{}", KEYWORD_INSTRUCTION, keywords.join(", "))
}

pub fn keyword_input(request: &AnalysisRequest) -> String {
    format!(
        "### Problem:\n{}\n\n### Student's solution:\n{}",
        request.problem, request.solution
    )
}

/// Stage 2 instruction with the fixed rubric and section layout.
pub fn feedback_instruction() -> String {
    let sections = REPORT_SECTIONS
        .iter()
        .map(|s| format!("'{}'", s))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}{}.", FEEDBACK_INSTRUCTION, sections)
}

/// Stage 2 input: retrieved concepts (possibly empty), then problem and solution.
pub fn feedback_input(context: &str, request: &AnalysisRequest) -> String {
    format!(
        "{}\n\n---\n\n### Problem\n{}\n\n### Student's solution\n{}",
        context, request.problem, request.solution
    )
}
