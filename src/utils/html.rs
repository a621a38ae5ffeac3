/// Sanitizes instructor-authored text (quiz descriptions, questions, options, explanations).
///
/// Whitelist-based: safe formatting tags such as <b> and <p> survive, while <script>,
/// <iframe> and event-handler attributes are stripped. Question text is rendered by
/// the student-facing pages, so this runs before anything is stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
