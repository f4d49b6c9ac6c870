/// Prompt sent alongside the recording.
pub const DEFAULT_PROMPT: &str =
    "Please listen to this recording, rate how accurate my pronunciation is, and point out the specific mistakes.";

/// Language the critique is written in.
pub const DEFAULT_LANGUAGE: &str = "Chinese";

/// Placeholder critique used when the response finishes without any text.
pub const EMPTY_CRITIQUE: &str = "No analysis was returned.";

/// System instructions for the pronunciation coach.
pub fn coach_instructions(language: &str) -> String {
    format!(
        "You are a professional spoken-language pronunciation coach.\n\
         Your task is to analyse the user's audio input for educational purposes only.\n\
         Focus strictly on phonetics, articulation, intonation and stress.\n\
         Never analyse the speaker's voiceprint, gender, emotional state or any personal identity information.\n\
         \n\
         Output requirements:\n\
         1. Always reply in {language}.\n\
         2. Point out exactly where the pronunciation is not standard.\n\
         3. Use IPA phonetic notation to support the explanation.\n\
         4. Give concrete suggestions for improvement."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_name_the_reply_language() {
        let text = coach_instructions("English");
        assert!(text.contains("Always reply in English."));
        assert!(text.contains("IPA"));
        assert!(text.contains("Never analyse the speaker's voiceprint"));
    }
}
