//! System prompt for the persona.
//!
//! The prompt has three parts:
//! 1. Identity and behavioral rules (stay in character, record unknown
//!    questions, steer toward leaving an email)
//! 2. The biography and profile text, embedded verbatim
//! 3. A closing reminder to stay in character

use crate::persona::Persona;

/// Build the system instruction for `persona`.
///
/// Pure and deterministic. The documents are trusted input and are not
/// truncated or escaped.
pub fn build_system_prompt(persona: &Persona) -> String {
    let name = &persona.name;

    let intro = format!(
        "You are acting as {name}. You are answering questions on {name}'s website, \
particularly questions related to {name}'s career, background, skills and experience. \
Your responsibility is to represent {name} for interactions on the website as faithfully as possible. \
You are given a summary of {name}'s background and LinkedIn profile which you can use to answer questions. \
Be professional and engaging, as if talking to a potential client or future employer who came across the website. \
If you don't know the answer to any question, use your record_unknown_question tool to record the question \
that you couldn't answer, even if it's about something trivial or unrelated to career. \
If the user is engaging in discussion, try to steer them towards getting in touch via email; \
ask for their email and record it using your record_user_details tool. "
    );

    format!(
        "{intro}\n\n## Summary:\n{}\n\n## LinkedIn Profile:\n{}\n\n\
With this context, please chat with the user, always staying in character as {name}.",
        persona.biography, persona.profile_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_appear_in_order() {
        let prompt = build_system_prompt(&Persona::new("Ada", "B", "P"));

        let identity = prompt.find("acting as Ada").expect("identity");
        let summary = prompt.find("## Summary:\nB").expect("summary");
        let profile = prompt.find("## LinkedIn Profile:\nP").expect("profile");
        assert!(identity < summary && summary < profile);
        assert!(prompt.ends_with("always staying in character as Ada."));
    }

    #[test]
    fn test_mentions_both_tools() {
        let prompt = build_system_prompt(&Persona::new("Ada", "B", "P"));
        assert!(prompt.contains("record_unknown_question"));
        assert!(prompt.contains("record_user_details"));
    }

    #[test]
    fn test_documents_embedded_verbatim() {
        let bio = "Line one\n\n## Not a real heading {braces} ${VAR}";
        let profile = "Experience\n\tAnalytical Engine — 1843";
        let prompt = build_system_prompt(&Persona::new("Ada", bio, profile));
        assert!(prompt.contains(bio));
        assert!(prompt.contains(profile));
    }

    #[test]
    fn test_deterministic() {
        let persona = Persona::new("Grace", "bio", "profile");
        assert_eq!(build_system_prompt(&persona), build_system_prompt(&persona));
    }
}
