//! Nudge targeting and prompt construction.

use crate::domain::{Message, ResonanceProfile, UserId};

/// System prompt handed to the completion upstream, verbatim.
pub const NUDGE_SYSTEM_PROMPT: &str = "You are a conversation catalyst for a dating app. \
Your job is to generate ONE specific, curious question that could naturally restart a cooling \
conversation. Rules: Under 25 words; Must be a question (end with ?); Reference ONE of the \
provided interest tags if possible; Never generic; Never guilt-trippy; Should spark genuine \
curiosity; Match the energy of the archetype provided.";

/// Messages inspected when picking the quieter participant.
const QUIET_PARTY_WINDOW: usize = 10;

/// Messages quoted in the completion prompt.
const CONTEXT_MESSAGES: usize = 3;

/// The participant who sent fewer of the last ten messages; ties go to
/// side A.
pub fn quiet_party(messages_desc: &[Message], user_a: UserId, user_b: UserId) -> UserId {
    let mut a_count = 0_usize;
    let mut b_count = 0_usize;
    for message in messages_desc.iter().take(QUIET_PARTY_WINDOW) {
        match message.sender_id {
            Some(sender) if sender == user_a => a_count += 1,
            Some(sender) if sender == user_b => b_count += 1,
            _ => {}
        }
    }
    if a_count <= b_count { user_a } else { user_b }
}

/// Structured user prompt: tags, archetype, style, and recent messages.
pub fn build_user_prompt(
    quiet_profile: &ResonanceProfile,
    other_profile: &ResonanceProfile,
    messages_desc: &[Message],
) -> String {
    let tags = |profile: &ResonanceProfile| {
        if profile.dominant_emotions.is_empty() {
            "none".to_owned()
        } else {
            profile.dominant_emotions.join(", ")
        }
    };
    let archetype = |profile: &ResonanceProfile| {
        profile
            .archetype
            .map_or("unclassified", |archetype| archetype.as_str())
    };
    let style = |profile: &ResonanceProfile| {
        profile
            .communication_style
            .map_or("unclassified", |style| style.as_str())
    };

    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Quiet participant: interest tags: {}; archetype: {}; style: {}.\n",
        tags(quiet_profile),
        archetype(quiet_profile),
        style(quiet_profile),
    ));
    prompt.push_str(&format!(
        "Other participant: interest tags: {}; archetype: {}; style: {}.\n",
        tags(other_profile),
        archetype(other_profile),
        style(other_profile),
    ));

    prompt.push_str("Recent messages, newest first:\n");
    for message in messages_desc.iter().take(CONTEXT_MESSAGES) {
        prompt.push_str(&format!("- {}\n", message.content));
    }
    prompt.push_str("Write the question.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile_builder::MODEL_VERSION;
    use crate::domain::{ConversationId, EnergyArchetype, MessageContentType};
    use chrono::Utc;

    fn message_from(sender: Option<UserId>, content: &str) -> Message {
        Message {
            conversation_id: ConversationId::random(),
            sender_id: sender,
            content: content.to_owned(),
            content_type: MessageContentType::Text,
            sentiment: None,
            emotion_tag: None,
            sent_at: Utc::now(),
            read_at: None,
            deleted_at: None,
        }
    }

    #[test]
    fn quieter_sender_is_targeted() {
        let a = UserId::random();
        let b = UserId::random();
        let messages: Vec<Message> = (0..10)
            .map(|index| {
                let sender = if index < 7 { a } else { b };
                message_from(Some(sender), "text")
            })
            .collect();
        assert_eq!(quiet_party(&messages, a, b), b);
    }

    #[test]
    fn ties_fall_to_side_a() {
        let a = UserId::random();
        let b = UserId::random();
        let messages: Vec<Message> = (0..10)
            .map(|index| {
                let sender = if index % 2 == 0 { a } else { b };
                message_from(Some(sender), "text")
            })
            .collect();
        assert_eq!(quiet_party(&messages, a, b), a);
    }

    #[test]
    fn empty_history_targets_side_a() {
        let a = UserId::random();
        let b = UserId::random();
        assert_eq!(quiet_party(&[], a, b), a);
    }

    #[test]
    fn prompt_quotes_tags_and_three_messages() {
        let mut quiet = ResonanceProfile::empty(UserId::random(), Utc::now(), MODEL_VERSION);
        quiet.dominant_emotions = vec!["wonder".to_owned(), "calm".to_owned()];
        quiet.archetype = Some(EnergyArchetype::Ember);
        let other = ResonanceProfile::empty(UserId::random(), Utc::now(), MODEL_VERSION);

        let messages = vec![
            message_from(Some(UserId::random()), "newest"),
            message_from(Some(UserId::random()), "middle"),
            message_from(Some(UserId::random()), "oldest quoted"),
            message_from(Some(UserId::random()), "not quoted"),
        ];

        let prompt = build_user_prompt(&quiet, &other, &messages);
        assert!(prompt.contains("wonder, calm"));
        assert!(prompt.contains("ember"));
        assert!(prompt.contains("newest"));
        assert!(prompt.contains("oldest quoted"));
        assert!(!prompt.contains("not quoted"));
    }

    #[test]
    fn system_prompt_rules_are_intact() {
        assert!(NUDGE_SYSTEM_PROMPT.contains("Under 25 words"));
        assert!(NUDGE_SYSTEM_PROMPT.contains("end with ?"));
        assert!(NUDGE_SYSTEM_PROMPT.contains("Never guilt-trippy"));
    }
}
