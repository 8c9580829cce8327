//! Prompt construction

use detection::DetectionSummary;

use crate::backend::ChatMessage;

const ROLE_INSTRUCTIONS: &str = "You are a coastal tactical warning system. \
Internally work through three steps in order and output only the final result. \
1) Situation officer: group the detections, remove duplicates and identify the most dangerous item. \
2) Risk officer: derive the overall severity from the distance markers (CRITICAL is very close, MEDIUM is mid range, FAR is distant). \
3) Signals officer: write a short, clear warning. \
Rules: do not exaggerate and never add objects that are not in the list. \
Never assert that an object is civilian or friendly unless the detections show it.";

const OUTPUT_CONTRACT: &str = "Reply with a single JSON object and nothing else. \
It must have exactly these fields:\n\
- \"level\": one of \"ALERT\", \"CAUTION\", \"SAFE\"\n\
- \"summary\": one sentence describing the situation\n\
- \"action\": one or two immediate actions\n\
Example: {\"level\": \"ALERT\", \"summary\": \"A person is very close and approaching.\", \"action\": \"Fall back immediately and keep line of sight.\"}";

/// Few-shot pairs of detection labels and the expected reply
const EXAMPLES: [(&[&str], &str); 2] = [
    (
        &["person → CRITICAL"],
        r#"{"level": "ALERT", "summary": "A person is observed directly ahead.", "action": "Take cover immediately and keep observing while withdrawing."}"#,
    ),
    (
        &["merchant_ship → FAR", "person → MEDIUM"],
        r#"{"level": "CAUTION", "summary": "A person is observed at medium range. The merchant ship is distant.", "action": "Keep observing and prepare a warning broadcast if it approaches."}"#,
    ),
];

/// User message listing detection labels verbatim
pub fn detections_message(labels: &[String]) -> String {
    let items: Vec<String> = labels.iter().map(|l| format!("- {}", l)).collect();
    format!("Detections:\n{}", items.join("\n"))
}

/// Full conversation for one warning request
pub fn build_messages(detections: &[DetectionSummary]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(ROLE_INSTRUCTIONS), ChatMessage::system(OUTPUT_CONTRACT)];

    for (labels, reply) in EXAMPLES {
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        messages.push(ChatMessage::user(detections_message(&labels)));
        messages.push(ChatMessage::assistant(reply));
    }

    let labels: Vec<String> = detections.iter().map(DetectionSummary::label).collect();
    messages.push(ChatMessage::user(detections_message(&labels)));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Role;
    use crate::reply::parse_reply;
    use detection::{normalize, RawDetection};

    #[test]
    fn test_final_message_lists_labels() {
        let dets = normalize(
            &[
                RawDetection { class_id: 3, confidence: 0.9, bbox: [0.0, 0.0, 50.0, 600.0] },
                RawDetection { class_id: 4, confidence: 0.7, bbox: [0.0, 0.0, 50.0, 100.0] },
            ],
            1000,
        );
        let messages = build_messages(&dets);
        let last = messages.last().unwrap();

        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "Detections:\n- person → CRITICAL\n- tanker → FAR");
    }

    #[test]
    fn test_contract_and_examples() {
        let messages = build_messages(&[]);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[1].content.contains("\"level\""));
        assert!(messages[0].content.contains("never add objects"));

        // Few-shot replies must themselves satisfy the contract
        for m in messages.iter().filter(|m| m.role == Role::Assistant) {
            assert!(parse_reply(&m.content).is_ok());
        }
        let examples = messages.iter().filter(|m| m.role == Role::Assistant).count();
        assert_eq!(examples, 2);
    }
}
