//! Prompt contracts for the LLM and the string heuristics that interpret
//! its replies.
//!
//! Every reply passes through [`normalize_reply`]; every digit and cue scan
//! lives here so the heuristics can be tightened in one place without
//! touching orchestrator logic.

use crate::taskflow::ModelKind;
use crate::voice::InteractionMode;

/// The 80-class detection vocabulary the word matcher may select from.
pub const TARGET_CLASSES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// True when `word` is one of the 80 detectable classes.
pub fn is_known_target_class(word: &str) -> bool {
    TARGET_CLASSES.contains(&word)
}

// ---------------------------------------------------------------------------
// Prompt templates
// ---------------------------------------------------------------------------

/// Classify the transcript into Chat (0), Task (1), or TaskAuto (2).
pub fn mode_classifier_prompt(transcript: &str) -> String {
    format!(
        r#"Your name is "watcher" and you are a function selection assistant. You analyze the user's input in relation to the definition of the "Mode List" and then select the most appropriate function from the list.

Mode List:
- Mode 0 (CHAT): General conversation, questions, casual interaction
- Mode 1 (TASK): User wants to set up a monitoring task or automation (e.g., "notify me when...", "alert me if...", "watch for...")
- Mode 2 (TASK_AUTO): Automatic task execution (rarely used)

User input: "{transcript}"

Respond with ONLY the mode number (0, 1, or 2). No explanation."#
    )
}

/// Conversational reply for chat mode.
pub fn chat_prompt(transcript: &str) -> String {
    format!(
        r#"Your name is watcher, and you're a chatbot that can have a nice chat with users based on their input. You politely decline to discuss violent, hateful, or politically sensitive topics.

User said: "{transcript}"

Provide a brief, conversational response (1-2 sentences max)."#
    )
}

/// Extract the trigger condition from a task request.
pub fn trigger_prompt(transcript: &str) -> String {
    format!(
        r#"Extract the trigger condition from this request. Remove time, place, intervals, and actions. Focus on what to detect.

User input: "{transcript}"

CRITICAL: Respond with a simple phrase describing what to detect. No quotes. No punctuation at the end. Maximum 5 words.
Example: "person enters room" or "cat on counter""#
    )
}

/// Match the extracted trigger to exactly one detectable class.
pub fn word_match_prompt(trigger: &str) -> String {
    format!(
        r#"You are the word matching assistant. Match the scenario to ONE keyword from the list.

Scenario: "{trigger}"

Target Keywords: {keywords}

CRITICAL: Respond with ONLY ONE WORD from the list above. No explanation. No quotes. No punctuation.
If the scenario mentions a human/man/woman/person, respond with: person
Otherwise pick the most relevant keyword from the list."#,
        keywords = TARGET_CLASSES.join(", ")
    )
}

/// Pick the on-device model for the chosen target class.
pub fn model_select_prompt(target: &str) -> String {
    format!(
        r#"Target object: "{target}"

The device has 3 built-in TinyML models:
- Model 1: Person detection (person, human, people, man, woman)
- Model 2: Pet detection (dog, cat, puppy, kitten, pet)
- Model 3: Gesture detection (rock, paper, scissors, hand gesture)

CRITICAL: Which model should be used? Respond with ONLY ONE NUMBER: 1, 2, 3, or 0
- 1 if person/human related
- 2 if dog/cat/pet related
- 3 if rock/paper/scissors gesture
- 0 if none match (will require cloud model download)

Respond with ONLY the number. No explanation."#
    )
}

/// Summarize the original request in at most six words.
pub fn headline_prompt(transcript: &str) -> String {
    format!(
        r#"Create a short headline summarizing this task.

User input: "{transcript}"

CRITICAL: Respond with a short headline. Maximum 6 words. No quotes. No punctuation at the end.
Example: "Watch for delivery person" or "Monitor front door activity""#
    )
}

// ---------------------------------------------------------------------------
// Reply heuristics
// ---------------------------------------------------------------------------

/// Trim whitespace, strip surrounding single/double quotes, strip trailing
/// `.,!?;:`. Idempotent.
pub fn normalize_reply(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim_end_matches(['.', ',', '!', '?', ';', ':'])
        .trim()
        .to_string()
}

/// First occurrence of digit '1' or '2' wins; anything else is Chat.
pub fn parse_mode(reply: &str) -> InteractionMode {
    for c in reply.chars() {
        match c {
            '1' => return InteractionMode::Task,
            '2' => return InteractionMode::TaskAuto,
            _ => {}
        }
    }
    InteractionMode::Chat
}

/// Model selection: any mention of 2, 3, or 0 (checked in that order)
/// overrides the default Person model.
pub fn parse_model_kind(reply: &str) -> ModelKind {
    if reply.contains('2') {
        ModelKind::Pet
    } else if reply.contains('3') {
        ModelKind::Gesture
    } else if reply.contains('0') {
        ModelKind::Cloud
    } else {
        ModelKind::Person
    }
}

const POSITIVE_CUES: [&str; 7] = [
    "yes",
    "there is",
    "i can see",
    "visible",
    "present",
    "wearing",
    "detected",
];

const NEGATIVE_CUES: [&str; 5] = ["no", "not", "cannot", "can't", "unable"];

/// Monitoring verdict from a VLM analysis: 1 iff a positive cue is present
/// and no negative cue is.
pub fn monitoring_state(analysis: &str) -> i64 {
    let lower = analysis.to_lowercase();
    let positive = POSITIVE_CUES.iter().any(|cue| lower.contains(cue));
    let negative = NEGATIVE_CUES.iter().any(|cue| lower.contains(cue));
    if positive && !negative {
        1
    } else {
        0
    }
}
