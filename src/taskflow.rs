//! Task-Flow Compiler: distill a spoken request into a persisted monitoring
//! task, and reify the newest task into the node graph the firmware runs.
//!
//! Compilation is a chain of single-purpose LLM calls (trigger → target
//! class → model kind → headline) followed by a delete-then-insert swap of
//! the device's task flow. Sub-prompt and store failures degrade to
//! defaults; the spoken confirmation is always produced.

use crate::ai::LlmClient;
use crate::prompts;
use crate::store::{NewTaskFlow, TaskFlowRecord, WatcherStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const FALLBACK_HEADLINE: &str = "Task created";
const DEFAULT_TARGET: &str = "person";

/// On-device model executing continuous inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Cloud = 0,
    Person = 1,
    Pet = 2,
    Gesture = 3,
}

impl ModelKind {
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => ModelKind::Person,
            2 => ModelKind::Pet,
            3 => ModelKind::Gesture,
            _ => ModelKind::Cloud,
        }
    }
}

pub struct TaskFlowCompiler {
    llm: Arc<LlmClient>,
    store: Arc<WatcherStore>,
}

impl TaskFlowCompiler {
    pub fn new(llm: Arc<LlmClient>, store: Arc<WatcherStore>) -> Self {
        Self { llm, store }
    }

    /// Compile the transcript into a task flow, supersede any previous flows
    /// for the device, and return the spoken confirmation.
    pub async fn compile(&self, transcript: &str, device_eui: &str) -> String {
        let trigger = self.extract_trigger(transcript).await;
        info!(target: "sensecap::taskflow", "trigger condition: '{trigger}'");

        let target = self.match_target(&trigger).await;
        info!(target: "sensecap::taskflow", "target object: '{target}'");

        let model_type = self.select_model(&target).await;
        info!(target: "sensecap::taskflow", "model kind: {model_type:?}");

        let headline = self.make_headline(transcript).await;
        info!(target: "sensecap::taskflow", "headline: '{headline}'");

        self.supersede(device_eui, transcript, &headline, &trigger, &target, model_type);

        format!("I've created a monitoring task: {headline}. I'll watch for {trigger}.")
    }

    /// Trigger phrase, or the normalized transcript when extraction fails.
    async fn extract_trigger(&self, transcript: &str) -> String {
        match self.llm.generate(&prompts::trigger_prompt(transcript)).await {
            Ok(raw) => {
                let trigger = prompts::normalize_reply(&raw);
                if trigger.is_empty() {
                    prompts::normalize_reply(transcript)
                } else {
                    trigger
                }
            }
            Err(e) => {
                warn!(target: "sensecap::taskflow", "trigger extraction failed, using transcript: {e}");
                prompts::normalize_reply(transcript)
            }
        }
    }

    /// One class from the fixed vocabulary; anything else becomes `person`.
    async fn match_target(&self, trigger: &str) -> String {
        let matched = match self.llm.generate(&prompts::word_match_prompt(trigger)).await {
            Ok(raw) => prompts::normalize_reply(&raw).to_lowercase(),
            Err(e) => {
                warn!(target: "sensecap::taskflow", "object matching failed: {e}");
                String::new()
            }
        };
        if prompts::is_known_target_class(&matched) {
            matched
        } else {
            if !matched.is_empty() {
                warn!(
                    target: "sensecap::taskflow",
                    "'{matched}' is not in the target vocabulary, defaulting to {DEFAULT_TARGET}"
                );
            }
            DEFAULT_TARGET.to_string()
        }
    }

    async fn select_model(&self, target: &str) -> ModelKind {
        match self.llm.generate(&prompts::model_select_prompt(target)).await {
            Ok(raw) => prompts::parse_model_kind(&prompts::normalize_reply(&raw)),
            Err(e) => {
                warn!(target: "sensecap::taskflow", "model selection failed, defaulting to person model: {e}");
                ModelKind::Person
            }
        }
    }

    async fn make_headline(&self, transcript: &str) -> String {
        match self.llm.generate(&prompts::headline_prompt(transcript)).await {
            Ok(raw) => {
                let headline = prompts::normalize_reply(&raw);
                if headline.is_empty() {
                    FALLBACK_HEADLINE.to_string()
                } else {
                    headline
                }
            }
            Err(e) => {
                warn!(target: "sensecap::taskflow", "headline generation failed: {e}");
                FALLBACK_HEADLINE.to_string()
            }
        }
    }

    /// Delete-then-insert. The device runs one task at a time; a fetch
    /// landing between the two steps sees zero rows, which is a valid halt
    /// signal. Failures here never break the spoken confirmation.
    fn supersede(
        &self,
        device_eui: &str,
        name: &str,
        headline: &str,
        trigger: &str,
        target: &str,
        model_type: ModelKind,
    ) {
        match self.store.task_flows_by_device(device_eui) {
            Ok(old) => {
                for flow in old {
                    match self.store.delete_task_flow(flow.id) {
                        Ok(()) => info!(
                            target: "sensecap::taskflow",
                            "deleted superseded task: id={} headline='{}'", flow.id, flow.headline
                        ),
                        Err(e) => warn!(
                            target: "sensecap::taskflow",
                            "failed to delete superseded task {}: {e}", flow.id
                        ),
                    }
                }
            }
            Err(e) => {
                warn!(target: "sensecap::taskflow", "failed to list prior tasks: {e}")
            }
        }

        let flow = NewTaskFlow {
            device_eui,
            name,
            headline,
            trigger_condition: trigger,
            target_objects: vec![target.to_string()],
            actions: vec!["notify".to_string()],
            model_type,
        };
        match self.store.save_task_flow(flow) {
            Ok(saved) => info!(
                target: "sensecap::taskflow",
                "task flow saved: id={} headline='{}'", saved.id, saved.headline
            ),
            Err(e) => warn!(target: "sensecap::taskflow", "failed to save task flow: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Node-graph reification
// ---------------------------------------------------------------------------

/// Wrapper the firmware fetches from view_task_detail.
#[derive(Debug, Serialize)]
pub struct TaskFlowGraph {
    #[serde(rename = "type")]
    pub kind: i64,
    pub tlid: i64,
    pub ctd: i64,
    pub tn: String,
    pub task_flow: Vec<GraphNode>,
}

#[derive(Debug, Serialize)]
pub struct GraphNode {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub index: i64,
    pub params: NodeParams,
    pub wires: Vec<Vec<i64>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum NodeParams {
    AiCamera {
        modes: i64,
        model_type: i64,
        conditions: Vec<CameraCondition>,
        conditions_combo: i64,
        silent_period: SilentPeriod,
        output_type: i64,
        shutter: i64,
    },
    ImageAnalyzer {
        body: AnalyzerBody,
    },
    LocalAlarm {
        sound: i64,
        rgb: i64,
        img: i64,
        text: i64,
        duration: i64,
    },
    SensecraftAlarm {
        silence_duration: i64,
    },
}

#[derive(Debug, Serialize)]
pub struct CameraCondition {
    pub class: String,
    pub mode: i64,
    #[serde(rename = "type")]
    pub kind: i64,
    pub num: i64,
}

#[derive(Debug, Serialize)]
pub struct SilentPeriod {
    pub silence_duration: i64,
}

#[derive(Debug, Serialize)]
pub struct AnalyzerBody {
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: i64,
    pub audio_txt: String,
}

/// Reify a stored task flow into the literal four-node graph the firmware
/// executes: ai camera → image analyzer → { local alarm, sensecraft alarm }.
pub fn reify(task: &TaskFlowRecord) -> TaskFlowGraph {
    let target = task
        .target_objects
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_TARGET.to_string());

    let camera = GraphNode {
        id: 1,
        kind: "ai camera",
        index: 0,
        params: NodeParams::AiCamera {
            modes: 0, // inference
            model_type: task.model_type.as_i64(),
            conditions: vec![CameraCondition {
                class: target,
                mode: 1, // appear/disappear
                kind: 2, // preset
                num: 0,
            }],
            conditions_combo: 0, // AND
            silent_period: SilentPeriod {
                silence_duration: 5,
            },
            output_type: 1, // small and large image
            shutter: 0,     // trigger constantly
        },
        wires: vec![vec![2]],
    };

    let analyzer = GraphNode {
        id: 2,
        kind: "image analyzer",
        index: 1,
        params: NodeParams::ImageAnalyzer {
            body: AnalyzerBody {
                prompt: task.trigger_condition.clone(),
                kind: 1, // monitoring
                audio_txt: String::new(),
            },
        },
        wires: vec![vec![3, 4]],
    };

    let local_alarm = GraphNode {
        id: 3,
        kind: "local alarm",
        index: 2,
        params: NodeParams::LocalAlarm {
            sound: 1,
            rgb: 1,
            img: 0,
            text: 0,
            duration: 5,
        },
        wires: vec![],
    };

    let sensecraft_alarm = GraphNode {
        id: 4,
        kind: "sensecraft alarm",
        index: 3,
        params: NodeParams::SensecraftAlarm {
            silence_duration: 30,
        },
        wires: vec![],
    };

    TaskFlowGraph {
        kind: 0,
        tlid: task.id,
        ctd: task.created_at_ms,
        tn: task.headline.clone(),
        task_flow: vec![camera, analyzer, local_alarm, sensecraft_alarm],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> TaskFlowRecord {
        TaskFlowRecord {
            id: 7,
            device_eui: "2CF7F1C04430000C".to_string(),
            name: "notify me when a person arrives".to_string(),
            headline: "Watch for person".to_string(),
            trigger_condition: "person arrives".to_string(),
            target_objects: vec!["person".to_string()],
            actions: vec!["notify".to_string()],
            model_type: ModelKind::Person,
            created_at_ms: 1_700_000_000_000,
            updated_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn model_kind_wire_values() {
        assert_eq!(ModelKind::Cloud.as_i64(), 0);
        assert_eq!(ModelKind::Person.as_i64(), 1);
        assert_eq!(ModelKind::Pet.as_i64(), 2);
        assert_eq!(ModelKind::Gesture.as_i64(), 3);
        assert_eq!(ModelKind::from_i64(2), ModelKind::Pet);
        assert_eq!(ModelKind::from_i64(99), ModelKind::Cloud);
    }

    #[test]
    fn reified_graph_has_four_wired_nodes() {
        let graph = reify(&sample_task());
        let value = serde_json::to_value(&graph).unwrap();

        assert_eq!(value["type"], 0);
        assert_eq!(value["tlid"], 7);
        assert_eq!(value["ctd"], 1_700_000_000_000i64);
        assert_eq!(value["tn"], "Watch for person");

        let nodes = value["task_flow"].as_array().unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0]["type"], "ai camera");
        assert_eq!(nodes[1]["type"], "image analyzer");
        assert_eq!(nodes[2]["type"], "local alarm");
        assert_eq!(nodes[3]["type"], "sensecraft alarm");

        assert_eq!(nodes[0]["wires"], serde_json::json!([[2]]));
        assert_eq!(nodes[1]["wires"], serde_json::json!([[3, 4]]));
        assert_eq!(nodes[2]["wires"], serde_json::json!([]));
        assert_eq!(nodes[3]["wires"], serde_json::json!([]));
    }

    #[test]
    fn camera_node_carries_model_and_condition() {
        let graph = reify(&sample_task());
        let value = serde_json::to_value(&graph).unwrap();
        let camera = &value["task_flow"][0]["params"];

        assert_eq!(camera["modes"], 0);
        assert_eq!(camera["model_type"], 1);
        assert_eq!(camera["conditions"][0]["class"], "person");
        assert_eq!(camera["conditions"][0]["mode"], 1);
        assert_eq!(camera["conditions"][0]["type"], 2);
        assert_eq!(camera["conditions"][0]["num"], 0);
        assert_eq!(camera["conditions_combo"], 0);
        assert_eq!(camera["silent_period"]["silence_duration"], 5);
        assert_eq!(camera["output_type"], 1);
        assert_eq!(camera["shutter"], 0);
    }

    #[test]
    fn analyzer_node_reuses_trigger_as_prompt() {
        let graph = reify(&sample_task());
        let value = serde_json::to_value(&graph).unwrap();
        let analyzer = &value["task_flow"][1]["params"]["body"];

        assert_eq!(analyzer["prompt"], "person arrives");
        assert_eq!(analyzer["type"], 1);
        assert_eq!(analyzer["audio_txt"], "");
    }

    #[test]
    fn alarm_nodes_use_fixed_parameters() {
        let graph = reify(&sample_task());
        let value = serde_json::to_value(&graph).unwrap();

        let local = &value["task_flow"][2]["params"];
        assert_eq!(local["sound"], 1);
        assert_eq!(local["rgb"], 1);
        assert_eq!(local["img"], 0);
        assert_eq!(local["text"], 0);
        assert_eq!(local["duration"], 5);

        let sensecraft = &value["task_flow"][3]["params"];
        assert_eq!(sensecraft["silence_duration"], 30);
    }
}
