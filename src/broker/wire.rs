//! Task-queue wire format (spec §6.2). Fixed for interoperability with the
//! existing worker runtime: field names, base64 body encoding, and UUID-v4
//! identifiers must match exactly, not just carry equivalent information.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::StrategyParams;

const TASK_NAME: &str = "backtest.tasks.backtest_redux";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMessage {
    pub body: String,
    #[serde(rename = "content-encoding")]
    pub content_encoding: String,
    #[serde(rename = "content-type")]
    pub content_type: String,
    pub headers: Value,
    pub properties: Value,
}

/// Build one task message for a sweep point (spec §6.2). `queue` is the
/// routing key the worker runtime's consumers are bound to; `origin` is the
/// `<pid>@<hostname>` string the dispatcher process reports itself as.
pub fn encode_task(params: &StrategyParams, queue: &str, origin: &str) -> Result<TaskMessage> {
    let task_id = Uuid::new_v4().to_string();

    let kwargs = serde_json::to_value(params).context("serializing strategy params")?;
    let body_triple = json!([Vec::<Value>::new(), kwargs, Value::Object(Default::default())]);
    let body = STANDARD.encode(serde_json::to_vec(&body_triple).context("encoding task body")?);

    let headers = json!({
        "lang": "py",
        "task": TASK_NAME,
        "id": task_id,
        "root_id": task_id,
        "parent_id": null,
        "group": null,
        "retries": 0,
        "timelimit": [null, null],
        "argsrepr": "[]",
        "kwargsrepr": kwargs.to_string(),
        "origin": origin,
        "ignore_result": false,
    });

    let properties = json!({
        "correlation_id": task_id,
        "reply_to": Uuid::new_v4().to_string(),
        "delivery_mode": 2,
        "delivery_info": { "exchange": "", "routing_key": queue },
        "priority": 0,
        "body_encoding": "base64",
        "delivery_tag": Uuid::new_v4().to_string(),
    });

    Ok(TaskMessage {
        body,
        content_encoding: "utf-8".to_string(),
        content_type: "application/json".to_string(),
        headers,
        properties,
    })
}

/// Decode a task message's body back into its `StrategyParams` kwargs
/// (spec §6.2). `args` is ignored; the reference runtime carries the whole
/// payload in `kwargs`.
pub fn decode_task(message: &TaskMessage) -> Result<StrategyParams> {
    let decoded = STANDARD
        .decode(&message.body)
        .context("base64-decoding task body")?;
    let triple: Value = serde_json::from_slice(&decoded).context("parsing task body triple")?;
    let kwargs = triple
        .get(1)
        .context("task body missing kwargs element")?
        .clone();
    serde_json::from_value(kwargs).context("decoding strategy params from kwargs")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StrategyParams {
        StrategyParams {
            stop_distance: 0.25,
            stop_count_limit: 4,
            stop_cooloff_period: 30,
            limit_distance: 5.0,
        }
    }

    #[test]
    fn body_decodes_to_args_kwargs_embed_triple() {
        let msg = encode_task(&params(), "backtest", "123@worker-0").unwrap();
        let decoded = STANDARD.decode(&msg.body).unwrap();
        let triple: Value = serde_json::from_slice(&decoded).unwrap();
        let array = triple.as_array().unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array[0], json!([]));
        assert_eq!(array[1]["stop_distance"], 0.25);
        assert_eq!(array[2], json!({}));
    }

    #[test]
    fn headers_and_properties_carry_matching_uuid_v4_id() {
        let msg = encode_task(&params(), "backtest", "123@worker-0").unwrap();
        let id = msg.headers["id"].as_str().unwrap();
        let correlation_id = msg.properties["correlation_id"].as_str().unwrap();
        assert_eq!(id, correlation_id);
        assert_eq!(Uuid::parse_str(id).unwrap().get_version_num(), 4);
    }

    #[test]
    fn decode_task_round_trips_params() {
        let msg = encode_task(&params(), "backtest", "123@worker-0").unwrap();
        let decoded = decode_task(&msg).unwrap();
        assert_eq!(decoded, params());
    }

    #[test]
    fn routing_key_matches_requested_queue() {
        let msg = encode_task(&params(), "backtest", "123@worker-0").unwrap();
        assert_eq!(msg.properties["delivery_info"]["routing_key"], "backtest");
        assert_eq!(msg.properties["delivery_mode"], 2);
        assert_eq!(msg.properties["body_encoding"], "base64");
    }
}
