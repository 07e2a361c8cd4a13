//! Deterministic synthetic sales tasks.
//!
//! Used as the bootstrap fallback when no external task list is available,
//! and as a fixture source for stress-testing the sanitizer.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

const ACTIONS: [&str; 8] = [
    "Discovery call with",
    "Demo for",
    "Proposal to",
    "Contract renewal with",
    "Upsell review for",
    "Follow-up with",
    "Negotiation with",
    "Onboarding for",
];

const ACCOUNTS: [&str; 10] = [
    "Acme Corp",
    "Globex",
    "Initech",
    "Umbrella Health",
    "Stark Logistics",
    "Wayne Retail",
    "Hooli",
    "Vandelay Imports",
    "Soylent Foods",
    "Tyrell Systems",
];

const PRIORITIES: [&str; 3] = ["High", "Medium", "Low"];
const STATUSES: [&str; 3] = ["Todo", "In Progress", "Done"];

const NOTES: [&str; 4] = [
    "Decision maker looped in",
    "Waiting on procurement",
    "Budget confirmed for next quarter",
    "Needs security review",
];

/// Generate `count` plausible raw task records from `seed`.
///
/// Records carry no `createdAt`, so the sanitizer assigns ordered
/// timestamps.
pub fn generate_sales_tasks(count: usize, seed: u64) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|idx| {
            let action = ACTIONS.choose(&mut rng).copied().unwrap_or(ACTIONS[0]);
            let account = ACCOUNTS.choose(&mut rng).copied().unwrap_or(ACCOUNTS[0]);
            let revenue = (rng.gen_range(500.0..50_000.0_f64) * 100.0).round() / 100.0;
            let time_taken = (rng.gen_range(1.0..80.0_f64) * 10.0).round() / 10.0;
            let priority = PRIORITIES.choose(&mut rng).copied().unwrap_or("Medium");
            let status = STATUSES.choose(&mut rng).copied().unwrap_or("Todo");

            let mut record = json!({
                "id": format!("task-{}", idx + 1),
                "title": format!("{action} {account}"),
                "revenue": revenue,
                "timeTaken": time_taken,
                "priority": priority,
                "status": status,
            });
            if rng.gen_bool(0.3) {
                if let Some(note) = NOTES.choose(&mut rng) {
                    record["notes"] = json!(note);
                }
            }
            record
        })
        .collect()
}

/// Append malformed and duplicate-id records to a batch.
///
/// A seedable stand-in for hostile bootstrap data: records with missing
/// ids, blank titles, non-numeric or negative amounts, unknown enum values
/// and ids that collide with existing records.
pub fn inject_malformed(mut records: Vec<Value>, seed: u64) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(seed);
    let duplicate_id = records
        .first()
        .and_then(|record| record.get("id"))
        .and_then(Value::as_str)
        .unwrap_or("dup-1")
        .to_string();

    let junk = [
        json!({ "id": null, "title": "", "revenue": "NaN", "timeTaken": 0, "priority": "High", "status": "Todo" }),
        json!({ "id": duplicate_id, "title": "Duplicate ID", "revenue": 9_999_999_999.0, "timeTaken": -5, "priority": "Low", "status": "Done" }),
        json!({ "id": "   ", "title": "Blank id" }),
        json!({ "id": "weird-enums", "title": "Odd values", "priority": "URGENT", "status": "Blocked", "revenue": [1, 2], "notes": 12 }),
        json!("not a record"),
        json!(null),
    ];

    for record in junk {
        let idx = rng.gen_range(0..=records.len());
        records.insert(idx, record);
    }
    records
}
