use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use super::repo_types::Document;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: Option<String>,
    pub email: Option<String>,
    pub total_amount: f64,
    pub donations: usize,
}

/// Donation amounts may arrive as numbers or numeric strings.
/// Anything non-finite (`"inf"`, `"NaN"`) counts as zero.
fn amount_of(doc: &Document) -> f64 {
    let amount = match doc.body.get("amount") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if amount.is_finite() {
        amount
    } else {
        0.0
    }
}

/// Group donations by donor (email, else name) and rank by total amount.
pub fn rank(donations: &[Document]) -> Vec<LeaderboardEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut by_donor: HashMap<String, LeaderboardEntry> = HashMap::new();

    for doc in donations {
        let email = doc.str_field("email").map(str::to_owned);
        let name = doc.str_field("name").map(str::to_owned);
        let key = match (&email, &name) {
            (Some(e), _) => format!("email:{}", e.to_lowercase()),
            (None, Some(n)) => format!("name:{n}"),
            (None, None) => continue,
        };

        let entry = by_donor.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            LeaderboardEntry {
                name: None,
                email: email.clone(),
                total_amount: 0.0,
                donations: 0,
            }
        });
        if entry.name.is_none() {
            entry.name = name;
        }
        // totals saturate instead of overflowing to infinity
        let total = entry.total_amount + amount_of(doc);
        entry.total_amount = if total.is_finite() {
            total
        } else {
            f64::MAX.copysign(total)
        };
        entry.donations += 1;
    }

    let mut entries: Vec<LeaderboardEntry> = order
        .into_iter()
        .filter_map(|k| by_donor.remove(&k))
        .collect();
    // ties on amount fall back to name
    entries.sort_by(|a, b| {
        b.total_amount
            .total_cmp(&a.total_amount)
            .then_with(|| a.name.cmp(&b.name))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn donation(value: Value) -> Document {
        Document {
            id: Uuid::new_v4(),
            body: value.as_object().cloned().unwrap(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn sums_and_orders_by_amount() {
        let docs = vec![
            donation(json!({ "name": "Alice", "email": "a@x.com", "amount": 50 })),
            donation(json!({ "name": "Bob", "email": "b@x.com", "amount": 120 })),
            donation(json!({ "name": "Alice", "email": "A@x.com", "amount": "100" })),
            donation(json!({ "name": "Carol", "amount": 10.5 })),
        ];
        let board = rank(&docs);
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].name.as_deref(), Some("Alice"));
        assert_eq!(board[0].total_amount, 150.0);
        assert_eq!(board[0].donations, 2);
        assert_eq!(board[1].name.as_deref(), Some("Bob"));
        assert_eq!(board[2].email, None);
        assert_eq!(board[2].total_amount, 10.5);
    }

    #[test]
    fn skips_anonymous_and_tolerates_bad_amounts() {
        let docs = vec![
            donation(json!({ "amount": 999 })),
            donation(json!({ "email": "z@x.com", "amount": "lots" })),
        ];
        let board = rank(&docs);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].total_amount, 0.0);
    }

    #[test]
    fn non_finite_amounts_cannot_top_the_board() {
        let docs = vec![
            donation(json!({ "name": "Honest", "email": "h@x.com", "amount": 1000 })),
            donation(json!({ "name": "Mallory", "email": "m@x.com", "amount": "inf" })),
            donation(json!({ "name": "Nan", "email": "n@x.com", "amount": "NaN" })),
            donation(json!({ "name": "Ivy", "email": "i@x.com", "amount": "-infinity" })),
        ];
        let board = rank(&docs);
        assert_eq!(board[0].name.as_deref(), Some("Honest"));
        assert!(board.iter().all(|e| e.total_amount.is_finite()));
        assert!(board[1..].iter().all(|e| e.total_amount == 0.0));

        let value = serde_json::to_value(&board).unwrap();
        assert!(value
            .as_array()
            .unwrap()
            .iter()
            .all(|e| e["totalAmount"].is_number()));
    }

    #[test]
    fn huge_totals_saturate() {
        let docs = vec![
            donation(json!({ "name": "Big", "email": "b@x.com", "amount": 1.5e308 })),
            donation(json!({ "name": "Big", "email": "b@x.com", "amount": 1.5e308 })),
        ];
        let board = rank(&docs);
        assert_eq!(board[0].total_amount, f64::MAX);
        assert_eq!(board[0].donations, 2);
    }

    #[test]
    fn serializes_camel_case() {
        let board = rank(&[donation(json!({ "name": "Dee", "email": "d@x.com", "amount": 5 }))]);
        let value = serde_json::to_value(&board[0]).unwrap();
        assert_eq!(
            value,
            json!({ "name": "Dee", "email": "d@x.com", "totalAmount": 5.0, "donations": 1 })
        );
    }
}
