use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::models::Reaction;

/// Per-value reaction summary. `count` is the number of DISTINCT members
/// who reacted with `value`; duplicate raw rows for the same member collapse
/// into one. The per-instance member linkage never leaves this shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionGroup {
    pub value: String,
    pub count: i64,
    pub member_ids: Vec<String>,
}

pub async fn fetch_reactions(
    db: &SqlitePool,
    message_id: &str,
) -> Result<Vec<Reaction>, ApiError> {
    let rows = sqlx::query_as::<_, Reaction>(
        "SELECT * FROM reactions WHERE message_id = ? ORDER BY created_at ASC",
    )
    .bind(message_id)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Collapse raw reaction rows into per-value groups. Groups appear in
/// first-occurrence order of their value; member ids likewise. Counting
/// happens strictly after the per-member dedup, so `count` always equals
/// `member_ids.len()`.
pub fn aggregate_reactions(rows: &[Reaction]) -> Vec<ReactionGroup> {
    let mut groups: Vec<ReactionGroup> = Vec::new();

    for reaction in rows {
        match groups.iter_mut().find(|g| g.value == reaction.value) {
            Some(group) => {
                if !group.member_ids.contains(&reaction.member_id) {
                    group.member_ids.push(reaction.member_id.clone());
                    group.count += 1;
                }
            }
            None => groups.push(ReactionGroup {
                value: reaction.value.clone(),
                count: 1,
                member_ids: vec![reaction.member_id.clone()],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(member_id: &str, value: &str) -> Reaction {
        Reaction {
            id: format!("r-{member_id}-{value}"),
            workspace_id: "w1".into(),
            message_id: "m1".into(),
            member_id: member_id.into(),
            value: value.into(),
            created_at: 0,
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(aggregate_reactions(&[]).is_empty());
    }

    #[test]
    fn duplicate_member_rows_collapse() {
        // Member A reacted 👍 twice (raw duplicates), member B once.
        let rows = vec![
            reaction("a", "👍"),
            reaction("a", "👍"),
            reaction("b", "👍"),
        ];

        let groups = aggregate_reactions(&rows);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].value, "👍");
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].member_ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn groups_keep_first_occurrence_order() {
        let rows = vec![
            reaction("a", "🎉"),
            reaction("b", "👍"),
            reaction("c", "🎉"),
        ];

        let groups = aggregate_reactions(&rows);
        let values: Vec<&str> = groups.iter().map(|g| g.value.as_str()).collect();
        assert_eq!(values, vec!["🎉", "👍"]);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn total_count_matches_distinct_member_value_pairs() {
        let rows = vec![
            reaction("a", "👍"),
            reaction("a", "👍"),
            reaction("a", "🎉"),
            reaction("b", "👍"),
            reaction("b", "🎉"),
            reaction("b", "🎉"),
        ];

        let groups = aggregate_reactions(&rows);
        let total: i64 = groups.iter().map(|g| g.count).sum();
        // 4 distinct (member, value) pairs, not 6 raw rows.
        assert_eq!(total, 4);
        for group in &groups {
            assert_eq!(group.count as usize, group.member_ids.len());
        }
    }
}
