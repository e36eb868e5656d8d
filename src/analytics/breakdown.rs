use super::types::CategoryBreakdown;
use crate::model::InsightRecord;

/// Type, priority, status, and project frequencies in a single pass.
/// Records without a project are left out of the project mapping only.
pub fn compute_breakdown(records: &[InsightRecord]) -> CategoryBreakdown {
    let mut breakdown = CategoryBreakdown::default();
    for record in records {
        *breakdown
            .by_type
            .entry(record.insight_type.clone())
            .or_default() += 1;
        *breakdown
            .by_priority
            .entry(record.priority.clone())
            .or_default() += 1;
        *breakdown.by_status.entry(record.status.clone()).or_default() += 1;
        if let Some(project) = record.project() {
            *breakdown
                .by_project
                .entry(project.to_string())
                .or_default() += 1;
        }
    }
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::RecordBuilder;
    use crate::model::{InsightType, Priority, Status};

    #[test]
    fn test_breakdown_counts() {
        let records = vec![
            RecordBuilder::new("1")
                .kind(InsightType::Risk)
                .priority(Priority::High)
                .project("Seminole")
                .build(),
            RecordBuilder::new("2")
                .kind(InsightType::Risk)
                .priority(Priority::Low)
                .status(Status::Completed)
                .project("Seminole")
                .build(),
            RecordBuilder::new("3")
                .kind(InsightType::Blocker)
                .priority(Priority::High)
                .project("Osceola")
                .build(),
            RecordBuilder::new("4").kind(InsightType::Decision).build(),
        ];

        let b = compute_breakdown(&records);
        assert_eq!(b.by_type[&InsightType::Risk], 2);
        assert_eq!(b.by_type[&InsightType::Blocker], 1);
        assert_eq!(b.by_type[&InsightType::Decision], 1);
        assert_eq!(b.by_priority[&Priority::High], 2);
        assert_eq!(b.by_priority[&Priority::Medium], 1);
        assert_eq!(b.by_status[&Status::Open], 3);
        assert_eq!(b.by_status[&Status::Completed], 1);
        assert_eq!(b.by_project.len(), 2);
        assert_eq!(b.by_project["Seminole"], 2);
        assert!(!b.by_project.contains_key(""));
    }

    #[test]
    fn test_unknown_values_form_their_own_bucket() {
        let records = vec![
            RecordBuilder::new("1")
                .kind(InsightType::parse("technical_detail"))
                .priority(Priority::parse("urgent"))
                .status(Status::parse("on_hold"))
                .build(),
            RecordBuilder::new("2")
                .kind(InsightType::parse("technical_detail"))
                .build(),
        ];

        let b = compute_breakdown(&records);
        assert_eq!(b.by_type[&InsightType::Other("technical_detail".into())], 2);
        assert_eq!(b.by_priority[&Priority::Other("urgent".into())], 1);
        assert_eq!(b.by_status[&Status::Other("on_hold".into())], 1);
        let status_total: u64 = b.by_status.values().sum();
        assert_eq!(status_total, 2);
    }

    #[test]
    fn test_breakdown_serializes_string_keys() {
        let records = vec![RecordBuilder::new("1").kind(InsightType::BudgetUpdate).build()];
        let json = serde_json::to_value(compute_breakdown(&records)).unwrap();
        assert_eq!(json["by_type"]["budget_update"], 1);
        assert_eq!(json["by_status"]["open"], 1);
    }
}
