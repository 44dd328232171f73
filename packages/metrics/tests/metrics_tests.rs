// ABOUTME: Integration tests for dashboard metrics aggregation
// ABOUTME: Processing time, on-time rate, bottlenecks, distribution, and compliance

use chrono::{Duration, Utc};
use stagegate_core::{
    classify, Category, ProjectCreateInput, Role, UploadStatus, UserCreateInput,
};
use stagegate_metrics::MetricsAggregator;
use stagegate_storage::{Database, DocumentCreateInput};
use stagegate_workflow::{ApprovalManager, Decision, ProjectService};

fn project_input(name: &str, revenue: i64, risk_factor: i64) -> ProjectCreateInput {
    ProjectCreateInput {
        name: name.to_string(),
        client: "Client".to_string(),
        description: None,
        revenue,
        risk_factor,
        country: None,
        technique: None,
        status: None,
        next_review_date: None,
        bid_manager_id: None,
        project_manager_id: None,
        created_by: None,
    }
}

#[tokio::test]
async fn empty_database_yields_zeroed_reports() {
    let db = Database::memory().await.unwrap();
    let metrics = MetricsAggregator::new(&db);

    let stats = metrics.gate_processing_stats().await.unwrap();
    assert_eq!(stats.completed_gates, 0);
    assert_eq!(stats.average_processing_days, 0.0);
    assert_eq!(stats.on_time_rate, 0.0);

    assert!(metrics.bottlenecks(Utc::now()).await.unwrap().is_empty());

    let distribution = metrics.category_distribution().await.unwrap();
    assert_eq!(distribution.len(), 5);
    assert!(distribution.iter().all(|c| c.count == 0));

    let compliance = metrics.compliance_summary().await.unwrap();
    assert_eq!(compliance.document_compliance_pct, 0.0);
    assert_eq!(compliance.approval_compliance_pct, 0.0);

    let snapshot = metrics.dashboard_snapshot().await.unwrap();
    assert_eq!(snapshot.total_projects, 0);
    assert_eq!(snapshot.ready_to_advance, 0);
}

#[tokio::test]
async fn processing_stats_average_and_on_time_rate() {
    let db = Database::memory().await.unwrap();
    let metrics = MetricsAggregator::new(&db);

    let project = db
        .projects()
        .create(project_input("Timed", 100_000, 1), Category::Category1a)
        .await
        .unwrap();

    let start = Utc::now() - Duration::days(30);
    let gates = db.gates();

    // Gate 1: took 10 days against a 14-day deadline (on time).
    gates
        .open(&project.id, 1, start, start + Duration::days(14))
        .await
        .unwrap();
    gates
        .complete(&project.id, 1, start + Duration::days(10))
        .await
        .unwrap();

    // Gate 2: took 20 days against a 14-day deadline (late).
    let g2_start = start + Duration::days(10);
    gates
        .open(&project.id, 2, g2_start, g2_start + Duration::days(14))
        .await
        .unwrap();
    gates
        .complete(&project.id, 2, g2_start + Duration::days(20))
        .await
        .unwrap();

    // Gate 3 is still open and does not count.
    let g3_start = g2_start + Duration::days(20);
    gates
        .open(&project.id, 3, g3_start, g3_start + Duration::days(14))
        .await
        .unwrap();

    let stats = metrics.gate_processing_stats().await.unwrap();
    assert_eq!(stats.completed_gates, 2);
    assert!((stats.average_processing_days - 15.0).abs() < 0.01);
    assert!((stats.on_time_rate - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn bottlenecks_rank_by_delay_and_overdue_penalty() {
    let db = Database::memory().await.unwrap();
    let metrics = MetricsAggregator::new(&db);
    let now = Utc::now();

    let gates = db.gates();
    let projects = db.projects();

    let p1 = projects
        .create(project_input("P1", 100_000, 1), Category::Category1a)
        .await
        .unwrap();
    let p2 = projects
        .create(project_input("P2", 100_000, 1), Category::Category1a)
        .await
        .unwrap();
    let p3 = projects
        .create(project_input("P3", 100_000, 1), Category::Category1a)
        .await
        .unwrap();

    let start = now - Duration::days(40);

    // Gate 2: completed 6 days late -> avg delay 6, score 6.
    gates
        .open(&p1.id, 2, start, start + Duration::days(14))
        .await
        .unwrap();
    gates
        .complete(&p1.id, 2, start + Duration::days(20))
        .await
        .unwrap();

    // Gate 3: one open record already past deadline -> score 5.
    gates
        .open(&p2.id, 3, start, start + Duration::days(14))
        .await
        .unwrap();

    // Gate 4: completed on time -> score 0.
    gates
        .open(&p3.id, 4, start, start + Duration::days(14))
        .await
        .unwrap();
    gates
        .complete(&p3.id, 4, start + Duration::days(7))
        .await
        .unwrap();

    // Gate 1: completed 2 days late on one project, one overdue open on
    // another -> avg delay 2 + penalty 5 = 7, the worst.
    gates
        .open(&p1.id, 1, start, start + Duration::days(14))
        .await
        .unwrap();
    gates
        .complete(&p1.id, 1, start + Duration::days(16))
        .await
        .unwrap();
    gates
        .open(&p2.id, 1, start, start + Duration::days(14))
        .await
        .unwrap();

    let bottlenecks = metrics.bottlenecks(now).await.unwrap();
    assert_eq!(bottlenecks.len(), 3);

    assert_eq!(bottlenecks[0].gate_number, 1);
    assert!((bottlenecks[0].score - 7.0).abs() < 0.01);
    assert_eq!(bottlenecks[0].overdue_count, 1);

    assert_eq!(bottlenecks[1].gate_number, 2);
    assert!((bottlenecks[1].score - 6.0).abs() < 0.01);

    assert_eq!(bottlenecks[2].gate_number, 3);
    assert!((bottlenecks[2].score - 5.0).abs() < 0.01);
    assert_eq!(bottlenecks[2].gate_name, "Bid Submission");
}

#[tokio::test]
async fn category_distribution_counts_projects() {
    let db = Database::memory().await.unwrap();
    let metrics = MetricsAggregator::new(&db);

    for (name, revenue, risk) in [
        ("A", 100_000, 1),
        ("B", 200_000, 2),
        ("C", 1_000_000, 2),
        ("D", 40_000_000, 6),
    ] {
        let input = project_input(name, revenue, risk);
        let category = classify(revenue, risk);
        db.projects().create(input, category).await.unwrap();
    }

    let distribution = metrics.category_distribution().await.unwrap();
    let count_of = |category: Category| {
        distribution
            .iter()
            .find(|c| c.category == category)
            .unwrap()
            .count
    };
    assert_eq!(count_of(Category::Category1a), 2);
    assert_eq!(count_of(Category::Category1b), 1);
    assert_eq!(count_of(Category::Category1c), 0);
    assert_eq!(count_of(Category::Category3), 1);
}

#[tokio::test]
async fn compliance_tracks_documents_and_resolution_timeliness() {
    let db = Database::memory().await.unwrap();
    let metrics = MetricsAggregator::new(&db);
    let service = ProjectService::new(&db);
    let manager = ApprovalManager::new(&db);

    let branch_id = db
        .users()
        .create(UserCreateInput {
            email: "branch@example.com".to_string(),
            full_name: "Branch Manager".to_string(),
            role: Role::BranchManager,
            country: None,
            branch: None,
        })
        .await
        .unwrap()
        .id;

    let project = service
        .create_project(project_input("Compliant", 1_000_000, 2))
        .await
        .unwrap();

    // Gate 1 has a single required document; fulfill it.
    let documents = db.documents();
    let requirement = documents
        .requirements_for_gate(1)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.is_required)
        .unwrap();
    documents
        .add_document(DocumentCreateInput {
            project_id: project.id.clone(),
            requirement_id: requirement.id,
            file_name: "assessment.pdf".to_string(),
            upload_status: Some(UploadStatus::Completed),
            uploaded_by: None,
        })
        .await
        .unwrap();

    // Resolve the branch approval within its due window.
    let approvals = db.approvals().list_for_gate(&project.id, 1).await.unwrap();
    let approval = &approvals[0];
    manager
        .resolve(&approval.id, Decision::Approved, &branch_id, None)
        .await
        .unwrap();

    let compliance = metrics.compliance_summary().await.unwrap();
    assert!((compliance.document_compliance_pct - 100.0).abs() < 0.01);
    assert!((compliance.approval_compliance_pct - 100.0).abs() < 0.01);

    // The fully satisfied project shows up as ready to advance.
    let snapshot = metrics.dashboard_snapshot().await.unwrap();
    assert_eq!(snapshot.total_projects, 1);
    assert_eq!(snapshot.ready_to_advance, 1);
}
