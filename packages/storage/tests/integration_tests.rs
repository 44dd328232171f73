// ABOUTME: Integration tests for the Stagegate storage layer
// ABOUTME: Exercises stores against an in-memory SQLite database with real migrations

use chrono::{Duration, Utc};
use stagegate_core::{
    classify, ApprovalStatus, Category, CommentEntry, DocumentRequirement, NotificationKind,
    ProjectCreateInput, Role, UploadStatus, UserCreateInput,
};
use stagegate_storage::{
    Database, DocumentCreateInput, NotificationCreateInput, ProjectFilter, StorageConfig,
};

fn project_input(name: &str, revenue: i64, risk_factor: i64) -> ProjectCreateInput {
    ProjectCreateInput {
        name: name.to_string(),
        client: "Port Authority".to_string(),
        description: None,
        revenue,
        risk_factor,
        country: Some("AU".to_string()),
        technique: None,
        status: None,
        next_review_date: None,
        bid_manager_id: None,
        project_manager_id: None,
        created_by: None,
    }
}

#[tokio::test]
async fn create_and_get_project() {
    let db = Database::memory().await.unwrap();
    let projects = db.projects();

    let input = project_input("Harbour Expansion", 1_000_000, 2);
    let category = classify(input.revenue, input.risk_factor);
    let project = projects.create(input, category).await.unwrap();

    assert_eq!(project.category, Category::Category1b);
    assert_eq!(project.current_gate, 1);

    let fetched = projects.get(&project.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Harbour Expansion");
    assert_eq!(fetched.category, Category::Category1b);
    assert_eq!(fetched.revenue, 1_000_000);
}

#[tokio::test]
async fn filter_by_category_and_search() {
    let db = Database::memory().await.unwrap();
    let projects = db.projects();

    for (name, revenue, risk) in [
        ("Small Works", 100_000, 1),
        ("Mid Build", 1_000_000, 2),
        ("Mega Rail", 40_000_000, 6),
    ] {
        let input = project_input(name, revenue, risk);
        let category = classify(revenue, risk);
        projects.create(input, category).await.unwrap();
    }

    let filter = ProjectFilter {
        category: Some(Category::Category3),
        ..Default::default()
    };
    let found = projects.list_with_filter(filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Mega Rail");

    let filter = ProjectFilter {
        search: Some("mid".to_string()),
        ..Default::default()
    };
    let found = projects.list_with_filter(filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Mid Build");
}

#[tokio::test]
async fn advance_gate_is_conditional() {
    let db = Database::memory().await.unwrap();
    let projects = db.projects();

    let input = project_input("CAS Test", 100_000, 1);
    let project = projects.create(input, Category::Category1a).await.unwrap();

    // First writer wins.
    assert!(projects.advance_gate(&project.id, 1).await.unwrap());
    // Second writer with the stale expected gate loses.
    assert!(!projects.advance_gate(&project.id, 1).await.unwrap());

    let fetched = projects.get(&project.id).await.unwrap().unwrap();
    assert_eq!(fetched.current_gate, 2);
}

#[tokio::test]
async fn approvals_seed_resolve_and_overdue() {
    let db = Database::memory().await.unwrap();
    let projects = db.projects();
    let approvals = db.approvals();

    let project = projects
        .create(project_input("Approvals", 40_000_000, 6), Category::Category3)
        .await
        .unwrap();

    let due = Utc::now() - Duration::days(1);
    let records = approvals
        .insert_many(&project.id, 1, &[Role::BuDirector], due)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, ApprovalStatus::Pending);
    assert_eq!(records[0].required_role, Role::BuDirector);

    // Pending and past due: shows up in the overdue sweep with the
    // project name joined in.
    let overdue = approvals.list_pending_due_before(Utc::now()).await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].project_name, "Approvals");

    // Resolve it; comment history is preserved verbatim.
    let now = Utc::now();
    let comments = vec![CommentEntry {
        author_id: "u-dir".to_string(),
        created_at: now,
        body: "Looks solid".to_string(),
    }];
    let resolved = approvals
        .update_resolution(
            &records[0].id,
            ApprovalStatus::Approved,
            Some("u-dir"),
            Some(now),
            &comments,
        )
        .await
        .unwrap();
    assert_eq!(resolved.status, ApprovalStatus::Approved);
    assert_eq!(resolved.approved_by.as_deref(), Some("u-dir"));
    assert_eq!(resolved.comments.len(), 1);
    assert_eq!(resolved.comments[0].body, "Looks solid");

    // Resolved records leave the overdue sweep.
    let overdue = approvals.list_pending_due_before(Utc::now()).await.unwrap();
    assert!(overdue.is_empty());
}

#[tokio::test]
async fn document_requirements_track_fulfillment() {
    let db = Database::memory().await.unwrap();
    let projects = db.projects();
    let documents = db.documents();

    let project = projects
        .create(project_input("Docs", 100_000, 1), Category::Category1a)
        .await
        .unwrap();

    // Gate 2 has two required documents seeded by migration.
    let required: Vec<DocumentRequirement> = documents
        .unfulfilled_required(&project.id, 2)
        .await
        .unwrap();
    assert_eq!(required.len(), 2);

    // A pending upload does not fulfill anything.
    let doc = documents
        .add_document(DocumentCreateInput {
            project_id: project.id.clone(),
            requirement_id: required[0].id.clone(),
            file_name: "checklist.pdf".to_string(),
            upload_status: None,
            uploaded_by: None,
        })
        .await
        .unwrap();
    assert_eq!(
        documents
            .unfulfilled_required(&project.id, 2)
            .await
            .unwrap()
            .len(),
        2
    );

    // A completed upload does.
    documents
        .set_upload_status(&doc.id, UploadStatus::Completed)
        .await
        .unwrap();
    assert_eq!(
        documents
            .unfulfilled_required(&project.id, 2)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn notifications_insert_and_unread_flow() {
    let db = Database::memory().await.unwrap();
    let users = db.users();
    let notifications = db.notifications();

    let user = users
        .create(UserCreateInput {
            email: "bm@example.com".to_string(),
            full_name: "Branch Manager".to_string(),
            role: Role::BranchManager,
            country: None,
            branch: None,
        })
        .await
        .unwrap();

    let inserted = notifications
        .insert_many(vec![NotificationCreateInput {
            user_id: user.id.clone(),
            project_id: None,
            kind: NotificationKind::ApprovalRequest,
            title: "t".to_string(),
            message: "m".to_string(),
            metadata: serde_json::json!({"gate": 1}),
        }])
        .await
        .unwrap();
    assert_eq!(inserted.len(), 1);

    assert_eq!(notifications.count_unread(&user.id).await.unwrap(), 1);

    notifications
        .mark_read(&inserted[0].id, Utc::now())
        .await
        .unwrap();
    assert_eq!(notifications.count_unread(&user.id).await.unwrap(), 0);

    let all = notifications.list_for_user(&user.id, false).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].read_at.is_some());
    assert_eq!(all[0].metadata["gate"], 1);
}

#[tokio::test]
async fn users_listed_by_roles() {
    let db = Database::memory().await.unwrap();
    let users = db.users();

    for (email, role) in [
        ("bm@example.com", Role::BranchManager),
        ("bu@example.com", Role::BuDirector),
        ("fm@example.com", Role::FinanceManager),
    ] {
        users
            .create(UserCreateInput {
                email: email.to_string(),
                full_name: email.to_string(),
                role,
                country: None,
                branch: None,
            })
            .await
            .unwrap();
    }

    let found = users
        .list_by_roles(&[Role::BranchManager, Role::BuDirector])
        .await
        .unwrap();
    assert_eq!(found.len(), 2);

    assert!(users.list_by_roles(&[]).await.unwrap().is_empty());
    assert!(users.list_by_roles(&[Role::Ceo]).await.unwrap().is_empty());
}

#[tokio::test]
async fn file_backed_database_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        database_path: dir.path().join("stagegate.db"),
        enable_wal: true,
        max_connections: 2,
        busy_timeout_seconds: 5,
    };

    let db = Database::connect(&config).await.unwrap();
    db.migrate().await.unwrap();

    let created = db
        .projects()
        .create(project_input("Persistent", 100_000, 1), Category::Category1a)
        .await
        .unwrap();
    drop(db);

    // A fresh connection to the same file sees the data; migrations are
    // idempotent on an up-to-date database.
    let reopened = Database::connect(&config).await.unwrap();
    reopened.migrate().await.unwrap();
    let fetched = reopened.projects().get(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Persistent");
}

#[tokio::test]
async fn snapshot_round_trip_skips_conflicts() {
    let db = Database::memory().await.unwrap();
    let projects = db.projects();

    projects
        .create(project_input("Exported", 100_000, 1), Category::Category1a)
        .await
        .unwrap();

    let snapshot = db.export_snapshot().await.unwrap();

    // Importing into the same database conflicts on the existing id.
    let result = db.import_snapshot(&snapshot).await.unwrap();
    assert_eq!(result.projects_imported, 0);
    assert_eq!(result.projects_skipped, 1);
    assert_eq!(result.conflicts.len(), 1);

    // A fresh database accepts everything.
    let fresh = Database::memory().await.unwrap();
    let result = fresh.import_snapshot(&snapshot).await.unwrap();
    assert_eq!(result.projects_imported, 1);
    assert_eq!(result.projects_skipped, 0);

    let imported = fresh.projects().list().await.unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].name, "Exported");
}
