mod common;

use boq_billing::db;
use boq_billing::models::{InvoiceStatus, RawCell, RawRow, RowType, StagingEdit, Trade};
use boq_billing::service::{ApprovalService, StagingService};
use boq_billing::BillingError;
use common::{date, row, seed_project, setup_pool, stage_request};

#[tokio::test]
async fn restaging_a_trade_replaces_only_that_trade() {
    let (pool, _dir) = setup_pool().await;
    let (project, _, _) = seed_project(&pool).await;
    let staging = StagingService::new(pool.clone());

    let civil = staging
        .stage_invoice(stage_request(
            project.id,
            1,
            date(2024, 1, 1),
            date(2024, 1, 31),
            Some("civil"),
            vec![row("9-2", "Doors", "1", None), row("A-1", "Paint", "2", None)],
        ))
        .await
        .unwrap();
    assert_eq!(civil.trade, Trade::Civil);

    let elec = staging
        .stage_invoice(stage_request(
            project.id,
            1,
            date(2024, 1, 1),
            date(2024, 1, 31),
            Some("كهرباء"),
            vec![row("A-1", "Cable trays", "5", None)],
        ))
        .await
        .unwrap();
    assert_eq!(elec.invoice_id, civil.invoice_id);
    assert_eq!(elec.trade, Trade::Elec);

    // 同一专业重新导入: 旧行被替换
    let again = staging
        .stage_invoice(stage_request(
            project.id,
            1,
            date(2024, 1, 1),
            date(2024, 1, 31),
            Some("CIVIL"),
            vec![row("9-2", "Doors", "3", None)],
        ))
        .await
        .unwrap();
    assert_eq!(again.rows_staged, 1);

    let rows = staging.list_staging_rows(civil.invoice_id).await.unwrap();
    assert_eq!(rows.len(), 2);
    let civil_rows: Vec<_> = rows.iter().filter(|r| r.trade == Trade::Civil).collect();
    let elec_rows: Vec<_> = rows.iter().filter(|r| r.trade == Trade::Elec).collect();
    assert_eq!(civil_rows.len(), 1);
    assert_eq!(civil_rows[0].raw_qty.as_deref(), Some("3"));
    assert_eq!(elec_rows.len(), 1);
    assert_eq!(elec_rows[0].raw_item_code.as_deref(), Some("A-1"));
}

#[tokio::test]
async fn staging_keeps_raw_text_and_drops_blank_codes() {
    let (pool, _dir) = setup_pool().await;
    let (project, _, _) = seed_project(&pool).await;
    let staging = StagingService::new(pool.clone());

    let rows = vec![
        RawRow {
            item_code: Some(RawCell::from("9-2")),
            description: Some(RawCell::from("Doors (frames)")),
            qty: Some(RawCell::Number(1200.0)),
            percentage: Some(RawCell::from("50%")),
        },
        RawRow {
            item_code: None,
            description: Some(RawCell::from("Chapter 2")),
            ..Default::default()
        },
        row("A-1", "Paint", "1,250", None),
    ];

    let staged = staging
        .stage_invoice(stage_request(project.id, 4, date(2024, 6, 1), date(2024, 6, 30), None, rows))
        .await
        .unwrap();
    assert_eq!(staged.rows_staged, 2);
    assert_eq!(staged.trade, Trade::General);

    let stored = staging.list_staging_rows(staged.invoice_id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].row_index, 0);
    assert_eq!(stored[0].raw_qty.as_deref(), Some("1200"));
    assert_eq!(stored[0].raw_percentage.as_deref(), Some("50%"));
    assert_eq!(stored[1].row_index, 2);
    assert_eq!(stored[1].raw_qty.as_deref(), Some("1,250"));
    assert!(stored.iter().all(|r| r.include_in_invoice && !r.is_valid));
    assert!(stored.iter().all(|r| r.row_type == RowType::Item));

    let invoice = db::get_invoice(&pool, staged.invoice_id).await.unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Draft);
    assert_eq!(invoice.invoice_number, 4);
}

#[tokio::test]
async fn restaging_updates_the_invoice_period() {
    let (pool, _dir) = setup_pool().await;
    let (project, _, _) = seed_project(&pool).await;
    let staging = StagingService::new(pool.clone());

    let first = staging
        .stage_invoice(stage_request(
            project.id,
            1,
            date(2024, 1, 1),
            date(2024, 1, 31),
            None,
            vec![row("9-2", "Doors", "1", None)],
        ))
        .await
        .unwrap();
    staging
        .stage_invoice(stage_request(
            project.id,
            1,
            date(2024, 1, 5),
            date(2024, 1, 20),
            None,
            vec![row("9-2", "Doors", "1", None)],
        ))
        .await
        .unwrap();

    let invoice = db::get_invoice(&pool, first.invoice_id).await.unwrap().unwrap();
    assert_eq!(invoice.period_start, date(2024, 1, 5));
    assert_eq!(invoice.period_end, date(2024, 1, 20));
}

#[tokio::test]
async fn staging_rejects_bad_input() {
    let (pool, _dir) = setup_pool().await;
    let (project, _, _) = seed_project(&pool).await;
    let staging = StagingService::new(pool.clone());

    let err = staging
        .stage_invoice(stage_request(
            project.id,
            1,
            date(2024, 1, 1),
            date(2024, 1, 2),
            Some("plumbing"),
            vec![row("9-2", "Doors", "1", None)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::Validation(_)));
    assert!(err.to_string().contains("plumbing"));

    let err = staging
        .stage_invoice(stage_request(
            project.id,
            1,
            date(2024, 1, 10),
            date(2024, 1, 2),
            None,
            vec![row("9-2", "Doors", "1", None)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::Validation(_)));

    let err = staging
        .stage_invoice(stage_request(
            project.id + 100,
            1,
            date(2024, 1, 1),
            date(2024, 1, 2),
            None,
            vec![row("9-2", "Doors", "1", None)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::NotFound(_)));

    let err = staging.list_staging_rows(12345).await.unwrap_err();
    assert!(matches!(err, BillingError::NotFound(_)));
}

#[tokio::test]
async fn approved_invoices_cannot_be_restaged_or_edited() {
    let (pool, _dir) = setup_pool().await;
    let (project, _, _) = seed_project(&pool).await;
    let staging = StagingService::new(pool.clone());
    let approval = ApprovalService::new(pool.clone());

    let staged = staging
        .stage_invoice(stage_request(
            project.id,
            1,
            date(2024, 1, 1),
            date(2024, 1, 2),
            None,
            vec![row("9-2", "Doors", "2", None)],
        ))
        .await
        .unwrap();
    approval.approve_invoice(staged.invoice_id).await.unwrap();

    let err = staging
        .stage_invoice(stage_request(
            project.id,
            1,
            date(2024, 1, 1),
            date(2024, 1, 2),
            None,
            vec![row("9-2", "Doors", "9", None)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::Conflict(_)));

    let err = staging
        .stage(staged.invoice_id, Some("mech"), &[row("9-2", "Doors", "9", None)])
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::Conflict(_)));

    let rows = staging.list_staging_rows(staged.invoice_id).await.unwrap();
    let updated = staging
        .update_staging_rows(
            staged.invoice_id,
            &[StagingEdit {
                id: rows[0].id,
                raw_qty: Some("99".to_string()),
                ..Default::default()
            }],
        )
        .await
        .unwrap();
    assert_eq!(updated, 0);

    let rows = staging.list_staging_rows(staged.invoice_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].raw_qty.as_deref(), Some("2"));
}

#[tokio::test]
async fn batch_edit_skips_unknown_rows() {
    let (pool, _dir) = setup_pool().await;
    let (project, _, _) = seed_project(&pool).await;
    let staging = StagingService::new(pool.clone());

    let staged = staging
        .stage_invoice(stage_request(
            project.id,
            1,
            date(2024, 1, 1),
            date(2024, 1, 2),
            None,
            vec![row("9-2", "Doors", "2", None), row("A-1", "Paint", "4", None)],
        ))
        .await
        .unwrap();
    let rows = staging.list_staging_rows(staged.invoice_id).await.unwrap();

    let updated = staging
        .update_staging_rows(
            staged.invoice_id,
            &[
                StagingEdit {
                    id: rows[0].id,
                    raw_qty: Some("7".to_string()),
                    raw_percentage: Some("40".to_string()),
                    ..Default::default()
                },
                StagingEdit {
                    id: 9999,
                    raw_qty: Some("1".to_string()),
                    ..Default::default()
                },
                StagingEdit {
                    id: rows[1].id,
                    raw_item_code: Some(String::new()),
                    raw_description: Some("Grand total".to_string()),
                    ..Default::default()
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let rows = staging.list_staging_rows(staged.invoice_id).await.unwrap();
    assert_eq!(rows[0].raw_qty.as_deref(), Some("7"));
    assert_eq!(rows[0].raw_percentage.as_deref(), Some("40"));
    assert_eq!(rows[0].raw_item_code.as_deref(), Some("9-2"));
    assert_eq!(rows[1].raw_description.as_deref(), Some("Grand total"));
    assert_eq!(rows[1].row_type, RowType::Total);
}

#[tokio::test]
async fn batch_edit_only_touches_rows_of_the_given_invoice() {
    let (pool, _dir) = setup_pool().await;
    let (project, _, _) = seed_project(&pool).await;
    let staging = StagingService::new(pool.clone());

    let first = staging
        .stage_invoice(stage_request(
            project.id,
            1,
            date(2024, 1, 1),
            date(2024, 1, 2),
            None,
            vec![row("9-2", "Doors", "2", None)],
        ))
        .await
        .unwrap();
    let second = staging
        .stage_invoice(stage_request(
            project.id,
            2,
            date(2024, 2, 1),
            date(2024, 2, 2),
            None,
            vec![row("A-1", "Paint", "4", None)],
        ))
        .await
        .unwrap();
    let other_row = staging.list_staging_rows(second.invoice_id).await.unwrap()[0].id;

    let edit = StagingEdit {
        id: other_row,
        raw_qty: Some("99".to_string()),
        ..Default::default()
    };
    let updated = staging
        .update_staging_rows(first.invoice_id, &[edit])
        .await
        .unwrap();
    assert_eq!(updated, 0);

    let rows = staging.list_staging_rows(second.invoice_id).await.unwrap();
    assert_eq!(rows[0].raw_qty.as_deref(), Some("4"));
}
