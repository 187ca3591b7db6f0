// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workflow tests against the in-memory store.
//!
//! These tests verify that:
//! 1. Terminal requests refuse further resolution and stay unchanged
//! 2. Self-issuance and requests on lost weapons are refused
//! 3. Only fully confirmed tickets move goals, and goals never drift
//! 4. Deliveries, vests and deposits follow their state machines

use clan_ops::db::collections;
use clan_ops::error::AppError;
use clan_ops::models::{
    DeliveryStatus, Goal, GoalPeriod, LossReason, ProductDelivery, ProductLine, RequestStatus,
    TicketStatus, WeaponRequest, WeaponType,
};
use clan_ops::services::goals::period_key;
use clan_ops::time_utils::civil_date;
use chrono::Utc;
use std::collections::BTreeMap;

mod common;

#[tokio::test]
async fn test_terminal_request_cannot_be_resolved_again() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;

    let weapon = state
        .weapons
        .issue_weapon(&cast.encargado, &cast.empleado.id, WeaponType::Pistola)
        .await
        .unwrap();
    let request = state
        .weapons
        .request_ammo(&cast.empleado, &weapon.id, 50)
        .await
        .unwrap();
    assert_eq!(request.id, format!("{}_0", weapon.id));

    let delivered = state
        .weapons
        .deliver_request(&cast.jefe, &request.id)
        .await
        .unwrap();
    assert_eq!(delivered.doc.estado, RequestStatus::Entregada);

    for attempt in [
        state.weapons.deliver_request(&cast.encargado, &request.id).await,
        state
            .weapons
            .reject_request(&cast.encargado, &request.id, Some("late".to_string()))
            .await,
    ] {
        assert!(matches!(attempt, Err(AppError::InvalidState(_))));
    }

    let after: WeaponRequest = state
        .store
        .require(collections::WEAPON_REQUESTS, &request.id, "Request")
        .await
        .map(|s| s.doc)
        .unwrap();
    assert_eq!(after.estado, RequestStatus::Entregada);
    assert_eq!(after.resuelto_por_id.as_deref(), Some(cast.jefe.id.as_str()));
    assert!(after.motivo_rechazo.is_none());
}

#[tokio::test]
async fn test_self_issuance_is_refused() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;

    let err = state
        .weapons
        .issue_weapon(&cast.encargado, &cast.encargado.id, WeaponType::Smg)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = state
        .deliveries
        .create_delivery(
            &cast.encargado,
            &cast.encargado.id,
            vec![ProductLine {
                nombre: "meta".to_string(),
                cantidad: 1,
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_requester_cannot_issue_weapons() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;

    let err = state
        .weapons
        .issue_weapon(&cast.empleado, &cast.empleado2.id, WeaponType::Pistola)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_lost_weapon_refuses_requests_from_anyone() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;

    let weapon = state
        .weapons
        .issue_weapon(&cast.encargado, &cast.empleado.id, WeaponType::RifleAsalto)
        .await
        .unwrap();

    // Only the issuing sargento may mark it lost
    assert!(matches!(
        state
            .weapons
            .mark_lost(&cast.jefe, &weapon.id, LossReason::Robo)
            .await,
        Err(AppError::Forbidden(_))
    ));
    state
        .weapons
        .mark_lost(&cast.encargado, &weapon.id, LossReason::Arresto)
        .await
        .unwrap();
    assert!(matches!(
        state
            .weapons
            .mark_lost(&cast.encargado, &weapon.id, LossReason::Arresto)
            .await,
        Err(AppError::InvalidState(_))
    ));

    for session in [&cast.empleado, &cast.empleado2, &cast.jefe] {
        let err = state
            .weapons
            .request_ammo(session, &weapon.id, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)), "{:?}", err);
    }
    assert!(matches!(
        state.weapons.request_vest(&cast.empleado, &weapon.id, 1).await,
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_request_indices_are_sequential() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;

    let weapon = state
        .weapons
        .issue_weapon(&cast.encargado, &cast.empleado.id, WeaponType::Escopeta)
        .await
        .unwrap();

    let (a, b, c) = tokio::join!(
        state.weapons.request_ammo(&cast.empleado, &weapon.id, 10),
        state.weapons.request_vest(&cast.empleado, &weapon.id, 1),
        state.weapons.request_ammo(&cast.empleado, &weapon.id, 20),
    );
    let mut indices = vec![a.unwrap().doc.indice, b.unwrap().doc.indice, c.unwrap().doc.indice];
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2]);

    let listed = state
        .weapons
        .list_requests(&cast.empleado, &weapon.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 3);
    assert!(matches!(
        state.weapons.list_requests(&cast.empleado2, &weapon.id).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_zero_quantity_request_is_refused() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;
    let weapon = state
        .weapons
        .issue_weapon(&cast.encargado, &cast.empleado.id, WeaponType::MicroSmg)
        .await
        .unwrap();

    assert!(matches!(
        state.weapons.request_ammo(&cast.empleado, &weapon.id, 0).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        state.vests.request_vests(&cast.empleado, 0).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_ticket_rejected_after_amount_confirmation_leaves_goals_unchanged() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;
    let today = civil_date(Utc::now(), state.config.civil_tz());

    let before = state
        .goals
        .goal_for(&cast.empleado2, &cast.empleado2.id, GoalPeriod::Diaria, today)
        .await
        .unwrap();

    let ticket = state
        .tickets
        .create_ticket(&cast.encargado, &cast.empleado2.id, 5000)
        .await
        .unwrap();
    assert_eq!(ticket.doc.estado, TicketStatus::Pendiente);

    state
        .tickets
        .confirm_amount(&cast.empleado2, &ticket.id)
        .await
        .unwrap();
    let rejected = state
        .tickets
        .reject_ticket(&cast.encargado, &ticket.id, Some("short".to_string()))
        .await
        .unwrap();
    assert_eq!(rejected.doc.estado, TicketStatus::Rechazado);

    for period in [GoalPeriod::Diaria, GoalPeriod::Semanal] {
        let goal = state
            .goals
            .goal_for(&cast.empleado2, &cast.empleado2.id, period, today)
            .await
            .unwrap();
        assert_eq!(goal.dinero_recibido, 0);
        assert!(goal.tickets.is_empty());
    }
    assert_eq!(before.dinero_recibido, 0);
    assert!(matches!(
        state.tickets.confirm_receipt(&cast.encargado, &ticket.id).await,
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_confirmed_ticket_counts_once() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;
    let today = civil_date(Utc::now(), state.config.civil_tz());

    // Seller-created tickets skip the amount confirmation
    let ticket = state
        .tickets
        .create_ticket(&cast.empleado2, &cast.encargado.id, 1200)
        .await
        .unwrap();
    assert_eq!(ticket.doc.estado, TicketStatus::PendienteDealer);
    assert!(ticket.doc.fecha_confirmacion_vendedor.is_some());

    // Only the dealer can confirm receipt
    assert!(matches!(
        state.tickets.confirm_receipt(&cast.empleado2, &ticket.id).await,
        Err(AppError::Forbidden(_))
    ));
    let confirmed = state
        .tickets
        .confirm_receipt(&cast.encargado, &ticket.id)
        .await
        .unwrap();
    assert_eq!(confirmed.doc.estado, TicketStatus::Confirmado);

    // Re-recording and rebuilding never add it twice
    assert!(!state.goals.record_confirmed_ticket(&confirmed).await.unwrap());
    assert_eq!(state.goals.rebuild_ledger(&cast.jefe).await.unwrap(), 0);

    for period in [GoalPeriod::Diaria, GoalPeriod::Semanal] {
        let stored: Goal = state
            .store
            .require(
                collections::GOALS,
                &Goal::key(&cast.empleado2.id, period, period_key(period, today)),
                "Goal",
            )
            .await
            .unwrap()
            .doc;
        assert_eq!(stored.dinero_recibido, 1200);
        assert_eq!(stored.tickets, vec![confirmed.doc.ticket_id]);
    }
}

#[tokio::test]
async fn test_ticket_numbers_are_sequential() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;

    let first = state
        .tickets
        .create_ticket(&cast.encargado, &cast.empleado.id, 100)
        .await
        .unwrap();
    let second = state
        .tickets
        .create_ticket(&cast.encargado, &cast.empleado2.id, 200)
        .await
        .unwrap();
    assert_eq!(first.doc.ticket_id, 1);
    assert_eq!(second.doc.ticket_id, 2);
    assert_eq!(second.id, "ticket-000002");

    // Each seller sees only their own tickets
    let mine = state.tickets.list_tickets(&cast.empleado).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, first.id);
    assert_eq!(state.tickets.list_tickets(&cast.jefe).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_seller_tickets_must_target_a_dealer() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;

    assert!(matches!(
        state
            .tickets
            .create_ticket(&cast.empleado, &cast.empleado2.id, 100)
            .await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        state.tickets.create_ticket(&cast.encargado, "ghost", 100).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_goal_target_survives_refresh() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;
    let today = civil_date(Utc::now(), state.config.civil_tz());

    assert!(matches!(
        state
            .goals
            .set_target(&cast.empleado, &cast.empleado2.id, GoalPeriod::Semanal, today, 10_000)
            .await,
        Err(AppError::Forbidden(_))
    ));
    state
        .goals
        .set_target(&cast.jefe, &cast.empleado2.id, GoalPeriod::Semanal, today, 10_000)
        .await
        .unwrap();

    let ticket = state
        .tickets
        .create_ticket(&cast.empleado2, &cast.jefe.id, 2500)
        .await
        .unwrap();
    state
        .tickets
        .confirm_receipt(&cast.jefe, &ticket.id)
        .await
        .unwrap();

    let goal = state
        .goals
        .goal_for(&cast.empleado2, &cast.empleado2.id, GoalPeriod::Semanal, today)
        .await
        .unwrap();
    assert_eq!(goal.objetivo, Some(10_000));
    assert_eq!(goal.dinero_recibido, 2500);
    assert_eq!(goal.progress(), Some(0.25));

    // Other sellers may not look at it
    assert!(matches!(
        state
            .goals
            .goal_for(&cast.empleado, &cast.empleado2.id, GoalPeriod::Semanal, today)
            .await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_delivery_lifecycle() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;
    let products = vec![
        ProductLine {
            nombre: "meta".to_string(),
            cantidad: 10,
        },
        ProductLine {
            nombre: "weed".to_string(),
            cantidad: 5,
        },
    ];

    let delivery = state
        .deliveries
        .create_delivery(&cast.encargado, &cast.empleado2.id, products.clone())
        .await
        .unwrap();
    assert_eq!(delivery.doc.total_units(), 15);

    // Only the seller confirms; only the creator deletes
    assert!(matches!(
        state.deliveries.confirm_delivery(&cast.jefe, &delivery.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        state.deliveries.delete_delivery(&cast.jefe, &delivery.id).await,
        Err(AppError::Forbidden(_))
    ));

    state
        .deliveries
        .confirm_delivery(&cast.empleado2, &delivery.id)
        .await
        .unwrap();
    assert!(matches!(
        state.deliveries.reject_delivery(&cast.empleado2, &delivery.id).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(matches!(
        state.deliveries.delete_delivery(&cast.encargado, &delivery.id).await,
        Err(AppError::InvalidState(_))
    ));

    let pending = state
        .deliveries
        .create_delivery(&cast.encargado, &cast.empleado2.id, products)
        .await
        .unwrap();
    state
        .deliveries
        .delete_delivery(&cast.encargado, &pending.id)
        .await
        .unwrap();
    assert_eq!(
        state
            .deliveries
            .list_deliveries(&cast.empleado2)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_delete_loses_to_confirmation_after_read() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;

    let pending = state
        .deliveries
        .create_delivery(
            &cast.encargado,
            &cast.empleado2.id,
            vec![ProductLine {
                nombre: "meta".to_string(),
                cantidad: 4,
            }],
        )
        .await
        .unwrap();

    // The withdrawal read the delivery while it was still pending
    let read = state
        .store
        .require::<ProductDelivery>(collections::DELIVERIES, &pending.id, "Delivery")
        .await
        .unwrap();
    state
        .deliveries
        .confirm_delivery(&cast.empleado2, &pending.id)
        .await
        .unwrap();

    let err = state
        .store
        .delete_unchanged(collections::DELIVERIES, &read)
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let kept = state
        .store
        .require::<ProductDelivery>(collections::DELIVERIES, &pending.id, "Delivery")
        .await
        .unwrap();
    assert_eq!(kept.doc.estado, DeliveryStatus::Confirmado);
}

#[tokio::test]
async fn test_vest_and_deposit_review() {
    let (_, state) = common::create_test_app();
    let cast = common::seed_cast(&state).await;

    let vests = state.vests.request_vests(&cast.empleado, 3).await.unwrap();
    assert!(matches!(
        state.vests.approve(&cast.empleado2, &vests.id).await,
        Err(AppError::Forbidden(_))
    ));
    state.vests.approve(&cast.encargado, &vests.id).await.unwrap();
    assert!(matches!(
        state.vests.reject(&cast.jefe, &vests.id).await,
        Err(AppError::InvalidState(_))
    ));

    let mut detalles = BTreeMap::new();
    detalles.insert("casino".to_string(), 15_000);
    detalles.insert("robos".to_string(), 5_000);
    let deposit = state
        .deposits
        .create_deposit(&cast.empleado, detalles)
        .await
        .unwrap();
    assert_eq!(deposit.doc.total, 20_000);

    state
        .deposits
        .reject_deposit(&cast.jefe, &deposit.id)
        .await
        .unwrap();
    assert!(matches!(
        state.deposits.approve_deposit(&cast.jefe, &deposit.id).await,
        Err(AppError::InvalidState(_))
    ));

    let mut zero = BTreeMap::new();
    zero.insert("casino".to_string(), 0);
    assert!(matches!(
        state.deposits.create_deposit(&cast.empleado, zero).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        state
            .deposits
            .create_deposit(&cast.empleado, BTreeMap::new())
            .await,
        Err(AppError::Validation(_))
    ));
}
