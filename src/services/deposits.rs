//! Dirty-money deposits reviewed by privileged users.

use crate::db::{collections, FieldFilter, Store, Stored};
use crate::error::{AppError, Result};
use crate::models::{non_blank, CashDeposit, DepositStatus, Session};
use crate::services::guard::{require_privileged, Capabilities};
use chrono::Utc;
use std::collections::BTreeMap;

fn too_large() -> AppError {
    AppError::Validation("deposit total too large".to_string())
}

#[derive(Clone)]
pub struct DepositService {
    store: Store,
}

impl DepositService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create_deposit(
        &self,
        session: &Session,
        detalles: BTreeMap<String, u64>,
    ) -> Result<Stored<CashDeposit>> {
        if detalles.is_empty() {
            return Err(AppError::Validation(
                "a deposit needs at least one category".to_string(),
            ));
        }

        let mut clean: BTreeMap<String, u64> = BTreeMap::new();
        let mut total: u64 = 0;
        for (categoria, cantidad) in detalles {
            let categoria = non_blank(&categoria, "category")?;
            if cantidad == 0 {
                return Err(AppError::Validation(format!(
                    "amount for '{}' must be greater than zero",
                    categoria
                )));
            }
            total = total.checked_add(cantidad).ok_or_else(too_large)?;
            // Categories differing only in surrounding whitespace merge
            let slot = clean.entry(categoria).or_insert(0);
            *slot = slot.checked_add(cantidad).ok_or_else(too_large)?;
        }

        let deposit = CashDeposit {
            depositante_id: session.id.clone(),
            depositante_nombre: session.display_name(),
            detalles: clean,
            total,
            estado: DepositStatus::Pendiente,
            fecha_deposito: Utc::now(),
            revisado_por_id: None,
            revisado_por_nombre: None,
            fecha_resolucion: None,
        };

        let stored = self.store.insert(collections::DEPOSITS, &deposit).await?;
        tracing::info!(deposit_id = %stored.id, user_id = %session.id, total, "Deposit recorded");
        Ok(stored)
    }

    pub async fn approve_deposit(&self, session: &Session, id: &str) -> Result<Stored<CashDeposit>> {
        self.resolve(session, id, DepositStatus::Aprobado).await
    }

    pub async fn reject_deposit(&self, session: &Session, id: &str) -> Result<Stored<CashDeposit>> {
        self.resolve(session, id, DepositStatus::Rechazado).await
    }

    async fn resolve(
        &self,
        session: &Session,
        id: &str,
        outcome: DepositStatus,
    ) -> Result<Stored<CashDeposit>> {
        require_privileged(session, "review deposits")?;

        let updated = self
            .store
            .update(collections::DEPOSITS, id, "Deposit", |d: &mut CashDeposit| {
                if d.estado.is_terminal() {
                    return Err(AppError::InvalidState(format!(
                        "deposit {} is already {}",
                        id, d.estado
                    )));
                }
                d.estado = outcome;
                d.revisado_por_id = Some(session.id.clone());
                d.revisado_por_nombre = Some(session.display_name());
                d.fecha_resolucion = Some(Utc::now());
                Ok(())
            })
            .await?;

        tracing::info!(deposit_id = id, reviewed_by = %session.id, estado = %outcome, "Deposit reviewed");
        Ok(updated)
    }

    pub async fn list_deposits(&self, session: &Session) -> Result<Vec<Stored<CashDeposit>>> {
        let mut deposits: Vec<Stored<CashDeposit>> = if Capabilities::of(session).is_privileged {
            self.store.list(collections::DEPOSITS).await?
        } else {
            self.store
                .find_eq(
                    collections::DEPOSITS,
                    &[FieldFilter::eq("depositanteId", session.id.as_str())],
                )
                .await?
        };
        deposits.sort_by(|a, b| b.doc.fecha_deposito.cmp(&a.doc.fecha_deposito));
        Ok(deposits)
    }
}
