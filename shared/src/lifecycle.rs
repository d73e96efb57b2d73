//! Document state rules
//!
//! Quotation status changes are planned here as a list of row updates; the
//! caller applies the whole plan in one transaction.

use serde::Serialize;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::{InvoiceStatus, QuotationStatus, WorkOrderStatus};
use crate::versioning::ChainNode;

/// A single row update produced by a status plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub id: Uuid,
    pub status: QuotationStatus,
    pub is_locked: bool,
}

/// Reject edits to locked quotations
pub fn ensure_editable(is_locked: bool) -> DomainResult<()> {
    if is_locked {
        return Err(DomainError::Locked("Quotation".to_string()));
    }
    Ok(())
}

/// Locked quotations are never deleted
pub fn ensure_deletable(is_locked: bool) -> DomainResult<()> {
    ensure_editable(is_locked)
}

/// Plan the row updates for moving `target_id` to `new_status`.
///
/// `chain` holds every quotation sharing the target's root, the target
/// included. Approval rejects and locks every other node in the chain and
/// approves and locks the target. An empty plan means nothing to write.
pub fn plan_status_change(
    target_id: Uuid,
    chain: &[ChainNode],
    new_status: QuotationStatus,
) -> DomainResult<Vec<StatusChange>> {
    let target = chain
        .iter()
        .find(|n| n.id == target_id)
        .ok_or(DomainError::BrokenChain(target_id))?;

    let invalid = || DomainError::InvalidTransition {
        from: target.status.to_string(),
        to: new_status.to_string(),
    };

    if target.status == QuotationStatus::Converted {
        return Err(invalid());
    }

    match new_status {
        QuotationStatus::Approved => {
            if target.status == QuotationStatus::Approved {
                return Err(DomainError::AlreadyApproved);
            }
            if chain.iter().any(|n| n.status == QuotationStatus::Converted) {
                return Err(invalid());
            }
            let mut plan: Vec<StatusChange> = chain
                .iter()
                .filter(|n| n.id != target_id)
                .map(|n| StatusChange {
                    id: n.id,
                    status: QuotationStatus::Rejected,
                    is_locked: true,
                })
                .collect();
            plan.push(StatusChange {
                id: target_id,
                status: QuotationStatus::Approved,
                is_locked: true,
            });
            Ok(plan)
        }
        QuotationStatus::Rejected => {
            if target.status == QuotationStatus::Rejected {
                return Ok(Vec::new());
            }
            Ok(vec![StatusChange {
                id: target_id,
                status: QuotationStatus::Rejected,
                is_locked: target.is_locked,
            }])
        }
        QuotationStatus::Pending => match target.status {
            QuotationStatus::Pending => Ok(Vec::new()),
            QuotationStatus::Rejected if !target.is_locked => Ok(vec![StatusChange {
                id: target_id,
                status: QuotationStatus::Pending,
                is_locked: false,
            }]),
            _ => Err(invalid()),
        },
        QuotationStatus::Converted => Err(invalid()),
    }
}

/// Outcome of a work-order conversion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionDecision {
    /// A work order already exists for the quotation
    Existing { work_order_id: Uuid, work_order_number: String },
    Create,
}

/// Decide whether a quotation may be converted into a work order.
///
/// An existing work order wins over every other check so repeated requests
/// keep returning it after the quotation moved to converted.
pub fn conversion_decision(
    existing: Option<(Uuid, String)>,
    status: QuotationStatus,
    item_count: usize,
) -> DomainResult<ConversionDecision> {
    if let Some((work_order_id, work_order_number)) = existing {
        return Ok(ConversionDecision::Existing {
            work_order_id,
            work_order_number,
        });
    }
    if status != QuotationStatus::Approved {
        return Err(DomainError::NotApproved(status.to_string()));
    }
    if item_count == 0 {
        return Err(DomainError::NoItems("Quotation".to_string()));
    }
    Ok(ConversionDecision::Create)
}

/// Validate an invoice status change; cancelled invoices are final
pub fn ensure_invoice_transition(from: InvoiceStatus, to: InvoiceStatus) -> DomainResult<()> {
    if from == InvoiceStatus::Cancelled && to != InvoiceStatus::Cancelled {
        return Err(DomainError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}

/// Validate a work order status change; completed and cancelled are final
pub fn ensure_work_order_transition(from: WorkOrderStatus, to: WorkOrderStatus) -> DomainResult<()> {
    if from.is_terminal() && from != to {
        return Err(DomainError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(parent: Option<Uuid>, status: QuotationStatus, locked: bool) -> ChainNode {
        ChainNode {
            id: Uuid::new_v4(),
            parent_id: parent,
            version: 1,
            status,
            is_locked: locked,
        }
    }

    #[test]
    fn test_locked_quotation_not_editable() {
        assert!(ensure_editable(false).is_ok());
        assert_eq!(ensure_editable(true), Err(DomainError::Locked("Quotation".to_string())));
        assert!(ensure_deletable(true).is_err());
    }

    #[test]
    fn test_approval_rejects_siblings_and_root() {
        let a = node(None, QuotationStatus::Pending, false);
        let b = node(Some(a.id), QuotationStatus::Pending, false);
        let c = node(Some(a.id), QuotationStatus::Pending, false);
        let chain = vec![a.clone(), b.clone(), c.clone()];

        let plan = plan_status_change(b.id, &chain, QuotationStatus::Approved).unwrap();
        assert_eq!(plan.len(), 3);
        assert!(plan.contains(&StatusChange { id: a.id, status: QuotationStatus::Rejected, is_locked: true }));
        assert!(plan.contains(&StatusChange { id: c.id, status: QuotationStatus::Rejected, is_locked: true }));
        assert!(plan.contains(&StatusChange { id: b.id, status: QuotationStatus::Approved, is_locked: true }));
    }

    #[test]
    fn test_reapproval_is_rejected() {
        let a = node(None, QuotationStatus::Approved, true);
        let chain = vec![a.clone()];
        assert_eq!(
            plan_status_change(a.id, &chain, QuotationStatus::Approved),
            Err(DomainError::AlreadyApproved)
        );
    }

    #[test]
    fn test_approval_blocked_once_chain_converted() {
        let a = node(None, QuotationStatus::Converted, true);
        let b = node(Some(a.id), QuotationStatus::Rejected, true);
        let chain = vec![a, b.clone()];
        assert!(plan_status_change(b.id, &chain, QuotationStatus::Approved).is_err());
    }

    #[test]
    fn test_reject_keeps_lock_flag() {
        let a = node(None, QuotationStatus::Approved, true);
        let plan = plan_status_change(a.id, &[a.clone()], QuotationStatus::Rejected).unwrap();
        assert_eq!(plan, vec![StatusChange { id: a.id, status: QuotationStatus::Rejected, is_locked: true }]);

        let p = node(None, QuotationStatus::Pending, false);
        let plan = plan_status_change(p.id, &[p.clone()], QuotationStatus::Rejected).unwrap();
        assert!(!plan[0].is_locked);
    }

    #[test]
    fn test_reopen_only_unlocked_rejections() {
        let open = node(None, QuotationStatus::Rejected, false);
        assert_eq!(plan_status_change(open.id, &[open.clone()], QuotationStatus::Pending).unwrap().len(), 1);

        let locked = node(None, QuotationStatus::Rejected, true);
        assert!(plan_status_change(locked.id, &[locked.clone()], QuotationStatus::Pending).is_err());

        let approved = node(None, QuotationStatus::Approved, true);
        assert!(plan_status_change(approved.id, &[approved.clone()], QuotationStatus::Pending).is_err());
    }

    #[test]
    fn test_converted_is_never_a_direct_target() {
        let a = node(None, QuotationStatus::Approved, true);
        assert!(plan_status_change(a.id, &[a.clone()], QuotationStatus::Converted).is_err());
    }

    #[test]
    fn test_same_status_is_noop() {
        let p = node(None, QuotationStatus::Pending, false);
        assert!(plan_status_change(p.id, &[p.clone()], QuotationStatus::Pending).unwrap().is_empty());
    }

    #[test]
    fn test_target_missing_from_chain() {
        let a = node(None, QuotationStatus::Pending, false);
        let stray = Uuid::new_v4();
        assert_eq!(
            plan_status_change(stray, &[a], QuotationStatus::Approved),
            Err(DomainError::BrokenChain(stray))
        );
    }

    #[test]
    fn test_conversion_decision() {
        let id = Uuid::new_v4();
        let existing = Some((id, "WO/2024/0001".to_string()));
        assert_eq!(
            conversion_decision(existing, QuotationStatus::Converted, 0).unwrap(),
            ConversionDecision::Existing { work_order_id: id, work_order_number: "WO/2024/0001".to_string() }
        );
        assert_eq!(conversion_decision(None, QuotationStatus::Approved, 2).unwrap(), ConversionDecision::Create);
        assert!(matches!(
            conversion_decision(None, QuotationStatus::Pending, 2),
            Err(DomainError::NotApproved(_))
        ));
        assert!(matches!(
            conversion_decision(None, QuotationStatus::Approved, 0),
            Err(DomainError::NoItems(_))
        ));
    }

    #[test]
    fn test_invoice_transitions() {
        assert!(ensure_invoice_transition(InvoiceStatus::Issued, InvoiceStatus::Paid).is_ok());
        assert!(ensure_invoice_transition(InvoiceStatus::Paid, InvoiceStatus::Issued).is_ok());
        assert!(ensure_invoice_transition(InvoiceStatus::Cancelled, InvoiceStatus::Issued).is_err());
        assert!(ensure_invoice_transition(InvoiceStatus::Cancelled, InvoiceStatus::Cancelled).is_ok());
    }

    #[test]
    fn test_work_order_transitions() {
        assert!(ensure_work_order_transition(WorkOrderStatus::Issued, WorkOrderStatus::InProgress).is_ok());
        assert!(ensure_work_order_transition(WorkOrderStatus::Completed, WorkOrderStatus::Issued).is_err());
        assert!(ensure_work_order_transition(WorkOrderStatus::Cancelled, WorkOrderStatus::Completed).is_err());
    }
}
