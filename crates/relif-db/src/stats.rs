//! Per-organization counters computed from the organization's rows.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use relif_core::models::{
    beneficiary::{BeneficiaryStats, BeneficiaryStatus},
    case::{CaseStats, CaseStatus},
    housing::HousingStats,
    inventory::InventoryStats,
    organization::RecordStatus,
    volunteer::{VolunteerStats, VolunteerStatus},
};
use serde_json::Value;
use uuid::Uuid;

use crate::backend::Backend;
use crate::client::SupabaseClient;
use crate::error::DbError;
use crate::transform::Row;

/// Fetches `columns` of every row of `table` owned by `organization_id`.
pub(crate) async fn organization_rows<B: Backend>(
    client: &SupabaseClient<B>,
    table: &str,
    columns: &str,
    organization_id: Uuid,
) -> Result<Vec<Value>, DbError> {
    let output = client
        .from(table)
        .select(columns)
        .eq("organization_id", organization_id)
        .execute()
        .await?;
    Ok(output.rows)
}

pub fn beneficiary_stats(rows: &[Value]) -> BeneficiaryStats {
    let mut stats = BeneficiaryStats {
        total_beneficiaries: rows.len() as u64,
        ..BeneficiaryStats::default()
    };
    for row in rows {
        match Row::new(row).parse("status", BeneficiaryStatus::parse) {
            BeneficiaryStatus::Active => stats.active_beneficiaries += 1,
            BeneficiaryStatus::Pending => stats.pending_beneficiaries += 1,
            BeneficiaryStatus::Inactive => stats.inactive_beneficiaries += 1,
        }
    }
    stats
}

pub fn volunteer_stats(rows: &[Value]) -> VolunteerStats {
    let mut stats = VolunteerStats {
        total_volunteers: rows.len() as u64,
        ..VolunteerStats::default()
    };
    for row in rows {
        match Row::new(row).parse("status", VolunteerStatus::parse) {
            VolunteerStatus::Active => stats.active_volunteers += 1,
            VolunteerStatus::Pending => stats.pending_volunteers += 1,
            VolunteerStatus::Inactive => stats.inactive_volunteers += 1,
        }
    }
    stats
}

/// An active housing with a free bed is available, a full active one is
/// occupied and anything else counts as maintenance.
pub fn housing_stats(rows: &[Value]) -> HousingStats {
    let mut stats = HousingStats {
        total_housing: rows.len() as u64,
        ..HousingStats::default()
    };
    for row in rows {
        let r = Row::new(row);
        let capacity = r.u64("total_vacancies");
        let occupied = r.u64("occupied_vacancies");
        stats.total_capacity += capacity;
        stats.total_occupied += occupied;
        match r.parse("status", RecordStatus::parse) {
            RecordStatus::Active if occupied < capacity => stats.available_housing += 1,
            RecordStatus::Active => stats.occupied_housing += 1,
            _ => stats.maintenance_housing += 1,
        }
    }
    stats
}

pub fn inventory_stats(rows: &[Value]) -> InventoryStats {
    let mut stats = InventoryStats {
        total_products: rows.len() as u64,
        ..InventoryStats::default()
    };
    for row in rows {
        let quantity = Row::new(row).u64("total_in_storage");
        stats.total_quantity += quantity;
        match quantity {
            0 => stats.out_of_stock_products += 1,
            1..=10 => stats.low_stock_products += 1,
            _ => stats.in_stock_products += 1,
        }
    }
    stats
}

/// `now` anchors the overdue check and the current month.
pub fn case_stats(rows: &[Value], now: DateTime<Utc>) -> CaseStats {
    let month_start = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    let mut stats = CaseStats {
        total_cases: rows.len() as u64,
        ..CaseStats::default()
    };
    for row in rows {
        let r = Row::new(row);
        let status = r.parse("status", CaseStatus::parse);
        if status.is_open() {
            stats.open_cases += 1;
            if r.time("due_date").is_some_and(|due| due < now) {
                stats.overdue_cases += 1;
            }
        }
        if status == CaseStatus::InProgress {
            stats.in_progress_cases += 1;
        }
        if status == CaseStatus::Closed
            && r.time("updated_at").is_some_and(|at| at >= month_start)
        {
            stats.closed_this_month += 1;
        }
    }
    stats
}
