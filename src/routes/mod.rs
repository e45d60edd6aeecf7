pub mod contracts;
pub mod dashboard;
pub mod documents;
pub mod equipment;
pub mod evm;
pub mod fabrication;
pub mod health;
pub mod hr;
pub mod payments;
pub mod procurement;
pub mod projects;
pub mod quality;
pub mod tenders;
pub mod warehouse;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Projects
        .route("/projects", post(projects::create_project))
        .route("/projects", get(projects::list_projects))
        .route("/projects/:project_id", get(projects::get_project))
        .route("/projects/:project_id", put(projects::update_project))
        .route("/projects/:project_id", delete(projects::delete_project))
        .route(
            "/projects/:project_id/dashboard",
            get(dashboard::project_dashboard),
        )
        // WBS nodes (nested under projects)
        .route("/projects/:project_id/wbs", post(projects::create_wbs_node))
        .route("/projects/:project_id/wbs", get(projects::list_wbs_nodes))
        .route(
            "/projects/:project_id/wbs/:node_id",
            put(projects::update_wbs_node),
        )
        .route(
            "/projects/:project_id/wbs/:node_id",
            delete(projects::delete_wbs_node),
        )
        // Tenders (nested under projects)
        .route("/projects/:project_id/tenders", post(tenders::create_tender))
        .route("/projects/:project_id/tenders", get(tenders::list_tenders))
        .route(
            "/projects/:project_id/tenders/:tender_id",
            get(tenders::get_tender),
        )
        .route(
            "/projects/:project_id/tenders/:tender_id",
            put(tenders::update_tender),
        )
        .route(
            "/projects/:project_id/tenders/:tender_id",
            delete(tenders::delete_tender),
        )
        // Bids (nested under tenders)
        .route("/tenders/:tender_id/bids", post(tenders::create_bid))
        .route("/tenders/:tender_id/bids", get(tenders::list_bids))
        .route("/bids/:bid_id", put(tenders::update_bid))
        .route("/bids/:bid_id", delete(tenders::delete_bid))
        // Bid lines (parent bid total recomputed)
        .route("/bids/:bid_id/lines", post(tenders::create_bid_line))
        .route("/bids/:bid_id/lines", get(tenders::list_bid_lines))
        .route("/bids/:bid_id/lines/:line_id", put(tenders::update_bid_line))
        .route(
            "/bids/:bid_id/lines/:line_id",
            delete(tenders::delete_bid_line),
        )
        // Contracts
        .route(
            "/projects/:project_id/contracts",
            post(contracts::create_contract),
        )
        .route(
            "/projects/:project_id/contracts",
            get(contracts::list_contracts),
        )
        .route("/contracts/:contract_id", get(contracts::get_contract))
        .route("/contracts/:contract_id", put(contracts::update_contract))
        .route(
            "/contracts/:contract_id",
            delete(contracts::delete_contract),
        )
        // BOQ items (nested under contracts)
        .route(
            "/contracts/:contract_id/boq-items",
            post(contracts::create_boq_item),
        )
        .route(
            "/contracts/:contract_id/boq-items",
            get(contracts::list_boq_items),
        )
        .route("/boq-items/:item_id", get(contracts::get_boq_item))
        .route("/boq-items/:item_id", put(contracts::update_boq_item))
        .route("/boq-items/:item_id", delete(contracts::delete_boq_item))
        // BOQ cost lines (parent item costs recomputed)
        .route(
            "/boq-items/:item_id/cost-lines",
            post(contracts::create_cost_line),
        )
        .route(
            "/boq-items/:item_id/cost-lines",
            get(contracts::list_cost_lines),
        )
        .route(
            "/boq-items/:item_id/cost-lines/:line_id",
            put(contracts::update_cost_line),
        )
        .route(
            "/boq-items/:item_id/cost-lines/:line_id",
            delete(contracts::delete_cost_line),
        )
        // Price indices and BOQ indexation
        .route("/price-indices", post(contracts::create_price_index))
        .route("/price-indices", get(contracts::list_price_indices))
        .route("/price-indices/:index_id", put(contracts::update_price_index))
        .route(
            "/price-indices/:index_id",
            delete(contracts::delete_price_index),
        )
        .route(
            "/contracts/:contract_id/price-adjustment",
            post(contracts::compute_price_adjustment),
        )
        // Advance payments (nested under contracts)
        .route(
            "/contracts/:contract_id/advances",
            post(payments::create_advance),
        )
        .route(
            "/contracts/:contract_id/advances",
            get(payments::list_advances),
        )
        .route("/advances/:advance_id", get(payments::get_advance))
        .route("/advances/:advance_id", put(payments::update_advance))
        .route("/advances/:advance_id", delete(payments::delete_advance))
        // Advance recoveries (parent advance recomputed)
        .route(
            "/advances/:advance_id/recoveries",
            post(payments::create_recovery),
        )
        .route(
            "/advances/:advance_id/recoveries",
            get(payments::list_recoveries),
        )
        .route(
            "/advances/:advance_id/recoveries/:recovery_id",
            delete(payments::delete_recovery),
        )
        // Payment certificates (nested under contracts)
        .route(
            "/contracts/:contract_id/certificates",
            post(payments::create_certificate),
        )
        .route(
            "/contracts/:contract_id/certificates",
            get(payments::list_certificates),
        )
        .route(
            "/certificates/:certificate_id",
            get(payments::get_certificate),
        )
        .route(
            "/certificates/:certificate_id",
            put(payments::update_certificate),
        )
        .route(
            "/certificates/:certificate_id",
            delete(payments::delete_certificate),
        )
        // EVM measurements (nested under projects)
        .route("/projects/:project_id/evm", post(evm::create_measurement))
        .route("/projects/:project_id/evm", get(evm::list_measurements))
        .route("/evm/:measurement_id", get(evm::get_measurement))
        .route("/evm/:measurement_id", delete(evm::delete_measurement))
        // EVM details (parent measurement recomputed)
        .route("/evm/:measurement_id/details", post(evm::create_detail))
        .route("/evm/:measurement_id/details", get(evm::list_details))
        .route(
            "/evm/:measurement_id/details/:detail_id",
            put(evm::update_detail),
        )
        .route(
            "/evm/:measurement_id/details/:detail_id",
            delete(evm::delete_detail),
        )
        // Steel fabrication orders (soft-deleted)
        .route(
            "/projects/:project_id/fabrication-orders",
            post(fabrication::create_order),
        )
        .route(
            "/projects/:project_id/fabrication-orders",
            get(fabrication::list_orders),
        )
        .route("/fabrication-orders/:order_id", get(fabrication::get_order))
        .route(
            "/fabrication-orders/:order_id",
            put(fabrication::update_order),
        )
        .route(
            "/fabrication-orders/:order_id",
            delete(fabrication::delete_order),
        )
        // Bar schedules (parent order weight recomputed)
        .route(
            "/fabrication-orders/:order_id/bar-schedules",
            post(fabrication::create_bar_schedule),
        )
        .route(
            "/fabrication-orders/:order_id/bar-schedules",
            get(fabrication::list_bar_schedules),
        )
        .route(
            "/fabrication-orders/:order_id/bar-schedules/:schedule_id",
            put(fabrication::update_bar_schedule),
        )
        .route(
            "/fabrication-orders/:order_id/bar-schedules/:schedule_id",
            delete(fabrication::delete_bar_schedule),
        )
        // Employees and payroll
        .route("/employees", post(hr::create_employee))
        .route("/employees", get(hr::list_employees))
        .route("/employees/:employee_id", get(hr::get_employee))
        .route("/employees/:employee_id", put(hr::update_employee))
        .route("/employees/:employee_id", delete(hr::delete_employee))
        .route("/payroll-runs", post(hr::create_payroll_run))
        .route("/payroll-runs", get(hr::list_payroll_runs))
        .route("/payroll-runs/:run_id", get(hr::get_payroll_run))
        .route("/payroll-runs/:run_id", delete(hr::delete_payroll_run))
        // Payroll lines (parent run totals recomputed)
        .route("/payroll-runs/:run_id/lines", post(hr::create_payroll_line))
        .route("/payroll-runs/:run_id/lines", get(hr::list_payroll_lines))
        .route(
            "/payroll-runs/:run_id/lines/:line_id",
            put(hr::update_payroll_line),
        )
        .route(
            "/payroll-runs/:run_id/lines/:line_id",
            delete(hr::delete_payroll_line),
        )
        // Warehouses and materials
        .route("/warehouses", post(warehouse::create_warehouse))
        .route("/warehouses", get(warehouse::list_warehouses))
        .route("/warehouses/:warehouse_id", get(warehouse::get_warehouse))
        .route("/warehouses/:warehouse_id", put(warehouse::update_warehouse))
        .route(
            "/warehouses/:warehouse_id",
            delete(warehouse::delete_warehouse),
        )
        .route("/materials", post(warehouse::create_material))
        .route("/materials", get(warehouse::list_materials))
        .route("/materials/:material_id", get(warehouse::get_material))
        .route("/materials/:material_id", put(warehouse::update_material))
        .route("/materials/:material_id", delete(warehouse::delete_material))
        // Stock movements (cached stock level recomputed)
        .route(
            "/warehouses/:warehouse_id/movements",
            post(warehouse::create_movement),
        )
        .route(
            "/warehouses/:warehouse_id/movements",
            get(warehouse::list_movements),
        )
        .route(
            "/warehouses/:warehouse_id/movements/:movement_id",
            delete(warehouse::delete_movement),
        )
        .route("/warehouses/:warehouse_id/stock", get(warehouse::get_stock))
        // Suppliers (soft-deleted)
        .route("/suppliers", post(procurement::create_supplier))
        .route("/suppliers", get(procurement::list_suppliers))
        .route("/suppliers/:supplier_id", get(procurement::get_supplier))
        .route("/suppliers/:supplier_id", put(procurement::update_supplier))
        .route(
            "/suppliers/:supplier_id",
            delete(procurement::delete_supplier),
        )
        // RFQs
        .route("/projects/:project_id/rfqs", post(procurement::create_rfq))
        .route("/projects/:project_id/rfqs", get(procurement::list_rfqs))
        .route("/rfqs/:rfq_id", put(procurement::update_rfq))
        .route("/rfqs/:rfq_id", delete(procurement::delete_rfq))
        .route("/rfqs/:rfq_id/lines", post(procurement::create_rfq_line))
        .route("/rfqs/:rfq_id/lines", get(procurement::list_rfq_lines))
        .route(
            "/rfqs/:rfq_id/lines/:line_id",
            put(procurement::update_rfq_line),
        )
        .route(
            "/rfqs/:rfq_id/lines/:line_id",
            delete(procurement::delete_rfq_line),
        )
        // Purchase orders (parent total recomputed on line change)
        .route(
            "/projects/:project_id/purchase-orders",
            post(procurement::create_purchase_order),
        )
        .route(
            "/projects/:project_id/purchase-orders",
            get(procurement::list_purchase_orders),
        )
        .route(
            "/purchase-orders/:po_id",
            get(procurement::get_purchase_order),
        )
        .route(
            "/purchase-orders/:po_id",
            put(procurement::update_purchase_order),
        )
        .route(
            "/purchase-orders/:po_id",
            delete(procurement::delete_purchase_order),
        )
        .route(
            "/purchase-orders/:po_id/lines",
            post(procurement::create_po_line),
        )
        .route(
            "/purchase-orders/:po_id/lines",
            get(procurement::list_po_lines),
        )
        .route(
            "/purchase-orders/:po_id/lines/:line_id",
            put(procurement::update_po_line),
        )
        .route(
            "/purchase-orders/:po_id/lines/:line_id",
            delete(procurement::delete_po_line),
        )
        // Equipment and usage logs
        .route("/equipment", post(equipment::create_equipment))
        .route("/equipment", get(equipment::list_equipment))
        .route("/equipment/:equipment_id", get(equipment::get_equipment))
        .route("/equipment/:equipment_id", put(equipment::update_equipment))
        .route(
            "/equipment/:equipment_id",
            delete(equipment::delete_equipment),
        )
        .route(
            "/equipment/:equipment_id/usage-logs",
            post(equipment::create_usage_log),
        )
        .route(
            "/equipment/:equipment_id/usage-logs",
            get(equipment::list_usage_logs),
        )
        .route(
            "/equipment/:equipment_id/usage-logs/:log_id",
            put(equipment::update_usage_log),
        )
        .route(
            "/equipment/:equipment_id/usage-logs/:log_id",
            delete(equipment::delete_usage_log),
        )
        // Quality and HSE
        .route(
            "/projects/:project_id/inspections",
            post(quality::create_inspection),
        )
        .route(
            "/projects/:project_id/inspections",
            get(quality::list_inspections),
        )
        .route(
            "/inspections/:inspection_id",
            put(quality::update_inspection),
        )
        .route(
            "/inspections/:inspection_id",
            delete(quality::delete_inspection),
        )
        .route(
            "/projects/:project_id/incidents",
            post(quality::create_incident),
        )
        .route(
            "/projects/:project_id/incidents",
            get(quality::list_incidents),
        )
        .route("/incidents/:incident_id", put(quality::update_incident))
        .route("/incidents/:incident_id", delete(quality::delete_incident))
        // Documents (soft-deleted)
        .route(
            "/projects/:project_id/documents",
            post(documents::create_document),
        )
        .route(
            "/projects/:project_id/documents",
            get(documents::list_documents),
        )
        .route("/documents/:document_id", get(documents::get_document))
        .route("/documents/:document_id", put(documents::update_document))
        .route("/documents/:document_id", delete(documents::delete_document))
        // Polymorphic attachments and comments
        .route(
            "/attachments/:kind/:record_id",
            post(documents::create_attachment),
        )
        .route(
            "/attachments/:kind/:record_id",
            get(documents::list_attachments),
        )
        .route(
            "/attachments/:attachment_id",
            delete(documents::delete_attachment),
        )
        .route("/comments/:kind/:record_id", post(documents::create_comment))
        .route("/comments/:kind/:record_id", get(documents::list_comments))
        .route("/comments/:comment_id", delete(documents::delete_comment))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Router::route panics at construction on an overlapping or malformed
    // path, so assembling the full table is itself the assertion that every
    // method/path pair registers cleanly.
    #[test]
    fn router_assembles_full_route_table() {
        let _router = api_router();
    }
}
