//! Bills, ledgers, the budget summary and KPI datasets.

use std::path::Path;

use anyhow::Result;
use serde_json::Value;

use super::{TabContext, TabController, finish_mutation};
use crate::api::{Resource, record_id};
use crate::http::MultipartForm;
use crate::store::{BudgetSlice, Shared};
use crate::view::format::money_value;
use crate::view::{
    Element, Node, display_value, el, empty_state, format_date, format_money, record_title, table,
};

impl TabController for BudgetSlice {
    fn load(&mut self, cx: &mut TabContext<'_>) -> Result<()> {
        let bills = cx.api.list(Resource::Bills)?;
        let summary = cx.api.budget_summary()?;
        let kpi_datasets = cx.api.kpi_datasets()?;
        let ledger = match &self.ledger {
            Some((bill, _)) => Some((bill.clone(), cx.api.ledger(bill)?)),
            None => None,
        };
        self.bills = bills;
        self.summary = summary;
        self.kpi_datasets = kpi_datasets;
        self.ledger = ledger;
        Ok(())
    }

    fn render(&self, _shared: &Shared) -> Node {
        let bills = if self.bills.is_empty() {
            empty_state("No bills yet.")
        } else {
            table(
                &["Bill", "Amount", "Due"],
                self.bills.iter().map(bill_row).collect(),
            )
        };

        let ledger = match &self.ledger {
            Some((bill, entries)) => el("div")
                .class("ledger")
                .child(el("h3").text(format!("Ledger · {}", self.bill_name(bill))))
                .child(if entries.is_empty() {
                    empty_state("No ledger entries.")
                } else {
                    table(
                        &["Date", "Description", "Amount"],
                        entries.iter().map(ledger_row).collect(),
                    )
                }),
            None => el("div").class("ledger").hidden(true),
        };

        let kpis = if self.kpi_datasets.is_empty() {
            empty_state("No KPI datasets.")
        } else {
            el("ul").children(self.kpi_datasets.iter().map(|d| el("li").text(record_title(d))))
        };

        el("section")
            .class("budget")
            .child(el("h2").text("Budget"))
            .child(summary(&self.summary))
            .child(el("h3").text("Bills"))
            .child(bills)
            .child(ledger)
            .child(el("h3").text("KPI Datasets"))
            .child(kpis)
            .into()
    }
}

impl BudgetSlice {
    pub fn create_bill(&mut self, cx: &mut TabContext<'_>, bill: Value) {
        let result = cx.api.create(Resource::Bills, bill);
        finish_mutation(self, cx, "bill", "create", result);
    }

    pub fn update_bill(&mut self, cx: &mut TabContext<'_>, id: &str, bill: Value) {
        let result = cx.api.update(Resource::Bills, id, bill);
        finish_mutation(self, cx, "bill", "update", result);
    }

    pub fn delete_bill(&mut self, cx: &mut TabContext<'_>, id: &str) {
        let result = cx.api.delete(Resource::Bills, id);
        if self.ledger.as_ref().is_some_and(|(bill, _)| bill == id) && result.is_ok() {
            self.ledger = None;
        }
        finish_mutation(self, cx, "bill", "delete", result);
    }

    /// Fetch and show the ledger of one bill.
    pub fn show_ledger(&mut self, cx: &mut TabContext<'_>, bill_id: &str) {
        let entries = cx.api.ledger(bill_id);
        if let Some(entries) = cx.guard("Failed to load ledger", entries) {
            self.ledger = Some((bill_id.to_string(), entries));
        }
    }

    /// Upload a bank statement (CSV or similar) to `/budget/import`.
    pub fn import_statement(&mut self, cx: &mut TabContext<'_>, path: &Path) {
        let result = MultipartForm::new()
            .file_from_path("file", path)
            .and_then(|form| cx.api.import_budget(form));
        if let Some(report) = finish_mutation(self, cx, "statement", "import", result) {
            if let Some(count) = report.get("imported").and_then(Value::as_u64) {
                cx.shared.toasts.info(format!("Rows imported: {count}"));
            }
        }
    }

    /// Upload a KPI dataset, optionally under an explicit name.
    pub fn upload_kpi(&mut self, cx: &mut TabContext<'_>, path: &Path, name: Option<&str>) {
        let result = MultipartForm::new()
            .file_from_path("file", path)
            .map(|form| match name {
                Some(name) => form.text("name", name),
                None => form,
            })
            .and_then(|form| cx.api.upload_kpi(form));
        finish_mutation(self, cx, "dataset", "upload", result);
    }

    fn bill_name(&self, id: &str) -> String {
        self.bills
            .iter()
            .find(|b| record_id(b).as_deref() == Some(id))
            .map(record_title)
            .unwrap_or_else(|| id.to_string())
    }
}

fn amount_text(record: &Value) -> String {
    record
        .get("amount")
        .and_then(money_value)
        .map(format_money)
        .unwrap_or_else(|| "—".to_string())
}

fn bill_row(bill: &Value) -> Vec<String> {
    let due = bill
        .get("due")
        .or_else(|| bill.get("due_date"))
        .and_then(Value::as_str)
        .map(format_date)
        .unwrap_or_else(|| "—".to_string());
    vec![record_title(bill), amount_text(bill), due]
}

fn ledger_row(entry: &Value) -> Vec<String> {
    let date = entry
        .get("date")
        .and_then(Value::as_str)
        .map(format_date)
        .unwrap_or_else(|| "—".to_string());
    let description = entry
        .get("description")
        .or_else(|| entry.get("memo"))
        .map(display_value)
        .unwrap_or_default();
    vec![date, description, amount_text(entry)]
}

/// Summary numbers: money-looking fields are formatted as currency.
fn summary(value: &Value) -> Element {
    let Value::Object(map) = value else {
        return empty_state("No budget summary.");
    };
    let rows = map
        .iter()
        .filter(|(_, v)| !v.is_array() && !v.is_object())
        .map(|(k, v)| {
            let shown = match (v, money_value(v)) {
                (Value::Number(_), Some(amount)) => format_money(amount),
                _ => display_value(v),
            };
            vec![k.replace('_', " "), shown]
        })
        .collect();
    table(&["", "Amount"], rows).class("summary")
}
