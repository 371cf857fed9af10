//! Commission arithmetic and dashboard projections.
//!
//! Everything here is a pure function of status counts and configured
//! rates. The desk gathers the counts; nothing in this module touches the
//! store.

use crate::{
    config::CommissionRates,
    status::LeadStatus,
    store::{DailyCount, UserLeadCounts},
    types::UserId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total:           i64,
    pub new:             i64,
    pub billable:        i64,
    pub paid:            i64,
    pub returned:        i64,
    pub bad_lead:        i64,
    pub deducted_return: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: LeadStatus, n: i64) {
        self.total += n;
        match status {
            LeadStatus::New            => self.new += n,
            LeadStatus::Billable       => self.billable += n,
            LeadStatus::Paid           => self.paid += n,
            LeadStatus::Returned       => self.returned += n,
            LeadStatus::BadLead        => self.bad_lead += n,
            LeadStatus::DeductedReturn => self.deducted_return += n,
        }
    }

    pub fn get(&self, status: LeadStatus) -> i64 {
        match status {
            LeadStatus::New            => self.new,
            LeadStatus::Billable       => self.billable,
            LeadStatus::Paid           => self.paid,
            LeadStatus::Returned       => self.returned,
            LeadStatus::BadLead        => self.bad_lead,
            LeadStatus::DeductedReturn => self.deducted_return,
        }
    }
}

/// `credited × rate − returned × deduction`. May go negative.
pub fn commission(credited: i64, returned: i64, rate: i64, deduction: i64) -> i64 {
    credited * rate - returned * deduction
}

/// `hits / total` as a percentage with two decimals; `"0%"` when total is 0.
pub fn conversion_rate(total: i64, hits: i64) -> String {
    if total <= 0 {
        return "0%".to_string();
    }
    format!("{:.2}%", hits as f64 / total as f64 * 100.0)
}

/// Whole-unit amount with thousands separators: `-12,500`.
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if amount < 0 {
        format!("-{out}")
    } else {
        out
    }
}

fn money(amount: i64, rates: &CommissionRates) -> String {
    format!("{} {}", format_amount(amount), rates.currency)
}

/// One number on a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatCard {
    pub label:       String,
    pub value:       String,
    pub description: String,
    /// Chart points, oldest first. Empty when the card has no chart.
    #[serde(default)]
    pub trend:       Vec<i64>,
}

impl StatCard {
    fn new(label: &str, value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label:       label.to_string(),
            value:       value.into(),
            description: description.into(),
            trend:       Vec::new(),
        }
    }

    fn with_trend(mut self, trend: Vec<i64>) -> Self {
        self.trend = trend;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dashboard {
    /// admin and hr
    Overview { cards: Vec<StatCard> },
    Team { cards: Vec<StatCard> },
    Agent { cards: Vec<StatCard> },
    Qa { cards: Vec<StatCard> },
}

impl Dashboard {
    pub fn cards(&self) -> &[StatCard] {
        match self {
            Self::Overview { cards }
            | Self::Team { cards }
            | Self::Agent { cards }
            | Self::Qa { cards } => cards,
        }
    }

    pub fn card(&self, label: &str) -> Option<&StatCard> {
        self.cards().iter().find(|c| c.label == label)
    }
}

/// One point per day from `first` through `last`, zero where `sparse` has
/// no entry.
pub fn dense_trend(sparse: &[DailyCount], first: NaiveDate, last: NaiveDate) -> Vec<DailyCount> {
    first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| DailyCount {
            day,
            count: sparse
                .iter()
                .find(|d| d.day == day)
                .map_or(0, |d| d.count),
        })
        .collect()
}

fn counts_of(trend: &[DailyCount]) -> Vec<i64> {
    trend.iter().map(|d| d.count).collect()
}

/// Whole-desk view for admin and hr.
pub fn overview_dashboard(
    counts: &StatusCounts,
    paid_trend: &[DailyCount],
    rates: &CommissionRates,
) -> Dashboard {
    let payable_amount = counts.billable * rates.billed_rate;
    Dashboard::Overview {
        cards: vec![
            StatCard::new("Total Leads", counts.total.to_string(), "All leads in the system"),
            StatCard::new("Payable Leads", counts.billable.to_string(), "All payable leads"),
            StatCard::new(
                "Total Amount",
                money(payable_amount, rates),
                format!(
                    "Value of payable leads ({} {} each)",
                    format_amount(rates.billed_rate),
                    rates.currency
                ),
            )
            .with_trend(
                paid_trend
                    .iter()
                    .map(|d| d.count * rates.billed_rate)
                    .collect(),
            ),
        ],
    }
}

/// Manager view over the teams they run.
pub fn team_dashboard(
    counts: &StatusCounts,
    team_trend: &[DailyCount],
    rates: &CommissionRates,
) -> Dashboard {
    let manager_commission = commission(counts.billable, 0, rates.manager_rate, 0);
    Dashboard::Team {
        cards: vec![
            StatCard::new("Team Leads", counts.total.to_string(), "Total leads in your team")
                .with_trend(counts_of(team_trend)),
            StatCard::new("Billed Leads", counts.billable.to_string(), "Billed leads in your team"),
            StatCard::new(
                "Your Commission",
                money(manager_commission, rates),
                format!(
                    "{} {} per billed lead",
                    format_amount(rates.manager_rate),
                    rates.currency
                ),
            ),
            StatCard::new(
                "Billing Rate",
                conversion_rate(counts.total, counts.billable),
                "Team lead to billed conversion",
            ),
        ],
    }
}

/// Earnings cards shared by the agent and QA dashboards.
fn earnings_cards(
    counts: &StatusCounts,
    own_trend: &[DailyCount],
    rate: i64,
    rates: &CommissionRates,
) -> Vec<StatCard> {
    let earned = counts.paid * rate;
    let deducted = counts.returned * rates.return_deduction;
    let earnings = commission(counts.paid, counts.returned, rate, rates.return_deduction);
    vec![
        StatCard::new("Your Leads", counts.total.to_string(), "All leads assigned to you")
            .with_trend(counts_of(own_trend)),
        StatCard::new(
            "Paid Leads",
            counts.paid.to_string(),
            format!("Earned: {}", money(earned, rates)),
        ),
        StatCard::new(
            "Returns",
            counts.returned.to_string(),
            format!("Deducted: -{}", money(deducted, rates)),
        ),
        StatCard::new(
            "Your Earnings",
            money(earnings, rates),
            "Net commission after returns",
        )
        .with_trend(vec![
            counts.billable * rates.billed_rate,
            -counts.returned * rates.return_deduction,
        ]),
        StatCard::new(
            "Conversion Rate",
            conversion_rate(counts.total, counts.paid),
            "Lead to paid conversion",
        ),
    ]
}

pub fn agent_dashboard(
    counts: &StatusCounts,
    own_trend: &[DailyCount],
    rates: &CommissionRates,
) -> Dashboard {
    Dashboard::Agent {
        cards: earnings_cards(counts, own_trend, rates.billed_rate, rates),
    }
}

pub fn qa_dashboard(
    counts: &StatusCounts,
    trend: &[DailyCount],
    rates: &CommissionRates,
) -> Dashboard {
    Dashboard::Qa {
        cards: earnings_cards(counts, trend, rates.qa_rate, rates),
    }
}

/// Row of the admin commission table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCommissionRow {
    pub user_id:    UserId,
    pub name:       String,
    pub role:       String,
    pub total:      i64,
    pub billed:     i64,
    pub paid:       i64,
    pub returned:   i64,
    pub commission: i64,
    pub summary:    String,
}

pub fn commission_row(counts: &UserLeadCounts, rates: &CommissionRates) -> UserCommissionRow {
    let total_commission = commission(
        counts.billed,
        counts.returned,
        rates.billed_rate,
        rates.return_deduction,
    );
    UserCommissionRow {
        user_id:    counts.user_id,
        name:       counts.name.clone(),
        role:       counts.role.as_str().to_string(),
        total:      counts.total,
        billed:     counts.billed,
        paid:       counts.paid,
        returned:   counts.returned,
        commission: total_commission,
        summary:    format!(
            "{} leads × {} − {} returns × {} = {}",
            counts.billed,
            money(rates.billed_rate, rates),
            counts.returned,
            money(rates.return_deduction, rates),
            money(total_commission, rates)
        ),
    }
}
